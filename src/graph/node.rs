//! Graph nodes and the operators that build them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::activation::activation::Activation;
use crate::errors::{EvalError, Result};
use crate::graph::variable::Variable;
use crate::params::parameter::Parameter;
use crate::tensor::shape::Shape;

static NODE_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub type NodeId = usize;

fn next_node_id() -> NodeId {
    NODE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Operator applied by a node.
#[derive(Debug, Clone)]
pub enum Op {
    /// Leaf reading an input variable.
    Input,
    /// `weight x operand`, weight shaped `[out, in]`.
    Times { weight: Parameter, operand: Node },
    /// `bias + operand`, bias shaped `[out]`.
    Plus { bias: Parameter, operand: Node },
    Activation { activation: Activation, operand: Node },
    /// Per-sample `-sum(labels * log_softmax(logits))`.
    CrossEntropyWithSoftmax { logits: Node, labels: Node },
    /// Per-sample `1` when the arg-max of logits and labels differ.
    ClassificationError { logits: Node, labels: Node },
}

#[derive(Debug)]
struct NodeInner {
    id: NodeId,
    op: Op,
    output: Variable,
}

/// Immutable expression tree node. Clones share the node.
#[derive(Debug, Clone)]
pub struct Node(Arc<NodeInner>);

impl Node {
    pub(crate) fn new(op: Op, output: Variable) -> Node {
        Node(Arc::new(NodeInner {
            id: next_node_id(),
            op,
            output,
        }))
    }

    pub fn id(&self) -> NodeId {
        self.0.id
    }

    pub fn op(&self) -> &Op {
        &self.0.op
    }

    /// Variable naming this node's result. For input leaves this is the input itself.
    pub fn output(&self) -> &Variable {
        &self.0.output
    }

    pub fn shape(&self) -> &Shape {
        self.0.output.shape()
    }

    /// Direct operands, left to right.
    pub fn operands(&self) -> Vec<&Node> {
        match &self.0.op {
            Op::Input => vec![],
            Op::Times { operand, .. } | Op::Plus { operand, .. } | Op::Activation { operand, .. } => {
                vec![operand]
            }
            Op::CrossEntropyWithSoftmax { logits, labels } | Op::ClassificationError { logits, labels } => {
                vec![logits, labels]
            }
        }
    }

    /// Parameter read directly by this node, if any.
    pub fn parameter(&self) -> Option<&Parameter> {
        match &self.0.op {
            Op::Times { weight, .. } => Some(weight),
            Op::Plus { bias, .. } => Some(bias),
            _ => None,
        }
    }
}

impl From<&Variable> for Node {
    fn from(var: &Variable) -> Node {
        ops::input(var)
    }
}

/// Operator constructors. Shapes are checked when the node is built.
pub mod ops {
    use super::*;

    fn vector_dim(node: &Node) -> Result<usize> {
        match node.shape().dims() {
            [d] => Ok(*d),
            _ => Err(EvalError::InvalidInputRank {
                name: node.output().name().to_string(),
                rank: node.shape().rank(),
            }),
        }
    }

    fn mismatch(name: &str, expected: Shape, actual: &Shape) -> EvalError {
        EvalError::ShapeMismatch {
            name: name.to_string(),
            expected,
            actual: actual.clone(),
        }
    }

    pub fn input(var: &Variable) -> Node {
        Node::new(Op::Input, var.clone())
    }

    pub fn times(weight: &Parameter, operand: &Node, name: &str) -> Result<Node> {
        let in_dim = vector_dim(operand)?;
        let (out_dim, w_in) = match weight.shape().dims() {
            [o, i] => (*o, *i),
            _ => return Err(mismatch(weight.name(), Shape::matrix(0, in_dim), weight.shape())),
        };
        if w_in != in_dim {
            return Err(mismatch(weight.name(), Shape::matrix(out_dim, in_dim), weight.shape()));
        }
        let op = Op::Times { weight: weight.clone(), operand: operand.clone() };
        Ok(Node::new(op, Variable::output(Shape::vector(out_dim), name)))
    }

    pub fn plus(bias: &Parameter, operand: &Node, name: &str) -> Result<Node> {
        let dim = vector_dim(operand)?;
        if bias.shape() != &Shape::vector(dim) {
            return Err(mismatch(bias.name(), Shape::vector(dim), bias.shape()));
        }
        let op = Op::Plus { bias: bias.clone(), operand: operand.clone() };
        Ok(Node::new(op, Variable::output(Shape::vector(dim), name)))
    }

    pub fn activation(activation: Activation, operand: &Node, name: &str) -> Node {
        let op = Op::Activation { activation, operand: operand.clone() };
        Node::new(op, Variable::output(operand.shape().clone(), name))
    }

    fn check_pair(logits: &Node, labels: &Node) -> Result<()> {
        let dim = vector_dim(logits)?;
        if labels.shape() != &Shape::vector(dim) {
            return Err(mismatch(labels.output().name(), Shape::vector(dim), labels.shape()));
        }
        Ok(())
    }

    pub fn cross_entropy_with_softmax(logits: &Node, labels: &Node, name: &str) -> Result<Node> {
        check_pair(logits, labels)?;
        let op = Op::CrossEntropyWithSoftmax { logits: logits.clone(), labels: labels.clone() };
        Ok(Node::new(op, Variable::output(Shape::vector(1), name)))
    }

    pub fn classification_error(logits: &Node, labels: &Node, name: &str) -> Result<Node> {
        check_pair(logits, labels)?;
        let op = Op::ClassificationError { logits: logits.clone(), labels: labels.clone() };
        Ok(Node::new(op, Variable::output(Shape::vector(1), name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;

    #[test]
    fn times_infers_output_shape() {
        let x = Variable::input(Shape::vector(4), "x");
        let w = Parameter::constant("W", Shape::matrix(7, 4), 0.0, Device::Cpu);
        let node = ops::times(&w, &Node::from(&x), "h").unwrap();
        assert_eq!(node.shape(), &Shape::vector(7));
        assert!(node.parameter().unwrap().same_as(&w));
        assert_eq!(node.operands().len(), 1);
    }

    #[test]
    fn times_rejects_wrong_fan_in() {
        let x = Variable::input(Shape::vector(5), "x");
        let w = Parameter::constant("W", Shape::matrix(7, 4), 0.0, Device::Cpu);
        assert!(matches!(
            ops::times(&w, &Node::from(&x), "h"),
            Err(EvalError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn rank_two_operand_is_rejected() {
        let x = Variable::input(Shape::matrix(2, 2), "x");
        let w = Parameter::constant("W", Shape::matrix(2, 2), 0.0, Device::Cpu);
        assert!(matches!(
            ops::times(&w, &Node::from(&x), "h"),
            Err(EvalError::InvalidInputRank { rank: 2, .. })
        ));
    }

    #[test]
    fn loss_needs_matching_label_width() {
        let z = Variable::input(Shape::vector(3), "z");
        let y = Variable::input(Shape::vector(4), "y");
        assert!(ops::cross_entropy_with_softmax(&Node::from(&z), &Node::from(&y), "loss").is_err());

        let y = Variable::input(Shape::vector(3), "y");
        let loss = ops::cross_entropy_with_softmax(&Node::from(&z), &Node::from(&y), "loss").unwrap();
        assert_eq!(loss.shape(), &Shape::vector(1));
        assert_eq!(loss.output().name(), "loss");
    }
}
