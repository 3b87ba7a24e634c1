use std::collections::{HashMap, HashSet};

use log::debug;

use crate::device::Device;
use crate::errors::Result;
use crate::eval::evaluator;
use crate::graph::node::{Node, NodeId, Op};
use crate::graph::variable::Variable;
use crate::params::parameter::Parameter;
use crate::tensor::value::Value;

/// A composed, multi-output computation over shared parameters.
///
/// The structure is fixed once combined; only the values bound to its
/// arguments change from call to call. Several functions may reference
/// the same `Parameter`s without copying them.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    roots: Vec<Node>,
}

impl Function {
    /// Bundles `roots` into one function whose outputs are the roots' outputs, in order.
    pub fn combine(roots: Vec<Node>, name: &str) -> Function {
        Function { name: name.to_string(), roots }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn outputs(&self) -> Vec<Variable> {
        self.roots.iter().map(|n| n.output().clone()).collect()
    }

    /// Every distinct node reachable from the roots, operands before users.
    pub fn nodes(&self) -> Vec<Node> {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for root in &self.roots {
            post_order(root, &mut visited, &mut order);
        }
        order
    }

    /// Distinct parameters by identity, in first-use order.
    pub fn parameters(&self) -> Vec<Parameter> {
        let mut seen = HashSet::new();
        self.nodes()
            .iter()
            .filter_map(|n| n.parameter())
            .filter(|p| seen.insert(p.id()))
            .cloned()
            .collect()
    }

    /// Distinct input variables, in first-use order.
    pub fn arguments(&self) -> Vec<Variable> {
        let mut seen = HashSet::new();
        self.nodes()
            .iter()
            .filter(|n| matches!(n.op(), Op::Input))
            .map(|n| n.output().clone())
            .filter(|v| seen.insert(v.id()))
            .collect()
    }

    pub fn argument_named(&self, name: &str) -> Option<Variable> {
        self.arguments().into_iter().find(|v| v.name() == name)
    }

    pub fn output_named(&self, name: &str) -> Option<Variable> {
        self.outputs().into_iter().find(|v| v.name() == name)
    }

    /// Runs one forward pass. See [`evaluator::forward`].
    pub fn forward(
        &self,
        bindings: &HashMap<Variable, Value>,
        requested: &[Variable],
        device: Device,
    ) -> Result<HashMap<Variable, Value>> {
        evaluator::forward(self, bindings, requested, device)
    }

    /// Rebuilds the structure under fresh node and variable identities
    /// while still pointing at the same parameter storage.
    ///
    /// The returned map takes each old variable (arguments and node
    /// outputs) to its counterpart in the clone.
    pub fn clone_shared(&self) -> (Function, HashMap<Variable, Variable>) {
        let mut nodes: HashMap<NodeId, Node> = HashMap::new();
        let mut vars: HashMap<Variable, Variable> = HashMap::new();
        for node in self.nodes() {
            let cloned = clone_node(&node, &nodes, &mut vars);
            nodes.insert(node.id(), cloned);
        }
        let roots = self
            .roots
            .iter()
            .filter_map(|r| nodes.get(&r.id()).cloned())
            .collect();
        debug!("cloned function '{}' over {} nodes", self.name, nodes.len());
        (Function::combine(roots, &self.name), vars)
    }
}

fn post_order(node: &Node, visited: &mut HashSet<NodeId>, order: &mut Vec<Node>) {
    if !visited.insert(node.id()) {
        return;
    }
    for operand in node.operands() {
        post_order(operand, visited, order);
    }
    order.push(node.clone());
}

/// Clones one node; its operands must already be in `done`.
fn clone_node(node: &Node, done: &HashMap<NodeId, Node>, vars: &mut HashMap<Variable, Variable>) -> Node {
    let output = vars
        .entry(node.output().clone())
        .or_insert_with(|| node.output().renewed())
        .clone();
    let get = |n: &Node| done.get(&n.id()).cloned().unwrap_or_else(|| n.clone());
    let op = match node.op() {
        Op::Input => Op::Input,
        Op::Times { weight, operand } => Op::Times { weight: weight.clone(), operand: get(operand) },
        Op::Plus { bias, operand } => Op::Plus { bias: bias.clone(), operand: get(operand) },
        Op::Activation { activation, operand } => Op::Activation {
            activation: *activation,
            operand: get(operand),
        },
        Op::CrossEntropyWithSoftmax { logits, labels } => Op::CrossEntropyWithSoftmax {
            logits: get(logits),
            labels: get(labels),
        },
        Op::ClassificationError { logits, labels } => Op::ClassificationError {
            logits: get(logits),
            labels: get(labels),
        },
    };
    Node::new(op, output)
}
