use std::collections::HashMap;

use log::trace;

use crate::device::Device;
use crate::errors::{EvalError, Result};
use crate::graph::{Function, Node, NodeId, Op, Variable};
use crate::loss::{ClassificationError, CrossEntropyWithSoftmax};
use crate::math::matrix::Matrix;
use crate::tensor::shape::Shape;
use crate::tensor::value::Value;

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Runs one forward pass of `function` and returns a value for every
/// variable in `requested`.
///
/// Every argument of the function must be bound to a value of shape
/// `[dim, 1, n]`, with the same `n` across all bindings. Requested
/// variables must be outputs of the function. The call either succeeds
/// completely or returns the first error; nothing is partially filled.
///
/// Parameters are only read, so any number of threads may evaluate
/// functions over the same parameters at once.
pub fn forward(
    function: &Function,
    bindings: &HashMap<Variable, Value>,
    requested: &[Variable],
    device: Device,
) -> Result<HashMap<Variable, Value>> {
    if !device.has_kernels() {
        return Err(EvalError::UnsupportedDevice(device.to_string()));
    }

    let outputs = function.outputs();
    if let Some(unknown) = requested.iter().find(|v| !outputs.contains(v)) {
        return Err(EvalError::UnknownOutput {
            name: unknown.name().to_string(),
            function: function.name().to_string(),
        });
    }

    let num_samples = check_bindings(function, bindings)?;
    trace!("forward '{}' over {} samples", function.name(), num_samples);

    let mut memo: HashMap<NodeId, Matrix> = HashMap::new();
    for node in function.nodes() {
        let result = eval_node(&node, bindings, &memo);
        memo.insert(node.id(), result);
    }

    let mut results = HashMap::with_capacity(requested.len());
    for root in function.roots() {
        if requested.contains(root.output()) {
            if let Some(m) = memo.remove(&root.id()) {
                results.insert(root.output().clone(), Value::from_batch_matrix(m, device));
            }
        }
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Validates every argument binding and returns the common sample count.
fn check_bindings(function: &Function, bindings: &HashMap<Variable, Value>) -> Result<usize> {
    let mut num_samples: Option<usize> = None;
    for arg in function.arguments() {
        let value = bindings.get(&arg).ok_or_else(|| EvalError::MissingBinding {
            name: arg.name().to_string(),
        })?;

        let dim = arg.shape().total_size();
        let n = num_samples.unwrap_or_else(|| value.num_samples());
        let expected = Shape::batch(dim, n);
        if value.shape() != &expected {
            return Err(EvalError::ShapeMismatch {
                name: arg.name().to_string(),
                expected,
                actual: value.shape().clone(),
            });
        }
        num_samples = Some(n);
    }
    Ok(num_samples.unwrap_or(0))
}

/// Computes one node as an `n x width` matrix. Operands are already in `memo`
/// because nodes arrive in post-order.
fn eval_node(node: &Node, bindings: &HashMap<Variable, Value>, memo: &HashMap<NodeId, Matrix>) -> Matrix {
    let operand = |n: &Node| memo.get(&n.id()).cloned().unwrap_or_default();
    match node.op() {
        Op::Input => bindings
            .get(node.output())
            .map(Value::to_batch_matrix)
            .unwrap_or_default(),
        Op::Times { weight, operand: x } => operand(x).matmul_transposed(&weight.value()),
        Op::Plus { bias, operand: x } => operand(x).add_row(bias.value().data()),
        Op::Activation { activation, operand: x } => operand(x).map(|v| activation.function(v)),
        Op::CrossEntropyWithSoftmax { logits, labels } => {
            per_sample(&operand(logits), &operand(labels), CrossEntropyWithSoftmax::loss)
        }
        Op::ClassificationError { logits, labels } => {
            per_sample(&operand(logits), &operand(labels), ClassificationError::error)
        }
    }
}

fn per_sample(logits: &Matrix, labels: &Matrix, f: fn(&[f32], &[f32]) -> f32) -> Matrix {
    let data: Vec<f32> = logits.rows_iter().zip(labels.rows_iter()).map(|(z, y)| f(z, y)).collect();
    Matrix::from_vec(data.len(), 1, data)
}
