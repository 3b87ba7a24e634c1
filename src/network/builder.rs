use log::debug;

use crate::activation::activation::Activation;
use crate::device::Device;
use crate::errors::{EvalError, Result};
use crate::graph::{ops, Function, Node, Variable};
use crate::network::classifier::ClassifierNetwork;
use crate::network::spec::NetworkSpec;
use crate::params::{Parameter, SharedParameters};
use crate::tensor::shape::Shape;

pub const FEATURES: &str = "features";
pub const LABELS: &str = "labels";
pub const LOSS: &str = "LossFunction";
pub const CLASSIFICATION_ERROR: &str = "ClassificationError";
pub const CLASSIFIER_OUTPUT: &str = "classifierOutput";
pub const MODEL: &str = "ClassifierModel";

/// Initial range for weights and biases a private network allocates for itself.
pub const PRIVATE_LAYER_INIT_RANGE: f32 = 0.05;
/// Initial range for the output projection of a private network.
pub const PRIVATE_OUTPUT_INIT_RANGE: f32 = 0.5;

// ---------------------------------------------------------------------------
// Layer composition
// ---------------------------------------------------------------------------

/// `activation(bias + weight x input)` over existing parameters.
pub fn dense_layer(input: &Node, weight: &Parameter, bias: &Parameter, activation: Activation) -> Result<Node> {
    if input.shape().rank() != 1 {
        return Err(EvalError::InvalidInputRank {
            name: input.output().name().to_string(),
            rank: input.shape().rank(),
        });
    }
    let times = ops::times(weight, input, "")?;
    let plus = ops::plus(bias, &times, "")?;
    Ok(ops::activation(activation, &plus, activation.op_name()))
}

/// Dense layers for every `(weight, bias)` pair, then the output projection.
pub fn classifier(
    input: &Node,
    layers: &[(Parameter, Parameter)],
    output_weight: &Parameter,
    activation: Activation,
) -> Result<Node> {
    if layers.is_empty() {
        return Err(EvalError::NoHiddenLayers);
    }
    let mut root = input.clone();
    for (weight, bias) in layers {
        root = dense_layer(&root, weight, bias, activation)?;
    }
    ops::times(output_weight, &root, CLASSIFIER_OUTPUT)
}

// ---------------------------------------------------------------------------
// Network builders
// ---------------------------------------------------------------------------

/// Builds a classifier that reads the parameters of a published store.
///
/// Any number of networks, on any threads, can be built over the same
/// store; they all reference the same parameter storage.
pub fn build_shared_network(spec: &NetworkSpec, params: &SharedParameters) -> Result<ClassifierNetwork> {
    spec.validate()?;
    params.check_matches(spec)?;
    assemble(spec, params.layers(), params.output_weight())
}

/// Builds a classifier with freshly allocated parameters of its own.
///
/// Weights and biases are uniform in `[-0.05, 0.05]`, the output
/// projection in `[-0.5, 0.5]`. Each parameter gets a seed derived from
/// `seed`.
pub fn build_private_network(spec: &NetworkSpec, device: Device, seed: u64) -> Result<ClassifierNetwork> {
    spec.validate()?;
    let r = PRIVATE_LAYER_INIT_RANGE;
    let layers: Vec<(Parameter, Parameter)> = (0..spec.hidden_layers)
        .map(|i| {
            let fan_in = if i == 0 { spec.input_dim } else { spec.hidden_dim };
            let s = seed.wrapping_add(2 * i as u64);
            (
                Parameter::uniform(&format!("W{i}"), Shape::matrix(spec.hidden_dim, fan_in), -r, r, s, device),
                Parameter::uniform(&format!("b{i}"), Shape::vector(spec.hidden_dim), -r, r, s.wrapping_add(1), device),
            )
        })
        .collect();
    let r = PRIVATE_OUTPUT_INIT_RANGE;
    let output_weight = Parameter::uniform(
        "Wout",
        Shape::matrix(spec.num_classes, spec.hidden_dim),
        -r,
        r,
        seed.wrapping_add(2 * spec.hidden_layers as u64),
        device,
    );
    assemble(spec, &layers, &output_weight)
}

/// Declares the inputs, attaches loss and error, bundles the three outputs
/// and checks the resulting structure.
fn assemble(spec: &NetworkSpec, layers: &[(Parameter, Parameter)], output_weight: &Parameter) -> Result<ClassifierNetwork> {
    let features = Variable::input(Shape::vector(spec.input_dim), FEATURES);
    let labels = Variable::input(Shape::vector(spec.num_classes), LABELS);

    let output = classifier(&Node::from(&features), layers, output_weight, spec.activation)?;
    let label_node = Node::from(&labels);
    let loss = ops::cross_entropy_with_softmax(&output, &label_node, LOSS)?;
    let error = ops::classification_error(&output, &label_node, CLASSIFICATION_ERROR)?;

    let network = ClassifierNetwork {
        features,
        labels,
        loss: loss.output().clone(),
        error: error.output().clone(),
        output: output.output().clone(),
        function: Function::combine(vec![loss, error, output], MODEL),
    };
    network.verify_structure(spec.expected_parameter_count())?;

    debug!(
        "built '{}': {} parameters, {} nodes",
        MODEL,
        spec.expected_parameter_count(),
        network.function.nodes().len()
    );
    Ok(network)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use crate::params::ParameterStore;

    fn spec(hidden_layers: usize) -> NetworkSpec {
        NetworkSpec::new(5, 4, hidden_layers, 6)
    }

    #[test]
    fn structural_counts_for_any_depth() {
        for h in 1..=6 {
            let shared = ParameterStore::new(&spec(h), Device::Cpu, 1).unwrap().freeze();
            let net = build_shared_network(&spec(h), &shared).unwrap();
            let f = net.function();
            assert_eq!(f.parameters().len(), 2 * h + 1);
            assert_eq!(f.arguments().len(), 2);
            assert_eq!(f.outputs().len(), 3);

            let private = build_private_network(&spec(h), Device::Cpu, 3).unwrap();
            assert_eq!(private.parameters().len(), 2 * h + 1);
        }
    }

    #[test]
    fn outputs_are_loss_error_then_raw_output() {
        let net = build_private_network(&spec(2), Device::Cpu, 1).unwrap();
        let names: Vec<String> = net.function().outputs().iter().map(|v| v.name().to_string()).collect();
        assert_eq!(names, vec![LOSS, CLASSIFICATION_ERROR, CLASSIFIER_OUTPUT]);
        assert_eq!(net.function().name(), MODEL);
        assert_eq!(net.output().shape(), &Shape::vector(4));
        assert_eq!(net.features().name(), FEATURES);
        assert_eq!(net.labels().shape(), &Shape::vector(4));
    }

    #[test]
    fn networks_over_one_store_share_parameter_identity() {
        let store = ParameterStore::new(&spec(3), Device::Cpu, 1).unwrap();
        let bias = store.layers()[0].1.clone();
        let shared = store.freeze();

        let a = build_shared_network(&spec(3), &shared).unwrap();
        let b = build_shared_network(&spec(3), &shared).unwrap();
        for (p, q) in a.parameters().iter().zip(b.parameters().iter()) {
            assert!(p.same_as(q));
        }
        assert_ne!(a.features(), b.features());
        assert!(a.parameters().iter().any(|p| p.same_as(&bias)));
    }

    #[test]
    fn mutation_before_freeze_is_seen_by_every_network() {
        let store = ParameterStore::new(&spec(1), Device::Cpu, 1).unwrap();
        let out_w = store.output_weight().clone();
        out_w.set_value(Matrix::filled(4, 6, 0.25)).unwrap();
        let shared = store.freeze();

        let a = build_shared_network(&spec(1), &shared).unwrap();
        let b = build_shared_network(&spec(1), &shared).unwrap();
        let last = |n: &ClassifierNetwork| n.parameters().into_iter().find(|p| p.name() == "Wout").unwrap();
        assert!(last(&a).value().data().iter().all(|&x| x == 0.25));
        assert!(last(&b).same_as(&out_w));
    }

    #[test]
    fn rebuilding_is_structurally_idempotent() {
        let first = build_private_network(&spec(4), Device::Cpu, 1).unwrap();
        let second = build_private_network(&spec(4), Device::Cpu, 2).unwrap();
        assert_eq!(first.function().nodes().len(), second.function().nodes().len());
        assert_eq!(first.parameters().len(), second.parameters().len());
    }

    #[test]
    fn store_for_another_spec_is_rejected() {
        let shared = ParameterStore::new(&spec(2), Device::Cpu, 1).unwrap().freeze();
        let err = build_shared_network(&spec(3), &shared).unwrap_err();
        assert!(matches!(err, EvalError::StoreMismatch { .. }));
    }

    #[test]
    fn preconditions() {
        let x = Variable::input(Shape::matrix(5, 1), "x");
        let w = Parameter::constant("W", Shape::matrix(6, 5), 0.0, Device::Cpu);
        let b = Parameter::constant("b", Shape::vector(6), 0.0, Device::Cpu);
        assert!(matches!(
            dense_layer(&Node::from(&x), &w, &b, Activation::Sigmoid),
            Err(EvalError::InvalidInputRank { rank: 2, .. })
        ));

        let x = Variable::input(Shape::vector(5), "x");
        assert!(matches!(
            classifier(&Node::from(&x), &[], &w, Activation::Sigmoid),
            Err(EvalError::NoHiddenLayers)
        ));
        assert!(matches!(
            build_private_network(&spec(0), Device::Cpu, 1),
            Err(EvalError::NoHiddenLayers)
        ));
    }

    #[test]
    fn bias_shared_between_layers_breaks_the_parameter_count() {
        // reusing one bias in two layers yields 2H parameters instead of 2H+1
        let s = NetworkSpec::new(6, 4, 2, 6);
        let w0 = Parameter::uniform("W0", Shape::matrix(6, 6), -0.5, 0.5, 1, Device::Cpu);
        let w1 = Parameter::uniform("W1", Shape::matrix(6, 6), -0.5, 0.5, 2, Device::Cpu);
        let b = Parameter::constant("b", Shape::vector(6), 0.0, Device::Cpu);
        let out = Parameter::uniform("Wout", Shape::matrix(4, 6), -0.5, 0.5, 3, Device::Cpu);
        let err = assemble(&s, &[(w0, b.clone()), (w1, b)], &out).unwrap_err();
        assert!(matches!(
            err,
            EvalError::StructureMismatch { what: "Parameter", expected: 5, actual: 4, .. }
        ));
    }
}
