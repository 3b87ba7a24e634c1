use std::ops::Deref;
use std::sync::Arc;

use log::debug;

use crate::device::Device;
use crate::errors::{EvalError, Result};
use crate::network::spec::NetworkSpec;
use crate::params::parameter::Parameter;
use crate::tensor::shape::Shape;

/// Initial weight range of the shared store.
pub const SHARED_INIT_RANGE: f32 = 0.5;

/// One weight/bias pair per hidden layer plus the output projection.
///
/// `layers[0]` maps the input to the first hidden layer, the rest map
/// hidden to hidden. The output projection has no bias.
#[derive(Debug)]
pub struct ParameterStore {
    layers: Vec<(Parameter, Parameter)>,
    output_weight: Parameter,
    device: Device,
}

/// A frozen store published for concurrent read-only use.
///
/// Only [`ParameterStore::freeze`] produces one, so anything that receives
/// a `SharedParameters` can rely on no writer running alongside it.
#[derive(Debug, Clone)]
pub struct SharedParameters(Arc<ParameterStore>);

impl ParameterStore {
    /// Allocates every parameter for `spec` on `device`.
    ///
    /// Weights are uniform in `[-0.5, 0.5]`, biases start at zero. Each
    /// weight gets its own seed derived from `seed`.
    pub fn new(spec: &NetworkSpec, device: Device, seed: u64) -> Result<ParameterStore> {
        spec.validate()?;
        let r = SHARED_INIT_RANGE;

        let mut layers = Vec::with_capacity(spec.hidden_layers);
        for i in 0..spec.hidden_layers {
            let fan_in = if i == 0 { spec.input_dim } else { spec.hidden_dim };
            let weight = Parameter::uniform(
                &format!("W{i}"),
                Shape::matrix(spec.hidden_dim, fan_in),
                -r,
                r,
                seed.wrapping_add(i as u64),
                device,
            );
            let bias = Parameter::constant(&format!("b{i}"), Shape::vector(spec.hidden_dim), 0.0, device);
            layers.push((weight, bias));
        }

        let output_weight = Parameter::uniform(
            "Wout",
            Shape::matrix(spec.num_classes, spec.hidden_dim),
            -r,
            r,
            seed.wrapping_add(spec.hidden_layers as u64),
            device,
        );

        debug!(
            "allocated parameter store: {} hidden layers, {} parameters on {}",
            spec.hidden_layers,
            spec.expected_parameter_count(),
            device
        );

        Ok(ParameterStore { layers, output_weight, device })
    }

    pub fn layers(&self) -> &[(Parameter, Parameter)] {
        &self.layers
    }

    pub fn output_weight(&self) -> &Parameter {
        &self.output_weight
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// All parameters, layer by layer (weight before bias), output last.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.layers
            .iter()
            .flat_map(|(w, b)| [w.clone(), b.clone()])
            .chain(std::iter::once(self.output_weight.clone()))
            .collect()
    }

    /// Checks that this store has the layout `spec` describes.
    pub fn check_matches(&self, spec: &NetworkSpec) -> Result<()> {
        if self.layers.len() != spec.hidden_layers {
            return Err(EvalError::StoreMismatch {
                message: format!(
                    "store has {} hidden layers, spec asks for {}",
                    self.layers.len(),
                    spec.hidden_layers
                ),
            });
        }
        for (i, (w, b)) in self.layers.iter().enumerate() {
            let fan_in = if i == 0 { spec.input_dim } else { spec.hidden_dim };
            expect_shape(w, &Shape::matrix(spec.hidden_dim, fan_in))?;
            expect_shape(b, &Shape::vector(spec.hidden_dim))?;
        }
        expect_shape(&self.output_weight, &Shape::matrix(spec.num_classes, spec.hidden_dim))
    }

    /// Marks every parameter frozen and publishes the store for sharing.
    pub fn freeze(self) -> SharedParameters {
        for p in self.parameters() {
            p.freeze();
        }
        SharedParameters(Arc::new(self))
    }
}

fn expect_shape(p: &Parameter, expected: &Shape) -> Result<()> {
    if p.shape() != expected {
        return Err(EvalError::StoreMismatch {
            message: format!("parameter '{}' has shape {}, expected {}", p.name(), p.shape(), expected),
        });
    }
    Ok(())
}

impl SharedParameters {
    /// Number of live handles to the store, this one included.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl Deref for SharedParameters {
    type Target = ParameterStore;

    fn deref(&self) -> &ParameterStore {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;

    fn small_spec() -> NetworkSpec {
        NetworkSpec::new(4, 3, 2, 6)
    }

    #[test]
    fn layout_follows_spec() {
        let store = ParameterStore::new(&small_spec(), Device::Cpu, 1).unwrap();
        assert_eq!(store.parameters().len(), 5);
        assert_eq!(store.layers()[0].0.shape(), &Shape::matrix(6, 4));
        assert_eq!(store.layers()[1].0.shape(), &Shape::matrix(6, 6));
        assert_eq!(store.output_weight().shape(), &Shape::matrix(3, 6));
        assert!(store.layers()[0].1.value().data().iter().all(|&x| x == 0.0));
        store.check_matches(&small_spec()).unwrap();
    }

    #[test]
    fn mismatched_spec_is_reported() {
        let store = ParameterStore::new(&small_spec(), Device::Cpu, 1).unwrap();
        let err = store.check_matches(&NetworkSpec::new(5, 3, 2, 6)).unwrap_err();
        assert!(matches!(err, EvalError::StoreMismatch { .. }));
        let err = store.check_matches(&NetworkSpec::new(4, 3, 3, 6)).unwrap_err();
        assert!(matches!(err, EvalError::StoreMismatch { .. }));
    }

    #[test]
    fn same_seed_same_weights() {
        let a = ParameterStore::new(&small_spec(), Device::Cpu, 9).unwrap();
        let b = ParameterStore::new(&small_spec(), Device::Cpu, 9).unwrap();
        assert_eq!(*a.output_weight().value(), *b.output_weight().value());
        assert!(!a.output_weight().same_as(b.output_weight()));
    }

    #[test]
    fn freeze_locks_every_parameter() {
        let store = ParameterStore::new(&small_spec(), Device::Cpu, 1).unwrap();
        let bias = store.layers()[1].1.clone();
        bias.set_value(Matrix::filled(1, 6, 1.0)).unwrap();

        let shared = store.freeze();
        assert!(shared.parameters().iter().all(Parameter::is_frozen));
        assert!(bias.set_value(Matrix::zeros(1, 6)).is_err());
        assert_eq!(bias.value().data(), &[1.0; 6]);
    }

    #[test]
    fn zero_hidden_layers_cannot_be_allocated() {
        let err = ParameterStore::new(&NetworkSpec::new(4, 3, 0, 6), Device::Cpu, 1).unwrap_err();
        assert!(matches!(err, EvalError::NoHiddenLayers));
    }
}
