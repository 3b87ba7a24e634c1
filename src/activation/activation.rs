use serde::{Deserialize, Serialize};

/// Element-wise nonlinearity applied after each hidden layer's bias add.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Activation {
    #[default]
    Sigmoid,
    ReLU,
    Tanh,
    Identity,
    LeakyReLU { alpha: f32 },
}

impl Activation {
    pub fn function(&self, x: f32) -> f32 {
        match self {
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::ReLU => if x > 0.0 { x } else { 0.0 },
            Activation::Tanh => x.tanh(),
            Activation::Identity => x,
            Activation::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
        }
    }

    /// Short operator name used when naming graph nodes.
    pub fn op_name(&self) -> &'static str {
        match self {
            Activation::Sigmoid => "Sigmoid",
            Activation::ReLU => "ReLU",
            Activation::Tanh => "Tanh",
            Activation::Identity => "Identity",
            Activation::LeakyReLU { .. } => "LeakyReLU",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn sigmoid_is_centered() {
        assert_approx_eq!(Activation::Sigmoid.function(0.0), 0.5);
        assert!(Activation::Sigmoid.function(50.0) <= 1.0);
        assert!(Activation::Sigmoid.function(-50.0) >= 0.0);
    }

    #[test]
    fn piecewise_variants() {
        assert_eq!(Activation::ReLU.function(-2.0), 0.0);
        assert_eq!(Activation::ReLU.function(2.0), 2.0);
        assert_approx_eq!(Activation::LeakyReLU { alpha: 0.1 }.function(-2.0), -0.2);
        assert_eq!(Activation::Identity.function(-3.5), -3.5);
    }
}
