use serde::{Deserialize, Serialize};

use crate::activation::activation::Activation;
use crate::errors::{EvalError, Result};

/// Dimensions of a fully connected feed-forward classifier.
///
/// Fields:
/// - `input_dim`    : width of the `features` input variable
/// - `num_classes`  : width of the `labels` input and of the raw output
/// - `hidden_layers`: number of (linear → nonlinearity) blocks, at least 1
/// - `hidden_dim`   : width of every hidden layer
/// - `activation`   : nonlinearity applied after each hidden layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub input_dim: usize,
    pub num_classes: usize,
    pub hidden_layers: usize,
    pub hidden_dim: usize,
    #[serde(default)]
    pub activation: Activation,
}

impl Default for NetworkSpec {
    fn default() -> Self {
        NetworkSpec {
            input_dim: 937,
            num_classes: 9304,
            hidden_layers: 6,
            hidden_dim: 2048,
            activation: Activation::Sigmoid,
        }
    }
}

impl NetworkSpec {
    pub fn new(input_dim: usize, num_classes: usize, hidden_layers: usize, hidden_dim: usize) -> NetworkSpec {
        NetworkSpec {
            input_dim,
            num_classes,
            hidden_layers,
            hidden_dim,
            activation: Activation::Sigmoid,
        }
    }

    /// Parameters a built network must expose: one weight and one bias per
    /// hidden layer plus the output projection weight.
    pub fn expected_parameter_count(&self) -> usize {
        self.hidden_layers * 2 + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden_layers == 0 {
            return Err(EvalError::NoHiddenLayers);
        }
        for (field, value) in [
            ("input_dim", self.input_dim),
            ("num_classes", self.num_classes),
            ("hidden_dim", self.hidden_dim),
        ] {
            if value == 0 {
                return Err(EvalError::InvalidSpec { message: format!("{field} must be at least 1") });
            }
        }
        Ok(())
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_the_reference_scenario() {
        let spec = NetworkSpec::default();
        assert_eq!(spec.input_dim, 937);
        assert_eq!(spec.num_classes, 9304);
        assert_eq!(spec.expected_parameter_count(), 13);
    }

    #[test]
    fn zero_hidden_layers_is_rejected() {
        let spec = NetworkSpec::new(4, 3, 0, 8);
        assert!(matches!(spec.validate(), Err(EvalError::NoHiddenLayers)));
    }

    #[test]
    fn zero_width_is_rejected() {
        let spec = NetworkSpec::new(4, 0, 2, 8);
        assert!(matches!(spec.validate(), Err(EvalError::InvalidSpec { .. })));
    }

    #[test]
    fn activation_defaults_when_missing_from_json() {
        let spec: NetworkSpec = serde_json::from_str(
            r#"{"input_dim": 4, "num_classes": 3, "hidden_layers": 2, "hidden_dim": 8}"#,
        )
        .unwrap();
        assert_eq!(spec.activation, Activation::Sigmoid);
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join(format!("shared-eval-spec-{}.json", std::process::id()));
        let path = path.to_str().unwrap();
        let spec = NetworkSpec::new(5, 2, 3, 16);
        spec.save_json(path).unwrap();
        assert_eq!(NetworkSpec::load_json(path).unwrap(), spec);
        let _ = std::fs::remove_file(path);
    }
}
