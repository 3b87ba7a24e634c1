use crate::errors::{EvalError, Result};
use crate::graph::{Function, Variable};
use crate::params::Parameter;

/// A built classifier graph plus handles to its named variables.
///
/// The function's outputs are, in order: loss, classification error and
/// the raw classifier output.
#[derive(Debug, Clone)]
pub struct ClassifierNetwork {
    pub(crate) function: Function,
    pub(crate) features: Variable,
    pub(crate) labels: Variable,
    pub(crate) loss: Variable,
    pub(crate) error: Variable,
    pub(crate) output: Variable,
}

impl ClassifierNetwork {
    pub fn function(&self) -> &Function {
        &self.function
    }

    pub fn features(&self) -> &Variable {
        &self.features
    }

    pub fn labels(&self) -> &Variable {
        &self.labels
    }

    pub fn loss(&self) -> &Variable {
        &self.loss
    }

    pub fn error(&self) -> &Variable {
        &self.error
    }

    pub fn output(&self) -> &Variable {
        &self.output
    }

    pub fn parameters(&self) -> Vec<Parameter> {
        self.function.parameters()
    }

    /// Fails with `StructureMismatch` unless the function exposes exactly
    /// `expected_parameters` parameters, 2 arguments and 3 outputs.
    pub fn verify_structure(&self, expected_parameters: usize) -> Result<()> {
        let f = &self.function;
        let counts = [
            ("Parameter", expected_parameters, f.parameters().len()),
            ("Argument", 2, f.arguments().len()),
            ("Output", 3, f.outputs().len()),
        ];
        for (what, expected, actual) in counts {
            if expected != actual {
                return Err(EvalError::StructureMismatch {
                    function: f.name().to_string(),
                    what,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }

    /// Marks every parameter read-only. Networks handed to other threads
    /// are frozen first, same as a published store.
    pub(crate) fn freeze(&self) {
        for p in self.parameters() {
            p.freeze();
        }
    }

    /// Structural copy with its own variables, reading the same parameters.
    pub fn clone_shared(&self) -> Result<ClassifierNetwork> {
        let (function, map) = self.function.clone_shared();
        let remap = |v: &Variable| {
            map.get(v).cloned().ok_or_else(|| EvalError::UnmappedVariable {
                name: v.name().to_string(),
                function: self.function.name().to_string(),
            })
        };
        Ok(ClassifierNetwork {
            features: remap(&self.features)?,
            labels: remap(&self.labels)?,
            loss: remap(&self.loss)?,
            error: remap(&self.error)?,
            output: remap(&self.output)?,
            function,
        })
    }
}
