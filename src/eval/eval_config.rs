use serde::{Deserialize, Serialize};

/// How many forward passes each worker runs, and over what batches.
///
/// # Fields
/// - `iterations`: forward passes per `run_evaluation` call
/// - `batch_size`: samples per randomly generated batch
/// - `seed`      : seed for the per-call batch generator; every call
///                  starts from this seed, so workers repeat the same
///                  sequence of batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub iterations: usize,
    pub batch_size: usize,
    pub seed: u64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        EvalConfig {
            iterations: 4,
            batch_size: 3,
            seed: 2,
        }
    }
}

impl EvalConfig {
    pub fn new(iterations: usize, batch_size: usize, seed: u64) -> Self {
        EvalConfig { iterations, batch_size, seed }
    }
}
