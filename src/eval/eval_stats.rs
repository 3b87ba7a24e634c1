use serde::{Deserialize, Serialize};

/// Summary of one forward pass over one batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalStats {
    /// 1-based iteration number.
    pub iteration: usize,
    pub num_samples: usize,
    /// Mean cross-entropy loss over the batch.
    pub mean_loss: f32,
    /// Fraction of misclassified samples in [0, 1].
    pub error_rate: f32,
    /// Wall-clock duration of the forward pass in microseconds.
    pub elapsed_us: u64,
}
