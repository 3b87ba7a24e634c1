use serde::{Deserialize, Serialize};

use crate::eval::eval_stats::EvalStats;

/// What one worker thread produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    /// 0-based index in spawn order.
    pub thread: usize,
    pub stats: Vec<EvalStats>,
}

/// Outcome of a fan-out run, workers in join order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverReport {
    pub workers: Vec<WorkerReport>,
    pub elapsed_ms: u64,
}

impl DriverReport {
    /// Forward passes completed across all workers.
    pub fn total_evaluations(&self) -> usize {
        self.workers.iter().map(|w| w.stats.len()).sum()
    }

    pub fn mean_loss(&self) -> f32 {
        let all: Vec<f32> = self
            .workers
            .iter()
            .flat_map(|w| w.stats.iter().map(|s| s.mean_loss))
            .collect();
        if all.is_empty() {
            return 0.0;
        }
        all.iter().sum::<f32>() / all.len() as f32
    }
}
