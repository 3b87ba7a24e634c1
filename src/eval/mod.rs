pub mod batch;
pub mod eval_config;
pub mod eval_stats;
pub mod evaluator;
pub mod runner;

pub use batch::random_batch;
pub use eval_config::EvalConfig;
pub use eval_stats::EvalStats;
pub use evaluator::forward;
pub use runner::run_evaluation;
