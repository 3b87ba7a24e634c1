pub mod driver_config;
pub mod fan_out;
pub mod report;

pub use driver_config::DriverConfig;
pub use fan_out::{eval_multi_threads_with_clone, eval_multi_threads_with_new_network, eval_with_shared_parameters};
pub use report::{DriverReport, WorkerReport};
