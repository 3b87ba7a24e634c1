pub mod math;
pub mod device;
pub mod tensor;
pub mod activation;
pub mod errors;
pub mod params;
pub mod graph;
pub mod loss;
pub mod network;
pub mod eval;
pub mod driver;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use device::Device;
pub use tensor::{Shape, Value};
pub use activation::activation::Activation;
pub use errors::{EvalError, Result};
pub use params::{Parameter, ParameterStore, SharedParameters};
pub use graph::{Function, Node, Variable};
pub use network::{build_private_network, build_shared_network, ClassifierNetwork, NetworkSpec};
pub use eval::{run_evaluation, EvalConfig, EvalStats};
pub use driver::{
    eval_multi_threads_with_clone, eval_multi_threads_with_new_network, DriverConfig, DriverReport,
};
