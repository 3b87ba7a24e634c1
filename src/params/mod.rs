pub mod parameter;
pub mod store;

pub use parameter::{ParamId, Parameter};
pub use store::{ParameterStore, SharedParameters};
