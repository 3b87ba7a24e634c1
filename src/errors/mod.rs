pub mod eval_error;

pub use eval_error::{EvalError, Result};
