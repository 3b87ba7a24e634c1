//! Error type shared by graph construction, evaluation and the driver.

use thiserror::Error;

use crate::tensor::shape::Shape;

/// Errors raised while building, evaluating or fanning out a network.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("Input variable '{name}' must have rank 1, got rank {rank}")]
    InvalidInputRank { name: String, rank: usize },

    #[error("Network needs at least one hidden layer")]
    NoHiddenLayers,

    #[error("Invalid network spec: {message}")]
    InvalidSpec { message: String },

    #[error("{function}: function does not have expected {what} count (expected {expected}, got {actual})")]
    StructureMismatch {
        function: String,
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Parameter store does not match the network spec: {message}")]
    StoreMismatch { message: String },

    #[error("Shape mismatch for '{name}': expected {expected}, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: Shape,
        actual: Shape,
    },

    #[error("Value data holds {actual} elements but shape {shape} needs {expected}")]
    DataLengthMismatch {
        shape: Shape,
        expected: usize,
        actual: usize,
    },

    #[error("No value bound for argument '{name}'")]
    MissingBinding { name: String },

    #[error("'{name}' is not an output of function '{function}'")]
    UnknownOutput { name: String, function: String },

    #[error("Clone of '{function}' has no counterpart for variable '{name}'")]
    UnmappedVariable { name: String, function: String },

    #[error("Parameter '{name}' is frozen and cannot be modified")]
    ParameterFrozen { name: String },

    #[error("Invalid device selector: {0}")]
    InvalidDevice(String),

    #[error("Device {0} has no compute kernels")]
    UnsupportedDevice(String),

    #[error("Thread count must be at least 1")]
    InvalidThreadCount,

    #[error("Worker thread {thread} panicked")]
    WorkerPanicked { thread: usize },

    #[error("Worker thread {thread} failed: {source}")]
    WorkerFailed {
        thread: usize,
        #[source]
        source: Box<EvalError>,
    },

    #[error("{pending} worker thread(s) still running after {timeout_ms} ms")]
    JoinTimeout { pending: usize, timeout_ms: u64 },

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EvalError>;
