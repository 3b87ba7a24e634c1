pub mod classification_error;
pub mod cross_entropy;

pub use classification_error::ClassificationError;
pub use cross_entropy::CrossEntropyWithSoftmax;
