pub mod builder;
pub mod classifier;
pub mod spec;

pub use builder::{build_private_network, build_shared_network, classifier, dense_layer};
pub use classifier::ClassifierNetwork;
pub use spec::NetworkSpec;
