pub mod shape;
pub mod value;

pub use shape::Shape;
pub use value::Value;
