//! Immutable computation graphs over shared parameters.
//!
//! Nodes are built with the constructors in [`ops`] and bundled into a
//! multi-output [`Function`], which can then be evaluated with bound values.

mod function;
mod node;
mod variable;

pub use function::Function;
pub use node::{ops, Node, NodeId, Op};
pub use variable::{Variable, VariableId, VariableKind};
