use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::tensor::shape::Shape;

static VARIABLE_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub type VariableId = usize;

fn next_variable_id() -> VariableId {
    VARIABLE_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// External input, bound to a `Value` at evaluation time.
    Input,
    /// Result of a graph node.
    Output,
}

struct VariableInner {
    id: VariableId,
    name: String,
    shape: Shape,
    kind: VariableKind,
}

/// Named, shaped placeholder in a graph. Has no storage of its own.
///
/// The shape is per sample; a bound value carries the batch axes on top,
/// see [`Shape::batch`]. Equality and hashing go by identity, so two
/// variables with the same name are still distinct.
#[derive(Clone)]
pub struct Variable(Arc<VariableInner>);

impl Variable {
    pub fn input(shape: Shape, name: &str) -> Variable {
        Variable::new(shape, name, VariableKind::Input)
    }

    pub(crate) fn output(shape: Shape, name: &str) -> Variable {
        Variable::new(shape, name, VariableKind::Output)
    }

    fn new(shape: Shape, name: &str, kind: VariableKind) -> Variable {
        Variable(Arc::new(VariableInner {
            id: next_variable_id(),
            name: name.to_string(),
            shape,
            kind,
        }))
    }

    /// Same name, shape and kind under a fresh identity.
    pub(crate) fn renewed(&self) -> Variable {
        Variable::new(self.0.shape.clone(), &self.0.name, self.0.kind)
    }

    pub fn id(&self) -> VariableId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn shape(&self) -> &Shape {
        &self.0.shape
    }

    pub fn kind(&self) -> VariableKind {
        self.0.kind
    }

    pub fn is_input(&self) -> bool {
        self.0.kind == VariableKind::Input
    }
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}('{}', {}, #{})", self.0.kind, self.0.name, self.0.shape, self.0.id)
    }
}
