use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::device::Device;
use crate::errors::{EvalError, Result};
use crate::math::matrix::Matrix;
use crate::tensor::shape::Shape;

static PARAM_ID_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Unique identifier of a parameter's storage.
pub type ParamId = usize;

fn next_param_id() -> ParamId {
    PARAM_ID_COUNTER.fetch_add(1, Ordering::SeqCst)
}

struct ParamInner {
    id: ParamId,
    name: String,
    shape: Shape,
    device: Device,
    value: RwLock<Matrix>,
    frozen: AtomicBool,
}

/// A named, fixed-shape weight or bias tensor.
///
/// `Parameter` is a handle: cloning it shares the underlying storage, so
/// every graph that holds a clone sees the same values. Any number of
/// threads may read concurrently. Writes go through [`Parameter::set_value`]
/// and are refused once the parameter has been frozen.
#[derive(Clone)]
pub struct Parameter(Arc<ParamInner>);

/// Storage layout for a parameter shape: `[out, in]` is `out x in`,
/// `[n]` is a single row.
fn matrix_dims(shape: &Shape) -> (usize, usize) {
    match shape.dims() {
        [] => (1, 1),
        [n] => (1, *n),
        [rows, rest @ ..] => (*rows, rest.iter().product()),
    }
}

impl Parameter {
    fn from_matrix(name: &str, shape: Shape, value: Matrix, device: Device) -> Parameter {
        Parameter(Arc::new(ParamInner {
            id: next_param_id(),
            name: name.to_string(),
            shape,
            device,
            value: RwLock::new(value),
            frozen: AtomicBool::new(false),
        }))
    }

    /// Every element drawn uniformly from `[low, high]` with a seeded generator.
    pub fn uniform(name: &str, shape: Shape, low: f32, high: f32, seed: u64, device: Device) -> Parameter {
        let (rows, cols) = matrix_dims(&shape);
        let mut rng = StdRng::seed_from_u64(seed);
        let value = Matrix::uniform(rows, cols, low, high, &mut rng);
        Parameter::from_matrix(name, shape, value, device)
    }

    pub fn constant(name: &str, shape: Shape, value: f32, device: Device) -> Parameter {
        let (rows, cols) = matrix_dims(&shape);
        Parameter::from_matrix(name, shape, Matrix::filled(rows, cols, value), device)
    }

    pub fn id(&self) -> ParamId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn shape(&self) -> &Shape {
        &self.0.shape
    }

    pub fn device(&self) -> Device {
        self.0.device
    }

    /// True when both handles point at the same storage.
    pub fn same_as(&self, other: &Parameter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Read access to the current values. Many readers may hold this at once.
    pub fn value(&self) -> RwLockReadGuard<'_, Matrix> {
        // The lock only guards plain data, so a poisoned guard is still usable.
        self.0.value.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_frozen(&self) -> bool {
        self.0.frozen.load(Ordering::Acquire)
    }

    /// Replaces the stored values. Fails once frozen or on a different shape.
    pub fn set_value(&self, value: Matrix) -> Result<()> {
        let mut guard = self.0.value.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_frozen() {
            return Err(EvalError::ParameterFrozen { name: self.0.name.clone() });
        }
        if (value.rows, value.cols) != (guard.rows, guard.cols) {
            return Err(EvalError::ShapeMismatch {
                name: self.0.name.clone(),
                expected: Shape::matrix(guard.rows, guard.cols),
                actual: Shape::matrix(value.rows, value.cols),
            });
        }
        *guard = value;
        Ok(())
    }

    /// One-way switch; taken under the write lock so no write is in flight.
    pub(crate) fn freeze(&self) {
        let _guard = self.0.value.write().unwrap_or_else(PoisonError::into_inner);
        self.0.frozen.store(true, Ordering::Release);
    }
}

impl PartialEq for Parameter {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Parameter {}

impl Hash for Parameter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parameter")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("shape", &self.0.shape)
            .field("device", &self.0.device)
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
