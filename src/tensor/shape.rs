use serde::{Deserialize, Serialize};
use std::fmt;

/// Dimensions of a tensor, first axis first.
///
/// A batch of `n` samples for a variable of dimension `d` has shape
/// `[d, 1, n]`: the middle axis is a sequence axis of length one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape(pub Vec<usize>);

impl Shape {
    pub fn new(dims: &[usize]) -> Shape {
        Shape(dims.to_vec())
    }

    pub fn vector(dim: usize) -> Shape {
        Shape(vec![dim])
    }

    pub fn matrix(rows: usize, cols: usize) -> Shape {
        Shape(vec![rows, cols])
    }

    /// `[dim, 1, num_samples]`
    pub fn batch(dim: usize, num_samples: usize) -> Shape {
        Shape(vec![dim, 1, num_samples])
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn total_size(&self) -> usize {
        self.0.iter().product()
    }

    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.0.get(axis).copied()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_shape_layout() {
        let s = Shape::batch(937, 3);
        assert_eq!(s.dims(), &[937, 1, 3]);
        assert_eq!(s.rank(), 3);
        assert_eq!(s.total_size(), 2811);
        assert_eq!(s.to_string(), "[937 x 1 x 3]");
    }

    #[test]
    fn scalar_shape_has_unit_size() {
        let s = Shape::new(&[]);
        assert_eq!(s.rank(), 0);
        assert_eq!(s.total_size(), 1);
        assert_eq!(s.dim(0), None);
    }
}
