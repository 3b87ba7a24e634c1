use crate::device::Device;
use crate::errors::{EvalError, Result};
use crate::math::matrix::Matrix;
use crate::tensor::shape::Shape;

/// A concrete tensor bound to one variable for one evaluation call.
///
/// Data is laid out first axis fastest, so for a `[d, 1, n]` batch
/// sample `i` is the slice `data[i*d .. (i+1)*d]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    shape: Shape,
    data: Vec<f32>,
    device: Device,
}

impl Value {
    pub fn new(shape: Shape, data: Vec<f32>, device: Device) -> Result<Value> {
        let expected = shape.total_size();
        if data.len() != expected {
            return Err(EvalError::DataLengthMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Value { shape, data, device })
    }

    /// Wraps a `[num_samples, dim]` activation matrix as a `[dim, 1, num_samples]` batch.
    pub fn from_batch_matrix(m: Matrix, device: Device) -> Value {
        let shape = Shape::batch(m.cols, m.rows);
        Value { shape, data: m.into_data(), device }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Number of samples along the last axis.
    pub fn num_samples(&self) -> usize {
        self.batch_dims().0
    }

    /// Values of sample `i`, or `None` when out of range.
    pub fn sample(&self, i: usize) -> Option<&[f32]> {
        let (n, width) = self.batch_dims();
        if i >= n {
            return None;
        }
        self.data.get(i * width..(i + 1) * width)
    }

    /// Reinterprets the batch as a `[num_samples, dim]` matrix, one row per sample.
    pub fn to_batch_matrix(&self) -> Matrix {
        let (n, width) = self.batch_dims();
        Matrix::from_vec(n, width, self.data.clone())
    }

    /// (samples along the last axis, elements per sample)
    fn batch_dims(&self) -> (usize, usize) {
        match self.shape.dims().split_last() {
            Some((n, rest)) => (*n, rest.iter().product()),
            None => (1, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_data_length() {
        let err = Value::new(Shape::batch(4, 2), vec![0.0; 7], Device::Cpu).unwrap_err();
        assert!(matches!(err, EvalError::DataLengthMismatch { expected: 8, actual: 7, .. }));
    }

    #[test]
    fn samples_are_contiguous() {
        let v = Value::new(Shape::batch(2, 3), vec![1., 2., 3., 4., 5., 6.], Device::Cpu).unwrap();
        assert_eq!(v.num_samples(), 3);
        assert_eq!(v.sample(1), Some(&[3.0, 4.0][..]));
        assert_eq!(v.sample(3), None);

        let m = v.to_batch_matrix();
        assert_eq!((m.rows, m.cols), (3, 2));
        assert_eq!(m.row(2), &[5.0, 6.0]);
        assert_eq!(Value::from_batch_matrix(m, Device::Cpu), v);
    }

    #[test]
    fn empty_batch_keeps_its_width() {
        let v = Value::new(Shape::batch(4, 0), vec![], Device::Cpu).unwrap();
        let m = v.to_batch_matrix();
        assert_eq!((m.rows, m.cols), (0, 4));
        assert_eq!(v.sample(0), None);
    }
}
