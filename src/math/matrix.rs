use rand::distributions::{Distribution, Uniform};
use rand::Rng;

/// Dense row-major `f32` matrix.
///
/// Activations are kept one sample per row, so a batch of `n` samples of
/// width `d` is an `n x d` matrix. Weights are stored `out x in`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub rows: usize,
    pub cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix::filled(rows, cols, 0.0)
    }

    pub fn filled(rows: usize, cols: usize, value: f32) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Samples every element uniformly from `[low, high]`.
    pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, low: f32, high: f32, rng: &mut R) -> Matrix {
        let dist = Uniform::new_inclusive(low.min(high), low.max(high));
        let data = dist.sample_iter(rng).take(rows * cols).collect();
        Matrix { rows, cols, data }
    }

    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Matrix {
        assert_eq!(data.len(), rows * cols, "Matrix data does not match {rows}x{cols}");
        Matrix { rows, cols, data }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[f32]> {
        // chunks_exact(0) panics, and a zero-width matrix has no meaningful rows anyway
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f32) -> f32,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&x| functor(x)).collect(),
        }
    }

    /// `self * rhs^T`: `(n x k) * (m x k)^T = n x m`.
    ///
    /// Both operands are walked row by row, which keeps the inner dot
    /// product on contiguous memory for `out x in` weights.
    pub fn matmul_transposed(&self, rhs: &Matrix) -> Matrix {
        if self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.rows);
        for i in 0..self.rows {
            let a = self.row(i);
            for j in 0..rhs.rows {
                let b = rhs.row(j);
                res.data[i * rhs.rows + j] = a.iter().zip(b).map(|(x, y)| x * y).sum();
            }
        }

        res
    }

    /// Adds `bias` to every row.
    pub fn add_row(&self, bias: &[f32]) -> Matrix {
        if self.cols != bias.len() {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = self.clone();
        for row in res.data.chunks_exact_mut(self.cols.max(1)) {
            for (x, b) in row.iter_mut().zip(bias) {
                *x += b;
            }
        }

        res
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn matmul_transposed_matches_hand_computation() {
        // x: 2 samples of width 3, w: 2 outputs x 3 inputs
        let x = Matrix::from_vec(2, 3, vec![1., 2., 3., 4., 5., 6.]);
        let w = Matrix::from_vec(2, 3, vec![1., 0., -1., 0.5, 0.5, 0.5]);
        let y = x.matmul_transposed(&w);
        assert_eq!((y.rows, y.cols), (2, 2));
        assert_approx_eq!(y.row(0)[0], -2.0);
        assert_approx_eq!(y.row(0)[1], 3.0);
        assert_approx_eq!(y.row(1)[0], -2.0);
        assert_approx_eq!(y.row(1)[1], 7.5);
    }

    #[test]
    #[should_panic]
    fn matmul_rejects_inner_mismatch() {
        Matrix::zeros(2, 3).matmul_transposed(&Matrix::zeros(2, 4));
    }

    #[test]
    fn add_row_broadcasts() {
        let m = Matrix::from_vec(2, 2, vec![1., 2., 3., 4.]).add_row(&[10., 20.]);
        assert_eq!(m.data(), &[11., 22., 13., 24.]);
    }

    #[test]
    fn uniform_is_seeded_and_bounded() {
        let a = Matrix::uniform(8, 8, -0.5, 0.5, &mut StdRng::seed_from_u64(1));
        let b = Matrix::uniform(8, 8, -0.5, 0.5, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
        assert!(a.data().iter().all(|x| (-0.5..=0.5).contains(x)));
    }

    #[test]
    fn rows_iter_yields_every_row() {
        let m = Matrix::from_vec(3, 2, vec![1., 2., 3., 4., 5., 6.]);
        let rows: Vec<&[f32]> = m.rows_iter().collect();
        assert_eq!(rows, vec![&[1., 2.][..], &[3., 4.][..], &[5., 6.][..]]);
    }
}
