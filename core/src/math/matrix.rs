use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

pub struct MatrixHelper;

impl MatrixHelper {
    /// Multiply two 2D arrays.
    pub fn multiply(lhs: ArrayView2<f64>, rhs: ArrayView2<f64>) -> Array2<f64> {
        lhs.dot(&rhs)
    }

    /// Solves `a · x = b` by Gaussian elimination with partial pivoting.
    ///
    /// Returns `None` when `a` is not square or is numerically singular.
    pub fn solve(a: ArrayView2<f64>, b: ArrayView1<f64>) -> Option<Array1<f64>> {
        let n = a.nrows();
        if a.ncols() != n || b.len() != n {
            return None;
        }

        let mut m = a.to_owned();
        let mut rhs = b.to_owned();
        let scale = m.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);
        let tolerance = scale * 1e-12;

        for col in 0..n {
            let pivot = (col..n).max_by(|&i, &j| m[[i, col]].abs().total_cmp(&m[[j, col]].abs()))?;
            if m[[pivot, col]].abs() <= tolerance {
                return None;
            }
            if pivot != col {
                for k in 0..n {
                    m.swap([pivot, k], [col, k]);
                }
                rhs.swap(pivot, col);
            }

            for row in (col + 1)..n {
                let factor = m[[row, col]] / m[[col, col]];
                if factor == 0.0 {
                    continue;
                }
                for k in col..n {
                    m[[row, k]] -= factor * m[[col, k]];
                }
                rhs[row] -= factor * rhs[col];
            }
        }

        let mut x = Array1::<f64>::zeros(n);
        for row in (0..n).rev() {
            let tail: f64 = ((row + 1)..n).map(|k| m[[row, k]] * x[k]).sum();
            x[row] = (rhs[row] - tail) / m[[row, row]];
        }

        if x.iter().all(|v| v.is_finite()) {
            Some(x)
        } else {
            None
        }
    }

    /// Ordinary least squares through the normal equations `XᵀX β = Xᵀy`.
    pub fn least_squares(design: ArrayView2<f64>, target: ArrayView1<f64>) -> Option<Array1<f64>> {
        if design.nrows() != target.len() || design.nrows() < design.ncols() {
            return None;
        }
        let gram = Self::multiply(design.t(), design);
        let moment = design.t().dot(&target);
        Self::solve(gram.view(), moment.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn solve_recovers_known_solution() {
        let a = array![[0.0, 2.0], [3.0, 1.0]];
        let b = array![4.0, 5.0];
        let x = MatrixHelper::solve(a.view(), b.view()).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn solve_rejects_singular_matrix() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let b = array![1.0, 2.0];
        assert!(MatrixHelper::solve(a.view(), b.view()).is_none());
    }

    #[test]
    fn least_squares_fits_a_line() {
        let design = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let target = array![1.0, 3.0, 5.0, 7.0];
        let beta = MatrixHelper::least_squares(design.view(), target.view()).unwrap();
        assert!((beta[0] - 1.0).abs() < 1e-9);
        assert!((beta[1] - 2.0).abs() < 1e-9);
    }
}
