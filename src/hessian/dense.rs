// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Dense Hessian backend, used for smaller problems where forming and
//! factorizing a full `N x N` matrix is cheap. Backed by `nalgebra`.

use crate::error::Error;
use crate::hessian::{FormFromJacobian, HessianOps};
use nalgebra::{Cholesky, DMatrix, DVector, Dyn};

/// A dense, `nalgebra`-backed Hessian. Owns its working matrix and, once
/// `initialize_solver` succeeds, a Cholesky factorization of it.
///
/// Per §5's shared-resource policy, `h` is resized (not reallocated) as the
/// problem dimension changes, and reused across iterations to avoid
/// allocation churn in the common case where dimension is fixed for the
/// whole run.
pub struct DenseHessian {
    h: DMatrix<f64>,
    factorization: Option<Cholesky<f64, Dyn>>,
}

impl DenseHessian {
    /// Create a Hessian for an `n`-dimensional problem, zero-initialized.
    pub fn new(n: usize) -> Self {
        DenseHessian {
            h: DMatrix::zeros(n, n),
            factorization: None,
        }
    }

    /// Read-only access to the underlying matrix, e.g. for diagnostics.
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.h
    }

    /// Directly set the Hessian (and implicitly the gradient, via the
    /// caller) from a user-supplied general-minimization callback, bypassing
    /// Gauss-Newton formation. Used by
    /// [`crate::problem::DirectMinimizationAdapter`].
    pub fn set_from_user(&mut self, h: &DMatrix<f64>) {
        self.h.copy_from(h);
        self.factorization = None;
    }
}

impl HessianOps for DenseHessian {
    fn dim(&self) -> usize {
        self.h.nrows()
    }

    fn extract_diagonal(&self, d: &mut DVector<f64>) {
        for i in 0..self.dim() {
            d[i] = self.h[(i, i)];
        }
    }

    fn set_diagonal(&mut self, d: &DVector<f64>) {
        for i in 0..self.dim() {
            self.h[(i, i)] = d[i];
        }
    }

    fn divide_rows_cols(&mut self, s: &DVector<f64>) {
        let n = self.dim();
        for i in 0..n {
            for j in 0..n {
                self.h[(i, j)] /= s[i] * s[j];
            }
        }
    }

    fn inner_vector_hessian(&self, v: &DVector<f64>) -> f64 {
        (v.transpose() * &self.h * v)[(0, 0)]
    }

    fn initialize_solver(&mut self) -> bool {
        match Cholesky::new(self.h.clone()) {
            Some(chol) => {
                self.factorization = Some(chol);
                true
            }
            None => {
                self.factorization = None;
                false
            }
        }
    }

    fn solve(&self, g: &DVector<f64>, p: &mut DVector<f64>) -> bool {
        match &self.factorization {
            Some(chol) => {
                let sol = chol.solve(g);
                p.copy_from(&sol);
                p.iter().all(|v| v.is_finite())
            }
            None => false,
        }
    }
}

impl FormFromJacobian for DenseHessian {
    type Jacobian = DMatrix<f64>;

    fn compute_hessian(&mut self, jacobian: &DMatrix<f64>) -> Result<(), Error> {
        self.h = jacobian.transpose() * jacobian;
        self.factorization = None;
        Ok(())
    }

    fn compute_gradient(
        &self,
        jacobian: &DMatrix<f64>,
        residuals: &DVector<f64>,
        g: &mut DVector<f64>,
    ) -> Result<(), Error> {
        let grad = jacobian.transpose() * residuals;
        g.copy_from(&grad);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn gauss_newton_hessian_matches_jtj() {
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        let mut h = DenseHessian::new(2);
        h.compute_hessian(&j).unwrap();
        assert_relative_eq!(h.matrix()[(0, 0)], 2.0);
        assert_relative_eq!(h.matrix()[(1, 1)], 2.0);
        assert_relative_eq!(h.matrix()[(0, 1)], 1.0);
    }

    #[test]
    fn extract_then_set_diagonal_is_identity() {
        let j = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 3.0]);
        let mut h = DenseHessian::new(2);
        h.compute_hessian(&j).unwrap();
        let original = h.matrix().clone();
        let mut d = DVector::zeros(2);
        h.extract_diagonal(&mut d);
        h.set_diagonal(&d);
        assert_relative_eq!(h.matrix(), &original);
    }

    #[test]
    fn solve_recovers_known_solution() {
        // H = [[4,1],[1,3]], true p = [1,2] => g = H p = [6,7]
        let h_mat = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let mut h = DenseHessian::new(2);
        h.set_from_user(&h_mat);
        assert!(h.initialize_solver());
        let g = DVector::from_vec(vec![6.0, 7.0]);
        let mut p = DVector::zeros(2);
        assert!(h.solve(&g, &mut p));
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(p[1], 2.0, epsilon = 1e-10);
    }

    #[test]
    fn non_pd_hessian_fails_to_initialize() {
        let h_mat = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let mut h = DenseHessian::new(2);
        h.set_from_user(&h_mat);
        assert!(!h.initialize_solver());
    }
}
