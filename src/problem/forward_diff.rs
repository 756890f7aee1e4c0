// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The forward-difference Jacobian fallback of spec §6: wraps a
//! residual-only callback and estimates each Jacobian column as
//! `(r(x + eps_j e_j) - r(x)) / eps_j` with `eps_j = sqrt(eps) * max(1,
//! |x_j|)`.
//!
//! Only a dense Jacobian is produced — forward-differencing into a sparse
//! pattern would require knowing the sparsity ahead of time, which spec §1
//! places out of scope (no automatic differentiation beyond this fallback).

use crate::problem::LeastSquaresProblem;
use nalgebra::{DMatrix, DVector};

/// A residual-only callback: has no analytic Jacobian. `Clone` is required
/// so `compute_jacobian` (which only borrows `&self`, per the
/// `LeastSquaresProblem` contract) can perturb a throwaway copy per column
/// rather than mutating `self.inner`'s cached input.
pub trait ResidualsOnly: Clone {
    /// `N`, the number of free parameters.
    fn num_inputs(&self) -> usize;
    /// `M`, the number of residuals.
    fn num_outputs(&self) -> usize;
    /// Set the input at which subsequent `compute_residuals` calls evaluate.
    fn set_input(&mut self, x: &DVector<f64>);
    /// Write the `M` residuals at the last `set_input`-ed point into `r`.
    fn compute_residuals(&self, r: &mut DVector<f64>);
}

/// Adapts a [`ResidualsOnly`] callback into a [`LeastSquaresProblem`] by
/// estimating the Jacobian column-by-column via forward differences.
pub struct ForwardDiffJacobian<R> {
    inner: R,
    x: DVector<f64>,
}

impl<R: ResidualsOnly> ForwardDiffJacobian<R> {
    /// Wrap `inner`.
    pub fn new(inner: R) -> Self {
        let n = inner.num_inputs();
        ForwardDiffJacobian {
            inner,
            x: DVector::zeros(n),
        }
    }
}

impl<R: ResidualsOnly> LeastSquaresProblem for ForwardDiffJacobian<R> {
    type Jacobian = DMatrix<f64>;

    fn num_inputs(&self) -> usize {
        self.inner.num_inputs()
    }

    fn num_outputs(&self) -> usize {
        self.inner.num_outputs()
    }

    fn set_input(&mut self, x: &DVector<f64>) {
        self.x = x.clone();
        self.inner.set_input(x);
    }

    fn compute_residuals(&self, r: &mut DVector<f64>) {
        self.inner.compute_residuals(r);
    }

    fn compute_jacobian(&self, jacobian: &mut DMatrix<f64>) {
        let sqrt_eps = f64::EPSILON.sqrt();
        let n = self.num_inputs();
        let m = self.num_outputs();

        let mut r0 = DVector::zeros(m);
        self.inner.compute_residuals(&mut r0);

        let mut r_pert = DVector::zeros(m);
        for j in 0..n {
            let eps_j = sqrt_eps * self.x[j].abs().max(1.0);

            let mut perturbed = self.inner.clone();
            let mut x_pert = self.x.clone();
            x_pert[j] += eps_j;
            perturbed.set_input(&x_pert);
            perturbed.compute_residuals(&mut r_pert);

            for i in 0..m {
                jacobian[(i, j)] = (r_pert[i] - r0[i]) / eps_j;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use finitediff::FiniteDiff;
    use proptest::prelude::*;

    #[derive(Clone)]
    struct Quadratic {
        x: DVector<f64>,
    }

    impl ResidualsOnly for Quadratic {
        fn num_inputs(&self) -> usize {
            2
        }
        fn num_outputs(&self) -> usize {
            2
        }
        fn set_input(&mut self, x: &DVector<f64>) {
            self.x = x.clone();
        }
        fn compute_residuals(&self, r: &mut DVector<f64>) {
            r[0] = self.x[0] * self.x[0];
            r[1] = self.x[1];
        }
    }

    #[test]
    fn forward_diff_matches_analytic_jacobian() {
        let mut fd = ForwardDiffJacobian::new(Quadratic { x: DVector::zeros(2) });
        let x = DVector::from_vec(vec![3.0, -2.0]);
        fd.set_input(&x);

        let mut jacobian = DMatrix::zeros(2, 2);
        fd.compute_jacobian(&mut jacobian);

        // d(x0^2)/dx0 = 2*x0 = 6, d(x1)/dx1 = 1
        assert_relative_eq!(jacobian[(0, 0)], 6.0, epsilon = 1e-4);
        assert_relative_eq!(jacobian[(0, 1)], 0.0, epsilon = 1e-6);
        assert_relative_eq!(jacobian[(1, 0)], 0.0, epsilon = 1e-6);
        assert_relative_eq!(jacobian[(1, 1)], 1.0, epsilon = 1e-6);
    }

    // Cross-checks `ForwardDiffJacobian` against the `finitediff` crate's own
    // `forward_jacobian`, over proptest-generated inputs -- the same
    // finite-difference-vs-closed-form pairing `argmin-testfunctions` runs
    // (e.g. `ackley.rs`'s `test_ackley_derivative_finitediff`), but here both
    // sides are finite-difference estimates rather than one closed-form and
    // one estimate. Restricted to `|x_j| <= 1` so `eps_j = sqrt(eps) *
    // max(1, |x_j|)` here coincides exactly with `finitediff`'s fixed
    // `sqrt(EPS_F64)` step -- outside that range the two step sizes diverge
    // by construction, not by bug.
    proptest! {
        #[test]
        fn forward_diff_matches_finitediff_crate(x0 in -1.0..1.0, x1 in -1.0..1.0) {
            let mut fd = ForwardDiffJacobian::new(Quadratic { x: DVector::zeros(2) });
            let x = DVector::from_vec(vec![x0, x1]);
            fd.set_input(&x);
            let mut jacobian = DMatrix::zeros(2, 2);
            fd.compute_jacobian(&mut jacobian);

            let residuals = |x: &Vec<f64>| -> Vec<f64> { vec![x[0] * x[0], x[1]] };
            // `finitediff::forward_jacobian` returns its result indexed
            // `[input_index][output_index]` (it perturbs one input per outer
            // step), the transpose of this crate's `jacobian[(output,
            // input)]` convention.
            let jacobian_fd = vec![x0, x1].forward_jacobian(&residuals);

            for i in 0..2 {
                for j in 0..2 {
                    assert_relative_eq!(jacobian[(i, j)], jacobian_fd[j][i], epsilon = 1e-9);
                }
            }
        }
    }
}
