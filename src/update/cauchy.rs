// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The Cauchy point: the minimizer of the quadratic model along the
//! steepest-descent direction, clamped to the trust-region boundary.
//!
//! # References
//!
//! Jorge Nocedal and Stephen J. Wright (2006). Numerical Optimization.
//! Springer. ISBN 0-387-30303-0.

use crate::error::Error;
use crate::hessian::HessianOps;
use crate::update::UpdateResult;
use nalgebra::DVector;

/// Precomputed, per-iteration state for the Cauchy-point strategy.
///
/// Unlike Dogleg, Cauchy needs only `g` and `H` themselves at
/// `compute_update` time (no Gauss-Newton step to precompute), so this
/// struct just holds `g_hat = g / ||g||` and `c = g_hat^T H g_hat`, both of
/// which are independent of the trust-region radius and so are computed
/// once per accepted step rather than once per `compute_update` call.
pub struct CauchyPoint {
    g_norm: f64,
    c: f64,
    g_hat: DVector<f64>,
}

impl CauchyPoint {
    /// Construct with no precomputed state; `initialize_update` must be
    /// called before `compute_update`.
    pub fn new() -> Self {
        CauchyPoint {
            g_norm: 0.0,
            c: 0.0,
            g_hat: DVector::zeros(0),
        }
    }

    /// Precompute `g_hat` and `c = g_hat^T H g_hat` from the current
    /// gradient and Hessian. Must be called once per accepted step, before
    /// any `compute_update` calls at that step's radius.
    pub fn initialize_update<H: HessianOps>(&mut self, g: &DVector<f64>, hessian: &H) -> Result<(), Error> {
        self.g_norm = g.norm();
        self.g_hat = if self.g_norm > 0.0 {
            g / self.g_norm
        } else {
            DVector::zeros(g.len())
        };
        self.c = hessian.inner_vector_hessian(&self.g_hat);
        Ok(())
    }

    /// Compute the Cauchy-point step for trust-region radius `delta`.
    ///
    /// This follows the reformulation in §4.5 of the design (`tau_bar =
    /// min(delta, ||g|| / c)`) rather than the textbook cubic-in-delta form,
    /// which loses precision for small `c` and large `delta`.
    pub fn compute_update<H: HessianOps>(&mut self, _hessian: &H, delta: f64) -> Result<UpdateResult, Error> {
        let tau_bar = if self.c <= 0.0 { delta } else { delta.min(self.g_norm / self.c) };

        let step = &self.g_hat * (-tau_bar);
        let predicted_reduction = tau_bar * (self.g_norm - tau_bar * self.c / 2.0);

        Ok(UpdateResult {
            step,
            predicted_reduction,
            step_length: tau_bar,
        })
    }
}

impl Default for CauchyPoint {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hessian::dense::DenseHessian;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    #[test]
    fn convex_model_takes_interior_minimizer() {
        // H = diag(2, 2), g = (4, 0) => c = 2, tau = min(delta, 4/2) = min(delta, 2)
        let mut h = DenseHessian::new(2);
        h.set_from_user(&DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 2.0])));
        let g = DVector::from_vec(vec![4.0, 0.0]);

        let mut cp = CauchyPoint::new();
        cp.initialize_update(&g, &h).unwrap();

        let result = cp.compute_update(&h, 10.0).unwrap();
        assert_relative_eq!(result.step_length, 2.0, epsilon = 1e-12);
        assert_relative_eq!(result.step, DVector::from_vec(vec![-4.0, 0.0]), epsilon = 1e-12);
    }

    #[test]
    fn small_radius_truncates_to_boundary() {
        let mut h = DenseHessian::new(2);
        h.set_from_user(&DMatrix::from_diagonal(&DVector::from_vec(vec![2.0, 2.0])));
        let g = DVector::from_vec(vec![4.0, 0.0]);

        let mut cp = CauchyPoint::new();
        cp.initialize_update(&g, &h).unwrap();

        let result = cp.compute_update(&h, 0.5).unwrap();
        assert_relative_eq!(result.step_length, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn nonconvex_direction_goes_to_boundary() {
        // H = diag(-1, -1) is not SPD, but Cauchy only ever needs v^T H v,
        // which HessianOps can still report even though `solve` would fail.
        let mut h = DenseHessian::new(2);
        h.set_from_user(&DMatrix::from_diagonal(&DVector::from_vec(vec![-1.0, -1.0])));
        let g = DVector::from_vec(vec![3.0, 4.0]);

        let mut cp = CauchyPoint::new();
        cp.initialize_update(&g, &h).unwrap();

        let result = cp.compute_update(&h, 2.0).unwrap();
        assert_relative_eq!(result.step_length, 2.0, epsilon = 1e-12);
    }
}
