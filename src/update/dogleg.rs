// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The dogleg path: a two-segment approximation to the exact trust-region
//! path, running from the origin to the Cauchy point `p_u` and then on to
//! the Gauss-Newton point `p_gn`.
//!
//! # References
//!
//! Jorge Nocedal and Stephen J. Wright (2006). Numerical Optimization.
//! Springer. ISBN 0-387-30303-0.

use crate::error::Error;
use crate::hessian::HessianOps;
use crate::update::UpdateResult;
use nalgebra::DVector;

/// Precomputed, per-iteration state for the Dogleg strategy: the
/// Gauss-Newton step, the unconstrained Cauchy step, and whether the
/// current Hessian is positive definite along the gradient (which decides
/// whether the two-segment path or the truncated-gradient fallback applies).
pub struct Dogleg {
    p_gn: DVector<f64>,
    p_u: DVector<f64>,
    g: DVector<f64>,
    g_norm: f64,
    positive_definite: bool,
}

impl Dogleg {
    /// Construct with no precomputed state; `initialize_update` must be
    /// called before `compute_update`.
    pub fn new() -> Self {
        Dogleg {
            p_gn: DVector::zeros(0),
            p_u: DVector::zeros(0),
            g: DVector::zeros(0),
            g_norm: 0.0,
            positive_definite: false,
        }
    }

    /// Precompute `p_gn = -H^-1 g`, `p_u = -g * (g^Tg / g^THg)`, and the
    /// positive-definiteness signal, from the current gradient and Hessian.
    /// Must be called once per accepted step.
    pub fn initialize_update<H: HessianOps>(&mut self, g: &DVector<f64>, hessian: &H) -> Result<(), Error> {
        self.g = g.clone();
        self.g_norm = g.norm();

        let ghg = hessian.inner_vector_hessian(g);
        let mut p_gn = DVector::zeros(g.len());
        let solved = hessian.solve(g, &mut p_gn);
        self.p_gn = -p_gn;

        self.positive_definite = solved && ghg > 0.0 && self.p_gn.iter().all(|v| v.is_finite());

        self.p_u = if ghg > 0.0 {
            g * (-(self.g_norm * self.g_norm) / ghg)
        } else {
            DVector::zeros(g.len())
        };
        Ok(())
    }

    /// Compute the dogleg step for trust-region radius `delta`.
    pub fn compute_update<H: HessianOps>(&mut self, hessian: &H, delta: f64) -> Result<UpdateResult, Error> {
        let step = if self.positive_definite {
            let gn_norm = self.p_gn.norm();
            if gn_norm <= delta {
                self.p_gn.clone()
            } else {
                let u_norm = self.p_u.norm();
                if u_norm >= delta {
                    &self.p_u * (delta / u_norm)
                } else {
                    self.interpolate(delta)
                }
            }
        } else if self.g_norm > 0.0 {
            // Non-PD fallback: truncated steepest-descent direction.
            &self.g * (-delta / self.g_norm)
        } else {
            DVector::zeros(self.g.len())
        };

        let step_length = step.norm();
        // m(0) - m(p) = -g^T p - 1/2 p^T H p, evaluated directly rather than
        // re-deriving a closed form per branch; algebraically identical to
        // the spec's per-branch formulas but avoids duplicating the
        // quadratic-model expression three times.
        let predicted_reduction = -self.g.dot(&step) - 0.5 * hessian.inner_vector_hessian(&step);

        Ok(UpdateResult {
            step,
            predicted_reduction,
            step_length,
        })
    }

    /// Find `tau in [1, 2]` such that `||p_u + (tau-1)(p_gn - p_u)|| = delta`
    /// and return `p_u + (tau-1)(p_gn - p_u)`.
    ///
    /// Substituting `s = tau - 1 in [0, 1]` turns this into the scalar
    /// quadratic `||d||^2 s^2 + 2 (p_u . d) s + (||p_u||^2 - delta^2) = 0`
    /// with `d = p_gn - p_u`; since `||p_u|| < delta < ||p_gn||` on this
    /// branch, exactly one root lies in `[0, 1]` and it is the larger one.
    fn interpolate(&self, delta: f64) -> DVector<f64> {
        let d = &self.p_gn - &self.p_u;
        let dd = d.dot(&d);
        let pud = self.p_u.dot(&d);
        let puu = self.p_u.dot(&self.p_u);

        let disc = (pud * pud - dd * (puu - delta * delta)).max(0.0);
        let s = (-pud + disc.sqrt()) / dd;
        let s = s.clamp(0.0, 1.0);

        &self.p_u + d * s
    }
}

impl Default for Dogleg {
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

    fn spd_problem() -> (DenseHessian, DVector<f64>) {
        // H = [[4,1],[1,3]], g = [6,7] => p_gn = H^-1 g = [1, 2]
        let h_mat = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let mut h = DenseHessian::new(2);
        h.set_from_user(&h_mat);
        assert!(h.initialize_solver());
        let g = DVector::from_vec(vec![6.0, 7.0]);
        (h, g)
    }

    #[test]
    fn reduces_to_gauss_newton_when_radius_is_huge() {
        let (h, g) = spd_problem();
        let mut dl = Dogleg::new();
        dl.initialize_update(&g, &h).unwrap();

        let result = dl.compute_update(&h, 1e300).unwrap();
        assert_relative_eq!(result.step[0], -1.0, epsilon = 1e-8);
        assert_relative_eq!(result.step[1], -2.0, epsilon = 1e-8);
    }

    #[test]
    fn truncates_to_cauchy_direction_as_radius_shrinks_to_zero() {
        let (h, g) = spd_problem();
        let mut dl = Dogleg::new();
        dl.initialize_update(&g, &h).unwrap();

        let result = dl.compute_update(&h, 1e-6).unwrap();
        let g_hat = -&g / g.norm();
        let step_hat = &result.step / result.step.norm();
        assert_relative_eq!(step_hat, g_hat, epsilon = 1e-6);
        assert_relative_eq!(result.step_length, 1e-6, epsilon = 1e-12);
    }

    #[test]
    fn interior_radius_lands_on_boundary() {
        let (h, g) = spd_problem();
        let mut dl = Dogleg::new();
        dl.initialize_update(&g, &h).unwrap();

        // ||p_u|| and ||p_gn|| bracket this radius for this (h, g) pair.
        let delta = 1.0;
        let result = dl.compute_update(&h, delta).unwrap();
        assert_relative_eq!(result.step_length, delta, epsilon = 1e-9);
    }

    #[test]
    fn non_positive_definite_falls_back_to_truncated_gradient() {
        let h_mat = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let mut h = DenseHessian::new(2);
        h.set_from_user(&h_mat);
        assert!(!h.initialize_solver());
        let g = DVector::from_vec(vec![3.0, 4.0]);

        let mut dl = Dogleg::new();
        dl.initialize_update(&g, &h).unwrap();

        let result = dl.compute_update(&h, 2.0).unwrap();
        let g_hat = -&g / g.norm();
        let step_hat = &result.step / result.step.norm();
        assert_relative_eq!(step_hat, g_hat, epsilon = 1e-12);
        assert_relative_eq!(result.step_length, 2.0, epsilon = 1e-12);
    }
}
