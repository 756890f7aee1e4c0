// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Bridges the user-supplied callbacks of spec §6 to the
//! [`Problem`] trait [`crate::driver::TrustRegionDriver`] is generic over.
//!
//! Three adapters, grounded in the teacher's `CostFunction`/`Gradient`/
//! `Hessian`/`Jacobian` capability-trait split (`core/problem.rs`) and its
//! `gaussnewton_method.rs` wiring of a user operator through to a generic
//! solver:
//!
//! - [`LeastSquaresAdapter`] wraps the coupled-Jacobian least-squares
//!   interface and forms `g`/`H` via [`crate::hessian::FormFromJacobian`].
//!   Generic over the Hessian backend, so the same adapter drives both the
//!   dense and Schur paths.
//! - [`DirectMinimizationAdapter`] wraps the general-minimization interface
//!   and writes the user-supplied gradient/Hessian straight into a
//!   [`DenseHessian`](crate::hessian::dense::DenseHessian), bypassing
//!   Gauss-Newton formation. Dense-only: a user-supplied Hessian has no
//!   reason to arrive pre-partitioned into Schur blocks.
//! - [`ForwardDiffJacobian`] wraps a residual-only callback lacking an
//!   analytic Jacobian and supplies one via forward differences, per §6.

pub mod forward_diff;

use crate::error::Error;
use crate::hessian::dense::DenseHessian;
use crate::hessian::{FormFromJacobian, HessianOps};
use nalgebra::{DMatrix, DVector};

/// The bridge [`crate::driver::TrustRegionDriver`] is generic over: given
/// the current `x`, produce the scalar cost, and (separately) the gradient
/// plus an updated Hessian.
pub trait Problem {
    /// The Hessian backend this problem populates.
    type Hessian: HessianOps;

    /// Evaluate the cost at `x`.
    fn cost(&mut self, x: &DVector<f64>) -> Result<f64, Error>;

    /// Evaluate the gradient at `x` into `g`, and update `hessian` in place.
    fn gradient_and_hessian(
        &mut self,
        x: &DVector<f64>,
        hessian: &mut Self::Hessian,
        g: &mut DVector<f64>,
    ) -> Result<(), Error>;

    /// The F-test (§4.1): whether the relative cost reduction from
    /// `fx_prev` to `fx_cand` (an already-accepted step) is small enough to
    /// call the run converged. Defaults to the least-squares tolerance the
    /// spec gives as its example (`<= ftol * max(|fx_prev|, |fx_cand|)`);
    /// override for a problem-specific convergence test.
    fn f_test_converged(&self, fx_prev: f64, fx_cand: f64, ftol: f64) -> bool {
        (fx_prev - fx_cand).abs() <= ftol * fx_prev.abs().max(fx_cand.abs())
    }
}

/// The coupled-Jacobian least-squares callback of spec §6: residuals and
/// Jacobian are both computed against whatever input `set_input` last set.
pub trait LeastSquaresProblem {
    /// Backend-specific Jacobian representation (see
    /// [`crate::hessian::FormFromJacobian::Jacobian`]).
    type Jacobian;

    /// `N`, the number of free parameters.
    fn num_inputs(&self) -> usize;
    /// `M`, the number of residuals.
    fn num_outputs(&self) -> usize;
    /// Set the input at which subsequent `compute_residuals`/
    /// `compute_jacobian` calls evaluate.
    fn set_input(&mut self, x: &DVector<f64>);
    /// Write the `M` residuals at the last `set_input`-ed point into `r`.
    fn compute_residuals(&self, r: &mut DVector<f64>);
    /// Write the Jacobian at the last `set_input`-ed point into `jacobian`.
    /// Must not mutate `r` or any state shared with `compute_residuals`.
    fn compute_jacobian(&self, jacobian: &mut Self::Jacobian);
}

/// The general-minimization callback of spec §6.
pub trait GradientHessianProblem {
    /// Evaluate the cost at `x`.
    fn cost(&self, x: &DVector<f64>) -> f64;
    /// Evaluate the gradient and Hessian at `x`. `same_state_as_cost`
    /// signals that `x` is the same point the most recent `cost` call used,
    /// so the callback may reuse any values it cached then.
    fn gradient_hessian(&self, x: &DVector<f64>, same_state_as_cost: bool, g: &mut DVector<f64>, h: &mut DMatrix<f64>);
}

/// Wraps a [`LeastSquaresProblem`] as a [`Problem`], forming `g = J^T r` and
/// `H = J^T J` via `hessian`'s [`FormFromJacobian`] impl. Owns the residual
/// and Jacobian scratch buffers so they are reused (not reallocated) across
/// iterations, per §5's shared-resource policy.
pub struct LeastSquaresAdapter<LSP, H>
where
    LSP: LeastSquaresProblem<Jacobian = H::Jacobian>,
    H: HessianOps + FormFromJacobian,
{
    problem: LSP,
    residuals: DVector<f64>,
    jacobian: H::Jacobian,
}

impl<LSP, H> LeastSquaresAdapter<LSP, H>
where
    LSP: LeastSquaresProblem<Jacobian = H::Jacobian>,
    H: HessianOps + FormFromJacobian,
{
    /// Wrap `problem`, allocating its residual buffer and Jacobian scratch
    /// (`jacobian_init` is backend-specific: zeros for dense, empty sparse
    /// blocks for Schur).
    pub fn new(problem: LSP, jacobian_init: H::Jacobian) -> Self {
        let m = problem.num_outputs();
        LeastSquaresAdapter {
            problem,
            residuals: DVector::zeros(m),
            jacobian: jacobian_init,
        }
    }
}

impl<LSP, H> Problem for LeastSquaresAdapter<LSP, H>
where
    LSP: LeastSquaresProblem<Jacobian = H::Jacobian>,
    H: HessianOps + FormFromJacobian,
{
    type Hessian = H;

    fn cost(&mut self, x: &DVector<f64>) -> Result<f64, Error> {
        self.problem.set_input(x);
        self.problem.compute_residuals(&mut self.residuals);
        Ok(0.5 * self.residuals.dot(&self.residuals))
    }

    fn gradient_and_hessian(
        &mut self,
        x: &DVector<f64>,
        hessian: &mut H,
        g: &mut DVector<f64>,
    ) -> Result<(), Error> {
        self.problem.set_input(x);
        self.problem.compute_residuals(&mut self.residuals);
        self.problem.compute_jacobian(&mut self.jacobian);
        hessian.compute_hessian(&self.jacobian)?;
        hessian.compute_gradient(&self.jacobian, &self.residuals, g)?;
        Ok(())
    }
}

/// Wraps a [`GradientHessianProblem`] as a [`Problem`] over
/// [`DenseHessian`], writing the user-supplied gradient/Hessian straight in
/// without Gauss-Newton formation.
///
/// Per the invariant that `fx` always corresponds to the current `x` (§3),
/// the driver only ever calls `gradient_and_hessian` at a point it just
/// called `cost` on, so `same_state_as_cost` is always `true` here.
pub struct DirectMinimizationAdapter<GMP> {
    problem: GMP,
    h_scratch: DMatrix<f64>,
}

impl<GMP: GradientHessianProblem> DirectMinimizationAdapter<GMP> {
    /// Wrap `problem` for an `n`-dimensional parameter vector.
    pub fn new(problem: GMP, n: usize) -> Self {
        DirectMinimizationAdapter {
            problem,
            h_scratch: DMatrix::zeros(n, n),
        }
    }
}

impl<GMP: GradientHessianProblem> Problem for DirectMinimizationAdapter<GMP> {
    type Hessian = DenseHessian;

    fn cost(&mut self, x: &DVector<f64>) -> Result<f64, Error> {
        Ok(self.problem.cost(x))
    }

    fn gradient_and_hessian(
        &mut self,
        x: &DVector<f64>,
        hessian: &mut DenseHessian,
        g: &mut DVector<f64>,
    ) -> Result<(), Error> {
        self.problem.gradient_hessian(x, true, g, &mut self.h_scratch);
        hessian.set_from_user(&self.h_scratch);
        Ok(())
    }
}
