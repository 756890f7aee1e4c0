// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The Hessian abstraction layer: owns the Hessian representation, forms it
//! from a Jacobian, factorizes it, and solves `H p = g`.
//!
//! The contract is split into two traits rather than one monolithic
//! interface, because the Jacobian-formation step is the one place the
//! dense and sparse (Schur) backends genuinely differ in shape:
//!
//! - [`HessianOps`] is the backend-independent half — diagonal extraction,
//!   scaling, the `v^T H v` form, factorize-and-solve — consumed by
//!   [`crate::update`] and the driver's scaling code.
//! - [`FormFromJacobian`] is the backend-specific half, generic over an
//!   associated `Jacobian` type, consumed only by the problem adapters in
//!   [`crate::problem`].

pub mod dense;
pub mod schur;

use crate::error::Error;
use nalgebra::DVector;

/// Backend-independent Hessian operations used by `ParameterUpdate` and the
/// driver's diagonal-scaling pass.
pub trait HessianOps {
    /// Dimension `N` of the (square) Hessian.
    fn dim(&self) -> usize;

    /// Write the Hessian's diagonal into `d` (must be length `dim()`).
    fn extract_diagonal(&self, d: &mut DVector<f64>);

    /// Overwrite the Hessian's diagonal from `d`.
    fn set_diagonal(&mut self, d: &DVector<f64>);

    /// In-place `diag(1/s) * H * diag(1/s)`.
    fn divide_rows_cols(&mut self, s: &DVector<f64>);

    /// `v^T H v` for a vector `v` of length `dim()`.
    fn inner_vector_hessian(&self, v: &DVector<f64>) -> f64;

    /// Factorize the current Hessian. Returns `false` on a singular or
    /// ill-conditioned matrix rather than erroring — the driver turns that
    /// into a fatal [`crate::error::TrustRegionError::SolverFailure`].
    fn initialize_solver(&mut self) -> bool;

    /// Solve `H p = g` using the factorization from the most recent
    /// successful `initialize_solver`. Returns `false` on failure (the
    /// factorization is still valid, but the solve itself broke down).
    fn solve(&self, g: &DVector<f64>, p: &mut DVector<f64>) -> bool;
}

/// Backend-specific Gauss-Newton Hessian formation from a Jacobian.
pub trait FormFromJacobian {
    /// The Jacobian representation this backend consumes: a dense matrix
    /// for [`dense::DenseHessian`], a pair of sparse blocks for
    /// [`schur::SchurHessian`].
    type Jacobian;

    /// Form `H = J^T J` (or otherwise populate `H` from `jacobian`).
    fn compute_hessian(&mut self, jacobian: &Self::Jacobian) -> Result<(), Error>;

    /// Form `g = J^T r`.
    fn compute_gradient(
        &self,
        jacobian: &Self::Jacobian,
        residuals: &DVector<f64>,
        g: &mut DVector<f64>,
    ) -> Result<(), Error>;
}
