// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A nonlinear least-squares and unconstrained-minimization engine built
//! around the Trust Region family of methods.
//!
//! Given a user-supplied function that returns residuals and their
//! Jacobian (or, equivalently, a cost function together with its gradient
//! and Hessian), [`driver::TrustRegionDriver`] iteratively improves a
//! parameter vector until a local minimum is found. Two Hessian backends
//! are supported: a dense path (`nalgebra`-backed) for smaller problems,
//! and a sparse, block-structured path (`faer`-backed Schur complement)
//! for the bordered Hessians that arise in bundle-adjustment-like
//! problems.
//!
//! # Layout
//!
//! - [`hessian`] — the Hessian abstraction: [`hessian::dense::DenseHessian`]
//!   and the block [`hessian::schur::SchurHessian`], both implementing
//!   [`hessian::HessianOps`].
//! - [`update`] — the trust-region subproblem solvers,
//!   [`update::ParameterUpdate::cauchy`] and [`update::ParameterUpdate::dogleg`].
//! - [`driver`] — [`driver::TrustRegionDriver`], the state machine tying
//!   gradient/Hessian computation, step computation, and ratio-based
//!   acceptance together.
//! - [`problem`] — adapters bridging user callbacks (coupled-Jacobian
//!   least-squares, general gradient/Hessian minimization, or a
//!   forward-difference Jacobian fallback) to [`problem::Problem`].
//! - [`config`] — [`config::ConfigTrustRegion`], the tuning knobs.
//! - [`observers`] — verbose per-iteration logging.
//! - [`error`] — the crate's error taxonomy.
//!
//! # Example
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use trustregion::config::ConfigTrustRegion;
//! use trustregion::driver::TrustRegionDriver;
//! use trustregion::hessian::dense::DenseHessian;
//! use trustregion::problem::{LeastSquaresAdapter, LeastSquaresProblem};
//! use trustregion::update::ParameterUpdate;
//!
//! struct Linear2d {
//!     x: DVector<f64>,
//! }
//!
//! impl LeastSquaresProblem for Linear2d {
//!     type Jacobian = DMatrix<f64>;
//!     fn num_inputs(&self) -> usize { 2 }
//!     fn num_outputs(&self) -> usize { 2 }
//!     fn set_input(&mut self, x: &DVector<f64>) { self.x = x.clone(); }
//!     fn compute_residuals(&self, r: &mut DVector<f64>) {
//!         r[0] = self.x[0] - 2.0;
//!         r[1] = self.x[1] - 0.1;
//!     }
//!     fn compute_jacobian(&self, jacobian: &mut DMatrix<f64>) {
//!         jacobian.fill(0.0);
//!         jacobian[(0, 0)] = 1.0;
//!         jacobian[(1, 1)] = 1.0;
//!     }
//! }
//!
//! let problem = LeastSquaresAdapter::<_, DenseHessian>::new(
//!     Linear2d { x: DVector::zeros(2) },
//!     DMatrix::zeros(2, 2),
//! );
//! let mut driver = TrustRegionDriver::new(
//!     problem,
//!     DenseHessian::new(2),
//!     ParameterUpdate::dogleg(),
//!     ConfigTrustRegion::new(),
//! );
//! driver.initialize(DVector::from_vec(vec![1.0, 0.5]), 0.0).unwrap();
//! for _ in 0..200 {
//!     if driver.iterate().unwrap() {
//!         break;
//!     }
//! }
//! assert!((driver.x()[0] - 2.0).abs() < 1e-4);
//! assert!((driver.x()[1] - 0.1).abs() < 1e-4);
//! ```
//!
//! # License
//!
//! Licensed under either of
//!
//!   * Apache License, Version 2.0
//!     ([LICENSE-APACHE](https://github.com/trustregion-rs/trustregion/blob/main/LICENSE-APACHE) or
//!     <http://www.apache.org/licenses/LICENSE-2.0>)
//!   * MIT License ([LICENSE-MIT](https://github.com/trustregion-rs/trustregion/blob/main/LICENSE-MIT) or
//!     <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
// The ratio test (§4.2) and sentinel-radius resolution (§4.4) compare
// floats against exact literals (0.0, +inf) by design, not by accident --
// clippy::float_cmp's blanket warning would fire on exactly the
// comparisons the spec requires, so it is not enabled here.

pub mod config;
pub mod driver;
pub mod error;
pub mod float;
pub mod hessian;
pub mod kv;
pub mod observers;
pub mod problem;
pub mod update;
