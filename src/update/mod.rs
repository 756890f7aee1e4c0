// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Parameter-update strategies: given the gradient, the Hessian, and the
//! current trust-region radius, produce a candidate step.
//!
//! The two strategies (Cauchy point, Dogleg) are modeled as a tagged enum
//! rather than a trait with two implementors — both are effectively
//! stateless aside from scratch precomputed once per accepted step, so
//! inheritance-style polymorphism buys nothing here and a `match` is both
//! cheaper and easier to read at the one call site that cares.

pub mod cauchy;
pub mod dogleg;

use crate::error::Error;
use crate::hessian::HessianOps;
use cauchy::CauchyPoint;
use dogleg::Dogleg;
use nalgebra::DVector;

/// The result of `ParameterUpdate::compute_update`.
pub struct UpdateResult {
    /// The candidate step `p`.
    pub step: DVector<f64>,
    /// The quadratic model's predicted reduction `m(0) - m(p)`.
    pub predicted_reduction: f64,
    /// `||p||` in whatever metric (scaled or not) the caller is using.
    pub step_length: f64,
}

/// Which trust-region subproblem solver to use.
pub enum ParameterUpdate {
    /// The Cauchy point: minimize the quadratic model along `-g`.
    Cauchy(CauchyPoint),
    /// The dogleg path between the Cauchy point and the Gauss-Newton point.
    Dogleg(Dogleg),
}

impl ParameterUpdate {
    /// Construct the Cauchy-point variant.
    pub fn cauchy() -> Self {
        ParameterUpdate::Cauchy(CauchyPoint::new())
    }

    /// Construct the Dogleg variant.
    pub fn dogleg() -> Self {
        ParameterUpdate::Dogleg(Dogleg::new())
    }

    /// Precompute whatever this strategy needs from the (fixed, for this
    /// iteration) gradient and Hessian, ahead of one or more
    /// `compute_update` calls at different radii.
    pub fn initialize_update<H: HessianOps>(&mut self, g: &DVector<f64>, hessian: &H) -> Result<(), Error> {
        match self {
            ParameterUpdate::Cauchy(c) => c.initialize_update(g, hessian),
            ParameterUpdate::Dogleg(d) => d.initialize_update(g, hessian),
        }
    }

    /// Compute the step for trust-region radius `delta`.
    pub fn compute_update<H: HessianOps>(&mut self, hessian: &H, delta: f64) -> Result<UpdateResult, Error> {
        match self {
            ParameterUpdate::Cauchy(c) => c.compute_update(hessian, delta),
            ParameterUpdate::Dogleg(d) => d.compute_update(hessian, delta),
        }
    }
}
