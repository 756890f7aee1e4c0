// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! The Trust Region driver: the state machine that ties the gradient/
//! Hessian computation, [`ParameterUpdate`], and ratio-based step
//! acceptance together into an iterative optimizer.
//!
//! Grounded in the teacher's `Executor`/`Solver` split (`core/executor.rs`,
//! `solver/trustregion/trustregion_method.rs`): `TrustRegionDriver` plays
//! the `Executor`'s role (state, counters, observer wiring) while
//! [`crate::update::ParameterUpdate`] plays the `Solver`'s role (the actual
//! per-iteration subproblem). Unlike the teacher's fully generic executor,
//! this driver is written directly against the one algorithm family this
//! crate implements, per the design notes' "tagged variants, not
//! inheritance" guidance.

use crate::config::{ConfigTrustRegion, RegionInitial};
use crate::error::{Error, TrustRegionError};
use crate::hessian::HessianOps;
use crate::kv::KV;
use crate::observers::{NullObserver, Observe};
use crate::problem::Problem;
use crate::update::ParameterUpdate;
use nalgebra::DVector;

/// The driver's state machine, per spec §4.1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum DriverState {
    /// About to recompute gradient/Hessian at the current `x` and take a
    /// full Cauchy/Dogleg step (possibly followed by retries).
    FullStep,
    /// The previous candidate step was rejected; retry with a smaller `Δ`
    /// but the same gradient/Hessian.
    Retry,
    /// Terminal: `iterate()` is a no-op returning `true`.
    Converged,
    /// Not yet `initialize`d.
    Pending,
}

/// The state machine driving a Trust Region optimization run.
pub struct TrustRegionDriver<P: Problem> {
    problem: P,
    hessian: P::Hessian,
    update: ParameterUpdate,
    config: ConfigTrustRegion,

    x: DVector<f64>,
    fx: f64,
    g: DVector<f64>,
    s: DVector<f64>,
    delta: f64,
    delta_resolved: bool,

    state: DriverState,
    total_full_steps: u64,
    total_retries: u64,

    observer: Box<dyn Observe>,
}

impl<P: Problem> TrustRegionDriver<P> {
    /// Construct a driver around `problem`/`hessian`/`update`, configured
    /// with `config`. Call [`Self::initialize`] before the first
    /// [`Self::iterate`].
    pub fn new(problem: P, hessian: P::Hessian, update: ParameterUpdate, config: ConfigTrustRegion) -> Self {
        TrustRegionDriver {
            problem,
            hessian,
            update,
            config,
            x: DVector::zeros(0),
            fx: 0.0,
            g: DVector::zeros(0),
            s: DVector::zeros(0),
            delta: 0.0,
            delta_resolved: false,
            state: DriverState::Pending,
            total_full_steps: 0,
            total_retries: 0,
            observer: Box::new(NullObserver),
        }
    }

    /// Replace the tuning config. Does not reset an in-progress run.
    pub fn configure(&mut self, config: ConfigTrustRegion) {
        self.config = config;
    }

    /// `true` wires up an `slog`-backed terminal logger (when the
    /// `slog-logger` feature is enabled; otherwise a no-op with no error),
    /// `false` wires up [`NullObserver`]. For a custom sink use
    /// [`Self::set_observer`].
    pub fn set_verbose(&mut self, verbose: bool) {
        #[cfg(feature = "slog-logger")]
        {
            if verbose {
                self.observer = Box::new(crate::observers::SlogLogger::term_noblock());
                return;
            }
        }
        let _ = verbose;
        self.observer = Box::new(NullObserver);
    }

    /// Install a custom diagnostics sink.
    pub fn set_observer(&mut self, observer: impl Observe + 'static) {
        self.observer = Box::new(observer);
    }

    /// Set the initial parameters, evaluate `fx = cost(x0)`, reset the
    /// scaling vector to all-ones, and set `Δ` from `config.region_initial`
    /// (sentinel modes are resolved lazily on the first
    /// compute-and-consider, per §4.4). Transitions directly to
    /// [`DriverState::Converged`] if `fx <= f_min`.
    pub fn initialize(&mut self, x0: DVector<f64>, f_min: f64) -> Result<(), Error> {
        let n = x0.len();
        self.s = DVector::from_element(n, 1.0);
        self.fx = self.problem.cost(&x0)?;
        self.x = x0;
        self.g = DVector::zeros(n);
        self.delta_resolved = false;
        self.delta = match self.config.region_initial() {
            RegionInitial::Explicit(d) => d,
            RegionInitial::Unconstrained | RegionInitial::Cauchy => f64::NAN,
        };
        self.total_full_steps = 0;
        self.total_retries = 0;
        self.state = if self.fx <= f_min {
            DriverState::Converged
        } else {
            DriverState::FullStep
        };
        Ok(())
    }

    /// The current parameter vector.
    pub fn x(&self) -> &DVector<f64> {
        &self.x
    }

    /// The cost at the current parameter vector.
    pub fn fx(&self) -> f64 {
        self.fx
    }

    /// Number of `FullStep` entries (gradient/Hessian recomputations).
    pub fn total_full_steps(&self) -> u64 {
        self.total_full_steps
    }

    /// Number of `Retry` entries (rejected-step retries at a smaller `Δ`).
    pub fn total_retries(&self) -> u64 {
        self.total_retries
    }

    /// Current driver state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Run one state-machine transition. Returns `true` iff converged.
    pub fn iterate(&mut self) -> Result<bool, Error> {
        match self.state {
            DriverState::Pending => Err(TrustRegionError::InvalidConfig {
                text: "iterate() called before initialize()".into(),
            }
            .into()),
            DriverState::Converged => Ok(true),
            DriverState::FullStep => {
                self.total_full_steps += 1;
                self.enter_full_step()
            }
            DriverState::Retry => {
                self.total_retries += 1;
                self.compute_and_consider()
            }
        }
    }

    /// `FullStep` entry: recompute gradient/Hessian, scale, G-test, factorize,
    /// then fall through to compute-and-consider.
    fn enter_full_step(&mut self) -> Result<bool, Error> {
        self.problem.gradient_and_hessian(&self.x, &mut self.hessian, &mut self.g)?;

        if self.config.scaling_active() {
            let mut d = DVector::zeros(self.hessian.dim());
            self.hessian.extract_diagonal(&mut d);
            for i in 0..d.len() {
                self.s[i] = d[i].abs().sqrt().clamp(self.config.scaling_minimum(), self.config.scaling_maximum());
            }
            for i in 0..self.g.len() {
                self.g[i] /= self.s[i];
            }
            self.hessian.divide_rows_cols(&self.s);
        }

        let g_norm = self.g.norm();
        if !g_norm.is_finite() {
            return Err(TrustRegionError::Uncountable {
                text: format!("gradient norm is not finite: {g_norm}"),
            }
            .into());
        }

        if self.g.iter().map(|v| v.abs()).fold(0.0, f64::max) <= self.config.gtol() {
            self.state = DriverState::Converged;
            return Ok(true);
        }

        if !self.hessian.initialize_solver() {
            return Err(TrustRegionError::SolverFailure {
                text: "Hessian factorization failed".into(),
            }
            .into());
        }

        self.update.initialize_update(&self.g, &self.hessian)?;

        self.compute_and_consider()
    }

    /// Shared compute-and-consider pass (§4.1): resolve the sentinel `Δ`
    /// once, ask for a step, undo scaling, evaluate the candidate cost, run
    /// the ratio test, and either accept (running the F-test) or retry.
    fn compute_and_consider(&mut self) -> Result<bool, Error> {
        if !self.delta_resolved {
            self.resolve_initial_delta()?;
            self.delta_resolved = true;
        }

        let result = self.update.compute_update(&self.hessian, self.delta)?;
        let mut step = result.step;
        if self.config.scaling_active() {
            for i in 0..step.len() {
                step[i] /= self.s[i];
            }
        }

        if !step.iter().all(|v| v.is_finite()) {
            // §7: a non-finite step from an otherwise-successful solve is a
            // rejection, not a fatal error -- it means Delta outran the
            // Hessian's conditioning, not that the Hessian itself is broken.
            self.delta /= 2.0;
            self.state = DriverState::Retry;
            return Ok(false);
        }

        let x_next = &self.x + &step;
        let fx_cand = self.problem.cost(&x_next)?;

        let actual = self.fx - fx_cand;
        let predicted = result.predicted_reduction;
        let (accept, new_delta) = ratio_test(
            self.fx,
            fx_cand,
            actual,
            predicted,
            self.delta,
            result.step_length,
            self.config.region_maximum(),
        );
        self.delta = new_delta;

        self.observer.observe_iter(
            &KV::new()
                .push("fx_candidate", fx_cand)
                .push("ratio", if predicted != 0.0 { actual / predicted } else { f64::NAN })
                .push("delta", self.delta)
                .push("accepted", accept),
        )?;

        if accept {
            let converged = self.problem.f_test_converged(self.fx, fx_cand, self.config.ftol());
            self.x = x_next;
            self.fx = fx_cand;
            self.state = if converged { DriverState::Converged } else { DriverState::FullStep };
            Ok(converged)
        } else {
            self.state = DriverState::Retry;
            Ok(false)
        }
    }

    /// Resolve an `Unconstrained`/`Cauchy` sentinel `Δ` on the first
    /// compute-and-consider of the run, per §4.4.
    fn resolve_initial_delta(&mut self) -> Result<(), Error> {
        match self.config.region_initial() {
            RegionInitial::Explicit(_) => {}
            RegionInitial::Unconstrained => {
                let probe = self.update.compute_update(&self.hessian, f64::MAX)?;
                if probe.step_length.is_finite() {
                    self.delta = probe.step_length;
                } else {
                    self.observer.observe_iter(&KV::new().push(
                        "message",
                        "Unconstrained initial radius produced a non-finite step; falling back to Cauchy mode",
                    ))?;
                    self.delta = self.cauchy_initial_delta();
                }
            }
            RegionInitial::Cauchy => {
                self.delta = self.cauchy_initial_delta();
            }
        }
        Ok(())
    }

    fn cauchy_initial_delta(&self) -> f64 {
        let g_norm_sq = self.g.norm_squared();
        let ghg = self.hessian.inner_vector_hessian(&self.g);
        10.0 * (g_norm_sq / ghg)
    }
}

/// The ratio test and `Δ` update of spec §4.2, factored out as a pure
/// function for direct unit testing.
///
/// Returns `(accept, new_delta)`.
fn ratio_test(fx_prev: f64, fx_cand: f64, actual: f64, predicted: f64, delta: f64, step_length: f64, delta_max: f64) -> (bool, f64) {
    if actual == 0.0 || predicted == 0.0 {
        return (true, delta);
    }
    let nu = actual / predicted;
    let new_delta = if fx_cand > fx_prev || nu < 0.25 {
        delta / 2.0
    } else if nu > 0.75 {
        (3.0 * step_length).max(delta).min(delta_max)
    } else {
        delta
    };
    let accept = fx_cand < fx_prev && nu > 0.0;
    (accept, new_delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_actual_is_accepted_unchanged() {
        let (accept, delta) = ratio_test(1.0, 1.0, 0.0, 5.0, 2.0, 1.5, 10.0);
        assert!(accept);
        assert_eq!(delta, 2.0);
    }

    #[test]
    fn degenerate_predicted_is_accepted_unchanged() {
        let (accept, delta) = ratio_test(2.0, 1.0, 1.0, 0.0, 3.0, 1.0, 10.0);
        assert!(accept);
        assert_eq!(delta, 3.0);
    }

    #[test]
    fn worse_cost_shrinks_region_and_rejects() {
        let (accept, delta) = ratio_test(1.0, 1.5, -0.5, 0.4, 2.0, 1.8, 10.0);
        assert!(!accept);
        assert_eq!(delta, 1.0);
    }

    #[test]
    fn poor_ratio_shrinks_region_even_on_improvement() {
        // nu = 0.1 < 0.25, but fx_cand < fx_prev so it's still an accept.
        let (accept, delta) = ratio_test(1.0, 0.99, 0.01, 0.1, 2.0, 1.9, 10.0);
        assert!(accept);
        assert_eq!(delta, 1.0);
    }

    #[test]
    fn good_ratio_at_boundary_grows_region_capped_at_max() {
        let (accept, delta) = ratio_test(2.0, 1.0, 1.0, 1.1, 1.0, 1.0, 2.5);
        assert!(accept);
        // nu ~0.909 > 0.75, 3*step_length = 3.0, capped at delta_max = 2.5
        assert_eq!(delta, 2.5);
    }

    #[test]
    fn good_ratio_interior_step_does_not_grow_region() {
        // step_length small relative to delta: 3*step_length < delta, so
        // max(3*step_length, delta) == delta -- no runaway growth.
        let (accept, delta) = ratio_test(2.0, 1.0, 1.0, 1.1, 5.0, 0.1, 100.0);
        assert!(accept);
        assert_eq!(delta, 5.0);
    }

    #[test]
    fn middle_ratio_leaves_region_unchanged() {
        let (accept, delta) = ratio_test(2.0, 1.5, 0.5, 1.0, 3.0, 2.0, 10.0);
        assert!(accept);
        assert_eq!(delta, 3.0);
    }

    #[test]
    fn negative_ratio_with_improved_cost_is_impossible_by_construction() {
        // nu < 0 implies predicted and actual have opposite signs; if
        // fx_cand < fx_prev (actual > 0) then predicted < 0, so nu < 0 and
        // reject -- the model claimed a worse point would be better.
        let (accept, _delta) = ratio_test(1.0, 0.9, 0.1, -0.2, 1.0, 0.5, 10.0);
        assert!(!accept);
    }
}
