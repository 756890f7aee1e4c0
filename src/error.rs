// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Error types for the Trust Region engine.
//!
//! Three categories are kept distinct rather than conflated into one "solver
//! failed" bucket: configuration errors (fail fast at `configure`), numerical
//! errors (fatal, abort the run), and solver factorization failures (fatal,
//! but distinguishable from a non-finite gradient so callers can decide
//! whether to retry with a different backend). Rejected steps and stalled
//! convergence are NOT errors — see `TrustRegionDriver::iterate`.

use thiserror::Error;

/// The crate's fallible return type. Mirrors the common pattern of aliasing
/// `anyhow::Error` as the top-level error so user-callback errors (arbitrary
/// types implementing `std::error::Error`) and [`TrustRegionError`] variants
/// compose through `?` without a wrapper enum for every call site.
pub use anyhow::Error;

/// All errors arising from the Trust Region engine.
#[derive(Debug, Error)]
pub enum TrustRegionError {
    /// Raised at `configure()` when a config value is outside its valid
    /// domain (for instance `regionInitial` equal to `0` or less than `-2`).
    #[error("invalid configuration: {text}")]
    InvalidConfig {
        /// Human-readable description of the violated constraint.
        text: String,
    },
    /// Raised when a quantity that must be finite (most commonly the
    /// gradient norm) is NaN or infinite. Fatal; aborts the run.
    #[error("uncountable: {text}")]
    Uncountable {
        /// Which quantity went non-finite and at what point.
        text: String,
    },
    /// Raised when `Hessian::initialize_solver` fails to factorize (singular
    /// or ill-conditioned `A`). Fatal; surfaced to the caller rather than
    /// treated as a rejected step.
    #[error("solver failure: {text}")]
    SolverFailure {
        /// Which solver failed and why, if known.
        text: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_text() {
        let e = TrustRegionError::InvalidConfig {
            text: "regionInitial must be > 0, -1, or -2".into(),
        };
        assert!(e.to_string().contains("regionInitial"));
    }
}
