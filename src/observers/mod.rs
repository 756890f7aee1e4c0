// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Verbose per-iteration logging.
//!
//! [`TrustRegionDriver`](crate::driver::TrustRegionDriver) reports `(key,
//! value)` diagnostics for every compute-and-consider pass through an
//! [`Observe`] implementor, mirroring the teacher's `Observe`/`SlogLogger`
//! split (one trait consumed by the driver, independent of what actually
//! happens to the data). `setVerbose(false)` wires up [`NullObserver`];
//! `setVerbose(true)` wires up [`SlogLogger`] when the `slog-logger`
//! feature is enabled.

#[cfg(feature = "slog-logger")]
pub mod slog_logger;

use crate::error::Error;
use crate::kv::KV;

#[cfg(feature = "slog-logger")]
pub use slog_logger::SlogLogger;

/// Receives one `KV` of diagnostics per driver iteration.
pub trait Observe {
    /// Called once per `compute-and-consider` pass, with the diagnostics
    /// the spec requires for verbose mode: `fx_candidate`, `ratio`, `delta`,
    /// plus whatever else is useful (iteration counters, acceptance).
    fn observe_iter(&mut self, kv: &KV) -> Result<(), Error>;
}

/// The default, silent observer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl Observe for NullObserver {
    fn observe_iter(&mut self, _kv: &KV) -> Result<(), Error> {
        Ok(())
    }
}
