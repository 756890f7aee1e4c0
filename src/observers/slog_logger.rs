// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A logger based on the `slog` crate, following the same
//! terminal/non-blocking split the teacher's `SlogLogger` offers.

use crate::error::Error;
use crate::kv::KV;
use crate::observers::Observe;
use slog::{info, o, Drain, Key, Record, Serializer};
use slog_async::OverflowStrategy;

/// Logs one line per driver iteration to the terminal via `slog`.
#[derive(Clone)]
pub struct SlogLogger {
    logger: slog::Logger,
}

impl SlogLogger {
    /// Log to the terminal, blocking on a full async channel.
    pub fn term() -> Self {
        SlogLogger::term_internal(OverflowStrategy::Block)
    }

    /// Log to the terminal, dropping messages rather than blocking when the
    /// async channel is full.
    pub fn term_noblock() -> Self {
        SlogLogger::term_internal(OverflowStrategy::Drop)
    }

    fn term_internal(overflow_strategy: OverflowStrategy) -> Self {
        let decorator = slog_term::TermDecorator::new().build();
        let drain = slog_term::FullFormat::new(decorator)
            .use_original_order()
            .build()
            .fuse();
        let drain = slog_async::Async::new(drain)
            .overflow_strategy(overflow_strategy)
            .build()
            .fuse();
        SlogLogger {
            logger: slog::Logger::root(drain, o!()),
        }
    }
}

/// Adapts [`KV`]'s dumb `(key, value)` pairs to `slog`'s `KV` trait, which
/// needs the `dynamic-keys` feature since the keys here aren't known until
/// the driver builds the diagnostics for a given iteration.
struct SlogKV<'a> {
    kv: &'a KV,
}

impl<'a> slog::KV for SlogKV<'a> {
    fn serialize(&self, _record: &Record, serializer: &mut dyn Serializer) -> slog::Result {
        for (k, v) in &self.kv.kv {
            serializer.emit_str(Key::from(*k), v)?;
        }
        Ok(())
    }
}

impl Observe for SlogLogger {
    fn observe_iter(&mut self, kv: &KV) -> Result<(), Error> {
        info!(self.logger, "iter"; SlogKV { kv });
        Ok(())
    }
}
