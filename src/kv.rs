// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A minimal ordered key-value container used to pass per-iteration
//! diagnostics (`fx_candidate`, `ratio`, `delta`, ...) to an [`Observe`].
//!
//! [`Observe`]: crate::observers::Observe

use std::fmt;

/// An ordered list of `(key, value)` pairs, rendered as strings.
///
/// Kept deliberately dumb: no map semantics, no deduplication. Observers
/// decide how to render or store it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KV {
    /// The actual key-value entries, in insertion order.
    pub kv: Vec<(&'static str, String)>,
}

impl KV {
    /// Create an empty `KV`.
    pub fn new() -> Self {
        KV { kv: vec![] }
    }

    /// Push a `(key, value)` pair, with `value` converted via `Display`.
    pub fn push<T: fmt::Display>(mut self, key: &'static str, val: T) -> Self {
        self.kv.push((key, format!("{val}")));
        self
    }

    /// Merge another `KV` into `self`, consuming it.
    pub fn merge(mut self, other: KV) -> Self {
        self.kv.extend(other.kv);
        self
    }
}

impl fmt::Display for KV {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, (k, v)) in self.kv.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        Ok(())
    }
}

/// Convenience macro for building a [`KV`] inline, mirroring the
/// `key => value;` shorthand used throughout this crate's observers.
#[macro_export]
macro_rules! make_kv {
    ($($key:expr => $val:expr;)*) => {
        $crate::kv::KV::new()$(.push($key, $val))*
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_display() {
        let kv = KV::new().push("ratio", 0.8).push("delta", 1.5);
        assert_eq!(kv.kv.len(), 2);
        assert_eq!(format!("{kv}"), "ratio: 0.8, delta: 1.5");
    }

    #[test]
    fn make_kv_macro() {
        let kv = make_kv!("a" => 1; "b" => "x";);
        assert_eq!(kv.kv, vec![("a", "1".to_string()), ("b", "x".to_string())]);
    }
}
