// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! A float trait alias, following the same pattern used across the
//! numerical-optimization ecosystem to avoid repeating a long bound list at
//! every generic function. This engine concretizes all of its public types
//! to `f64` (see `DESIGN.md`'s Open Questions section for the rationale),
//! but keeps the alias so the scalar bound is spelled out in one place.

use num_traits::{Float, FloatConst, FromPrimitive, ToPrimitive};
use std::fmt::{Debug, Display};

/// An alias combining the numeric traits the engine's math needs.
/// Automatically implemented for any type that satisfies the bounds.
pub trait TrustRegionFloat:
    'static + Float + FloatConst + FromPrimitive + ToPrimitive + Debug + Display
{
}

impl<T> TrustRegionFloat for T where
    T: 'static + Float + FloatConst + FromPrimitive + ToPrimitive + Debug + Display
{
}
