// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Tuning knobs for [`TrustRegionDriver`](crate::driver::TrustRegionDriver).

use crate::error::{Error, TrustRegionError};

/// The initial trust-region radius.
///
/// The source domain for this value is three sentinel-laden cases bolted
/// onto a single `f64` (`> 0`, `-1`, `-2`); this is the sum-type re-design
/// the spec recommends. The numeric encoding is kept only at the
/// [`ConfigTrustRegion::with_region_initial_raw`] boundary, for callers
/// migrating from a config format that still uses it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionInitial {
    /// Use this radius literally. Must be strictly positive.
    Explicit(f64),
    /// Resolve on the first compute-and-consider by probing an
    /// (effectively) unconstrained step; see §4.4.
    Unconstrained,
    /// Resolve on the first compute-and-consider as `10 * tau_cauchy`;
    /// see §4.4.
    Cauchy,
}

impl RegionInitial {
    /// Parse the legacy numeric encoding: `x > 0` is `Explicit(x)`, `-1` is
    /// `Unconstrained`, `-2` is `Cauchy`. Anything else is a configuration
    /// error.
    pub fn from_raw(raw: f64) -> Result<Self, Error> {
        if raw > 0.0 {
            Ok(RegionInitial::Explicit(raw))
        } else if raw == -1.0 {
            Ok(RegionInitial::Unconstrained)
        } else if raw == -2.0 {
            Ok(RegionInitial::Cauchy)
        } else {
            Err(TrustRegionError::InvalidConfig {
                text: format!(
                    "regionInitial must be > 0, -1 (Unconstrained), or -2 (Cauchy); got {raw}"
                ),
            }
            .into())
        }
    }
}

/// Value object holding every tuning knob the driver consults.
///
/// Constructed via [`ConfigTrustRegion::new`] and the `with_*` setters,
/// each of which validates its argument and returns `Result<Self, Error>` —
/// the same "fail fast at configure time" shape the wider ecosystem uses
/// for builder-style configuration structs.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde1", derive(serde::Serialize, serde::Deserialize))]
pub struct ConfigTrustRegion {
    region_initial: RegionInitial,
    region_maximum: f64,
    gtol: f64,
    ftol: f64,
    scaling_minimum: f64,
    scaling_maximum: f64,
}

impl Default for ConfigTrustRegion {
    fn default() -> Self {
        ConfigTrustRegion {
            region_initial: RegionInitial::Explicit(1.0),
            region_maximum: 1e10,
            gtol: 1e-8,
            ftol: 1e-12,
            // scalingMaximum <= scalingMinimum means scaling is off.
            scaling_minimum: 1.0,
            scaling_maximum: 1.0,
        }
    }
}

impl ConfigTrustRegion {
    /// Create a config with the documented defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial region radius directly as a [`RegionInitial`].
    pub fn with_region_initial(mut self, region_initial: RegionInitial) -> Result<Self, Error> {
        if let RegionInitial::Explicit(x) = region_initial {
            if !(x > 0.0) {
                return Err(TrustRegionError::InvalidConfig {
                    text: format!("regionInitial must be > 0 when Explicit; got {x}"),
                }
                .into());
            }
        }
        self.region_initial = region_initial;
        Ok(self)
    }

    /// Set the initial region radius from the legacy numeric encoding.
    pub fn with_region_initial_raw(mut self, raw: f64) -> Result<Self, Error> {
        self.region_initial = RegionInitial::from_raw(raw)?;
        Ok(self)
    }

    /// Set the maximum region radius `Delta_max`. Must be strictly positive
    /// and, if `region_initial` is `Explicit(x)`, at least `x`.
    pub fn with_region_maximum(mut self, region_maximum: f64) -> Result<Self, Error> {
        if !(region_maximum > 0.0) {
            return Err(TrustRegionError::InvalidConfig {
                text: format!("regionMaximum must be > 0; got {region_maximum}"),
            }
            .into());
        }
        if let RegionInitial::Explicit(x) = self.region_initial {
            if region_maximum < x {
                return Err(TrustRegionError::InvalidConfig {
                    text: format!(
                        "regionMaximum ({region_maximum}) must be >= regionInitial ({x})"
                    ),
                }
                .into());
            }
        }
        self.region_maximum = region_maximum;
        Ok(self)
    }

    /// Set the gradient infinity-norm convergence tolerance. Must be `> 0`.
    pub fn with_gtol(mut self, gtol: f64) -> Result<Self, Error> {
        if !(gtol > 0.0) {
            return Err(TrustRegionError::InvalidConfig {
                text: format!("gtol must be > 0; got {gtol}"),
            }
            .into());
        }
        self.gtol = gtol;
        Ok(self)
    }

    /// Set the relative cost-change convergence tolerance. Must be `> 0`.
    pub fn with_ftol(mut self, ftol: f64) -> Result<Self, Error> {
        if !(ftol > 0.0) {
            return Err(TrustRegionError::InvalidConfig {
                text: format!("ftol must be > 0; got {ftol}"),
            }
            .into());
        }
        self.ftol = ftol;
        Ok(self)
    }

    /// Set the `[scaling_minimum, scaling_maximum]` clamp on `sqrt(|diag(H)|)`.
    /// Scaling is active iff `scaling_maximum > scaling_minimum`. Both must
    /// be strictly positive.
    pub fn with_scaling(mut self, scaling_minimum: f64, scaling_maximum: f64) -> Result<Self, Error> {
        if !(scaling_minimum > 0.0) || !(scaling_maximum > 0.0) {
            return Err(TrustRegionError::InvalidConfig {
                text: "scalingMinimum and scalingMaximum must both be > 0".into(),
            }
            .into());
        }
        self.scaling_minimum = scaling_minimum;
        self.scaling_maximum = scaling_maximum;
        Ok(self)
    }

    /// The configured initial region radius.
    pub fn region_initial(&self) -> RegionInitial {
        self.region_initial
    }

    /// `Delta_max`.
    pub fn region_maximum(&self) -> f64 {
        self.region_maximum
    }

    /// Gradient infinity-norm tolerance.
    pub fn gtol(&self) -> f64 {
        self.gtol
    }

    /// Relative cost-change tolerance.
    pub fn ftol(&self) -> f64 {
        self.ftol
    }

    /// Lower clamp on `s`.
    pub fn scaling_minimum(&self) -> f64 {
        self.scaling_minimum
    }

    /// Upper clamp on `s`.
    pub fn scaling_maximum(&self) -> f64 {
        self.scaling_maximum
    }

    /// Whether diagonal scaling is active: `scaling_maximum > scaling_minimum`.
    pub fn scaling_active(&self) -> bool {
        self.scaling_maximum > self.scaling_minimum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_scaling_off() {
        let cfg = ConfigTrustRegion::default();
        assert!(!cfg.scaling_active());
    }

    #[test]
    fn raw_sentinels_parse() {
        assert_eq!(RegionInitial::from_raw(-1.0).unwrap(), RegionInitial::Unconstrained);
        assert_eq!(RegionInitial::from_raw(-2.0).unwrap(), RegionInitial::Cauchy);
        assert_eq!(RegionInitial::from_raw(3.5).unwrap(), RegionInitial::Explicit(3.5));
        assert!(RegionInitial::from_raw(-3.0).is_err());
        assert!(RegionInitial::from_raw(0.0).is_err());
    }

    #[test]
    fn scaling_requires_positive_bounds() {
        let cfg = ConfigTrustRegion::new();
        assert!(cfg.clone().with_scaling(0.0, 10.0).is_err());
        assert!(cfg.with_scaling(1.0, 10.0).unwrap().scaling_active());
    }

    #[test]
    fn region_maximum_below_initial_rejected() {
        let cfg = ConfigTrustRegion::new()
            .with_region_initial(RegionInitial::Explicit(5.0))
            .unwrap();
        assert!(cfg.with_region_maximum(1.0).is_err());
    }
}
