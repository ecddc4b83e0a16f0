//! Named column exclusions consulted at every aliasing site.
//!
//! Substring matching is loose by nature: `rad` also hits planet radii,
//! `per` also hits uncertainty columns. Each rule here names a family of
//! source columns and the canonical targets it must never satisfy.

use crate::schema::vocabulary::CanonicalColumn;

/// Which canonical columns an exclusion guards.
#[derive(Debug, Clone, Copy)]
pub enum Scope {
    All,
    Only(&'static [CanonicalColumn]),
    PhysicalOnly,
}

/// A named family of source columns that must not satisfy certain targets.
#[derive(Debug, Clone, Copy)]
pub struct Exclusion {
    pub name: &'static str,
    pub scope: Scope,
    matches: fn(&str) -> bool,
}

impl Exclusion {
    pub fn applies_to(&self, target: CanonicalColumn) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::Only(targets) => targets.contains(&target),
            Scope::PhysicalOnly => !target.is_ratio(),
        }
    }

    /// `lower` must already be lowercase.
    pub fn matches(&self, lower: &str) -> bool {
        (self.matches)(lower)
    }
}

const PLANET_RADIUS_NAMES: [&str; 5] = ["koi_prad", "prad", "planet_radius", "pl_radius", "radius"];

fn is_planet_radius(lower: &str) -> bool {
    lower.starts_with("pl_rad") || PLANET_RADIUS_NAMES.contains(&lower) || lower.ends_with("_prad")
}

fn is_uncertainty(lower: &str) -> bool {
    lower.contains("err") || lower.ends_with("lim")
}

/// `ratio` as its own `_`-separated token, so `duration` stays physical.
fn is_engineered_ratio(lower: &str) -> bool {
    lower.split('_').any(|token| token == "ratio")
}

/// Temperatures and limit flags; `per` hides inside `temperature` and `upper`.
fn is_period_lookalike(lower: &str) -> bool {
    ["temp", "teff", "upper", "lower"].iter().any(|m| lower.contains(m))
}

fn is_transit_epoch(lower: &str) -> bool {
    ["time0", "tranmid", "epoch"].iter().any(|m| lower.contains(m))
}

/// All exclusions, in the order they are reported.
pub const DENYLIST: [Exclusion; 5] = [
    Exclusion {
        name: "planet_radius_columns",
        scope: Scope::Only(&[CanonicalColumn::StellarRadius]),
        matches: is_planet_radius,
    },
    Exclusion {
        name: "uncertainty_columns",
        scope: Scope::All,
        matches: is_uncertainty,
    },
    Exclusion {
        name: "engineered_ratio_columns",
        scope: Scope::PhysicalOnly,
        matches: is_engineered_ratio,
    },
    Exclusion {
        name: "transit_epoch_columns",
        scope: Scope::Only(&[CanonicalColumn::TransitDuration]),
        matches: is_transit_epoch,
    },
    Exclusion {
        name: "period_lookalike_columns",
        scope: Scope::Only(&[CanonicalColumn::OrbitalPeriod]),
        matches: is_period_lookalike,
    },
];

/// First exclusion preventing `source` from satisfying `target`.
pub fn exclusion_for(source: &str, target: CanonicalColumn) -> Option<&'static Exclusion> {
    let lower = source.trim().to_ascii_lowercase();
    DENYLIST
        .iter()
        .find(|rule| rule.applies_to(target) && rule.matches(&lower))
}

/// Whether `source` may be used as `target`.
pub fn is_allowed(source: &str, target: CanonicalColumn) -> bool {
    exclusion_for(source, target).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use CanonicalColumn::*;

    #[test]
    fn test_planet_radius_never_stellar_radius() {
        for name in ["pl_rade", "pl_radj", "koi_prad", "PL_RADE", "radius", "planet_radius"] {
            assert!(!is_allowed(name, StellarRadius), "{name} must be excluded");
        }
        assert!(is_allowed("pl_rade", PlanetRadius));
        assert!(is_allowed("st_rad", StellarRadius));
        assert!(is_allowed("koi_srad", StellarRadius));
    }

    #[test]
    fn test_uncertainty_columns_excluded_everywhere() {
        assert_eq!(
            exclusion_for("koi_period_err1", OrbitalPeriod).map(|e| e.name),
            Some("uncertainty_columns")
        );
        assert!(!is_allowed("pl_orbperlim", OrbitalPeriod));
        assert!(!is_allowed("koi_srad_err1", StellarRadius));
    }

    #[test]
    fn test_ratio_columns_only_satisfy_ratios() {
        assert!(!is_allowed("radius_ratio", StellarRadius));
        assert!(is_allowed("radius_ratio", RadiusRatio));
        assert!(!is_allowed("ratio", Teq));
    }

    #[test]
    fn test_duration_is_not_a_ratio() {
        for name in ["koi_duration", "duration", "transit_duration", "pl_trandur"] {
            assert!(is_allowed(name, TransitDuration), "{name} must be allowed");
        }
        assert!(is_allowed("period_duration_ratio", PeriodDurationRatio));
        assert!(!is_allowed("period_duration_ratio", TransitDuration));
    }

    #[test]
    fn test_temperature_and_limits_never_period() {
        assert_eq!(
            exclusion_for("star_temperature", OrbitalPeriod).map(|e| e.name),
            Some("period_lookalike_columns")
        );
        assert!(!is_allowed("koi_steff", OrbitalPeriod));
        assert!(!is_allowed("period_upper", OrbitalPeriod));
        assert!(!is_allowed("period_lower", OrbitalPeriod));
        assert!(is_allowed("pl_orbper", OrbitalPeriod));
        assert!(is_allowed("star_temperature", StellarTemperature));
    }

    #[test]
    fn test_epoch_columns_never_duration() {
        assert!(!is_allowed("koi_time0bk", TransitDuration));
        assert!(!is_allowed("pl_tranmid", TransitDuration));
        assert!(is_allowed("koi_duration", TransitDuration));
        assert!(is_allowed("duration", TransitDuration));
    }
}
