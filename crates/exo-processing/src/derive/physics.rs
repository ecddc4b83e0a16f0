//! Transit geometry formulas.
//!
//! All functions return `None` instead of producing a division by zero,
//! an infinity or a `NaN`.

use crate::utils::finite;
use std::f64::consts::PI;

/// One Earth radius in solar radii.
pub const EARTH_RADIUS_IN_SOLAR_RADII: f64 = 0.009155;

/// One solar radius in astronomical units.
pub const SOLAR_RADIUS_IN_AU: f64 = 0.00465047;

/// One Jupiter radius in Earth radii.
pub const JUPITER_RADIUS_IN_EARTH_RADII: f64 = 11.209;

pub const DAYS_PER_YEAR: f64 = 365.25;

pub const HOURS_PER_DAY: f64 = 24.0;

/// `numerator / denominator`, or `None` for a zero denominator or a
/// non-finite operand or result.
pub fn guarded_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if !numerator.is_finite() || !denominator.is_finite() || denominator == 0.0 {
        return None;
    }
    finite(numerator / denominator)
}

/// Fractional transit depth, `(Rp * 0.009155 / Rs)^2`.
pub fn transit_depth(planet_radius_earth: f64, stellar_radius_solar: f64) -> Option<f64> {
    guarded_ratio(planet_radius_earth * EARTH_RADIUS_IN_SOLAR_RADII, stellar_radius_solar)
        .and_then(|ratio| finite(ratio * ratio))
}

/// Semi-major axis (AU) from Kepler's third law for a solar-mass host.
pub fn semi_major_axis_from_period(period_days: f64) -> Option<f64> {
    if !period_days.is_finite() || period_days < 0.0 {
        return None;
    }
    finite((period_days / DAYS_PER_YEAR).powf(2.0 / 3.0))
}

/// Transit duration in hours, `(P / pi) * (Rs * 0.00465047 / a) * 24`.
///
/// A missing, zero or non-finite `semi_major_axis_au` falls back to the
/// Kepler-law estimate.
pub fn transit_duration_hours(
    period_days: f64,
    stellar_radius_solar: f64,
    semi_major_axis_au: Option<f64>,
) -> Option<f64> {
    let a = semi_major_axis_au
        .filter(|a| a.is_finite() && *a > 0.0)
        .or_else(|| semi_major_axis_from_period(period_days))?;
    let chord = guarded_ratio(stellar_radius_solar * SOLAR_RADIUS_IN_AU, a)?;
    finite(period_days / PI * chord * HOURS_PER_DAY)
}
