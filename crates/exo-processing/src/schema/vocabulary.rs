//! The canonical column vocabulary every schema is mapped onto.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of canonical columns, each with a fixed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    OrbitalPeriod,
    TransitDuration,
    TransitDepth,
    StellarRadius,
    StellarMass,
    StellarTemperature,
    PlanetRadius,
    Teq,
    Logg,
    Insolation,
    ImpactParameter,
    Snr,
    VMag,
    TessMag,
    PeriodDurationRatio,
    TransitSnr,
    DepthDurationRatio,
    RadiusRatio,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 18] = [
        Self::OrbitalPeriod,
        Self::TransitDuration,
        Self::TransitDepth,
        Self::StellarRadius,
        Self::StellarMass,
        Self::StellarTemperature,
        Self::PlanetRadius,
        Self::Teq,
        Self::Logg,
        Self::Insolation,
        Self::ImpactParameter,
        Self::Snr,
        Self::VMag,
        Self::TessMag,
        Self::PeriodDurationRatio,
        Self::TransitSnr,
        Self::DepthDurationRatio,
        Self::RadiusRatio,
    ];

    /// Column name used in reconciled tables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OrbitalPeriod => "orbital_period",
            Self::TransitDuration => "transit_duration",
            Self::TransitDepth => "transit_depth",
            Self::StellarRadius => "stellar_radius",
            Self::StellarMass => "stellar_mass",
            Self::StellarTemperature => "stellar_temperature",
            Self::PlanetRadius => "planet_radius",
            Self::Teq => "teq",
            Self::Logg => "logg",
            Self::Insolation => "insolation",
            Self::ImpactParameter => "impact_parameter",
            Self::Snr => "snr",
            Self::VMag => "v_mag",
            Self::TessMag => "tess_mag",
            Self::PeriodDurationRatio => "period_duration_ratio",
            Self::TransitSnr => "transit_snr",
            Self::DepthDurationRatio => "depth_duration_ratio",
            Self::RadiusRatio => "radius_ratio",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Self::OrbitalPeriod => "days",
            Self::TransitDuration => "hours",
            Self::TransitDepth => "fraction",
            Self::StellarRadius => "solar radii",
            Self::StellarMass => "solar masses",
            Self::StellarTemperature | Self::Teq => "K",
            Self::PlanetRadius => "earth radii",
            Self::Logg => "log10(cm/s^2)",
            Self::Insolation => "earth flux",
            Self::ImpactParameter | Self::Snr => "dimensionless",
            Self::VMag | Self::TessMag => "mag",
            Self::PeriodDurationRatio => "days/hour",
            Self::TransitSnr | Self::DepthDurationRatio => "fraction/hour",
            Self::RadiusRatio => "earth radii/solar radii",
        }
    }

    /// Engineered ratio columns, as opposed to physical measurements.
    pub fn is_ratio(&self) -> bool {
        matches!(
            self,
            Self::PeriodDurationRatio
                | Self::TransitSnr
                | Self::DepthDurationRatio
                | Self::RadiusRatio
        )
    }

    /// The transit-geometry columns that get no default value.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            Self::OrbitalPeriod | Self::TransitDuration | Self::TransitDepth | Self::StellarRadius
        )
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }

    /// True if `name` spells any canonical column.
    pub fn is_canonical_name(name: &str) -> bool {
        Self::from_name(name).is_some()
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
