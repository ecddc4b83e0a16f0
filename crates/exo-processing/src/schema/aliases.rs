//! Alias and keyword tables per catalog schema.
//!
//! Each alias list starts with the canonical name itself so that files
//! already in the canonical vocabulary (or in the model vocabulary used by
//! generated templates) map without special cases.

use crate::schema::vocabulary::CanonicalColumn;
use crate::types::SchemaKind;
use once_cell::sync::Lazy;

use CanonicalColumn::*;

/// Ordered aliases per canonical column; the first present alias wins.
pub type AliasTable = Vec<(CanonicalColumn, &'static [&'static str])>;

fn alias(
    column: CanonicalColumn,
    names: &'static [&'static str],
) -> (CanonicalColumn, &'static [&'static str]) {
    (column, names)
}

static KEPLER_ALIASES: Lazy<AliasTable> = Lazy::new(|| {
    vec![
        alias(
            OrbitalPeriod,
            &["orbital_period", "koi_period", "period", "kep_period", "kepoi_period"],
        ),
        alias(TransitDuration, &["transit_duration", "koi_duration", "duration"]),
        alias(TransitDepth, &["transit_depth", "koi_depth", "depth"]),
        alias(
            StellarRadius,
            &["stellar_radius", "koi_srad", "star_radius", "srad", "stellar_radius_rsun"],
        ),
        alias(StellarMass, &["stellar_mass", "koi_smass", "star_mass"]),
        alias(StellarTemperature, &["stellar_temperature", "koi_steff", "star_teff"]),
        alias(PlanetRadius, &["planet_radius", "koi_prad", "radius"]),
        alias(Teq, &["teq", "koi_teq"]),
        alias(Logg, &["logg", "koi_slogg"]),
        alias(ImpactParameter, &["impact_parameter", "koi_impact"]),
        alias(Insolation, &["insolation", "koi_insol"]),
        alias(Snr, &["snr", "koi_model_snr"]),
        alias(PeriodDurationRatio, &["period_duration_ratio"]),
        alias(TransitSnr, &["transit_snr"]),
        alias(DepthDurationRatio, &["depth_duration_ratio"]),
        alias(RadiusRatio, &["radius_ratio"]),
    ]
});

/// Columns shared by the two archive-style tables (K2 and TESS).
fn archive_aliases() -> AliasTable {
    vec![
        alias(OrbitalPeriod, &["orbital_period", "pl_orbper", "period"]),
        alias(
            TransitDuration,
            &["transit_duration", "pl_trandurh", "pl_trandur", "duration"],
        ),
        alias(TransitDepth, &["transit_depth", "pl_trandep", "depth"]),
        alias(StellarRadius, &["stellar_radius", "st_rad", "star_radius"]),
        alias(StellarMass, &["stellar_mass", "st_mass", "star_mass"]),
        alias(StellarTemperature, &["stellar_temperature", "st_teff", "star_teff"]),
        alias(PlanetRadius, &["planet_radius", "pl_rade", "pl_radius", "radius"]),
        alias(Teq, &["teq", "pl_eqt"]),
        alias(Logg, &["logg", "st_logg"]),
        alias(Insolation, &["insolation", "pl_insol"]),
        alias(Snr, &["snr"]),
        alias(PeriodDurationRatio, &["period_duration_ratio"]),
        alias(TransitSnr, &["transit_snr"]),
        alias(DepthDurationRatio, &["depth_duration_ratio"]),
        alias(RadiusRatio, &["radius_ratio"]),
    ]
}

static K2_ALIASES: Lazy<AliasTable> = Lazy::new(|| {
    let mut table = archive_aliases();
    table.push(alias(VMag, &["v_mag", "sy_vmag"]));
    table
});

static TESS_ALIASES: Lazy<AliasTable> = Lazy::new(|| {
    let mut table = archive_aliases();
    table.push(alias(TessMag, &["tess_mag", "st_tmag"]));
    table
});

/// Alias table for a known schema; generic tables have none.
pub fn alias_table(schema: SchemaKind) -> Option<&'static AliasTable> {
    match schema {
        SchemaKind::Kepler => Some(&*KEPLER_ALIASES),
        SchemaKind::K2 => Some(&*K2_ALIASES),
        SchemaKind::Tess => Some(&*TESS_ALIASES),
        SchemaKind::Generic => None,
    }
}

/// Substrings that claim a column for a canonical name when no alias matched.
pub static KEYWORD_TABLE: Lazy<Vec<(CanonicalColumn, &'static [&'static str])>> =
    Lazy::new(|| {
        vec![
            alias(OrbitalPeriod, &["orbper", "period", "per"]),
            alias(TransitDuration, &["trandur", "duration", "dur"]),
            alias(TransitDepth, &["trandep", "depth", "dep"]),
            alias(StellarRadius, &["srad", "st_rad", "star_rad", "rad"]),
            alias(StellarMass, &["smass", "st_mass", "star_mass"]),
            alias(StellarTemperature, &["steff", "st_teff", "star_teff"]),
            alias(PlanetRadius, &["prad", "pl_rade", "planet_rad"]),
        ]
    });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_lists_start_with_canonical_name() {
        for schema in SchemaKind::KNOWN {
            for (column, aliases) in alias_table(schema).unwrap().iter() {
                assert_eq!(aliases[0], column.name(), "{schema}: {column}");
            }
        }
    }

    #[test]
    fn test_generic_has_no_alias_table() {
        assert!(alias_table(SchemaKind::Generic).is_none());
    }

    #[test]
    fn test_mission_specific_magnitudes() {
        let has = |schema, column| {
            alias_table(schema)
                .unwrap()
                .iter()
                .any(|(c, _)| *c == column)
        };
        assert!(has(SchemaKind::K2, VMag));
        assert!(!has(SchemaKind::K2, TessMag));
        assert!(has(SchemaKind::Tess, TessMag));
        assert!(!has(SchemaKind::Kepler, VMag));
    }
}
