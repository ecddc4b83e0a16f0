//! Blank CSV templates for each mission's feature contract.

use crate::error::{ReconcileError, Result};
use crate::types::SchemaKind;
use crate::validate::FeatureContract;

/// Plausible value per model feature, used for the example row.
const EXAMPLE_VALUES: [(&str, f64); 18] = [
    ("period", 10.5),
    ("duration", 2.3),
    ("depth", 0.0015),
    ("radius", 1.2),
    ("teq", 300.0),
    ("star_radius", 0.95),
    ("star_mass", 0.98),
    ("star_teff", 5800.0),
    ("logg", 4.4),
    ("impact_parameter", 0.1),
    ("insolation", 1200.0),
    ("snr", 15.0),
    ("tess_mag", 11.2),
    ("v_mag", 12.5),
    ("period_duration_ratio", 4.57),
    ("transit_snr", 12.0),
    ("depth_duration_ratio", 0.00065),
    ("radius_ratio", 1.26),
];

fn example_value(feature: &str) -> Option<f64> {
    EXAMPLE_VALUES
        .iter()
        .find(|(name, _)| *name == feature)
        .map(|(_, v)| *v)
}

/// CSV text with the mission's feature header, one example row and one
/// empty row.
///
/// # Errors
///
/// [`ReconcileError::UnknownSchema`] for [`SchemaKind::Generic`], which has
/// no contract of its own.
pub fn render(schema: SchemaKind) -> Result<String> {
    let contract = FeatureContract::for_schema(schema)
        .ok_or_else(|| ReconcileError::UnknownSchema(schema.to_string()))?;
    let features = contract.feature_names();

    let example: Vec<String> = features
        .iter()
        .map(|f| example_value(f).map(|v| v.to_string()).unwrap_or_default())
        .collect();
    let empty = vec![""; features.len()];

    Ok(format!(
        "{}\n{}\n{}\n",
        features.join(","),
        example.join(","),
        empty.join(",")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_kepler() {
        let csv = render(SchemaKind::Kepler).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("period,duration,depth,radius,teq,star_radius"));
        assert!(lines[1].starts_with("10.5,2.3,0.0015,1.2,300,0.95"));
        assert_eq!(lines[2], ",".repeat(13));
    }

    #[test]
    fn test_every_feature_has_an_example() {
        for schema in SchemaKind::KNOWN {
            let csv = render(schema).unwrap();
            let example = csv.lines().nth(1).unwrap();
            assert!(
                example.split(',').all(|v| !v.is_empty()),
                "{schema}: {example}"
            );
        }
    }

    #[test]
    fn test_render_generic_fails() {
        assert!(matches!(
            render(SchemaKind::Generic),
            Err(ReconcileError::UnknownSchema(_))
        ));
    }
}
