//! Schema detection from column names.
//!
//! Detection is a fixed, priority-ordered list of rules over the lowercase
//! column names. Each rule only looks at which marker substrings are
//! present, so row order and column order never affect the outcome.

use crate::types::SchemaKind;
use tracing::debug;

/// Markers for the K2 planets-and-candidates table.
pub const K2_MARKERS: [&str; 3] = ["v_mag", "sy_vmag", "star_mass"];

/// Markers only the TESS objects-of-interest table carries.
pub const TESS_MARKERS: [&str; 3] = ["tess_mag", "st_tmag", "tfopwg_disp"];

/// Markers for the Kepler cumulative KOI table.
pub const KEPLER_MARKERS: [&str; 4] = ["duration", "impact_parameter", "snr", "koi_"];

/// Lowercase column names joined for substring checks.
#[derive(Debug, Clone)]
pub struct ColumnSignature {
    joined: String,
}

impl ColumnSignature {
    pub fn new<S: AsRef<str>>(columns: &[S]) -> Self {
        let joined = columns
            .iter()
            .map(|c| c.as_ref().trim().to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        Self { joined }
    }

    pub fn contains_any(&self, markers: &[&str]) -> bool {
        markers.iter().any(|m| self.joined.contains(m))
    }
}

/// One detection rule: if `predicate` holds, the table is `schema`.
pub struct ClassificationRule {
    pub name: &'static str,
    pub schema: SchemaKind,
    pub predicate: fn(&ColumnSignature) -> bool,
}

fn looks_like_k2(sig: &ColumnSignature) -> bool {
    sig.contains_any(&K2_MARKERS) && !sig.contains_any(&TESS_MARKERS)
}

fn looks_like_tess(sig: &ColumnSignature) -> bool {
    sig.contains_any(&TESS_MARKERS)
}

fn looks_like_kepler(sig: &ColumnSignature) -> bool {
    sig.contains_any(&KEPLER_MARKERS)
        && !sig.contains_any(&K2_MARKERS)
        && !sig.contains_any(&TESS_MARKERS)
}

/// Detection rules in priority order; the first match wins.
pub const CLASSIFICATION_RULES: [ClassificationRule; 3] = [
    ClassificationRule {
        name: "k2_magnitude_or_mass",
        schema: SchemaKind::K2,
        predicate: looks_like_k2,
    },
    ClassificationRule {
        name: "tess_magnitude_or_disposition",
        schema: SchemaKind::Tess,
        predicate: looks_like_tess,
    },
    ClassificationRule {
        name: "kepler_transit_fields",
        schema: SchemaKind::Kepler,
        predicate: looks_like_kepler,
    },
];

/// Detect the catalog schema of a table from its column names.
///
/// Returns [`SchemaKind::Generic`] when no rule matches; callers decide
/// how to treat that.
pub fn classify<S: AsRef<str>>(columns: &[S]) -> SchemaKind {
    let signature = ColumnSignature::new(columns);
    for rule in &CLASSIFICATION_RULES {
        if (rule.predicate)(&signature) {
            debug!("Schema rule '{}' matched -> {}", rule.name, rule.schema);
            return rule.schema;
        }
    }
    debug!("No schema rule matched; table is generic");
    SchemaKind::Generic
}
