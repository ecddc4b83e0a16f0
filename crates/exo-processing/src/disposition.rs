//! Catalog disposition normalization.
//!
//! Each archive spells its ground-truth labels differently: the KOI table
//! uses phrases, the TOI table uses TFOPWG codes (`PC`, `KP`, `FP`, ...).
//! [`normalize`] folds them onto three outcomes and never fails.

use crate::predict::PredictionLabel;
use serde::{Serialize, Serializer};
use std::fmt;

/// Exact labels, compared after trimming and uppercasing.
const EXACT_LABELS: [(&str, Disposition); 11] = [
    ("CONFIRMED", Disposition::Confirmed),
    ("CONFIRMED_PLANET", Disposition::Confirmed),
    ("CP", Disposition::Confirmed),
    ("KP", Disposition::Confirmed),
    ("CANDIDATE", Disposition::Candidate),
    ("PC", Disposition::Candidate),
    ("PC?", Disposition::Candidate),
    ("FALSE POSITIVE", Disposition::FalsePositive),
    ("FALSE_POSITIVE", Disposition::FalsePositive),
    ("FP", Disposition::FalsePositive),
    ("FA", Disposition::FalsePositive),
];

/// Substring fallbacks, checked in order.
const SUBSTRING_LABELS: [(&str, Disposition); 3] = [
    ("FALSE", Disposition::FalsePositive),
    ("CANDID", Disposition::Candidate),
    ("CONFIR", Disposition::Confirmed),
];

/// Normalized catalog disposition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Disposition {
    Confirmed,
    Candidate,
    FalsePositive,
    /// Label outside the known vocabulary, kept as written. Empty when the
    /// cell was blank.
    Unrecognized(String),
}

impl Disposition {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Candidate => "CANDIDATE",
            Self::FalsePositive => "FALSE POSITIVE",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Prediction label this disposition corresponds to.
    pub fn prediction_label(&self) -> Option<PredictionLabel> {
        match self {
            Self::Confirmed => Some(PredictionLabel::Exoplanet),
            Self::Candidate => Some(PredictionLabel::Candidate),
            Self::FalsePositive => Some(PredictionLabel::FalsePositive),
            Self::Unrecognized(_) => None,
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Disposition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Normalize a raw catalog label.
pub fn normalize(raw: &str) -> Disposition {
    let upper = raw.trim().to_uppercase();
    if upper.is_empty() || upper == "NAN" {
        return Disposition::Unrecognized(String::new());
    }

    if let Some((_, disposition)) = EXACT_LABELS.iter().find(|(label, _)| *label == upper) {
        return disposition.clone();
    }
    if let Some((_, disposition)) = SUBSTRING_LABELS
        .iter()
        .find(|(fragment, _)| upper.contains(fragment))
    {
        return disposition.clone();
    }

    Disposition::Unrecognized(raw.to_string())
}

/// First column that holds catalog dispositions (`koi_disposition`,
/// `tfopwg_disp`, `disposition`, ...).
pub fn find_disposition_column<S: AsRef<str>>(columns: &[S]) -> Option<&str> {
    columns.iter().map(AsRef::as_ref).find(|name| {
        let lower = name.to_ascii_lowercase();
        lower.contains("disposition") || lower.contains("disp")
    })
}
