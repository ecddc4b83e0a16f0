//! Derived-feature synthesis.
//!
//! Fills canonical columns the source file lacks but that can be computed
//! from columns it has: transit depth from planet and stellar radii, transit
//! duration from period and stellar radius, and the engineered ratios the
//! mission models consume. Columns that already exist are never touched;
//! holes in existing columns are filled per row during validation.

pub mod physics;
pub mod rules;

pub use rules::{DERIVATION_RULES, DerivationRule, InputSpec, rule_for};

use crate::error::{Result, ResultExt};
use crate::schema::vocabulary::CanonicalColumn;
use crate::table::RawTable;
use tracing::{debug, info};

/// Adds derivable canonical columns to a mapped table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureSynthesizer;

impl FeatureSynthesizer {
    /// Derive every absent column whose inputs are available.
    ///
    /// Returns the columns that were added, in derivation order.
    pub fn synthesize(&self, table: &mut RawTable) -> Result<Vec<CanonicalColumn>> {
        let mut derived = Vec::new();

        for rule in DERIVATION_RULES.iter() {
            let target = rule.target;
            if table.has_column(target.name()) {
                continue;
            }
            if !rule.is_available(table) {
                debug!(
                    "Cannot derive '{}': missing {}",
                    target,
                    rule.missing_inputs(table).join(", ")
                );
                continue;
            }

            let values = rule
                .evaluate_column(table)
                .context(format!("Deriving '{}'", target))?;
            let filled = values.iter().filter(|v| v.is_some()).count();
            table
                .set_numeric_column(target.name(), values)
                .context(format!("Adding derived column '{}'", target))?;

            info!(
                "Derived '{}' for {}/{} rows",
                target,
                filled,
                table.height()
            );
            derived.push(target);
        }

        Ok(derived)
    }
}
