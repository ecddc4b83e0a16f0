//! Renames source columns onto the canonical vocabulary.

use crate::error::{Result, ResultExt};
use crate::schema::aliases::{KEYWORD_TABLE, alias_table};
use crate::schema::denylist;
use crate::schema::vocabulary::CanonicalColumn;
use crate::table::RawTable;
use crate::types::{ColumnRename, RenameVia, SchemaKind};
use crate::utils::parse_finite;
use polars::prelude::DataType;
use serde::Serialize;
use tracing::{debug, info};

/// Scale from parts-per-million to a fraction.
pub const PPM_PER_UNIT: f64 = 1e6;

/// What the mapper changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MappingReport {
    pub renames: Vec<ColumnRename>,
    pub depth_converted: bool,
}

/// Maps a table's columns onto canonical names for a given schema.
///
/// Canonical columns that already exist are never remapped or overwritten,
/// so mapping the same table twice is a no-op the second time.
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    depth_ppm_threshold: f64,
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self {
            depth_ppm_threshold: 1.0,
        }
    }
}

impl ColumnMapper {
    pub fn new(depth_ppm_threshold: f64) -> Self {
        Self {
            depth_ppm_threshold,
        }
    }

    pub fn map(&self, table: &mut RawTable, schema: SchemaKind) -> Result<MappingReport> {
        let mut report = MappingReport::default();

        self.normalize_case(table, &mut report)?;
        if let Some(aliases) = alias_table(schema) {
            for (canonical, names) in aliases.iter() {
                self.apply_aliases(table, *canonical, names, &mut report)?;
            }
        }
        for (canonical, keywords) in KEYWORD_TABLE.iter() {
            self.apply_keywords(table, *canonical, keywords, &mut report)?;
        }

        if !table.depth_normalized() {
            report.depth_converted = self.normalize_depth(table)?;
            table.mark_depth_normalized();
        }

        info!(
            "Mapped {} columns for {} schema{}",
            report.renames.len(),
            schema,
            if report.depth_converted { " (depth converted from ppm)" } else { "" }
        );
        Ok(report)
    }

    /// Give case variants of canonical names their exact canonical spelling.
    fn normalize_case(&self, table: &mut RawTable, report: &mut MappingReport) -> Result<()> {
        for canonical in CanonicalColumn::ALL {
            let name = canonical.name();
            if let Some(actual) = table.find_column(name)
                && actual != name
            {
                self.rename(table, &actual, canonical, RenameVia::Case, report)?;
            }
        }
        Ok(())
    }

    fn apply_aliases(
        &self,
        table: &mut RawTable,
        canonical: CanonicalColumn,
        aliases: &[&str],
        report: &mut MappingReport,
    ) -> Result<()> {
        if table.has_column(canonical.name()) {
            return Ok(());
        }
        let source = aliases.iter().find_map(|alias| {
            table
                .find_column(alias)
                .filter(|actual| is_unclaimed(actual) && denylist::is_allowed(actual, canonical))
        });
        if let Some(source) = source {
            self.rename(table, &source, canonical, RenameVia::Alias, report)?;
        }
        Ok(())
    }

    fn apply_keywords(
        &self,
        table: &mut RawTable,
        canonical: CanonicalColumn,
        keywords: &[&str],
        report: &mut MappingReport,
    ) -> Result<()> {
        if table.has_column(canonical.name()) {
            return Ok(());
        }
        let source = table.column_names().into_iter().find(|actual| {
            let lower = actual.to_ascii_lowercase();
            is_unclaimed(actual)
                && keywords.iter().any(|k| lower.contains(k))
                && denylist::is_allowed(actual, canonical)
        });
        if let Some(source) = source {
            self.rename(table, &source, canonical, RenameVia::Keyword, report)?;
        }
        Ok(())
    }

    fn rename(
        &self,
        table: &mut RawTable,
        source: &str,
        canonical: CanonicalColumn,
        via: RenameVia,
        report: &mut MappingReport,
    ) -> Result<()> {
        table
            .rename_column(source, canonical.name())
            .context(format!("Renaming '{}' to '{}'", source, canonical))?;
        debug!("Column '{}' -> '{}' ({:?})", source, canonical, via);
        report.renames.push(ColumnRename {
            source: source.to_string(),
            canonical: canonical.name().to_string(),
            via,
        });
        Ok(())
    }

    /// Scale depths above the ppm threshold to fractions. Text that does not
    /// parse is kept verbatim so row validation can still report it.
    fn normalize_depth(&self, table: &mut RawTable) -> Result<bool> {
        let name = CanonicalColumn::TransitDepth.name();
        let Some(actual) = table.find_column(name) else {
            return Ok(false);
        };
        let dtype = table
            .frame()
            .column(&actual)
            .context("Reading transit depth")?
            .dtype()
            .clone();
        let threshold = self.depth_ppm_threshold;
        let mut converted = 0usize;

        if dtype == DataType::String {
            let Some(cells) = table.text_column(&actual).context("Reading transit depth")? else {
                return Ok(false);
            };
            let scaled = cells
                .into_iter()
                .map(|cell| {
                    cell.map(|text| match parse_finite(&text) {
                        Some(v) if v > threshold => {
                            converted += 1;
                            (v / PPM_PER_UNIT).to_string()
                        }
                        _ => text,
                    })
                })
                .collect();
            table
                .set_text_column(&actual, scaled)
                .context("Converting transit depth")?;
        } else {
            let Some(values) = table.numeric_column(&actual).context("Reading transit depth")? else {
                return Ok(false);
            };
            let scaled = values
                .into_iter()
                .map(|value| {
                    value.map(|v| {
                        if v > threshold {
                            converted += 1;
                            v / PPM_PER_UNIT
                        } else {
                            v
                        }
                    })
                })
                .collect();
            table
                .set_numeric_column(&actual, scaled)
                .context("Converting transit depth")?;
        }

        if converted > 0 {
            debug!("Converted {} transit depth values from ppm", converted);
        }
        Ok(converted > 0)
    }
}

/// Columns already carrying a canonical name belong to that column.
fn is_unclaimed(actual: &str) -> bool {
    !CanonicalColumn::is_canonical_name(actual)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;
    use polars::prelude::*;

    fn table(columns: &[(&str, &[&str])]) -> RawTable {
        let series: Vec<Column> = columns
            .iter()
            .map(|(name, values)| Series::new((*name).into(), values.to_vec()).into_column())
            .collect();
        RawTable::new(DataFrame::new(series).unwrap())
    }

    fn renamed(report: &MappingReport, source: &str) -> Option<(String, RenameVia)> {
        report
            .renames
            .iter()
            .find(|r| r.source == source)
            .map(|r| (r.canonical.clone(), r.via))
    }

    #[test]
    fn test_kepler_aliases() {
        let mut t = table(&[
            ("koi_period", &["12.3"]),
            ("koi_duration", &["2.5"]),
            ("koi_depth", &["1500"]),
            ("koi_srad", &["0.95"]),
        ]);
        let report = ColumnMapper::default().map(&mut t, SchemaKind::Kepler).unwrap();

        assert_eq!(
            renamed(&report, "koi_period"),
            Some(("orbital_period".to_string(), RenameVia::Alias))
        );
        assert_eq!(
            renamed(&report, "koi_duration"),
            Some(("transit_duration".to_string(), RenameVia::Alias))
        );
        assert_eq!(t.cell(0, "transit_duration"), Cell::Text("2.5".to_string()));
        assert!(t.has_column("stellar_radius"));
        assert!(report.depth_converted);
        assert_eq!(t.cell(0, "transit_depth"), Cell::Text("0.0015".to_string()));
    }

    #[test]
    fn test_existing_canonical_column_is_not_overwritten() {
        let mut t = table(&[
            ("orbital_period", &["5.0"]),
            ("koi_period", &["12.3"]),
        ]);
        let report = ColumnMapper::default().map(&mut t, SchemaKind::Kepler).unwrap();

        assert!(renamed(&report, "koi_period").is_none());
        assert_eq!(t.cell(0, "orbital_period"), Cell::Text("5.0".to_string()));
        assert!(t.has_column("koi_period"));
    }

    #[test]
    fn test_repeated_mapping_is_idempotent() {
        let mut t = table(&[
            ("pl_orbper", &["10.0"]),
            ("pl_trandep", &["2500"]),
            ("st_rad", &["1.1"]),
        ]);
        let mapper = ColumnMapper::default();
        let first = mapper.map(&mut t, SchemaKind::Tess).unwrap();
        let second = mapper.map(&mut t, SchemaKind::Tess).unwrap();

        assert!(first.depth_converted);
        assert_eq!(second, MappingReport::default());
        assert_eq!(t.cell(0, "transit_depth"), Cell::Text("0.0025".to_string()));
    }

    #[test]
    fn test_depth_fraction_left_alone() {
        let mut t = table(&[("transit_depth", &["0.0015", "1500", "abc"])]);
        let report = ColumnMapper::default().map(&mut t, SchemaKind::Kepler).unwrap();

        assert!(report.depth_converted);
        assert_eq!(t.cell(0, "transit_depth"), Cell::Text("0.0015".to_string()));
        assert_eq!(t.cell(1, "transit_depth"), Cell::Text("0.0015".to_string()));
        assert_eq!(t.cell(2, "transit_depth"), Cell::Text("abc".to_string()));
    }

    #[test]
    fn test_case_variant_gets_canonical_spelling() {
        let mut t = table(&[("Orbital_Period", &["3.0"])]);
        let report = ColumnMapper::default().map(&mut t, SchemaKind::Generic).unwrap();

        assert_eq!(
            renamed(&report, "Orbital_Period"),
            Some(("orbital_period".to_string(), RenameVia::Case))
        );
        assert_eq!(t.column_names(), vec!["orbital_period".to_string()]);
    }

    #[test]
    fn test_generic_uses_keywords() {
        let mut t = table(&[
            ("pl_rade", &["1.5"]),
            ("st_rad", &["1.0"]),
            ("pl_orbper", &["10"]),
        ]);
        let report = ColumnMapper::default().map(&mut t, SchemaKind::Generic).unwrap();

        assert_eq!(
            renamed(&report, "pl_orbper"),
            Some(("orbital_period".to_string(), RenameVia::Keyword))
        );
        assert_eq!(
            renamed(&report, "st_rad"),
            Some(("stellar_radius".to_string(), RenameVia::Keyword))
        );
        assert_eq!(
            renamed(&report, "pl_rade"),
            Some(("planet_radius".to_string(), RenameVia::Keyword))
        );
    }

    #[test]
    fn test_planet_radius_never_claims_stellar_radius() {
        let mut t = table(&[("pl_rade", &["1.5"]), ("pl_orbper", &["10"])]);
        ColumnMapper::default().map(&mut t, SchemaKind::Generic).unwrap();

        assert!(!t.has_column("stellar_radius"));
        assert!(t.has_column("planet_radius"));
    }

    #[test]
    fn test_temperature_never_claims_period() {
        let mut t = table(&[
            ("star_temperature", &["5778"]),
            ("pl_orbper", &["10.0"]),
            ("pl_trandurh", &["3.0"]),
        ]);
        let report = ColumnMapper::default().map(&mut t, SchemaKind::Generic).unwrap();

        assert!(renamed(&report, "star_temperature").is_none());
        assert_eq!(
            renamed(&report, "pl_orbper"),
            Some(("orbital_period".to_string(), RenameVia::Keyword))
        );
        assert_eq!(t.cell(0, "orbital_period"), Cell::Text("10.0".to_string()));
    }

    #[test]
    fn test_uncertainty_columns_are_skipped() {
        let mut t = table(&[
            ("koi_period_err1", &["0.01"]),
            ("koi_period", &["12.3"]),
        ]);
        let report = ColumnMapper::default().map(&mut t, SchemaKind::Generic).unwrap();

        assert_eq!(
            renamed(&report, "koi_period"),
            Some(("orbital_period".to_string(), RenameVia::Keyword))
        );
        assert!(t.has_column("koi_period_err1"));
    }
}
