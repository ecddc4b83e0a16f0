//! Schema detection and column reconciliation.
//!
//! - [`classifier`]: decides which catalog a table came from
//! - [`vocabulary`]: the canonical column set and units
//! - [`aliases`]: per-schema alias lists and the substring keyword table
//! - [`denylist`]: source columns that must never satisfy certain targets
//! - [`mapper`]: renames source columns onto canonical names

pub mod aliases;
pub mod classifier;
pub mod denylist;
pub mod mapper;
pub mod vocabulary;

pub use classifier::{CLASSIFICATION_RULES, ClassificationRule, classify};
pub use mapper::{ColumnMapper, MappingReport};
pub use vocabulary::CanonicalColumn;
