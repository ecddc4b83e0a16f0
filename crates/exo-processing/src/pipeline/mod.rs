//! Pipeline module.
//!
//! Ties ingestion, schema reconciliation, validation and prediction
//! together behind [`Pipeline`].

mod builder;
mod reconcile;

pub use builder::{PREVIEW_ROWS, Pipeline, PipelineBuilder};
pub use reconcile::Reconciliation;
