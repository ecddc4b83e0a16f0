//! Row validation against mission feature contracts.

pub mod coercer;
pub mod contract;

pub use coercer::{RowView, coerce_field};
pub use contract::{ContractField, FeatureContract, FeaturePolicy};
