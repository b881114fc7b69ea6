// src/models/mod.rs

//! Domain models for the reporting core.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod aggregation;
mod config;
mod page;
mod query;
mod record;
mod report;
mod role;
mod session;

// Re-export all public types
pub use aggregation::{AggregationRow, CrossTab, CrossTabRow};
pub use config::{Config, ListingConfig, Messages, StoreConfig};
pub use page::Page;
pub use query::{Filter, Mutation, MutationOutcome, matches_all};
pub use record::{Record, Value, records_from_json};
pub use report::{KeyDerive, KeySpec, ListingSpec, ReportKind, ReportOrder, ReportSpec};
pub use role::{AccessPolicy, Role};
pub use session::{Session, UserIdentity};
