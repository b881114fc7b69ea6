// src/lib.rs

//! archivo: reporting core of an editorial archive.
//!
//! Role-gated loading, aggregation for statistics dashboards and pagination
//! for listing screens, over a pluggable data store.

pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
