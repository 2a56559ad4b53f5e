//! stratify - stratified resampling planner for relational tables
//!
//! Profiles a class column, decides a target size and resampling method
//! per level, and materializes the balanced sample with one composed
//! statement executed by the store.

pub mod balance;
pub mod cli;
pub mod observability;
pub mod sql;
pub mod store;
