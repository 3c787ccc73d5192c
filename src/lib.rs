//! Revenue report ingestion
//!
//! Fetches App Store Connect sales and subscription reports, classifies their
//! rows into revenue transactions, merges the two sources and stores the
//! result.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod persistence;
pub mod rate_limit;
pub mod secrets;
