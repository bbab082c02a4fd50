//! adapter-bigquery - Google BigQuery adapter
//!
//! Runs SQL queries through the BigQuery REST API, authenticating as a service account with a
//! signed JWT bearer grant.

pub mod auth;
pub mod client;
pub mod config;
pub mod query;

pub use client::BigQueryHandler;
pub use config::ServiceAccountKey;
pub use query::QueryResult;
