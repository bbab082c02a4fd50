//! adapter-salesforce - Salesforce REST API adapter
//!
//! Authenticates lazily with the OAuth username/password flow and validates object names and
//! payload fields against the org's metadata before sending a request.

pub mod client;
pub mod config;
pub mod error;
pub mod path;

pub use client::SalesforceHandler;
pub use config::SalesforceCredentials;
pub use path::object_name_from_path;
