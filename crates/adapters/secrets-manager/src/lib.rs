//! adapter-secrets-manager - AWS Secrets Manager adapter
//!
//! Reads secrets by name and serves as the production [`SecretStore`] behind the credential
//! resolver.
//!
//! [`SecretStore`]: santoku_credentials::SecretStore

pub mod client;
pub mod error;

pub use client::SecretsManagerHandler;
