//! santoku-credentials - 凭证解析与处理器工厂
//!
//! Handlers are built either from explicit credentials or from a secret identifier. The second
//! path fetches a [`SecretPayload`] through the [`CredentialResolver`] and unpacks it into the
//! same credential struct the direct path takes (see [`FromSecret`]).

pub mod factory;
pub mod payload;
pub mod resolver;
pub mod store;

pub use factory::FromSecret;
pub use payload::{SecretPayload, SecretValue};
pub use resolver::CredentialResolver;
pub use store::{MemorySecretStore, SecretStore};

#[cfg(any(test, feature = "mocks"))]
pub use store::MockSecretStore;
