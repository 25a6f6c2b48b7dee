//! # Runlet Credential
//!
//! Named connections for a run and the providers that resolve them.
//!
//! A [`ConnectionSet`] holds one [`CredentialDescriptor`] per declared
//! connection and resolves each lazily through a [`CredentialProvider`]:
//! a snippet that never touches a connection never pays for it nor sees
//! its failure. Outcomes are cached; nothing is retried.
//!
//! Providers:
//! - [`VaultProvider`]: HashiCorp Vault KV v2 over HTTP.
//! - [`MemoryProvider`]: in-process map for tests and local runs.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod connections;
mod descriptor;
mod error;
mod provider;
mod vault;

pub use connections::ConnectionSet;
pub use descriptor::{ConnectionEntry, CredentialDescriptor, SecretPayload};
pub use error::{CredentialError, SettingsError};
pub use provider::{CredentialProvider, MemoryProvider};
pub use vault::{VaultProvider, VaultSettings};
