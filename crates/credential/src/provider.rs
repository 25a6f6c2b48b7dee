//! The credential provider contract and an in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::descriptor::{CredentialDescriptor, SecretPayload};
use crate::error::CredentialError;

/// Resolves a descriptor to its secret payload.
///
/// Implementations perform one attempt per call; callers never retry.
pub trait CredentialProvider: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Resolve `descriptor` against the backing store.
    fn resolve(&self, descriptor: &CredentialDescriptor) -> Result<SecretPayload, CredentialError>;
}

/// Provider backed by an in-process map keyed by `(name, id)`.
///
/// Useful for tests and local runs without a Vault server. Tracks how many
/// resolutions were requested.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    secrets: HashMap<(String, String), SecretPayload>,
    token: Option<String>,
    calls: AtomicUsize,
}

impl MemoryProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a secret for `(name, id)`.
    pub fn with_secret(
        mut self,
        name: impl Into<String>,
        id: impl Into<String>,
        payload: SecretPayload,
    ) -> Self {
        self.secrets.insert((name.into(), id.into()), payload);
        self
    }

    /// Only accept descriptors carrying this token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Number of `resolve` calls so far.
    pub fn resolution_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl CredentialProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn resolve(&self, descriptor: &CredentialDescriptor) -> Result<SecretPayload, CredentialError> {
        self.calls.fetch_add(1, Ordering::Relaxed);

        if let Some(expected) = &self.token
            && descriptor.token() != expected
        {
            return Err(CredentialError::Authentication {
                connection: descriptor.name.clone(),
                reason: "token rejected".into(),
            });
        }

        self.secrets
            .get(&(descriptor.name.clone(), descriptor.id.clone()))
            .cloned()
            .ok_or_else(|| CredentialError::SecretNotFound {
                connection: descriptor.name.clone(),
                path: descriptor.secret_path("memory"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn payload(value: Value) -> SecretPayload {
        match value {
            Value::Object(map) => map,
            other => panic!("payload must be an object, got {other}"),
        }
    }

    #[test]
    fn resolves_registered_secret() {
        let provider =
            MemoryProvider::new().with_secret("db", "1", payload(json!({"user": "app"})));
        let descriptor = CredentialDescriptor::new("db", "1", "t", "memory://");

        assert_eq!(provider.resolve(&descriptor).unwrap(), payload(json!({"user": "app"})));
        assert_eq!(provider.resolution_count(), 1);
    }

    #[test]
    fn unknown_secret_is_not_found() {
        let provider = MemoryProvider::new();
        let descriptor = CredentialDescriptor::new("db", "1", "t", "memory://");

        let err = provider.resolve(&descriptor).unwrap_err();
        assert_eq!(err.code(), "CREDENTIAL:NOT_FOUND");
    }

    #[test]
    fn wrong_token_fails_authentication() {
        let provider = MemoryProvider::new()
            .with_token("good")
            .with_secret("db", "1", payload(json!({})));
        let descriptor = CredentialDescriptor::new("db", "1", "bad", "memory://");

        let err = provider.resolve(&descriptor).unwrap_err();
        assert_eq!(err.code(), "CREDENTIAL:AUTH");
    }
}
