//! Lazily-resolved connection accessors.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::descriptor::{CredentialDescriptor, SecretPayload};
use crate::error::CredentialError;
use crate::provider::CredentialProvider;

struct Connection {
    descriptor: CredentialDescriptor,
    outcome: Option<Result<SecretPayload, CredentialError>>,
}

/// The named connections available to one run.
///
/// Nothing is resolved up front. The first access to a connection asks the
/// provider once and caches the outcome, success or failure; later accesses
/// replay it without calling the provider again.
pub struct ConnectionSet {
    provider: Arc<dyn CredentialProvider>,
    connections: BTreeMap<String, Connection>,
}

impl ConnectionSet {
    /// Create an empty set resolving through `provider`.
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            provider,
            connections: BTreeMap::new(),
        }
    }

    /// Create a set from descriptors.
    pub fn from_descriptors(
        provider: Arc<dyn CredentialProvider>,
        descriptors: impl IntoIterator<Item = CredentialDescriptor>,
    ) -> Self {
        let mut set = Self::new(provider);
        for descriptor in descriptors {
            set.insert(descriptor);
        }
        set
    }

    /// Add a connection under its descriptor name, replacing any previous one.
    pub fn insert(&mut self, descriptor: CredentialDescriptor) {
        self.connections.insert(
            descriptor.name.clone(),
            Connection {
                descriptor,
                outcome: None,
            },
        );
    }

    /// Declared connection names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    /// Whether `name` is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    /// Number of declared connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are declared.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Whether `name` has been resolved (successfully or not).
    pub fn is_resolved(&self, name: &str) -> bool {
        self.connections
            .get(name)
            .is_some_and(|connection| connection.outcome.is_some())
    }

    /// Resolve `name`, asking the provider only on first access.
    pub fn resolve(&mut self, name: &str) -> Result<&SecretPayload, CredentialError> {
        let Some(connection) = self.connections.get_mut(name) else {
            return Err(CredentialError::UnknownConnection {
                connection: name.to_owned(),
            });
        };

        let provider = &self.provider;
        let outcome = connection.outcome.get_or_insert_with(|| {
            tracing::debug!(connection = %name, provider = provider.name(), "resolving connection");
            let outcome = provider.resolve(&connection.descriptor);
            if let Err(e) = &outcome {
                tracing::warn!(
                    connection = %name,
                    code = e.code(),
                    error = %e,
                    "connection resolution failed"
                );
            }
            outcome
        });

        outcome.as_ref().map_err(Clone::clone)
    }

    /// Drop every cached secret. Declared connections stay declared.
    pub fn teardown(&mut self) {
        let mut cleared = 0usize;
        for connection in self.connections.values_mut() {
            if connection.outcome.take().is_some() {
                cleared += 1;
            }
        }
        tracing::trace!(cleared, "connection cache cleared");
    }
}

impl std::fmt::Debug for ConnectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSet")
            .field("provider", &self.provider.name())
            .field("connections", &self.connections.keys().collect::<Vec<_>>())
            .finish()
    }
}
