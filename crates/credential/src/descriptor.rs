//! Connection descriptors as declared by the input envelope.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Secret payload returned by a provider: the innermost `data` mapping.
pub type SecretPayload = Map<String, Value>;

/// Parameters for resolving one named connection.
///
/// Constructed once per run and never mutated. The token is held as a
/// [`SecretString`] and never printed.
#[derive(Clone)]
pub struct CredentialDescriptor {
    /// Name the connection is exposed under.
    pub name: String,
    /// Identifier of the secret within the connection's namespace.
    pub id: String,
    /// Bearer token for the store.
    pub token: SecretString,
    /// Base URL of the store.
    pub url: String,
}

impl CredentialDescriptor {
    /// Create a descriptor.
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        token: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            token: SecretString::from(token.into()),
            url: url.into(),
        }
    }

    /// Build a descriptor from its wire entry.
    pub fn from_entry(name: impl Into<String>, entry: ConnectionEntry) -> Self {
        Self {
            name: name.into(),
            id: entry.id,
            token: entry.token,
            url: entry.vault_url,
        }
    }

    /// Secret path relative to the store's API root, under `mount`.
    pub fn secret_path(&self, mount: &str) -> String {
        format!("{mount}/data/{}/{}", self.name, self.id)
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for CredentialDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialDescriptor")
            .field("name", &self.name)
            .field("id", &self.id)
            .field("token", &"[REDACTED]")
            .field("url", &self.url)
            .finish()
    }
}

/// One entry of the envelope's `connections` mapping.
#[derive(Deserialize)]
pub struct ConnectionEntry {
    /// Secret identifier.
    #[serde(rename = "Id")]
    pub id: String,
    /// Store token.
    #[serde(rename = "Token")]
    pub token: SecretString,
    /// Store base URL.
    #[serde(rename = "VaultUrl")]
    pub vault_url: String,
}

impl std::fmt::Debug for ConnectionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionEntry")
            .field("id", &self.id)
            .field("vault_url", &self.vault_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn debug_redacts_the_token() {
        let descriptor = CredentialDescriptor::new("db", "42", "s.topsecret", "http://vault:8200");
        let rendered = format!("{descriptor:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("s.topsecret"));
    }

    #[test]
    fn secret_path_is_namespaced_by_name_and_id() {
        let descriptor = CredentialDescriptor::new("github", "abc", "t", "http://vault");
        assert_eq!(descriptor.secret_path("secret"), "secret/data/github/abc");
    }

    #[test]
    fn entry_uses_wire_field_names() {
        let entry: ConnectionEntry = serde_json::from_value(json!({
            "Id": "7",
            "Token": "s.x",
            "VaultUrl": "http://vault:8200"
        }))
        .unwrap();
        let descriptor = CredentialDescriptor::from_entry("slack", entry);

        assert_eq!(descriptor.name, "slack");
        assert_eq!(descriptor.id, "7");
        assert_eq!(descriptor.token(), "s.x");
        assert_eq!(descriptor.url, "http://vault:8200");
    }

    #[test]
    fn entry_requires_every_field() {
        let result = serde_json::from_value::<ConnectionEntry>(json!({"Id": "7", "Token": "s.x"}));
        assert!(result.unwrap_err().to_string().contains("VaultUrl"));
    }
}
