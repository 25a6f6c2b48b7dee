//! HashiCorp Vault KV v2 provider.
//!
//! Resolution is two requests, both authenticated with the descriptor's
//! token via `X-Vault-Token`:
//!
//! 1. `GET {url}/v1/auth/token/lookup-self` confirms the token is accepted.
//!    A transport failure or a non-success status is an authentication
//!    failure.
//! 2. `GET {url}/v1/{mount}/data/{name}/{id}` reads the secret. The payload
//!    is the nested `data.data` mapping of the response.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::descriptor::{CredentialDescriptor, SecretPayload};
use crate::error::{CredentialError, SettingsError};
use crate::provider::CredentialProvider;

const TOKEN_HEADER: &str = "X-Vault-Token";
const LOOKUP_SELF: &str = "auth/token/lookup-self";

/// Settings shared by every connection resolved through Vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultSettings {
    /// KV v2 mount path (default: `secret`).
    pub mount: String,
    /// Per-request timeout in seconds (1-60).
    pub timeout_secs: u64,
    /// Verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            mount: "secret".into(),
            timeout_secs: 10,
            verify_tls: true,
        }
    }
}

impl VaultSettings {
    /// Check the settings before building a client.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.mount.is_empty() {
            return Err(SettingsError::MissingRequired {
                field: "mount".into(),
            });
        }

        if self.mount.starts_with('/') || self.mount.ends_with('/') {
            return Err(SettingsError::InvalidValue {
                field: "mount".into(),
                reason: "must not start or end with '/'".into(),
            });
        }

        if !(1..=60).contains(&self.timeout_secs) {
            return Err(SettingsError::InvalidValue {
                field: "timeout_secs".into(),
                reason: format!(
                    "must be between 1 and 60 seconds, got {} seconds",
                    self.timeout_secs
                ),
            });
        }

        Ok(())
    }

    /// Request timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Provider reading secrets from a Vault KV v2 engine.
///
/// The store URL comes from each descriptor, so one provider serves every
/// connection in a run.
#[derive(Debug, Clone)]
pub struct VaultProvider {
    client: Client,
    settings: VaultSettings,
}

impl VaultProvider {
    /// Validate settings and build the HTTP client.
    pub fn new(settings: VaultSettings) -> Result<Self, SettingsError> {
        settings.validate()?;

        let client = Client::builder()
            .timeout(settings.timeout())
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| SettingsError::Client {
                reason: e.to_string(),
            })?;

        tracing::debug!(
            mount = %settings.mount,
            timeout_secs = settings.timeout_secs,
            verify_tls = settings.verify_tls,
            "initialized vault provider"
        );

        Ok(Self { client, settings })
    }

    /// Settings this provider was built with.
    pub fn settings(&self) -> &VaultSettings {
        &self.settings
    }

    fn endpoint(
        descriptor: &CredentialDescriptor,
        relative: &str,
    ) -> Result<Url, CredentialError> {
        let invalid = |reason: String| CredentialError::InvalidUrl {
            connection: descriptor.name.clone(),
            reason,
        };

        let base = Url::parse(&descriptor.url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }

        let joined = format!("{}/v1/{relative}", base.as_str().trim_end_matches('/'));
        Url::parse(&joined).map_err(|e| invalid(e.to_string()))
    }

    fn check_token(&self, descriptor: &CredentialDescriptor) -> Result<(), CredentialError> {
        let url = Self::endpoint(descriptor, LOOKUP_SELF)?;
        let auth_failure = |reason: String| CredentialError::Authentication {
            connection: descriptor.name.clone(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, descriptor.token())
            .send()
            .map_err(|e| auth_failure(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(auth_failure(format!("token rejected with status {status}")))
        }
    }

    fn read_secret(
        &self,
        descriptor: &CredentialDescriptor,
    ) -> Result<SecretPayload, CredentialError> {
        let path = descriptor.secret_path(&self.settings.mount);
        let url = Self::endpoint(descriptor, &path)?;
        let transport = |reason: String| CredentialError::Transport {
            connection: descriptor.name.clone(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header(TOKEN_HEADER, descriptor.token())
            .send()
            .map_err(|e| transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CredentialError::SecretNotFound {
                connection: descriptor.name.clone(),
                path,
            });
        }
        if !status.is_success() {
            return Err(transport(format!("secret read returned status {status}")));
        }

        let body: Value = response
            .json()
            .map_err(|_| CredentialError::MalformedSecret {
                connection: descriptor.name.clone(),
            })?;

        extract_payload(descriptor, path, body)
    }
}

impl CredentialProvider for VaultProvider {
    fn name(&self) -> &'static str {
        "vault"
    }

    #[tracing::instrument(
        skip(self, descriptor),
        fields(provider = "vault", connection = %descriptor.name)
    )]
    fn resolve(&self, descriptor: &CredentialDescriptor) -> Result<SecretPayload, CredentialError> {
        self.check_token(descriptor)?;
        let payload = self.read_secret(descriptor)?;
        tracing::debug!(keys = payload.len(), "resolved secret");
        Ok(payload)
    }
}

/// Pull the `data.data` mapping out of a KV v2 read response.
fn extract_payload(
    descriptor: &CredentialDescriptor,
    path: String,
    body: Value,
) -> Result<SecretPayload, CredentialError> {
    let Value::Object(mut root) = body else {
        return Err(CredentialError::MalformedSecret {
            connection: descriptor.name.clone(),
        });
    };

    match root.remove("data") {
        None | Some(Value::Null) => Err(CredentialError::SecretNotFound {
            connection: descriptor.name.clone(),
            path,
        }),
        Some(Value::Object(mut outer)) => match outer.remove("data") {
            Some(Value::Object(payload)) => Ok(payload),
            _ => Err(CredentialError::MalformedSecret {
                connection: descriptor.name.clone(),
            }),
        },
        Some(_) => Err(CredentialError::MalformedSecret {
            connection: descriptor.name.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn descriptor(url: &str) -> CredentialDescriptor {
        CredentialDescriptor::new("github", "42", "s.token", url)
    }

    #[test]
    fn default_settings_are_valid() {
        assert!(VaultSettings::default().validate().is_ok());
    }

    #[rstest]
    #[case(VaultSettings { mount: String::new(), ..VaultSettings::default() }, "mount")]
    #[case(VaultSettings { mount: "/secret".into(), ..VaultSettings::default() }, "mount")]
    #[case(VaultSettings { timeout_secs: 0, ..VaultSettings::default() }, "timeout_secs")]
    #[case(VaultSettings { timeout_secs: 61, ..VaultSettings::default() }, "timeout_secs")]
    fn invalid_settings_name_the_field(#[case] settings: VaultSettings, #[case] field: &str) {
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains(field), "{err}");
    }

    #[rstest]
    #[case("http://vault:8200", "http://vault:8200/v1/auth/token/lookup-self")]
    #[case("http://vault:8200/", "http://vault:8200/v1/auth/token/lookup-self")]
    #[case("https://host/prefix", "https://host/prefix/v1/auth/token/lookup-self")]
    fn endpoints_are_joined_under_v1(#[case] base: &str, #[case] expected: &str) {
        let url = VaultProvider::endpoint(&descriptor(base), LOOKUP_SELF).unwrap();
        assert_eq!(url.as_str(), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("ftp://vault")]
    fn unusable_urls_are_rejected(#[case] base: &str) {
        let err = VaultProvider::endpoint(&descriptor(base), LOOKUP_SELF).unwrap_err();
        assert_eq!(err.code(), "CREDENTIAL:INVALID_URL");
    }

    #[test]
    fn payload_is_the_nested_data_mapping() {
        let body = json!({"data": {"data": {"token": "abc"}, "metadata": {"version": 3}}});
        let payload = extract_payload(&descriptor("http://v"), "p".into(), body).unwrap();
        assert_eq!(Value::Object(payload), json!({"token": "abc"}));
    }

    #[rstest]
    #[case(json!({"data": null}), "CREDENTIAL:NOT_FOUND")]
    #[case(json!({"errors": []}), "CREDENTIAL:NOT_FOUND")]
    #[case(json!({"data": {"metadata": {}}}), "CREDENTIAL:MALFORMED")]
    #[case(json!({"data": {"data": "flat"}}), "CREDENTIAL:MALFORMED")]
    #[case(json!({"data": [1]}), "CREDENTIAL:MALFORMED")]
    #[case(json!("nope"), "CREDENTIAL:MALFORMED")]
    fn unexpected_shapes(#[case] body: Value, #[case] code: &str) {
        let err = extract_payload(&descriptor("http://v"), "p".into(), body).unwrap_err();
        assert_eq!(err.code(), code);
    }
}
