//! Credential resolution errors.

use thiserror::Error;

/// Failures while resolving a named connection to its secret payload.
///
/// Every variant is reported to snippet authors under the single
/// `CredentialResolutionError` kind; the variant is kept for diagnostics.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// The token was rejected or the store could not be reached.
    #[error("unable to authenticate to the credential store for '{connection}': {reason}")]
    Authentication {
        /// Connection name from the envelope.
        connection: String,
        /// Message from the store or the client.
        reason: String,
    },

    /// The store returned no data for the secret path.
    #[error("secret for '{connection}' not found at '{path}'")]
    SecretNotFound {
        /// Connection name from the envelope.
        connection: String,
        /// Secret path that was read.
        path: String,
    },

    /// The store answered without the nested `data.data` mapping.
    #[error("invalid secret structure, failed resolving '{connection}'")]
    MalformedSecret {
        /// Connection name from the envelope.
        connection: String,
    },

    /// The snippet asked for a connection the envelope never declared.
    #[error("connection '{connection}' is not defined")]
    UnknownConnection {
        /// Name the snippet asked for.
        connection: String,
    },

    /// The descriptor's store URL cannot be used.
    #[error("invalid store url for '{connection}': {reason}")]
    InvalidUrl {
        /// Connection name from the envelope.
        connection: String,
        /// Why the URL was rejected.
        reason: String,
    },

    /// The store answered the secret read with an unexpected status.
    #[error("credential store request for '{connection}' failed: {reason}")]
    Transport {
        /// Connection name from the envelope.
        connection: String,
        /// Status or transport failure.
        reason: String,
    },
}

impl CredentialError {
    /// Kind name surfaced to snippets.
    pub const KIND: &'static str = "CredentialResolutionError";

    /// Stable error code for categorization.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication { .. } => "CREDENTIAL:AUTH",
            Self::SecretNotFound { .. } => "CREDENTIAL:NOT_FOUND",
            Self::MalformedSecret { .. } => "CREDENTIAL:MALFORMED",
            Self::UnknownConnection { .. } => "CREDENTIAL:UNKNOWN_CONNECTION",
            Self::InvalidUrl { .. } => "CREDENTIAL:INVALID_URL",
            Self::Transport { .. } => "CREDENTIAL:TRANSPORT",
        }
    }

    /// Kind name surfaced to snippets; identical for every variant.
    pub fn kind(&self) -> &'static str {
        Self::KIND
    }

    /// Name of the connection that failed to resolve.
    pub fn connection(&self) -> &str {
        match self {
            Self::Authentication { connection, .. }
            | Self::SecretNotFound { connection, .. }
            | Self::MalformedSecret { connection }
            | Self::UnknownConnection { connection }
            | Self::InvalidUrl { connection, .. }
            | Self::Transport { connection, .. } => connection,
        }
    }
}

/// Invalid provider settings, detected before any request is made.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A required setting is empty.
    #[error("missing required setting '{field}'")]
    MissingRequired {
        /// Setting name.
        field: String,
    },

    /// A setting has an unusable value.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Setting name.
        field: String,
        /// Accepted range or format.
        reason: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {reason}")]
    Client {
        /// Builder error text.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(CredentialError::Authentication { connection: "db".into(), reason: "403".into() })]
    #[case(CredentialError::SecretNotFound {
        connection: "db".into(),
        path: "secret/data/db/1".into(),
    })]
    #[case(CredentialError::MalformedSecret { connection: "db".into() })]
    #[case(CredentialError::UnknownConnection { connection: "db".into() })]
    fn every_variant_reports_one_kind(#[case] err: CredentialError) {
        assert_eq!(err.kind(), "CredentialResolutionError");
        assert_eq!(err.connection(), "db");
    }

    #[test]
    fn malformed_message_names_the_connection() {
        let err = CredentialError::MalformedSecret {
            connection: "github".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid secret structure, failed resolving 'github'"
        );
    }
}
