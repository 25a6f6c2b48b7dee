//! The input envelope.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use runlet_context::{ContextStore, flatten, value_type_name};
use runlet_credential::{ConnectionEntry, CredentialDescriptor};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::EnvelopeError;

/// How the `code` field is encoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeEncoding {
    /// Snippet source as-is.
    #[default]
    Plain,
    /// Standard base64 of the UTF-8 source.
    Base64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEnvelope {
    context: Value,
    code: String,
    connections: BTreeMap<String, ConnectionEntry>,
    #[serde(default)]
    code_encoding: CodeEncoding,
}

/// A decoded input envelope.
#[derive(Debug)]
pub struct InputEnvelope {
    /// Context tree after the flatten pass.
    pub context: Map<String, Value>,
    /// Snippet source.
    pub code: String,
    /// Declared connections, sorted by name.
    pub connections: Vec<CredentialDescriptor>,
}

impl InputEnvelope {
    /// Decode raw input bytes.
    ///
    /// Input whose first non-whitespace byte is `{` is read as JSON;
    /// anything else is treated as base64-encoded JSON.
    pub fn decode(raw: &[u8]) -> Result<Self, EnvelopeError> {
        let trimmed = raw.trim_ascii();
        if trimmed.first() == Some(&b'{') {
            let text = std::str::from_utf8(trimmed)
                .map_err(|_| EnvelopeError::Utf8 { what: "input" })?;
            return Self::from_json(text);
        }

        let compact: Vec<u8> = trimmed
            .iter()
            .copied()
            .filter(|byte| !byte.is_ascii_whitespace())
            .collect();
        let decoded = STANDARD.decode(compact)?;
        tracing::debug!(bytes = decoded.len(), "decoded base64 input envelope");
        let text = String::from_utf8(decoded).map_err(|_| EnvelopeError::Utf8 { what: "input" })?;
        Self::from_json(&text)
    }

    /// Decode a JSON envelope.
    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        let wire: WireEnvelope = serde_json::from_str(text).map_err(EnvelopeError::Json)?;

        let context = match flatten(wire.context) {
            Value::Object(tree) => tree,
            other => {
                return Err(EnvelopeError::ContextNotObject {
                    found: value_type_name(&other),
                });
            }
        };

        let code = match wire.code_encoding {
            CodeEncoding::Plain => wire.code,
            CodeEncoding::Base64 => {
                let bytes = STANDARD
                    .decode(wire.code.trim())
                    .map_err(EnvelopeError::CodeEncoding)?;
                String::from_utf8(bytes).map_err(|_| EnvelopeError::Utf8 { what: "code" })?
            }
        };

        let connections: Vec<_> = wire
            .connections
            .into_iter()
            .map(|(name, entry)| CredentialDescriptor::from_entry(name, entry))
            .collect();

        tracing::debug!(
            context_keys = context.len(),
            code_bytes = code.len(),
            connections = connections.len(),
            "decoded input envelope"
        );

        Ok(Self {
            context,
            code,
            connections,
        })
    }

    /// Split into store, source and connections, consuming the envelope.
    pub fn into_parts(
        self,
        root_prefix: &str,
    ) -> (ContextStore, String, Vec<CredentialDescriptor>) {
        (
            ContextStore::new(self.context).with_root_prefix(root_prefix),
            self.code,
            self.connections,
        )
    }
}
