//! Envelope errors.

use thiserror::Error;

/// Kind reported for every input decoding failure.
pub const INPUT_DECODE_ERROR: &str = "InputDecodeError";

/// Errors raised while decoding the input envelope or encoding the output one.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The input is not JSON and not base64-encoded JSON either.
    #[error("input is not base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not UTF-8.
    #[error("{what} is not valid UTF-8")]
    Utf8 {
        /// Which part of the input was being decoded.
        what: &'static str,
    },

    /// The envelope JSON is malformed or misses a required field.
    #[error("invalid envelope: {0}")]
    Json(#[source] serde_json::Error),

    /// `context` is present but not a JSON object.
    #[error("context must be a JSON object, found {found}")]
    ContextNotObject {
        /// Type name of the value given.
        found: &'static str,
    },

    /// `code` was declared base64 but does not decode.
    #[error("code is not valid base64: {0}")]
    CodeEncoding(#[source] base64::DecodeError),

    /// The output envelope could not be serialized.
    #[error("failed to encode output envelope: {0}")]
    Encode(#[source] serde_json::Error),

    /// The output envelope could not be written.
    #[error("failed to write output envelope: {0}")]
    Io(#[from] std::io::Error),
}

impl EnvelopeError {
    /// Stable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Base64(_) => "ENVELOPE:BASE64",
            Self::Utf8 { .. } => "ENVELOPE:UTF8",
            Self::Json(_) => "ENVELOPE:JSON",
            Self::ContextNotObject { .. } => "ENVELOPE:CONTEXT_NOT_OBJECT",
            Self::CodeEncoding(_) => "ENVELOPE:CODE_ENCODING",
            Self::Encode(_) => "ENVELOPE:ENCODE",
            Self::Io(_) => "ENVELOPE:IO",
        }
    }

    /// Contract name of the failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encode(_) | Self::Io(_) => "OutputEncodeError",
            _ => INPUT_DECODE_ERROR,
        }
    }

    /// Whether the error happened while reading the input.
    pub fn is_decode(&self) -> bool {
        self.kind() == INPUT_DECODE_ERROR
    }
}
