//! # Runlet Envelope
//!
//! Wire formats of the runner.
//!
//! [`InputEnvelope`] decodes `{context, code, connections}` from JSON or
//! from its base64 encoding, expands JSON-encoded string leaves in the
//! context, and turns connection entries into
//! [`CredentialDescriptor`](runlet_credential::CredentialDescriptor)s.
//! [`OutputEnvelope`] is the `{output, error, context}` object written once
//! on stdout.
//!
//! ```
//! use runlet_envelope::{InputEnvelope, OutputEnvelope};
//!
//! let raw = br#"{
//!     "context": {"variables": {"n": "[1, 2]"}},
//!     "code": "print(1)",
//!     "connections": {}
//! }"#;
//! let input = InputEnvelope::decode(raw).unwrap();
//! assert_eq!(input.context["variables"]["n"], serde_json::json!([1, 2]));
//!
//! let out = OutputEnvelope::success("1\n", input.context);
//! assert_eq!(
//!     out.to_json().unwrap(),
//!     r#"{"output":"1\n","error":"","context":{"variables":{"n":[1,2]}}}"#
//! );
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod input;
mod output;

pub use error::{EnvelopeError, INPUT_DECODE_ERROR};
pub use input::{CodeEncoding, InputEnvelope};
pub use output::OutputEnvelope;
