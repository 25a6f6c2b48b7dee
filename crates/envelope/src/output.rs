//! The output envelope.

use std::io::Write;

use runlet_sandbox::ExecutionOutcome;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::EnvelopeError;

/// The single JSON object written on stdout.
///
/// `context` is omitted when the run never got as far as having one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputEnvelope {
    /// Captured snippet output; empty unless the run completed.
    pub output: String,
    /// Empty on success, otherwise the failure text.
    pub error: String,
    /// Final context tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl OutputEnvelope {
    /// A completed run.
    pub fn success(output: impl Into<String>, context: Map<String, Value>) -> Self {
        Self {
            output: output.into(),
            error: String::new(),
            context: Some(context),
        }
    }

    /// A run that faulted after the context was built.
    pub fn fault(error: impl ToString, context: Map<String, Value>) -> Self {
        Self {
            output: String::new(),
            error: error.to_string(),
            context: Some(context),
        }
    }

    /// A failure before any context existed.
    pub fn failure(error: impl ToString) -> Self {
        Self {
            output: String::new(),
            error: error.to_string(),
            context: None,
        }
    }

    /// A failure to decode the input, reported as `<Kind>: <message>`.
    pub fn decode_failure(err: &EnvelopeError) -> Self {
        Self::failure(format!("{}: {err}", err.kind()))
    }

    /// Translate a sandbox outcome.
    pub fn from_outcome(outcome: ExecutionOutcome) -> Self {
        let context = outcome.context.into_tree();
        match outcome.fault {
            None => Self::success(outcome.captured_text, context),
            Some(fault) => Self::fault(fault, context),
        }
    }

    /// Whether the envelope reports success.
    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String, EnvelopeError> {
        serde_json::to_string(self).map_err(EnvelopeError::Encode)
    }

    /// Serialize fully, then write the whole envelope in one call.
    pub fn write_to(&self, mut writer: impl Write) -> Result<(), EnvelopeError> {
        let json = self.to_json()?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
