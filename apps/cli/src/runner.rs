//! One envelope in, one envelope out.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use runlet_credential::{ConnectionSet, CredentialProvider, VaultProvider};
use runlet_envelope::{INPUT_DECODE_ERROR, InputEnvelope, OutputEnvelope};
use runlet_sandbox::ExecutionSandbox;
use runlet_script::ScriptInterpreter;

use crate::config::RunnerConfig;

/// Stack size of the thread that evaluates the snippet.
pub const EVAL_STACK_BYTES: usize = 64 * 1024 * 1024;

/// Wires decoding, the sandbox and the interpreter together.
pub struct Runner {
    root_prefix: String,
    provider: Arc<dyn CredentialProvider>,
    interpreter: ScriptInterpreter,
}

impl Runner {
    /// Build a runner that resolves connections through Vault.
    pub fn new(config: &RunnerConfig) -> anyhow::Result<Self> {
        let provider =
            VaultProvider::new(config.vault.clone()).context("cannot build vault client")?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Build a runner around any credential provider.
    pub fn with_provider(config: &RunnerConfig, provider: Arc<dyn CredentialProvider>) -> Self {
        Self {
            root_prefix: config.root_prefix.clone(),
            provider,
            interpreter: ScriptInterpreter::with_config(config.script.clone()),
        }
    }

    /// [`Runner::run_file`] on a dedicated thread with [`EVAL_STACK_BYTES`] of stack,
    /// so the deepest configurable call chain fits.
    pub fn run_file_on_worker(&self, path: &Path) -> anyhow::Result<OutputEnvelope> {
        std::thread::scope(|scope| {
            let handle = std::thread::Builder::new()
                .name("runlet-eval".into())
                .stack_size(EVAL_STACK_BYTES)
                .spawn_scoped(scope, || self.run_file(path))
                .context("cannot start evaluation thread")?;
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("evaluation thread panicked"))
        })
    }

    /// Read the input file and run it.
    pub fn run_file(&self, path: &Path) -> OutputEnvelope {
        match std::fs::read(path) {
            Ok(raw) => self.run_bytes(&raw),
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "cannot read input");
                OutputEnvelope::failure(format!(
                    "{INPUT_DECODE_ERROR}: cannot read {}: {err}",
                    path.display()
                ))
            }
        }
    }

    /// Decode raw envelope bytes and run the snippet they carry.
    pub fn run_bytes(&self, raw: &[u8]) -> OutputEnvelope {
        let input = match InputEnvelope::decode(raw) {
            Ok(input) => input,
            Err(err) => {
                tracing::warn!(code = err.code(), error = %err, "rejected input envelope");
                return OutputEnvelope::decode_failure(&err);
            }
        };

        let (context, code, descriptors) = input.into_parts(&self.root_prefix);
        let connections = ConnectionSet::from_descriptors(Arc::clone(&self.provider), descriptors);
        let mut sandbox = ExecutionSandbox::new(context, connections);

        match sandbox.run(&self.interpreter, &code) {
            Ok(outcome) => {
                if let Some(fault) = &outcome.fault {
                    tracing::info!(
                        kind = %fault.kind,
                        line = ?fault.source_line,
                        "snippet faulted"
                    );
                }
                OutputEnvelope::from_outcome(outcome)
            }
            Err(err) => {
                tracing::error!(code = err.code(), error = %err, "sandbox refused to run");
                OutputEnvelope::failure(format!("SandboxError: {err}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use runlet_credential::MemoryProvider;
    use serde_json::{Map, Value, json};

    fn runner(provider: MemoryProvider) -> Runner {
        Runner::with_provider(&RunnerConfig::default(), Arc::new(provider))
    }

    fn envelope(code: &str, connections: Value) -> Vec<u8> {
        json!({
            "context": {"variables": {}, "meta": {"run": "r-1"}},
            "code": code,
            "connections": connections,
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn set_then_print() {
        let output = runner(MemoryProvider::new()).run_bytes(&envelope(
            "context.set('variables.x', 1)\nprint(context['meta.run'])",
            json!({}),
        ));

        assert_eq!(output.error, "");
        assert_eq!(output.output, "r-1\n");
        assert_eq!(
            output.context.map(Value::Object),
            Some(json!({"variables": {"x": 1}, "meta": {"run": "r-1"}}))
        );
    }

    #[test]
    fn connection_payload_is_visible_to_the_snippet() {
        let mut payload = Map::new();
        payload.insert("api_key".into(), json!("k-123"));
        let provider = MemoryProvider::new().with_secret("billing", "9", payload);

        let output = runner(provider).run_bytes(&envelope(
            "print(connections.billing.api_key)",
            json!({"billing": {"Id": "9", "Token": "t", "VaultUrl": "memory://"}}),
        ));

        assert!(output.is_success(), "{}", output.error);
        assert_eq!(output.output, "k-123\n");
    }

    #[test]
    fn decode_failure_has_no_context() {
        let output = runner(MemoryProvider::new())
            .run_bytes(br#"{"code": "print(1)", "connections": {}}"#);

        assert!(output.error.starts_with("InputDecodeError: "), "{}", output.error);
        assert_eq!(output.context, None);
        assert_eq!(output.output, "");
    }

    #[test]
    fn fault_keeps_context_written_before_it() {
        let output = runner(MemoryProvider::new()).run_bytes(&envelope(
            "context.set('variables.step', 1)\nprint('lost')\nlet x = 1 / 0",
            json!({}),
        ));

        assert_eq!(output.error, "ZeroDivisionError: division by zero (line 3)");
        assert_eq!(output.output, "");
        assert_eq!(
            output.context.map(Value::Object),
            Some(json!({"variables": {"step": 1}, "meta": {"run": "r-1"}}))
        );
    }

    #[test]
    fn configured_root_prefix_applies() {
        let config = RunnerConfig {
            root_prefix: "meta".into(),
            ..RunnerConfig::default()
        };
        let runner = Runner::with_provider(&config, Arc::new(MemoryProvider::new()));

        let output = runner.run_bytes(&envelope("context.set('variables.x', 1)", json!({})));

        assert!(output.error.starts_with("InvalidRootError: "), "{}", output.error);
    }

    #[test]
    fn deepest_allowed_recursion_faults_cleanly_on_the_worker() {
        // GIVEN the highest call depth a config may ask for
        let mut config = RunnerConfig::default();
        config.script.max_call_depth = runlet_script::MAX_CALL_DEPTH_LIMIT;
        let runner = Runner::with_provider(&config, Arc::new(MemoryProvider::new()));
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            &envelope("fn down(n) {\n  return down(n + 1)\n}\ndown(0)", json!({})),
        )
        .unwrap();

        // WHEN a snippet recurses without end
        let output = runner.run_file_on_worker(file.path()).unwrap();

        // THEN the bound is reported as a fault
        assert!(output.error.starts_with("RecursionError: "), "{}", output.error);
        assert!(output.error.ends_with("(line 2)"), "{}", output.error);
    }

    #[test]
    fn unreadable_file_is_a_decode_failure() {
        let output = runner(MemoryProvider::new()).run_file(Path::new("/definitely/not/here.json"));
        assert!(output.error.starts_with("InputDecodeError: cannot read "));
        assert_eq!(output.context, None);
    }
}
