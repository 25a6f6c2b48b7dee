//! `runlet`: run one snippet from an input envelope.
//!
//! Exactly one JSON envelope is written to stdout, whatever happens to the
//! snippet. Diagnostics go to stderr.

#![forbid(unsafe_code)]

mod config;
mod runner;

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use runlet_envelope::OutputEnvelope;

use crate::config::RunnerConfig;
use crate::runner::Runner;

/// Run a context-aware snippet and print the result envelope.
#[derive(Parser, Debug)]
#[command(name = "runlet", version, about)]
struct Args {
    /// Input envelope: JSON, or base64-encoded JSON
    #[arg(long, value_name = "PATH")]
    input: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let envelope = match bootstrap() {
        Ok((runner, _guard)) => runner
            .run_file_on_worker(&args.input)
            .unwrap_or_else(|err| OutputEnvelope::failure(format!("SandboxError: {err:#}"))),
        Err(err) => OutputEnvelope::failure(format!("ConfigError: {err:#}")),
    };

    let mut stdout = std::io::stdout().lock();
    envelope.write_to(&mut stdout).context("cannot write output envelope")?;
    writeln!(stdout).context("cannot write output envelope")?;
    Ok(())
}

fn bootstrap() -> anyhow::Result<(Runner, runlet_log::LoggerGuard)> {
    let config = RunnerConfig::load()?;
    let guard = runlet_log::init_with(config.log.clone()).context("cannot initialise logging")?;
    tracing::debug!(
        root_prefix = %config.root_prefix,
        vault_mount = %config.vault.mount,
        max_call_depth = config.script.max_call_depth,
        "configuration loaded"
    );
    let runner = Runner::new(&config)?;
    Ok((runner, guard))
}
