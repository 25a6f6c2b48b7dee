//! # Runlet Sandbox
//!
//! Runs a single snippet against a [`ContextStore`](runlet_context::ContextStore)
//! and a [`ConnectionSet`](runlet_credential::ConnectionSet).
//!
//! The sandbox moves through `Prepared -> Running -> Completed | Faulted`
//! exactly once. Everything the snippet prints lands in an in-memory sink;
//! unhandled faults, including engine panics, are translated into a
//! [`FaultRecord`] carrying the line the fault was raised on. Cached
//! credentials are dropped on every exit path.
//!
//! The language itself lives behind [`ScriptEngine`]. Plain closures
//! implement it, which keeps tests small:
//!
//! ```
//! use std::io::Write;
//! use std::sync::Arc;
//!
//! use runlet_context::ContextStore;
//! use runlet_credential::{ConnectionSet, MemoryProvider};
//! use runlet_sandbox::{Bindings, ExecutionSandbox, ScriptFault};
//! use serde_json::json;
//!
//! fn engine(_: &str, b: &mut Bindings<'_>, out: &mut dyn Write) -> Result<(), ScriptFault> {
//!     b.context.set("variables.seen", json!(true))?;
//!     write!(out, "hi").map_err(|e| ScriptFault::new("IoError", e.to_string()))
//! }
//!
//! let connections = ConnectionSet::new(Arc::new(MemoryProvider::new()));
//! let mut sandbox = ExecutionSandbox::new(ContextStore::default(), connections);
//! let outcome = sandbox.run(&engine, "").unwrap();
//! assert_eq!(outcome.captured_text, "hi");
//! assert!(outcome.is_success());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod engine;
mod error;
mod fault;
mod sandbox;
mod state;

pub use engine::{Bindings, ScriptEngine};
pub use error::SandboxError;
pub use fault::{FaultRecord, ScriptFault, TraceFrame};
pub use sandbox::{ENGINE_PANIC, ExecutionOutcome, ExecutionSandbox};
pub use state::{SandboxState, can_transition, validate_transition};
