//! # Runlet Script
//!
//! The snippet language run by `runlet`: a small dynamically typed language
//! over JSON values with `let` bindings, `if`/`while`/`for`, user functions,
//! and a library of pure builtins.
//!
//! Snippets see two ambient bindings:
//!
//! - `context` reads and writes the run's context store, through
//!   `context.get/set/delete/has/snapshot` or `context[path]`.
//! - `connections` resolves a named credential on first access, through
//!   `connections.name` or `connections["name"]`; `connections.names()`
//!   lists the declared names without resolving any of them.
//!
//! [`ScriptInterpreter`] implements the sandbox's
//! [`ScriptEngine`](runlet_sandbox::ScriptEngine):
//!
//! ```
//! use std::sync::Arc;
//!
//! use runlet_context::ContextStore;
//! use runlet_credential::{ConnectionSet, MemoryProvider};
//! use runlet_sandbox::ExecutionSandbox;
//! use runlet_script::ScriptInterpreter;
//! use serde_json::json;
//!
//! let source = r#"
//! fn greet(name) {
//!     return "hello " + name
//! }
//! context.set("variables.greeting", greet("ada"))
//! print(context["variables.greeting"])
//! "#;
//!
//! let connections = ConnectionSet::new(Arc::new(MemoryProvider::new()));
//! let mut sandbox = ExecutionSandbox::new(ContextStore::default(), connections);
//! let outcome = sandbox.run(&ScriptInterpreter::new(), source).unwrap();
//!
//! assert_eq!(outcome.captured_text, "hello ada\n");
//! assert_eq!(outcome.context.get("variables.greeting").unwrap(), json!("hello ada"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod builtins;
pub mod core;
mod engine;
mod error;
mod eval;
pub mod lexer;
pub mod parser;
pub mod value_utils;

pub use builtins::{BuiltinFunction, BuiltinRegistry};
pub use crate::core::ast::{Branch, Expr, FunctionDef, Program, Stmt, StmtKind};
pub use engine::{ScriptConfig, ScriptInterpreter};
pub use error::{ScriptError, ScriptResult};
pub use eval::{DEFAULT_MAX_CALL_DEPTH, MAX_CALL_DEPTH_LIMIT, SNIPPET_FRAME};
pub use parser::{MAX_NESTING_DEPTH, RESERVED_NAMES, parse};
