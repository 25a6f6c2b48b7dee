//! # Runlet Context
//!
//! The execution context handed to a snippet: a nested JSON tree addressed
//! by dot-separated paths.
//!
//! - [`ContextStore::get`] resolves strictly and renders mappings as
//!   canonical text.
//! - [`ContextStore::set`] auto-creates intermediate mappings, rejects
//!   structural conflicts, and only accepts paths under the reserved root
//!   prefix (`variables` by default).
//! - [`ContextStore::delete`] is idempotent on the final key.
//! - [`flatten`] expands JSON-encoded string leaves in an incoming tree.
//!
//! ```
//! use runlet_context::ContextStore;
//! use serde_json::json;
//!
//! let mut ctx = ContextStore::default();
//! ctx.set("variables.user.id", json!(7)).unwrap();
//! assert_eq!(ctx.get("variables.user.id").unwrap(), json!(7));
//! assert!(ctx.set("user.id", json!(7)).is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod flatten;
mod path;
mod render;
mod store;

pub use error::{ContextError, ContextResult};
pub use flatten::flatten;
pub use path::{ContextPath, SEPARATOR};
pub use render::{render_canonical, value_type_name};
pub use store::{ContextStore, DEFAULT_ROOT_PREFIX};
