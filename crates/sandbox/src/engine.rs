//! The pluggable script engine seam.

use std::io::Write;

use runlet_context::ContextStore;
use runlet_credential::ConnectionSet;

use crate::fault::ScriptFault;

/// Ambient environment handed to a snippet.
///
/// The context is live: every mutation is visible immediately and persists
/// into the run's final context.
pub struct Bindings<'a> {
    /// Mutable context store.
    pub context: &'a mut ContextStore,
    /// Lazily-resolved named connections.
    pub connections: &'a mut ConnectionSet,
}

impl<'a> Bindings<'a> {
    /// Bundle a context and a connection set.
    pub fn new(context: &'a mut ContextStore, connections: &'a mut ConnectionSet) -> Self {
        Self {
            context,
            connections,
        }
    }
}

/// Executes snippet source against a set of bindings.
///
/// Everything the snippet prints goes to `output`; engines never write to
/// the process's own stdout.
pub trait ScriptEngine {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Run `source` to completion or until the first unhandled fault.
    fn run(
        &self,
        source: &str,
        bindings: &mut Bindings<'_>,
        output: &mut dyn Write,
    ) -> Result<(), ScriptFault>;
}

impl<F> ScriptEngine for F
where
    F: Fn(&str, &mut Bindings<'_>, &mut dyn Write) -> Result<(), ScriptFault>,
{
    fn name(&self) -> &'static str {
        "closure"
    }

    fn run(
        &self,
        source: &str,
        bindings: &mut Bindings<'_>,
        output: &mut dyn Write,
    ) -> Result<(), ScriptFault> {
        self(source, bindings, output)
    }
}
