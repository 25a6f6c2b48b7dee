//! The `context` and `connections` bindings.

use serde_json::Value;

use super::{Evaluator, Exec};
use crate::error::{ScriptError, ScriptResult};
use crate::value_utils::value_type_name;

impl Evaluator<'_> {
    /// `context.get/set/delete/has/snapshot`.
    pub(super) fn context_method(&mut self, method: &str, args: Vec<Value>) -> ScriptResult<Value> {
        let function = format!("context.{method}");
        match method {
            "get" => {
                let [path] = take_args::<1>(&function, args)?;
                Ok(self.context.get(path_arg(&function, &path)?)?)
            }
            "set" => {
                let [path, value] = take_args::<2>(&function, args)?;
                self.context.set(path_arg(&function, &path)?, value)?;
                Ok(Value::Null)
            }
            "delete" => {
                let [path] = take_args::<1>(&function, args)?;
                let removed = self.context.delete(path_arg(&function, &path)?)?;
                Ok(removed.unwrap_or(Value::Null))
            }
            "has" => {
                let [path] = take_args::<1>(&function, args)?;
                Ok(Value::Bool(self.context.contains(path_arg(&function, &path)?)))
            }
            "snapshot" => {
                take_args::<0>(&function, args)?;
                Ok(Value::Object(self.context.snapshot().clone()))
            }
            _ => Err(ScriptError::UndefinedFunction { name: function }),
        }
    }

    /// `connections.names()`.
    pub(super) fn connections_method(
        &mut self,
        method: &str,
        args: Vec<Value>,
    ) -> ScriptResult<Value> {
        let function = format!("connections.{method}");
        match method {
            "names" => {
                take_args::<0>(&function, args)?;
                Ok(Value::Array(
                    self.connections
                        .names()
                        .map(|name| Value::String(name.to_owned()))
                        .collect(),
                ))
            }
            _ => Err(ScriptError::UndefinedFunction { name: function }),
        }
    }

    /// Resolve a connection on first access and hand out a copy of its payload.
    pub(super) fn connection(&mut self, name: &str) -> Exec<Value> {
        let payload = self.connections.resolve(name)?;
        Ok(Value::Object(payload.clone()))
    }
}

fn take_args<const N: usize>(function: &str, args: Vec<Value>) -> ScriptResult<[Value; N]> {
    let count = args.len();
    <[Value; N]>::try_from(args).map_err(|_| {
        ScriptError::invalid_argument(function, format!("expected {N} arguments, got {count}"))
    })
}

fn path_arg<'v>(function: &str, path: &'v Value) -> ScriptResult<&'v str> {
    match path {
        Value::String(path) => Ok(path),
        other => Err(ScriptError::invalid_argument(
            function,
            format!("path must be a string, found {}", value_type_name(other)),
        )),
    }
}
