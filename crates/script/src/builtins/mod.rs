//! Built-in functions available to every snippet.
//!
//! Builtins are pure: they see only their arguments. `print` and the
//! context and connection methods need the run's bindings and are handled by
//! the evaluator instead.

pub mod collection;
pub mod conversion;
pub mod math;
pub mod string;

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{ScriptError, ScriptResult};
use crate::value_utils::value_type_name;

/// Signature shared by all builtins.
pub type BuiltinFunction = fn(&[Value]) -> ScriptResult<Value>;

/// Name to function table.
pub struct BuiltinRegistry {
    functions: HashMap<&'static str, BuiltinFunction>,
}

impl BuiltinRegistry {
    /// Create a registry with every standard builtin.
    pub fn new() -> Self {
        let mut registry = Self {
            functions: HashMap::new(),
        };

        registry.register_string_functions();
        registry.register_math_functions();
        registry.register_collection_functions();
        registry.register_conversion_functions();

        registry
    }

    /// Register (or replace) a builtin.
    pub fn register(&mut self, name: &'static str, func: BuiltinFunction) {
        self.functions.insert(name, func);
    }

    /// Look up a builtin.
    pub fn get(&self, name: &str) -> Option<BuiltinFunction> {
        self.functions.get(name).copied()
    }

    /// Whether a builtin with this name exists.
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// All builtin names, sorted.
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    fn register_string_functions(&mut self) {
        self.register("upper", string::upper);
        self.register("lower", string::lower);
        self.register("trim", string::trim);
        self.register("split", string::split);
        self.register("replace", string::replace);
        self.register("starts_with", string::starts_with);
        self.register("ends_with", string::ends_with);
    }

    fn register_math_functions(&mut self) {
        self.register("abs", math::abs);
        self.register("round", math::round);
        self.register("floor", math::floor);
        self.register("ceil", math::ceil);
        self.register("min", math::min);
        self.register("max", math::max);
    }

    fn register_collection_functions(&mut self) {
        self.register("len", collection::len);
        self.register("keys", collection::keys);
        self.register("values", collection::values);
        self.register("has", collection::has);
        self.register("contains", collection::contains);
        self.register("join", collection::join);
        self.register("range", collection::range);
        self.register("push", collection::push);
    }

    fn register_conversion_functions(&mut self) {
        self.register("str", conversion::to_str);
        self.register("num", conversion::to_num);
        self.register("bool", conversion::to_bool);
        self.register("to_json", conversion::to_json);
        self.register("parse_json", conversion::parse_json);
        self.register("type_of", conversion::type_of);
        self.register("fail", conversion::fail);
    }
}

impl Default for BuiltinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BuiltinRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuiltinRegistry")
            .field("functions", &self.functions.len())
            .finish()
    }
}

pub(crate) fn check_arg_count(
    func_name: &str,
    args: &[Value],
    expected: usize,
) -> ScriptResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ScriptError::invalid_argument(
            func_name,
            format!("expected {expected} arguments, got {}", args.len()),
        ))
    }
}

pub(crate) fn check_arg_range(
    func_name: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> ScriptResult<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(ScriptError::invalid_argument(
            func_name,
            format!("expected {min} to {max} arguments, got {}", args.len()),
        ))
    }
}

pub(crate) fn get_string_arg<'a>(
    func_name: &str,
    args: &'a [Value],
    index: usize,
) -> ScriptResult<&'a str> {
    args[index].as_str().ok_or_else(|| {
        ScriptError::invalid_argument(
            func_name,
            format!(
                "argument {} must be a string, found {}",
                index + 1,
                value_type_name(&args[index])
            ),
        )
    })
}
