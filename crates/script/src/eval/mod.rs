//! Tree-walking evaluator.
//!
//! Statements run against two kinds of scope: snippet globals, and one local
//! scope per active user function call. Each statement records its line in
//! the innermost [`TraceFrame`] before it runs. An error is claimed by the
//! innermost expression node that carries a line, falling back to its
//! statement, so the trace points at the exact line it was raised on.

mod ambient;
mod ops;

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use runlet_context::{ContextError, ContextStore};
use runlet_credential::{ConnectionSet, CredentialError};
use runlet_sandbox::TraceFrame;
use serde_json::{Map, Value};

use crate::builtins::BuiltinRegistry;
use crate::core::ast::{BinaryOp, Expr, FunctionDef, Program, Stmt, StmtKind};
use crate::error::{ScriptError, ScriptResult};
use crate::parser::RESERVED_NAMES;
use crate::value_utils::{as_integer, is_truthy, render_text, value_type_name};

/// Frame name for top-level snippet code.
pub const SNIPPET_FRAME: &str = "<snippet>";

/// Default limit on nested user function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 64;

/// Highest call depth a configuration may ask for.
pub const MAX_CALL_DEPTH_LIMIT: usize = 512;

const CONTEXT: &str = "context";
const CONNECTIONS: &str = "connections";

/// An error leaving the evaluator, with the frames active where it was raised.
#[derive(Debug, Clone, PartialEq)]
pub struct Unwind {
    /// What went wrong.
    pub error: ScriptError,
    /// Frames from outermost to innermost. Empty until a node claims it.
    pub trace: Vec<TraceFrame>,
}

impl From<ScriptError> for Unwind {
    fn from(error: ScriptError) -> Self {
        Self {
            error,
            trace: Vec::new(),
        }
    }
}

impl From<ContextError> for Unwind {
    fn from(error: ContextError) -> Self {
        ScriptError::from(error).into()
    }
}

impl From<CredentialError> for Unwind {
    fn from(error: CredentialError) -> Self {
        ScriptError::from(error).into()
    }
}

type Exec<T> = Result<T, Unwind>;

/// How a statement finished.
#[derive(Debug)]
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// One step of an assignment target such as `a.b[0]`.
#[derive(Debug)]
enum Accessor {
    Key(String),
    Position(i64),
}

/// Executes a parsed [`Program`] against live bindings.
pub struct Evaluator<'a> {
    builtins: &'a BuiltinRegistry,
    max_call_depth: usize,
    context: &'a mut ContextStore,
    connections: &'a mut ConnectionSet,
    output: &'a mut dyn Write,
    globals: HashMap<String, Value>,
    locals: Vec<HashMap<String, Value>>,
    functions: HashMap<String, Rc<FunctionDef>>,
    frames: Vec<TraceFrame>,
}

impl<'a> Evaluator<'a> {
    /// Create an evaluator that prints to `output`.
    pub fn new(
        builtins: &'a BuiltinRegistry,
        context: &'a mut ContextStore,
        connections: &'a mut ConnectionSet,
        output: &'a mut dyn Write,
    ) -> Self {
        Self {
            builtins,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            context,
            connections,
            output,
            globals: HashMap::new(),
            locals: Vec::new(),
            functions: HashMap::new(),
            frames: Vec::new(),
        }
    }

    /// Limit nested user function calls to `depth`.
    #[must_use]
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Run `program` to completion or to its first unhandled error.
    pub fn run(&mut self, program: &Program) -> Result<(), Unwind> {
        let first_line = program.body.first().map_or(1, |stmt| stmt.line);
        self.frames = vec![TraceFrame::new(SNIPPET_FRAME, first_line)];
        self.exec_block(&program.body).map(|_| ())
    }

    // ---- statements ----

    fn exec_block(&mut self, body: &[Stmt]) -> Exec<Flow> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Exec<Flow> {
        self.mark(stmt.line);
        self.exec_kind(stmt).map_err(|mut unwind| {
            if unwind.trace.is_empty() {
                unwind.trace.clone_from(&self.frames);
            }
            unwind
        })
    }

    fn mark(&mut self, line: u32) {
        if let Some(frame) = self.frames.last_mut() {
            frame.line = line;
        }
    }

    fn exec_kind(&mut self, stmt: &Stmt) -> Exec<Flow> {
        match &stmt.kind {
            StmtKind::Let { name, value } => {
                let value = self.eval(value)?;
                self.declare(name, value);
            }
            StmtKind::Assign { target, value } => {
                let value = self.eval(value)?;
                self.assign(target, value)?;
            }
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::If {
                branches,
                otherwise,
            } => {
                for branch in branches {
                    self.mark(branch.line);
                    if is_truthy(&self.eval(&branch.condition)?) {
                        return self.exec_block(&branch.body);
                    }
                }
                if let Some(body) = otherwise {
                    return self.exec_block(body);
                }
            }
            StmtKind::While { condition, body } => loop {
                self.mark(stmt.line);
                if !is_truthy(&self.eval(condition)?) {
                    break;
                }
                match self.exec_block(body)? {
                    Flow::Break => break,
                    Flow::Normal | Flow::Continue => {}
                    flow @ Flow::Return(_) => return Ok(flow),
                }
            },
            StmtKind::For {
                binding,
                iterable,
                body,
            } => {
                let items = iteration_items(self.eval(iterable)?)?;
                for item in items {
                    self.declare(binding, item);
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        flow @ Flow::Return(_) => return Ok(flow),
                    }
                }
            }
            StmtKind::Function(def) => {
                self.functions.insert(def.name.clone(), Rc::clone(def));
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Null,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
            StmtKind::Raise(expr) => {
                let value = self.eval(expr)?;
                return Err(ScriptError::Raised {
                    message: render_text(&value),
                }
                .into());
            }
        }
        Ok(Flow::Normal)
    }

    // ---- scopes ----

    fn declare(&mut self, name: &str, value: Value) {
        let scope = self.locals.last_mut().unwrap_or(&mut self.globals);
        scope.insert(name.to_owned(), value);
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.locals
            .last()
            .and_then(|scope| scope.get(name))
            .or_else(|| self.globals.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Value> {
        if let Some(scope) = self.locals.last_mut()
            && scope.contains_key(name)
        {
            return scope.get_mut(name);
        }
        self.globals.get_mut(name)
    }

    /// Assignment updates the nearest existing binding; a plain name that
    /// is not bound yet is declared in the current scope.
    fn assign(&mut self, target: &Expr, value: Value) -> Exec<()> {
        if let Expr::Index { object, index, .. } = target
            && is_binding(object, CONTEXT)
        {
            let path = self.eval_path(index)?;
            self.context.set(&path, value)?;
            return Ok(());
        }

        let mut accessors = Vec::new();
        let root = self.collect_target(target, &mut accessors)?;
        if RESERVED_NAMES.contains(&root.as_str()) {
            return Err(ScriptError::value(format!(
                "'{root}' cannot be assigned through; use context.set(path, value)"
            ))
            .into());
        }

        match self.lookup_mut(&root) {
            Some(slot) => assign_into(slot, &accessors, value)?,
            None if accessors.is_empty() => self.declare(&root, value),
            None => return Err(ScriptError::UndefinedName { name: root }.into()),
        }
        Ok(())
    }

    fn collect_target(&mut self, target: &Expr, accessors: &mut Vec<Accessor>) -> Exec<String> {
        match target {
            Expr::Variable { name, .. } => Ok(name.clone()),
            Expr::Property { object, name, .. } => {
                let root = self.collect_target(object, accessors)?;
                accessors.push(Accessor::Key(name.clone()));
                Ok(root)
            }
            Expr::Index { object, index, .. } => {
                let root = self.collect_target(object, accessors)?;
                let accessor = match self.eval(index)? {
                    Value::String(key) => Accessor::Key(key),
                    other => Accessor::Position(integer_index(&other)?),
                };
                accessors.push(accessor);
                Ok(root)
            }
            _ => Err(ScriptError::value("invalid assignment target").into()),
        }
    }

    // ---- expressions ----

    fn eval(&mut self, expr: &Expr) -> Exec<Value> {
        match self.eval_node(expr) {
            Ok(value) => Ok(value),
            Err(unwind) => Err(self.claim(unwind, expr.line())),
        }
    }

    /// Pin an unclaimed error to `line` in the current frame.
    fn claim(&mut self, mut unwind: Unwind, line: Option<u32>) -> Unwind {
        if let Some(line) = line
            && unwind.trace.is_empty()
        {
            self.mark(line);
            unwind.trace.clone_from(&self.frames);
        }
        unwind
    }

    fn eval_node(&mut self, expr: &Expr) -> Exec<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Variable { name, .. } => self.lookup_value(name),
            Expr::Negate { operand, .. } => {
                let value = self.eval(operand)?;
                Ok(ops::negate(&value)?)
            }
            Expr::Not(inner) => Ok(Value::Bool(!is_truthy(&self.eval(inner)?))),
            Expr::Binary {
                left,
                op: BinaryOp::And,
                right,
                ..
            } => {
                if !is_truthy(&self.eval(left)?) {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(is_truthy(&self.eval(right)?)))
            }
            Expr::Binary {
                left,
                op: BinaryOp::Or,
                right,
                ..
            } => {
                if is_truthy(&self.eval(left)?) {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(is_truthy(&self.eval(right)?)))
            }
            Expr::Binary { left, op, right, .. } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                Ok(ops::binary(*op, &left, &right)?)
            }
            Expr::Property { object, name, .. } => self.eval_property(object, name),
            Expr::Index { object, index, .. } => self.eval_index(object, index),
            Expr::Call { callee, args, line } => self.eval_call(callee, args, *line),
            Expr::Array(items) => self.eval_args(items).map(Value::Array),
            Expr::Object(pairs) => {
                let mut map = Map::new();
                for (key, value) in pairs {
                    let value = self.eval(value)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Exec<Vec<Value>> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }

    fn lookup_value(&self, name: &str) -> Exec<Value> {
        match name {
            CONTEXT => Ok(Value::Object(self.context.snapshot().clone())),
            CONNECTIONS => Err(ScriptError::type_error("connections.<name>", CONNECTIONS).into()),
            _ => match self.lookup(name) {
                Some(value) => Ok(value.clone()),
                None if self.functions.contains_key(name) => {
                    Err(ScriptError::type_error("value", format!("function '{name}'")).into())
                }
                None => Err(ScriptError::UndefinedName {
                    name: name.to_owned(),
                }
                .into()),
            },
        }
    }

    fn eval_property(&mut self, object: &Expr, name: &str) -> Exec<Value> {
        if is_binding(object, CONNECTIONS) {
            return self.connection(name);
        }
        if is_binding(object, CONTEXT) {
            let found = format!("context.{name}");
            return Err(ScriptError::type_error("context.get(path)", found).into());
        }
        match self.eval(object)? {
            Value::Object(mut map) => map.remove(name).ok_or_else(|| {
                ScriptError::MissingKey {
                    key: name.to_owned(),
                }
                .into()
            }),
            other => Err(ScriptError::type_error("object", value_type_name(&other)).into()),
        }
    }

    fn eval_index(&mut self, object: &Expr, index: &Expr) -> Exec<Value> {
        if is_binding(object, CONNECTIONS) {
            return match self.eval(index)? {
                Value::String(name) => self.connection(&name),
                other => {
                    Err(ScriptError::type_error("connection name", value_type_name(&other)).into())
                }
            };
        }
        if is_binding(object, CONTEXT) {
            let path = self.eval_path(index)?;
            return Ok(self.context.get(&path)?);
        }
        let target = self.eval(object)?;
        let key = self.eval(index)?;
        Ok(index_value(target, &key)?)
    }

    fn eval_path(&mut self, index: &Expr) -> Exec<String> {
        match self.eval(index)? {
            Value::String(path) => Ok(path),
            other => Err(ScriptError::type_error("string path", value_type_name(&other)).into()),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], line: u32) -> Exec<Value> {
        match callee {
            Expr::Variable { name, .. } => self.call_function(name, args, line),
            Expr::Property { object, name, .. } if is_binding(object, CONTEXT) => {
                let values = self.eval_args(args)?;
                Ok(self.context_method(name, values)?)
            }
            Expr::Property { object, name, .. } if is_binding(object, CONNECTIONS) => {
                let values = self.eval_args(args)?;
                Ok(self.connections_method(name, values)?)
            }
            // `value.f(args)` is `f(value, args)` for builtins.
            Expr::Property { object, name, .. } => {
                let function =
                    self.builtins.get(name).ok_or_else(|| ScriptError::UndefinedFunction {
                        name: name.clone(),
                    })?;
                let mut values = vec![self.eval(object)?];
                values.extend(self.eval_args(args)?);
                Ok(function(&values)?)
            }
            _ => Err(ScriptError::type_error("function name", "expression").into()),
        }
    }

    fn call_function(&mut self, name: &str, args: &[Expr], line: u32) -> Exec<Value> {
        if let Some(def) = self.functions.get(name).cloned() {
            let values = self.eval_args(args)?;
            return self.call_user(&def, values, line);
        }
        if name == "print" {
            let values = self.eval_args(args)?;
            self.print(&values)?;
            return Ok(Value::Null);
        }
        match self.builtins.get(name) {
            Some(function) => {
                let values = self.eval_args(args)?;
                Ok(function(&values)?)
            }
            None => Err(ScriptError::UndefinedFunction {
                name: name.to_owned(),
            }
            .into()),
        }
    }

    /// `line` is where the call sits in the caller's frame.
    fn call_user(&mut self, def: &FunctionDef, args: Vec<Value>, line: u32) -> Exec<Value> {
        self.mark(line);
        if args.len() != def.params.len() {
            return Err(ScriptError::invalid_argument(
                &def.name,
                format!("expected {} arguments, got {}", def.params.len(), args.len()),
            )
            .into());
        }
        if self.locals.len() >= self.max_call_depth {
            return Err(ScriptError::Recursion {
                limit: self.max_call_depth,
            }
            .into());
        }

        self.locals.push(def.params.iter().cloned().zip(args).collect());
        self.frames.push(TraceFrame::new(def.name.clone(), def.line));
        tracing::trace!(function = %def.name, depth = self.locals.len(), "calling function");

        let result = self.exec_block(&def.body);

        self.frames.pop();
        self.locals.pop();

        match result? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Null),
        }
    }

    fn print(&mut self, values: &[Value]) -> ScriptResult<()> {
        let line = values.iter().map(render_text).collect::<Vec<_>>().join(" ");
        writeln!(self.output, "{line}").map_err(|err| ScriptError::Output {
            message: err.to_string(),
        })
    }
}

fn is_binding(expr: &Expr, binding: &str) -> bool {
    expr.as_variable() == Some(binding)
}

fn iteration_items(value: Value) -> ScriptResult<Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(map) => Ok(map.into_iter().map(|(key, _)| Value::String(key)).collect()),
        Value::String(text) => Ok(text.chars().map(|c| Value::String(c.to_string())).collect()),
        other => Err(ScriptError::type_error(
            "array, object or string",
            value_type_name(&other),
        )),
    }
}

fn integer_index(key: &Value) -> ScriptResult<i64> {
    as_integer(key).ok_or_else(|| ScriptError::type_error("integer index", value_type_name(key)))
}

/// Map a possibly negative index onto `0..length`.
fn normalize_index(index: i64, length: usize) -> ScriptResult<usize> {
    let resolved = if index < 0 { index + length as i64 } else { index };
    if resolved < 0 || resolved as usize >= length {
        return Err(ScriptError::IndexOutOfBounds { index, length });
    }
    Ok(resolved as usize)
}

fn index_value(target: Value, key: &Value) -> ScriptResult<Value> {
    match target {
        Value::Object(mut map) => {
            let Value::String(key) = key else {
                return Err(ScriptError::type_error("string key", value_type_name(key)));
            };
            map.remove(key.as_str())
                .ok_or_else(|| ScriptError::MissingKey { key: key.clone() })
        }
        Value::Array(mut items) => {
            let position = normalize_index(integer_index(key)?, items.len())?;
            Ok(items.swap_remove(position))
        }
        Value::String(text) => {
            let chars: Vec<char> = text.chars().collect();
            let position = normalize_index(integer_index(key)?, chars.len())?;
            Ok(Value::String(chars[position].to_string()))
        }
        other => Err(ScriptError::type_error(
            "array, object or string",
            value_type_name(&other),
        )),
    }
}

fn assign_into(slot: &mut Value, accessors: &[Accessor], value: Value) -> ScriptResult<()> {
    let Some((accessor, rest)) = accessors.split_first() else {
        *slot = value;
        return Ok(());
    };
    let child = match (accessor, slot) {
        (Accessor::Key(key), Value::Object(map)) => {
            if rest.is_empty() {
                map.insert(key.clone(), value);
                return Ok(());
            }
            map.get_mut(key)
                .ok_or_else(|| ScriptError::MissingKey { key: key.clone() })?
        }
        (Accessor::Position(index), Value::Array(items)) => {
            let position = normalize_index(*index, items.len())?;
            &mut items[position]
        }
        (Accessor::Key(_), other) => {
            return Err(ScriptError::type_error("object", value_type_name(other)));
        }
        (Accessor::Position(_), other) => {
            return Err(ScriptError::type_error("array", value_type_name(other)));
        }
    };
    assign_into(child, rest, value)
}
