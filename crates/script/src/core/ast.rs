//! Abstract syntax tree for snippets.

use std::rc::Rc;

use serde_json::Value;

/// An expression node.
///
/// Nodes that can fail carry the source line of the token that introduces
/// them, so an error inside a multi-line statement points at its own line.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value.
    Literal(Value),

    /// Name lookup (local, global, or one of the ambient bindings).
    Variable {
        /// Name as written.
        name: String,
        /// Line of the name.
        line: u32,
    },

    /// Unary negation (`-expr`).
    Negate {
        /// Negated expression.
        operand: Box<Expr>,
        /// Line of the `-`.
        line: u32,
    },

    /// Logical not (`!expr`).
    Not(Box<Expr>),

    /// Binary operation.
    Binary {
        /// Left operand.
        left: Box<Expr>,
        /// Operator.
        op: BinaryOp,
        /// Right operand.
        right: Box<Expr>,
        /// Line of the operator.
        line: u32,
    },

    /// Property access (`object.name`).
    Property {
        /// Accessed value.
        object: Box<Expr>,
        /// Property name.
        name: String,
        /// Line of the property name.
        line: u32,
    },

    /// Index access (`object[index]`).
    Index {
        /// Indexed value.
        object: Box<Expr>,
        /// Key or position.
        index: Box<Expr>,
        /// Line of the `[`.
        line: u32,
    },

    /// Call (`callee(args...)`); the callee is a name or a method access.
    Call {
        /// Function name or method access.
        callee: Box<Expr>,
        /// Arguments in source order.
        args: Vec<Expr>,
        /// Line of the `(`.
        line: u32,
    },

    /// Array literal.
    Array(Vec<Expr>),

    /// Object literal; keys keep their source order.
    Object(Vec<(String, Expr)>),
}

impl Expr {
    /// Line an error raised by this node itself is reported on.
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Variable { line, .. }
            | Self::Negate { line, .. }
            | Self::Binary { line, .. }
            | Self::Property { line, .. }
            | Self::Index { line, .. }
            | Self::Call { line, .. } => Some(*line),
            Self::Literal(_) | Self::Not(_) | Self::Array(_) | Self::Object(_) => None,
        }
    }

    /// The name, when this is a bare variable reference.
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`, always a float
    Divide,
    /// `%`
    Modulo,
    /// `**`
    Power,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `&&`, short-circuiting
    And,
    /// `||`, short-circuiting
    Or,
}

impl BinaryOp {
    /// Operator as written in source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Power => "**",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::GreaterThan => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A statement and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    /// What the statement does.
    pub kind: StmtKind,
    /// 1-based source line.
    pub line: u32,
}

impl Stmt {
    /// Create a statement.
    pub fn new(kind: StmtKind, line: u32) -> Self {
        Self { kind, line }
    }
}

/// Statement kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let name = value`
    Let {
        /// Name being declared.
        name: String,
        /// Initial value.
        value: Expr,
    },

    /// `target = value`, where target is a name, index or property chain.
    Assign {
        /// Name, property or index chain being written.
        target: Expr,
        /// Value to store.
        value: Expr,
    },

    /// Expression evaluated for its effect.
    Expr(Expr),

    /// `if` / `else if` chain with an optional `else`.
    If {
        /// `if` arm followed by every `else if` arm, in source order.
        branches: Vec<Branch>,
        /// Trailing `else` block.
        otherwise: Option<Vec<Stmt>>,
    },

    /// `while condition { body }`
    While {
        /// Checked before every iteration.
        condition: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },

    /// `for binding in iterable { body }`
    For {
        /// Loop variable.
        binding: String,
        /// Array, object (keys) or string (characters).
        iterable: Expr,
        /// Loop body.
        body: Vec<Stmt>,
    },

    /// `fn name(params) { body }`
    Function(Rc<FunctionDef>),

    /// `return [value]`
    Return(Option<Expr>),

    /// `break`
    Break,

    /// `continue`
    Continue,

    /// `raise value`
    Raise(Expr),
}

/// One `if` or `else if` arm.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    /// Condition guarding the arm.
    pub condition: Expr,
    /// Line of the arm's `if` keyword.
    pub line: u32,
    /// Statements run when the condition holds.
    pub body: Vec<Stmt>,
}

/// A user-defined function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name, also used for its trace frames.
    pub name: String,
    /// Parameter names.
    pub params: Vec<String>,
    /// Function body.
    pub body: Vec<Stmt>,
    /// Line of the `fn` keyword.
    pub line: u32,
}

/// A parsed snippet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top-level statements in source order.
    pub body: Vec<Stmt>,
}
