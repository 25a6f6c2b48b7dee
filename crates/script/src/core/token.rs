//! Token types produced by the lexer.

use super::span::Span;

/// A token with its position in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The token kind.
    pub kind: TokenKind,
    /// Where the token was read from.
    pub span: Span,
}

impl Token {
    /// Create a token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of a token.
///
/// String literals and identifiers own their text so escape processing never
/// has to borrow from a temporary.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    /// Integer literal (`42`).
    Integer(i64),
    /// Float literal (`3.14`).
    Float(f64),
    /// String literal with escapes already processed.
    String(String),
    /// `true` or `false`.
    Boolean(bool),
    /// `null`.
    Null,

    /// Identifier.
    Identifier(String),

    // Keywords
    /// `let`
    Let,
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `for`
    For,
    /// `in`
    In,
    /// `fn`
    Fn,
    /// `return`
    Return,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `raise`
    Raise,

    // Arithmetic
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `**`
    Power,

    // Comparison
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

    // Logical
    /// `&&`
    And,
    /// `||`
    Or,
    /// `!`
    Not,

    /// `=`
    Assign,

    // Delimiters
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,

    // Punctuation
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `;`
    Semicolon,
    /// End of a source line outside parentheses and brackets.
    Newline,

    /// End of input.
    Eof,
}

impl TokenKind {
    /// Whether this token ends a statement.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Self::Newline | Self::Semicolon)
    }

    /// Whether this token is a binary operator.
    pub fn is_binary_operator(&self) -> bool {
        self.precedence() > 0
    }

    /// Operator precedence (higher binds tighter); `0` for non-operators.
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Equal | Self::NotEqual => 3,
            Self::LessThan | Self::GreaterThan | Self::LessEqual | Self::GreaterEqual => 4,
            Self::Plus | Self::Minus => 5,
            Self::Star | Self::Slash | Self::Percent => 6,
            Self::Power => 7,
            _ => 0,
        }
    }

    /// Whether this operator is right-associative.
    pub fn is_right_associative(&self) -> bool {
        matches!(self, Self::Power)
    }

    /// Map a word to its keyword or literal token, if it is one.
    pub fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "true" => Self::Boolean(true),
            "false" => Self::Boolean(false),
            "null" => Self::Null,
            "let" => Self::Let,
            "if" => Self::If,
            "else" => Self::Else,
            "while" => Self::While,
            "for" => Self::For,
            "in" => Self::In,
            "fn" => Self::Fn,
            "return" => Self::Return,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "raise" => Self::Raise,
            _ => return None,
        })
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
            Self::Identifier(s) => write!(f, "{s}"),
            Self::Let => write!(f, "let"),
            Self::If => write!(f, "if"),
            Self::Else => write!(f, "else"),
            Self::While => write!(f, "while"),
            Self::For => write!(f, "for"),
            Self::In => write!(f, "in"),
            Self::Fn => write!(f, "fn"),
            Self::Return => write!(f, "return"),
            Self::Break => write!(f, "break"),
            Self::Continue => write!(f, "continue"),
            Self::Raise => write!(f, "raise"),
            Self::Plus => write!(f, "+"),
            Self::Minus => write!(f, "-"),
            Self::Star => write!(f, "*"),
            Self::Slash => write!(f, "/"),
            Self::Percent => write!(f, "%"),
            Self::Power => write!(f, "**"),
            Self::Equal => write!(f, "=="),
            Self::NotEqual => write!(f, "!="),
            Self::LessThan => write!(f, "<"),
            Self::GreaterThan => write!(f, ">"),
            Self::LessEqual => write!(f, "<="),
            Self::GreaterEqual => write!(f, ">="),
            Self::And => write!(f, "&&"),
            Self::Or => write!(f, "||"),
            Self::Not => write!(f, "!"),
            Self::Assign => write!(f, "="),
            Self::LeftParen => write!(f, "("),
            Self::RightParen => write!(f, ")"),
            Self::LeftBracket => write!(f, "["),
            Self::RightBracket => write!(f, "]"),
            Self::LeftBrace => write!(f, "{{"),
            Self::RightBrace => write!(f, "}}"),
            Self::Dot => write!(f, "."),
            Self::Comma => write!(f, ","),
            Self::Colon => write!(f, ":"),
            Self::Semicolon => write!(f, ";"),
            Self::Newline => write!(f, "newline"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}
