//! Lexer for snippet source.
//!
//! Newlines are significant: outside parentheses and brackets each line
//! break becomes a [`TokenKind::Newline`] so the parser can end statements
//! without semicolons. `#` starts a comment that runs to the end of the line.

use crate::core::span::Span;
use crate::core::token::{Token, TokenKind};
use crate::error::{ScriptError, ScriptResult};

/// Converts source text into tokens.
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    line: u32,
    /// Open `(` and `[` count; newlines inside them are not terminators.
    nesting: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            position: 0,
            line: 1,
            nesting: 0,
        }
    }

    /// Tokenize the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(&mut self) -> ScriptResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity((self.input.len() / 4).max(8));

        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }

        Ok(tokens)
    }

    /// Read the next token.
    pub fn next_token(&mut self) -> ScriptResult<Token> {
        self.skip_trivia();

        let start = self.position;
        let line = self.line;

        let Some(ch) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, Span::new(start, start, line)));
        };

        let kind = match ch {
            '\n' => {
                self.advance();
                TokenKind::Newline
            }

            '(' => self.open(TokenKind::LeftParen),
            ')' => self.close(TokenKind::RightParen),
            '[' => self.open(TokenKind::LeftBracket),
            ']' => self.close(TokenKind::RightBracket),
            '{' => self.single(TokenKind::LeftBrace),
            '}' => self.single(TokenKind::RightBrace),
            ',' => self.single(TokenKind::Comma),
            '.' => self.single(TokenKind::Dot),
            ':' => self.single(TokenKind::Colon),
            ';' => self.single(TokenKind::Semicolon),

            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' if self.peek() == Some('*') => self.double(TokenKind::Power),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '%' => self.single(TokenKind::Percent),

            '=' if self.peek() == Some('=') => self.double(TokenKind::Equal),
            '=' => self.single(TokenKind::Assign),
            '!' if self.peek() == Some('=') => self.double(TokenKind::NotEqual),
            '!' => self.single(TokenKind::Not),
            '<' if self.peek() == Some('=') => self.double(TokenKind::LessEqual),
            '<' => self.single(TokenKind::LessThan),
            '>' if self.peek() == Some('=') => self.double(TokenKind::GreaterEqual),
            '>' => self.single(TokenKind::GreaterThan),
            '&' if self.peek() == Some('&') => self.double(TokenKind::And),
            '|' if self.peek() == Some('|') => self.double(TokenKind::Or),

            '"' | '\'' => self.read_string(ch)?,

            ch if ch.is_ascii_digit() => self.read_number()?,

            ch if ch.is_alphabetic() || ch == '_' => self.read_word(),

            _ => return Err(self.error(format!("unexpected character '{ch}'"))),
        };

        Ok(Token::new(kind, Span::new(start, self.position, line)))
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn peek(&self) -> Option<char> {
        let current = self.current_char()?;
        self.input[self.position + current.len_utf8()..].chars().next()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.current_char() {
            if ch == '\n' {
                self.line += 1;
            }
            self.position += ch.len_utf8();
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn double(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        self.advance();
        kind
    }

    fn open(&mut self, kind: TokenKind) -> TokenKind {
        self.nesting += 1;
        self.single(kind)
    }

    fn close(&mut self, kind: TokenKind) -> TokenKind {
        self.nesting = self.nesting.saturating_sub(1);
        self.single(kind)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Syntax {
            message: message.into(),
            line: self.line,
        }
    }

    /// Skip spaces, comments, and newlines nested inside `(` or `[`.
    fn skip_trivia(&mut self) {
        while let Some(ch) = self.current_char() {
            match ch {
                '\n' if self.nesting == 0 => break,
                '#' => {
                    while let Some(c) = self.current_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                c if c.is_whitespace() => self.advance(),
                _ => break,
            }
        }
    }

    fn read_string(&mut self, quote: char) -> ScriptResult<TokenKind> {
        let line = self.line;
        self.advance();

        let mut value = String::new();
        while let Some(ch) = self.current_char() {
            self.advance();
            match ch {
                c if c == quote => return Ok(TokenKind::String(value)),
                '\\' => {
                    let Some(escaped) = self.current_char() else {
                        break;
                    };
                    self.advance();
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                '\n' => {
                    return Err(ScriptError::Syntax {
                        message: "unterminated string literal".into(),
                        line,
                    });
                }
                c => value.push(c),
            }
        }

        Err(ScriptError::Syntax {
            message: "unterminated string literal".into(),
            line,
        })
    }

    fn read_number(&mut self) -> ScriptResult<TokenKind> {
        let start = self.position;
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance();
            } else if ch == '.' && !is_float && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.advance();
            } else {
                break;
            }
        }

        let text = &self.input[start..self.position];
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| self.error(format!("invalid float literal '{text}'")))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Integer)
                .map_err(|_| self.error(format!("integer literal '{text}' is out of range")))
        }
    }

    fn read_word(&mut self) -> TokenKind {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let word = &self.input[start..self.position];
        TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_owned()))
    }
}
