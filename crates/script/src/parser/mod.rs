//! Parser from tokens to a [`Program`].
//!
//! Statements use recursive descent; expressions use precedence climbing
//! over [`TokenKind::precedence`].

use std::rc::Rc;

use serde_json::Value;

use crate::core::ast::{BinaryOp, Branch, Expr, FunctionDef, Program, Stmt, StmtKind};
use crate::core::token::{Token, TokenKind};
use crate::error::{ScriptError, ScriptResult};
use crate::lexer::Lexer;

/// Deepest allowed nesting of expressions and blocks.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Names bound by the runtime that snippets may not rebind.
pub const RESERVED_NAMES: [&str; 2] = ["context", "connections"];

/// Parse snippet source into a program.
pub fn parse(source: &str) -> ScriptResult<Program> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse_program()
}

/// Parser over a token stream.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    loop_depth: usize,
    function_depth: usize,
    depth: usize,
}

impl Parser {
    /// Create a parser. `tokens` must end with [`TokenKind::Eof`].
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            loop_depth: 0,
            function_depth: 0,
            depth: 0,
        }
    }

    /// Parse the whole token stream.
    pub fn parse_program(&mut self) -> ScriptResult<Program> {
        let mut body = Vec::new();
        self.skip_terminators();
        while !self.check(&TokenKind::Eof) {
            body.push(self.parse_statement()?);
            self.end_statement()?;
        }
        Ok(Program { body })
    }

    fn parse_statement(&mut self) -> ScriptResult<Stmt> {
        let line = self.line();
        let kind = match self.current_kind() {
            TokenKind::Let => {
                self.advance();
                let name = self.expect_binding("variable name")?;
                self.expect(&TokenKind::Assign)?;
                let value = self.parse_expression()?;
                StmtKind::Let { name, value }
            }
            TokenKind::If => self.parse_if()?,
            TokenKind::While => {
                self.advance();
                let condition = self.parse_expression()?;
                let body = self.parse_loop_body()?;
                StmtKind::While { condition, body }
            }
            TokenKind::For => {
                self.advance();
                let binding = self.expect_binding("loop variable")?;
                self.expect(&TokenKind::In)?;
                let iterable = self.parse_expression()?;
                let body = self.parse_loop_body()?;
                StmtKind::For {
                    binding,
                    iterable,
                    body,
                }
            }
            TokenKind::Fn => self.parse_function(line)?,
            TokenKind::Return => {
                if self.function_depth == 0 {
                    return Err(self.error("'return' outside function"));
                }
                self.advance();
                if self.at_statement_end() {
                    StmtKind::Return(None)
                } else {
                    StmtKind::Return(Some(self.parse_expression()?))
                }
            }
            TokenKind::Break | TokenKind::Continue => {
                let keyword = self.current_kind().clone();
                if self.loop_depth == 0 {
                    return Err(self.error(format!("'{keyword}' outside loop")));
                }
                self.advance();
                if keyword == TokenKind::Break {
                    StmtKind::Break
                } else {
                    StmtKind::Continue
                }
            }
            TokenKind::Raise => {
                self.advance();
                StmtKind::Raise(self.parse_expression()?)
            }
            _ => {
                let expr = self.parse_expression()?;
                if self.match_token(&TokenKind::Assign) {
                    if !is_assignable(&expr) {
                        return Err(self.error("cannot assign to this expression"));
                    }
                    if let Some(name) = expr.as_variable()
                        && RESERVED_NAMES.contains(&name)
                    {
                        return Err(self.error(format!("cannot rebind '{name}'")));
                    }
                    let value = self.parse_expression()?;
                    StmtKind::Assign {
                        target: expr,
                        value,
                    }
                } else {
                    StmtKind::Expr(expr)
                }
            }
        };
        Ok(Stmt::new(kind, line))
    }

    fn parse_if(&mut self) -> ScriptResult<StmtKind> {
        let mut branches = vec![self.parse_branch()?];
        let mut otherwise = None;

        while self.match_else() {
            if self.check(&TokenKind::If) {
                branches.push(self.parse_branch()?);
            } else {
                otherwise = Some(self.parse_block()?);
                break;
            }
        }

        Ok(StmtKind::If {
            branches,
            otherwise,
        })
    }

    fn parse_branch(&mut self) -> ScriptResult<Branch> {
        let line = self.line();
        self.expect(&TokenKind::If)?;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Branch {
            condition,
            line,
            body,
        })
    }

    fn parse_function(&mut self, line: u32) -> ScriptResult<StmtKind> {
        self.expect(&TokenKind::Fn)?;
        let name = self.expect_identifier("function name")?;
        self.expect(&TokenKind::LeftParen)?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RightParen) {
            let param = self.expect_binding("parameter name")?;
            if params.contains(&param) {
                return Err(self.error(format!("duplicate parameter '{param}'")));
            }
            params.push(param);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RightParen)?;

        let saved_loops = std::mem::take(&mut self.loop_depth);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = saved_loops;

        Ok(StmtKind::Function(Rc::new(FunctionDef {
            name,
            params,
            body: body?,
            line,
        })))
    }

    fn parse_loop_body(&mut self) -> ScriptResult<Vec<Stmt>> {
        self.loop_depth += 1;
        let body = self.parse_block();
        self.loop_depth -= 1;
        body
    }

    fn parse_block(&mut self) -> ScriptResult<Vec<Stmt>> {
        self.enter()?;
        let body = self.parse_block_inner();
        self.depth -= 1;
        body
    }

    fn parse_block_inner(&mut self) -> ScriptResult<Vec<Stmt>> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut body = Vec::new();
        self.skip_terminators();
        while !self.check(&TokenKind::RightBrace) {
            if self.check(&TokenKind::Eof) {
                return Err(self.error("expected '}' before end of input"));
            }
            body.push(self.parse_statement()?);
            self.end_statement()?;
        }
        self.expect(&TokenKind::RightBrace)?;
        Ok(body)
    }

    /// Consume `else`, allowing it to start on a later line than the `}`.
    fn match_else(&mut self) -> bool {
        let saved = self.position;
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
        if self.match_token(&TokenKind::Else) {
            true
        } else {
            self.position = saved;
            false
        }
    }

    fn end_statement(&mut self) -> ScriptResult<()> {
        match self.current_kind() {
            TokenKind::Newline | TokenKind::Semicolon => {
                self.skip_terminators();
                Ok(())
            }
            TokenKind::RightBrace | TokenKind::Eof => Ok(()),
            other => Err(self.error(format!("expected end of statement, found {other}"))),
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.current_kind(),
            TokenKind::Newline | TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        )
    }

    /// Parse a full expression.
    fn parse_expression(&mut self) -> ScriptResult<Expr> {
        self.parse_binary_expression(1)
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> ScriptResult<Expr> {
        let mut left = self.parse_unary_expression()?;

        while self.current_kind().is_binary_operator() {
            let op_token = self.current_kind().clone();
            let precedence = op_token.precedence();
            if precedence < min_precedence {
                break;
            }
            let line = self.line();
            self.advance();

            let next_min_precedence = if op_token.is_right_associative() {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary_expression(next_min_precedence)?;

            let op = match op_token {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                TokenKind::Power => BinaryOp::Power,
                TokenKind::Equal => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                TokenKind::And => BinaryOp::And,
                TokenKind::Or => BinaryOp::Or,
                other => return Err(self.error(format!("unexpected operator {other}"))),
            };

            left = Expr::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
                line,
            };
        }

        Ok(left)
    }

    fn parse_unary_expression(&mut self) -> ScriptResult<Expr> {
        self.enter()?;
        let expr = self.parse_unary_inner();
        self.depth -= 1;
        expr
    }

    fn parse_unary_inner(&mut self) -> ScriptResult<Expr> {
        match self.current_kind() {
            TokenKind::Minus => {
                let line = self.line();
                self.advance();
                Ok(Expr::Negate {
                    operand: Box::new(self.parse_unary_expression()?),
                    line,
                })
            }
            TokenKind::Not => {
                self.advance();
                Ok(Expr::Not(Box::new(self.parse_unary_expression()?)))
            }
            _ => self.parse_postfix_expression(),
        }
    }

    fn parse_postfix_expression(&mut self) -> ScriptResult<Expr> {
        let mut expr = self.parse_primary_expression()?;

        loop {
            match self.current_kind() {
                TokenKind::Dot => {
                    self.advance();
                    let line = self.line();
                    let name = self.expect_identifier("property name")?;
                    expr = Expr::Property {
                        object: Box::new(expr),
                        name,
                        line,
                    };
                }
                TokenKind::LeftBracket => {
                    let line = self.line();
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        line,
                    };
                }
                TokenKind::LeftParen => {
                    let line = self.line();
                    self.advance();
                    let args = self.parse_list(&TokenKind::RightParen)?;
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        line,
                    };
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    fn parse_primary_expression(&mut self) -> ScriptResult<Expr> {
        let token = self.current_kind().clone();
        match token {
            TokenKind::Integer(n) => {
                self.advance();
                Ok(Expr::Literal(Value::from(n)))
            }
            TokenKind::Float(n) => {
                self.advance();
                Ok(Expr::Literal(Value::from(n)))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Boolean(b) => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(b)))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            TokenKind::Identifier(name) => {
                let line = self.line();
                self.advance();
                Ok(Expr::Variable { name, line })
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                Ok(Expr::Array(self.parse_list(&TokenKind::RightBracket)?))
            }
            TokenKind::LeftBrace => self.parse_object(),
            other => Err(self.error(format!("unexpected {other}"))),
        }
    }

    /// Comma-separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list(&mut self, close: &TokenKind) -> ScriptResult<Vec<Expr>> {
        let mut items = Vec::new();
        while !self.check(close) {
            items.push(self.parse_expression()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(close)?;
        Ok(items)
    }

    fn parse_object(&mut self) -> ScriptResult<Expr> {
        self.expect(&TokenKind::LeftBrace)?;
        let mut pairs = Vec::new();

        loop {
            self.skip_newlines();
            if self.check(&TokenKind::RightBrace) {
                break;
            }
            let key = match self.current_kind().clone() {
                TokenKind::Identifier(name) | TokenKind::String(name) => {
                    self.advance();
                    name
                }
                other => return Err(self.error(format!("expected object key, found {other}"))),
            };
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            pairs.push((key, value));

            self.skip_newlines();
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.skip_newlines();
        self.expect(&TokenKind::RightBrace)?;
        Ok(Expr::Object(pairs))
    }

    fn current_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.position)
            .map_or(&TokenKind::Eof, |token| &token.kind)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.position)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.span.line)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn check(&self, expected: &TokenKind) -> bool {
        self.current_kind() == expected
    }

    fn match_token(&mut self, expected: &TokenKind) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &TokenKind) -> ScriptResult<()> {
        if self.match_token(expected) {
            Ok(())
        } else {
            Err(self.error(format!(
                "expected '{expected}', found {}",
                self.current_kind()
            )))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> ScriptResult<String> {
        if let TokenKind::Identifier(name) = self.current_kind() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(format!("expected {what}, found {}", self.current_kind())))
        }
    }

    fn expect_binding(&mut self, what: &str) -> ScriptResult<String> {
        let name = self.expect_identifier(what)?;
        if RESERVED_NAMES.contains(&name.as_str()) {
            return Err(self.error(format!("cannot rebind '{name}'")));
        }
        Ok(name)
    }

    fn enter(&mut self) -> ScriptResult<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error(format!("nesting exceeds {MAX_NESTING_DEPTH} levels")));
        }
        self.depth += 1;
        Ok(())
    }

    fn skip_terminators(&mut self) {
        while self.current_kind().is_terminator() {
            self.advance();
        }
    }

    fn skip_newlines(&mut self) {
        while self.check(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::Syntax {
            message: message.into(),
            line: self.line(),
        }
    }
}

fn is_assignable(expr: &Expr) -> bool {
    match expr {
        Expr::Variable { .. } => true,
        Expr::Index { object, .. } | Expr::Property { object, .. } => is_assignable(object),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn body(source: &str) -> Vec<Stmt> {
        parse(source).unwrap().body
    }

    fn syntax_error(source: &str) -> (String, u32) {
        match parse(source).unwrap_err() {
            ScriptError::Syntax { message, line } => (message, line),
            other => panic!("expected syntax error, got {other:?}"),
        }
    }

    #[test]
    fn statements_carry_lines() {
        let lines: Vec<_> = body("let a = 1\n\n# note\nb = a; print(b)")
            .iter()
            .map(|s| s.line)
            .collect();
        assert_eq!(lines, vec![1, 4, 4]);
    }

    #[test]
    fn precedence_and_associativity() {
        let stmts = body("x = 1 + 2 * 3 ** 2 ** 2");
        let StmtKind::Assign { value, .. } = &stmts[0].kind else {
            panic!("expected assignment");
        };
        let lit = |v: i64| Box::new(Expr::Literal(json!(v)));
        assert_eq!(
            value,
            &Expr::Binary {
                left: lit(1),
                op: BinaryOp::Add,
                right: Box::new(Expr::Binary {
                    left: lit(2),
                    op: BinaryOp::Multiply,
                    right: Box::new(Expr::Binary {
                        left: lit(3),
                        op: BinaryOp::Power,
                        right: Box::new(Expr::Binary {
                            left: lit(2),
                            op: BinaryOp::Power,
                            right: lit(2),
                            line: 1,
                        }),
                        line: 1,
                    }),
                    line: 1,
                }),
                line: 1,
            }
        );
    }

    #[test]
    fn method_calls_and_indexing() {
        let stmts = body("context.set('variables.x', items[0])");
        let StmtKind::Expr(Expr::Call { callee, args, .. }) = &stmts[0].kind else {
            panic!("expected call");
        };
        assert_eq!(
            **callee,
            Expr::Property {
                object: Box::new(Expr::Variable {
                    name: "context".into(),
                    line: 1,
                }),
                name: "set".into(),
                line: 1,
            }
        );
        assert_eq!(args.len(), 2);
        assert!(matches!(args[1], Expr::Index { .. }));
    }

    #[test]
    fn if_else_chain_across_lines() {
        let stmts = body("if a {\n  x = 1\n}\nelse if b {\n  x = 2\n} else {\n  x = 3\n}");
        let StmtKind::If {
            branches,
            otherwise,
        } = &stmts[0].kind
        else {
            panic!("expected if");
        };
        assert_eq!(branches.len(), 2);
        assert_eq!(otherwise.as_ref().map(Vec::len), Some(1));
        assert_eq!(branches[0].line, 1);
        assert_eq!(branches[1].line, 4);
        assert_eq!(branches[1].body[0].line, 5);
    }

    #[test]
    fn expressions_carry_the_line_of_their_operator() {
        let stmts = body("let v = [\n  a,\n  2 / 0,\n  f(\n    x)\n]");
        let StmtKind::Let { value, .. } = &stmts[0].kind else {
            panic!("expected let");
        };
        let Expr::Array(items) = value else {
            panic!("expected array");
        };
        let lines: Vec<_> = items.iter().map(Expr::line).collect();
        assert_eq!(lines, vec![Some(2), Some(3), Some(4)]);
        let Expr::Call { args, .. } = &items[2] else {
            panic!("expected call");
        };
        assert_eq!(args[0].line(), Some(5));
        assert_eq!(Expr::Literal(json!(1)).line(), None);
    }

    #[test]
    fn function_definition() {
        let stmts = body("fn add(a, b) {\n  return a + b\n}");
        let StmtKind::Function(def) = &stmts[0].kind else {
            panic!("expected fn");
        };
        assert_eq!(def.name, "add");
        assert_eq!(def.params, vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(def.body[0].line, 2);
    }

    #[test]
    fn multiline_object_literal() {
        let stmts = body("let o = {\n  a: 1,\n  'b c': [1,\n 2],\n}\nprint(o)");
        assert_eq!(stmts.len(), 2);
        let StmtKind::Let { value, .. } = &stmts[0].kind else {
            panic!("expected let");
        };
        let Expr::Object(pairs) = value else {
            panic!("expected object");
        };
        assert_eq!(pairs[1].0, "b c");
        assert_eq!(stmts[1].line, 6);
    }

    #[test]
    fn assignment_targets() {
        assert!(parse("a.b[0] = 1").is_ok());
        let (message, line) = syntax_error("x = 1\nf() = 2");
        assert_eq!(message, "cannot assign to this expression");
        assert_eq!(line, 2);
    }

    #[test]
    fn control_flow_outside_its_construct() {
        assert_eq!(syntax_error("return 1").0, "'return' outside function");
        assert_eq!(syntax_error("\nbreak"), ("'break' outside loop".to_owned(), 2));
        assert_eq!(
            syntax_error("while true { fn f() { continue } }").0,
            "'continue' outside loop"
        );
    }

    #[test]
    fn missing_statement_separator() {
        let (message, _) = syntax_error("a = 1 b = 2");
        assert_eq!(message, "expected end of statement, found b");
    }

    #[test]
    fn unclosed_block() {
        let (message, line) = syntax_error("if x {\n  y = 1\n");
        assert_eq!(message, "expected '}' before end of input");
        assert_eq!(line, 3);
    }

    #[test]
    fn ambient_names_cannot_be_rebound() {
        assert_eq!(syntax_error("let context = 1").0, "cannot rebind 'context'");
        assert_eq!(syntax_error("connections = {}").0, "cannot rebind 'connections'");
        assert_eq!(syntax_error("fn f(context) {}").0, "cannot rebind 'context'");
        assert!(parse("context['variables.x'] = 1").is_ok());
    }

    #[test]
    fn deep_nesting_is_rejected() {
        let source = format!("x = {}1{}", "(".repeat(300), ")".repeat(300));
        assert!(syntax_error(&source).0.starts_with("nesting exceeds"));
        let source = format!("x = {}1", "-".repeat(300));
        assert!(syntax_error(&source).0.starts_with("nesting exceeds"));
    }
}
