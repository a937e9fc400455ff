//! Recursive-descent / Pratt parser: token stream -> [`Program`].
//!
//! Kept deliberately simple. One pass, one error list, best-effort
//! statement-boundary recovery so a REPL line with more than one mistake
//! still reports more than the first.

use std::fmt;

use crate::ast::{Expression, InfixOp, PrefixOp, Program, Statement};
use crate::lexer::{Lexer, PositionedToken, Token};

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
enum Precedence {
    Lowest,
    Assign,
    Or,
    And,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

fn precedence_of(token: &Token) -> Precedence {
    match token {
        Token::Assign => Precedence::Assign,
        Token::Or => Precedence::Or,
        Token::And => Precedence::And,
        Token::Eq | Token::NotEq => Precedence::Equals,
        Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => Precedence::LessGreater,
        Token::Plus | Token::Minus => Precedence::Sum,
        Token::Asterisk | Token::Slash | Token::Percent => Precedence::Product,
        Token::Lparen => Precedence::Call,
        Token::Lbracket => Precedence::Index,
        _ => Precedence::Lowest,
    }
}

pub struct Parser {
    tokens: Vec<PositionedToken>,
    pos: usize,
    errors: Vec<ParseError>,
}

type PResult<T> = Result<T, ()>;

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser {
            tokens: Lexer::new(source).tokenize(),
            pos: 0,
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> Result<Program, Vec<ParseError>> {
        let mut statements = Vec::new();
        while !self.at_eof() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        if self.errors.is_empty() {
            Ok(Program { statements })
        } else {
            Err(self.errors)
        }
    }

    // --- token stream helpers -------------------------------------------

    fn cur(&self) -> &PositionedToken {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn cur_tok(&self) -> &Token {
        &self.cur().token
    }

    fn at_eof(&self) -> bool {
        matches!(self.cur_tok(), Token::Eof)
    }

    fn advance(&mut self) -> PositionedToken {
        let tok = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn error(&mut self, message: impl Into<String>) {
        let cur = self.cur();
        self.errors.push(ParseError {
            message: message.into(),
            line: cur.line,
            column: cur.column,
        });
    }

    fn expect(&mut self, expected: &Token) -> PResult<PositionedToken> {
        if self.cur_tok() == expected {
            Ok(self.advance())
        } else {
            self.error(format!(
                "expected {}, found {}",
                expected, self.cur_tok()
            ));
            Err(())
        }
    }

    fn skip_if(&mut self, token: &Token) {
        if self.cur_tok() == token {
            self.advance();
        }
    }

    /// After a parse error, skip to the next statement boundary so the
    /// rest of the input can still be checked for further errors.
    fn synchronize(&mut self) {
        loop {
            match self.cur_tok() {
                Token::Semicolon => {
                    self.advance();
                    return;
                }
                Token::Eof | Token::Rbrace => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    // --- statements -------------------------------------------------------

    fn parse_statement(&mut self) -> PResult<Statement> {
        match self.cur_tok() {
            Token::Let => self.parse_let_statement(),
            Token::Lbrace => Ok(Statement::Block(self.parse_block()?)),
            Token::While => self.parse_while_statement(),
            Token::For => self.parse_for_statement(),
            Token::Break => {
                self.advance();
                self.skip_if(&Token::Semicolon);
                Ok(Statement::Break)
            }
            Token::Continue => {
                self.advance();
                self.skip_if(&Token::Semicolon);
                Ok(Statement::Continue)
            }
            Token::Return => {
                self.advance();
                if matches!(self.cur_tok(), Token::Semicolon | Token::Rbrace | Token::Eof) {
                    self.skip_if(&Token::Semicolon);
                    return Ok(Statement::Return(None));
                }
                let value = self.parse_expression(Precedence::Lowest)?;
                self.skip_if(&Token::Semicolon);
                Ok(Statement::Return(Some(value)))
            }
            _ => {
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.skip_if(&Token::Semicolon);
                Ok(Statement::Expr(expr))
            }
        }
    }

    fn parse_let_statement(&mut self) -> PResult<Statement> {
        self.advance(); // 'let'
        let name = match self.cur_tok().clone() {
            Token::Ident(name) => {
                self.advance();
                name
            }
            other => {
                self.error(format!("expected identifier after 'let', found {}", other));
                return Err(());
            }
        };
        self.expect(&Token::Assign)?;
        let mut value = self.parse_expression(Precedence::Lowest)?;
        // `let f = fn(...) {...}` names the literal after the binding, the
        // way the compiler's `define_function_name`/`OP_CURRENT_CLOSURE`
        // mechanism expects, so self-recursive calls inside the body
        // resolve without needing `f` to already be a global.
        if let Expression::FunctionLiteral { name: fn_name @ None, .. } = &mut value {
            *fn_name = Some(name.clone());
        }
        self.skip_if(&Token::Semicolon);
        Ok(Statement::Let { name, value })
    }

    fn parse_block(&mut self) -> PResult<Vec<Statement>> {
        self.expect(&Token::Lbrace)?;
        let mut statements = Vec::new();
        while !matches!(self.cur_tok(), Token::Rbrace | Token::Eof) {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }
        self.expect(&Token::Rbrace)?;
        Ok(statements)
    }

    fn parse_while_statement(&mut self) -> PResult<Statement> {
        self.advance(); // 'while'
        self.expect(&Token::Lparen)?;
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect(&Token::Rparen)?;
        let body = self.parse_block()?;
        Ok(Statement::While { cond, body })
    }

    fn parse_for_statement(&mut self) -> PResult<Statement> {
        self.advance(); // 'for'
        self.expect(&Token::Lparen)?;
        let init = self.parse_for_clause_statement()?;
        self.expect(&Token::Semicolon)?;
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect(&Token::Semicolon)?;
        let post = self.parse_for_clause_statement()?;
        self.expect(&Token::Rparen)?;
        let body = self.parse_block()?;
        Ok(Statement::For {
            init: Box::new(init),
            cond,
            post: Box::new(post),
            body,
        })
    }

    /// A `for(...)` init/post clause: either `let x = e` or a bare
    /// expression statement (typically an assignment), with no terminating
    /// semicolon consumed here (the caller handles the clause separators).
    fn parse_for_clause_statement(&mut self) -> PResult<Statement> {
        if matches!(self.cur_tok(), Token::Let) {
            self.advance();
            let name = match self.cur_tok().clone() {
                Token::Ident(name) => {
                    self.advance();
                    name
                }
                other => {
                    self.error(format!("expected identifier after 'let', found {}", other));
                    return Err(());
                }
            };
            self.expect(&Token::Assign)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            Ok(Statement::Let { name, value })
        } else {
            let expr = self.parse_expression(Precedence::Lowest)?;
            Ok(Statement::Expr(expr))
        }
    }

    // --- expressions --------------------------------------------------------

    fn parse_expression(&mut self, precedence: Precedence) -> PResult<Expression> {
        let mut left = self.parse_prefix()?;

        while !matches!(self.cur_tok(), Token::Semicolon) && precedence < precedence_of(self.cur_tok())
        {
            left = match self.cur_tok() {
                Token::Assign => self.parse_assign(left)?,
                Token::Lparen => self.parse_call(left)?,
                Token::Lbracket => self.parse_index(left)?,
                Token::Plus
                | Token::Minus
                | Token::Asterisk
                | Token::Slash
                | Token::Percent
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::Gt
                | Token::LtEq
                | Token::GtEq
                | Token::And
                | Token::Or => self.parse_infix(left)?,
                _ => return Ok(left),
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> PResult<Expression> {
        match self.cur_tok().clone() {
            Token::Int(n) => {
                self.advance();
                Ok(Expression::IntLiteral(n))
            }
            Token::Str(s) => {
                self.advance();
                Ok(Expression::StringLiteral(s))
            }
            Token::True => {
                self.advance();
                Ok(Expression::BoolLiteral(true))
            }
            Token::False => {
                self.advance();
                Ok(Expression::BoolLiteral(false))
            }
            Token::Null => {
                self.advance();
                Ok(Expression::NullLiteral)
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Expression::Identifier(name))
            }
            Token::Minus => {
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expression::Prefix {
                    op: PrefixOp::Minus,
                    right: Box::new(right),
                })
            }
            Token::Bang => {
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                Ok(Expression::Prefix {
                    op: PrefixOp::Not,
                    right: Box::new(right),
                })
            }
            Token::Lparen => {
                self.advance();
                let expr = self.parse_expression(Precedence::Lowest)?;
                self.expect(&Token::Rparen)?;
                Ok(expr)
            }
            Token::Lbracket => self.parse_array_literal(),
            Token::Lbrace => self.parse_map_literal(),
            Token::If => self.parse_if_expression(),
            Token::Fn => self.parse_function_literal(),
            other => {
                self.error(format!("unexpected token {}", other));
                Err(())
            }
        }
    }

    fn parse_infix(&mut self, left: Expression) -> PResult<Expression> {
        let op_tok = self.cur_tok().clone();
        let precedence = precedence_of(&op_tok);
        self.advance();
        let op = match op_tok {
            Token::Plus => InfixOp::Add,
            Token::Minus => InfixOp::Sub,
            Token::Asterisk => InfixOp::Mul,
            Token::Slash => InfixOp::Div,
            Token::Percent => InfixOp::Mod,
            Token::Eq => InfixOp::Eq,
            Token::NotEq => InfixOp::NotEq,
            Token::Lt => InfixOp::Lt,
            Token::Gt => InfixOp::Gt,
            Token::LtEq => InfixOp::LtEq,
            Token::GtEq => InfixOp::GtEq,
            Token::And => InfixOp::And,
            Token::Or => InfixOp::Or,
            _ => unreachable!("precedence_of only routes operator tokens here"),
        };
        let right = self.parse_expression(precedence)?;
        Ok(Expression::Infix {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    fn parse_assign(&mut self, target: Expression) -> PResult<Expression> {
        self.advance(); // '='
        let value = self.parse_expression(Precedence::Assign)?;
        Ok(Expression::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    fn parse_call(&mut self, func: Expression) -> PResult<Expression> {
        let args = self.parse_expression_list(Token::Rparen)?;
        Ok(Expression::Call {
            func: Box::new(func),
            args,
        })
    }

    fn parse_index(&mut self, left: Expression) -> PResult<Expression> {
        self.advance(); // '['
        let index = self.parse_expression(Precedence::Lowest)?;
        self.expect(&Token::Rbracket)?;
        Ok(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_expression_list(&mut self, end: Token) -> PResult<Vec<Expression>> {
        self.advance(); // opening delimiter
        let mut items = Vec::new();
        if self.cur_tok() == &end {
            self.advance();
            return Ok(items);
        }
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.cur_tok() == &Token::Comma {
            self.advance();
            items.push(self.parse_expression(Precedence::Lowest)?);
        }
        self.expect(&end)?;
        Ok(items)
    }

    fn parse_array_literal(&mut self) -> PResult<Expression> {
        let items = self.parse_expression_list(Token::Rbracket)?;
        Ok(Expression::ArrayLiteral(items))
    }

    fn parse_map_literal(&mut self) -> PResult<Expression> {
        self.advance(); // '{'
        let mut pairs = Vec::new();
        while self.cur_tok() != &Token::Rbrace {
            let key = self.parse_expression(Precedence::Lowest)?;
            self.expect(&Token::Colon)?;
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));
            if self.cur_tok() == &Token::Comma {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(&Token::Rbrace)?;
        Ok(Expression::MapLiteral(pairs))
    }

    fn parse_if_expression(&mut self) -> PResult<Expression> {
        self.advance(); // 'if'
        self.expect(&Token::Lparen)?;
        let cond = self.parse_expression(Precedence::Lowest)?;
        self.expect(&Token::Rparen)?;
        let consequence = self.parse_block()?;
        let alternative = if self.cur_tok() == &Token::Else {
            self.advance();
            if self.cur_tok() == &Token::If {
                let nested = self.parse_if_expression()?;
                Some(vec![Statement::Expr(nested)])
            } else {
                Some(self.parse_block()?)
            }
        } else {
            None
        };
        Ok(Expression::If {
            cond: Box::new(cond),
            consequence,
            alternative,
        })
    }

    fn parse_function_literal(&mut self) -> PResult<Expression> {
        self.advance(); // 'fn'
        let name = if let Token::Ident(n) = self.cur_tok().clone() {
            self.advance();
            Some(n)
        } else {
            None
        };
        self.expect(&Token::Lparen)?;
        let mut params = Vec::new();
        if self.cur_tok() != &Token::Rparen {
            loop {
                match self.cur_tok().clone() {
                    Token::Ident(p) => {
                        self.advance();
                        params.push(p);
                    }
                    other => {
                        self.error(format!("expected parameter name, found {}", other));
                        return Err(());
                    }
                }
                if self.cur_tok() == &Token::Comma {
                    self.advance();
                } else {
                    break;
                }
            }
        }
        self.expect(&Token::Rparen)?;
        let body = self.parse_block()?;
        Ok(Expression::FunctionLiteral { name, params, body })
    }
}

/// Parse a complete program from source text.
pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    Parser::new(source).parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, InfixOp, Statement};

    fn parse_ok(src: &str) -> Program {
        parse(src).unwrap_or_else(|e| panic!("parse error: {:?}", e))
    }

    #[test]
    fn parses_let_and_arithmetic() {
        let program = parse_ok("let x = 1 + 2 * 3;");
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Statement::Let { name, value } => {
                assert_eq!(name, "x");
                assert_eq!(
                    *value,
                    Expression::Infix {
                        op: InfixOp::Add,
                        left: Box::new(Expression::IntLiteral(1)),
                        right: Box::new(Expression::Infix {
                            op: InfixOp::Mul,
                            left: Box::new(Expression::IntLiteral(2)),
                            right: Box::new(Expression::IntLiteral(3)),
                        }),
                    }
                );
            }
            other => panic!("expected let, got {:?}", other),
        }
    }

    #[test]
    fn parses_function_call() {
        let program = parse_ok("f(2, 3);");
        match &program.statements[0] {
            Statement::Expr(Expression::Call { args, .. }) => assert_eq!(args.len(), 2),
            other => panic!("expected call, got {:?}", other),
        }
    }

    #[test]
    fn parses_index_assignment() {
        let program = parse_ok("a[1] = 9;");
        match &program.statements[0] {
            Statement::Expr(Expression::Assign { target, .. }) => {
                assert!(matches!(**target, Expression::Index { .. }));
            }
            other => panic!("expected assignment, got {:?}", other),
        }
    }

    #[test]
    fn parses_while_loop() {
        let program = parse_ok("while (i < 5) { i = i + 1; }");
        assert!(matches!(program.statements[0], Statement::While { .. }));
    }

    #[test]
    fn parses_for_loop() {
        let program = parse_ok("for (let i = 0; i < 5; i = i + 1) { s = s + i; }");
        match &program.statements[0] {
            Statement::For { .. } => {}
            other => panic!("expected for, got {:?}", other),
        }
    }

    #[test]
    fn reports_error_with_position() {
        let err = parse("let x = ;").unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err[0].line, 1);
    }

    #[test]
    fn collects_multiple_errors_across_statements() {
        let err = parse("let = 1; let = 2;").unwrap_err();
        assert_eq!(err.len(), 2);
    }

    #[test]
    fn let_bound_anonymous_function_is_named_after_the_binding() {
        let program = parse_ok("let fib = fn(n) { fib(n - 1) };");
        match &program.statements[0] {
            Statement::Let { value: Expression::FunctionLiteral { name, .. }, .. } => {
                assert_eq!(name.as_deref(), Some("fib"));
            }
            other => panic!("expected let-bound function literal, got {:?}", other),
        }
    }

    #[test]
    fn explicitly_named_function_literal_keeps_its_own_name() {
        let program = parse_ok("let g = fn helper(n) { n };");
        match &program.statements[0] {
            Statement::Let { value: Expression::FunctionLiteral { name, .. }, .. } => {
                assert_eq!(name.as_deref(), Some("helper"));
            }
            other => panic!("expected let-bound function literal, got {:?}", other),
        }
    }
}
