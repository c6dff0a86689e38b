//! The main parser implementation.

use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::{Span, Token, TokenKind};

/// A recursive descent parser for YASL.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a new parser over a token vector.
    ///
    /// A missing trailing `Eof` token is supplied.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let (end, line) = tokens
                .last()
                .map(|t| (t.span.end, t.line))
                .unwrap_or((0, 1));
            tokens.push(Token::new(TokenKind::Eof, Span::new(end, end), line));
        }
        Self { tokens, pos: 0 }
    }

    /// Parses the token vector into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();

        loop {
            self.skip_terminators();
            if self.is_at_end() {
                break;
            }
            body.push(self.parse_statement()?);
            if !self.is_at_end() {
                self.expect(&TokenKind::Semicolon)?;
            }
        }

        Ok(Program { body })
    }

    /// Parses a single statement, without its terminator.
    pub fn parse_statement(&mut self) -> Result<Statement> {
        match &self.current().kind {
            TokenKind::Print => self.parse_print_statement(),
            TokenKind::If => self.parse_if_statement(),
            TokenKind::While => self.parse_while_statement(),
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Func => self.parse_function_declaration(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::LeftBrace => Ok(Statement::Block(self.parse_block()?)),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_print_statement(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // consume 'print'
        let argument = self.parse_expression()?;
        Ok(Statement::Print(PrintStatement { argument, line }))
    }

    /// Parses `if`, folding each `elseif` into a nested conditional.
    fn parse_if_statement(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // consume 'if' or 'elseif'
        let test = self.parse_expression()?;
        let consequent = self.parse_block()?;

        // A newline after `}` is a terminator; look past it for a continuation
        if self.check(&TokenKind::Semicolon)
            && matches!(self.peek_kind(), Some(TokenKind::Elseif | TokenKind::Else))
        {
            self.advance();
        }

        let alternate = match &self.current().kind {
            TokenKind::Elseif => self.parse_if_statement()?,
            TokenKind::Else => {
                self.advance();
                Statement::Block(self.parse_block()?)
            }
            _ => {
                return Ok(Statement::If(IfStatement {
                    test,
                    consequent,
                    line,
                }));
            }
        };

        Ok(Statement::IfElse(IfElseStatement {
            test,
            consequent,
            alternate: Box::new(alternate),
            line,
        }))
    }

    fn parse_while_statement(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // consume 'while'
        let test = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Statement::While(WhileStatement { test, body, line }))
    }

    fn parse_let_statement(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // consume 'let'
        let id = self.expect_identifier()?;

        let init = if self.check(&TokenKind::Equal) {
            self.advance();
            self.parse_expression()?
        } else {
            Expression::Literal(LiteralExpression {
                value: Literal::Undefined,
                line,
            })
        };

        Ok(Statement::Let(LetStatement {
            name: id.name,
            init,
            line,
        }))
    }

    /// Parses `func name: a, b -> { ... }`.
    fn parse_function_declaration(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // consume 'func'
        let name = self.expect_identifier()?.name;
        self.expect(&TokenKind::Colon)?;

        let mut params = Vec::new();
        if !self.check(&TokenKind::Arrow) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&TokenKind::Arrow)?;

        let body = self.parse_block()?;
        Ok(Statement::Function(FunctionDeclaration {
            name,
            params,
            body,
            line,
        }))
    }

    fn parse_return_statement(&mut self) -> Result<Statement> {
        let line = self.line();
        self.advance(); // consume 'return'
        let argument = self.parse_expression()?;
        Ok(Statement::Return(ReturnStatement { argument, line }))
    }

    fn parse_expression_statement(&mut self) -> Result<Statement> {
        let line = self.line();
        let expression = self.parse_expression()?;
        Ok(Statement::Expression(ExpressionStatement { expression, line }))
    }

    /// Parses `{ stmt; stmt }`. The last statement may run up to the `}`.
    fn parse_block(&mut self) -> Result<BlockStatement> {
        let line = self.line();
        self.expect(&TokenKind::LeftBrace)?;

        let mut body = Vec::new();
        loop {
            self.skip_terminators();
            if self.check(&TokenKind::RightBrace) {
                break;
            }
            body.push(self.parse_statement()?);
            if self.check(&TokenKind::Semicolon) {
                self.advance();
            } else if !self.check(&TokenKind::RightBrace) {
                return Err(self.unexpected("';' or '}'"));
            }
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(BlockStatement { body, line })
    }

    // ==================== Token helpers ====================

    pub(super) fn current(&self) -> &Token {
        // `new` guarantees a trailing Eof and `advance` never moves past it
        &self.tokens[self.pos]
    }

    pub(super) fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    pub(super) fn line(&self) -> usize {
        self.current().line
    }

    pub(super) fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current().kind) == std::mem::discriminant(kind)
    }

    pub(super) fn expect(&mut self, kind: &TokenKind) -> Result<()> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    pub(super) fn expect_identifier(&mut self) -> Result<Identifier> {
        if let TokenKind::Identifier(name) = &self.current().kind {
            let id = Identifier {
                name: name.clone(),
                line: self.line(),
            };
            self.advance();
            Ok(id)
        } else {
            Err(self.unexpected("identifier"))
        }
    }

    pub(super) fn unexpected(&self, expected: &str) -> Error {
        Error::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current().kind.to_string(),
            line: self.line(),
        }
    }

    fn skip_terminators(&mut self) {
        while self.check(&TokenKind::Semicolon) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current().kind, TokenKind::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    // Helper to parse and get first statement
    fn parse_stmt(src: &str) -> Statement {
        let program = parse_ok(src);
        program.body.into_iter().next().unwrap()
    }

    // Helper to parse and check it succeeds
    fn parse_ok(src: &str) -> Program {
        let mut parser = Parser::new(tokenize(src).unwrap());
        parser.parse_program().unwrap()
    }

    // Helper to parse and check it fails
    fn parse_err(src: &str) -> Error {
        let mut parser = Parser::new(tokenize(src).unwrap());
        parser.parse_program().unwrap_err()
    }

    #[test]
    fn test_parse_let_with_initializer() {
        let stmt = parse_stmt("let x = 42");
        let Statement::Let(decl) = stmt else {
            panic!("expected let");
        };
        assert_eq!(decl.name, "x");
        assert!(matches!(
            decl.init,
            Expression::Literal(LiteralExpression {
                value: Literal::Integer(42),
                ..
            })
        ));
    }

    #[test]
    fn test_parse_let_without_initializer_is_undefined() {
        let stmt = parse_stmt("let x");
        let Statement::Let(decl) = stmt else {
            panic!("expected let");
        };
        assert!(matches!(
            decl.init,
            Expression::Literal(LiteralExpression {
                value: Literal::Undefined,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_print_statement() {
        assert!(matches!(parse_stmt("print 1 + 2"), Statement::Print(_)));
    }

    #[test]
    fn test_parse_if_statement() {
        let stmt = parse_stmt("if x > 1 { print x }");
        let Statement::If(stmt) = stmt else {
            panic!("expected if");
        };
        assert_eq!(stmt.consequent.body.len(), 1);
    }

    #[test]
    fn test_parse_if_else_on_separate_lines() {
        let stmt = parse_stmt("if a {\n print 1\n}\nelse {\n print 2\n}\n");
        let Statement::IfElse(stmt) = stmt else {
            panic!("expected if/else");
        };
        assert!(matches!(*stmt.alternate, Statement::Block(_)));
    }

    #[test]
    fn test_parse_elseif_chain_nests_right() {
        let stmt = parse_stmt("if a { print 1 } elseif b { print 2 } elseif c { print 3 } else { print 4 }");
        let Statement::IfElse(first) = stmt else {
            panic!("expected if/else");
        };
        let Statement::IfElse(second) = *first.alternate else {
            panic!("expected nested if/else");
        };
        let Statement::IfElse(third) = *second.alternate else {
            panic!("expected nested if/else");
        };
        assert!(matches!(*third.alternate, Statement::Block(_)));
    }

    #[test]
    fn test_parse_elseif_without_else() {
        let stmt = parse_stmt("if a { print 1 }\nelseif b { print 2 }");
        let Statement::IfElse(first) = stmt else {
            panic!("expected if/else");
        };
        assert!(matches!(*first.alternate, Statement::If(_)));
    }

    #[test]
    fn test_parse_while_statement() {
        let stmt = parse_stmt("while i < 10 {\n i = i + 1\n}");
        let Statement::While(stmt) = stmt else {
            panic!("expected while");
        };
        assert_eq!(stmt.body.body.len(), 1);
    }

    #[test]
    fn test_parse_function_declaration() {
        let stmt = parse_stmt("func add: a, b -> { return a + b }");
        let Statement::Function(func) = stmt else {
            panic!("expected function");
        };
        assert_eq!(func.name, "add");
        let params: Vec<_> = func.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, ["a", "b"]);
        assert!(matches!(func.body.body[0], Statement::Return(_)));
    }

    #[test]
    fn test_parse_function_without_params() {
        let stmt = parse_stmt("func f: -> {\n return 1\n}");
        let Statement::Function(func) = stmt else {
            panic!("expected function");
        };
        assert!(func.params.is_empty());
    }

    #[test]
    fn test_parse_block_statement() {
        let stmt = parse_stmt("{ let a = 1; let b = 2 }");
        let Statement::Block(block) = stmt else {
            panic!("expected block");
        };
        assert_eq!(block.body.len(), 2);
    }

    #[test]
    fn test_parse_multiple_statements() {
        let program = parse_ok("let x = 2\nif x > 1 { print x }\n\n$$ done\n");
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.body[1].line(), 2);
    }

    #[test]
    fn test_parse_explicit_semicolons() {
        let program = parse_ok("let a = 1; let b = 2;; print a");
        assert_eq!(program.body.len(), 3);
    }

    #[test]
    fn test_statements_need_terminators() {
        let err = parse_err("let a = 1 let b = 2");
        assert!(matches!(err, Error::UnexpectedToken { line: 1, .. }));
    }

    #[test]
    fn test_block_statements_need_terminators() {
        let err = parse_err("if a { print 1 print 2 }");
        let Error::UnexpectedToken { expected, .. } = err else {
            panic!("expected parse error");
        };
        assert_eq!(expected, "';' or '}'");
    }

    #[test]
    fn test_missing_brace_reports_expected_and_found() {
        let err = parse_err("while x print x");
        assert_eq!(
            err,
            Error::UnexpectedToken {
                expected: "'{'".to_string(),
                found: "'print'".to_string(),
                line: 1,
            }
        );
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse_err("func f: -> {\n return 1\n");
        assert!(matches!(err, Error::UnexpectedToken { ref found, .. } if found == "end of input"));
    }

    #[test]
    fn test_let_requires_identifier() {
        let err = parse_err("let 5 = x");
        assert!(matches!(err, Error::UnexpectedToken { ref expected, .. } if expected == "identifier"));
    }

    #[test]
    fn test_new_appends_missing_eof() {
        let mut parser = Parser::new(Vec::new());
        let program = parser.parse_program().unwrap();
        assert!(program.body.is_empty());
    }
}
