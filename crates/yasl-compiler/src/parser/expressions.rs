//! Expression parsing.
//!
//! Expressions are parsed by recursive descent with one method per
//! precedence level.
//!
//! ## Precedence Table (lowest to highest)
//!
//! | Precedence | Operators | Method |
//! |------------|-----------|--------|
//! | 1 | `=` `+=` `-=` `??=` etc. | `parse_assignment` |
//! | 2 | `?:` `??` | `parse_ternary` |
//! | 3 | `or` | `parse_logical_or` |
//! | 4 | `and` | `parse_logical_and` |
//! | 5 | `==` `!=` `===` `!==` | `parse_equality` |
//! | 6 | `<` `>` `<=` `>=` | `parse_comparison` |
//! | 7 | `\|\|` | `parse_concat` |
//! | 8 | `+` `-` | `parse_additive` |
//! | 9 | `*` `/` `//` `%` | `parse_multiplicative` |
//! | 10 | `-` `+` `!` `#` | `parse_unary` |
//! | 11 | `[]` `.name()` | `parse_postfix` |
//! | 12 | primary | `parse_primary` |
//!
//! Assignment, the ternary, `??` and `||` associate to the right; the other
//! binary levels associate to the left.

use super::Parser;
use crate::ast::*;
use crate::error::{Error, Result};
use crate::lexer::TokenKind;

/// How an assignment operator combines the old value with the new one.
enum AssignOp {
    Plain,
    Binary(BinaryOperator),
    Coalesce,
}

impl Parser {
    /// Parses an expression.
    pub fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expression> {
        let target = self.parse_ternary()?;

        let op = match &self.current().kind {
            TokenKind::Equal => AssignOp::Plain,
            TokenKind::PlusEqual => AssignOp::Binary(BinaryOperator::Add),
            TokenKind::MinusEqual => AssignOp::Binary(BinaryOperator::Subtract),
            TokenKind::StarEqual => AssignOp::Binary(BinaryOperator::Multiply),
            TokenKind::SlashEqual => AssignOp::Binary(BinaryOperator::Divide),
            TokenKind::DoubleSlashEqual => AssignOp::Binary(BinaryOperator::IntegerDivide),
            TokenKind::PercentEqual => AssignOp::Binary(BinaryOperator::Modulo),
            TokenKind::DoublePipeEqual => AssignOp::Binary(BinaryOperator::Concat),
            TokenKind::DoubleQuestionEqual => AssignOp::Coalesce,
            _ => return Ok(target),
        };
        let line = self.line();
        self.advance();
        let value = self.parse_assignment()?;

        let target = match target {
            Expression::Variable(id) => AssignmentTarget::Variable(id),
            Expression::Index(index) => AssignmentTarget::Index(index),
            _ => return Err(Error::InvalidAssignmentTarget { line }),
        };

        // `x op= e` is `x = x op e`
        let value = match op {
            AssignOp::Plain => value,
            AssignOp::Binary(operator) => Expression::Binary(BinaryExpression {
                operator,
                left: Box::new(target.to_expression()),
                right: Box::new(value),
                line,
            }),
            AssignOp::Coalesce => Expression::NullCoalesce(NullCoalesceExpression {
                left: Box::new(target.to_expression()),
                right: Box::new(value),
                line,
            }),
        };

        Ok(Expression::Assignment(AssignmentExpression {
            target,
            value: Box::new(value),
            line,
        }))
    }

    fn parse_ternary(&mut self) -> Result<Expression> {
        let test = self.parse_logical_or()?;
        let line = self.line();

        if self.check(&TokenKind::Question) {
            self.advance();
            let consequent = self.parse_ternary()?;
            self.expect(&TokenKind::Colon)?;
            let alternate = self.parse_ternary()?;
            return Ok(Expression::Ternary(TernaryExpression {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
                line,
            }));
        }

        if self.check(&TokenKind::DoubleQuestion) {
            self.advance();
            let right = self.parse_ternary()?;
            return Ok(Expression::NullCoalesce(NullCoalesceExpression {
                left: Box::new(test),
                right: Box::new(right),
                line,
            }));
        }

        Ok(test)
    }

    fn parse_logical_or(&mut self) -> Result<Expression> {
        let mut left = self.parse_logical_and()?;

        while self.check(&TokenKind::Or) {
            let line = self.line();
            self.advance();
            let right = self.parse_logical_and()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::Or,
                left: Box::new(left),
                right: Box::new(right),
                line,
            });
        }

        Ok(left)
    }

    fn parse_logical_and(&mut self) -> Result<Expression> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::And) {
            let line = self.line();
            self.advance();
            let right = self.parse_equality()?;
            left = Expression::Logical(LogicalExpression {
                operator: LogicalOperator::And,
                left: Box::new(left),
                right: Box::new(right),
                line,
            });
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expression> {
        let mut left = self.parse_comparison()?;

        loop {
            let operator = match &self.current().kind {
                TokenKind::EqualEqual => BinaryOperator::Equal,
                TokenKind::BangEqual => BinaryOperator::NotEqual,
                TokenKind::TripleEqual => BinaryOperator::Identical,
                TokenKind::BangDoubleEqual => BinaryOperator::NotIdentical,
                _ => break,
            };
            left = self.finish_binary(left, operator, Self::parse_comparison)?;
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expression> {
        let mut left = self.parse_concat()?;

        loop {
            let operator = match &self.current().kind {
                TokenKind::Less => BinaryOperator::Less,
                TokenKind::LessEqual => BinaryOperator::LessEqual,
                TokenKind::Greater => BinaryOperator::Greater,
                TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };
            left = self.finish_binary(left, operator, Self::parse_concat)?;
        }

        Ok(left)
    }

    fn parse_concat(&mut self) -> Result<Expression> {
        let left = self.parse_additive()?;

        if self.check(&TokenKind::DoublePipe) {
            return self.finish_binary(left, BinaryOperator::Concat, Self::parse_concat);
        }

        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let operator = match &self.current().kind {
                TokenKind::Plus => BinaryOperator::Add,
                TokenKind::Minus => BinaryOperator::Subtract,
                _ => break,
            };
            left = self.finish_binary(left, operator, Self::parse_multiplicative)?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let operator = match &self.current().kind {
                TokenKind::Star => BinaryOperator::Multiply,
                TokenKind::Slash => BinaryOperator::Divide,
                TokenKind::DoubleSlash => BinaryOperator::IntegerDivide,
                TokenKind::Percent => BinaryOperator::Modulo,
                _ => break,
            };
            left = self.finish_binary(left, operator, Self::parse_unary)?;
        }

        Ok(left)
    }

    /// Consumes the operator token and parses the right operand with `next`.
    fn finish_binary(
        &mut self,
        left: Expression,
        operator: BinaryOperator,
        next: fn(&mut Self) -> Result<Expression>,
    ) -> Result<Expression> {
        let line = self.line();
        self.advance();
        let right = next(self)?;
        Ok(Expression::Binary(BinaryExpression {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            line,
        }))
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let operator = match &self.current().kind {
            TokenKind::Minus => UnaryOperator::Negate,
            TokenKind::Plus => UnaryOperator::Plus,
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Hash => UnaryOperator::Length,
            _ => return self.parse_postfix(),
        };
        let line = self.line();
        self.advance();
        let argument = self.parse_unary()?;

        // Fold `-<number>` so negative constants get their own encodings
        if operator == UnaryOperator::Negate {
            if let Expression::Literal(LiteralExpression { value, .. }) = &argument {
                let folded = match value {
                    Literal::Integer(n) => Some(Literal::Integer(n.wrapping_neg())),
                    Literal::Float(n) => Some(Literal::Float(-n)),
                    _ => None,
                };
                if let Some(value) = folded {
                    return Ok(Expression::Literal(LiteralExpression { value, line }));
                }
            }
        }

        Ok(Expression::Unary(UnaryExpression {
            operator,
            argument: Box::new(argument),
            line,
        }))
    }

    fn parse_postfix(&mut self) -> Result<Expression> {
        let mut expr = self.parse_primary()?;

        loop {
            match &self.current().kind {
                TokenKind::LeftBracket => {
                    let line = self.line();
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    expr = Expression::Index(IndexExpression {
                        object: Box::new(expr),
                        index: Box::new(index),
                        line,
                    });
                }
                TokenKind::Dot => {
                    let line = self.line();
                    self.advance();
                    let method = self.expect_identifier()?.name;
                    let arguments = self.parse_arguments()?;
                    expr = Expression::MethodCall(MethodCallExpression {
                        receiver: Box::new(expr),
                        method,
                        arguments,
                        line,
                    });
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Parses a parenthesised, comma separated argument list.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        self.expect(&TokenKind::LeftParen)?;
        let mut args = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }

        self.expect(&TokenKind::RightParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let line = self.line();
        let value = match &self.current().kind {
            TokenKind::Int(n) => Literal::Integer(*n),
            TokenKind::Float(n) => Literal::Float(*n),
            TokenKind::Bool(b) => Literal::Boolean(*b),
            TokenKind::Str(s) => Literal::String(s.clone()),
            TokenKind::Undef => Literal::Undefined,
            TokenKind::Identifier(name) => {
                let name = name.clone();
                self.advance();
                if self.check(&TokenKind::LeftParen) {
                    let arguments = self.parse_arguments()?;
                    return Ok(Expression::Call(CallExpression {
                        callee: name,
                        arguments,
                        line,
                    }));
                }
                return Ok(Expression::Variable(Identifier { name, line }));
            }
            // `print(...)` in expression position calls the print builtin
            TokenKind::Print if matches!(self.peek_kind(), Some(TokenKind::LeftParen)) => {
                self.advance();
                let arguments = self.parse_arguments()?;
                return Ok(Expression::Call(CallExpression {
                    callee: "print".to_string(),
                    arguments,
                    line,
                }));
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                return Ok(expr);
            }
            TokenKind::LeftBracket => return self.parse_collection_literal(),
            _ => return Err(self.unexpected("expression")),
        };

        self.advance();
        Ok(Expression::Literal(LiteralExpression { value, line }))
    }

    /// Parses `[...]`: a map when the first element is followed by `->`.
    fn parse_collection_literal(&mut self) -> Result<Expression> {
        let line = self.line();
        self.advance(); // consume '['

        if self.check(&TokenKind::RightBracket) {
            self.advance();
            return Ok(Expression::List(ListExpression {
                elements: Vec::new(),
                line,
            }));
        }

        if self.check(&TokenKind::Arrow) {
            self.advance();
            self.expect(&TokenKind::RightBracket)?;
            return Ok(Expression::Map(MapExpression {
                entries: Vec::new(),
                line,
            }));
        }

        let first = self.parse_expression()?;

        if self.check(&TokenKind::Arrow) {
            self.advance();
            let value = self.parse_expression()?;
            let mut entries = vec![(first, value)];
            while self.check(&TokenKind::Comma) {
                self.advance();
                let key = self.parse_expression()?;
                self.expect(&TokenKind::Arrow)?;
                let value = self.parse_expression()?;
                entries.push((key, value));
            }
            self.expect(&TokenKind::RightBracket)?;
            return Ok(Expression::Map(MapExpression { entries, line }));
        }

        let mut elements = vec![first];
        while self.check(&TokenKind::Comma) {
            self.advance();
            elements.push(self.parse_expression()?);
        }
        self.expect(&TokenKind::RightBracket)?;
        Ok(Expression::List(ListExpression { elements, line }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_expr(src: &str) -> Expression {
        let mut parser = Parser::new(tokenize(src).unwrap());
        parser.parse_expression().unwrap()
    }

    fn parse_expr_err(src: &str) -> Error {
        let mut parser = Parser::new(tokenize(src).unwrap());
        parser.parse_program().unwrap_err()
    }

    fn int(expr: &Expression) -> Option<i64> {
        match expr {
            Expression::Literal(LiteralExpression {
                value: Literal::Integer(n),
                ..
            }) => Some(*n),
            _ => None,
        }
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(int(&parse_expr("42")), Some(42));
        assert!(matches!(
            parse_expr("2.5"),
            Expression::Literal(LiteralExpression { value: Literal::Float(n), .. }) if n == 2.5
        ));
        assert!(matches!(
            parse_expr("true"),
            Expression::Literal(LiteralExpression {
                value: Literal::Boolean(true),
                ..
            })
        ));
        assert!(matches!(
            parse_expr("undef"),
            Expression::Literal(LiteralExpression {
                value: Literal::Undefined,
                ..
            })
        ));
        assert!(matches!(
            parse_expr("\"hi\""),
            Expression::Literal(LiteralExpression { value: Literal::String(ref s), .. }) if s == "hi"
        ));
    }

    #[test]
    fn test_parse_precedence() {
        // 1 + 2 * 3 → 1 + (2 * 3)
        let Expression::Binary(add) = parse_expr("1 + 2 * 3") else {
            panic!("expected binary");
        };
        assert_eq!(add.operator, BinaryOperator::Add);
        assert!(matches!(
            *add.right,
            Expression::Binary(BinaryExpression {
                operator: BinaryOperator::Multiply,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_additive_is_left_associative() {
        let Expression::Binary(sub) = parse_expr("10 - 4 - 3") else {
            panic!("expected binary");
        };
        assert_eq!(int(&sub.right), Some(3));
        assert!(matches!(*sub.left, Expression::Binary(_)));
    }

    #[test]
    fn test_parse_concat_is_right_associative() {
        let Expression::Binary(cat) = parse_expr("a || b || c") else {
            panic!("expected binary");
        };
        assert_eq!(cat.operator, BinaryOperator::Concat);
        assert!(matches!(*cat.left, Expression::Variable(_)));
        assert!(matches!(
            *cat.right,
            Expression::Binary(BinaryExpression {
                operator: BinaryOperator::Concat,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_concat_binds_looser_than_additive() {
        let Expression::Binary(cat) = parse_expr("a + 1 || b") else {
            panic!("expected binary");
        };
        assert_eq!(cat.operator, BinaryOperator::Concat);
    }

    #[test]
    fn test_parse_comparison_operators() {
        for (src, op) in [
            ("a < b", BinaryOperator::Less),
            ("a <= b", BinaryOperator::LessEqual),
            ("a > b", BinaryOperator::Greater),
            ("a >= b", BinaryOperator::GreaterEqual),
            ("a == b", BinaryOperator::Equal),
            ("a != b", BinaryOperator::NotEqual),
            ("a === b", BinaryOperator::Identical),
            ("a !== b", BinaryOperator::NotIdentical),
            ("a // b", BinaryOperator::IntegerDivide),
            ("a % b", BinaryOperator::Modulo),
        ] {
            let Expression::Binary(bin) = parse_expr(src) else {
                panic!("expected binary for {}", src);
            };
            assert_eq!(bin.operator, op, "{}", src);
        }
    }

    #[test]
    fn test_parse_logical_operators() {
        let Expression::Logical(or) = parse_expr("a or b and c") else {
            panic!("expected logical");
        };
        assert_eq!(or.operator, LogicalOperator::Or);
        assert!(matches!(
            *or.right,
            Expression::Logical(LogicalExpression {
                operator: LogicalOperator::And,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_ternary() {
        let Expression::Ternary(t) = parse_expr("a ? 1 : b ? 2 : 3") else {
            panic!("expected ternary");
        };
        assert_eq!(int(&t.consequent), Some(1));
        assert!(matches!(*t.alternate, Expression::Ternary(_)));
    }

    #[test]
    fn test_parse_null_coalesce() {
        let Expression::NullCoalesce(nc) = parse_expr("a ?? b ?? 3") else {
            panic!("expected null coalesce");
        };
        assert!(matches!(*nc.left, Expression::Variable(_)));
        assert!(matches!(*nc.right, Expression::NullCoalesce(_)));
    }

    #[test]
    fn test_parse_unary_operators() {
        for (src, op) in [
            ("-x", UnaryOperator::Negate),
            ("+x", UnaryOperator::Plus),
            ("!x", UnaryOperator::Not),
            ("#x", UnaryOperator::Length),
        ] {
            let Expression::Unary(unary) = parse_expr(src) else {
                panic!("expected unary for {}", src);
            };
            assert_eq!(unary.operator, op);
        }
    }

    #[test]
    fn test_negative_literals_fold() {
        assert_eq!(int(&parse_expr("-1")), Some(-1));
        assert_eq!(int(&parse_expr("--7")), Some(7));
        assert!(matches!(
            parse_expr("-0.5"),
            Expression::Literal(LiteralExpression { value: Literal::Float(n), .. }) if n == -0.5
        ));
    }

    #[test]
    fn test_parse_assignment() {
        let Expression::Assignment(assign) = parse_expr("x = y = 1") else {
            panic!("expected assignment");
        };
        assert!(matches!(assign.target, AssignmentTarget::Variable(ref id) if id.name == "x"));
        assert!(matches!(*assign.value, Expression::Assignment(_)));
    }

    #[test]
    fn test_parse_index_assignment() {
        let Expression::Assignment(assign) = parse_expr("xs[0] = 5") else {
            panic!("expected assignment");
        };
        assert!(matches!(assign.target, AssignmentTarget::Index(_)));
    }

    #[test]
    fn test_compound_assignment_desugars() {
        let Expression::Assignment(assign) = parse_expr("x += 2") else {
            panic!("expected assignment");
        };
        let Expression::Binary(bin) = *assign.value else {
            panic!("expected binary value");
        };
        assert_eq!(bin.operator, BinaryOperator::Add);
        assert!(matches!(*bin.left, Expression::Variable(ref id) if id.name == "x"));
        assert_eq!(int(&bin.right), Some(2));
    }

    #[test]
    fn test_coalescing_assignment_desugars() {
        let Expression::Assignment(assign) = parse_expr("m[\"k\"] ??= 0") else {
            panic!("expected assignment");
        };
        let Expression::NullCoalesce(nc) = *assign.value else {
            panic!("expected null coalesce value");
        };
        assert!(matches!(*nc.left, Expression::Index(_)));
    }

    #[test]
    fn test_invalid_assignment_target() {
        assert_eq!(
            parse_expr_err("1 = 2"),
            Error::InvalidAssignmentTarget { line: 1 }
        );
        assert_eq!(
            parse_expr_err("\nf() = 2"),
            Error::InvalidAssignmentTarget { line: 2 }
        );
        assert!(matches!(
            parse_expr_err("a + b = c"),
            Error::InvalidAssignmentTarget { .. }
        ));
    }

    #[test]
    fn test_bitwise_compound_does_not_parse() {
        assert!(matches!(
            parse_expr_err("x &= 1"),
            Error::UnexpectedToken { .. }
        ));
    }

    #[test]
    fn test_parse_call() {
        let Expression::Call(call) = parse_expr("add(2, 3)") else {
            panic!("expected call");
        };
        assert_eq!(call.callee, "add");
        assert_eq!(call.arguments.len(), 2);
    }

    #[test]
    fn test_parse_print_call_in_expression() {
        let Expression::NullCoalesce(nc) = parse_expr("1 ?? print(9)") else {
            panic!("expected null coalesce");
        };
        assert!(matches!(*nc.right, Expression::Call(ref c) if c.callee == "print"));
    }

    #[test]
    fn test_parse_method_call_chain() {
        let Expression::MethodCall(outer) = parse_expr("s.upcase().split(\",\")") else {
            panic!("expected method call");
        };
        assert_eq!(outer.method, "split");
        assert_eq!(outer.arguments.len(), 1);
        assert!(matches!(*outer.receiver, Expression::MethodCall(ref m) if m.method == "upcase"));
    }

    #[test]
    fn test_parse_method_on_integer() {
        let Expression::MethodCall(call) = parse_expr("5.tostr()") else {
            panic!("expected method call");
        };
        assert_eq!(int(&call.receiver), Some(5));
    }

    #[test]
    fn test_parse_index_chain() {
        let Expression::Index(outer) = parse_expr("grid[1][2]") else {
            panic!("expected index");
        };
        assert_eq!(int(&outer.index), Some(2));
        assert!(matches!(*outer.object, Expression::Index(_)));
    }

    #[test]
    fn test_parse_list_literal() {
        let Expression::List(list) = parse_expr("[1, 2, 3]") else {
            panic!("expected list");
        };
        assert_eq!(list.elements.len(), 3);
        assert!(matches!(parse_expr("[]"), Expression::List(ref l) if l.elements.is_empty()));
    }

    #[test]
    fn test_parse_map_literal() {
        let Expression::Map(map) = parse_expr("[\"a\" -> 1, \"b\" -> 2]") else {
            panic!("expected map");
        };
        assert_eq!(map.entries.len(), 2);
        assert!(matches!(parse_expr("[->]"), Expression::Map(ref m) if m.entries.is_empty()));
    }

    #[test]
    fn test_map_entries_need_arrows() {
        assert!(matches!(
            parse_expr_err("[1 -> 2, 3]"),
            Error::UnexpectedToken { ref expected, .. } if expected == "'->'"
        ));
    }

    #[test]
    fn test_parse_parenthesized() {
        let Expression::Binary(mul) = parse_expr("(1 + 2) * 3") else {
            panic!("expected binary");
        };
        assert_eq!(mul.operator, BinaryOperator::Multiply);
        assert!(matches!(*mul.left, Expression::Binary(_)));
    }

    #[test]
    fn test_missing_operand() {
        let err = parse_expr_err("1 +");
        assert_eq!(
            err,
            Error::UnexpectedToken {
                expected: "expression".to_string(),
                found: "end of input".to_string(),
                line: 1,
            }
        );
    }
}
