//! Precedence-climbing expression parser.
//!
//! One function carries a precedence floor and recurses. The table,
//! low to high:
//!
//! | floor | operators |
//! |-------|-----------|
//! | 0 | `=` |
//! | 1 | `&&` `||` |
//! | 2 | `==` `!=` `<` `<=` `>` `>=` |
//! | 3 | `+` `-` |
//! | 4 | `*` `/` `%` |
//! | 5 | `[` indexing |
//! | 6 | unary `*` `&` |
//! | 7 | primaries |
//!
//! Member access (`.`) is handled as a post-primary loop. An expression
//! ends at end-of-input, `;`, `,`, `)`, `{`, `}` or `]`; any other token
//! that is not a binary operator is fatal.

use mica_base::{CompileError, Result};

use crate::ast::{AstKind, BinaryOp, NodeRef, UnaryOp};
use crate::token::TokenKind;

use super::Parser;

const MAX_PRECEDENCE: u8 = 7;

/// How a token continues an expression, if at all.
enum Continuation {
    Op(BinaryOp),
    /// Parentheses never continue a finished subexpression.
    Paren,
}

fn unary_op_of(kind: TokenKind) -> Option<UnaryOp> {
    match kind {
        TokenKind::Star => Some(UnaryOp::Dereference),
        TokenKind::Ampersand => Some(UnaryOp::AddressOf),
        _ => None,
    }
}

fn binary_op_of(kind: TokenKind) -> Option<Continuation> {
    let op = match kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Minus => BinaryOp::Subtract,
        TokenKind::Star => BinaryOp::Multiply,
        TokenKind::Slash => BinaryOp::Divide,
        TokenKind::Percent => BinaryOp::Modulo,

        TokenKind::Less => BinaryOp::LessThan,
        TokenKind::LessEqual => BinaryOp::LessOrEqualThan,
        TokenKind::Greater => BinaryOp::GreaterThan,
        TokenKind::GreaterEqual => BinaryOp::GreaterOrEqualThan,
        TokenKind::DoubleEqual => BinaryOp::Equal,
        TokenKind::BangEqual => BinaryOp::NotEqual,

        TokenKind::DoubleAmpersand => BinaryOp::And,
        TokenKind::DoublePipe => BinaryOp::Or,

        TokenKind::BracketOpen => BinaryOp::ArrayIndex,
        TokenKind::Equals => BinaryOp::Assign,

        TokenKind::ParenOpen | TokenKind::ParenClose => return Some(Continuation::Paren),
        _ => return None,
    };
    Some(Continuation::Op(op))
}

fn precedence(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Assign => 0,
        BinaryOp::And | BinaryOp::Or => 1,
        BinaryOp::LessThan
        | BinaryOp::LessOrEqualThan
        | BinaryOp::GreaterThan
        | BinaryOp::GreaterOrEqualThan
        | BinaryOp::Equal
        | BinaryOp::NotEqual => 2,
        BinaryOp::Add | BinaryOp::Subtract => 3,
        BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Modulo => 4,
        BinaryOp::ArrayIndex => 5,
    }
}

/// Tokens that terminate an expression.
fn is_terminator(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eof
            | TokenKind::Semicolon
            | TokenKind::Comma
            | TokenKind::ParenClose
            | TokenKind::CurlyOpen
            | TokenKind::CurlyClose
            | TokenKind::BracketClose
    )
}

impl<'a, 't> Parser<'a, 't> {
    /// Parses one full expression.
    pub(super) fn parse_expression(&mut self) -> Result<NodeRef> {
        self.parse_expression_prec(0)
    }

    fn parse_expression_prec(&mut self, prec: u8) -> Result<NodeRef> {
        // Unary ops bind at their own precedence level.
        let peeked = self.peek();
        if let Some(op) = unary_op_of(peeked.kind) {
            if prec == 6 {
                self.eat();
                let operand = self.parse_expression_prec(prec)?;
                return Ok(self.ast.alloc(AstKind::Unary { op, operand }, peeked.pos));
            }
        }

        if prec > MAX_PRECEDENCE {
            return self.parse_primary();
        }

        let mut lhs = self.parse_expression_prec(prec + 1)?;
        let token = self.peek();

        if is_terminator(token.kind) {
            return Ok(lhs);
        }

        let op = match binary_op_of(token.kind) {
            Some(Continuation::Op(op)) => op,
            Some(Continuation::Paren) => return Ok(lhs),
            None => {
                return Err(CompileError::parse(
                    format!("unknown binary operator '{}'", token.kind.describe()),
                    token.pos,
                ));
            }
        };

        if precedence(op) == prec {
            self.eat();

            if op == BinaryOp::ArrayIndex {
                // The expression in brackets is parsed as its own thing;
                // chained brackets nest to the left: a[i][j] is
                // index(index(a, i), j).
                let mut rhs = self.parse_expression_prec(0)?;
                self.eat_expect(TokenKind::BracketClose)?;

                while self.eat_if(TokenKind::BracketOpen) {
                    let next = self.parse_expression_prec(0)?;
                    self.eat_expect(TokenKind::BracketClose)?;
                    lhs = self.ast.alloc(
                        AstKind::Binary { op: BinaryOp::ArrayIndex, left: lhs, right: rhs },
                        token.pos,
                    );
                    rhs = next;
                }

                return Ok(self.ast.alloc(
                    AstKind::Binary { op: BinaryOp::ArrayIndex, left: lhs, right: rhs },
                    token.pos,
                ));
            }

            let rhs = self.parse_expression_prec(prec)?;
            return Ok(self.ast.alloc(AstKind::Binary { op, left: lhs, right: rhs }, token.pos));
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<NodeRef> {
        let token = self.eat();

        let mut ast = match token.kind {
            TokenKind::Bool(value) => self.ast.alloc(AstKind::BoolLiteral(value), token.pos),
            TokenKind::Char(value) => self.ast.alloc(AstKind::CharLiteral(value), token.pos),
            TokenKind::Int(value) => self.ast.alloc(AstKind::IntLiteral(value), token.pos),
            TokenKind::Float(value) => self.ast.alloc(AstKind::FloatLiteral(value), token.pos),
            TokenKind::Str(sym) => self.ast.alloc(AstKind::StrLiteral(sym), token.pos),

            TokenKind::Minus => {
                let operand = self.parse_expression_prec(0)?;
                self.ast.alloc(
                    AstKind::Unary { op: UnaryOp::Negate, operand },
                    token.pos,
                )
            }

            TokenKind::Ident(sym) => {
                let peeked = self.peek();
                if peeked.kind == TokenKind::ParenOpen {
                    self.parse_function_call(sym, token.pos)?
                } else if peeked.kind == TokenKind::CurlyOpen {
                    self.parse_struct_initializer(sym, token.pos)?
                } else if peeked.kind == TokenKind::Less && self.interner.matches(sym, "cast") {
                    self.parse_cast(token.pos)?
                } else {
                    self.ast.alloc(AstKind::GetVariable { name: sym }, token.pos)
                }
            }

            TokenKind::BracketOpen => self.parse_array_initializer(token.pos)?,

            TokenKind::ParenOpen => {
                let inner = self.parse_expression_prec(0)?;
                let closing = self.eat();
                if closing.kind != TokenKind::ParenClose {
                    return Err(CompileError::parse("not closed", token.pos));
                }
                inner
            }

            other => {
                return Err(CompileError::parse(
                    format!("unexpected token '{}'", other.describe()),
                    token.pos,
                ));
            }
        };

        // Member access binds tighter than any operator.
        while self.eat_if(TokenKind::Dot) {
            let (member, _) = self.expect_ident()?;
            ast = self.ast.alloc(AstKind::GetMember { expr: ast, member }, token.pos);
        }

        Ok(ast)
    }

    /// `<callee>(<expr>, <expr>, ...)` — the callee identifier is already
    /// consumed.
    fn parse_function_call(
        &mut self,
        name: mica_base::Symbol,
        pos: mica_base::FilePos,
    ) -> Result<NodeRef> {
        self.eat_expect(TokenKind::ParenOpen)?;

        let mut args = Vec::new();
        while !self.eat_if(TokenKind::ParenClose) {
            args.push(self.parse_expression_prec(0)?);

            let token = self.eat();
            match token.kind {
                TokenKind::ParenClose => break,
                TokenKind::Comma => {
                    if self.peek().kind == TokenKind::ParenClose {
                        return Err(CompileError::parse(
                            "trailing commas not allowed in function calls",
                            token.pos,
                        ));
                    }
                }
                TokenKind::Eof => {
                    return Err(CompileError::parse(
                        "expected a ')' to close a function call",
                        token.pos,
                    ));
                }
                other => {
                    return Err(CompileError::parse(
                        format!("unexpected token '{}'", other.describe()),
                        token.pos,
                    ));
                }
            }
        }

        Ok(self
            .ast
            .alloc(AstKind::Call { name, args, variadic_boundary: None }, pos))
    }

    /// `<Type> { <field>: <expr>, ... }` (trailing comma allowed) — the
    /// type identifier is already consumed.
    fn parse_struct_initializer(
        &mut self,
        name: mica_base::Symbol,
        pos: mica_base::FilePos,
    ) -> Result<NodeRef> {
        self.eat_expect(TokenKind::CurlyOpen)?;

        let mut fields = Vec::new();
        while !self.eat_if(TokenKind::CurlyClose) {
            let (field, field_pos) = self.expect_ident()?;
            self.eat_expect(TokenKind::Colon)?;
            let expr = self.parse_expression_prec(0)?;
            fields.push(self.ast.alloc(AstKind::FieldInit { name: field, expr }, field_pos));

            let token = self.eat();
            match token.kind {
                TokenKind::CurlyClose => break,
                TokenKind::Comma => continue,
                TokenKind::Eof => {
                    return Err(CompileError::parse(
                        "expected a '}' to close a struct initializer",
                        token.pos,
                    ));
                }
                other => {
                    return Err(CompileError::parse(
                        format!("unexpected token '{}'", other.describe()),
                        token.pos,
                    ));
                }
            }
        }

        Ok(self.ast.alloc(AstKind::StructInit { name, fields }, pos))
    }

    /// `[<expr>, <expr>, ...]` (trailing comma allowed) — the opening
    /// bracket is already consumed.
    fn parse_array_initializer(&mut self, pos: mica_base::FilePos) -> Result<NodeRef> {
        let mut exprs = Vec::new();
        while !self.eat_if(TokenKind::BracketClose) {
            exprs.push(self.parse_expression_prec(0)?);

            let token = self.eat();
            match token.kind {
                TokenKind::BracketClose => break,
                TokenKind::Comma => continue,
                TokenKind::Eof => {
                    return Err(CompileError::parse(
                        "expected a ']' to close an array initializer",
                        token.pos,
                    ));
                }
                other => {
                    return Err(CompileError::parse(
                        format!("unexpected token '{}'", other.describe()),
                        token.pos,
                    ));
                }
            }
        }

        Ok(self.ast.alloc(AstKind::ArrayInit { exprs }, pos))
    }

    /// `cast<<type>>(<expr>)` — the `cast` identifier is already consumed.
    fn parse_cast(&mut self, pos: mica_base::FilePos) -> Result<NodeRef> {
        self.eat_expect(TokenKind::Less)?;
        let target = self.parse_datatype()?;
        self.eat_expect(TokenKind::Greater)?;
        self.eat_expect(TokenKind::ParenOpen)?;
        let expr = self.parse_expression_prec(0)?;
        self.eat_expect(TokenKind::ParenClose)?;
        Ok(self.ast.alloc(AstKind::Cast { target, expr }, pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstArena, DataType};
    use crate::lexer::Lexer;
    use mica_base::{Arena, Interner};

    struct Parsed<'t> {
        ast: AstArena<'t>,
        interner: Interner,
    }

    /// Parses `source` as the body of a void function and returns the
    /// first statement.
    fn parse_stmt<'t>(types: &'t Arena<DataType<'t>>, source: &str) -> (Parsed<'t>, NodeRef) {
        let full = format!("fn test_fn() -> void {{ {} }}", source);
        let mut interner = Interner::new();
        let tokens = Lexer::new(&full, &mut interner).lex().unwrap();
        let mut ast = AstArena::new();
        let root = Parser::new(&tokens, &mut ast, types, &interner)
            .parse()
            .unwrap();
        let decls = match &ast.node(root).kind {
            AstKind::TranslationUnit { body } => body.clone(),
            _ => unreachable!(),
        };
        let stmt = match &ast.node(decls[0]).kind {
            AstKind::FunctionDecl { body, .. } => body[0],
            _ => unreachable!(),
        };
        (Parsed { ast, interner }, stmt)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = 1 + 2 * 3;");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(
                    p.ast.node(*right).kind,
                    AstKind::Binary { op: BinaryOp::Multiply, .. }
                ));
            }
            other => panic!("expected add at the top, got {}", other.name()),
        }
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = 1 + 2 == 3;");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        assert!(matches!(
            p.ast.node(rhs).kind,
            AstKind::Binary { op: BinaryOp::Equal, .. }
        ));
    }

    #[test]
    fn parenthesised_expression_overrides_precedence() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = (1 + 2) * 3;");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::Binary { op: BinaryOp::Multiply, left, .. } => {
                assert!(matches!(
                    p.ast.node(*left).kind,
                    AstKind::Binary { op: BinaryOp::Add, .. }
                ));
            }
            other => panic!("expected multiply at the top, got {}", other.name()),
        }
    }

    #[test]
    fn call_with_arguments_parses() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "printf(fmt, 1, 2);");
        match &p.ast.node(stmt).kind {
            AstKind::Call { name, args, variadic_boundary } => {
                assert_eq!(p.interner.resolve(*name), "printf");
                assert_eq!(args.len(), 3);
                assert!(variadic_boundary.is_none());
            }
            other => panic!("expected call, got {}", other.name()),
        }
    }

    #[test]
    fn member_access_chains() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = a.b.c;");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::GetMember { expr, member } => {
                assert_eq!(p.interner.resolve(*member), "c");
                assert!(matches!(p.ast.node(*expr).kind, AstKind::GetMember { .. }));
            }
            other => panic!("expected member access, got {}", other.name()),
        }
    }

    #[test]
    fn struct_initializer_parses_fields() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "p = P { x: 3, y: 4 };");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::StructInit { name, fields } => {
                assert_eq!(p.interner.resolve(*name), "P");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected struct initializer, got {}", other.name()),
        }
    }

    #[test]
    fn array_initializer_parses_elements() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = [1, 2, 3];");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::ArrayInit { exprs } => assert_eq!(exprs.len(), 3),
            other => panic!("expected array initializer, got {}", other.name()),
        }
    }

    #[test]
    fn cast_parses_target_type_and_inner_expression() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = cast<i64>(y);");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::Cast { target, expr } => {
                assert_eq!(target.display(&p.interner), "i64");
                assert!(matches!(p.ast.node(*expr).kind, AstKind::GetVariable { .. }));
            }
            other => panic!("expected cast, got {}", other.name()),
        }
    }

    #[test]
    fn cast_to_pointer_type_parses() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = cast<u8*>(y);");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::Cast { target, .. } => {
                assert_eq!(target.display(&p.interner), "u8*");
            }
            _ => panic!("expected cast"),
        }
    }

    #[test]
    fn identifier_named_cast_without_angle_is_a_variable() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = cast;");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        assert!(matches!(p.ast.node(rhs).kind, AstKind::GetVariable { .. }));
    }

    #[test]
    fn unary_deref_and_address_of_parse() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = &y;");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        match &p.ast.node(rhs).kind {
            AstKind::Unary { op: crate::ast::UnaryOp::AddressOf, .. } => {}
            other => panic!("expected address-of, got {}", other.name()),
        }
    }

    #[test]
    fn leading_minus_is_a_negate() {
        let types = Arena::new();
        let (p, stmt) = parse_stmt(&types, "x = -y;");
        let rhs = match &p.ast.node(stmt).kind {
            AstKind::Binary { op: BinaryOp::Assign, right, .. } => *right,
            _ => panic!("expected assignment"),
        };
        assert!(matches!(
            p.ast.node(rhs).kind,
            AstKind::Unary { op: crate::ast::UnaryOp::Negate, .. }
        ));
    }

    #[test]
    fn unexpected_token_in_expression_is_fatal() {
        let full = "fn test_fn() -> void { x = 1 ~ 2; }";
        let types: Arena<DataType> = Arena::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new(full, &mut interner).lex().unwrap();
        let mut ast = AstArena::new();
        let err = Parser::new(&tokens, &mut ast, &types, &interner)
            .parse()
            .unwrap_err();
        assert!(err.message.contains("unknown binary operator"));
    }
}
