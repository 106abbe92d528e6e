//! Recursive-descent parser for mica.
//!
//! Statements and declarations are parsed by recursive descent;
//! expressions go through the precedence-climbing function in
//! [`expr`]. The parser consumes the flat token sequence through a
//! small cursor API (`peek`, `eat`, `eat_expect`, `eat_if`, `uneat`)
//! and allocates AST nodes bottom-up into the [`AstArena`].
//!
//! Grammar notes:
//!
//! - Types are an identifier followed by postfix modifiers: `*` wraps a
//!   pointer, `[N]` wraps an array, so `i32*[2]` is an array of two
//!   pointers to `i32`.
//! - Global scope accepts only imports, variable declarations, extern
//!   function declarations, function declarations and struct
//!   declarations.
//! - A parameter list may end in `...`, making the function variadic;
//!   nothing may follow the ellipsis, and trailing commas are rejected
//!   in declarations and calls (struct declarations and initialiser
//!   lists allow them).

mod expr;

use mica_base::{Arena, CompileError, FilePos, Interner, Result, Symbol};

use crate::ast::{AstArena, AstKind, DataType, NodeRef, Range};
use crate::token::{Token, TokenKind};

/// Token-cursor parser producing the translation unit.
pub struct Parser<'a, 't> {
    tokens: &'a [Token],
    index: usize,
    ast: &'a mut AstArena<'t>,
    types: &'t Arena<DataType<'t>>,
    interner: &'a Interner,
}

impl<'a, 't> Parser<'a, 't> {
    pub fn new(
        tokens: &'a [Token],
        ast: &'a mut AstArena<'t>,
        types: &'t Arena<DataType<'t>>,
        interner: &'a Interner,
    ) -> Self {
        debug_assert!(
            matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof),
            "token sequence must end with Eof"
        );
        Parser { tokens, index: 0, ast, types, interner }
    }

    /// Parses the whole token sequence into a translation unit.
    pub fn parse(mut self) -> Result<NodeRef> {
        let body = self.parse_global_scope()?;
        Ok(self.ast.alloc(AstKind::TranslationUnit { body }, FilePos::new(1, 1)))
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    fn peek(&self) -> Token {
        self.peek_by(0)
    }

    fn peek_by(&self, offset: isize) -> Token {
        let idx = self.index as isize + offset;
        if idx < 0 {
            return Token::eof(FilePos::new(1, 1));
        }
        let idx = (idx as usize).min(self.tokens.len() - 1);
        self.tokens[idx]
    }

    fn peek_behind(&self) -> Token {
        self.peek_by(-1)
    }

    fn eat(&mut self) -> Token {
        let token = self.tokens[self.index.min(self.tokens.len() - 1)];
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    /// Single-token unread.
    fn uneat(&mut self) {
        self.index = self.index.saturating_sub(1);
    }

    fn eat_expect(&mut self, expect: TokenKind) -> Result<Token> {
        let token = self.eat();
        if token.kind != expect {
            return Err(CompileError::parse(
                format!(
                    "expected '{}' got '{}' instead",
                    expect.describe(),
                    token.kind.describe()
                ),
                token.pos,
            ));
        }
        Ok(token)
    }

    fn eat_if(&mut self, expect: TokenKind) -> bool {
        if self.peek().kind == expect {
            self.eat();
            return true;
        }
        false
    }

    fn expect_ident(&mut self) -> Result<(Symbol, FilePos)> {
        let token = self.eat();
        match token.kind {
            TokenKind::Ident(sym) => Ok((sym, token.pos)),
            other => Err(CompileError::parse(
                format!("expected '<identifier>' got '{}' instead", other.describe()),
                token.pos,
            )),
        }
    }

    fn expect_int(&mut self) -> Result<(i64, FilePos)> {
        let token = self.eat();
        match token.kind {
            TokenKind::Int(value) => Ok((value, token.pos)),
            other => Err(CompileError::parse(
                format!("expected '<const int>' got '{}' instead", other.describe()),
                token.pos,
            )),
        }
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// `type := IDENT modifier*` with `modifier := '*' | '[' INT ']'`.
    ///
    /// The identifier is the innermost leaf; each modifier wraps what came
    /// before it.
    fn parse_datatype(&mut self) -> Result<&'t DataType<'t>> {
        let (typename, _) = self.expect_ident()?;
        let mut ty: &'t DataType<'t> = self.types.alloc(DataType::Primitive(typename));

        loop {
            if self.eat_if(TokenKind::Star) {
                ty = self.types.alloc(DataType::Pointer(ty));
            } else if self.eat_if(TokenKind::BracketOpen) {
                let (len, pos) = self.expect_int()?;
                if len < 0 {
                    return Err(CompileError::parse("array length must be non-negative", pos));
                }
                self.eat_expect(TokenKind::BracketClose)?;
                ty = self.types.alloc(DataType::Array { elem: ty, len: len as usize });
            } else {
                break;
            }
        }
        Ok(ty)
    }

    // ------------------------------------------------------------------
    // Global scope
    // ------------------------------------------------------------------

    fn parse_global_scope(&mut self) -> Result<Vec<NodeRef>> {
        let mut global = Vec::new();

        loop {
            let token = self.eat();
            match token.kind {
                TokenKind::Eof => break,
                TokenKind::Import => global.push(self.parse_import()?),
                TokenKind::Let => global.push(self.parse_variable_declaration()?),
                TokenKind::Extern => global.push(self.parse_extern_function_declaration()?),
                TokenKind::Fn => global.push(self.parse_function_declaration()?),
                TokenKind::Struct => global.push(self.parse_struct_declaration()?),

                TokenKind::Ident(_) | TokenKind::While | TokenKind::If => {
                    return Err(CompileError::parse(
                        format!("'{}' not allowed in global scope", token.kind.describe()),
                        token.pos,
                    ));
                }
                other => {
                    return Err(CompileError::parse(
                        format!("unhandled token '{}'", other.describe()),
                        token.pos,
                    ));
                }
            }
        }

        Ok(global)
    }

    /// `import "path";`
    fn parse_import(&mut self) -> Result<NodeRef> {
        let pos = self.peek_behind().pos;
        let token = self.eat();
        let path = match token.kind {
            TokenKind::Str(sym) => sym,
            other => {
                return Err(CompileError::parse(
                    format!("expected '<const string>' got '{}' instead", other.describe()),
                    token.pos,
                ));
            }
        };
        self.eat_expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(AstKind::Import { path }, pos))
    }

    /// `let <name>: <type> = <expr>;`
    fn parse_variable_declaration(&mut self) -> Result<NodeRef> {
        let (name, pos) = self.expect_ident()?;
        self.eat_expect(TokenKind::Colon)?;
        let ty = self.parse_datatype()?;
        self.eat_expect(TokenKind::Equals)?;
        let init = self.parse_expression()?;
        self.eat_expect(TokenKind::Semicolon)?;

        Ok(self.ast.alloc(
            AstKind::VariableDecl { name, ty, init: Some(init) },
            pos,
        ))
    }

    /// Parameter list after `(`: `<name>: <type>` separated by commas,
    /// optionally terminated by `...`; trailing commas are rejected.
    fn parse_function_parameters(&mut self) -> Result<Vec<NodeRef>> {
        let mut params = Vec::new();

        while !self.eat_if(TokenKind::ParenClose) {
            if self.eat_if(TokenKind::TripleDot) {
                let pos = self.peek_behind().pos;
                let variadic = self.types.alloc(DataType::Variadic);
                params.push(self.ast.alloc(
                    AstKind::VariableDecl { name: Symbol::EMPTY, ty: variadic, init: None },
                    pos,
                ));
                if !self.eat_if(TokenKind::ParenClose) {
                    return Err(CompileError::parse(
                        "there can not be any parameters after the '...'",
                        self.peek().pos,
                    ));
                }
                break;
            }

            let (name, pos) = self.expect_ident()?;
            self.eat_expect(TokenKind::Colon)?;
            let ty = self.parse_datatype()?;
            params.push(self.ast.alloc(AstKind::VariableDecl { name, ty, init: None }, pos));

            let token = self.eat();
            match token.kind {
                TokenKind::ParenClose => break,
                TokenKind::Comma => {
                    if self.peek().kind == TokenKind::ParenClose {
                        return Err(CompileError::parse(
                            "trailing commas not allowed in function declarations",
                            token.pos,
                        ));
                    }
                }
                TokenKind::Eof => {
                    return Err(CompileError::parse(
                        "expected a ')' to close a function declaration",
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

        Ok(params)
    }

    /// `extern fn <name>(<params>) -> <type>;`
    fn parse_extern_function_declaration(&mut self) -> Result<NodeRef> {
        self.eat_expect(TokenKind::Fn)?;
        let (name, pos) = self.expect_ident()?;
        self.eat_expect(TokenKind::ParenOpen)?;
        let params = self.parse_function_parameters()?;
        self.eat_expect(TokenKind::Arrow)?;
        let return_type = self.parse_datatype()?;
        self.eat_expect(TokenKind::Semicolon)?;

        Ok(self.ast.alloc(
            AstKind::FunctionDecl {
                name,
                params,
                return_type,
                body: Vec::new(),
                external: true,
            },
            pos,
        ))
    }

    /// `fn <name>(<params>) -> <type> { <body> }`
    fn parse_function_declaration(&mut self) -> Result<NodeRef> {
        let (name, pos) = self.expect_ident()?;
        self.eat_expect(TokenKind::ParenOpen)?;
        let params = self.parse_function_parameters()?;
        self.eat_expect(TokenKind::Arrow)?;
        let return_type = self.parse_datatype()?;
        let body = self.parse_body()?;

        Ok(self.ast.alloc(
            AstKind::FunctionDecl {
                name,
                params,
                return_type,
                body,
                external: false,
            },
            pos,
        ))
    }

    /// `struct <name> { <member>: <type>, ... }` (trailing comma allowed)
    fn parse_struct_declaration(&mut self) -> Result<NodeRef> {
        let (name, pos) = self.expect_ident()?;
        self.eat_expect(TokenKind::CurlyOpen)?;

        let mut members = Vec::new();
        while !self.eat_if(TokenKind::CurlyClose) {
            let (member, member_pos) = self.expect_ident()?;
            self.eat_expect(TokenKind::Colon)?;
            let ty = self.parse_datatype()?;
            members.push(self.ast.alloc(
                AstKind::VariableDecl { name: member, ty, init: None },
                member_pos,
            ));

            let token = self.eat();
            match token.kind {
                TokenKind::CurlyClose => break,
                TokenKind::Comma => continue,
                TokenKind::Eof => {
                    return Err(CompileError::parse(
                        "expected a '}' to close a struct declaration",
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

        Ok(self.ast.alloc(AstKind::StructDecl { name, members }, pos))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// `{ statement* }`
    fn parse_body(&mut self) -> Result<Vec<NodeRef>> {
        self.eat_expect(TokenKind::CurlyOpen)?;

        let mut body = Vec::new();
        loop {
            let token = self.eat();
            match token.kind {
                TokenKind::CurlyClose => break,

                TokenKind::If => body.push(self.parse_if_statement()?),
                TokenKind::Let => body.push(self.parse_variable_declaration()?),
                TokenKind::Return => body.push(self.parse_return_statement()?),
                TokenKind::For => body.push(self.parse_for_loop()?),
                TokenKind::While => body.push(self.parse_while_loop()?),

                TokenKind::Ident(_) => {
                    // Expressions which start with an identifier.
                    self.uneat();
                    let expr = self.parse_expression()?;
                    self.eat_expect(TokenKind::Semicolon)?;
                    body.push(expr);
                }

                TokenKind::Continue => {
                    self.eat_expect(TokenKind::Semicolon)?;
                    body.push(self.ast.alloc(AstKind::Continue, token.pos));
                }
                TokenKind::Break => {
                    self.eat_expect(TokenKind::Semicolon)?;
                    body.push(self.ast.alloc(AstKind::Break, token.pos));
                }

                TokenKind::Fn | TokenKind::Import => {
                    return Err(CompileError::parse(
                        format!("'{}' is only allowed in global scope", token.kind.describe()),
                        token.pos,
                    ));
                }
                TokenKind::Eof => {
                    return Err(CompileError::parse("body not closed, add '}'", token.pos));
                }
                other => {
                    return Err(CompileError::parse(
                        format!("unhandled token '{}'", other.describe()),
                        token.pos,
                    ));
                }
            }
        }
        Ok(body)
    }

    /// `if <expr> { <body> } [else [if ...] { <body> }]`
    fn parse_if_statement(&mut self) -> Result<NodeRef> {
        let pos = self.peek_behind().pos;
        let cond = self.parse_expression()?;
        let body = self.parse_body()?;
        let mut else_body = Vec::new();

        if self.eat_if(TokenKind::Else) {
            if self.eat_if(TokenKind::If) {
                else_body.push(self.parse_if_statement()?);
            } else {
                else_body = self.parse_body()?;
            }
        }

        Ok(self.ast.alloc(AstKind::If { cond, body, else_body }, pos))
    }

    /// `while <expr> { <body> }`
    fn parse_while_loop(&mut self) -> Result<NodeRef> {
        let pos = self.peek_behind().pos;
        let cond = self.parse_expression()?;
        let body = self.parse_body()?;
        Ok(self.ast.alloc(AstKind::While { cond, body }, pos))
    }

    /// `for <ident> in <int>..<int> { <body> }`
    fn parse_for_loop(&mut self) -> Result<NodeRef> {
        let pos = self.peek_behind().pos;
        let (ident, _) = self.expect_ident()?;
        self.eat_expect(TokenKind::In)?;
        let range = self.parse_range()?;
        let body = self.parse_body()?;
        Ok(self.ast.alloc(AstKind::For { ident, range, body }, pos))
    }

    /// Range iterator syntax: `<int>..<int>`.
    fn parse_range(&mut self) -> Result<Range> {
        let (from, _) = self.expect_int()?;
        self.eat_expect(TokenKind::DoubleDot)?;
        let (to, _) = self.expect_int()?;
        Ok(Range { from, to, step: 1, reverse: false })
    }

    /// `return [<expr>];`
    fn parse_return_statement(&mut self) -> Result<NodeRef> {
        let pos = self.peek_behind().pos;
        if self.eat_if(TokenKind::Semicolon) {
            return Ok(self.ast.alloc(AstKind::Return { expr: None }, pos));
        }
        let expr = self.parse_expression()?;
        self.eat_expect(TokenKind::Semicolon)?;
        Ok(self.ast.alloc(AstKind::Return { expr: Some(expr) }, pos))
    }
}
