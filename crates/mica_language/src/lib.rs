//! # mica-language
//!
//! Front-end of the mica compiler: tokens, lexer, AST and parser.
//!
//! The crate turns source text into a typed-but-not-yet-analyzed syntax
//! graph:
//!
//! ```text
//! source text
//!      │
//!      ▼
//! ┌───────────┐   flat token sequence    ┌───────────┐
//! │  Lexer    │ ───────────────────────▶ │  Parser   │
//! └───────────┘                          └─────┬─────┘
//!                                              ▼
//!                                    AstArena + NodeRef graph
//! ```
//!
//! Semantic analysis, optimisation and IR generation live in
//! `mica-compile`; this crate stops at a structurally valid tree.
//!
//! # Example
//!
//! ```
//! use mica_base::{Arena, Interner};
//! use mica_language::{ast::AstArena, Lexer, Parser};
//!
//! let mut interner = Interner::new();
//! let tokens = Lexer::new("fn main() -> i32 { return 0; }", &mut interner)
//!     .lex()
//!     .unwrap();
//!
//! let types = Arena::new();
//! let mut ast = AstArena::new();
//! let root = Parser::new(&tokens, &mut ast, &types, &interner)
//!     .parse()
//!     .unwrap();
//!
//! assert!(ast.node(root).resolved.is_none()); // analysis happens later
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::{AstArena, AstKind, AstNode, BinaryOp, DataType, NodeRef, Range, UnaryOp};
pub use lexer::Lexer;
pub use parser::Parser;
pub use token::{Token, TokenKind};
