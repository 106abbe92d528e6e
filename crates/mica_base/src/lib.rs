//! # mica-base
//!
//! Pure structural atoms for the mica compiler.
//!
//! This crate provides the foundational types every other mica crate builds
//! upon:
//!
//! - [`Arena`] — Bump allocation for compilation-lifetime references
//! - [`Interner`]/[`Symbol`] — String interning for O(1) name equality
//! - [`FilePos`] — Source position tracking (line, column, span length)
//! - [`CompileError`]/[`Result`] — Positioned, non-recoverable errors
//! - [`Tint`] — Role-keyed ANSI styling for terminal diagnostics
//!
//! # Design Principles
//!
//! This crate has **no knowledge of mica syntax or I/O**. It provides only
//! generic, reusable infrastructure that the lexer, parser, analyzer and
//! code generator share.
//!
//! # Example
//!
//! ```
//! use mica_base::{Arena, Interner, FilePos};
//!
//! let arena: Arena<u64> = Arena::new();
//! let mut interner = Interner::new();
//!
//! let name = interner.intern("main");
//! let pos = FilePos::new(1, 1);
//!
//! let allocated = arena.alloc(42);
//! assert_eq!(*allocated, 42);
//! assert_eq!(interner.resolve(name), "main");
//! assert_eq!(pos.line, 1);
//! ```

pub mod arena;
pub mod error;
pub mod intern;
pub mod pos;
pub mod style;

pub use arena::Arena;
pub use error::{CompileError, ErrorKind, Result};
pub use intern::{Interner, Symbol};
pub use pos::FilePos;
pub use style::Tint;
