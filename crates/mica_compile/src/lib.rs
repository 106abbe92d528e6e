//! # mica-compile
//!
//! Back half of the mica compiler: semantic analysis, constant folding
//! and QBE IR generation, stitched together by [`compile::compile_to_ir`].
//!
//! The crate consumes the syntax graph built by `mica-language` and
//! produces textual IR for the QBE assembler. It owns no I/O — reading
//! source files and invoking downstream tools is the CLI's job.
//!
//! # Example
//!
//! ```
//! use mica_compile::{compile_to_ir, CompileOptions};
//!
//! let ir = compile_to_ir(
//!     "fn main() -> i32 { return 0; }",
//!     &CompileOptions::default(),
//! )
//! .unwrap();
//!
//! assert!(ir.contains("export function w $main()"));
//! ```

pub mod analysis;
pub mod codegen;
pub mod compile;
pub mod optimize;

pub use compile::{compile_to_ir, CompileOptions};
