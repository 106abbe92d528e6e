//! Command-line surface of `micac`.
//!
//! Argument parsing is built on [`clap`] with derive macros. One or
//! more positional input files are compiled in order; the flags tweak
//! what the pipeline prints and how the executable is linked.
//!
//! # Examples
//!
//! ```bash
//! # Compile a file to ./output.o
//! micac demo.mica
//!
//! # Pick the executable name and enable constant folding
//! micac demo.mica -o demo --fold-constants
//!
//! # Inspect the front end
//! micac demo.mica --print-tokens --print-ast
//! ```

use clap::Parser;
use std::path::PathBuf;

/// Default executable path when `-o` is not given.
pub fn default_output() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("./output.exe")
    } else {
        PathBuf::from("./output.o")
    }
}

/// The mica compiler.
#[derive(Parser, Debug)]
#[command(name = "micac")]
#[command(about = "Compiler for the mica language", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Source files to compile.
    pub inputs: Vec<PathBuf>,

    /// Output executable path.
    #[arg(short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print a string and exit (for CLI debugging).
    #[arg(long, short = 'e', value_name = "STRING")]
    pub echo: Option<String>,

    /// Dump tokens before parsing.
    #[arg(long)]
    pub print_tokens: bool,

    /// Dump the AST after analysis.
    #[arg(long)]
    pub print_ast: bool,

    /// Fold literal-only expressions before IR generation.
    #[arg(long)]
    pub fold_constants: bool,

    /// Extra flags appended verbatim to the C compiler invocation.
    #[arg(long = "CFLAGS", value_name = "STRING")]
    pub cflags: Option<String>,
}

impl Cli {
    /// The executable path, defaulted per platform.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(default_output)
    }
}
