//! # mica-cli
//!
//! Library half of the `micac` binary. All command logic lives here so
//! the argument surface and the driver can be tested; `main.rs` is a
//! thin wrapper.
//!
//! # Exit Codes
//!
//! - `0` — success (including `--help`, `--version` and `--echo`)
//! - `1` — any fatal error: I/O, lex, parse, semantic, downstream tool

use std::time::Instant;

pub mod cli;
pub mod compile;

pub use cli::Cli;

use clap::Parser;

/// Parses the process arguments and runs the compiler.
///
/// Returns the process exit code. Diagnostics are written to standard
/// output; only usage errors from the argument parser go to stderr.
pub fn run_cli() -> i32 {
    let cli = Cli::parse();

    if let Some(message) = &cli.echo {
        println!("{}", message);
        return 0;
    }

    if cli.inputs.is_empty() {
        println!("error: no input files");
        return 1;
    }

    let started = Instant::now();
    let mut code = 0;
    for path in &cli.inputs {
        if let Err(err) = compile::compile_file(path, &cli) {
            // Positioned errors were already rendered against the
            // source; bare I/O errors still need a line.
            if err.kind == mica_base::ErrorKind::Io {
                println!("{}", err);
            }
            code = 1;
            break;
        }
    }
    log::info!("compilation took {:.2?}", started.elapsed());

    code
}
