//! Per-file compilation driver.
//!
//! Reads a source file, runs the pipeline, writes the textual IR to
//! `output.ssa`, then hands off to the downstream tools: `qbe` turns
//! the IR into assembly and the C compiler links the executable (with
//! any `--CFLAGS` appended). Diagnostics render against the source and
//! go to standard output.

use std::fs;
use std::path::Path;
use std::process::Command;

use mica_base::{CompileError, Result};
use mica_compile::{compile_to_ir, CompileOptions};

use crate::cli::Cli;

const IR_FILE: &str = "output.ssa";
const ASM_FILE: &str = "output.s";

/// Compiles one input file and links the executable.
///
/// On a compile error the rendered diagnostic is printed to stdout and
/// the error is returned for the exit code.
pub fn compile_file(path: &Path, cli: &Cli) -> Result<()> {
    let display = path.display().to_string();
    let source = fs::read_to_string(path)
        .map_err(|e| CompileError::io(format!("could not read '{}': {}", display, e)))?;

    let options = CompileOptions {
        fold_constants: cli.fold_constants,
        print_tokens: cli.print_tokens,
        print_ast: cli.print_ast,
    };

    let ir = match compile_to_ir(&source, &options) {
        Ok(ir) => ir,
        Err(err) => {
            print!("{}", err.render_in_source(&display, &source));
            return Err(err);
        }
    };

    fs::write(IR_FILE, &ir)
        .map_err(|e| CompileError::io(format!("could not write '{}': {}", IR_FILE, e)))?;
    log::debug!("wrote {} bytes of IR to {}", ir.len(), IR_FILE);

    assemble_and_link(cli)
}

/// `qbe` assembles the IR, then the C compiler links it.
fn assemble_and_link(cli: &Cli) -> Result<()> {
    run_tool(Command::new("qbe").args(["-o", ASM_FILE, IR_FILE]), "qbe")?;

    let output = cli.output_path();
    let mut cc = Command::new("cc");
    cc.arg(ASM_FILE).arg("-o").arg(&output);
    if let Some(cflags) = &cli.cflags {
        // Passed through verbatim, split the way a shell would split
        // unquoted words.
        cc.args(cflags.split_whitespace());
    }
    run_tool(&mut cc, "cc")?;

    log::info!("linked {}", output.display());
    Ok(())
}

fn run_tool(command: &mut Command, name: &str) -> Result<()> {
    let status = command
        .status()
        .map_err(|e| CompileError::io(format!("could not run {}: {}", name, e)))?;
    if !status.success() {
        return Err(CompileError::io(format!("{} exited with {}", name, status)));
    }
    Ok(())
}
