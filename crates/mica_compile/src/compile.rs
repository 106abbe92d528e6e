//! The compilation pipeline.
//!
//! ```text
//! source text
//!       │
//!       ▼
//! ┌───────────────┐
//! │  1. Lexer     │ tokenize
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐
//! │  2. Parser    │ build the AST
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐
//! │  3. Analysis  │ resolve names, annotate types
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐
//! │  4. Folding   │ (opt-in) collapse literal subtrees
//! └──────┬────────┘
//!        ▼
//! ┌───────────────┐
//! │  5. CodeGen   │ emit textual QBE IR
//! └──────┬────────┘
//!        ▼
//!   IR text (.ssa)
//! ```
//!
//! The first error in any stage aborts the compilation; there is no
//! partial output. All per-compilation storage (type arena, AST arena,
//! interner) lives inside [`compile_to_ir`] and is dropped when it
//! returns.

use mica_base::{Arena, Interner, Result};
use mica_language::ast::{print::print_tree, AstArena, DataType};
use mica_language::{Lexer, Parser, Token, TokenKind};

use crate::analysis::analyze;
use crate::codegen::generate;
use crate::optimize::fold_constants;

/// Per-compilation switches, set by the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompileOptions {
    /// Run the AST constant folder between analysis and IR generation.
    pub fold_constants: bool,
    /// Dump the token sequence before parsing.
    pub print_tokens: bool,
    /// Dump the AST after analysis.
    pub print_ast: bool,
}

/// Compiles one source file to textual QBE IR.
pub fn compile_to_ir(source: &str, options: &CompileOptions) -> Result<String> {
    let types: Arena<DataType> = Arena::new();
    let mut interner = Interner::new();

    log::debug!("lexing {} bytes", source.len());
    let tokens = Lexer::new(source, &mut interner).lex()?;
    if options.print_tokens {
        print!("{}", dump_tokens(&tokens, &interner));
    }

    log::debug!("parsing {} tokens", tokens.len());
    let mut ast = AstArena::new();
    let root = Parser::new(&tokens, &mut ast, &types, &interner).parse()?;

    log::debug!("analyzing {} nodes", ast.len());
    analyze(&mut ast, &types, &mut interner, root)?;

    if options.fold_constants {
        log::debug!("folding constants");
        fold_constants(&mut ast, root);
    }

    if options.print_ast {
        print!("{}", print_tree(&ast, root, &interner));
    }

    log::debug!("generating IR");
    generate(&ast, root, &interner)
}

/// One token per line with its position, for `--print-tokens`.
fn dump_tokens(tokens: &[Token], interner: &Interner) -> String {
    let mut out = String::new();
    for token in tokens {
        let detail = match token.kind {
            TokenKind::Ident(sym) => format!(" '{}'", interner.resolve(sym)),
            TokenKind::Str(sym) => format!(" {:?}", interner.resolve(sym)),
            TokenKind::Int(value) => format!(" {}", value),
            TokenKind::Float(value) => format!(" {}", value),
            TokenKind::Char(value) => format!(" {:?}", value),
            TokenKind::Bool(value) => format!(" {}", value),
            _ => String::new(),
        };
        out.push_str(&format!(
            "{:>4}:{:<3} {}{}\n",
            token.pos.line,
            token.pos.column,
            token.kind.describe(),
            detail
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_compiles_minimal_program() {
        let ir = compile_to_ir("fn main() -> i32 { return 0; }", &CompileOptions::default())
            .unwrap();
        assert!(ir.contains("export function w $main()"));
    }

    #[test]
    fn pipeline_reports_lex_errors() {
        let err = compile_to_ir("fn main() -> i32 { let s: char* = \"x; }", &CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.kind, mica_base::ErrorKind::Lex);
    }

    #[test]
    fn pipeline_reports_parse_errors() {
        let err = compile_to_ir("fn main() -> i32 { return 0 }", &CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.kind, mica_base::ErrorKind::Parse);
    }

    #[test]
    fn pipeline_reports_semantic_errors() {
        let err = compile_to_ir("fn main() -> i32 { return x; }", &CompileOptions::default())
            .unwrap_err();
        assert_eq!(err.kind, mica_base::ErrorKind::Semantic);
    }

    #[test]
    fn two_runs_produce_identical_ir() {
        let source = "struct P { x: i32, y: i32 }\n\
                      fn main() -> i32 { let p: P = P { x: 1, y: 2 }; return p.x; }";
        let a = compile_to_ir(source, &CompileOptions::default()).unwrap();
        let b = compile_to_ir(source, &CompileOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn token_dump_lists_positions_and_kinds() {
        let mut interner = Interner::new();
        let tokens = Lexer::new("fn main", &mut interner).lex().unwrap();
        let dump = dump_tokens(&tokens, &interner);
        assert!(dump.contains("fn"));
        assert!(dump.contains("'main'"));
        assert!(dump.contains("1:1"));
    }
}
