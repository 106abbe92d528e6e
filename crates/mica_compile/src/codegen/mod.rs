//! QBE IR generation.
//!
//! Walks the typed AST and emits textual SSA-form IR: aggregate `type`
//! declarations, function definitions with ABI-typed signatures, and a
//! tab-indented instruction per line inside `@start`-rooted blocks.
//!
//! The generator reads the analyzer's annotations and never re-derives
//! types; an unresolved node this deep is an internal error. Its own
//! state — temporary/label counters, the flat per-function variable
//! list, registered aggregates and the loop-label stack — lives in a
//! per-compilation context rather than process globals, so compiling
//! several files in one process is just calling [`generate`] again.

mod context;
mod expr;
mod stmt;
mod types;

use mica_base::{CompileError, Interner, Result};
use mica_language::ast::{AstArena, AstKind, NodeRef};

use context::{Aggregate, Binding, LoopLabels};

/// Lowers the analyzed translation unit at `root` to textual IR.
pub fn generate(ast: &AstArena, root: NodeRef, interner: &Interner) -> Result<String> {
    let mut generator = Generator {
        ast,
        interner,
        out: String::new(),
        temps: 0,
        labels: 0,
        variables: Vec::new(),
        aggregates: Vec::new(),
        loops: Vec::new(),
    };
    generator.gen_unit(root)?;
    Ok(generator.out)
}

pub(crate) struct Generator<'a, 't> {
    ast: &'a AstArena<'t>,
    interner: &'a Interner,
    out: String,
    temps: u32,
    labels: u32,
    variables: Vec<Binding>,
    aggregates: Vec<Aggregate>,
    loops: Vec<LoopLabels>,
}

impl<'a, 't> Generator<'a, 't> {
    /// One tab-indented instruction line.
    fn ins(&mut self, text: impl AsRef<str>) {
        self.out.push('\t');
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn raw(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
    }

    /// A label on its own line, starting a basic block.
    fn put_label(&mut self, label: context::Label) {
        self.out.push_str(&label.to_string());
        self.out.push('\n');
    }

    fn gen_unit(&mut self, root: NodeRef) -> Result<()> {
        let body = match &self.ast.node(root).kind {
            AstKind::TranslationUnit { body } => body.clone(),
            other => {
                return Err(CompileError::internal(
                    format!("expected a translation unit, found {}", other.name()),
                    self.ast.node(root).pos,
                ));
            }
        };

        for decl in body {
            // Function-local identifiers never outlive their function.
            self.variables.clear();
            debug_assert!(self.loops.is_empty());
            self.gen_global_node(decl)?;
        }
        Ok(())
    }

    fn gen_global_node(&mut self, r: NodeRef) -> Result<()> {
        let pos = self.ast.node(r).pos;
        match self.ast.node(r).kind.clone() {
            AstKind::StructDecl { name, members } => {
                self.raw(format!("type :{} = {{ ", self.interner.resolve(name)));
                for member in &members {
                    let (_, ty) = self.variable_decl(*member);
                    let Some(base) = self.base_char(ty) else {
                        return Err(CompileError::internal(
                            "struct member has no base type",
                            self.ast.node(*member).pos,
                        ));
                    };
                    self.raw(format!("{}, ", base));
                }
                self.raw("}\n");
                self.register_aggregate(name, r);
                Ok(())
            }

            AstKind::FunctionDecl { name, params, return_type, body, external } => {
                if external {
                    // Declaration only; the definition comes from outside.
                    return Ok(());
                }

                if self.interner.matches(name, "main") {
                    self.raw("export ");
                }

                let return_abi = self.abi_type(return_type);
                if return_abi.is_empty() {
                    self.raw(format!("function ${}(", self.interner.resolve(name)));
                } else {
                    self.raw(format!(
                        "function {} ${}(",
                        return_abi,
                        self.interner.resolve(name)
                    ));
                }

                let mut parts: Vec<String> = Vec::with_capacity(params.len());
                for &param in &params {
                    let (param_name, ty) = self.variable_decl(param);
                    if matches!(ty, mica_language::ast::DataType::Variadic) {
                        parts.push("...".to_string());
                        continue;
                    }
                    let temp = self.fresh_temp();
                    self.bind_variable(param_name, param, temp);
                    parts.push(format!("{} {}", self.abi_type(ty), temp));
                }
                self.raw(parts.join(", "));
                self.raw(") {\n@start\n");

                for stmt in &body {
                    self.gen_stmt(*stmt)?;
                }

                // The last block needs a terminator even when the source
                // falls off the end of the function.
                let ends_with_return = body
                    .last()
                    .map(|last| matches!(self.ast.node(*last).kind, AstKind::Return { .. }))
                    .unwrap_or(false);
                if !ends_with_return {
                    self.ins("ret");
                }

                self.raw("}\n");
                Ok(())
            }

            AstKind::Import { .. } => Ok(()),

            AstKind::VariableDecl { .. } => Err(CompileError::semantic(
                "global variables are not supported yet",
                pos,
            )),

            other => Err(CompileError::internal(
                format!("{} is not lowered at global scope", other.name()),
                pos,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use mica_base::Arena;
    use mica_language::ast::DataType;
    use mica_language::{Lexer, Parser};

    fn compile(source: &str) -> String {
        let types: Arena<DataType> = Arena::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner).lex().unwrap();
        let mut ast = mica_language::AstArena::new();
        let root = Parser::new(&tokens, &mut ast, &types, &interner)
            .parse()
            .unwrap();
        analyze(&mut ast, &types, &mut interner, root).unwrap();
        generate(&ast, root, &interner).unwrap()
    }

    #[test]
    fn minimal_main_lowered() {
        let ir = compile("fn main() -> i32 { return 0; }");
        assert!(ir.contains("export function w $main() {"));
        assert!(ir.contains("@start"));
        assert!(ir.contains("%r1 =w copy 0"));
        assert!(ir.contains("\tret %r1"));
    }

    #[test]
    fn only_main_is_exported() {
        let ir = compile(
            "fn helper() -> i32 { return 1; }\nfn main() -> i32 { return 0; }",
        );
        assert!(ir.starts_with("function w $helper() {"));
        assert!(ir.contains("export function w $main() {"));
    }

    #[test]
    fn parameters_bind_to_fresh_temporaries() {
        let ir = compile("fn add(a: i32, b: i32) -> i32 { return a + b; }\nfn main() -> i32 { return 0; }");
        assert!(ir.contains("function w $add(w %r1, w %r2) {"));
        assert!(ir.contains("%r3 =w add %r1, %r2"));
        assert!(ir.contains("ret %r3"));
    }

    #[test]
    fn extern_functions_emit_no_body() {
        let ir = compile(
            "extern fn puts(s: char*) -> i32;\nfn main() -> i32 { return 0; }",
        );
        assert!(!ir.contains("$puts("));
    }

    #[test]
    fn struct_declaration_emits_aggregate_type() {
        let ir = compile("struct P { x: i32, y: i32 }\nfn main() -> i32 { return 0; }");
        assert!(ir.contains("type :P = { w, w, }"));
    }

    #[test]
    fn void_function_header_has_no_return_abi() {
        let ir = compile("fn f() -> void { return; }\nfn main() -> i32 { return 0; }");
        assert!(ir.contains("function $f() {"));
    }

    #[test]
    fn functions_without_trailing_return_still_terminate() {
        let ir = compile("fn f() -> void { }\nfn main() -> i32 { return 0; }");
        let f_body = ir.split("function $f() {").nth(1).unwrap();
        assert!(f_body.contains("\tret\n"));
    }

    #[test]
    fn global_variables_are_rejected() {
        let types: Arena<DataType> = Arena::new();
        let mut interner = Interner::new();
        let tokens = Lexer::new("let g: i32 = 1;", &mut interner).lex().unwrap();
        let mut ast = mica_language::AstArena::new();
        let root = Parser::new(&tokens, &mut ast, &types, &interner)
            .parse()
            .unwrap();
        analyze(&mut ast, &types, &mut interner, root).unwrap();
        let err = generate(&ast, root, &interner).unwrap_err();
        assert!(err.message.contains("global variables"));
    }
}
