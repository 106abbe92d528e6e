//! Statement and control-flow lowering.
//!
//! Structured control flow becomes conditional branches between
//! numbered labels. Blocks without a terminator fall through to the
//! next label, which the backend accepts.

use mica_base::{CompileError, Result};
use mica_language::ast::{AstKind, NodeRef, Range};

use super::context::LoopLabels;
use super::Generator;

impl<'a, 't> Generator<'a, 't> {
    pub(super) fn gen_stmt(&mut self, r: NodeRef) -> Result<()> {
        let pos = self.ast.node(r).pos;
        match self.ast.node(r).kind.clone() {
            AstKind::VariableDecl { name, init, .. } => {
                let Some(init) = init else {
                    return Err(CompileError::internal(
                        "local variable declaration without an initializer",
                        pos,
                    ));
                };
                let value = self.gen_expr(init)?;
                self.bind_variable(name, r, value);
                Ok(())
            }

            AstKind::Return { expr } => {
                match expr {
                    Some(expr) => {
                        let value = self.gen_expr(expr)?;
                        self.ins(format!("ret {}", value));
                    }
                    None => self.ins("ret"),
                }
                Ok(())
            }

            AstKind::If { cond, body, else_body } => {
                let then_label = self.fresh_label();
                let else_label = self.fresh_label();
                let out_label = self.fresh_label();

                let cond_temp = self.gen_expr(cond)?;
                self.ins(format!("jnz {}, {}, {}", cond_temp, then_label, else_label));

                self.put_label(then_label);
                for stmt in &body {
                    self.gen_stmt(*stmt)?;
                }
                self.ins(format!("jmp {}", out_label));

                self.put_label(else_label);
                for stmt in &else_body {
                    self.gen_stmt(*stmt)?;
                }
                self.put_label(out_label);
                Ok(())
            }

            AstKind::While { cond, body } => {
                let cond_label = self.fresh_label();
                let body_label = self.fresh_label();
                let end_label = self.fresh_label();

                self.ins(format!("jmp {}", cond_label));
                self.put_label(cond_label);
                let cond_temp = self.gen_expr(cond)?;
                self.ins(format!("jnz {}, {}, {}", cond_temp, body_label, end_label));

                self.put_label(body_label);
                self.push_loop(LoopLabels { continue_to: cond_label, break_to: end_label });
                for stmt in &body {
                    self.gen_stmt(*stmt)?;
                }
                self.pop_loop();
                self.ins(format!("jmp {}", cond_label));

                self.put_label(end_label);
                Ok(())
            }

            AstKind::For { ident, range, body } => self.gen_for(r, ident, range, &body),

            AstKind::Break => match self.current_loop() {
                Some(labels) => {
                    self.ins(format!("jmp {}", labels.break_to));
                    Ok(())
                }
                None => Err(CompileError::internal("'break' with no enclosing loop", pos)),
            },

            AstKind::Continue => match self.current_loop() {
                Some(labels) => {
                    self.ins(format!("jmp {}", labels.continue_to));
                    Ok(())
                }
                None => {
                    Err(CompileError::internal("'continue' with no enclosing loop", pos))
                }
            },

            // Calls, assignments and other expressions in statement
            // position; their value is dropped.
            _ => {
                self.gen_expr(r)?;
                Ok(())
            }
        }
    }

    /// Counted loop over an integer range: bind the induction
    /// temporary, compare against the bound, step, repeat. `continue`
    /// jumps to the step block so the induction variable always
    /// advances.
    fn gen_for(
        &mut self,
        decl: NodeRef,
        ident: mica_base::Symbol,
        range: Range,
        body: &[NodeRef],
    ) -> Result<()> {
        let induction = self.fresh_temp();
        self.ins(format!("{} =w copy {}", induction, range.from));
        self.bind_variable(ident, decl, induction);

        let bound = self.fresh_temp();
        self.ins(format!("{} =w copy {}", bound, range.to));

        let cond_label = self.fresh_label();
        let body_label = self.fresh_label();
        let step_label = self.fresh_label();
        let end_label = self.fresh_label();

        self.ins(format!("jmp {}", cond_label));
        self.put_label(cond_label);
        let compare = if range.reverse { "csgtw" } else { "csltw" };
        let cond_temp = self.fresh_temp();
        self.ins(format!("{} =w {} {}, {}", cond_temp, compare, induction, bound));
        self.ins(format!("jnz {}, {}, {}", cond_temp, body_label, end_label));

        self.put_label(body_label);
        self.push_loop(LoopLabels { continue_to: step_label, break_to: end_label });
        for stmt in body {
            self.gen_stmt(*stmt)?;
        }
        self.pop_loop();

        self.put_label(step_label);
        let step_op = if range.reverse { "sub" } else { "add" };
        self.ins(format!("{} =w {} {}, {}", induction, step_op, induction, range.step));
        self.ins(format!("jmp {}", cond_label));

        self.put_label(end_label);
        Ok(())
    }
}
