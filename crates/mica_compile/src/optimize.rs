//! AST constant folding.
//!
//! A post-order walk that rewrites binary operators whose operands are
//! literal nodes of matching kind into the computed literal, in place.
//! Supported foldings:
//!
//! | operands | operators | result |
//! |----------|-----------|--------|
//! | bool, bool | `==` `!=` | bool |
//! | int, int | `+` `-` `%` | int |
//! | int, int | `==` `!=` | bool |
//!
//! A modulo with a zero right operand is left unfolded and reaches the
//! backend untouched. Folding runs after analysis, so a rewritten node
//! keeps its position and resolved type; folding twice yields the same
//! tree as folding once.

use mica_language::ast::{AstArena, AstKind, NodeRef};
use mica_language::BinaryOp;

/// Folds literal-only subtrees under `root` in place.
pub fn fold_constants(ast: &mut AstArena, root: NodeRef) {
    fold_node(ast, root);
}

fn fold_body(ast: &mut AstArena, body: &[NodeRef]) {
    for &stmt in body {
        fold_node(ast, stmt);
    }
}

fn fold_node(ast: &mut AstArena, r: NodeRef) {
    match ast.node(r).kind.clone() {
        AstKind::TranslationUnit { body } => fold_body(ast, &body),
        AstKind::FunctionDecl { body, .. } => fold_body(ast, &body),
        AstKind::VariableDecl { init, .. } => {
            if let Some(init) = init {
                fold_node(ast, init);
            }
        }
        AstKind::FieldInit { expr, .. } => fold_node(ast, expr),
        AstKind::Call { args, .. } => fold_body(ast, &args),
        AstKind::StructInit { fields, .. } => fold_body(ast, &fields),
        AstKind::ArrayInit { exprs } => fold_body(ast, &exprs),
        AstKind::Cast { expr, .. } => fold_node(ast, expr),
        AstKind::If { cond, body, else_body } => {
            fold_node(ast, cond);
            fold_body(ast, &body);
            fold_body(ast, &else_body);
        }
        AstKind::While { cond, body } => {
            fold_node(ast, cond);
            fold_body(ast, &body);
        }
        AstKind::For { body, .. } => fold_body(ast, &body),
        AstKind::Return { expr } => {
            if let Some(expr) = expr {
                fold_node(ast, expr);
            }
        }
        AstKind::GetMember { expr, .. } => fold_node(ast, expr),
        AstKind::Unary { operand, .. } => fold_node(ast, operand),

        AstKind::Binary { op, left, right } => {
            fold_node(ast, left);
            fold_node(ast, right);

            let folded = match (&ast.node(left).kind, &ast.node(right).kind) {
                (AstKind::BoolLiteral(a), AstKind::BoolLiteral(b)) => match op {
                    BinaryOp::Equal => Some(AstKind::BoolLiteral(a == b)),
                    BinaryOp::NotEqual => Some(AstKind::BoolLiteral(a != b)),
                    _ => None,
                },
                (AstKind::IntLiteral(a), AstKind::IntLiteral(b)) => match op {
                    BinaryOp::Add => Some(AstKind::IntLiteral(a.wrapping_add(*b))),
                    BinaryOp::Subtract => Some(AstKind::IntLiteral(a.wrapping_sub(*b))),
                    BinaryOp::Modulo if *b != 0 => {
                        Some(AstKind::IntLiteral(a.wrapping_rem(*b)))
                    }
                    BinaryOp::Equal => Some(AstKind::BoolLiteral(a == b)),
                    BinaryOp::NotEqual => Some(AstKind::BoolLiteral(a != b)),
                    _ => None,
                },
                _ => None,
            };

            if let Some(kind) = folded {
                ast.node_mut(r).kind = kind;
            }
        }

        // Leaves: literals, names, import, break, continue.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_base::FilePos;

    fn int(ast: &mut AstArena, v: i64) -> NodeRef {
        ast.alloc(AstKind::IntLiteral(v), FilePos::new(1, 1))
    }

    fn boolean(ast: &mut AstArena, v: bool) -> NodeRef {
        ast.alloc(AstKind::BoolLiteral(v), FilePos::new(1, 1))
    }

    fn binary(ast: &mut AstArena, op: BinaryOp, l: NodeRef, r: NodeRef) -> NodeRef {
        ast.alloc(AstKind::Binary { op, left: l, right: r }, FilePos::new(1, 7))
    }

    #[test]
    fn integer_addition_folds() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 2);
        let r = int(&mut ast, 3);
        let node = binary(&mut ast, BinaryOp::Add, l, r);
        fold_constants(&mut ast, node);
        assert_eq!(ast.node(node).kind, AstKind::IntLiteral(5));
    }

    #[test]
    fn integer_subtraction_and_modulo_fold() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 10);
        let r = int(&mut ast, 4);
        let sub = binary(&mut ast, BinaryOp::Subtract, l, r);
        fold_constants(&mut ast, sub);
        assert_eq!(ast.node(sub).kind, AstKind::IntLiteral(6));

        let l = int(&mut ast, 10);
        let r = int(&mut ast, 4);
        let rem = binary(&mut ast, BinaryOp::Modulo, l, r);
        fold_constants(&mut ast, rem);
        assert_eq!(ast.node(rem).kind, AstKind::IntLiteral(2));
    }

    #[test]
    fn integer_comparison_folds_to_bool() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 1);
        let r = int(&mut ast, 1);
        let node = binary(&mut ast, BinaryOp::Equal, l, r);
        fold_constants(&mut ast, node);
        assert_eq!(ast.node(node).kind, AstKind::BoolLiteral(true));
    }

    #[test]
    fn bool_equality_folds() {
        let mut ast = AstArena::new();
        let l = boolean(&mut ast, true);
        let r = boolean(&mut ast, false);
        let node = binary(&mut ast, BinaryOp::NotEqual, l, r);
        fold_constants(&mut ast, node);
        assert_eq!(ast.node(node).kind, AstKind::BoolLiteral(true));
    }

    #[test]
    fn nested_trees_fold_bottom_up() {
        // (1 + 2) == 3
        let mut ast = AstArena::new();
        let one = int(&mut ast, 1);
        let two = int(&mut ast, 2);
        let add = binary(&mut ast, BinaryOp::Add, one, two);
        let three = int(&mut ast, 3);
        let eq = binary(&mut ast, BinaryOp::Equal, add, three);
        fold_constants(&mut ast, eq);
        assert_eq!(ast.node(eq).kind, AstKind::BoolLiteral(true));
    }

    #[test]
    fn multiplication_is_not_folded() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 2);
        let r = int(&mut ast, 3);
        let node = binary(&mut ast, BinaryOp::Multiply, l, r);
        fold_constants(&mut ast, node);
        assert!(matches!(ast.node(node).kind, AstKind::Binary { .. }));
    }

    #[test]
    fn modulo_by_zero_is_left_alone() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 1);
        let r = int(&mut ast, 0);
        let node = binary(&mut ast, BinaryOp::Modulo, l, r);
        fold_constants(&mut ast, node);
        assert!(matches!(ast.node(node).kind, AstKind::Binary { .. }));
    }

    #[test]
    fn mixed_literal_kinds_do_not_fold() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 1);
        let r = boolean(&mut ast, true);
        let node = binary(&mut ast, BinaryOp::Equal, l, r);
        fold_constants(&mut ast, node);
        assert!(matches!(ast.node(node).kind, AstKind::Binary { .. }));
    }

    #[test]
    fn folding_is_idempotent() {
        let mut ast = AstArena::new();
        let one = int(&mut ast, 1);
        let two = int(&mut ast, 2);
        let add = binary(&mut ast, BinaryOp::Add, one, two);
        let three = int(&mut ast, 3);
        let eq = binary(&mut ast, BinaryOp::Equal, add, three);

        fold_constants(&mut ast, eq);
        let after_once = ast.node(eq).kind.clone();
        fold_constants(&mut ast, eq);
        assert_eq!(ast.node(eq).kind, after_once);
    }

    #[test]
    fn if_conditions_fold() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 1);
        let r = int(&mut ast, 1);
        let cond = binary(&mut ast, BinaryOp::Equal, l, r);
        let stmt = ast.alloc(
            AstKind::If { cond, body: Vec::new(), else_body: Vec::new() },
            FilePos::new(1, 1),
        );
        fold_constants(&mut ast, stmt);
        assert_eq!(ast.node(cond).kind, AstKind::BoolLiteral(true));
    }

    #[test]
    fn folded_nodes_keep_their_position() {
        let mut ast = AstArena::new();
        let l = int(&mut ast, 2);
        let r = int(&mut ast, 3);
        let node = binary(&mut ast, BinaryOp::Add, l, r);
        let pos_before = ast.node(node).pos;
        fold_constants(&mut ast, node);
        assert_eq!(ast.node(node).pos, pos_before);
    }
}
