//! AST tree dump for `--print-ast`.
//!
//! Renders the syntax graph as an indented tree with box-drawing
//! branches:
//!
//! ```text
//! translation_unit
//! ┗━ function_declaration 'main' -> i32
//!    ┗━ return
//!       ┗━ integer_literal 0
//! ```

use mica_base::Interner;

use super::{AstArena, AstKind, NodeRef};

/// Renders the subtree under `root` into a string.
pub fn print_tree(ast: &AstArena, root: NodeRef, interner: &Interner) -> String {
    let mut out = String::new();
    print_node(ast, root, interner, "", "", "", &mut out);
    out
}

fn label(ast: &AstArena, r: NodeRef, interner: &Interner) -> String {
    let node = ast.node(r);
    let name = node.kind.name();
    match &node.kind {
        AstKind::Import { path } => format!("{} \"{}\"", name, interner.resolve(*path)),
        AstKind::FunctionDecl { name: fn_name, return_type, external, .. } => {
            let ext = if *external { " extern" } else { "" };
            format!(
                "{}{} '{}' -> {}",
                name,
                ext,
                interner.resolve(*fn_name),
                return_type.display(interner)
            )
        }
        AstKind::StructDecl { name: s, .. } => format!("{} '{}'", name, interner.resolve(*s)),
        AstKind::VariableDecl { name: v, ty, .. } => {
            format!("{} '{}': {}", name, interner.resolve(*v), ty.display(interner))
        }
        AstKind::FieldInit { name: f, .. } => format!("{} '{}'", name, interner.resolve(*f)),
        AstKind::Call { name: f, .. } => format!("{} '{}'", name, interner.resolve(*f)),
        AstKind::StructInit { name: s, .. } => format!("{} '{}'", name, interner.resolve(*s)),
        AstKind::Cast { target, .. } => format!("{} <{}>", name, target.display(interner)),
        AstKind::For { ident, range, .. } => format!(
            "{} '{}' in {}..{}",
            name,
            interner.resolve(*ident),
            range.from,
            range.to
        ),
        AstKind::GetVariable { name: v } => format!("{} '{}'", name, interner.resolve(*v)),
        AstKind::GetMember { member, .. } => format!("{} '{}'", name, interner.resolve(*member)),
        AstKind::Binary { op, .. } => format!("{} <{}>", name, op.describe()),
        AstKind::Unary { op, .. } => format!("{} <{}>", name, op.describe()),
        AstKind::BoolLiteral(v) => format!("{} {}", name, v),
        AstKind::CharLiteral(c) => format!("{} {:?}", name, c),
        AstKind::IntLiteral(v) => format!("{} {}", name, v),
        AstKind::FloatLiteral(v) => format!("{} {}", name, v),
        AstKind::StrLiteral(s) => format!("{} {:?}", name, interner.resolve(*s)),
        _ => name.to_string(),
    }
}

fn children(ast: &AstArena, r: NodeRef) -> Vec<NodeRef> {
    match &ast.node(r).kind {
        AstKind::TranslationUnit { body } => body.clone(),
        AstKind::FunctionDecl { params, body, .. } => {
            let mut all = params.clone();
            all.extend(body.iter().copied());
            all
        }
        AstKind::StructDecl { members, .. } => members.clone(),
        AstKind::VariableDecl { init, .. } => init.iter().copied().collect(),
        AstKind::FieldInit { expr, .. } => vec![*expr],
        AstKind::Call { args, .. } => args.clone(),
        AstKind::StructInit { fields, .. } => fields.clone(),
        AstKind::ArrayInit { exprs } => exprs.clone(),
        AstKind::Cast { expr, .. } => vec![*expr],
        AstKind::If { cond, body, else_body } => {
            let mut all = vec![*cond];
            all.extend(body.iter().copied());
            all.extend(else_body.iter().copied());
            all
        }
        AstKind::While { cond, body } => {
            let mut all = vec![*cond];
            all.extend(body.iter().copied());
            all
        }
        AstKind::For { body, .. } => body.clone(),
        AstKind::Return { expr } => expr.iter().copied().collect(),
        AstKind::GetMember { expr, .. } => vec![*expr],
        AstKind::Binary { left, right, .. } => vec![*left, *right],
        AstKind::Unary { operand, .. } => vec![*operand],
        _ => Vec::new(),
    }
}

fn print_node(
    ast: &AstArena,
    r: NodeRef,
    interner: &Interner,
    prefix: &str,
    branch: &str,
    child_prefix: &str,
    out: &mut String,
) {
    out.push_str(prefix);
    out.push_str(branch);
    out.push_str(&label(ast, r, interner));
    out.push('\n');

    let kids = children(ast, r);
    let count = kids.len();
    for (i, kid) in kids.into_iter().enumerate() {
        let last = i + 1 == count;
        let next_prefix = format!("{}{}", prefix, child_prefix);
        let (next_branch, next_child_prefix) = if last {
            ("\u{2517}\u{2501} ", "   ")
        } else {
            ("\u{2523}\u{2501} ", "\u{2503}  ")
        };
        print_node(
            ast,
            kid,
            interner,
            &next_prefix,
            next_branch,
            next_child_prefix,
            out,
        );
    }
}
