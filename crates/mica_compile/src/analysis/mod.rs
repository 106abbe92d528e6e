//! Semantic analysis.
//!
//! A single top-down pass over the AST that resolves names through three
//! independent name spaces (functions, structs, variables), validates
//! and propagates types, and annotates every node's `resolved` slot in
//! place. Later stages read the annotations and never re-derive types.
//!
//! Declarations become visible in source order: a function may call
//! itself or anything declared above it.
//!
//! The analyzer synthesises new datatype objects into the compilation's
//! type arena where an expression produces a type no declaration spelled
//! out — the pointer-of type of an address-of expression, the `char[N+1]`
//! type of a string literal, the array type rebuilt from an initialiser
//! list.
//!
//! All failures are fatal [`CompileError::semantic`]s carrying the
//! offending node's source position.

pub mod scope;

use mica_base::{Arena, CompileError, FilePos, Interner, Result, Symbol};
use mica_language::ast::{
    is_builtin, types_equal, types_match, AstArena, AstKind, DataType, NodeRef,
};
use mica_language::BinaryOp;
use mica_language::UnaryOp;
use std::collections::HashMap;

use scope::ScopeStack;

/// Pre-interned builtin types the analyzer hands out without
/// re-synthesising them per literal.
struct Builtins<'t> {
    void_: &'t DataType<'t>,
    bool_: &'t DataType<'t>,
    char_: &'t DataType<'t>,
    i32_: &'t DataType<'t>,
    f32_: &'t DataType<'t>,
    main_fn: Symbol,
}

impl<'t> Builtins<'t> {
    fn new(types: &'t Arena<DataType<'t>>, interner: &mut Interner) -> Self {
        let mut prim = |name: &str| {
            let sym = interner.intern(name);
            types.alloc(DataType::Primitive(sym))
        };
        let void_ = prim("void");
        let bool_ = prim("bool");
        let char_ = prim("char");
        let i32_ = prim("i32");
        let f32_ = prim("f32");
        Builtins {
            void_,
            bool_,
            char_,
            i32_,
            f32_,
            main_fn: interner.intern("main"),
        }
    }
}

/// Runs semantic analysis over the translation unit at `root`.
///
/// On success every node reachable from `root` has its `resolved` type
/// slot filled; on failure the first error aborts the compilation.
pub fn analyze<'t>(
    ast: &mut AstArena<'t>,
    types: &'t Arena<DataType<'t>>,
    interner: &mut Interner,
    root: NodeRef,
) -> Result<()> {
    let builtins = Builtins::new(types, interner);
    let mut analyzer = Analyzer {
        ast,
        types,
        interner: &*interner,
        builtins,
        functions: HashMap::new(),
        structs: HashMap::new(),
        scopes: ScopeStack::new(),
        return_type: None,
        loop_depth: 0,
    };
    analyzer.analyze_unit(root)
}

struct Analyzer<'a, 't> {
    ast: &'a mut AstArena<'t>,
    types: &'t Arena<DataType<'t>>,
    interner: &'a Interner,
    builtins: Builtins<'t>,
    /// Function declarations, global only.
    functions: HashMap<Symbol, NodeRef>,
    /// Struct declarations, global only.
    structs: HashMap<Symbol, NodeRef>,
    /// Variable declarations, per nested scope.
    scopes: ScopeStack,
    /// Return type of the function currently being analyzed.
    return_type: Option<&'t DataType<'t>>,
    /// Nesting depth of while/for loops, for break/continue checking.
    loop_depth: usize,
}

impl<'a, 't> Analyzer<'a, 't> {
    fn err(&self, message: impl Into<String>, pos: FilePos) -> CompileError {
        CompileError::semantic(message, pos)
    }

    fn name(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn display(&self, ty: &DataType) -> String {
        ty.display(self.interner)
    }

    fn resolve_node(&mut self, r: NodeRef, ty: &'t DataType<'t>) {
        self.ast.node_mut(r).resolved = Some(ty);
    }

    /// `true` if `ty` is directly the named builtin primitive.
    fn prim_is(&self, ty: &DataType, name: &str) -> bool {
        matches!(ty, DataType::Primitive(sym) if self.interner.matches(*sym, name))
    }

    /// A datatype is valid iff its underlying is a builtin primitive, a
    /// declared struct name, or the variadic sentinel.
    fn is_valid_type(&self, ty: &DataType) -> bool {
        match ty.underlying() {
            DataType::Primitive(sym) => {
                is_builtin(*sym, self.interner) || self.structs.contains_key(sym)
            }
            DataType::Variadic => true,
            _ => unreachable!("underlying() strips pointers and arrays"),
        }
    }

    fn check_valid_type(&self, ty: &DataType, pos: FilePos) -> Result<()> {
        if !self.is_valid_type(ty) {
            let underlying = ty.underlying();
            return Err(self.err(
                format!("type '{}' is not defined", self.display(underlying)),
                pos,
            ));
        }
        Ok(())
    }

    /// The struct declaration behind `ty`'s underlying type, if any.
    fn struct_of(&self, ty: &DataType) -> Option<NodeRef> {
        match ty.underlying() {
            DataType::Primitive(sym) => self.structs.get(sym).copied(),
            _ => None,
        }
    }

    /// Member declarations of a struct declaration node.
    fn struct_members(&self, decl: NodeRef) -> Vec<NodeRef> {
        match &self.ast.node(decl).kind {
            AstKind::StructDecl { members, .. } => members.clone(),
            other => unreachable!("struct table points at {}", other.name()),
        }
    }

    /// Declared name and type of a variable-declaration node.
    fn var_decl(&self, decl: NodeRef) -> (Symbol, &'t DataType<'t>) {
        match &self.ast.node(decl).kind {
            AstKind::VariableDecl { name, ty, .. } => (*name, *ty),
            other => unreachable!("variable table points at {}", other.name()),
        }
    }

    // ------------------------------------------------------------------
    // Global scope
    // ------------------------------------------------------------------

    fn analyze_unit(&mut self, root: NodeRef) -> Result<()> {
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
            self.analyze_global_node(decl)?;
        }
        self.resolve_node(root, self.builtins.void_);
        Ok(())
    }

    fn analyze_global_node(&mut self, r: NodeRef) -> Result<()> {
        let pos = self.ast.node(r).pos;
        match self.ast.node(r).kind.clone() {
            AstKind::FunctionDecl { name, params, return_type, body, external } => {
                if self.functions.contains_key(&name) {
                    return Err(self.err(
                        format!("function '{}' is defined more than once", self.name(name)),
                        pos,
                    ));
                }

                self.check_valid_type(return_type, pos)?;
                if name == self.builtins.main_fn && !self.prim_is(return_type, "i32") {
                    return Err(self.err("the main function can only return 'i32'", pos));
                }

                // Visible to its own body, for recursion.
                self.functions.insert(name, r);

                self.return_type = Some(return_type);
                self.scopes.push();
                for param in &params {
                    self.analyze_parameter(*param)?;
                }
                debug_assert!(!external || body.is_empty());
                for stmt in &body {
                    self.analyze_statement(*stmt)?;
                }
                self.scopes.pop();
                self.return_type = None;

                self.resolve_node(r, self.builtins.void_);
            }

            AstKind::StructDecl { name, members } => {
                if self.structs.contains_key(&name) {
                    return Err(self.err(
                        format!("struct '{}' is defined more than once", self.name(name)),
                        pos,
                    ));
                }
                // Registered before the members are checked so a member
                // may hold a pointer to its own struct.
                self.structs.insert(name, r);

                let mut seen: Vec<Symbol> = Vec::new();
                for member in members {
                    let member_pos = self.ast.node(member).pos;
                    let (member_name, member_ty) = self.var_decl(member);
                    if seen.contains(&member_name) {
                        return Err(self.err(
                            format!(
                                "struct '{}' already has a member called '{}'",
                                self.name(name),
                                self.name(member_name)
                            ),
                            member_pos,
                        ));
                    }
                    seen.push(member_name);

                    self.check_valid_type(member_ty, member_pos)?;
                    if matches!(member_ty, DataType::Primitive(_))
                        && self.struct_of(member_ty).is_some()
                    {
                        return Err(self.err(
                            "nested struct members are not supported, use a pointer",
                            member_pos,
                        ));
                    }
                    self.resolve_node(member, member_ty);
                }

                self.resolve_node(r, self.builtins.void_);
            }

            AstKind::VariableDecl { .. } => {
                self.analyze_statement(r)?;
            }

            AstKind::Import { .. } => {
                // Parsed, not resolved.
                self.resolve_node(r, self.builtins.void_);
            }

            other => {
                return Err(CompileError::internal(
                    format!("{} is not a global declaration", other.name()),
                    pos,
                ));
            }
        }
        Ok(())
    }

    /// Binds one function parameter; the variadic sentinel is validated
    /// but not bound.
    fn analyze_parameter(&mut self, r: NodeRef) -> Result<()> {
        let pos = self.ast.node(r).pos;
        let (name, ty) = self.var_decl(r);

        if types_equal(ty, &DataType::Variadic) {
            self.resolve_node(r, ty);
            return Ok(());
        }

        self.check_valid_type(ty, pos)?;
        if !self.scopes.declare(name, r) {
            return Err(self.err(
                format!("parameter '{}' is already defined", self.name(name)),
                pos,
            ));
        }
        self.resolve_node(r, ty);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn analyze_statement(&mut self, r: NodeRef) -> Result<()> {
        let pos = self.ast.node(r).pos;
        match self.ast.node(r).kind.clone() {
            AstKind::VariableDecl { name, ty, init } => {
                // Fresh in the current scope; shadowing an outer scope is
                // fine, a second declaration in the same scope is not.
                if self.scopes.declared_in_current(name) {
                    return Err(self.err(
                        format!("variable '{}' is already defined", self.name(name)),
                        pos,
                    ));
                }

                self.check_valid_type(ty, pos)?;

                if let Some(init) = init {
                    let init_ty = self.analyze_expression(init)?;
                    if !types_match(ty, init_ty) {
                        return Err(self.err(
                            format!(
                                "type mismatch: declaration is '{}' but the expression has type '{}'",
                                self.display(ty),
                                self.display(init_ty)
                            ),
                            pos,
                        ));
                    }
                }

                self.scopes.declare(name, r);
                self.resolve_node(r, ty);
            }

            AstKind::If { cond, body, else_body } => {
                self.analyze_expression(cond)?;
                self.scopes.push();
                for stmt in &body {
                    self.analyze_statement(*stmt)?;
                }
                self.scopes.pop();
                self.scopes.push();
                for stmt in &else_body {
                    self.analyze_statement(*stmt)?;
                }
                self.scopes.pop();
                self.resolve_node(r, self.builtins.void_);
            }

            AstKind::While { cond, body } => {
                self.analyze_expression(cond)?;
                self.scopes.push();
                self.loop_depth += 1;
                for stmt in &body {
                    self.analyze_statement(*stmt)?;
                }
                self.loop_depth -= 1;
                self.scopes.pop();
                self.resolve_node(r, self.builtins.void_);
            }

            AstKind::For { ident, body, .. } => {
                self.scopes.push();
                // The induction variable gets a synthesised declaration
                // node so name lookups resolve to an i32.
                let decl = self.ast.alloc(
                    AstKind::VariableDecl { name: ident, ty: self.builtins.i32_, init: None },
                    pos,
                );
                self.resolve_node(decl, self.builtins.i32_);
                self.scopes.declare(ident, decl);

                self.loop_depth += 1;
                for stmt in &body {
                    self.analyze_statement(*stmt)?;
                }
                self.loop_depth -= 1;
                self.scopes.pop();
                self.resolve_node(r, self.builtins.void_);
            }

            AstKind::Return { expr } => {
                let return_type = self.return_type.unwrap_or(self.builtins.void_);
                match expr {
                    Some(expr) => {
                        let ty = self.analyze_expression(expr)?;
                        if !types_match(return_type, ty) {
                            return Err(self.err(
                                format!(
                                    "return expression has type '{}' but the function returns '{}'",
                                    self.display(ty),
                                    self.display(return_type)
                                ),
                                pos,
                            ));
                        }
                    }
                    None => {
                        if !self.prim_is(return_type, "void") {
                            return Err(self.err(
                                format!(
                                    "return without a value in a function returning '{}'",
                                    self.display(return_type)
                                ),
                                pos,
                            ));
                        }
                    }
                }
                self.resolve_node(r, self.builtins.void_);
            }

            AstKind::Break => {
                if self.loop_depth == 0 {
                    return Err(self.err("'break' outside of a loop", pos));
                }
                self.resolve_node(r, self.builtins.void_);
            }
            AstKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(self.err("'continue' outside of a loop", pos));
                }
                self.resolve_node(r, self.builtins.void_);
            }

            // Expression statements: calls, assignments, member stores...
            _ => {
                self.analyze_expression(r)?;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn analyze_expression(&mut self, r: NodeRef) -> Result<&'t DataType<'t>> {
        let pos = self.ast.node(r).pos;
        let ty: &'t DataType<'t> = match self.ast.node(r).kind.clone() {
            AstKind::BoolLiteral(_) => self.builtins.bool_,
            AstKind::CharLiteral(_) => self.builtins.char_,
            AstKind::IntLiteral(_) => self.builtins.i32_,
            AstKind::FloatLiteral(_) => self.builtins.f32_,
            AstKind::StrLiteral(sym) => {
                // Byte length, not character count: the backend stores the
                // literal one byte at a time with a trailing NUL.
                let len = self.interner.resolve(sym).len();
                self.types.alloc(DataType::Array { elem: self.builtins.char_, len: len + 1 })
            }

            AstKind::GetVariable { name } => {
                let Some(decl) = self.scopes.lookup(name) else {
                    return Err(self.err(
                        format!("no variable called '{}' exists", self.name(name)),
                        pos,
                    ));
                };
                self.var_decl(decl).1
            }

            AstKind::GetMember { expr, member } => {
                let recv_ty = self.analyze_expression(expr)?;
                let Some(struct_decl) = self.struct_of(recv_ty) else {
                    return Err(self.err(
                        format!("type '{}' is not a struct", self.display(recv_ty)),
                        pos,
                    ));
                };
                self.member_type(struct_decl, member, pos)?
            }

            AstKind::Call { name, args, .. } => self.analyze_call(r, name, &args, pos)?,

            AstKind::StructInit { name, fields } => {
                self.analyze_struct_init(name, &fields, pos)?
            }

            AstKind::ArrayInit { exprs } => {
                if exprs.is_empty() {
                    return Err(self.err("array initializer can not be empty", pos));
                }
                let elem_ty = self.analyze_expression(exprs[0])?;
                for expr in &exprs[1..] {
                    let ty = self.analyze_expression(*expr)?;
                    if !types_equal(elem_ty, ty) {
                        return Err(self.err(
                            format!(
                                "array elements must all have the same type, found '{}' and '{}'",
                                self.display(elem_ty),
                                self.display(ty)
                            ),
                            self.ast.node(*expr).pos,
                        ));
                    }
                }
                self.types.alloc(DataType::Array { elem: elem_ty, len: exprs.len() })
            }

            AstKind::Cast { target, expr } => {
                self.check_valid_type(target, pos)?;
                let inner = self.analyze_expression(expr)?;
                if !self.cast_allowed(target, inner) {
                    return Err(self.err(
                        format!(
                            "invalid cast from '{}' to '{}'",
                            self.display(inner),
                            self.display(target)
                        ),
                        pos,
                    ));
                }
                target
            }

            AstKind::Unary { op, operand } => {
                let operand_ty = self.analyze_expression(operand)?;
                match op {
                    UnaryOp::AddressOf => self.types.alloc(DataType::Pointer(operand_ty)),
                    UnaryOp::Dereference => match operand_ty {
                        DataType::Pointer(base) => *base,
                        other => {
                            return Err(self.err(
                                format!(
                                    "cannot dereference non-pointer type '{}'",
                                    self.display(other)
                                ),
                                pos,
                            ));
                        }
                    },
                    UnaryOp::Negate => operand_ty,
                }
            }

            AstKind::Binary { op, left, right } => {
                self.analyze_binary(op, left, right, pos)?
            }

            other => {
                return Err(CompileError::internal(
                    format!("{} is not an expression", other.name()),
                    pos,
                ));
            }
        };

        self.resolve_node(r, ty);
        Ok(ty)
    }

    fn analyze_binary(
        &mut self,
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
        pos: FilePos,
    ) -> Result<&'t DataType<'t>> {
        if op == BinaryOp::Assign {
            // The left side must be a place: a variable, an array element
            // or a struct member.
            let assignable = matches!(
                self.ast.node(left).kind,
                AstKind::GetVariable { .. }
                    | AstKind::GetMember { .. }
                    | AstKind::Binary { op: BinaryOp::ArrayIndex, .. }
            );
            if !assignable {
                return Err(self.err("invalid assignment target", pos));
            }

            let lhs_ty = self.analyze_expression(left)?;
            let rhs_ty = self.analyze_expression(right)?;
            if !types_match(lhs_ty, rhs_ty) {
                return Err(self.err(
                    format!(
                        "cannot assign '{}' to '{}'",
                        self.display(rhs_ty),
                        self.display(lhs_ty)
                    ),
                    pos,
                ));
            }
            return Ok(lhs_ty);
        }

        if op == BinaryOp::ArrayIndex {
            let lhs_ty = self.analyze_expression(left)?;
            self.analyze_expression(right)?;
            return match lhs_ty {
                DataType::Array { elem, .. } => Ok(*elem),
                other => Err(self.err(
                    format!("cannot index non-array type '{}'", self.display(other)),
                    pos,
                )),
            };
        }

        let lhs_ty = self.analyze_expression(left)?;
        let rhs_ty = self.analyze_expression(right)?;
        if !types_match(lhs_ty, rhs_ty) {
            return Err(self.err(
                format!(
                    "type mismatch: '{}' {} '{}'",
                    self.display(lhs_ty),
                    op.describe(),
                    self.display(rhs_ty)
                ),
                pos,
            ));
        }

        match op {
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::LessThan
            | BinaryOp::LessOrEqualThan
            | BinaryOp::GreaterThan
            | BinaryOp::GreaterOrEqualThan => Ok(self.builtins.bool_),
            _ => Ok(lhs_ty),
        }
    }

    fn analyze_call(
        &mut self,
        call: NodeRef,
        name: Symbol,
        args: &[NodeRef],
        pos: FilePos,
    ) -> Result<&'t DataType<'t>> {
        let Some(&decl) = self.functions.get(&name) else {
            return Err(self.err(
                format!("no function called '{}' exists", self.name(name)),
                pos,
            ));
        };

        let (params, return_type) = match &self.ast.node(decl).kind {
            AstKind::FunctionDecl { params, return_type, .. } => {
                (params.clone(), *return_type)
            }
            other => unreachable!("function table points at {}", other.name()),
        };

        let variadic = params
            .last()
            .map(|p| types_equal(self.var_decl(*p).1, &DataType::Variadic))
            .unwrap_or(false);
        let fixed = params.len() - usize::from(variadic);

        if variadic {
            if args.len() < fixed {
                return Err(self.err(
                    format!(
                        "function '{}' takes at least {} arguments but {} were given",
                        self.name(name),
                        fixed,
                        args.len()
                    ),
                    pos,
                ));
            }
        } else if args.len() != fixed {
            return Err(self.err(
                format!(
                    "function '{}' takes {} arguments but {} were given",
                    self.name(name),
                    fixed,
                    args.len()
                ),
                pos,
            ));
        }

        for (i, arg) in args.iter().enumerate() {
            let arg_ty = self.analyze_expression(*arg)?;
            if i >= fixed {
                // Variadic positions are accepted unchecked.
                continue;
            }
            let param_ty = self.var_decl(params[i]).1;
            if !types_match(param_ty, arg_ty) {
                return Err(self.err(
                    format!(
                        "argument {} has type '{}' but '{}' was expected",
                        i + 1,
                        self.display(arg_ty),
                        self.display(param_ty)
                    ),
                    self.ast.node(*arg).pos,
                ));
            }
        }

        // Record where the generator has to emit the `...` marker.
        if variadic {
            if let AstKind::Call { variadic_boundary, .. } = &mut self.ast.node_mut(call).kind {
                *variadic_boundary = Some(fixed);
            }
        }

        Ok(return_type)
    }

    fn analyze_struct_init(
        &mut self,
        name: Symbol,
        fields: &[NodeRef],
        pos: FilePos,
    ) -> Result<&'t DataType<'t>> {
        let Some(&decl) = self.structs.get(&name) else {
            return Err(self.err(
                format!("no struct called '{}' exists", self.name(name)),
                pos,
            ));
        };

        let members = self.struct_members(decl);
        if fields.len() != members.len() {
            return Err(self.err(
                format!(
                    "struct '{}' has {} members but {} were initialized",
                    self.name(name),
                    members.len(),
                    fields.len()
                ),
                pos,
            ));
        }

        for field in fields {
            let field_pos = self.ast.node(*field).pos;
            let (field_name, expr) = match &self.ast.node(*field).kind {
                AstKind::FieldInit { name, expr } => (*name, *expr),
                other => unreachable!("struct initializer holds {}", other.name()),
            };

            let member_ty = self.member_type(decl, field_name, field_pos)?;
            let expr_ty = self.analyze_expression(expr)?;
            if !types_match(member_ty, expr_ty) {
                return Err(self.err(
                    format!(
                        "field '{}' has type '{}' but '{}' was expected",
                        self.name(field_name),
                        self.display(expr_ty),
                        self.display(member_ty)
                    ),
                    field_pos,
                ));
            }
            self.resolve_node(*field, member_ty);
        }

        Ok(self.types.alloc(DataType::Primitive(name)))
    }

    /// Looks a member up on a struct declaration, erroring when it does
    /// not exist.
    fn member_type(
        &self,
        struct_decl: NodeRef,
        member: Symbol,
        pos: FilePos,
    ) -> Result<&'t DataType<'t>> {
        let struct_name = match &self.ast.node(struct_decl).kind {
            AstKind::StructDecl { name, .. } => *name,
            other => unreachable!("struct table points at {}", other.name()),
        };
        for candidate in self.struct_members(struct_decl) {
            let (name, ty) = self.var_decl(candidate);
            if name == member {
                return Ok(ty);
            }
        }
        Err(self.err(
            format!(
                "struct '{}' has no member called '{}'",
                self.name(struct_name),
                self.name(member)
            ),
            pos,
        ))
    }

    /// Cast validity: equal types are a no-op, pointer-to-pointer is
    /// free, and a fixed set of primitive pairs is allowed.
    fn cast_allowed(&self, target: &DataType, inner: &DataType) -> bool {
        if types_equal(target, inner) {
            return true;
        }
        if matches!(target, DataType::Pointer(_)) && matches!(inner, DataType::Pointer(_)) {
            return true;
        }

        const ALLOWED: &[(&str, &str)] = &[
            ("i32", "bool"),
            ("bool", "i32"),
            ("i32", "char"),
            ("char", "i32"),
            ("i32", "i64"),
            ("i64", "i32"),
            ("i32", "u8"),
            ("u8", "i32"),
        ];
        ALLOWED
            .iter()
            .any(|(to, from)| self.prim_is(target, to) && self.prim_is(inner, from))
    }
}
