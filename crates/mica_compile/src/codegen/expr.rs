//! Expression lowering.
//!
//! Every expression evaluates to a temporary. Stack storage
//! (`alloc4`/`alloc8`) is materialised for string literals, array
//! initialisers and struct initialisers; their value is the base
//! pointer. Argument evaluation and initialiser stores are strictly
//! left-to-right.

use mica_base::{CompileError, Result};
use mica_language::ast::{AstKind, DataType, NodeRef};
use mica_language::{BinaryOp, UnaryOp};

use super::context::Temp;
use super::Generator;

impl<'a, 't> Generator<'a, 't> {
    pub(super) fn gen_expr(&mut self, r: NodeRef) -> Result<Temp> {
        let pos = self.ast.node(r).pos;
        match self.ast.node(r).kind.clone() {
            AstKind::BoolLiteral(value) => {
                let t = self.fresh_temp();
                self.ins(format!("{} =w copy {}", t, u32::from(value)));
                Ok(t)
            }

            AstKind::CharLiteral(value) => {
                let t = self.fresh_temp();
                self.ins(format!("{} =w copy {}", t, value as u32));
                Ok(t)
            }

            AstKind::IntLiteral(value) => {
                let t = self.fresh_temp();
                self.ins(format!("{} =w copy {}", t, value));
                Ok(t)
            }

            AstKind::FloatLiteral(value) => {
                let base = self.base_char(self.resolved(r)?).unwrap_or('s');
                let t = self.fresh_temp();
                self.ins(format!("{} ={} copy {}_{:?}", t, base, base, value));
                Ok(t)
            }

            AstKind::StrLiteral(sym) => self.gen_string_literal(sym),

            AstKind::ArrayInit { exprs } => self.gen_array_initializer(r, &exprs),

            AstKind::StructInit { name, fields } => {
                self.gen_struct_initializer(r, name, &fields)
            }

            AstKind::GetVariable { name } => match self.find_variable(name) {
                Some(binding) => {
                    debug_assert!(matches!(
                        self.ast.node(binding.decl).kind,
                        AstKind::VariableDecl { .. } | AstKind::For { .. }
                    ));
                    Ok(binding.temp)
                }
                None => Err(CompileError::internal(
                    format!("no temporary for variable '{}'", self.interner.resolve(name)),
                    pos,
                )),
            },

            AstKind::GetMember { expr, member } => {
                let member_ty = self.resolved(r)?;
                let addr = self.gen_member_address(expr, member)?;
                let (base, load) = self.load_ins(member_ty, pos)?;
                let t = self.fresh_temp();
                self.ins(format!("{} ={} {} {}", t, base, load, addr));
                Ok(t)
            }

            AstKind::Cast { expr, .. } => {
                let inner = self.gen_expr(expr)?;
                let src = self.base_char(self.resolved(expr)?);
                let dst = self.base_char(self.resolved(r)?);
                match (src, dst) {
                    (Some('w'), Some('l')) => {
                        let t = self.fresh_temp();
                        self.ins(format!("{} =l extsw {}", t, inner));
                        Ok(t)
                    }
                    (Some('l'), Some('w')) => {
                        let t = self.fresh_temp();
                        self.ins(format!("{} =w copy {}", t, inner));
                        Ok(t)
                    }
                    _ => Ok(inner),
                }
            }

            AstKind::Unary { op, operand } => match op {
                // The operand of an address-of already evaluates to the
                // backing pointer for arrays, strings and aggregates.
                UnaryOp::AddressOf => self.gen_expr(operand),
                UnaryOp::Dereference => {
                    let ptr = self.gen_expr(operand)?;
                    let (base, load) = self.load_ins(self.resolved(r)?, pos)?;
                    let t = self.fresh_temp();
                    self.ins(format!("{} ={} {} {}", t, base, load, ptr));
                    Ok(t)
                }
                UnaryOp::Negate => {
                    let value = self.gen_expr(operand)?;
                    let base = self.base_char(self.resolved(r)?).ok_or_else(|| {
                        CompileError::internal("cannot negate a value with no base type", pos)
                    })?;
                    let t = self.fresh_temp();
                    self.ins(format!("{} ={} neg {}", t, base, value));
                    Ok(t)
                }
            },

            AstKind::Binary { op, left, right } => self.gen_binary(r, op, left, right),

            AstKind::Call { name, args, variadic_boundary } => {
                self.gen_call(r, name, &args, variadic_boundary)
            }

            other => Err(CompileError::internal(
                format!("{} is not lowered as an expression", other.name()),
                pos,
            )),
        }
    }

    /// `alloc4 len+1`, then one `storeb` per byte including the
    /// terminating NUL. The value is the base pointer.
    fn gen_string_literal(&mut self, sym: mica_base::Symbol) -> Result<Temp> {
        let bytes: Vec<u8> = self.interner.resolve(sym).bytes().collect();

        let base = self.fresh_temp();
        self.ins(format!("{} =l alloc4 {}", base, bytes.len() + 1));

        for (i, byte) in bytes.iter().chain(std::iter::once(&0u8)).enumerate() {
            let ptr = self.fresh_temp();
            self.ins(format!("{} =l add {}, {}", ptr, base, i));
            self.ins(format!("storeb {}, {}", byte, ptr));
        }

        Ok(base)
    }

    /// `alloc4 N*sizeof(elem)`, then an addressed store per element.
    fn gen_array_initializer(&mut self, r: NodeRef, exprs: &[NodeRef]) -> Result<Temp> {
        let pos = self.ast.node(r).pos;
        let (elem_ty, len) = match self.resolved(r)? {
            DataType::Array { elem, len } => (*elem, *len),
            other => {
                return Err(CompileError::internal(
                    format!(
                        "array initializer resolved to non-array type '{}'",
                        other.display(self.interner)
                    ),
                    pos,
                ));
            }
        };
        debug_assert_eq!(len, exprs.len());

        let elem_size = self.type_size(elem_ty, pos)?;
        let store = self.store_ins(elem_ty, pos)?;

        let base = self.fresh_temp();
        self.ins(format!("{} =l alloc4 {}", base, elem_size * len));

        for (i, &expr) in exprs.iter().enumerate() {
            let index = self.fresh_temp();
            self.ins(format!("{} =w copy {}", index, i));
            let ptr = self.gen_array_pointer(base, index, elem_ty, pos)?;
            let value = self.gen_expr(expr)?;
            self.ins(format!("{} {}, {}", store, value, ptr));
        }

        Ok(base)
    }

    /// `alloc8 size`, then an offset store per listed field.
    fn gen_struct_initializer(
        &mut self,
        r: NodeRef,
        name: mica_base::Symbol,
        fields: &[NodeRef],
    ) -> Result<Temp> {
        let pos = self.ast.node(r).pos;
        let Some(agg) = self.find_aggregate(name) else {
            return Err(CompileError::internal(
                format!("struct declaration '{}' was not found", self.interner.resolve(name)),
                pos,
            ));
        };
        let size = self.aggregate_size(agg, pos)?;

        let base = self.fresh_temp();
        self.ins(format!("{} =l alloc8 {}", base, size));

        for &field in fields {
            let (field_name, expr) = match &self.ast.node(field).kind {
                AstKind::FieldInit { name, expr } => (*name, *expr),
                other => {
                    return Err(CompileError::internal(
                        format!("struct initializer holds {}", other.name()),
                        self.ast.node(field).pos,
                    ));
                }
            };

            let offset = self.member_offset(agg, field_name, pos)?;
            let member_ty = self.member_type(agg, field_name, pos)?;
            let store = self.store_ins(member_ty, pos)?;

            let ptr = self.fresh_temp();
            self.ins(format!("{} =l add {}, {}", ptr, base, offset));
            let value = self.gen_expr(expr)?;
            self.ins(format!("{} {}, {}", store, value, ptr));
        }

        Ok(base)
    }

    /// Address of `base[index]`: widen the index to a long, scale it by
    /// the element size (omitted when the size is 1) and add.
    pub(super) fn gen_array_pointer(
        &mut self,
        base: Temp,
        index: Temp,
        elem_ty: &DataType,
        pos: mica_base::FilePos,
    ) -> Result<Temp> {
        let widened = self.fresh_temp();
        self.ins(format!("{} =l extsw {}", widened, index));

        let elem_size = self.type_size(elem_ty, pos)?;
        if elem_size > 1 {
            self.ins(format!("{} =l mul {}, {}", widened, elem_size, widened));
        }

        let ptr = self.fresh_temp();
        self.ins(format!("{} =l add {}, {}", ptr, base, widened));
        Ok(ptr)
    }

    /// Address of `receiver.member`: the receiver's pointer plus the
    /// member's layout offset.
    pub(super) fn gen_member_address(
        &mut self,
        receiver: NodeRef,
        member: mica_base::Symbol,
    ) -> Result<Temp> {
        let pos = self.ast.node(receiver).pos;
        let recv_ty = self.resolved(receiver)?;

        let agg = match recv_ty.underlying() {
            DataType::Primitive(sym) => self.find_aggregate(*sym),
            _ => None,
        };
        let Some(agg) = agg else {
            return Err(CompileError::internal(
                format!(
                    "member access on '{}' which is not a registered struct",
                    recv_ty.display(self.interner)
                ),
                pos,
            ));
        };

        let offset = self.member_offset(agg, member, pos)?;
        let receiver_temp = self.gen_expr(receiver)?;
        let ptr = self.fresh_temp();
        self.ins(format!("{} =l add {}, {}", ptr, receiver_temp, offset));
        Ok(ptr)
    }

    fn gen_binary(
        &mut self,
        r: NodeRef,
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
    ) -> Result<Temp> {
        let pos = self.ast.node(r).pos;

        if op == BinaryOp::Assign {
            return self.gen_assignment(left, right, pos);
        }

        if op == BinaryOp::ArrayIndex {
            let elem_ty = self.resolved(r)?;
            let base = self.gen_expr(left)?;
            let index = self.gen_expr(right)?;
            let ptr = self.gen_array_pointer(base, index, elem_ty, pos)?;
            let (base_char, load) = self.load_ins(elem_ty, pos)?;
            let t = self.fresh_temp();
            self.ins(format!("{} ={} {} {}", t, base_char, load, ptr));
            return Ok(t);
        }

        let lhs = self.gen_expr(left)?;
        let rhs = self.gen_expr(right)?;

        let comparison = matches!(
            op,
            BinaryOp::Equal
                | BinaryOp::NotEqual
                | BinaryOp::LessThan
                | BinaryOp::LessOrEqualThan
                | BinaryOp::GreaterThan
                | BinaryOp::GreaterOrEqualThan
        );

        if comparison {
            // Sub-word operands are widened in place before comparing.
            let left_ty = self.resolved(left)?;
            let right_ty = self.resolved(right)?;
            if let Some(extend) = self.compare_extend(left_ty) {
                self.ins(format!("{} =w {} {}", lhs, extend, lhs));
            }
            if let Some(extend) = self.compare_extend(right_ty) {
                self.ins(format!("{} =w {} {}", rhs, extend, rhs));
            }

            let signed = self.is_signed(left_ty);
            let opcode = match op {
                BinaryOp::Equal => "ceqw",
                BinaryOp::NotEqual => "cnew",
                BinaryOp::LessThan => {
                    if signed {
                        "csltw"
                    } else {
                        "cultw"
                    }
                }
                BinaryOp::LessOrEqualThan => {
                    if signed {
                        "cslew"
                    } else {
                        "culew"
                    }
                }
                BinaryOp::GreaterThan => {
                    if signed {
                        "csgtw"
                    } else {
                        "cugtw"
                    }
                }
                BinaryOp::GreaterOrEqualThan => {
                    if signed {
                        "csgew"
                    } else {
                        "cugew"
                    }
                }
                _ => unreachable!(),
            };

            let t = self.fresh_temp();
            self.ins(format!("{} =w {} {}, {}", t, opcode, lhs, rhs));
            return Ok(t);
        }

        let opcode = match op {
            BinaryOp::Add => "add",
            BinaryOp::Subtract => "sub",
            BinaryOp::Multiply => "mul",
            BinaryOp::Divide => "div",
            BinaryOp::Modulo => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            _ => unreachable!(),
        };

        let base = self.base_char(self.resolved(r)?).ok_or_else(|| {
            CompileError::internal(
                format!("operator '{}' on a value with no base type", op.describe()),
                pos,
            )
        })?;

        let t = self.fresh_temp();
        self.ins(format!("{} ={} {} {}, {}", t, base, opcode, lhs, rhs));
        Ok(t)
    }

    /// Assignment to a variable, an array element or a struct member.
    fn gen_assignment(
        &mut self,
        left: NodeRef,
        right: NodeRef,
        pos: mica_base::FilePos,
    ) -> Result<Temp> {
        match self.ast.node(left).kind.clone() {
            AstKind::Binary { op: BinaryOp::ArrayIndex, left: array, right: index } => {
                let elem_ty = self.resolved(left)?;
                let base = self.gen_expr(array)?;
                let index = self.gen_expr(index)?;
                let ptr = self.gen_array_pointer(base, index, elem_ty, pos)?;
                let value = self.gen_expr(right)?;
                let store = self.store_ins(elem_ty, pos)?;
                self.ins(format!("{} {}, {}", store, value, ptr));
                Ok(value)
            }

            AstKind::GetMember { expr, member } => {
                let member_ty = self.resolved(left)?;
                let ptr = self.gen_member_address(expr, member)?;
                let value = self.gen_expr(right)?;
                let store = self.store_ins(member_ty, pos)?;
                self.ins(format!("{} {}, {}", store, value, ptr));
                Ok(value)
            }

            AstKind::GetVariable { name } => {
                let value = self.gen_expr(right)?;
                let Some(binding) = self.find_variable(name) else {
                    return Err(CompileError::internal(
                        format!("no temporary for variable '{}'", self.interner.resolve(name)),
                        pos,
                    ));
                };
                let base = self.base_char(self.resolved(left)?).ok_or_else(|| {
                    CompileError::internal("assignment to a value with no base type", pos)
                })?;
                self.ins(format!("{} ={} copy {}", binding.temp, base, value));
                Ok(value)
            }

            other => Err(CompileError::internal(
                format!("invalid assignment to {}", other.name()),
                pos,
            )),
        }
    }

    /// Strict left-to-right call lowering with the `...` marker at the
    /// variadic boundary and f32→f64 promotion for variadic floats.
    fn gen_call(
        &mut self,
        r: NodeRef,
        name: mica_base::Symbol,
        args: &[NodeRef],
        variadic_boundary: Option<usize>,
    ) -> Result<Temp> {
        let pos = self.ast.node(r).pos;

        let mut lowered: Vec<(String, Temp)> = Vec::with_capacity(args.len());
        for (i, &arg) in args.iter().enumerate() {
            let mut temp = self.gen_expr(arg)?;
            let ty = self.resolved(arg)?;
            let mut abi = self.abi_type(ty);

            let variadic_position = variadic_boundary.map_or(false, |b| i >= b);
            if variadic_position && self.prim_named(ty, "f32") {
                let promoted = self.fresh_temp();
                self.ins(format!("{} =d exts {}", promoted, temp));
                temp = promoted;
                abi = "d".to_string();
            }

            lowered.push((abi, temp));
        }

        let mut parts: Vec<String> = Vec::with_capacity(lowered.len() + 1);
        for (i, (abi, temp)) in lowered.iter().enumerate() {
            if variadic_boundary == Some(i) {
                parts.push("...".to_string());
            }
            parts.push(format!("{} {}", abi, temp));
        }
        if variadic_boundary == Some(lowered.len()) {
            parts.push("...".to_string());
        }
        let arg_list = parts.join(", ");

        let return_abi = self.abi_type(self.resolved(r)?);
        if return_abi.is_empty() {
            self.ins(format!("call ${}({})", self.interner.resolve(name), arg_list));
            return Ok(Temp::NULL);
        }

        let t = self.fresh_temp();
        self.ins(format!(
            "{} ={} call ${}({})",
            t,
            return_abi,
            self.interner.resolve(name),
            arg_list
        ));
        Ok(t)
    }
}
