//! Source type → IR type mapping, sizes and layout.
//!
//! The backend's abstract machine knows four base types (`w` 32-bit int,
//! `l` 64-bit int/pointer, `s` single float, `d` double float), extended
//! ABI specifiers for sub-word call boundaries (`sb ub sh uh`), and one
//! typed load/store instruction per width. Every source type maps to
//! exactly one of each.
//!
//! Struct layout is declaration order with no padding: the aggregate
//! size is the sum of the field sizes and a member's offset is the sum
//! of the sizes before it.

use mica_base::{CompileError, FilePos, Result, Symbol};
use mica_language::ast::DataType;
use mica_language::NodeRef;

use super::context::Aggregate;
use super::Generator;

impl<'a, 't> Generator<'a, 't> {
    /// `true` if `ty` is directly the named primitive.
    pub(super) fn prim_named(&self, ty: &DataType, name: &str) -> bool {
        matches!(ty, DataType::Primitive(sym) if self.interner.matches(*sym, name))
    }

    /// The in-function SSA base type: `w`, `l`, `s` or `d`.
    ///
    /// `None` for `void` and aggregate types, which have no base
    /// character.
    pub(super) fn base_char(&self, ty: &DataType) -> Option<char> {
        match ty {
            DataType::Pointer(_) | DataType::Array { .. } => Some('l'),
            DataType::Primitive(sym) => match self.interner.resolve(*sym) {
                "bool" | "char" | "i8" | "u8" | "i16" | "u16" | "i32" | "u32" => Some('w'),
                "i64" | "u64" => Some('l'),
                "f32" => Some('s'),
                "f64" => Some('d'),
                _ => None,
            },
            DataType::Variadic => None,
        }
    }

    /// The ABI type used at call boundaries and returns.
    ///
    /// Empty for `void`; `:Name` for aggregates.
    pub(super) fn abi_type(&self, ty: &DataType) -> String {
        match ty {
            DataType::Pointer(_) | DataType::Array { .. } => "l".to_string(),
            DataType::Primitive(sym) => {
                let tag = match self.interner.resolve(*sym) {
                    "void" => "",
                    "bool" | "char" | "u8" => "ub",
                    "i8" => "sb",
                    "i16" => "sh",
                    "u16" => "uh",
                    "i32" | "u32" => "w",
                    "i64" | "u64" => "l",
                    "f32" => "s",
                    "f64" => "d",
                    name => return format!(":{}", name),
                };
                tag.to_string()
            }
            DataType::Variadic => String::new(),
        }
    }

    /// The store instruction for values of `ty`.
    pub(super) fn store_ins(&self, ty: &DataType, pos: FilePos) -> Result<&'static str> {
        let ins = match ty {
            DataType::Pointer(_) | DataType::Array { .. } => "storel",
            DataType::Primitive(sym) => match self.interner.resolve(*sym) {
                "bool" | "char" | "i8" | "u8" => "storeb",
                "i16" | "u16" => "storeh",
                "i32" | "u32" => "storew",
                "i64" | "u64" => "storel",
                "f32" => "stores",
                "f64" => "stored",
                name => {
                    return Err(CompileError::internal(
                        format!("store instruction not implemented for type '{}'", name),
                        pos,
                    ));
                }
            },
            DataType::Variadic => {
                return Err(CompileError::internal("cannot store a variadic value", pos));
            }
        };
        Ok(ins)
    }

    /// The load instruction for values of `ty`, with the base type of the
    /// loaded temporary.
    pub(super) fn load_ins(&self, ty: &DataType, pos: FilePos) -> Result<(char, &'static str)> {
        let pair = match ty {
            DataType::Pointer(_) | DataType::Array { .. } => ('l', "loadl"),
            DataType::Primitive(sym) => match self.interner.resolve(*sym) {
                "bool" | "char" | "u8" => ('w', "loadub"),
                "i8" => ('w', "loadsb"),
                "i16" => ('w', "loadsh"),
                "u16" => ('w', "loaduh"),
                "i32" => ('w', "loadsw"),
                "u32" => ('w', "loaduw"),
                "i64" | "u64" => ('l', "loadl"),
                "f32" => ('s', "loads"),
                "f64" => ('d', "loadd"),
                name => {
                    return Err(CompileError::internal(
                        format!("load instruction not implemented for type '{}'", name),
                        pos,
                    ));
                }
            },
            DataType::Variadic => {
                return Err(CompileError::internal("cannot load a variadic value", pos));
            }
        };
        Ok(pair)
    }

    /// Size of `ty` in bytes.
    pub(super) fn type_size(&self, ty: &DataType, pos: FilePos) -> Result<usize> {
        match ty {
            DataType::Pointer(_) => Ok(8),
            DataType::Array { elem, len } => Ok(self.type_size(elem, pos)? * len),
            DataType::Primitive(sym) => match self.interner.resolve(*sym) {
                "bool" | "char" | "i8" | "u8" => Ok(1),
                "i16" | "u16" => Ok(2),
                "i32" | "u32" | "f32" => Ok(4),
                "i64" | "u64" | "f64" => Ok(8),
                name => {
                    let Some(agg) = self.find_aggregate(*sym) else {
                        return Err(CompileError::internal(
                            format!("size not implemented for type '{}'", name),
                            pos,
                        ));
                    };
                    self.aggregate_size(agg, pos)
                }
            },
            DataType::Variadic => {
                Err(CompileError::internal("a variadic marker has no size", pos))
            }
        }
    }

    /// Sum of the field sizes; fields are laid out with no padding.
    pub(super) fn aggregate_size(&self, agg: Aggregate, pos: FilePos) -> Result<usize> {
        let mut size = 0;
        for member in self.struct_member_decls(agg.decl) {
            let (_, ty) = self.variable_decl(member);
            size += self.type_size(ty, pos)?;
        }
        Ok(size)
    }

    /// Byte offset of a named member: the sum of the preceding field
    /// sizes.
    pub(super) fn member_offset(
        &self,
        agg: Aggregate,
        member: Symbol,
        pos: FilePos,
    ) -> Result<usize> {
        let mut offset = 0;
        for candidate in self.struct_member_decls(agg.decl) {
            let (name, ty) = self.variable_decl(candidate);
            if name == member {
                return Ok(offset);
            }
            offset += self.type_size(ty, pos)?;
        }
        Err(CompileError::internal(
            format!(
                "struct '{}' has no member called '{}'",
                self.interner.resolve(agg.name),
                self.interner.resolve(member)
            ),
            pos,
        ))
    }

    /// Declared type of a named member.
    pub(super) fn member_type(
        &self,
        agg: Aggregate,
        member: Symbol,
        pos: FilePos,
    ) -> Result<&'t DataType<'t>> {
        for candidate in self.struct_member_decls(agg.decl) {
            let (name, ty) = self.variable_decl(candidate);
            if name == member {
                return Ok(ty);
            }
        }
        Err(CompileError::internal(
            format!(
                "struct '{}' has no member called '{}'",
                self.interner.resolve(agg.name),
                self.interner.resolve(member)
            ),
            pos,
        ))
    }

    /// Signedness drives the comparison opcode choice.
    pub(super) fn is_signed(&self, ty: &DataType) -> bool {
        match ty {
            DataType::Primitive(sym) => matches!(
                self.interner.resolve(*sym),
                "i8" | "i16" | "i32" | "i64" | "f32" | "f64"
            ),
            _ => false,
        }
    }

    /// Widening instruction applied to sub-word operands before a
    /// comparison; `None` for word-sized and larger types.
    pub(super) fn compare_extend(&self, ty: &DataType) -> Option<&'static str> {
        match ty {
            DataType::Primitive(sym) => match self.interner.resolve(*sym) {
                "bool" | "char" | "u8" => Some("extub"),
                "i8" => Some("extsb"),
                "u16" => Some("extuh"),
                "i16" => Some("extsh"),
                _ => None,
            },
            _ => None,
        }
    }
}

// Shared AST accessors used across the generator.
impl<'a, 't> Generator<'a, 't> {
    /// Member declaration nodes of a struct declaration.
    pub(super) fn struct_member_decls(&self, decl: NodeRef) -> Vec<NodeRef> {
        match &self.ast.node(decl).kind {
            mica_language::ast::AstKind::StructDecl { members, .. } => members.clone(),
            other => unreachable!("aggregate table points at {}", other.name()),
        }
    }

    /// Name and declared type of a variable-declaration node.
    pub(super) fn variable_decl(&self, decl: NodeRef) -> (Symbol, &'t DataType<'t>) {
        match &self.ast.node(decl).kind {
            mica_language::ast::AstKind::VariableDecl { name, ty, .. } => (*name, *ty),
            other => unreachable!("expected a variable declaration, found {}", other.name()),
        }
    }

    /// Resolved type of a node; analysis guarantees it is present.
    pub(super) fn resolved(&self, r: NodeRef) -> Result<&'t DataType<'t>> {
        self.ast.node(r).resolved.ok_or_else(|| {
            CompileError::internal(
                format!("{} reached the generator unresolved", self.ast.node(r).kind.name()),
                self.ast.node(r).pos,
            )
        })
    }
}
