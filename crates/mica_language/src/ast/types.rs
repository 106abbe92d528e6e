//! Datatypes of the mica source language.
//!
//! A datatype is one of four kinds: a primitive (one of the builtin
//! keywords or a user struct name), a pointer to a base type, an array of
//! a base type with a compile-time element count, or the variadic
//! sentinel that marks the trailing `...` of a parameter list.
//!
//! Pointer and array bases are plain references into the compilation's
//! type [`Arena`](mica_base::Arena); the parser builds modifier chains out
//! of them and the analyzer synthesises new ones (e.g. pointer-of for an
//! address-of expression) into the same arena so every later stage can
//! reference datatypes uniformly.

use mica_base::{Interner, Symbol};

/// The builtin primitive type names.
pub const PRIMITIVE_NAMES: &[&str] = &[
    "void", "bool", "char", "i8", "u8", "i16", "u16", "i32", "u32", "i64", "u64", "f32", "f64",
];

/// A source-language datatype.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataType<'t> {
    /// A builtin keyword (`i32`, `bool`, ...) or a struct name.
    Primitive(Symbol),
    /// Pointer to a base type.
    Pointer(&'t DataType<'t>),
    /// Array of `len` elements of a base type.
    Array { elem: &'t DataType<'t>, len: usize },
    /// The trailing `...` of a variadic parameter list.
    Variadic,
}

impl<'t> DataType<'t> {
    /// Strips pointer and array layers down to the primitive (or variadic)
    /// core.
    pub fn underlying(&self) -> &DataType<'t> {
        match self {
            DataType::Pointer(base) => base.underlying(),
            DataType::Array { elem, .. } => elem.underlying(),
            other => other,
        }
    }

    /// The struct name, if this type is directly a non-builtin primitive.
    pub fn struct_name(&self, interner: &Interner) -> Option<Symbol> {
        match self {
            DataType::Primitive(sym) if !is_builtin(*sym, interner) => Some(*sym),
            _ => None,
        }
    }

    /// Renders the type the way it is written in source, e.g. `i32*[2]`.
    pub fn display(&self, interner: &Interner) -> String {
        match self {
            DataType::Primitive(sym) => interner.resolve(*sym).to_string(),
            DataType::Pointer(base) => format!("{}*", base.display(interner)),
            DataType::Array { elem, len } => format!("{}[{}]", elem.display(interner), len),
            DataType::Variadic => "...".to_string(),
        }
    }
}

/// `true` if `sym` names one of the builtin primitives.
pub fn is_builtin(sym: Symbol, interner: &Interner) -> bool {
    PRIMITIVE_NAMES.contains(&interner.resolve(sym))
}

/// Structural equality: kinds match and payloads match recursively.
pub fn types_equal(a: &DataType, b: &DataType) -> bool {
    match (a, b) {
        (DataType::Primitive(x), DataType::Primitive(y)) => x == y,
        (DataType::Pointer(x), DataType::Pointer(y)) => types_equal(x, y),
        (DataType::Array { elem: x, len: n }, DataType::Array { elem: y, len: m }) => {
            n == m && types_equal(x, y)
        }
        (DataType::Variadic, DataType::Variadic) => true,
        _ => false,
    }
}

/// Equality with one-directional pointer-from-array decay: a pointer on
/// the left also matches an array on the right when their bases are
/// equal. The reverse does not hold.
pub fn types_match(left: &DataType, right: &DataType) -> bool {
    if types_equal(left, right) {
        return true;
    }
    match (left, right) {
        (DataType::Pointer(base), DataType::Array { elem, .. }) => types_equal(base, elem),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mica_base::Arena;

    fn prim<'t>(
        arena: &'t Arena<DataType<'t>>,
        interner: &mut Interner,
        name: &str,
    ) -> &'t DataType<'t> {
        let sym = interner.intern(name);
        arena.alloc(DataType::Primitive(sym))
    }

    #[test]
    fn primitive_equality_is_by_name() {
        let arena = Arena::new();
        let mut interner = Interner::new();
        let a = prim(&arena, &mut interner, "i32");
        let b = prim(&arena, &mut interner, "i32");
        let c = prim(&arena, &mut interner, "u32");
        assert!(types_equal(a, b));
        assert!(!types_equal(a, c));
    }

    #[test]
    fn pointer_equality_follows_bases() {
        let arena = Arena::new();
        let mut interner = Interner::new();
        let i32_ty = prim(&arena, &mut interner, "i32");
        let u8_ty = prim(&arena, &mut interner, "u8");
        let p1 = arena.alloc(DataType::Pointer(i32_ty));
        let p2 = arena.alloc(DataType::Pointer(i32_ty));
        let p3 = arena.alloc(DataType::Pointer(u8_ty));
        assert!(types_equal(p1, p2));
        assert!(!types_equal(p1, p3));
    }

    #[test]
    fn array_equality_requires_matching_counts() {
        let arena = Arena::new();
        let mut interner = Interner::new();
        let i32_ty = prim(&arena, &mut interner, "i32");
        let a = arena.alloc(DataType::Array { elem: i32_ty, len: 2 });
        let b = arena.alloc(DataType::Array { elem: i32_ty, len: 2 });
        let c = arena.alloc(DataType::Array { elem: i32_ty, len: 3 });
        assert!(types_equal(a, b));
        assert!(!types_equal(a, c));
    }

    #[test]
    fn pointer_matches_array_one_way() {
        let arena = Arena::new();
        let mut interner = Interner::new();
        let ch = prim(&arena, &mut interner, "char");
        let ptr = arena.alloc(DataType::Pointer(ch));
        let arr = arena.alloc(DataType::Array { elem: ch, len: 6 });
        assert!(types_match(ptr, arr));
        assert!(!types_match(arr, ptr));
    }

    #[test]
    fn underlying_strips_all_layers() {
        let arena = Arena::new();
        let mut interner = Interner::new();
        let i32_ty = prim(&arena, &mut interner, "i32");
        let ptr = arena.alloc(DataType::Pointer(i32_ty));
        let arr = arena.alloc(DataType::Array { elem: ptr, len: 2 });
        assert!(types_equal(arr.underlying(), i32_ty));
    }

    #[test]
    fn display_writes_source_syntax() {
        let arena = Arena::new();
        let mut interner = Interner::new();
        let i32_ty = prim(&arena, &mut interner, "i32");
        let ptr = arena.alloc(DataType::Pointer(i32_ty));
        let arr = arena.alloc(DataType::Array { elem: ptr, len: 2 });
        assert_eq!(arr.display(&interner), "i32*[2]");
    }

    #[test]
    fn builtin_names_are_recognised() {
        let mut interner = Interner::new();
        let sym = interner.intern("f64");
        let user = interner.intern("Point");
        assert!(is_builtin(sym, &interner));
        assert!(!is_builtin(user, &interner));
    }
}
