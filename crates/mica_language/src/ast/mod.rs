//! The abstract syntax graph.
//!
//! The whole program is one tagged-union node type stored in an
//! id-indexed arena. The parser allocates nodes bottom-up; the semantic
//! analyzer fills every node's `resolved` type slot in place; the
//! optimizer rewrites literal-only subtrees in place; the IR generator
//! walks the finished graph read-only. Relationships are strictly
//! tree-shaped — sharing happens only through symbol tables that map
//! names back to declaration nodes.
//!
//! Datatype objects live in a separate bump arena (see
//! [`types::DataType`]); nodes hold plain references into it.

pub mod print;
pub mod types;

use mica_base::{FilePos, Symbol};

pub use types::{is_builtin, types_equal, types_match, DataType, PRIMITIVE_NAMES};

/// Index of a node in its [`AstArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef(u32);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Binary operator tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessOrEqualThan,
    GreaterThan,
    GreaterOrEqualThan,
    And,
    Or,
    /// Left: the array, right: the index.
    ArrayIndex,
    Assign,
}

impl BinaryOp {
    pub fn describe(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessOrEqualThan => "<=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterOrEqualThan => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::ArrayIndex => "[]",
            BinaryOp::Assign => "=",
        }
    }
}

/// Unary operator tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    AddressOf,
    Dereference,
    Negate,
}

impl UnaryOp {
    pub fn describe(&self) -> &'static str {
        match self {
            UnaryOp::AddressOf => "&",
            UnaryOp::Dereference => "*",
            UnaryOp::Negate => "-",
        }
    }
}

/// The integer range of a `for` loop: `for i in from..to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub from: i64,
    pub to: i64,
    pub step: u64,
    pub reverse: bool,
}

/// Per-variant payload of an AST node.
#[derive(Debug, Clone, PartialEq)]
pub enum AstKind<'t> {
    /// Ordered sequence of top-level declarations.
    TranslationUnit { body: Vec<NodeRef> },

    /// `import "path";` — parsed, not resolved.
    Import { path: Symbol },

    /// Function declaration. Parameters are [`AstKind::VariableDecl`]
    /// nodes; a trailing variadic parameter carries the variadic
    /// sentinel type and an empty name. `external` suppresses body
    /// emission.
    FunctionDecl {
        name: Symbol,
        params: Vec<NodeRef>,
        return_type: &'t DataType<'t>,
        body: Vec<NodeRef>,
        external: bool,
    },

    /// `struct Name { members }`; members are variable declarations
    /// without initialisers.
    StructDecl { name: Symbol, members: Vec<NodeRef> },

    /// `let name: type = expr;`, also used for parameters and struct
    /// members (without initialiser).
    VariableDecl {
        name: Symbol,
        ty: &'t DataType<'t>,
        init: Option<NodeRef>,
    },

    /// `field: expr` inside a struct initialiser list.
    FieldInit { name: Symbol, expr: NodeRef },

    /// `callee(args...)`. `variadic_boundary` is written by the analyzer
    /// for calls to variadic functions: the number of fixed arguments,
    /// i.e. the position at which the generator emits `...`.
    Call {
        name: Symbol,
        args: Vec<NodeRef>,
        variadic_boundary: Option<usize>,
    },

    /// `Type { field: expr, ... }`.
    StructInit { name: Symbol, fields: Vec<NodeRef> },

    /// `[expr, expr, ...]`.
    ArrayInit { exprs: Vec<NodeRef> },

    /// `cast<type>(expr)`.
    Cast {
        target: &'t DataType<'t>,
        expr: NodeRef,
    },

    If {
        cond: NodeRef,
        body: Vec<NodeRef>,
        else_body: Vec<NodeRef>,
    },

    While { cond: NodeRef, body: Vec<NodeRef> },

    For {
        ident: Symbol,
        range: Range,
        body: Vec<NodeRef>,
    },

    Return { expr: Option<NodeRef> },

    Break,
    Continue,

    /// Identifier reference.
    GetVariable { name: Symbol },

    /// `expr.member`.
    GetMember { expr: NodeRef, member: Symbol },

    Binary {
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
    },

    Unary { op: UnaryOp, operand: NodeRef },

    BoolLiteral(bool),
    CharLiteral(char),
    IntLiteral(i64),
    FloatLiteral(f64),
    StrLiteral(Symbol),
}

impl<'t> AstKind<'t> {
    /// Kind name for dumps and internal errors.
    pub fn name(&self) -> &'static str {
        match self {
            AstKind::TranslationUnit { .. } => "translation_unit",
            AstKind::Import { .. } => "import",
            AstKind::FunctionDecl { .. } => "function_declaration",
            AstKind::StructDecl { .. } => "struct_declaration",
            AstKind::VariableDecl { .. } => "variable_declaration",
            AstKind::FieldInit { .. } => "field_initializer",
            AstKind::Call { .. } => "function_call",
            AstKind::StructInit { .. } => "struct_initializer_list",
            AstKind::ArrayInit { .. } => "array_initializer_list",
            AstKind::Cast { .. } => "cast",
            AstKind::If { .. } => "if_statement",
            AstKind::While { .. } => "while_loop",
            AstKind::For { .. } => "for_loop",
            AstKind::Return { .. } => "return",
            AstKind::Break => "break",
            AstKind::Continue => "continue",
            AstKind::GetVariable { .. } => "get_variable",
            AstKind::GetMember { .. } => "get_member",
            AstKind::Binary { .. } => "binary_op",
            AstKind::Unary { .. } => "unary_op",
            AstKind::BoolLiteral(_) => "bool_literal",
            AstKind::CharLiteral(_) => "char_literal",
            AstKind::IntLiteral(_) => "integer_literal",
            AstKind::FloatLiteral(_) => "float_literal",
            AstKind::StrLiteral(_) => "string_literal",
        }
    }
}

/// One node of the syntax graph.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode<'t> {
    pub kind: AstKind<'t>,
    pub pos: FilePos,
    /// Filled by the semantic analyzer; read by optimizer and generator.
    pub resolved: Option<&'t DataType<'t>>,
}

/// Flat storage owning every AST node of one compilation.
///
/// Nodes are handed out as [`NodeRef`] indices so the analyzer and
/// optimizer can mutate nodes in place without aliasing trouble.
#[derive(Default, Debug)]
pub struct AstArena<'t> {
    nodes: Vec<AstNode<'t>>,
}

impl<'t> AstArena<'t> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn alloc(&mut self, kind: AstKind<'t>, pos: FilePos) -> NodeRef {
        let index = self.nodes.len() as u32;
        self.nodes.push(AstNode {
            kind,
            pos,
            resolved: None,
        });
        NodeRef(index)
    }

    pub fn node(&self, r: NodeRef) -> &AstNode<'t> {
        &self.nodes[r.index()]
    }

    pub fn node_mut(&mut self, r: NodeRef) -> &mut AstNode<'t> {
        &mut self.nodes[r.index()]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node refs in allocation order.
    pub fn refs(&self) -> impl Iterator<Item = NodeRef> {
        (0..self.nodes.len() as u32).map(NodeRef)
    }
}
