//! Abstract Syntax Tree for OmniLang.
//!
//! Every node carries the source span it was parsed from; a node's span
//! encloses the spans of all of its children. Nodes are built once by the
//! parser and never mutated afterward. The tree has no cycles: each node
//! exclusively owns its children.

use crate::diag::Span;

/// A parsed source file: imports first, then top-level declarations,
/// both in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
    pub span: Span,
}

/// `import a.b.c` or `import a.b.c as name`.
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub path: Vec<String>,
    pub alias: Option<String>,
    pub span: Span,
}

impl Import {
    /// The dotted path as written, e.g. `std.io`.
    pub fn dotted(&self) -> String {
        self.path.join(".")
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Let(GlobalBinding),
    Var(GlobalBinding),
    Struct(StructDecl),
    Enum(EnumDecl),
    Func(FuncDecl),
    TypeAlias(TypeAliasDecl),
}

impl Decl {
    pub fn span(&self) -> Span {
        match self {
            Decl::Let(b) | Decl::Var(b) => b.span,
            Decl::Struct(s) => s.span,
            Decl::Enum(e) => e.span,
            Decl::Func(f) => f.span,
            Decl::TypeAlias(t) => t.span,
        }
    }
}

/// Top-level `let`/`var` binding.
#[derive(Debug, Clone, PartialEq)]
pub struct GlobalBinding {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub value: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: FuncBody,
    pub is_async: bool,
    pub span: Span,
}

/// A function body is either a braced block or a `=>` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FuncBody {
    Block(Block),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeAliasDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub ty: TypeExpr,
    pub span: Span,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block(Block),
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Expr(Expr),
    If {
        cond: Expr,
        then_block: Block,
        /// Either `Stmt::Block` or a chained `Stmt::If`.
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        cond: Expr,
        body: Block,
        span: Span,
    },
    For(ForStmt),
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Try {
        body: Block,
        /// Matched top-down, in source order.
        catches: Vec<CatchClause>,
        finally: Option<Block>,
        span: Span,
    },
    Throw {
        value: Expr,
        span: Span,
    },
    /// `let`/`var` inside a function body.
    Binding {
        mutable: bool,
        name: String,
        ty: Option<TypeExpr>,
        value: Option<Expr>,
        span: Span,
    },
    /// `name := expr`
    ShortVarDecl {
        name: String,
        value: Expr,
        span: Span,
    },
    Assignment {
        target: Expr,
        value: Expr,
        span: Span,
    },
    Increment {
        target: Expr,
        op: IncOp,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(b) => b.span,
            Stmt::Return { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Try { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Binding { span, .. }
            | Stmt::ShortVarDecl { span, .. }
            | Stmt::Assignment { span, .. }
            | Stmt::Increment { span, .. } => *span,
            Stmt::Expr(e) => e.span(),
            Stmt::For(f) => f.span,
        }
    }
}

/// The two `for` shapes share one node. Exactly one shape is populated:
/// range form carries `target` + `iterable`; classic form carries
/// `init`/`condition`/`post`. The body is always set.
#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub is_range: bool,
    pub target: Option<String>,
    pub iterable: Option<Expr>,
    pub init: Option<Box<Stmt>>,
    pub condition: Option<Expr>,
    pub post: Option<Box<Stmt>>,
    pub body: Block,
    pub span: Span,
}

impl ForStmt {
    pub fn range(target: String, iterable: Expr, body: Block, span: Span) -> Self {
        ForStmt {
            is_range: true,
            target: Some(target),
            iterable: Some(iterable),
            init: None,
            condition: None,
            post: None,
            body,
            span,
        }
    }

    pub fn classic(
        init: Option<Stmt>,
        condition: Option<Expr>,
        post: Option<Stmt>,
        body: Block,
        span: Span,
    ) -> Self {
        ForStmt {
            is_range: false,
            target: None,
            iterable: None,
            init: init.map(Box::new),
            condition,
            post: post.map(Box::new),
            body,
            span,
        }
    }
}

/// `catch (name: Type) { … }`; the binder and its type are both optional.
#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub binder: Option<String>,
    pub binder_type: Option<TypeExpr>,
    pub body: Block,
    pub span: Span,
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    Int,
    Float,
    String,
    Char,
    Bool,
    Null,
    Hex,
    Binary,
}

impl LitKind {
    pub fn name(self) -> &'static str {
        match self {
            LitKind::Int => "int",
            LitKind::Float => "float",
            LitKind::String => "string",
            LitKind::Char => "char",
            LitKind::Bool => "bool",
            LitKind::Null => "null",
            LitKind::Hex => "hex",
            LitKind::Binary => "binary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncOp {
    Inc,
    Dec,
}

impl IncOp {
    pub fn as_str(self) -> &'static str {
        match self {
            IncOp::Inc => "++",
            IncOp::Dec => "--",
        }
    }
}

/// One segment of an interpolated string, in source order. Literal chunks
/// and expression parts alternate as written.
#[derive(Debug, Clone, PartialEq)]
pub enum InterpPart {
    Literal { text: String, span: Span },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier {
        name: String,
        span: Span,
    },
    Literal {
        kind: LitKind,
        /// The raw (normalized) token text; escapes are left as written.
        raw: String,
        span: Span,
    },
    StringInterp {
        parts: Vec<InterpPart>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Member {
        target: Box<Expr>,
        name: String,
        span: Span,
    },
    ArrayLiteral {
        elements: Vec<Expr>,
        span: Span,
    },
    MapLiteral {
        entries: Vec<(Expr, Expr)>,
        span: Span,
    },
    StructLiteral {
        type_name: TypeExpr,
        fields: Vec<(String, Expr)>,
        span: Span,
    },
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
        span: Span,
    },
    Increment {
        target: Box<Expr>,
        op: IncOp,
        span: Span,
    },
    New {
        ty: TypeExpr,
        span: Span,
    },
    Delete {
        target: Box<Expr>,
        span: Span,
    },
    Lambda {
        params: Vec<Param>,
        body: Box<Expr>,
        span: Span,
    },
    Cast {
        ty: TypeExpr,
        expr: Box<Expr>,
        span: Span,
    },
    Await {
        expr: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Identifier { span, .. }
            | Expr::Literal { span, .. }
            | Expr::StringInterp { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Call { span, .. }
            | Expr::Index { span, .. }
            | Expr::Member { span, .. }
            | Expr::ArrayLiteral { span, .. }
            | Expr::MapLiteral { span, .. }
            | Expr::StructLiteral { span, .. }
            | Expr::Assignment { span, .. }
            | Expr::Increment { span, .. }
            | Expr::New { span, .. }
            | Expr::Delete { span, .. }
            | Expr::Lambda { span, .. }
            | Expr::Cast { span, .. }
            | Expr::Await { span, .. } => *span,
        }
    }
}

// ============================================================================
// Type expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A (possibly qualified, possibly generic) named type: `pkg.Map<K, V>`.
    Named {
        name: String,
        args: Vec<TypeExpr>,
        span: Span,
    },
    /// A reference to an in-scope type parameter.
    Generic {
        name: String,
        span: Span,
    },
    Union {
        members: Vec<TypeExpr>,
        span: Span,
    },
    Optional {
        inner: Box<TypeExpr>,
        span: Span,
    },
    Function {
        params: Vec<TypeExpr>,
        ret: Box<TypeExpr>,
        span: Span,
    },
    Pointer {
        inner: Box<TypeExpr>,
        span: Span,
    },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. }
            | TypeExpr::Generic { span, .. }
            | TypeExpr::Union { span, .. }
            | TypeExpr::Optional { span, .. }
            | TypeExpr::Function { span, .. }
            | TypeExpr::Pointer { span, .. } => *span,
        }
    }

    /// Render the type the way it was written, for printing and for the
    /// backend's source-type strings.
    pub fn source_text(&self) -> String {
        match self {
            TypeExpr::Named { name, args, .. } => {
                if args.is_empty() {
                    name.clone()
                } else {
                    let inner: Vec<String> = args.iter().map(TypeExpr::source_text).collect();
                    format!("{}<{}>", name, inner.join(", "))
                }
            }
            TypeExpr::Generic { name, .. } => name.clone(),
            TypeExpr::Union { members, .. } => {
                let inner: Vec<String> = members.iter().map(TypeExpr::source_text).collect();
                inner.join(" | ")
            }
            TypeExpr::Optional { inner, .. } => format!("{}?", inner.source_text()),
            TypeExpr::Function { params, ret, .. } => {
                let inner: Vec<String> = params.iter().map(TypeExpr::source_text).collect();
                format!("({}) -> {}", inner.join(", "), ret.source_text())
            }
            TypeExpr::Pointer { inner, .. } => format!("*{}", inner.source_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Position;

    fn span(l1: u32, c1: u32, l2: u32, c2: u32) -> Span {
        Span::new(Position::new(l1, c1), Position::new(l2, c2))
    }

    #[test]
    fn test_for_constructors_keep_shapes_disjoint() {
        let body = Block {
            stmts: vec![],
            span: span(1, 10, 1, 12),
        };
        let range = ForStmt::range(
            "x".to_string(),
            Expr::Identifier {
                name: "xs".to_string(),
                span: span(1, 6, 1, 8),
            },
            body.clone(),
            span(1, 1, 1, 12),
        );
        assert!(range.is_range);
        assert!(range.target.is_some() && range.iterable.is_some());
        assert!(range.init.is_none() && range.condition.is_none() && range.post.is_none());

        let classic = ForStmt::classic(None, None, None, body, span(1, 1, 1, 12));
        assert!(!classic.is_range);
        assert!(classic.target.is_none() && classic.iterable.is_none());
    }

    #[test]
    fn test_type_source_text() {
        let t = TypeExpr::Optional {
            inner: Box::new(TypeExpr::Named {
                name: "map".to_string(),
                args: vec![
                    TypeExpr::Named {
                        name: "string".to_string(),
                        args: vec![],
                        span: span(1, 5, 1, 11),
                    },
                    TypeExpr::Named {
                        name: "int".to_string(),
                        args: vec![],
                        span: span(1, 13, 1, 16),
                    },
                ],
                span: span(1, 1, 1, 17),
            }),
            span: span(1, 1, 1, 18),
        };
        assert_eq!(t.source_text(), "map<string, int>?");
    }

    #[test]
    fn test_import_dotted() {
        let import = Import {
            path: vec!["std".to_string(), "io".to_string()],
            alias: None,
            span: span(1, 1, 1, 14),
        };
        assert_eq!(import.dotted(), "std.io");
    }
}
