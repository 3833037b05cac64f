// Typed program tree for the graft rewrite engine
// This tree is produced by an external parser, rewritten by the passes in
// crate::passes, and consumed by an external printer or by crate::codec.

pub mod positions;
pub use positions::fix_missing_positions;


use serde::{Deserialize, Serialize};

/// Source position carried by every node, used only for diagnostics.
///
/// Positions are never semantically required: synthesized nodes start out
/// without one and `fix_missing_positions` fills the gaps before a tree is
/// handed to a printer or to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Span { line, column }
    }
}

impl Default for Span {
    /// The position given to a root node that never had one.
    fn default() -> Self {
        Span { line: 1, column: 0 }
    }
}

/// Root of a program tree: an ordered sequence of statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Module { body }
    }
}

/// A statement node: a kind tag plus optional source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Function definition with positional parameter names
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    /// Assignment: one or more targets, one value
    Assign { targets: Vec<Expr>, value: Expr },
    Return { value: Option<Expr> },
    /// Bare expression evaluated for effect
    Expr { value: Expr },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    /// Protected block with handlers, else and finally sections
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    Pass,
    Break,
    Continue,
}

/// One `except` arm of a `Try` statement.
///
/// `exception` is the matched exception expression (`None` catches
/// everything); `name` binds the captured failure inside `body`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExceptHandler {
    pub exception: Option<Expr>,
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub span: Option<Span>,
}

/// An expression node: a kind tag plus optional source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Identifier reference; `ctx` records read vs write use
    Name { id: String, ctx: NameContext },
    Constant { value: Literal },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<Keyword>,
    },
    /// Attribute access: `value.attr`
    Attribute {
        value: Box<Expr>,
        attr: String,
        ctx: NameContext,
    },
    BinOp {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },
    /// Dict literal; `keys` and `values` are parallel sequences
    Dict { keys: Vec<Expr>, values: Vec<Expr> },
    List { elts: Vec<Expr>, ctx: NameContext },
    Tuple { elts: Vec<Expr>, ctx: NameContext },
    /// Formatted string literal: a sequence of Constant and FormattedValue parts
    JoinedStr { values: Vec<Expr> },
    /// One interpolation hole inside a JoinedStr
    FormattedValue { value: Box<Expr> },
}

/// A keyword argument in a call; `arg` is `None` for `**spread`.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    pub arg: Option<String>,
    pub value: Expr,
}

impl Keyword {
    pub fn new(arg: impl Into<String>, value: Expr) -> Self {
        Keyword {
            arg: Some(arg.into()),
            value,
        }
    }
}

/// Whether a reference reads or writes the named slot.
///
/// Passes that synthesize references must pick the right context: a printer
/// or codec consumer downstream distinguishes assignment targets from reads
/// by this tag alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameContext {
    Load,
    Store,
}

/// Scalar constant payload of a `Constant` node.
///
/// Also the value type host configuration supplies for guard fallbacks and
/// constant rewrites, hence the serde derives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
}

impl Literal {
    /// Numeric constants are the ones bulk constant-rewrites care about.
    pub fn is_number(&self) -> bool {
        matches!(self, Literal::Int(_) | Literal::Float(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mult,
    Div,
    Mod,
}

// Constructor helpers. Rewrite passes build a lot of synthesized nodes;
// these keep them terse. Synthesized nodes carry no span until
// fix_missing_positions runs.

impl Stmt {
    pub fn new(kind: StmtKind) -> Self {
        Stmt { kind, span: None }
    }

    pub fn with_span(kind: StmtKind, span: Option<Span>) -> Self {
        Stmt { kind, span }
    }

    /// Bare expression statement.
    pub fn expr(value: Expr) -> Self {
        Stmt::new(StmtKind::Expr { value })
    }

    /// Single-target assignment.
    pub fn assign(target: Expr, value: Expr) -> Self {
        Stmt::new(StmtKind::Assign {
            targets: vec![target],
            value,
        })
    }
}

impl Expr {
    pub fn new(kind: ExprKind) -> Self {
        Expr { kind, span: None }
    }

    pub fn with_span(kind: ExprKind, span: Option<Span>) -> Self {
        Expr { kind, span }
    }

    /// Identifier in read context.
    pub fn name(id: impl Into<String>) -> Self {
        Expr::new(ExprKind::Name {
            id: id.into(),
            ctx: NameContext::Load,
        })
    }

    /// Identifier in write context, for assignment targets and loop variables.
    pub fn name_store(id: impl Into<String>) -> Self {
        Expr::new(ExprKind::Name {
            id: id.into(),
            ctx: NameContext::Store,
        })
    }

    pub fn constant(value: Literal) -> Self {
        Expr::new(ExprKind::Constant { value })
    }

    pub fn int(value: i64) -> Self {
        Expr::constant(Literal::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::constant(Literal::Str(value.into()))
    }

    pub fn call(func: Expr, args: Vec<Expr>, keywords: Vec<Keyword>) -> Self {
        Expr::new(ExprKind::Call {
            func: Box::new(func),
            args,
            keywords,
        })
    }

    pub fn attribute(value: Expr, attr: impl Into<String>) -> Self {
        Expr::new(ExprKind::Attribute {
            value: Box::new(value),
            attr: attr.into(),
            ctx: NameContext::Load,
        })
    }

    pub fn binop(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::new(ExprKind::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    /// Build a read-context attribute chain from a dotted path.
    ///
    /// `"logging.warning"` becomes `Attribute(Name("logging"), "warning")`;
    /// a path without dots is a plain `Name`.
    pub fn dotted(path: &str) -> Self {
        let mut parts = path.split('.');
        let first = parts.next().unwrap_or_default();
        let mut expr = Expr::name(first);
        for part in parts {
            expr = Expr::attribute(expr, part);
        }
        expr
    }

    /// Render a callee expression back into a dotted path, if it is one.
    ///
    /// Returns `None` for anything other than a `Name` or a chain of
    /// `Attribute`s ending in a `Name`, which is what lets registry lookups
    /// ignore computed callees like `funcs[0]()`.
    pub fn dotted_path(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Name { id, .. } => Some(id.clone()),
            ExprKind::Attribute { value, attr, .. } => {
                let base = value.dotted_path()?;
                Some(format!("{base}.{attr}"))
            }
            _ => None,
        }
    }

    /// True when this is a bare identifier equal to `id`, in any context.
    pub fn is_name(&self, id: &str) -> bool {
        matches!(&self.kind, ExprKind::Name { id: n, .. } if n == id)
    }
}
