//! Traversal protocol over the program tree.
//!
//! Two disciplines, each a trait plus free `walk_*` functions for the
//! default recursion:
//!
//! - [`Visitor`]: read-only depth-first pre-order traversal, for analysis
//!   and collection passes.
//! - [`Transformer`]: owning rewrite traversal. Expressions are replaced
//!   one-for-one; statements sit in sequence contexts and may be replaced
//!   by zero, one, or many statements.
//!
//! Implement the trait for your pass and override only the methods you
//! need. Call the matching `walk_*` function inside an override to continue
//! the default recursion; return without calling it to prune the traversal
//! at that node. A kind your pass does not recognize simply falls through
//! to the default method and is recursed into; an unknown shape is never
//! an error here.
//!
//! Each node is visited exactly once per traversal. The relative order in
//! which sibling subtrees are visited is unspecified and must not be relied
//! upon; a transformer must not reach into a sibling's subtree from inside
//! a handler.

use crate::ast::{ExceptHandler, Expr, ExprKind, Module, Stmt, StmtKind};

// ============================================================================
// Visitor (read-only)
// ============================================================================

/// Read-only tree visitor. Default implementations recurse into every child
/// field in declaration order, sequence fields in index order.
pub trait Visitor: Sized {
    fn visit_module(&mut self, module: &Module) {
        walk_module(self, module);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    fn visit_except_handler(&mut self, handler: &ExceptHandler) {
        walk_except_handler(self, handler);
    }
}

pub fn walk_module<V: Visitor>(visitor: &mut V, module: &Module) {
    for stmt in &module.body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::FunctionDef { body, .. } => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::Assign { targets, value } => {
            for target in targets {
                visitor.visit_expr(target);
            }
            visitor.visit_expr(value);
        }
        StmtKind::Return { value } => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Expr { value } => visitor.visit_expr(value),
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
        } => {
            visitor.visit_expr(target);
            visitor.visit_expr(iter);
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
            for stmt in orelse {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::If { test, body, orelse } => {
            visitor.visit_expr(test);
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
            for stmt in orelse {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            for stmt in body {
                visitor.visit_stmt(stmt);
            }
            for handler in handlers {
                visitor.visit_except_handler(handler);
            }
            for stmt in orelse {
                visitor.visit_stmt(stmt);
            }
            for stmt in finalbody {
                visitor.visit_stmt(stmt);
            }
        }
        StmtKind::Pass | StmtKind::Break | StmtKind::Continue => {}
    }
}

pub fn walk_except_handler<V: Visitor>(visitor: &mut V, handler: &ExceptHandler) {
    if let Some(exception) = &handler.exception {
        visitor.visit_expr(exception);
    }
    for stmt in &handler.body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Name { .. } | ExprKind::Constant { .. } => {}
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            visitor.visit_expr(func);
            for arg in args {
                visitor.visit_expr(arg);
            }
            for keyword in keywords {
                visitor.visit_expr(&keyword.value);
            }
        }
        ExprKind::Attribute { value, .. } => visitor.visit_expr(value),
        ExprKind::BinOp { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Dict { keys, values } => {
            for key in keys {
                visitor.visit_expr(key);
            }
            for value in values {
                visitor.visit_expr(value);
            }
        }
        ExprKind::List { elts, .. } | ExprKind::Tuple { elts, .. } => {
            for elt in elts {
                visitor.visit_expr(elt);
            }
        }
        ExprKind::JoinedStr { values } => {
            for value in values {
                visitor.visit_expr(value);
            }
        }
        ExprKind::FormattedValue { value } => visitor.visit_expr(value),
    }
}

// ============================================================================
// Transformer (rewrite)
// ============================================================================

/// Owning rewrite traversal.
///
/// `transform_stmt` returns the replacement statement sequence for one
/// statement: return `vec![stmt]` to keep it, an empty vector to delete it,
/// or several statements to expand it. `transform_expr` replaces an
/// expression one-for-one.
///
/// The input tree is consumed; a transformer is a pure `Module -> Module`
/// function from the caller's point of view even though it rebuilds nodes
/// in place internally.
pub trait Transformer: Sized {
    fn transform_module(&mut self, module: Module) -> Module {
        Module {
            body: transform_block(self, module.body),
        }
    }

    fn transform_stmt(&mut self, stmt: Stmt) -> Vec<Stmt> {
        walk_transform_stmt(self, stmt)
    }

    fn transform_expr(&mut self, expr: Expr) -> Expr {
        walk_transform_expr(self, expr)
    }
}

/// Rebuild a statement sequence by flat-mapping `transform_stmt`, which is
/// what lets a single statement disappear or fan out into several.
pub fn transform_block<T: Transformer>(transformer: &mut T, block: Vec<Stmt>) -> Vec<Stmt> {
    block
        .into_iter()
        .flat_map(|stmt| transformer.transform_stmt(stmt))
        .collect()
}

/// Default statement recursion: rebuild the node from transformed children
/// and keep it as a single statement.
pub fn walk_transform_stmt<T: Transformer>(transformer: &mut T, stmt: Stmt) -> Vec<Stmt> {
    let Stmt { kind, span } = stmt;
    let kind = match kind {
        StmtKind::FunctionDef { name, params, body } => StmtKind::FunctionDef {
            name,
            params,
            body: transform_block(transformer, body),
        },
        StmtKind::Assign { targets, value } => StmtKind::Assign {
            targets: targets
                .into_iter()
                .map(|target| transformer.transform_expr(target))
                .collect(),
            value: transformer.transform_expr(value),
        },
        StmtKind::Return { value } => StmtKind::Return {
            value: value.map(|value| transformer.transform_expr(value)),
        },
        StmtKind::Expr { value } => StmtKind::Expr {
            value: transformer.transform_expr(value),
        },
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
        } => StmtKind::For {
            target: transformer.transform_expr(target),
            iter: transformer.transform_expr(iter),
            body: transform_block(transformer, body),
            orelse: transform_block(transformer, orelse),
        },
        StmtKind::If { test, body, orelse } => StmtKind::If {
            test: transformer.transform_expr(test),
            body: transform_block(transformer, body),
            orelse: transform_block(transformer, orelse),
        },
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => StmtKind::Try {
            body: transform_block(transformer, body),
            handlers: handlers
                .into_iter()
                .map(|handler| walk_transform_except_handler(transformer, handler))
                .collect(),
            orelse: transform_block(transformer, orelse),
            finalbody: transform_block(transformer, finalbody),
        },
        kind @ (StmtKind::Pass | StmtKind::Break | StmtKind::Continue) => kind,
    };
    vec![Stmt { kind, span }]
}

pub fn walk_transform_except_handler<T: Transformer>(
    transformer: &mut T,
    handler: ExceptHandler,
) -> ExceptHandler {
    ExceptHandler {
        exception: handler
            .exception
            .map(|exception| transformer.transform_expr(exception)),
        name: handler.name,
        body: transform_block(transformer, handler.body),
        span: handler.span,
    }
}

/// Default expression recursion: rebuild the node from transformed children.
pub fn walk_transform_expr<T: Transformer>(transformer: &mut T, expr: Expr) -> Expr {
    let Expr { kind, span } = expr;
    let kind = match kind {
        kind @ (ExprKind::Name { .. } | ExprKind::Constant { .. }) => kind,
        ExprKind::Call {
            func,
            args,
            keywords,
        } => ExprKind::Call {
            func: Box::new(transformer.transform_expr(*func)),
            args: args
                .into_iter()
                .map(|arg| transformer.transform_expr(arg))
                .collect(),
            keywords: keywords
                .into_iter()
                .map(|mut keyword| {
                    keyword.value = transformer.transform_expr(keyword.value);
                    keyword
                })
                .collect(),
        },
        ExprKind::Attribute { value, attr, ctx } => ExprKind::Attribute {
            value: Box::new(transformer.transform_expr(*value)),
            attr,
            ctx,
        },
        ExprKind::BinOp { left, op, right } => ExprKind::BinOp {
            left: Box::new(transformer.transform_expr(*left)),
            op,
            right: Box::new(transformer.transform_expr(*right)),
        },
        ExprKind::Dict { keys, values } => ExprKind::Dict {
            keys: keys
                .into_iter()
                .map(|key| transformer.transform_expr(key))
                .collect(),
            values: values
                .into_iter()
                .map(|value| transformer.transform_expr(value))
                .collect(),
        },
        ExprKind::List { elts, ctx } => ExprKind::List {
            elts: elts
                .into_iter()
                .map(|elt| transformer.transform_expr(elt))
                .collect(),
            ctx,
        },
        ExprKind::Tuple { elts, ctx } => ExprKind::Tuple {
            elts: elts
                .into_iter()
                .map(|elt| transformer.transform_expr(elt))
                .collect(),
            ctx,
        },
        ExprKind::JoinedStr { values } => ExprKind::JoinedStr {
            values: values
                .into_iter()
                .map(|value| transformer.transform_expr(value))
                .collect(),
        },
        ExprKind::FormattedValue { value } => ExprKind::FormattedValue {
            value: Box::new(transformer.transform_expr(*value)),
        },
    };
    Expr { kind, span }
}
