// Position normalization
// Rewrite passes synthesize nodes without source positions; before a tree is
// handed to a printer or encoded, every node must carry one. Missing spans
// are filled from the nearest ancestor that has one, so diagnostics for
// synthesized code point at the construct they were derived from.

use super::{Expr, ExprKind, Module, Span, Stmt, StmtKind};

/// Fill every missing span in the tree from the nearest positioned ancestor.
///
/// A root-level statement with no positioned ancestor receives
/// `Span::default()`. Counterpart of the original toolchain's
/// fix-missing-locations step; every rewrite pass runs this on its output.
pub fn fix_missing_positions(module: &mut Module) {
    for stmt in &mut module.body {
        fill_stmt(stmt, Span::default());
    }
}

fn fill_stmt(stmt: &mut Stmt, inherited: Span) {
    let span = *stmt.span.get_or_insert(inherited);
    match &mut stmt.kind {
        StmtKind::FunctionDef { body, .. } => fill_block(body, span),
        StmtKind::Assign { targets, value } => {
            for target in targets {
                fill_expr(target, span);
            }
            fill_expr(value, span);
        }
        StmtKind::Return { value } => {
            if let Some(value) = value {
                fill_expr(value, span);
            }
        }
        StmtKind::Expr { value } => fill_expr(value, span),
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
        } => {
            fill_expr(target, span);
            fill_expr(iter, span);
            fill_block(body, span);
            fill_block(orelse, span);
        }
        StmtKind::If { test, body, orelse } => {
            fill_expr(test, span);
            fill_block(body, span);
            fill_block(orelse, span);
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            fill_block(body, span);
            for handler in handlers {
                let handler_span = *handler.span.get_or_insert(span);
                if let Some(exception) = &mut handler.exception {
                    fill_expr(exception, handler_span);
                }
                fill_block(&mut handler.body, handler_span);
            }
            fill_block(orelse, span);
            fill_block(finalbody, span);
        }
        StmtKind::Pass | StmtKind::Break | StmtKind::Continue => {}
    }
}

fn fill_block(block: &mut [Stmt], inherited: Span) {
    for stmt in block {
        fill_stmt(stmt, inherited);
    }
}

fn fill_expr(expr: &mut Expr, inherited: Span) {
    let span = *expr.span.get_or_insert(inherited);
    match &mut expr.kind {
        ExprKind::Name { .. } | ExprKind::Constant { .. } => {}
        ExprKind::Call {
            func,
            args,
            keywords,
        } => {
            fill_expr(func, span);
            for arg in args {
                fill_expr(arg, span);
            }
            for keyword in keywords {
                fill_expr(&mut keyword.value, span);
            }
        }
        ExprKind::Attribute { value, .. } => fill_expr(value, span),
        ExprKind::BinOp { left, right, .. } => {
            fill_expr(left, span);
            fill_expr(right, span);
        }
        ExprKind::Dict { keys, values } => {
            for key in keys {
                fill_expr(key, span);
            }
            for value in values {
                fill_expr(value, span);
            }
        }
        ExprKind::List { elts, .. } | ExprKind::Tuple { elts, .. } => {
            for elt in elts {
                fill_expr(elt, span);
            }
        }
        ExprKind::JoinedStr { values } => {
            for value in values {
                fill_expr(value, span);
            }
        }
        ExprKind::FormattedValue { value } => fill_expr(value, span),
    }
}
