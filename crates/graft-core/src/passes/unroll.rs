// Loop-unrolling pass
// Replaces a simple bounded counting loop with an equivalent sequence that
// performs the same iterations with less loop-control overhead: a driving
// loop stepping by the unroll factor whose body is the original body
// duplicated once per offset, plus a fully unrolled remainder for the
// iterations that do not divide evenly.

use tracing::debug;

use crate::ast::{
    fix_missing_positions, BinaryOp, Expr, ExprKind, Literal, Module, NameContext, Span, Stmt,
    StmtKind,
};
use crate::visit::{
    transform_block, walk_stmt, walk_transform_expr, walk_transform_stmt, Transformer, Visitor,
};

use super::Pass;

/// Unrolls `for v in range(N): body` when `N` is a literal integer constant.
///
/// Eligibility is checked in order, short-circuiting on the first failure:
/// the loop target must be a single bare name; the iterated expression must
/// be a call to the configured range-like primitive with exactly one
/// positional argument; that argument must be a literal integer; and the
/// loop subtree must contain no `break` or `continue`. An ineligible loop
/// passes through unchanged, as does one whose bound is smaller than the
/// unroll factor, where duplication would not amortize.
#[derive(Debug, Clone)]
pub struct LoopUnroll {
    factor: usize,
    range_fn: String,
}

impl LoopUnroll {
    pub fn new(factor: usize) -> Self {
        LoopUnroll {
            factor,
            range_fn: "range".to_string(),
        }
    }

    /// Recognize a different range-like primitive by name.
    pub fn with_range_fn(mut self, range_fn: impl Into<String>) -> Self {
        self.range_fn = range_fn.into();
        self
    }
}

impl Default for LoopUnroll {
    fn default() -> Self {
        LoopUnroll::new(4)
    }
}

impl Pass for LoopUnroll {
    fn name(&self) -> &'static str {
        "loop-unroll"
    }

    fn apply(&self, module: Module) -> Module {
        let mut module = Unroller { config: self }.transform_module(module);
        fix_missing_positions(&mut module);
        module
    }
}

struct Unroller<'a> {
    config: &'a LoopUnroll,
}

impl Transformer for Unroller<'_> {
    fn transform_stmt(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let Stmt { kind, span } = stmt;
        match kind {
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let factor = self.config.factor as i64;
                match self.eligible(&target, &iter, &body, &orelse) {
                    Some((var, bound)) if bound >= factor => {
                        debug!(var = %var, bound, factor, "unrolling loop");
                        self.expand(var, bound, target, body, span)
                    }
                    _ => walk_transform_stmt(
                        self,
                        Stmt::with_span(
                            StmtKind::For {
                                target,
                                iter,
                                body,
                                orelse,
                            },
                            span,
                        ),
                    ),
                }
            }
            kind => walk_transform_stmt(self, Stmt { kind, span }),
        }
    }
}

impl Unroller<'_> {
    /// The eligibility gate: loop variable name and static bound, or `None`.
    fn eligible(
        &self,
        target: &Expr,
        iter: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
    ) -> Option<(String, i64)> {
        // 1. single bare-name target, no destructuring
        let ExprKind::Name { id: var, .. } = &target.kind else {
            return None;
        };
        // 2. iterated expression is a call to the range-like primitive
        let ExprKind::Call { func, args, .. } = &iter.kind else {
            return None;
        };
        if !func.is_name(&self.config.range_fn) {
            return None;
        }
        // 3. single-argument form only
        if args.len() != 1 {
            return None;
        }
        // 4. the bound is statically known
        let ExprKind::Constant {
            value: Literal::Int(bound),
        } = &args[0].kind
        else {
            return None;
        };
        // A loop carrying an else block is not the canonical counting loop;
        // duplicating the body would leave nowhere faithful to put it.
        if !orelse.is_empty() {
            return None;
        }
        // 5. no control-flow exit anywhere in the loop's subtree
        let mut scan = FindsLoopExit { found: false };
        for stmt in body.iter().chain(orelse) {
            scan.visit_stmt(stmt);
        }
        if scan.found {
            return None;
        }

        Some((var.clone(), *bound))
    }

    /// Build the replacement statements for an eligible loop.
    fn expand(
        &self,
        var: String,
        bound: i64,
        target: Expr,
        body: Vec<Stmt>,
        span: Option<Span>,
    ) -> Vec<Stmt> {
        let factor = self.config.factor as i64;
        let main_stop = (bound / factor) * factor;
        let mut result = Vec::new();

        if main_stop > 0 {
            let mut unrolled_body = Vec::new();
            for offset in 0..factor {
                let mut replacer = OffsetName {
                    var: var.as_str(),
                    offset,
                };
                unrolled_body.extend(transform_block(&mut replacer, body.clone()));
            }
            let iter = Expr::call(
                Expr::name(self.config.range_fn.clone()),
                vec![Expr::int(0), Expr::int(main_stop), Expr::int(factor)],
                vec![],
            );
            result.push(Stmt::with_span(
                StmtKind::For {
                    target,
                    iter,
                    body: unrolled_body,
                    orelse: vec![],
                },
                span,
            ));
        }

        for value in main_stop..bound {
            let mut replacer = ConstName {
                var: var.as_str(),
                value,
            };
            result.extend(transform_block(&mut replacer, body.clone()));
        }

        result
    }
}

/// Detects `break`/`continue` anywhere in a statement subtree.
struct FindsLoopExit {
    found: bool,
}

impl Visitor for FindsLoopExit {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if matches!(stmt.kind, StmtKind::Break | StmtKind::Continue) {
            self.found = true;
        }
        walk_stmt(self, stmt);
    }
}

/// Rewrites read occurrences of the loop variable to `var + offset`.
///
/// Offset 0 leaves the name untouched, avoiding a no-op addition. Write
/// occurrences are left alone: the loop control variable is not assigned
/// inside an eligible body, and rewriting a store target would corrupt it
/// if one ever appeared.
struct OffsetName<'a> {
    var: &'a str,
    offset: i64,
}

impl Transformer for OffsetName<'_> {
    fn transform_expr(&mut self, expr: Expr) -> Expr {
        match &expr.kind {
            ExprKind::Name { id, ctx: NameContext::Load }
                if id.as_str() == self.var && self.offset != 0 =>
            {
                Expr::binop(
                    Expr::name(self.var),
                    BinaryOp::Add,
                    Expr::int(self.offset),
                )
            }
            _ => walk_transform_expr(self, expr),
        }
    }
}

/// Rewrites read occurrences of the loop variable to a literal constant.
struct ConstName<'a> {
    var: &'a str,
    value: i64,
}

impl Transformer for ConstName<'_> {
    fn transform_expr(&mut self, expr: Expr) -> Expr {
        match &expr.kind {
            ExprKind::Name { id, ctx: NameContext::Load } if id.as_str() == self.var => {
                Expr::with_span(
                    ExprKind::Constant {
                        value: Literal::Int(self.value),
                    },
                    expr.span,
                )
            }
            _ => walk_transform_expr(self, expr),
        }
    }
}
