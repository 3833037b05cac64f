// Constant replacement
// Bulk rewrite of constant payloads across a tree.

use crate::ast::{fix_missing_positions, Expr, ExprKind, Literal, Module};
use crate::visit::{walk_transform_expr, Transformer};

use super::Pass;

#[derive(Debug, Clone)]
enum Matcher {
    /// Match one exact payload.
    Exact(Literal),
    /// Match every numeric payload.
    Numbers,
}

/// Rewrites every matching `Constant` node to a replacement payload.
#[derive(Debug, Clone)]
pub struct ReplaceConstants {
    matcher: Matcher,
    replacement: Literal,
}

impl ReplaceConstants {
    /// Replace constants exactly equal to `old` with `new`.
    pub fn new(old: Literal, new: Literal) -> Self {
        ReplaceConstants {
            matcher: Matcher::Exact(old),
            replacement: new,
        }
    }

    /// Replace every integer and float constant with `new`.
    pub fn numbers(new: Literal) -> Self {
        ReplaceConstants {
            matcher: Matcher::Numbers,
            replacement: new,
        }
    }

    fn matches(&self, value: &Literal) -> bool {
        match &self.matcher {
            Matcher::Exact(old) => value == old,
            Matcher::Numbers => value.is_number(),
        }
    }
}

impl Pass for ReplaceConstants {
    fn name(&self) -> &'static str {
        "replace-constants"
    }

    fn apply(&self, module: Module) -> Module {
        let mut module = Replacer { config: self }.transform_module(module);
        fix_missing_positions(&mut module);
        module
    }
}

struct Replacer<'a> {
    config: &'a ReplaceConstants,
}

impl Transformer for Replacer<'_> {
    fn transform_expr(&mut self, expr: Expr) -> Expr {
        match &expr.kind {
            ExprKind::Constant { value } if self.config.matches(value) => Expr::with_span(
                ExprKind::Constant {
                    value: self.config.replacement.clone(),
                },
                expr.span,
            ),
            _ => walk_transform_expr(self, expr),
        }
    }
}
