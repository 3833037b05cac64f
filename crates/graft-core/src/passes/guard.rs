// Guard-injection pass
// Wraps registered brittle calls in a protected-execution block with a
// typed fallback value and a diagnostic side effect.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{
    fix_missing_positions, ExceptHandler, Expr, ExprKind, Literal, Module, Stmt, StmtKind,
};
use crate::visit::{walk_transform_stmt, Transformer};

use super::Pass;

/// How one registered risky call is guarded: the exception to catch (a
/// dotted path) and the value assigned to the target when it fires.
///
/// Plain data, so a host can load a registry from configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardSpec {
    pub exception: String,
    pub fallback: Literal,
}

/// Wraps statements whose right-hand side is a registered risky call in a
/// `Try` block.
///
/// An assignment `x = risky(...)` becomes a guarded assignment that, on the
/// configured failure, prints a diagnostic naming the call and the captured
/// failure and re-assigns `x` to the fallback. A bare `risky(...)`
/// expression statement gets the diagnostic only.
///
/// Only a single bare-name assignment target is eligible. Attribute
/// targets, multiple targets, and tuple unpacking pass through unmodified:
/// re-assigning those on the fault path would need aliasing and ordering
/// analysis this pass does not attempt.
#[derive(Debug, Clone, Default)]
pub struct GuardInjection {
    registry: HashMap<String, GuardSpec>,
}

impl GuardInjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the pass from an already-assembled registry table, e.g. one
    /// deserialized from host configuration.
    pub fn from_table(registry: HashMap<String, GuardSpec>) -> Self {
        GuardInjection { registry }
    }

    /// Register a risky callee by its dotted path, e.g. `"json.loads"`.
    pub fn register(
        mut self,
        callee: impl Into<String>,
        exception: impl Into<String>,
        fallback: Literal,
    ) -> Self {
        self.registry.insert(
            callee.into(),
            GuardSpec {
                exception: exception.into(),
                fallback,
            },
        );
        self
    }

    /// The registry entry for a call expression's callee, if any.
    fn lookup(&self, expr: &Expr) -> Option<(&str, &GuardSpec)> {
        let ExprKind::Call { func, .. } = &expr.kind else {
            return None;
        };
        let callee = func.dotted_path()?;
        let (callee, spec) = self.registry.get_key_value(&callee)?;
        Some((callee.as_str(), spec))
    }
}

impl Pass for GuardInjection {
    fn name(&self) -> &'static str {
        "guard-injection"
    }

    fn apply(&self, module: Module) -> Module {
        let mut module = Guard { registry: self }.transform_module(module);
        fix_missing_positions(&mut module);
        module
    }
}

struct Guard<'a> {
    registry: &'a GuardInjection,
}

impl Transformer for Guard<'_> {
    fn transform_stmt(&mut self, stmt: Stmt) -> Vec<Stmt> {
        match &stmt.kind {
            StmtKind::Assign { targets, value } => {
                let Some((callee, spec)) = self.registry.lookup(value) else {
                    return walk_transform_stmt(self, stmt);
                };
                // Simple targets only: one bare name.
                let target_name = match targets.as_slice() {
                    [target] => match &target.kind {
                        ExprKind::Name { id, .. } => id.clone(),
                        _ => return walk_transform_stmt(self, stmt),
                    },
                    _ => return walk_transform_stmt(self, stmt),
                };

                debug!(callee, "guarding assignment");
                let fallback = Stmt::assign(
                    Expr::name_store(target_name),
                    Expr::constant(spec.fallback.clone()),
                );
                let handler_body = vec![diagnostic(callee), fallback];
                vec![wrap_in_try(stmt, &spec.exception, handler_body)]
            }
            StmtKind::Expr { value } => {
                let Some((callee, spec)) = self.registry.lookup(value) else {
                    return walk_transform_stmt(self, stmt);
                };

                debug!(callee, "guarding expression statement");
                let handler_body = vec![diagnostic(callee)];
                vec![wrap_in_try(stmt, &spec.exception, handler_body)]
            }
            _ => walk_transform_stmt(self, stmt),
        }
    }
}

/// `print(f"Error in <callee>: {e}")`
fn diagnostic(callee: &str) -> Stmt {
    let message = Expr::new(ExprKind::JoinedStr {
        values: vec![
            Expr::string(format!("Error in {callee}: ")),
            Expr::new(ExprKind::FormattedValue {
                value: Box::new(Expr::name("e")),
            }),
        ],
    });
    Stmt::expr(Expr::call(Expr::name("print"), vec![message], vec![]))
}

fn wrap_in_try(stmt: Stmt, exception: &str, handler_body: Vec<Stmt>) -> Stmt {
    let span = stmt.span;
    let handler = ExceptHandler {
        exception: Some(Expr::dotted(exception)),
        name: Some("e".to_string()),
        body: handler_body,
        span: None,
    };
    Stmt::with_span(
        StmtKind::Try {
            body: vec![stmt],
            handlers: vec![handler],
            orelse: vec![],
            finalbody: vec![],
        },
        span,
    )
}
