// Function-entry log injection
// Inserts a print statement at the head of every function body so entry
// into each function is visible at runtime.

use tracing::debug;

use crate::ast::{fix_missing_positions, Expr, Module, Stmt, StmtKind};
use crate::visit::{transform_block, walk_transform_stmt, Transformer};

use super::Pass;

/// Prepends `print("<prefix>: <name>")` to every function body, nested
/// definitions included.
#[derive(Debug, Clone)]
pub struct FunctionEntryLog {
    prefix: String,
}

impl FunctionEntryLog {
    pub fn new(prefix: impl Into<String>) -> Self {
        FunctionEntryLog {
            prefix: prefix.into(),
        }
    }
}

impl Default for FunctionEntryLog {
    fn default() -> Self {
        FunctionEntryLog::new("Entering function")
    }
}

impl Pass for FunctionEntryLog {
    fn name(&self) -> &'static str {
        "function-entry-log"
    }

    fn apply(&self, module: Module) -> Module {
        let mut module = Injector { config: self }.transform_module(module);
        fix_missing_positions(&mut module);
        module
    }
}

struct Injector<'a> {
    config: &'a FunctionEntryLog,
}

impl Transformer for Injector<'_> {
    fn transform_stmt(&mut self, stmt: Stmt) -> Vec<Stmt> {
        let Stmt { kind, span } = stmt;
        match kind {
            StmtKind::FunctionDef { name, params, body } => {
                debug!(function = %name, "injecting entry log");
                // Instrument nested definitions first, then prepend ours so
                // the entry message is the first statement of this body.
                let mut body = transform_block(self, body);
                let message = format!("{}: {}", self.config.prefix, name);
                body.insert(
                    0,
                    Stmt::expr(Expr::call(
                        Expr::name("print"),
                        vec![Expr::string(message)],
                        vec![],
                    )),
                );
                vec![Stmt::with_span(
                    StmtKind::FunctionDef { name, params, body },
                    span,
                )]
            }
            kind => walk_transform_stmt(self, Stmt { kind, span }),
        }
    }
}
