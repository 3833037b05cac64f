// Call-migration pass
// Rewrites calls to a deprecated operation into calls to its replacement,
// moving one keyword-style argument into a nested structured argument.

use tracing::debug;

use crate::ast::{fix_missing_positions, Expr, ExprKind, Keyword, Module};
use crate::visit::{walk_transform_expr, Transformer};

use super::Pass;

/// Migrates `old_name(msg, <arg_key>=v)` into
/// `<replacement>(msg, <wrapper_key>={"<arg_key>": v})`.
///
/// The first positional argument is carried over unchanged. Keyword
/// arguments other than `arg_key` are dropped: the migration is lossy by
/// configuration, matching the retirement of the old operation's keyword
/// surface. Calls to any other callee, and calls through attribute or
/// computed callees, pass through untouched.
#[derive(Debug, Clone)]
pub struct CallMigration {
    old_name: String,
    replacement: String,
    arg_key: String,
    wrapper_key: String,
}

impl CallMigration {
    /// `replacement` is a dotted path, e.g. `"logging.warning"`.
    pub fn new(
        old_name: impl Into<String>,
        replacement: impl Into<String>,
        arg_key: impl Into<String>,
        wrapper_key: impl Into<String>,
    ) -> Self {
        CallMigration {
            old_name: old_name.into(),
            replacement: replacement.into(),
            arg_key: arg_key.into(),
            wrapper_key: wrapper_key.into(),
        }
    }
}

impl Pass for CallMigration {
    fn name(&self) -> &'static str {
        "call-migration"
    }

    fn apply(&self, module: Module) -> Module {
        let mut module = Migrator { config: self }.transform_module(module);
        fix_missing_positions(&mut module);
        module
    }
}

struct Migrator<'a> {
    config: &'a CallMigration,
}

impl Transformer for Migrator<'_> {
    fn transform_expr(&mut self, expr: Expr) -> Expr {
        let Expr { kind, span } = expr;
        match kind {
            ExprKind::Call {
                func,
                args,
                keywords,
            } if func.is_name(&self.config.old_name) => {
                debug!(
                    from = %self.config.old_name,
                    to = %self.config.replacement,
                    "migrating call"
                );

                let mut new_keywords = Vec::new();
                for keyword in keywords {
                    if keyword.arg.as_deref() == Some(self.config.arg_key.as_str()) {
                        let wrapped = Expr::new(ExprKind::Dict {
                            keys: vec![Expr::string(self.config.arg_key.clone())],
                            values: vec![keyword.value],
                        });
                        new_keywords.push(Keyword::new(self.config.wrapper_key.clone(), wrapped));
                        break;
                    }
                }

                Expr::with_span(
                    ExprKind::Call {
                        func: Box::new(Expr::dotted(&self.config.replacement)),
                        args: args.into_iter().take(1).collect(),
                        keywords: new_keywords,
                    },
                    span,
                )
            }
            kind => walk_transform_expr(self, Expr { kind, span }),
        }
    }
}
