// Rewrite passes built on the traversal protocol.
//
// Every pass is a pure `Module -> Module` function: a non-matching shape
// always passes through unchanged, and no pass ever fails on a well-formed
// tree. Each pass normalizes position metadata on its output, so a pass
// result is always ready for a printer or the codec.

pub mod constants;
pub mod guard;
pub mod logging;
pub mod migrate;
pub mod unroll;

#[cfg(test)]
mod guard_tests;

pub use constants::ReplaceConstants;
pub use guard::{GuardInjection, GuardSpec};
pub use logging::FunctionEntryLog;
pub use migrate::CallMigration;
pub use unroll::LoopUnroll;

use crate::ast::Module;

/// A tree-to-tree rewrite.
///
/// Implementations consume the input tree and hand back the rewritten one;
/// callers chain them with [`apply_all`].
pub trait Pass {
    fn name(&self) -> &'static str;

    fn apply(&self, module: Module) -> Module;
}

/// Run a pipeline of passes in order.
pub fn apply_all(module: Module, passes: &[&dyn Pass]) -> Module {
    passes.iter().fold(module, |module, pass| {
        tracing::debug!(pass = pass.name(), "applying pass");
        pass.apply(module)
    })
}
