//! # Graft Core
//!
//! Core implementation of the graft program-tree transformation engine,
//! including:
//! - Typed program tree (node kinds, fields, source positions)
//! - Generic traversal protocol (read-only visitor and rewriting transformer)
//! - Structural codec between the tree and a generic key/value mapping
//! - Rewrite passes: call migration, guard injection, loop unrolling,
//!   constant replacement, and function-entry log injection
//!
//! The engine is single-threaded and synchronous. Parsing source text into
//! a tree, printing a tree back to text, and executing a program are
//! external collaborators; this crate takes and returns trees and their
//! encoded mapping form.

#![warn(clippy::all)]

pub mod ast;
pub mod codec;
pub mod passes;
pub mod visit;

// Re-export commonly used types
pub use ast::{
    fix_missing_positions, BinaryOp, ExceptHandler, Expr, ExprKind, Keyword, Literal, Module,
    NameContext, Span, Stmt, StmtKind,
};
pub use codec::{decode, encode, ReconstructionError};
pub use passes::{
    apply_all, CallMigration, FunctionEntryLog, GuardInjection, LoopUnroll, Pass,
    ReplaceConstants,
};
pub use visit::{Transformer, Visitor};

/// Engine version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for graft core components
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("graft_core=info".parse().unwrap()),
        )
        .init();
}
