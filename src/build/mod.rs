//! Stylesheet builds
//!
//! The executor prepares a claimed cache entry and hands it to a
//! [`StyleCompiler`]; the default compiler is an external command.

pub mod compiler;
pub mod executor;

pub use compiler::{CommandCompiler, CompileJob, StyleCompiler};
pub use executor::BuildExecutor;
