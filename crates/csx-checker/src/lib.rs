//! Semantic analysis for the CSX language.
//!
//! The crate consumes a syntax tree produced by an external parser
//! ([`ast::Program`]), resolves every name through lexical scopes, annotates
//! each expression with its resolved type and kind, and collects
//! diagnostics for declaration, resolution, compatibility and arity
//! problems.

pub mod ast;
pub mod semantic;

pub use semantic::{analyze, analyze_with_options, CheckError, CheckerOptions};
