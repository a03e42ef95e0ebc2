pub mod checker;
pub mod scope;
pub mod symbols;
pub mod type_checker;
pub mod types;

use csx_common::{CsxConfig, DiagnosticBag};
use log::debug;

use crate::ast::nodes::Program;

pub use checker::{CheckError, Checker};

/// Settings for one check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Name the last method of the class must have.
    pub entry_point: String,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
        }
    }
}

impl CheckerOptions {
    pub fn from_config(config: &CsxConfig) -> Self {
        Self {
            entry_point: config.checker.entry_point.clone(),
        }
    }
}

/// Check a program with default options.
///
/// Every name and expression in `program` is annotated with its resolved
/// type and kind. User-facing problems come back in the `DiagnosticBag`;
/// an `Err` means the checker's own scope discipline broke.
pub fn analyze(program: &mut Program) -> Result<DiagnosticBag, CheckError> {
    analyze_with_options(program, &CheckerOptions::default())
}

/// Check a program with explicit options.
pub fn analyze_with_options(
    program: &mut Program,
    options: &CheckerOptions,
) -> Result<DiagnosticBag, CheckError> {
    let diagnostics = Checker::new(options.clone()).check(program)?;
    debug!(
        "checked class {}: {} diagnostic(s)",
        program.name.name,
        diagnostics.error_count()
    );
    Ok(diagnostics)
}
