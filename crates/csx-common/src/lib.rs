pub mod config;
pub mod errors;
pub mod span;

pub use config::{CsxConfig, OutputFormat};
pub use errors::{Diagnostic, DiagnosticBag, DiagnosticKind};
pub use span::Position;
