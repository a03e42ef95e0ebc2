use serde::Serialize;

use crate::span::Position;

/// Category of a user-facing diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    /// Duplicate name in a scope, malformed entry point.
    Declaration,
    /// Undeclared name, method or label referenced.
    Resolution,
    /// Assignment, arithmetic, boolean or signature mismatch.
    Compatibility,
    /// Call argument count differs from the declared parameter count.
    Arity,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::Declaration => "declaration",
            DiagnosticKind::Resolution => "resolution",
            DiagnosticKind::Compatibility => "compatibility",
            DiagnosticKind::Arity => "arity",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A related source location providing additional context for a diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedPosition {
    pub position: Position,
    pub message: String,
}

/// A checker diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub position: Position,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<RelatedPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            message: message.into(),
            position,
            related: Vec::new(),
            suggestion: None,
        }
    }

    pub fn declaration(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::Declaration, message, position)
    }

    pub fn resolution(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::Resolution, message, position)
    }

    pub fn compatibility(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::Compatibility, message, position)
    }

    pub fn arity(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::Arity, message, position)
    }

    pub fn with_related(mut self, position: Position, message: impl Into<String>) -> Self {
        self.related.push(RelatedPosition {
            position,
            message: message.into(),
        });
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Line number of the node that detected the problem.
    pub fn line(&self) -> u32 {
        self.position.line
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Error (line {}): {}",
            self.position.line, self.message
        )
    }
}

/// Ordered collector for diagnostics produced during one check run.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn declaration(&mut self, message: impl Into<String>, position: Position) {
        self.report(Diagnostic::declaration(message, position));
    }

    pub fn resolution(&mut self, message: impl Into<String>, position: Position) {
        self.report(Diagnostic::resolution(message, position));
    }

    pub fn compatibility(&mut self, message: impl Into<String>, position: Position) {
        self.report(Diagnostic::compatibility(message, position));
    }

    pub fn arity(&mut self, message: impl Into<String>, position: Position) {
        self.report(Diagnostic::arity(message, position));
    }

    /// Report a compatibility diagnostic unless `condition` holds.
    pub fn require(&mut self, condition: bool, message: impl Into<String>, position: Position) {
        if !condition {
            self.compatibility(message, position);
        }
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// True when the checked tree produced no diagnostics at all.
    pub fn is_well_typed(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_line_prefix() {
        let diag = Diagnostic::declaration("`x` is already declared", Position::new(3, 5));
        assert_eq!(diag.to_string(), "Error (line 3): `x` is already declared");
    }

    #[test]
    fn bag_keeps_report_order_and_counts() {
        let mut bag = DiagnosticBag::new();
        assert!(bag.is_well_typed());
        bag.resolution("first", Position::line(1));
        bag.arity("second", Position::line(2));
        bag.require(true, "never reported", Position::line(3));
        bag.require(false, "third", Position::line(4));

        let messages: Vec<_> = bag.diagnostics().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "third"]);
        assert_eq!(bag.error_count(), 3);
        assert_eq!(bag.count_of(DiagnosticKind::Compatibility), 1);
        assert!(!bag.is_well_typed());
    }

    #[test]
    fn related_and_suggestion_are_attached() {
        let diag = Diagnostic::declaration("dup", Position::line(7))
            .with_related(Position::line(2), "previously declared here")
            .with_suggestion("rename one of them");
        assert_eq!(diag.related.len(), 1);
        assert_eq!(diag.related[0].position.line, 2);
        assert_eq!(diag.suggestion.as_deref(), Some("rename one of them"));
        assert_eq!(diag.line(), 7);
    }
}
