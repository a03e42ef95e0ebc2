use serde::{Deserialize, Serialize};

use crate::ast::types::{TypeAnnotation, TypeKind};

/// Data domain of a value.
///
/// Separate from the AST `TypeAnnotation` so the semantic layer can reason
/// about types that are never written (strings, sentinels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Real,
    Boolean,
    Character,
    String,
    Void,
    /// Sentinel for a sub-expression that already failed.
    Error,
    /// Not yet resolved.
    #[default]
    Unknown,
}

impl Type {
    /// Convert an AST `TypeAnnotation` to the internal `Type`.
    pub fn from_annotation(ann: &TypeAnnotation) -> Self {
        match ann.kind {
            TypeKind::Int => Type::Integer,
            TypeKind::Float => Type::Real,
            TypeKind::Bool => Type::Boolean,
            TypeKind::Char => Type::Character,
            TypeKind::Void => Type::Void,
        }
    }

    /// Whether this type is a sentinel that must not trigger further diagnostics.
    pub fn is_poisoned(&self) -> bool {
        matches!(self, Type::Error | Type::Unknown)
    }

    /// Whether arithmetic operators accept this type.
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Type::Integer | Type::Real | Type::Character)
    }

    /// Human-readable name for error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Type::Integer => "INT",
            Type::Real => "FLOAT",
            Type::Boolean => "BOOL",
            Type::Character => "CHAR",
            Type::String => "STRING",
            Type::Void => "VOID",
            Type::Error => "<error>",
            Type::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Storage class of a value-producing construct, orthogonal to [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Kind {
    /// Plain variable.
    Var,
    /// Transient value (literal, operator result, call result).
    Value,
    /// By-value parameter.
    ScalarParm,
    Array,
    ArrayParm,
    Method,
    Label,
    #[default]
    Unknown,
}

impl Kind {
    /// Var, ScalarParm or Value: something that yields a single value.
    pub fn is_scalar(&self) -> bool {
        matches!(self, Kind::Var | Kind::ScalarParm | Kind::Value)
    }

    /// Var or ScalarParm: a single storage location.
    pub fn is_assignable(&self) -> bool {
        matches!(self, Kind::Var | Kind::ScalarParm)
    }

    pub fn is_array_like(&self) -> bool {
        matches!(self, Kind::Array | Kind::ArrayParm)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Kind::Var => "variable",
            Kind::Value => "value",
            Kind::ScalarParm => "scalar parameter",
            Kind::Array => "array",
            Kind::ArrayParm => "array parameter",
            Kind::Method => "method",
            Kind::Label => "label",
            Kind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The (Type, Kind) pair the checker stores on expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolved {
    pub ty: Type,
    pub kind: Kind,
}

impl Resolved {
    pub fn new(ty: Type, kind: Kind) -> Self {
        Self { ty, kind }
    }

    pub fn value(ty: Type) -> Self {
        Self::new(ty, Kind::Value)
    }

    /// Resolution result for a construct that failed to check.
    pub fn error() -> Self {
        Self::new(Type::Error, Kind::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use csx_common::Position;

    #[test]
    fn annotations_map_to_types() {
        let ann = |kind| TypeAnnotation::new(kind, Position::dummy());
        assert_eq!(Type::from_annotation(&ann(TypeKind::Int)), Type::Integer);
        assert_eq!(Type::from_annotation(&ann(TypeKind::Float)), Type::Real);
        assert_eq!(Type::from_annotation(&ann(TypeKind::Bool)), Type::Boolean);
        assert_eq!(Type::from_annotation(&ann(TypeKind::Char)), Type::Character);
        assert_eq!(Type::from_annotation(&ann(TypeKind::Void)), Type::Void);
    }

    #[test]
    fn sentinels_are_poisoned() {
        assert!(Type::Error.is_poisoned());
        assert!(Type::Unknown.is_poisoned());
        assert!(!Type::Integer.is_poisoned());
    }

    #[test]
    fn kind_classes() {
        assert!(Kind::Value.is_scalar());
        assert!(!Kind::Value.is_assignable());
        assert!(Kind::ScalarParm.is_assignable());
        assert!(Kind::ArrayParm.is_array_like());
        assert!(!Kind::Method.is_scalar());
    }

    #[test]
    fn resolved_defaults_to_unknown() {
        let r = Resolved::default();
        assert_eq!(r.ty, Type::Unknown);
        assert_eq!(r.kind, Kind::Unknown);
    }
}
