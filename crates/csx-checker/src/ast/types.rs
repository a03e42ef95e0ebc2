use csx_common::Position;
use serde::{Deserialize, Serialize};

/// A type annotation in the source code (e.g., `INT`, `CHAR`, `VOID`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeAnnotation {
    pub kind: TypeKind,
    #[serde(default)]
    pub position: Position,
}

impl TypeAnnotation {
    pub fn new(kind: TypeKind, position: Position) -> Self {
        Self { kind, position }
    }
}

/// The written type keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    /// `INT`
    Int,
    /// `FLOAT`
    Float,
    /// `BOOL`
    Bool,
    /// `CHAR`
    Char,
    /// `VOID` (method return types only)
    Void,
}

impl TypeKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            TypeKind::Int => "INT",
            TypeKind::Float => "FLOAT",
            TypeKind::Bool => "BOOL",
            TypeKind::Char => "CHAR",
            TypeKind::Void => "VOID",
        }
    }
}
