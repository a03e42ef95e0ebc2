use csx_common::Position;

use super::types::{Kind, Type};

/// The declaration record bound to a name within a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolInfo {
    pub name: String,
    pub kind: Kind,
    pub ty: Type,
    pub constant: bool,
    pub defined_at: Position,
    pub detail: SymbolDetail,
}

/// Extra data carried by specialized symbols.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolDetail {
    Plain,
    /// Arrays and array parameters. Array parameters carry no size: any
    /// array of the right element type may be passed.
    Sized { size: Option<u32> },
    Method(MethodSignature),
    Label { visible: bool },
}

/// Declared return type and ordered parameters of a method.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodSignature {
    pub return_type: Type,
    pub params: Vec<SymbolInfo>,
}

impl SymbolInfo {
    /// A plain scalar symbol (variable, constant, scalar parameter).
    pub fn scalar(
        name: impl Into<String>,
        kind: Kind,
        ty: Type,
        constant: bool,
        defined_at: Position,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            constant,
            defined_at,
            detail: SymbolDetail::Plain,
        }
    }

    /// A declared array with a fixed element count.
    pub fn array(name: impl Into<String>, element: Type, size: u32, defined_at: Position) -> Self {
        Self {
            name: name.into(),
            kind: Kind::Array,
            ty: element,
            constant: false,
            defined_at,
            detail: SymbolDetail::Sized { size: Some(size) },
        }
    }

    /// An array parameter; its size is unknown until runtime.
    pub fn array_param(name: impl Into<String>, element: Type, defined_at: Position) -> Self {
        Self {
            name: name.into(),
            kind: Kind::ArrayParm,
            ty: element,
            constant: false,
            defined_at,
            detail: SymbolDetail::Sized { size: None },
        }
    }

    /// A method whose parameter list is filled in once its parameters are checked.
    pub fn method(name: impl Into<String>, return_type: Type, defined_at: Position) -> Self {
        Self {
            name: name.into(),
            kind: Kind::Method,
            ty: return_type,
            constant: false,
            defined_at,
            detail: SymbolDetail::Method(MethodSignature {
                return_type,
                params: Vec::new(),
            }),
        }
    }

    /// A loop label, visible while its loop body is open.
    pub fn label(name: impl Into<String>, defined_at: Position) -> Self {
        Self {
            name: name.into(),
            kind: Kind::Label,
            ty: Type::Void,
            constant: false,
            defined_at,
            detail: SymbolDetail::Label { visible: true },
        }
    }

    /// Whether this symbol carries size information (arrays and array parameters).
    pub fn is_sized(&self) -> bool {
        matches!(self.detail, SymbolDetail::Sized { .. })
    }

    /// Declared element count; `None` for array parameters and non-arrays.
    pub fn size(&self) -> Option<u32> {
        match self.detail {
            SymbolDetail::Sized { size } => size,
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&MethodSignature> {
        match &self.detail {
            SymbolDetail::Method(sig) => Some(sig),
            _ => None,
        }
    }

    /// Label visibility; `None` if this symbol is not a label.
    pub fn label_visible(&self) -> Option<bool> {
        match self.detail {
            SymbolDetail::Label { visible } => Some(visible),
            _ => None,
        }
    }
}

impl std::fmt::Display for SymbolInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}: kind={}, type={})", self.name, self.kind, self.ty)
    }
}
