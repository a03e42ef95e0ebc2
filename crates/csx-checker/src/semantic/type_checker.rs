use crate::ast::nodes::{BinaryOp, UnaryOp};

use super::symbols::SymbolInfo;
use super::types::{Kind, Resolved, Type};

/// One side of an assignment, as seen by [`assignment_compatible`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Operand {
    pub ty: Type,
    pub kind: Kind,
    pub constant: bool,
    /// The operand is a name reference (as opposed to a literal or computed value).
    pub is_name: bool,
    pub indexed: bool,
    /// The named symbol carries array size information.
    pub sized: bool,
    pub size: Option<u32>,
}

impl Operand {
    /// A computed value with no symbol behind it.
    pub fn value(resolved: Resolved) -> Self {
        Self {
            ty: resolved.ty,
            kind: resolved.kind,
            constant: false,
            is_name: false,
            indexed: false,
            sized: false,
            size: None,
        }
    }

    /// A name reference resolved to `info`, with the (Type, Kind) the name node resolved to.
    pub fn named(info: &SymbolInfo, resolved: Resolved, indexed: bool) -> Self {
        Self {
            ty: resolved.ty,
            kind: resolved.kind,
            constant: info.constant,
            is_name: true,
            indexed,
            sized: info.is_sized(),
            size: info.size(),
        }
    }

    /// The target of a declaration initializer: a fresh, unindexed symbol.
    pub fn declared(info: &SymbolInfo) -> Self {
        Self::named(info, Resolved::new(info.ty, info.kind), false)
    }

    /// Character arrays and strings, which may be copied whole.
    fn is_character_array_or_string(&self) -> bool {
        (self.kind.is_array_like() && self.ty == Type::Character)
            || (self.kind.is_assignable() && self.ty == Type::String)
    }
}

/// Both sides are arrays of the same element type.
fn matching_arrays(lhs: &Operand, rhs: &Operand) -> bool {
    lhs.kind.is_array_like() && rhs.kind.is_array_like() && lhs.ty == rhs.ty
}

/// Whether an assignment copies a whole array (or string) and is therefore
/// decided by declared sizes alone.
pub fn is_whole_aggregate(lhs: &Operand, rhs: &Operand) -> bool {
    if !rhs.is_name || rhs.indexed || lhs.indexed {
        return false;
    }
    let matching = matching_arrays(lhs, rhs);
    let lhs_sized = (lhs.is_character_array_or_string() || matching) && lhs.sized;
    let rhs_sized = (rhs.is_character_array_or_string() || matching) && rhs.sized;
    lhs_sized && rhs_sized
}

/// Whether `rhs` may be stored into `lhs`.
///
/// Whole arrays (and strings) are compared by declared size, which an array
/// parameter on either side waives. Everything else needs identical types:
/// there is no promotion at assignment boundaries.
pub fn assignment_compatible(lhs: &Operand, rhs: &Operand) -> bool {
    if rhs.ty.is_poisoned() || lhs.ty.is_poisoned() {
        return true;
    }
    if lhs.constant {
        return false;
    }

    if is_whole_aggregate(lhs, rhs) {
        return lhs.size == rhs.size
            || lhs.kind == Kind::ArrayParm
            || rhs.kind == Kind::ArrayParm;
    }

    let kinds_compatible = (lhs.kind.is_array_like() && rhs.kind.is_array_like())
        || (lhs.kind.is_assignable() && rhs.kind.is_scalar());
    kinds_compatible && lhs.ty == rhs.ty
}

/// Result type of an arithmetic or relational operator, before relational
/// results are forced to Boolean.
///
/// Integer and Character mix to Integer; any other mismatch fails.
pub fn arithmetic_result(left: Resolved, right: Resolved) -> Option<Type> {
    if !right.ty.is_arithmetic() {
        return None;
    }
    if !left.kind.is_scalar() || !right.kind.is_scalar() {
        return None;
    }
    match (left.ty, right.ty) {
        (l, r) if l == r => Some(r),
        (Type::Integer, Type::Character) | (Type::Character, Type::Integer) => Some(Type::Integer),
        _ => None,
    }
}

/// Both operands are scalar Booleans.
pub fn boolean_compatible(left: Resolved, right: Resolved) -> bool {
    left.ty == Type::Boolean
        && right.ty == Type::Boolean
        && left.kind.is_scalar()
        && right.kind.is_scalar()
}

/// Check a binary operation and return the result type, or an error message.
///
/// Operands that already failed yield `Type::Error` without a new message.
pub fn check_binary_op(left: Resolved, op: BinaryOp, right: Resolved) -> Result<Type, String> {
    if left.ty.is_poisoned() || right.ty.is_poisoned() {
        return Ok(Type::Error);
    }

    if op.is_logical() {
        return if boolean_compatible(left, right) {
            Ok(Type::Boolean)
        } else {
            Err(format!(
                "operator {} requires both operands to be of type BOOL, got {} and {}",
                op.symbol(),
                left.ty,
                right.ty
            ))
        };
    }

    match arithmetic_result(left, right) {
        Some(_) if op.is_relational() => Ok(Type::Boolean),
        Some(ty) => Ok(ty),
        None => Err(format!(
            "left and right operands are not compatible for operator {} ({} {} and {} {})",
            op.symbol(),
            left.ty,
            left.kind,
            right.ty,
            right.kind
        )),
    }
}

/// Check a unary operation and return the result type.
pub fn check_unary_op(op: UnaryOp, operand: Resolved) -> Result<Type, String> {
    match op {
        UnaryOp::Not => {
            if operand.ty.is_poisoned() {
                Ok(Type::Error)
            } else if operand.ty == Type::Boolean && operand.kind.is_scalar() {
                Ok(Type::Boolean)
            } else {
                Err(format!(
                    "operator ! requires a BOOL operand, got {} {}",
                    operand.ty, operand.kind
                ))
            }
        }
    }
}

/// Check a type cast. Only INT, CHAR and BOOL values may be cast, and only
/// to FLOAT, CHAR, INT or BOOL.
pub fn check_cast(target: Type, operand: Resolved) -> Result<Type, String> {
    if !matches!(
        target,
        Type::Real | Type::Character | Type::Integer | Type::Boolean
    ) {
        return Err(format!(
            "cannot cast to {}; valid cast targets are FLOAT, CHAR, INT and BOOL",
            target
        ));
    }
    if operand.ty.is_poisoned() {
        return Ok(target);
    }
    if !matches!(
        operand.ty,
        Type::Character | Type::Integer | Type::Boolean
    ) {
        return Err(format!(
            "cannot cast from {}; only CHAR, INT and BOOL values can be cast",
            operand.ty
        ));
    }
    Ok(target)
}

/// A `READ` target: an INT or CHAR variable or scalar parameter.
pub fn readable(target: Resolved) -> bool {
    target.ty.is_poisoned()
        || (matches!(target.ty, Type::Integer | Type::Character) && target.kind.is_assignable())
}

/// A `PRINT` operand: a printable scalar, or a whole CHAR array.
pub fn printable(value: Resolved) -> bool {
    if value.ty.is_poisoned() {
        return true;
    }
    let printable_scalar = matches!(
        value.ty,
        Type::Boolean | Type::Character | Type::Integer | Type::Real | Type::String
    ) && value.kind.is_scalar();
    let char_array = value.kind.is_array_like() && value.ty == Type::Character;
    printable_scalar || char_array
}

/// An actual argument matching a formal parameter. Arguments are passed by
/// value, so arrays never qualify.
pub fn argument_matches(formal: &SymbolInfo, actual: Resolved) -> bool {
    actual.ty.is_poisoned() || (formal.ty == actual.ty && actual.kind.is_scalar())
}

/// A returned value matching the enclosing method's return type.
pub fn return_matches(return_type: Type, value: Resolved) -> bool {
    value.ty.is_poisoned()
        || (return_type == value.ty && matches!(value.kind, Kind::ScalarParm | Kind::Value))
}

/// A loop or branch condition.
pub fn is_condition(value: Resolved) -> bool {
    value.ty.is_poisoned() || value.ty == Type::Boolean
}
