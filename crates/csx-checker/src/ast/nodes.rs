use csx_common::Position;
use serde::{Deserialize, Serialize};

use super::types::TypeAnnotation;
use crate::semantic::types::Resolved;

// ============================================================================
// Program (top-level)
// ============================================================================

/// A complete CSX program: one class holding field and method declarations.
///
/// ```csx
/// class Name {
///     INT count = 0;
///     VOID main() { ... }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub name: Ident,
    #[serde(default)]
    pub fields: Vec<Declaration>,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
    #[serde(default)]
    pub position: Position,
}

/// A declared or referenced identifier.
///
/// Declaration sites record the outcome of checking in `resolved`: the
/// declared type and kind, or `Type::Error` for a rejected duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub resolved: Resolved,
}

impl Ident {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            resolved: Resolved::default(),
        }
    }
}

// ============================================================================
// Declarations
// ============================================================================

/// A field or local declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Declaration {
    Var(VarDecl),
    Const(ConstDecl),
    Array(ArrayDecl),
}

impl Declaration {
    pub fn name(&self) -> &Ident {
        match self {
            Declaration::Var(d) => &d.name,
            Declaration::Const(d) => &d.name,
            Declaration::Array(d) => &d.name,
        }
    }
}

/// `INT x;` or `INT x = expr;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarDecl {
    pub name: Ident,
    pub type_ann: TypeAnnotation,
    #[serde(default)]
    pub initializer: Option<Expr>,
    #[serde(default)]
    pub position: Position,
}

/// `CONST x = expr;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstDecl {
    pub name: Ident,
    pub value: Expr,
    #[serde(default)]
    pub position: Position,
}

/// `CHAR buf[10];`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayDecl {
    pub name: Ident,
    pub element_type: TypeAnnotation,
    pub size: u32,
    #[serde(default)]
    pub position: Position,
}

// ============================================================================
// Methods
// ============================================================================

/// `TYPE name(params) { decls stmts }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: Ident,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: TypeAnnotation,
    #[serde(default)]
    pub decls: Vec<Declaration>,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub position: Position,
}

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamMode {
    /// `INT x`
    Scalar,
    /// `INT xs[]`
    Array,
}

/// A method parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: Ident,
    pub type_ann: TypeAnnotation,
    pub mode: ParamMode,
    #[serde(default)]
    pub position: Position,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stmt {
    Assign(AssignStmt),
    If(IfStmt),
    While(WhileStmt),
    For(ForStmt),
    Read(ReadStmt),
    Print(PrintStmt),
    Call(CallStmt),
    Return(ReturnStmt),
    Block(BlockStmt),
    Break(JumpStmt),
    Continue(JumpStmt),
    Step(StepStmt),
}

/// `name = expr;` or `name[index] = expr;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignStmt {
    pub target: Name,
    pub value: Expr,
    #[serde(default)]
    pub position: Position,
}

/// `if (cond) stmt [else stmt] endif`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfStmt {
    pub condition: Expr,
    pub then_branch: Box<Stmt>,
    #[serde(default)]
    pub else_branch: Option<Box<Stmt>>,
    #[serde(default)]
    pub position: Position,
}

/// `[label :] while (cond) stmt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhileStmt {
    #[serde(default)]
    pub label: Option<Ident>,
    pub condition: Expr,
    pub body: Box<Stmt>,
    #[serde(default)]
    pub position: Position,
}

/// `for (init; cond; update) stmt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForStmt {
    #[serde(default)]
    pub init: Option<Box<Stmt>>,
    pub condition: Expr,
    #[serde(default)]
    pub update: Option<Box<Stmt>>,
    pub body: Box<Stmt>,
    #[serde(default)]
    pub position: Position,
}

/// `READ(a, b[i], ...);`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadStmt {
    pub targets: Vec<Name>,
    #[serde(default)]
    pub position: Position,
}

/// `PRINT(expr, ...);`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintStmt {
    pub values: Vec<Expr>,
    #[serde(default)]
    pub position: Position,
}

/// `name(args);`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStmt {
    pub callee: Ident,
    #[serde(default)]
    pub args: Vec<Expr>,
    #[serde(default)]
    pub position: Position,
}

/// `return [expr];`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnStmt {
    #[serde(default)]
    pub value: Option<Expr>,
    #[serde(default)]
    pub position: Position,
}

/// `{ decls stmts }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockStmt {
    #[serde(default)]
    pub decls: Vec<Declaration>,
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub position: Position,
}

/// `break label;` or `continue label;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JumpStmt {
    pub label: Ident,
    #[serde(default)]
    pub position: Position,
}

/// `++x;`, `x++;`, `--x;`, `x--;`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepStmt {
    pub op: StepOp,
    pub target: Name,
    #[serde(default)]
    pub position: Position,
}

/// Increment and decrement operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOp {
    PreIncrement,
    PostIncrement,
    PreDecrement,
    PostDecrement,
}

impl StepOp {
    pub fn is_increment(&self) -> bool {
        matches!(self, StepOp::PreIncrement | StepOp::PostIncrement)
    }
}

// ============================================================================
// Expressions
// ============================================================================

/// An expression node. `resolved` is filled in by the checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub resolved: Resolved,
}

impl Expr {
    pub fn new(kind: ExprKind, position: Position) -> Self {
        Self {
            kind,
            position,
            resolved: Resolved::default(),
        }
    }

    pub fn literal(literal: Literal, position: Position) -> Self {
        Self::new(ExprKind::Literal(literal), position)
    }

    pub fn name(name: Name) -> Self {
        let position = name.position;
        Self::new(ExprKind::Name(name), position)
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr, position: Position) -> Self {
        Self::new(
            ExprKind::Binary {
                left: Box::new(left),
                op,
                right: Box::new(right),
            },
            position,
        )
    }

    /// The name this expression refers to, if it is a (possibly indexed) name.
    pub fn as_name(&self) -> Option<&Name> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }
}

/// All expression variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprKind {
    /// A literal value: `42`, `3.5`, `'c'`, `true`, `"text"`
    Literal(Literal),

    /// A variable reference, optionally indexed: `x`, `buf[i]`
    Name(Name),

    /// Binary operation: `a + b`, `x < y`, `p && q`
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// Unary operation: `!flag`
    Unary { op: UnaryOp, operand: Box<Expr> },

    /// Type cast: `(INT) c`
    Cast {
        target: TypeAnnotation,
        operand: Box<Expr>,
    },

    /// Function call in expression position: `f(a, b)`
    Call { callee: Ident, args: Vec<Expr> },
}

/// A name reference, optionally indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Name {
    pub ident: String,
    #[serde(default)]
    pub index: Option<Box<Expr>>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub resolved: Resolved,
}

impl Name {
    pub fn new(ident: impl Into<String>, position: Position) -> Self {
        Self {
            ident: ident.into(),
            index: None,
            position,
            resolved: Resolved::default(),
        }
    }

    pub fn indexed(ident: impl Into<String>, index: Expr, position: Position) -> Self {
        Self {
            index: Some(Box::new(index)),
            ..Self::new(ident, position)
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Int(i64),
    Float(f64),
    Char(char),
    Bool(bool),
    String(String),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    // Comparison
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Lte => "<=",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Neq | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Lte | BinaryOp::Gte
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
}
