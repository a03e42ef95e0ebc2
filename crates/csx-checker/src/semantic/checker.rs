use std::cmp::Ordering;

use csx_common::{Diagnostic, DiagnosticBag, Position};
use log::debug;

use crate::ast::nodes::*;

use super::scope::{SymbolTable, SymbolTableError};
use super::symbols::SymbolInfo;
use super::type_checker::{self, Operand};
use super::types::{Kind, Resolved, Type};
use super::CheckerOptions;

/// A failure of the checker itself, as opposed to a problem in the checked
/// program. Aborts the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CheckError {
    #[error("internal checker error: {0}")]
    Structural(#[from] SymbolTableError),
}

/// The method whose body is being checked.
#[derive(Debug, Clone)]
struct MethodFrame {
    name: String,
    return_type: Type,
}

/// Which surface form a call came from; only changes message wording.
#[derive(Debug, Clone, Copy)]
enum CallSite {
    Statement,
    Expression,
}

impl CallSite {
    fn noun(self) -> &'static str {
        match self {
            CallSite::Statement => "method",
            CallSite::Expression => "function",
        }
    }
}

/// Single-pass semantic checker.
///
/// Walks the tree depth-first, binding declarations in a scoped symbol
/// table, annotating names and expressions with their resolved type and
/// kind, and collecting diagnostics. All state lives in the checker value,
/// so independent runs never share anything.
pub struct Checker {
    symbols: SymbolTable,
    diagnostics: DiagnosticBag,
    current_method: Option<MethodFrame>,
    options: CheckerOptions,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new(CheckerOptions::default())
    }
}

impl Checker {
    pub fn new(options: CheckerOptions) -> Self {
        Self {
            symbols: SymbolTable::new(),
            diagnostics: DiagnosticBag::new(),
            current_method: None,
            options,
        }
    }

    /// Check a whole program, annotating it in place.
    pub fn check(mut self, program: &mut Program) -> Result<DiagnosticBag, CheckError> {
        self.check_program(program)?;
        Ok(self.diagnostics)
    }

    // ====================================================================
    // Program and declarations
    // ====================================================================

    fn check_program(&mut self, program: &mut Program) -> Result<(), CheckError> {
        debug!("checking class {}", program.name.name);
        self.symbols.open_scope();
        for field in &mut program.fields {
            self.check_declaration(field)?;
        }
        for method in &mut program.methods {
            self.check_method(method)?;
        }
        self.check_entry_point(&program.methods);
        self.symbols.close_scope()?;
        Ok(())
    }

    /// The last method of a class is the entry point and must return VOID.
    fn check_entry_point(&mut self, methods: &[MethodDecl]) {
        let Some(last) = methods.last() else {
            return;
        };
        let entry = &self.options.entry_point;
        if last.name.name != *entry {
            self.diagnostics.report(
                Diagnostic::declaration(
                    format!("Last method declaration must be the {} method", entry),
                    last.position,
                )
                .with_suggestion(format!("declare `{}` as the final method of the class", entry)),
            );
        } else if Type::from_annotation(&last.return_type) != Type::Void {
            self.diagnostics.report(
                Diagnostic::declaration(
                    format!("{} method must have return type of VOID", entry),
                    last.return_type.position,
                )
                .with_suggestion(format!(
                    "change the return type from {} to VOID",
                    last.return_type.kind.keyword()
                )),
            );
        }
    }

    /// Bind `info` in the current scope and record the outcome on `ident`.
    ///
    /// Returns `false` for a duplicate, which is reported and leaves the
    /// identifier typed as `Error`.
    fn bind(&mut self, info: SymbolInfo, ident: &mut Ident) -> Result<bool, CheckError> {
        let resolved = Resolved::new(info.ty, info.kind);
        match self.symbols.insert(info) {
            Ok(()) => {
                ident.resolved = resolved;
                Ok(true)
            }
            Err(SymbolTableError::Duplicate { name, previous }) => {
                self.diagnostics.report(
                    Diagnostic::declaration(format!("`{}` is already declared", name), ident.position)
                        .with_related(previous, "previously declared here"),
                );
                ident.resolved = Resolved::new(Type::Error, resolved.kind);
                Ok(false)
            }
            Err(other) => Err(other.into()),
        }
    }

    fn check_declaration(&mut self, decl: &mut Declaration) -> Result<(), CheckError> {
        match decl {
            Declaration::Var(d) => self.check_var_decl(d),
            Declaration::Const(d) => self.check_const_decl(d),
            Declaration::Array(d) => {
                let element = Type::from_annotation(&d.element_type);
                let info = SymbolInfo::array(&d.name.name, element, d.size, d.name.position);
                self.bind(info, &mut d.name)?;
                Ok(())
            }
        }
    }

    fn check_var_decl(&mut self, decl: &mut VarDecl) -> Result<(), CheckError> {
        // The initializer sees the enclosing bindings, not the one being declared.
        let source = match decl.initializer.as_mut() {
            Some(init) => {
                self.check_expr(init);
                Some((self.operand_of(init), init.position))
            }
            None => None,
        };

        let ty = Type::from_annotation(&decl.type_ann);
        let info = SymbolInfo::scalar(&decl.name.name, Kind::Var, ty, false, decl.name.position);
        let target = Operand::declared(&info);
        let bound = self.bind(info, &mut decl.name)?;

        // A rejected duplicate is Error-typed; its initializer is not compared.
        if let Some((source, position)) = source.filter(|_| bound) {
            if !type_checker::assignment_compatible(&target, &source) {
                self.diagnostics.compatibility(
                    format!(
                        "cannot initialize `{}` ({}) with a {} {}",
                        decl.name.name, ty, source.ty, source.kind
                    ),
                    position,
                );
            }
        }
        Ok(())
    }

    fn check_const_decl(&mut self, decl: &mut ConstDecl) -> Result<(), CheckError> {
        let value = self.check_expr(&mut decl.value);
        let info = SymbolInfo::scalar(
            &decl.name.name,
            value.kind,
            value.ty,
            true,
            decl.name.position,
        );
        self.bind(info, &mut decl.name)?;
        Ok(())
    }

    // ====================================================================
    // Methods
    // ====================================================================

    fn check_method(&mut self, method: &mut MethodDecl) -> Result<(), CheckError> {
        let return_type = Type::from_annotation(&method.return_type);
        let info = SymbolInfo::method(&method.name.name, return_type, method.name.position);
        // Bound before the body scope opens so the method can call itself.
        let bound = self.bind(info, &mut method.name)?;
        let level = self.symbols.depth();
        debug!("checking method {} -> {}", method.name.name, return_type);

        let enclosing = self.current_method.replace(MethodFrame {
            name: method.name.name.clone(),
            return_type,
        });
        self.symbols.open_scope();

        let params = self.check_params(&mut method.params)?;
        if bound {
            self.symbols.commit_params(level, &method.name.name, params)?;
        }
        for decl in &mut method.decls {
            self.check_declaration(decl)?;
        }
        for stmt in &mut method.stmts {
            self.check_stmt(stmt)?;
        }

        self.symbols.close_scope()?;
        self.current_method = enclosing;
        Ok(())
    }

    /// Bind parameters in the method scope and return the ones that bound,
    /// in declaration order.
    fn check_params(&mut self, params: &mut [Param]) -> Result<Vec<SymbolInfo>, CheckError> {
        let mut signature = Vec::with_capacity(params.len());
        for param in params {
            let ty = Type::from_annotation(&param.type_ann);
            let info = match param.mode {
                ParamMode::Scalar => SymbolInfo::scalar(
                    &param.name.name,
                    Kind::ScalarParm,
                    ty,
                    false,
                    param.name.position,
                ),
                ParamMode::Array => {
                    SymbolInfo::array_param(&param.name.name, ty, param.name.position)
                }
            };
            if self.bind(info.clone(), &mut param.name)? {
                signature.push(info);
            }
        }
        Ok(signature)
    }

    // ====================================================================
    // Statements
    // ====================================================================

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<(), CheckError> {
        match stmt {
            Stmt::Assign(s) => self.check_assign(s),
            Stmt::If(s) => {
                let condition = self.check_expr(&mut s.condition);
                self.require_condition(condition, "if", s.condition.position);
                self.check_scoped(&mut s.then_branch)?;
                if let Some(else_branch) = s.else_branch.as_mut() {
                    self.check_scoped(else_branch)?;
                }
                Ok(())
            }
            Stmt::While(s) => self.check_while(s),
            Stmt::For(s) => {
                if let Some(init) = s.init.as_mut() {
                    self.check_stmt(init)?;
                }
                let condition = self.check_expr(&mut s.condition);
                self.require_condition(condition, "for", s.condition.position);
                if let Some(update) = s.update.as_mut() {
                    self.check_stmt(update)?;
                }
                self.check_scoped(&mut s.body)
            }
            Stmt::Read(s) => {
                for target in &mut s.targets {
                    let resolved = self.check_name(target);
                    self.diagnostics.require(
                        type_checker::readable(resolved),
                        format!(
                            "READ target `{}` must be an INT or CHAR variable, got {} {}",
                            target.ident, resolved.ty, resolved.kind
                        ),
                        target.position,
                    );
                }
                Ok(())
            }
            Stmt::Print(s) => {
                for value in &mut s.values {
                    let resolved = self.check_expr(value);
                    self.diagnostics.require(
                        type_checker::printable(resolved),
                        format!("cannot PRINT a {} {}", resolved.ty, resolved.kind),
                        value.position,
                    );
                }
                Ok(())
            }
            Stmt::Call(s) => {
                self.check_call(&mut s.callee, &mut s.args, s.position, CallSite::Statement);
                Ok(())
            }
            Stmt::Return(s) => {
                self.check_return(s);
                Ok(())
            }
            Stmt::Block(s) => {
                self.symbols.open_scope();
                for decl in &mut s.decls {
                    self.check_declaration(decl)?;
                }
                for stmt in &mut s.stmts {
                    self.check_stmt(stmt)?;
                }
                self.symbols.close_scope()?;
                Ok(())
            }
            Stmt::Break(s) => {
                self.check_jump(s, "break");
                Ok(())
            }
            Stmt::Continue(s) => {
                self.check_jump(s, "continue");
                Ok(())
            }
            Stmt::Step(s) => {
                self.check_step(s);
                Ok(())
            }
        }
    }

    /// Check a statement inside its own scope.
    fn check_scoped(&mut self, stmt: &mut Stmt) -> Result<(), CheckError> {
        self.symbols.open_scope();
        self.check_stmt(stmt)?;
        self.symbols.close_scope()?;
        Ok(())
    }

    fn require_condition(&mut self, condition: Resolved, construct: &str, position: Position) {
        self.diagnostics.require(
            type_checker::is_condition(condition),
            format!(
                "{} condition must be of type BOOL, got {}",
                construct, condition.ty
            ),
            position,
        );
    }

    fn check_assign(&mut self, stmt: &mut AssignStmt) -> Result<(), CheckError> {
        let target = self.check_name(&mut stmt.target);
        self.check_expr(&mut stmt.value);
        if target.ty.is_poisoned() {
            return Ok(());
        }

        let Some(lhs) = self.operand_for_name(&stmt.target) else {
            return Ok(());
        };
        let rhs = self.operand_of(&stmt.value);
        if type_checker::assignment_compatible(&lhs, &rhs) {
            return Ok(());
        }

        let message = if lhs.constant {
            format!("cannot assign to constant `{}`", stmt.target.ident)
        } else if type_checker::is_whole_aggregate(&lhs, &rhs) {
            format!(
                "cannot assign `{}` to `{}`: array sizes differ ({} and {})",
                stmt.value.as_name().map(|n| n.ident.as_str()).unwrap_or("value"),
                stmt.target.ident,
                describe_size(rhs.size),
                describe_size(lhs.size)
            )
        } else {
            format!(
                "incompatible types in assignment to `{}`: expected {} {}, got {} {}",
                stmt.target.ident, lhs.ty, lhs.kind, rhs.ty, rhs.kind
            )
        };
        self.diagnostics.compatibility(message, stmt.position);
        Ok(())
    }

    fn check_while(&mut self, stmt: &mut WhileStmt) -> Result<(), CheckError> {
        // The label lives in the enclosing scope, outside the body.
        let label = match stmt.label.as_mut() {
            Some(label) => {
                let info = SymbolInfo::label(&label.name, label.position);
                self.bind(info, label)?.then(|| label.name.clone())
            }
            None => None,
        };

        let condition = self.check_expr(&mut stmt.condition);
        self.require_condition(condition, "while", stmt.condition.position);
        self.check_scoped(&mut stmt.body)?;

        if let Some(name) = label {
            if !self.symbols.hide_label(&name) {
                return Err(SymbolTableError::MissingBinding {
                    name,
                    level: self.symbols.depth(),
                }
                .into());
            }
            debug!("label {} closed", name);
        }
        Ok(())
    }

    fn check_jump(&mut self, stmt: &mut JumpStmt, keyword: &str) {
        let label = &mut stmt.label;
        label.resolved = match self.symbols.global_lookup(&label.name) {
            Some(info) => match info.label_visible() {
                Some(true) => Resolved::new(info.ty, Kind::Label),
                Some(false) => {
                    self.diagnostics.report(
                        Diagnostic::resolution(
                            format!("label `{}` is no longer visible", label.name),
                            stmt.position,
                        )
                        .with_related(info.defined_at, "label declared here")
                        .with_suggestion(format!(
                            "`{}` can only target a label from inside its loop",
                            keyword
                        )),
                    );
                    Resolved::error()
                }
                None => {
                    self.diagnostics.resolution(
                        format!("`{}` is not a label, found {}", label.name, info.kind),
                        stmt.position,
                    );
                    Resolved::error()
                }
            },
            None => {
                self.diagnostics.resolution(
                    format!("label `{}` is not declared", label.name),
                    stmt.position,
                );
                Resolved::error()
            }
        };
    }

    fn check_return(&mut self, stmt: &mut ReturnStmt) {
        let value = stmt.value.as_mut().map(|value| (self.check_expr(value), value.position));
        let Some(frame) = self.current_method.clone() else {
            self.diagnostics
                .compatibility("return statement outside of a method", stmt.position);
            return;
        };

        match value {
            Some((resolved, position)) if frame.return_type == Type::Void => {
                if !resolved.ty.is_poisoned() {
                    self.diagnostics.compatibility(
                        format!("VOID method `{}` cannot return a value", frame.name),
                        position,
                    );
                }
            }
            Some((resolved, position)) => self.diagnostics.require(
                type_checker::return_matches(frame.return_type, resolved),
                format!(
                    "method `{}` must return a {} value, got {} {}",
                    frame.name, frame.return_type, resolved.ty, resolved.kind
                ),
                position,
            ),
            None if frame.return_type != Type::Void => self.diagnostics.compatibility(
                format!(
                    "method `{}` must return a value of type {}",
                    frame.name, frame.return_type
                ),
                stmt.position,
            ),
            None => {}
        }
    }

    fn check_step(&mut self, stmt: &mut StepStmt) {
        let resolved = self.check_name(&mut stmt.target);
        if resolved.ty.is_poisoned() {
            return;
        }
        let Some(target) = self.operand_for_name(&stmt.target) else {
            return;
        };
        let operator = if stmt.op.is_increment() { "++" } else { "--" };
        if target.constant {
            self.diagnostics.compatibility(
                format!("operator {} cannot modify constant `{}`", operator, stmt.target.ident),
                stmt.position,
            );
        } else if target.ty != Type::Integer || !target.kind.is_assignable() {
            self.diagnostics.compatibility(
                format!(
                    "operator {} requires an INT variable, got {} {}",
                    operator, target.ty, target.kind
                ),
                stmt.position,
            );
        }
    }

    // ====================================================================
    // Expressions
    // ====================================================================

    /// Check an expression, store its resolved (Type, Kind) on the node and
    /// return it.
    fn check_expr(&mut self, expr: &mut Expr) -> Resolved {
        let position = expr.position;
        let resolved = match &mut expr.kind {
            ExprKind::Literal(literal) => Resolved::value(literal_type(literal)),
            ExprKind::Name(name) => self.check_name(name),
            ExprKind::Binary { left, op, right } => {
                let left = self.check_expr(left);
                let right = self.check_expr(right);
                let ty = type_checker::check_binary_op(left, *op, right)
                    .unwrap_or_else(|msg| self.report_mismatch(msg, position));
                Resolved::value(ty)
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.check_expr(operand);
                let ty = type_checker::check_unary_op(*op, operand)
                    .unwrap_or_else(|msg| self.report_mismatch(msg, position));
                Resolved::value(ty)
            }
            ExprKind::Cast { target, operand } => {
                let operand = self.check_expr(operand);
                let ty = type_checker::check_cast(Type::from_annotation(target), operand)
                    .unwrap_or_else(|msg| self.report_mismatch(msg, position));
                Resolved::value(ty)
            }
            ExprKind::Call { callee, args } => {
                self.check_call(callee, args, position, CallSite::Expression)
            }
        };
        expr.resolved = resolved;
        resolved
    }

    fn report_mismatch(&mut self, message: String, position: Position) -> Type {
        self.diagnostics.compatibility(message, position);
        Type::Error
    }

    /// Resolve a (possibly indexed) name. An indexed element is always a
    /// `Var`, whatever the array's own kind.
    fn check_name(&mut self, name: &mut Name) -> Resolved {
        if let Some(index) = name.index.as_deref_mut() {
            self.check_expr(index);
        }
        let resolved = match self.symbols.global_lookup(&name.ident) {
            Some(info) if name.is_indexed() => Resolved::new(info.ty, Kind::Var),
            Some(info) => Resolved::new(info.ty, info.kind),
            None => {
                self.diagnostics.resolution(
                    format!("`{}` is not declared", name.ident),
                    name.position,
                );
                Resolved::error()
            }
        };
        name.resolved = resolved;
        resolved
    }

    /// Shared by call statements and function-call expressions.
    fn check_call(
        &mut self,
        callee: &mut Ident,
        args: &mut [Expr],
        position: Position,
        site: CallSite,
    ) -> Resolved {
        let noun = site.noun();
        let signature = match self.symbols.global_lookup(&callee.name) {
            Some(info) => match info.signature() {
                Some(signature) => Some(signature.clone()),
                None => {
                    self.diagnostics.resolution(
                        format!("`{}` is a {}, not a method", callee.name, info.kind),
                        callee.position,
                    );
                    None
                }
            },
            None => {
                self.diagnostics.resolution(
                    format!("{} `{}` is not declared", noun, callee.name),
                    callee.position,
                );
                None
            }
        };

        let actuals: Vec<(Resolved, Position)> = args
            .iter_mut()
            .map(|arg| (self.check_expr(arg), arg.position))
            .collect();

        let Some(signature) = signature else {
            callee.resolved = Resolved::error();
            return Resolved::value(Type::Error);
        };
        callee.resolved = Resolved::new(signature.return_type, Kind::Method);

        for (i, (formal, (actual, arg_position))) in
            signature.params.iter().zip(&actuals).enumerate()
        {
            if !type_checker::argument_matches(formal, *actual) {
                self.diagnostics.compatibility(
                    format!(
                        "argument {} of `{}` must be a {} value for parameter `{}`, got {} {}",
                        i + 1,
                        callee.name,
                        formal.ty,
                        formal.name,
                        actual.ty,
                        actual.kind
                    ),
                    *arg_position,
                );
            }
        }

        match actuals.len().cmp(&signature.params.len()) {
            Ordering::Less => self.diagnostics.arity(
                format!(
                    "not enough arguments in the {} call to `{}` (expected {}, got {})",
                    noun,
                    callee.name,
                    signature.params.len(),
                    actuals.len()
                ),
                position,
            ),
            Ordering::Greater => self.diagnostics.arity(
                format!(
                    "too many arguments in the {} call to `{}` (expected {}, got {})",
                    noun,
                    callee.name,
                    signature.params.len(),
                    actuals.len()
                ),
                position,
            ),
            Ordering::Equal => {}
        }

        Resolved::value(signature.return_type)
    }

    // ====================================================================
    // Helpers
    // ====================================================================

    /// Assignment operand for an already-checked name.
    fn operand_for_name(&self, name: &Name) -> Option<Operand> {
        self.symbols
            .global_lookup(&name.ident)
            .map(|info| Operand::named(info, name.resolved, name.is_indexed()))
    }

    /// Assignment operand for an already-checked expression.
    fn operand_of(&self, expr: &Expr) -> Operand {
        expr.as_name()
            .and_then(|name| self.operand_for_name(name))
            .unwrap_or_else(|| Operand::value(expr.resolved))
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Int(_) => Type::Integer,
        Literal::Float(_) => Type::Real,
        Literal::Char(_) => Type::Character,
        Literal::Bool(_) => Type::Boolean,
        Literal::String(_) => Type::String,
    }
}

fn describe_size(size: Option<u32>) -> String {
    size.map_or_else(|| "unsized".to_string(), |n| n.to_string())
}

// ========================================================================
// Tests
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::types::{TypeAnnotation, TypeKind};
    use csx_common::DiagnosticKind;

    fn pos(line: u32) -> Position {
        Position::line(line)
    }

    fn ann(kind: TypeKind) -> TypeAnnotation {
        TypeAnnotation::new(kind, Position::dummy())
    }

    fn ident(name: &str) -> Ident {
        Ident::new(name, Position::dummy())
    }

    fn var(name: &str, kind: TypeKind) -> Declaration {
        Declaration::Var(VarDecl {
            name: ident(name),
            type_ann: ann(kind),
            initializer: None,
            position: Position::dummy(),
        })
    }

    fn name(n: &str) -> Expr {
        Expr::name(Name::new(n, pos(1)))
    }

    fn int(value: i64) -> Expr {
        Expr::literal(Literal::Int(value), pos(1))
    }

    fn main_with(decls: Vec<Declaration>, stmts: Vec<Stmt>) -> MethodDecl {
        method("main", TypeKind::Void, Vec::new(), decls, stmts)
    }

    fn method(
        n: &str,
        ret: TypeKind,
        params: Vec<Param>,
        decls: Vec<Declaration>,
        stmts: Vec<Stmt>,
    ) -> MethodDecl {
        MethodDecl {
            name: ident(n),
            params,
            return_type: ann(ret),
            decls,
            stmts,
            position: Position::dummy(),
        }
    }

    fn program(methods: Vec<MethodDecl>) -> Program {
        Program {
            name: ident("Test"),
            fields: Vec::new(),
            methods,
            position: Position::dummy(),
        }
    }

    fn check(mut program: Program) -> (Program, Vec<Diagnostic>) {
        let diags = Checker::default()
            .check(&mut program)
            .expect("checker should not fail structurally");
        (program, diags.into_diagnostics())
    }

    fn messages(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn empty_class_is_well_typed() {
        let (_, diags) = check(program(Vec::new()));
        assert!(diags.is_empty());
    }

    #[test]
    fn last_method_must_be_main() {
        let (_, diags) = check(program(vec![method(
            "helper",
            TypeKind::Void,
            Vec::new(),
            Vec::new(),
            Vec::new(),
        )]));
        assert_eq!(
            messages(&diags),
            vec!["Last method declaration must be the main method"]
        );
    }

    #[test]
    fn main_must_be_void() {
        let (_, diags) = check(program(vec![method(
            "main",
            TypeKind::Int,
            Vec::new(),
            Vec::new(),
            vec![Stmt::Return(ReturnStmt {
                value: Some(int(0)),
                position: pos(2),
            })],
        )]));
        assert_eq!(messages(&diags), vec!["main method must have return type of VOID"]);
        assert_eq!(
            diags[0].suggestion.as_deref(),
            Some("change the return type from INT to VOID")
        );
    }

    #[test]
    fn custom_entry_point_name() {
        let mut prog = program(vec![main_with(Vec::new(), Vec::new())]);
        let options = CheckerOptions {
            entry_point: "start".to_string(),
        };
        let diags = Checker::new(options).check(&mut prog).unwrap();
        assert_eq!(diags.error_count(), 1);
        assert!(diags.diagnostics()[0].message.contains("start"));
    }

    #[test]
    fn undeclared_name_is_resolution_error() {
        let assign = Stmt::Assign(AssignStmt {
            target: Name::new("x", pos(3)),
            value: int(1),
            position: pos(3),
        });
        let (_, diags) = check(program(vec![main_with(Vec::new(), vec![assign])]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Resolution);
        assert_eq!(diags[0].line(), 3);
    }

    #[test]
    fn constant_copies_initializer_and_rejects_assignment() {
        let konst = Declaration::Const(ConstDecl {
            name: ident("k"),
            value: Expr::literal(Literal::Char('a'), pos(1)),
            position: pos(1),
        });
        let assign = Stmt::Assign(AssignStmt {
            target: Name::new("k", pos(2)),
            value: Expr::literal(Literal::Char('b'), pos(2)),
            position: pos(2),
        });
        let (prog, diags) = check(program(vec![main_with(vec![konst], vec![assign])]));
        assert_eq!(messages(&diags), vec!["cannot assign to constant `k`"]);
        let Declaration::Const(decl) = &prog.methods[0].decls[0] else {
            panic!("expected const");
        };
        assert_eq!(decl.name.resolved, Resolved::new(Type::Character, Kind::Value));
    }

    #[test]
    fn initializer_must_match_declared_type() {
        let decl = Declaration::Var(VarDecl {
            name: ident("f"),
            type_ann: ann(TypeKind::Float),
            initializer: Some(int(1)),
            position: pos(4),
        });
        let (_, diags) = check(program(vec![main_with(vec![decl], Vec::new())]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Compatibility);
    }

    #[test]
    fn initializer_sees_outer_binding() {
        // INT x; { CHAR x = x; } -> the initializer reads the INT, which fails.
        let inner = Stmt::Block(BlockStmt {
            decls: vec![Declaration::Var(VarDecl {
                name: ident("x"),
                type_ann: ann(TypeKind::Char),
                initializer: Some(name("x")),
                position: pos(2),
            })],
            stmts: Vec::new(),
            position: pos(2),
        });
        let (_, diags) = check(program(vec![main_with(
            vec![var("x", TypeKind::Int)],
            vec![inner],
        )]));
        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert_eq!(diags[0].kind, DiagnosticKind::Compatibility);
    }

    #[test]
    fn condition_must_be_bool() {
        let stmt = Stmt::If(IfStmt {
            condition: int(1),
            then_branch: Box::new(Stmt::Block(BlockStmt {
                decls: Vec::new(),
                stmts: Vec::new(),
                position: pos(1),
            })),
            else_branch: None,
            position: pos(1),
        });
        let (_, diags) = check(program(vec![main_with(Vec::new(), vec![stmt])]));
        assert_eq!(messages(&diags), vec!["if condition must be of type BOOL, got INT"]);
    }

    #[test]
    fn if_branches_do_not_leak_declarations() {
        let branch = |n: &str| {
            Box::new(Stmt::Block(BlockStmt {
                decls: vec![var(n, TypeKind::Int)],
                stmts: Vec::new(),
                position: pos(1),
            }))
        };
        let stmt = Stmt::If(IfStmt {
            condition: Expr::literal(Literal::Bool(true), pos(1)),
            then_branch: branch("t"),
            else_branch: Some(branch("t")),
            position: pos(1),
        });
        let after = Stmt::Assign(AssignStmt {
            target: Name::new("t", pos(5)),
            value: int(1),
            position: pos(5),
        });
        let (_, diags) = check(program(vec![main_with(Vec::new(), vec![stmt, after])]));
        assert_eq!(messages(&diags), vec!["`t` is not declared"]);
    }

    #[test]
    fn read_requires_int_or_char_variable() {
        let stmt = Stmt::Read(ReadStmt {
            targets: vec![Name::new("i", pos(1)), Name::new("f", pos(1))],
            position: pos(1),
        });
        let (_, diags) = check(program(vec![main_with(
            vec![var("i", TypeKind::Int), var("f", TypeKind::Float)],
            vec![stmt],
        )]));
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("`f`"));
    }

    #[test]
    fn print_accepts_char_arrays_and_strings() {
        let arr = Declaration::Array(ArrayDecl {
            name: ident("buf"),
            element_type: ann(TypeKind::Char),
            size: 4,
            position: pos(1),
        });
        let nums = Declaration::Array(ArrayDecl {
            name: ident("nums"),
            element_type: ann(TypeKind::Int),
            size: 4,
            position: pos(1),
        });
        let stmt = Stmt::Print(PrintStmt {
            values: vec![
                name("buf"),
                Expr::literal(Literal::String("hi".into()), pos(1)),
                name("nums"),
            ],
            position: pos(1),
        });
        let (_, diags) = check(program(vec![main_with(vec![arr, nums], vec![stmt])]));
        assert_eq!(messages(&diags), vec!["cannot PRINT a INT array"]);
    }

    #[test]
    fn cast_rules() {
        let cast = |target: TypeKind, operand: Expr| {
            Expr::new(
                ExprKind::Cast {
                    target: ann(target),
                    operand: Box::new(operand),
                },
                pos(1),
            )
        };
        let ok = Stmt::Assign(AssignStmt {
            target: Name::new("f", pos(1)),
            value: cast(TypeKind::Float, int(3)),
            position: pos(1),
        });
        let bad = Stmt::Assign(AssignStmt {
            target: Name::new("i", pos(2)),
            value: cast(TypeKind::Int, name("f")),
            position: pos(2),
        });
        let (_, diags) = check(program(vec![main_with(
            vec![var("f", TypeKind::Float), var("i", TypeKind::Int)],
            vec![ok, bad],
        )]));
        // The failed cast is Error-typed, so the assignment adds nothing.
        assert_eq!(diags.len(), 1, "{:?}", diags);
        assert!(diags[0].message.starts_with("cannot cast from FLOAT"));
    }

    #[test]
    fn step_requires_int_variable() {
        let step = |op, target: &str| {
            Stmt::Step(StepStmt {
                op,
                target: Name::new(target, pos(1)),
                position: pos(1),
            })
        };
        let konst = Declaration::Const(ConstDecl {
            name: ident("k"),
            value: int(1),
            position: pos(1),
        });
        let (_, diags) = check(program(vec![main_with(
            vec![var("i", TypeKind::Int), var("c", TypeKind::Char), konst],
            vec![
                step(StepOp::PostIncrement, "i"),
                step(StepOp::PreDecrement, "c"),
                step(StepOp::PreIncrement, "k"),
                step(StepOp::PostDecrement, "missing"),
            ],
        )]));
        assert_eq!(
            messages(&diags),
            vec![
                "operator -- requires an INT variable, got CHAR variable",
                "operator ++ cannot modify constant `k`",
                "`missing` is not declared",
            ]
        );
    }

    #[test]
    fn indexed_array_element_is_incrementable() {
        let arr = Declaration::Array(ArrayDecl {
            name: ident("xs"),
            element_type: ann(TypeKind::Int),
            size: 3,
            position: pos(1),
        });
        let stmt = Stmt::Step(StepStmt {
            op: StepOp::PostIncrement,
            target: Name::indexed("xs", int(0), pos(2)),
            position: pos(2),
        });
        let (prog, diags) = check(program(vec![main_with(vec![arr], vec![stmt])]));
        assert!(diags.is_empty(), "{:?}", diags);
        let Stmt::Step(step) = &prog.methods[0].stmts[0] else {
            panic!("expected step");
        };
        assert_eq!(step.target.resolved, Resolved::new(Type::Integer, Kind::Var));
    }

    #[test]
    fn return_rules() {
        let ret = |value: Option<Expr>, line| {
            Stmt::Return(ReturnStmt {
                value,
                position: pos(line),
            })
        };
        let f = method(
            "f",
            TypeKind::Int,
            Vec::new(),
            Vec::new(),
            vec![ret(Some(int(1)), 1), ret(None, 2), ret(Some(Expr::literal(Literal::Bool(true), pos(3))), 3)],
        );
        let main = main_with(Vec::new(), vec![ret(None, 4), ret(Some(int(0)), 5)]);
        let (_, diags) = check(program(vec![f, main]));
        let lines: Vec<_> = diags.iter().map(|d| d.line()).collect();
        assert_eq!(lines, vec![2, 3, 5], "{:?}", diags);
    }

    #[test]
    fn returning_a_variable_is_rejected() {
        // Only scalar parameters and computed values may be returned.
        let f = method(
            "f",
            TypeKind::Int,
            Vec::new(),
            vec![var("x", TypeKind::Int)],
            vec![Stmt::Return(ReturnStmt {
                value: Some(name("x")),
                position: pos(1),
            })],
        );
        let (_, diags) = check(program(vec![f, main_with(Vec::new(), Vec::new())]));
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn recursive_call_sees_own_signature() {
        let param = Param {
            name: ident("n"),
            type_ann: ann(TypeKind::Int),
            mode: ParamMode::Scalar,
            position: Position::dummy(),
        };
        let call = Expr::new(
            ExprKind::Call {
                callee: ident("fact"),
                args: vec![name("n")],
            },
            pos(2),
        );
        let fact = method(
            "fact",
            TypeKind::Int,
            vec![param],
            Vec::new(),
            vec![Stmt::Return(ReturnStmt {
                value: Some(call),
                position: pos(2),
            })],
        );
        let (prog, diags) = check(program(vec![fact, main_with(Vec::new(), Vec::new())]));
        assert!(diags.is_empty(), "{:?}", diags);
        let Stmt::Return(ret) = &prog.methods[0].stmts[0] else {
            panic!("expected return");
        };
        let value = ret.value.as_ref().unwrap();
        assert_eq!(value.resolved, Resolved::value(Type::Integer));
    }

    #[test]
    fn calling_a_variable_is_one_error() {
        let call = Stmt::Call(CallStmt {
            callee: ident("x"),
            args: vec![int(1)],
            position: pos(1),
        });
        let (_, diags) = check(program(vec![main_with(
            vec![var("x", TypeKind::Int)],
            vec![call],
        )]));
        assert_eq!(messages(&diags), vec!["`x` is a variable, not a method"]);
    }

    #[test]
    fn arrays_are_not_passable() {
        let param = Param {
            name: ident("a"),
            type_ann: ann(TypeKind::Int),
            mode: ParamMode::Scalar,
            position: Position::dummy(),
        };
        let g = method("g", TypeKind::Void, vec![param], Vec::new(), Vec::new());
        let arr = Declaration::Array(ArrayDecl {
            name: ident("xs"),
            element_type: ann(TypeKind::Int),
            size: 2,
            position: pos(1),
        });
        let call = Stmt::Call(CallStmt {
            callee: ident("g"),
            args: vec![name("xs")],
            position: pos(2),
        });
        let (_, diags) = check(program(vec![g, main_with(vec![arr], vec![call])]));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::Compatibility);
    }

    #[test]
    fn break_to_unknown_or_non_label() {
        let jump = |label: &str| {
            Stmt::Break(JumpStmt {
                label: ident(label),
                position: pos(1),
            })
        };
        let (_, diags) = check(program(vec![main_with(
            vec![var("x", TypeKind::Int)],
            vec![jump("nowhere"), jump("x")],
        )]));
        assert_eq!(
            messages(&diags),
            vec!["label `nowhere` is not declared", "`x` is not a label, found variable"]
        );
    }

    #[test]
    fn duplicate_label_in_same_scope() {
        let loop_with = |label: &str| {
            Stmt::While(WhileStmt {
                label: Some(ident(label)),
                condition: Expr::literal(Literal::Bool(false), pos(1)),
                body: Box::new(Stmt::Block(BlockStmt {
                    decls: Vec::new(),
                    stmts: Vec::new(),
                    position: pos(1),
                })),
                position: pos(1),
            })
        };
        let (_, diags) = check(program(vec![main_with(
            Vec::new(),
            vec![loop_with("outer"), loop_with("outer")],
        )]));
        assert_eq!(messages(&diags), vec!["`outer` is already declared"]);
        assert_eq!(diags[0].kind, DiagnosticKind::Declaration);
    }

    #[test]
    fn duplicate_method_still_checks_body() {
        let body = vec![Stmt::Assign(AssignStmt {
            target: Name::new("nope", pos(7)),
            value: int(1),
            position: pos(7),
        })];
        let first = method("f", TypeKind::Void, Vec::new(), Vec::new(), Vec::new());
        let second = method("f", TypeKind::Void, Vec::new(), Vec::new(), body);
        let (prog, diags) = check(program(vec![
            first,
            second,
            main_with(Vec::new(), Vec::new()),
        ]));
        assert_eq!(
            messages(&diags),
            vec!["`f` is already declared", "`nope` is not declared"]
        );
        assert_eq!(prog.methods[1].name.resolved.ty, Type::Error);
    }

    #[test]
    fn error_operands_do_not_cascade() {
        // x = (missing + 1) * 2 reports only the undeclared name.
        let inner = Expr::binary(name("missing"), BinaryOp::Add, int(1), pos(1));
        let outer = Expr::binary(inner, BinaryOp::Mul, int(2), pos(1));
        let stmt = Stmt::Assign(AssignStmt {
            target: Name::new("x", pos(1)),
            value: outer,
            position: pos(1),
        });
        let (_, diags) = check(program(vec![main_with(
            vec![var("x", TypeKind::Int)],
            vec![stmt],
        )]));
        assert_eq!(messages(&diags), vec!["`missing` is not declared"]);
    }
}
