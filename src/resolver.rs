use std::collections::HashMap;

use crate::error::{Diagnostic, Diagnostics, ResolveError};
use crate::expr::{
    AssignData, BinaryData, CallData, Expr, ExprVisitor, GetData, GroupingData, LiteralData,
    LogicalData, SetData, SuperData, ThisData, UnaryData, VariableData,
};
use crate::interpreter::Interpreter;
use crate::stmt::{
    BlockData, ClassData, ExpressionData, FunctionData, IfData, PrintData, ReturnData, Stmt,
    StmtVisitor, VarData, WhileData,
};
use crate::token::Token;

#[derive(Clone, Copy, PartialEq)]
enum FunctionKind {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Clone, Copy, PartialEq)]
enum ClassKind {
    None,
    Class,
    Subclass,
}

/// A single static analysis pass between parsing and interpretation: binds
/// every variable reference to the number of enclosing scopes it should be
/// looked up through, and catches the handful of errors that are only
/// visible with full knowledge of lexical scope (`return` outside a
/// function, `this`/`super` outside a class, a variable that reads its own
/// still-uninitialized binding).
///
/// Scopes are tracked with a stack of name -> initialized maps; the
/// interpreter's global scope is deliberately never pushed onto this stack,
/// so a name that resolves to no entry here falls through to a dynamic
/// lookup in `globals` at runtime.
pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    diagnostics: &'a mut Diagnostics,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionKind,
    current_class: ClassKind,
}

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter, diagnostics: &'a mut Diagnostics) -> Resolver<'a> {
        Resolver {
            interpreter,
            diagnostics,
            scopes: Vec::new(),
            current_function: FunctionKind::None,
            current_class: ClassKind::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        stmt.accept(self);
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        expr.accept(self);
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                ResolveError {
                    token: name.clone(),
                    message: "Variable with this name already declared in this scope.".to_string(),
                }.report(self.diagnostics);
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, name: &Token, id: u32) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(id, depth);
                return;
            }
        }
        // not found in any scope: treated as global, resolved dynamically
    }

    fn resolve_function(&mut self, function: &FunctionData, kind: FunctionKind) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &function.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve(&function.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }
}

impl ExprVisitor<()> for Resolver<'_> {
    fn visit_literal_expr(&mut self, _expr: &LiteralData) {}

    fn visit_grouping_expr(&mut self, expr: &GroupingData) {
        self.resolve_expr(&expr.expr);
    }

    fn visit_unary_expr(&mut self, expr: &UnaryData) {
        self.resolve_expr(&expr.expr);
    }

    fn visit_binary_expr(&mut self, expr: &BinaryData) {
        self.resolve_expr(&expr.left);
        self.resolve_expr(&expr.right);
    }

    fn visit_variable_expr(&mut self, expr: &VariableData) {
        if let Some(scope) = self.scopes.last() {
            if scope.get(&expr.name.lexeme) == Some(&false) {
                ResolveError {
                    token: expr.name.clone(),
                    message: "Cannot read local variable in its own initializer.".to_string(),
                }.report(self.diagnostics);
            }
        }

        self.resolve_local(&expr.name, expr.id);
    }

    fn visit_assign_expr(&mut self, expr: &AssignData) {
        self.resolve_expr(&expr.value);
        self.resolve_local(&expr.name, expr.id);
    }

    fn visit_logical_expr(&mut self, expr: &LogicalData) {
        self.resolve_expr(&expr.left);
        self.resolve_expr(&expr.right);
    }

    fn visit_call_expr(&mut self, expr: &CallData) {
        self.resolve_expr(&expr.callee);
        for argument in &expr.arguments {
            self.resolve_expr(argument);
        }
    }

    fn visit_get_expr(&mut self, expr: &GetData) {
        self.resolve_expr(&expr.object);
    }

    fn visit_set_expr(&mut self, expr: &SetData) {
        self.resolve_expr(&expr.value);
        self.resolve_expr(&expr.object);
    }

    fn visit_this_expr(&mut self, expr: &ThisData) {
        if self.current_class == ClassKind::None {
            ResolveError {
                token: expr.keyword.clone(),
                message: "Cannot use 'this' outside of a class.".to_string(),
            }.report(self.diagnostics);
            return;
        }

        self.resolve_local(&expr.keyword, expr.id);
    }

    fn visit_super_expr(&mut self, expr: &SuperData) {
        match self.current_class {
            ClassKind::None => {
                ResolveError {
                    token: expr.keyword.clone(),
                    message: "Cannot use 'super' outside of a class.".to_string(),
                }.report(self.diagnostics);
            }
            ClassKind::Class => {
                ResolveError {
                    token: expr.keyword.clone(),
                    message: "Cannot use 'super' in a class with no superclass.".to_string(),
                }.report(self.diagnostics);
            }
            ClassKind::Subclass => {
                self.resolve_local(&expr.keyword, expr.id);
            }
        }
    }
}

impl StmtVisitor<()> for Resolver<'_> {
    fn visit_block_stmt(&mut self, stmt: &BlockData) {
        self.begin_scope();
        self.resolve(&stmt.statements);
        self.end_scope();
    }

    fn visit_class_stmt(&mut self, stmt: &ClassData) {
        let enclosing_class = self.current_class;
        self.current_class = ClassKind::Class;

        self.declare(&stmt.name);
        self.define(&stmt.name);

        if let Some(Expr::Variable(superclass)) = &stmt.superclass {
            if superclass.name.lexeme == stmt.name.lexeme {
                ResolveError {
                    token: superclass.name.clone(),
                    message: "A class can't inherit from itself.".to_string(),
                }.report(self.diagnostics);
            }
            self.current_class = ClassKind::Subclass;
            self.resolve_expr(stmt.superclass.as_ref().unwrap());
        }

        if stmt.superclass.is_some() {
            self.begin_scope();
            self.scopes.last_mut().unwrap().insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes.last_mut().unwrap().insert("this".to_string(), true);

        for method in &stmt.methods {
            let Stmt::Function(data) = method else {
                unreachable!("a class body only ever contains function declarations")
            };
            let kind = if data.name.lexeme == "init" { FunctionKind::Initializer } else { FunctionKind::Method };
            self.resolve_function(data, kind);
        }

        self.end_scope();

        if stmt.superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    fn visit_expression_stmt(&mut self, stmt: &ExpressionData) {
        self.resolve_expr(&stmt.expr);
    }

    fn visit_function_stmt(&mut self, stmt: &FunctionData) {
        self.declare(&stmt.name);
        self.define(&stmt.name);
        self.resolve_function(stmt, FunctionKind::Function);
    }

    fn visit_if_stmt(&mut self, stmt: &IfData) {
        self.resolve_expr(&stmt.condition);
        self.resolve_stmt(&stmt.then_branch);
        if let Some(else_branch) = &stmt.else_branch {
            self.resolve_stmt(else_branch);
        }
    }

    fn visit_print_stmt(&mut self, stmt: &PrintData) {
        self.resolve_expr(&stmt.expr);
    }

    fn visit_return_stmt(&mut self, stmt: &ReturnData) {
        if self.current_function == FunctionKind::None {
            ResolveError {
                token: stmt.keyword.clone(),
                message: "Cannot return from top-level code.".to_string(),
            }.report(self.diagnostics);
        }

        if let Some(value) = &stmt.value {
            if self.current_function == FunctionKind::Initializer {
                ResolveError {
                    token: stmt.keyword.clone(),
                    message: "Cannot return a value from an initializer.".to_string(),
                }.report(self.diagnostics);
            }
            self.resolve_expr(value);
        }
    }

    fn visit_var_stmt(&mut self, stmt: &VarData) {
        self.declare(&stmt.name);
        if let Some(initializer) = &stmt.initializer {
            self.resolve_expr(initializer);
        }
        self.define(&stmt.name);
    }

    fn visit_while_stmt(&mut self, stmt: &WhileData) {
        self.resolve_expr(&stmt.condition);
        self.resolve_stmt(&stmt.body);
    }
}
