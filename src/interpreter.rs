use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::class::{Class, Instance};
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::expr::{
    AssignData, BinaryData, CallData, Expr, ExprVisitor, GetData, GroupingData, LiteralData,
    LiteralValue, LogicalData, SetData, SuperData, ThisData, UnaryData, VariableData,
};
use crate::function::{native_clock, Function};
use crate::object::{Callable, Object};
use crate::stmt::{
    BlockData, ClassData, ExpressionData, FunctionData, IfData, PrintData, ReturnData,
    Stmt, StmtVisitor, VarData, WhileData,
};
use crate::token::{Token, Type};

/// The two ways statement execution can unwind besides falling off the end
/// of a block: a genuine runtime error, or an in-flight `return` looking for
/// its call boundary. The two are never confused with each other.
#[derive(Debug)]
pub enum Flow {
    Return(Object),
    Error(RuntimeError),
}

impl From<RuntimeError> for Flow {
    fn from(error: RuntimeError) -> Self {
        Flow::Error(error)
    }
}

type EvalResult = Result<Object, RuntimeError>;
type ExecResult = Result<(), Flow>;

/// Tree-walking evaluator. Owns the global environment, the environment
/// currently in scope, the depth map populated by the resolver, and the
/// sink `print` writes to.
pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    depths: HashMap<u32, usize>,
    output: Box<dyn Write>,
}

impl Interpreter {
    pub fn new(output: Box<dyn Write>) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new(None)));
        globals.borrow_mut().define("clock", Object::NativeFunction(Rc::new(native_clock())));

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            depths: HashMap::new(),
            output,
        }
    }

    /// Records that the expression identified by `id` resolves `depth`
    /// enclosing scopes outward. Called back by the resolver, never by the
    /// interpreter itself.
    pub fn resolve(&mut self, id: u32, depth: usize) {
        self.depths.insert(id, depth);
    }

    /// Runs a top-level statement list. Stops at the first runtime error.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(Flow::Error(error)) => return Err(error),
                Err(Flow::Return(_)) => {
                    unreachable!("the resolver forbids `return` outside of a function")
                }
            }
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        stmt.accept(self)
    }

    fn evaluate(&mut self, expr: &Expr) -> EvalResult {
        expr.accept(self)
    }

    /// Runs `statements` with `environment` installed as current, restoring
    /// the previous environment on every exit path: normal completion, a
    /// runtime error, or an in-flight return.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);

        for statement in statements {
            if let Err(flow) = self.execute(statement) {
                self.environment = previous;
                return Err(flow);
            }
        }

        self.environment = previous;
        Ok(())
    }

    fn lookup_variable(&self, name: &Token, id: u32) -> EvalResult {
        match self.depths.get(&id) {
            Some(&distance) => self.environment.borrow().get_at(distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn invoke(&mut self, callable: &dyn Callable, paren: &Token, arguments: Vec<Object>) -> EvalResult {
        if arguments.len() != callable.arity() {
            return Err(RuntimeError {
                token: paren.clone(),
                message: format!("Expected {} arguments but got {}.", callable.arity(), arguments.len()),
            });
        }

        callable.call(self, arguments)
    }

    fn print_line(&mut self, value: &Object) {
        writeln!(self.output, "{value}").expect("the configured output sink should accept writes");
    }
}

impl ExprVisitor<EvalResult> for Interpreter {
    fn visit_literal_expr(&mut self, expr: &LiteralData) -> EvalResult {
        Ok(match &expr.value {
            LiteralValue::Nil => Object::Nil,
            LiteralValue::Bool(b) => Object::Bool(*b),
            LiteralValue::Number(n) => Object::Number(*n),
            LiteralValue::String(s) => Object::String(s.clone()),
        })
    }

    fn visit_grouping_expr(&mut self, expr: &GroupingData) -> EvalResult {
        self.evaluate(&expr.expr)
    }

    fn visit_unary_expr(&mut self, expr: &UnaryData) -> EvalResult {
        let right = self.evaluate(&expr.expr)?;

        match expr.operator.r#type {
            Type::Minus => match right {
                Object::Number(n) => Ok(Object::Number(-n)),
                _ => Err(RuntimeError {
                    token: expr.operator.clone(),
                    message: "Operand must be a number.".to_string(),
                }),
            },
            Type::Bang => Ok(Object::Bool(!right.is_truthy())),
            _ => unreachable!("unary operator token restricted to ! and - by the parser"),
        }
    }

    fn visit_binary_expr(&mut self, expr: &BinaryData) -> EvalResult {
        let left = self.evaluate(&expr.left)?;
        let right = self.evaluate(&expr.right)?;

        let number_operands_error = || RuntimeError {
            token: expr.operator.clone(),
            message: "Operands must be numbers.".to_string(),
        };

        match expr.operator.r#type {
            Type::Plus => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Number(l + r)),
                (Object::String(l), Object::String(r)) => Ok(Object::String(l + &r)),
                _ => Err(RuntimeError {
                    token: expr.operator.clone(),
                    message: "Operands must be two numbers or two strings.".to_string(),
                }),
            },
            Type::Minus => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Number(l - r)),
                _ => Err(number_operands_error()),
            },
            Type::Star => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Number(l * r)),
                _ => Err(number_operands_error()),
            },
            Type::Slash => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Number(l / r)),
                _ => Err(number_operands_error()),
            },
            Type::Greater => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Bool(l > r)),
                _ => Err(number_operands_error()),
            },
            Type::GreaterEqual => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Bool(l >= r)),
                _ => Err(number_operands_error()),
            },
            Type::Less => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Bool(l < r)),
                _ => Err(number_operands_error()),
            },
            Type::LessEqual => match (left, right) {
                (Object::Number(l), Object::Number(r)) => Ok(Object::Bool(l <= r)),
                _ => Err(number_operands_error()),
            },
            Type::EqualEqual => Ok(Object::Bool(left == right)),
            Type::BangEqual => Ok(Object::Bool(left != right)),
            _ => unreachable!("binary operator token restricted by the parser grammar"),
        }
    }

    fn visit_variable_expr(&mut self, expr: &VariableData) -> EvalResult {
        self.lookup_variable(&expr.name, expr.id)
    }

    fn visit_assign_expr(&mut self, expr: &AssignData) -> EvalResult {
        let value = self.evaluate(&expr.value)?;

        match self.depths.get(&expr.id) {
            Some(&distance) => self.environment.borrow_mut().assign_at(distance, &expr.name, value.clone()),
            None => self.globals.borrow_mut().assign(&expr.name, value.clone())?,
        }

        Ok(value)
    }

    fn visit_logical_expr(&mut self, expr: &LogicalData) -> EvalResult {
        let left = self.evaluate(&expr.left)?;

        let short_circuits = if expr.operator.r#type == Type::Or { left.is_truthy() } else { !left.is_truthy() };

        if short_circuits {
            Ok(left)
        } else {
            self.evaluate(&expr.right)
        }
    }

    fn visit_call_expr(&mut self, expr: &CallData) -> EvalResult {
        let callee = self.evaluate(&expr.callee)?;

        let mut arguments = Vec::with_capacity(expr.arguments.len());
        for argument in &expr.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        match &callee {
            Object::Function(function) => self.invoke(function.as_ref(), &expr.paren, arguments),
            Object::NativeFunction(function) => self.invoke(function.as_ref(), &expr.paren, arguments),
            Object::Class(class) => {
                let arity = class.borrow().find_method("init").map_or(0, |init| init.arity());
                if arguments.len() != arity {
                    return Err(RuntimeError {
                        token: expr.paren.clone(),
                        message: format!("Expected {arity} arguments but got {}.", arguments.len()),
                    });
                }

                let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(class))));

                if let Some(initializer) = class.borrow().find_method("init") {
                    let bound = initializer.bind(Object::Instance(Rc::clone(&instance)));
                    bound.call(self, arguments)?;
                }

                Ok(Object::Instance(instance))
            }
            _ => Err(RuntimeError {
                token: expr.paren.clone(),
                message: "Can only call functions and classes.".to_string(),
            }),
        }
    }

    fn visit_get_expr(&mut self, expr: &GetData) -> EvalResult {
        let object = self.evaluate(&expr.object)?;

        match &object {
            Object::Instance(instance) => instance.borrow().get(&expr.name, instance),
            _ => Err(RuntimeError {
                token: expr.name.clone(),
                message: "Only instances have properties.".to_string(),
            }),
        }
    }

    fn visit_set_expr(&mut self, expr: &SetData) -> EvalResult {
        let object = self.evaluate(&expr.object)?;

        let Object::Instance(instance) = &object else {
            return Err(RuntimeError {
                token: expr.name.clone(),
                message: "Only instances have fields.".to_string(),
            });
        };

        let value = self.evaluate(&expr.value)?;
        instance.borrow_mut().set(&expr.name, value.clone());
        Ok(value)
    }

    fn visit_this_expr(&mut self, expr: &ThisData) -> EvalResult {
        self.lookup_variable(&expr.keyword, expr.id)
    }

    fn visit_super_expr(&mut self, expr: &SuperData) -> EvalResult {
        let distance = *self.depths.get(&expr.id).expect("resolver always resolves 'super' to a depth");

        let superclass = self.environment.borrow().get_at(distance, &expr.keyword)?;
        let Object::Class(superclass) = superclass else {
            unreachable!("'super' always resolves to a class value")
        };

        let this_token = Token::new(Type::This, "this".to_string(), None, expr.keyword.line);
        let instance = self.environment.borrow().get_at(distance - 1, &this_token)?;
        let Object::Instance(instance) = instance else {
            unreachable!("'this' always resolves to an instance value")
        };

        match superclass.borrow().find_method(&expr.method.lexeme) {
            Some(method) => Ok(Object::Function(Rc::new(method.bind(Object::Instance(instance))))),
            None => Err(RuntimeError {
                token: expr.method.clone(),
                message: format!("Undefined property '{}'.", expr.method.lexeme),
            }),
        }
    }
}

impl StmtVisitor<ExecResult> for Interpreter {
    fn visit_block_stmt(&mut self, stmt: &BlockData) -> ExecResult {
        let environment = Rc::new(RefCell::new(Environment::new(Some(Rc::clone(&self.environment)))));
        self.execute_block(&stmt.statements, environment)
    }

    fn visit_class_stmt(&mut self, stmt: &ClassData) -> ExecResult {
        let superclass = match &stmt.superclass {
            Some(superclass_expr) => {
                let value = self.evaluate(superclass_expr)?;
                match value {
                    Object::Class(class) => Some(class),
                    _ => {
                        let Expr::Variable(variable) = superclass_expr else {
                            unreachable!("Class.superclass is always a Variable expression")
                        };
                        return Err(Flow::Error(RuntimeError {
                            token: variable.name.clone(),
                            message: "Superclass must be a class.".to_string(),
                        }));
                    }
                }
            }
            None => None,
        };

        self.environment.borrow_mut().define(&stmt.name.lexeme, Object::Nil);

        let enclosing = if let Some(superclass) = &superclass {
            let mut scope = Environment::new(Some(Rc::clone(&self.environment)));
            scope.define("super", Object::Class(Rc::clone(superclass)));
            Some(std::mem::replace(&mut self.environment, Rc::new(RefCell::new(scope))))
        } else {
            None
        };

        let mut methods = HashMap::new();
        for method in &stmt.methods {
            let Stmt::Function(data) = method else {
                unreachable!("a class body only ever contains function declarations")
            };
            let is_initializer = data.name.lexeme == "init";
            let function = Function::new(Rc::new(data.clone()), Rc::clone(&self.environment), is_initializer);
            methods.insert(data.name.lexeme.clone(), Rc::new(function));
        }

        if let Some(enclosing) = enclosing {
            self.environment = enclosing;
        }

        let class = Class::new(stmt.name.lexeme.clone(), superclass, methods);
        self.environment.borrow_mut().assign(&stmt.name, Object::Class(Rc::new(RefCell::new(class))))?;

        Ok(())
    }

    fn visit_expression_stmt(&mut self, stmt: &ExpressionData) -> ExecResult {
        self.evaluate(&stmt.expr)?;
        Ok(())
    }

    fn visit_function_stmt(&mut self, stmt: &FunctionData) -> ExecResult {
        let function = Function::new(Rc::new(stmt.clone()), Rc::clone(&self.environment), false);
        self.environment.borrow_mut().define(&stmt.name.lexeme, Object::Function(Rc::new(function)));
        Ok(())
    }

    fn visit_if_stmt(&mut self, stmt: &IfData) -> ExecResult {
        if self.evaluate(&stmt.condition)?.is_truthy() {
            self.execute(&stmt.then_branch)
        } else if let Some(else_branch) = &stmt.else_branch {
            self.execute(else_branch)
        } else {
            Ok(())
        }
    }

    fn visit_print_stmt(&mut self, stmt: &PrintData) -> ExecResult {
        let value = self.evaluate(&stmt.expr)?;
        self.print_line(&value);
        Ok(())
    }

    fn visit_return_stmt(&mut self, stmt: &ReturnData) -> ExecResult {
        let value = match &stmt.value {
            Some(expr) => self.evaluate(expr)?,
            None => Object::Nil,
        };

        Err(Flow::Return(value))
    }

    fn visit_var_stmt(&mut self, stmt: &VarData) -> ExecResult {
        let value = match &stmt.initializer {
            Some(initializer) => self.evaluate(initializer)?,
            None => Object::Nil,
        };

        self.environment.borrow_mut().define(&stmt.name.lexeme, value);
        Ok(())
    }

    fn visit_while_stmt(&mut self, stmt: &WhileData) -> ExecResult {
        while self.evaluate(&stmt.condition)?.is_truthy() {
            self.execute(&stmt.body)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;
    use crate::error::Diagnostics;

    /// A `Write` sink that hands its bytes to a shared, owned buffer so the
    /// test can read them back after the `Interpreter` (and its
    /// `Box<dyn Write>`, which must be `'static`) is done with them.
    struct SharedSink(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn run(source: &str) -> String {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        let statements = Parser::new(tokens).parse(&mut diagnostics);
        assert!(!diagnostics.had_error(), "unexpected compile error for {source:?}");

        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut interpreter = Interpreter::new(Box::new(SharedSink(Rc::clone(&buffer))));

        let mut resolver = Resolver::new(&mut interpreter, &mut diagnostics);
        resolver.resolve(&statements);
        assert!(!diagnostics.had_error(), "unexpected resolve error for {source:?}");

        interpreter.interpret(&statements).expect("unexpected runtime error");
        drop(interpreter);
        String::from_utf8(Rc::try_unwrap(buffer).unwrap().into_inner()).unwrap()
    }

    #[test]
    fn arithmetic_and_print() {
        assert_eq!(run("print 1 + 2;"), "3\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run(r#"print "a" + "b";"#), "ab\n");
    }

    #[test]
    fn block_scoping_shadows_then_restores() {
        assert_eq!(run("var a = 1; { var a = 2; print a; } print a;"), "2\n1\n");
    }

    #[test]
    fn closures_capture_environment_not_value() {
        let source = "
            fun makeCounter() {
                var i = 0;
                fun inc() { i = i + 1; print i; }
                return inc;
            }
            var c = makeCounter();
            c(); c();
        ";
        assert_eq!(run(source), "1\n2\n");
    }

    #[test]
    fn single_inheritance_and_super() {
        let source = r#"
            class A { say() { print "A"; } }
            class B < A { say() { super.say(); print "B"; } }
            B().say();
        "#;
        assert_eq!(run(source), "A\nB\n");
    }

    #[test]
    fn initializer_returns_receiver() {
        let source = r#"
            class P { init(n) { this.n = n; } }
            print P(7).n;
        "#;
        assert_eq!(run(source), "7\n");
    }

    #[test]
    fn number_formatting_strips_trailing_zero() {
        assert_eq!(run("print 4.0;"), "4\n");
        assert_eq!(run("print 4.5;"), "4.5\n");
    }
}
