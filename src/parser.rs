use crate::error::{Diagnostic, Diagnostics, ParseError};
use crate::expr::{Expr, LiteralValue};
use crate::stmt::{
    BlockData, ClassData, ExpressionData, FunctionData, IfData, PrintData, ReturnData, Stmt,
    VarData, WhileData,
};
use crate::token::{Token, Type};

/// Functions and methods take at most this many parameters, and calls pass
/// at most this many arguments.
const MAX_ARITY: usize = 8;

/// Recursive-descent parser turning a token stream into a statement list.
/// On a syntax error, reports it and synchronizes to the next statement
/// boundary rather than aborting the whole parse, so a single file can
/// surface more than one error per run.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    /// Errors that are reported but must not unwind the current parse (an
    /// invalid assignment target, an over-long parameter/argument list): the
    /// offending expression is kept as-is so parsing can keep going and a
    /// single source can surface more than one diagnostic.
    soft_errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, current: 0, soft_errors: Vec::new() }
    }

    pub fn parse(&mut self, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(error) => {
                    error.report(diagnostics);
                    self.synchronize();
                }
            }
        }

        for error in self.soft_errors.drain(..) {
            error.report(diagnostics);
        }

        statements
    }

    // --- declarations ---

    fn declaration(&mut self) -> Result<Stmt, ParseError> {
        if self.matches(&[Type::Class]) {
            self.class_declaration()
        } else if self.matches(&[Type::Fun]) {
            self.function("function")
        } else if self.matches(&[Type::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(Type::Identifier, "Expect class name.")?;

        let superclass = if self.matches(&[Type::Less]) {
            let superclass_name = self.consume(Type::Identifier, "Expect superclass name.")?;
            Some(Expr::variable(superclass_name))
        } else {
            None
        };

        self.consume(Type::LeftBrace, "Expect '{' before class body.")?;

        let mut methods = Vec::new();
        while !self.check(Type::RightBrace) && !self.is_at_end() {
            methods.push(self.function("method")?);
        }

        self.consume(Type::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassData { name, superclass, methods }))
    }

    fn function(&mut self, kind: &str) -> Result<Stmt, ParseError> {
        let name = self.consume(Type::Identifier, &format!("Expect {kind} name."))?;

        self.consume(Type::LeftParen, &format!("Expect '(' after {kind} name."))?;
        let mut params = Vec::new();
        if !self.check(Type::RightParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    let error = self.error(self.peek(), &format!("Can't have more than {MAX_ARITY} parameters."));
                    self.soft_errors.push(error);
                }
                params.push(self.consume(Type::Identifier, "Expect parameter name.")?);
                if !self.matches(&[Type::Comma]) {
                    break;
                }
            }
        }
        self.consume(Type::RightParen, "Expect ')' after parameters.")?;

        self.consume(Type::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(Stmt::Function(FunctionData { name, params, body }))
    }

    fn var_declaration(&mut self) -> Result<Stmt, ParseError> {
        let name = self.consume(Type::Identifier, "Expect variable name.")?;

        let initializer = if self.matches(&[Type::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(Type::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(VarData { name, initializer }))
    }

    // --- statements ---

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        if self.matches(&[Type::For]) {
            self.for_statement()
        } else if self.matches(&[Type::If]) {
            self.if_statement()
        } else if self.matches(&[Type::Print]) {
            self.print_statement()
        } else if self.matches(&[Type::Return]) {
            self.return_statement()
        } else if self.matches(&[Type::While]) {
            self.while_statement()
        } else if self.matches(&[Type::LeftBrace]) {
            Ok(Stmt::Block(BlockData { statements: self.block()? }))
        } else {
            self.expression_statement()
        }
    }

    /// Desugars into a `while` loop wrapped in a block, rather than existing
    /// as its own AST node or interpreter case.
    fn for_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(Type::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(&[Type::Semicolon]) {
            None
        } else if self.matches(&[Type::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check(Type::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Type::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check(Type::RightParen) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(Type::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(BlockData {
                statements: vec![body, Stmt::Expression(ExpressionData { expr: increment })],
            });
        }

        let condition = condition.unwrap_or_else(|| Expr::literal(LiteralValue::Bool(true)));
        body = Stmt::While(WhileData { condition, body: Box::new(body) });

        if let Some(initializer) = initializer {
            body = Stmt::Block(BlockData { statements: vec![initializer, body] });
        }

        Ok(body)
    }

    fn if_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(Type::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(&[Type::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If(IfData { condition, then_branch, else_branch }))
    }

    fn print_statement(&mut self) -> Result<Stmt, ParseError> {
        let value = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(PrintData { expr: value }))
    }

    fn return_statement(&mut self) -> Result<Stmt, ParseError> {
        let keyword = self.previous();
        let value = if !self.check(Type::Semicolon) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(Type::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return(ReturnData { keyword, value }))
    }

    fn while_statement(&mut self) -> Result<Stmt, ParseError> {
        self.consume(Type::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Type::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::While(WhileData { condition, body }))
    }

    fn block(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut statements = Vec::new();

        while !self.check(Type::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }

        self.consume(Type::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn expression_statement(&mut self) -> Result<Stmt, ParseError> {
        let expr = self.expression()?;
        self.consume(Type::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(ExpressionData { expr }))
    }

    // --- expressions ---

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr, ParseError> {
        let expr = self.or()?;

        if self.matches(&[Type::Equal]) {
            let equals = self.previous();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(variable) => Ok(Expr::assign(variable.name, value)),
                Expr::Get(get) => Ok(Expr::set(*get.object, get.name, value)),
                _ => {
                    self.soft_errors.push(self.error(&equals, "Invalid assignment target."));
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.and()?;

        while self.matches(&[Type::Or]) {
            let operator = self.previous();
            let right = self.and()?;
            expr = Expr::logical(expr, operator, right);
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.equality()?;

        while self.matches(&[Type::And]) {
            let operator = self.previous();
            let right = self.equality()?;
            expr = Expr::logical(expr, operator, right);
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.comparison()?;

        while self.matches(&[Type::BangEqual, Type::EqualEqual]) {
            let operator = self.previous();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.term()?;

        while self.matches(&[Type::Greater, Type::GreaterEqual, Type::Less, Type::LessEqual]) {
            let operator = self.previous();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.factor()?;

        while self.matches(&[Type::Minus, Type::Plus]) {
            let operator = self.previous();
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.unary()?;

        while self.matches(&[Type::Slash, Type::Star]) {
            let operator = self.previous();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if self.matches(&[Type::Bang, Type::Minus]) {
            let operator = self.previous();
            let right = self.unary()?;
            return Ok(Expr::unary(operator, right));
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(&[Type::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.matches(&[Type::Dot]) {
                let name = self.consume(Type::Identifier, "Expect property name after '.'.")?;
                expr = Expr::get(expr, name);
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr, ParseError> {
        let mut arguments = Vec::new();

        if !self.check(Type::RightParen) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    let error = self.error(self.peek(), &format!("Can't have more than {MAX_ARITY} arguments."));
                    self.soft_errors.push(error);
                }
                arguments.push(self.expression()?);
                if !self.matches(&[Type::Comma]) {
                    break;
                }
            }
        }

        let paren = self.consume(Type::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::call(callee, paren, arguments))
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        if self.matches(&[Type::False]) {
            return Ok(Expr::literal(LiteralValue::Bool(false)));
        }
        if self.matches(&[Type::True]) {
            return Ok(Expr::literal(LiteralValue::Bool(true)));
        }
        if self.matches(&[Type::Nil]) {
            return Ok(Expr::literal(LiteralValue::Nil));
        }

        if self.matches(&[Type::Number]) {
            let crate::literal::Literal::Number(n) = self.previous().literal.expect("scanner attaches a literal to every NUMBER token") else {
                unreachable!("a NUMBER token always carries a Literal::Number")
            };
            return Ok(Expr::literal(LiteralValue::Number(n)));
        }

        if self.matches(&[Type::String]) {
            let crate::literal::Literal::String(s) = self.previous().literal.expect("scanner attaches a literal to every STRING token") else {
                unreachable!("a STRING token always carries a Literal::String")
            };
            return Ok(Expr::literal(LiteralValue::String(s)));
        }

        if self.matches(&[Type::Super]) {
            let keyword = self.previous();
            self.consume(Type::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(Type::Identifier, "Expect superclass method name.")?;
            return Ok(Expr::super_(keyword, method));
        }

        if self.matches(&[Type::This]) {
            return Ok(Expr::this(self.previous()));
        }

        if self.matches(&[Type::Identifier]) {
            return Ok(Expr::variable(self.previous()));
        }

        if self.matches(&[Type::LeftParen]) {
            let expr = self.expression()?;
            self.consume(Type::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::grouping(expr));
        }

        Err(self.error(self.peek(), "Expect expression."))
    }

    // --- token stream helpers ---

    fn matches(&mut self, types: &[Type]) -> bool {
        for &r#type in types {
            if self.check(r#type) {
                self.advance();
                return true;
            }
        }
        false
    }

    fn check(&self, r#type: Type) -> bool {
        !self.is_at_end() && self.peek().r#type == r#type
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().r#type == Type::EOF
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> Token {
        self.tokens[self.current - 1].clone()
    }

    fn consume(&mut self, r#type: Type, message: &str) -> Result<Token, ParseError> {
        if self.check(r#type) {
            return Ok(self.advance());
        }

        Err(self.error(self.peek(), message))
    }

    fn error(&self, token: &Token, message: &str) -> ParseError {
        ParseError { token: token.clone(), message: message.to_string() }
    }

    /// Discards tokens until the start of what looks like the next
    /// statement, so one syntax error doesn't cascade into a wall of
    /// spurious follow-on errors.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if self.tokens[self.current - 1].r#type == Type::Semicolon {
                return;
            }

            match self.peek().r#type {
                Type::Class | Type::Fun | Type::Var | Type::For | Type::If | Type::While
                | Type::Print | Type::Return => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}
