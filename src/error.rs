use crate::token::{Token, Type};

/// Tracks whether a compile-time or runtime error has been reported so far.
/// Kept as a field on the driver object (see [`crate::Lox`]) rather than as
/// process-wide mutable statics, so a long-lived REPL session and a library
/// embedder both get a clean, independent slate.
#[derive(Debug, Default)]
pub struct Diagnostics {
    had_error: bool,
    had_runtime_error: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn had_error(&self) -> bool {
        self.had_error || self.had_runtime_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }
}

/// Every diagnostic kind knows how to format itself and flip the matching
/// flag on the shared [`Diagnostics`] sink.
pub trait Diagnostic {
    fn report(&self, diagnostics: &mut Diagnostics);
}

/// A lexical error: an unterminated string, a trailing bare `.`, or an
/// unrecognized character. Anchored only to a line, since the scanner has no
/// token yet to anchor to.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl Diagnostic for ScanError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        eprintln!("[line {}] Error: {}", self.line, self.message);
        diagnostics.had_error = true;
    }
}

/// A syntax error raised by the recursive-descent parser. Caught at the
/// `declaration` boundary and used to drive synchronization.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ParseError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        if self.token.r#type == Type::EOF {
            eprintln!("[line {}] Error at end: {}", self.token.line, self.message);
        } else {
            eprintln!("[line {}] Error at '{}': {}", self.token.line, self.token.lexeme, self.message);
        }
        diagnostics.had_error = true;
    }
}

/// A static semantic error found by the resolver: illegal `this`/`super`
/// use, a bad `return`, or a variable redeclared in the same scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for ResolveError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        eprintln!("[line {}] Error at '{}': {}", self.token.line, self.token.lexeme, self.message);
        diagnostics.had_error = true;
    }
}

/// An error raised while evaluating the AST: a type mismatch, an undefined
/// variable, a non-callable call target, and so on. Unwinds to the top-level
/// `interpret` call.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl Diagnostic for RuntimeError {
    fn report(&self, diagnostics: &mut Diagnostics) {
        eprintln!("{}", self.message);
        eprintln!("[line {}]", self.token.line);
        diagnostics.had_runtime_error = true;
    }
}
