//! A tree-walking interpreter for a small dynamically-typed, class-based
//! scripting language: scan, parse, resolve, interpret.

pub mod class;
pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod literal;
pub mod object;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use error::{Diagnostic, Diagnostics};
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Top-level driver: owns the persistent `Interpreter` and the compile/
/// runtime error flags, and exposes the three ways a program reaches this
/// crate (a file, a REPL line, or an in-memory source string) through a
/// single `run` pipeline.
pub struct Lox {
    interpreter: Interpreter,
    diagnostics: Diagnostics,
}

impl Lox {
    /// `output` receives everything `print` writes. Callers that need to
    /// inspect what ran (tests, an embedder) can pass a shared in-memory
    /// sink; `main.rs` passes `io::stdout()`.
    pub fn new(output: Box<dyn Write>) -> Lox {
        Lox {
            interpreter: Interpreter::new(output),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn had_error(&self) -> bool {
        self.diagnostics.had_error()
    }

    pub fn had_runtime_error(&self) -> bool {
        self.diagnostics.had_runtime_error()
    }

    /// Reads `path` and runs it as a complete program. Distinguishes a
    /// missing file (the caller maps this to exit code 127) from other I/O
    /// failures, which are not expected in normal operation and are
    /// propagated as a hard error.
    pub fn run_file(&mut self, path: &Path) -> Result<(), io::Error> {
        match fs::read_to_string(path) {
            Ok(source) => {
                self.run(&source);
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Err(error),
            Err(error) => panic!("could not read {}: {error}", path.display()),
        }
    }

    /// An interactive read-eval-print loop over `rustyline`, with history
    /// persisted at `$HOME/.loxrs_history`. Each line runs against the same
    /// `Interpreter` so declarations and side effects from earlier lines
    /// stay visible, but the error flags reset between lines so one bad line
    /// doesn't leave the prompt permanently in an errored state.
    pub fn run_prompt(&mut self) -> Result<(), io::Error> {
        let mut editor = rustyline::DefaultEditor::new()
            .map_err(|error| io::Error::new(io::ErrorKind::Other, error.to_string()))?;

        let history_path = home::home_dir().map(|home| home.join(".loxrs_history"));
        if let Some(path) = &history_path {
            let _ = editor.load_history(path);
        }

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    let _ = editor.add_history_entry(line.as_str());
                    self.diagnostics.reset();
                    self.run(&line);
                }
                Err(rustyline::error::ReadlineError::Eof)
                | Err(rustyline::error::ReadlineError::Interrupted) => break,
                Err(error) => return Err(io::Error::new(io::ErrorKind::Other, error.to_string())),
            }
        }

        if let Some(path) = &history_path {
            let _ = editor.save_history(path);
        }

        Ok(())
    }

    /// Runs `source` through the full scan/parse/resolve/interpret
    /// pipeline, stopping early after any stage that reports a compile-time
    /// error. Exposed directly so tests and embedders can drive the
    /// pipeline without going through a file or the REPL.
    pub fn run(&mut self, source: &str) {
        let tokens = Scanner::new(source).scan_tokens(&mut self.diagnostics);
        let statements = Parser::new(tokens).parse(&mut self.diagnostics);

        if self.diagnostics.had_error() {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter, &mut self.diagnostics);
        resolver.resolve(&statements);

        if self.diagnostics.had_error() {
            return;
        }

        if let Err(error) = self.interpreter.interpret(&statements) {
            error.report(&mut self.diagnostics);
        }
    }
}
