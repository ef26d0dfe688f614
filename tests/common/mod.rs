use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

use loxrs::Lox;

/// A `Write` sink that hands bytes to a shared, owned buffer, so the test
/// can read back what a program printed after the `Lox` driver (and its
/// `Box<dyn Write>`, which must be `'static`) is done with it.
struct SharedSink(Rc<RefCell<Vec<u8>>>);

impl Write for SharedSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Runs `source` to completion and returns everything it printed. Panics if
/// a compile-time or runtime error was reported, since callers use this for
/// the "this program runs cleanly and prints X" shape of test.
#[allow(dead_code)]
pub fn run_ok(source: &str) -> String {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let mut lox = Lox::new(Box::new(SharedSink(Rc::clone(&buffer))));
    lox.run(source);
    assert!(!lox.had_error(), "expected {source:?} to run without error");
    drop(lox);
    String::from_utf8(Rc::try_unwrap(buffer).unwrap().into_inner()).unwrap()
}

/// Runs `source` and reports whether a compile-time error and/or a runtime
/// error was flagged. Diagnostic text itself goes to the process's real
/// stderr (not a capturable sink — see DESIGN.md), so negative tests assert
/// on these flags rather than exact message text.
#[allow(dead_code)]
pub fn run_err(source: &str) -> (bool, bool) {
    let buffer = Rc::new(RefCell::new(Vec::new()));
    let mut lox = Lox::new(Box::new(SharedSink(buffer)));
    lox.run(source);
    (lox.had_error(), lox.had_runtime_error())
}
