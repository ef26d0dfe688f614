use std::io;
use std::path::Path;
use std::process::ExitCode;

use loxrs::Lox;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [] => {
            let mut lox = Lox::new(Box::new(io::stdout()));
            if let Err(error) = lox.run_prompt() {
                eprintln!("{error}");
                return ExitCode::from(70);
            }
            ExitCode::from(0)
        }
        [path] => {
            let mut lox = Lox::new(Box::new(io::stdout()));
            match lox.run_file(Path::new(path)) {
                Ok(()) => {
                    if lox.had_runtime_error() {
                        ExitCode::from(70)
                    } else if lox.had_error() {
                        ExitCode::from(65)
                    } else {
                        ExitCode::from(0)
                    }
                }
                Err(_) => ExitCode::from(127),
            }
        }
        _ => {
            println!("Usage: loxrs [script]");
            ExitCode::from(64)
        }
    }
}
