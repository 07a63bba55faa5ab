//! # Titan CLI entry point
//!
//! - No args: interactive REPL (see `repl.rs`).
//! - One arg, `-h`/`--help`: print usage, exit 0.
//! - One arg, `-v`/`--version`: print version, exit 0.
//! - One arg, anything else: treated as a source file path; read, compile,
//!   run once; exit code mirrors the interpret result.
//! - More than one arg: usage to stdout, exit with the "too many args" code.
//!
//! Exit codes map `InterpretResult`: `0` OK, `-1` too-many-args, `-2`
//! compile error, `-3` runtime error. The exact byte a shell observes for a
//! negative code is platform truncation, not something this crate controls;
//! the sign (and thus which of the three failure modes occurred) is what's
//! load-bearing.

use std::env;
use std::fs;
use std::process::ExitCode;

use titan::vm::Vm;
use titan::{interpret, InterpretResult};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn usage() -> String {
    format!(
        r#"Titan v{VERSION}

Usage:
    titan [script]

Arguments:
    [script]
        Path to a Titan source file to compile and run. With no path,
        starts an interactive REPL.

Options:
    -h, --help
        Show this help message and exit.
    -v, --version
        Show the interpreter version."#
    )
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => {
            titan::repl::run();
            ExitCode::from(0)
        }
        2 if args[1] == "-h" || args[1] == "--help" => {
            println!("{}", usage());
            ExitCode::from(0)
        }
        2 if args[1] == "-v" || args[1] == "--version" => {
            println!("titan {}", VERSION);
            ExitCode::from(0)
        }
        2 => run_file(&args[1]),
        _ => {
            println!("{}", usage());
            exit_code(-1)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Could not read file '{}': {}", path, err);
            return exit_code(-2);
        }
    };

    let mut vm = Vm::new();
    match interpret(&source, &mut vm) {
        InterpretResult::Ok => exit_code(0),
        InterpretResult::CompileError => exit_code(-2),
        InterpretResult::RuntimeError => exit_code(-3),
    }
}

/// `ExitCode` has no public constructor for arbitrary `i32`s (only `0`/`1`
/// portably, plus `From<u8>`), so negative "exit codes" are nominal values
/// rather than literal process exit statuses: mapped onto the `u8` range by
/// taking the low byte, the same truncation every OS applies to exit
/// statuses anyway.
fn exit_code(code: i32) -> ExitCode {
    ExitCode::from((code & 0xFF) as u8)
}
