//! Titan: a dynamically-typed scripting language, single-pass Pratt
//! compiler driving a stack-based bytecode VM. `main.rs` is the CLI entry
//! point.

pub mod compiler;
pub mod debug;
pub mod error;
pub mod opcode;
pub mod program;
pub mod repl;
pub mod scanner;
pub mod value;
pub mod vm;

use compiler::Compiler;
use error::RuntimeError;
use vm::Vm;

/// Outcome of one compile+run cycle. `main.rs` maps these to process exit
/// codes.
#[derive(Debug, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

/// Compile and run `source` against `vm`, printing diagnostics to stderr as
/// they occur (compile errors during compilation; the runtime error, if
/// any, when the VM halts). Used by both file mode and the REPL, which
/// differ only in whether `vm`'s globals are shared across calls.
pub fn interpret(source: &str, vm: &mut Vm) -> InterpretResult {
    let program = match Compiler::compile(source) {
        Some(program) => program,
        None => return InterpretResult::CompileError,
    };

    match vm.run(&program) {
        Ok(()) => InterpretResult::Ok,
        Err(RuntimeError::VmInvariant(_))
        | Err(RuntimeError::TypeMismatch(_))
        | Err(RuntimeError::UndefinedVariable(_)) => InterpretResult::RuntimeError,
    }
}
