//! # Disassembler
//!
//! Human-readable dump of a compiled [`Program`]: one line per instruction,
//! offset, source line (elided with `|` when unchanged from the previous
//! instruction), mnemonic, and, for instructions with an operand, the
//! decoded operand value. Not on the compile+execute path; purely a
//! debugging aid.
//!
//! Execution tracing (printing the stack and the current instruction before
//! every step) is a second, VM-side use of the same per-instruction
//! formatting, toggled by the `TITAN_TRACE` environment variable, checked
//! at runtime since this crate has no build-time debug flavor of its own.

use crate::opcode::Opcode;
use crate::program::Program;
use crate::value::Value;

/// Disassemble every instruction in `program`, printing to stdout.
pub fn disassemble_program(program: &Program, name: &str) {
    println!("== {} ==", name);
    let mut offset = 0;
    while offset < program.code.len() {
        offset = disassemble_instruction(program, offset);
    }
}

/// Print one instruction at `offset` and return the offset of the next one.
pub fn disassemble_instruction(program: &Program, offset: usize) -> usize {
    print!("{:04} ", offset);

    if offset > 0 && program.lines[offset] == program.lines[offset - 1] {
        print!("   | ");
    } else {
        print!("{:4} ", program.lines[offset]);
    }

    let opcode = Opcode::from_byte(program.code[offset]);
    print!("{:<20}", opcode.name());

    if let Some(width) = opcode.operand_width() {
        let operand = program.read_operand(offset + 1, width);
        match opcode {
            Opcode::Constant
            | Opcode::ConstantW2
            | Opcode::ConstantW4
            | Opcode::DefineGlobal
            | Opcode::DefineGlobalW2
            | Opcode::DefineGlobalW4
            | Opcode::GetGlobal
            | Opcode::GetGlobalW2
            | Opcode::GetGlobalW4
            | Opcode::SetGlobal
            | Opcode::SetGlobalW2
            | Opcode::SetGlobalW4 => {
                let value = program
                    .constants
                    .get(operand as usize)
                    .map(Value::to_string)
                    .unwrap_or_else(|| "<invalid constant>".to_string());
                print!("{:4} '{}'", operand, value);
            }
            _ => print!("{:4}", operand),
        }
    }
    println!();

    offset + opcode.instruction_length()
}

/// Whether `TITAN_TRACE=1` (or any non-empty value) is set. Checked once per
/// run, not once per instruction, see `vm::Vm::new`.
pub fn trace_enabled() -> bool {
    std::env::var("TITAN_TRACE")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

/// Print the operand stack followed by the next instruction to execute,
/// the runtime half of `TITAN_TRACE`.
pub fn trace_step(program: &Program, pc: usize, stack: &[Value]) {
    print!("          ");
    for value in stack {
        print!("[ {} ]", value);
    }
    println!();
    disassemble_instruction(program, pc);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Compiler;

    #[test]
    fn disassembles_without_panicking() {
        let program = Compiler::compile("print 1 + 2;").expect("compiles");
        disassemble_program(&program, "test");
    }

    #[test]
    fn trace_enabled_reads_env_var() {
        std::env::remove_var("TITAN_TRACE");
        assert!(!trace_enabled());
        std::env::set_var("TITAN_TRACE", "1");
        assert!(trace_enabled());
        std::env::remove_var("TITAN_TRACE");
    }
}
