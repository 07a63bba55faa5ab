//! # Interactive REPL
//!
//! One line in, one line (or diagnostic) out, against a single [`Vm`] whose
//! globals live for the REPL's whole lifetime, so a `var` declared on one
//! line is visible to `print` on the next. Runs in-process: Titan's VM has
//! no embedded self-hosted interpreter to shell out to, so there's nothing
//! a child process would buy here that a shared `Vm` doesn't already give
//! for free.
//!
//! Prompt `"> "`, read one line, interpret it, loop forever; interpret
//! errors are reported to stderr but never exit the loop; EOF (`read_line`
//! returning `Ok(0)`) exits `0`.

use std::io::{self, Write};

use crate::interpret;
use crate::vm::Vm;

/// Run the REPL to completion (EOF), reusing one persistent `Vm`.
pub fn run() {
    let mut vm = Vm::new();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush().expect("stdout is writable");

        line.clear();
        let bytes_read = match io::stdin().read_line(&mut line) {
            Ok(n) => n,
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                continue;
            }
        };

        if bytes_read == 0 {
            // EOF (Ctrl+D): exit cleanly, no trailing diagnostic.
            return;
        }

        // A blank line (just a newline) compiles to an empty, no-op
        // program; skip it rather than pay for a Compiler::compile call.
        if line.trim().is_empty() {
            continue;
        }

        // Diagnostics from a failed compile or run already went to stderr
        // inside `interpret`/`Vm::run`; the REPL itself has nothing to add
        // beyond looping back for the next line.
        interpret(&line, &mut vm);
    }
}
