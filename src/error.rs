//! # Error Handling for the Titan VM
//!
//! Compile-time diagnostics (scan and compile errors) are printed directly
//! to stderr at the point they're discovered by the compiler; there's no
//! need for a `CompileError` value type, since the contract is just "did
//! compilation succeed" (see `compiler.rs`'s `Compiler::compile`, whose
//! return value carries exactly that).
//!
//! [`RuntimeError`], defined here, covers everything that can go wrong once
//! the VM starts running: type mismatches, undefined globals, bad unary
//! operands. A flat enum with a hand-written [`fmt::Display`] impl and
//! `impl std::error::Error`, rather than reaching for `thiserror`, since the
//! small, message-carrying variant set here doesn't need the derive
//! machinery.

use std::fmt;

/// Errors that can occur during Titan bytecode execution.
#[derive(Debug, PartialEq)]
pub enum RuntimeError {
    /// A binary or unary operator was applied to a value of the wrong type.
    TypeMismatch(String),
    /// A global was read or assigned before it was defined.
    UndefinedVariable(String),
    /// Internal VM invariant violation (stack underflow, bad jump target),
    /// indicating a compiler bug, not a user-facing language error.
    VmInvariant(String),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TypeMismatch(msg) => write!(f, "{}", msg),
            RuntimeError::UndefinedVariable(name) => {
                write!(f, "Undefined variable '{}'.", name)
            }
            RuntimeError::VmInvariant(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for RuntimeError {}
