use std::fmt;

use crate::lexer::tokens::{Token, TokenKind};

/// The library-level outcome of compiling and/or running a chunk of source.
/// The CLI driver is the only thing that turns this into a process exit
/// code (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpretResult {
    Ok,
    CompileError,
    RuntimeError,
}

/// Errors that can escape to the CLI boundary. Compile and runtime errors
/// are reported directly to stderr by the compiler/VM as they happen (spec
/// §7 keeps those as printed diagnostics, not propagated `Result`s) — this
/// type exists only for the genuinely exceptional, "system" domain: source
/// files that can't be read.
#[derive(Debug)]
pub enum WispError {
    Io(std::io::Error),
}

impl fmt::Display for WispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WispError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for WispError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WispError::Io(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for WispError {
    fn from(e: std::io::Error) -> Self {
        WispError::Io(e)
    }
}

/// Reports a compile error at `token`, in the format required by spec §7:
/// `[line L] Error at '<lex>'|at end: <msg>`.
pub fn report_compile_error(token: &Token, message: &str) {
    eprint!("[line {}] Error", token.line);

    match token.kind {
        TokenKind::EOF => eprint!(" at end"),
        TokenKind::ERROR => {}
        _ => eprint!(" at '{}'", token.lexeme),
    }

    eprintln!(": {}", message);
}

/// Reports a runtime error, in the format required by spec §7/§4.5:
/// the message, then `[line L] in script`.
pub fn report_runtime_error(message: &str, line: Option<u32>) {
    eprintln!("{}", message);
    match line {
        Some(line) => eprintln!("[line {}] in script", line),
        None => eprintln!("[line ?] in script"),
    }
}
