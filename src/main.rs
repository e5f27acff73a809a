use std::io::{self, Write};
use std::process::ExitCode;
use std::{env, fs};

use wisp::errors::{InterpretResult, WispError};
use wisp::vm::Vm;
use wisp::{compiler, debug, run_source};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    match args.len() {
        1 => {
            repl();
            ExitCode::SUCCESS
        }
        2 => run_file(&args[1]),
        3 if args[1] == "--disassemble" => disassemble_file(&args[2]),
        _ => {
            eprintln!("Usage: wisp [--disassemble] [path]");
            ExitCode::from(64)
        }
    }
}

/// Runs lines interactively against one persistent [`Vm`], so globals
/// declared on one line are still visible on the next (spec §6.1). A
/// compile or runtime error prints a diagnostic and continues the loop
/// rather than exiting.
fn repl() {
    let mut vm = Vm::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return;
        }

        let mut line = String::new();
        match stdin.read_line(&mut line) {
            Ok(0) => {
                println!();
                return;
            }
            Ok(_) => {
                run_source(&mut vm, &line);
            }
            Err(_) => return,
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(74);
        }
    };

    let mut vm = Vm::new();
    match run_source(&mut vm, &source) {
        InterpretResult::Ok => ExitCode::SUCCESS,
        InterpretResult::CompileError => ExitCode::from(65),
        InterpretResult::RuntimeError => ExitCode::from(70),
    }
}

/// `--disassemble <path>`: compiles `path` without executing it and prints
/// its bytecode listing. A debugging aid only reachable from this flag
/// (spec §6.1).
fn disassemble_file(path: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{}", err);
            return ExitCode::from(74);
        }
    };

    let mut vm = Vm::new();
    match compiler::compile(&source, vm.heap_mut()) {
        Some(chunk) => {
            debug::disassemble_chunk(&chunk, vm.heap(), path);
            ExitCode::SUCCESS
        }
        None => ExitCode::from(65),
    }
}

fn read_source(path: &str) -> Result<String, WispError> {
    fs::read_to_string(path).map_err(WispError::from)
}
