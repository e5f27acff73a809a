pub mod chunk;
pub mod compiler;
pub mod debug;
pub mod errors;
pub mod heap;
pub mod lexer;
pub mod table;
pub mod value;
pub mod vm;

use errors::InterpretResult;
use vm::Vm;

/// Compiles and runs one chunk of source against `vm`, the single entry
/// point shared by the file runner and the REPL (spec §6.1). Compile errors
/// are reported to stderr and short-circuit before the VM ever runs.
pub fn run_source(vm: &mut Vm, source: &str) -> InterpretResult {
    let chunk = match compiler::compile(source, vm.heap_mut()) {
        Some(chunk) => chunk,
        None => return InterpretResult::CompileError,
    };

    vm.run(&chunk)
}
