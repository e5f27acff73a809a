use crate::chunk::{Chunk, OpCode};
use crate::errors::{report_runtime_error, InterpretResult};
use crate::heap::Heap;
use crate::table::Table;
use crate::value::Value;

/// The maximum depth of the value stack. Matches the fixed-size stack in
/// spec §5 rather than an unbounded `Vec`, so a runaway expression reports a
/// clean runtime error instead of exhausting memory.
const STACK_MAX: usize = 256;

/// The stack-based bytecode interpreter (spec §5). Owns the heap and the
/// global variable table for its whole lifetime, so a REPL session can run
/// many chunks back to back while strings interned on line one are still
/// valid on line ten.
pub struct Vm {
    stack: Vec<Value>,
    globals: Table,
    heap: Heap,
}

impl Vm {
    pub fn new() -> Self {
        Self { stack: Vec::with_capacity(STACK_MAX), globals: Table::new(), heap: Heap::new() }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    fn reset_stack(&mut self) {
        self.stack.clear();
    }

    fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    fn pop(&mut self) -> Value {
        self.stack.pop().expect("compiler never emits a pop against an empty stack")
    }

    fn peek(&self, distance: usize) -> Value {
        self.stack[self.stack.len() - 1 - distance]
    }

    /// Runs `chunk` to completion, fetch-decode-execute (spec §5).
    pub fn run(&mut self, chunk: &Chunk) -> InterpretResult {
        let mut ip: usize = 0;

        macro_rules! runtime_error {
            ($($arg:tt)*) => {{
                let message = format!($($arg)*);
                let line = chunk.line_at(ip.saturating_sub(1));
                report_runtime_error(&message, line);
                self.reset_stack();
                return InterpretResult::RuntimeError;
            }};
        }

        macro_rules! binary_numeric {
            ($op:tt, $wrap:expr) => {{
                let b = self.peek(0);
                let a = self.peek(1);
                match (a, b) {
                    (Value::Number(a), Value::Number(b)) => {
                        self.pop();
                        self.pop();
                        self.push($wrap(a $op b));
                    }
                    _ => runtime_error!("Operands must be numbers."),
                }
            }};
        }

        loop {
            let byte = chunk.read_byte(ip);
            let op = match OpCode::from_byte(byte) {
                Some(op) => op,
                None => runtime_error!("Unknown opcode {}.", byte),
            };
            ip += 1;

            match op {
                OpCode::Constant => {
                    let idx = chunk.read_byte(ip);
                    ip += 1;
                    self.push(chunk.constant(idx));
                }
                OpCode::Nil => self.push(Value::Nil),
                OpCode::True => self.push(Value::Bool(true)),
                OpCode::False => self.push(Value::Bool(false)),
                OpCode::Pop => {
                    self.pop();
                }
                OpCode::GetGlobal => {
                    let idx = chunk.read_byte(ip);
                    ip += 1;
                    let name = chunk.constant(idx);
                    let name_ref = match name {
                        Value::Object(r) => r,
                        _ => unreachable!("global names are always interned strings"),
                    };
                    let hash = self.heap.get(name_ref).hash;
                    match self.globals.get(name_ref, hash) {
                        Some(value) => self.push(value),
                        None => {
                            let lexeme = self.heap.get(name_ref).as_str().to_string();
                            runtime_error!("Undefined variable '{}'.", lexeme);
                        }
                    }
                }
                OpCode::DefineGlobal => {
                    let idx = chunk.read_byte(ip);
                    ip += 1;
                    let name = chunk.constant(idx);
                    let name_ref = match name {
                        Value::Object(r) => r,
                        _ => unreachable!("global names are always interned strings"),
                    };
                    let hash = self.heap.get(name_ref).hash;
                    let value = self.pop();
                    self.globals.set(name_ref, hash, value);
                }
                OpCode::SetGlobal => {
                    let idx = chunk.read_byte(ip);
                    ip += 1;
                    let name = chunk.constant(idx);
                    let name_ref = match name {
                        Value::Object(r) => r,
                        _ => unreachable!("global names are always interned strings"),
                    };
                    let hash = self.heap.get(name_ref).hash;
                    let value = self.peek(0);
                    if !self.globals.contains(name_ref, hash) {
                        let lexeme = self.heap.get(name_ref).as_str().to_string();
                        runtime_error!("Undefined variable '{}'.", lexeme);
                    }
                    self.globals.set(name_ref, hash, value);
                }
                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b));
                }
                OpCode::Greater => binary_numeric!(>, Value::Bool),
                OpCode::Less => binary_numeric!(<, Value::Bool),
                OpCode::Add => {
                    let b = self.peek(0);
                    let a = self.peek(1);
                    match (a, b) {
                        (Value::Number(a), Value::Number(b)) => {
                            self.pop();
                            self.pop();
                            self.push(Value::Number(a + b));
                        }
                        (Value::Object(a), Value::Object(b)) => {
                            let mut bytes = self.heap.get(a).bytes.to_vec();
                            bytes.extend_from_slice(&self.heap.get(b).bytes);
                            let result = self.heap.intern(&bytes);
                            self.pop();
                            self.pop();
                            self.push(Value::Object(result));
                        }
                        _ => runtime_error!("Operands must be two numbers or two strings."),
                    }
                }
                OpCode::Subtract => binary_numeric!(-, Value::Number),
                OpCode::Multiply => binary_numeric!(*, Value::Number),
                OpCode::Divide => binary_numeric!(/, Value::Number),
                OpCode::Not => {
                    let value = self.peek(0);
                    match value {
                        Value::Bool(b) => {
                            self.pop();
                            self.push(Value::Bool(!b));
                        }
                        _ => runtime_error!("operand must be a boolean."),
                    }
                }
                OpCode::Negate => {
                    let value = self.peek(0);
                    match value {
                        Value::Number(n) => {
                            self.pop();
                            self.push(Value::Number(-n));
                        }
                        _ => runtime_error!("operand must be a number."),
                    }
                }
                OpCode::Print => {
                    let value = self.pop();
                    println!("{}", self.stringify(value));
                }
                OpCode::Jump => {
                    let offset = self.read_u16(chunk, &mut ip);
                    ip += offset as usize;
                }
                OpCode::JumpIfFalse => {
                    let offset = self.read_u16(chunk, &mut ip);
                    if self.peek(0).is_falsey() {
                        ip += offset as usize;
                    }
                }
                OpCode::Return => {
                    return InterpretResult::Ok;
                }
            }
        }
    }

    fn read_u16(&self, chunk: &Chunk, ip: &mut usize) -> u16 {
        let hi = chunk.read_byte(*ip);
        let lo = chunk.read_byte(*ip + 1);
        *ip += 2;
        u16::from_be_bytes([hi, lo])
    }

    /// Renders a value for `print` (spec §5).
    fn stringify(&self, value: Value) -> String {
        match value {
            Value::Bool(b) => b.to_string(),
            Value::Nil => "nil".to_string(),
            Value::Number(n) => format_number(n),
            Value::Object(r) => self.heap.get(r).as_str().to_string(),
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a number the way Wisp prints it: integral values print without a
/// trailing `.0`, matching clox's `%g`-style float formatting (spec §5).
fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler;

    fn run_str(vm: &mut Vm, source: &str) -> InterpretResult {
        let chunk = compiler::compile(source, vm.heap_mut()).expect("source should compile");
        vm.run(&chunk)
    }

    #[test]
    fn integral_numbers_print_without_a_decimal_point() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
    }

    #[test]
    fn fractional_numbers_keep_their_decimal_point() {
        assert_eq!(format_number(1.5), "1.5");
    }

    #[test]
    fn stack_is_empty_after_a_top_level_return() {
        let mut vm = Vm::new();
        assert_eq!(run_str(&mut vm, "1 + 2;"), InterpretResult::Ok);
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn a_runtime_error_resets_the_stack() {
        let mut vm = Vm::new();
        assert_eq!(run_str(&mut vm, "1 + true;"), InterpretResult::RuntimeError);
        assert!(vm.stack.is_empty());
    }

    #[test]
    fn string_concatenation_interns_its_result() {
        let mut vm = Vm::new();
        assert_eq!(run_str(&mut vm, r#""foo" + "bar";"#), InterpretResult::Ok);
        let before = vm.heap().object_count();
        assert_eq!(run_str(&mut vm, r#""foobar";"#), InterpretResult::Ok);
        // The literal "foobar" should resolve to the handle concatenation
        // already produced, not allocate a new one.
        assert_eq!(vm.heap().object_count(), before);
    }
}
