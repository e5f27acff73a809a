use crate::chunk::{Chunk, OpCode};
use crate::heap::Heap;
use crate::value::Value;

/// Disassembles every instruction in `chunk`, labeled `name`, to stdout.
/// Only reachable from the CLI's `--disassemble` flag (spec §6.1) — this is
/// a debugging aid, never part of normal execution.
pub fn disassemble_chunk(chunk: &Chunk, heap: &Heap, name: &str) {
    println!("== {} ==", name);

    let mut offset = 0;
    while offset < chunk.len() {
        offset = disassemble_instruction(chunk, heap, offset);
    }
}

/// Prints one instruction at `offset` and returns the offset of the next
/// one.
pub fn disassemble_instruction(chunk: &Chunk, heap: &Heap, offset: usize) -> usize {
    print!("{:04} ", offset);

    let line = chunk.line_at(offset);
    match (offset.checked_sub(1).and_then(|prev| chunk.line_at(prev)), line) {
        (Some(prev), Some(cur)) if prev == cur => print!("   | "),
        _ => print!("{:4} ", line.unwrap_or(0)),
    }

    let byte = chunk.read_byte(offset);
    match OpCode::from_byte(byte) {
        Some(OpCode::Constant) => constant_instruction("OP_CONSTANT", chunk, heap, offset),
        Some(OpCode::Nil) => simple_instruction("OP_NIL", offset),
        Some(OpCode::True) => simple_instruction("OP_TRUE", offset),
        Some(OpCode::False) => simple_instruction("OP_FALSE", offset),
        Some(OpCode::Pop) => simple_instruction("OP_POP", offset),
        Some(OpCode::GetGlobal) => constant_instruction("OP_GET_GLOBAL", chunk, heap, offset),
        Some(OpCode::DefineGlobal) => constant_instruction("OP_DEFINE_GLOBAL", chunk, heap, offset),
        Some(OpCode::SetGlobal) => constant_instruction("OP_SET_GLOBAL", chunk, heap, offset),
        Some(OpCode::Equal) => simple_instruction("OP_EQUAL", offset),
        Some(OpCode::Greater) => simple_instruction("OP_GREATER", offset),
        Some(OpCode::Less) => simple_instruction("OP_LESS", offset),
        Some(OpCode::Add) => simple_instruction("OP_ADD", offset),
        Some(OpCode::Subtract) => simple_instruction("OP_SUBTRACT", offset),
        Some(OpCode::Multiply) => simple_instruction("OP_MULTIPLY", offset),
        Some(OpCode::Divide) => simple_instruction("OP_DIVIDE", offset),
        Some(OpCode::Not) => simple_instruction("OP_NOT", offset),
        Some(OpCode::Negate) => simple_instruction("OP_NEGATE", offset),
        Some(OpCode::Print) => simple_instruction("OP_PRINT", offset),
        Some(OpCode::Jump) => jump_instruction("OP_JUMP", 1, chunk, offset),
        Some(OpCode::JumpIfFalse) => jump_instruction("OP_JUMP_IF_FALSE", 1, chunk, offset),
        Some(OpCode::Return) => simple_instruction("OP_RETURN", offset),
        None => {
            println!("Unknown opcode {}", byte);
            offset + 1
        }
    }
}

fn simple_instruction(name: &str, offset: usize) -> usize {
    println!("{}", name);
    offset + 1
}

fn constant_instruction(name: &str, chunk: &Chunk, heap: &Heap, offset: usize) -> usize {
    let idx = chunk.read_byte(offset + 1);
    println!("{:<16} {:4} '{}'", name, idx, format_value(chunk.constant(idx), heap));
    offset + 2
}

fn jump_instruction(name: &str, sign: i32, chunk: &Chunk, offset: usize) -> usize {
    let hi = chunk.read_byte(offset + 1) as u16;
    let lo = chunk.read_byte(offset + 2) as u16;
    let jump = (hi << 8) | lo;
    let target = offset as i64 + 3 + sign as i64 * jump as i64;
    println!("{:<16} {:4} -> {}", name, offset, target);
    offset + 3
}

fn format_value(value: Value, heap: &Heap) -> String {
    match value {
        Value::Bool(b) => b.to_string(),
        Value::Nil => "nil".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(r) => heap.get(r).as_str().to_string(),
    }
}
