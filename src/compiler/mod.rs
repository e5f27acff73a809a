mod precedence;

use crate::chunk::{Chunk, OpCode};
use crate::errors::report_compile_error;
use crate::heap::Heap;
use crate::lexer::tokens::{Token, TokenKind};
use crate::lexer::Lexer;
use crate::value::Value;

use precedence::{get_rule, Precedence};

/// A prefix or infix parsing rule, dispatched from the Pratt table in
/// [`precedence::get_rule`]. `can_assign` is threaded through so that only
/// a bare identifier parsed at `PREC_ASSIGNMENT` or looser may consume a
/// trailing `=` (spec §4.2).
pub type ParseFn = for<'src, 'heap> fn(&mut Compiler<'src, 'heap>, bool);

/// Drives the [`Lexer`] with one token of lookahead, climbs operator
/// precedence via the Pratt table, and emits directly into a [`Chunk`] —
/// there is no intermediate AST (spec §4.2).
pub struct Compiler<'src, 'heap> {
    lexer: Lexer<'src>,
    previous: Token<'src>,
    current: Token<'src>,
    had_error: bool,
    panic_mode: bool,
    chunk: Chunk,
    heap: &'heap mut Heap,
}

/// Compiles `source` into a fresh [`Chunk`], interning any string literals
/// into `heap` along the way. Returns `None` if any compile error was
/// reported (spec §4.2's `compile(source, &mut chunk) -> bool`, adapted to
/// return the chunk by value instead of mutating an out-parameter).
pub fn compile(source: &str, heap: &mut Heap) -> Option<Chunk> {
    let mut compiler = Compiler {
        lexer: Lexer::new(source),
        previous: Token::uninitialized(),
        current: Token::uninitialized(),
        had_error: false,
        panic_mode: false,
        chunk: Chunk::new(),
        heap,
    };

    compiler.advance();
    while !compiler.check(TokenKind::EOF) {
        compiler.declaration();
    }

    compiler.emit_op(OpCode::Return);

    if compiler.had_error {
        None
    } else {
        Some(compiler.chunk)
    }
}

impl<'src, 'heap> Compiler<'src, 'heap> {
    // ---- Parser plumbing -------------------------------------------------

    fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.lexer.scan_token();
            if self.current.kind != TokenKind::ERROR {
                break;
            }
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Conditional advance: consumes `kind` and returns `true` if the
    /// current token matches, otherwise leaves the token stream untouched.
    fn try_consume(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.check(kind) {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    fn error_at_current(&mut self, message: &str) {
        let token = self.current;
        self.error_at(token, message);
    }

    fn error(&mut self, message: &str) {
        let token = self.previous;
        self.error_at(token, message);
    }

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        report_compile_error(&token, message);
        self.had_error = true;
    }

    /// Resynchronizes after a compile error at the next statement boundary:
    /// either the `;` that just ended a statement, or a token that can
    /// start a new one (spec §4.2).
    fn synchronize(&mut self) {
        self.panic_mode = false;

        while self.current.kind != TokenKind::EOF {
            if self.previous.kind == TokenKind::SEMICOLON {
                return;
            }

            match self.current.kind {
                TokenKind::CLASS_KW
                | TokenKind::FUN_KW
                | TokenKind::VAR_KW
                | TokenKind::FOR_KW
                | TokenKind::IF_KW
                | TokenKind::WHILE_KW
                | TokenKind::PRINT_KW
                | TokenKind::RETURN_KW => return,
                _ => {}
            }

            self.advance();
        }
    }

    // ---- Emission ----------------------------------------------------

    fn emit_byte(&mut self, byte: u8) {
        self.chunk.write_byte(byte, self.previous.line);
    }

    fn emit_op(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.previous.line);
    }

    fn emit_op_byte(&mut self, op: OpCode, operand: u8) {
        self.emit_op(op);
        self.emit_byte(operand);
    }

    fn make_constant(&mut self, value: Value) -> u8 {
        match self.chunk.add_constant(value) {
            Some(idx) => idx,
            None => {
                self.error("Too many constants in one chunk.");
                0
            }
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let idx = self.make_constant(value);
        self.emit_op_byte(OpCode::Constant, idx);
    }

    /// Emits `op` followed by a two-byte placeholder offset, returning the
    /// offset of the placeholder's first byte so [`Compiler::patch_jump`]
    /// can later overwrite it once the branch length is known.
    fn emit_jump(&mut self, op: OpCode) -> usize {
        self.emit_op(op);
        self.emit_byte(0xff);
        self.emit_byte(0xff);
        self.chunk.len() - 2
    }

    /// Backpatches the jump emitted at `offset` to land just past the
    /// current instruction pointer (spec §4.5/§10's ternary redesign).
    fn patch_jump(&mut self, offset: usize) {
        let jump = self.chunk.len() - offset - 2;
        if jump > u16::MAX as usize {
            self.error("Too much code to jump over.");
            return;
        }
        let bytes = (jump as u16).to_be_bytes();
        self.chunk.patch_byte(offset, bytes[0]);
        self.chunk.patch_byte(offset + 1, bytes[1]);
    }

    // ---- Declarations & statements ------------------------------------

    fn declaration(&mut self) {
        if self.try_consume(TokenKind::VAR_KW) {
            self.var_declaration();
        } else {
            self.statement();
        }

        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        self.consume(TokenKind::IDENTIFIER, "Expect variable name.");
        let name = self.previous;
        let name_constant = self.identifier_constant(name);

        if self.try_consume(TokenKind::EQUALS) {
            self.expression();
        } else {
            self.emit_op(OpCode::Nil);
        }

        self.consume(TokenKind::SEMICOLON, "Expect ';' after variable declaration.");
        self.emit_op_byte(OpCode::DefineGlobal, name_constant);
    }

    fn statement(&mut self) {
        match self.current.kind {
            TokenKind::PRINT_KW => {
                self.advance();
                self.print_statement();
            }
            TokenKind::BREAK_KW | TokenKind::CYCLE_KW => {
                self.advance();
                self.error("Loop control statements require an enclosing loop.");
            }
            _ => self.expression_statement(),
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::SEMICOLON, "Expect ';' after value.");
        self.emit_op(OpCode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::SEMICOLON, "Expect ';' after expression.");
        self.emit_op(OpCode::Pop);
    }

    // ---- Expressions (Pratt parser) ------------------------------------

    fn expression(&mut self) {
        self.parse_precedence(Precedence::PREC_ASSIGNMENT);
    }

    fn parse_precedence(&mut self, min: Precedence) {
        self.advance();

        let prefix_rule = get_rule(self.previous.kind).prefix;
        let prefix_rule = match prefix_rule {
            Some(rule) => rule,
            None => {
                self.error("Expect expression.");
                return;
            }
        };

        let can_assign = min <= Precedence::PREC_ASSIGNMENT;
        prefix_rule(self, can_assign);

        while min <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix_rule = get_rule(self.previous.kind).infix.expect("token with precedence must have infix rule");
            infix_rule(self, can_assign);
        }

        if can_assign && self.try_consume(TokenKind::EQUALS) {
            self.error("Invalid assignment target.");
        }
    }

    fn identifier_constant(&mut self, name: Token<'src>) -> u8 {
        let bytes = name.lexeme.as_bytes();
        let obj = self.heap.intern(bytes);
        self.make_constant(Value::Object(obj))
    }

    // ---- Prefix rules ---------------------------------------------------

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::R_PAREN, "Expect ')' after expression.");
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::PREC_UNARY);

        match operator {
            TokenKind::MINUS => self.emit_op(OpCode::Negate),
            TokenKind::NOT_KW => self.emit_op(OpCode::Not),
            _ => unreachable!("unary() only dispatched for '-' and 'not'"),
        }
    }

    fn number(&mut self, _can_assign: bool) {
        let value: f64 = self.previous.lexeme.parse().expect("lexer only produces well-formed number lexemes");
        self.emit_constant(Value::Number(value));
    }

    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let inner = &lexeme[1..lexeme.len() - 1];
        let obj = self.heap.intern(inner.as_bytes());
        self.emit_constant(Value::Object(obj));
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::FALSE_KW => self.emit_op(OpCode::False),
            TokenKind::TRUE_KW => self.emit_op(OpCode::True),
            TokenKind::NIL_KW => self.emit_op(OpCode::Nil),
            _ => unreachable!("literal() only dispatched for 'false'/'true'/'nil'"),
        }
    }

    fn variable(&mut self, can_assign: bool) {
        let name = self.previous;
        let name_constant = self.identifier_constant(name);

        if can_assign && self.try_consume(TokenKind::EQUALS) {
            self.expression();
            self.emit_op_byte(OpCode::SetGlobal, name_constant);
        } else {
            self.emit_op_byte(OpCode::GetGlobal, name_constant);
        }
    }

    // ---- Infix rules ----------------------------------------------------

    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        let rule = get_rule(operator);
        self.parse_precedence(rule.precedence.one_higher());

        match operator {
            TokenKind::PLUS => self.emit_op(OpCode::Add),
            TokenKind::MINUS => self.emit_op(OpCode::Subtract),
            TokenKind::STAR => self.emit_op(OpCode::Multiply),
            TokenKind::SLASH => self.emit_op(OpCode::Divide),
            TokenKind::EQUALS_EQUALS => self.emit_op(OpCode::Equal),
            TokenKind::BANG_EQUALS => {
                self.emit_op(OpCode::Equal);
                self.emit_op(OpCode::Not);
            }
            TokenKind::GREATER => self.emit_op(OpCode::Greater),
            // `a >= b` desugars to `!(a < b)`. This has the same
            // NaN-under-negation quirk as `<=` below and is preserved
            // unchanged per spec §4.2/§9.
            TokenKind::GREATER_EQUALS => {
                self.emit_op(OpCode::Less);
                self.emit_op(OpCode::Not);
            }
            TokenKind::LESS => self.emit_op(OpCode::Less),
            // `a <= b` desugars to `!(a > b)`. When either operand is NaN,
            // `a > b` is false, so `!(a > b)` is true — `<=` reports NaN
            // operands as ordered. This asymmetry is required by spec
            // §4.2/§9 and intentionally not "fixed".
            TokenKind::LESS_EQUALS => {
                self.emit_op(OpCode::Greater);
                self.emit_op(OpCode::Not);
            }
            _ => unreachable!("binary() only dispatched for arithmetic/comparison operators"),
        }
    }

    /// `cond ? then : else`, right-associative. Unlike the distilled
    /// spec's original (buggy) behavior of compiling both arms
    /// unconditionally, this emits a real branch so only the selected arm
    /// runs (spec §4.2/§9/§10).
    fn ternary(&mut self, _can_assign: bool) {
        let then_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::PREC_TERNARY.one_higher());
        self.consume(TokenKind::COLON, "Expect ':' after ternary 'then' branch.");

        let else_jump = self.emit_jump(OpCode::Jump);
        self.patch_jump(then_jump);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::PREC_TERNARY);
        self.patch_jump(else_jump);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiles(source: &str) -> bool {
        let mut heap = Heap::new();
        compile(source, &mut heap).is_some()
    }

    #[test]
    fn empty_source_compiles_to_a_bare_return() {
        let mut heap = Heap::new();
        let chunk = compile("", &mut heap).unwrap();
        assert_eq!(chunk.len(), 1);
        assert_eq!(chunk.read_op(0), Some(OpCode::Return));
    }

    #[test]
    fn reassignment_to_a_declared_global_compiles() {
        assert!(compiles("var a = 0; a = 1;"));
    }

    #[test]
    fn assigning_to_a_literal_is_rejected() {
        assert!(!compiles("2 = 3;"));
    }

    #[test]
    fn ternary_without_a_colon_is_rejected() {
        assert!(!compiles("true ? 1;"));
    }

    #[test]
    fn chained_ternary_expressions_compile() {
        assert!(compiles("true ? 1 : false ? 2 : 3;"));
    }

    #[test]
    fn string_literal_compiles_to_an_interned_constant() {
        let mut heap = Heap::new();
        let chunk = compile(r#""hello";"#, &mut heap).unwrap();
        match chunk.constant(0) {
            Value::Object(r) => assert_eq!(heap.get(r).as_str(), "hello"),
            other => panic!("expected an interned string constant, got {:?}", other),
        }
    }

    #[test]
    fn unexpected_token_reports_a_compile_error_instead_of_panicking() {
        assert!(!compiles("+;"));
    }
}
