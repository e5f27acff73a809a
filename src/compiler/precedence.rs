use crate::compiler::{Compiler, ParseFn};
use crate::lexer::tokens::TokenKind;

/// Precedence of an expression, lowest to highest (spec §4.2's ladder).
/// Declared in ascending order so that `PREC_X as u8 + 1` climbs exactly one
/// level, which is what `parse_precedence` relies on when it recurses at
/// `current_precedence + 1` for left-associative infix operators.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[repr(u8)]
pub enum Precedence {
    PREC_NONE,
    PREC_ASSIGNMENT,
    PREC_TERNARY,
    PREC_OR,
    PREC_AND,
    PREC_EQUALITY,
    PREC_COMPARISON,
    PREC_TERM,
    PREC_FACTOR,
    PREC_UNARY,
    PREC_POSTFIX,
    PREC_CALL,
    PREC_PRIMARY,
}

impl Precedence {
    pub fn one_higher(self) -> Precedence {
        use Precedence::*;
        match self {
            PREC_NONE => PREC_ASSIGNMENT,
            PREC_ASSIGNMENT => PREC_TERNARY,
            PREC_TERNARY => PREC_OR,
            PREC_OR => PREC_AND,
            PREC_AND => PREC_EQUALITY,
            PREC_EQUALITY => PREC_COMPARISON,
            PREC_COMPARISON => PREC_TERM,
            PREC_TERM => PREC_FACTOR,
            PREC_FACTOR => PREC_UNARY,
            PREC_UNARY => PREC_POSTFIX,
            PREC_POSTFIX => PREC_CALL,
            PREC_CALL => PREC_PRIMARY,
            PREC_PRIMARY => PREC_PRIMARY,
        }
    }
}

/// Wraps the parsing properties of a token kind, the same shape as the
/// teacher's `ParserRule`, but with plain function pointers standing in for
/// the teacher's `ParseFn` tag enum — Rust function pointers make that
/// extra indirection unnecessary.
pub struct ParseRule {
    pub prefix: Option<ParseFn>,
    pub infix: Option<ParseFn>,
    pub precedence: Precedence,
}

const fn rule(prefix: Option<ParseFn>, infix: Option<ParseFn>, precedence: Precedence) -> ParseRule {
    ParseRule { prefix, infix, precedence }
}

/// Wraps a `Compiler` method in a closure so it coerces to the higher-ranked
/// `ParseFn` pointer type. Passing a method item directly (e.g.
/// `Compiler::grouping`) fails to coerce because its `'src`/`'heap`
/// lifetimes are early-bound from the `impl` block, not late-bound on the
/// method itself; a freshly written closure with elided lifetimes has no
/// such restriction.
macro_rules! pf {
    ($method:ident) => {
        |c: &mut Compiler<'_, '_>, b: bool| Compiler::$method(c, b)
    };
}

/// The Pratt table: a (prefix, infix, precedence) triple per token kind
/// (spec §4.2). Anything not listed falls through to the `_` arm — no
/// prefix rule, no infix rule, lowest precedence — which is what stops
/// `parse_precedence`'s climbing loop.
pub fn get_rule(kind: TokenKind) -> ParseRule {
    use Precedence::*;
    use TokenKind::*;

    match kind {
        L_PAREN => rule(Some(pf!(grouping)), None, PREC_NONE),
        MINUS => rule(Some(pf!(unary)), Some(pf!(binary)), PREC_TERM),
        PLUS => rule(None, Some(pf!(binary)), PREC_TERM),
        SLASH => rule(None, Some(pf!(binary)), PREC_FACTOR),
        STAR => rule(None, Some(pf!(binary)), PREC_FACTOR),
        NOT_KW => rule(Some(pf!(unary)), None, PREC_NONE),
        BANG_EQUALS => rule(None, Some(pf!(binary)), PREC_EQUALITY),
        EQUALS_EQUALS => rule(None, Some(pf!(binary)), PREC_EQUALITY),
        GREATER => rule(None, Some(pf!(binary)), PREC_COMPARISON),
        GREATER_EQUALS => rule(None, Some(pf!(binary)), PREC_COMPARISON),
        LESS => rule(None, Some(pf!(binary)), PREC_COMPARISON),
        LESS_EQUALS => rule(None, Some(pf!(binary)), PREC_COMPARISON),
        IDENTIFIER => rule(Some(pf!(variable)), None, PREC_NONE),
        STRING => rule(Some(pf!(string)), None, PREC_NONE),
        NUMBER => rule(Some(pf!(number)), None, PREC_NONE),
        FALSE_KW => rule(Some(pf!(literal)), None, PREC_NONE),
        TRUE_KW => rule(Some(pf!(literal)), None, PREC_NONE),
        NIL_KW => rule(Some(pf!(literal)), None, PREC_NONE),
        QUESTION => rule(None, Some(pf!(ternary)), PREC_TERNARY),
        _ => rule(None, None, PREC_NONE),
    }
}
