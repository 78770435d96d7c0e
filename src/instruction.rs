//! The in-memory instruction representation the executor runs
//! against. Grounded on the teacher's `src/instructions.rs` (a plain
//! struct pairing an opcode with its decoded operands) — the operand
//! shapes themselves are new, since IPPcode22's XML `arg` elements
//! carry a much richer payload than the teacher's fixed-width
//! register/immediate fields.

use crate::opcode::{FrameId, Opcode, TypeTag};

/// A literal value as it appears in source, before any frame lookup.
/// Distinct from [`crate::value::Value`]: a literal is never
/// `Uninit`, and a `Str` literal has not yet had its `\ddd` escapes
/// decoded (spec §4.1 decodes lazily, at the point of use).
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Str(String),
    Bool(bool),
    Nil,
}

/// One decoded `arg` element. Which variant is legal in which
/// position is governed by [`crate::opcode::arg_roles`]; the loader
/// rejects a shape mismatch before the executor ever sees it, so the
/// executor's dispatch can assume the role it expects is the role it
/// gets.
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// A `var`-typed operand: a frame plus a variable name.
    Var(FrameId, String),
    /// A `symb`-typed operand that is a literal rather than a `var`.
    Const(Literal),
    /// A `label`-typed operand.
    Label(String),
    /// The `type`-typed operand of `READ`.
    Type(TypeTag),
}

impl Arg {
    pub fn as_var(&self) -> Option<(FrameId, &str)> {
        match self {
            Arg::Var(frame, name) => Some((*frame, name.as_str())),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            Arg::Label(name) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<TypeTag> {
        match self {
            Arg::Type(tag) => Some(*tag),
            _ => None,
        }
    }
}

/// One instruction: its source `order` (kept for diagnostics; the
/// instruction's position in the program's instruction vector is what
/// actually drives control flow), its opcode, and its decoded
/// arguments in position order (`arg1`, `arg2`, `arg3`).
#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub order: i64,
    pub opcode: Opcode,
    pub args: Vec<Arg>,
}

impl Instruction {
    pub fn new(order: i64, opcode: Opcode, args: Vec<Arg>) -> Instruction {
        Instruction {
            order,
            opcode,
            args,
        }
    }
}
