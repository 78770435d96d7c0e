//! The instruction set (spec §6) as data. Grounded on the teacher's
//! `Opcode`/`AluFunct` enums (`src/instructions.rs`): a plain
//! `#[derive(...)]` enum plus a small static table, rather than a
//! `match` arm per opcode scattered across the codebase. Unlike the
//! teacher, variant-name ⇄ string conversion matters here (opcodes
//! arrive as XML text, not as bit-packed fields), so every closed
//! string-keyed set in this module derives `EnumFromStr`
//! (`ippcode22-util`/`ippcode22-util-derive`, trimmed from the
//! teacher's `util`/`util-derive`).

use ippcode22_util::EnumFromStr;
use ippcode22_util_derive::EnumFromStr;
use std::fmt;

/// The three named frame slots (spec §3).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
pub enum FrameId {
    GF,
    LF,
    TF,
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The payload of a `type`-tagged argument (`READ`'s second
/// argument): the type a read value should be parsed as.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumFromStr)]
pub enum TypeTag {
    #[allow(non_camel_case_types)]
    int,
    #[allow(non_camel_case_types)]
    string,
    #[allow(non_camel_case_types)]
    bool,
    #[allow(non_camel_case_types)]
    nil,
}

/// Every opcode IPPcode22 supports (spec §6 table). Variant names are
/// the upper-case mnemonics verbatim, so `EnumFromStr` parses an XML
/// `opcode` attribute directly into this enum (the loader upper-cases
/// the attribute first, per spec §4.1).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, EnumFromStr)]
pub enum Opcode {
    // 0 arguments.
    CREATEFRAME,
    PUSHFRAME,
    POPFRAME,
    RETURN,
    BREAK,
    // 1 argument.
    DEFVAR,
    POPS,
    LABEL,
    CALL,
    JUMP,
    PUSHS,
    WRITE,
    EXIT,
    DPRINT,
    // 2 arguments.
    MOVE,
    INT2CHAR,
    STRLEN,
    TYPE,
    NOT,
    READ,
    // 3 arguments.
    ADD,
    SUB,
    MUL,
    IDIV,
    LT,
    GT,
    EQ,
    AND,
    OR,
    CONCAT,
    GETCHAR,
    SETCHAR,
    STRI2INT,
    JUMPIFEQ,
    JUMPIFNEQ,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The role an argument in a given position must play, independent of
/// its concrete type tag. `Symb` covers both literals and `var`
/// references (spec §4.1's "read operands are `symb`"); `Var` demands
/// a write target; `Label` demands a jump target; `Type` is the one
/// case (`READ`'s 2nd argument) where the payload names a type rather
/// than holding or referencing a value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgRole {
    Var,
    Symb,
    Label,
    Type,
}

/// Looks up the argument-role signature for an opcode: its length is
/// the required arity, and each element is the required role for that
/// position. Used by the loader (§4.1's per-opcode semantic check) and
/// by anything else that needs to know an opcode's shape without
/// re-deriving it from the executor's dispatch `match`.
pub fn arg_roles(opcode: Opcode) -> &'static [ArgRole] {
    use ArgRole::*;
    use Opcode::*;
    match opcode {
        CREATEFRAME | PUSHFRAME | POPFRAME | RETURN | BREAK => &[],
        DEFVAR | POPS => &[Var],
        LABEL | CALL | JUMP => &[Label],
        PUSHS | WRITE | EXIT | DPRINT => &[Symb],
        MOVE | INT2CHAR | STRLEN | TYPE | NOT => &[Var, Symb],
        READ => &[Var, Type],
        ADD | SUB | MUL | IDIV | LT | GT | EQ | AND | OR | CONCAT | GETCHAR | SETCHAR
        | STRI2INT => &[Var, Symb, Symb],
        JUMPIFEQ | JUMPIFNEQ => &[Label, Symb, Symb],
    }
}
