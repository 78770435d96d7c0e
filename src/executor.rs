//! The fetch/execute loop (spec §4.4). Grounded on the teacher's
//! `src/processor.rs::Processor::run` driving `src/processor/logic.rs`
//! opcode handlers that each return a `TickResult`: this module keeps
//! that same shape — a small driving loop plus one dispatch function
//! returning a control-flow outcome — generalised from the teacher's
//! fixed-width register ALU to IPPcode22's frame/stack/type model.

use log::{debug, trace};

use crate::error::{self, Result};
use crate::frame::Frames;
use crate::instruction::{Arg, Instruction, Literal};
use crate::io::InputSource;
use crate::label::{self, LabelTable};
use crate::opcode::{FrameId, Opcode, TypeTag};
use crate::value::{decode_escapes, Value};

/// What a single dispatched instruction does to control flow. The
/// teacher's `TickResult` distinguishes "fall through" from "branch"
/// from "halt"; IPPcode22 needs the same three outcomes; `Jump`
/// carries a resolved program index rather than a relative offset
/// since labels are pre-resolved into dense indices at label-table
/// build time.
enum Step {
    Continue,
    Jump(usize),
    Halt(i32),
}

/// Owns every piece of state the fetch/execute loop touches: the
/// program, the label table, the frame set, the two auxiliary stacks,
/// the `READ` source, and the instruction pointer. Encapsulated in one
/// object (rather than the module-level globals the source program
/// relies on) so independent interpreters can run side by side, e.g.
/// in tests.
pub struct Interpreter {
    program: Vec<Instruction>,
    labels: LabelTable,
    frames: Frames,
    call_stack: Vec<usize>,
    data_stack: Vec<Value>,
    input: Box<dyn InputSource>,
    ip: usize,
    executed_count: u64,
}

impl Interpreter {
    pub fn new(program: Vec<Instruction>, input: Box<dyn InputSource>) -> Result<Interpreter> {
        let labels = label::build_label_table(&program)?;
        Ok(Interpreter {
            program,
            labels,
            frames: Frames::new(),
            call_stack: Vec::new(),
            data_stack: Vec::new(),
            input,
            ip: 0,
            executed_count: 0,
        })
    }

    /// Runs the whole program to completion. Returns the process exit
    /// code: `0` for falling off the end or an explicit `RETURN` at
    /// top level, or whatever `EXIT` requested.
    pub fn run(&mut self) -> Result<i32> {
        while self.ip < self.program.len() {
            let step = {
                let instr = &self.program[self.ip];
                trace!("ip={} order={} opcode={:?}", self.ip, instr.order, instr.opcode);
                self.dispatch(instr)?
            };
            match step {
                Step::Continue => self.ip += 1,
                Step::Jump(target) => self.ip = target,
                Step::Halt(code) => return Ok(code),
            }
            self.executed_count += 1;
        }
        Ok(0)
    }

    /// Reads a variable's current value without going through the
    /// program. Exists for embedders and tests that want to inspect
    /// final state; the fetch/execute loop itself never calls it.
    pub fn frame_value(&self, frame: FrameId, name: &str) -> Result<Value> {
        self.frames.get(frame, name).map(|v| v.clone())
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<Step> {
        use Opcode::*;
        match instr.opcode {
            CREATEFRAME => {
                self.frames.create_frame();
                Ok(Step::Continue)
            }
            PUSHFRAME => {
                self.frames.push_frame()?;
                Ok(Step::Continue)
            }
            POPFRAME => {
                self.frames.pop_frame()?;
                Ok(Step::Continue)
            }
            RETURN => {
                let target = self
                    .call_stack
                    .pop()
                    .ok_or_else(|| error::missing_value("RETURN with an empty call stack"))?;
                Ok(Step::Jump(target))
            }
            BREAK => {
                self.dump_state();
                Ok(Step::Continue)
            }
            DEFVAR => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                self.frames.define(frame, name)?;
                Ok(Step::Continue)
            }
            POPS => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let value = self
                    .data_stack
                    .pop()
                    .ok_or_else(|| error::missing_value("POPS with an empty data stack"))?;
                self.frames.set(frame, name, value)?;
                Ok(Step::Continue)
            }
            LABEL => Ok(Step::Continue),
            CALL => {
                let target = self.label_target(&instr.args[0])?;
                self.call_stack.push(self.ip + 1);
                Ok(Step::Jump(target))
            }
            JUMP => {
                let target = self.label_target(&instr.args[0])?;
                Ok(Step::Jump(target))
            }
            PUSHS => {
                let value = self.eval_initialised(&instr.args[0])?;
                self.data_stack.push(value);
                Ok(Step::Continue)
            }
            WRITE => {
                let text = self.render_output(&instr.args[0])?;
                print!("{text}");
                Ok(Step::Continue)
            }
            DPRINT => {
                let text = self.render_output(&instr.args[0])?;
                eprint!("{text}");
                Ok(Step::Continue)
            }
            EXIT => {
                let value = self.eval_initialised(&instr.args[0])?;
                let code = self.require_int(&value)?;
                if !(0..=49).contains(&code) {
                    return Err(error::operand_value(format!(
                        "EXIT code {code} is out of range [0,49]"
                    )));
                }
                Ok(Step::Halt(code as i32))
            }
            MOVE => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let value = self.eval_initialised(&instr.args[1])?;
                self.frames.set(frame, name, value)?;
                Ok(Step::Continue)
            }
            INT2CHAR => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let value = self.eval_initialised(&instr.args[1])?;
                let code = self.require_int(&value)?;
                let ch = char_from_code(code)?;
                self.frames.set(frame, name, Value::Str(ch.to_string()))?;
                Ok(Step::Continue)
            }
            STRLEN => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let value = self.eval_initialised(&instr.args[1])?;
                let text = self.require_str(&value)?;
                let len = decode_escapes(&text).chars().count() as i64;
                self.frames.set(frame, name, Value::Int(len))?;
                Ok(Step::Continue)
            }
            TYPE => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let value = self.eval(&instr.args[1])?;
                let tag = value.type_tag().unwrap_or("");
                self.frames.set(frame, name, Value::Str(tag.to_string()))?;
                Ok(Step::Continue)
            }
            NOT => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let value = self.eval_initialised(&instr.args[1])?;
                let b = self.require_bool(&value)?;
                self.frames.set(frame, name, Value::Bool(!b))?;
                Ok(Step::Continue)
            }
            READ => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let tag = instr.args[1]
                    .as_type()
                    .expect("loader guarantees READ's 2nd argument is a type tag");
                let value = self.read_value(tag)?;
                self.frames.set(frame, name, value)?;
                Ok(Step::Continue)
            }
            ADD | SUB | MUL | IDIV => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let a = self.require_int(&self.eval_initialised(&instr.args[1])?)?;
                let b = self.require_int(&self.eval_initialised(&instr.args[2])?)?;
                let result = match instr.opcode {
                    ADD => a.wrapping_add(b),
                    SUB => a.wrapping_sub(b),
                    MUL => a.wrapping_mul(b),
                    IDIV => {
                        if b == 0 {
                            return Err(error::operand_value("division by zero"));
                        }
                        a.wrapping_div(b)
                    }
                    _ => unreachable!(),
                };
                self.frames.set(frame, name, Value::Int(result))?;
                Ok(Step::Continue)
            }
            LT | GT => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let a = self.eval_initialised(&instr.args[1])?;
                let b = self.eval_initialised(&instr.args[2])?;
                let ordering = self.compare_no_nil(&a, &b)?;
                let result = if instr.opcode == LT {
                    ordering == std::cmp::Ordering::Less
                } else {
                    ordering == std::cmp::Ordering::Greater
                };
                self.frames.set(frame, name, Value::Bool(result))?;
                Ok(Step::Continue)
            }
            EQ => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let a = self.eval_initialised(&instr.args[1])?;
                let b = self.eval_initialised(&instr.args[2])?;
                let result = eq_values(&a, &b)?;
                self.frames.set(frame, name, Value::Bool(result))?;
                Ok(Step::Continue)
            }
            AND | OR => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let a = self.require_bool(&self.eval_initialised(&instr.args[1])?)?;
                let b = self.require_bool(&self.eval_initialised(&instr.args[2])?)?;
                let result = if instr.opcode == AND { a && b } else { a || b };
                self.frames.set(frame, name, Value::Bool(result))?;
                Ok(Step::Continue)
            }
            CONCAT => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let a = self.require_str(&self.eval_initialised(&instr.args[1])?)?;
                let b = self.require_str(&self.eval_initialised(&instr.args[2])?)?;
                let result = format!("{}{}", decode_escapes(&a), decode_escapes(&b));
                self.frames.set(frame, name, Value::Str(result))?;
                Ok(Step::Continue)
            }
            GETCHAR => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let s = self.require_str(&self.eval_initialised(&instr.args[1])?)?;
                let i = self.require_int(&self.eval_initialised(&instr.args[2])?)?;
                let ch = char_at(&decode_escapes(&s), i)?;
                self.frames.set(frame, name, Value::Str(ch.to_string()))?;
                Ok(Step::Continue)
            }
            SETCHAR => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let current = self.frames.get(frame, name)?.clone();
                if current.is_uninit() {
                    return Err(error::missing_value("SETCHAR destination is not initialised"));
                }
                let dst = self.require_str(&current)?;
                let i = self.require_int(&self.eval_initialised(&instr.args[1])?)?;
                let s = self.require_str(&self.eval_initialised(&instr.args[2])?)?;
                let replaced = setchar(&decode_escapes(&dst), i, &decode_escapes(&s))?;
                self.frames.set(frame, name, Value::Str(replaced))?;
                Ok(Step::Continue)
            }
            STRI2INT => {
                let (frame, name) = self.arg_var(&instr.args[0])?;
                let s = self.require_str(&self.eval_initialised(&instr.args[1])?)?;
                let i = self.require_int(&self.eval_initialised(&instr.args[2])?)?;
                let ch = char_at(&decode_escapes(&s), i)?;
                self.frames.set(frame, name, Value::Int(ch as i64))?;
                Ok(Step::Continue)
            }
            JUMPIFEQ | JUMPIFNEQ => {
                let target = self.label_target(&instr.args[0])?;
                let a = self.eval_initialised(&instr.args[1])?;
                let b = self.eval_initialised(&instr.args[2])?;
                let equal = eq_values(&a, &b)?;
                let take = if instr.opcode == JUMPIFEQ {
                    equal
                } else {
                    !equal
                };
                if take {
                    Ok(Step::Jump(target))
                } else {
                    Ok(Step::Continue)
                }
            }
        }
    }

    fn arg_var<'a>(&self, arg: &'a Arg) -> Result<(FrameId, &'a str)> {
        arg.as_var()
            .ok_or_else(|| error::xml_structure("expected a var operand"))
    }

    fn label_target(&self, arg: &Arg) -> Result<usize> {
        let name = arg
            .as_label()
            .ok_or_else(|| error::xml_structure("expected a label operand"))?;
        self.labels
            .get(name)
            .copied()
            .ok_or_else(|| error::semantics(format!("undefined label '{name}'")))
    }

    /// Resolves a `symb` argument to a value without requiring it be
    /// initialised; `TYPE` is the only caller that wants this.
    fn eval(&self, arg: &Arg) -> Result<Value> {
        match arg {
            Arg::Var(frame, name) => Ok(self.frames.get(*frame, name)?.clone()),
            Arg::Const(literal) => Ok(match literal {
                Literal::Int(n) => Value::Int(*n),
                Literal::Str(s) => Value::Str(s.clone()),
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Nil => Value::Nil,
            }),
            _ => Err(error::xml_structure("expected a symb operand")),
        }
    }

    /// Like [`Interpreter::eval`] but rejects `Uninit` (spec §4.3's
    /// `evaluate_symb`, less the expected-type check: each call site
    /// enforces its own expected type via `require_int`/`require_str`/
    /// `require_bool` once it knows which one applies).
    fn eval_initialised(&self, arg: &Arg) -> Result<Value> {
        let value = self.eval(arg)?;
        if value.is_uninit() {
            return Err(error::missing_value("operand is declared but not initialised"));
        }
        Ok(value)
    }

    fn require_int(&self, value: &Value) -> Result<i64> {
        value
            .as_int()
            .ok_or_else(|| error::operands(format!("expected int, found {value}")))
    }

    fn require_str(&self, value: &Value) -> Result<String> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| error::operands(format!("expected string, found {value}")))
    }

    fn require_bool(&self, value: &Value) -> Result<bool> {
        value
            .as_bool()
            .ok_or_else(|| error::operands(format!("expected bool, found {value}")))
    }

    fn render_output(&self, arg: &Arg) -> Result<String> {
        let value = self.eval_initialised(arg)?;
        Ok(match value {
            Value::Str(s) => decode_escapes(&s),
            other => other.render(),
        })
    }

    fn compare_no_nil(&self, a: &Value, b: &Value) -> Result<std::cmp::Ordering> {
        match (a, b) {
            (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
            (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
            (Value::Str(x), Value::Str(y)) => Ok(decode_escapes(x).cmp(&decode_escapes(y))),
            (Value::Nil, _) | (_, Value::Nil) => {
                Err(error::operands("LT/GT do not accept nil operands"))
            }
            _ => Err(error::operands("LT/GT require two operands of the same type")),
        }
    }

    fn read_value(&mut self, tag: TypeTag) -> Result<Value> {
        let line = self
            .input
            .next_line()
            .map_err(|e| error::internal(format!("READ failed: {e}")))?;
        let Some(line) = line else {
            return Ok(Value::Nil);
        };
        Ok(match tag {
            TypeTag::int => match line.parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::Nil,
            },
            TypeTag::bool => Value::Bool(line.eq_ignore_ascii_case("true")),
            TypeTag::string => Value::Str(line),
            TypeTag::nil => Value::Nil,
        })
    }

    fn dump_state(&self) {
        eprintln!("--- BREAK ---");
        eprintln!("ip = {}", self.ip);
        eprintln!("executed = {}", self.executed_count);
        for (label, frame) in self.frames.dump_order() {
            eprintln!("{label}:");
            for (name, value) in frame.iter() {
                eprintln!("  {name} = {value}");
            }
        }
        eprintln!("CS ({} deep):", self.call_stack.len());
        for (depth, target) in self.call_stack.iter().rev().enumerate() {
            eprintln!("  [{depth}] -> ip {target}");
        }
        eprintln!("DS ({} deep, top to bottom):", self.data_stack.len());
        for (depth, value) in self.data_stack.iter().rev().enumerate() {
            eprintln!("  [{depth}] {value}");
        }
        eprintln!("-------------");
        debug!(
            "BREAK at ip={} executed={}",
            self.ip, self.executed_count
        );
    }
}

fn eq_values(a: &Value, b: &Value) -> Result<bool> {
    if a.is_uninit() || b.is_uninit() {
        return Err(error::missing_value("EQ operand is not initialised"));
    }
    if matches!(a, Value::Nil) || matches!(b, Value::Nil) {
        return Ok(matches!(a, Value::Nil) && matches!(b, Value::Nil));
    }
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x == y),
        (Value::Bool(x), Value::Bool(y)) => Ok(x == y),
        (Value::Str(x), Value::Str(y)) => Ok(decode_escapes(x) == decode_escapes(y)),
        _ => Err(error::operands("EQ requires operands of the same type")),
    }
}

fn char_from_code(code: i64) -> Result<char> {
    if code < 0 || code > 0x10FFFF {
        return Err(error::string_error(format!(
            "{code} is not a valid Unicode scalar value"
        )));
    }
    char::from_u32(code as u32)
        .ok_or_else(|| error::string_error(format!("{code} is not a valid Unicode scalar value")))
}

fn char_at(s: &str, index: i64) -> Result<char> {
    if index < 0 {
        return Err(error::string_error("negative string index"));
    }
    s.chars()
        .nth(index as usize)
        .ok_or_else(|| error::string_error("string index out of range"))
}

fn setchar(dst: &str, index: i64, replacement: &str) -> Result<String> {
    if index < 0 {
        return Err(error::string_error("negative string index"));
    }
    let mut chars: Vec<char> = dst.chars().collect();
    let idx = index as usize;
    if idx >= chars.len() {
        return Err(error::string_error("string index out of range"));
    }
    let ch = replacement
        .chars()
        .next()
        .ok_or_else(|| error::string_error("replacement string is empty"))?;
    chars[idx] = ch;
    Ok(chars.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::LineSource;
    use std::io::Cursor;

    fn var(frame: FrameId, name: &str) -> Arg {
        Arg::Var(frame, name.to_string())
    }

    fn int(n: i64) -> Arg {
        Arg::Const(Literal::Int(n))
    }

    fn string(s: &str) -> Arg {
        Arg::Const(Literal::Str(s.to_string()))
    }

    fn label(name: &str) -> Arg {
        Arg::Label(name.to_string())
    }

    fn interp(program: Vec<Instruction>) -> Interpreter {
        let input: Box<dyn InputSource> = Box::new(LineSource::new(Cursor::new(Vec::new())));
        Interpreter::new(program, input).unwrap()
    }

    fn interp_with_input(program: Vec<Instruction>, lines: &str) -> Interpreter {
        let input: Box<dyn InputSource> =
            Box::new(LineSource::new(Cursor::new(lines.as_bytes().to_vec())));
        Interpreter::new(program, input).unwrap()
    }

    #[test]
    fn arithmetic_and_write_target() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "a")]),
            Instruction::new(2, Opcode::MOVE, vec![var(FrameId::GF, "a"), int(7)]),
        ]);
        assert_eq!(i.run().unwrap(), 0);
        assert_eq!(i.frame_value(FrameId::GF, "a").unwrap().as_int(), Some(7));
    }

    #[test]
    fn idiv_by_zero_is_operand_value_error() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "a")]),
            Instruction::new(2, Opcode::MOVE, vec![var(FrameId::GF, "a"), int(10)]),
            Instruction::new(
                3,
                Opcode::IDIV,
                vec![var(FrameId::GF, "a"), var(FrameId::GF, "a"), int(0)],
            ),
        ]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::OperandValue);
        assert_eq!(err.exit_code(), 57);
    }

    #[test]
    fn exit_halts_with_requested_code() {
        let mut i = interp(vec![Instruction::new(1, Opcode::EXIT, vec![int(0)])]);
        assert_eq!(i.run().unwrap(), 0);

        let mut i = interp(vec![Instruction::new(1, Opcode::EXIT, vec![int(42)])]);
        assert_eq!(i.run().unwrap(), 42);
    }

    #[test]
    fn exit_out_of_range_is_operand_value_error() {
        let mut i = interp(vec![Instruction::new(1, Opcode::EXIT, vec![int(50)])]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::OperandValue);
    }

    #[test]
    fn writing_an_uninitialised_variable_is_missing_value() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::CREATEFRAME, vec![]),
            Instruction::new(2, Opcode::DEFVAR, vec![var(FrameId::TF, "x")]),
            Instruction::new(3, Opcode::PUSHFRAME, vec![]),
            Instruction::new(4, Opcode::WRITE, vec![var(FrameId::LF, "x")]),
        ]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::MissingValue);
        assert_eq!(err.exit_code(), 56);
    }

    #[test]
    fn jump_skips_to_label() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::JUMP, vec![label("skip")]),
            Instruction::new(2, Opcode::DEFVAR, vec![var(FrameId::GF, "never")]),
            Instruction::new(3, Opcode::EXIT, vec![int(9)]),
            Instruction::new(4, Opcode::LABEL, vec![label("skip")]),
            Instruction::new(5, Opcode::EXIT, vec![int(3)]),
        ]);
        assert_eq!(i.run().unwrap(), 3);
    }

    #[test]
    fn jumpifeq_treats_nil_as_equal_only_to_nil() {
        let mut i = interp(vec![
            Instruction::new(
                1,
                Opcode::JUMPIFEQ,
                vec![label("eq"), Arg::Const(Literal::Nil), Arg::Const(Literal::Nil)],
            ),
            Instruction::new(2, Opcode::EXIT, vec![int(1)]),
            Instruction::new(3, Opcode::LABEL, vec![label("eq")]),
            Instruction::new(4, Opcode::EXIT, vec![int(2)]),
        ]);
        assert_eq!(i.run().unwrap(), 2);
    }

    #[test]
    fn eq_with_mismatched_non_nil_types_is_operands_error() {
        let mut i = interp(vec![Instruction::new(
            1,
            Opcode::JUMPIFEQ,
            vec![label("x"), int(1), string("1")],
        )]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::Operands);
    }

    #[test]
    fn pushs_pops_roundtrip_matches_move() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "a")]),
            Instruction::new(2, Opcode::PUSHS, vec![int(5)]),
            Instruction::new(3, Opcode::POPS, vec![var(FrameId::GF, "a")]),
        ]);
        i.run().unwrap();
        assert_eq!(i.frame_value(FrameId::GF, "a").unwrap().as_int(), Some(5));
    }

    #[test]
    fn concat_and_strlen_decode_escapes() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "s")]),
            Instruction::new(2, Opcode::DEFVAR, vec![var(FrameId::GF, "n")]),
            Instruction::new(
                3,
                Opcode::CONCAT,
                vec![var(FrameId::GF, "s"), string("ab\\099"), string("z")],
            ),
            Instruction::new(
                4,
                Opcode::STRLEN,
                vec![var(FrameId::GF, "n"), var(FrameId::GF, "s")],
            ),
        ]);
        i.run().unwrap();
        assert_eq!(
            i.frame_value(FrameId::GF, "s").unwrap().as_str(),
            Some("abcz")
        );
        assert_eq!(i.frame_value(FrameId::GF, "n").unwrap().as_int(), Some(4));
    }

    #[test]
    fn getchar_succeeds_within_bounds_and_fails_past_end() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "c")]),
            Instruction::new(
                2,
                Opcode::GETCHAR,
                vec![var(FrameId::GF, "c"), string("hi"), int(1)],
            ),
        ]);
        i.run().unwrap();
        assert_eq!(
            i.frame_value(FrameId::GF, "c").unwrap().as_str(),
            Some("i")
        );

        let mut i = interp(vec![Instruction::new(
            1,
            Opcode::GETCHAR,
            vec![var(FrameId::GF, "c"), string("hi"), int(2)],
        )]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::StringError);
    }

    #[test]
    fn setchar_replaces_code_point_at_index() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "s")]),
            Instruction::new(2, Opcode::MOVE, vec![var(FrameId::GF, "s"), string("hi")]),
            Instruction::new(
                3,
                Opcode::SETCHAR,
                vec![var(FrameId::GF, "s"), int(0), string("y")],
            ),
        ]);
        i.run().unwrap();
        assert_eq!(i.frame_value(FrameId::GF, "s").unwrap().as_str(), Some("yi"));
    }

    #[test]
    fn setchar_out_of_bounds_or_empty_replacement_is_string_error() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "s")]),
            Instruction::new(2, Opcode::MOVE, vec![var(FrameId::GF, "s"), string("hi")]),
            Instruction::new(
                3,
                Opcode::SETCHAR,
                vec![var(FrameId::GF, "s"), int(5), string("y")],
            ),
        ]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::StringError);

        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "s")]),
            Instruction::new(2, Opcode::MOVE, vec![var(FrameId::GF, "s"), string("hi")]),
            Instruction::new(
                3,
                Opcode::SETCHAR,
                vec![var(FrameId::GF, "s"), int(0), string("")],
            ),
        ]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::StringError);
    }

    #[test]
    fn setchar_on_uninitialised_destination_is_missing_value() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "s")]),
            Instruction::new(2, Opcode::DEFVAR, vec![var(FrameId::GF, "i")]),
            Instruction::new(3, Opcode::MOVE, vec![var(FrameId::GF, "i"), int(0)]),
            Instruction::new(
                4,
                Opcode::SETCHAR,
                vec![var(FrameId::GF, "s"), var(FrameId::GF, "i"), string("y")],
            ),
        ]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::MissingValue);
        assert_eq!(err.exit_code(), 56);
    }

    #[test]
    fn int2char_and_stri2int_are_inverse_on_ascii() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "s")]),
            Instruction::new(2, Opcode::DEFVAR, vec![var(FrameId::GF, "n")]),
            Instruction::new(3, Opcode::INT2CHAR, vec![var(FrameId::GF, "s"), int(65)]),
            Instruction::new(
                4,
                Opcode::STRI2INT,
                vec![var(FrameId::GF, "n"), var(FrameId::GF, "s"), int(0)],
            ),
        ]);
        i.run().unwrap();
        assert_eq!(i.frame_value(FrameId::GF, "n").unwrap().as_int(), Some(65));
    }

    #[test]
    fn int2char_out_of_range_is_string_error() {
        let mut i = interp(vec![Instruction::new(
            1,
            Opcode::INT2CHAR,
            vec![var(FrameId::GF, "s"), int(0x110000)],
        )]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::StringError);
    }

    #[test]
    fn read_int_falls_back_to_nil_on_bad_input() {
        let mut i = interp_with_input(
            vec![
                Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "a")]),
                Instruction::new(
                    2,
                    Opcode::READ,
                    vec![var(FrameId::GF, "a"), Arg::Type(TypeTag::int)],
                ),
            ],
            "not-a-number\n",
        );
        i.run().unwrap();
        assert_eq!(i.frame_value(FrameId::GF, "a").unwrap(), Value::Nil);
    }

    #[test]
    fn read_past_eof_is_nil() {
        let mut i = interp_with_input(
            vec![
                Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "a")]),
                Instruction::new(
                    2,
                    Opcode::READ,
                    vec![var(FrameId::GF, "a"), Arg::Type(TypeTag::string)],
                ),
            ],
            "",
        );
        i.run().unwrap();
        assert_eq!(i.frame_value(FrameId::GF, "a").unwrap(), Value::Nil);
    }

    #[test]
    fn break_dumps_state_and_falls_through_to_the_next_instruction() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::DEFVAR, vec![var(FrameId::GF, "a")]),
            Instruction::new(2, Opcode::MOVE, vec![var(FrameId::GF, "a"), int(3)]),
            Instruction::new(3, Opcode::PUSHS, vec![int(1)]),
            Instruction::new(4, Opcode::BREAK, vec![]),
            Instruction::new(5, Opcode::EXIT, vec![int(9)]),
        ]);
        assert_eq!(i.run().unwrap(), 9);
        assert_eq!(i.frame_value(FrameId::GF, "a").unwrap().as_int(), Some(3));
    }

    #[test]
    fn pushframe_popframe_restores_original_tf() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::CREATEFRAME, vec![]),
            Instruction::new(2, Opcode::DEFVAR, vec![var(FrameId::TF, "x")]),
            Instruction::new(3, Opcode::MOVE, vec![var(FrameId::TF, "x"), int(1)]),
            Instruction::new(4, Opcode::PUSHFRAME, vec![]),
            Instruction::new(5, Opcode::POPFRAME, vec![]),
        ]);
        i.run().unwrap();
        assert_eq!(i.frame_value(FrameId::TF, "x").unwrap().as_int(), Some(1));
    }

    #[test]
    fn return_with_empty_call_stack_is_missing_value() {
        let mut i = interp(vec![Instruction::new(1, Opcode::RETURN, vec![])]);
        let err = i.run().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::MissingValue);
    }

    #[test]
    fn call_then_return_resumes_after_call() {
        let mut i = interp(vec![
            Instruction::new(1, Opcode::CALL, vec![label("fn")]),
            Instruction::new(2, Opcode::EXIT, vec![int(7)]),
            Instruction::new(3, Opcode::LABEL, vec![label("fn")]),
            Instruction::new(4, Opcode::RETURN, vec![]),
        ]);
        assert_eq!(i.run().unwrap(), 7);
    }
}
