//! Frames and the frame stack (spec §3). Grounded on the teacher's
//! `src/memory.rs`/`src/memory/composite.rs` (a `Storage` trait over
//! named slots, with a composite type aggregating several storages) —
//! here specialised to exactly the three IPPcode22 frames and their
//! push/pop lifecycle instead of the teacher's generic register file.

use std::collections::HashMap;

use crate::error::{self, Result};
use crate::opcode::FrameId;
use crate::value::Value;

/// A single frame: a name → value table. `DEFVAR` inserts `Uninit`;
/// reads and writes never implicitly create an entry (invariant I2).
#[derive(Clone, Debug, Default)]
pub struct Frame {
    vars: HashMap<String, Value>,
}

impl Frame {
    pub fn new() -> Frame {
        Frame {
            vars: HashMap::new(),
        }
    }

    /// `DEFVAR`. Redefining an existing name is a static semantic
    /// error (spec §4.4), checked by the caller before this is
    /// reached in practice, but enforced here too so the frame itself
    /// can never silently clobber a slot.
    pub fn define(&mut self, name: &str) -> Result<()> {
        if self.vars.contains_key(name) {
            return Err(error::semantics(format!(
                "variable '{name}' already defined in this frame"
            )));
        }
        self.vars.insert(name.to_string(), Value::Uninit);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&Value> {
        self.vars
            .get(name)
            .ok_or_else(|| error::var_missing(format!("variable '{name}' is not defined")))
    }

    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        match self.vars.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(error::var_missing(format!(
                "variable '{name}' is not defined"
            ))),
        }
    }

    /// All bindings currently in this frame, for `BREAK`'s dump.
    /// Unordered, same as the underlying table (spec §3: a frame is an
    /// "ordered-unimportant mapping").
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// The global frame, the frame stack, and the (at most one) temporary
/// frame, plus the operations that move frames between them.
///
/// `TF` is represented as `Option<Frame>` rather than always-present:
/// reading or writing through `TF` while it's `None` is a
/// frame-missing error (spec §4.4's `CREATEFRAME` precondition),
/// mirroring the teacher's preference for making an invalid state
/// genuinely unrepresentable rather than flagging it with a bool.
#[derive(Debug, Default)]
pub struct Frames {
    global: Frame,
    stack: Vec<Frame>,
    temp: Option<Frame>,
}

impl Frames {
    pub fn new() -> Frames {
        Frames {
            global: Frame::new(),
            stack: Vec::new(),
            temp: None,
        }
    }

    /// `CREATEFRAME`. Always succeeds, discarding any previous `TF`.
    pub fn create_frame(&mut self) {
        self.temp = Some(Frame::new());
    }

    /// `PUSHFRAME`. Moves `TF` onto the frame stack as the new `LF`.
    pub fn push_frame(&mut self) -> Result<()> {
        let frame = self
            .temp
            .take()
            .ok_or_else(|| error::frame_missing("no temporary frame to push"))?;
        self.stack.push(frame);
        Ok(())
    }

    /// `POPFRAME`. Pops the frame-stack top into `TF`, discarding
    /// whatever `TF` held before (resolved open question: this is a
    /// move, not a copy-then-pop — see DESIGN.md).
    pub fn pop_frame(&mut self) -> Result<()> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| error::frame_missing("no local frame to pop"))?;
        self.temp = Some(frame);
        Ok(())
    }

    fn frame(&self, id: FrameId) -> Result<&Frame> {
        match id {
            FrameId::GF => Ok(&self.global),
            FrameId::LF => self
                .stack
                .last()
                .ok_or_else(|| error::frame_missing("no local frame is active")),
            FrameId::TF => self
                .temp
                .as_ref()
                .ok_or_else(|| error::frame_missing("no temporary frame is active")),
        }
    }

    fn frame_mut(&mut self, id: FrameId) -> Result<&mut Frame> {
        match id {
            FrameId::GF => Ok(&mut self.global),
            FrameId::LF => self
                .stack
                .last_mut()
                .ok_or_else(|| error::frame_missing("no local frame is active")),
            FrameId::TF => self
                .temp
                .as_mut()
                .ok_or_else(|| error::frame_missing("no temporary frame is active")),
        }
    }

    pub fn define(&mut self, id: FrameId, name: &str) -> Result<()> {
        self.frame_mut(id)?.define(name)
    }

    pub fn get(&self, id: FrameId, name: &str) -> Result<&Value> {
        self.frame(id)?.get(name)
    }

    pub fn set(&mut self, id: FrameId, name: &str, value: Value) -> Result<()> {
        self.frame_mut(id)?.set(name, value)
    }

    /// The global frame, the current local frame (if any), and the
    /// temporary frame (if any), tagged with the label `BREAK` prints
    /// them under. Frames that don't currently exist are omitted
    /// rather than shown empty.
    pub fn dump_order(&self) -> Vec<(&'static str, &Frame)> {
        let mut frames = vec![("GF", &self.global)];
        if let Some(local) = self.stack.last() {
            frames.push(("LF", local));
        }
        if let Some(temp) = &self.temp {
            frames.push(("TF", temp));
        }
        frames
    }

    pub fn frame_stack_depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_then_read_is_uninit() {
        let mut frames = Frames::new();
        frames.define(FrameId::GF, "x").unwrap();
        assert!(frames.get(FrameId::GF, "x").unwrap().is_uninit());
    }

    #[test]
    fn redefining_a_variable_is_a_semantics_error() {
        let mut frames = Frames::new();
        frames.define(FrameId::GF, "x").unwrap();
        let err = frames.define(FrameId::GF, "x").unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::Semantics);
    }

    #[test]
    fn reading_an_undeclared_variable_is_var_missing() {
        let frames = Frames::new();
        let err = frames.get(FrameId::GF, "x").unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::VarMissing);
    }

    #[test]
    fn reading_lf_without_a_frame_is_frame_missing() {
        let frames = Frames::new();
        let err = frames.get(FrameId::LF, "x").unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::FrameMissing);
    }

    #[test]
    fn push_pop_roundtrips_and_discards_old_tf() {
        let mut frames = Frames::new();
        frames.create_frame();
        frames.define(FrameId::TF, "x").unwrap();
        frames.set(FrameId::TF, "x", Value::Int(42)).unwrap();
        frames.push_frame().unwrap();
        assert_eq!(frames.get(FrameId::LF, "x").unwrap().as_int(), Some(42));

        frames.create_frame();
        frames.pop_frame().unwrap();
        assert_eq!(frames.get(FrameId::TF, "x").unwrap().as_int(), Some(42));
    }

    #[test]
    fn pop_frame_on_empty_stack_is_frame_missing() {
        let mut frames = Frames::new();
        let err = frames.pop_frame().unwrap_err();
        assert_eq!(err.kind, error::ErrorKind::FrameMissing);
    }

    #[test]
    fn frame_iter_exposes_every_binding() {
        let mut frame = Frame::new();
        frame.define("x").unwrap();
        frame.set("x", Value::Int(1)).unwrap();
        frame.define("y").unwrap();
        let mut seen: Vec<_> = frame.iter().map(|(name, value)| (name.to_string(), value.clone())).collect();
        seen.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(seen, vec![
            ("x".to_string(), Value::Int(1)),
            ("y".to_string(), Value::Uninit),
        ]);
    }

    #[test]
    fn dump_order_omits_absent_frames() {
        let frames = Frames::new();
        let dumped: Vec<_> = frames.dump_order().into_iter().map(|(label, _)| label).collect();
        assert_eq!(dumped, vec!["GF"]);
    }

    #[test]
    fn dump_order_includes_lf_and_tf_once_present() {
        let mut frames = Frames::new();
        frames.create_frame();
        frames.push_frame().unwrap();
        frames.create_frame();
        let dumped: Vec<_> = frames.dump_order().into_iter().map(|(label, _)| label).collect();
        assert_eq!(dumped, vec!["GF", "LF", "TF"]);
    }
}
