//! Label table construction (spec §3, §4.2). Grounded on the
//! teacher's `vasm/src/labels.rs`: a single pass over the instruction
//! list collecting `LABEL` positions into a name → index map, with a
//! duplicate name rejected as a static error rather than silently
//! shadowed.

use std::collections::HashMap;

use crate::error::{self, Result};
use crate::instruction::Instruction;
use crate::opcode::Opcode;

/// Maps a label name to the index, within `program`, of the
/// instruction to resume at after a jump to that label (i.e. the
/// index of the `LABEL` instruction itself; the executor's fetch loop
/// advances past it on the next tick, same as falling through any
/// other instruction).
pub type LabelTable = HashMap<String, usize>;

pub fn build_label_table(program: &[Instruction]) -> Result<LabelTable> {
    let mut labels = LabelTable::new();
    for (index, instr) in program.iter().enumerate() {
        if instr.opcode != Opcode::LABEL {
            continue;
        }
        let name = instr.args[0]
            .as_label()
            .expect("loader guarantees LABEL's argument is a label");
        if labels.insert(name.to_string(), index).is_some() {
            return Err(error::semantics(format!(
                "label '{name}' is defined more than once"
            )));
        }
    }
    Ok(labels)
}
