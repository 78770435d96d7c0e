//! Interpreter engine for IPPcode22.
//!
//! This crate owns the value/frame model, the instruction
//! representation, the label table builder, the fetch/execute loop,
//! and the closed error taxonomy with its exit-code mapping. Turning
//! an XML document into an [`instruction::Instruction`] sequence is
//! the job of the sibling `ippcode22-xml` crate; driving this crate
//! from a CLI is the job of the `interpret` binary.

pub mod error;
pub mod executor;
pub mod frame;
pub mod instruction;
pub mod io;
pub mod label;
pub mod opcode;
pub mod value;

pub use error::{ErrorKind, InterpretError, Result};
pub use executor::Interpreter;
pub use instruction::{Arg, Instruction, Literal};
pub use opcode::{FrameId, Opcode, TypeTag};
pub use value::Value;
