//! The closed error taxonomy (spec §7) and its 1:1 exit-code mapping
//! (spec §6). Grounded on `src/processor.rs::Error` and
//! `vasm/src/error.rs::Error` in the teacher crate: a plain enum with
//! a hand-written [`std::fmt::Display`]/[`std::error::Error`] impl,
//! never a bag of strings.

use std::error::Error as StdError;
use std::fmt;

/// One variant per error kind in the taxonomy. Carries enough context
/// to produce a useful diagnostic; the exit code is a pure function
/// of the variant, never of the context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or contradictory command line arguments.
    Params,
    /// The source/input file could not be opened for reading.
    FileOpen,
    /// The input is not well-formed XML.
    XmlFormat,
    /// The input is well-formed XML but violates the IPPcode22 schema
    /// (wrong root, wrong argument shape, bad `order`, ...).
    XmlStructure,
    /// A lazily-detected static semantic error: duplicate label,
    /// undefined jump target, duplicate `DEFVAR`, empty-stack
    /// `RETURN`.
    Semantics,
    /// An operand had the wrong runtime type for the operation.
    Operands,
    /// A variable reference named a frame that exists but an entry
    /// that doesn't.
    VarMissing,
    /// A variable reference (or `PUSHFRAME`/`POPFRAME`) named a frame
    /// that doesn't currently exist.
    FrameMissing,
    /// A read observed a declared-but-unwritten (`Uninit`) slot, or
    /// popped from an empty stack.
    MissingValue,
    /// An operand had the right type but an invalid value (division
    /// by zero, out-of-range `EXIT` code, invalid code point).
    OperandValue,
    /// A string operation (`GETCHAR`, `SETCHAR`, `STRI2INT`, ...) was
    /// given an out-of-bounds index or an empty replacement string.
    StringError,
    /// An invariant the interpreter itself should have upheld was
    /// violated; reaching this indicates a bug in the interpreter.
    Internal,
}

impl ErrorKind {
    /// Maps a taxonomy entry to its fixed process exit code (spec §6).
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Params => 10,
            ErrorKind::FileOpen => 11,
            ErrorKind::XmlFormat => 31,
            ErrorKind::XmlStructure => 32,
            ErrorKind::Semantics => 52,
            ErrorKind::Operands => 53,
            ErrorKind::VarMissing => 54,
            ErrorKind::FrameMissing => 55,
            ErrorKind::MissingValue => 56,
            ErrorKind::OperandValue => 57,
            ErrorKind::StringError => 58,
            ErrorKind::Internal => 99,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ErrorKind::Params => "params",
            ErrorKind::FileOpen => "file-open",
            ErrorKind::XmlFormat => "xml-format",
            ErrorKind::XmlStructure => "xml-structure",
            ErrorKind::Semantics => "semantics",
            ErrorKind::Operands => "operands",
            ErrorKind::VarMissing => "var-missing",
            ErrorKind::FrameMissing => "frame-missing",
            ErrorKind::MissingValue => "missing-value",
            ErrorKind::OperandValue => "operand-value",
            ErrorKind::StringError => "string-error",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// A taxonomy error plus a human-readable message, ready to print to
/// stderr.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpretError {
    pub kind: ErrorKind,
    pub message: String,
}

impl InterpretError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> InterpretError {
        InterpretError {
            kind,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl fmt::Display for InterpretError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for InterpretError {
    fn description(&self) -> &str {
        "interpretation of the IPPcode22 program failed"
    }
}

pub type Result<T> = std::result::Result<T, InterpretError>;

macro_rules! err_ctor {
    ($name:ident, $kind:ident) => {
        pub fn $name(message: impl Into<String>) -> InterpretError {
            InterpretError::new(ErrorKind::$kind, message)
        }
    };
}

err_ctor!(params, Params);
err_ctor!(file_open, FileOpen);
err_ctor!(xml_format, XmlFormat);
err_ctor!(xml_structure, XmlStructure);
err_ctor!(semantics, Semantics);
err_ctor!(operands, Operands);
err_ctor!(var_missing, VarMissing);
err_ctor!(frame_missing, FrameMissing);
err_ctor!(missing_value, MissingValue);
err_ctor!(operand_value, OperandValue);
err_ctor!(string_error, StringError);
err_ctor!(internal, Internal);
