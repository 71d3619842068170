//! Dalvik instruction model
//!
//! - `opcodes`: the opcode set, formats and operand shapes
//! - `instruction`: decoded instructions and their operands

pub mod instruction;
pub mod opcodes;

pub use instruction::{Instruction, Operand, Operands};
pub use opcodes::{Format, Opcode, OperandKind};
