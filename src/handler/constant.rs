//! Constant load handlers
//!
//! `const*` instructions put a literal, string or class into a register.
//! For the `high16` forms the instruction carries the encoded 16-bit field;
//! the handler shifts it into place.

use std::fmt;

use tracing::trace;

use super::category::OpcodeCategory;
use super::{check_literal, check_shape, literal_at, register_at, HandlerError, HandlerResult};
use crate::bytecode::{Instruction, Opcode, Operand};
use crate::vm::{ExecResult, MethodState, Step, Value};

/// The value a constant instruction loads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Int(i32),
    Long(i64),
    String(String),
    /// Type descriptor of the class
    Class(String),
}

impl ConstValue {
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::Int(*n),
            Self::Long(n) => Value::Long(*n),
            Self::String(s) => Value::String(s.clone()),
            Self::Class(t) => Value::Class(t.clone()),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.to_value(), f)
    }
}

/// Handler for one constant load
#[derive(Debug, Clone, PartialEq)]
pub struct ConstOp {
    instruction: Instruction,
    index: usize,
    dest: u16,
    value: ConstValue,
}

impl ConstOp {
    /// Build the handler for `instruction` at `index`
    pub fn create(instruction: &Instruction, index: usize) -> HandlerResult<Self> {
        let opcode = instruction.opcode();
        if !is_const(opcode) {
            return Err(HandlerError::CategoryMismatch {
                opcode,
                expected: OpcodeCategory::Constant,
            });
        }
        check_shape(instruction, index)?;

        let dest = register_at(instruction, 0, index)?;
        let value = match opcode {
            Opcode::ConstString | Opcode::ConstStringJumbo => match instruction.operand(1) {
                Some(Operand::StringRef(s)) => ConstValue::String(s.clone()),
                _ => return Err(super::shape_error(instruction, index)),
            },
            Opcode::ConstClass => match instruction.operand(1) {
                Some(Operand::TypeRef(t)) => ConstValue::Class(t.clone()),
                _ => return Err(super::shape_error(instruction, index)),
            },
            _ => {
                let literal = literal_at(instruction, 1, index)?;
                if let Some(bits) = opcode.format().literal_bits() {
                    check_literal(opcode, literal, bits)?;
                }
                literal_value(opcode, literal)
            }
        };

        Ok(Self {
            instruction: instruction.clone(),
            index,
            dest,
            value,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub fn dest(&self) -> u16 {
        self.dest
    }

    pub fn value(&self) -> &ConstValue {
        &self.value
    }

    /// Store the constant in the destination register
    pub fn execute(&self, state: &mut MethodState) -> ExecResult<Step> {
        trace!(
            target: "dexsimplify::handler::exec",
            index = self.index,
            dest = self.dest,
            value = %self.value,
            "const"
        );
        state.assign(self.dest, self.value.to_value())?;
        Ok(Step::Next)
    }
}

impl fmt::Display for ConstOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{} = {}", self.dest, self.value)
    }
}

pub(crate) fn is_const(op: Opcode) -> bool {
    matches!(
        op,
        Opcode::Const4
            | Opcode::Const16
            | Opcode::Const
            | Opcode::ConstHigh16
            | Opcode::ConstWide16
            | Opcode::ConstWide32
            | Opcode::ConstWide
            | Opcode::ConstWideHigh16
            | Opcode::ConstString
            | Opcode::ConstStringJumbo
            | Opcode::ConstClass
    )
}

// `literal` has already been range checked against the opcode's format
fn literal_value(op: Opcode, literal: i64) -> ConstValue {
    match op {
        Opcode::ConstHigh16 => ConstValue::Int((literal as i32) << 16),
        Opcode::ConstWideHigh16 => ConstValue::Long(literal << 48),
        Opcode::ConstWide16 | Opcode::ConstWide32 | Opcode::ConstWide => ConstValue::Long(literal),
        _ => ConstValue::Int(literal as i32),
    }
}
