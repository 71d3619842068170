//! Instruction handlers and dispatch
//!
//! This module turns decoded instructions into executable handlers:
//! - `category`: total opcode classification
//! - `factory`: the dispatcher routing each instruction to its category factory
//! - `binary_math`, `constant`, `unimplemented`: category factories and handlers
//!
//! A handler is bound to one `(instruction, index)` pair. It is created once
//! and invoked by the execution loop to update a [`MethodState`].

use std::fmt;

use crate::bytecode::{Format, Instruction, Opcode};
use crate::vm::{ExecResult, MethodState, Step};

pub mod binary_math;
pub mod category;
pub mod constant;
pub mod factory;
pub mod unimplemented;


pub use binary_math::{BinaryMathOp, BinaryOperator, OperandForm, OperandType};
pub use category::{
    classify, dispatch_category, explicit_category, unimplemented_reason, OpcodeCategory,
    UnimplementedReason,
};
pub use constant::{ConstOp, ConstValue};
pub use factory::OpHandlerFactory;
pub use unimplemented::UnimplementedOp;

/// Result of handler construction
pub type HandlerResult<T> = Result<T, HandlerError>;

/// Errors raised by a category factory when an instruction does not fit it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The opcode does not belong to the factory's category
    CategoryMismatch {
        opcode: Opcode,
        expected: OpcodeCategory,
    },
    /// Operand count or kinds do not match the opcode's format
    OperandShape {
        opcode: Opcode,
        format: Format,
        index: usize,
    },
    /// A literal does not fit the width its format encodes
    LiteralOutOfRange {
        opcode: Opcode,
        value: i64,
        bits: u32,
    },
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CategoryMismatch { opcode, expected } => {
                write!(f, "{} is not a {} opcode", opcode, expected)
            }
            Self::OperandShape {
                opcode,
                format,
                index,
            } => write!(
                f,
                "operands of {} at index {} do not match format {}",
                opcode,
                index,
                format.name()
            ),
            Self::LiteralOutOfRange { opcode, value, bits } => write!(
                f,
                "literal {} does not fit the {}-bit field of {}",
                value, bits, opcode
            ),
        }
    }
}

impl std::error::Error for HandlerError {}

/// Check an instruction against its format's operand shape
pub(crate) fn check_shape(instruction: &Instruction, index: usize) -> HandlerResult<()> {
    if instruction.matches_format() {
        Ok(())
    } else {
        Err(shape_error(instruction, index))
    }
}

/// Register operand at `pos`, or a shape error
pub(crate) fn register_at(
    instruction: &Instruction,
    pos: usize,
    index: usize,
) -> HandlerResult<u16> {
    instruction
        .register(pos)
        .ok_or_else(|| shape_error(instruction, index))
}

/// Literal operand at `pos`, or a shape error
pub(crate) fn literal_at(
    instruction: &Instruction,
    pos: usize,
    index: usize,
) -> HandlerResult<i64> {
    instruction
        .literal(pos)
        .ok_or_else(|| shape_error(instruction, index))
}

fn shape_error(instruction: &Instruction, index: usize) -> HandlerError {
    let opcode = instruction.opcode();
    HandlerError::OperandShape {
        opcode,
        format: opcode.format(),
        index,
    }
}

/// Check that `value` fits a signed field of `bits` bits
pub(crate) fn check_literal(opcode: Opcode, value: i64, bits: u32) -> HandlerResult<()> {
    let fits = bits >= 64 || {
        let min = -(1i64 << (bits - 1));
        let max = (1i64 << (bits - 1)) - 1;
        (min..=max).contains(&value)
    };
    if fits {
        Ok(())
    } else {
        Err(HandlerError::LiteralOutOfRange { opcode, value, bits })
    }
}

/// An executable handler bound to one instruction position
#[derive(Debug, Clone, PartialEq)]
pub enum OpHandler {
    BinaryMath(BinaryMathOp),
    Const(ConstOp),
    Unimplemented(UnimplementedOp),
}

impl OpHandler {
    /// Position of the instruction within its method body
    pub fn index(&self) -> usize {
        match self {
            Self::BinaryMath(op) => op.index(),
            Self::Const(op) => op.index(),
            Self::Unimplemented(op) => op.index(),
        }
    }

    /// The instruction this handler was built from
    pub fn instruction(&self) -> &Instruction {
        match self {
            Self::BinaryMath(op) => op.instruction(),
            Self::Const(op) => op.instruction(),
            Self::Unimplemented(op) => op.instruction(),
        }
    }

    pub fn category(&self) -> OpcodeCategory {
        match self {
            Self::BinaryMath(_) => OpcodeCategory::BinaryArithmetic,
            Self::Const(_) => OpcodeCategory::Constant,
            Self::Unimplemented(_) => OpcodeCategory::Unimplemented,
        }
    }

    /// Apply the instruction's effect to `state`
    pub fn execute(&self, state: &mut MethodState) -> ExecResult<Step> {
        match self {
            Self::BinaryMath(op) => op.execute(state),
            Self::Const(op) => op.execute(state),
            Self::Unimplemented(op) => op.execute(state),
        }
    }

    /// Diagnostic for handlers that stand in for missing semantics
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::Unimplemented(op) => Some(op.diagnostic()),
            _ => None,
        }
    }

    pub fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented(_))
    }
}

impl fmt::Display for OpHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>4}: {} [{}]", self.index(), self.instruction(), self.category())
    }
}

/// What the dispatcher produced for one instruction
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// A handler the execution loop can invoke
    Handler(OpHandler),
    /// The opcode is classified, but its category has no factory yet
    NotWired {
        category: OpcodeCategory,
        opcode: Opcode,
        index: usize,
    },
}

impl Dispatch {
    pub fn handler(&self) -> Option<&OpHandler> {
        match self {
            Self::Handler(h) => Some(h),
            Self::NotWired { .. } => None,
        }
    }

    pub fn into_handler(self) -> Option<OpHandler> {
        match self {
            Self::Handler(h) => Some(h),
            Self::NotWired { .. } => None,
        }
    }

    pub fn is_not_wired(&self) -> bool {
        matches!(self, Self::NotWired { .. })
    }

    /// Diagnostic for the fallback handler or a not-wired category
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        match self {
            Self::Handler(h) => h.diagnostic(),
            Self::NotWired {
                category,
                opcode,
                index,
            } => Some(Diagnostic {
                index: *index,
                opcode: *opcode,
                kind: DiagnosticKind::NotWired(*category),
            }),
        }
    }
}

/// Kind of a non-fatal dispatch diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Fallback handler installed
    Unimplemented(UnimplementedReason),
    /// No handler, category factory missing
    NotWired(OpcodeCategory),
}

/// Non-fatal report about an instruction without real semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub index: usize,
    pub opcode: Opcode,
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DiagnosticKind::Unimplemented(reason) => {
                write!(f, "index {}: {} is {}", self.index, self.opcode, reason)
            }
            DiagnosticKind::NotWired(category) => write!(
                f,
                "index {}: {} is {} but has no handler factory",
                self.index, self.opcode, category
            ),
        }
    }
}
