//! Fallback handler for opcodes without semantics.
//!
//! Installing this handler keeps one unsupported instruction from failing
//! the whole method. Executing it reports [`Step::Unsupported`] and the
//! execution loop decides what that means. A destination register the
//! instruction would have written becomes unknown, so no stale value
//! survives it.

use super::category::{unimplemented_reason, UnimplementedReason};
use super::{Diagnostic, DiagnosticKind};
use crate::bytecode::Instruction;
use crate::vm::{ExecResult, MethodState, Step, Value};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnimplementedOp {
    instruction: Instruction,
    index: usize,
    reason: UnimplementedReason,
}

impl UnimplementedOp {
    /// Build the fallback for `instruction` at `index`. Never fails.
    pub fn create(instruction: &Instruction, index: usize) -> Self {
        // a classified opcode routed here on purpose still counts as deliberate
        let reason =
            unimplemented_reason(instruction.opcode()).unwrap_or(UnimplementedReason::Deliberate);
        Self {
            instruction: instruction.clone(),
            index,
            reason,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub fn reason(&self) -> UnimplementedReason {
        self.reason
    }

    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic {
            index: self.index,
            opcode: self.instruction.opcode(),
            kind: DiagnosticKind::Unimplemented(self.reason),
        }
    }

    /// Forget the destination register, if the opcode has one
    pub fn execute(&self, state: &mut MethodState) -> ExecResult<Step> {
        if self.instruction.opcode().writes_register() {
            if let Some(dest) = self.instruction.register(0) {
                state.assign(dest, Value::Unknown)?;
            }
        }
        Ok(Step::Unsupported)
    }
}
