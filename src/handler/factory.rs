//! Handler dispatcher
//!
//! Classifies an instruction and hands it, unchanged, to the factory of its
//! category. The dispatcher itself holds no state and can be shared freely
//! between threads and methods.

use tracing::trace;

use super::binary_math::BinaryMathOp;
use super::category::{dispatch_category, OpcodeCategory};
use super::constant::ConstOp;
use super::unimplemented::UnimplementedOp;
use super::{Dispatch, HandlerResult, OpHandler};
use crate::bytecode::Instruction;
use crate::vm::VmContext;

/// Builds the handler for each instruction of a method body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpHandlerFactory;

impl OpHandlerFactory {
    pub fn new() -> Self {
        Self
    }

    /// Create the handler for `instruction` at position `index`.
    ///
    /// Opcodes with no semantics get the unimplemented fallback handler, as
    /// does the const family unless the context's configuration sets
    /// `fold_constants`.
    /// A classified category without a factory yields
    /// [`Dispatch::NotWired`] instead of a handler. Errors come only from
    /// the category factory rejecting the instruction.
    pub fn create(
        &self,
        ctx: &VmContext,
        instruction: &Instruction,
        index: usize,
    ) -> HandlerResult<Dispatch> {
        let opcode = instruction.opcode();
        let category = dispatch_category(opcode, ctx.config());

        trace!(
            target: "dexsimplify::handler::dispatch",
            method = ctx.method_descriptor(),
            index,
            opcode = %opcode,
            category = %category,
            "dispatch"
        );

        let handler = match category {
            OpcodeCategory::BinaryArithmetic => {
                OpHandler::BinaryMath(BinaryMathOp::create(instruction, index)?)
            }
            OpcodeCategory::Constant => OpHandler::Const(ConstOp::create(instruction, index)?),
            OpcodeCategory::Unimplemented => {
                OpHandler::Unimplemented(UnimplementedOp::create(instruction, index))
            }
            // TODO: route to a branch handler once if-* semantics exist
            OpcodeCategory::ConditionalBranch => {
                return Ok(Dispatch::NotWired {
                    category,
                    opcode,
                    index,
                })
            }
        };

        Ok(Dispatch::Handler(handler))
    }
}
