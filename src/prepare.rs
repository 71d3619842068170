//! Method preparation
//!
//! Runs the dispatcher over every instruction of a method body and applies
//! the configured [`DiagnosticPolicy`] to instructions that end up without
//! real semantics. The result is a [`PreparedMethod`] the execution loop can
//! index by instruction position.
//!
//! Several methods can be prepared at once with [`prepare_methods`], which
//! spreads the work over rayon's thread pool.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::bytecode::{Instruction, Operand};
use crate::config::DiagnosticPolicy;
use crate::handler::{Diagnostic, DiagnosticKind, Dispatch, HandlerError, OpHandlerFactory};
use crate::vm::{ExecResult, MethodState, Step, VmContext};

/// Result of method preparation
pub type PrepareResult<T> = Result<T, PrepareError>;

/// Errors that stop a method from being prepared
#[derive(Debug, Clone, PartialEq)]
pub enum PrepareError {
    /// A category factory rejected an instruction
    Construction {
        method: String,
        index: usize,
        source: HandlerError,
    },
    /// A diagnostic hit a policy set to `abort`
    Aborted { method: String, diagnostic: Diagnostic },
}

impl fmt::Display for PrepareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction {
                method,
                index,
                source,
            } => write!(f, "{}: cannot build handler at index {}: {}", method, index, source),
            Self::Aborted { method, diagnostic } => {
                write!(f, "{}: preparation aborted: {}", method, diagnostic)
            }
        }
    }
}

impl std::error::Error for PrepareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Construction { source, .. } => Some(source),
            Self::Aborted { .. } => None,
        }
    }
}

/// A method body awaiting preparation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodBody {
    pub descriptor: String,
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    pub fn new(descriptor: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            descriptor: descriptor.into(),
            instructions,
        }
    }

    /// Registers needed to run the body: highest register operand plus one
    pub fn register_count(&self) -> usize {
        self.instructions
            .iter()
            .flat_map(|insn| insn.operands())
            .filter_map(|op| match op {
                Operand::Register(r) => Some(*r as usize + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0)
    }
}

/// Outcome of straight-line execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StraightLineRun {
    /// Handlers that ran, including unsupported ones
    pub executed: usize,
    /// Handlers that reported `Step::Unsupported`
    pub unsupported: usize,
    /// Index of the not-wired instruction that ended the run, if any
    pub stopped_at: Option<usize>,
}

/// A method with one dispatch result per instruction
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMethod {
    method: String,
    ops: Vec<Dispatch>,
    diagnostics: Vec<Diagnostic>,
}

impl PreparedMethod {
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Dispatch results, indexed by instruction position
    pub fn ops(&self) -> &[Dispatch] {
        &self.ops
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn not_wired_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_not_wired()).count()
    }

    pub fn unimplemented_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| op.handler().is_some_and(|h| h.is_unimplemented()))
            .count()
    }

    /// Run the handlers in program order, ignoring control flow.
    ///
    /// Stops before the first not-wired instruction. Unsupported handlers
    /// leave the state as it is and the run continues.
    pub fn execute_straight_line(&self, state: &mut MethodState) -> ExecResult<StraightLineRun> {
        let mut run = StraightLineRun::default();
        for op in &self.ops {
            let handler = match op {
                Dispatch::Handler(h) => h,
                Dispatch::NotWired { index, .. } => {
                    run.stopped_at = Some(*index);
                    break;
                }
            };
            if handler.execute(state)? == Step::Unsupported {
                run.unsupported += 1;
            }
            run.executed += 1;
        }
        Ok(run)
    }
}

/// Prepare one method body
pub fn prepare_method(
    factory: &OpHandlerFactory,
    ctx: &VmContext,
    instructions: &[Instruction],
) -> PrepareResult<PreparedMethod> {
    let method = ctx.method_descriptor();
    let config = ctx.config();
    let mut ops = Vec::with_capacity(instructions.len());
    let mut diagnostics = Vec::new();

    for (index, instruction) in instructions.iter().enumerate() {
        let dispatch = factory
            .create(ctx, instruction, index)
            .map_err(|source| PrepareError::Construction {
                method: method.to_string(),
                index,
                source,
            })?;

        if let Some(diagnostic) = dispatch.diagnostic() {
            let policy = match diagnostic.kind {
                DiagnosticKind::Unimplemented(_) => config.unimplemented_policy,
                DiagnosticKind::NotWired(_) => config.not_wired_policy,
            };
            match policy {
                DiagnosticPolicy::Ignore => {}
                DiagnosticPolicy::Warn => {
                    warn!(
                        target: "dexsimplify::prepare",
                        method,
                        %diagnostic,
                        "instruction without handler semantics"
                    )
                }
                DiagnosticPolicy::Abort => {
                    return Err(PrepareError::Aborted {
                        method: method.to_string(),
                        diagnostic,
                    })
                }
            }
            diagnostics.push(diagnostic);
        }
        ops.push(dispatch);
    }

    let prepared = PreparedMethod {
        method: method.to_string(),
        ops,
        diagnostics,
    };
    debug!(
        target: "dexsimplify::prepare",
        method,
        instructions = prepared.len(),
        unimplemented = prepared.unimplemented_count(),
        not_wired = prepared.not_wired_count(),
        "prepared method"
    );
    Ok(prepared)
}

/// Prepare several method bodies in parallel.
///
/// Each body gets a context for its own descriptor sharing `ctx`'s
/// configuration. Results are in input order; one failing method does not
/// affect the others.
pub fn prepare_methods(
    factory: &OpHandlerFactory,
    ctx: &VmContext,
    bodies: &[MethodBody],
) -> Vec<PrepareResult<PreparedMethod>> {
    bodies
        .par_iter()
        .map(|body| {
            let ctx = ctx.for_method(body.descriptor.as_str());
            prepare_method(factory, &ctx, &body.instructions)
        })
        .collect()
}
