//! dexsimplify - Dalvik instruction classification and handler dispatch
//!
//! This library decides, for each decoded instruction of a method body, which
//! semantic family it belongs to and builds the handler a simplifying
//! virtual machine invokes to update its simulated registers.
//!
//! # Architecture
//!
//! Data flows one direction:
//!
//! 1. **Instruction model** (`bytecode` module)
//!    - The full Dalvik opcode set, including quickened and payload opcodes
//!    - Instruction formats and operand shapes
//!
//! 2. **Classification and dispatch** (`handler` module)
//!    - `classify` maps every opcode to a category; it never fails
//!    - `OpHandlerFactory` routes an instruction to its category factory
//!    - Opcodes without semantics get a fallback handler, categories without
//!      a factory come back as `Dispatch::NotWired`
//!
//! 3. **Preparation** (`prepare` module)
//!    - Dispatches a whole method body and applies the diagnostic policy
//!    - Prepares many methods in parallel
//!
//! `listing` reads smali-style text into instructions; `vm` holds the
//! register state handlers operate on; `config` holds the settings.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use dexsimplify::{listing, prepare_method, OpHandlerFactory, SimplifyConfig, Value, VmContext};
//!
//! let insns = listing::parse_listing("const/4 v0, 0x3\nmul-int/lit8 v1, v0, 0x7").unwrap();
//! let config = SimplifyConfig::default().with_constant_folding();
//! let ctx = VmContext::new("LFoo;->bar()I", Arc::new(config));
//! let prepared = prepare_method(&OpHandlerFactory::new(), &ctx, &insns).unwrap();
//!
//! let mut state = ctx.new_state(2).unwrap();
//! prepared.execute_straight_line(&mut state).unwrap();
//! assert_eq!(state.read(1), Ok(&Value::Int(21)));
//! ```

pub mod bytecode;
pub mod config;
pub mod handler;
pub mod listing;
pub mod prepare;
pub mod vm;

pub use bytecode::{Instruction, Opcode, Operand};
pub use config::{ConfigError, DiagnosticPolicy, SimplifyConfig};
pub use handler::{
    classify, Diagnostic, DiagnosticKind, Dispatch, HandlerError, HandlerResult, OpHandler,
    OpHandlerFactory, OpcodeCategory, UnimplementedReason,
};
pub use listing::{parse_listing, parse_methods, ListingError, ListingResult};
pub use prepare::{
    prepare_method, prepare_methods, MethodBody, PrepareError, PrepareResult, PreparedMethod,
    StraightLineRun,
};
pub use vm::{ExecError, ExecResult, MethodState, Step, Value, VmContext};
