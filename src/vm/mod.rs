//! Virtual machine context and simulated state
//!
//! The execution loop itself lives outside this crate. What handlers need
//! from it is collected here:
//! - `types`: register values, execution errors and step outcomes
//! - `state`: the register file handlers read and write
//!
//! [`VmContext`] is the read-only context the dispatcher passes to every
//! category factory.

use std::sync::Arc;

use crate::config::SimplifyConfig;

mod state;
mod types;

pub use state::MethodState;
pub use types::{ExecError, ExecResult, Step, Value};

/// Read-only context shared by all factories working on one method
///
/// Cloning is cheap; the configuration is shared.
#[derive(Debug, Clone)]
pub struct VmContext {
    method_descriptor: String,
    config: Arc<SimplifyConfig>,
}

impl VmContext {
    /// Create a context for the method `method_descriptor`
    /// (`Lcom/example/Foo;->bar(I)I`)
    pub fn new(method_descriptor: impl Into<String>, config: Arc<SimplifyConfig>) -> Self {
        Self {
            method_descriptor: method_descriptor.into(),
            config,
        }
    }

    /// Same configuration, different method
    pub fn for_method(&self, method_descriptor: impl Into<String>) -> Self {
        Self {
            method_descriptor: method_descriptor.into(),
            config: Arc::clone(&self.config),
        }
    }

    pub fn method_descriptor(&self) -> &str {
        &self.method_descriptor
    }

    pub fn config(&self) -> &SimplifyConfig {
        &self.config
    }

    /// Allocate a register file, enforcing `max_registers`
    pub fn new_state(&self, register_count: usize) -> ExecResult<MethodState> {
        if register_count > self.config.max_registers {
            return Err(ExecError::TooManyRegisters {
                requested: register_count,
                max: self.config.max_registers,
            });
        }
        Ok(MethodState::new(register_count))
    }
}

impl Default for VmContext {
    fn default() -> Self {
        Self::new("", Arc::new(SimplifyConfig::default()))
    }
}
