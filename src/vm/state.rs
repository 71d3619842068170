//! Register file for one method invocation.

use super::types::{ExecError, ExecResult, Value};

/// Simulated register state of a method
///
/// Every register starts out `Unknown`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodState {
    registers: Vec<Value>,
}

impl MethodState {
    /// Create a register file with `register_count` unknown registers
    pub fn new(register_count: usize) -> Self {
        Self {
            registers: vec![Value::Unknown; register_count],
        }
    }

    #[inline]
    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn registers(&self) -> &[Value] {
        &self.registers
    }

    /// Read a register
    pub fn read(&self, register: u16) -> ExecResult<&Value> {
        self.registers
            .get(register as usize)
            .ok_or(ExecError::InvalidRegister {
                register,
                count: self.registers.len(),
            })
    }

    /// Overwrite a register
    pub fn assign(&mut self, register: u16, value: Value) -> ExecResult<()> {
        let count = self.registers.len();
        let slot = self
            .registers
            .get_mut(register as usize)
            .ok_or(ExecError::InvalidRegister { register, count })?;
        *slot = value;
        Ok(())
    }
}
