//! Type definitions for simulated method state.
//!
//! - Value: contents of one virtual register
//! - ExecError: errors raised while a handler runs
//! - Step: what a handler tells the execution loop after running

use std::fmt;

/// Result of handler execution
pub type ExecResult<T> = Result<T, ExecError>;

/// Contents of a virtual register
///
/// Wide values occupy a single slot here; register pairs are not modelled.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// A `java.lang.String` constant
    String(String),
    /// A `java.lang.Class` constant, by type descriptor
    Class(String),
    /// Not known at simplification time
    Unknown,
}

impl Value {
    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "String",
            Self::Class(_) => "Class",
            Self::Unknown => "unknown",
        }
    }

    #[inline]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Long(n) => write!(f, "{}L", n),
            Self::Float(x) => write!(f, "{}f", x),
            Self::Double(x) => write!(f, "{}d", x),
            Self::String(s) => write!(f, "{:?}", s),
            Self::Class(t) => write!(f, "{}.class", t),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// Errors that can occur while a handler runs
#[derive(Debug, Clone, PartialEq)]
pub enum ExecError {
    /// Register number outside the method's register file
    InvalidRegister { register: u16, count: usize },
    /// Register holds a value of the wrong type for the operation
    TypeError {
        register: u16,
        expected: &'static str,
        got: &'static str,
    },
    /// Integer division or remainder by zero (`ArithmeticException`)
    DivisionByZero,
    /// Method asks for more registers than the configuration allows
    TooManyRegisters { requested: usize, max: usize },
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidRegister { register, count } => {
                write!(f, "register v{} out of range (method has {})", register, count)
            }
            Self::TypeError {
                register,
                expected,
                got,
            } => write!(f, "type error in v{}: expected {}, got {}", register, expected, got),
            Self::DivisionByZero => write!(f, "division by zero"),
            Self::TooManyRegisters { requested, max } => {
                write!(f, "method requests {} registers, limit is {}", requested, max)
            }
        }
    }
}

impl std::error::Error for ExecError {}

/// Outcome of running one handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// State updated, continue with the next instruction
    Next,
    /// The handler has no semantics; state was left untouched
    Unsupported,
}
