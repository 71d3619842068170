//! Binary arithmetic handlers
//!
//! Handles the `binop`, `binop/2addr`, `binop/lit16` and `binop/lit8`
//! families for int, long, float and double operands.

use std::fmt;

use tracing::trace;

use super::category::OpcodeCategory;
use super::{check_literal, check_shape, literal_at, register_at, HandlerError, HandlerResult};
use crate::bytecode::{Instruction, Opcode};
use crate::vm::{ExecError, ExecResult, MethodState, Step, Value};

/// Arithmetic or bitwise operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Ushr,
    /// Reverse subtract: `literal - register`
    Rsub,
}

impl BinaryOperator {
    #[inline]
    pub fn is_shift(self) -> bool {
        matches!(self, Self::Shl | Self::Shr | Self::Ushr)
    }
}

/// Operand type of the operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandType {
    Int,
    Long,
    Float,
    Double,
}

impl OperandType {
    fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

/// Operand layout of the instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandForm {
    /// `op vA, vB, vC`: `vA = vB op vC`
    ThreeReg,
    /// `op/2addr vA, vB`: `vA = vA op vB`
    TwoAddr,
    /// `op/lit vA, vB, #+C`: `vA = vB op C`
    Literal,
}

/// Right-hand operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Register(u16),
    Literal(i32),
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(r) => write!(f, "v{}", r),
            Self::Literal(n) => write!(f, "#{}", n),
        }
    }
}

// Operator order inside each type block of the binop and binop/2addr ranges
const BLOCK_OPERATORS: [BinaryOperator; 11] = [
    BinaryOperator::Add,
    BinaryOperator::Sub,
    BinaryOperator::Mul,
    BinaryOperator::Div,
    BinaryOperator::Rem,
    BinaryOperator::And,
    BinaryOperator::Or,
    BinaryOperator::Xor,
    BinaryOperator::Shl,
    BinaryOperator::Shr,
    BinaryOperator::Ushr,
];

// Operator order of binop/lit16 (first 8) and binop/lit8
const LITERAL_OPERATORS: [BinaryOperator; 11] = [
    BinaryOperator::Add,
    BinaryOperator::Rsub,
    BinaryOperator::Mul,
    BinaryOperator::Div,
    BinaryOperator::Rem,
    BinaryOperator::And,
    BinaryOperator::Or,
    BinaryOperator::Xor,
    BinaryOperator::Shl,
    BinaryOperator::Shr,
    BinaryOperator::Ushr,
];

/// Decode operator, operand type and form from an opcode.
///
/// Returns `None` for anything outside the binary arithmetic ranges
/// (`0x90..=0xe2`).
pub fn decode(op: Opcode) -> Option<(BinaryOperator, OperandType, OperandForm)> {
    let value = op.value();
    match value {
        0x90..=0xaf => {
            let (operator, ty) = decode_block(value - 0x90);
            Some((operator, ty, OperandForm::ThreeReg))
        }
        0xb0..=0xcf => {
            let (operator, ty) = decode_block(value - 0xb0);
            Some((operator, ty, OperandForm::TwoAddr))
        }
        0xd0..=0xd7 => Some((
            LITERAL_OPERATORS[(value - 0xd0) as usize],
            OperandType::Int,
            OperandForm::Literal,
        )),
        0xd8..=0xe2 => Some((
            LITERAL_OPERATORS[(value - 0xd8) as usize],
            OperandType::Int,
            OperandForm::Literal,
        )),
        _ => None,
    }
}

// Each 32-opcode range holds 11 int, 11 long, 5 float and 5 double operators
fn decode_block(offset: u16) -> (BinaryOperator, OperandType) {
    let offset = offset as usize;
    match offset {
        0..=10 => (BLOCK_OPERATORS[offset], OperandType::Int),
        11..=21 => (BLOCK_OPERATORS[offset - 11], OperandType::Long),
        22..=26 => (BLOCK_OPERATORS[offset - 22], OperandType::Float),
        _ => (BLOCK_OPERATORS[offset - 27], OperandType::Double),
    }
}

/// Handler for one binary arithmetic instruction
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryMathOp {
    instruction: Instruction,
    index: usize,
    operator: BinaryOperator,
    operand_type: OperandType,
    form: OperandForm,
    dest: u16,
    lhs: u16,
    rhs: Source,
}

impl BinaryMathOp {
    /// Build the handler for `instruction` at `index`
    pub fn create(instruction: &Instruction, index: usize) -> HandlerResult<Self> {
        let opcode = instruction.opcode();
        let (operator, operand_type, form) =
            decode(opcode).ok_or(HandlerError::CategoryMismatch {
                opcode,
                expected: OpcodeCategory::BinaryArithmetic,
            })?;
        check_shape(instruction, index)?;

        let dest = register_at(instruction, 0, index)?;
        let (lhs, rhs) = match form {
            OperandForm::ThreeReg => (
                register_at(instruction, 1, index)?,
                Source::Register(register_at(instruction, 2, index)?),
            ),
            OperandForm::TwoAddr => (dest, Source::Register(register_at(instruction, 1, index)?)),
            OperandForm::Literal => {
                let literal = literal_at(instruction, 2, index)?;
                let bits = opcode.format().literal_bits().unwrap_or(16);
                check_literal(opcode, literal, bits)?;
                // lit8 and lit16 both fit i32 after the range check
                (register_at(instruction, 1, index)?, Source::Literal(literal as i32))
            }
        };

        Ok(Self {
            instruction: instruction.clone(),
            index,
            operator,
            operand_type,
            form,
            dest,
            lhs,
            rhs,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    pub fn operator(&self) -> BinaryOperator {
        self.operator
    }

    pub fn operand_type(&self) -> OperandType {
        self.operand_type
    }

    pub fn form(&self) -> OperandForm {
        self.form
    }

    pub fn dest(&self) -> u16 {
        self.dest
    }

    pub fn lhs(&self) -> u16 {
        self.lhs
    }

    pub fn rhs(&self) -> Source {
        self.rhs
    }

    /// Compute the result and store it in the destination register.
    ///
    /// An unknown operand makes the result unknown.
    pub fn execute(&self, state: &mut MethodState) -> ExecResult<Step> {
        let a = state.read(self.lhs)?.clone();
        let b = match self.rhs {
            Source::Register(r) => state.read(r)?.clone(),
            Source::Literal(n) => Value::Int(n),
        };

        let result = if a.is_known() && b.is_known() {
            self.compute(&a, &b)?
        } else {
            Value::Unknown
        };

        trace!(
            target: "dexsimplify::handler::exec",
            index = self.index,
            opcode = %self.instruction.opcode(),
            result = %result,
            "binary op"
        );
        state.assign(self.dest, result)?;
        Ok(Step::Next)
    }

    fn compute(&self, a: &Value, b: &Value) -> ExecResult<Value> {
        let rhs_register = match self.rhs {
            Source::Register(r) => r,
            // literals are ints, so they never fail the type check below
            Source::Literal(_) => self.lhs,
        };

        let value = match self.operand_type {
            OperandType::Int => {
                let x = expect_int(a, self.lhs)?;
                let y = expect_int(b, rhs_register)?;
                Value::Int(int_op(self.operator, x, y)?)
            }
            OperandType::Long => {
                let x = expect_long(a, self.lhs)?;
                if self.operator.is_shift() {
                    let y = expect_int(b, rhs_register)?;
                    Value::Long(long_shift(self.operator, x, y))
                } else {
                    let y = expect_long(b, rhs_register)?;
                    Value::Long(long_op(self.operator, x, y)?)
                }
            }
            OperandType::Float => {
                let x = expect_float(a, self.lhs)?;
                let y = expect_float(b, rhs_register)?;
                Value::Float(float_op(self.operator, x, y))
            }
            OperandType::Double => {
                let x = expect_double(a, self.lhs)?;
                let y = expect_double(b, rhs_register)?;
                Value::Double(double_op(self.operator, x, y))
            }
        };
        Ok(value)
    }
}

impl fmt::Display for BinaryMathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} = v{} {:?} {} ({})",
            self.dest,
            self.lhs,
            self.operator,
            self.rhs,
            self.operand_type.name()
        )
    }
}

fn type_error(register: u16, expected: &'static str, got: &Value) -> ExecError {
    ExecError::TypeError {
        register,
        expected,
        got: got.type_name(),
    }
}

// Registers are untyped: a narrow register holds 32 bits and a wide one
// 64, whichever instruction wrote them. Only the width has to match.

fn expect_int(value: &Value, register: u16) -> ExecResult<i32> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Float(f) => Ok(f.to_bits() as i32),
        other => Err(type_error(register, "int", other)),
    }
}

fn expect_long(value: &Value, register: u16) -> ExecResult<i64> {
    match value {
        Value::Long(n) => Ok(*n),
        Value::Double(d) => Ok(d.to_bits() as i64),
        other => Err(type_error(register, "long", other)),
    }
}

fn expect_float(value: &Value, register: u16) -> ExecResult<f32> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Int(n) => Ok(f32::from_bits(*n as u32)),
        other => Err(type_error(register, "float", other)),
    }
}

fn expect_double(value: &Value, register: u16) -> ExecResult<f64> {
    match value {
        Value::Double(d) => Ok(*d),
        Value::Long(n) => Ok(f64::from_bits(*n as u64)),
        other => Err(type_error(register, "double", other)),
    }
}

fn int_op(op: BinaryOperator, x: i32, y: i32) -> ExecResult<i32> {
    use BinaryOperator::*;

    let result = match op {
        Add => x.wrapping_add(y),
        Sub => x.wrapping_sub(y),
        Rsub => y.wrapping_sub(x),
        Mul => x.wrapping_mul(y),
        Div | Rem if y == 0 => return Err(ExecError::DivisionByZero),
        // i32::MIN / -1 wraps to i32::MIN, i32::MIN % -1 is 0
        Div => x.wrapping_div(y),
        Rem => x.wrapping_rem(y),
        And => x & y,
        Or => x | y,
        Xor => x ^ y,
        Shl => x << (y & 0x1f),
        Shr => x >> (y & 0x1f),
        Ushr => ((x as u32) >> (y & 0x1f)) as i32,
    };
    Ok(result)
}

fn long_op(op: BinaryOperator, x: i64, y: i64) -> ExecResult<i64> {
    use BinaryOperator::*;

    let result = match op {
        Add => x.wrapping_add(y),
        Sub => x.wrapping_sub(y),
        Mul => x.wrapping_mul(y),
        Div | Rem if y == 0 => return Err(ExecError::DivisionByZero),
        Div => x.wrapping_div(y),
        Rem => x.wrapping_rem(y),
        And => x & y,
        Or => x | y,
        Xor => x ^ y,
        Shl | Shr | Ushr => long_shift(op, x, y as i32),
        Rsub => unreachable!("long_op called with int-only operator: {:?}", op),
    };
    Ok(result)
}

// The shift amount of a long shift is an int register
fn long_shift(op: BinaryOperator, x: i64, y: i32) -> i64 {
    let amount = y & 0x3f;
    match op {
        BinaryOperator::Shl => x << amount,
        BinaryOperator::Shr => x >> amount,
        BinaryOperator::Ushr => ((x as u64) >> amount) as i64,
        _ => unreachable!("long_shift called with non-shift operator: {:?}", op),
    }
}

fn float_op(op: BinaryOperator, x: f32, y: f32) -> f32 {
    match op {
        BinaryOperator::Add => x + y,
        BinaryOperator::Sub => x - y,
        BinaryOperator::Mul => x * y,
        BinaryOperator::Div => x / y,
        // truncated remainder, same as Java's %
        BinaryOperator::Rem => x % y,
        _ => unreachable!("float_op called with non-float operator: {:?}", op),
    }
}

fn double_op(op: BinaryOperator, x: f64, y: f64) -> f64 {
    match op {
        BinaryOperator::Add => x + y,
        BinaryOperator::Sub => x - y,
        BinaryOperator::Mul => x * y,
        BinaryOperator::Div => x / y,
        BinaryOperator::Rem => x % y,
        _ => unreachable!("double_op called with non-double operator: {:?}", op),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::Operand;
    use crate::handler::category::classify;

    fn three(op: Opcode, a: u16, b: u16, c: u16) -> Instruction {
        Instruction::new(
            op,
            [Operand::Register(a), Operand::Register(b), Operand::Register(c)],
        )
    }

    fn two(op: Opcode, a: u16, b: u16) -> Instruction {
        Instruction::new(op, [Operand::Register(a), Operand::Register(b)])
    }

    fn lit(op: Opcode, a: u16, b: u16, n: i64) -> Instruction {
        Instruction::new(op, [Operand::Register(a), Operand::Register(b), Operand::Literal(n)])
    }

    fn run(insn: &Instruction, regs: &[Value]) -> ExecResult<MethodState> {
        let mut state = MethodState::new(regs.len().max(4));
        for (i, v) in regs.iter().enumerate() {
            state.assign(i as u16, v.clone())?;
        }
        let op = BinaryMathOp::create(insn, 0).expect("create");
        assert_eq!(op.execute(&mut state)?, Step::Next);
        Ok(state)
    }

    /// `op v0, v1, v2` with v1 = `x` and v2 = `y`, returning v0
    fn run3(op: Opcode, x: Value, y: Value) -> ExecResult<Value> {
        let state = run(&three(op, 0, 1, 2), &[Value::Unknown, x, y])?;
        Ok(state.read(0)?.clone())
    }

    /// `op/2addr v0, v1` with v0 = `x` and v1 = `y`, returning v0
    fn run2(op: Opcode, x: Value, y: Value) -> ExecResult<Value> {
        let state = run(&two(op, 0, 1), &[x, y])?;
        Ok(state.read(0)?.clone())
    }

    /// `op/lit v0, v1, n` with v1 = `x`, returning v0
    fn run_lit(op: Opcode, x: Value, n: i64) -> ExecResult<Value> {
        let state = run(&lit(op, 0, 1, n), &[Value::Unknown, x])?;
        Ok(state.read(0)?.clone())
    }

    #[test]
    fn test_decode_agrees_with_classifier() {
        for &op in Opcode::ALL {
            let arithmetic = classify(op) == OpcodeCategory::BinaryArithmetic;
            assert_eq!(decode(op).is_some(), arithmetic, "{}", op);
        }
    }

    #[test]
    fn test_decode_samples() {
        use BinaryOperator as B;
        use OperandForm as F;
        use OperandType as T;

        assert_eq!(decode(Opcode::AddInt), Some((B::Add, T::Int, F::ThreeReg)));
        assert_eq!(decode(Opcode::UshrLong), Some((B::Ushr, T::Long, F::ThreeReg)));
        assert_eq!(decode(Opcode::RemFloat), Some((B::Rem, T::Float, F::ThreeReg)));
        assert_eq!(decode(Opcode::AddDouble), Some((B::Add, T::Double, F::ThreeReg)));
        assert_eq!(decode(Opcode::DivDouble2Addr), Some((B::Div, T::Double, F::TwoAddr)));
        assert_eq!(decode(Opcode::ShlLong2Addr), Some((B::Shl, T::Long, F::TwoAddr)));
        assert_eq!(decode(Opcode::RsubInt), Some((B::Rsub, T::Int, F::Literal)));
        assert_eq!(decode(Opcode::XorIntLit16), Some((B::Xor, T::Int, F::Literal)));
        assert_eq!(decode(Opcode::UshrIntLit8), Some((B::Ushr, T::Int, F::Literal)));
        assert_eq!(decode(Opcode::IgetQuick), None);
        assert_eq!(decode(Opcode::IntToShort), None);
    }

    #[test]
    fn test_decode_names_match_mnemonics() {
        for &op in Opcode::ALL {
            if let Some((operator, ty, form)) = decode(op) {
                let mnemonic = op.mnemonic();
                let expected_op = format!("{:?}", operator).to_ascii_lowercase();
                assert!(mnemonic.starts_with(&expected_op), "{} vs {:?}", mnemonic, operator);
                match form {
                    OperandForm::TwoAddr => assert!(mnemonic.ends_with("/2addr")),
                    OperandForm::Literal => {
                        assert!(mnemonic.contains("/lit") || op == Opcode::RsubInt)
                    }
                    OperandForm::ThreeReg => assert!(!mnemonic.contains('/')),
                }
                if operator != BinaryOperator::Rsub {
                    assert!(mnemonic.contains(ty.name()), "{} vs {:?}", mnemonic, ty);
                }
            }
        }
    }

    #[test]
    fn test_create_three_reg() {
        let op = BinaryMathOp::create(&three(Opcode::MulInt, 0, 1, 2), 7).unwrap();
        assert_eq!(op.index(), 7);
        assert_eq!(op.dest(), 0);
        assert_eq!(op.lhs(), 1);
        assert_eq!(op.rhs(), Source::Register(2));
        assert_eq!(op.form(), OperandForm::ThreeReg);
    }

    #[test]
    fn test_create_two_addr_reads_dest() {
        let op = BinaryMathOp::create(&two(Opcode::SubLong2Addr, 4, 6), 0).unwrap();
        assert_eq!(op.dest(), 4);
        assert_eq!(op.lhs(), 4);
        assert_eq!(op.rhs(), Source::Register(6));
    }

    #[test]
    fn test_create_rejects_other_categories() {
        let insn = Instruction::new(Opcode::Const4, [Operand::Register(0), Operand::Literal(1)]);
        assert_eq!(
            BinaryMathOp::create(&insn, 3),
            Err(HandlerError::CategoryMismatch {
                opcode: Opcode::Const4,
                expected: OpcodeCategory::BinaryArithmetic,
            })
        );
    }

    #[test]
    fn test_create_rejects_bad_shape() {
        let err = BinaryMathOp::create(&two(Opcode::AddInt, 0, 1), 2).unwrap_err();
        assert!(matches!(err, HandlerError::OperandShape { index: 2, .. }));
        let err = BinaryMathOp::create(&three(Opcode::AddIntLit8, 0, 1, 2), 0).unwrap_err();
        assert!(matches!(err, HandlerError::OperandShape { .. }));
    }

    #[test]
    fn test_create_checks_literal_width() {
        assert!(BinaryMathOp::create(&lit(Opcode::AddIntLit8, 0, 1, 127), 0).is_ok());
        assert!(BinaryMathOp::create(&lit(Opcode::AddIntLit8, 0, 1, -128), 0).is_ok());
        assert_eq!(
            BinaryMathOp::create(&lit(Opcode::AddIntLit8, 0, 1, 128), 0),
            Err(HandlerError::LiteralOutOfRange {
                opcode: Opcode::AddIntLit8,
                value: 128,
                bits: 8,
            })
        );
        assert!(BinaryMathOp::create(&lit(Opcode::AddIntLit16, 0, 1, 32767), 0).is_ok());
        assert!(BinaryMathOp::create(&lit(Opcode::AddIntLit16, 0, 1, 32768), 0).is_err());
    }

    #[test]
    fn test_int_arithmetic_wraps() {
        let sum = run3(Opcode::AddInt, Value::Int(i32::MAX), Value::Int(1));
        assert_eq!(sum, Ok(Value::Int(i32::MIN)));

        let product = run3(Opcode::MulInt, Value::Int(0x10000), Value::Int(0x10000));
        assert_eq!(product, Ok(Value::Int(0)));
    }

    #[test]
    fn test_int_division() {
        assert_eq!(run3(Opcode::DivInt, Value::Int(-7), Value::Int(2)), Ok(Value::Int(-3)));
        assert_eq!(run3(Opcode::RemInt, Value::Int(-7), Value::Int(2)), Ok(Value::Int(-1)));

        let quotient = run3(Opcode::DivInt, Value::Int(i32::MIN), Value::Int(-1));
        assert_eq!(quotient, Ok(Value::Int(i32::MIN)));

        let err = run3(Opcode::DivInt, Value::Int(1), Value::Int(0));
        assert_eq!(err, Err(ExecError::DivisionByZero));

        let err = run2(Opcode::RemLong2Addr, Value::Long(9), Value::Long(0));
        assert_eq!(err, Err(ExecError::DivisionByZero));
    }

    #[test]
    fn test_shifts_are_masked() {
        // int shift by 33 is a shift by 1
        assert_eq!(run3(Opcode::ShlInt, Value::Int(1), Value::Int(33)), Ok(Value::Int(2)));
        assert_eq!(run3(Opcode::UshrInt, Value::Int(-1), Value::Int(28)), Ok(Value::Int(0xf)));
        assert_eq!(run3(Opcode::ShrInt, Value::Int(-16), Value::Int(2)), Ok(Value::Int(-4)));

        // long shift amount comes from an int register, masked to 6 bits
        assert_eq!(run3(Opcode::ShlLong, Value::Long(1), Value::Int(65)), Ok(Value::Long(2)));
        let shifted = run3(Opcode::UshrLong, Value::Long(-1), Value::Int(60));
        assert_eq!(shifted, Ok(Value::Long(0xf)));
    }

    #[test]
    fn test_literal_forms() {
        assert_eq!(run_lit(Opcode::RsubIntLit8, Value::Int(3), 10), Ok(Value::Int(7)));
        assert_eq!(run_lit(Opcode::AddIntLit16, Value::Int(3), -5), Ok(Value::Int(-2)));
        assert_eq!(run_lit(Opcode::ShlIntLit8, Value::Int(1), 4), Ok(Value::Int(16)));
    }

    #[test]
    fn test_floating_point() {
        let rem = run3(Opcode::RemFloat, Value::Float(5.5), Value::Float(2.0));
        assert_eq!(rem, Ok(Value::Float(1.5)));

        let rem = run3(Opcode::RemDouble, Value::Double(-5.5), Value::Double(2.0));
        assert_eq!(rem, Ok(Value::Double(-1.5)));

        // no exception for floating point division by zero
        let quotient = run2(Opcode::DivDouble2Addr, Value::Double(1.0), Value::Double(0.0));
        assert_eq!(quotient, Ok(Value::Double(f64::INFINITY)));
    }

    #[test]
    fn test_floating_point_reads_raw_bits() {
        // const/high16 leaves 1.0f and 2.0f as int bit patterns
        let sum = run3(Opcode::AddFloat, Value::Int(0x3f80_0000), Value::Int(0x4000_0000));
        assert_eq!(sum, Ok(Value::Float(3.0)));

        let product = run2(
            Opcode::MulDouble2Addr,
            Value::Long(0x4004_0000_0000_0000),
            Value::Double(2.0),
        );
        assert_eq!(product, Ok(Value::Double(5.0)));

        // and the other way round: int ops see a float's bits
        let bits = run_lit(Opcode::XorIntLit16, Value::Float(1.0), 0);
        assert_eq!(bits, Ok(Value::Int(0x3f80_0000)));
    }

    #[test]
    fn test_unknown_propagates() {
        let sum = run3(Opcode::AddInt, Value::Unknown, Value::Int(1));
        assert_eq!(sum, Ok(Value::Unknown));

        // unknown divisor does not raise
        let quotient = run3(Opcode::DivInt, Value::Int(1), Value::Unknown);
        assert_eq!(quotient, Ok(Value::Unknown));
    }

    #[test]
    fn test_type_errors_name_register() {
        let err = run3(Opcode::AddInt, Value::Int(1), Value::Long(2));
        assert_eq!(
            err,
            Err(ExecError::TypeError {
                register: 2,
                expected: "int",
                got: "long",
            })
        );

        let err = run3(Opcode::AddFloat, Value::Double(1.0), Value::Float(2.0));
        assert_eq!(
            err,
            Err(ExecError::TypeError {
                register: 1,
                expected: "float",
                got: "double",
            })
        );
    }
}
