//! Opcode classification
//!
//! Maps every opcode to the semantic family whose factory builds its handler.
//! Classification is total: an opcode without an explicit arm still resolves
//! to [`OpcodeCategory::Unimplemented`], and [`unimplemented_reason`] tells
//! such gaps apart from opcodes that are deliberately unsupported.
//!
//! The const family is listed as unimplemented. The dispatcher moves it to
//! [`OpcodeCategory::Constant`] only when `fold_constants` is set, see
//! [`dispatch_category`].

use std::fmt;

use super::constant::is_const;
use crate::bytecode::Opcode;
use crate::config::SimplifyConfig;

/// Semantic family of an opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeCategory {
    /// Two-operand integer and floating point arithmetic, including `/2addr`
    /// and literal forms
    BinaryArithmetic,
    /// Loads of literals, strings and classes into a register
    Constant,
    /// `if-*` and `if-*z` branches
    ConditionalBranch,
    /// No semantic handler exists for the opcode
    Unimplemented,
}

impl OpcodeCategory {
    pub fn name(self) -> &'static str {
        match self {
            Self::BinaryArithmetic => "binary-arithmetic",
            Self::Constant => "constant",
            Self::ConditionalBranch => "conditional-branch",
            Self::Unimplemented => "unimplemented",
        }
    }
}

impl fmt::Display for OpcodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why an opcode ended up in [`OpcodeCategory::Unimplemented`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnimplementedReason {
    /// The opcode is listed explicitly as not yet supported
    Deliberate,
    /// No arm mentions the opcode; it reached the default arm
    Unclassified,
}

impl fmt::Display for UnimplementedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deliberate => f.write_str("not implemented"),
            Self::Unclassified => f.write_str("not classified"),
        }
    }
}

/// Classify an opcode. Pure and total.
#[inline]
pub fn classify(op: Opcode) -> OpcodeCategory {
    explicit_category(op).unwrap_or(OpcodeCategory::Unimplemented)
}

/// Category the dispatcher routes `op` to under `config`.
///
/// Same as [`classify`], except that `fold_constants` promotes the const
/// family to [`OpcodeCategory::Constant`].
pub fn dispatch_category(op: Opcode, config: &SimplifyConfig) -> OpcodeCategory {
    if config.fold_constants && is_const(op) {
        OpcodeCategory::Constant
    } else {
        classify(op)
    }
}

/// Reason for an `Unimplemented` classification, `None` for any other category
pub fn unimplemented_reason(op: Opcode) -> Option<UnimplementedReason> {
    match explicit_category(op) {
        None => Some(UnimplementedReason::Unclassified),
        Some(OpcodeCategory::Unimplemented) => Some(UnimplementedReason::Deliberate),
        Some(_) => None,
    }
}

/// The explicit classification table. `None` means no arm names the opcode.
///
/// Each opcode appears in at most one arm; a duplicate is an unreachable
/// pattern.
pub fn explicit_category(op: Opcode) -> Option<OpcodeCategory> {
    use Opcode::*;

    let category = match op {
        AddInt | SubInt | MulInt | DivInt | RemInt | AndInt | OrInt | XorInt | ShlInt | ShrInt
        | UshrInt | AddLong | SubLong | MulLong | DivLong | RemLong | AndLong | OrLong
        | XorLong | ShlLong | ShrLong | UshrLong | AddFloat | SubFloat | MulFloat | DivFloat
        | RemFloat | AddDouble | SubDouble | MulDouble | DivDouble | RemDouble => {
            OpcodeCategory::BinaryArithmetic
        }
        AddInt2Addr | SubInt2Addr | MulInt2Addr | DivInt2Addr | RemInt2Addr | AndInt2Addr
        | OrInt2Addr | XorInt2Addr | ShlInt2Addr | ShrInt2Addr | UshrInt2Addr | AddLong2Addr
        | SubLong2Addr | MulLong2Addr | DivLong2Addr | RemLong2Addr | AndLong2Addr
        | OrLong2Addr | XorLong2Addr | ShlLong2Addr | ShrLong2Addr | UshrLong2Addr
        | AddFloat2Addr | SubFloat2Addr | MulFloat2Addr | DivFloat2Addr | RemFloat2Addr
        | AddDouble2Addr | SubDouble2Addr | MulDouble2Addr | DivDouble2Addr
        | RemDouble2Addr => OpcodeCategory::BinaryArithmetic,
        AddIntLit16 | RsubInt | MulIntLit16 | DivIntLit16 | RemIntLit16 | AndIntLit16
        | OrIntLit16 | XorIntLit16 | AddIntLit8 | RsubIntLit8 | MulIntLit8 | DivIntLit8
        | RemIntLit8 | AndIntLit8 | OrIntLit8 | XorIntLit8 | ShlIntLit8 | ShrIntLit8
        | UshrIntLit8 => OpcodeCategory::BinaryArithmetic,

        IfEq | IfNe | IfLt | IfGe | IfGt | IfLe | IfEqz | IfNez | IfLtz | IfGez | IfGtz
        | IfLez => OpcodeCategory::ConditionalBranch,

        // ConstOp exists but stays off unless `fold_constants` is set
        Const4 | Const16 | Const | ConstHigh16 | ConstWide16 | ConstWide32 | ConstWide
        | ConstWideHigh16 | ConstString | ConstStringJumbo | ConstClass => {
            OpcodeCategory::Unimplemented
        }

        // Known opcodes without semantics yet
        Aget | AgetWide | AgetObject | AgetBoolean | AgetByte | AgetChar | AgetShort => {
            OpcodeCategory::Unimplemented
        }
        Aput | AputWide | AputObject | AputBoolean | AputByte | AputChar | AputShort => {
            OpcodeCategory::Unimplemented
        }
        ArrayLength | ArrayPayload | CheckCast => OpcodeCategory::Unimplemented,
        CmplFloat | CmpgFloat | CmplDouble | CmpgDouble | CmpLong => OpcodeCategory::Unimplemented,
        IntToLong | IntToFloat | IntToDouble | LongToInt | LongToFloat | LongToDouble
        | FloatToInt | FloatToLong | FloatToDouble | DoubleToInt | DoubleToLong | DoubleToFloat
        | IntToByte | IntToChar | IntToShort => OpcodeCategory::Unimplemented,
        FilledNewArray | FilledNewArrayRange | FillArrayData => OpcodeCategory::Unimplemented,
        Goto | Goto16 | Goto32 => OpcodeCategory::Unimplemented,
        Iget | IgetWide | IgetObject | IgetBoolean | IgetByte | IgetChar | IgetShort => {
            OpcodeCategory::Unimplemented
        }
        InstanceOf => OpcodeCategory::Unimplemented,
        InvokeVirtual | InvokeSuper | InvokeDirect | InvokeStatic | InvokeInterface
        | InvokeVirtualRange | InvokeSuperRange | InvokeDirectRange | InvokeStaticRange
        | InvokeInterfaceRange => OpcodeCategory::Unimplemented,
        Iput | IputWide | IputObject | IputBoolean | IputByte | IputChar | IputShort => {
            OpcodeCategory::Unimplemented
        }
        MonitorEnter | MonitorExit => OpcodeCategory::Unimplemented,
        Move | MoveFrom16 | Move16 | MoveWide | MoveWideFrom16 | MoveWide16 | MoveObject
        | MoveObjectFrom16 | MoveObject16 => OpcodeCategory::Unimplemented,
        MoveException | MoveResult | MoveResultWide | MoveResultObject => {
            OpcodeCategory::Unimplemented
        }
        NegInt | NotInt | NegLong | NotLong | NegFloat | NegDouble => {
            OpcodeCategory::Unimplemented
        }
        NewArray | NewInstance | Nop => OpcodeCategory::Unimplemented,
        PackedSwitch | PackedSwitchPayload | SparseSwitch | SparseSwitchPayload => {
            OpcodeCategory::Unimplemented
        }
        Return | ReturnWide | ReturnObject | ReturnVoid => OpcodeCategory::Unimplemented,
        Sget | SgetWide | SgetObject | SgetBoolean | SgetByte | SgetChar | SgetShort => {
            OpcodeCategory::Unimplemented
        }
        Sput | SputWide | SputObject | SputBoolean | SputByte | SputChar | SputShort => {
            OpcodeCategory::Unimplemented
        }
        Throw => OpcodeCategory::Unimplemented,

        // invoke-polymorphic/custom, method handle constants and the ART
        // quickened opcodes have not been looked at yet
        _ => return None,
    };

    Some(category)
}
