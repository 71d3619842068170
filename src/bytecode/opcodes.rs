//! Dalvik opcodes
//!
//! This module defines every instruction kind of the Dalvik instruction set as
//! produced by the dex decoder: the single-byte opcodes of dex 035-039, the ART
//! quickened opcodes that only appear in odex files, and the three payload
//! pseudo-instructions that live inside method bodies as data blocks.
//!
//! Opcodes are grouped by family in contiguous ranges, mirroring the dex
//! encoding, so that decoding a byte is a single table lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Instruction format, as named in the Dalvik executable format docs.
///
/// The format determines how many operands an instruction carries and of
/// which kind, which is what category factories check before building a
/// handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    F10x,
    F12x,
    F11n,
    F11x,
    F10t,
    F20t,
    F22x,
    F21t,
    F21s,
    F21h,
    F21c,
    F23x,
    F22b,
    F22t,
    F22s,
    F22c,
    F22cs,
    F32x,
    F30t,
    F31t,
    F31i,
    F31c,
    F35c,
    F35ms,
    F3rc,
    F3rms,
    F45cc,
    F4rcc,
    F51l,
    PackedSwitchPayload,
    SparseSwitchPayload,
    ArrayPayload,
}

/// Kind of a single operand slot in a fixed-shape format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// A virtual register `vN`
    Register,
    /// A signed literal
    Literal,
    /// A branch target (label or relative offset)
    Target,
    /// A constant pool reference (string, type, field, method, ...)
    Reference,
}

impl Format {
    /// Operand slots for fixed-shape formats.
    ///
    /// Returns `None` for register-list formats (`35c`, `3rc`, ...) and for
    /// payloads, whose operand count depends on the instruction.
    pub fn operand_kinds(self) -> Option<&'static [OperandKind]> {
        use OperandKind::*;
        let kinds: &'static [OperandKind] = match self {
            Self::F10x => &[],
            Self::F12x | Self::F22x | Self::F32x => &[Register, Register],
            Self::F11x => &[Register],
            Self::F11n | Self::F21s | Self::F21h | Self::F31i | Self::F51l => &[Register, Literal],
            Self::F10t | Self::F20t | Self::F30t => &[Target],
            Self::F21t | Self::F31t => &[Register, Target],
            Self::F21c | Self::F31c => &[Register, Reference],
            Self::F23x => &[Register, Register, Register],
            Self::F22b | Self::F22s => &[Register, Register, Literal],
            Self::F22t => &[Register, Register, Target],
            Self::F22c | Self::F22cs => &[Register, Register, Reference],
            Self::F35c | Self::F35ms | Self::F3rc | Self::F3rms | Self::F45cc | Self::F4rcc
            | Self::PackedSwitchPayload | Self::SparseSwitchPayload | Self::ArrayPayload => {
                return None
            }
        };
        Some(kinds)
    }

    /// Width in bits of the literal operand, if the format has one
    pub fn literal_bits(self) -> Option<u32> {
        match self {
            Self::F11n => Some(4),
            Self::F22b => Some(8),
            Self::F21s | Self::F21h | Self::F22s => Some(16),
            Self::F31i => Some(32),
            Self::F51l => Some(64),
            _ => None,
        }
    }

    /// Format name as written in the dex documentation (`"23x"`, `"22b"`, ...)
    pub fn name(self) -> &'static str {
        match self {
            Self::F10x => "10x",
            Self::F12x => "12x",
            Self::F11n => "11n",
            Self::F11x => "11x",
            Self::F10t => "10t",
            Self::F20t => "20t",
            Self::F22x => "22x",
            Self::F21t => "21t",
            Self::F21s => "21s",
            Self::F21h => "21h",
            Self::F21c => "21c",
            Self::F23x => "23x",
            Self::F22b => "22b",
            Self::F22t => "22t",
            Self::F22s => "22s",
            Self::F22c => "22c",
            Self::F22cs => "22cs",
            Self::F32x => "32x",
            Self::F30t => "30t",
            Self::F31t => "31t",
            Self::F31i => "31i",
            Self::F31c => "31c",
            Self::F35c => "35c",
            Self::F35ms => "35ms",
            Self::F3rc => "3rc",
            Self::F3rms => "3rms",
            Self::F45cc => "45cc",
            Self::F4rcc => "4rcc",
            Self::F51l => "51l",
            Self::PackedSwitchPayload => "packed-switch-payload",
            Self::SparseSwitchPayload => "sparse-switch-payload",
            Self::ArrayPayload => "array-payload",
        }
    }
}

/// Dalvik opcode enumeration
///
/// Regular opcodes carry their dex byte value. Payload pseudo-opcodes carry
/// their 16-bit ident (`0x0100`, `0x0200`, `0x0300`), which is why the enum is
/// `u16`-sized.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    // === No-op (0x00) ===
    /// `nop`
    Nop = 0x00,

    // === Moves (0x01-0x0D) ===
    /// `move vA, vB`
    Move = 0x01,
    /// `move/from16 vAA, vBBBB`
    MoveFrom16 = 0x02,
    /// `move/16 vAAAA, vBBBB`
    Move16 = 0x03,
    /// `move-wide vA, vB`
    MoveWide = 0x04,
    /// `move-wide/from16 vAA, vBBBB`
    MoveWideFrom16 = 0x05,
    /// `move-wide/16 vAAAA, vBBBB`
    MoveWide16 = 0x06,
    /// `move-object vA, vB`
    MoveObject = 0x07,
    /// `move-object/from16 vAA, vBBBB`
    MoveObjectFrom16 = 0x08,
    /// `move-object/16 vAAAA, vBBBB`
    MoveObject16 = 0x09,
    /// `move-result vAA`
    MoveResult = 0x0A,
    /// `move-result-wide vAA`
    MoveResultWide = 0x0B,
    /// `move-result-object vAA`
    MoveResultObject = 0x0C,
    /// `move-exception vAA`
    MoveException = 0x0D,

    // === Returns (0x0E-0x11) ===
    /// `return-void`
    ReturnVoid = 0x0E,
    /// `return vAA`
    Return = 0x0F,
    /// `return-wide vAA`
    ReturnWide = 0x10,
    /// `return-object vAA`
    ReturnObject = 0x11,

    // === Constants (0x12-0x1C) ===
    /// `const/4 vA, #+B`
    Const4 = 0x12,
    /// `const/16 vAA, #+BBBB`
    Const16 = 0x13,
    /// `const vAA, #+BBBBBBBB`
    Const = 0x14,
    /// `const/high16 vAA, #+BBBB0000`
    ConstHigh16 = 0x15,
    /// `const-wide/16 vAA, #+BBBB`
    ConstWide16 = 0x16,
    /// `const-wide/32 vAA, #+BBBBBBBB`
    ConstWide32 = 0x17,
    /// `const-wide vAA, #+BBBBBBBBBBBBBBBB`
    ConstWide = 0x18,
    /// `const-wide/high16 vAA, #+BBBB0000`
    ConstWideHigh16 = 0x19,
    /// `const-string vAA, kind@BBBB`
    ConstString = 0x1A,
    /// `const-string/jumbo vAA, string@BBBBBBBB`
    ConstStringJumbo = 0x1B,
    /// `const-class vAA, kind@BBBB`
    ConstClass = 0x1C,

    // === Objects, arrays and unconditional flow (0x1D-0x2C) ===
    /// `monitor-enter vAA`
    MonitorEnter = 0x1D,
    /// `monitor-exit vAA`
    MonitorExit = 0x1E,
    /// `check-cast vAA, kind@BBBB`
    CheckCast = 0x1F,
    /// `instance-of vA, vB, kind@CCCC`
    InstanceOf = 0x20,
    /// `array-length vA, vB`
    ArrayLength = 0x21,
    /// `new-instance vAA, kind@BBBB`
    NewInstance = 0x22,
    /// `new-array vA, vB, kind@CCCC`
    NewArray = 0x23,
    /// `filled-new-array {vC, vD, vE, vF, vG}, kind@BBBB`
    FilledNewArray = 0x24,
    /// `filled-new-array/range {vCCCC .. vNNNN}, kind@BBBB`
    FilledNewArrayRange = 0x25,
    /// `fill-array-data vAA, +BBBBBBBB`
    FillArrayData = 0x26,
    /// `throw vAA`
    Throw = 0x27,
    /// `goto +AA`
    Goto = 0x28,
    /// `goto/16 +AAAA`
    Goto16 = 0x29,
    /// `goto/32 +AAAAAAAA`
    Goto32 = 0x2A,
    /// `packed-switch vAA, +BBBBBBBB`
    PackedSwitch = 0x2B,
    /// `sparse-switch vAA, +BBBBBBBB`
    SparseSwitch = 0x2C,

    // === Comparisons (0x2D-0x31) ===
    /// `cmpl-float vAA, vBB, vCC`
    CmplFloat = 0x2D,
    /// `cmpg-float vAA, vBB, vCC`
    CmpgFloat = 0x2E,
    /// `cmpl-double vAA, vBB, vCC`
    CmplDouble = 0x2F,
    /// `cmpg-double vAA, vBB, vCC`
    CmpgDouble = 0x30,
    /// `cmp-long vAA, vBB, vCC`
    CmpLong = 0x31,

    // === Conditional branches (0x32-0x3D) ===
    /// `if-eq vA, vB, +CCCC`
    IfEq = 0x32,
    /// `if-ne vA, vB, +CCCC`
    IfNe = 0x33,
    /// `if-lt vA, vB, +CCCC`
    IfLt = 0x34,
    /// `if-ge vA, vB, +CCCC`
    IfGe = 0x35,
    /// `if-gt vA, vB, +CCCC`
    IfGt = 0x36,
    /// `if-le vA, vB, +CCCC`
    IfLe = 0x37,
    /// `if-eqz vAA, +BBBB`
    IfEqz = 0x38,
    /// `if-nez vAA, +BBBB`
    IfNez = 0x39,
    /// `if-ltz vAA, +BBBB`
    IfLtz = 0x3A,
    /// `if-gez vAA, +BBBB`
    IfGez = 0x3B,
    /// `if-gtz vAA, +BBBB`
    IfGtz = 0x3C,
    /// `if-lez vAA, +BBBB`
    IfLez = 0x3D,

    // === Array, instance and static field access (0x44-0x6D) ===
    /// `aget vAA, vBB, vCC`
    Aget = 0x44,
    /// `aget-wide vAA, vBB, vCC`
    AgetWide = 0x45,
    /// `aget-object vAA, vBB, vCC`
    AgetObject = 0x46,
    /// `aget-boolean vAA, vBB, vCC`
    AgetBoolean = 0x47,
    /// `aget-byte vAA, vBB, vCC`
    AgetByte = 0x48,
    /// `aget-char vAA, vBB, vCC`
    AgetChar = 0x49,
    /// `aget-short vAA, vBB, vCC`
    AgetShort = 0x4A,
    /// `aput vAA, vBB, vCC`
    Aput = 0x4B,
    /// `aput-wide vAA, vBB, vCC`
    AputWide = 0x4C,
    /// `aput-object vAA, vBB, vCC`
    AputObject = 0x4D,
    /// `aput-boolean vAA, vBB, vCC`
    AputBoolean = 0x4E,
    /// `aput-byte vAA, vBB, vCC`
    AputByte = 0x4F,
    /// `aput-char vAA, vBB, vCC`
    AputChar = 0x50,
    /// `aput-short vAA, vBB, vCC`
    AputShort = 0x51,
    /// `iget vA, vB, kind@CCCC`
    Iget = 0x52,
    /// `iget-wide vA, vB, kind@CCCC`
    IgetWide = 0x53,
    /// `iget-object vA, vB, kind@CCCC`
    IgetObject = 0x54,
    /// `iget-boolean vA, vB, kind@CCCC`
    IgetBoolean = 0x55,
    /// `iget-byte vA, vB, kind@CCCC`
    IgetByte = 0x56,
    /// `iget-char vA, vB, kind@CCCC`
    IgetChar = 0x57,
    /// `iget-short vA, vB, kind@CCCC`
    IgetShort = 0x58,
    /// `iput vA, vB, kind@CCCC`
    Iput = 0x59,
    /// `iput-wide vA, vB, kind@CCCC`
    IputWide = 0x5A,
    /// `iput-object vA, vB, kind@CCCC`
    IputObject = 0x5B,
    /// `iput-boolean vA, vB, kind@CCCC`
    IputBoolean = 0x5C,
    /// `iput-byte vA, vB, kind@CCCC`
    IputByte = 0x5D,
    /// `iput-char vA, vB, kind@CCCC`
    IputChar = 0x5E,
    /// `iput-short vA, vB, kind@CCCC`
    IputShort = 0x5F,
    /// `sget vAA, kind@BBBB`
    Sget = 0x60,
    /// `sget-wide vAA, kind@BBBB`
    SgetWide = 0x61,
    /// `sget-object vAA, kind@BBBB`
    SgetObject = 0x62,
    /// `sget-boolean vAA, kind@BBBB`
    SgetBoolean = 0x63,
    /// `sget-byte vAA, kind@BBBB`
    SgetByte = 0x64,
    /// `sget-char vAA, kind@BBBB`
    SgetChar = 0x65,
    /// `sget-short vAA, kind@BBBB`
    SgetShort = 0x66,
    /// `sput vAA, kind@BBBB`
    Sput = 0x67,
    /// `sput-wide vAA, kind@BBBB`
    SputWide = 0x68,
    /// `sput-object vAA, kind@BBBB`
    SputObject = 0x69,
    /// `sput-boolean vAA, kind@BBBB`
    SputBoolean = 0x6A,
    /// `sput-byte vAA, kind@BBBB`
    SputByte = 0x6B,
    /// `sput-char vAA, kind@BBBB`
    SputChar = 0x6C,
    /// `sput-short vAA, kind@BBBB`
    SputShort = 0x6D,

    // === Invokes (0x6E-0x78) ===
    /// `invoke-virtual {vC, vD, vE, vF, vG}, kind@BBBB`
    InvokeVirtual = 0x6E,
    /// `invoke-super {vC, vD, vE, vF, vG}, kind@BBBB`
    InvokeSuper = 0x6F,
    /// `invoke-direct {vC, vD, vE, vF, vG}, kind@BBBB`
    InvokeDirect = 0x70,
    /// `invoke-static {vC, vD, vE, vF, vG}, kind@BBBB`
    InvokeStatic = 0x71,
    /// `invoke-interface {vC, vD, vE, vF, vG}, kind@BBBB`
    InvokeInterface = 0x72,
    /// ART only: `return-void-no-barrier`, replaces `return-void` in odexed constructors
    ReturnVoidNoBarrier = 0x73,
    /// `invoke-virtual/range {vCCCC .. vNNNN}, kind@BBBB`
    InvokeVirtualRange = 0x74,
    /// `invoke-super/range {vCCCC .. vNNNN}, kind@BBBB`
    InvokeSuperRange = 0x75,
    /// `invoke-direct/range {vCCCC .. vNNNN}, kind@BBBB`
    InvokeDirectRange = 0x76,
    /// `invoke-static/range {vCCCC .. vNNNN}, kind@BBBB`
    InvokeStaticRange = 0x77,
    /// `invoke-interface/range {vCCCC .. vNNNN}, kind@BBBB`
    InvokeInterfaceRange = 0x78,

    // === Unary operations and conversions (0x7B-0x8F) ===
    /// `neg-int vA, vB`
    NegInt = 0x7B,
    /// `not-int vA, vB`
    NotInt = 0x7C,
    /// `neg-long vA, vB`
    NegLong = 0x7D,
    /// `not-long vA, vB`
    NotLong = 0x7E,
    /// `neg-float vA, vB`
    NegFloat = 0x7F,
    /// `neg-double vA, vB`
    NegDouble = 0x80,
    /// `int-to-long vA, vB`
    IntToLong = 0x81,
    /// `int-to-float vA, vB`
    IntToFloat = 0x82,
    /// `int-to-double vA, vB`
    IntToDouble = 0x83,
    /// `long-to-int vA, vB`
    LongToInt = 0x84,
    /// `long-to-float vA, vB`
    LongToFloat = 0x85,
    /// `long-to-double vA, vB`
    LongToDouble = 0x86,
    /// `float-to-int vA, vB`
    FloatToInt = 0x87,
    /// `float-to-long vA, vB`
    FloatToLong = 0x88,
    /// `float-to-double vA, vB`
    FloatToDouble = 0x89,
    /// `double-to-int vA, vB`
    DoubleToInt = 0x8A,
    /// `double-to-long vA, vB`
    DoubleToLong = 0x8B,
    /// `double-to-float vA, vB`
    DoubleToFloat = 0x8C,
    /// `int-to-byte vA, vB`
    IntToByte = 0x8D,
    /// `int-to-char vA, vB`
    IntToChar = 0x8E,
    /// `int-to-short vA, vB`
    IntToShort = 0x8F,

    // === Binary operations (0x90-0xAF) ===
    /// `add-int vAA, vBB, vCC`
    AddInt = 0x90,
    /// `sub-int vAA, vBB, vCC`
    SubInt = 0x91,
    /// `mul-int vAA, vBB, vCC`
    MulInt = 0x92,
    /// `div-int vAA, vBB, vCC`
    DivInt = 0x93,
    /// `rem-int vAA, vBB, vCC`
    RemInt = 0x94,
    /// `and-int vAA, vBB, vCC`
    AndInt = 0x95,
    /// `or-int vAA, vBB, vCC`
    OrInt = 0x96,
    /// `xor-int vAA, vBB, vCC`
    XorInt = 0x97,
    /// `shl-int vAA, vBB, vCC`
    ShlInt = 0x98,
    /// `shr-int vAA, vBB, vCC`
    ShrInt = 0x99,
    /// `ushr-int vAA, vBB, vCC`
    UshrInt = 0x9A,
    /// `add-long vAA, vBB, vCC`
    AddLong = 0x9B,
    /// `sub-long vAA, vBB, vCC`
    SubLong = 0x9C,
    /// `mul-long vAA, vBB, vCC`
    MulLong = 0x9D,
    /// `div-long vAA, vBB, vCC`
    DivLong = 0x9E,
    /// `rem-long vAA, vBB, vCC`
    RemLong = 0x9F,
    /// `and-long vAA, vBB, vCC`
    AndLong = 0xA0,
    /// `or-long vAA, vBB, vCC`
    OrLong = 0xA1,
    /// `xor-long vAA, vBB, vCC`
    XorLong = 0xA2,
    /// `shl-long vAA, vBB, vCC`
    ShlLong = 0xA3,
    /// `shr-long vAA, vBB, vCC`
    ShrLong = 0xA4,
    /// `ushr-long vAA, vBB, vCC`
    UshrLong = 0xA5,
    /// `add-float vAA, vBB, vCC`
    AddFloat = 0xA6,
    /// `sub-float vAA, vBB, vCC`
    SubFloat = 0xA7,
    /// `mul-float vAA, vBB, vCC`
    MulFloat = 0xA8,
    /// `div-float vAA, vBB, vCC`
    DivFloat = 0xA9,
    /// `rem-float vAA, vBB, vCC`
    RemFloat = 0xAA,
    /// `add-double vAA, vBB, vCC`
    AddDouble = 0xAB,
    /// `sub-double vAA, vBB, vCC`
    SubDouble = 0xAC,
    /// `mul-double vAA, vBB, vCC`
    MulDouble = 0xAD,
    /// `div-double vAA, vBB, vCC`
    DivDouble = 0xAE,
    /// `rem-double vAA, vBB, vCC`
    RemDouble = 0xAF,

    // === Binary operations, two-address (0xB0-0xCF) ===
    /// `add-int/2addr vA, vB`
    AddInt2Addr = 0xB0,
    /// `sub-int/2addr vA, vB`
    SubInt2Addr = 0xB1,
    /// `mul-int/2addr vA, vB`
    MulInt2Addr = 0xB2,
    /// `div-int/2addr vA, vB`
    DivInt2Addr = 0xB3,
    /// `rem-int/2addr vA, vB`
    RemInt2Addr = 0xB4,
    /// `and-int/2addr vA, vB`
    AndInt2Addr = 0xB5,
    /// `or-int/2addr vA, vB`
    OrInt2Addr = 0xB6,
    /// `xor-int/2addr vA, vB`
    XorInt2Addr = 0xB7,
    /// `shl-int/2addr vA, vB`
    ShlInt2Addr = 0xB8,
    /// `shr-int/2addr vA, vB`
    ShrInt2Addr = 0xB9,
    /// `ushr-int/2addr vA, vB`
    UshrInt2Addr = 0xBA,
    /// `add-long/2addr vA, vB`
    AddLong2Addr = 0xBB,
    /// `sub-long/2addr vA, vB`
    SubLong2Addr = 0xBC,
    /// `mul-long/2addr vA, vB`
    MulLong2Addr = 0xBD,
    /// `div-long/2addr vA, vB`
    DivLong2Addr = 0xBE,
    /// `rem-long/2addr vA, vB`
    RemLong2Addr = 0xBF,
    /// `and-long/2addr vA, vB`
    AndLong2Addr = 0xC0,
    /// `or-long/2addr vA, vB`
    OrLong2Addr = 0xC1,
    /// `xor-long/2addr vA, vB`
    XorLong2Addr = 0xC2,
    /// `shl-long/2addr vA, vB`
    ShlLong2Addr = 0xC3,
    /// `shr-long/2addr vA, vB`
    ShrLong2Addr = 0xC4,
    /// `ushr-long/2addr vA, vB`
    UshrLong2Addr = 0xC5,
    /// `add-float/2addr vA, vB`
    AddFloat2Addr = 0xC6,
    /// `sub-float/2addr vA, vB`
    SubFloat2Addr = 0xC7,
    /// `mul-float/2addr vA, vB`
    MulFloat2Addr = 0xC8,
    /// `div-float/2addr vA, vB`
    DivFloat2Addr = 0xC9,
    /// `rem-float/2addr vA, vB`
    RemFloat2Addr = 0xCA,
    /// `add-double/2addr vA, vB`
    AddDouble2Addr = 0xCB,
    /// `sub-double/2addr vA, vB`
    SubDouble2Addr = 0xCC,
    /// `mul-double/2addr vA, vB`
    MulDouble2Addr = 0xCD,
    /// `div-double/2addr vA, vB`
    DivDouble2Addr = 0xCE,
    /// `rem-double/2addr vA, vB`
    RemDouble2Addr = 0xCF,

    // === Binary operations with literal (0xD0-0xE2) ===
    /// `add-int/lit16 vA, vB, #+CCCC`
    AddIntLit16 = 0xD0,
    /// `rsub-int vA, vB, #+CCCC`
    RsubInt = 0xD1,
    /// `mul-int/lit16 vA, vB, #+CCCC`
    MulIntLit16 = 0xD2,
    /// `div-int/lit16 vA, vB, #+CCCC`
    DivIntLit16 = 0xD3,
    /// `rem-int/lit16 vA, vB, #+CCCC`
    RemIntLit16 = 0xD4,
    /// `and-int/lit16 vA, vB, #+CCCC`
    AndIntLit16 = 0xD5,
    /// `or-int/lit16 vA, vB, #+CCCC`
    OrIntLit16 = 0xD6,
    /// `xor-int/lit16 vA, vB, #+CCCC`
    XorIntLit16 = 0xD7,
    /// `add-int/lit8 vAA, vBB, #+CC`
    AddIntLit8 = 0xD8,
    /// `rsub-int/lit8 vAA, vBB, #+CC`
    RsubIntLit8 = 0xD9,
    /// `mul-int/lit8 vAA, vBB, #+CC`
    MulIntLit8 = 0xDA,
    /// `div-int/lit8 vAA, vBB, #+CC`
    DivIntLit8 = 0xDB,
    /// `rem-int/lit8 vAA, vBB, #+CC`
    RemIntLit8 = 0xDC,
    /// `and-int/lit8 vAA, vBB, #+CC`
    AndIntLit8 = 0xDD,
    /// `or-int/lit8 vAA, vBB, #+CC`
    OrIntLit8 = 0xDE,
    /// `xor-int/lit8 vAA, vBB, #+CC`
    XorIntLit8 = 0xDF,
    /// `shl-int/lit8 vAA, vBB, #+CC`
    ShlIntLit8 = 0xE0,
    /// `shr-int/lit8 vAA, vBB, #+CC`
    ShrIntLit8 = 0xE1,
    /// `ushr-int/lit8 vAA, vBB, #+CC`
    UshrIntLit8 = 0xE2,

    // === ART quickened, odex only (0xE3-0xF2) ===
    /// `iget-quick vA, vB, fieldoff@CCCC`
    IgetQuick = 0xE3,
    /// `iget-wide-quick vA, vB, fieldoff@CCCC`
    IgetWideQuick = 0xE4,
    /// `iget-object-quick vA, vB, fieldoff@CCCC`
    IgetObjectQuick = 0xE5,
    /// `iput-quick vA, vB, fieldoff@CCCC`
    IputQuick = 0xE6,
    /// `iput-wide-quick vA, vB, fieldoff@CCCC`
    IputWideQuick = 0xE7,
    /// `iput-object-quick vA, vB, fieldoff@CCCC`
    IputObjectQuick = 0xE8,
    /// `invoke-virtual-quick {vC, vD, vE, vF, vG}, vtaboff@BBBB`
    InvokeVirtualQuick = 0xE9,
    /// `invoke-virtual-quick/range {vCCCC .. vNNNN}, vtaboff@BBBB`
    InvokeVirtualQuickRange = 0xEA,
    /// `iput-boolean-quick vA, vB, fieldoff@CCCC`
    IputBooleanQuick = 0xEB,
    /// `iput-byte-quick vA, vB, fieldoff@CCCC`
    IputByteQuick = 0xEC,
    /// `iput-char-quick vA, vB, fieldoff@CCCC`
    IputCharQuick = 0xED,
    /// `iput-short-quick vA, vB, fieldoff@CCCC`
    IputShortQuick = 0xEE,
    /// `iget-boolean-quick vA, vB, fieldoff@CCCC`
    IgetBooleanQuick = 0xEF,
    /// `iget-byte-quick vA, vB, fieldoff@CCCC`
    IgetByteQuick = 0xF0,
    /// `iget-char-quick vA, vB, fieldoff@CCCC`
    IgetCharQuick = 0xF1,
    /// `iget-short-quick vA, vB, fieldoff@CCCC`
    IgetShortQuick = 0xF2,

    // === Method handles and call sites, dex 038+ (0xFA-0xFF) ===
    /// `invoke-polymorphic {vC, vD, vE, vF, vG}, meth@BBBB, proto@HHHH`
    InvokePolymorphic = 0xFA,
    /// `invoke-polymorphic/range {vCCCC .. vNNNN}, meth@BBBB, proto@HHHH`
    InvokePolymorphicRange = 0xFB,
    /// `invoke-custom {vC, vD, vE, vF, vG}, kind@BBBB`
    InvokeCustom = 0xFC,
    /// `invoke-custom/range {vCCCC .. vNNNN}, kind@BBBB`
    InvokeCustomRange = 0xFD,
    /// `const-method-handle vAA, kind@BBBB`
    ConstMethodHandle = 0xFE,
    /// `const-method-type vAA, kind@BBBB`
    ConstMethodType = 0xFF,

    // === Payload pseudo-instructions ===
    /// `packed-switch-payload` data block, referenced by offset
    PackedSwitchPayload = 0x100,
    /// `sparse-switch-payload` data block, referenced by offset
    SparseSwitchPayload = 0x200,
    /// `array-payload` data block, referenced by offset
    ArrayPayload = 0x300,
}

impl Opcode {
    /// Every opcode, in encoding order
    pub const ALL: &'static [Opcode] = &[
        Opcode::Nop, Opcode::Move, Opcode::MoveFrom16, Opcode::Move16, Opcode::MoveWide,
        Opcode::MoveWideFrom16, Opcode::MoveWide16, Opcode::MoveObject, Opcode::MoveObjectFrom16,
        Opcode::MoveObject16, Opcode::MoveResult, Opcode::MoveResultWide, Opcode::MoveResultObject,
        Opcode::MoveException, Opcode::ReturnVoid, Opcode::Return, Opcode::ReturnWide,
        Opcode::ReturnObject, Opcode::Const4, Opcode::Const16, Opcode::Const, Opcode::ConstHigh16,
        Opcode::ConstWide16, Opcode::ConstWide32, Opcode::ConstWide, Opcode::ConstWideHigh16,
        Opcode::ConstString, Opcode::ConstStringJumbo, Opcode::ConstClass, Opcode::MonitorEnter,
        Opcode::MonitorExit, Opcode::CheckCast, Opcode::InstanceOf, Opcode::ArrayLength,
        Opcode::NewInstance, Opcode::NewArray, Opcode::FilledNewArray, Opcode::FilledNewArrayRange,
        Opcode::FillArrayData, Opcode::Throw, Opcode::Goto, Opcode::Goto16, Opcode::Goto32,
        Opcode::PackedSwitch, Opcode::SparseSwitch, Opcode::CmplFloat, Opcode::CmpgFloat,
        Opcode::CmplDouble, Opcode::CmpgDouble, Opcode::CmpLong, Opcode::IfEq, Opcode::IfNe,
        Opcode::IfLt, Opcode::IfGe, Opcode::IfGt, Opcode::IfLe, Opcode::IfEqz, Opcode::IfNez,
        Opcode::IfLtz, Opcode::IfGez, Opcode::IfGtz, Opcode::IfLez, Opcode::Aget, Opcode::AgetWide,
        Opcode::AgetObject, Opcode::AgetBoolean, Opcode::AgetByte, Opcode::AgetChar,
        Opcode::AgetShort, Opcode::Aput, Opcode::AputWide, Opcode::AputObject, Opcode::AputBoolean,
        Opcode::AputByte, Opcode::AputChar, Opcode::AputShort, Opcode::Iget, Opcode::IgetWide,
        Opcode::IgetObject, Opcode::IgetBoolean, Opcode::IgetByte, Opcode::IgetChar,
        Opcode::IgetShort, Opcode::Iput, Opcode::IputWide, Opcode::IputObject, Opcode::IputBoolean,
        Opcode::IputByte, Opcode::IputChar, Opcode::IputShort, Opcode::Sget, Opcode::SgetWide,
        Opcode::SgetObject, Opcode::SgetBoolean, Opcode::SgetByte, Opcode::SgetChar,
        Opcode::SgetShort, Opcode::Sput, Opcode::SputWide, Opcode::SputObject, Opcode::SputBoolean,
        Opcode::SputByte, Opcode::SputChar, Opcode::SputShort, Opcode::InvokeVirtual,
        Opcode::InvokeSuper, Opcode::InvokeDirect, Opcode::InvokeStatic, Opcode::InvokeInterface,
        Opcode::ReturnVoidNoBarrier, Opcode::InvokeVirtualRange, Opcode::InvokeSuperRange,
        Opcode::InvokeDirectRange, Opcode::InvokeStaticRange, Opcode::InvokeInterfaceRange,
        Opcode::NegInt, Opcode::NotInt, Opcode::NegLong, Opcode::NotLong, Opcode::NegFloat,
        Opcode::NegDouble, Opcode::IntToLong, Opcode::IntToFloat, Opcode::IntToDouble,
        Opcode::LongToInt, Opcode::LongToFloat, Opcode::LongToDouble, Opcode::FloatToInt,
        Opcode::FloatToLong, Opcode::FloatToDouble, Opcode::DoubleToInt, Opcode::DoubleToLong,
        Opcode::DoubleToFloat, Opcode::IntToByte, Opcode::IntToChar, Opcode::IntToShort,
        Opcode::AddInt, Opcode::SubInt, Opcode::MulInt, Opcode::DivInt, Opcode::RemInt,
        Opcode::AndInt, Opcode::OrInt, Opcode::XorInt, Opcode::ShlInt, Opcode::ShrInt,
        Opcode::UshrInt, Opcode::AddLong, Opcode::SubLong, Opcode::MulLong, Opcode::DivLong,
        Opcode::RemLong, Opcode::AndLong, Opcode::OrLong, Opcode::XorLong, Opcode::ShlLong,
        Opcode::ShrLong, Opcode::UshrLong, Opcode::AddFloat, Opcode::SubFloat, Opcode::MulFloat,
        Opcode::DivFloat, Opcode::RemFloat, Opcode::AddDouble, Opcode::SubDouble,
        Opcode::MulDouble, Opcode::DivDouble, Opcode::RemDouble, Opcode::AddInt2Addr,
        Opcode::SubInt2Addr, Opcode::MulInt2Addr, Opcode::DivInt2Addr, Opcode::RemInt2Addr,
        Opcode::AndInt2Addr, Opcode::OrInt2Addr, Opcode::XorInt2Addr, Opcode::ShlInt2Addr,
        Opcode::ShrInt2Addr, Opcode::UshrInt2Addr, Opcode::AddLong2Addr, Opcode::SubLong2Addr,
        Opcode::MulLong2Addr, Opcode::DivLong2Addr, Opcode::RemLong2Addr, Opcode::AndLong2Addr,
        Opcode::OrLong2Addr, Opcode::XorLong2Addr, Opcode::ShlLong2Addr, Opcode::ShrLong2Addr,
        Opcode::UshrLong2Addr, Opcode::AddFloat2Addr, Opcode::SubFloat2Addr, Opcode::MulFloat2Addr,
        Opcode::DivFloat2Addr, Opcode::RemFloat2Addr, Opcode::AddDouble2Addr,
        Opcode::SubDouble2Addr, Opcode::MulDouble2Addr, Opcode::DivDouble2Addr,
        Opcode::RemDouble2Addr, Opcode::AddIntLit16, Opcode::RsubInt, Opcode::MulIntLit16,
        Opcode::DivIntLit16, Opcode::RemIntLit16, Opcode::AndIntLit16, Opcode::OrIntLit16,
        Opcode::XorIntLit16, Opcode::AddIntLit8, Opcode::RsubIntLit8, Opcode::MulIntLit8,
        Opcode::DivIntLit8, Opcode::RemIntLit8, Opcode::AndIntLit8, Opcode::OrIntLit8,
        Opcode::XorIntLit8, Opcode::ShlIntLit8, Opcode::ShrIntLit8, Opcode::UshrIntLit8,
        Opcode::IgetQuick, Opcode::IgetWideQuick, Opcode::IgetObjectQuick, Opcode::IputQuick,
        Opcode::IputWideQuick, Opcode::IputObjectQuick, Opcode::InvokeVirtualQuick,
        Opcode::InvokeVirtualQuickRange, Opcode::IputBooleanQuick, Opcode::IputByteQuick,
        Opcode::IputCharQuick, Opcode::IputShortQuick, Opcode::IgetBooleanQuick,
        Opcode::IgetByteQuick, Opcode::IgetCharQuick, Opcode::IgetShortQuick,
        Opcode::InvokePolymorphic, Opcode::InvokePolymorphicRange, Opcode::InvokeCustom,
        Opcode::InvokeCustomRange, Opcode::ConstMethodHandle, Opcode::ConstMethodType,
        Opcode::PackedSwitchPayload, Opcode::SparseSwitchPayload, Opcode::ArrayPayload,
    ];

    /// Convert a dex opcode byte to an opcode, returns None for unassigned bytes
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Self> {
        OPCODE_TABLE[byte as usize]
    }

    /// Convert a payload ident (`0x0100`, `0x0200`, `0x0300`) to its pseudo-opcode
    #[inline]
    pub fn from_payload_ident(ident: u16) -> Option<Self> {
        match ident {
            0x0100 => Some(Self::PackedSwitchPayload),
            0x0200 => Some(Self::SparseSwitchPayload),
            0x0300 => Some(Self::ArrayPayload),
            _ => None,
        }
    }

    /// Look up an opcode by its smali mnemonic (`"add-int/2addr"`)
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        static BY_MNEMONIC: OnceLock<HashMap<&'static str, Opcode>> = OnceLock::new();
        BY_MNEMONIC
            .get_or_init(|| Self::ALL.iter().map(|&op| (op.mnemonic(), op)).collect())
            .get(mnemonic)
            .copied()
    }

    /// Encoded value: the opcode byte, or the payload ident
    #[inline]
    pub fn value(self) -> u16 {
        self as u16
    }

    /// Check if this is a payload pseudo-instruction
    #[inline]
    pub fn is_payload(self) -> bool {
        matches!(
            self,
            Self::PackedSwitchPayload | Self::SparseSwitchPayload | Self::ArrayPayload
        )
    }

    /// Check if this opcode only appears in optimized (odex) method bodies
    #[inline]
    pub fn is_odex_only(self) -> bool {
        matches!(self.format(), Format::F22cs | Format::F35ms | Format::F3rms)
            || self == Self::ReturnVoidNoBarrier
    }

    /// Whether the instruction stores a result into its first register
    /// operand (`vA`).
    pub fn writes_register(self) -> bool {
        match self.format() {
            Format::F12x | Format::F22x | Format::F32x | Format::F11n | Format::F21s
            | Format::F21h | Format::F31i | Format::F51l | Format::F31c | Format::F22b
            | Format::F22s => true,
            Format::F11x => matches!(
                self,
                Self::MoveResult
                    | Self::MoveResultWide
                    | Self::MoveResultObject
                    | Self::MoveException
            ),
            // check-cast only narrows the static type of vA
            Format::F21c | Format::F22c | Format::F22cs | Format::F23x => {
                !self.is_store() && self != Self::CheckCast
            }
            _ => false,
        }
    }

    // array, instance and static field stores read vA instead of writing it
    fn is_store(self) -> bool {
        matches!(
            self,
            Self::Aput
                | Self::AputWide
                | Self::AputObject
                | Self::AputBoolean
                | Self::AputByte
                | Self::AputChar
                | Self::AputShort
                | Self::Iput
                | Self::IputWide
                | Self::IputObject
                | Self::IputBoolean
                | Self::IputByte
                | Self::IputChar
                | Self::IputShort
                | Self::Sput
                | Self::SputWide
                | Self::SputObject
                | Self::SputBoolean
                | Self::SputByte
                | Self::SputChar
                | Self::SputShort
                | Self::IputQuick
                | Self::IputWideQuick
                | Self::IputObjectQuick
                | Self::IputBooleanQuick
                | Self::IputByteQuick
                | Self::IputCharQuick
                | Self::IputShortQuick
        )
    }

    /// Get the smali mnemonic for this opcode
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "nop",
            Self::Move => "move",
            Self::MoveFrom16 => "move/from16",
            Self::Move16 => "move/16",
            Self::MoveWide => "move-wide",
            Self::MoveWideFrom16 => "move-wide/from16",
            Self::MoveWide16 => "move-wide/16",
            Self::MoveObject => "move-object",
            Self::MoveObjectFrom16 => "move-object/from16",
            Self::MoveObject16 => "move-object/16",
            Self::MoveResult => "move-result",
            Self::MoveResultWide => "move-result-wide",
            Self::MoveResultObject => "move-result-object",
            Self::MoveException => "move-exception",
            Self::ReturnVoid => "return-void",
            Self::Return => "return",
            Self::ReturnWide => "return-wide",
            Self::ReturnObject => "return-object",
            Self::Const4 => "const/4",
            Self::Const16 => "const/16",
            Self::Const => "const",
            Self::ConstHigh16 => "const/high16",
            Self::ConstWide16 => "const-wide/16",
            Self::ConstWide32 => "const-wide/32",
            Self::ConstWide => "const-wide",
            Self::ConstWideHigh16 => "const-wide/high16",
            Self::ConstString => "const-string",
            Self::ConstStringJumbo => "const-string/jumbo",
            Self::ConstClass => "const-class",
            Self::MonitorEnter => "monitor-enter",
            Self::MonitorExit => "monitor-exit",
            Self::CheckCast => "check-cast",
            Self::InstanceOf => "instance-of",
            Self::ArrayLength => "array-length",
            Self::NewInstance => "new-instance",
            Self::NewArray => "new-array",
            Self::FilledNewArray => "filled-new-array",
            Self::FilledNewArrayRange => "filled-new-array/range",
            Self::FillArrayData => "fill-array-data",
            Self::Throw => "throw",
            Self::Goto => "goto",
            Self::Goto16 => "goto/16",
            Self::Goto32 => "goto/32",
            Self::PackedSwitch => "packed-switch",
            Self::SparseSwitch => "sparse-switch",
            Self::CmplFloat => "cmpl-float",
            Self::CmpgFloat => "cmpg-float",
            Self::CmplDouble => "cmpl-double",
            Self::CmpgDouble => "cmpg-double",
            Self::CmpLong => "cmp-long",
            Self::IfEq => "if-eq",
            Self::IfNe => "if-ne",
            Self::IfLt => "if-lt",
            Self::IfGe => "if-ge",
            Self::IfGt => "if-gt",
            Self::IfLe => "if-le",
            Self::IfEqz => "if-eqz",
            Self::IfNez => "if-nez",
            Self::IfLtz => "if-ltz",
            Self::IfGez => "if-gez",
            Self::IfGtz => "if-gtz",
            Self::IfLez => "if-lez",
            Self::Aget => "aget",
            Self::AgetWide => "aget-wide",
            Self::AgetObject => "aget-object",
            Self::AgetBoolean => "aget-boolean",
            Self::AgetByte => "aget-byte",
            Self::AgetChar => "aget-char",
            Self::AgetShort => "aget-short",
            Self::Aput => "aput",
            Self::AputWide => "aput-wide",
            Self::AputObject => "aput-object",
            Self::AputBoolean => "aput-boolean",
            Self::AputByte => "aput-byte",
            Self::AputChar => "aput-char",
            Self::AputShort => "aput-short",
            Self::Iget => "iget",
            Self::IgetWide => "iget-wide",
            Self::IgetObject => "iget-object",
            Self::IgetBoolean => "iget-boolean",
            Self::IgetByte => "iget-byte",
            Self::IgetChar => "iget-char",
            Self::IgetShort => "iget-short",
            Self::Iput => "iput",
            Self::IputWide => "iput-wide",
            Self::IputObject => "iput-object",
            Self::IputBoolean => "iput-boolean",
            Self::IputByte => "iput-byte",
            Self::IputChar => "iput-char",
            Self::IputShort => "iput-short",
            Self::Sget => "sget",
            Self::SgetWide => "sget-wide",
            Self::SgetObject => "sget-object",
            Self::SgetBoolean => "sget-boolean",
            Self::SgetByte => "sget-byte",
            Self::SgetChar => "sget-char",
            Self::SgetShort => "sget-short",
            Self::Sput => "sput",
            Self::SputWide => "sput-wide",
            Self::SputObject => "sput-object",
            Self::SputBoolean => "sput-boolean",
            Self::SputByte => "sput-byte",
            Self::SputChar => "sput-char",
            Self::SputShort => "sput-short",
            Self::InvokeVirtual => "invoke-virtual",
            Self::InvokeSuper => "invoke-super",
            Self::InvokeDirect => "invoke-direct",
            Self::InvokeStatic => "invoke-static",
            Self::InvokeInterface => "invoke-interface",
            Self::ReturnVoidNoBarrier => "return-void-no-barrier",
            Self::InvokeVirtualRange => "invoke-virtual/range",
            Self::InvokeSuperRange => "invoke-super/range",
            Self::InvokeDirectRange => "invoke-direct/range",
            Self::InvokeStaticRange => "invoke-static/range",
            Self::InvokeInterfaceRange => "invoke-interface/range",
            Self::NegInt => "neg-int",
            Self::NotInt => "not-int",
            Self::NegLong => "neg-long",
            Self::NotLong => "not-long",
            Self::NegFloat => "neg-float",
            Self::NegDouble => "neg-double",
            Self::IntToLong => "int-to-long",
            Self::IntToFloat => "int-to-float",
            Self::IntToDouble => "int-to-double",
            Self::LongToInt => "long-to-int",
            Self::LongToFloat => "long-to-float",
            Self::LongToDouble => "long-to-double",
            Self::FloatToInt => "float-to-int",
            Self::FloatToLong => "float-to-long",
            Self::FloatToDouble => "float-to-double",
            Self::DoubleToInt => "double-to-int",
            Self::DoubleToLong => "double-to-long",
            Self::DoubleToFloat => "double-to-float",
            Self::IntToByte => "int-to-byte",
            Self::IntToChar => "int-to-char",
            Self::IntToShort => "int-to-short",
            Self::AddInt => "add-int",
            Self::SubInt => "sub-int",
            Self::MulInt => "mul-int",
            Self::DivInt => "div-int",
            Self::RemInt => "rem-int",
            Self::AndInt => "and-int",
            Self::OrInt => "or-int",
            Self::XorInt => "xor-int",
            Self::ShlInt => "shl-int",
            Self::ShrInt => "shr-int",
            Self::UshrInt => "ushr-int",
            Self::AddLong => "add-long",
            Self::SubLong => "sub-long",
            Self::MulLong => "mul-long",
            Self::DivLong => "div-long",
            Self::RemLong => "rem-long",
            Self::AndLong => "and-long",
            Self::OrLong => "or-long",
            Self::XorLong => "xor-long",
            Self::ShlLong => "shl-long",
            Self::ShrLong => "shr-long",
            Self::UshrLong => "ushr-long",
            Self::AddFloat => "add-float",
            Self::SubFloat => "sub-float",
            Self::MulFloat => "mul-float",
            Self::DivFloat => "div-float",
            Self::RemFloat => "rem-float",
            Self::AddDouble => "add-double",
            Self::SubDouble => "sub-double",
            Self::MulDouble => "mul-double",
            Self::DivDouble => "div-double",
            Self::RemDouble => "rem-double",
            Self::AddInt2Addr => "add-int/2addr",
            Self::SubInt2Addr => "sub-int/2addr",
            Self::MulInt2Addr => "mul-int/2addr",
            Self::DivInt2Addr => "div-int/2addr",
            Self::RemInt2Addr => "rem-int/2addr",
            Self::AndInt2Addr => "and-int/2addr",
            Self::OrInt2Addr => "or-int/2addr",
            Self::XorInt2Addr => "xor-int/2addr",
            Self::ShlInt2Addr => "shl-int/2addr",
            Self::ShrInt2Addr => "shr-int/2addr",
            Self::UshrInt2Addr => "ushr-int/2addr",
            Self::AddLong2Addr => "add-long/2addr",
            Self::SubLong2Addr => "sub-long/2addr",
            Self::MulLong2Addr => "mul-long/2addr",
            Self::DivLong2Addr => "div-long/2addr",
            Self::RemLong2Addr => "rem-long/2addr",
            Self::AndLong2Addr => "and-long/2addr",
            Self::OrLong2Addr => "or-long/2addr",
            Self::XorLong2Addr => "xor-long/2addr",
            Self::ShlLong2Addr => "shl-long/2addr",
            Self::ShrLong2Addr => "shr-long/2addr",
            Self::UshrLong2Addr => "ushr-long/2addr",
            Self::AddFloat2Addr => "add-float/2addr",
            Self::SubFloat2Addr => "sub-float/2addr",
            Self::MulFloat2Addr => "mul-float/2addr",
            Self::DivFloat2Addr => "div-float/2addr",
            Self::RemFloat2Addr => "rem-float/2addr",
            Self::AddDouble2Addr => "add-double/2addr",
            Self::SubDouble2Addr => "sub-double/2addr",
            Self::MulDouble2Addr => "mul-double/2addr",
            Self::DivDouble2Addr => "div-double/2addr",
            Self::RemDouble2Addr => "rem-double/2addr",
            Self::AddIntLit16 => "add-int/lit16",
            Self::RsubInt => "rsub-int",
            Self::MulIntLit16 => "mul-int/lit16",
            Self::DivIntLit16 => "div-int/lit16",
            Self::RemIntLit16 => "rem-int/lit16",
            Self::AndIntLit16 => "and-int/lit16",
            Self::OrIntLit16 => "or-int/lit16",
            Self::XorIntLit16 => "xor-int/lit16",
            Self::AddIntLit8 => "add-int/lit8",
            Self::RsubIntLit8 => "rsub-int/lit8",
            Self::MulIntLit8 => "mul-int/lit8",
            Self::DivIntLit8 => "div-int/lit8",
            Self::RemIntLit8 => "rem-int/lit8",
            Self::AndIntLit8 => "and-int/lit8",
            Self::OrIntLit8 => "or-int/lit8",
            Self::XorIntLit8 => "xor-int/lit8",
            Self::ShlIntLit8 => "shl-int/lit8",
            Self::ShrIntLit8 => "shr-int/lit8",
            Self::UshrIntLit8 => "ushr-int/lit8",
            Self::IgetQuick => "iget-quick",
            Self::IgetWideQuick => "iget-wide-quick",
            Self::IgetObjectQuick => "iget-object-quick",
            Self::IputQuick => "iput-quick",
            Self::IputWideQuick => "iput-wide-quick",
            Self::IputObjectQuick => "iput-object-quick",
            Self::InvokeVirtualQuick => "invoke-virtual-quick",
            Self::InvokeVirtualQuickRange => "invoke-virtual-quick/range",
            Self::IputBooleanQuick => "iput-boolean-quick",
            Self::IputByteQuick => "iput-byte-quick",
            Self::IputCharQuick => "iput-char-quick",
            Self::IputShortQuick => "iput-short-quick",
            Self::IgetBooleanQuick => "iget-boolean-quick",
            Self::IgetByteQuick => "iget-byte-quick",
            Self::IgetCharQuick => "iget-char-quick",
            Self::IgetShortQuick => "iget-short-quick",
            Self::InvokePolymorphic => "invoke-polymorphic",
            Self::InvokePolymorphicRange => "invoke-polymorphic/range",
            Self::InvokeCustom => "invoke-custom",
            Self::InvokeCustomRange => "invoke-custom/range",
            Self::ConstMethodHandle => "const-method-handle",
            Self::ConstMethodType => "const-method-type",
            Self::PackedSwitchPayload => "packed-switch-payload",
            Self::SparseSwitchPayload => "sparse-switch-payload",
            Self::ArrayPayload => "array-payload",
        }
    }

    /// Get the instruction format for this opcode
    pub fn format(self) -> Format {
        match self {
            Self::Nop | Self::ReturnVoid | Self::ReturnVoidNoBarrier => Format::F10x,
            Self::Move | Self::MoveWide | Self::MoveObject | Self::ArrayLength | Self::NegInt
            | Self::NotInt | Self::NegLong | Self::NotLong | Self::NegFloat | Self::NegDouble
            | Self::IntToLong | Self::IntToFloat | Self::IntToDouble | Self::LongToInt
            | Self::LongToFloat | Self::LongToDouble | Self::FloatToInt | Self::FloatToLong
            | Self::FloatToDouble | Self::DoubleToInt | Self::DoubleToLong | Self::DoubleToFloat
            | Self::IntToByte | Self::IntToChar | Self::IntToShort | Self::AddInt2Addr
            | Self::SubInt2Addr | Self::MulInt2Addr | Self::DivInt2Addr | Self::RemInt2Addr
            | Self::AndInt2Addr | Self::OrInt2Addr | Self::XorInt2Addr | Self::ShlInt2Addr
            | Self::ShrInt2Addr | Self::UshrInt2Addr | Self::AddLong2Addr | Self::SubLong2Addr
            | Self::MulLong2Addr | Self::DivLong2Addr | Self::RemLong2Addr | Self::AndLong2Addr
            | Self::OrLong2Addr | Self::XorLong2Addr | Self::ShlLong2Addr | Self::ShrLong2Addr
            | Self::UshrLong2Addr | Self::AddFloat2Addr | Self::SubFloat2Addr
            | Self::MulFloat2Addr | Self::DivFloat2Addr | Self::RemFloat2Addr
            | Self::AddDouble2Addr | Self::SubDouble2Addr | Self::MulDouble2Addr
            | Self::DivDouble2Addr | Self::RemDouble2Addr => Format::F12x,
            Self::MoveFrom16 | Self::MoveWideFrom16 | Self::MoveObjectFrom16 => Format::F22x,
            Self::Move16 | Self::MoveWide16 | Self::MoveObject16 => Format::F32x,
            Self::MoveResult | Self::MoveResultWide | Self::MoveResultObject
            | Self::MoveException | Self::Return | Self::ReturnWide | Self::ReturnObject
            | Self::MonitorEnter | Self::MonitorExit | Self::Throw => Format::F11x,
            Self::Const4 => Format::F11n,
            Self::Const16 | Self::ConstWide16 => Format::F21s,
            Self::Const | Self::ConstWide32 => Format::F31i,
            Self::ConstHigh16 | Self::ConstWideHigh16 => Format::F21h,
            Self::ConstWide => Format::F51l,
            Self::ConstString | Self::ConstClass | Self::CheckCast | Self::NewInstance
            | Self::Sget | Self::SgetWide | Self::SgetObject | Self::SgetBoolean
            | Self::SgetByte | Self::SgetChar | Self::SgetShort | Self::Sput | Self::SputWide
            | Self::SputObject | Self::SputBoolean | Self::SputByte | Self::SputChar
            | Self::SputShort | Self::ConstMethodHandle | Self::ConstMethodType => Format::F21c,
            Self::ConstStringJumbo => Format::F31c,
            Self::InstanceOf | Self::NewArray | Self::Iget | Self::IgetWide | Self::IgetObject
            | Self::IgetBoolean | Self::IgetByte | Self::IgetChar | Self::IgetShort | Self::Iput
            | Self::IputWide | Self::IputObject | Self::IputBoolean | Self::IputByte
            | Self::IputChar | Self::IputShort => Format::F22c,
            Self::FilledNewArray | Self::InvokeVirtual | Self::InvokeSuper | Self::InvokeDirect
            | Self::InvokeStatic | Self::InvokeInterface | Self::InvokeCustom => Format::F35c,
            Self::FilledNewArrayRange | Self::InvokeVirtualRange | Self::InvokeSuperRange
            | Self::InvokeDirectRange | Self::InvokeStaticRange | Self::InvokeInterfaceRange
            | Self::InvokeCustomRange => Format::F3rc,
            Self::FillArrayData | Self::PackedSwitch | Self::SparseSwitch => Format::F31t,
            Self::Goto => Format::F10t,
            Self::Goto16 => Format::F20t,
            Self::Goto32 => Format::F30t,
            Self::CmplFloat | Self::CmpgFloat | Self::CmplDouble | Self::CmpgDouble
            | Self::CmpLong | Self::Aget | Self::AgetWide | Self::AgetObject | Self::AgetBoolean
            | Self::AgetByte | Self::AgetChar | Self::AgetShort | Self::Aput | Self::AputWide
            | Self::AputObject | Self::AputBoolean | Self::AputByte | Self::AputChar
            | Self::AputShort | Self::AddInt | Self::SubInt | Self::MulInt | Self::DivInt
            | Self::RemInt | Self::AndInt | Self::OrInt | Self::XorInt | Self::ShlInt
            | Self::ShrInt | Self::UshrInt | Self::AddLong | Self::SubLong | Self::MulLong
            | Self::DivLong | Self::RemLong | Self::AndLong | Self::OrLong | Self::XorLong
            | Self::ShlLong | Self::ShrLong | Self::UshrLong | Self::AddFloat | Self::SubFloat
            | Self::MulFloat | Self::DivFloat | Self::RemFloat | Self::AddDouble
            | Self::SubDouble | Self::MulDouble | Self::DivDouble | Self::RemDouble => {
                Format::F23x
            }
            Self::IfEq | Self::IfNe | Self::IfLt | Self::IfGe | Self::IfGt | Self::IfLe => {
                Format::F22t
            }
            Self::IfEqz | Self::IfNez | Self::IfLtz | Self::IfGez | Self::IfGtz | Self::IfLez => {
                Format::F21t
            }
            Self::AddIntLit16 | Self::RsubInt | Self::MulIntLit16 | Self::DivIntLit16
            | Self::RemIntLit16 | Self::AndIntLit16 | Self::OrIntLit16 | Self::XorIntLit16 => {
                Format::F22s
            }
            Self::AddIntLit8 | Self::RsubIntLit8 | Self::MulIntLit8 | Self::DivIntLit8
            | Self::RemIntLit8 | Self::AndIntLit8 | Self::OrIntLit8 | Self::XorIntLit8
            | Self::ShlIntLit8 | Self::ShrIntLit8 | Self::UshrIntLit8 => Format::F22b,
            Self::IgetQuick | Self::IgetWideQuick | Self::IgetObjectQuick | Self::IputQuick
            | Self::IputWideQuick | Self::IputObjectQuick | Self::IputBooleanQuick
            | Self::IputByteQuick | Self::IputCharQuick | Self::IputShortQuick
            | Self::IgetBooleanQuick | Self::IgetByteQuick | Self::IgetCharQuick
            | Self::IgetShortQuick => Format::F22cs,
            Self::InvokeVirtualQuick => Format::F35ms,
            Self::InvokeVirtualQuickRange => Format::F3rms,
            Self::InvokePolymorphic => Format::F45cc,
            Self::InvokePolymorphicRange => Format::F4rcc,
            Self::PackedSwitchPayload => Format::PackedSwitchPayload,
            Self::SparseSwitchPayload => Format::SparseSwitchPayload,
            Self::ArrayPayload => Format::ArrayPayload,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

/// Lookup table for byte -> Opcode conversion, built from `Opcode::ALL`
static OPCODE_TABLE: [Option<Opcode>; 256] = {
    let mut table = [None; 256];
    let mut i = 0;
    while i < Opcode::ALL.len() {
        let op = Opcode::ALL[i];
        if (op as u16) < 0x100 {
            table[op as u16 as usize] = Some(op);
        }
        i += 1;
    }
    table
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_roundtrip_for_all_regular_opcodes() {
        for &op in Opcode::ALL.iter().filter(|op| !op.is_payload()) {
            let byte = op.value() as u8;
            assert_eq!(Opcode::from_byte(byte), Some(op), "opcode {} roundtrip failed", op);
        }
    }

    #[test]
    fn test_unassigned_bytes() {
        for byte in [0x3E, 0x3F, 0x40, 0x41, 0x42, 0x43, 0x79, 0x7A, 0xF3, 0xF9] {
            assert!(Opcode::from_byte(byte).is_none(), "0x{:02x} should be unassigned", byte);
        }
        let assigned = (0..=255u8).filter_map(Opcode::from_byte).count();
        assert_eq!(assigned, Opcode::ALL.len() - 3);
    }

    #[test]
    fn test_payload_idents() {
        assert_eq!(Opcode::from_payload_ident(0x0100), Some(Opcode::PackedSwitchPayload));
        assert_eq!(Opcode::from_payload_ident(0x0200), Some(Opcode::SparseSwitchPayload));
        assert_eq!(Opcode::from_payload_ident(0x0300), Some(Opcode::ArrayPayload));
        assert_eq!(Opcode::from_payload_ident(0x0400), None);
        assert!(Opcode::ArrayPayload.is_payload());
        assert!(!Opcode::FillArrayData.is_payload());
    }

    #[test]
    fn test_mnemonics_are_unique_and_resolvable() {
        for &op in Opcode::ALL {
            assert_eq!(Opcode::from_mnemonic(op.mnemonic()), Some(op));
        }
        assert_eq!(Opcode::from_mnemonic("add-int/2addr"), Some(Opcode::AddInt2Addr));
        assert_eq!(Opcode::from_mnemonic("rsub-int"), Some(Opcode::RsubInt));
        assert_eq!(Opcode::from_mnemonic("const/4"), Some(Opcode::Const4));
        assert_eq!(Opcode::from_mnemonic("add-integer"), None);
    }

    #[test]
    fn test_formats() {
        assert_eq!(Opcode::AddInt.format(), Format::F23x);
        assert_eq!(Opcode::AddInt2Addr.format(), Format::F12x);
        assert_eq!(Opcode::AddIntLit8.format(), Format::F22b);
        assert_eq!(Opcode::RsubInt.format(), Format::F22s);
        assert_eq!(Opcode::Const4.format(), Format::F11n);
        assert_eq!(Opcode::ConstWide.format(), Format::F51l);
        assert_eq!(Opcode::IfEqz.format(), Format::F21t);
        assert_eq!(Opcode::InvokePolymorphic.format(), Format::F45cc);
        assert_eq!(Format::F22b.literal_bits(), Some(8));
        assert_eq!(Format::F23x.literal_bits(), None);
        assert!(Format::F35c.operand_kinds().is_none());
        assert_eq!(Format::F22s.operand_kinds().map(|k| k.len()), Some(3));
    }

    #[test]
    fn test_writes_register() {
        for op in [
            Opcode::Move,
            Opcode::MoveWideFrom16,
            Opcode::MoveObject16,
            Opcode::MoveResult,
            Opcode::MoveException,
            Opcode::Const4,
            Opcode::ConstWide,
            Opcode::ConstString,
            Opcode::ConstMethodType,
            Opcode::NewInstance,
            Opcode::NewArray,
            Opcode::InstanceOf,
            Opcode::ArrayLength,
            Opcode::Aget,
            Opcode::Iget,
            Opcode::SgetWide,
            Opcode::IgetQuick,
            Opcode::CmpLong,
            Opcode::NegInt,
            Opcode::IntToLong,
            Opcode::AddInt,
            Opcode::MulIntLit8,
            Opcode::RsubInt,
        ] {
            assert!(op.writes_register(), "{} writes vA", op);
        }
        for op in [
            Opcode::Nop,
            Opcode::Return,
            Opcode::Throw,
            Opcode::MonitorEnter,
            Opcode::CheckCast,
            Opcode::Aput,
            Opcode::Iput,
            Opcode::SputObject,
            Opcode::IputQuick,
            Opcode::InvokeStatic,
            Opcode::FilledNewArray,
            Opcode::FillArrayData,
            Opcode::IfEqz,
            Opcode::Goto,
            Opcode::ArrayPayload,
        ] {
            assert!(!op.writes_register(), "{} does not write vA", op);
        }
    }

    #[test]
    fn test_odex_only() {
        assert!(Opcode::IgetQuick.is_odex_only());
        assert!(Opcode::InvokeVirtualQuickRange.is_odex_only());
        assert!(Opcode::ReturnVoidNoBarrier.is_odex_only());
        assert!(!Opcode::InvokeVirtual.is_odex_only());
    }
}
