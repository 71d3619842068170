//! Decoded instructions
//!
//! An [`Instruction`] is one occurrence of an opcode together with its
//! operands, as produced by a decoder or the listing parser. Handler
//! factories only read instructions; they never modify them.

use std::fmt;

use itertools::Itertools;
use smallvec::SmallVec;

use super::opcodes::{Opcode, OperandKind};

/// A single instruction operand
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operand {
    /// Virtual register `vN`
    Register(u16),
    /// Signed literal (already sign-extended from its encoded width)
    Literal(i64),
    /// Branch target label (`:cond_0`)
    Label(String),
    /// Branch target as a relative code-unit offset
    Offset(i32),
    /// String constant (`"hello"`)
    StringRef(String),
    /// Type descriptor (`Ljava/lang/String;`, `[I`)
    TypeRef(String),
    /// Field reference (`Lfoo/Bar;->count:I`)
    FieldRef(String),
    /// Method reference (`Lfoo/Bar;->run()V`)
    MethodRef(String),
    /// Method prototype (`(I)V`)
    ProtoRef(String),
    /// Call site reference
    CallSiteRef(String),
    /// Method handle reference
    MethodHandleRef(String),
}

impl Operand {
    /// The operand slot kind this operand can fill
    pub fn kind(&self) -> OperandKind {
        match self {
            Self::Register(_) => OperandKind::Register,
            Self::Literal(_) => OperandKind::Literal,
            Self::Label(_) | Self::Offset(_) => OperandKind::Target,
            Self::StringRef(_)
            | Self::TypeRef(_)
            | Self::FieldRef(_)
            | Self::MethodRef(_)
            | Self::ProtoRef(_)
            | Self::CallSiteRef(_)
            | Self::MethodHandleRef(_) => OperandKind::Reference,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(r) => write!(f, "v{}", r),
            Self::Literal(n) if *n < 0 => write!(f, "-{:#x}", n.unsigned_abs()),
            Self::Literal(n) => write!(f, "{:#x}", n),
            Self::Label(l) => write!(f, ":{}", l),
            Self::Offset(o) => write!(f, "{:+}", o),
            Self::StringRef(s) => write!(f, "{:?}", s),
            Self::TypeRef(s)
            | Self::FieldRef(s)
            | Self::MethodRef(s)
            | Self::ProtoRef(s)
            | Self::CallSiteRef(s)
            | Self::MethodHandleRef(s) => write!(f, "{}", s),
        }
    }
}

/// Operand list; almost every Dalvik instruction fits inline
pub type Operands = SmallVec<[Operand; 4]>;

/// One decoded instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Instruction {
    opcode: Opcode,
    operands: Operands,
}

impl Instruction {
    /// Create an instruction from an opcode and its operands
    pub fn new(opcode: Opcode, operands: impl IntoIterator<Item = Operand>) -> Self {
        Self {
            opcode,
            operands: operands.into_iter().collect(),
        }
    }

    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    #[inline]
    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    /// Register number at operand position `pos`, if that operand is a register
    pub fn register(&self, pos: usize) -> Option<u16> {
        match self.operands.get(pos) {
            Some(Operand::Register(r)) => Some(*r),
            _ => None,
        }
    }

    /// Literal at operand position `pos`, if that operand is a literal
    pub fn literal(&self, pos: usize) -> Option<i64> {
        match self.operands.get(pos) {
            Some(Operand::Literal(n)) => Some(*n),
            _ => None,
        }
    }

    /// Text of the constant pool reference at position `pos`
    pub fn reference(&self, pos: usize) -> Option<&str> {
        match self.operands.get(pos)? {
            Operand::StringRef(s)
            | Operand::TypeRef(s)
            | Operand::FieldRef(s)
            | Operand::MethodRef(s)
            | Operand::ProtoRef(s)
            | Operand::CallSiteRef(s)
            | Operand::MethodHandleRef(s) => Some(s),
            _ => None,
        }
    }

    /// Operand at position `pos`
    pub fn operand(&self, pos: usize) -> Option<&Operand> {
        self.operands.get(pos)
    }

    /// Check that the operands match the opcode's fixed format shape.
    ///
    /// Register-list and payload formats have no fixed shape and always
    /// return `false` here.
    pub fn matches_format(&self) -> bool {
        match self.opcode.format().operand_kinds() {
            Some(kinds) => {
                kinds.len() == self.operands.len()
                    && kinds.iter().zip(self.operands.iter()).all(|(k, o)| *k == o.kind())
            }
            None => false,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operands.is_empty() {
            write!(f, "{}", self.opcode)
        } else {
            write!(f, "{} {}", self.opcode, self.operands.iter().join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let insn = Instruction::new(
            Opcode::AddIntLit8,
            [Operand::Register(0), Operand::Register(1), Operand::Literal(-3)],
        );
        assert_eq!(insn.opcode(), Opcode::AddIntLit8);
        assert_eq!(insn.register(0), Some(0));
        assert_eq!(insn.register(1), Some(1));
        assert_eq!(insn.register(2), None);
        assert_eq!(insn.literal(2), Some(-3));
        assert_eq!(insn.literal(0), None);
        assert!(insn.operand(3).is_none());
        assert_eq!(insn.reference(0), None);

        let cls = Instruction::new(
            Opcode::ConstClass,
            [Operand::Register(2), Operand::TypeRef("Ljava/lang/Object;".into())],
        );
        assert_eq!(cls.reference(1), Some("Ljava/lang/Object;"));
    }

    #[test]
    fn test_matches_format() {
        let ok = Instruction::new(
            Opcode::AddInt,
            [Operand::Register(0), Operand::Register(1), Operand::Register(2)],
        );
        assert!(ok.matches_format());

        let short = Instruction::new(Opcode::AddInt, [Operand::Register(0), Operand::Register(1)]);
        assert!(!short.matches_format());

        let wrong_kind = Instruction::new(
            Opcode::AddInt,
            [Operand::Register(0), Operand::Register(1), Operand::Literal(2)],
        );
        assert!(!wrong_kind.matches_format());

        let invoke = Instruction::new(
            Opcode::InvokeStatic,
            [Operand::Register(0), Operand::MethodRef("LFoo;->bar(I)V".into())],
        );
        assert!(!invoke.matches_format());
    }

    #[test]
    fn test_display() {
        let insn = Instruction::new(
            Opcode::ConstString,
            [Operand::Register(3), Operand::StringRef("hi".into())],
        );
        assert_eq!(insn.to_string(), "const-string v3, \"hi\"");
        assert_eq!(Instruction::new(Opcode::ReturnVoid, []).to_string(), "return-void");
        let lit = Instruction::new(Opcode::Const4, [Operand::Register(0), Operand::Literal(5)]);
        assert_eq!(lit.to_string(), "const/4 v0, 0x5");
    }
}
