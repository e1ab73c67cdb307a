//! Mid-level SSA intermediate representation.
//!
//! The backend consumes this read-only: a module owns functions, a
//! function owns basic blocks, a block owns instructions and exactly one
//! terminator. Instruction and terminator operations are plain strings;
//! the backend's dispatch table rejects anything it does not know.
//! Value IDs are unique within a function and each has one defining
//! instruction (SSA); instructions producing no value carry the invalid
//! sentinel.

use std::fmt;

/// SSA value identifier, unique within one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ValueId(pub u32);

impl ValueId {
    /// Sentinel for instructions that produce no value.
    pub const INVALID: ValueId = ValueId(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != ValueId::INVALID
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirModule {
    pub functions: Vec<MirFunction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirFunction {
    pub name: String,
    /// Source-language return type, e.g. `int` or `Promise<string>`.
    pub return_type: String,
    pub params: Vec<MirParam>,
    pub blocks: Vec<BasicBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MirParam {
    pub id: ValueId,
    pub name: String,
    pub ty: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// The first block of a function is conventionally `entry`.
    pub name: String,
    pub insts: Vec<Inst>,
    pub terminator: Terminator,
}

/// Placeholder type string for values whose type is left to the backend.
pub const TYPE_INFER: &str = "<infer>";

#[derive(Debug, Clone, PartialEq)]
pub struct Inst {
    pub id: ValueId,
    pub op: String,
    /// Source-language type string; may be empty or [`TYPE_INFER`].
    pub ty: String,
    pub operands: Vec<Operand>,
}

impl Inst {
    pub fn new(
        id: ValueId,
        op: impl Into<String>,
        ty: impl Into<String>,
        operands: Vec<Operand>,
    ) -> Self {
        Inst {
            id,
            op: op.into(),
            ty: ty.into(),
            operands,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperandKind {
    /// Reference to the value produced by an earlier instruction.
    Value(ValueId),
    /// Literal text, e.g. `42`, `3.5`, `"hi"`, `true`.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub kind: OperandKind,
    /// Optional source-type annotation for the operand.
    pub ty: Option<String>,
}

impl Operand {
    pub fn value(id: ValueId) -> Self {
        Operand {
            kind: OperandKind::Value(id),
            ty: None,
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Operand {
            kind: OperandKind::Literal(text.into()),
            ty: None,
        }
    }

    pub fn with_ty(mut self, ty: impl Into<String>) -> Self {
        self.ty = Some(ty.into());
        self
    }

    pub fn as_value(&self) -> Option<ValueId> {
        match self.kind {
            OperandKind::Value(id) => Some(id),
            OperandKind::Literal(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match &self.kind {
            OperandKind::Literal(text) => Some(text),
            OperandKind::Value(_) => None,
        }
    }
}

/// Block terminator, sharing the instruction operand model. Known ops are
/// `ret`, `jmp`, `br`, and `cbr`; the backend hard-errors on anything
/// else.
#[derive(Debug, Clone, PartialEq)]
pub struct Terminator {
    pub op: String,
    pub operands: Vec<Operand>,
}

impl Terminator {
    pub fn new(op: impl Into<String>, operands: Vec<Operand>) -> Self {
        Terminator {
            op: op.into(),
            operands,
        }
    }

    pub fn ret(value: Option<ValueId>) -> Self {
        match value {
            Some(id) => Terminator::new("ret", vec![Operand::value(id)]),
            None => Terminator::new("ret", vec![]),
        }
    }

    pub fn jmp(block: impl Into<String>) -> Self {
        Terminator::new("jmp", vec![Operand::literal(block)])
    }

    pub fn cbr(cond: ValueId, then_block: impl Into<String>, else_block: impl Into<String>) -> Self {
        Terminator::new(
            "cbr",
            vec![
                Operand::value(cond),
                Operand::literal(then_block),
                Operand::literal(else_block),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_id_sentinel() {
        assert!(!ValueId::INVALID.is_valid());
        assert!(ValueId(0).is_valid());
        assert_eq!(ValueId(3).to_string(), "v3");
    }

    #[test]
    fn test_operand_accessors() {
        let v = Operand::value(ValueId(1)).with_ty("int");
        assert_eq!(v.as_value(), Some(ValueId(1)));
        assert_eq!(v.as_literal(), None);
        assert_eq!(v.ty.as_deref(), Some("int"));

        let l = Operand::literal("42");
        assert_eq!(l.as_literal(), Some("42"));
        assert_eq!(l.as_value(), None);
    }

    #[test]
    fn test_terminator_builders() {
        assert_eq!(Terminator::ret(None).operands.len(), 0);
        assert_eq!(Terminator::jmp("exit").op, "jmp");
        let cbr = Terminator::cbr(ValueId(2), "then0", "else0");
        assert_eq!(cbr.operands.len(), 3);
    }
}
