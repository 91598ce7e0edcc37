//! SIA instruction-set definition.
//!
//! Every instruction starts with the opcode in the high nibble of byte 0.
//! Opcodes 10..=13 (branches, jump, iterate-over) use the 4-byte long form,
//! everything else is 2 bytes.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub const REG_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Halt = 0,
    Add = 1,
    And = 2,
    Divide = 3,
    Multiply = 4,
    Subtract = 5,
    Or = 6,
    Shift = 7,
    Interrupt = 8,
    AddImmediate = 9,
    BranchIfEqual = 10,
    BranchIfLess = 11,
    Jump = 12,
    IterateOver = 13,
    Load = 14,
    Store = 15,
}

impl Opcode {
    /// Every nibble value is assigned, so this never fails.
    pub fn from_nibble(n: u8) -> Self {
        match n & 0xF {
            0 => Opcode::Halt,
            1 => Opcode::Add,
            2 => Opcode::And,
            3 => Opcode::Divide,
            4 => Opcode::Multiply,
            5 => Opcode::Subtract,
            6 => Opcode::Or,
            7 => Opcode::Shift,
            8 => Opcode::Interrupt,
            9 => Opcode::AddImmediate,
            10 => Opcode::BranchIfEqual,
            11 => Opcode::BranchIfLess,
            12 => Opcode::Jump,
            13 => Opcode::IterateOver,
            14 => Opcode::Load,
            _ => Opcode::Store,
        }
    }

    pub fn nibble(self) -> u8 {
        self as u8
    }

    pub fn is_long(self) -> bool {
        matches!(
            self,
            Opcode::BranchIfEqual | Opcode::BranchIfLess | Opcode::Jump | Opcode::IterateOver
        )
    }

    /// Encoded size in bytes (2 or 4).
    pub fn width(self) -> u8 {
        if self.is_long() {
            4
        } else {
            2
        }
    }

    /// Canonical assembler spelling. Shift is direction dependent and
    /// reports `leftshift`; the disassembler picks the real one.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Halt => "halt",
            Opcode::Add => "add",
            Opcode::And => "and",
            Opcode::Divide => "divide",
            Opcode::Multiply => "multiply",
            Opcode::Subtract => "subtract",
            Opcode::Or => "or",
            Opcode::Shift => "leftshift",
            Opcode::Interrupt => "interrupt",
            Opcode::AddImmediate => "addimmediate",
            Opcode::BranchIfEqual => "branchifequal",
            Opcode::BranchIfLess => "branchifless",
            Opcode::Jump => "jump",
            Opcode::IterateOver => "iterateover",
            Opcode::Load => "load",
            Opcode::Store => "store",
        }
    }
}

/// Operand layout of an instruction, named after the fields that follow the
/// opcode nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// No operands.
    None,
    /// `Ra`, `Rb:hi | Rc:lo`.
    ThreeReg,
    /// `Ra`, control byte: direction bit 0x20, 5-bit amount.
    Shift { right: bool },
    /// `Ra`, the 6-bit control field written out directly.
    ShiftRaw,
    /// 12-bit code: low nibble of byte 0, then byte 1.
    Code12,
    /// `Ra`, signed byte.
    RegImm8,
    /// `Ra`, `Rb:hi | S20[19:16]`, `S20[15:8]`, `S20[7:0]`.
    RegRegDisp20,
    /// 28-bit absolute address across the low nibble of byte 0 and bytes 1..=3.
    Abs28,
    /// `Ra`, unsigned 8-bit pointer offset, unsigned 16-bit delta.
    RegPtrDelta,
    /// `Ra`, `Rb:hi | S4:lo`.
    RegRegDisp4,
}

impl Layout {
    /// Number of operand tokens the assembler expects.
    pub fn arity(self) -> usize {
        match self {
            Layout::None => 0,
            Layout::Code12 | Layout::Abs28 => 1,
            Layout::Shift { .. } | Layout::ShiftRaw | Layout::RegImm8 => 2,
            Layout::ThreeReg | Layout::RegRegDisp20 | Layout::RegPtrDelta | Layout::RegRegDisp4 => 3,
        }
    }

    /// Human readable operand shape, used in error messages.
    pub fn syntax(self) -> &'static str {
        match self {
            Layout::None => "",
            Layout::ThreeReg => "rA rB rC",
            Layout::Shift { .. } => "rA amount",
            Layout::ShiftRaw => "rA control",
            Layout::Code12 => "code",
            Layout::RegImm8 => "rA value",
            Layout::RegRegDisp20 => "rA rB offset",
            Layout::Abs28 => "address",
            Layout::RegPtrDelta => "rA pointer-offset delta",
            Layout::RegRegDisp4 => "rA rB offset",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct InstrDesc {
    pub op: Opcode,
    pub mnemonic: &'static str,
    pub layout: Layout,
}

const fn desc(op: Opcode, mnemonic: &'static str, layout: Layout) -> InstrDesc {
    InstrDesc { op, mnemonic, layout }
}

pub const TABLE: &[InstrDesc] = &[
    desc(Opcode::Halt, "halt", Layout::None),
    desc(Opcode::Add, "add", Layout::ThreeReg),
    desc(Opcode::And, "and", Layout::ThreeReg),
    desc(Opcode::Divide, "divide", Layout::ThreeReg),
    desc(Opcode::Multiply, "multiply", Layout::ThreeReg),
    desc(Opcode::Subtract, "subtract", Layout::ThreeReg),
    desc(Opcode::Or, "or", Layout::ThreeReg),
    desc(Opcode::Shift, "leftshift", Layout::Shift { right: false }),
    desc(Opcode::Shift, "rightshift", Layout::Shift { right: true }),
    desc(Opcode::Shift, "shift", Layout::ShiftRaw),
    desc(Opcode::Interrupt, "interrupt", Layout::Code12),
    desc(Opcode::AddImmediate, "addimmediate", Layout::RegImm8),
    desc(Opcode::AddImmediate, "add-immediate", Layout::RegImm8),
    desc(Opcode::BranchIfEqual, "branchifequal", Layout::RegRegDisp20),
    desc(Opcode::BranchIfEqual, "branch-if-equal", Layout::RegRegDisp20),
    desc(Opcode::BranchIfLess, "branchifless", Layout::RegRegDisp20),
    desc(Opcode::BranchIfLess, "branch-if-less", Layout::RegRegDisp20),
    desc(Opcode::Jump, "jump", Layout::Abs28),
    desc(Opcode::IterateOver, "iterateover", Layout::RegPtrDelta),
    desc(Opcode::IterateOver, "iterate-over", Layout::RegPtrDelta),
    desc(Opcode::Load, "load", Layout::RegRegDisp4),
    desc(Opcode::Store, "store", Layout::RegRegDisp4),
];

/// Exact, case-sensitive mnemonic lookup.
pub fn lookup(mnemonic: &str) -> Option<&'static InstrDesc> {
    TABLE.iter().find(|d| d.mnemonic == mnemonic)
}

bitflags! {
    /// Control byte of the shift instruction (byte 1).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShiftCtl: u8 {
        const RIGHT = 0x20;
    }
}

pub const SHIFT_AMOUNT_MASK: u8 = 0x1F;

/// Two's-complement sign extension of the low `bits` bits of `v`.
#[inline]
pub fn sign_ext(v: u32, bits: u32) -> i32 {
    let s = 32 - bits;
    ((v << s) as i32) >> s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_ext_follows_top_bit() {
        assert_eq!(sign_ext(7, 4), 7);
        assert_eq!(sign_ext(8, 4), -8);
        assert_eq!(sign_ext(0xF, 4), -1);
        assert_eq!(sign_ext(0xF_FFFC, 20), -4);
        assert_eq!(sign_ext(0x7_FFFF, 20), 0x7_FFFF);
    }

    #[test]
    fn nibbles_round_trip() {
        for n in 0u8..16 {
            assert_eq!(Opcode::from_nibble(n).nibble(), n);
        }
    }

    #[test]
    fn long_form_is_branch_jump_iterate() {
        let long: Vec<u8> = (0u8..16)
            .filter(|&n| Opcode::from_nibble(n).width() == 4)
            .collect();
        assert_eq!(long, vec![10, 11, 12, 13]);
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(lookup("add").is_some());
        assert!(lookup("ADD").is_none());
        assert_eq!(lookup("branch-if-less").map(|d| d.op), Some(Opcode::BranchIfLess));
        assert_eq!(lookup("shift").map(|d| d.layout), Some(Layout::ShiftRaw));
    }
}
