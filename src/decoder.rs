use serde::{Deserialize, Serialize};

use crate::isa::{sign_ext, Opcode, ShiftCtl, SHIFT_AMOUNT_MASK};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded {
    pub op: Opcode,
    pub width: u8, // 2 or 4
    pub rd: u8,
    pub rs1: u8,
    pub rs2: u8,
    pub imm: i32,
    /// Secondary field: shift control flags, or the iterate-over pointer offset.
    pub imm2: u32,
}

pub trait Decoder {
    /// `raw32` is the fetch buffer read big-endian, byte 0 in bits 31..24.
    fn decode(&self, raw32: u32) -> Decoded;
}

/// SIA decoder. All sixteen opcode values are assigned, so decoding is total.
#[derive(Debug, Default, Clone, Copy)]
pub struct SiaDecoder;

impl SiaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for SiaDecoder {
    fn decode(&self, raw32: u32) -> Decoded {
        let [b0, b1, b2, b3] = raw32.to_be_bytes();
        let op = Opcode::from_nibble(b0 >> 4);
        let lo0 = b0 & 0xF;
        let hi1 = b1 >> 4;
        let lo1 = b1 & 0xF;

        let mut d = Decoded {
            op,
            width: op.width(),
            rd: 0,
            rs1: 0,
            rs2: 0,
            imm: 0,
            imm2: 0,
        };

        match op {
            Opcode::Halt => {}
            Opcode::Add
            | Opcode::And
            | Opcode::Divide
            | Opcode::Multiply
            | Opcode::Subtract
            | Opcode::Or => {
                d.rs1 = lo0;
                d.rs2 = hi1;
                d.rd = lo1;
            }
            Opcode::Shift => {
                d.rd = lo0;
                d.rs1 = lo0;
                d.imm = (b1 & SHIFT_AMOUNT_MASK) as i32;
                d.imm2 = ShiftCtl::from_bits_truncate(b1).bits() as u32;
            }
            Opcode::Interrupt => {
                d.imm = ((lo0 as i32) << 8) | b1 as i32;
            }
            Opcode::AddImmediate => {
                d.rd = lo0;
                d.rs1 = lo0;
                d.imm = b1 as i8 as i32;
            }
            Opcode::BranchIfEqual | Opcode::BranchIfLess => {
                // S20: sign nibble in the low half of byte 1, then 16 magnitude bits
                d.rs1 = lo0;
                d.rs2 = hi1;
                let disp20 = ((lo1 as u32) << 16) | ((b2 as u32) << 8) | b3 as u32;
                d.imm = sign_ext(disp20, 20);
            }
            Opcode::Jump => {
                d.imm = (raw32 & 0x0FFF_FFFF) as i32;
            }
            Opcode::IterateOver => {
                d.rd = lo0;
                d.rs1 = lo0;
                d.imm = (((b2 as u32) << 8) | b3 as u32) as i32;
                d.imm2 = b1 as u32;
            }
            Opcode::Load => {
                d.rd = lo0;
                d.rs1 = hi1;
                d.imm = sign_ext(lo1 as u32, 4);
            }
            Opcode::Store => {
                d.rs2 = lo0;
                d.rs1 = hi1;
                d.imm = sign_ext(lo1 as u32, 4);
            }
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn be(bytes: [u8; 4]) -> u32 {
        u32::from_be_bytes(bytes)
    }

    #[test]
    fn three_register_destination_is_low_nibble_of_byte1() {
        let d = SiaDecoder.decode(be([0x11, 0x23, 0, 0]));
        assert_eq!(d.op, Opcode::Add);
        assert_eq!((d.rs1, d.rs2, d.rd), (1, 2, 3));
        assert_eq!(d.width, 2);
    }

    #[test]
    fn iterate_over_fields() {
        let d = SiaDecoder.decode(be([0xD4, 0x08, 0x01, 0x02]));
        assert_eq!(d.op, Opcode::IterateOver);
        assert_eq!(d.rd, 4);
        assert_eq!(d.imm2, 8);
        assert_eq!(d.imm, 0x0102);
        assert_eq!(d.width, 4);
    }

    #[test]
    fn jump_target_is_unsigned_28_bits() {
        let d = SiaDecoder.decode(be([0xCF, 0xFF, 0xFF, 0xFE]));
        assert_eq!(d.imm, 0x0FFF_FFFE);
    }

    #[test]
    fn interrupt_code_spans_two_bytes() {
        let d = SiaDecoder.decode(be([0x81, 0x02, 0xAA, 0xBB]));
        assert_eq!(d.op, Opcode::Interrupt);
        assert_eq!(d.imm, 0x102);
    }
}
