use crate::decoder::Decoded;
use crate::isa::{Opcode, ShiftCtl};

/// Render in the syntax `sia-asm` accepts; assembling the text gives back
/// the same bytes.
pub fn fmt_decoded(d: &Decoded) -> String {
    let mn = d.op.mnemonic();
    match d.op {
        Opcode::Halt => mn.to_string(),
        Opcode::Add
        | Opcode::And
        | Opcode::Divide
        | Opcode::Multiply
        | Opcode::Subtract
        | Opcode::Or => format!("{} r{} r{} r{}", mn, d.rs1, d.rs2, d.rd),
        Opcode::Shift => {
            let right = ShiftCtl::from_bits_truncate(d.imm2 as u8).contains(ShiftCtl::RIGHT);
            let mn = if right { "rightshift" } else { "leftshift" };
            format!("{} r{} {}", mn, d.rd, d.imm)
        }
        Opcode::Interrupt | Opcode::Jump => format!("{} {}", mn, d.imm),
        Opcode::AddImmediate => format!("{} r{} {}", mn, d.rd, d.imm),
        Opcode::BranchIfEqual | Opcode::BranchIfLess => {
            format!("{} r{} r{} {}", mn, d.rs1, d.rs2, d.imm)
        }
        Opcode::IterateOver => format!("{} r{} {} {}", mn, d.rd, d.imm2, d.imm),
        Opcode::Load => format!("{} r{} r{} {}", mn, d.rd, d.rs1, d.imm),
        Opcode::Store => format!("{} r{} r{} {}", mn, d.rs2, d.rs1, d.imm),
    }
}

/// Space separated hex bytes of the encoded instruction.
pub fn fmt_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}
