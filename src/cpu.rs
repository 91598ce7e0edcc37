use anyhow::Error;
use serde::{Deserialize, Serialize};

use crate::decoder::{Decoded, Decoder};
use crate::disasm::fmt_decoded;
use crate::exec::Executor;
use crate::isa::{Opcode, REG_COUNT};
use crate::memory::Bus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cpu {
    pub pc: u32,                // Byte offset of the next fetch
    pub regs: [i32; REG_COUNT], // General purpose registers R0..R15
    pub halted: bool,
}

/// Values latched for the instruction currently in flight. Rebuilt from
/// scratch every cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    /// Address the instruction was fetched from.
    pub at: u32,
    pub op1: i32,
    pub op2: i32,
    pub result: i32,
}

/// What a completed cycle asks of its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Continue,
    Halted,
    Interrupt { code: u16, cycle: Cycle },
}

#[derive(thiserror::Error, Debug)]
pub enum Trap {
    #[error("Instruction fetch out of bounds at pc {pc:#06x}: {source}")]
    Fetch { pc: u32, #[source] source: Error },
    #[error("Memory access out of bounds at {addr:#010x}: {source}")]
    Bus { addr: u32, #[source] source: Error },
    #[error("Divide by zero at pc {pc:#06x}")]
    DivideByZero { pc: u32 },
    #[error("Console write failed: {0}")]
    Console(#[from] std::io::Error),
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            pc: 0,
            regs: [0; REG_COUNT],
            halted: false,
        }
    }

    #[inline]
    pub fn reg(&self, r: u8) -> i32 {
        self.regs[(r & 0xF) as usize]
    }

    #[inline]
    pub fn set_reg(&mut self, r: u8, v: i32) {
        self.regs[(r & 0xF) as usize] = v;
    }

    /// One full fetch / decode / execute / store cycle.
    pub fn step<B: Bus, D: Decoder, X: Executor>(
        &mut self,
        bus: &mut B,
        dec: &D,
        exec: &X,
    ) -> Result<Event, Trap> {
        let pc = self.pc;
        // Always fetch 4 bytes; short forms only look at the first two
        let raw32 = bus
            .read_u32(pc)
            .map_err(|source| Trap::Fetch { pc, source })?;
        let d = dec.decode(raw32);
        tracing::trace!(pc, insn = %fmt_decoded(&d), "decode");

        let mut cycle = self.dispatch(&d, pc);
        let event = exec.execute(self, bus, &d, &mut cycle)?;
        exec.store(self, bus, &d, &cycle)?;
        Ok(event)
    }

    /// Decode phase: latch operands and advance pc past the instruction, so
    /// any control transfer in execute is relative to the next instruction.
    fn dispatch(&mut self, d: &Decoded, at: u32) -> Cycle {
        let mut c = Cycle { at, ..Cycle::default() };
        match d.op {
            Opcode::Halt => {}
            Opcode::Add
            | Opcode::And
            | Opcode::Divide
            | Opcode::Multiply
            | Opcode::Subtract
            | Opcode::Or
            | Opcode::BranchIfEqual
            | Opcode::BranchIfLess => {
                c.op1 = self.reg(d.rs1);
                c.op2 = self.reg(d.rs2);
            }
            Opcode::Shift | Opcode::AddImmediate => {
                c.op1 = self.reg(d.rs1);
                c.op2 = d.imm;
            }
            Opcode::Interrupt | Opcode::Jump => {
                c.op1 = d.imm;
            }
            Opcode::IterateOver => {
                c.op1 = self.reg(d.rs1);
                c.op2 = d.imm;
            }
            Opcode::Load => {
                c.op1 = self.reg(d.rd);
                c.op2 = self.reg(d.rs1);
            }
            Opcode::Store => {
                c.op1 = self.reg(d.rs2);
                c.op2 = self.reg(d.rs1);
            }
        }
        self.pc = at.wrapping_add(d.width as u32);
        c
    }
}
