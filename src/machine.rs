//! A complete SIA machine: one CPU, its memory, and the interrupt services
//! that print register and memory dumps.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cpu::{Cpu, Cycle, Event, Trap};
use crate::decoder::SiaDecoder;
use crate::exec::IntExecutor;
use crate::memory::{Bus, LinearMemory, MemError, DEFAULT_MEM_SIZE, MAX_MEM_SIZE};

/// Interrupt code that dumps the register file.
pub const INT_DUMP_REGISTERS: u16 = 0;
/// Interrupt code that dumps the start of memory.
pub const INT_DUMP_MEMORY: u16 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    pub mem_size: usize,
    /// Bytes shown by the memory dump interrupt.
    pub dump_bytes: usize,
    pub dump_per_line: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            mem_size: DEFAULT_MEM_SIZE,
            dump_bytes: 120,
            dump_per_line: 5,
        }
    }
}

impl MachineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let txt = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let cfg: Self = serde_json::from_str(&txt)
            .with_context(|| format!("invalid config {}", path.display()))?;
        cfg.validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), MemError> {
        if self.mem_size > MAX_MEM_SIZE {
            return Err(MemError::SizeTooLarge { size: self.mem_size, max: MAX_MEM_SIZE });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct Machine {
    pub cpu: Cpu,
    pub mem: LinearMemory,
    pub cfg: MachineConfig,
    dec: SiaDecoder,
    exec: IntExecutor,
}

impl Machine {
    pub fn new(cfg: MachineConfig) -> Result<Self> {
        let mem = LinearMemory::new(cfg.mem_size)
            .with_context(|| format!("cannot create memory of {} bytes", cfg.mem_size))?;
        Ok(Self {
            cpu: Cpu::new(),
            mem,
            cfg,
            dec: SiaDecoder::new(),
            exec: IntExecutor,
        })
    }

    pub fn with_image(cfg: MachineConfig, image: &[u8]) -> Result<Self> {
        let mut m = Self::new(cfg)?;
        m.mem.load_image(image)?;
        Ok(m)
    }

    /// Load a raw, header-less image file into memory at address 0.
    pub fn load_file(cfg: MachineConfig, path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        tracing::debug!(path = %path.display(), len = bytes.len(), "loaded image");
        Self::with_image(cfg, &bytes).with_context(|| format!("failed to load {}", path.display()))
    }

    /// Run one cycle, servicing an interrupt if the instruction raised one.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Event, Trap> {
        let event = self.cpu.step(&mut self.mem, &self.dec, &self.exec)?;
        if let Event::Interrupt { code, cycle } = event {
            self.service(code, &cycle, out)?;
        }
        Ok(event)
    }

    /// Cycle until a halt instruction executes. Returns the cycle count,
    /// the halting cycle included.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<u64, Trap> {
        let mut cycles = 0u64;
        while !self.cpu.halted {
            self.step(out)?;
            cycles += 1;
        }
        tracing::debug!(cycles, pc = self.cpu.pc, "halted");
        Ok(cycles)
    }

    fn service<W: Write>(&self, code: u16, cycle: &Cycle, out: &mut W) -> Result<(), Trap> {
        tracing::debug!(code, pc = cycle.at, "interrupt");
        match code {
            INT_DUMP_REGISTERS => self.dump_registers(cycle, out)?,
            INT_DUMP_MEMORY => self.dump_memory(out)?,
            _ => {}
        }
        Ok(())
    }

    pub fn dump_registers<W: Write>(&self, cycle: &Cycle, out: &mut W) -> std::io::Result<()> {
        for (i, v) in self.cpu.regs.iter().enumerate() {
            writeln!(out, "R[{i}] = {v}")?;
        }
        writeln!(out, "OP1 = {}, OP2 = {}", cycle.op1, cycle.op2)?;
        writeln!(out, "Result = {}", cycle.result)?;
        writeln!(out, "PC = {}", self.cpu.pc)
    }

    pub fn dump_memory<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let n = self.cfg.dump_bytes.min(self.mem.size());
        let per_line = self.cfg.dump_per_line.max(1);
        let shown = &self.mem.bytes()[..n];
        for (row, chunk) in shown.chunks(per_line).enumerate() {
            let line = chunk
                .iter()
                .enumerate()
                .map(|(k, b)| format!("Memory[{}] = {}", row * per_line + k, b))
                .collect::<Vec<_>>()
                .join(" | ");
            writeln!(out, "{line}")?;
        }
        Ok(())
    }
}
