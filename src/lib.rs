pub mod cpu;
pub mod decoder;
pub mod disasm;
pub mod exec;
pub mod isa;
pub mod machine;
pub mod memory;

pub use cpu::{Cpu, Cycle, Event, Trap};
pub use machine::{Machine, MachineConfig};
pub use memory::{Bus, LinearMemory, MemError};
