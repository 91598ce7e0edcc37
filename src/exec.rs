use crate::cpu::{Cpu, Cycle, Event, Trap};
use crate::decoder::Decoded;
use crate::isa::{Opcode, ShiftCtl};
use crate::memory::Bus;

/// Execute and store phases of a cycle. The decode phase has already latched
/// operands into `Cycle` and advanced `cpu.pc`.
pub trait Executor {
    fn execute<B: Bus>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        d: &Decoded,
        c: &mut Cycle,
    ) -> Result<Event, Trap>;

    fn store<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: &Decoded, c: &Cycle) -> Result<(), Trap>;
}

#[derive(Debug)]
pub struct IntExecutor;

impl Executor for IntExecutor {
    fn execute<B: Bus>(
        &self,
        cpu: &mut Cpu,
        bus: &mut B,
        d: &Decoded,
        c: &mut Cycle,
    ) -> Result<Event, Trap> {
        match d.op {
            Opcode::Halt => {
                cpu.halted = true;
                return Ok(Event::Halted);
            }
            Opcode::Add => c.result = c.op1.wrapping_add(c.op2),
            Opcode::And => c.result = c.op1 & c.op2,
            Opcode::Divide => {
                if c.op2 == 0 {
                    return Err(Trap::DivideByZero { pc: c.at });
                }
                c.result = c.op1.wrapping_div(c.op2);
            }
            Opcode::Multiply => c.result = c.op1.wrapping_mul(c.op2),
            Opcode::Subtract => c.result = c.op1.wrapping_sub(c.op2),
            Opcode::Or => c.result = c.op1 | c.op2,
            Opcode::Shift => {
                let amount = c.op2 as u32;
                // Arithmetic shift on the signed register value
                c.result = if ShiftCtl::from_bits_truncate(d.imm2 as u8).contains(ShiftCtl::RIGHT) {
                    c.op1.wrapping_shr(amount)
                } else {
                    c.op1.wrapping_shl(amount)
                };
            }
            Opcode::Interrupt => {
                return Ok(Event::Interrupt {
                    code: c.op1 as u16,
                    cycle: *c,
                });
            }
            Opcode::AddImmediate => c.result = c.op1.wrapping_add(c.op2),
            Opcode::BranchIfEqual => {
                if c.op1 == c.op2 {
                    branch(cpu, d.imm);
                }
            }
            Opcode::BranchIfLess => {
                if c.op1 < c.op2 {
                    branch(cpu, d.imm);
                }
            }
            Opcode::Jump => cpu.pc = c.op1 as u32,
            Opcode::IterateOver => {
                let addr = (c.op1 as u32).wrapping_add(d.imm2);
                c.result = bus
                    .read_u32(addr)
                    .map_err(|source| Trap::Bus { addr, source })? as i32;
                if c.result != 0 {
                    // pc already points past this 4-byte instruction
                    let back = (c.op2 as u32).wrapping_add(4);
                    cpu.pc = cpu.pc.wrapping_sub(back);
                }
            }
            Opcode::Load | Opcode::Store => {
                // Effective address; the transfer happens in store
                c.result = c.op2.wrapping_add(d.imm);
            }
        }
        Ok(Event::Continue)
    }

    fn store<B: Bus>(&self, cpu: &mut Cpu, bus: &mut B, d: &Decoded, c: &Cycle) -> Result<(), Trap> {
        match d.op {
            Opcode::Add
            | Opcode::And
            | Opcode::Divide
            | Opcode::Multiply
            | Opcode::Subtract
            | Opcode::Or
            | Opcode::Shift
            | Opcode::AddImmediate
            | Opcode::IterateOver => cpu.set_reg(d.rd, c.result),
            Opcode::Load => {
                let addr = c.result as u32;
                let val = bus
                    .read_u32(addr)
                    .map_err(|source| Trap::Bus { addr, source })?;
                cpu.set_reg(d.rd, val as i32);
            }
            Opcode::Store => {
                let addr = c.result as u32;
                bus.write_u32(addr, c.op1 as u32)
                    .map_err(|source| Trap::Bus { addr, source })?;
            }
            Opcode::Halt
            | Opcode::Interrupt
            | Opcode::BranchIfEqual
            | Opcode::BranchIfLess
            | Opcode::Jump => {}
        }
        Ok(())
    }
}

/// Branch displacements count from the branch itself; pc has already moved
/// 4 bytes past it.
fn branch(cpu: &mut Cpu, disp: i32) {
    cpu.pc = cpu.pc.wrapping_add(disp.wrapping_sub(4) as u32);
}
