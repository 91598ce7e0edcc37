use pretty_assertions::assert_eq;
use sia_rs::decoder::SiaDecoder;
use sia_rs::exec::IntExecutor;
use sia_rs::{Cpu, Event, LinearMemory, Machine, MachineConfig};

// 3R form: op:Ra | Rb:Rc
fn enc_3r(op: u8, a: u8, b: u8, c: u8) -> [u8; 2] {
    [(op << 4) | a, (b << 4) | c]
}

#[test]
fn halt_sets_flag_and_touches_nothing() {
    let mut mem = LinearMemory::new(64).unwrap();
    let mut cpu = Cpu::new();
    cpu.regs[4] = 9;
    let before = mem.mem.clone();

    let ev = cpu.step(&mut mem, &SiaDecoder, &IntExecutor).unwrap();
    assert_eq!(ev, Event::Halted);
    assert!(cpu.halted);
    assert_eq!(cpu.regs[4], 9);
    assert_eq!(cpu.regs.iter().filter(|&&r| r != 0).count(), 1);
    assert_eq!(mem.mem, before);
}

#[test]
fn add_writes_third_register_only() {
    let mut mem = LinearMemory::new(64).unwrap();
    mem.load_image(&enc_3r(1, 1, 2, 3)).unwrap();
    assert_eq!(&mem.mem[..2], &[0x11, 0x23]);

    let mut cpu = Cpu::new();
    cpu.regs[1] = 5;
    cpu.regs[2] = 7;
    cpu.step(&mut mem, &SiaDecoder, &IntExecutor).unwrap();
    assert_eq!(cpu.regs[3], 12);
    assert_eq!(cpu.regs[1], 5);
    assert_eq!(cpu.regs[2], 7);
    assert_eq!(cpu.pc, 2);
}

#[test]
fn subtract_destination_is_third_operand() {
    // subtract r2 r0 r1
    let mut mem = LinearMemory::new(64).unwrap();
    mem.load_image(&enc_3r(5, 2, 0, 1)).unwrap();
    let mut cpu = Cpu::new();
    cpu.regs[2] = 10;
    cpu.regs[0] = 4;
    cpu.step(&mut mem, &SiaDecoder, &IntExecutor).unwrap();
    assert_eq!(cpu.regs[1], 6);
}

#[test]
fn machine_runs_until_halt() {
    let mut image = Vec::new();
    image.extend_from_slice(&[0x91, 0x05]); // addimmediate r1 5
    image.extend_from_slice(&[0x92, 0xFE]); // addimmediate r2 -2
    image.extend_from_slice(&enc_3r(4, 1, 2, 3)); // multiply r1 r2 r3
    image.extend_from_slice(&[0x00, 0x00]); // halt

    let mut m = Machine::with_image(MachineConfig::default(), &image).unwrap();
    let mut out = Vec::new();
    let cycles = m.run(&mut out).unwrap();
    assert_eq!(cycles, 4);
    assert_eq!(m.cpu.regs[3], -10);
    assert_eq!(m.cpu.pc, 8);
    assert!(out.is_empty());
}

#[test]
fn cpu_state_serializes() {
    let mut cpu = Cpu::new();
    cpu.regs[15] = -1;
    cpu.pc = 6;
    let json = serde_json::to_string(&cpu).unwrap();
    let back: Cpu = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cpu);
}
