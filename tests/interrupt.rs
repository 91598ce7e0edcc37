use pretty_assertions::assert_eq;
use sia_rs::{Machine, MachineConfig};

fn run(cfg: MachineConfig, image: &[u8]) -> (Machine, String) {
    let mut m = Machine::with_image(cfg, image).unwrap();
    let mut out = Vec::new();
    m.run(&mut out).unwrap();
    (m, String::from_utf8(out).unwrap())
}

#[test]
fn register_dump() {
    let image = [
        0x91, 0x07, // addimmediate r1 7
        0x80, 0x00, // interrupt 0
        0x00, 0x00, // halt
    ];
    let (m, out) = run(MachineConfig::default(), &image);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 19);
    assert_eq!(lines[0], "R[0] = 0");
    assert_eq!(lines[1], "R[1] = 7");
    assert_eq!(lines[15], "R[15] = 0");
    assert_eq!(lines[16], "OP1 = 0, OP2 = 0");
    assert_eq!(lines[17], "Result = 0");
    assert_eq!(lines[18], "PC = 4");
    // interrupt never behaves like add-immediate
    assert_eq!(m.cpu.regs[0], 0);
}

#[test]
fn memory_dump_five_per_line() {
    let image = [
        0x80, 0x01, // interrupt 1
        0x00, 0x00, // halt
    ];
    let (_, out) = run(MachineConfig::default(), &image);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 24);
    assert_eq!(
        lines[0],
        "Memory[0] = 128 | Memory[1] = 1 | Memory[2] = 0 | Memory[3] = 0 | Memory[4] = 0"
    );
    assert!(lines[23].starts_with("Memory[115] = 0"));
    assert!(lines[23].ends_with("Memory[119] = 0"));
}

#[test]
fn memory_dump_is_capped_by_capacity() {
    let cfg = MachineConfig { mem_size: 12, ..MachineConfig::default() };
    let (_, out) = run(cfg, &[0x80, 0x01, 0x00, 0x00]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "Memory[10] = 0 | Memory[11] = 0");
}

#[test]
fn other_codes_are_silent() {
    let (m, out) = run(MachineConfig::default(), &[0x80, 0x05, 0x8F, 0xFF, 0x00, 0x00]);
    assert!(out.is_empty());
    assert_eq!(m.cpu.pc, 6);
}

#[test]
fn config_fields_default_individually() {
    let cfg: MachineConfig = serde_json::from_str(r#"{ "mem_size": 256 }"#).unwrap();
    assert_eq!(cfg.mem_size, 256);
    assert_eq!(cfg.dump_bytes, 120);
    assert_eq!(cfg.dump_per_line, 5);
}
