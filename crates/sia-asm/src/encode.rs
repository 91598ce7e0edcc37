use sia_rs::isa::{lookup, Layout, ShiftCtl};

use crate::parse::{fit, parse_num, parse_reg, strip_comment, AsmError};

/// One encoded instruction, 2 or 4 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoded {
    bytes: [u8; 4],
    len: u8,
}

impl Encoded {
    fn short(b0: u8, b1: u8) -> Self {
        Self { bytes: [b0, b1, 0, 0], len: 2 }
    }

    fn long(b0: u8, b1: u8, b2: u8, b3: u8) -> Self {
        Self { bytes: [b0, b1, b2, b3], len: 4 }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// Encode one source line. Blank and comment lines give `Ok(None)`.
pub fn assemble_line(line: &str) -> Result<Option<Encoded>, AsmError> {
    let mut toks = strip_comment(line).split_whitespace();
    let Some(mn) = toks.next() else {
        return Ok(None);
    };
    let desc = lookup(mn).ok_or_else(|| AsmError::UnknownMnemonic(mn.to_string()))?;
    let ops: Vec<&str> = toks.collect();
    let arity = desc.layout.arity();
    if ops.len() < arity {
        return Err(AsmError::Malformed {
            mnemonic: mn.to_string(),
            expected: arity,
            found: ops.len(),
            syntax: desc.layout.syntax(),
        });
    }
    if ops.len() > arity {
        tracing::warn!(mnemonic = mn, extra = ?&ops[arity..], "ignoring extra operands");
    }

    let op = desc.op.nibble() << 4;
    let enc = match desc.layout {
        Layout::None => Encoded::short(op, 0),
        Layout::ThreeReg => {
            let (ra, rb, rc) = (parse_reg(ops[0])?, parse_reg(ops[1])?, parse_reg(ops[2])?);
            Encoded::short(op | ra, (rb << 4) | rc)
        }
        Layout::Shift { right } => {
            let ra = parse_reg(ops[0])?;
            let amount = fit(parse_num(ops[1])?, 5, "shift amount") as u8;
            let ctl = if right { ShiftCtl::RIGHT } else { ShiftCtl::empty() };
            Encoded::short(op | ra, ctl.bits() | amount)
        }
        Layout::ShiftRaw => {
            let ra = parse_reg(ops[0])?;
            let ctl = fit(parse_num(ops[1])?, 6, "shift control") as u8;
            Encoded::short(op | ra, ctl)
        }
        Layout::Code12 => {
            let code = fit(parse_num(ops[0])?, 12, "interrupt code");
            Encoded::short(op | (code >> 8) as u8, code as u8)
        }
        Layout::RegImm8 => {
            let ra = parse_reg(ops[0])?;
            let imm = fit(parse_num(ops[1])?, 8, "immediate");
            Encoded::short(op | ra, imm as u8)
        }
        Layout::RegRegDisp20 => {
            let (ra, rb) = (parse_reg(ops[0])?, parse_reg(ops[1])?);
            let off = fit(parse_num(ops[2])?, 20, "branch offset");
            Encoded::long(op | ra, (rb << 4) | (off >> 16) as u8, (off >> 8) as u8, off as u8)
        }
        Layout::Abs28 => {
            let addr = fit(parse_num(ops[0])?, 28, "jump address");
            Encoded::long(op | (addr >> 24) as u8, (addr >> 16) as u8, (addr >> 8) as u8, addr as u8)
        }
        Layout::RegPtrDelta => {
            let ra = parse_reg(ops[0])?;
            let ptr = fit(parse_num(ops[1])?, 8, "pointer offset");
            let delta = fit(parse_num(ops[2])?, 16, "delta");
            Encoded::long(op | ra, ptr as u8, (delta >> 8) as u8, delta as u8)
        }
        Layout::RegRegDisp4 => {
            let (ra, rb) = (parse_reg(ops[0])?, parse_reg(ops[1])?);
            let off = fit(parse_num(ops[2])?, 4, "memory offset");
            Encoded::short(op | ra, (rb << 4) | off as u8)
        }
    };
    Ok(Some(enc))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based source line.
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}: {source}")]
pub struct LineError {
    pub line: usize,
    #[source]
    pub source: AsmError,
}

/// Assemble a whole source text into a flat image. Unknown mnemonics are
/// reported and skipped; any other error stops at the offending line.
pub fn assemble(text: &str) -> Result<Assembly, LineError> {
    let mut asm = Assembly::default();
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        tracing::debug!(line = line_no, text = line, "read");
        match assemble_line(line) {
            Ok(Some(enc)) => asm.bytes.extend_from_slice(enc.as_bytes()),
            Ok(None) => {}
            Err(e) if e.is_recoverable() => {
                tracing::debug!(line = line_no, "{e}");
                asm.diagnostics.push(Diagnostic { line: line_no, message: e.to_string() });
            }
            Err(source) => return Err(LineError { line: line_no, source }),
        }
    }
    Ok(asm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn bytes(line: &str) -> Vec<u8> {
        assemble_line(line).unwrap().unwrap().as_bytes().to_vec()
    }

    #[test]
    fn halt_is_two_zero_bytes() {
        assert_eq!(bytes("halt"), vec![0x00, 0x00]);
    }

    #[test]
    fn add_packs_three_registers() {
        assert_eq!(bytes("add r1 r2 r3"), vec![0x11, 0x23]);
        assert_eq!(bytes("  subtract R2 r0 1"), vec![0x52, 0x01]);
    }

    #[test]
    fn shifts_share_opcode_seven() {
        assert_eq!(bytes("leftshift r4 3"), vec![0x74, 0x03]);
        assert_eq!(bytes("rightshift r4 31"), vec![0x74, 0x3F]);
    }

    #[test]
    fn generic_shift_takes_the_control_field() {
        assert_eq!(bytes("shift r1 35"), vec![0x71, 0x23]);
        assert_eq!(bytes("shift r1 3"), bytes("leftshift r1 3"));
        let asm = assemble("shift r1 3\nhalt\n").unwrap();
        assert_eq!(asm.bytes, vec![0x71, 0x03, 0x00, 0x00]);
        assert!(asm.diagnostics.is_empty());
    }

    #[test]
    fn encoding_width_follows_the_opcode() {
        for line in ["halt", "or r1 r2 r3", "interrupt 1", "jump 8", "iterate-over r1 4 8"] {
            let enc = assemble_line(line).unwrap().unwrap();
            let op = sia_rs::isa::Opcode::from_nibble(enc.as_bytes()[0] >> 4);
            assert_eq!(enc.as_bytes().len(), op.width() as usize, "{line}");
        }
    }

    #[test]
    fn negative_branch_offset_uses_sign_nibble() {
        assert_eq!(bytes("branchifequal r1 r2 -4"), vec![0xA1, 0x2F, 0xFF, 0xFC]);
        assert_eq!(bytes("branch-if-less r0 r9 300"), vec![0xB0, 0x90, 0x01, 0x2C]);
    }

    #[test]
    fn long_forms() {
        assert_eq!(bytes("jump 66000"), vec![0xC0, 0x01, 0x01, 0xD0]);
        assert_eq!(bytes("iterateover r2 4 12"), vec![0xD2, 0x04, 0x00, 0x0C]);
    }

    #[test]
    fn short_immediates() {
        assert_eq!(bytes("addimmediate r1 -1"), vec![0x91, 0xFF]);
        assert_eq!(bytes("interrupt 258"), vec![0x81, 0x02]);
        assert_eq!(bytes("load r1 r2 -2"), vec![0xE1, 0x2E]);
        assert_eq!(bytes("store r3 r4 7"), vec![0xF3, 0x47]);
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert_eq!(assemble_line("").unwrap(), None);
        assert_eq!(assemble_line("   \t").unwrap(), None);
        assert_eq!(assemble_line("; nothing").unwrap(), None);
    }

    #[test]
    fn missing_operand_is_malformed() {
        let err = assemble_line("add r1 r2").unwrap_err();
        assert!(matches!(err, AsmError::Malformed { expected: 3, found: 2, .. }));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn mnemonics_are_case_sensitive() {
        assert_eq!(
            assemble_line("Add r1 r2 r3"),
            Err(AsmError::UnknownMnemonic("Add".into()))
        );
    }

    #[test]
    fn unknown_mnemonic_is_skipped_with_diagnostic() {
        let asm = assemble("add r1 r2 r3\nfrobnicate r1\nhalt\n").unwrap();
        assert_eq!(asm.bytes, vec![0x11, 0x23, 0x00, 0x00]);
        assert_eq!(
            asm.diagnostics,
            vec![Diagnostic {
                line: 2,
                message: "\"frobnicate\" is not a recognized SIA instruction".into(),
            }]
        );
    }

    #[test]
    fn malformed_line_stops_assembly() {
        let err = assemble("halt\nload r1\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.to_string().starts_with("line 2: malformed instruction"));
    }
}
