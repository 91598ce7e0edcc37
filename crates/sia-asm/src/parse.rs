//! Token level parsing: registers, numbers, and operand field packing.

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AsmError {
    #[error("\"{0}\" is not a recognized SIA instruction")]
    UnknownMnemonic(String),
    #[error("malformed instruction: {mnemonic} expects {expected} operand(s) `{syntax}`, found {found}")]
    Malformed {
        mnemonic: String,
        expected: usize,
        found: usize,
        syntax: &'static str,
    },
    #[error("bad register operand: {0}")]
    BadRegister(String),
    #[error("bad numeric operand: {0}")]
    BadNumber(String),
}

impl AsmError {
    /// Unknown mnemonics skip the line; everything else stops assembly.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AsmError::UnknownMnemonic(_))
    }
}

/// Drop `;` comments and whole-line `#` comments.
pub fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(';') {
        Some(p) => &line[..p],
        None => line,
    }
}

/// `r3`, `R3` or bare `3`. Indices wider than 4 bits are truncated.
pub fn parse_reg(tok: &str) -> Result<u8, AsmError> {
    let digits = tok
        .strip_prefix('r')
        .or_else(|| tok.strip_prefix('R'))
        .unwrap_or(tok);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AsmError::BadRegister(tok.to_string()));
    }
    let n: u64 = digits
        .parse()
        .map_err(|_| AsmError::BadRegister(tok.to_string()))?;
    if n > 15 {
        tracing::warn!(register = tok, "register index truncated to 4 bits");
    }
    Ok((n & 0xF) as u8)
}

/// Signed decimal.
pub fn parse_num(tok: &str) -> Result<i64, AsmError> {
    tok.parse::<i64>()
        .map_err(|_| AsmError::BadNumber(tok.to_string()))
}

/// Keep the low `bits` bits of `v`. A value that fits neither the signed nor
/// the unsigned range of the field is still encoded, with a warning.
pub fn fit(v: i64, bits: u32, field: &'static str) -> u32 {
    let lo = -(1i64 << (bits - 1));
    let hi = 1i64 << bits;
    if v < lo || v >= hi {
        tracing::warn!(value = v, bits, field, "operand truncated to field width");
    }
    (v as u64 & ((1u64 << bits) - 1)) as u32
}
