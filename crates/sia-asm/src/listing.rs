use sia_rs::decoder::{Decoder, SiaDecoder};
use sia_rs::disasm::{fmt_bytes, fmt_decoded};
use sia_rs::isa::Opcode;

/// Walk an assembled image from address 0 and render one line per
/// instruction: address, raw bytes, disassembly.
pub fn listing(image: &[u8]) -> Vec<String> {
    let dec = SiaDecoder::new();
    let mut out = Vec::new();
    let mut pc = 0usize;
    while pc < image.len() {
        let width = Opcode::from_nibble(image[pc] >> 4).width() as usize;
        let end = (pc + width).min(image.len());
        let mut buf = [0u8; 4];
        buf[..end - pc].copy_from_slice(&image[pc..end]);
        let d = dec.decode(u32::from_be_bytes(buf));
        out.push(format!(
            "{pc:04x}: {:<11}  {}",
            fmt_bytes(&image[pc..end]),
            fmt_decoded(&d)
        ));
        pc += width;
    }
    out
}
