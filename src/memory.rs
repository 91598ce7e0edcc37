use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Default capacity of the SIA machine (10 KiB).
pub const DEFAULT_MEM_SIZE: usize = 10 * 1024;
/// Largest memory a machine may be given: the 28-bit jump address space.
pub const MAX_MEM_SIZE: usize = 1 << 28;

pub trait Bus {
    fn size(&self) -> usize;
    fn read_u8(&mut self, addr: u32) -> Result<u8>;
    fn read_u32(&mut self, addr: u32) -> Result<u32>;
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()>;
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()>;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemError {
    #[error("access of {len} byte(s) at {addr:#010x} is outside memory of {size} bytes")]
    OutOfBounds { addr: u32, len: usize, size: usize },
    #[error("image of {len} bytes does not fit in memory of {size} bytes")]
    ImageTooLarge { len: usize, size: usize },
    #[error("memory size {size} exceeds the maximum of {max} bytes")]
    SizeTooLarge { size: usize, max: usize },
    #[error("cannot allocate {size} bytes of memory")]
    Alloc { size: usize },
}

/// Flat, zero-initialised byte memory. Multi-byte values are big-endian.
#[derive(Clone, Serialize, Deserialize)]
pub struct LinearMemory {
    pub mem: Vec<u8>,
}

impl LinearMemory {
    pub fn new(size: usize) -> Result<Self, MemError> {
        if size > MAX_MEM_SIZE {
            return Err(MemError::SizeTooLarge { size, max: MAX_MEM_SIZE });
        }
        let mut mem = Vec::new();
        mem.try_reserve_exact(size)
            .map_err(|_| MemError::Alloc { size })?;
        mem.resize(size, 0);
        Ok(Self { mem })
    }

    /// Copy a raw image to address 0. Bytes past the image stay zero.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(), MemError> {
        let size = self.mem.len();
        if image.len() > size {
            return Err(MemError::ImageTooLarge { len: image.len(), size });
        }
        self.mem[..image.len()].copy_from_slice(image);
        self.mem[image.len()..].fill(0);
        Ok(())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.mem
    }

    fn span(&self, addr: u32, len: usize) -> Result<usize, MemError> {
        let off = addr as usize;
        match off.checked_add(len) {
            Some(end) if end <= self.mem.len() => Ok(off),
            _ => Err(MemError::OutOfBounds { addr, len, size: self.mem.len() }),
        }
    }

    fn load_be_u32(&self, off: usize) -> u32 {
        u32::from_be_bytes([
            self.mem[off],
            self.mem[off + 1],
            self.mem[off + 2],
            self.mem[off + 3],
        ])
    }

    fn store_be_u32(&mut self, off: usize, v: u32) {
        self.mem[off..off + 4].copy_from_slice(&v.to_be_bytes());
    }
}

impl std::fmt::Debug for LinearMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearMemory").field("size", &self.mem.len()).finish()
    }
}

impl Bus for LinearMemory {
    fn size(&self) -> usize {
        self.mem.len()
    }
    fn read_u8(&mut self, addr: u32) -> Result<u8> {
        let off = self.span(addr, 1)?;
        Ok(self.mem[off])
    }
    fn read_u32(&mut self, addr: u32) -> Result<u32> {
        let off = self.span(addr, 4)?;
        Ok(self.load_be_u32(off))
    }
    fn write_u8(&mut self, addr: u32, val: u8) -> Result<()> {
        let off = self.span(addr, 1)?;
        self.mem[off] = val;
        Ok(())
    }
    fn write_u32(&mut self, addr: u32, val: u32) -> Result<()> {
        let off = self.span(addr, 4)?;
        self.store_be_u32(off, val);
        Ok(())
    }
}
