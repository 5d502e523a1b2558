use crate::error::{Chip8Error, Result};

pub type Address = u16;

pub const MEM_SIZE: usize = 4096;
pub const FONT_ADDR: usize = 0x000;
pub const FONT_HEIGHT: usize = 5;
pub const PC_START_ADDR: Address = 0x200;
pub const MAX_PROGRAM_SIZE: usize = MEM_SIZE - PC_START_ADDR as usize;

const DUMP_COLUMNS: usize = 32;

/// Hexadecimal digit sprites, five rows each.
pub const FONT_DATA: [u8; 16 * FONT_HEIGHT] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The 4 KiB address space. Every access is bounds-checked.
pub struct Memory {
    data: [u8; MEM_SIZE],
}

impl Memory {
    /// Zero-filled memory with no glyphs loaded.
    pub fn new() -> Self {
        Memory {
            data: [0; MEM_SIZE],
        }
    }

    pub fn read(&self, addr: usize) -> Result<u8> {
        self.data
            .get(addr)
            .copied()
            .ok_or(Chip8Error::MemoryFault { address: addr })
    }

    pub fn write(&mut self, addr: usize, value: u8) -> Result<()> {
        let cell = self
            .data
            .get_mut(addr)
            .ok_or(Chip8Error::MemoryFault { address: addr })?;
        *cell = value;
        Ok(())
    }

    /// Reads a big-endian word from `addr` and `addr + 1`.
    pub fn read_word(&self, addr: usize) -> Result<u16> {
        let high_byte = u16::from(self.read(addr)?);
        let low_byte = u16::from(self.read(addr + 1)?);
        Ok((high_byte << 8) | low_byte)
    }

    /// Borrows `len` bytes starting at `addr`, failing if any of them lies
    /// outside the address space. An empty range is valid up to `MEM_SIZE`.
    pub fn slice(&self, addr: usize, len: usize) -> Result<&[u8]> {
        self.data
            .get(addr..addr.saturating_add(len))
            .ok_or(Chip8Error::MemoryFault {
                address: addr.max(MEM_SIZE),
            })
    }

    pub fn slice_mut(&mut self, addr: usize, len: usize) -> Result<&mut [u8]> {
        self.data
            .get_mut(addr..addr.saturating_add(len))
            .ok_or(Chip8Error::MemoryFault {
                address: addr.max(MEM_SIZE),
            })
    }

    pub fn read_sprite(&self, index: usize, rows: u8) -> Result<&[u8]> {
        self.slice(index, usize::from(rows))
    }

    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    pub fn load_font(&mut self) {
        self.data[FONT_ADDR..FONT_ADDR + FONT_DATA.len()].copy_from_slice(&FONT_DATA);
    }

    /// Copies a program image to the entry offset. Images larger than the
    /// program area are truncated; returns the number of bytes written.
    pub fn load_program(&mut self, rom: &[u8]) -> usize {
        let len = rom.len().min(MAX_PROGRAM_SIZE);
        let start = usize::from(PC_START_ADDR);
        self.data[start..start + len].copy_from_slice(&rom[..len]);
        len
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Hex listing of the whole address space, 32 bytes per row.
    pub fn dump(&self) -> String {
        self.data
            .chunks(DUMP_COLUMNS)
            .enumerate()
            .map(|(row, chunk)| {
                let bytes: Vec<String> = chunk.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("0x{:04X}: {}\n", row * DUMP_COLUMNS, bytes.join(" "))
            })
            .collect()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
