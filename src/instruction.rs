use std::fmt;

/// A raw 16-bit CHIP-8 instruction word.
///
/// The word is stored big-endian: the byte at the lower address is the
/// upper byte of the instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction(u16);

impl Instruction {
    pub const fn new(value: u16) -> Self {
        Instruction(value)
    }

    pub const fn from_bytes(upper: u8, lower: u8) -> Self {
        Instruction(((upper as u16) << 8) | lower as u16)
    }

    pub const fn value(self) -> u16 {
        self.0
    }

    pub const fn upper_byte(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn lower_byte(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// The second, third, and fourth nibbles. A 12-bit immediate address.
    pub const fn nnn(self) -> u16 {
        self.0 & 0x0FFF
    }

    /// The second byte. An 8-bit immediate number.
    pub const fn nn(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// Fourth nibble. A 4-bit immediate number.
    pub const fn n(self) -> u8 {
        (self.0 & 0x000F) as u8
    }

    /// Second nibble. Selects the first register operand.
    pub const fn x(self) -> u8 {
        ((self.0 >> 8) & 0x0F) as u8
    }

    /// Third nibble. Selects the second register operand.
    pub const fn y(self) -> u8 {
        ((self.0 >> 4) & 0x0F) as u8
    }
}

impl From<u16> for Instruction {
    fn from(value: u16) -> Self {
        Instruction(value)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}
