//! Static opcode table and mask-based dispatch.
//!
//! Each family is described by a four-character pattern such as `"8XY4"`.
//! Hex digits are fixed opcode bits; `X`, `Y` and `N` mark operand nibbles.

use crate::instruction::Instruction;

/// Instruction families of the CHIP-8 instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    MachineRoutine,
    ClearScreen,
    SubroutineReturn,
    Jump,
    SubroutineCall,
    SkipEqX,
    SkipNeqX,
    SkipXEqY,
    SetImmediate,
    Add,
    SetXToY,
    BinaryOr,
    BinaryAnd,
    LogicalXor,
    BinaryAdd,
    SubtractYFromX,
    RightShift,
    SubtractXFromY,
    LeftShift,
    SkipXNeqY,
    SetIndex,
    JumpWithOffset,
    Random,
    Draw,
    SkipIfKeyPressed,
    SkipIfKeyNotPressed,
    SetVxFromTimer,
    GetKey,
    SetDelayTimer,
    SetSoundTimer,
    AddToIndex,
    FontChar,
    BinaryCodedDecimal,
    Store,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeEntry {
    pub opcode: Opcode,
    pub pattern: &'static str,
    /// The fixed bits of the family.
    pub value: u16,
    /// Selects the fixed bits out of a raw instruction.
    pub mask: u16,
}

impl OpcodeEntry {
    const fn new(opcode: Opcode, pattern: &'static str) -> Self {
        let (value, mask) = parse_pattern(pattern);
        OpcodeEntry {
            opcode,
            pattern,
            value,
            mask,
        }
    }

    /// Selects the operand bits out of a raw instruction.
    pub const fn parameter_mask(&self) -> u16 {
        !self.mask
    }

    pub const fn matches(&self, instruction: Instruction) -> bool {
        instruction.value() & self.mask == self.value
    }
}

const fn hex_digit(c: u8) -> Option<u16> {
    match c {
        b'0'..=b'9' => Some((c - b'0') as u16),
        b'A'..=b'F' => Some((c - b'A' + 10) as u16),
        _ => None,
    }
}

const fn parse_pattern(pattern: &str) -> (u16, u16) {
    let bytes = pattern.as_bytes();
    assert!(bytes.len() == 4, "opcode patterns are four nibbles");

    let mut value = 0u16;
    let mut mask = 0u16;
    let mut i = 0;
    while i < 4 {
        value <<= 4;
        mask <<= 4;
        if let Some(digit) = hex_digit(bytes[i]) {
            value |= digit;
            mask |= 0xF;
        }
        i += 1;
    }
    (value, mask)
}

/// Lookup order matters only for `0NNN`, which must come after the two
/// fixed `00Ex` instructions it would otherwise shadow.
pub const OPCODE_TABLE: [OpcodeEntry; 35] = [
    OpcodeEntry::new(Opcode::ClearScreen, "00E0"),
    OpcodeEntry::new(Opcode::SubroutineReturn, "00EE"),
    OpcodeEntry::new(Opcode::MachineRoutine, "0NNN"),
    OpcodeEntry::new(Opcode::Jump, "1NNN"),
    OpcodeEntry::new(Opcode::SubroutineCall, "2NNN"),
    OpcodeEntry::new(Opcode::SkipEqX, "3XNN"),
    OpcodeEntry::new(Opcode::SkipNeqX, "4XNN"),
    OpcodeEntry::new(Opcode::SkipXEqY, "5XY0"),
    OpcodeEntry::new(Opcode::SetImmediate, "6XNN"),
    OpcodeEntry::new(Opcode::Add, "7XNN"),
    OpcodeEntry::new(Opcode::SetXToY, "8XY0"),
    OpcodeEntry::new(Opcode::BinaryOr, "8XY1"),
    OpcodeEntry::new(Opcode::BinaryAnd, "8XY2"),
    OpcodeEntry::new(Opcode::LogicalXor, "8XY3"),
    OpcodeEntry::new(Opcode::BinaryAdd, "8XY4"),
    OpcodeEntry::new(Opcode::SubtractYFromX, "8XY5"),
    OpcodeEntry::new(Opcode::RightShift, "8XY6"),
    OpcodeEntry::new(Opcode::SubtractXFromY, "8XY7"),
    OpcodeEntry::new(Opcode::LeftShift, "8XYE"),
    OpcodeEntry::new(Opcode::SkipXNeqY, "9XY0"),
    OpcodeEntry::new(Opcode::SetIndex, "ANNN"),
    OpcodeEntry::new(Opcode::JumpWithOffset, "BNNN"),
    OpcodeEntry::new(Opcode::Random, "CXNN"),
    OpcodeEntry::new(Opcode::Draw, "DXYN"),
    OpcodeEntry::new(Opcode::SkipIfKeyPressed, "EX9E"),
    OpcodeEntry::new(Opcode::SkipIfKeyNotPressed, "EXA1"),
    OpcodeEntry::new(Opcode::SetVxFromTimer, "FX07"),
    OpcodeEntry::new(Opcode::GetKey, "FX0A"),
    OpcodeEntry::new(Opcode::SetDelayTimer, "FX15"),
    OpcodeEntry::new(Opcode::SetSoundTimer, "FX18"),
    OpcodeEntry::new(Opcode::AddToIndex, "FX1E"),
    OpcodeEntry::new(Opcode::FontChar, "FX29"),
    OpcodeEntry::new(Opcode::BinaryCodedDecimal, "FX33"),
    OpcodeEntry::new(Opcode::Store, "FX55"),
    OpcodeEntry::new(Opcode::Load, "FX65"),
];

/// Finds the table entry for `instruction`, scanning in table order.
pub fn lookup(instruction: Instruction) -> Option<&'static OpcodeEntry> {
    OPCODE_TABLE.iter().find(|entry| entry.matches(instruction))
}
