//! Per-family instruction semantics.
//!
//! This module is a child of `state`, so it reaches the private machine
//! fields directly. Nothing outside `state` can.

use tracing::debug;

use super::{Chip8State, CompatibilityMode, Register};
use crate::error::{Chip8Error, Result};
use crate::instruction::Instruction;
use crate::keypad::Key;
use crate::memory::{Address, FONT_ADDR, FONT_HEIGHT};
use crate::opcode::Opcode;

impl Chip8State {
    pub(super) fn dispatch(
        &mut self,
        opcode: Opcode,
        instruction: Instruction,
        mode: CompatibilityMode,
    ) -> Result<()> {
        let reg_x = Register::from_index(instruction.x());
        let reg_y = Register::from_index(instruction.y());
        let value_x = self.registers.read(reg_x);
        let value_y = self.registers.read(reg_y);

        match opcode {
            Opcode::MachineRoutine => {
                debug!(address = instruction.nnn(), "machine code routine ignored");
            }
            Opcode::ClearScreen => self.display.clear(),
            Opcode::SubroutineReturn => {
                self.pc = self.stack.pop().ok_or(Chip8Error::StackUnderflow)?;
            }
            Opcode::Jump => self.pc = instruction.nnn(),
            Opcode::SubroutineCall => {
                self.stack.push(self.pc);
                self.pc = instruction.nnn();
            }
            Opcode::SkipEqX => self.skip_if(value_x == instruction.nn()),
            Opcode::SkipNeqX => self.skip_if(value_x != instruction.nn()),
            Opcode::SkipXEqY => self.skip_if(value_x == value_y),
            Opcode::SkipXNeqY => self.skip_if(value_x != value_y),
            Opcode::SetImmediate => self.registers.write(reg_x, instruction.nn()),
            Opcode::Add => self
                .registers
                .write(reg_x, value_x.wrapping_add(instruction.nn())),
            Opcode::SetXToY => self.registers.write(reg_x, value_y),
            Opcode::BinaryOr => self.registers.write(reg_x, value_x | value_y),
            Opcode::BinaryAnd => self.registers.write(reg_x, value_x & value_y),
            Opcode::LogicalXor => self.registers.write(reg_x, value_x ^ value_y),
            Opcode::BinaryAdd => {
                let (sum, carry) = value_x.overflowing_add(value_y);
                self.write_with_flag(reg_x, sum, u8::from(carry));
            }
            Opcode::SubtractYFromX => {
                let (difference, borrow) = value_x.overflowing_sub(value_y);
                self.write_with_flag(reg_x, difference, u8::from(!borrow));
            }
            Opcode::SubtractXFromY => {
                let (difference, borrow) = value_y.overflowing_sub(value_x);
                self.write_with_flag(reg_x, difference, u8::from(!borrow));
            }
            Opcode::RightShift => {
                let source = shift_source(mode, value_x, value_y);
                self.write_with_flag(reg_x, source >> 1, source & 0x01);
            }
            Opcode::LeftShift => {
                let source = shift_source(mode, value_x, value_y);
                self.write_with_flag(reg_x, source << 1, source >> 7);
            }
            Opcode::SetIndex => self.index = instruction.nnn(),
            Opcode::JumpWithOffset => {
                self.pc = instruction.nnn() + Address::from(self.registers.read(Register::V0));
            }
            Opcode::Random => {
                let random_value = rand::random::<u8>() & instruction.nn();
                self.registers.write(reg_x, random_value);
            }
            Opcode::Draw => self.draw(value_x, value_y, instruction.n())?,
            Opcode::SkipIfKeyPressed => self.skip_if(self.is_key_in_register_pressed(value_x)),
            Opcode::SkipIfKeyNotPressed => {
                self.skip_if(!self.is_key_in_register_pressed(value_x));
            }
            Opcode::SetVxFromTimer => self.registers.write(reg_x, self.delay_timer),
            Opcode::GetKey => self.keypad.await_key(reg_x),
            Opcode::SetDelayTimer => self.delay_timer = value_x,
            Opcode::SetSoundTimer => self.sound_timer = value_x,
            Opcode::AddToIndex => self.index = self.index.wrapping_add(Address::from(value_x)),
            Opcode::FontChar => {
                let glyph = FONT_ADDR + usize::from(value_x & 0x0F) * FONT_HEIGHT;
                self.index = glyph as Address;
            }
            Opcode::BinaryCodedDecimal => {
                let bcd = [value_x / 100, (value_x / 10) % 10, value_x % 10];
                self.memory
                    .slice_mut(usize::from(self.index), bcd.len())?
                    .copy_from_slice(&bcd);
            }
            Opcode::Store => self.store_registers(instruction.x(), mode)?,
            Opcode::Load => self.load_registers(instruction.x(), mode)?,
        }
        Ok(())
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.pc = self.pc.wrapping_add(2);
        }
    }

    /// Writes the result before the flag, so `VF` ends up holding the flag
    /// when it is also the destination.
    fn write_with_flag(&mut self, reg: Register, value: u8, flag: u8) {
        self.registers.write(reg, value);
        self.registers.write(Register::VF, flag);
    }

    /// Register values above `0xF` name no key and never count as pressed.
    fn is_key_in_register_pressed(&self, value: u8) -> bool {
        Key::from_index(value).is_ok_and(|key| self.keypad.is_key_pressed(key))
    }

    fn draw(&mut self, x: u8, y: u8, rows: u8) -> Result<()> {
        let sprite = self.memory.read_sprite(usize::from(self.index), rows)?;
        let collision = self
            .display
            .draw_sprite(usize::from(x), usize::from(y), sprite);
        self.registers.write(Register::VF, u8::from(collision));
        Ok(())
    }

    /// `FX55`: copies `V0..=VX` to memory starting at `I`.
    fn store_registers(&mut self, last: u8, mode: CompatibilityMode) -> Result<()> {
        let count = usize::from(last) + 1;
        let destination = self.memory.slice_mut(usize::from(self.index), count)?;
        for (cell, reg) in destination.iter_mut().zip(Register::ALL) {
            *cell = self.registers.read(reg);
        }
        self.advance_index_after_transfer(count, mode);
        Ok(())
    }

    /// `FX65`: fills `V0..=VX` from memory starting at `I`.
    fn load_registers(&mut self, last: u8, mode: CompatibilityMode) -> Result<()> {
        let count = usize::from(last) + 1;
        let source = self.memory.slice(usize::from(self.index), count)?;
        for (&value, reg) in source.iter().zip(Register::ALL) {
            self.registers.write(reg, value);
        }
        self.advance_index_after_transfer(count, mode);
        Ok(())
    }

    fn advance_index_after_transfer(&mut self, count: usize, mode: CompatibilityMode) {
        if mode == CompatibilityMode::Chip8 {
            self.index = self.index.wrapping_add(count as Address);
        }
    }
}

fn shift_source(mode: CompatibilityMode, value_x: u8, value_y: u8) -> u8 {
    match mode {
        CompatibilityMode::Chip8 => value_y,
        CompatibilityMode::SuperChip => value_x,
    }
}
