use std::path::Path;

use tracing::{debug, info, trace, warn};

use crate::display::Framebuffer;
use crate::error::{Chip8Error, Result};
use crate::instruction::Instruction;
use crate::keypad::{Key, Keypad};
use crate::memory::{Address, Memory, PC_START_ADDR};
use crate::opcode::{self, Opcode};

mod execute;

pub type Timer = u8;
pub type CallStack = Vec<Address>;

pub const NUM_REGISTERS: usize = 16;

/// Fetching this word means there is nothing left to execute.
const HALT_SENTINEL: u16 = 0x0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    VF,
}

impl Register {
    pub const ALL: [Register; NUM_REGISTERS] = [
        Register::V0,
        Register::V1,
        Register::V2,
        Register::V3,
        Register::V4,
        Register::V5,
        Register::V6,
        Register::V7,
        Register::V8,
        Register::V9,
        Register::VA,
        Register::VB,
        Register::VC,
        Register::VD,
        Register::VE,
        Register::VF,
    ];

    /// Maps the low nibble of `value` to a register.
    pub fn from_index(value: u8) -> Self {
        Register::ALL[usize::from(value & 0x0F)]
    }
}

pub struct RegisterBank {
    registers: [u8; NUM_REGISTERS],
}

impl RegisterBank {
    pub fn new() -> Self {
        RegisterBank {
            registers: [0; NUM_REGISTERS],
        }
    }

    pub fn read(&self, reg: Register) -> u8 {
        self.registers[reg as usize]
    }

    pub fn write(&mut self, reg: Register, value: u8) {
        self.registers[reg as usize] = value;
    }

    pub fn as_array(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    fn clear(&mut self) {
        self.registers.fill(0);
    }
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Selects between the two interpreter lineages for `8XY6`, `8XYE`, `FX55`
/// and `FX65`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompatibilityMode {
    /// COSMAC VIP behavior: shifts read `VY`, block transfers advance `I`.
    Chip8,
    /// SUPER-CHIP behavior: shifts work on `VX` in place, `I` is left alone.
    #[default]
    SuperChip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineStatus {
    Ready,
    AwaitingInput,
    Halted,
}

/// What a single [`Chip8State::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Executed(Opcode),
    /// Blocked on `FX0A`; nothing was fetched.
    AwaitingKey(Register),
    /// No opcode family matched. The PC moved past the word, nothing else changed.
    UnknownOpcode(Instruction),
    /// A zero word was fetched, or the machine had already halted.
    Halted,
}

impl StepOutcome {
    pub fn should_continue(&self) -> bool {
        !matches!(self, StepOutcome::Halted)
    }
}

/// The complete machine: memory, registers, timers, display and keypad.
pub struct Chip8State {
    memory: Memory,
    registers: RegisterBank,
    pc: Address,
    index: Address,
    stack: CallStack,
    delay_timer: Timer,
    sound_timer: Timer,
    display: Framebuffer,
    keypad: Keypad,
    mode: CompatibilityMode,
    halted: bool,
}

impl Chip8State {
    pub fn new() -> Self {
        let mut memory = Memory::new();
        memory.load_font();

        Chip8State {
            memory,
            registers: RegisterBank::new(),
            pc: PC_START_ADDR,
            index: 0,
            stack: Vec::new(),
            delay_timer: 0,
            sound_timer: 0,
            display: Framebuffer::new(),
            keypad: Keypad::new(),
            mode: CompatibilityMode::default(),
            halted: false,
        }
    }

    /// Returns every register, timer and the display to power-on state.
    /// Held keys are kept; a pending key wait is cancelled.
    pub fn reset(&mut self, clear_memory: bool) {
        if clear_memory {
            self.memory.clear();
            self.memory.load_font();
        }
        self.registers.clear();
        self.pc = PC_START_ADDR;
        self.index = 0;
        self.stack.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.display.clear();
        self.keypad.cancel_wait();
        self.mode = CompatibilityMode::default();
        self.halted = false;
        info!(clear_memory, "machine reset");
    }

    /// Resets the machine and copies `rom` to the program area, truncating
    /// it if it does not fit. Returns the number of bytes loaded.
    pub fn load_program(&mut self, rom: &[u8]) -> usize {
        self.reset(true);
        let loaded = self.memory.load_program(rom);
        if loaded < rom.len() {
            warn!(size = rom.len(), loaded, "program image truncated");
        }
        info!(bytes = loaded, "program loaded");
        trace!("memory after load:\n{}", self.memory.dump());
        loaded
    }

    /// Reads the whole file before touching any state, so a failed read
    /// leaves the machine as it was.
    pub fn load_program_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let rom = std::fs::read(path).map_err(|source| Chip8Error::LoadFailure {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.load_program(&rom))
    }

    /// Runs one fetch/decode/execute cycle.
    ///
    /// The PC advances past the fetched word before the instruction runs. If
    /// the instruction fails, the PC is put back on the faulting word.
    pub fn step(&mut self) -> Result<StepOutcome> {
        if self.halted {
            return Ok(StepOutcome::Halted);
        }
        if let Some(target) = self.keypad.awaiting() {
            return Ok(StepOutcome::AwaitingKey(target));
        }

        let fetch_addr = self.pc;
        let instruction = self.next_instruction()?;
        if instruction.value() == HALT_SENTINEL {
            debug!(pc = fetch_addr, "zero instruction fetched, halting");
            self.halted = true;
            return Ok(StepOutcome::Halted);
        }

        self.pc = self.pc.wrapping_add(2);
        match self.execute(instruction) {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.pc = fetch_addr;
                Err(e)
            }
        }
    }

    /// Dispatches an already fetched instruction without touching the PC
    /// first. Control-flow instructions see the current PC as the return
    /// address.
    pub fn execute(&mut self, instruction: Instruction) -> Result<StepOutcome> {
        let Some(entry) = opcode::lookup(instruction) else {
            warn!(%instruction, pc = self.pc, "unknown opcode, skipping");
            return Ok(StepOutcome::UnknownOpcode(instruction));
        };

        trace!(%instruction, opcode = ?entry.opcode, "execute");
        self.dispatch(entry.opcode, instruction, self.mode)?;
        Ok(StepOutcome::Executed(entry.opcode))
    }

    /// Peeks at the word under the PC without advancing.
    pub fn next_instruction(&self) -> Result<Instruction> {
        self.memory
            .read_word(usize::from(self.pc))
            .map(Instruction::new)
    }

    /// Decrements both timers toward zero. Intended to run at 60 Hz.
    pub fn clock_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn trigger_key_down(&mut self, key: Key) {
        if let Some(target) = self.keypad.press_key(key) {
            self.registers.write(target, key.index());
            debug!(?key, ?target, "key wait satisfied");
        }
    }

    pub fn trigger_key_up(&mut self, key: Key) {
        self.keypad.release_key(key);
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.keypad.is_key_pressed(key)
    }

    pub fn set_compatibility_mode(&mut self, mode: CompatibilityMode) {
        self.mode = mode;
    }

    pub fn compatibility_mode(&self) -> CompatibilityMode {
        self.mode
    }

    pub fn status(&self) -> MachineStatus {
        if self.halted {
            MachineStatus::Halted
        } else if self.keypad.awaiting().is_some() {
            MachineStatus::AwaitingInput
        } else {
            MachineStatus::Ready
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.display.pixel(x, y)
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.display
    }

    pub fn register(&self, reg: Register) -> u8 {
        self.registers.read(reg)
    }

    pub fn set_register(&mut self, reg: Register, value: u8) {
        self.registers.write(reg, value);
    }

    pub fn registers(&self) -> &RegisterBank {
        &self.registers
    }

    pub fn pc(&self) -> Address {
        self.pc
    }

    pub fn index(&self) -> Address {
        self.index
    }

    pub fn stack(&self) -> &[Address] {
        &self.stack
    }

    pub fn delay_timer(&self) -> Timer {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> Timer {
        self.sound_timer
    }

    /// The tone should sound while the sound timer is non-zero.
    pub fn sound_active(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
}

impl Default for Chip8State {
    fn default() -> Self {
        Self::new()
    }
}
