//! A CHIP-8 virtual machine engine.
//!
//! [`Chip8State`] owns the whole machine. A driver loads a program, calls
//! [`Chip8State::step`] at its chosen instruction rate, calls
//! [`Chip8State::clock_timers`] at 60 Hz, forwards key events, and reads the
//! framebuffer back for presentation.

pub mod display;
pub mod error;
pub mod instruction;
pub mod keypad;
pub mod memory;
pub mod opcode;
pub mod state;

pub use display::{DISPLAY_HEIGHT, DISPLAY_WIDTH, Framebuffer};
pub use error::{Chip8Error, Result};
pub use instruction::Instruction;
pub use keypad::Key;
pub use memory::{MEM_SIZE, Memory, PC_START_ADDR};
pub use opcode::Opcode;
pub use state::{Chip8State, CompatibilityMode, MachineStatus, Register, StepOutcome};
