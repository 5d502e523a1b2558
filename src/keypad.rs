use bitvec::{BitArr, array::BitArray};

use crate::error::{Chip8Error, Result};
use crate::state::Register;

pub const NUM_KEYS: usize = 16;

/// One of the sixteen hexadecimal keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Key0,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    KeyA,
    KeyB,
    KeyC,
    KeyD,
    KeyE,
    KeyF,
}

impl Key {
    pub const ALL: [Key; NUM_KEYS] = [
        Key::Key0,
        Key::Key1,
        Key::Key2,
        Key::Key3,
        Key::Key4,
        Key::Key5,
        Key::Key6,
        Key::Key7,
        Key::Key8,
        Key::Key9,
        Key::KeyA,
        Key::KeyB,
        Key::KeyC,
        Key::KeyD,
        Key::KeyE,
        Key::KeyF,
    ];

    pub fn from_index(index: u8) -> Result<Key> {
        Key::ALL
            .get(usize::from(index))
            .copied()
            .ok_or(Chip8Error::InvalidKey(index))
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

/// Held-key flags plus the latch set by the blocking key-wait instruction.
pub struct Keypad {
    pressed: BitArr!(for NUM_KEYS),
    awaiting: Option<Register>,
}

impl Keypad {
    pub fn new() -> Self {
        Keypad {
            pressed: BitArray::ZERO,
            awaiting: None,
        }
    }

    /// Marks `key` as held. If a key wait is pending, the latch is released
    /// and the register it was waiting to fill is returned.
    pub fn press_key(&mut self, key: Key) -> Option<Register> {
        self.pressed.set(usize::from(key.index()), true);
        self.awaiting.take()
    }

    pub fn release_key(&mut self, key: Key) {
        self.pressed.set(usize::from(key.index()), false);
    }

    pub fn is_key_pressed(&self, key: Key) -> bool {
        self.pressed[usize::from(key.index())]
    }

    pub fn await_key(&mut self, target: Register) {
        self.awaiting = Some(target);
    }

    pub fn awaiting(&self) -> Option<Register> {
        self.awaiting
    }

    pub fn cancel_wait(&mut self) {
        self.awaiting = None;
    }
}

impl Default for Keypad {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_indices_round_trip() {
        for index in 0..16u8 {
            assert_eq!(Key::from_index(index).unwrap().index(), index);
        }
        assert!(matches!(Key::from_index(16), Err(Chip8Error::InvalidKey(16))));
    }

    #[test]
    fn press_and_release_track_each_key() {
        let mut keypad = Keypad::new();
        keypad.press_key(Key::KeyA);
        keypad.press_key(Key::Key3);
        assert!(keypad.is_key_pressed(Key::KeyA));
        assert!(keypad.is_key_pressed(Key::Key3));
        keypad.release_key(Key::KeyA);
        assert!(!keypad.is_key_pressed(Key::KeyA));
        assert!(keypad.is_key_pressed(Key::Key3));
    }

    #[test]
    fn latch_clears_on_first_press_only() {
        let mut keypad = Keypad::new();
        keypad.await_key(Register::V5);
        keypad.release_key(Key::Key1);
        assert_eq!(keypad.awaiting(), Some(Register::V5));
        assert_eq!(keypad.press_key(Key::Key1), Some(Register::V5));
        assert_eq!(keypad.press_key(Key::Key2), None);
        assert_eq!(keypad.awaiting(), None);
    }
}
