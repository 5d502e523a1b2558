use bitvec::{BitArr, array::BitArray};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Monochrome 64x32 framebuffer.
///
/// Unlike [`crate::memory::Memory`], coordinates outside the grid are not an
/// error: writes are dropped and reads report an unlit pixel.
#[derive(Clone)]
pub struct Framebuffer {
    pixels: BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT),
}

impl Framebuffer {
    pub fn new() -> Self {
        Framebuffer {
            pixels: BitArray::ZERO,
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(false);
    }

    pub fn pixel(&self, x: usize, y: usize) -> bool {
        match Self::index(x, y) {
            Some(index) => self.pixels[index],
            None => false,
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, lit: bool) {
        if let Some(index) = Self::index(x, y) {
            self.pixels.set(index, lit);
        }
    }

    /// XORs an 8-pixel-wide sprite onto the grid with its top-left corner at
    /// `(x, y)`. Rows and columns past the edges are clipped, not wrapped.
    ///
    /// Returns `true` if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (row, &byte) in sprite.iter().enumerate() {
            for bit in 0..8 {
                if (byte >> (7 - bit)) & 1 == 0 {
                    continue;
                }
                let Some(index) = Self::index(x + bit, y + row) else {
                    continue;
                };

                let current_pixel = self.pixels[index];
                collision |= current_pixel;
                self.pixels.set(index, !current_pixel);
            }
        }
        collision
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.count_ones()
    }

    fn index(x: usize, y: usize) -> Option<usize> {
        (x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT).then(|| y * DISPLAY_WIDTH + x)
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let mut display = Framebuffer::new();
        display.set_pixel(DISPLAY_WIDTH, 0, true);
        display.set_pixel(0, DISPLAY_HEIGHT, true);
        assert_eq!(display.lit_count(), 0);
        assert!(!display.pixel(DISPLAY_WIDTH, DISPLAY_HEIGHT));
    }

    #[test]
    fn sprite_bits_map_left_to_right() {
        let mut display = Framebuffer::new();
        assert!(!display.draw_sprite(10, 5, &[0b1000_0001]));
        assert!(display.pixel(10, 5));
        assert!(!display.pixel(11, 5));
        assert!(display.pixel(17, 5));
        assert_eq!(display.lit_count(), 2);
    }

    #[test]
    fn redrawing_erases_and_reports_collision() {
        let mut display = Framebuffer::new();
        let sprite = [0xF0, 0x90, 0xF0];
        assert!(!display.draw_sprite(3, 4, &sprite));
        assert!(display.draw_sprite(3, 4, &sprite));
        assert_eq!(display.lit_count(), 0);
    }

    #[test]
    fn sprites_clip_at_the_edges() {
        let mut display = Framebuffer::new();
        display.draw_sprite(DISPLAY_WIDTH - 4, DISPLAY_HEIGHT - 1, &[0xFF, 0xFF]);
        assert_eq!(display.lit_count(), 4);
        assert!(!display.pixel(0, 0));
        assert!(!display.pixel(0, DISPLAY_HEIGHT - 1));
    }

    #[test]
    fn clear_turns_everything_off() {
        let mut display = Framebuffer::new();
        display.set_pixel(1, 1, true);
        display.clear();
        assert!(!display.pixel(1, 1));
    }
}
