//! The 64x32 monochrome framebuffer.

use std::fmt;
use std::fmt::Write;

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Row-major grid of pixel states. Only the draw and clear-screen
/// instructions mutate it; the host reads it back for rasterization at
/// whatever scale and colors it likes.
pub struct Framebuffer {
    pixels: [bool; DISPLAY_WIDTH * DISPLAY_HEIGHT],
}

impl Framebuffer {
    pub fn new() -> Framebuffer {
        Framebuffer {
            pixels: [false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.iter_mut() {
            *pixel = false;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> bool {
        self.pixels[y * DISPLAY_WIDTH + x]
    }

    /// The whole grid, row-major.
    pub fn as_slice(&self) -> &[bool] {
        &self.pixels
    }

    /// XORs a sprite onto the grid, one byte per row, most significant
    /// bit leftmost. Coordinates wrap independently at both edges.
    /// Returns `true` when any previously set pixel was unset.
    pub fn draw(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (sy, byte) in sprite.iter().enumerate() {
            let dy = (y + sy) % DISPLAY_HEIGHT;
            for sx in 0..8 {
                let bit_mask = 0b1000_0000 >> sx;
                if byte & bit_mask != 0 {
                    let dx = (x + sx) % DISPLAY_WIDTH;
                    let index = dy * DISPLAY_WIDTH + dx;

                    if self.pixels[index] {
                        collision = true;
                    }
                    self.pixels[index] ^= true;
                }
            }
        }

        collision
    }
}

impl fmt::Debug for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                f.write_char(if self.get(x, y) { '#' } else { '.' })?;
            }
            f.write_char('\n')?;
        }
        Ok(())
    }
}
