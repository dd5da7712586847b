// Window + software cell pass.
// Visual outcomes:
// 1) A window showing the glyph grid, black ink on white paper.
// 2) An optional preview inset (top-right) with the raw sampled frame.
// 3) A small 5x7 HUD line with the source tag and FPS.
// The presenter is the backend of the dirty-flag contract: cells are only
// redrawn on ticks where the grid took a buffer dirty.

use crate::atlas::{GLYPH_H, GLYPH_W, glyph5x7};
use crate::error::Error;
use crate::grid::AsciiGrid;
use crate::sampler::FrameSampler;
use crate::types::{FrameBuffer, PixelBuffer};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

const PAPER: u32 = 0x00FF_FFFF;
const INK: u32 = 0x0000_0000;

const PREVIEW_SCALE: usize = 2;
const PREVIEW_MARGIN: usize = 8;

pub struct Presenter {
    window: Window, // the on-screen window you see
    cells: FrameBuffer,  // cached glyph layer, valid until the next dirty take
    screen: FrameBuffer, // composed output pushed to the window
    cell_px: usize,
    show_preview: bool,
}

impl Presenter {
    /// Create a window sized to the grid: `grid_size` cells at `cell_px`
    /// pixels per cell, square.
    pub fn new(title: &str, grid_size: usize, cell_px: usize) -> Result<Self, Error> {
        let side = grid_size * cell_px;
        let window = Window::new(title, side, side, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self {
            window,
            cells: FrameBuffer::filled(side, side, PAPER),
            screen: FrameBuffer::filled(side, side, PAPER),
            cell_px,
            show_preview: false,
        })
    }

    /// Compose and push one frame. Consumes the grid's dirty flags; on clean
    /// ticks the cached cell layer is reused and only the overlays change.
    pub fn present(
        &mut self,
        grid: &mut AsciiGrid,
        sampler: &FrameSampler,
        hud: &str,
    ) -> Result<(), Error> {
        let transforms_dirty = grid.transforms_mut().take_dirty();
        let scales_dirty = grid.scales_mut().take_dirty();
        if transforms_dirty || scales_dirty {
            self.redraw_cells(grid);
        }

        self.screen.pixels.copy_from_slice(&self.cells.pixels);

        if self.show_preview {
            if let Some(px) = sampler.last_frame() {
                blit_preview(&mut self.screen, px, PREVIEW_SCALE, PREVIEW_MARGIN);
            }
        }

        draw_text_5x7(&mut self.screen, 8, 8, hud, INK);

        self.window
            .update_with_buffer(&self.screen.pixels, self.screen.width, self.screen.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))
    }

    // Re-upload pass: place every cell's ramp glyph at its transform.
    fn redraw_cells(&mut self, grid: &AsciiGrid) {
        self.cells.pixels.fill(PAPER);

        let settings = grid.settings();
        let cell = settings.cell_size;
        let half = settings.extent() * 0.5;
        let atlas = &grid.material().chars;
        let scales = grid.scales().as_slice();

        for (k, t) in grid.transforms().as_slice().iter().enumerate() {
            // World space: x grows right, y grows up. Screen rows grow down,
            // so the top of the extent is row zero.
            let col = ((t.position[0] + half) / cell).round() as i32;
            let row = ((half - t.position[1]) / cell).round() as i32;
            let x0 = col * self.cell_px as i32;
            let y0 = row * self.cell_px as i32;

            let glyph = atlas.index_for(scales[k]);
            for py in 0..self.cell_px {
                let gy = py * GLYPH_H / self.cell_px;
                for px in 0..self.cell_px {
                    let gx = px * GLYPH_W / self.cell_px;
                    if atlas.covered(glyph, gx, gy) {
                        put_pixel(&mut self.cells, x0 + px as i32, y0 + py as i32, INK);
                    }
                }
            }
        }
    }

    pub fn toggle_preview(&mut self) {
        self.show_preview = !self.show_preview;
    }

    pub fn preview_shown(&self) -> bool {
        self.show_preview
    }

    /// Returns false when the user closes the window (so the loop can stop).
    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// True while ESC is held down (we exit when this is pressed).
    pub fn esc_pressed(&self) -> bool {
        self.window.is_key_down(Key::Escape)
    }

    // toggles the preview inset in main
    pub fn p_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::P, KeyRepeat::No)
    }

    // flips the grid's row axis in main
    pub fn f_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::F, KeyRepeat::No)
    }

    // pauses the animation clock in main
    pub fn space_pressed_once(&self) -> bool {
        self.window.is_key_pressed(Key::Space, KeyRepeat::No)
    }
}

/* ---------- Software drawing: pixels, preview inset, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Draw the raw sample as an inset at the top-right corner, `scale` screen
/// pixels per sample pixel, with a thin ink border.
fn blit_preview(fb: &mut FrameBuffer, px: &PixelBuffer, scale: usize, margin: usize) {
    let w = px.width * scale;
    let h = px.height * scale;
    if fb.width < w + margin {
        return; // window too small for the inset
    }
    let x0 = (fb.width - w - margin) as i32;
    let y0 = margin as i32;

    for y in 0..px.height {
        for x in 0..px.width {
            let (r, g, b, _a) = px.rgba(y * px.width + x);
            let color = ((r as u32) << 16) | ((g as u32) << 8) | b as u32;
            for dy in 0..scale {
                for dx in 0..scale {
                    put_pixel(
                        fb,
                        x0 + (x * scale + dx) as i32,
                        y0 + (y * scale + dy) as i32,
                        color,
                    );
                }
            }
        }
    }

    // Border so the inset reads as an overlay, not part of the mosaic.
    for x in -1..=(w as i32) {
        put_pixel(fb, x0 + x, y0 - 1, INK);
        put_pixel(fb, x0 + x, y0 + h as i32, INK);
    }
    for y in -1..=(h as i32) {
        put_pixel(fb, x0 - 1, y0 + y, INK);
        put_pixel(fb, x0 + w as i32, y0 + y, INK);
    }
}

/// Draw a single 5x7 character at (x,y) with a 1-pixel paper halo so the HUD
/// stays readable on top of dense glyph cells.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        // Halo pass: offset by (1,1) in paper color
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..GLYPH_W {
                if (rowbits & (1 << (GLYPH_W - 1 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32 + 1, y + ry as i32 + 1, PAPER);
                }
            }
        }

        // Foreground pass: actual glyph in chosen color
        for (ry, rowbits) in rows.iter().enumerate() {
            for rx in 0..GLYPH_W {
                if (rowbits & (1 << (GLYPH_W - 1 - rx))) != 0 {
                    put_pixel(fb, x + rx as i32, y + ry as i32, color);
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; each glyph is 5x7 with 1-pixel spacing.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += GLYPH_W as i32 + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_pixel_ignores_out_of_bounds() {
        let mut fb = FrameBuffer::filled(4, 4, PAPER);
        put_pixel(&mut fb, -1, 0, INK);
        put_pixel(&mut fb, 0, -1, INK);
        put_pixel(&mut fb, 4, 0, INK);
        put_pixel(&mut fb, 0, 4, INK);
        assert!(fb.pixels.iter().all(|p| *p == PAPER));
    }

    #[test]
    fn test_draw_text_leaves_ink() {
        let mut fb = FrameBuffer::filled(16, 16, PAPER);
        draw_text_5x7(&mut fb, 0, 0, "F", INK);
        assert!(fb.pixels.iter().any(|p| *p == INK));
    }

    #[test]
    fn test_preview_lands_in_the_top_right_corner() {
        let mut fb = FrameBuffer::filled(32, 32, PAPER);
        let mut px = PixelBuffer::new(2, 2);
        for k in 0..px.data.len() {
            px.data[k] = if k % 4 == 3 { 255 } else { 0 }; // opaque black
        }
        blit_preview(&mut fb, &px, 2, 4);
        // Inset spans x in [24,28), y in [4,8).
        assert_eq!(fb.pixels[5 * 32 + 25], 0x0000_0000);
        // Bottom-left of the window stays paper.
        assert_eq!(fb.pixels[31 * 32], PAPER);
    }

    #[test]
    fn test_preview_skipped_when_window_is_too_small() {
        let mut fb = FrameBuffer::filled(4, 4, PAPER);
        let px = PixelBuffer::new(8, 8);
        blit_preview(&mut fb, &px, 2, 4);
        assert!(fb.pixels.iter().all(|p| *p == PAPER));
    }
}
