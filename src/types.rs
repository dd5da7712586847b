// Core types shared across the sampler, grid and presenter.

/// Raw RGBA samples at the sampler's target resolution, row-major.
/// Length is always `width * height * 4`; refreshed in place on every sample.
#[derive(Clone)]
pub struct PixelBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>, // R,G,B,A per pixel
}

impl PixelBuffer {
    /// Allocate a zeroed buffer at the given resolution.
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, data: vec![0u8; width * height * 4] }
    }

    /// Number of pixels (not bytes).
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// RGBA channels of the pixel at linear index `k` (row-major).
    #[inline]
    pub fn rgba(&self, k: usize) -> (u8, u8, u8, u8) {
        let o = k * 4;
        (self.data[o], self.data[o + 1], self.data[o + 2], self.data[o + 3])
    }
}

/// What the window actually shows; each entry is 0x00RRGGBB for minifb.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl FrameBuffer {
    /// Allocate filled with a single color (we clear to white, ink-on-paper).
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self { width, height, pixels: vec![color; width * height] }
    }
}

/// Plain-value grid settings. Passed by value into the grid; live changes go
/// through `AsciiGrid::apply_settings`, never through shared mutable state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    /// Cells per side; the grid is always size × size.
    pub size: usize,
    /// World-space edge length of one cell.
    pub cell_size: f32,
    /// Negate the row axis when placing cells (the feed reads top-to-bottom).
    /// With `false` the rendered feed is vertically mirrored.
    pub flip_rows: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { size: 64, cell_size: 1.0, flip_rows: true }
    }
}

impl GridSettings {
    /// Total world-space extent of the grid along one axis.
    pub fn extent(&self) -> f32 {
        self.size as f32 * self.cell_size
    }
}
