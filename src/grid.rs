// The instanced grid: N x N unit cells, one static transform and one live
// brightness/scale attribute per cell. Construction happens once; every tick
// rewrites the scale attribute from the current sample and refreshes the
// time uniform. The presenter consumes the dirty flags.

use crate::buffer::AttributeBuffer;
use crate::clock::Tick;
use crate::error::Error;
use crate::material::Material;
use crate::sampler::{FrameSampler, Sample};
use crate::types::GridSettings;

/// Per-cell static transform, position only. Cell (i,j) sits at
/// (j*cell - extent/2, ±(i*cell - extent/2), 0); the row-axis sign follows
/// `GridSettings::flip_rows`. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    pub position: [f32; 3],
}

/// Rec. 601 luma from sRGB bytes.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Inverted normalized brightness: darker source pixels map higher, the
/// ink-on-white ASCII mapping.
#[inline]
pub fn brightness(r: u8, g: u8, b: u8) -> f32 {
    ((255.0 - luminance(r, g, b)) / 255.0).clamp(0.0, 1.0)
}

// Deterministic xorshift32 for the placeholder fill before the first real
// sample lands (no external crate).
struct Rng32 {
    state: u32,
}

impl Rng32 {
    fn from_seed(seed: u32) -> Self {
        Self { state: seed | 1 }
    }

    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform [0,1)
    #[inline]
    fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / ((1u32 << 24) as f32)
    }
}

pub struct AsciiGrid {
    settings: GridSettings,
    transforms: AttributeBuffer<InstanceTransform>,
    scales: AttributeBuffer<f32>,
    material: Material,
}

impl AsciiGrid {
    /// Build the N² transforms and the placeholder scale attribute. The
    /// sampler must already target exactly N x N — pixel k and cell k have to
    /// mean the same spot, so a mismatch is a configuration error, caught
    /// here rather than as a garbled image.
    pub fn new(
        settings: GridSettings,
        sampler: &FrameSampler,
        material: Material,
    ) -> Result<Self, Error> {
        let n = settings.size;
        if n == 0 {
            return Err(Error::Config("grid size must be at least 1".into()));
        }
        match sampler.sample_size() {
            Some((w, h)) if w == n && h == n => {}
            Some((w, h)) => {
                return Err(Error::Config(format!(
                    "sampler resolution {w}x{h} must match the {n}x{n} grid"
                )));
            }
            None => {
                return Err(Error::Config(
                    "sampler target resolution must be set before building the grid".into(),
                ));
            }
        }

        let mut transforms = AttributeBuffer::new(build_transforms(&settings));

        // Placeholder brightness in [0,1) until the first sample arrives.
        let mut rng = Rng32::from_seed(0x00A5_C117);
        let mut scale_data = Vec::with_capacity(n * n);
        for _ in 0..n * n {
            scale_data.push(rng.next_f32());
        }
        let mut scales = AttributeBuffer::new(scale_data);

        // Fully populated; one dirty mark each.
        transforms.mark_dirty();
        scales.mark_dirty();

        Ok(Self { settings, transforms, scales, material })
    }

    /// Per-frame update. Refresh the time uniform, then overwrite the scale
    /// attribute from the current sample, row-major pixel k onto cell k.
    /// A not-ready sampler skips the overwrite; the previous values stay.
    pub fn update(&mut self, tick: &Tick, sampler: &mut FrameSampler) -> Result<(), Error> {
        self.material.uniforms.time = tick.elapsed;

        let px = match sampler.sample(tick.elapsed)? {
            Sample::Frame(px) => px,
            Sample::NotReady => return Ok(()),
        };

        // Checked at construction; diverging here means the sampler was
        // resized behind our back.
        if px.len() != self.scales.len() {
            return Err(Error::Config(format!(
                "sample has {} pixels for {} cells",
                px.len(),
                self.scales.len()
            )));
        }

        let scales = self.scales.as_mut_slice();
        for k in 0..px.len() {
            let (r, g, b, _a) = px.rgba(k); // alpha ignored
            scales[k] = brightness(r, g, b);
        }
        self.scales.mark_dirty();
        Ok(())
    }

    /// Apply a new settings value mid-run. Cell size and row flip take effect
    /// by rebuilding the transforms; the grid size is pinned to the sampler
    /// resolution from construction, so changing it is rejected.
    pub fn apply_settings(&mut self, settings: GridSettings) -> Result<(), Error> {
        if settings.size != self.settings.size {
            return Err(Error::Config(format!(
                "grid size is fixed at {} after construction",
                self.settings.size
            )));
        }
        if settings == self.settings {
            return Ok(());
        }
        self.settings = settings;
        let rebuilt = build_transforms(&self.settings);
        self.transforms.as_mut_slice().copy_from_slice(&rebuilt);
        self.transforms.mark_dirty();
        Ok(())
    }

    pub fn settings(&self) -> GridSettings {
        self.settings
    }

    pub fn size(&self) -> usize {
        self.settings.size
    }

    pub fn transforms(&self) -> &AttributeBuffer<InstanceTransform> {
        &self.transforms
    }

    pub fn transforms_mut(&mut self) -> &mut AttributeBuffer<InstanceTransform> {
        &mut self.transforms
    }

    pub fn scales(&self) -> &AttributeBuffer<f32> {
        &self.scales
    }

    pub fn scales_mut(&mut self) -> &mut AttributeBuffer<f32> {
        &mut self.scales
    }

    pub fn material(&self) -> &Material {
        &self.material
    }
}

fn build_transforms(settings: &GridSettings) -> Vec<InstanceTransform> {
    let n = settings.size;
    let cell = settings.cell_size;
    let half = settings.extent() * 0.5;
    let mut out = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            let x = j as f32 * cell - half;
            let mut y = i as f32 * cell - half;
            if settings.flip_rows {
                y = -y;
            }
            out.push(InstanceTransform { position: [x, y, 0.0] });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{CharAtlas, DEFAULT_RAMP};
    use crate::source::{FrameSource, ImageSource};
    use image::{Rgba, RgbaImage};

    fn test_material(n: usize) -> Material {
        Material::ascii(
            CharAtlas::from_ramp(DEFAULT_RAMP).unwrap(),
            [n as f32, n as f32],
        )
    }

    fn settings(n: usize) -> GridSettings {
        GridSettings { size: n, cell_size: 1.0, flip_rows: true }
    }

    fn sampler_for(img: RgbaImage, n: usize) -> FrameSampler {
        let mut sampler = FrameSampler::new(Box::new(ImageSource::from_image(img)));
        sampler.set_sample_size(Some(n as u32), Some(n as u32));
        sampler
    }

    fn solid(n: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(n, n, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    fn tick(elapsed: f32) -> Tick {
        Tick { elapsed, delta: 1.0 / 60.0 }
    }

    struct NeverReady;

    impl FrameSource for NeverReady {
        fn is_ready(&self) -> bool {
            false
        }
        fn intrinsic_size(&self) -> Option<(u32, u32)> {
            None
        }
        fn current_frame(&mut self, _elapsed: f32) -> Result<Option<&RgbaImage>, Error> {
            Ok(None)
        }
        fn tag(&self) -> &'static str {
            "NIL"
        }
    }

    #[test]
    fn test_construction_places_n_squared_cells_row_major() {
        let n = 3;
        let sampler = sampler_for(solid(3, [0, 0, 0]), n);
        let grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();

        let transforms = grid.transforms().as_slice();
        assert_eq!(transforms.len(), n * n);
        let half = 1.5f32;
        for i in 0..n {
            for j in 0..n {
                let expect = [
                    j as f32 - half,
                    -(i as f32 - half), // flip_rows = true
                    0.0,
                ];
                assert_eq!(transforms[i * n + j].position, expect, "cell ({i},{j})");
            }
        }
        // Every cell gets its own spot.
        for a in 0..transforms.len() {
            for b in (a + 1)..transforms.len() {
                assert_ne!(transforms[a].position, transforms[b].position);
            }
        }
    }

    #[test]
    fn test_unflipped_rows_mirror_the_vertical_axis() {
        let n = 2;
        let sampler = sampler_for(solid(2, [0, 0, 0]), n);
        let flipped = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();
        let plain = AsciiGrid::new(
            GridSettings { flip_rows: false, ..settings(n) },
            &sampler,
            test_material(n),
        )
        .unwrap();
        for (a, b) in flipped
            .transforms()
            .as_slice()
            .iter()
            .zip(plain.transforms().as_slice())
        {
            assert_eq!(a.position[0], b.position[0]);
            assert_eq!(a.position[1], -b.position[1]);
        }
    }

    #[test]
    fn test_initial_scales_are_pseudo_random_in_unit_range() {
        let n = 8;
        let sampler = sampler_for(solid(8, [0, 0, 0]), n);
        let grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();
        let scales = grid.scales().as_slice();
        assert_eq!(scales.len(), n * n);
        assert!(scales.iter().all(|s| (0.0..1.0).contains(s)));
        // A constant fill would defeat the placeholder's purpose.
        assert!(scales.iter().any(|s| *s != scales[0]));
    }

    #[test]
    fn test_buffers_are_dirty_exactly_once_after_construction() {
        let n = 2;
        let sampler = sampler_for(solid(2, [0, 0, 0]), n);
        let mut grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();
        assert!(grid.transforms_mut().take_dirty());
        assert!(grid.scales_mut().take_dirty());
        assert!(!grid.transforms().is_dirty());
        assert!(!grid.scales().is_dirty());
    }

    #[test]
    fn test_brightness_mapping_extremes() {
        assert_eq!(brightness(0, 0, 0), 1.0);
        assert_eq!(brightness(255, 255, 255), 0.0);
        assert!((brightness(255, 0, 0) - 0.701).abs() < 1e-3);
    }

    #[test]
    fn test_row_major_pixel_updates_the_matching_cell() {
        let n = 4;
        let mut img = solid(4, [255, 255, 255]);
        img.put_pixel(1, 1, Rgba([0, 0, 0, 255])); // row 1, col 1 -> index 5
        let mut sampler = sampler_for(img, n);
        let mut grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();

        grid.update(&tick(0.0), &mut sampler).unwrap();
        let scales = grid.scales().as_slice();
        assert_eq!(scales[5], 1.0);
        for (k, s) in scales.iter().enumerate() {
            if k != 5 {
                assert_eq!(*s, 0.0, "cell {k} should stay white");
            }
        }
    }

    #[test]
    fn test_update_is_idempotent_for_a_static_frame() {
        let n = 4;
        let mut sampler = sampler_for(solid(4, [40, 90, 160]), n);
        let mut grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();

        grid.update(&tick(0.0), &mut sampler).unwrap();
        let first: Vec<f32> = grid.scales().as_slice().to_vec();
        grid.update(&tick(0.5), &mut sampler).unwrap();
        assert_eq!(first, grid.scales().as_slice());
    }

    #[test]
    fn test_not_ready_sampler_leaves_scales_untouched() {
        let n = 4;
        let ready = sampler_for(solid(4, [0, 0, 0]), n);
        let mut grid = AsciiGrid::new(settings(n), &ready, test_material(n)).unwrap();
        grid.scales_mut().take_dirty();

        let mut gated = FrameSampler::new(Box::new(NeverReady));
        gated.set_sample_size(Some(n as u32), Some(n as u32));

        let before: Vec<f32> = grid.scales().as_slice().to_vec();
        grid.update(&tick(0.0), &mut gated).unwrap();
        assert_eq!(before, grid.scales().as_slice());
        assert!(!grid.scales().is_dirty());
        // The time uniform still advances on skipped frames.
        assert_eq!(grid.material().uniforms.time, 0.0);
        grid.update(&tick(2.5), &mut gated).unwrap();
        assert_eq!(grid.material().uniforms.time, 2.5);
    }

    #[test]
    fn test_solid_black_and_white_end_to_end() {
        let n = 2;
        let mut sampler = sampler_for(solid(2, [0, 0, 0]), n);
        let mut grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();
        grid.update(&tick(0.0), &mut sampler).unwrap();
        assert_eq!(grid.scales().as_slice(), &[1.0, 1.0, 1.0, 1.0]);

        let mut sampler = sampler_for(solid(2, [255, 255, 255]), n);
        let mut grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();
        grid.update(&tick(0.0), &mut sampler).unwrap();
        assert_eq!(grid.scales().as_slice(), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_sampler_grid_dimension_mismatch_fails_fast() {
        let sampler = sampler_for(solid(8, [0, 0, 0]), 8);
        assert!(AsciiGrid::new(settings(4), &sampler, test_material(4)).is_err());

        let unset = FrameSampler::new(Box::new(ImageSource::from_image(solid(8, [0, 0, 0]))));
        assert!(AsciiGrid::new(settings(8), &unset, test_material(8)).is_err());
    }

    #[test]
    fn test_apply_settings_rebuilds_transforms_without_reconstruction() {
        let n = 2;
        let sampler = sampler_for(solid(2, [0, 0, 0]), n);
        let mut grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();
        grid.transforms_mut().take_dirty();
        let before: Vec<InstanceTransform> = grid.transforms().as_slice().to_vec();

        let mut changed = settings(n);
        changed.flip_rows = false;
        grid.apply_settings(changed).unwrap();

        assert!(grid.transforms().is_dirty());
        for (a, b) in before.iter().zip(grid.transforms().as_slice()) {
            assert_eq!(a.position[1], -b.position[1]);
        }
    }

    #[test]
    fn test_apply_settings_rejects_a_size_change() {
        let n = 2;
        let sampler = sampler_for(solid(2, [0, 0, 0]), n);
        let mut grid = AsciiGrid::new(settings(n), &sampler, test_material(n)).unwrap();
        let mut changed = settings(n);
        changed.size = 4;
        assert!(grid.apply_settings(changed).is_err());
    }
}
