// The shader program surface: opaque GLSL text plus the uniform values the
// grid writes each frame. A GPU backend would compile the text and bind the
// uniforms; the software presenter reads the same contract directly.
// Declared contract: uniforms `chars` (glyph atlas), `time` (seconds),
// `dimensions` (columns, rows); per-instance attribute `instanceScale`.

use crate::atlas::CharAtlas;

/// Uniform values shared by every instance in one draw.
pub struct Uniforms {
    /// Elapsed animation seconds; refreshed every tick.
    pub time: f32,
    /// Grid (columns, rows).
    pub dimensions: [f32; 2],
}

pub struct Material {
    pub vertex_src: &'static str,
    pub fragment_src: &'static str,
    /// The `chars` texture: brightness-indexed glyph atlas.
    pub chars: CharAtlas,
    pub uniforms: Uniforms,
}

impl Material {
    pub fn ascii(chars: CharAtlas, dimensions: [f32; 2]) -> Self {
        Self {
            vertex_src: include_str!("shader/vertex.glsl"),
            fragment_src: include_str!("shader/fragment.glsl"),
            chars,
            uniforms: Uniforms { time: 0.0, dimensions },
        }
    }
}
