use glam::{Vec2, Vec4};
use rand::Rng;

// --- Helper Functions ---

/// Converts a packed `0xRRGGBB` value into an opaque RGBA colour.
pub fn rgb_from_hex(hex: u32) -> Vec4 {
    let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
    let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
    let b = (hex & 0xFF) as f32 / 255.0;
    Vec4::new(r, g, b, 1.0)
}

/// Heading of a vector in radians, `atan2(y, x)`.
#[inline]
pub fn heading(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

// Teleport a coordinate to the opposite edge once it is more than `margin` outside [0, extent]
#[inline]
pub fn wrap_axis(value: f32, extent: f32, margin: f32) -> f32 {
    if value < -margin {
        extent + margin
    } else if value > extent + margin {
        -margin
    } else {
        value
    }
}

/// Uniform draw from `[0, extent)`; degenerate extents yield 0.
pub fn sample_below<R: Rng + ?Sized>(rng: &mut R, extent: f32) -> f32 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}
