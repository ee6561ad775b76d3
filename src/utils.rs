//! Utility functions

use serde::{Deserialize, Serialize};

// ============================================================================
// Color
// ============================================================================

/// Straight (non-premultiplied) RGBA color with components in 0.0..=1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::from_rgb(1.0, 1.0, 1.0);

    pub const fn from_rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::from_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// Same color with alpha multiplied by `factor`
    pub fn scale_alpha(self, factor: f32) -> Self {
        Self {
            a: self.a * clamp01(factor),
            ..self
        }
    }
}

// ============================================================================
// Interpolation
// ============================================================================

/// Linear interpolation
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp to 0.0..=1.0, mapping NaN to 0.0
pub fn clamp01(v: f32) -> f32 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Convert a per-tick factor tuned at 60 fps into one for a frame of `dt` seconds
pub fn frame_rate_independent(factor_per_tick: f32, dt: f32) -> f32 {
    1.0 - (1.0 - clamp01(factor_per_tick)).powf(dt.max(0.0) * 60.0)
}
