//! Gamma curve applied to combined lightmaps
//!
//! Lightmaps are baked in linear space. The fixed-function target samples
//! textures without any colour-space conversion, so the combiner stores the
//! sRGB-style encoded value instead.

/// Exponent of the encode curve (`1 / 2.4`)
pub const GAMMA_EXPONENT: f32 = 1.0 / 2.4;

/// Encode a linear channel value with `1.055 * x^(1/2.4) - 0.055`.
///
/// No clamping happens here: `gamma_correct(0.0)` is `-0.055` and negative
/// input yields NaN. Callers that want a bounded result clamp first.
#[inline]
pub fn gamma_correct(value: f32) -> f32 {
    1.055 * value.powf(GAMMA_EXPONENT) - 0.055
}
