//! Vertex data packing utilities
//!
//! Provides functions to convert f32 vertex data to packed GPU formats:
//! - f32 → f16 (IEEE 754 half-float) for positions
//! - f32 → unorm16 for the primary UV channel
//! - f32 → unorm8 for colors
//! - UV → RGBA8 fixed-point encoding for the lightmap channel
//!
//! Used by `lightmap-export` and by anything decoding its output.

use half::f16;

// ============================================================================
// Vertex Format Constants
// ============================================================================

/// Vertex format flag: Has primary UV coordinates
pub const FORMAT_UV: u8 = 1;
/// Vertex format flag: Has per-vertex color (RGBA, unorm8x4)
pub const FORMAT_COLOR: u8 = 2;

/// Largest quantized UV value (`u16::MAX`)
pub const UV_QUANT_MAX: u16 = u16::MAX;

/// Calculate vertex stride in bytes for packed GPU format
#[inline]
pub const fn vertex_stride_packed(format: u8) -> u32 {
    let mut stride = 8; // Position: Float16x4

    if format & FORMAT_UV != 0 {
        stride += 4; // Unorm16x2
    }
    if format & FORMAT_COLOR != 0 {
        stride += 4; // Unorm8x4
    }

    stride
}

// ============================================================================
// Basic Conversion Functions
// ============================================================================

/// Convert f32 to unsigned normalized 8-bit integer (unorm8)
///
/// Clamps into [0.0, 1.0] and rounds, so a lane stored as `b as f32 / 255.0`
/// always maps back to `b` and a gamma output of 0.99999994 still gives 255.
/// NaN maps to 0.
#[inline]
pub fn unorm8_from_lane(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

// ============================================================================
// Position Packing
// ============================================================================

/// Pack a 3D position (f32x3) to Float16x4 format (with w=1.0 padding)
#[inline]
pub fn pack_position_f16(x: f32, y: f32, z: f32) -> [f16; 4] {
    [
        f16::from_f32(x),
        f16::from_f32(y),
        f16::from_f32(z),
        f16::from_f32(1.0),
    ]
}

// ============================================================================
// UV Packing
// ============================================================================

/// Pack a 2D UV coordinate (f32x2) to Unorm16x2 format
#[inline]
pub fn pack_uv_unorm16(u: f32, v: f32) -> [u16; 2] {
    [
        (u.clamp(0.0, 1.0) * 65535.0) as u16,
        (v.clamp(0.0, 1.0) * 65535.0) as u16,
    ]
}

/// Quantize one UV axis to 16 bits
///
/// `floor(value * 65535)` for values in [0, 1]. Values outside that range are
/// not errors: the product is truncated toward zero and wrapped into 16 bits,
/// so 1.0 maps to 65535 and never overflows.
#[inline]
pub fn quantize_uv_axis(value: f32) -> u16 {
    // f32 * 65535 is exact in f64
    let scaled = (value as f64 * UV_QUANT_MAX as f64) as i64;
    (scaled & 0xFFFF) as u16
}

/// Encode a UV pair as four little-endian bytes `(U_lo, U_hi, V_lo, V_hi)`
#[inline]
pub fn encode_uv_rgba8(u: f32, v: f32) -> [u8; 4] {
    let [u_lo, u_hi] = quantize_uv_axis(u).to_le_bytes();
    let [v_lo, v_hi] = quantize_uv_axis(v).to_le_bytes();
    [u_lo, u_hi, v_lo, v_hi]
}

/// Encode a UV pair as an RGBA color whose lanes are `byte / 255.0`
#[inline]
pub fn encode_uv_color(u: f32, v: f32) -> [f32; 4] {
    encode_uv_rgba8(u, v).map(|b| b as f32 / 255.0)
}

/// Decode four bytes written by [`encode_uv_rgba8`] back to a UV pair
#[inline]
pub fn decode_uv_rgba8(bytes: [u8; 4]) -> [f32; 2] {
    let u = u16::from_le_bytes([bytes[0], bytes[1]]);
    let v = u16::from_le_bytes([bytes[2], bytes[3]]);
    [
        u as f32 / UV_QUANT_MAX as f32,
        v as f32 / UV_QUANT_MAX as f32,
    ]
}

// ============================================================================
// Color Packing
// ============================================================================

/// Pack an RGBA color (f32x4) to Unorm8x4 format
#[inline]
pub fn pack_color_rgba_unorm8(r: f32, g: f32, b: f32, a: f32) -> [u8; 4] {
    [
        unorm8_from_lane(r),
        unorm8_from_lane(g),
        unorm8_from_lane(b),
        unorm8_from_lane(a),
    ]
}
