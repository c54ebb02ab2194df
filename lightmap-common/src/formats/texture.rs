//! RGBA8 texture binary format (.lmtex)
//!
//! POD format - no magic bytes.
//!
//! # Layout
//! ```text
//! 0x00: width u16 (max 65535)
//! 0x02: height u16 (max 65535)
//! 0x04: pixel_data (width × height × 4 bytes, row-major RGBA8)
//! ```
//!
//! Pixels are stored already gamma-corrected. The combined image keeps the
//! unclamped curve in f32, where black maps to -0.055 and a blend above 1
//! overshoots; each lane is clamped to [0, 1] and rounded when written here,
//! since RGBA8 cannot hold those values. NaN lanes are written as 0.

/// Texture header (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct LightmapTextureHeader {
    pub width: u16,
    pub height: u16,
}

impl LightmapTextureHeader {
    pub const SIZE: usize = 4;

    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Create header from u32 dimensions, or `None` if either exceeds u16
    pub fn try_from_u32(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            width: u16::try_from(width).ok()?,
            height: u16::try_from(height).ok()?,
        })
    }

    /// Calculate RGBA8 pixel data size (4 bytes per pixel)
    pub fn rgba8_size(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.width.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.height.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            width: u16::from_le_bytes([bytes[0], bytes[1]]),
            height: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_parsing() {
        // 64×32 texture header
        let data = [
            0x40, 0x00, // width = 64 (little-endian u16)
            0x20, 0x00, // height = 32 (little-endian u16)
        ];

        let header = LightmapTextureHeader::from_bytes(&data).unwrap();
        assert_eq!(header.width, 64);
        assert_eq!(header.height, 32);
    }

    #[test]
    fn test_try_from_u32_rejects_oversized() {
        assert!(LightmapTextureHeader::try_from_u32(70_000, 4).is_none());
        assert_eq!(
            LightmapTextureHeader::try_from_u32(512, 256),
            Some(LightmapTextureHeader::new(512, 256))
        );
    }

    #[test]
    fn test_rgba8_size() {
        let header = LightmapTextureHeader::new(64, 64);
        assert_eq!(header.rgba8_size(), 64 * 64 * 4);
    }
}
