//! Error type for lightmap conversion

use crate::texture::store::ImageId;
use crate::scene::ObjectId;

/// Error raised by the lightmap pipeline.
///
/// Precondition failures all share one user-facing kind; the remaining
/// variants cover image data and I/O problems.
#[derive(Debug, thiserror::Error)]
pub enum LightmapError {
    #[error("{0}")]
    Precondition(String),

    #[error(
        "Ambient occlusion image is {ao_width}x{ao_height}, expected {width}x{height} to match the lightmap"
    )]
    ImageSizeMismatch {
        width: u32,
        height: u32,
        ao_width: u32,
        ao_height: u32,
    },

    #[error("Image {0:?} not found in store")]
    MissingImage(ImageId),

    #[error("{0} image has no pixel data")]
    NoPixelData(&'static str),

    #[error("Mesh '{name}' has {corners} corners, exceeds maximum {max} for u16 indices")]
    TooManyCorners {
        name: String,
        corners: usize,
        max: usize,
    },

    #[error("Object {0:?} not found in scene")]
    MissingObject(ObjectId),

    #[error("Material conversion failed: {0:#}")]
    Conversion(anyhow::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LightmapError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// True for the user-facing precondition kind
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

pub type Result<T> = std::result::Result<T, LightmapError>;
