//! Lightmap combiner
//!
//! Blends a baked lightmap with an optional ambient-occlusion bake and
//! gamma-encodes the result for a target that samples textures raw.
//!
//! Per pixel, per RGB channel:
//! ```text
//! raw = lightmap                                               (AO disabled)
//! raw = ao * lightmap * strength + lightmap * (1 - strength)   (AO enabled)
//! out = 1.055 * raw^(1/2.4) - 0.055
//! ```
//! Alpha is copied from the lightmap untouched.

use anyhow::Context;
use lightmap_common::gamma_correct;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{LightmapError, Result};
use crate::formats::{write_lightmap_texture, LIGHTMAP_TEXTURE_EXT};
use crate::naming::{combined_image_name, COMBINED_IMAGE_PREFIX};
use crate::texture::store::{EvictedImage, EvictionPolicy, ImageId, ImageStore};
use crate::texture::{ImageBuffer, LinearImage};

/// Default weight of the ambient-occlusion contribution
pub const DEFAULT_AO_STRENGTH: f32 = 0.75;

/// What happens to blended values outside [0, 1] before gamma encoding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClampPolicy {
    /// Leave values as they are. Negative values encode to NaN.
    #[default]
    None,
    /// Clamp into [0, 1]
    Unit,
}

impl ClampPolicy {
    #[inline]
    fn apply(self, value: f32) -> f32 {
        match self {
            ClampPolicy::None => value,
            ClampPolicy::Unit => value.clamp(0.0, 1.0),
        }
    }
}

/// How the combined image name is derived from the active object
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombinedNaming {
    /// `lightmap_` + first 8 characters. Objects sharing a prefix overwrite
    /// each other's combined texture.
    #[default]
    Truncated,
    /// `lightmap_` + the whole object name
    Full,
}

impl CombinedNaming {
    pub fn derive(self, object_name: &str) -> String {
        match self {
            CombinedNaming::Truncated => combined_image_name(object_name),
            CombinedNaming::Full => format!("{COMBINED_IMAGE_PREFIX}{object_name}"),
        }
    }
}

/// Combiner parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombineSettings {
    /// AO blend weight. Not range-checked; zero disables AO.
    pub ao_strength: f32,
    pub clamp: ClampPolicy,
    pub naming: CombinedNaming,
}

impl Default for CombineSettings {
    fn default() -> Self {
        Self {
            ao_strength: DEFAULT_AO_STRENGTH,
            clamp: ClampPolicy::None,
            naming: CombinedNaming::Truncated,
        }
    }
}

/// Result of [`combine_lightmaps`]
#[derive(Debug, Clone)]
pub struct CombinedLightmap {
    pub id: ImageId,
    pub name: String,
    /// Image removed to make room, if any
    pub evicted: Option<EvictedImage>,
}

/// AO takes part only if strength is positive, an image is given, and its
/// pixels are readable. Strength is checked first so a disabled AO image is
/// never touched.
pub fn ao_enabled(ao: Option<&dyn ImageBuffer>, strength: f32) -> bool {
    strength > 0.0 && ao.is_some_and(|img| img.has_pixels())
}

/// Blend one lightmap channel with its AO channel
#[inline]
pub fn blend_channel(lightmap: f32, ao: Option<f32>, strength: f32) -> f32 {
    match ao {
        Some(ao) => ao * lightmap * strength + lightmap * (1.0 - strength),
        None => lightmap,
    }
}

/// Combine pixel data into a new image the size of `lightmap`
pub fn combine_pixels(
    lightmap: &dyn ImageBuffer,
    ao: Option<&dyn ImageBuffer>,
    strength: f32,
    clamp: ClampPolicy,
) -> Result<LinearImage> {
    if !lightmap.has_pixels() {
        return Err(LightmapError::NoPixelData("Lightmap"));
    }

    let (width, height) = (lightmap.width(), lightmap.height());
    let ao = if ao_enabled(ao, strength) { ao } else { None };

    if let Some(ao) = ao {
        if ao.width() != width || ao.height() != height {
            return Err(LightmapError::ImageSizeMismatch {
                width,
                height,
                ao_width: ao.width(),
                ao_height: ao.height(),
            });
        }
    }

    let mut combined = LinearImage::new(width, height);
    for y in 0..height {
        for x in 0..width {
            let lm = lightmap.get_pixel(x, y);
            let ao_px = ao.map(|img| img.get_pixel(x, y));

            let mut out = lm;
            for c in 0..3 {
                let raw = blend_channel(lm[c], ao_px.map(|p| p[c]), strength);
                out[c] = gamma_correct(clamp.apply(raw));
            }
            combined.set_pixel(x, y, out);
        }
    }

    Ok(combined)
}

/// Combine stored images into a packed image named after `object_name`
///
/// Whatever `policy` evicts for the derived name is removed before the new
/// image is inserted. Returns the new handle.
pub fn combine_lightmaps(
    store: &mut ImageStore,
    lightmap: ImageId,
    ao: Option<ImageId>,
    object_name: &str,
    settings: &CombineSettings,
    policy: &mut dyn EvictionPolicy,
) -> Result<CombinedLightmap> {
    let lm_image = store.image(lightmap)?;

    // Never look the AO image up unless strength asks for it
    let ao_image = if settings.ao_strength > 0.0 {
        ao.and_then(|id| store.get(id)).map(|stored| &stored.image)
    } else {
        None
    };
    if ao.is_some() && ao_image.is_none() && settings.ao_strength > 0.0 {
        tracing::warn!("Ambient occlusion image is missing, combining without it");
    }

    let combined = combine_pixels(
        lm_image,
        ao_image.map(|img| img as &dyn ImageBuffer),
        settings.ao_strength,
        settings.clamp,
    )?;

    let name = settings.naming.derive(object_name);
    let (width, height) = (combined.width, combined.height);
    let (id, evicted) = store.replace(&name, combined, Some(object_name.to_string()), policy);

    if let Some(old) = &evicted {
        if old.source.as_deref() != Some(object_name) {
            tracing::warn!(
                "Combined lightmap '{}' for '{}' replaced the one made for '{}'",
                name,
                object_name,
                old.source.as_deref().unwrap_or("<unknown>")
            );
        }
    }

    store.pack(id)?;
    tracing::info!("Combined lightmap '{}': {}x{}", name, width, height);

    Ok(CombinedLightmap {
        id,
        name,
        evicted,
    })
}

/// Combine image files and write the result to `output`
///
/// A `.lmtex` output gets the binary texture format; anything else is
/// written as PNG.
pub fn combine_files(
    lightmap: &Path,
    ao: Option<&Path>,
    strength: f32,
    clamp: ClampPolicy,
    output: &Path,
) -> anyhow::Result<()> {
    let lm_image = LinearImage::open(lightmap)
        .with_context(|| format!("Failed to load lightmap image: {:?}", lightmap))?;
    let ao_image = match ao {
        Some(path) if strength > 0.0 => Some(
            LinearImage::open(path)
                .with_context(|| format!("Failed to load ambient occlusion image: {:?}", path))?,
        ),
        _ => None,
    };

    let combined = combine_pixels(
        &lm_image,
        ao_image.as_ref().map(|img| img as &dyn ImageBuffer),
        strength,
        clamp,
    )?;

    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();
    if ext == LIGHTMAP_TEXTURE_EXT {
        let file = File::create(output).with_context(|| format!("Failed to create {:?}", output))?;
        let mut w = BufWriter::new(file);
        write_lightmap_texture(&mut w, &combined)?;
        w.flush()?;
    } else {
        let png = combined.encode_png()?;
        std::fs::write(output, png).with_context(|| format!("Failed to write {:?}", output))?;
    }

    tracing::info!(
        "Combined {:?} -> {:?} ({}x{})",
        lightmap,
        output,
        combined.width,
        combined.height
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::store::EvictByName;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    /// Image whose pixels cannot be read at all
    struct Unreadable;

    impl ImageBuffer for Unreadable {
        fn width(&self) -> u32 {
            7
        }
        fn height(&self) -> u32 {
            7
        }
        fn has_pixels(&self) -> bool {
            false
        }
        fn get_pixel(&self, _x: u32, _y: u32) -> [f32; 4] {
            panic!("AO pixels read while AO is disabled")
        }
        fn set_pixel(&mut self, _x: u32, _y: u32, _rgba: [f32; 4]) {}
    }

    fn two_by_one() -> LinearImage {
        let mut lm = LinearImage::new(2, 1);
        lm.set_pixel(0, 0, [0.5, 0.5, 0.5, 1.0]);
        lm.set_pixel(1, 0, [1.0, 0.0, 0.0, 1.0]);
        lm
    }

    #[test]
    fn test_gamma_without_ao() {
        let out = combine_pixels(&two_by_one(), None, 0.75, ClampPolicy::None).unwrap();
        let p0 = out.get_pixel(0, 0);
        let g = gamma_correct(0.5);
        assert!(approx(g, 0.7354));
        assert!(approx(p0[0], g) && approx(p0[1], g) && approx(p0[2], g));
        assert_eq!(p0[3], 1.0);

        let p1 = out.get_pixel(1, 0);
        assert!(approx(p1[0], 1.0));
        assert!(approx(p1[1], -0.055));
        assert!(approx(p1[2], -0.055));
        assert_eq!(p1[3], 1.0);
    }

    #[test]
    fn test_alpha_is_copied_not_gamma_corrected() {
        let lm = LinearImage::filled(1, 1, [0.2, 0.2, 0.2, 0.5]);
        let out = combine_pixels(&lm, None, 0.0, ClampPolicy::None).unwrap();
        assert_eq!(out.get_pixel(0, 0)[3], 0.5);
    }

    #[test]
    fn test_ao_blend() {
        let lm = LinearImage::filled(1, 1, [0.8, 0.8, 0.8, 1.0]);
        let ao = LinearImage::filled(1, 1, [0.5, 0.25, 1.0, 1.0]);
        let out = combine_pixels(&lm, Some(&ao), 0.75, ClampPolicy::None).unwrap();
        let px = out.get_pixel(0, 0);
        // 0.5*0.8*0.75 + 0.8*0.25 = 0.5
        assert!(approx(px[0], gamma_correct(0.5)));
        // 0.25*0.8*0.75 + 0.2 = 0.35
        assert!(approx(px[1], gamma_correct(0.35)));
        // AO of 1.0 leaves the lightmap as is
        assert!(approx(px[2], gamma_correct(0.8)));
    }

    #[test]
    fn test_zero_strength_matches_no_ao() {
        let lm = two_by_one();
        let ao = LinearImage::filled(2, 1, [0.1, 0.9, 0.3, 1.0]);
        let without = combine_pixels(&lm, None, 0.0, ClampPolicy::None).unwrap();
        let with = combine_pixels(&lm, Some(&ao), 0.0, ClampPolicy::None).unwrap();
        assert_eq!(with, without);
    }

    #[test]
    fn test_zero_strength_ignores_malformed_ao() {
        let lm = two_by_one();
        let short = LinearImage::from_raw(2, 1, vec![0.0; 3]);
        let wrong_size = LinearImage::new(9, 9);
        let reference = combine_pixels(&lm, None, 0.0, ClampPolicy::None).unwrap();

        for ao in [&short as &dyn ImageBuffer, &wrong_size, &Unreadable] {
            let out = combine_pixels(&lm, Some(ao), 0.0, ClampPolicy::None).unwrap();
            assert_eq!(out, reference);
        }
    }

    #[test]
    fn test_unreadable_ao_is_disabled() {
        let lm = two_by_one();
        let reference = combine_pixels(&lm, None, 0.75, ClampPolicy::None).unwrap();
        let out = combine_pixels(&lm, Some(&Unreadable), 0.75, ClampPolicy::None).unwrap();
        assert_eq!(out, reference);
    }

    #[test]
    fn test_ao_size_mismatch_errors_when_enabled() {
        let lm = two_by_one();
        let ao = LinearImage::new(4, 4);
        let err = combine_pixels(&lm, Some(&ao), 0.5, ClampPolicy::None).unwrap_err();
        assert!(matches!(
            err,
            LightmapError::ImageSizeMismatch {
                width: 2,
                height: 1,
                ao_width: 4,
                ao_height: 4
            }
        ));
    }

    #[test]
    fn test_negative_blend_is_nan_unless_clamped() {
        let lm = LinearImage::filled(1, 1, [0.5, 0.5, 0.5, 1.0]);
        // strength 2: ao*lm*2 - lm = 0.5*0.1*2 - 0.5 < 0
        let ao = LinearImage::filled(1, 1, [0.1, 0.1, 0.1, 1.0]);

        let raw = combine_pixels(&lm, Some(&ao), 2.0, ClampPolicy::None).unwrap();
        assert!(raw.get_pixel(0, 0)[0].is_nan());

        let clamped = combine_pixels(&lm, Some(&ao), 2.0, ClampPolicy::Unit).unwrap();
        assert!(approx(clamped.get_pixel(0, 0)[0], -0.055));
    }

    #[test]
    fn test_clamp_caps_overshoot() {
        let lm = LinearImage::filled(1, 1, [0.9, 0.9, 0.9, 1.0]);
        let ao = LinearImage::filled(1, 1, [2.0, 2.0, 2.0, 1.0]);
        let out = combine_pixels(&lm, Some(&ao), 1.0, ClampPolicy::Unit).unwrap();
        assert!(approx(out.get_pixel(0, 0)[0], 1.0));
    }

    #[test]
    fn test_unreadable_lightmap_errors() {
        let lm = LinearImage::from_raw(2, 2, Vec::new());
        assert!(matches!(
            combine_pixels(&lm, None, 0.0, ClampPolicy::None),
            Err(LightmapError::NoPixelData("Lightmap"))
        ));
    }

    #[test]
    fn test_combine_lightmaps_replaces_and_packs() {
        let mut store = ImageStore::new();
        let lm = store.insert("bake", two_by_one());
        let settings = CombineSettings::default();

        let first =
            combine_lightmaps(&mut store, lm, None, "Courtyard", &settings, &mut EvictByName)
                .unwrap();
        assert_eq!(first.name, "lightmap_Courtyar");
        assert!(first.evicted.is_none());
        assert!(store.get(first.id).unwrap().is_packed());

        let second =
            combine_lightmaps(&mut store, lm, None, "Courtyard", &settings, &mut EvictByName)
                .unwrap();
        assert_eq!(second.evicted.as_ref().map(|e| e.id), Some(first.id));
        assert!(!store.contains(first.id));
        assert_eq!(store.find("lightmap_Courtyar"), Some(second.id));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_prefix_collision_overwrites_other_object() {
        let mut store = ImageStore::new();
        let lm = store.insert("bake", two_by_one());
        let settings = CombineSettings::default();

        let inner = combine_lightmaps(
            &mut store,
            lm,
            None,
            "Castle_Keep_North",
            &settings,
            &mut EvictByName,
        )
        .unwrap();
        let outer = combine_lightmaps(
            &mut store,
            lm,
            None,
            "Castle_Keep_South",
            &settings,
            &mut EvictByName,
        )
        .unwrap();

        let evicted = outer.evicted.unwrap();
        assert_eq!(evicted.id, inner.id);
        assert_eq!(evicted.source.as_deref(), Some("Castle_Keep_North"));
    }

    #[test]
    fn test_full_naming_avoids_collision() {
        let mut store = ImageStore::new();
        let lm = store.insert("bake", two_by_one());
        let settings = CombineSettings {
            naming: CombinedNaming::Full,
            ..Default::default()
        };

        combine_lightmaps(&mut store, lm, None, "Castle_Keep_North", &settings, &mut EvictByName)
            .unwrap();
        let outer = combine_lightmaps(
            &mut store,
            lm,
            None,
            "Castle_Keep_South",
            &settings,
            &mut EvictByName,
        )
        .unwrap();
        assert!(outer.evicted.is_none());
        assert_eq!(outer.name, "lightmap_Castle_Keep_South");
    }

    #[test]
    fn test_zero_strength_skips_missing_ao_handle() {
        let mut store = ImageStore::new();
        let lm = store.insert("bake", two_by_one());
        let ao = store.insert("ao", LinearImage::new(2, 1));
        store.remove(ao);

        let settings = CombineSettings {
            ao_strength: 0.0,
            ..Default::default()
        };
        let out = combine_lightmaps(&mut store, lm, Some(ao), "Box", &settings, &mut EvictByName)
            .unwrap();
        assert!(store.contains(out.id));
    }

    #[test]
    fn test_combine_files_png_and_lmtex() {
        let dir = tempfile::tempdir().unwrap();
        let lm_path = dir.path().join("bake.png");
        let ao_path = dir.path().join("ao.png");
        image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 255, 255, 255]))
            .save(&lm_path)
            .unwrap();
        image::RgbaImage::from_pixel(3, 2, image::Rgba([0, 0, 0, 255]))
            .save(&ao_path)
            .unwrap();

        let png_out = dir.path().join("combined.png");
        combine_files(&lm_path, Some(&ao_path), 0.5, ClampPolicy::None, &png_out).unwrap();
        let png = image::open(&png_out).unwrap().to_rgba8();
        assert_eq!(png.dimensions(), (3, 2));
        // raw = 0.5 -> gamma(0.5) ~ 0.7354 -> 187.5 rounds up
        assert_eq!(png.get_pixel(0, 0).0, [188, 188, 188, 255]);

        let tex_out = dir.path().join("combined.lmtex");
        combine_files(&lm_path, None, 0.5, ClampPolicy::None, &tex_out).unwrap();
        let bytes = std::fs::read(&tex_out).unwrap();
        assert_eq!(&bytes[..4], &[3, 0, 2, 0]);
        assert_eq!(&bytes[4..8], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_combine_files_rejects_mismatched_ao() {
        let dir = tempfile::tempdir().unwrap();
        let lm_path = dir.path().join("bake.png");
        let ao_path = dir.path().join("ao.png");
        image::RgbaImage::new(4, 4).save(&lm_path).unwrap();
        image::RgbaImage::new(2, 2).save(&ao_path).unwrap();

        let out = dir.path().join("out.png");
        let err = combine_files(&lm_path, Some(&ao_path), 0.75, ClampPolicy::Unit, &out).unwrap_err();
        assert!(err.to_string().contains("2x2"));
        assert!(!out.exists());
    }
}
