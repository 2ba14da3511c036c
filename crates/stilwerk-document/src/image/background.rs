// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background synthesizer — resize the cover photo to a page, blur it, and
// blend in a film-grain layer. Operates on in-memory images using the `image`
// and `imageproc` crates; grain samples are drawn from `rand`.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;
use rand::Rng;
use stilwerk_core::config::RestyleConfig;
use stilwerk_core::error::{Result, StilwerkError};
use tracing::{debug, info, instrument};

/// Blur and grain parameters of the stylised background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackgroundStyle {
    /// Gaussian sigma; `0` disables the blur.
    pub blur_radius: f32,
    /// Weight of the grain layer in the final blend.
    pub grain_strength: f32,
    pub grain_mean: f32,
    pub grain_std_dev: f32,
}

impl Default for BackgroundStyle {
    fn default() -> Self {
        Self::from(&RestyleConfig::default())
    }
}

impl From<&RestyleConfig> for BackgroundStyle {
    fn from(config: &RestyleConfig) -> Self {
        Self {
            blur_radius: config.blur_radius,
            grain_strength: config.grain_strength,
            grain_mean: config.grain_mean,
            grain_std_dev: config.grain_std_dev,
        }
    }
}

/// Produces per-page backgrounds from one cover image.
///
/// The cover is decoded once and kept read-only; every call to
/// [`BackgroundSynthesizer::synthesize`] works on a fresh resized copy, so the
/// synthesizer can be shared across worker threads.
///
/// ```ignore
/// let synth = BackgroundSynthesizer::open("background.jpg", BackgroundStyle::default())?;
/// let page_bg = synth.synthesize(595.0, 842.0, &mut rand::rng())?;
/// ```
pub struct BackgroundSynthesizer {
    cover: RgbImage,
    style: BackgroundStyle,
}

impl BackgroundSynthesizer {
    // -- Construction ---------------------------------------------------------

    /// Load the cover image from a file path.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<std::path::Path>, style: BackgroundStyle) -> Result<Self> {
        let img = image::open(path.as_ref()).map_err(|err| {
            StilwerkError::ImageError(format!(
                "failed to open cover {}: {}",
                path.as_ref().display(),
                err
            ))
        })?;
        info!(width = img.width(), height = img.height(), "Cover image loaded");
        Ok(Self::from_dynamic(img, style))
    }

    /// Create a synthesizer from encoded cover bytes (JPEG, PNG, etc.).
    #[instrument(skip(data, style), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], style: BackgroundStyle) -> Result<Self> {
        let img = image::load_from_memory(data).map_err(|err| {
            StilwerkError::ImageError(format!("failed to decode cover image: {}", err))
        })?;
        debug!(width = img.width(), height = img.height(), "Cover decoded from bytes");
        Ok(Self::from_dynamic(img, style))
    }

    /// Wrap an already-decoded image.
    pub fn from_dynamic(image: DynamicImage, style: BackgroundStyle) -> Self {
        Self {
            cover: image.to_rgb8(),
            style,
        }
    }

    // -- Synthesis ------------------------------------------------------------

    /// Build the background for a page of `width` x `height` points.
    ///
    /// Fractional sizes truncate; anything below one pixel in either direction
    /// is an input error. The grain is drawn from `rng`, so two calls produce
    /// different textures unless the generator is seeded identically.
    #[instrument(skip(self, rng), fields(width, height))]
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        width: f32,
        height: f32,
        rng: &mut R,
    ) -> Result<RgbImage> {
        let (target_w, target_h) = pixel_dimensions(width, height)?;

        let resized = imageops::resize(&self.cover, target_w, target_h, FilterType::Lanczos3);
        let blurred = if self.style.blur_radius > 0.0 {
            gaussian_blur_f32(&resized, self.style.blur_radius)
        } else {
            resized
        };

        let grain = grain_layer(
            target_w,
            target_h,
            self.style.grain_mean,
            self.style.grain_std_dev,
            rng,
        )?;
        let blended = blend(&blurred, &grain, self.style.grain_strength);

        debug!(target_w, target_h, "Background synthesised");
        Ok(blended)
    }
}

/// Integer pixel size for a page, truncating fractional points.
fn pixel_dimensions(width: f32, height: f32) -> Result<(u32, u32)> {
    let invalid = || StilwerkError::InvalidDimensions { width, height };
    if !width.is_finite() || !height.is_finite() {
        return Err(invalid());
    }
    let (w, h) = (width.trunc(), height.trunc());
    if w < 1.0 || h < 1.0 || w > u32::MAX as f32 || h > u32::MAX as f32 {
        return Err(invalid());
    }
    Ok((w as u32, h as u32))
}

/// Independent per-pixel, per-channel samples of N(mean, std_dev), clamped to
/// `[0, 255]` and truncated to 8 bits.
pub fn grain_layer<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    mean: f32,
    std_dev: f32,
    rng: &mut R,
) -> Result<RgbImage> {
    if !mean.is_finite() || !std_dev.is_finite() || std_dev < 0.0 {
        return Err(StilwerkError::Config(format!(
            "invalid grain distribution: mean {mean}, std_dev {std_dev}"
        )));
    }
    let mut sample = || {
        // Box-Muller; u1 lies in (0, 1] so the log stays finite.
        let u1: f32 = 1.0 - rng.random::<f32>();
        let u2: f32 = rng.random();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        (mean + std_dev * z).clamp(0.0, 255.0) as u8
    };
    let mut grain = RgbImage::new(width, height);
    for pixel in grain.pixels_mut() {
        *pixel = Rgb([sample(), sample(), sample()]);
    }
    Ok(grain)
}

/// Alpha-blend `overlay` onto `base` with weight `alpha` (0 = base, 1 = overlay).
pub fn blend(base: &RgbImage, overlay: &RgbImage, alpha: f32) -> RgbImage {
    let alpha = alpha.clamp(0.0, 1.0);
    RgbImage::from_fn(base.width(), base.height(), |x, y| {
        let Rgb(b) = *base.get_pixel(x, y);
        let Rgb(o) = *overlay.get_pixel(x, y);
        let mix = |bc: u8, oc: u8| -> u8 {
            let val = bc as f32 + alpha * (oc as f32 - bc as f32);
            val.round().clamp(0.0, 255.0) as u8
        };
        Rgb([mix(b[0], o[0]), mix(b[1], o[1]), mix(b[2], o[2])])
    })
}
