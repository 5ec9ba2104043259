//! Enhancement stages applied to the region of interest.
//!
//! The order is fixed:
//! 1. median smoothing (impulse noise)
//! 2. background compensation (divide by a blurred illumination estimate)
//! 3. gamma lookup
//! 4. 5x5 Gaussian noise reduction
//! 5. CLAHE on an 8x8 grid

use image::GrayImage;
use imageproc::filter::median_filter;

use crate::clahe::{clahe, CLAHE_GRID};
use crate::error::{alloc_plane, Result};
use crate::filters::{gaussian_blur, gaussian_blur_f32, plane_from_raw, saturate_u8, to_float};
use crate::params::DerivedParams;

/// Median window for the initial smoothing pass (edges replicate).
pub const MEDIAN_KERNEL_SIZE: u32 = 5;
/// Gaussian window for the noise-reduction pass.
pub const NOISE_KERNEL_SIZE: u32 = 5;
/// Offset added to the illumination estimate so the division never hits zero.
const BACKGROUND_OFFSET: f32 = 1.0;
/// Output level of a pixel that matches its local illumination.
const BACKGROUND_TARGET: f32 = 255.0;

/// Normalize uneven illumination.
///
/// Each pixel is divided by `1 + blur(src)` and scaled by 255, so areas at their
/// local baseline land near 255 and locally darker structures fall below it.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if scratch buffers cannot be allocated.
pub fn background_compensation(src: &GrayImage, kernel_size: u32) -> Result<GrayImage> {
    let (w, h) = src.dimensions();
    let float = to_float(src)?;
    let background = gaussian_blur_f32(&float, kernel_size)?;

    let mut out = alloc_plane::<u8>(float.as_raw().len())?;
    for ((dst, &v), &bg) in out
        .iter_mut()
        .zip(float.as_raw())
        .zip(background.as_raw())
    {
        *dst = saturate_u8(v / (bg + BACKGROUND_OFFSET) * BACKGROUND_TARGET);
    }
    plane_from_raw(w, h, out)
}

/// Build the 256-entry gamma table `round(255 * (i / 255) ^ (1 / gamma))`.
///
/// The exponent is the reciprocal of `gamma`: values above 1 brighten midtones,
/// values below 1 darken them.
#[must_use]
pub fn gamma_lut(gamma: f32) -> [u8; 256] {
    let exponent = 1.0 / f64::from(gamma);
    let mut lut = [0u8; 256];
    for (i, entry) in lut.iter_mut().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let normalized = i as f64 / 255.0;
        let value = (255.0 * normalized.powf(exponent)).round();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            *entry = value.clamp(0.0, 255.0) as u8;
        }
    }
    lut
}

/// Map every pixel through `lut`.
#[must_use]
pub fn apply_lut(src: &GrayImage, lut: &[u8; 256]) -> GrayImage {
    let mut out = src.clone();
    for v in out.iter_mut() {
        *v = lut[*v as usize];
    }
    out
}

/// Run the full enhancement sequence over an extracted region.
///
/// The output has the same dimensions as `roi`.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if any intermediate buffer cannot
/// be allocated.
pub fn enhance_roi(roi: &GrayImage, params: &DerivedParams) -> Result<GrayImage> {
    let smoothed = median_filter(roi, MEDIAN_KERNEL_SIZE / 2, MEDIAN_KERNEL_SIZE / 2);
    let normalized = background_compensation(&smoothed, params.background_kernel)?;
    let corrected = apply_lut(&normalized, &gamma_lut(params.gamma));
    let denoised = gaussian_blur(&corrected, NOISE_KERNEL_SIZE)?;
    clahe(&denoised, params.clahe_clip_limit, CLAHE_GRID)
}
