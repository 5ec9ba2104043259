//! Conversions between the RGBA display format and the single-channel working plane.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};

use crate::error::{Error, Result};

/// Channel treated as the near-infrared-sensitive plane (red).
pub const VEIN_CHANNEL: usize = 0;

/// Accept a decoded image as an RGBA display frame.
///
/// 8-bit gray, gray+alpha, RGB and RGBA buffers are supported; everything but RGBA
/// is promoted with opaque alpha.
///
/// # Errors
///
/// Returns [`Error::UnsupportedFormat`] for 16-bit or floating-point buffers.
pub fn rgba_frame(image: DynamicImage) -> Result<RgbaImage> {
    match image {
        DynamicImage::ImageRgba8(rgba) => Ok(rgba),
        img @ (DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)) => Ok(img.to_rgba8()),
        other => Err(Error::UnsupportedFormat(format!("{:?}", other.color()))),
    }
}

/// Copy the vein-carrying channel ([`VEIN_CHANNEL`]) of an RGBA frame into its
/// own grayscale plane.
///
/// The plane owns its pixels; writing to it leaves the source frame untouched.
#[must_use]
pub fn extract_vein_channel(frame: &RgbaImage) -> GrayImage {
    let (w, h) = frame.dimensions();
    let mut plane = GrayImage::new(w, h);
    for (dst, src) in plane.pixels_mut().zip(frame.pixels()) {
        *dst = Luma([src[VEIN_CHANNEL]]);
    }
    plane
}

/// Expand a grayscale plane into an opaque RGBA frame (`[v, v, v, 255]`).
#[must_use]
pub fn gray_to_rgba(plane: &GrayImage) -> RgbaImage {
    let (w, h) = plane.dimensions();
    let mut frame = RgbaImage::new(w, h);
    for (dst, src) in frame.pixels_mut().zip(plane.pixels()) {
        let v = src[0];
        *dst = Rgba([v, v, v, 255]);
    }
    frame
}

/// Dimensions of a frame after scaling both sides by `scale` (rounded).
///
/// # Errors
///
/// Returns [`Error::InvalidScaleFactor`] if `scale` is outside `(0, 1]` or either
/// scaled side rounds to zero.
pub fn scaled_dimensions(width: u32, height: u32, scale: f32) -> Result<(u32, u32)> {
    if !(scale > 0.0 && scale <= 1.0) {
        return Err(Error::InvalidScaleFactor(scale));
    }
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let scaled = |side: u32| (side as f32 * scale).round() as u32;
    let (sw, sh) = (scaled(width), scaled(height));
    if sw == 0 || sh == 0 {
        return Err(Error::InvalidScaleFactor(scale));
    }
    Ok((sw, sh))
}

/// Downscale a frame with bilinear filtering. A scale of 1.0 returns a copy.
///
/// # Errors
///
/// See [`scaled_dimensions`].
pub fn downscale(frame: &RgbaImage, scale: f32) -> Result<RgbaImage> {
    let (w, h) = frame.dimensions();
    let (sw, sh) = scaled_dimensions(w, h, scale)?;
    if (sw, sh) == (w, h) {
        return Ok(frame.clone());
    }
    Ok(imageops::resize(frame, sw, sh, FilterType::Triangle))
}
