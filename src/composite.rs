//! Darken veins by subtracting the mask and paste the region back into the frame.

use image::{GrayImage, RgbaImage};

use crate::channel::gray_to_rgba;
use crate::error::{Error, Result};
use crate::roi::Roi;

/// Pixel-wise saturating `enhanced - mask`.
///
/// Where the mask is 255 the pixel drops to 0; where it is 0 the pixel is kept.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if the two planes differ in size.
pub fn subtract_mask(enhanced: &GrayImage, mask: &GrayImage) -> Result<GrayImage> {
    if enhanced.dimensions() != mask.dimensions() {
        return Err(Error::InvalidDimensions {
            width: mask.width(),
            height: mask.height(),
        });
    }
    let mut out = enhanced.clone();
    for (dst, &m) in out.iter_mut().zip(mask.as_raw()) {
        *dst = dst.saturating_sub(m);
    }
    Ok(out)
}

/// Combine the enhanced region and its mask into a full display frame.
///
/// `context` is the full grayscale plane; it is consumed and returned with the
/// region replaced, so pixels outside `roi` keep their original values.
///
/// # Errors
///
/// Returns an error if the region does not fit `context` or the planes disagree
/// in size.
pub fn composite(
    mut context: GrayImage,
    roi: &Roi,
    enhanced: &GrayImage,
    mask: &GrayImage,
) -> Result<RgbaImage> {
    let darkened = subtract_mask(enhanced, mask)?;
    roi.write_back(&mut context, &darkened)?;
    Ok(gray_to_rgba(&context))
}
