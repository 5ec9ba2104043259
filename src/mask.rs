//! Binary vein mask extraction.
//!
//! The enhanced region is binarized against a Gaussian-weighted local mean, then
//! cleaned with a morphological opening and thinned with an erosion.

use image::{GrayImage, Luma};
use imageproc::filter::separable_filter_equal;
use imageproc::morphology::{grayscale_dilate, grayscale_erode, grayscale_open, Mask};

use crate::error::{alloc_plane, Error, Result};
use crate::filters::{from_float, gaussian_kernel, plane_from_raw, to_float};

/// Neighbourhood size for the local mean.
pub const THRESHOLD_BLOCK_SIZE: u32 = 21;
/// Offset subtracted from the local mean.
pub const THRESHOLD_OFFSET: f64 = 5.0;
/// Value written for mask pixels that are set.
pub const MASK_ON: u8 = 255;
/// Ellipse size for the noise-removing opening.
pub const OPEN_KERNEL_SIZE: u32 = 3;
/// Ellipse size for the final thinning erosion.
pub const ERODE_KERNEL_SIZE: u32 = 3;

/// Largest element side `imageproc` masks accept.
const MAX_ELEMENT_SIDE: u32 = 511;

/// Binary shape used by morphological operators, anchored at its center.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    width: u32,
    height: u32,
    cells: Vec<bool>,
}

impl StructuringElement {
    /// Elliptical element inscribed in a `width` x `height` box.
    ///
    /// Row `i` is filled from `c - dx` to `c + dx` where
    /// `dx = round(c * sqrt(1 - ((i - r) / r)^2))`, with `r = height / 2` and
    /// `c = width / 2`. A 3x3 ellipse is a cross.
    #[must_use]
    pub fn ellipse(width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let r = i64::from(height / 2);
        let c = i64::from(width / 2);
        #[allow(clippy::cast_precision_loss)]
        let inv_r2 = if r > 0 { 1.0 / (r * r) as f64 } else { 0.0 };
        let mut cells = vec![false; (width * height) as usize];

        for i in 0..i64::from(height) {
            let dy = i - r;
            if dy.abs() > r {
                continue;
            }
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss
            )]
            let dx = (c as f64 * ((r * r - dy * dy) as f64 * inv_r2).sqrt()).round() as i64;
            let j1 = (c - dx).max(0);
            let j2 = (c + dx + 1).min(i64::from(width));
            for j in j1..j2 {
                #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
                {
                    cells[(i * i64::from(width) + j) as usize] = true;
                }
            }
        }

        Self {
            width,
            height,
            cells,
        }
    }

    /// Whether cell `(x, y)` of the element is set.
    #[must_use]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.cells[(y * self.width + x) as usize]
    }

    /// Convert to an `imageproc` mask anchored at the element center.
    fn to_mask(&self) -> Result<Mask> {
        if self.width > MAX_ELEMENT_SIDE || self.height > MAX_ELEMENT_SIDE {
            return Err(Error::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        let cells = GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.contains(x, y) { u8::MAX } else { 0 }])
        });
        #[allow(clippy::cast_possible_truncation)]
        let (cx, cy) = ((self.width / 2) as u8, (self.height / 2) as u8);
        Ok(Mask::from_image(&cells, cx, cy))
    }
}

/// Inverted Gaussian adaptive threshold.
///
/// A pixel becomes [`MASK_ON`] when it sits at least `floor(offset)` below the
/// Gaussian-weighted mean of its `block_size` neighbourhood, and 0 otherwise.
/// The mean replicates edge pixels and is rounded to 8 bits before comparing.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if scratch buffers cannot be allocated.
pub fn adaptive_threshold_inv(src: &GrayImage, block_size: u32, offset: f64) -> Result<GrayImage> {
    let (w, h) = src.dimensions();
    let kernel = gaussian_kernel(block_size, 0.0);
    let mean = from_float(&separable_filter_equal(&to_float(src)?, &kernel))?;
    #[allow(clippy::cast_possible_truncation)]
    let delta = offset.floor() as i32;

    let mut out = alloc_plane::<u8>(src.as_raw().len())?;
    for ((dst, &v), &m) in out.iter_mut().zip(src.as_raw()).zip(mean.as_raw()) {
        *dst = if i32::from(v) - i32::from(m) > -delta {
            0
        } else {
            MASK_ON
        };
    }
    plane_from_raw(w, h, out)
}

/// Morphological erosion (local minimum under the element). Pixels outside the
/// frame are ignored.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidDimensions`] if the element is wider or taller
/// than 511 pixels.
pub fn erode(src: &GrayImage, element: &StructuringElement) -> Result<GrayImage> {
    Ok(grayscale_erode(src, &element.to_mask()?))
}

/// Morphological dilation (local maximum under the element).
///
/// # Errors
///
/// Returns [`crate::Error::InvalidDimensions`] if the element is wider or taller
/// than 511 pixels.
pub fn dilate(src: &GrayImage, element: &StructuringElement) -> Result<GrayImage> {
    Ok(grayscale_dilate(src, &element.to_mask()?))
}

/// Morphological opening: erosion followed by dilation with the same element.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidDimensions`] if the element is wider or taller
/// than 511 pixels.
pub fn open(src: &GrayImage, element: &StructuringElement) -> Result<GrayImage> {
    Ok(grayscale_open(src, &element.to_mask()?))
}

/// Turn an enhanced region into a refined vein mask with values in `{0, 255}`.
///
/// Isolated dark specks are dropped by the opening; surviving bands are thinned
/// by one pixel on each side.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if a buffer cannot be allocated.
pub fn extract_vein_mask(enhanced: &GrayImage) -> Result<GrayImage> {
    let binary = adaptive_threshold_inv(enhanced, THRESHOLD_BLOCK_SIZE, THRESHOLD_OFFSET)?;
    let opened = open(
        &binary,
        &StructuringElement::ellipse(OPEN_KERNEL_SIZE, OPEN_KERNEL_SIZE),
    )?;
    erode(
        &opened,
        &StructuringElement::ellipse(ERODE_KERNEL_SIZE, ERODE_KERNEL_SIZE),
    )
}
