//! Neighbourhood filters shared by the enhancement and mask stages.
//!
//! The Gaussian blurs here mirror the frame at its edges (reflect-101). The
//! edge-replicating filters in `imageproc` clamp instead, so they are only used
//! where clamping is the wanted border rule.

use image::{GrayImage, ImageBuffer, Luma, Pixel};

use crate::error::{alloc_plane, Error, Result};

/// Single-channel floating-point plane used for illumination normalization.
pub type FloatPlane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Mirror a possibly out-of-range coordinate onto `0..len` without repeating the
/// edge pixel: `gfedcb|abcdefgh|gfedcba`.
#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub(crate) fn reflect101(i: isize, len: usize) -> usize {
    let n = len as isize;
    if n <= 1 {
        return 0;
    }
    // kernels wider than the frame need more than one bounce
    let mut i = i;
    loop {
        if i < 0 {
            i = -i;
        } else if i >= n {
            i = 2 * n - 2 - i;
        } else {
            return i as usize;
        }
    }
}

/// Wrap a row-major sample buffer as an image of the given size.
pub(crate) fn plane_from_raw<P: Pixel>(
    width: u32,
    height: u32,
    data: Vec<P::Subpixel>,
) -> Result<ImageBuffer<P, Vec<P::Subpixel>>> {
    ImageBuffer::from_raw(width, height, data).ok_or(Error::InvalidDimensions { width, height })
}

/// Round to nearest (ties to even) and saturate into `0..=255`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn saturate_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round_ties_even().clamp(0.0, 255.0) as u8
}

/// Build a normalized 1D Gaussian kernel of odd length `size`.
///
/// A non-positive `sigma` is derived from the size as
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`; sizes up to 7 then use the
/// fixed binomial-style kernels.
#[must_use]
pub fn gaussian_kernel(size: u32, sigma: f64) -> Vec<f32> {
    const SMALL: [&[f32]; 4] = [
        &[1.0],
        &[0.25, 0.5, 0.25],
        &[0.0625, 0.25, 0.375, 0.25, 0.0625],
        &[
            0.03125, 0.109_375, 0.218_75, 0.281_25, 0.218_75, 0.109_375, 0.03125,
        ],
    ];
    if sigma <= 0.0 && size % 2 == 1 && size <= 7 {
        return SMALL[(size / 2) as usize].to_vec();
    }

    let sigma = if sigma > 0.0 {
        sigma
    } else {
        (f64::from(size.saturating_sub(1)) * 0.5 - 1.0) * 0.3 + 0.8
    };
    let scale = -0.5 / (sigma * sigma);
    let center = f64::from(size.saturating_sub(1)) * 0.5;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let x = f64::from(i) - center;
            (scale * x * x).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    #[allow(clippy::cast_possible_truncation)]
    weights.iter().map(|w| (w / sum) as f32).collect()
}

/// Convolve `src` (row-major, `width` x `height`) with `kernel` along rows, then
/// along columns.
fn separable_convolve(
    src: &[f32],
    width: usize,
    height: usize,
    kernel: &[f32],
) -> Result<Vec<f32>> {
    #[allow(clippy::cast_possible_wrap)]
    let radius = (kernel.len() / 2) as isize;
    let mut tmp = alloc_plane::<f32>(width * height)?;
    let mut out = alloc_plane::<f32>(width * height)?;

    for y in 0..height {
        let row = &src[y * width..(y + 1) * width];
        for x in 0..width {
            let mut acc = 0.0_f32;
            for (t, &k) in kernel.iter().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let sx = x as isize + t as isize - radius;
                acc += k * row[reflect101(sx, width)];
            }
            tmp[y * width + x] = acc;
        }
    }

    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0_f32;
            for (t, &k) in kernel.iter().enumerate() {
                #[allow(clippy::cast_possible_wrap)]
                let sy = y as isize + t as isize - radius;
                acc += k * tmp[reflect101(sy, height) * width + x];
            }
            out[y * width + x] = acc;
        }
    }

    Ok(out)
}

/// Gaussian blur of a float plane with a square `ksize` kernel (sigma derived from size).
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if scratch buffers cannot be allocated.
pub fn gaussian_blur_f32(src: &FloatPlane, ksize: u32) -> Result<FloatPlane> {
    let (w, h) = src.dimensions();
    let kernel = gaussian_kernel(ksize, 0.0);
    let data = separable_convolve(src.as_raw(), w as usize, h as usize, &kernel)?;
    plane_from_raw(w, h, data)
}

/// Gaussian blur of an 8-bit plane with a square `ksize` kernel (sigma derived from size).
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if scratch buffers cannot be allocated.
pub fn gaussian_blur(src: &GrayImage, ksize: u32) -> Result<GrayImage> {
    let float = to_float(src)?;
    let blurred = gaussian_blur_f32(&float, ksize)?;
    from_float(&blurred)
}

/// Widen an 8-bit plane to `f32`.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if the plane cannot be allocated.
pub fn to_float(src: &GrayImage) -> Result<FloatPlane> {
    let (w, h) = src.dimensions();
    let mut data = alloc_plane::<f32>(src.as_raw().len())?;
    for (dst, &v) in data.iter_mut().zip(src.as_raw()) {
        *dst = f32::from(v);
    }
    plane_from_raw(w, h, data)
}

/// Narrow a float plane to 8 bits with rounding and saturation.
///
/// # Errors
///
/// Returns [`crate::Error::ResourceExhaustion`] if the plane cannot be allocated.
pub fn from_float(src: &FloatPlane) -> Result<GrayImage> {
    let (w, h) = src.dimensions();
    let mut data = alloc_plane::<u8>(src.as_raw().len())?;
    for (dst, &v) in data.iter_mut().zip(src.as_raw()) {
        *dst = saturate_u8(v);
    }
    plane_from_raw(w, h, data)
}
