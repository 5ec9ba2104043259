//! Frame-level entry points.
//!
//! Capture and preview share one pipeline: optional downscale, red-channel
//! extraction, region enhancement, vein mask, composite. Capture runs it at full
//! resolution; preview shrinks the frame first to bound per-frame cost.

use image::RgbaImage;
use tracing::debug;

use crate::channel::{downscale, extract_vein_channel};
use crate::composite::composite;
use crate::enhance::enhance_roi;
use crate::error::{Error, Result};
use crate::mask::extract_vein_mask;
use crate::params::Settings;
use crate::roi::Roi;

/// Scale factor the live preview runs at.
pub const DEFAULT_PREVIEW_SCALE: f32 = 0.5;

/// Whether a frame is enhanced or passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Skip enhancement and return the color frame.
    Raw,
    /// Run the full enhancement pipeline.
    #[default]
    Processed,
}

/// Enhance a full-resolution still.
///
/// In [`Mode::Raw`] the frame is returned unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] for frames too small to hold a region of
/// interest (including 1x1), or [`Error::ResourceExhaustion`] if a buffer cannot
/// be allocated.
pub fn enhance_for_capture(frame: &RgbaImage, mode: Mode, settings: Settings) -> Result<RgbaImage> {
    match mode {
        Mode::Raw => {
            check_dimensions(frame)?;
            Ok(frame.clone())
        }
        Mode::Processed => enhance_frame(frame, settings),
    }
}

/// Enhance a live preview frame after scaling both sides by `scale`.
///
/// In [`Mode::Raw`] the scaled color frame is returned without enhancement.
///
/// # Errors
///
/// Returns [`Error::InvalidScaleFactor`] if `scale` is outside `(0, 1]` or
/// shrinks the frame to nothing, plus the errors of [`enhance_for_capture`].
pub fn enhance_for_preview(
    frame: &RgbaImage,
    mode: Mode,
    settings: Settings,
    scale: f32,
) -> Result<RgbaImage> {
    check_dimensions(frame)?;
    let scaled = downscale(frame, scale)?;
    match mode {
        Mode::Raw => Ok(scaled),
        Mode::Processed => enhance_frame(&scaled, settings),
    }
}

fn check_dimensions(frame: &RgbaImage) -> Result<()> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(())
}

/// Run the enhancement pipeline on a frame at its current resolution.
///
/// Settings are resolved once up front, so the whole call sees one snapshot.
fn enhance_frame(frame: &RgbaImage, settings: Settings) -> Result<RgbaImage> {
    check_dimensions(frame)?;
    let context = extract_vein_channel(frame);
    let roi = Roi::centered(context.width(), context.height())?;
    let params = settings.derive(context.width());
    debug!(
        width = context.width(),
        height = context.height(),
        roi_width = roi.width,
        roi_height = roi.height,
        gamma = params.gamma,
        clip_limit = params.clahe_clip_limit,
        background_kernel = params.background_kernel,
        "enhancing frame"
    );

    let region = roi.extract(&context)?;
    let enhanced = enhance_roi(&region, &params)?;
    let mask = extract_vein_mask(&enhanced)?;
    composite(context, &roi, &enhanced, &mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient_frame(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let r = (40 + (x * 5 + y * 3) % 180) as u8;
            Rgba([r, 30, 60, 255])
        })
    }

    #[test]
    fn raw_capture_is_identity() {
        let frame = gradient_frame(31, 17);
        let out = enhance_for_capture(&frame, Mode::Raw, Settings::new(3.0, 97.0, 12.0)).unwrap();
        assert_eq!(out, frame);
    }

    #[test]
    fn raw_preview_keeps_color_and_scales() {
        let frame = RgbaImage::from_pixel(40, 20, Rgba([10, 20, 30, 255]));
        let out = enhance_for_preview(&frame, Mode::Raw, Settings::default(), 0.5).unwrap();
        assert_eq!(out.dimensions(), (20, 10));
        assert!(out.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn processed_output_is_gray_and_opaque() {
        let frame = gradient_frame(48, 40);
        let out = enhance_for_capture(&frame, Mode::Processed, Settings::default()).unwrap();
        assert_eq!(out.dimensions(), (48, 40));
        for p in out.pixels() {
            assert_eq!(p[0], p[1]);
            assert_eq!(p[1], p[2]);
            assert_eq!(p[3], 255);
        }
    }

    #[test]
    fn processed_mode_only_changes_region() {
        let frame = gradient_frame(60, 50);
        let out = enhance_for_capture(&frame, Mode::Processed, Settings::default()).unwrap();
        let roi = Roi::centered(60, 50).unwrap();
        for (x, y, p) in out.enumerate_pixels() {
            if !roi.contains(x, y) {
                assert_eq!(p[0], frame.get_pixel(x, y)[0], "pixel ({x},{y})");
            }
        }
    }

    #[test]
    fn one_by_one_frame_fails_with_invalid_dimensions() {
        let frame = RgbaImage::from_pixel(1, 1, Rgba([1, 2, 3, 255]));
        let err = enhance_for_capture(&frame, Mode::Processed, Settings::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));
    }

    #[test]
    fn empty_frame_fails_in_every_mode() {
        let frame = RgbaImage::new(0, 0);
        assert!(enhance_for_capture(&frame, Mode::Raw, Settings::default()).is_err());
        assert!(enhance_for_preview(&frame, Mode::Raw, Settings::default(), 1.0).is_err());
    }

    #[test]
    fn bad_preview_scale_is_rejected() {
        let frame = gradient_frame(20, 20);
        let err = enhance_for_preview(&frame, Mode::Processed, Settings::default(), 1.5)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidScaleFactor(_)));
    }
}
