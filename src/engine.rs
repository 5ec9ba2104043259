//! File-level driver: load, enhance, save.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};
use tracing::debug;

use crate::channel::rgba_frame;
use crate::error::{Error, Result};
use crate::params::Settings;
use crate::pipeline::{enhance_for_capture, enhance_for_preview, Mode};

/// Options controlling how files are processed.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Enhance or pass through.
    pub mode: Mode,
    /// Slider snapshot applied to every file.
    pub settings: Settings,
    /// Scale factor in `(0, 1]`; below 1.0 the preview path is used.
    pub scale: f32,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Processed,
            settings: Settings::default(),
            scale: 1.0,
            verbose: false,
            quiet: false,
        }
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (frame too small to enhance).
    pub skipped: bool,
    /// Output dimensions when processing succeeded.
    pub dimensions: Option<(u32, u32)>,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            dimensions: None,
            message: String::new(),
        }
    }
}

/// Enhance a decoded frame using the capture path at scale 1.0 and the preview
/// path otherwise.
///
/// # Errors
///
/// Propagates any pipeline error.
pub fn enhance_with_options(frame: &RgbaImage, opts: &ProcessOptions) -> Result<RgbaImage> {
    let full_scale = (opts.scale - 1.0).abs() < f32::EPSILON;
    if full_scale {
        enhance_for_capture(frame, opts.mode, opts.settings)
    } else {
        enhance_for_preview(frame, opts.mode, opts.settings, opts.scale)
    }
}

/// Process a single image file: load, enhance, save.
///
/// Frames too small to hold a region of interest are reported as skipped.
#[must_use]
pub fn process_file(input: &Path, output: &Path, opts: &ProcessOptions) -> ProcessResult {
    let mut result = ProcessResult::new(input);

    let dyn_img = match image::open(input) {
        Ok(img) => img,
        Err(e) => {
            result.message = format!("Failed to load: {e}");
            return result;
        }
    };

    let frame = match rgba_frame(dyn_img) {
        Ok(frame) => frame,
        Err(e) => {
            result.message = e.to_string();
            return result;
        }
    };
    debug!(path = %input.display(), width = frame.width(), height = frame.height(), "loaded");

    let enhanced = match enhance_with_options(&frame, opts) {
        Ok(img) => img,
        Err(Error::InvalidDimensions { width, height }) => {
            result.skipped = true;
            result.success = true;
            result.message = format!(
                "Image too small ({}x{}, region {width}x{height})",
                frame.width(),
                frame.height()
            );
            return result;
        }
        Err(e) => {
            result.message = format!("Failed to enhance: {e}");
            return result;
        }
    };

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                result.message = format!("Failed to create output directory: {e}");
                return result;
            }
        }
    }

    match save_image(&enhanced, output) {
        Ok(()) => {
            result.success = true;
            result.dimensions = Some(enhanced.dimensions());
            result.message = match opts.mode {
                Mode::Processed => "Enhanced".to_string(),
                Mode::Raw => "Copied (raw mode)".to_string(),
            };
        }
        Err(e) => {
            result.message = format!("Failed to save: {e}");
        }
    }

    result
}

/// Process all supported images in a directory.
///
/// Uses parallel iteration when the `cli` feature is enabled (via rayon).
/// Returns a [`ProcessResult`] for each image found.
#[must_use]
pub fn process_directory(
    input_dir: &Path,
    output_dir: &Path,
    opts: &ProcessOptions,
) -> Vec<ProcessResult> {
    let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
        Ok(rd) => rd
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect(),
        Err(e) => {
            let mut result = ProcessResult::new(input_dir);
            result.message = format!("Failed to read directory: {e}");
            return vec![result];
        }
    };

    if !output_dir.exists() {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            let mut result = ProcessResult::new(output_dir);
            result.message = format!("Failed to create output directory: {e}");
            return vec![result];
        }
    }

    let run = |input_path: &PathBuf| match input_path.file_name() {
        Some(name) => process_file(input_path, &output_dir.join(name), opts),
        None => {
            let mut result = ProcessResult::new(input_path);
            result.message = "Path has no file name".to_string();
            result
        }
    };

    #[cfg(feature = "cli")]
    {
        use rayon::prelude::*;
        entries.par_iter().map(run).collect()
    }

    #[cfg(not(feature = "cli"))]
    {
        entries.iter().map(run).collect()
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA frame with format-specific settings.
///
/// JPEG output drops the (always opaque) alpha channel and uses quality 100.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let dyn_img = DynamicImage::ImageRgba8(img.clone());

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(&dyn_img.to_rgb8())?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            dyn_img.save(path)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"hand.jpg"` becomes `"hand_enhanced.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_enhanced.{ext}"))
}
