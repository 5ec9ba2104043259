//! Error types for the vein-enhance crate.

/// Errors that can occur while enhancing a frame or processing image files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The frame (or the region of interest derived from it) has a zero dimension.
    #[error("invalid dimensions ({width}x{height})")]
    InvalidDimensions {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// The region of interest does not fit inside its parent frame.
    #[error(
        "region {roi_width}x{roi_height} at ({x},{y}) exceeds {frame_width}x{frame_height} frame"
    )]
    RoiOutOfBounds {
        /// Left edge of the region.
        x: u32,
        /// Top edge of the region.
        y: u32,
        /// Region width.
        roi_width: u32,
        /// Region height.
        roi_height: u32,
        /// Parent frame width.
        frame_width: u32,
        /// Parent frame height.
        frame_height: u32,
    },

    /// The preview scale factor is outside `(0, 1]` or collapses the frame to nothing.
    #[error("invalid preview scale factor: {0}")]
    InvalidScaleFactor(f32),

    /// The pixel layout or bit depth is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An intermediate buffer could not be allocated.
    #[error("failed to allocate {bytes} bytes for an intermediate buffer")]
    ResourceExhaustion {
        /// Size of the failed allocation.
        bytes: usize,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred while decoding or encoding an image file.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Allocate a zero-filled plane of `len` samples, reporting allocation failure
/// instead of aborting.
pub(crate) fn alloc_plane<T: Copy + Default>(len: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| Error::ResourceExhaustion {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buf.resize(len, T::default());
    Ok(buf)
}
