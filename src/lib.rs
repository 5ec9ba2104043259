//! Vein pattern enhancement for near-infrared / red-channel photography.
//!
//! Given a color frame, the pipeline takes the red channel, enhances a centered
//! region of interest (median smoothing, illumination normalization, gamma,
//! Gaussian denoise, CLAHE), extracts a thin binary vein mask with an adaptive
//! threshold and morphology, and subtracts that mask so veins show up dark.
//! Everything outside the region is passed through from the red channel.
//!
//! # Quick Start
//!
//! ```no_run
//! use vein_enhance::{enhance_for_capture, Mode, Settings};
//!
//! let frame = image::open("hand.jpg").unwrap().to_rgba8();
//! let out = enhance_for_capture(&frame, Mode::Processed, Settings::default())
//!     .expect("frame too small");
//! out.save("hand_enhanced.png").unwrap();
//! ```
//!
//! # Live preview
//!
//! Preview frames are shrunk before processing to bound per-frame cost:
//!
//! ```no_run
//! use vein_enhance::{enhance_for_preview, Mode, Settings, DEFAULT_PREVIEW_SCALE};
//!
//! let frame = image::open("frame.png").unwrap().to_rgba8();
//! let settings = Settings::default().with_vein_clarity(80.0);
//! let preview = enhance_for_preview(&frame, Mode::Processed, settings, DEFAULT_PREVIEW_SCALE)
//!     .unwrap();
//! assert_eq!(preview.width(), (frame.width() + 1) / 2);
//! ```

#![deny(missing_docs)]

pub mod channel;
pub mod clahe;
pub mod composite;
pub mod enhance;
mod engine;
pub mod error;
pub mod filters;
pub mod mask;
pub mod params;
mod pipeline;
pub mod roi;

pub use engine::{
    default_output_path, enhance_with_options, is_supported_image, process_directory,
    process_file, save_image, ProcessOptions, ProcessResult,
};
pub use error::{Error, Result};
pub use params::{DerivedParams, Settings};
pub use pipeline::{enhance_for_capture, enhance_for_preview, Mode, DEFAULT_PREVIEW_SCALE};
pub use roi::Roi;
