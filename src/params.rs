//! User-facing slider settings and their mapping to filter parameters.
//!
//! Three sliders in `[0, 100]` drive the pipeline:
//! - **vein clarity** sets the CLAHE clip limit
//! - **image brightness** sets the gamma value
//! - **background smoothness** sets the illumination-estimate blur kernel

/// Lowest value a slider can take.
pub const SLIDER_MIN: f32 = 0.0;
/// Highest value a slider can take.
pub const SLIDER_MAX: f32 = 100.0;
/// Neutral slider position; brightness at this value yields gamma 1.0.
pub const SLIDER_DEFAULT: f32 = 50.0;

const GAMMA_MIN: f32 = 0.1;
const GAMMA_MAX: f32 = 3.0;
const CLIP_LIMIT_MAX: f64 = 10.0;

/// Smallest background kernel, as a fraction of frame width.
const BACKGROUND_FRACTION_MIN: f32 = 0.01;
/// Span added on top of the minimum at full smoothness (up to 20% of width).
const BACKGROUND_FRACTION_SPAN: f32 = 0.19;
const BACKGROUND_KERNEL_MIN: u32 = 3;

/// Immutable snapshot of the three enhancement sliders.
///
/// Changing a setting produces a new value; nothing is mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    vein_clarity: f32,
    image_brightness: f32,
    background_smoothness: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            vein_clarity: SLIDER_DEFAULT,
            image_brightness: SLIDER_DEFAULT,
            background_smoothness: SLIDER_DEFAULT,
        }
    }
}

impl Settings {
    /// Build a settings snapshot, clamping each slider into `[0, 100]`.
    #[must_use]
    pub fn new(vein_clarity: f32, image_brightness: f32, background_smoothness: f32) -> Self {
        Self {
            vein_clarity: clamp_slider(vein_clarity),
            image_brightness: clamp_slider(image_brightness),
            background_smoothness: clamp_slider(background_smoothness),
        }
    }

    /// Vein clarity slider value.
    #[must_use]
    pub fn vein_clarity(&self) -> f32 {
        self.vein_clarity
    }

    /// Image brightness slider value.
    #[must_use]
    pub fn image_brightness(&self) -> f32 {
        self.image_brightness
    }

    /// Background smoothness slider value.
    #[must_use]
    pub fn background_smoothness(&self) -> f32 {
        self.background_smoothness
    }

    /// Copy of these settings with a new vein clarity.
    #[must_use]
    pub fn with_vein_clarity(self, value: f32) -> Self {
        Self {
            vein_clarity: clamp_slider(value),
            ..self
        }
    }

    /// Copy of these settings with a new image brightness.
    #[must_use]
    pub fn with_image_brightness(self, value: f32) -> Self {
        Self {
            image_brightness: clamp_slider(value),
            ..self
        }
    }

    /// Copy of these settings with a new background smoothness.
    #[must_use]
    pub fn with_background_smoothness(self, value: f32) -> Self {
        Self {
            background_smoothness: clamp_slider(value),
            ..self
        }
    }

    /// Resolve the filter parameters for a grayscale frame of the given width.
    #[must_use]
    pub fn derive(&self, frame_width: u32) -> DerivedParams {
        DerivedParams {
            gamma: gamma_from_brightness(self.image_brightness),
            clahe_clip_limit: clahe_clip_from_clarity(self.vein_clarity),
            background_kernel: background_kernel_from_smoothness(
                self.background_smoothness,
                frame_width,
            ),
        }
    }
}

/// Filter parameters resolved once per pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedParams {
    /// Gamma value in `[0.1, 3.0]`; the lookup table raises to `1 / gamma`.
    pub gamma: f32,
    /// CLAHE clip limit in `[0, 10]`.
    pub clahe_clip_limit: f64,
    /// Odd blur kernel size (>= 3) for the illumination estimate.
    pub background_kernel: u32,
}

fn clamp_slider(value: f32) -> f32 {
    if value.is_nan() {
        SLIDER_DEFAULT
    } else {
        value.clamp(SLIDER_MIN, SLIDER_MAX)
    }
}

/// Map the brightness slider to a gamma value.
///
/// Slider 50 is neutral (1.0). Below 50 the value rises by 0.02 per step,
/// above 50 it falls by 0.01 per step, clamped to `[0.1, 3.0]`.
#[must_use]
pub fn gamma_from_brightness(slider: f32) -> f32 {
    let gamma = if slider <= SLIDER_DEFAULT {
        1.0 + (SLIDER_DEFAULT - slider) * 0.02
    } else {
        1.0 - (slider - SLIDER_DEFAULT) * 0.01
    };
    gamma.clamp(GAMMA_MIN, GAMMA_MAX)
}

/// Map the clarity slider to a CLAHE clip limit (`slider * 0.1`, clamped to `[0, 10]`).
///
/// Computed in double precision: the clip limit is later scaled by the tile area
/// and truncated, so single-precision error can move it across a bin boundary.
#[must_use]
pub fn clahe_clip_from_clarity(slider: f32) -> f64 {
    (f64::from(slider) * 0.1).clamp(0.0, CLIP_LIMIT_MAX)
}

/// Map the smoothness slider to the background blur kernel size.
///
/// The kernel spans 1% to 20% of the frame width. The result is always odd
/// and at least 3, whatever the inputs.
#[must_use]
pub fn background_kernel_from_smoothness(slider: f32, frame_width: u32) -> u32 {
    let fraction = BACKGROUND_FRACTION_MIN + (slider / SLIDER_MAX) * BACKGROUND_FRACTION_SPAN;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let mut kernel = (frame_width as f32 * fraction).round() as u32;
    if kernel < BACKGROUND_KERNEL_MIN {
        kernel = BACKGROUND_KERNEL_MIN;
    }
    if kernel % 2 == 0 {
        kernel += 1;
    }
    kernel
}
