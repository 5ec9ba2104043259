//! Centered region of interest where enhancement is applied.

use image::imageops;
use image::{GenericImage, GrayImage, SubImage};

use crate::error::{Error, Result};

/// Fraction of the frame width covered by the region.
pub const ROI_WIDTH_FRACTION: f64 = 0.5;
/// Fraction of the frame height covered by the region.
pub const ROI_HEIGHT_FRACTION: f64 = 0.45;

/// A rectangle fully contained in its parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Roi {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Roi {
    /// Compute the centered region for a frame of the given size.
    ///
    /// The region is `round(0.5 * width)` by `round(0.45 * height)`, centered
    /// with the leftover split evenly (odd leftovers round the origin down).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDimensions`] if the frame or the rounded region has a
    /// zero side. A 1x1 frame fails here: its region height rounds to zero.
    pub fn centered(frame_width: u32, frame_height: u32) -> Result<Self> {
        if frame_width == 0 || frame_height == 0 {
            return Err(Error::InvalidDimensions {
                width: frame_width,
                height: frame_height,
            });
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let width = (f64::from(frame_width) * ROI_WIDTH_FRACTION).round() as u32;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let height = (f64::from(frame_height) * ROI_HEIGHT_FRACTION).round() as u32;
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let roi = Self {
            x: (frame_width - width) / 2,
            y: (frame_height - height) / 2,
            width,
            height,
        };
        roi.check_within(frame_width, frame_height)?;
        Ok(roi)
    }

    /// Verify the region lies inside a `frame_width` x `frame_height` frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoiOutOfBounds`] if any edge falls outside the frame.
    pub fn check_within(&self, frame_width: u32, frame_height: u32) -> Result<()> {
        let fits_x = self
            .x
            .checked_add(self.width)
            .is_some_and(|right| right <= frame_width);
        let fits_y = self
            .y
            .checked_add(self.height)
            .is_some_and(|bottom| bottom <= frame_height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(Error::RoiOutOfBounds {
                x: self.x,
                y: self.y,
                roi_width: self.width,
                roi_height: self.height,
                frame_width,
                frame_height,
            })
        }
    }

    /// Whether pixel `(px, py)` of the parent frame lies inside the region.
    #[must_use]
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px - self.x < self.width && py - self.y < self.height
    }

    /// Mutable view of the region; writes through it land in `plane`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoiOutOfBounds`] if the region does not fit `plane`.
    pub fn view_mut<'a>(&self, plane: &'a mut GrayImage) -> Result<SubImage<&'a mut GrayImage>> {
        self.check_within(plane.width(), plane.height())?;
        Ok(imageops::crop(plane, self.x, self.y, self.width, self.height))
    }

    /// Copy the region out of `plane` into its own buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoiOutOfBounds`] if the region does not fit `plane`.
    pub fn extract(&self, plane: &GrayImage) -> Result<GrayImage> {
        self.check_within(plane.width(), plane.height())?;
        Ok(imageops::crop_imm(plane, self.x, self.y, self.width, self.height).to_image())
    }

    /// Write `patch` back into the region of `plane`, leaving the rest untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RoiOutOfBounds`] if the region does not fit `plane`, or
    /// [`Error::InvalidDimensions`] if `patch` is not the size of the region.
    pub fn write_back(&self, plane: &mut GrayImage, patch: &GrayImage) -> Result<()> {
        if patch.dimensions() != (self.width, self.height) {
            return Err(Error::InvalidDimensions {
                width: patch.width(),
                height: patch.height(),
            });
        }
        let mut view = self.view_mut(plane)?;
        view.copy_from(patch, 0, 0)?;
        Ok(())
    }
}
