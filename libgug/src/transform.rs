//! Affine conversion between pixel coordinates and the projected coordinate
//! system (PCS) of a resolution level.
//!
//! ```text
//! x_pcs = org_x + x_px * wpp_x * cos(rad_x) - y_px * wpp_y * sin(rad_y)
//! y_pcs = org_y + x_px * wpp_x * sin(rad_x) + y_px * wpp_y * cos(rad_y)
//! ```
//!
//! No bounds checking happens here, coordinates outside of the image simply
//! map outside of the tile grid.

use crate::metadata::LevelRecord;

/// A rotation angle together with its derived sine and cosine
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct Rotation {
    angle: f64,
    sin: f64,
    cos: f64,
}

impl Rotation {
    /// Stores the raw angle; sine/cosine are derived by [`Self::complete`]
    pub(crate) const fn new(angle: f64) -> Self {
        Self {
            angle,
            sin: 0.0,
            cos: 0.0,
        }
    }

    pub(crate) const fn angle(&self) -> f64 {
        self.angle
    }

    fn complete(&mut self) {
        (self.sin, self.cos) = self.angle.sin_cos();
    }

    fn is_complete(&self) -> bool {
        (self.sin.mul_add(self.sin, self.cos * self.cos) - 1.0).abs() < 1e-9
    }
}

impl LevelRecord {
    /// Derives the sine/cosine of both rotation components.
    ///
    /// Runs once after the record's fields are set, never per conversion.
    pub fn complete_initialization(&mut self) {
        self.rotation_x.complete();
        self.rotation_y.complete();
    }

    /// Determinant of the 2x2 rotation/scale block. Zero means the transform
    /// cannot be inverted.
    #[must_use]
    pub fn determinant(&self) -> f64 {
        let (wx, wy) = self.pixel_size;
        let (rx, ry) = (self.rotation_x, self.rotation_y);
        wx * wy * rx.cos.mul_add(ry.cos, rx.sin * ry.sin)
    }

    /// Converts pixel coordinates to PCS coordinates
    #[must_use]
    pub fn pixel_to_pcs(&self, x_px: f64, y_px: f64) -> (f64, f64) {
        debug_assert!(self.is_initialized(), "complete_initialization not run");
        let (wx, wy) = self.pixel_size;
        let (rx, ry) = (self.rotation_x, self.rotation_y);
        let x_pcs = self.world_origin.0 + x_px * wx * rx.cos - y_px * wy * ry.sin;
        let y_pcs = self.world_origin.1 + x_px * wx * rx.sin + y_px * wy * ry.cos;
        (x_pcs, y_pcs)
    }

    /// Converts PCS coordinates to pixel coordinates; the inverse of
    /// [`Self::pixel_to_pcs`]
    #[must_use]
    pub fn pcs_to_pixel(&self, x_pcs: f64, y_pcs: f64) -> (f64, f64) {
        debug_assert!(self.is_initialized(), "complete_initialization not run");
        let (wx, wy) = self.pixel_size;
        let (rx, ry) = (self.rotation_x, self.rotation_y);
        let det = self.determinant();
        let dx = x_pcs - self.world_origin.0;
        let dy = y_pcs - self.world_origin.1;
        let x_px = (wy * ry.cos * dx + wy * ry.sin * dy) / det;
        let y_px = (-wx * rx.sin * dx + wx * rx.cos * dy) / det;
        (x_px, y_px)
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.rotation_x.is_complete() && self.rotation_y.is_complete()
    }
}
