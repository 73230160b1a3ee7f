use std::path::Path;

use crate::{image::PixelBuf, Error};

/// Pixel position on a map; may lie outside of it
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelCoord {
    /// Column, growing to the right
    pub x: i64,
    /// Row, growing downwards
    pub y: i64,
}

/// Pixel dimensions of a map or region
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl PixelCoord {
    /// Creates a new [`PixelCoord`]
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

impl PixelSize {
    /// Creates a new [`PixelSize`]
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Read access shared by all raster map backends
pub trait RasterMap: Send + Sync {
    /// Map width in pixels
    fn width(&self) -> u32;

    /// Map height in pixels
    fn height(&self) -> u32;

    /// Map dimensions in pixels
    fn size(&self) -> PixelSize {
        PixelSize::new(self.width(), self.height())
    }

    /// Returns the `size` pixels whose top left corner is at `pos`. The result
    /// always has exactly `size` dimensions; areas without map data hold the
    /// map's background color.
    ///
    /// # Errors
    ///
    /// Errors if map data covering the region cannot be read or decoded
    fn region(&self, pos: PixelCoord, size: PixelSize) -> Result<PixelBuf, Error>;

    /// File the map was opened from
    fn fname(&self) -> &Path;

    /// Human readable map title
    fn title(&self) -> &str;
}
