use image::{Rgb, RgbImage};

/// Bytes per pixel of the working pixel format (RGB)
pub const CHANNELS: usize = 3;

/// Decoded RGB pixels, rows stored top-down
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PixelBuf {
    /// The width of the buffer
    width: u32,
    /// The height of the buffer
    height: u32,
    /// Interleaved RGB pixels
    pixels: Vec<u8>,
}

impl PixelBuf {
    pub(crate) fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(width as usize * height as usize * CHANNELS, data.len());
        Self {
            width,
            height,
            pixels: data,
        }
    }

    /// Creates a buffer with every pixel set to `rgb`, or [`None`] if its
    /// byte size does not fit in memory
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Option<Self> {
        let len = (width as usize).checked_mul(height as usize)?;
        let bytes = len.checked_mul(CHANNELS)?;
        if isize::try_from(bytes).is_err() {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels: rgb.repeat(len),
        })
    }

    /// Returns the width of the buffer
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height of the buffer
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns the interleaved RGB bytes
    #[must_use]
    pub fn as_raw(&self) -> &[u8] {
        &self.pixels
    }

    /// Consumes the buffer, returning the interleaved RGB bytes
    #[must_use]
    pub fn into_raw(self) -> Vec<u8> {
        self.pixels
    }

    const fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * CHANNELS
    }

    /// Returns the pixel at `(x, y)`, or [`None`] outside of the buffer
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x < self.width && y < self.height {
            let o = self.offset(x, y);
            Some([self.pixels[o], self.pixels[o + 1], self.pixels[o + 2]])
        } else {
            None
        }
    }

    /// Sets the pixel at `(x, y)`; ignored outside of the buffer
    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x < self.width && y < self.height {
            let o = self.offset(x, y);
            self.pixels[o..o + CHANNELS].copy_from_slice(&rgb);
        }
    }

    /// Returns an entire row of the buffer
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y < self.height {
            let start = self.offset(0, y);
            Some(&self.pixels[start..start + self.width as usize * CHANNELS])
        } else {
            None
        }
    }

    pub(crate) fn flip_vertical(&mut self) {
        let stride = self.width as usize * CHANNELS;
        if stride == 0 {
            return;
        }
        let rows = self.height as usize;
        for y in 0..rows / 2 {
            let (top, bottom) = self.pixels.split_at_mut((rows - 1 - y) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
    }

    /// Copies the `width`x`height` rectangle at `(src_x, src_y)` of `src` to
    /// `(dst_x, dst_y)`. The rectangle is clipped to both buffers.
    pub(crate) fn blit(
        &mut self,
        src: &Self,
        (src_x, src_y): (u32, u32),
        (dst_x, dst_y): (u32, u32),
        (width, height): (u32, u32),
    ) {
        let width = width
            .min(src.width.saturating_sub(src_x))
            .min(self.width.saturating_sub(dst_x)) as usize;
        let height = height
            .min(src.height.saturating_sub(src_y))
            .min(self.height.saturating_sub(dst_y));
        if width == 0 {
            return;
        }
        for row in 0..height {
            let s = src.offset(src_x, src_y + row);
            let d = self.offset(dst_x, dst_y + row);
            self.pixels[d..d + width * CHANNELS]
                .copy_from_slice(&src.pixels[s..s + width * CHANNELS]);
        }
    }
}

impl From<PixelBuf> for RgbImage {
    fn from(buf: PixelBuf) -> Self {
        let PixelBuf {
            width,
            height,
            pixels,
        } = buf;
        // length always matches width * height * 3
        Self::from_raw(width, height, pixels)
            .unwrap_or_else(|| Self::from_pixel(width, height, Rgb([0, 0, 0])))
    }
}
