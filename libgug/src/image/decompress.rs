use flate2::read::ZlibDecoder;
use image::ImageFormat;
use std::io::{Read, Seek, SeekFrom};
use tracing::trace;

use super::{
    bitmap::{PixelBuf, CHANNELS},
    index::TileIndexEntry,
};
use crate::Error;

pub const RAW: u32 = 0;
pub const ZLIB: u32 = 1;
pub const JPEG: u32 = 2;

/// Tile compressions of `.gup` files
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum Compression {
    /// Uncompressed 24-bit BGR rows, each padded to a multiple of 4 bytes
    Raw,
    /// Raw rows, deflated with zlib
    Zlib,
    /// A JPEG image of the tile
    Jpeg,
}

impl TryFrom<u32> for Compression {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            RAW => Ok(Self::Raw),
            ZLIB => Ok(Self::Zlib),
            JPEG => Ok(Self::Jpeg),
            other => Err(Error::UnsupportedCompression(other)),
        }
    }
}

impl From<Compression> for u32 {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Raw => RAW,
            Compression::Zlib => ZLIB,
            Compression::Jpeg => JPEG,
        }
    }
}

/// Bytes per stored row of a raw tile
pub const fn raw_stride(tile_width: u32) -> usize {
    (tile_width as usize * CHANNELS + 3) & !3
}

pub trait TileDecompressor<const COMPRESSION: u32> {
    /// Decodes stored bytes into pixels, keeping the stored row order
    fn decompress_tile(data: &[u8], width: u32, height: u32) -> Result<PixelBuf, String>;

    fn unpack_bgr_rows(data: &[u8], width: u32, height: u32) -> Result<PixelBuf, String> {
        let stride = raw_stride(width);
        let needed = stride * height as usize;
        if data.len() < needed {
            return Err(format!(
                "{} bytes of pixel data, expected {needed}",
                data.len()
            ));
        }
        let row_len = width as usize * CHANNELS;
        let mut pixels = Vec::with_capacity(row_len * height as usize);
        for row in data.chunks_exact(stride).take(height as usize) {
            pixels.extend(
                row[..row_len]
                    .chunks_exact(CHANNELS)
                    .flat_map(|bgr| [bgr[2], bgr[1], bgr[0]]),
            );
        }
        Ok(PixelBuf::new(width, height, pixels))
    }
}

pub struct Decompressor<const COMPRESSION: u32>;

impl TileDecompressor<RAW> for Decompressor<RAW> {
    fn decompress_tile(data: &[u8], width: u32, height: u32) -> Result<PixelBuf, String> {
        Self::unpack_bgr_rows(data, width, height)
    }
}

impl TileDecompressor<ZLIB> for Decompressor<ZLIB> {
    fn decompress_tile(data: &[u8], width: u32, height: u32) -> Result<PixelBuf, String> {
        let expected = raw_stride(width) * height as usize;
        let mut inflated = Vec::new();
        // never inflate more than one tile's worth
        ZlibDecoder::new(data)
            .take(expected as u64)
            .read_to_end(&mut inflated)
            .map_err(|e| format!("inflate failed: {e}"))?;
        trace!("inflated {} bytes to {}", data.len(), inflated.len());
        Self::unpack_bgr_rows(&inflated, width, height)
    }
}

impl TileDecompressor<JPEG> for Decompressor<JPEG> {
    fn decompress_tile(data: &[u8], width: u32, height: u32) -> Result<PixelBuf, String> {
        let decoded = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
            .map_err(|e| format!("jpeg decode failed: {e}"))?
            .to_rgb8();
        if decoded.dimensions() != (width, height) {
            return Err(format!(
                "jpeg is {:?}, expected {:?}",
                decoded.dimensions(),
                (width, height)
            ));
        }
        Ok(PixelBuf::new(width, height, decoded.into_raw()))
    }
}

/// Decodes single tiles of one image entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCodec {
    /// Compression code of the grid header
    pub compression: u32,
    /// Tile width in pixels
    pub tile_width: u32,
    /// Tile height in pixels
    pub tile_height: u32,
    /// Whether tile rows are stored top-down
    pub top_down: bool,
}

impl TileCodec {
    /// Reads the stored bytes of one tile, unmodified
    pub(crate) fn read_tile_bytes(
        r: &mut (impl Read + Seek),
        file_len: u64,
        entry_start: u64,
        entry: TileIndexEntry,
        (tx, ty): (u32, u32),
    ) -> Result<Vec<u8>, Error> {
        let range = u64::try_from(entry.offset)
            .ok()
            .zip(u64::try_from(entry.length).ok())
            .and_then(|(offset, length)| {
                let start = entry_start.checked_add(offset)?;
                Some((start, start.checked_add(length)?, length))
            });
        let Some((start, end, length)) = range.filter(|&(_, end, _)| end <= file_len) else {
            return Err(Error::corrupt_tile(tx, ty, "byte range outside of file"));
        };
        trace!("reading tile ({tx}, {ty}) from {start}..{end}");

        r.seek(SeekFrom::Start(start))?;
        let length = usize::try_from(length)
            .map_err(|_| Error::corrupt_tile(tx, ty, "tile length too large"))?;
        let mut buf = vec![0; length];
        r.read_exact(&mut buf)
            .map_err(|e| Error::corrupt_tile(tx, ty, format!("short read: {e}")))?;
        Ok(buf)
    }

    /// Decodes stored tile bytes to exactly `tile_width * tile_height` RGB
    /// pixels, rows top-down regardless of the stored orientation
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedCompression`] for unknown codes,
    /// [`Error::CorruptTile`] if the bytes cannot be decoded
    pub fn decode(&self, data: &[u8], (tx, ty): (u32, u32)) -> Result<PixelBuf, Error> {
        let (w, h) = (self.tile_width, self.tile_height);
        let decoded = match Compression::try_from(self.compression)? {
            Compression::Raw => Decompressor::<RAW>::decompress_tile(data, w, h),
            Compression::Zlib => Decompressor::<ZLIB>::decompress_tile(data, w, h),
            Compression::Jpeg => Decompressor::<JPEG>::decompress_tile(data, w, h),
        };
        let mut pixels = decoded.map_err(|reason| Error::corrupt_tile(tx, ty, reason))?;
        if !self.top_down {
            pixels.flip_vertical();
        }
        Ok(pixels)
    }
}
