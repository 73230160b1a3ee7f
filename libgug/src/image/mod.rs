#![allow(clippy::module_name_repetitions)]

pub(crate) mod bitmap;
pub(crate) mod decompress;
pub(crate) mod header;
pub(crate) mod index;

/// Module containing raw header types
///
/// Reserved and unknown fields are passed through unmodified
pub mod raw {
    /// Contains the binary headers of `.gup` image entries
    pub mod header {
        pub use crate::image::header::{
            BitmapFileHeader, BitmapInfoHeader, GridHeader, BITMAP_SIGNATURE,
        };
    }
    pub use crate::image::index::TileIndexEntry;
}

pub use bitmap::PixelBuf;
pub use decompress::{Compression, TileCodec};

use crate::{error::Error, metadata::GugFile};
use header::{
    BitmapFileHeader, BitmapInfoHeader, GridHeader, BITMAP_SIGNATURE, FILE_HEADER_LEN,
    GRID_HEADER_LEN, GRID_HEADER_OFFSET, INFO_HEADER_LEN,
};
use index::{read_tile_index, TileIndexEntry, TILE_INDEX_ENTRY_LEN};
use std::{
    fs::File,
    io::{BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, trace, warn};

/// Largest accepted tile edge in pixels
const MAX_TILE_SIDE: u32 = 16384;

/// One image entry of a `.gup` file: the tile grid of a single resolution level
///
/// The file handle is private to each instance; [`TiledImage::try_clone`]
/// reopens the file instead of sharing it.
#[derive(Debug)]
pub struct TiledImage {
    file: BufReader<File>,
    fname: PathBuf,
    index: u32,
    offset: u64,
    file_len: u64,

    file_header: BitmapFileHeader,
    info_header: BitmapInfoHeader,
    grid_header: GridHeader,
    codec: TileCodec,

    tiles_x: u32,
    tiles_y: u32,
    tile_index: Vec<TileIndexEntry>,
    next_offset: u64,
}

impl TiledImage {
    /// Opens the image entry starting at byte `offset` of `fname`. `index` is
    /// the position of the entry within the file.
    ///
    /// # Errors
    ///
    /// This function errors if the file cannot be read or the entry's headers
    /// have a bad signature or inconsistent sizes
    #[instrument(level = "debug", skip(fname), fields(fname = %fname.as_ref().display()))]
    pub fn open(fname: impl AsRef<Path>, index: u32, offset: u64) -> Result<Self, Error> {
        let fname = fname.as_ref().to_path_buf();
        let file = File::open(&fname)?;
        let file_len = file.metadata()?.len();
        Self::init(BufReader::new(file), fname, index, offset, file_len)
    }

    fn init(
        mut file: BufReader<File>,
        fname: PathBuf,
        index: u32,
        offset: u64,
        file_len: u64,
    ) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::invalid_image(offset, reason);
        if offset.saturating_add((FILE_HEADER_LEN + INFO_HEADER_LEN) as u64) > file_len {
            return Err(invalid("file too short for bitmap headers"));
        }
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = [0; FILE_HEADER_LEN];
        file.read_exact(&mut buf)?;
        let (_, file_header) =
            BitmapFileHeader::parse(&buf).map_err(|_| invalid("bad bitmap file header"))?;
        if file_header.kind != BITMAP_SIGNATURE {
            return Err(invalid("bad bitmap signature"));
        }
        trace!("{file_header:?}");

        let mut size = [0; 4];
        file.read_exact(&mut size)?;
        let info_len = u32::from_le_bytes(size) as usize;
        if info_len < GRID_HEADER_OFFSET + GRID_HEADER_LEN {
            return Err(invalid("bitmap info header too small to hold a tile grid"));
        }
        let index_start = offset + (FILE_HEADER_LEN + info_len) as u64;
        if index_start > file_len {
            return Err(invalid("bitmap info header exceeds file"));
        }
        let mut info_buf = vec![0; info_len];
        info_buf[..4].copy_from_slice(&size);
        file.read_exact(&mut info_buf[4..])?;

        let (_, info_header) =
            BitmapInfoHeader::parse(&info_buf).map_err(|_| invalid("bad bitmap info header"))?;
        let (_, grid_header) = GridHeader::parse(&info_buf[GRID_HEADER_OFFSET..])
            .map_err(|_| invalid("bad tile grid header"))?;
        trace!("{info_header:?}");
        debug!("{grid_header:?}");

        if info_header.bit_count != 24 {
            return Err(invalid("only 24 bit images are supported"));
        }
        if info_header.width <= 0 || info_header.height == 0 {
            return Err(invalid("empty image"));
        }
        if !(1..=MAX_TILE_SIDE).contains(&grid_header.tile_width)
            || !(1..=MAX_TILE_SIDE).contains(&grid_header.tile_height)
        {
            return Err(invalid("unsupported tile size"));
        }

        let width = info_header.width.unsigned_abs();
        let height = info_header.height.unsigned_abs();
        let tiles_x = width.div_ceil(grid_header.tile_width);
        let tiles_y = height.div_ceil(grid_header.tile_height);
        if tiles_x.checked_mul(grid_header.tile_width).is_none()
            || tiles_y.checked_mul(grid_header.tile_height).is_none()
        {
            return Err(invalid("tile grid too large"));
        }
        let index_room = (file_len - index_start) / TILE_INDEX_ENTRY_LEN as u64;
        let tiles = tiles_x
            .checked_mul(tiles_y)
            .filter(|&t| u64::from(t) <= index_room)
            .ok_or_else(|| invalid("tile index exceeds file"))? as usize;
        debug!("tile grid {tiles_x}x{tiles_y}, {tiles} tiles");

        let mut tile_index = read_tile_index(&mut file, index_start, tiles)?;
        let index_end = index_start - offset + (tiles * TILE_INDEX_ENTRY_LEN) as u64;
        let available = file_len - offset;
        let mut data_end = index_end;
        for (i, entry) in tile_index.iter_mut().enumerate() {
            if !entry.is_present() {
                continue;
            }
            let end = u64::try_from(entry.end()).unwrap_or(u64::MAX);
            if end > available {
                warn!(
                    "tile {i} points outside of {}, treating as missing",
                    fname.display()
                );
                *entry = TileIndexEntry::default();
                continue;
            }
            data_end = data_end.max(end);
        }

        let codec = TileCodec {
            compression: grid_header.compression,
            tile_width: grid_header.tile_width,
            tile_height: grid_header.tile_height,
            top_down: info_header.is_top_down(),
        };

        Ok(Self {
            file,
            fname,
            index,
            offset,
            file_len,
            file_header,
            info_header,
            grid_header,
            codec,
            tiles_x,
            tiles_y,
            tile_index,
            next_offset: offset + data_end,
        })
    }

    /// Duplicates all parsed state and opens a new handle to the file
    ///
    /// # Errors
    ///
    /// Errors if the file can no longer be opened
    pub fn try_clone(&self) -> Result<Self, Error> {
        let file = File::open(&self.fname)?;
        Ok(Self {
            file: BufReader::new(file),
            fname: self.fname.clone(),
            tile_index: self.tile_index.clone(),
            ..*self
        })
    }

    fn entry(&self, tx: i64, ty: i64) -> Result<((u32, u32), TileIndexEntry), Error> {
        let out_of_range = || Error::TileOutOfRange {
            tx,
            ty,
            tiles_x: self.tiles_x,
            tiles_y: self.tiles_y,
        };
        let tx = u32::try_from(tx)
            .ok()
            .filter(|&tx| tx < self.tiles_x)
            .ok_or_else(out_of_range)?;
        let ty = u32::try_from(ty)
            .ok()
            .filter(|&ty| ty < self.tiles_y)
            .ok_or_else(out_of_range)?;
        // index rows follow the stored row order
        let row = if self.codec.top_down {
            ty
        } else {
            self.tiles_y - 1 - ty
        };
        let entry = self.tile_index[row as usize * self.tiles_x as usize + tx as usize];
        if entry.is_present() {
            Ok(((tx, ty), entry))
        } else {
            Err(Error::MissingTile { tx, ty })
        }
    }

    /// Reads and decodes tile `(tx, ty)`, counted from the top left. The result
    /// always holds [`Self::tile_width`] x [`Self::tile_height`] pixels.
    ///
    /// # Errors
    ///
    /// - [`Error::TileOutOfRange`] if the tile is outside of the grid
    /// - [`Error::MissingTile`] if the tile is not stored
    /// - [`Error::CorruptTile`] / [`Error::UnsupportedCompression`] if decoding fails
    pub fn load_tile(&mut self, tx: i64, ty: i64) -> Result<PixelBuf, Error> {
        let (tile, entry) = self.entry(tx, ty)?;
        let data =
            TileCodec::read_tile_bytes(&mut self.file, self.file_len, self.offset, entry, tile)?;
        self.codec.decode(&data, tile)
    }

    /// Reads the stored bytes of tile `(tx, ty)` without decoding them
    ///
    /// # Errors
    ///
    /// Same as [`Self::load_tile`], except for decoding errors
    pub fn load_compressed_tile(&mut self, tx: i64, ty: i64) -> Result<Vec<u8>, Error> {
        let (tile, entry) = self.entry(tx, ty)?;
        TileCodec::read_tile_bytes(&mut self.file, self.file_len, self.offset, entry, tile)
    }

    /// Width announced by the bitmap header
    #[must_use]
    pub const fn announced_width(&self) -> u32 {
        self.info_header.width.unsigned_abs()
    }

    /// Height announced by the bitmap header
    #[must_use]
    pub const fn announced_height(&self) -> u32 {
        self.info_header.height.unsigned_abs()
    }

    /// Width addressable through tiles, including padding
    #[must_use]
    pub const fn real_width(&self) -> u32 {
        self.tiles_x * self.codec.tile_width
    }

    /// Height addressable through tiles, including padding
    #[must_use]
    pub const fn real_height(&self) -> u32 {
        self.tiles_y * self.codec.tile_height
    }

    /// Tile width in pixels
    #[must_use]
    pub const fn tile_width(&self) -> u32 {
        self.codec.tile_width
    }

    /// Tile height in pixels
    #[must_use]
    pub const fn tile_height(&self) -> u32 {
        self.codec.tile_height
    }

    /// Tile columns
    #[must_use]
    pub const fn num_tiles_x(&self) -> u32 {
        self.tiles_x
    }

    /// Tile rows
    #[must_use]
    pub const fn num_tiles_y(&self) -> u32 {
        self.tiles_y
    }

    /// Byte offset right after this entry's tile data, where a following
    /// image entry of the same file starts
    #[must_use]
    pub const fn next_image_offset(&self) -> u64 {
        self.next_offset
    }

    /// The file holding this entry
    #[must_use]
    pub fn fname(&self) -> &Path {
        &self.fname
    }

    /// Position of this entry within its file
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Byte offset of this entry within its file
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    /// The codec decoding this entry's tiles
    #[must_use]
    pub const fn codec(&self) -> &TileCodec {
        &self.codec
    }

    /// Returns the bitmap container header
    #[must_use]
    pub const fn file_header(&self) -> &BitmapFileHeader {
        &self.file_header
    }

    /// Returns the bitmap info header
    #[must_use]
    pub const fn info_header(&self) -> &BitmapInfoHeader {
        &self.info_header
    }

    /// Returns the tile grid header
    #[must_use]
    pub const fn grid_header(&self) -> &GridHeader {
        &self.grid_header
    }

    /// Returns the tile index in stored order
    #[must_use]
    pub fn tile_index(&self) -> &[TileIndexEntry] {
        &self.tile_index
    }
}

/// Opens image entry `image_index` of a `.gup` file, walking the entries
/// stored before it
///
/// # Errors
///
/// [`Error::ImageEntryNotFound`] if the file holds fewer entries, otherwise
/// see [`TiledImage::open`]
#[instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn open_image_entry(path: impl AsRef<Path>, image_index: u32) -> Result<TiledImage, Error> {
    let path = path.as_ref();
    let file_len = std::fs::metadata(path)?.len();
    let mut offset = 0;
    for i in 0..image_index {
        let image = TiledImage::open(path, i, offset)?;
        offset = image.next_image_offset();
        trace!("image entry {} starts at {offset}", i + 1);
        if offset >= file_len {
            return Err(Error::ImageEntryNotFound {
                index: image_index,
                found: i + 1,
            });
        }
    }
    TiledImage::open(path, image_index, offset)
}

/// Opens the image entry of the most detailed level of a `.gug` map
///
/// # Errors
///
/// See [`open_image_entry`]
pub fn open_best_resolution_image(gug: &GugFile) -> Result<TiledImage, Error> {
    let (path, index) = gug.gup_path(gug.best_level_index())?;
    open_image_entry(path, index)
}
