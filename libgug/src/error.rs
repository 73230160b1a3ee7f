use crate::{metadata, raster::PixelSize};
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
/// Possible `libgug` errors
pub enum Error {
    /// Error returned if the `.gug` metadata file cannot be parsed
    #[error("metadata error")]
    Metadata(#[from] metadata::Error),
    /// Error returned if reading the `.gug` or `.gup` file fails
    #[error("i/o error")]
    Io(#[from] std::io::Error),
    /// Error returned if an image entry header has a bad signature or size
    #[error("invalid image entry at offset {offset}: {reason}")]
    InvalidImage {
        /// byte offset of the image entry within the `.gup` file
        offset: u64,
        /// what was wrong with the entry
        reason: String,
    },
    /// Error returned if a `.gup` file holds fewer image entries than requested
    #[error("image entry {index} not found (file holds {found} entries)")]
    ImageEntryNotFound {
        /// requested image entry
        index: u32,
        /// number of entries walked before the end of the file
        found: u32,
    },
    /// Error returned if a resolution level index is out of range
    #[error("resolution level {index} out of range ({count} levels)")]
    LevelOutOfRange {
        /// requested level
        index: usize,
        /// available levels
        count: usize,
    },
    /// Error returned if width/height of the metadata do not match
    /// the width/height of the tile grid
    #[error("metadata width/height does not match tile grid. announced: {announced:?}, real: {real:?}")]
    MismatchWidthHeight {
        /// metadata width/height
        announced: (u32, u32),
        /// tile grid width/height
        real: (u32, u32),
    },
    /// Error returned if a tile's bytes cannot be decoded
    #[error("corrupt tile ({tx}, {ty}): {reason}")]
    CorruptTile {
        /// tile column
        tx: u32,
        /// tile row
        ty: u32,
        /// decoder message
        reason: String,
    },
    /// Error returned for an unknown tile compression code
    #[error("unsupported tile compression code {0}")]
    UnsupportedCompression(u32),
    /// Returned for tiles absent from a sparse tile set
    #[error("tile ({tx}, {ty}) is not present")]
    MissingTile {
        /// tile column
        tx: u32,
        /// tile row
        ty: u32,
    },
    /// Returned when a tile outside of the grid is requested
    #[error("tile ({tx}, {ty}) outside of {tiles_x}x{tiles_y} grid")]
    TileOutOfRange {
        /// tile column
        tx: i64,
        /// tile row
        ty: i64,
        /// grid columns
        tiles_x: u32,
        /// grid rows
        tiles_y: u32,
    },
    /// Returned when the pixels of a requested region do not fit in memory
    #[error("region of {}x{} pixels is too large", .0.width, .0.height)]
    RegionTooLarge(PixelSize),
}

impl Error {
    /// Returns `true` for errors that can only occur while opening a map
    #[must_use]
    pub const fn is_open_error(&self) -> bool {
        matches!(
            self,
            Self::Metadata(_)
                | Self::InvalidImage { .. }
                | Self::ImageEntryNotFound { .. }
                | Self::LevelOutOfRange { .. }
                | Self::MismatchWidthHeight { .. }
        )
    }

    pub(crate) fn invalid_image(offset: u64, reason: impl Into<String>) -> Self {
        Self::InvalidImage {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt_tile(tx: u32, ty: u32, reason: impl Into<String>) -> Self {
        Self::CorruptTile {
            tx,
            ty,
            reason: reason.into(),
        }
    }
}
