//! # libgug
//!
//!
//! This library provides read access to raster maps stored in the GUG format: a text `.gug`
//! file describing one or more resolution levels, and a binary `.gup` file holding a tiled
//! bitmap for each of those levels.
//!
//! It aims to provide a minimal, low-level API to build upon. Tiles are decoded on demand, so
//! opening a map only reads its headers and tile index.
//!
//! ### Format
//!
//! The `.gug` file is line oriented `key=value` text with a `[Header]` section (title,
//! background color, announced resolution steps) followed by one `[MapInfo]` section per
//! resolution level (tile file, projection names, world origin, pixel size and rotation).
//!
//! Each image entry of a `.gup` file starts with a bitmap file header and a bitmap info header
//! whose tail holds the tile grid header (compression, tile width and height). A table of
//! `(offset, length)` pairs, one per tile, follows. Tiles are raw 24-bit rows, zlib-deflated
//! rows, or JPEG images. Several image entries may be stored back to back in one file.
//!
//! ### Limitations
//!
//! - Read only
//! - Elevation (DEM) maps are not supported
//!
//! ### Usage
//!
//! ```rust,no_run
//! use libgug::{GugMap, PixelCoord, PixelSize, RasterMap};
//!
//! fn main() -> anyhow::Result<()> {
//!     let map = GugMap::open("maps/austria.gug")?;
//!     println!("{}: {}x{}", map.title(), map.width(), map.height());
//!
//!     let region = map.region(PixelCoord::new(1024, 2048), PixelSize::new(512, 512))?;
//!     let png: image::RgbImage = region.into();
//!     png.save("region.png")?;
//!
//!     let (x, y) = map.level_record().pixel_to_pcs(1024.0, 2048.0);
//!     println!("top left corner at {x}, {y}");
//!     Ok(())
//! }
//! ```
//!

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    missing_docs
)]

mod error;
/// Module containing types for `.gup` tile files
pub mod image;
mod map;
/// Module containing types for `.gug` metadata files
pub mod metadata;
mod raster;
mod transform;

pub use crate::image::{open_image_entry, Compression, PixelBuf, TiledImage};
pub use error::Error;
pub use map::GugMap;
pub use metadata::{GugFile, HeaderRecord, LevelRecord};
pub use raster::{PixelCoord, PixelSize, RasterMap};
