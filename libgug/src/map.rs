use itertools::Itertools;
use parking_lot::Mutex;
use std::{fmt, path::Path};
use tracing::{debug, info, instrument, warn};

use crate::{
    image::{
        bitmap::CHANNELS, decompress::raw_stride, open_image_entry, PixelBuf, TiledImage,
    },
    metadata::{GugFile, HeaderRecord, LevelRecord},
    raster::{PixelCoord, PixelSize, RasterMap},
    Error,
};

/// A map in GUG format: a `.gug` metadata file and the `.gup` tile file of
/// one of its resolution levels
///
/// DEM data is not supported.
///
/// Concurrent [`RasterMap::region`] calls are serialized by a per-instance
/// lock guarding the tile file; nothing outside of this type is called while
/// it is held.
pub struct GugMap {
    gug_file: GugFile,
    level: usize,
    image: Mutex<TiledImage>,

    tile_width: u32,
    tile_height: u32,
    tiles_x: u32,
    tiles_y: u32,
    width: u32,
    height: u32,
    tile_size: usize,
    tile_size_rgb: usize,
    compression: u32,
    background: [u8; 3],
}

impl GugMap {
    /// Opens the most detailed level of the map described by a `.gug` file
    ///
    /// # Errors
    ///
    /// See [`Self::from_gug_file`]
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let gug_file = GugFile::open(path)?;
        let level = gug_file.best_level_index();
        Self::from_gug_file(gug_file, level)
    }

    /// Opens resolution level `level` of the map described by a `.gug` file
    ///
    /// # Errors
    ///
    /// See [`Self::from_gug_file`]
    #[instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn open_level(path: impl AsRef<Path>, level: usize) -> Result<Self, Error> {
        Self::from_gug_file(GugFile::open(path)?, level)
    }

    /// Opens resolution level `level` of an already parsed `.gug` file
    ///
    /// # Errors
    ///
    /// This function errors if:
    /// - `level` does not exist
    /// - the level's `.gup` file or image entry cannot be opened
    /// - the level's announced size does not fit the tile grid
    pub fn from_gug_file(gug_file: GugFile, level: usize) -> Result<Self, Error> {
        let (path, image_index) = gug_file.gup_path(level)?;
        let image = open_image_entry(&path, image_index)?;
        let level_record = gug_file.level(level)?;

        let real = (image.real_width(), image.real_height());
        let announced = level_record.image_width_height;
        let fits = |announced: u32, real: u32, tile: u32| {
            announced == 0 || (announced <= real && real - announced < tile)
        };
        if announced == (0, 0) {
            warn!("level {level} announces no image size");
        }
        if !fits(announced.0, real.0, image.tile_width())
            || !fits(announced.1, real.1, image.tile_height())
        {
            return Err(Error::MismatchWidthHeight { announced, real });
        }

        let (tile_width, tile_height) = (image.tile_width(), image.tile_height());
        let tile_size = raw_stride(tile_width) * tile_height as usize;
        let tile_size_rgb = tile_width as usize * tile_height as usize * CHANNELS;
        let background = gug_file.header().background_rgb();
        info!(
            "opened level {level} from {} entry {image_index}: {}x{} pixels in {}x{} tiles",
            path.display(),
            real.0,
            real.1,
            image.num_tiles_x(),
            image.num_tiles_y()
        );

        Ok(Self {
            level,
            tile_width,
            tile_height,
            tiles_x: image.num_tiles_x(),
            tiles_y: image.num_tiles_y(),
            width: real.0,
            height: real.1,
            tile_size,
            tile_size_rgb,
            compression: image.codec().compression,
            background,
            image: Mutex::new(image),
            gug_file,
        })
    }

    /// Returns the parsed `.gug` file
    #[must_use]
    pub const fn gug_file(&self) -> &GugFile {
        &self.gug_file
    }

    /// Returns the header of the `.gug` file
    #[must_use]
    pub const fn header(&self) -> &HeaderRecord {
        self.gug_file.header()
    }

    /// Index of the opened resolution level
    #[must_use]
    pub const fn level_index(&self) -> usize {
        self.level
    }

    /// Returns the record of the opened resolution level
    #[must_use]
    pub fn level_record(&self) -> &LevelRecord {
        &self.gug_file.levels()[self.level]
    }

    /// Tile width in pixels
    #[must_use]
    pub const fn tile_width(&self) -> u32 {
        self.tile_width
    }

    /// Tile height in pixels
    #[must_use]
    pub const fn tile_height(&self) -> u32 {
        self.tile_height
    }

    /// Tile columns and rows
    #[must_use]
    pub const fn tiles(&self) -> (u32, u32) {
        (self.tiles_x, self.tiles_y)
    }

    /// Stored bytes of an uncompressed tile
    #[must_use]
    pub const fn tile_size(&self) -> usize {
        self.tile_size
    }

    /// Bytes of a decoded tile
    #[must_use]
    pub const fn tile_size_rgb(&self) -> usize {
        self.tile_size_rgb
    }

    /// Compression code of the stored tiles, see [`crate::Compression`]
    #[must_use]
    pub const fn compression(&self) -> u32 {
        self.compression
    }

    /// Color of pixels without map data
    #[must_use]
    pub const fn background(&self) -> [u8; 3] {
        self.background
    }

    /// Reads and decodes a single tile
    ///
    /// # Errors
    ///
    /// See [`TiledImage::load_tile`]
    pub fn tile(&self, tx: i64, ty: i64) -> Result<PixelBuf, Error> {
        self.image.lock().load_tile(tx, ty)
    }

    /// Reads the stored bytes of a single tile
    ///
    /// # Errors
    ///
    /// See [`TiledImage::load_compressed_tile`]
    pub fn compressed_tile(&self, tx: i64, ty: i64) -> Result<Vec<u8>, Error> {
        self.image.lock().load_compressed_tile(tx, ty)
    }

    /// Opens an independent handle on the level's image entry
    ///
    /// # Errors
    ///
    /// See [`TiledImage::try_clone`]
    pub fn image(&self) -> Result<TiledImage, Error> {
        self.image.lock().try_clone()
    }
}

impl RasterMap for GugMap {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    #[instrument(level = "debug", skip(self))]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn region(&self, pos: PixelCoord, size: PixelSize) -> Result<PixelBuf, Error> {
        let mut image = self.image.lock();
        let mut out = PixelBuf::filled(size.width, size.height, self.background)
            .ok_or(Error::RegionTooLarge(size))?;

        // requested rectangle clipped to the map
        let x0 = pos.x.max(0);
        let y0 = pos.y.max(0);
        let x1 = pos.x.saturating_add(i64::from(size.width)).min(i64::from(self.width));
        let y1 = pos.y.saturating_add(i64::from(size.height)).min(i64::from(self.height));
        if x0 >= x1 || y0 >= y1 {
            debug!("region outside of map");
            return Ok(out);
        }

        let (tw, th) = (i64::from(self.tile_width), i64::from(self.tile_height));
        for (ty, tx) in (y0 / th..=(y1 - 1) / th).cartesian_product(x0 / tw..=(x1 - 1) / tw) {
            let tile = match image.load_tile(tx, ty) {
                Ok(tile) => tile,
                Err(Error::MissingTile { tx, ty }) => {
                    debug!("tile ({tx}, {ty}) missing, leaving background");
                    continue;
                }
                Err(e) => return Err(e),
            };

            let (left, top) = (tx * tw, ty * th);
            let (sx0, sy0) = (x0.max(left), y0.max(top));
            let (sx1, sy1) = (x1.min(left + tw), y1.min(top + th));
            out.blit(
                &tile,
                ((sx0 - left) as u32, (sy0 - top) as u32),
                ((sx0 - pos.x) as u32, (sy0 - pos.y) as u32),
                ((sx1 - sx0) as u32, (sy1 - sy0) as u32),
            );
        }
        Ok(out)
    }

    fn fname(&self) -> &Path {
        self.gug_file.filename()
    }

    fn title(&self) -> &str {
        &self.gug_file.header().title
    }
}

impl fmt::Debug for GugMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GugMap")
            .field("fname", &self.gug_file.filename())
            .field("level", &self.level)
            .field("size", &(self.width, self.height))
            .field("tiles", &(self.tiles_x, self.tiles_y))
            .finish_non_exhaustive()
    }
}
