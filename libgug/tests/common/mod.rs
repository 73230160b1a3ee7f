#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use std::{
    fmt::Write as _,
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
};

pub const RAW: u32 = 0;
pub const ZLIB: u32 = 1;
pub const JPEG: u32 = 2;

const INFO_HEADER_LEN: u32 = 64;

/// Deterministic content of pixel `(x, y)` of an image entry
pub fn pattern(seed: u8, x: u32, y: u32) -> [u8; 3] {
    [
        (x % 251) as u8 ^ seed,
        (y % 241) as u8,
        ((x / 7 + y / 5) % 256) as u8,
    ]
}

/// Solid color used for lossy (JPEG) tiles
pub fn tile_color(tx: u32, ty: u32) -> [u8; 3] {
    [40 + 60 * tx as u8, 200 - 50 * ty as u8, 120]
}

pub fn color_close(a: [u8; 3], b: [u8; 3]) -> bool {
    a.iter().zip(b).all(|(&a, b)| a.abs_diff(b) <= 6)
}

/// Description of one `.gup` image entry
#[derive(Debug, Clone)]
pub struct EntrySpec {
    pub width: u32,
    pub height: u32,
    pub tile: (u32, u32),
    pub compression: u32,
    pub top_down: bool,
    pub seed: u8,
    /// tiles (top-down coordinates) stored with a zero index entry
    pub missing: Vec<(u32, u32)>,
    /// tiles whose stored bytes are replaced
    pub overrides: Vec<((u32, u32), Vec<u8>)>,
    /// tiles whose index entry points past the end of the file
    pub dangling: Vec<(u32, u32)>,
    /// tiles whose stored offset and/or length are replaced; `None` keeps the
    /// real value
    pub index_patches: Vec<((u32, u32), (Option<i64>, Option<i64>))>,
}

impl EntrySpec {
    pub fn new(width: u32, height: u32, tile: (u32, u32)) -> Self {
        Self {
            width,
            height,
            tile,
            compression: RAW,
            top_down: false,
            seed: 0,
            missing: vec![],
            overrides: vec![],
            dangling: vec![],
            index_patches: vec![],
        }
    }

    pub fn compression(mut self, compression: u32) -> Self {
        self.compression = compression;
        self
    }

    pub fn top_down(mut self, top_down: bool) -> Self {
        self.top_down = top_down;
        self
    }

    pub fn seed(mut self, seed: u8) -> Self {
        self.seed = seed;
        self
    }

    pub fn missing(mut self, tx: u32, ty: u32) -> Self {
        self.missing.push((tx, ty));
        self
    }

    pub fn override_tile(mut self, tx: u32, ty: u32, bytes: Vec<u8>) -> Self {
        self.overrides.push(((tx, ty), bytes));
        self
    }

    pub fn dangling(mut self, tx: u32, ty: u32) -> Self {
        self.dangling.push((tx, ty));
        self
    }

    pub fn patch_index(
        mut self,
        tx: u32,
        ty: u32,
        offset: Option<i64>,
        length: Option<i64>,
    ) -> Self {
        self.index_patches.push(((tx, ty), (offset, length)));
        self
    }

    pub fn tiles(&self) -> (u32, u32) {
        (
            self.width.div_ceil(self.tile.0),
            self.height.div_ceil(self.tile.1),
        )
    }

    /// BGR rows of tile `(tx, ty)` in stored order, each padded to 4 bytes
    pub fn raw_tile(&self, tx: u32, ty: u32) -> Vec<u8> {
        let (tw, th) = self.tile;
        let stride = (tw as usize * 3 + 3) & !3;
        let mut out = Vec::with_capacity(stride * th as usize);
        for row in 0..th {
            let y = if self.top_down { row } else { th - 1 - row };
            let start = out.len();
            for x in 0..tw {
                let [r, g, b] = pattern(self.seed, tx * tw + x, ty * th + y);
                out.extend([b, g, r]);
            }
            out.resize(start + stride, 0);
        }
        out
    }

    /// The bytes stored for tile `(tx, ty)`
    pub fn stored_tile(&self, tx: u32, ty: u32) -> Vec<u8> {
        if let Some((_, bytes)) = self.overrides.iter().find(|(t, _)| *t == (tx, ty)) {
            return bytes.clone();
        }
        match self.compression {
            ZLIB => {
                let mut e = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
                e.write_all(&self.raw_tile(tx, ty)).unwrap();
                e.finish().unwrap()
            }
            JPEG => {
                let mut img =
                    RgbImage::from_pixel(self.tile.0, self.tile.1, Rgb(tile_color(tx, ty)));
                if !self.top_down {
                    image::imageops::flip_vertical_in_place(&mut img);
                }
                let mut buf = Vec::new();
                img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
                    .unwrap();
                buf
            }
            _ => self.raw_tile(tx, ty),
        }
    }

    /// Serializes the whole image entry
    pub fn encode(&self) -> Vec<u8> {
        let (tiles_x, tiles_y) = self.tiles();
        let tiles = (tiles_x * tiles_y) as usize;
        let index_start = 14 + INFO_HEADER_LEN as usize;
        let data_start = index_start + tiles * 16;

        let mut index = Vec::with_capacity(tiles * 16);
        let mut data = Vec::new();
        for slot in 0..tiles as u32 {
            let row = slot / tiles_x;
            let tx = slot % tiles_x;
            let ty = if self.top_down { row } else { tiles_y - 1 - row };
            if self.missing.contains(&(tx, ty)) {
                index.extend(0i64.to_le_bytes());
                index.extend(0i64.to_le_bytes());
                continue;
            }
            let bytes = self.stored_tile(tx, ty);
            let mut offset = if self.dangling.contains(&(tx, ty)) {
                1 << 40
            } else {
                (data_start + data.len()) as i64
            };
            let mut length = bytes.len() as i64;
            if let Some((_, (o, l))) = self.index_patches.iter().find(|(t, _)| *t == (tx, ty)) {
                offset = o.unwrap_or(offset);
                length = l.unwrap_or(length);
            }
            index.extend(offset.to_le_bytes());
            index.extend(length.to_le_bytes());
            data.extend(bytes);
        }

        let total = (data_start + data.len()) as u32;
        let height = if self.top_down {
            -(self.height as i32)
        } else {
            self.height as i32
        };
        let mut out = Vec::with_capacity(total as usize);
        // file header
        out.extend(b"BM");
        out.extend(total.to_le_bytes());
        out.extend(0u16.to_le_bytes());
        out.extend(0u16.to_le_bytes());
        out.extend((data_start as u32).to_le_bytes());
        // info header
        out.extend(INFO_HEADER_LEN.to_le_bytes());
        out.extend((self.width as i32).to_le_bytes());
        out.extend(height.to_le_bytes());
        out.extend(1u16.to_le_bytes());
        out.extend(24u16.to_le_bytes());
        out.extend([0u8; 24]);
        // grid header
        out.extend(0x4755_5031u32.to_le_bytes());
        out.extend(0u32.to_le_bytes());
        out.extend(self.compression.to_le_bytes());
        out.extend(self.tile.0.to_le_bytes());
        out.extend(self.tile.1.to_le_bytes());
        out.extend(0u32.to_le_bytes());
        assert_eq!(out.len(), index_start);

        out.extend(index);
        out.extend(data);
        out
    }
}

/// One `[MapInfo]` section
#[derive(Debug, Clone)]
pub struct LevelSpec {
    pub path: String,
    pub pixel_size: (f64, f64),
    pub size: (u32, u32),
}

impl LevelSpec {
    pub fn new(path: &str, pixel_size: (f64, f64), size: (u32, u32)) -> Self {
        Self {
            path: path.to_owned(),
            pixel_size,
            size,
        }
    }
}

pub fn gug_text(title: &str, background: u32, levels: &[LevelSpec]) -> String {
    let mut text = String::from("; generated test map\r\n[Header]\r\nFileVersion=1.0\r\n");
    let _ = write!(
        text,
        "Title={title}\r\nMapInfo=test map\r\nBkColor=0x{background:06X}\r\n"
    );
    let gauges = levels.iter().map(|_| "1").collect::<Vec<_>>().join(";");
    let _ = write!(text, "Gauges={gauges}\r\n");
    for level in levels {
        let _ = write!(
            text,
            "\r\n[MapInfo]\r\nType=TOPO\r\nPath={}\r\nEllipsoid=Bessel\r\nProjection=UTM\r\n\
             BaseMed=15\r\nZone=33\r\nWorldOrgX=1000\r\nWorldOrgY=5000\r\n\
             WPPX={}\r\nWPPY={}\r\nRADX=0\r\nRADY=0\r\nImageWidth={}\r\nImageHeight={}\r\n",
            level.path, level.pixel_size.0, level.pixel_size.1, level.size.0, level.size.1
        );
    }
    text
}

/// Writes a `.gup` file holding `entries` back to back
pub fn write_gup(path: &Path, entries: &[EntrySpec]) -> anyhow::Result<Vec<u64>> {
    let mut bytes = Vec::new();
    let mut offsets = Vec::new();
    for entry in entries {
        offsets.push(bytes.len() as u64);
        bytes.extend(entry.encode());
    }
    fs::write(path, bytes)?;
    Ok(offsets)
}

/// Writes `map.gup` and `map.gug` into `dir`, one level per entry
pub fn write_map(dir: &Path, background: u32, entries: &[EntrySpec]) -> anyhow::Result<PathBuf> {
    write_gup(&dir.join("map.gup"), entries)?;
    let levels: Vec<_> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let wpp = 2.0 * (i + 1) as f64;
            LevelSpec::new("map.gup", (wpp, -wpp), (e.width, e.height))
        })
        .collect();
    let gug = dir.join("map.gug");
    fs::write(&gug, gug_text("Test Map", background, &levels))?;
    Ok(gug)
}

/// The standard 2x2 grid of 256 pixel tiles
pub fn two_by_two() -> EntrySpec {
    EntrySpec::new(512, 512, (256, 256))
}
