use nom::{
    number::complete::{le_i32, le_u16, le_u32},
    sequence::tuple,
    IResult,
};

/// `BM`, little-endian
pub const BITMAP_SIGNATURE: u16 = 0x4D42;
pub const FILE_HEADER_LEN: usize = 14;
pub const INFO_HEADER_LEN: usize = 40;
pub const GRID_HEADER_LEN: usize = 24;
/// The grid header is embedded in the info header, right after its standard
/// fields
pub const GRID_HEADER_OFFSET: usize = INFO_HEADER_LEN;

/// Bitmap container header found at the start of every image entry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct BitmapFileHeader {
    /// Type tag, always [`BITMAP_SIGNATURE`]
    pub kind: u16,
    /// Declared size of the entry
    pub size: u32,
    /// Opaque
    pub reserved1: u16,
    /// Opaque
    pub reserved2: u16,
    /// Declared payload offset
    pub offset_bits: u32,
}

/// Bitmap info header following the [`BitmapFileHeader`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct BitmapInfoHeader {
    /// Size of the whole info header, including the embedded [`GridHeader`]
    pub size: u32,
    /// Announced image width in pixels
    pub width: i32,
    /// Announced image height in pixels; negative for top-down row order
    pub height: i32,
    /// Color planes, 1
    pub planes: u16,
    /// Bits per pixel, 24 for all supported images
    pub bit_count: u16,
    /// Bitmap compression, unused by tiled images
    pub compression: u32,
    /// Declared pixel data size
    pub size_image: u32,
    /// Horizontal resolution
    pub x_pels_per_meter: i32,
    /// Vertical resolution
    pub y_pels_per_meter: i32,
    /// Palette entries
    pub clr_used: u32,
    /// Important palette entries
    pub clr_important: u32,
}

/// Tile grid header embedded in the [`BitmapInfoHeader`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub struct GridHeader {
    /// Opaque
    pub unknown1: u32,
    /// Opaque
    pub unknown2: u32,
    /// Tile compression code, see [`super::Compression`]
    pub compression: u32,
    /// Tile width in pixels
    pub tile_width: u32,
    /// Tile height in pixels
    pub tile_height: u32,
    /// Opaque
    pub unknown4: u32,
}

impl BitmapFileHeader {
    pub(crate) fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (kind, size, reserved1, reserved2, offset_bits)) =
            tuple((le_u16, le_u32, le_u16, le_u16, le_u32))(input)?;
        Ok((
            input,
            Self {
                kind,
                size,
                reserved1,
                reserved2,
                offset_bits,
            },
        ))
    }
}

impl BitmapInfoHeader {
    pub(crate) fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (
            input,
            (
                size,
                width,
                height,
                planes,
                bit_count,
                compression,
                size_image,
                x_pels_per_meter,
                y_pels_per_meter,
                clr_used,
                clr_important,
            ),
        ) = tuple((
            le_u32, le_i32, le_i32, le_u16, le_u16, le_u32, le_u32, le_i32, le_i32, le_u32, le_u32,
        ))(input)?;
        Ok((
            input,
            Self {
                size,
                width,
                height,
                planes,
                bit_count,
                compression,
                size_image,
                x_pels_per_meter,
                y_pels_per_meter,
                clr_used,
                clr_important,
            },
        ))
    }

    /// Rows are stored top-down when the height is negative
    #[must_use]
    pub const fn is_top_down(&self) -> bool {
        self.height < 0
    }
}

impl GridHeader {
    pub(crate) fn parse(input: &[u8]) -> IResult<&[u8], Self> {
        let (input, (unknown1, unknown2, compression, tile_width, tile_height, unknown4)) =
            tuple((le_u32, le_u32, le_u32, le_u32, le_u32, le_u32))(input)?;
        Ok((
            input,
            Self {
                unknown1,
                unknown2,
                compression,
                tile_width,
                tile_height,
                unknown4,
            },
        ))
    }
}
