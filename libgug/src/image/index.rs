use std::io::{self, Read, Seek, SeekFrom};

pub const TILE_INDEX_ENTRY_LEN: usize = 16;

/// Location of one tile's bytes, relative to the start of its image entry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TileIndexEntry {
    /// Byte offset
    pub offset: i64,
    /// Byte length
    pub length: i64,
}

impl TileIndexEntry {
    /// Entries with a non-positive offset or length mark a missing tile
    #[must_use]
    pub const fn is_present(&self) -> bool {
        self.offset > 0 && self.length > 0
    }

    /// End of the tile's bytes relative to the image entry
    pub(crate) const fn end(&self) -> i64 {
        self.offset.saturating_add(self.length)
    }
}

#[allow(clippy::module_name_repetitions)]
pub fn read_tile_index(
    file: &mut (impl Read + Seek),
    start: u64,
    tiles: usize,
) -> io::Result<Vec<TileIndexEntry>> {
    file.seek(SeekFrom::Start(start))?;
    let mut buf = vec![0; tiles * TILE_INDEX_ENTRY_LEN];
    file.read_exact(&mut buf)?;

    let index = buf
        .chunks_exact(TILE_INDEX_ENTRY_LEN)
        .map(|entry| {
            let (offset, length) = entry.split_at(8);
            let mut o = [0; 8];
            let mut l = [0; 8];
            o.copy_from_slice(offset);
            l.copy_from_slice(length);
            TileIndexEntry {
                offset: i64::from_le_bytes(o),
                length: i64::from_le_bytes(l),
            }
        })
        .collect();

    Ok(index)
}
