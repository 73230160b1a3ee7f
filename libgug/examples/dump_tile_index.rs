/// Demonstrates how to inspect the raw headers and tile index of every
/// image entry in a `.gup` file
use anyhow::Context;
use libgug::{image::raw::TileIndexEntry, open_image_entry, Error};

fn main() -> anyhow::Result<()> {
    let gup = std::env::args().nth(1).context("missing .gup file argument")?;

    for n in 0.. {
        let image = match open_image_entry(&gup, n) {
            Ok(image) => image,
            Err(Error::ImageEntryNotFound { found, .. }) => {
                println!("{found} image entries");
                break;
            }
            Err(e) => return Err(e.into()),
        };
        println!("entry {n} at offset {}", image.offset());
        println!("  {:?}", image.file_header());
        println!("  {:?}", image.info_header());
        println!("  {:?}", image.grid_header());

        let stored = image.tile_index().iter().filter(|t| t.is_present()).count();
        let bytes: i64 = image
            .tile_index()
            .iter()
            .filter(|t| t.is_present())
            .map(|t: &TileIndexEntry| t.length)
            .sum();
        println!(
            "  {}x{} tiles, {stored} stored, {bytes} bytes of tile data",
            image.num_tiles_x(),
            image.num_tiles_y()
        );
    }
    Ok(())
}
