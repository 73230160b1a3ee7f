/// Demonstrates how to create a png file from a region of a [`GugMap`]
/// using the [`image`] crate
///
/// usage: `region_to_png <map.gug> [x y width height]`
use anyhow::Context;
use image::{codecs::png::PngEncoder, ImageEncoder};
use libgug::{GugMap, PixelCoord, PixelSize, RasterMap};
use std::fs::File;

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let gug = args.next().context("missing .gug file argument")?;
    let numbers = args
        .map(|a| a.parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .context("region must be given as integers")?;

    let map = GugMap::open(gug)?;
    let (pos, size) = match numbers[..] {
        [x, y, w, h] => (
            PixelCoord::new(x, y),
            PixelSize::new(u32::try_from(w)?, u32::try_from(h)?),
        ),
        _ => (PixelCoord::default(), map.size()),
    };
    let region = map.region(pos, size)?;

    let output = File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open("region_to_png_example.png")?;

    let encoder = PngEncoder::new(output);
    encoder.write_image(
        region.as_raw(),
        region.width(),
        region.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(())
}
