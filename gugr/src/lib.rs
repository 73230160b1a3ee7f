use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use image::{codecs::png::PngEncoder, ImageEncoder};
use libgug::{Compression, GugFile, GugMap, PixelBuf, PixelCoord, PixelSize, RasterMap};
use tracing::{debug, info, instrument};

fn open_map(gug_file: &Path, level: Option<usize>) -> Result<GugMap> {
    let map = match level {
        Some(level) => GugMap::open_level(gug_file, level),
        None => GugMap::open(gug_file),
    }
    .with_context(|| format!("Failed to open map {}", gug_file.display()))?;
    debug!("{map:?}");
    Ok(map)
}

fn create_output(output_name: &Path) -> Result<File> {
    File::options()
        .create(true)
        .write(true)
        .truncate(true)
        .open(output_name)
        .with_context(|| format!("Failed to create {}", output_name.display()))
}

fn write_png(pixels: &PixelBuf, output_name: &Path) -> Result<()> {
    let output = create_output(output_name)?;
    info!(
        "Writing {}x{} pixels to {}",
        pixels.width(),
        pixels.height(),
        output_name.display()
    );
    let encoder = PngEncoder::new(output);
    encoder.write_image(
        pixels.as_raw(),
        pixels.width(),
        pixels.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    info!("Successfully wrote {}", output_name.display());
    Ok(())
}

/// Prints the header and resolution levels of a `.gug` file
#[instrument]
pub fn print_info(gug_file: &Path) -> Result<()> {
    let gug = GugFile::open(gug_file)
        .with_context(|| format!("Failed to read {}", gug_file.display()))?;
    let header = gug.header();
    println!("file:        {}", gug.filename().display());
    println!("title:       {}", header.title);
    println!("map info:    {}", header.map_info);
    println!("version:     {}", header.file_version);
    println!("background:  #{:06X}", header.background_color);
    println!("levels:      {}", gug.level_count());

    let best = gug.best_level_index();
    for (n, level) in gug.levels().iter().enumerate() {
        let marker = if n == best { "*" } else { " " };
        println!(
            "{marker}[{n}] {} {}x{} px, {} x {} units/px, {} {} zone {}",
            level.path,
            level.image_width_height.0,
            level.image_width_height.1,
            level.pixel_size.0,
            level.pixel_size.1,
            level.projection,
            level.ellipsoid,
            level.zone,
        );
    }

    let map = GugMap::from_gug_file(gug, best)?;
    let (tiles_x, tiles_y) = map.tiles();
    println!(
        "level {best}: {}x{} px in {tiles_x}x{tiles_y} tiles of {}x{}",
        map.width(),
        map.height(),
        map.tile_width(),
        map.tile_height(),
    );
    let level = map.level_record();
    let (left, top) = level.pixel_to_pcs(0.0, 0.0);
    let (right, bottom) = level.pixel_to_pcs(f64::from(map.width()), f64::from(map.height()));
    println!("extent:      ({left}, {top}) - ({right}, {bottom})");
    Ok(())
}

/// Writes a rectangle of a map as PNG
#[instrument]
pub fn region_to_image(
    gug_file: &Path,
    level: Option<usize>,
    pos: PixelCoord,
    size: PixelSize,
    output_name: &Path,
) -> Result<()> {
    if size.width == 0 || size.height == 0 {
        bail!("Region must not be empty");
    }
    let map = open_map(gug_file, level)?;
    let pixels = map.region(pos, size)?;
    debug!("Read {} bytes of region data", pixels.as_raw().len());
    write_png(&pixels, output_name)
}

/// `<dir>/<stem><suffix>.<extension>` next to the input file
///
/// # Errors
///
/// Errors if `gug_file` has no usable file name
pub fn default_output(gug_file: &Path, suffix: &str, extension: &str) -> Result<PathBuf> {
    let Some(dir) = gug_file.parent() else {
        bail!("Invalid gug file");
    };
    let Some(Some(filename)) = gug_file.file_stem().map(|os| os.to_str()) else {
        bail!("Invalid gug file");
    };
    let output = dir.join(format!("{filename}{suffix}.{extension}"));
    info!("output name: {}", output.display());
    Ok(output)
}

/// File extension for stored tile bytes of the given compression code
fn raw_tile_extension(compression: u32) -> &'static str {
    match Compression::try_from(compression) {
        Ok(Compression::Jpeg) => "jpg",
        Ok(Compression::Zlib) => "zlib",
        _ => "bin",
    }
}

/// Writes a single tile of a map, either decoded as PNG or as the bytes
/// stored in the tile file. Without `output_name` the file is written next to
/// `gug_file`.
#[instrument]
pub fn export_tile(
    gug_file: &Path,
    level: Option<usize>,
    (tx, ty): (i64, i64),
    raw: bool,
    output_name: Option<PathBuf>,
) -> Result<()> {
    let map = open_map(gug_file, level)?;
    let extension = if raw {
        raw_tile_extension(map.compression())
    } else {
        "png"
    };
    let output_name = match output_name {
        Some(o) => o,
        None => default_output(gug_file, &format!("_tile_{tx}_{ty}"), extension)?,
    };

    if raw {
        let bytes = map.compressed_tile(tx, ty)?;
        let mut output = create_output(&output_name)?;
        output.write_all(&bytes)?;
        info!(
            "Wrote {} stored bytes to {}",
            bytes.len(),
            output_name.display()
        );
        Ok(())
    } else {
        write_png(&map.tile(tx, ty)?, &output_name)
    }
}
