use gugr::{default_output, export_tile, print_info, region_to_image};
use libgug::{PixelCoord, PixelSize};
use std::path::PathBuf;
use tracing::{level_filters::LevelFilter, Level};
use tracing_subscriber::EnvFilter;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[cfg(not(debug_assertions))]
const DEFAULT_DEBUG_LEVEL: u8 = 1;
#[cfg(debug_assertions)]
const DEFAULT_DEBUG_LEVEL: u8 = 99;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Turn debugging information on, overridden by `RUST_LOG`
    #[arg(short, long, default_value_t = DEFAULT_DEBUG_LEVEL, action = clap::ArgAction::Count)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// prints the header and resolution levels of a GUG map
    Info {
        /// The .gug metadata file
        gug_file: PathBuf,
    },

    /// exports a rectangle of a GUG map as PNG
    Region {
        /// The .gug metadata file
        gug_file: PathBuf,

        /// Left edge in pixels, may lie outside of the map
        #[arg(short, long, allow_negative_numbers = true)]
        x: i64,

        /// Top edge in pixels, may lie outside of the map
        #[arg(short, long, allow_negative_numbers = true)]
        y: i64,

        /// Width in pixels
        #[arg(long)]
        width: u32,

        /// Height in pixels
        #[arg(long)]
        height: u32,

        /// Resolution level, defaults to the most detailed one
        #[arg(short, long)]
        level: Option<usize>,

        /// The output file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// exports one tile of a GUG map
    Tile {
        /// The .gug metadata file
        gug_file: PathBuf,

        /// Tile column
        tx: i64,

        /// Tile row
        ty: i64,

        /// Resolution level, defaults to the most detailed one
        #[arg(short, long)]
        level: Option<usize>,

        /// Write the stored bytes instead of a PNG
        #[arg(long)]
        raw: bool,

        /// The output file name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        3 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .init();

    match cli.command {
        Commands::Info { gug_file } => print_info(&gug_file)?,
        Commands::Region {
            gug_file,
            x,
            y,
            width,
            height,
            level,
            output,
        } => {
            let output = match output {
                Some(o) => o,
                None => default_output(&gug_file, &format!("_{x}_{y}"), "png")?,
            };
            region_to_image(
                &gug_file,
                level,
                PixelCoord::new(x, y),
                PixelSize::new(width, height),
                &output,
            )?;
        }
        Commands::Tile {
            gug_file,
            tx,
            ty,
            level,
            raw,
            output,
        } => export_tile(&gug_file, level, (tx, ty), raw, output)?,
    }
    Ok(())
}
