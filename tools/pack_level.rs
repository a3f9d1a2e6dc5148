//! pack_level.rs - convert level files between the text and binary formats.
//!
//! USAGE:
//! ```bash
//! cargo run --bin pack_level -- --input maps/two_rooms.lvl --output two_rooms.rcal
//! cargo run --bin pack_level -- --demo --output demo.lvl
//! ```
//!
//! The output format follows the output extension (`.rcal` is binary).

use anyhow::{Context, bail};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use rca_rs::{
    map::{load_level, save_level},
    world::Level,
};

/// CLI options handled via `clap` derive.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Opts {
    /// Level to read (`.lvl` or `.rcal`)
    #[arg(long, value_name = "FILE", conflicts_with = "demo")]
    input: Option<PathBuf>,

    /// Write the built-in demo level instead of reading one
    #[arg(long)]
    demo: bool,

    /// Destination file
    #[arg(long, value_name = "FILE")]
    output: PathBuf,

    /// Replace the level name
    #[arg(long)]
    name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opts = Opts::parse();

    let mut level = match (&opts.input, opts.demo) {
        (Some(path), false) => {
            load_level(path).with_context(|| format!("reading {}", path.display()))?
        }
        (None, true) => Level::demo(),
        _ => bail!("pass exactly one of --input or --demo"),
    };
    if let Some(name) = opts.name {
        level.name = name;
    }

    save_level(&opts.output, &level)
        .with_context(|| format!("writing {}", opts.output.display()))?;
    info!(
        "{} sectors, {} walls, {} BSP nodes",
        level.sectors.len(),
        level.wall_count(),
        level.bsp.as_ref().map_or(0, |t| t.len())
    );
    Ok(())
}
