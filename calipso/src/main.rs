mod curtain;
mod fires;
mod grid;
mod layers;
mod options;
mod output;
mod overview;
mod progress;
mod subtypes;

use anyhow::Result;
use clap::Parser;
use options::{Cli, Command};
use std::{fs::File, io::BufReader, path::Path};
use vfm::{RawGranule, ReadMode, ZoneLayout};

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::init();

    let ctx = Context {
        mode: if cli.mmap {
            ReadMode::MemMap
        } else {
            ReadMode::InMem
        },
        layout: load_layout(cli.layout.as_deref())?,
    };

    match cli.cmd {
        Command::Subtypes(subtypes) => subtypes.run(&ctx),
        Command::Grid(grid) => grid.run(&ctx),
        Command::Curtain(curtain) => curtain.run(&ctx),
        Command::Layers(layers) => layers.run(&ctx),
        Command::Fires(fires) => fires.run(),
        Command::Overview(overview) => overview.run(&ctx),
    }
}

/// Settings shared by every subcommand.
pub struct Context {
    pub mode: ReadMode,
    pub layout: ZoneLayout,
}

impl Context {
    pub fn open(&self, dir: &Path) -> Result<RawGranule> {
        Ok(RawGranule::open(dir.to_owned(), self.mode)?)
    }
}

fn load_layout(path: Option<&Path>) -> Result<ZoneLayout> {
    let layout = match path {
        Some(path) => serde_json::from_reader(BufReader::new(File::open(path)?))?,
        None => ZoneLayout::CALIPSO_V4,
    };
    layout.validate()?;
    Ok(layout)
}
