//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod decode;
mod encode;
mod info;
mod palette;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, SprcConfig};
use crate::models::Flip;
use crate::parser::{load_book, SpriteBook};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// sprc - Encode, decode and inspect run-length sprite books
#[derive(Parser)]
#[command(name = "sprc")]
#[command(about = "sprc - Encode, decode and inspect run-length sprite books")]
#[command(version)]
pub struct Cli {
    /// Path to sprc.toml (default: search upward from the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the codec scale factor (1-16)
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..=16))]
    pub scale: Option<u32>,

    /// Disable pipeline caching
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode one sprite from a sprite book to PNG
    Decode {
        /// Sprite book (.json5 or .json)
        book: PathBuf,

        /// Dotted sprite path, e.g. `hero.idle`
        name: String,

        /// Width in source pixels (fixes part width of vertical composites); 0 infers it
        #[arg(long, default_value = "0")]
        width: u32,

        /// Height in source pixels (fixes part height of horizontal and corner composites); 0 infers it
        #[arg(long, default_value = "0")]
        height: u32,

        /// Mirror the sprite: h, v or hv
        #[arg(long, default_value = "none")]
        flip: Flip,

        /// Apply a filter from the book on top of any attached filters
        #[arg(long)]
        filter: Option<String>,

        /// Do not stretch the middle part of composites
        #[arg(long)]
        no_stretch: bool,

        /// Output PNG. Composites write one `{stem}_{part}.png` per part.
        /// If omitted: {name}.png
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Encode images into a sprite book
    Encode {
        /// Image file or glob pattern (e.g. "sprites/*.png")
        pattern: String,

        /// Encode against this book's palette instead of generating one
        #[arg(long)]
        book: Option<PathBuf>,

        /// Lead a generated palette with a transparent entry
        #[arg(long)]
        force_transparent: bool,

        /// Write the book here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the palette generated from an image
    Palette {
        /// Input image
        image: PathBuf,

        /// Lead the palette with a transparent entry
        #[arg(long)]
        force_transparent: bool,

        /// Print colors as #RRGGBBAA strings
        #[arg(long)]
        hex: bool,
    },

    /// List the palette, filters and entries of a sprite book
    Info {
        /// Sprite book (.json5 or .json)
        book: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Run the CLI application
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let overrides = CliOverrides {
        scale: cli.scale,
        no_cache: cli.no_cache,
        force_transparent_first: match &cli.command {
            Commands::Encode { force_transparent: true, .. }
            | Commands::Palette { force_transparent: true, .. } => Some(true),
            _ => None,
        },
    };
    let config = match load_settings(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(code) => return code,
    };

    match cli.command {
        Commands::Decode { book, name, width, height, flip, filter, no_stretch, output } => {
            decode::run_decode(
                &book,
                &name,
                width,
                height,
                flip,
                filter.as_deref(),
                !no_stretch,
                output.as_deref(),
                &config,
            )
        }
        Commands::Encode { pattern, book, output, .. } => {
            encode::run_encode(&pattern, book.as_deref(), output.as_deref(), &config)
        }
        Commands::Palette { image, hex, .. } => palette::run_palette(&image, hex, &config),
        Commands::Info { book, json } => info::run_info(&book, json),
    }
}

/// Load sprc.toml (explicit path or discovered) and apply CLI overrides.
fn load_settings(path: Option<&Path>, overrides: &CliOverrides) -> Result<SprcConfig, ExitCode> {
    let mut config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Err(ExitCode::from(EXIT_ERROR));
        }
    };
    merge_cli_overrides(&mut config, overrides);
    log::debug!("effective config: {:?}", config);
    Ok(config)
}

/// Load a sprite book, printing the error and returning the exit code on failure.
pub(crate) fn open_book(path: &Path) -> Result<SpriteBook, ExitCode> {
    if !path.exists() {
        eprintln!("Error: Cannot open sprite book '{}'", path.display());
        return Err(ExitCode::from(EXIT_INVALID_ARGS));
    }
    load_book(path).map_err(|e| {
        eprintln!("Error: {}: {}", path.display(), e);
        ExitCode::from(EXIT_ERROR)
    })
}
