//! Decode command implementation

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::SprcConfig;
use crate::error::ErrorCategory;
use crate::models::{DecodeRequest, Flip, Sprite};
use crate::output::save_sprite;

use super::{open_book, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the decode command
#[allow(clippy::too_many_arguments)]
pub fn run_decode(
    book_path: &Path,
    name: &str,
    width: u32,
    height: u32,
    flip: Flip,
    filter: Option<&str>,
    stretch: bool,
    output: Option<&Path>,
    config: &SprcConfig,
) -> ExitCode {
    let book = match open_book(book_path) {
        Ok(book) => book,
        Err(code) => return code,
    };
    let mut registry = match book.into_registry(&config.codec) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let mut request = DecodeRequest::new(width, height).with_flip(flip).with_stretch(stretch);
    if let Some(filter) = filter {
        request = request.with_filter(filter);
    }

    let sprite = match registry.decode(name, &request) {
        Ok(sprite) => sprite,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.category() == ErrorCategory::Lookup {
                let names = registry.names();
                if !names.is_empty() {
                    eprintln!("Available sprites: {}", names.join(", "));
                }
            }
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let output = output.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(format!("{}.png", name)));
    if output.is_dir() {
        eprintln!("Error: Output '{}' is a directory", output.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    match save_sprite(&sprite, &output) {
        Ok(paths) => {
            for path in paths {
                println!("Saved: {}", path.display());
            }
            if let Sprite::Composite(composite) = &sprite {
                for (part, thickness) in &composite.thickness {
                    println!("  {} thickness {}", part, thickness);
                }
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: Failed to save '{}': {}", output.display(), e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
