//! Palette command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::color::to_hex;
use crate::config::SprcConfig;
use crate::palette::generate_palette;

use super::{EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Execute the palette command
pub fn run_palette(image_path: &Path, hex: bool, config: &SprcConfig) -> ExitCode {
    let image = match image::open(image_path) {
        Ok(image) => image.to_rgba8(),
        Err(e) => {
            eprintln!("Error: Cannot open image '{}': {}", image_path.display(), e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let palette = generate_palette(image.as_raw(), config.encode.force_transparent_first);
    let text = if hex {
        let colors: Vec<String> = palette.colors().iter().map(|c| to_hex(*c)).collect();
        serde_json::to_string(&colors)
    } else {
        serde_json::to_string(&palette)
    };

    match text {
        Ok(text) => {
            println!("{}", text);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
