//! Encode command implementation

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use glob::glob;
use image::RgbaImage;
use log::warn;
use serde_json::{json, Value};

use crate::config::SprcConfig;
use crate::encode::Encoder;
use crate::palette::{generate_palette, Palette};

use super::{open_book, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Expand `pattern` to files; a plain path matches itself.
fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, String> {
    let paths = glob(pattern).map_err(|e| format!("Invalid pattern '{}': {}", pattern, e))?;
    let mut files: Vec<PathBuf> = paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("skipping unreadable glob entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Execute the encode command
pub fn run_encode(
    pattern: &str,
    book: Option<&Path>,
    output: Option<&Path>,
    config: &SprcConfig,
) -> ExitCode {
    let files = match expand_pattern(pattern) {
        Ok(files) if !files.is_empty() => files,
        Ok(_) => {
            eprintln!("Error: No images match '{}'", pattern);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    let mut images: Vec<(String, RgbaImage)> = Vec::with_capacity(files.len());
    for path in &files {
        match image::open(path) {
            Ok(image) => {
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("sprite").to_string();
                images.push((stem, image.to_rgba8()));
            }
            Err(e) => warn!("skipping '{}': {}", path.display(), e),
        }
    }
    if images.is_empty() {
        eprintln!("Error: None of the {} matched files could be loaded", files.len());
        return ExitCode::from(EXIT_ERROR);
    }

    let palette = match book {
        Some(path) => match open_book(path) {
            Ok(book) => book.palette,
            Err(code) => return code,
        },
        None => {
            let raw: Vec<u8> = images.iter().flat_map(|(_, image)| image.as_raw().iter().copied()).collect();
            generate_palette(&raw, config.encode.force_transparent_first)
        }
    };

    let sprites = match encode_all(palette.clone(), images) {
        Ok(sprites) => sprites,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let book = json!({ "palette": palette, "sprites": sprites });
    let text = match serde_json::to_string_pretty(&book) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, text + "\n") {
                eprintln!("Error: Failed to write '{}': {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
            println!("Saved: {}", path.display());
        }
        None => println!("{}", text),
    }
    ExitCode::from(EXIT_SUCCESS)
}

fn encode_all(
    palette: Palette,
    images: Vec<(String, RgbaImage)>,
) -> Result<BTreeMap<String, Value>, crate::error::CodecError> {
    let mut encoder = Encoder::new(palette)?;
    let mut sprites = BTreeMap::new();
    for (name, image) in images {
        encoder.encode_with(image, |sprite| {
            sprites.insert(name.clone(), Value::String(sprite.source.clone()));
        })?;
    }
    Ok(sprites)
}
