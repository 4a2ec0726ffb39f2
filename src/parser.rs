//! JSON5 sprite book parsing
//!
//! A sprite book bundles everything a registry needs:
//!
//! ```json5
//! {
//!   // Default palette: channel arrays or CSS color strings
//!   palette: [[0, 0, 0, 0], "#ffffff", "rgb(35, 255, 70)"],
//!   // Filter id -> { old index: new index }
//!   filters: { green: { "1": 2 } },
//!   sprites: {
//!     hero: { idle: "x010,1x06,1" },
//!     hero_green: ["filter", "hero", "green"],
//!   },
//! }
//! ```
//!
//! JSON5 adds comments, trailing commas and unquoted keys on top of JSON.

use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::color::parse_palette_entry;
use crate::config::CodecConfig;
use crate::error::CodecError;
use crate::models::LibraryDesc;
use crate::palette::Palette;
use crate::registry::{FilterRegistry, SpriteRegistry};

/// Error type for sprite book parsing failures.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{section}: {message}")]
pub struct ParseError {
    /// Top-level section the error was found in (`palette`, `filters`, ...)
    pub section: String,
    pub message: String,
}

impl ParseError {
    fn new(section: &str, message: impl Into<String>) -> Self {
        Self { section: section.to_string(), message: message.into() }
    }
}

/// Error loading a sprite book from disk.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BookError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A parsed sprite book.
#[derive(Debug, Clone)]
pub struct SpriteBook {
    pub palette: Palette,
    pub filters: FilterRegistry,
    pub sprites: LibraryDesc,
}

impl SpriteBook {
    /// Build a registry over this book's sprites.
    pub fn into_registry(self, config: &CodecConfig) -> Result<SpriteRegistry, CodecError> {
        SpriteRegistry::new(&self.sprites, self.palette, self.filters, config)
    }
}

/// Parse a sprite book from JSON5 text.
pub fn parse_book(text: &str) -> Result<SpriteBook, ParseError> {
    let value: Value = json5::from_str(text).map_err(|e| ParseError::new("book", e.to_string()))?;
    let root = value.as_object().ok_or_else(|| ParseError::new("book", "expected an object"))?;

    let palette = parse_palette(root.get("palette"))?;
    let filters = match root.get("filters") {
        Some(value) => parse_filters(value)?,
        None => FilterRegistry::new(),
    };
    let sprites = match root.get("sprites") {
        Some(value) => {
            LibraryDesc::from_value(value).map_err(|e| ParseError::new("sprites", e.to_string()))?
        }
        None => LibraryDesc::empty(),
    };
    if !matches!(sprites, LibraryDesc::Group(_)) {
        return Err(ParseError::new("sprites", "expected an object"));
    }

    Ok(SpriteBook { palette, filters, sprites })
}

/// Read and parse a sprite book file.
pub fn load_book(path: &Path) -> Result<SpriteBook, BookError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| BookError::Io { path: path.display().to_string(), source })?;
    Ok(parse_book(&text)?)
}

fn parse_palette(value: Option<&Value>) -> Result<Palette, ParseError> {
    let items = value
        .and_then(Value::as_array)
        .ok_or_else(|| ParseError::new("palette", "expected an array of colors"))?;
    let mut palette = Palette::new();
    for (index, item) in items.iter().enumerate() {
        let color = parse_palette_entry(item)
            .map_err(|e| ParseError::new("palette", format!("entry {}: {}", index, e)))?;
        palette.push(color);
    }
    Ok(palette)
}

fn parse_filters(value: &Value) -> Result<FilterRegistry, ParseError> {
    let filters = value
        .as_object()
        .ok_or_else(|| ParseError::new("filters", "expected an object of filters"))?;
    let mut registry = FilterRegistry::new();
    for (id, table) in filters {
        registry.register(id.clone(), parse_filter_table(id, table)?);
    }
    Ok(registry)
}

fn parse_filter_table(id: &str, table: &Value) -> Result<HashMap<u32, u32>, ParseError> {
    let bad = |message: String| ParseError::new("filters", format!("'{}': {}", id, message));
    let entries: &Map<String, Value> =
        table.as_object().ok_or_else(|| bad("expected an object".to_string()))?;
    let mut map = HashMap::new();
    for (old, new) in entries {
        let old: u32 = old.parse().map_err(|_| bad(format!("'{}' is not an index", old)))?;
        let new = new
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| bad(format!("{} is not an index", new)))?;
        map.insert(old, new);
    }
    Ok(map)
}
