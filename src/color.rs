//! Palette color parsing and formatting.
//!
//! Sprite books may write palette entries as channel arrays or as CSS color
//! strings:
//! - `[r, g, b]` or `[r, g, b, a]`, each channel 0-255
//! - Hex: `#RGB`, `#RGBA`, `#RRGGBB`, `#RRGGBBAA`
//! - Anything else lightningcss understands: `rgb()`, `hsl()`, `transparent`, ...

use image::Rgba;
use lightningcss::traits::Parse;
use lightningcss::values::color::{CssColor, FloatColor};
use serde_json::Value;
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Invalid length (must be 3, 4, 6, or 8 hex chars after #)
    #[error("invalid color length {0}, expected 3, 4, 6, or 8")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
    /// Channel array of the wrong size or with values outside 0-255
    #[error("invalid channel array: {0}")]
    InvalidChannels(String),
    /// Neither a string nor an array
    #[error("expected a color string or channel array, got {0}")]
    UnexpectedValue(String),
    /// CSS parsing error from lightningcss
    #[error("CSS parse error: {0}")]
    CssParse(String),
}

/// Parse a CSS color string into an RGBA color.
///
/// # Examples
///
/// ```
/// use spritecodec::color::parse_color;
///
/// assert_eq!(parse_color("#F00").unwrap(), image::Rgba([255, 0, 0, 255]));
/// assert_eq!(parse_color("#23ff4680").unwrap(), image::Rgba([35, 255, 70, 128]));
/// assert_eq!(parse_color("rgb(0, 255, 0)").unwrap(), image::Rgba([0, 255, 0, 255]));
/// assert_eq!(parse_color("transparent").unwrap(), image::Rgba([0, 0, 0, 0]));
/// ```
pub fn parse_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    match s.strip_prefix('#') {
        Some(hex) => parse_hex(hex),
        None => parse_css(s),
    }
}

fn parse_hex(hex: &str) -> Result<Rgba<u8>, ColorError> {
    if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::InvalidHex(c));
    }
    let digits: Vec<u8> = hex.bytes().map(hex_value).collect();
    let channels: Vec<u8> = match digits.len() {
        3 | 4 => digits.iter().map(|d| d * 17).collect(),
        6 | 8 => digits.chunks_exact(2).map(|pair| pair[0] * 16 + pair[1]).collect(),
        len => return Err(ColorError::InvalidLength(len)),
    };
    let alpha = channels.get(3).copied().unwrap_or(255);
    Ok(Rgba([channels[0], channels[1], channels[2], alpha]))
}

fn hex_value(byte: u8) -> u8 {
    match byte {
        b'0'..=b'9' => byte - b'0',
        b'a'..=b'f' => byte - b'a' + 10,
        _ => byte - b'A' + 10,
    }
}

fn parse_css(s: &str) -> Result<Rgba<u8>, ColorError> {
    let color = CssColor::parse_string(s).map_err(|e| ColorError::CssParse(e.to_string()))?;
    let rgb = color
        .to_rgb()
        .map_err(|_| ColorError::CssParse(format!("cannot convert '{}' to RGB", s)))?;
    match rgb {
        CssColor::RGBA(rgba) => Ok(Rgba([rgba.red, rgba.green, rgba.blue, rgba.alpha])),
        CssColor::Float(float) => match float.as_ref() {
            FloatColor::RGB(rgb) => {
                let channel = |v: f32| (v * 255.0).round().clamp(0.0, 255.0) as u8;
                Ok(Rgba([channel(rgb.r), channel(rgb.g), channel(rgb.b), channel(rgb.alpha)]))
            }
            _ => Err(ColorError::CssParse(format!("'{}' did not convert to sRGB", s))),
        },
        _ => Err(ColorError::CssParse(format!("'{}' did not convert to sRGB", s))),
    }
}

/// Parse one palette entry from a sprite book.
pub fn parse_palette_entry(value: &Value) -> Result<Rgba<u8>, ColorError> {
    match value {
        Value::String(s) => parse_color(s),
        Value::Array(items) => {
            if items.len() != 3 && items.len() != 4 {
                return Err(ColorError::InvalidChannels(format!("{} channels", items.len())));
            }
            let mut rgba = [0, 0, 0, 255];
            for (slot, item) in rgba.iter_mut().zip(items) {
                *slot = item
                    .as_u64()
                    .filter(|v| *v <= 255)
                    .ok_or_else(|| ColorError::InvalidChannels(item.to_string()))?
                    as u8;
            }
            Ok(Rgba(rgba))
        }
        other => Err(ColorError::UnexpectedValue(other.to_string())),
    }
}

/// Format a color as `#RRGGBBAA`.
pub fn to_hex(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hex_forms() {
        assert_eq!(parse_color("#fff").unwrap(), Rgba([255, 255, 255, 255]));
        assert_eq!(parse_color("#0008").unwrap(), Rgba([0, 0, 0, 136]));
        assert_eq!(parse_color("#23FF46").unwrap(), Rgba([35, 255, 70, 255]));
        assert_eq!(parse_color("#00000000").unwrap(), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_hex_errors() {
        assert_eq!(parse_color(""), Err(ColorError::Empty));
        assert_eq!(parse_color("#12345"), Err(ColorError::InvalidLength(5)));
        assert_eq!(parse_color("#GGG"), Err(ColorError::InvalidHex('G')));
    }

    #[test]
    fn test_css_forms() {
        assert_eq!(parse_color("red").unwrap(), Rgba([255, 0, 0, 255]));
        assert_eq!(parse_color("hsl(120, 100%, 50%)").unwrap(), Rgba([0, 255, 0, 255]));
        assert!(matches!(parse_color("not-a-color"), Err(ColorError::CssParse(_))));
    }

    #[test]
    fn test_palette_entry() {
        assert_eq!(parse_palette_entry(&json!([35, 255, 70])).unwrap(), Rgba([35, 255, 70, 255]));
        assert_eq!(parse_palette_entry(&json!([0, 0, 0, 0])).unwrap(), Rgba([0, 0, 0, 0]));
        assert_eq!(parse_palette_entry(&json!("#ffffff")).unwrap(), Rgba([255, 255, 255, 255]));
        assert!(matches!(parse_palette_entry(&json!([1, 2])), Err(ColorError::InvalidChannels(_))));
        assert!(matches!(
            parse_palette_entry(&json!([1, 2, 300])),
            Err(ColorError::InvalidChannels(_))
        ));
        assert!(matches!(parse_palette_entry(&json!(7)), Err(ColorError::UnexpectedValue(_))));
    }

    #[test]
    fn test_to_hex() {
        assert_eq!(to_hex(Rgba([35, 255, 70, 255])), "#23ff46ff");
    }
}
