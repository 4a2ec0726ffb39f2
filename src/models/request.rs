//! Decode request attributes.

use std::fmt;
use std::str::FromStr;

/// Mirroring applied to a decoded sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Flip {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl Flip {
    /// Suffix this variant contributes to cache keys.
    pub fn key_suffix(self) -> &'static str {
        match self {
            Flip::None => "",
            Flip::Horizontal => "-h",
            Flip::Vertical => "-v",
            Flip::Both => "-hv",
        }
    }

    pub fn mirrors_horizontally(self) -> bool {
        matches!(self, Flip::Horizontal | Flip::Both)
    }

    pub fn mirrors_vertically(self) -> bool {
        matches!(self, Flip::Vertical | Flip::Both)
    }
}

impl FromStr for Flip {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(Flip::None),
            "h" | "horizontal" => Ok(Flip::Horizontal),
            "v" | "vertical" => Ok(Flip::Vertical),
            "hv" | "vh" | "both" => Ok(Flip::Both),
            other => Err(format!("unknown flip '{}', expected none, h, v or hv", other)),
        }
    }
}

impl fmt::Display for Flip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Flip::None => "none",
            Flip::Horizontal => "h",
            Flip::Vertical => "v",
            Flip::Both => "hv",
        };
        f.write_str(name)
    }
}

/// Attributes of a decode request.
///
/// `width` and `height` are the sprite's size in source pixels, before the
/// codec's scale factor is applied. For composites, `width` fixes the part
/// width of vertical composites and `height` fixes the part height of
/// horizontal and corner composites.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    pub width: u32,
    pub height: u32,
    pub flip: Flip,
    /// Filter applied on top of any filters attached to the entry
    pub filter: Option<String>,
    /// Whether the middle of a composite should stretch
    pub stretch: bool,
}

impl DecodeRequest {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, flip: Flip::None, filter: None, stretch: true }
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.flip = flip;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_stretch(mut self, stretch: bool) -> Self {
        self.stretch = stretch;
        self
    }

    /// Attribute-derived part of the decoded-cache key.
    ///
    /// Two requests share a suffix exactly when every attribute matches.
    pub fn key_suffix(&self) -> String {
        let mut suffix = format!("{}x{}{}", self.width, self.height, self.flip.key_suffix());
        if let Some(filter) = &self.filter {
            suffix.push('@');
            suffix.push_str(filter);
        }
        if !self.stretch {
            suffix.push_str("~fixed");
        }
        suffix
    }

    /// Full cache key for the entry called `name`.
    pub fn cache_key(&self, name: &str) -> String {
        format!("{} {}", name, self.key_suffix())
    }
}
