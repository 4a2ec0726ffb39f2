//! Sprite sources and the library description tree.
//!
//! A library description is a nested JSON mapping. Each leaf is either a
//! literal encoded sprite string or a command array:
//!
//! - `["multiple", "<direction>", {"<part>": "<source>", ...}]`
//! - `["same", "<path>"]`
//! - `["filter", "<path>", "<filter id>"]`

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// Separator between the segments of a sprite path.
pub const PATH_SEPARATOR: char = '.';

/// Split a sprite path into its segments.
pub fn split_path(path: &str) -> Vec<String> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// Join path segments back into a sprite path.
pub fn join_path(segments: &[String]) -> String {
    segments.join(&PATH_SEPARATOR.to_string())
}

/// Error when a library description cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DescriptionError {
    #[error("'{path}': expected a sprite string, command array or mapping")]
    UnexpectedValue { path: String },
    #[error("'{path}': unknown command '{verb}'")]
    UnknownCommand { path: String, verb: String },
    #[error("'{path}': malformed '{verb}' command: {message}")]
    MalformedCommand { path: String, verb: String, message: String },
    #[error("'{path}': unknown composite direction '{direction}'")]
    UnknownDirection { path: String, direction: String },
}

/// Layout of a composite sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `top`, `middle`, `bottom` stacked; the middle stretches vertically
    Vertical,
    /// `left`, `middle`, `right` side by side; the middle stretches horizontally
    Horizontal,
    /// Four corner pieces
    Corners,
}

impl Direction {
    /// Part names valid for this direction.
    pub fn parts(self) -> &'static [&'static str] {
        match self {
            Direction::Vertical => &["top", "middle", "bottom"],
            Direction::Horizontal => &["left", "middle", "right"],
            Direction::Corners => &["top_left", "top_right", "bottom_left", "bottom_right"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Vertical => "vertical",
            Direction::Horizontal => "horizontal",
            Direction::Corners => "corners",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vertical" => Ok(Direction::Vertical),
            "horizontal" => Ok(Direction::Horizontal),
            "corners" => Ok(Direction::Corners),
            other => Err(other.to_string()),
        }
    }
}

/// Where a library entry's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteSource {
    /// Encoded sprite text
    Literal(String),
    /// Composite built from several encoded parts
    Multiple { direction: Direction, parts: BTreeMap<String, String> },
    /// Alias of another entry or subtree
    Same { path: String },
    /// Another entry or subtree seen through a palette filter
    Filter { path: String, filter: String },
}

impl SpriteSource {
    /// Short name of the source kind, as used in the description.
    pub fn kind(&self) -> &'static str {
        match self {
            SpriteSource::Literal(_) => "literal",
            SpriteSource::Multiple { .. } => "multiple",
            SpriteSource::Same { .. } => "same",
            SpriteSource::Filter { .. } => "filter",
        }
    }

    /// Whether this source still needs alias/filter resolution.
    pub fn is_reference(&self) -> bool {
        matches!(self, SpriteSource::Same { .. } | SpriteSource::Filter { .. })
    }

    fn from_command(path: &str, items: &[Value]) -> Result<Self, DescriptionError> {
        let verb = items.first().and_then(Value::as_str).ok_or_else(|| {
            DescriptionError::MalformedCommand {
                path: path.to_string(),
                verb: String::new(),
                message: "first element must be the command name".to_string(),
            }
        })?;
        let malformed = |message: &str| DescriptionError::MalformedCommand {
            path: path.to_string(),
            verb: verb.to_string(),
            message: message.to_string(),
        };
        let text = |index: usize, what: &str| {
            items.get(index).and_then(Value::as_str).map(str::to_string).ok_or_else(|| malformed(what))
        };

        match verb {
            "multiple" => {
                let direction = text(1, "missing direction")?;
                let direction = direction.parse::<Direction>().map_err(|direction| {
                    DescriptionError::UnknownDirection { path: path.to_string(), direction }
                })?;
                let map = items
                    .get(2)
                    .and_then(Value::as_object)
                    .ok_or_else(|| malformed("parts must be a mapping"))?;
                let mut parts = BTreeMap::new();
                for (name, value) in map {
                    let source =
                        value.as_str().ok_or_else(|| malformed("part sources must be strings"))?;
                    parts.insert(name.clone(), source.to_string());
                }
                Ok(SpriteSource::Multiple { direction, parts })
            }
            "same" => Ok(SpriteSource::Same { path: text(1, "missing target path")? }),
            "filter" => Ok(SpriteSource::Filter {
                path: text(1, "missing target path")?,
                filter: text(2, "missing filter id")?,
            }),
            other => Err(DescriptionError::UnknownCommand {
                path: path.to_string(),
                verb: other.to_string(),
            }),
        }
    }
}

/// A parsed library description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryDesc {
    Source(SpriteSource),
    Group(BTreeMap<String, LibraryDesc>),
}

impl LibraryDesc {
    /// Interpret a JSON value as a library description.
    pub fn from_value(value: &Value) -> Result<Self, DescriptionError> {
        Self::parse_node(value, &[])
    }

    /// Empty root group.
    pub fn empty() -> Self {
        LibraryDesc::Group(BTreeMap::new())
    }

    fn parse_node(value: &Value, path: &[String]) -> Result<Self, DescriptionError> {
        let name = join_path(path);
        match value {
            Value::String(text) => Ok(LibraryDesc::Source(SpriteSource::Literal(text.clone()))),
            Value::Array(items) => Ok(LibraryDesc::Source(SpriteSource::from_command(&name, items)?)),
            Value::Object(map) => {
                let mut children = BTreeMap::new();
                for (key, child) in map {
                    let mut child_path = path.to_vec();
                    child_path.push(key.clone());
                    children.insert(key.clone(), Self::parse_node(child, &child_path)?);
                }
                Ok(LibraryDesc::Group(children))
            }
            _ => Err(DescriptionError::UnexpectedValue { path: name }),
        }
    }
}

impl TryFrom<&Value> for LibraryDesc {
    type Error = DescriptionError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}
