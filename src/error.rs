//! Error types shared by the codec, pipelines and registry.

use thiserror::Error;

/// Broad class of a [`CodecError`].
///
/// Every variant belongs to exactly one category. None of them are worth
/// retrying: inputs are deterministic, so a retry reproduces the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The codec or a pipeline could not be built
    Construction,
    /// Sprite text (or the buffer it produced) does not follow the grammar
    MalformedSource,
    /// A name, filter or alias path did not resolve
    Lookup,
    /// Decoding produced no pixels
    EmptySprite,
}

/// Error raised while building, decoding, encoding or resolving sprites.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CodecError {
    /// No default palette (or an empty one) was supplied
    #[error("default palette is missing or empty")]
    MissingPalette,
    /// A declared pipeline stage has no procedure
    #[error("pipeline stage '{0}' has no matching procedure")]
    UnknownStage(String),
    /// A pipeline was declared without stages
    #[error("pipeline declares no stages")]
    NoStages,
    /// `process_full` needs the per-stage cache
    #[error("per-stage caching is disabled for this pipeline")]
    StageCacheDisabled,
    /// A stage received a value of the wrong kind; the stage list is out of order
    #[error("stage '{stage}' expected {expected} input")]
    StageMismatch { stage: &'static str, expected: &'static str },

    /// `x<group><count>` without the closing `,`
    #[error("unterminated run starting at position {0}")]
    UnterminatedRun(usize),
    /// `p[...` without the closing `]`
    #[error("unterminated palette switch starting at position {0}")]
    UnterminatedPalette(usize),
    /// The text ended in the middle of a digit group
    #[error("truncated digit group at position {0}")]
    TruncatedGroup(usize),
    /// A run would push the sprite past the decoded pixel limit
    #[error("run at position {position} repeats {count} pixels, exceeding the limit of {limit}")]
    RunTooLong { position: usize, count: usize, limit: usize },
    /// A character that cannot start or continue a digit group
    #[error("invalid character '{found}' at position {position}")]
    InvalidDigit { position: usize, found: char },
    /// A digit group addressed a color outside the active palette
    #[error("palette index {index} out of range for palette of {len} colors")]
    PaletteIndex { index: usize, len: usize },
    /// A composite part name is not valid for the composite's direction
    #[error("part '{part}' is not valid for a {direction} composite")]
    UnknownPart { part: String, direction: String },
    /// The decoded buffer does not match the requested dimensions
    #[error("sprite '{key}' has {actual} pixels, which does not fit {expected}")]
    DimensionMismatch { key: String, expected: String, actual: usize },

    /// Name not present in the library
    #[error("sprite '{0}' not found")]
    NotFound(String),
    /// Filter id not registered
    #[error("filter '{0}' is not registered")]
    UnknownFilter(String),
    /// Alias or filter command points at a path that does not exist
    #[error("'{alias}' references unknown sprite '{target}'")]
    AliasUnresolved { alias: String, target: String },
    /// An alias chain loops back on itself
    #[error("circular sprite reference: {}", chain.join(" -> "))]
    CircularReference { chain: Vec<String> },

    /// Decode produced a zero-length buffer
    #[error("sprite '{0}' decoded to an empty buffer")]
    EmptySprite(String),
}

impl CodecError {
    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CodecError::MissingPalette
            | CodecError::UnknownStage(_)
            | CodecError::NoStages
            | CodecError::StageCacheDisabled
            | CodecError::StageMismatch { .. } => ErrorCategory::Construction,
            CodecError::UnterminatedRun(_)
            | CodecError::UnterminatedPalette(_)
            | CodecError::TruncatedGroup(_)
            | CodecError::RunTooLong { .. }
            | CodecError::InvalidDigit { .. }
            | CodecError::PaletteIndex { .. }
            | CodecError::UnknownPart { .. }
            | CodecError::DimensionMismatch { .. } => ErrorCategory::MalformedSource,
            CodecError::NotFound(_)
            | CodecError::UnknownFilter(_)
            | CodecError::AliasUnresolved { .. }
            | CodecError::CircularReference { .. } => ErrorCategory::Lookup,
            CodecError::EmptySprite(_) => ErrorCategory::EmptySprite,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = CodecError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(CodecError::MissingPalette.category(), ErrorCategory::Construction);
        assert_eq!(CodecError::UnterminatedRun(3).category(), ErrorCategory::MalformedSource);
        let run = CodecError::RunTooLong { position: 0, count: 9, limit: 4 };
        assert_eq!(run.category(), ErrorCategory::MalformedSource);
        assert_eq!(CodecError::UnknownFilter("red".into()).category(), ErrorCategory::Lookup);
        assert_eq!(CodecError::EmptySprite("a".into()).category(), ErrorCategory::EmptySprite);
    }

    #[test]
    fn test_circular_message() {
        let err = CodecError::CircularReference { chain: vec!["a".into(), "b".into(), "a".into()] };
        assert_eq!(err.to_string(), "circular sprite reference: a -> b -> a");
    }
}
