//! Configuration schema types for `sprc.toml`
//!
//! Defines the structure and validation rules for codec configuration.

use serde::{Deserialize, Serialize};

/// Largest magnification the codec accepts.
pub const MAX_SCALE: u32 = 16;

/// Decode settings shared by the decoder pipelines and the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Global magnification applied in both directions
    #[serde(default = "default_scale")]
    pub scale: u32,
    /// Keep each pipeline's final output per key
    #[serde(default = "default_true")]
    pub cache_output: bool,
    /// Keep each pipeline stage's output per key
    #[serde(default = "default_true")]
    pub cache_stages: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { scale: default_scale(), cache_output: true, cache_stages: true }
    }
}

fn default_scale() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

/// Encode settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeConfig {
    /// Always lead generated palettes with a transparent entry
    #[serde(default)]
    pub force_transparent_first: bool,
}

/// Complete `sprc.toml` configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprcConfig {
    #[serde(default)]
    pub codec: CodecConfig,
    #[serde(default)]
    pub encode: EncodeConfig,
}

/// A single validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Dotted path of the offending field
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl SprcConfig {
    /// Collect every validation problem in the configuration.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.codec.scale == 0 || self.codec.scale > MAX_SCALE {
            errors.push(ConfigValidationError {
                field: "codec.scale".to_string(),
                message: format!("must be between 1 and {}", MAX_SCALE),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: SprcConfig = toml::from_str("").unwrap();
        assert_eq!(config, SprcConfig::default());
        assert_eq!(config.codec.scale, 1);
        assert!(config.codec.cache_output);
        assert!(config.codec.cache_stages);
        assert!(!config.encode.force_transparent_first);
    }

    #[test]
    fn test_partial_sections() {
        let config: SprcConfig = toml::from_str("[codec]\nscale = 2\ncache_stages = false\n").unwrap();
        assert_eq!(config.codec.scale, 2);
        assert!(config.codec.cache_output);
        assert!(!config.codec.cache_stages);
    }

    #[test]
    fn test_validate_scale_bounds() {
        let mut config = SprcConfig::default();
        assert!(config.validate().is_empty());

        config.codec.scale = 0;
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "codec.scale");

        config.codec.scale = MAX_SCALE + 1;
        assert_eq!(config.validate().len(), 1);
    }
}
