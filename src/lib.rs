//! spritecodec - Library for run-length encoded, palette-indexed sprites
//!
//! This library provides functionality to:
//! - Decode compact sprite text into RGBA buffers through cached pipelines
//! - Encode images back into sprite text against a palette
//! - Resolve nested sprite libraries with aliases and palette filters
//! - Assemble stretchable composite sprites from named parts

pub mod cli;
pub mod color;
pub mod composite;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod models;
pub mod output;
pub mod palette;
pub mod parser;
pub mod pipeline;
pub mod registry;

pub use decode::{Decoder, Substitution};
pub use encode::{EncodedSprite, Encoder, RawImage, Rasterize};
pub use error::{CodecError, ErrorCategory, Result};
pub use models::{DecodeRequest, Flip, LibraryDesc, Sprite, SpriteImage};
pub use palette::Palette;
pub use parser::{load_book, parse_book, SpriteBook};
pub use registry::{FilterRegistry, SpriteRegistry};
