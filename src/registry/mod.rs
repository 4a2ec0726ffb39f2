//! Registry traits and implementations for named items.
//!
//! This module provides:
//! - A unified `Registry` trait for consistent registry interfaces
//! - `FilterRegistry` for named palette substitutions
//! - `SpriteRegistry` for the sprite library, with alias/filter resolution
//!   and memoized decoding
//! - `Library`, `Render` and `EditPoint`, the tree the sprite registry owns

mod filter;
mod library;
mod render;
mod sprite;
mod traits;

pub use filter::FilterRegistry;
pub use library::{Library, Node};
pub use render::{EditPoint, Render, RenderId};
pub use sprite::SpriteRegistry;
pub use traits::Registry;
