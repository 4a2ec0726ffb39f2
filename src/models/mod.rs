//! Data models: library descriptions, decode requests and decoded sprites.

mod request;
mod source;
mod sprite;

pub use request::{DecodeRequest, Flip};
pub use source::{
    join_path, split_path, DescriptionError, Direction, LibraryDesc, SpriteSource, PATH_SEPARATOR,
};
pub use sprite::{CompositeSprite, Sprite, SpriteImage};
