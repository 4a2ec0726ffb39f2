//! Decoded sprite types handed to the render layer.

use std::collections::BTreeMap;
use std::rc::Rc;

use image::RgbaImage;

use super::source::Direction;

/// A decoded, row-major RGBA buffer.
///
/// The pixel data is shared, so cloning a cached image is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteImage {
    width: u32,
    height: u32,
    data: Rc<[u8]>,
}

impl SpriteImage {
    /// Wrap a buffer of `width * height * 4` bytes.
    pub fn new(width: u32, height: u32, data: Rc<[u8]>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * 4);
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / 4
    }

    /// Whether two images share the same underlying buffer.
    pub fn shares_buffer(&self, other: &SpriteImage) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    /// Copy into an [`RgbaImage`] for blitting or saving.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.data.to_vec())
    }
}

/// A multi-part sprite plus the layout metadata the render layer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeSprite {
    pub direction: Direction,
    /// Decoded parts by name (`top`, `middle`, `left`, `top_left`, ...)
    pub parts: BTreeMap<String, SpriteImage>,
    /// Size of each fixed part along the stretch axis, in output pixels
    pub thickness: BTreeMap<String, u32>,
    /// Whether the render layer should stretch the middle part
    pub stretch_middle: bool,
}

impl CompositeSprite {
    pub fn part(&self, name: &str) -> Option<&SpriteImage> {
        self.parts.get(name)
    }
}

/// Result of decoding a library entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sprite {
    Image(SpriteImage),
    Composite(Rc<CompositeSprite>),
}

impl Sprite {
    pub fn as_image(&self) -> Option<&SpriteImage> {
        match self {
            Sprite::Image(image) => Some(image),
            Sprite::Composite(_) => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeSprite> {
        match self {
            Sprite::Image(_) => None,
            Sprite::Composite(composite) => Some(composite),
        }
    }

    /// Total decoded bytes across all parts.
    pub fn byte_len(&self) -> usize {
        match self {
            Sprite::Image(image) => image.data().len(),
            Sprite::Composite(composite) => composite.parts.values().map(|p| p.data().len()).sum(),
        }
    }
}
