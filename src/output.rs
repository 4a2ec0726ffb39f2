//! PNG output for decoded sprites

use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::{Sprite, SpriteImage};

/// Error type for output operations
#[derive(Debug)]
pub enum OutputError {
    /// IO error during file operations
    Io(io::Error),
    /// Image encoding error
    Image(image::ImageError),
    /// Buffer size does not match the image dimensions
    Buffer { width: u32, height: u32, len: usize },
}

impl std::fmt::Display for OutputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputError::Io(e) => write!(f, "IO error: {}", e),
            OutputError::Image(e) => write!(f, "Image error: {}", e),
            OutputError::Buffer { width, height, len } => {
                write!(f, "{} bytes cannot hold a {}x{} RGBA image", len, width, height)
            }
        }
    }
}

impl std::error::Error for OutputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OutputError::Io(e) => Some(e),
            OutputError::Image(e) => Some(e),
            OutputError::Buffer { .. } => None,
        }
    }
}

impl From<io::Error> for OutputError {
    fn from(e: io::Error) -> Self {
        OutputError::Io(e)
    }
}

impl From<image::ImageError> for OutputError {
    fn from(e: image::ImageError) -> Self {
        OutputError::Image(e)
    }
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    image.save(path)?;
    Ok(())
}

fn to_rgba(image: &SpriteImage) -> Result<RgbaImage, OutputError> {
    image.to_rgba_image().ok_or(OutputError::Buffer {
        width: image.width(),
        height: image.height(),
        len: image.data().len(),
    })
}

/// Path of one composite part: `out.png` becomes `out_<part>.png`.
pub fn part_path(output: &Path, part: &str) -> PathBuf {
    let stem = output.file_stem().and_then(|s| s.to_str()).unwrap_or("sprite");
    let name = format!("{}_{}.png", stem, part);
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(name),
        _ => PathBuf::from(name),
    }
}

/// Write a decoded sprite as PNG.
///
/// Single images go to `output`; composites write one file per part next to
/// it. Returns every path written.
pub fn save_sprite(sprite: &Sprite, output: &Path) -> Result<Vec<PathBuf>, OutputError> {
    match sprite {
        Sprite::Image(image) => {
            save_png(&to_rgba(image)?, output)?;
            Ok(vec![output.to_path_buf()])
        }
        Sprite::Composite(composite) => {
            let mut written = Vec::with_capacity(composite.parts.len());
            for (part, image) in &composite.parts {
                let path = part_path(output, part);
                save_png(&to_rgba(image)?, &path)?;
                written.push(path);
            }
            Ok(written)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompositeSprite, Direction};
    use std::collections::BTreeMap;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn image(color: [u8; 4]) -> SpriteImage {
        SpriteImage::new(1, 1, Rc::from(color.to_vec()))
    }

    #[test]
    fn test_part_path() {
        assert_eq!(part_path(Path::new("out/frame.png"), "top"), PathBuf::from("out/frame_top.png"));
        assert_eq!(part_path(Path::new("frame.png"), "left"), PathBuf::from("frame_left.png"));
    }

    #[test]
    fn test_save_image() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("dot.png");
        let written = save_sprite(&Sprite::Image(image([255, 0, 0, 255])), &path).unwrap();
        assert_eq!(written, vec![path.clone()]);

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn test_save_composite_writes_each_part() {
        let temp = TempDir::new().unwrap();
        let composite = CompositeSprite {
            direction: Direction::Horizontal,
            parts: BTreeMap::from([
                ("left".to_string(), image([1, 2, 3, 255])),
                ("right".to_string(), image([4, 5, 6, 255])),
            ]),
            thickness: BTreeMap::new(),
            stretch_middle: false,
        };
        let path = temp.path().join("bar.png");
        let written = save_sprite(&Sprite::Composite(Rc::new(composite)), &path).unwrap();
        assert_eq!(written, vec![temp.path().join("bar_left.png"), temp.path().join("bar_right.png")]);
        assert!(written.iter().all(|p| p.exists()));
    }
}
