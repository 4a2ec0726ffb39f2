//! Run-length sprite encoding.
//!
//! The inverse of [`crate::decode`]: an RGBA image is matched against the
//! default palette, the indices actually used are compacted into a local
//! palette, and the result is written as self-contained sprite text that
//! starts with a `p[...]` palette switch.
//!
//! Encoding runs on the same [`TransformPipeline`] as decoding, with both
//! caches off.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use image::{DynamicImage, Rgba, RgbaImage};
use log::debug;
use serde::Serialize;

use crate::error::{CodecError, Result};
use crate::palette::{closest_index, digit_size, Palette};
use crate::pipeline::{CacheKey, StageFn, StageInput, TransformPipeline};

/// Stages of the encode pipeline, in order.
pub const ENCODE_STAGES: &[&str] = &["get_data", "get_pixels", "map_palette", "combine_pixels"];

/// Row-major RGBA bytes with their dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self { width, height, data }
    }

    /// Build from a list of pixels laid out in rows of `width`.
    pub fn from_pixels(width: u32, pixels: &[[u8; 4]]) -> Self {
        let height = if width == 0 { 0 } else { (pixels.len() / width as usize) as u32 };
        Self { width, height, data: pixels.iter().flatten().copied().collect() }
    }
}

/// Anything that can hand over its pixels as RGBA bytes.
pub trait Rasterize {
    fn rasterize(&self) -> RawImage;
}

impl Rasterize for RawImage {
    fn rasterize(&self) -> RawImage {
        self.clone()
    }
}

impl Rasterize for RgbaImage {
    fn rasterize(&self) -> RawImage {
        RawImage::new(self.width(), self.height(), self.as_raw().clone())
    }
}

impl Rasterize for DynamicImage {
    fn rasterize(&self) -> RawImage {
        let rgba = self.to_rgba8();
        RawImage::new(rgba.width(), rgba.height(), rgba.into_raw())
    }
}

/// Result of an encode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedSprite {
    /// Sprite text, decodable against the same default palette
    pub source: String,
    pub width: u32,
    pub height: u32,
    /// Default-palette indices in compacted order
    pub palette: Vec<usize>,
    /// Pixel count per default-palette index
    pub counts: BTreeMap<usize, usize>,
}

/// Value flowing through the encode pipeline.
#[derive(Clone)]
pub enum EncodeValue {
    Image(Rc<dyn Rasterize>),
    Raster(RawImage),
    Indexed {
        width: u32,
        height: u32,
        indices: Vec<usize>,
        counts: BTreeMap<usize, usize>,
    },
    Mapped {
        width: u32,
        height: u32,
        palette: Vec<usize>,
        digits: usize,
        remapped: Vec<usize>,
        counts: BTreeMap<usize, usize>,
    },
    Encoded(EncodedSprite),
}

impl CacheKey for EncodeValue {
    fn cache_key(&self) -> String {
        match self {
            EncodeValue::Image(image) => format!("image@{:p}", Rc::as_ptr(image) as *const ()),
            EncodeValue::Raster(raw) => format!("raster {}x{}", raw.width, raw.height),
            EncodeValue::Indexed { width, height, .. } => format!("indexed {}x{}", width, height),
            EncodeValue::Mapped { width, height, .. } => format!("mapped {}x{}", width, height),
            EncodeValue::Encoded(sprite) => sprite.source.clone(),
        }
    }
}

fn mismatch(stage: &'static str, expected: &'static str) -> CodecError {
    CodecError::StageMismatch { stage, expected }
}

/// Shortest run written as `x<group><count>,` is one longer than this.
///
/// Wide digit groups make literal runs expensive sooner, so the threshold
/// drops as the digit size grows, but never below 3.
pub fn run_threshold(digits: usize) -> usize {
    let scaled = (4.0 / digits.max(1) as f64).round() as usize;
    scaled.max(3)
}

fn get_data_stage(value: EncodeValue, input: &StageInput<'_, Palette, ()>) -> Result<EncodeValue> {
    let raw = match value {
        EncodeValue::Image(image) => image.rasterize(),
        EncodeValue::Raster(raw) => raw,
        _ => return Err(mismatch("get_data", "an image")),
    };
    if raw.width == 0 || raw.height == 0 || raw.data.is_empty() {
        return Err(CodecError::EmptySprite(input.key.to_string()));
    }
    let expected = raw.width as usize * raw.height as usize;
    if raw.data.len() != expected * 4 {
        return Err(CodecError::DimensionMismatch {
            key: input.key.to_string(),
            expected: format!("{}x{}", raw.width, raw.height),
            actual: raw.data.len() / 4,
        });
    }
    Ok(EncodeValue::Raster(raw))
}

fn get_pixels_stage(value: EncodeValue, input: &StageInput<'_, Palette, ()>) -> Result<EncodeValue> {
    let EncodeValue::Raster(raw) = value else {
        return Err(mismatch("get_pixels", "RGBA bytes"));
    };
    let palette = input.context;
    // Sprites reuse a handful of colors, so match each distinct one once
    let mut matched: HashMap<[u8; 4], usize> = HashMap::new();
    let mut counts = BTreeMap::new();
    let mut indices = Vec::with_capacity(raw.data.len() / 4);
    for chunk in raw.data.chunks_exact(4) {
        let pixel = [chunk[0], chunk[1], chunk[2], chunk[3]];
        let index = *matched.entry(pixel).or_insert_with(|| closest_index(palette, Rgba(pixel)));
        *counts.entry(index).or_insert(0) += 1;
        indices.push(index);
    }
    Ok(EncodeValue::Indexed { width: raw.width, height: raw.height, indices, counts })
}

fn map_palette_stage(value: EncodeValue, _: &StageInput<'_, Palette, ()>) -> Result<EncodeValue> {
    let EncodeValue::Indexed { width, height, indices, counts } = value else {
        return Err(mismatch("map_palette", "palette indices"));
    };
    let mut palette: Vec<usize> = Vec::new();
    let mut positions: HashMap<usize, usize> = HashMap::new();
    let remapped = indices
        .iter()
        .map(|index| {
            *positions.entry(*index).or_insert_with(|| {
                palette.push(*index);
                palette.len() - 1
            })
        })
        .collect();
    let digits = digit_size(palette.len());
    Ok(EncodeValue::Mapped { width, height, palette, digits, remapped, counts })
}

fn combine_pixels_stage(
    value: EncodeValue,
    _: &StageInput<'_, Palette, ()>,
) -> Result<EncodeValue> {
    let EncodeValue::Mapped { width, height, palette, digits, remapped, counts } = value else {
        return Err(mismatch("combine_pixels", "compacted indices"));
    };
    let threshold = run_threshold(digits);
    let prefix =
        palette.iter().map(|index| index.to_string()).collect::<Vec<_>>().join(",");
    let mut source = format!("p[{}]", prefix);

    let mut pos = 0;
    while pos < remapped.len() {
        let digit = remapped[pos];
        let run = remapped[pos..].iter().take_while(|d| **d == digit).count();
        let group = format!("{:0width$}", digit, width = digits);
        if run > threshold {
            source.push('x');
            source.push_str(&group);
            source.push_str(&run.to_string());
            source.push(',');
        } else {
            for _ in 0..run {
                source.push_str(&group);
            }
        }
        pos += run;
    }

    Ok(EncodeValue::Encoded(EncodedSprite { source, width, height, palette, counts }))
}

const ENCODE_PROCEDURES: &[(&str, StageFn<Palette, EncodeValue, ()>)] = &[
    ("get_data", get_data_stage),
    ("get_pixels", get_pixels_stage),
    ("map_palette", map_palette_stage),
    ("combine_pixels", combine_pixels_stage),
];

/// Encodes images into sprite text against a default palette.
pub struct Encoder {
    pipeline: TransformPipeline<Palette, EncodeValue>,
}

impl Encoder {
    /// Build an encoder; fails if `palette` is empty.
    pub fn new(palette: Palette) -> Result<Self> {
        if palette.is_empty() {
            return Err(CodecError::MissingPalette);
        }
        let pipeline = TransformPipeline::new(palette, ENCODE_STAGES, ENCODE_PROCEDURES)?
            .with_output_cache(false)
            .with_stage_cache(false);
        Ok(Self { pipeline })
    }

    pub fn palette(&self) -> &Palette {
        self.pipeline.context()
    }

    /// Encode `image`.
    pub fn encode(&mut self, image: impl Rasterize + 'static) -> Result<EncodedSprite> {
        self.encode_shared(Rc::new(image))
    }

    /// Encode an image that is shared with other owners.
    pub fn encode_shared(&mut self, image: Rc<dyn Rasterize>) -> Result<EncodedSprite> {
        match self.pipeline.process(EncodeValue::Image(image), None, &())? {
            EncodeValue::Encoded(sprite) => {
                debug!(
                    "encoded {}x{} image into {} bytes with {} colors",
                    sprite.width,
                    sprite.height,
                    sprite.source.len(),
                    sprite.palette.len()
                );
                Ok(sprite)
            }
            _ => Err(mismatch("combine_pixels", "sprite text")),
        }
    }

    /// Encode `image`, handing the result to `on_complete` before returning it.
    pub fn encode_with<F>(&mut self, image: impl Rasterize + 'static, on_complete: F) -> Result<EncodedSprite>
    where
        F: FnOnce(&EncodedSprite),
    {
        let sprite = self.encode(image)?;
        on_complete(&sprite);
        Ok(sprite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CodecConfig;
    use crate::decode::{Decoder, Substitution};
    use crate::models::DecodeRequest;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];
    const GREEN: [u8; 4] = [35, 255, 70, 255];

    fn palette() -> Palette {
        Palette::from(vec![CLEAR, WHITE, GREEN])
    }

    fn encoder() -> Encoder {
        Encoder::new(palette()).unwrap()
    }

    #[test]
    fn test_scenario_b() {
        // Black with alpha 255 is nearest to the transparent entry
        let image = RawImage::from_pixels(4, &[WHITE, WHITE, WHITE, [0, 0, 0, 255]]);
        let sprite = encoder().encode(image).unwrap();
        assert_eq!(sprite.source, "p[1,0]0001");
        assert_eq!(sprite.palette, vec![1, 0]);
        assert_eq!(sprite.counts, BTreeMap::from([(0, 1), (1, 3)]));
        assert_eq!((sprite.width, sprite.height), (4, 1));
    }

    #[test]
    fn test_long_runs_are_compressed() {
        let mut pixels = vec![WHITE; 5];
        pixels.push(GREEN);
        let sprite = encoder().encode(RawImage::from_pixels(6, &pixels)).unwrap();
        assert_eq!(sprite.source, "p[1,2]x05,1");
    }

    #[test]
    fn test_run_threshold() {
        assert_eq!(run_threshold(1), 4);
        assert_eq!(run_threshold(2), 3);
        assert_eq!(run_threshold(3), 3);
    }

    #[test]
    fn test_wide_groups_use_lower_threshold() {
        let colors: Vec<[u8; 4]> = (0..12u8).map(|i| [i * 20, i * 20, i * 20, 255]).collect();
        let mut encoder = Encoder::new(Palette::from(colors.clone())).unwrap();
        // Eleven distinct colors need two-digit groups, then a run of four
        let mut pixels: Vec<[u8; 4]> = colors[..11].to_vec();
        pixels.extend([colors[0]; 4]);
        let sprite = encoder.encode(RawImage::from_pixels(15, &pixels)).unwrap();
        assert!(sprite.source.starts_with("p[0,1,2,3,4,5,6,7,8,9,10]0001"));
        assert!(sprite.source.ends_with("x004,"));
    }

    #[test]
    fn test_round_trip() {
        let pixels = vec![
            CLEAR, CLEAR, CLEAR, CLEAR, CLEAR, WHITE, //
            GREEN, GREEN, WHITE, WHITE, WHITE, WHITE,
        ];
        let sprite = encoder().encode(RawImage::from_pixels(6, &pixels)).unwrap();

        let mut decoder = Decoder::new(palette(), &CodecConfig::default()).unwrap();
        let image = decoder
            .decode(&sprite.source, "rt", &DecodeRequest::new(6, 2), &Substitution::identity())
            .unwrap();
        let expected: Vec<u8> = pixels.iter().flatten().copied().collect();
        assert_eq!(image.data(), expected.as_slice());
    }

    #[test]
    fn test_rgba_image_adapter() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, Rgba(GREEN));
        image.put_pixel(1, 0, Rgba(WHITE));
        let sprite = encoder().encode(image).unwrap();
        assert_eq!(sprite.source, "p[2,1]01");
    }

    #[test]
    fn test_empty_image() {
        let err = encoder().encode(RawImage::new(0, 0, Vec::new())).unwrap_err();
        assert!(matches!(err, CodecError::EmptySprite(_)));
    }

    #[test]
    fn test_short_buffer_rejected() {
        let err = encoder().encode(RawImage::new(2, 2, vec![0; 8])).unwrap_err();
        assert!(matches!(err, CodecError::DimensionMismatch { actual: 2, .. }));
    }

    #[test]
    fn test_encode_with_invokes_callback() {
        let mut seen = None;
        let sprite = encoder()
            .encode_with(RawImage::from_pixels(1, &[WHITE]), |s| seen = Some(s.source.clone()))
            .unwrap();
        assert_eq!(seen.as_deref(), Some(sprite.source.as_str()));
        assert_eq!(sprite.source, "p[1]0");
    }

    #[test]
    fn test_empty_palette_rejected() {
        assert!(matches!(Encoder::new(Palette::new()), Err(CodecError::MissingPalette)));
    }
}
