//! Run-length sprite decoding.
//!
//! Sprite text is a sequence of digit groups, each naming a palette index:
//!
//! - a bare group (`3`, or `07` for a palette needing two digits) is one pixel
//! - `x<group><count>,` repeats one group `count` times
//! - `p[<i>,<i>,...]` switches to a local palette whose entries are indices
//!   into the default palette; the group width follows the local palette size
//! - a bare `p` switches back to the default palette
//!
//! Decoding runs two pipelines. The pixel pipeline (`unravel`,
//! `apply_filter`, `expand`, `get_array`) depends only on the text and the
//! filter, so it is keyed by content. The dims pipeline (`repeat_rows`,
//! `flip_dimensions`) depends on the requested size and flip and is keyed by
//! the request.

use std::cell::Cell;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use log::debug;

use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::models::{DecodeRequest, Flip, SpriteImage};
use crate::palette::{digit_size, Palette};
use crate::pipeline::{CacheKey, StageFn, StageInput, TransformPipeline};

/// Most source pixels one sprite may decode to.
pub const MAX_DECODED_PIXELS: usize = 1 << 26;

/// Stages of the content-keyed pixel pipeline, in order.
pub const DECODE_STAGES: &[&str] = &["unravel", "apply_filter", "expand", "get_array"];

/// Stages of the request-keyed dims pipeline, in order.
pub const DIMS_STAGES: &[&str] = &["repeat_rows", "flip_dimensions"];

fn content_key<T: Hash + ?Sized>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("#{:016x}", hasher.finish())
}

/// Palette substitution: default-palette index to default-palette index.
///
/// Indices without an entry map to themselves. The ids of the filters the
/// table was built from become part of cache keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    ids: Vec<String>,
    map: HashMap<u32, u32>,
}

impl Substitution {
    pub fn identity() -> Self {
        Self::default()
    }

    pub fn new(id: impl Into<String>, map: HashMap<u32, u32>) -> Self {
        Self { ids: vec![id.into()], map }
    }

    /// Filter ids joined with `+`, for display.
    pub fn tag(&self) -> String {
        self.ids.join("+")
    }

    /// Filter ids this table was composed from, in application order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Length-prefixed encoding of the id chain; distinct chains never share one.
    pub fn chain_key(&self) -> String {
        self.ids.iter().map(|id| format!("{}:{}", id.len(), id)).collect()
    }

    pub fn is_identity(&self) -> bool {
        self.map.is_empty()
    }

    pub fn apply(&self, index: u32) -> u32 {
        self.map.get(&index).copied().unwrap_or(index)
    }

    /// Substitution equivalent to applying `self`, then `next`.
    pub fn then(&self, next: &Substitution) -> Substitution {
        let mut map: HashMap<u32, u32> =
            self.map.iter().map(|(from, to)| (*from, next.apply(*to))).collect();
        for (from, to) in &next.map {
            map.entry(*from).or_insert(*to);
        }
        map.retain(|from, to| from != to);

        let ids = self.ids.iter().chain(&next.ids).cloned().collect();
        Substitution { ids, map }
    }
}

/// Value flowing through the pixel pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeValue {
    /// Sprite text
    Source(String),
    /// Default-palette indices
    Indices(Vec<u32>),
    /// RGBA bytes
    Pixels(Rc<[u8]>),
}

impl CacheKey for DecodeValue {
    fn cache_key(&self) -> String {
        match self {
            DecodeValue::Source(text) => text.clone(),
            DecodeValue::Indices(indices) => content_key(indices.as_slice()),
            DecodeValue::Pixels(bytes) => content_key(&bytes[..]),
        }
    }
}

impl DecodeValue {
    fn into_source(self, stage: &'static str) -> Result<String> {
        match self {
            DecodeValue::Source(text) => Ok(text),
            _ => Err(CodecError::StageMismatch { stage, expected: "sprite text" }),
        }
    }

    fn into_indices(self, stage: &'static str) -> Result<Vec<u32>> {
        match self {
            DecodeValue::Indices(indices) => Ok(indices),
            _ => Err(CodecError::StageMismatch { stage, expected: "palette indices" }),
        }
    }
}

/// RGBA bytes flowing through the dims pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer(pub Rc<[u8]>);

impl CacheKey for PixelBuffer {
    fn cache_key(&self) -> String {
        content_key(&self.0[..])
    }
}

/// Target size and flip for the dims pipeline, in source pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub flip: Flip,
}

/// Shared state the decode stages read.
#[derive(Debug)]
pub struct DecodeContext {
    palette: Palette,
    scale: usize,
    stage_runs: Cell<u64>,
}

impl DecodeContext {
    fn count_run(&self) {
        self.stage_runs.set(self.stage_runs.get() + 1);
    }
}

/// Read one digit group of `width` digits at `pos`, resolved through the
/// active local palette if there is one.
fn read_group(
    source: &str,
    pos: usize,
    width: usize,
    view: Option<&[u32]>,
) -> Result<(u32, usize)> {
    let bytes = source.as_bytes();
    let end = pos + width;
    if end > bytes.len() {
        return Err(CodecError::TruncatedGroup(pos));
    }
    let mut value: usize = 0;
    for (offset, byte) in bytes[pos..end].iter().enumerate() {
        if !byte.is_ascii_digit() {
            let found = source[pos + offset..].chars().next().unwrap_or('?');
            return Err(CodecError::InvalidDigit { position: pos + offset, found });
        }
        value = value * 10 + (byte - b'0') as usize;
    }
    let index = match view {
        Some(view) => *view
            .get(value)
            .ok_or(CodecError::PaletteIndex { index: value, len: view.len() })?,
        None => value as u32,
    };
    Ok((index, end))
}

fn parse_number(source: &str, start: usize, end: usize) -> Result<usize> {
    let digits = &source[start..end];
    if digits.is_empty() {
        let found = source[start..].chars().next().unwrap_or('?');
        return Err(CodecError::InvalidDigit { position: start, found });
    }
    if let Some(offset) = digits.find(|c: char| !c.is_ascii_digit()) {
        let found = digits[offset..].chars().next().unwrap_or('?');
        return Err(CodecError::InvalidDigit { position: start + offset, found });
    }
    digits
        .parse()
        .map_err(|_| CodecError::InvalidDigit { position: start, found: digits.chars().next().unwrap_or('?') })
}

/// Expand sprite text into default-palette indices.
///
/// # Examples
///
/// ```
/// use spritecodec::decode::unravel;
/// use spritecodec::palette::Palette;
///
/// let palette = Palette::from(vec![[0, 0, 0, 0], [255, 255, 255, 255], [35, 255, 70, 255]]);
/// assert_eq!(unravel("1x03,2", &palette).unwrap(), vec![1, 0, 0, 0, 2]);
/// assert_eq!(unravel("p[2,1]01", &palette).unwrap(), vec![2, 1]);
/// ```
pub fn unravel(source: &str, palette: &Palette) -> Result<Vec<u32>> {
    let bytes = source.as_bytes();
    let mut indices = Vec::with_capacity(bytes.len());
    let mut view: Option<Vec<u32>> = None;
    let mut width = palette.digit_size();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'x' => {
                let (index, count_start) = read_group(source, pos + 1, width, view.as_deref())?;
                let count_end = source[count_start..]
                    .find(',')
                    .map(|offset| count_start + offset)
                    .ok_or(CodecError::UnterminatedRun(pos))?;
                let count = parse_number(source, count_start, count_end)?;
                if count > MAX_DECODED_PIXELS.saturating_sub(indices.len()) {
                    return Err(CodecError::RunTooLong { position: pos, count, limit: MAX_DECODED_PIXELS });
                }
                indices.extend(std::iter::repeat(index).take(count));
                pos = count_end + 1;
            }
            b'p' if bytes.get(pos + 1) == Some(&b'[') => {
                let list_start = pos + 2;
                let list_end = source[list_start..]
                    .find(']')
                    .map(|offset| list_start + offset)
                    .ok_or(CodecError::UnterminatedPalette(pos))?;
                let mut local = Vec::new();
                let mut item_start = list_start;
                if list_end > list_start {
                    for item in source[list_start..list_end].split(',') {
                        let item_end = item_start + item.len();
                        let index = parse_number(source, item_start, item_end)?;
                        if index >= palette.len() {
                            return Err(CodecError::PaletteIndex { index, len: palette.len() });
                        }
                        local.push(index as u32);
                        item_start = item_end + 1;
                    }
                }
                width = digit_size(local.len());
                view = Some(local);
                pos = list_end + 1;
            }
            b'p' => {
                view = None;
                width = palette.digit_size();
                pos += 1;
            }
            _ => {
                let (index, next) = read_group(source, pos, width, view.as_deref())?;
                indices.push(index);
                pos = next;
            }
        }
    }

    Ok(indices)
}

fn unravel_stage(
    value: DecodeValue,
    input: &StageInput<'_, DecodeContext, Substitution>,
) -> Result<DecodeValue> {
    input.context.count_run();
    let source = value.into_source("unravel")?;
    Ok(DecodeValue::Indices(unravel(&source, &input.context.palette)?))
}

fn apply_filter_stage(
    value: DecodeValue,
    input: &StageInput<'_, DecodeContext, Substitution>,
) -> Result<DecodeValue> {
    input.context.count_run();
    let mut indices = value.into_indices("apply_filter")?;
    if !input.extra.is_identity() {
        for index in indices.iter_mut() {
            *index = input.extra.apply(*index);
        }
    }
    Ok(DecodeValue::Indices(indices))
}

fn expand_stage(
    value: DecodeValue,
    input: &StageInput<'_, DecodeContext, Substitution>,
) -> Result<DecodeValue> {
    input.context.count_run();
    let indices = value.into_indices("expand")?;
    let scale = input.context.scale;
    if scale == 1 {
        return Ok(DecodeValue::Indices(indices));
    }
    let mut expanded = Vec::with_capacity(indices.len() * scale);
    for index in indices {
        expanded.extend(std::iter::repeat(index).take(scale));
    }
    Ok(DecodeValue::Indices(expanded))
}

fn get_array_stage(
    value: DecodeValue,
    input: &StageInput<'_, DecodeContext, Substitution>,
) -> Result<DecodeValue> {
    input.context.count_run();
    let indices = value.into_indices("get_array")?;
    let palette = &input.context.palette;
    let mut bytes = Vec::with_capacity(indices.len() * 4);
    for index in indices {
        let color = palette
            .get(index as usize)
            .ok_or(CodecError::PaletteIndex { index: index as usize, len: palette.len() })?;
        bytes.extend_from_slice(&color.0);
    }
    Ok(DecodeValue::Pixels(Rc::from(bytes)))
}

const DECODE_PROCEDURES: &[(&str, StageFn<DecodeContext, DecodeValue, Substitution>)] = &[
    ("unravel", unravel_stage),
    ("apply_filter", apply_filter_stage),
    ("expand", expand_stage),
    ("get_array", get_array_stage),
];

fn check_dimensions(buffer: &[u8], dims: &Dimensions, scale: usize, key: &str) -> Result<usize> {
    let mismatch = || CodecError::DimensionMismatch {
        key: key.to_string(),
        expected: format!("{}x{} at scale {}", dims.width, dims.height, scale),
        actual: buffer.len() / (4 * scale.max(1)),
    };
    let row_bytes = (dims.width as usize)
        .checked_mul(scale)
        .and_then(|bytes| bytes.checked_mul(4))
        .ok_or_else(mismatch)?;
    let total = row_bytes.checked_mul(dims.height as usize).ok_or_else(mismatch)?;
    if total != buffer.len() {
        return Err(mismatch());
    }
    Ok(row_bytes)
}

fn repeat_rows_stage(
    value: PixelBuffer,
    input: &StageInput<'_, usize, Dimensions>,
) -> Result<PixelBuffer> {
    let scale = *input.context;
    let row_bytes = check_dimensions(&value.0, input.extra, scale, input.key)?;
    if scale == 1 || row_bytes == 0 {
        return Ok(value);
    }
    let mut out = Vec::with_capacity(value.0.len() * scale);
    for row in value.0.chunks_exact(row_bytes) {
        for _ in 0..scale {
            out.extend_from_slice(row);
        }
    }
    Ok(PixelBuffer(Rc::from(out)))
}

fn flip_dimensions_stage(
    value: PixelBuffer,
    input: &StageInput<'_, usize, Dimensions>,
) -> Result<PixelBuffer> {
    let row_bytes = input.extra.width as usize * *input.context * 4;
    if row_bytes == 0 || value.0.is_empty() {
        return Ok(value);
    }
    let flipped: Vec<u8> = match input.extra.flip {
        Flip::None => return Ok(value),
        Flip::Horizontal => value
            .0
            .chunks_exact(row_bytes)
            .flat_map(|row| row.chunks_exact(4).rev().flatten())
            .copied()
            .collect(),
        Flip::Vertical => value.0.chunks_exact(row_bytes).rev().flatten().copied().collect(),
        Flip::Both => value.0.chunks_exact(4).rev().flatten().copied().collect(),
    };
    Ok(PixelBuffer(Rc::from(flipped)))
}

const DIMS_PROCEDURES: &[(&str, StageFn<usize, PixelBuffer, Dimensions>)] =
    &[("repeat_rows", repeat_rows_stage), ("flip_dimensions", flip_dimensions_stage)];

/// Fill a zero request dimension from the decoded pixel count.
///
/// With both dimensions zero the sprite is one row. A count the given side
/// does not divide is left for the dims pipeline to reject.
fn infer_dimensions(request: &DecodeRequest, count: usize) -> (u32, u32) {
    let count_u32 = u32::try_from(count).unwrap_or(u32::MAX);
    match (request.width, request.height) {
        (0, 0) => (count_u32, 1),
        (0, height) if count % height as usize == 0 => (count_u32 / height, height),
        (width, 0) if count % width as usize == 0 => (width, count_u32 / width),
        dims => dims,
    }
}

/// Decodes sprite text into RGBA images against a default palette.
pub struct Decoder {
    pixels: TransformPipeline<DecodeContext, DecodeValue, Substitution>,
    dims: TransformPipeline<usize, PixelBuffer, Dimensions>,
}

impl Decoder {
    /// Build a decoder; fails if `palette` is empty.
    pub fn new(palette: Palette, config: &CodecConfig) -> Result<Self> {
        if palette.is_empty() {
            return Err(CodecError::MissingPalette);
        }
        let scale = config.scale.max(1) as usize;
        let context = DecodeContext { palette, scale, stage_runs: Cell::new(0) };
        let pixels = TransformPipeline::new(context, DECODE_STAGES, DECODE_PROCEDURES)?
            .with_output_cache(config.cache_output)
            .with_stage_cache(config.cache_stages);
        let dims = TransformPipeline::new(scale, DIMS_STAGES, DIMS_PROCEDURES)?
            .with_output_cache(config.cache_output)
            .with_stage_cache(config.cache_stages);
        Ok(Self { pixels, dims })
    }

    pub fn palette(&self) -> &Palette {
        &self.pixels.context().palette
    }

    pub fn scale(&self) -> usize {
        self.pixels.context().scale
    }

    /// Number of pixel-pipeline stage executions so far.
    pub fn stage_runs(&self) -> u64 {
        self.pixels.context().stage_runs.get()
    }

    /// Content key of the pixel pipeline for `source` under `substitution`.
    pub fn pixel_key(source: &str, substitution: &Substitution) -> String {
        if substitution.ids().is_empty() {
            source.to_string()
        } else {
            format!("@{}|{}", substitution.chain_key(), source)
        }
    }

    /// Run the pixel pipeline: text to horizontally scaled RGBA rows.
    pub fn decode_pixels(&mut self, source: &str, substitution: &Substitution) -> Result<Rc<[u8]>> {
        let key = Self::pixel_key(source, substitution);
        match self.pixels.process(DecodeValue::Source(source.to_string()), Some(&key), substitution)? {
            DecodeValue::Pixels(bytes) => Ok(bytes),
            _ => Err(CodecError::StageMismatch { stage: "get_array", expected: "RGBA output" }),
        }
    }

    /// All intermediate outputs of the pixel pipeline, by stage name.
    pub fn decode_stages(
        &mut self,
        source: &str,
        substitution: &Substitution,
    ) -> Result<HashMap<&'static str, DecodeValue>> {
        let key = Self::pixel_key(source, substitution);
        self.pixels.process_full(DecodeValue::Source(source.to_string()), Some(&key), substitution)
    }

    /// Number of source pixels in a pixel-pipeline output.
    pub fn source_pixel_count(&self, pixels: &[u8]) -> usize {
        pixels.len() / 4 / self.scale()
    }

    /// Run the dims pipeline: scale rows and apply the flip.
    pub fn fit(&mut self, pixels: Rc<[u8]>, key: &str, dims: Dimensions) -> Result<SpriteImage> {
        let scale = self.scale() as u32;
        let actual = self.source_pixel_count(&pixels);
        let scaled = |side: u32| {
            side.checked_mul(scale).ok_or_else(|| CodecError::DimensionMismatch {
                key: key.to_string(),
                expected: format!("{}x{} at scale {}", dims.width, dims.height, scale),
                actual,
            })
        };
        let (width, height) = (scaled(dims.width)?, scaled(dims.height)?);
        let PixelBuffer(data) = self.dims.process(PixelBuffer(pixels), Some(key), &dims)?;
        Ok(SpriteImage::new(width, height, data))
    }

    /// Decode `source` for `request`, caching under `key`.
    ///
    /// The request's filter id is not looked up here; pass the resolved
    /// table as `substitution`.
    pub fn decode(
        &mut self,
        source: &str,
        key: &str,
        request: &DecodeRequest,
        substitution: &Substitution,
    ) -> Result<SpriteImage> {
        let pixels = self.decode_pixels(source, substitution)?;
        let (width, height) = infer_dimensions(request, self.source_pixel_count(&pixels));
        self.fit(pixels, key, Dimensions { width, height, flip: request.flip })
    }

    /// Drop every cached pipeline output.
    pub fn clear(&mut self) {
        debug!(
            "clearing decoder caches ({} pixel, {} dims entries)",
            self.pixels.len(),
            self.dims.len()
        );
        self.pixels.clear();
        self.dims.clear();
    }
}
