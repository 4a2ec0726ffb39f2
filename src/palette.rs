//! Indexed palettes, palette generation and nearest-color matching.

use std::collections::HashSet;

use image::Rgba;
use serde::{Deserialize, Serialize};

/// Fully transparent black, always the first entry of a generated palette
/// that contains transparency.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Minimum decimal width that can print every valid index of a palette
/// with `count` colors.
///
/// # Examples
///
/// ```
/// use spritecodec::palette::digit_size;
///
/// assert_eq!(digit_size(3), 1);
/// assert_eq!(digit_size(10), 1);
/// assert_eq!(digit_size(11), 2);
/// assert_eq!(digit_size(101), 3);
/// ```
pub fn digit_size(count: usize) -> usize {
    let mut largest = count.saturating_sub(1);
    let mut width = 1;
    while largest >= 10 {
        largest /= 10;
        width += 1;
    }
    width
}

/// An ordered list of RGBA colors addressed by position.
///
/// The digit size is kept in sync with the number of colors by every
/// method that changes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<[u8; 4]>", into = "Vec<[u8; 4]>")]
pub struct Palette {
    colors: Vec<Rgba<u8>>,
    digit_size: usize,
}

impl Palette {
    pub fn new() -> Self {
        Self { colors: Vec::new(), digit_size: 1 }
    }

    pub fn from_colors(colors: Vec<Rgba<u8>>) -> Self {
        let digit_size = digit_size(colors.len());
        Self { colors, digit_size }
    }

    pub fn push(&mut self, color: Rgba<u8>) {
        self.colors.push(color);
        self.digit_size = digit_size(self.colors.len());
    }

    pub fn extend(&mut self, colors: impl IntoIterator<Item = Rgba<u8>>) {
        self.colors.extend(colors);
        self.digit_size = digit_size(self.colors.len());
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Rgba<u8>> {
        self.colors.get(index).copied()
    }

    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    /// Width of one digit group addressing this palette.
    pub fn digit_size(&self) -> usize {
        self.digit_size
    }

    /// Position of an exact color match, if any.
    pub fn index_of(&self, color: Rgba<u8>) -> Option<usize> {
        self.colors.iter().position(|c| *c == color)
    }

    /// Zero-padded digit group for `index`.
    pub fn format_index(&self, index: usize) -> String {
        format!("{:0width$}", index, width = self.digit_size)
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<[u8; 4]>> for Palette {
    fn from(colors: Vec<[u8; 4]>) -> Self {
        Self::from_colors(colors.into_iter().map(Rgba).collect())
    }
}

impl From<Palette> for Vec<[u8; 4]> {
    fn from(palette: Palette) -> Self {
        palette.colors.into_iter().map(|c| c.0).collect()
    }
}

/// Build a palette from raw RGBA bytes.
///
/// Every 4-byte group is a pixel; a trailing partial group is ignored.
/// Distinct colors are split into grayscale (R = G = B), sorted by value,
/// and the remaining colors, sorted in descending R, G, B, A order. A single
/// [`TRANSPARENT`] entry leads the palette if any pixel had alpha 0 or if
/// `force_transparent_first` is set; transparent pixels contribute nothing
/// else.
///
/// # Examples
///
/// ```
/// use spritecodec::palette::generate_palette;
///
/// let raw = [255, 255, 255, 255, 35, 255, 70, 255, 9, 9, 9, 0];
/// let palette = generate_palette(&raw, false);
/// assert_eq!(palette.len(), 3);
/// assert_eq!(palette.get(0).unwrap().0, [0, 0, 0, 0]);
/// assert_eq!(palette.get(1).unwrap().0, [255, 255, 255, 255]);
/// assert_eq!(palette.get(2).unwrap().0, [35, 255, 70, 255]);
/// ```
pub fn generate_palette(raw: &[u8], force_transparent_first: bool) -> Palette {
    let mut seen: HashSet<[u8; 4]> = HashSet::new();
    let mut grays: Vec<[u8; 4]> = Vec::new();
    let mut colors: Vec<[u8; 4]> = Vec::new();
    let mut transparent = force_transparent_first;

    for chunk in raw.chunks_exact(4) {
        let pixel = [chunk[0], chunk[1], chunk[2], chunk[3]];
        if pixel[3] == 0 {
            transparent = true;
            continue;
        }
        if !seen.insert(pixel) {
            continue;
        }
        if pixel[0] == pixel[1] && pixel[1] == pixel[2] {
            grays.push(pixel);
        } else {
            colors.push(pixel);
        }
    }

    // Stable: equal gray values keep discovery order
    grays.sort_by_key(|p| p[0]);
    colors.sort_by(|a, b| b.cmp(a));

    let mut palette = Palette::new();
    if transparent {
        palette.push(TRANSPARENT);
    }
    palette.extend(grays.into_iter().chain(colors).map(Rgba));
    palette
}

/// Summed absolute per-channel difference between two colors.
pub fn color_distance(a: Rgba<u8>, b: Rgba<u8>) -> u32 {
    a.0.iter().zip(b.0.iter()).map(|(x, y)| (*x as i32 - *y as i32).unsigned_abs()).sum()
}

/// Index of the palette color closest to `pixel`.
///
/// Ties go to the lowest index. Encoded output depends on this, so it
/// must not change. Returns 0 for an empty palette.
///
/// # Examples
///
/// ```
/// use image::Rgba;
/// use spritecodec::palette::{closest_index, Palette};
///
/// let palette = Palette::from(vec![[0, 0, 0, 255], [20, 20, 20, 255]]);
/// // 10 away from both entries
/// assert_eq!(closest_index(&palette, Rgba([10, 10, 10, 255])), 0);
/// ```
pub fn closest_index(palette: &Palette, pixel: Rgba<u8>) -> usize {
    let mut best = 0;
    let mut best_distance = u32::MAX;
    for (index, color) in palette.colors().iter().enumerate() {
        let distance = color_distance(*color, pixel);
        if distance < best_distance {
            best = index;
            best_distance = distance;
            if distance == 0 {
                break;
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_palette() -> Palette {
        Palette::from(vec![[0, 0, 0, 0], [255, 255, 255, 255], [35, 255, 70, 255]])
    }

    #[test]
    fn test_digit_size_boundaries() {
        assert_eq!(digit_size(0), 1);
        assert_eq!(digit_size(1), 1);
        assert_eq!(digit_size(10), 1);
        assert_eq!(digit_size(11), 2);
        assert_eq!(digit_size(100), 2);
        assert_eq!(digit_size(1000), 3);
        assert_eq!(digit_size(1001), 4);
    }

    #[test]
    fn test_digit_size_tracks_mutation() {
        let mut palette = Palette::new();
        assert_eq!(palette.digit_size(), 1);
        palette.extend((0..10).map(|i| Rgba([i, i, i, 255])));
        assert_eq!(palette.digit_size(), 1);
        palette.push(Rgba([1, 2, 3, 255]));
        assert_eq!(palette.digit_size(), 2);
        assert_eq!(palette.format_index(3), "03");
    }

    #[test]
    fn test_generate_palette_orders_groups() {
        let raw = [
            200, 10, 10, 255, // red-ish
            90, 90, 90, 255, // gray
            10, 200, 10, 255, // green-ish
            20, 20, 20, 255, // dark gray
            200, 10, 10, 255, // duplicate
            200, 10, 20, 255, // red-ish, more blue
        ];
        let palette = generate_palette(&raw, false);
        let colors: Vec<[u8; 4]> = palette.clone().into();
        assert_eq!(
            colors,
            vec![
                [20, 20, 20, 255],
                [90, 90, 90, 255],
                [200, 10, 20, 255],
                [200, 10, 10, 255],
                [10, 200, 10, 255],
            ]
        );
    }

    #[test]
    fn test_generate_palette_transparency() {
        let raw = [1, 2, 3, 0, 4, 5, 6, 0, 7, 7, 7, 255];
        let palette = generate_palette(&raw, false);
        assert_eq!(palette.len(), 2);
        assert_eq!(palette.get(0), Some(TRANSPARENT));

        let forced = generate_palette(&[7, 7, 7, 255], true);
        assert_eq!(forced.get(0), Some(TRANSPARENT));
        assert_eq!(forced.len(), 2);

        let none = generate_palette(&[7, 7, 7, 255], false);
        assert_eq!(none.len(), 1);
    }

    #[test]
    fn test_generate_palette_ignores_partial_group() {
        let palette = generate_palette(&[7, 7, 7, 255, 1, 2], false);
        assert_eq!(palette.len(), 1);
    }

    #[test]
    fn test_closest_exact() {
        let palette = scenario_palette();
        assert_eq!(closest_index(&palette, Rgba([255, 255, 255, 255])), 1);
        assert_eq!(closest_index(&palette, Rgba([35, 255, 70, 255])), 2);
        assert_eq!(closest_index(&palette, Rgba([0, 0, 0, 0])), 0);
    }

    #[test]
    fn test_closest_nearest() {
        let palette = scenario_palette();
        assert_eq!(closest_index(&palette, Rgba([250, 250, 250, 255])), 1);
        assert_eq!(closest_index(&palette, Rgba([40, 240, 60, 255])), 2);
    }

    #[test]
    fn test_closest_tie_goes_to_lowest_index() {
        // 50 away from both index 1 and index 2
        let tied = Palette::from(vec![[200, 0, 0, 255], [100, 0, 0, 255], [0, 0, 0, 255]]);
        assert_eq!(closest_index(&tied, Rgba([50, 0, 0, 255])), 1);

        let all_tied = Palette::from(vec![[0, 0, 0, 255], [100, 0, 0, 255], [0, 100, 0, 255]]);
        assert_eq!(closest_index(&all_tied, Rgba([50, 50, 0, 255])), 0);
        let dup = Palette::from(vec![[9, 9, 9, 255], [1, 1, 1, 255], [1, 1, 1, 255]]);
        assert_eq!(closest_index(&dup, Rgba([1, 1, 1, 255])), 1);
    }

    #[test]
    fn test_closest_empty_palette() {
        assert_eq!(closest_index(&Palette::new(), Rgba([1, 2, 3, 4])), 0);
    }

    #[test]
    fn test_serde_as_quadruples() {
        let palette = scenario_palette();
        let json = serde_json::to_string(&palette).unwrap();
        assert_eq!(json, "[[0,0,0,0],[255,255,255,255],[35,255,70,255]]");
        let parsed: Palette = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, palette);
        assert_eq!(parsed.digit_size(), 1);
    }
}
