//! Render entries and the edit points that reference them.

use std::collections::HashMap;
use std::fmt;

use crate::models::{join_path, Sprite, SpriteSource};

/// Index of a [`Render`] in the library arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderId(pub(crate) usize);

/// A slot in the library tree: the group at `container` and the key inside it.
///
/// Alias and filter resolution rewrite slots only through edit points.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EditPoint {
    pub container: Vec<String>,
    pub key: String,
}

impl EditPoint {
    pub fn new(container: Vec<String>, key: impl Into<String>) -> Self {
        Self { container, key: key.into() }
    }

    /// Edit point of a slot nested `subpath` below this one.
    ///
    /// An empty `subpath` is this slot itself.
    pub fn descend(&self, subpath: &[String]) -> EditPoint {
        match subpath.split_last() {
            None => self.clone(),
            Some((key, parents)) => {
                let mut container = self.container.clone();
                container.push(self.key.clone());
                container.extend(parents.iter().cloned());
                EditPoint { container, key: key.clone() }
            }
        }
    }

    /// Full path segments of the slot.
    pub fn segments(&self) -> Vec<String> {
        let mut segments = self.container.clone();
        segments.push(self.key.clone());
        segments
    }
}

impl fmt::Display for EditPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_path(&self.segments()))
    }
}

/// A library entry: its source, attached filters and decoded cache.
#[derive(Debug, Clone)]
pub struct Render {
    pub(crate) name: String,
    pub(crate) source: SpriteSource,
    pub(crate) filters: Vec<String>,
    pub(crate) cache: HashMap<String, Sprite>,
    pub(crate) back_refs: Vec<EditPoint>,
}

impl Render {
    pub fn new(name: impl Into<String>, source: SpriteSource) -> Self {
        Self {
            name: name.into(),
            source,
            filters: Vec::new(),
            cache: HashMap::new(),
            back_refs: Vec::new(),
        }
    }

    /// Fresh copy under a new name with `filters` appended; nothing cached,
    /// nothing pointing at it yet.
    pub fn filtered_clone(&self, name: impl Into<String>, filters: &[String]) -> Self {
        let mut chain = self.filters.clone();
        chain.extend(filters.iter().cloned());
        Self {
            name: name.into(),
            source: self.source.clone(),
            filters: chain,
            cache: HashMap::new(),
            back_refs: Vec::new(),
        }
    }

    /// Canonical name, used in decoded-cache keys.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &SpriteSource {
        &self.source
    }

    /// Filters applied to every decode of this entry, in order.
    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    /// Every slot currently holding this entry.
    pub fn back_refs(&self) -> &[EditPoint] {
        &self.back_refs
    }

    pub fn cached(&self, key: &str) -> Option<&Sprite> {
        self.cache.get(key)
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every decoded sprite.
    pub fn reset(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpriteImage;
    use std::rc::Rc;

    fn segs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_descend() {
        let point = EditPoint::new(segs(&["ui"]), "panel");
        assert_eq!(point.descend(&[]), point);
        let nested = point.descend(&segs(&["frame", "top"]));
        assert_eq!(nested.container, segs(&["ui", "panel", "frame"]));
        assert_eq!(nested.key, "top");
        assert_eq!(nested.to_string(), "ui.panel.frame.top");
    }

    #[test]
    fn test_filtered_clone_is_fresh() {
        let mut render = Render::new("hero", SpriteSource::Literal("1".into()));
        render.filters.push("red".into());
        render.back_refs.push(EditPoint::new(Vec::new(), "hero"));
        render.cache.insert("hero 1x1".into(), Sprite::Image(SpriteImage::new(1, 1, Rc::from(vec![0u8; 4]))));

        let clone = render.filtered_clone("hero_blue", &["blue".to_string()]);
        assert_eq!(clone.name(), "hero_blue");
        assert_eq!(clone.filters().to_vec(), vec!["red".to_string(), "blue".to_string()]);
        assert!(clone.back_refs().is_empty());
        assert_eq!(clone.cache_len(), 0);
        assert_eq!(render.cache_len(), 1);
    }
}
