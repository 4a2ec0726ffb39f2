//! Sprite registry: name lookup, alias and filter resolution, memoized decode.

use std::rc::Rc;

use log::debug;

use crate::composite;
use crate::config::CodecConfig;
use crate::decode::Decoder;
use crate::error::{CodecError, Result};
use crate::models::{
    join_path, split_path, DecodeRequest, LibraryDesc, Sprite, SpriteSource, PATH_SEPARATOR,
};
use crate::palette::Palette;

use super::filter::FilterRegistry;
use super::library::{Library, Node};
use super::render::{Render, RenderId};

/// Owns the library tree, the filters and the decoder.
///
/// `same` and `filter` entries are resolved on first access: every slot
/// holding the command is rewritten to point at the target (or at filtered
/// clones of it) and the command entry is never consulted again. Decoded
/// sprites are memoized on the entry under `"<canonical name> <suffix>"`.
pub struct SpriteRegistry {
    library: Library,
    filters: FilterRegistry,
    decoder: Decoder,
}

impl SpriteRegistry {
    /// Build a registry; fails if `palette` is empty.
    pub fn new(
        description: &LibraryDesc,
        palette: Palette,
        filters: FilterRegistry,
        config: &CodecConfig,
    ) -> Result<Self> {
        let decoder = Decoder::new(palette, config)?;
        let library = Library::build(description);
        debug!("built sprite library with {} entries", library.render_count());
        Ok(Self { library, filters, decoder })
    }

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    /// The raw node at `name`, as the tree currently stands.
    ///
    /// Nothing is resolved, so this shows alias commands that have not been
    /// accessed yet.
    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.library.node_at(&split_path(name))
    }

    /// Whether `name` exists, following unresolved aliases without rewriting them.
    pub fn contains(&self, name: &str) -> bool {
        self.follows(split_path(name), 0)
    }

    fn follows(&self, segments: Vec<String>, depth: usize) -> bool {
        if segments.is_empty() || depth > self.library.render_count() {
            return false;
        }
        for i in 0..segments.len() {
            match self.library.node_at(&segments[..=i]) {
                None => return false,
                Some(Node::Group(_)) => continue,
                Some(Node::Entry(id)) => match &self.library.render(*id).source {
                    SpriteSource::Same { path } | SpriteSource::Filter { path, .. } => {
                        let mut redirected = split_path(path);
                        redirected.extend(segments[i + 1..].iter().cloned());
                        return self.follows(redirected, depth + 1);
                    }
                    _ => return i + 1 == segments.len(),
                },
            }
        }
        true
    }

    /// Every leaf path in the tree.
    pub fn names(&self) -> Vec<String> {
        self.library.leaf_paths()
    }

    /// Look up the entry at `name`, resolving aliases and filters on the way.
    pub fn get(&mut self, name: &str) -> Result<&Render> {
        let id = self.resolve_entry(name)?;
        Ok(self.library.render(id))
    }

    /// Decode the entry at `name`, or return the memoized result.
    pub fn decode(&mut self, name: &str, request: &DecodeRequest) -> Result<Sprite> {
        let id = self.resolve_entry(name)?;
        let render = self.library.render(id);
        let key = request.cache_key(&render.name);
        if let Some(sprite) = render.cache.get(&key) {
            return Ok(sprite.clone());
        }

        let mut chain = render.filters.clone();
        chain.extend(request.filter.iter().cloned());
        let substitution = self.filters.chain(&chain)?;
        let source = render.source.clone();

        let sprite = match source {
            SpriteSource::Literal(text) => {
                Sprite::Image(self.decoder.decode(&text, &key, request, &substitution)?)
            }
            SpriteSource::Multiple { direction, parts } => Sprite::Composite(Rc::new(
                composite::assemble(&mut self.decoder, &key, direction, &parts, request, &substitution)?,
            )),
            SpriteSource::Same { .. } | SpriteSource::Filter { .. } => {
                return Err(CodecError::NotFound(name.to_string()));
            }
        };
        if sprite.byte_len() == 0 {
            return Err(CodecError::EmptySprite(name.to_string()));
        }

        self.library.render_mut(id).cache.insert(key, sprite.clone());
        Ok(sprite)
    }

    /// Clear the decoded cache of the entry at `name`.
    pub fn reset_render(&mut self, name: &str) -> Result<()> {
        let id = self.resolve_entry(name)?;
        let render = self.library.render_mut(id);
        debug!("resetting {} cached sprites of '{}'", render.cache.len(), render.name);
        render.reset();
        Ok(())
    }

    /// Throw away the whole tree and every cache, then rebuild from `description`.
    pub fn reset_library(&mut self, description: &LibraryDesc) {
        self.library = Library::build(description);
        self.decoder.clear();
        debug!("rebuilt sprite library with {} entries", self.library.render_count());
    }

    fn resolve_entry(&mut self, name: &str) -> Result<RenderId> {
        let segments = split_path(name);
        match self.resolve_path(&segments, &mut Vec::new())? {
            Node::Entry(id) => Ok(id),
            Node::Group(_) => Err(CodecError::NotFound(name.to_string())),
        }
    }

    /// Walk `segments`, resolving every alias or filter met on the way,
    /// including one at the end.
    fn resolve_path(&mut self, segments: &[String], chain: &mut Vec<String>) -> Result<Node> {
        let name = join_path(segments);
        if segments.is_empty() {
            return Err(CodecError::NotFound(name));
        }
        for i in 0..segments.len() {
            let prefix = &segments[..=i];
            loop {
                let reference = match self.library.node_at(prefix) {
                    None => return Err(CodecError::NotFound(name)),
                    Some(Node::Entry(id)) if self.library.render(*id).source.is_reference() => *id,
                    Some(_) => break,
                };
                self.resolve_reference(reference, chain)?;
                // The slot must have been rewritten
                if self.library.node_at(prefix) == Some(&Node::Entry(reference)) {
                    return Err(CodecError::NotFound(name));
                }
            }
            let is_entry = matches!(self.library.node_at(prefix), Some(Node::Entry(_)));
            if is_entry && i + 1 < segments.len() {
                return Err(CodecError::NotFound(name));
            }
        }
        self.library.node_at(segments).cloned().ok_or(CodecError::NotFound(name))
    }

    /// Resolve the target of an alias or filter command.
    fn resolve_target(&mut self, path: &str, chain: &mut Vec<String>) -> Result<Node> {
        let segments = split_path(path);
        self.resolve_path(&segments, chain).map_err(|err| match err {
            CodecError::NotFound(missing) if missing == join_path(&segments) => {
                CodecError::AliasUnresolved {
                    alias: chain.last().cloned().unwrap_or_default(),
                    target: path.to_string(),
                }
            }
            other => other,
        })
    }

    /// Rewrite every slot holding the `same`/`filter` entry `id`.
    fn resolve_reference(&mut self, id: RenderId, chain: &mut Vec<String>) -> Result<()> {
        let render = self.library.render(id);
        let name = render.name.clone();
        if chain.contains(&name) {
            let mut cycle = chain.clone();
            cycle.push(name);
            return Err(CodecError::CircularReference { chain: cycle });
        }

        let (path, filters) = match &render.source {
            SpriteSource::Same { path } => (path.clone(), render.filters.clone()),
            SpriteSource::Filter { path, filter } => {
                let mut filters = vec![filter.clone()];
                filters.extend(render.filters.iter().cloned());
                (path.clone(), filters)
            }
            _ => return Ok(()),
        };
        for filter in &filters {
            self.filters.require(filter)?;
        }

        chain.push(name.clone());
        let target = self.resolve_target(&path, chain);
        chain.pop();
        let target = target?;

        if target.contains_entry(id) {
            let mut cycle = chain.clone();
            cycle.push(name.clone());
            cycle.push(path);
            return Err(CodecError::CircularReference { chain: cycle });
        }

        let replacement = if filters.is_empty() {
            debug!("aliasing '{}' to '{}'", name, path);
            target
        } else {
            debug!("filtering '{}' through {:?} as '{}'", path, filters, name);
            self.filtered_copy(&target, &name, &filters)
        };

        let points = std::mem::take(&mut self.library.render_mut(id).back_refs);
        self.library.splice(&points, &replacement);
        Ok(())
    }

    /// Clone every entry of `node` with `filters` appended.
    fn filtered_copy(&mut self, node: &Node, name: &str, filters: &[String]) -> Node {
        match node {
            Node::Entry(target) => {
                let clone = self.library.render(*target).filtered_clone(name, filters);
                Node::Entry(self.library.add_render(clone))
            }
            Node::Group(children) => Node::Group(
                children
                    .iter()
                    .map(|(key, child)| {
                        let child_name = format!("{}{}{}", name, PATH_SEPARATOR, key);
                        (key.clone(), self.filtered_copy(child, &child_name, filters))
                    })
                    .collect(),
            ),
        }
    }
}
