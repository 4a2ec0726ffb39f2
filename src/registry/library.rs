//! The library tree: an arena of renders plus the nested namespace over it.

use std::collections::BTreeMap;

use log::warn;

use crate::models::{join_path, LibraryDesc};

use super::render::{EditPoint, Render, RenderId};

/// A slot in the library tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Group(BTreeMap<String, Node>),
    Entry(RenderId),
}

impl Node {
    pub fn as_entry(&self) -> Option<RenderId> {
        match self {
            Node::Entry(id) => Some(*id),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, Node>> {
        match self {
            Node::Group(children) => Some(children),
            Node::Entry(_) => None,
        }
    }

    /// Every entry below this node with its path relative to the node.
    pub fn leaves(&self) -> Vec<(Vec<String>, RenderId)> {
        let mut out = Vec::new();
        collect_leaves(self, &mut Vec::new(), &mut out);
        out
    }

    /// Whether `id` occurs anywhere at or below this node.
    pub fn contains_entry(&self, id: RenderId) -> bool {
        match self {
            Node::Entry(entry) => *entry == id,
            Node::Group(children) => children.values().any(|child| child.contains_entry(id)),
        }
    }
}

fn collect_leaves(node: &Node, prefix: &mut Vec<String>, out: &mut Vec<(Vec<String>, RenderId)>) {
    match node {
        Node::Entry(id) => out.push((prefix.clone(), *id)),
        Node::Group(children) => {
            for (key, child) in children {
                prefix.push(key.clone());
                collect_leaves(child, prefix, out);
                prefix.pop();
            }
        }
    }
}

/// Renders owned by index, and the tree of slots naming them.
#[derive(Debug, Clone, Default)]
pub struct Library {
    renders: Vec<Render>,
    root: BTreeMap<String, Node>,
}

impl Library {
    /// Build a library with one render per description leaf.
    pub fn build(description: &LibraryDesc) -> Self {
        let mut library = Library::default();
        match description {
            LibraryDesc::Group(children) => {
                library.root = library.build_group(children, &[]);
            }
            LibraryDesc::Source(_) => {
                warn!("library description root is a single sprite, expected a mapping");
            }
        }
        library
    }

    fn build_group(
        &mut self,
        children: &BTreeMap<String, LibraryDesc>,
        container: &[String],
    ) -> BTreeMap<String, Node> {
        let mut group = BTreeMap::new();
        for (key, child) in children {
            let node = match child {
                LibraryDesc::Group(grandchildren) => {
                    let mut path = container.to_vec();
                    path.push(key.clone());
                    Node::Group(self.build_group(grandchildren, &path))
                }
                LibraryDesc::Source(source) => {
                    let point = EditPoint::new(container.to_vec(), key.clone());
                    let mut render = Render::new(point.to_string(), source.clone());
                    render.back_refs.push(point);
                    Node::Entry(self.add_render(render))
                }
            };
            group.insert(key.clone(), node);
        }
        group
    }

    /// Take ownership of a render, returning its id.
    pub fn add_render(&mut self, render: Render) -> RenderId {
        self.renders.push(render);
        RenderId(self.renders.len() - 1)
    }

    pub fn render(&self, id: RenderId) -> &Render {
        &self.renders[id.0]
    }

    pub fn render_mut(&mut self, id: RenderId) -> &mut Render {
        &mut self.renders[id.0]
    }

    /// Number of renders in the arena, including ones no slot points at.
    pub fn render_count(&self) -> usize {
        self.renders.len()
    }

    pub fn root(&self) -> &BTreeMap<String, Node> {
        &self.root
    }

    /// The node at `segments`, without resolving anything on the way.
    pub fn node_at(&self, segments: &[String]) -> Option<&Node> {
        let (first, rest) = segments.split_first()?;
        let mut node = self.root.get(first)?;
        for segment in rest {
            node = node.as_group()?.get(segment)?;
        }
        Some(node)
    }

    fn slot_mut(&mut self, point: &EditPoint) -> Option<&mut Node> {
        let mut group = &mut self.root;
        for segment in &point.container {
            group = match group.get_mut(segment)? {
                Node::Group(children) => children,
                Node::Entry(_) => return None,
            };
        }
        group.get_mut(&point.key)
    }

    /// Put `replacement` in every slot of `points` and record the new
    /// back-references of the entries it contains.
    pub fn splice(&mut self, points: &[EditPoint], replacement: &Node) {
        let leaves = replacement.leaves();
        for point in points {
            match self.slot_mut(point) {
                Some(slot) => *slot = replacement.clone(),
                None => {
                    warn!("stale edit point '{}' skipped", point);
                    continue;
                }
            }
            for (subpath, id) in &leaves {
                self.render_mut(*id).back_refs.push(point.descend(subpath));
            }
        }
    }

    /// Every leaf path in the tree, sorted.
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        for (key, node) in &self.root {
            collect_leaves(node, &mut vec![key.clone()], &mut out);
        }
        out.into_iter().map(|(path, _)| join_path(&path)).collect()
    }
}
