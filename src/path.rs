// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

use std::{borrow::Cow, ptr};

use crate::{qname::prefixed_qname, HashMap, NamespaceMap, TreeNode};

const WILDCARD: &str = "*";

/// Addresses nodes of a tree by paths of `/`-separated tag names.
///
/// With `add_position` enabled, children whose tag occurs more than
/// once among their siblings get a 1-based `[n]` suffix. Unique tags
/// never get a suffix.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathIndexer<'a> {
    /// Display tags as `prefix:local` instead of `{uri}local`.
    pub namespaces: Option<&'a NamespaceMap>,

    /// Disambiguate repeated sibling tags by their position.
    pub add_position: bool,
}

impl<'a> PathIndexer<'a> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            namespaces: None,
            add_position: false,
        }
    }

    #[must_use]
    pub const fn with_namespaces(mut self, namespaces: &'a NamespaceMap) -> Self {
        self.namespaces = Some(namespaces);
        self
    }

    #[must_use]
    pub const fn with_positions(mut self) -> Self {
        self.add_position = true;
        self
    }

    /// Iterate over `node` and all its descendants together with their paths.
    ///
    /// Traverses the subtree in depth-first pre-order, starting with
    /// `node` at `path`. Only nodes matching `tag` are returned, `None`
    /// or `"*"` match all nodes. Comments and processing instructions
    /// below `node` are skipped.
    ///
    /// A base path of `"/"` yields `/child` and an empty base path yields
    /// `child` for the children of `node`.
    pub fn iter<'n, N: TreeNode>(
        &self,
        node: &'n N,
        tag: Option<&'n str>,
        path: &str,
    ) -> IterPaths<'n, N>
    where
        'a: 'n,
    {
        IterPaths {
            tag: tag.filter(|tag| *tag != WILDCARD),
            namespaces: self.namespaces,
            add_position: self.add_position,
            pending: vec![(node, path.to_owned())],
        }
    }

    /// The path from `root` to its descendant `node`.
    ///
    /// The path starts with `.` if `relative` and with the tag of `root`
    /// otherwise. Returns `None` if `node` is not contained in the
    /// subtree of `root`.
    #[must_use]
    pub fn find<N: TreeNode>(&self, node: &N, root: &N, relative: bool) -> Option<String> {
        let base_path = self.base_path(root, relative);
        let path = self
            .iter(root, node.tag(), &base_path)
            .find(|(candidate, _)| ptr::eq(*candidate, node))
            .map(|(_, path)| path);
        log::trace!("Found path {path:?} from {base_path:?}");
        path
    }

    /// The path from `root` to the parent of its descendant `node`.
    ///
    /// Returns `None` if `node` is not contained in the subtree of `root`
    /// or if `node` is `root` itself.
    #[must_use]
    pub fn find_parent<N: TreeNode>(&self, node: &N, root: &N, relative: bool) -> Option<String> {
        let base_path = self.base_path(root, relative);
        if is_child(root, node) {
            return Some(base_path);
        }
        let path = self
            .iter(root, None, &base_path)
            .find(|(candidate, _)| is_child(*candidate, node))
            .map(|(_, path)| path);
        log::trace!("Found parent path {path:?} from {base_path:?}");
        path
    }

    fn base_path<N: TreeNode>(&self, root: &N, relative: bool) -> String {
        if relative {
            return ".".to_owned();
        }
        let tag = root.tag().unwrap_or_default();
        match self.namespaces {
            Some(namespaces) if !namespaces.is_empty() => {
                format!("/{}", prefixed_qname(tag, namespaces))
            }
            _ => format!("/{tag}"),
        }
    }
}

fn is_child<N: TreeNode>(parent: &N, node: &N) -> bool {
    parent.children().iter().any(|child| ptr::eq(child, node))
}

/// Lazy depth-first iterator over nodes and their paths.
///
/// Created by [`PathIndexer::iter()`].
#[derive(Debug)]
pub struct IterPaths<'a, N> {
    tag: Option<&'a str>,
    namespaces: Option<&'a NamespaceMap>,
    add_position: bool,
    // Stack of nodes that have not been visited yet, the next node is on top.
    pending: Vec<(&'a N, String)>,
}

impl<'a, N: TreeNode> IterPaths<'a, N> {
    fn push_children(&mut self, parent: &'a N, parent_path: &str) {
        let children = parent.children();
        let mut positions = HashMap::<&str, usize>::new();
        if self.add_position {
            let mut counts = HashMap::<&str, usize>::new();
            for tag in children.iter().filter_map(TreeNode::tag) {
                *counts.entry(tag).or_insert(0) += 1;
            }
            positions.extend(
                counts
                    .into_iter()
                    .filter(|(_, count)| *count > 1)
                    .map(|(tag, _)| (tag, 1_usize)),
            );
        }
        let first_pending = self.pending.len();
        for child in children {
            let Some(tag) = child.tag() else {
                continue;
            };
            let name = match self.namespaces {
                Some(namespaces) => prefixed_qname(tag, namespaces),
                None => Cow::Borrowed(tag),
            };
            let mut child_path = if parent_path == "/" {
                format!("/{name}")
            } else if parent_path.is_empty() {
                name.into_owned()
            } else {
                format!("{parent_path}/{name}")
            };
            if let Some(position) = positions.get_mut(tag) {
                child_path = format!("{child_path}[{position}]");
                *position += 1;
            }
            self.pending.push((child, child_path));
        }
        // Visit the children in document order
        self.pending[first_pending..].reverse();
    }

    fn matches(&self, node: &N) -> bool {
        self.tag.map_or(true, |tag| node.tag() == Some(tag))
    }
}

impl<'a, N: TreeNode> Iterator for IterPaths<'a, N> {
    type Item = (&'a N, String);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, path) = self.pending.pop()?;
            self.push_children(node, &path);
            if self.matches(node) {
                return Some((node, path));
            }
        }
    }
}
