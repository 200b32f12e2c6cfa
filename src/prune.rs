// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

use crate::TreeNodeMut;

/// Remove all subtrees whose root matches the `selector`.
///
/// If `root` itself matches then all its children are removed and
/// `true` is returned. The root node is never detached, the caller
/// decides what to do with an emptied root.
///
/// Otherwise the tree is visited breadth-first per level: first all
/// matching children of a node are detached, then the remaining
/// children are visited recursively. The selector is invoked at most
/// once per node and never for nodes below a removed node. Removed
/// subtrees are dropped, callers that need them must capture them
/// in the selector.
pub fn prune<N, F>(root: &mut N, mut selector: F) -> bool
where
    N: TreeNodeMut,
    F: FnMut(&N) -> bool,
{
    if selector(root) {
        log::debug!(
            "Removing all {num_children} children of root node {kind:?}",
            num_children = root.children().len(),
            kind = root.kind(),
        );
        root.clear_children();
        return true;
    }
    prune_subtree(root, &mut selector);
    false
}

fn prune_subtree<N, F>(node: &mut N, selector: &mut F)
where
    N: TreeNodeMut,
    F: FnMut(&N) -> bool,
{
    node.retain_children(|child| {
        if selector(child) {
            log::debug!("Removing child node {kind:?}", kind = child.kind());
            return false;
        }
        true
    });
    for child in node.children_mut() {
        prune_subtree(child, selector);
    }
}
