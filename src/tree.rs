// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

use crate::NodeKind;

/// Read-only capabilities of a node in a parsed element tree.
///
/// Implemented by [`Element`](crate::Element) and by adapters for
/// tree types of other libraries. Nodes are compared by identity,
/// i.e. by address, wherever a specific node needs to be located.
pub trait TreeNode: Sized + fmt::Debug {
    fn kind(&self) -> NodeKind<'_>;

    /// Iterate over all attributes in document order.
    // TODO: How to avoid boxing the result?
    fn attributes(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_>;

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes()
            .find(|(k, _)| *k == key)
            .map(|(_, value)| value)
    }

    /// Character data before the first child.
    fn text(&self) -> Option<&str>;

    /// Character data after the end of this node and before the next sibling.
    fn tail(&self) -> Option<&str>;

    /// Direct children in document order, including comments and
    /// processing instructions.
    fn children(&self) -> &[Self];

    /// The element tag, `None` for comments and processing instructions.
    fn tag(&self) -> Option<&str> {
        self.kind().name()
    }

    fn is_element(&self) -> bool {
        self.kind().is_element()
    }
}

/// Mutable capabilities of a node, needed for pruning.
///
/// Trees must not be traversed while they are modified. The borrow
/// rules already enforce this for safe code.
pub trait TreeNodeMut: TreeNode {
    fn children_mut(&mut self) -> &mut [Self];

    /// Detach all children for which `keep` returns `false`.
    ///
    /// The predicate is invoked exactly once per child in document order.
    fn retain_children(&mut self, keep: impl FnMut(&Self) -> bool);

    fn clear_children(&mut self);
}
