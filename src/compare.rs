// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    qname::{namespace, qname},
    NodeKind, TreeNode,
};

/// Strictness of [`assert_elements_equal()`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompareOptions {
    /// Require exact equality of tags, attributes, texts and tails.
    ///
    /// Otherwise surrounding whitespace and the formatting of numbers
    /// are ignored and unqualified tags inherit the current namespace.
    pub strict: bool,

    /// Ignore comments and processing instructions.
    pub skip_comments: bool,

    /// Compare the children of each node sorted by tag.
    pub unordered: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            strict: true,
            skip_comments: true,
            unordered: false,
        }
    }
}

/// Classification of the first difference between two trees.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MismatchKind {
    #[display(fmt = "tags differ")]
    Tag,
    #[display(fmt = "attributes differ")]
    Attributes,
    #[display(fmt = "attribute keys differ")]
    AttributeKeys,
    #[display(fmt = "attribute {:?} differs", _0)]
    AttributeValue(String),
    #[display(fmt = "children number differ")]
    ChildrenCount,
    #[display(fmt = "texts differ")]
    Text,
    #[display(fmt = "tails differ")]
    Tail,
    #[display(fmt = "more children")]
    MoreChildren,
    #[display(fmt = "fewer children")]
    FewerChildren,
}

/// The first difference found while comparing two trees.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Mismatch<'a, N>
where
    N: TreeNode,
{
    /// The node of the left tree.
    pub left: &'a N,

    /// The node of the right tree.
    pub right: &'a N,

    pub kind: MismatchKind,

    /// Human-readable description.
    pub message: String,
}

impl<'a, N> Mismatch<'a, N>
where
    N: TreeNode,
{
    fn new(left: &'a N, right: &'a N, kind: MismatchKind, details: &str) -> Self {
        let message = match kind {
            MismatchKind::MoreChildren | MismatchKind::FewerChildren => format!(
                "Node {} has {kind} than {}.",
                describe(left),
                describe(right)
            ),
            _ => format!(
                "{} != {}: {kind}{details}.",
                describe(left),
                describe(right)
            ),
        };
        log::debug!("{message}");
        Self {
            left,
            right,
            kind,
            message,
        }
    }
}

fn describe<N: TreeNode>(node: &N) -> String {
    match node.kind() {
        NodeKind::Element(tag) => format!("<Element {tag:?}>"),
        NodeKind::Comment => "<Comment>".to_owned(),
        NodeKind::ProcessingInstruction(target) => format!("<ProcessingInstruction {target:?}>"),
    }
}

/// Check that two trees are equal.
///
/// Walks both trees synchronously in depth-first order and stops at the
/// first difference. The tags of `left` and `right` themselves are always
/// compared exactly. The `left` tree is the reference for namespaces:
/// in non-strict mode an unqualified tag is qualified with the namespace
/// of the most recently visited qualified tag of the left tree.
pub fn assert_elements_equal<'a, N: TreeNode>(
    left: &'a N,
    right: &'a N,
    options: &CompareOptions,
) -> Result<(), Mismatch<'a, N>> {
    Comparator { options: *options }
        .compare(left, right, "", true)
        .map(|_namespace| ())
}

#[derive(Debug)]
struct Comparator {
    options: CompareOptions,
}

impl Comparator {
    /// Compare a pair of nodes including their subtrees.
    ///
    /// Returns the current namespace after visiting the subtree.
    fn compare<'a, N: TreeNode>(
        &self,
        left: &'a N,
        right: &'a N,
        namespace: &'a str,
        top_level: bool,
    ) -> Result<&'a str, Mismatch<'a, N>> {
        let namespace = self.compare_tags(left, right, namespace, top_level)?;
        self.compare_attributes(left, right)?;
        self.compare_children_count(left, right)?;
        self.compare_texts(left, right)?;
        self.compare_tails(left, right)?;
        self.compare_children(left, right, namespace)
    }

    fn compare_tags<'a, N: TreeNode>(
        &self,
        left: &'a N,
        right: &'a N,
        current_namespace: &'a str,
        top_level: bool,
    ) -> Result<&'a str, Mismatch<'a, N>> {
        let (equal, next_namespace) = match (left.kind(), right.kind()) {
            (NodeKind::Element(left_tag), NodeKind::Element(right_tag)) => {
                let next_namespace = match namespace(left_tag) {
                    "" => current_namespace,
                    left_namespace => left_namespace,
                };
                let equal = if self.options.strict || top_level {
                    left_tag == right_tag
                } else {
                    qname(next_namespace, left_tag) == qname(next_namespace, right_tag)
                };
                (equal, next_namespace)
            }
            (left_kind, right_kind) => (left_kind == right_kind, current_namespace),
        };
        if !equal {
            return Err(Mismatch::new(left, right, MismatchKind::Tag, ""));
        }
        if self.options.strict {
            return Ok(current_namespace);
        }
        Ok(next_namespace)
    }

    fn compare_attributes<'a, N: TreeNode>(
        &self,
        left: &'a N,
        right: &'a N,
    ) -> Result<(), Mismatch<'a, N>> {
        let left_attributes = left.attributes().collect::<BTreeMap<_, _>>();
        let right_attributes = right.attributes().collect::<BTreeMap<_, _>>();
        if left_attributes == right_attributes {
            return Ok(());
        }
        if self.options.strict {
            return Err(Mismatch::new(
                left,
                right,
                MismatchKind::Attributes,
                &format!(": {left_attributes:?} != {right_attributes:?}"),
            ));
        }
        if !left_attributes.keys().eq(right_attributes.keys()) {
            return Err(Mismatch::new(
                left,
                right,
                MismatchKind::AttributeKeys,
                &format!(
                    ": {:?} != {:?}",
                    left_attributes.keys().collect::<Vec<_>>(),
                    right_attributes.keys().collect::<Vec<_>>()
                ),
            ));
        }
        let values = left_attributes.iter().zip(right_attributes.values());
        for ((key, left_value), right_value) in values {
            let (left_value, right_value) = (left_value.trim(), right_value.trim());
            if left_value != right_value && !numbers_equal(left_value, right_value) {
                return Err(Mismatch::new(
                    left,
                    right,
                    MismatchKind::AttributeValue((*key).to_owned()),
                    &format!(": {left_value:?} != {right_value:?}"),
                ));
            }
        }
        Ok(())
    }

    fn compare_children_count<'a, N: TreeNode>(
        &self,
        left: &'a N,
        right: &'a N,
    ) -> Result<(), Mismatch<'a, N>> {
        let left_count = self.children_count(left);
        let right_count = self.children_count(right);
        if left_count != right_count {
            return Err(Mismatch::new(
                left,
                right,
                MismatchKind::ChildrenCount,
                &format!(": {left_count} != {right_count}"),
            ));
        }
        Ok(())
    }

    fn compare_texts<'a, N: TreeNode>(
        &self,
        left: &'a N,
        right: &'a N,
    ) -> Result<(), Mismatch<'a, N>> {
        let (left_text, right_text) = (left.text(), right.text());
        if left_text == right_text {
            return Ok(());
        }
        let equal = !self.options.strict
            && match (left_text, right_text) {
                (Some(text), None) | (None, Some(text)) => text.trim().is_empty(),
                (Some(left_text), Some(right_text)) => {
                    left_text.split_whitespace().eq(right_text.split_whitespace())
                        || numbers_equal(left_text.trim(), right_text.trim())
                }
                (None, None) => true,
            };
        if !equal {
            return Err(Mismatch::new(
                left,
                right,
                MismatchKind::Text,
                &format!(": {left_text:?} != {right_text:?}"),
            ));
        }
        Ok(())
    }

    fn compare_tails<'a, N: TreeNode>(
        &self,
        left: &'a N,
        right: &'a N,
    ) -> Result<(), Mismatch<'a, N>> {
        let (left_tail, right_tail) = (left.tail(), right.tail());
        if left_tail == right_tail {
            return Ok(());
        }
        let equal = !self.options.strict
            && match (left_tail, right_tail) {
                (Some(tail), None) | (None, Some(tail)) => tail.trim().is_empty(),
                (Some(left_tail), Some(right_tail)) => left_tail.trim() == right_tail.trim(),
                (None, None) => true,
            };
        if !equal {
            return Err(Mismatch::new(
                left,
                right,
                MismatchKind::Tail,
                &format!(": {left_tail:?} != {right_tail:?}"),
            ));
        }
        Ok(())
    }

    fn compare_children<'a, N: TreeNode>(
        &self,
        left: &'a N,
        right: &'a N,
        mut namespace: &'a str,
    ) -> Result<&'a str, Mismatch<'a, N>> {
        let mut right_children = self.children(right).into_iter();
        for left_child in self.children(left) {
            let Some(right_child) = right_children.next() else {
                return Err(Mismatch::new(left, right, MismatchKind::MoreChildren, ""));
            };
            namespace = self.compare(left_child, right_child, namespace, false)?;
        }
        if right_children.next().is_some() {
            return Err(Mismatch::new(left, right, MismatchKind::FewerChildren, ""));
        }
        Ok(namespace)
    }

    /// The children to be paired, in pairing order.
    fn children<'a, N: TreeNode>(&self, node: &'a N) -> Vec<&'a N> {
        let mut children = node
            .children()
            .iter()
            .filter(|child| !self.options.skip_comments || child.is_element())
            .collect::<Vec<_>>();
        if self.options.unordered {
            // Stable sort, comments and processing instructions first
            children.sort_by(|lhs, rhs| {
                lhs.tag()
                    .unwrap_or_default()
                    .cmp(rhs.tag().unwrap_or_default())
            });
        }
        children
    }

    fn children_count<N: TreeNode>(&self, node: &N) -> usize {
        if self.options.skip_comments {
            node.children()
                .iter()
                .filter(|child| child.is_element())
                .count()
        } else {
            node.children().len()
        }
    }
}

#[allow(clippy::float_cmp)] // exact comparison of the parsed values
fn numbers_equal(left: &str, right: &str) -> bool {
    match (left.parse::<f64>(), right.parse::<f64>()) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}
