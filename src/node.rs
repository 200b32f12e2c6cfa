// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

use crate::{TreeNode, TreeNodeMut};

/// Borrowed kind of a node.
///
/// Comments and processing instructions share the child list with
/// elements but are not real elements: path indexing skips them and
/// the comparator ignores them on request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind<'a> {
    /// Element with its (possibly Clark-qualified) tag name.
    Element(&'a str),
    Comment,
    /// Processing instruction with its target.
    ProcessingInstruction(&'a str),
}

impl<'a> NodeKind<'a> {
    /// The element tag name, `None` for comments and processing instructions.
    #[must_use]
    pub const fn name(self) -> Option<&'a str> {
        match self {
            Self::Element(name) => Some(name),
            Self::Comment | Self::ProcessingInstruction(_) => None,
        }
    }

    #[must_use]
    pub const fn is_element(self) -> bool {
        matches!(self, Self::Element(_))
    }
}

/// Owned counterpart of [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Element(String),
    Comment,
    ProcessingInstruction(String),
}

impl Tag {
    #[must_use]
    pub fn as_kind(&self) -> NodeKind<'_> {
        match self {
            Self::Element(name) => NodeKind::Element(name),
            Self::Comment => NodeKind::Comment,
            Self::ProcessingInstruction(target) => NodeKind::ProcessingInstruction(target),
        }
    }
}

/// Attributes of an element.
///
/// Keys are unique and keep their insertion order, which is the order
/// used for serialization. Equality ignores the order.
#[derive(Debug, Clone, Default, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace an attribute.
    ///
    /// A replaced attribute keeps its position. Returns the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some((_, old_value)) = self.0.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(old_value, value));
        }
        self.0.push((key, value));
        None
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        let index = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

/// Owned node of an element tree.
///
/// Modelled after the ElementTree data model: character data before the
/// first child is stored in `text`, character data following the end of
/// the node (up to the next sibling) in `tail`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: Tag,
    pub attrib: Attributes,
    pub text: Option<String>,
    pub tail: Option<String>,
    pub children: Vec<Element>,
}

impl Element {
    /// Construct an empty element.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self::with_tag(Tag::Element(tag.into()))
    }

    #[must_use]
    pub fn comment(text: impl Into<String>) -> Self {
        Self::with_tag(Tag::Comment).with_text(text)
    }

    #[must_use]
    pub fn processing_instruction(target: impl Into<String>, data: Option<String>) -> Self {
        let mut node = Self::with_tag(Tag::ProcessingInstruction(target.into()));
        node.text = data;
        node
    }

    const fn with_tag(tag: Tag) -> Self {
        Self {
            tag,
            attrib: Attributes::new(),
            text: None,
            tail: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrib.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_tail(mut self, tail: impl Into<String>) -> Self {
        self.tail = Some(tail.into());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    pub fn append(&mut self, child: Self) {
        self.children.push(child);
    }
}

impl TreeNode for Element {
    fn kind(&self) -> NodeKind<'_> {
        self.tag.as_kind()
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = (&str, &str)> + '_> {
        Box::new(self.attrib.iter())
    }

    fn attribute(&self, key: &str) -> Option<&str> {
        self.attrib.get(key)
    }

    fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    fn tail(&self) -> Option<&str> {
        self.tail.as_deref()
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

impl TreeNodeMut for Element {
    fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }

    fn retain_children(&mut self, keep: impl FnMut(&Self) -> bool) {
        self.children.retain(keep);
    }

    fn clear_children(&mut self) {
        self.children.clear();
    }
}
