// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

//! Utilities for parsed XML element trees.
//!
//! Serialize trees with a normalized indentation, address nodes by
//! unambiguous paths, compare trees with configurable strictness,
//! and prune subtrees.

mod compare;
pub use self::compare::{assert_elements_equal, CompareOptions, Mismatch, MismatchKind};

mod location;
pub use self::location::iter_location_hints;

mod node;
pub use self::node::{Attributes, Element, NodeKind, Tag};

mod path;
pub use self::path::{IterPaths, PathIndexer};

mod prune;
pub use self::prune::prune;

pub mod qname;

mod serialize;
pub use self::serialize::{
    serialize, serialize_with, Method, RawSerializer, SerializeError, SerializeOptions, XmlWriter,
};

mod tree;
pub use self::tree::{TreeNode, TreeNodeMut};

#[cfg(feature = "im")]
type HashMap<K, V> = im::HashMap<K, V>;

#[cfg(not(feature = "im"))]
type HashMap<K, V> = std::collections::HashMap<K, V>;

/// Mapping from namespace prefix to URI.
///
/// The empty prefix denotes the default namespace.
#[cfg(feature = "im")]
pub type NamespaceMap = im::HashMap<String, String>;

/// Mapping from namespace prefix to URI.
///
/// The empty prefix denotes the default namespace.
#[cfg(not(feature = "im"))]
pub type NamespaceMap = std::collections::HashMap<String, String>;
