// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

use crate::{
    qname::{XSI_NONS_SCHEMA_LOCATION, XSI_SCHEMA_LOCATION},
    TreeNode,
};

/// Schema location hints from the `xsi:schemaLocation` and
/// `xsi:noNamespaceSchemaLocation` attributes of a node.
///
/// Yields `(namespace, url)` pairs, first all pairs of `xsi:schemaLocation`
/// and then all URLs of `xsi:noNamespaceSchemaLocation` with an empty
/// namespace. An unpaired trailing namespace is ignored.
pub fn iter_location_hints<N: TreeNode>(node: &N) -> impl Iterator<Item = (&str, &str)> + '_ {
    let mut locations = node
        .attribute(XSI_SCHEMA_LOCATION)
        .unwrap_or_default()
        .split_whitespace();
    let pairs = std::iter::from_fn(move || Some((locations.next()?, locations.next()?)));
    let urls = node
        .attribute(XSI_NONS_SCHEMA_LOCATION)
        .unwrap_or_default()
        .split_whitespace()
        .map(|url| ("", url));
    pairs.chain(urls)
}
