// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

//! Helpers for qualified names in Clark notation, i.e. `{uri}local`.

use std::borrow::Cow;

use crate::NamespaceMap;

pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

pub const XSD_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub const XSI_SCHEMA_LOCATION: &str =
    "{http://www.w3.org/2001/XMLSchema-instance}schemaLocation";

pub const XSI_NONS_SCHEMA_LOCATION: &str =
    "{http://www.w3.org/2001/XMLSchema-instance}noNamespaceSchemaLocation";

fn split_clark(qname: &str) -> Option<(&str, &str)> {
    qname.strip_prefix('{')?.split_once('}')
}

/// The namespace URI of a qualified name, empty if unqualified.
#[must_use]
pub fn namespace(qname: &str) -> &str {
    split_clark(qname).map_or("", |(uri, _)| uri)
}

/// The local part of either a qualified or a prefixed name.
#[must_use]
pub fn local_name(qname: &str) -> &str {
    if let Some((_, local_name)) = split_clark(qname) {
        return local_name;
    }
    qname
        .split_once(':')
        .map_or(qname, |(_, local_name)| local_name)
}

/// Qualify `name` with the namespace `uri`.
///
/// Names that are empty, already qualified or look like a path
/// expression are returned unchanged, as are all names for an
/// empty `uri`.
#[must_use]
pub fn qname<'a>(uri: &str, name: &'a str) -> Cow<'a, str> {
    if uri.is_empty() || name.is_empty() || name.starts_with(['{', '.', '/', '[']) {
        return Cow::Borrowed(name);
    }
    Cow::Owned(format!("{{{uri}}}{name}"))
}

/// Convert a qualified name into its `prefix:local` display form.
///
/// If multiple prefixes are mapped to the namespace URI then the
/// lexically greatest prefix wins, i.e. the default namespace is
/// only used if no other prefix is available. Names that are not
/// qualified or whose namespace is not mapped are returned unchanged.
#[must_use]
pub fn prefixed_qname<'a>(qname: &'a str, namespaces: &NamespaceMap) -> Cow<'a, str> {
    let Some((uri, local_name)) = split_clark(qname) else {
        return Cow::Borrowed(qname);
    };
    let prefix = namespaces
        .iter()
        .filter(|(_, mapped_uri)| mapped_uri.as_str() == uri)
        .map(|(prefix, _)| prefix.as_str())
        .max();
    match prefix {
        None => Cow::Borrowed(qname),
        Some("") => Cow::Borrowed(local_name),
        Some(prefix) => Cow::Owned(format!("{prefix}:{local_name}")),
    }
}

/// Check for prefixes of the form `ns<digits>`.
///
/// Serializers generate these prefixes for unmapped namespaces,
/// they must never be registered explicitly.
#[must_use]
pub fn is_generated_prefix(prefix: &str) -> bool {
    prefix
        .strip_prefix("ns")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}
