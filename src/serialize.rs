// SPDX-FileCopyrightText: The etree-utils authors
// SPDX-License-Identifier: MPL-2.0

use std::{
    borrow::Cow,
    fmt::{self, Write as _},
};

use quick_xml::escape::{escape, partial_escape};
use thiserror::Error;

use crate::{
    qname::{is_generated_prefix, XML_NAMESPACE, XSD_NAMESPACE, XSI_NAMESPACE},
    HashMap, NamespaceMap, NodeKind, TreeNode,
};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

const TRUNCATION_MARKER: &str = "...";

const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "embed", "frame", "hr", "img", "input", "isindex",
    "link", "meta", "param", "source", "track", "wbr",
];

#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("{node} is not an element")]
    NotAnElement { node: String },
    #[error("namespace prefix {prefix:?} is reserved for generated prefixes")]
    ReservedPrefix { prefix: String },
    #[error("formatting failed")]
    Format(#[from] fmt::Error),
}

/// Output method of the raw serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Xml,
    Html,
    /// Character data only.
    Text,
}

/// Tree to text conversion provided by a tree library.
pub trait RawSerializer<N: TreeNode> {
    /// Bind a namespace URI to a prefix for all subsequent serializations.
    ///
    /// The empty prefix binds the default namespace.
    fn register_namespace(&mut self, prefix: &str, uri: &str) -> Result<(), SerializeError>;

    /// Serialize a node including its descendants and its tail.
    ///
    /// The `encoding` is `None` for plain Unicode output.
    fn serialize(
        &self,
        node: &N,
        encoding: Option<&str>,
        method: Method,
    ) -> Result<String, SerializeError>;
}

/// Options for [`serialize()`] and [`serialize_with()`].
#[derive(Debug, Clone, Copy)]
pub struct SerializeOptions<'a> {
    /// Prefixes to register before serializing.
    pub namespaces: Option<&'a NamespaceMap>,

    /// Base indentation of the output lines.
    pub indent: &'a str,

    /// Truncate the output after this number of lines.
    pub max_lines: Option<usize>,

    /// Number of spaces that replace a tab character.
    pub spaces_for_tab: usize,

    /// Prepend an XML declaration.
    pub xml_declaration: bool,

    /// Requested document encoding, `None` for Unicode.
    pub encoding: Option<&'a str>,

    pub method: Method,
}

impl Default for SerializeOptions<'_> {
    fn default() -> Self {
        Self {
            namespaces: None,
            indent: "",
            max_lines: None,
            spaces_for_tab: 4,
            xml_declaration: false,
            encoding: None,
            method: Method::Xml,
        }
    }
}

/// Serialize a tree with the bundled [`XmlWriter`].
///
/// See [`serialize_with()`].
pub fn serialize<N: TreeNode>(
    node: &N,
    options: &SerializeOptions<'_>,
) -> Result<String, SerializeError> {
    serialize_with(node, &mut XmlWriter::new(), options)
}

/// Serialize a tree to a string.
///
/// All lines are re-indented relative to `options.indent`, tabs are
/// expanded, and trailing blank lines are removed. If `options.max_lines`
/// is exceeded the output is truncated, but the last line with the end
/// tag of `node` is always kept.
pub fn serialize_with<N, S>(
    node: &N,
    serializer: &mut S,
    options: &SerializeOptions<'_>,
) -> Result<String, SerializeError>
where
    N: TreeNode,
    S: RawSerializer<N>,
{
    if !node.is_element() {
        return Err(SerializeError::NotAnElement {
            node: format!("{:?}", node.kind()),
        });
    }
    if let Some(namespaces) = options.namespaces.filter(|namespaces| !namespaces.is_empty()) {
        register_namespaces::<N, S>(serializer, namespaces)?;
    }

    let raw_text = serializer
        .serialize(node, options.encoding, options.method)?
        .replace('\t', &" ".repeat(options.spaces_for_tab));

    let mut lines = Vec::new();
    if options.xml_declaration {
        lines.push(XML_DECLARATION);
    }
    lines.extend(raw_text.lines());
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    let Some(&last_line) = lines.last() else {
        return Ok(String::new());
    };

    let last_indent = leading_spaces(last_line);
    let (child_indent, min_indent) = if lines.len() > 2 {
        let child_indent = lines[1..lines.len() - 1]
            .iter()
            .filter(|line| line.len() > leading_spaces(line))
            .map(|line| leading_spaces(line))
            .min()
            .unwrap_or(last_indent);
        (child_indent, child_indent.min(last_indent))
    } else {
        (last_indent, last_indent)
    };

    let truncation_marker = format!("{}{TRUNCATION_MARKER}", " ".repeat(child_indent));
    if let Some(max_lines) = options.max_lines {
        if lines.len() > max_lines + 2 {
            log::debug!(
                "Truncating {num_lines} lines after {max_lines} lines",
                num_lines = lines.len()
            );
            lines.truncate(max_lines);
            lines.extend([
                truncation_marker.as_str(),
                truncation_marker.as_str(),
                last_line,
            ]);
        }
    }

    let reindent = Reindent::new(options.indent, min_indent);
    let mut output = String::with_capacity(raw_text.len());
    for (index, line) in lines.into_iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }
        output.push_str(&reindent.apply(line));
    }
    Ok(output)
}

fn register_namespaces<N, S>(
    serializer: &mut S,
    namespaces: &NamespaceMap,
) -> Result<(), SerializeError>
where
    N: TreeNode,
    S: RawSerializer<N>,
{
    let mut default_namespace = namespaces
        .get("")
        .map(String::as_str)
        .filter(|uri| !uri.is_empty());
    let mut prefixed = namespaces
        .iter()
        .filter(|(prefix, _)| !prefix.is_empty() && !is_generated_prefix(prefix))
        .collect::<Vec<_>>();
    // Deterministic order, the last registration of a URI wins
    prefixed.sort();
    for (prefix, uri) in prefixed {
        log::debug!("Registering namespace prefix {prefix:?} for {uri:?}");
        serializer.register_namespace(prefix, uri)?;
        if default_namespace == Some(uri.as_str()) {
            default_namespace = None;
        }
    }
    if let Some(uri) = default_namespace {
        log::debug!("Registering default namespace {uri:?}");
        serializer.register_namespace("", uri)?;
    }
    Ok(())
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Shifts lines from their minimal indentation to the base indentation.
#[derive(Debug)]
struct Reindent<'a> {
    indent: &'a str,
    min_indent: usize,
    // Number of columns to remove, negative if columns need to be added
    start: isize,
    missing_indent: &'a str,
}

impl<'a> Reindent<'a> {
    fn new(indent: &'a str, min_indent: usize) -> Self {
        let indent_len = indent.chars().count();
        let start = isize::try_from(min_indent).unwrap_or(isize::MAX)
            - isize::try_from(indent_len).unwrap_or(isize::MAX);
        let missing_indent = indent
            .char_indices()
            .nth(min_indent)
            .map_or("", |(offset, _)| &indent[offset..]);
        Self {
            indent,
            min_indent,
            start,
            missing_indent,
        }
    }

    fn apply<'l>(&self, line: &'l str) -> Cow<'l, str> {
        if line.is_empty() {
            return Cow::Borrowed(line);
        }
        if leading_spaces(line) < self.min_indent {
            // Preformatted content, e.g. multiline text
            return Cow::Owned(format!("{}{line}", self.indent));
        }
        match usize::try_from(self.start) {
            Ok(start) => Cow::Borrowed(&line[start..]),
            Err(_) => Cow::Owned(format!("{}{line}", self.missing_indent)),
        }
    }
}

/// Bundled raw serializer for any [`TreeNode`].
///
/// Mimics the output format of ElementTree: namespaces are declared on
/// the serialized node, unregistered namespaces get generated `ns<n>`
/// prefixes, and empty elements are written as `<tag />`.
///
/// A namespace registered with the empty prefix becomes the default
/// namespace of the elements that use it. It is (un)declared with
/// `xmlns` wherever the default namespace in scope changes. Attributes
/// never use the default namespace and get a prefixed binding instead.
#[derive(Debug, Clone)]
pub struct XmlWriter {
    // Registered prefix by namespace URI
    prefixes: HashMap<String, String>,
}

impl Default for XmlWriter {
    fn default() -> Self {
        let mut prefixes = HashMap::new();
        for (uri, prefix) in [
            (XML_NAMESPACE, "xml"),
            (XSD_NAMESPACE, "xs"),
            (XSI_NAMESPACE, "xsi"),
        ] {
            prefixes.insert(uri.to_owned(), prefix.to_owned());
        }
        Self { prefixes }
    }
}

impl XmlWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The prefix registered for a namespace URI.
    #[must_use]
    pub fn prefix(&self, uri: &str) -> Option<&str> {
        self.prefixes.get(uri).map(String::as_str)
    }
}

impl<N: TreeNode> RawSerializer<N> for XmlWriter {
    fn register_namespace(&mut self, prefix: &str, uri: &str) -> Result<(), SerializeError> {
        if is_generated_prefix(prefix) {
            return Err(SerializeError::ReservedPrefix {
                prefix: prefix.to_owned(),
            });
        }
        self.prefixes.retain(|bound_uri, bound_prefix| {
            bound_uri.as_str() != uri && bound_prefix.as_str() != prefix
        });
        self.prefixes.insert(uri.to_owned(), prefix.to_owned());
        Ok(())
    }

    fn serialize(
        &self,
        node: &N,
        encoding: Option<&str>,
        method: Method,
    ) -> Result<String, SerializeError> {
        let mut output = Output {
            text: String::new(),
            registered: &self.prefixes,
            declared: Vec::new(),
            method,
        };
        match method {
            Method::Text => {
                output.write_character_data(node);
                if let Some(tail) = node.tail() {
                    output.text.push_str(tail);
                }
            }
            Method::Xml | Method::Html => {
                if method == Method::Xml {
                    if let Some(encoding) = encoding.filter(|encoding| needs_declaration(encoding))
                    {
                        writeln!(output.text, "<?xml version='1.0' encoding='{encoding}'?>")?;
                    }
                }
                output.declare_namespaces(node);
                output.write_node(node, true, None)?;
            }
        }
        Ok(output.text)
    }
}

fn needs_declaration(encoding: &str) -> bool {
    !["utf-8", "us-ascii", "unicode"]
        .iter()
        .any(|plain| encoding.eq_ignore_ascii_case(plain))
}

fn split_clark(qname: &str) -> Option<(&str, &str)> {
    qname.strip_prefix('{')?.rsplit_once('}')
}

fn escape_attribute(value: &str) -> Cow<'_, str> {
    let escaped = escape(value);
    if !escaped.contains(['\n', '\r', '\t']) {
        return escaped;
    }
    Cow::Owned(
        escaped
            .replace('\n', "&#10;")
            .replace('\r', "&#13;")
            .replace('\t', "&#09;"),
    )
}

#[derive(Debug)]
struct Output<'a> {
    text: String,
    registered: &'a HashMap<String, String>,
    // Namespace URIs and non-empty prefixes in order of their first use
    declared: Vec<(&'a str, String)>,
    method: Method,
}

impl<'a> Output<'a> {
    fn declare_namespaces<N: TreeNode>(&mut self, node: &'a N) {
        if let Some(tag) = node.tag() {
            if !split_clark(tag).is_some_and(|(uri, _)| self.is_default(uri)) {
                self.declare_namespace(tag);
            }
            for (key, _) in node.attributes() {
                self.declare_namespace(key);
            }
        }
        for child in node.children() {
            self.declare_namespaces(child);
        }
    }

    fn declare_namespace(&mut self, qname: &'a str) {
        let Some((uri, _)) = split_clark(qname) else {
            return;
        };
        if self.declared.iter().any(|(declared, _)| *declared == uri) {
            return;
        }
        let prefix = self
            .registered
            .get(uri)
            .filter(|prefix| !prefix.is_empty())
            .cloned()
            .unwrap_or_else(|| format!("ns{}", self.declared.len()));
        if prefix != "xml" {
            self.declared.push((uri, prefix));
        }
    }

    fn is_default(&self, uri: &str) -> bool {
        self.registered.get(uri).is_some_and(String::is_empty)
    }

    fn element_name<'q>(&self, tag: &'q str) -> Cow<'q, str> {
        match split_clark(tag) {
            Some((uri, local_name)) if self.is_default(uri) => Cow::Borrowed(local_name),
            _ => self.attribute_name(tag),
        }
    }

    fn attribute_name<'q>(&self, qname: &'q str) -> Cow<'q, str> {
        let Some((uri, local_name)) = split_clark(qname) else {
            return Cow::Borrowed(qname);
        };
        let prefix = self
            .declared
            .iter()
            .find(|(declared, _)| *declared == uri)
            .map(|(_, prefix)| prefix.as_str())
            .or_else(|| {
                self.registered
                    .get(uri)
                    .map(String::as_str)
                    .filter(|prefix| !prefix.is_empty())
            });
        match prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}:{local_name}")),
            None => Cow::Borrowed(qname),
        }
    }

    /// Write a node with the default namespace `in_scope` of its parent.
    fn write_node<'n, N: TreeNode>(
        &mut self,
        node: &'n N,
        is_root: bool,
        in_scope: Option<&'n str>,
    ) -> fmt::Result {
        match node.kind() {
            NodeKind::Comment => {
                write!(self.text, "<!--{}-->", node.text().unwrap_or_default())?;
            }
            NodeKind::ProcessingInstruction(target) => match node.text() {
                Some(data) if !data.is_empty() => write!(self.text, "<?{target} {data}?>")?,
                _ => write!(self.text, "<?{target}?>")?,
            },
            NodeKind::Element(tag) => self.write_element(node, tag, is_root, in_scope)?,
        }
        if let Some(tail) = node.tail() {
            self.text.push_str(&partial_escape(tail));
        }
        Ok(())
    }

    fn write_element<'n, N: TreeNode>(
        &mut self,
        node: &'n N,
        tag: &'n str,
        is_root: bool,
        in_scope: Option<&'n str>,
    ) -> fmt::Result {
        let default_namespace = match split_clark(tag) {
            Some((uri, _)) if self.is_default(uri) => Some(uri),
            Some(_) => in_scope,
            None => None,
        };
        let name = self.element_name(tag);
        write!(self.text, "<{name}")?;
        if default_namespace != in_scope {
            let uri = default_namespace.unwrap_or_default();
            write!(self.text, r#" xmlns="{}""#, escape_attribute(uri))?;
        }
        if is_root {
            let mut declarations = self.declared.clone();
            declarations.sort_by(|(_, lhs), (_, rhs)| lhs.cmp(rhs));
            for (uri, prefix) in declarations {
                write!(self.text, r#" xmlns:{prefix}="{}""#, escape_attribute(uri))?;
            }
        }
        for (key, value) in node.attributes() {
            let key = self.attribute_name(key);
            write!(self.text, r#" {key}="{}""#, escape_attribute(value))?;
        }
        let text = node.text().unwrap_or_default();
        let children = node.children();
        if self.method == Method::Html {
            self.text.push('>');
            self.text.push_str(&partial_escape(text));
            for child in children {
                self.write_node(child, false, default_namespace)?;
            }
            let local_name = split_clark(tag).map_or(tag, |(_, local_name)| local_name);
            if !HTML_VOID_ELEMENTS
                .iter()
                .any(|void| local_name.eq_ignore_ascii_case(void))
            {
                write!(self.text, "</{name}>")?;
            }
            return Ok(());
        }
        if text.is_empty() && children.is_empty() {
            self.text.push_str(" />");
            return Ok(());
        }
        self.text.push('>');
        self.text.push_str(&partial_escape(text));
        for child in children {
            self.write_node(child, false, default_namespace)?;
        }
        write!(self.text, "</{name}>")
    }

    fn write_character_data<N: TreeNode>(&mut self, node: &N) {
        if !node.is_element() {
            return;
        }
        if let Some(text) = node.text() {
            self.text.push_str(text);
        }
        for child in node.children() {
            self.write_character_data(child);
            if let Some(tail) = child.tail() {
                self.text.push_str(tail);
            }
        }
    }
}
