//! XML settings file format.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <gradle-props>
//!   <gradle-daemon>
//!     <timeout>30</timeout>
//!   </gradle-daemon>
//!   <jvm-args>
//!     <arg>-Xmx2g</arg>
//!   </jvm-args>
//!   <source-level>17</source-level>
//!   <target-platform name="jdk-17" version="17"/>
//! </gradle-props>
//! ```
//!
//! Each element maps to one [`ConfigTree`] node: local name and namespace
//! URI form the [`ConfigKey`], the trimmed direct text is the value,
//! attributes are copied by local name, and child elements become children.
//! A leaf marked `xml:space="preserve"` keeps its text untrimmed; the writer
//! adds the marker to every leaf whose value has surrounding whitespace.
//! Comments and processing instructions are not part of the tree; they
//! survive only inside elements that are written back verbatim.

use quick_xml::escape::escape;
use std::fmt::Write as _;

use crate::tree::{ConfigKey, ConfigTree};
use crate::{Error, Result};

/// Name of the root element of every settings file.
pub const ROOT_ELEMENT: &str = "gradle-props";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT: &str = "  ";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Line separator used when writing a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSeparator {
    #[default]
    Lf,
    CrLf,
}

impl LineSeparator {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "lf" | "\n" => Some(LineSeparator::Lf),
            "crlf" | "\r\n" => Some(LineSeparator::CrLf),
            _ => None,
        }
    }

    /// Short name (`lf` / `crlf`).
    pub fn name(&self) -> &'static str {
        match self {
            LineSeparator::Lf => "lf",
            LineSeparator::CrLf => "crlf",
        }
    }

    /// The separator itself.
    pub fn as_str(&self) -> &'static str {
        match self {
            LineSeparator::Lf => "\n",
            LineSeparator::CrLf => "\r\n",
        }
    }

    /// The separator a text uses, if it has any line break.
    pub fn detect(text: &str) -> Option<Self> {
        if text.contains("\r\n") {
            Some(LineSeparator::CrLf)
        } else if text.contains('\n') {
            Some(LineSeparator::Lf)
        } else {
            None
        }
    }
}

impl std::fmt::Display for LineSeparator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Preferences applied when a settings file is written.
///
/// Not part of the settings themselves: two stores with different options
/// but the same tree hold equal settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigSaveOptions {
    preferred_line_separator: Option<LineSeparator>,
}

impl ConfigSaveOptions {
    pub fn new(preferred_line_separator: Option<LineSeparator>) -> Self {
        Self {
            preferred_line_separator,
        }
    }

    pub fn preferred_line_separator(&self) -> Option<LineSeparator> {
        self.preferred_line_separator
    }

    /// Separator to write with.
    pub fn line_separator(&self) -> LineSeparator {
        self.preferred_line_separator.unwrap_or_default()
    }
}

/// A top-level element as found in a file.
#[derive(Debug, Clone)]
pub struct SourceNode {
    pub key: ConfigKey,
    pub tree: ConfigTree,
    /// Original text of the element, when it can stand on its own.
    pub text: Option<String>,
}

/// Result of reading a settings file.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    pub nodes: Vec<SourceNode>,
    pub line_separator: Option<LineSeparator>,
}

impl ParsedDocument {
    /// The document as one tree whose children are the top-level elements.
    pub fn root(&self) -> ConfigTree {
        ConfigTree::builder()
            .children(
                self.nodes
                    .iter()
                    .map(|n| (n.key.clone(), n.tree.clone()))
                    .collect(),
            )
            .build()
    }
}

/// Parse a whole settings file.
pub fn parse_document(text: &str) -> Result<ParsedDocument> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        tracing::warn!(
            root = root.tag_name().name(),
            "Unexpected root element in settings file"
        );
    }

    let nodes = root
        .children()
        .filter(|n| n.is_element())
        .map(|node| {
            let key = element_key(&node);
            let tree = element_to_tree(&node);
            // Prefixes declared on the root do not travel with the slice.
            let text = standalone_text(&text[node.range()], &key, &tree);
            SourceNode { key, tree, text }
        })
        .collect();

    Ok(ParsedDocument {
        nodes,
        line_separator: LineSeparator::detect(text),
    })
}

/// Parse a standalone element.
pub fn parse_element(text: &str) -> Result<(ConfigKey, ConfigTree)> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    Ok((element_key(&root), element_to_tree(&root)))
}

/// Parse a standalone element, also returning the text of the element
/// alone, without prolog or surrounding whitespace.
///
/// The text is `None` when it does not read back as the same element on
/// its own.
pub fn parse_fragment(text: &str) -> Result<(ConfigKey, ConfigTree, Option<String>)> {
    let doc = roxmltree::Document::parse(text)?;
    let root = doc.root_element();
    let key = element_key(&root);
    let tree = element_to_tree(&root);
    let raw = standalone_text(&text[root.range()], &key, &tree);
    Ok((key, tree, raw))
}

fn standalone_text(raw: &str, key: &ConfigKey, tree: &ConfigTree) -> Option<String> {
    match parse_element(raw) {
        Ok((raw_key, raw_tree)) if raw_key == *key && raw_tree == *tree => Some(raw.to_string()),
        _ => None,
    }
}

fn element_key(node: &roxmltree::Node) -> ConfigKey {
    let tag = node.tag_name();
    match tag.namespace() {
        Some(ns) if !ns.is_empty() => ConfigKey::with_namespace(tag.name(), ns),
        _ => ConfigKey::new(tag.name()),
    }
}

/// Convert an element into a tree.
pub fn element_to_tree(node: &roxmltree::Node) -> ConfigTree {
    let mut text = String::new();
    let mut children = Vec::new();
    for child in node.children() {
        if child.is_element() {
            children.push((element_key(&child), element_to_tree(&child)));
        } else if child.is_text() {
            if let Some(t) = child.text() {
                text.push_str(t);
            }
        }
    }

    let preserve =
        children.is_empty() && node.attribute((XML_NAMESPACE, "space")) == Some("preserve");
    let value = if preserve { text.as_str() } else { text.trim() };
    let mut builder = ConfigTree::builder().children(children);
    if !value.is_empty() {
        builder = builder.value(value);
    }
    for attr in node.attributes() {
        if attr.namespace() == Some(XML_NAMESPACE) && attr.name() == "space" {
            continue;
        }
        builder = builder.attribute(attr.name(), attr.value());
    }
    builder.build()
}

/// One top-level entry to write.
#[derive(Debug, Clone, Copy)]
pub enum DocumentEntry<'a> {
    /// Written exactly as given.
    Verbatim(&'a str),
    /// Written from the tree.
    Tree(&'a ConfigKey, &'a ConfigTree),
}

/// Render a settings file.
pub fn render_document<'a>(
    entries: impl IntoIterator<Item = DocumentEntry<'a>>,
    separator: LineSeparator,
) -> String {
    let mut body = String::new();
    for entry in entries {
        match entry {
            DocumentEntry::Verbatim(text) => {
                body.push_str(INDENT);
                body.push_str(text.trim());
                body.push('\n');
            }
            DocumentEntry::Tree(key, tree) => write_element(&mut body, key, tree, 1, None),
        }
    }

    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(XML_DECLARATION);
    out.push('\n');
    if body.is_empty() {
        let _ = writeln!(out, "<{}/>", ROOT_ELEMENT);
    } else {
        let _ = writeln!(out, "<{}>", ROOT_ELEMENT);
        out.push_str(&body);
        let _ = writeln!(out, "</{}>", ROOT_ELEMENT);
    }

    let normalized = out.replace("\r\n", "\n");
    match separator {
        LineSeparator::Lf => normalized,
        LineSeparator::CrLf => normalized.replace('\n', "\r\n"),
    }
}

/// Render one element on its own, without declaration.
pub fn render_element(key: &ConfigKey, tree: &ConfigTree) -> String {
    let mut out = String::new();
    write_element(&mut out, key, tree, 0, None);
    out.trim_end().to_string()
}

fn write_element(
    out: &mut String,
    key: &ConfigKey,
    tree: &ConfigTree,
    depth: usize,
    parent_ns: Option<&str>,
) {
    let indent = INDENT.repeat(depth);
    let _ = write!(out, "{}<{}", indent, key.name());
    if key.namespace() != parent_ns {
        let _ = write!(out, " xmlns=\"{}\"", escape(key.namespace().unwrap_or("")));
    }
    for (name, value) in tree.attributes() {
        let _ = write!(out, " {}=\"{}\"", name, escape(value));
    }
    let padded = tree.value().is_some_and(|v| v.trim() != v);
    if padded && tree.child_count() == 0 {
        out.push_str(" xml:space=\"preserve\"");
    }

    match (tree.value(), tree.child_count()) {
        (None, 0) => out.push_str("/>\n"),
        (Some(value), 0) => {
            let _ = writeln!(out, ">{}</{}>", escape(value), key.name());
        }
        (value, _) => {
            out.push_str(">\n");
            if let Some(value) = value {
                let _ = writeln!(out, "{}{}{}", indent, INDENT, escape(value));
            }
            for (child_key, child) in tree.children() {
                write_element(out, child_key, child, depth + 1, key.namespace());
            }
            let _ = writeln!(out, "{}</{}>", indent, key.name());
        }
    }
}
