//! A small mutable element tree over XML markup.
//!
//! `quick-xml` only tokenizes, so this module assembles its events into an
//! owned tree that the style rewrite can walk and mutate, then prints it back
//! out. Text, CDATA and comments are carried verbatim; attribute values are
//! kept in their escaped form.

use std::fmt;

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};

// ============================================================================
// Tree
// ============================================================================

/// A child of an [`Element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text, CDATA or a comment, exactly as it appeared in the source.
    Raw(String),
}

/// An XML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    /// `(qualified name, escaped value)` pairs in source order.
    attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Creates an element with no attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// The qualified tag name, e.g. `svg:path`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag name without a namespace prefix.
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Returns the (escaped) value of an attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attr(key).is_some()
    }

    /// Sets an attribute, replacing any existing value in place.
    ///
    /// `value` is unescaped text; it is escaped on the way in.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        let value = escape(value).into_owned();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Removes an attribute. Returns true if it was present.
    pub fn remove_attr(&mut self, key: &str) -> bool {
        let before = self.attributes.len();
        self.attributes.retain(|(k, _)| k != key);
        self.attributes.len() != before
    }

    /// Iterates over the direct child elements.
    pub fn child_elements(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Raw(_) => None,
        })
    }

    /// Iterates over every element below this one in document order.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.child_elements().rev().collect(),
        }
    }

    /// Calls `f` on every element below this one in document order.
    pub fn for_each_descendant_mut(&mut self, f: &mut impl FnMut(&mut Element)) {
        for child in &mut self.children {
            if let Node::Element(element) = child {
                f(element);
                element.for_each_descendant_mut(f);
            }
        }
    }

    /// Parses markup and returns its first element named `svg`, searching
    /// depth-first.
    pub fn parse_svg_root(markup: &str) -> Result<Element> {
        SvgDocument::parse(markup).map(|doc| doc.root)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();

        for attr in start.attributes() {
            let attr = attr.map_err(|e| {
                Error::MalformedMarkup(format!("invalid attribute on <{name}>: {e}"))
            })?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            // Single-quoted values may hold a bare `"`; we always print double quotes.
            let value = String::from_utf8_lossy(&attr.value).replace('"', "&quot;");
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            children: Vec::new(),
        })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, value) in &self.attributes {
            write!(f, " {key}=\"{value}\"")?;
        }

        if self.children.is_empty() {
            return f.write_str("/>");
        }

        f.write_str(">")?;
        for child in &self.children {
            match child {
                Node::Element(element) => write!(f, "{element}")?,
                Node::Raw(raw) => f.write_str(raw)?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}

/// An `svg` element together with the doctype of the markup it came from.
///
/// The doctype is kept because its internal subset may declare entities
/// (`<!ENTITY ns_svg "...">`) that attribute values still reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SvgDocument {
    /// Doctype content after `<!DOCTYPE `, e.g. `svg [ <!ENTITY ...> ]`.
    pub doctype: Option<String>,
    pub root: Element,
}

impl SvgDocument {
    /// Parses markup, keeping its doctype and its first `svg` element.
    pub fn parse(markup: &str) -> Result<Self> {
        let (doctype, nodes) = tokenize(markup)?;
        let root = find_svg(nodes)
            .ok_or_else(|| Error::MalformedMarkup("no <svg> element found".into()))?;
        Ok(Self { doctype, root })
    }
}

impl fmt::Display for SvgDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(doctype) = &self.doctype {
            write!(f, "<!DOCTYPE {doctype}>")?;
        }
        write!(f, "{}", self.root)
    }
}

/// Depth-first iterator returned by [`Element::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        self.stack.extend(next.child_elements().rev());
        Some(next)
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Deepest element nesting accepted by [`parse`].
pub const MAX_DEPTH: usize = 1024;

/// Parses markup into its top-level nodes.
///
/// The XML declaration, doctype and processing instructions are dropped.
/// Elements nested deeper than [`MAX_DEPTH`] are rejected.
pub fn parse(markup: &str) -> Result<Vec<Node>> {
    tokenize(markup).map(|(_, nodes)| nodes)
}

fn tokenize(markup: &str) -> Result<(Option<String>, Vec<Node>)> {
    let mut reader = Reader::from_str(markup);
    let mut open: Vec<Element> = Vec::new();
    let mut top: Vec<Node> = Vec::new();
    let mut doctype = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(Error::MalformedMarkup(format!(
                    "{e} (near byte {})",
                    reader.buffer_position()
                )));
            }
        };

        let node = match event {
            Event::Start(start) => {
                if open.len() >= MAX_DEPTH {
                    return Err(Error::MalformedMarkup(format!(
                        "elements nested deeper than {MAX_DEPTH} levels"
                    )));
                }
                open.push(Element::from_start(&start)?);
                continue;
            }
            Event::Empty(start) => Node::Element(Element::from_start(&start)?),
            Event::End(_) => match open.pop() {
                Some(element) => Node::Element(element),
                None => return Err(Error::MalformedMarkup("unexpected closing tag".into())),
            },
            Event::Text(text) => Node::Raw(String::from_utf8_lossy(&text).into_owned()),
            Event::CData(data) => {
                Node::Raw(format!("<![CDATA[{}]]>", String::from_utf8_lossy(&data)))
            }
            Event::Comment(comment) => {
                Node::Raw(format!("<!--{}-->", String::from_utf8_lossy(&comment)))
            }
            Event::DocType(text) => {
                doctype = Some(String::from_utf8_lossy(&text).trim().to_string());
                continue;
            }
            Event::Eof => break,
            _ => continue,
        };

        match open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => top.push(node),
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(Error::MalformedMarkup(format!(
            "unclosed element <{}>",
            unclosed.name
        )));
    }

    Ok((doctype, top))
}

fn find_svg(nodes: Vec<Node>) -> Option<Element> {
    nodes.into_iter().find_map(|node| match node {
        Node::Element(element) if element.local_name() == "svg" => Some(element),
        Node::Element(element) => find_svg(element.children),
        Node::Raw(_) => None,
    })
}

// ============================================================================
// Tests
// ============================================================================
