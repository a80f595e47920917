//! In-memory XML element tree with line numbers and locators.
//!
//! The normalizers need random access (look up a material declared later in
//! the file, walk default classes) and need to report where every entity came
//! from. The tree is built in a single pass over `quick_xml` events.

use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use robot_types::{NormalizeError, Provenance, Result};

/// An XML element with its attributes, children and source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<Element>,
    /// Concatenated text content, trimmed. `None` when the element has no text.
    pub text: Option<String>,
    /// One-based line of the opening tag.
    pub line: usize,
    /// Absolute path of the element, e.g. `/robot/link[2]/visual`.
    ///
    /// A sibling index is only added when the parent has more than one child
    /// with the same tag.
    pub locator: String,
}

impl Element {
    fn new(name: String, attributes: Vec<(String, String)>, line: usize) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
            text: None,
            line,
            locator: String::new(),
        }
    }

    /// Attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// True if the attribute is present.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    /// First child with the given tag.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given tag.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Trimmed text content, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Text of the first child with the given tag.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(Element::text)
    }

    /// Provenance record for this element.
    #[must_use]
    pub fn provenance(&self, file: Option<&Path>) -> Provenance {
        Provenance::new(file, self.locator.clone(), Some(self.line))
    }

    /// Depth-first iterator over this element and every descendant.
    pub fn descendants(&self) -> impl Iterator<Item = &Element> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }

    fn assign_locators(&mut self, locator: String) {
        self.locator = locator;
        let mut totals: Vec<(&str, usize)> = Vec::new();
        for child in &self.children {
            match totals.iter_mut().find(|(n, _)| *n == child.name) {
                Some((_, count)) => *count += 1,
                None => totals.push((child.name.as_str(), 1)),
            }
        }
        let totals: Vec<(String, usize)> = totals
            .into_iter()
            .map(|(n, c)| (n.to_string(), c))
            .collect();

        let mut seen: Vec<(String, usize)> = Vec::new();
        let base = self.locator.clone();
        for child in &mut self.children {
            let total = totals
                .iter()
                .find(|(n, _)| *n == child.name)
                .map_or(1, |(_, c)| *c);
            let index = match seen.iter_mut().find(|(n, _)| *n == child.name) {
                Some((_, i)) => {
                    *i += 1;
                    *i
                }
                None => {
                    seen.push((child.name.clone(), 1));
                    1
                }
            };
            let path = if total > 1 {
                format!("{base}/{}[{index}]", child.name)
            } else {
                format!("{base}/{}", child.name)
            };
            child.assign_locators(path);
        }
    }
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The single root element.
    pub root: Element,
}

impl Document {
    /// Parse a document held in memory.
    ///
    /// # Errors
    ///
    /// Returns a format error for malformed markup, a missing root, several
    /// roots, or text outside the root element.
    pub fn parse(source: &str) -> Result<Self> {
        let lines = LineIndex::new(source);
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event_into(&mut buf).map_err(|e| {
                let pos = usize::try_from(reader.error_position()).unwrap_or(source.len());
                NormalizeError::format_at(format!("malformed XML: {e}"), lines.line_of(pos))
            })?;
            let end = usize::try_from(reader.buffer_position()).unwrap_or(source.len());

            match event {
                Event::Start(ref e) => {
                    let line = lines.line_of(tag_start(source, end));
                    stack.push(element_from(e, line)?);
                }
                Event::Empty(ref e) => {
                    let line = lines.line_of(tag_start(source, end));
                    let element = element_from(e, line)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::End(_) => {
                    let element = stack.pop().ok_or_else(|| {
                        NormalizeError::format_at("unexpected closing tag", lines.line_of(end))
                    })?;
                    attach(&mut stack, &mut root, element)?;
                }
                Event::Text(ref t) => {
                    let text = t.unescape().map_err(|e| {
                        NormalizeError::format_at(format!("bad text content: {e}"), lines.line_of(end))
                    })?;
                    push_text(&mut stack, &text, lines.line_of(end))?;
                }
                Event::CData(ref c) => {
                    let text = String::from_utf8_lossy(c).into_owned();
                    push_text(&mut stack, &text, lines.line_of(end))?;
                }
                Event::Eof => break,
                Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(NormalizeError::format_at(
                format!("unexpected end of document: <{}> is not closed", open.name),
                open.line,
            ));
        }

        let mut root = root.ok_or_else(|| NormalizeError::format("document has no root element"))?;
        let locator = format!("/{}", root.name);
        root.assign_locators(locator);
        Ok(Self { root })
    }
}

fn element_from(e: &BytesStart<'_>, line: usize) -> Result<Element> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| {
            NormalizeError::format_at(format!("malformed attribute on <{name}>: {err}"), line)
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| {
                NormalizeError::format_at(format!("bad value for '{key}' on <{name}>: {err}"), line)
            })?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(Element::new(name, attributes, line))
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(NormalizeError::format_at(
            format!("second root element <{}>", element.name),
            element.line,
        ));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(stack: &mut [Element], text: &str, line: usize) -> Result<()> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let Some(top) = stack.last_mut() else {
        return Err(NormalizeError::format_at("text outside the root element", line));
    };
    match &mut top.text {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(trimmed);
        }
        None => top.text = Some(trimmed.to_string()),
    }
    Ok(())
}

/// Byte offset of the `<` that opens the tag ending just before `end`.
fn tag_start(source: &str, end: usize) -> usize {
    source
        .get(..end)
        .and_then(|head| head.rfind('<'))
        .unwrap_or(end)
}

/// Byte offset to line number lookup.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(i) => i + 1,
            Err(i) => i,
        }
    }
}
