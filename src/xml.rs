//! Owned element tree built from a namespaced XML document.
//!
//! Element tags are stored in qualified `{namespace-uri}localname` form,
//! attributes by local name. Element text follows the usual tree convention:
//! only the text before the first child element belongs to the element, and
//! it is trimmed, with whitespace-only text treated as absent.

use crate::error::{DdiError, Result};
use crate::namespace::{qualify, remove_namespace};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Origin label used for documents that do not come from a file
const INLINE_ORIGIN: &str = "<inline>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Qualified tag, e.g. `{ddi:codebook:2_5}var`
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Tag with the DDI namespace removed
    pub fn local_name(&self) -> Cow<'_, str> {
        remove_namespace(&self.tag)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// All elements reached by following `path` (DDI local names) from this element,
    /// in document order.
    pub fn find_all(&self, path: &[&str]) -> Vec<&XmlElement> {
        let mut current = vec![self];
        for segment in path {
            let tag = qualify(segment);
            current = current
                .into_iter()
                .flat_map(|element| element.children.iter().filter(|c| c.tag == tag))
                .collect();
        }
        current
    }

    pub fn find(&self, path: &[&str]) -> Option<&XmlElement> {
        self.find_all(path).into_iter().next()
    }

    pub fn find_text(&self, path: &[&str]) -> Option<&str> {
        self.find(path).and_then(XmlElement::text)
    }
}

/// Element under construction while its closing tag has not been seen
struct OpenElement {
    tag: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<XmlElement>,
}

impl OpenElement {
    fn push_text(&mut self, text: &str) {
        if self.children.is_empty() {
            self.text.push_str(text);
        }
    }

    fn close(self) -> XmlElement {
        let trimmed = self.text.trim();
        XmlElement {
            tag: self.tag,
            attributes: self.attributes,
            text: (!trimmed.is_empty()).then(|| trimmed.to_string()),
            children: self.children,
        }
    }
}

/// Parse an XML file into an element tree
pub fn parse_file(path: &Path) -> Result<XmlElement> {
    let file = File::open(path)?;
    parse_document(BufReader::new(file), &path.display().to_string())
}

/// Parse an in-memory XML document into an element tree
pub fn parse_str(xml: &str) -> Result<XmlElement> {
    parse_document(xml.as_bytes(), INLINE_ORIGIN)
}

/// Parse a whole document from `source` and return its root element.
///
/// `origin` names the source in error messages.
pub fn parse_document<R: BufRead>(source: R, origin: &str) -> Result<XmlElement> {
    let mut reader = NsReader::from_reader(source);
    let mut buf = Vec::new();
    let mut stack: Vec<OpenElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let (namespace, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|e| DdiError::xml(origin, e))?;

        match event {
            Event::Start(start) => {
                stack.push(open_element(&namespace, &start, origin)?);
            }
            Event::Empty(start) => {
                let element = open_element(&namespace, &start, origin)?.close();
                attach(&mut stack, &mut root, element, origin)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| DdiError::parse(origin, "closing tag without an open element"))?
                    .close();
                attach(&mut stack, &mut root, element, origin)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    let decoded = text
                        .decode()
                        .map_err(|e| DdiError::xml(origin, e.into()))?;
                    current.push_text(&decoded);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    let decoded = data
                        .decode()
                        .map_err(|e| DdiError::xml(origin, e.into()))?;
                    current.push_text(&decoded);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(current) = stack.last_mut() {
                    let resolved =
                        resolve_reference(&reference).map_err(|e| DdiError::xml(origin, e))?;
                    current.push_text(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(DdiError::parse(
            origin,
            format!("unexpected end of document inside <{}>", open.tag),
        ));
    }

    root.ok_or_else(|| DdiError::parse(origin, "document has no root element"))
}

fn open_element(
    namespace: &ResolveResult<'_>,
    start: &BytesStart<'_>,
    origin: &str,
) -> Result<OpenElement> {
    let local = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let tag = match namespace {
        ResolveResult::Bound(Namespace(uri)) => {
            format!("{{{}}}{}", String::from_utf8_lossy(uri), local)
        }
        ResolveResult::Unbound => local,
        ResolveResult::Unknown(prefix) => {
            return Err(DdiError::parse(
                origin,
                format!(
                    "unbound namespace prefix '{}' on <{}>",
                    String::from_utf8_lossy(prefix),
                    local
                ),
            ));
        }
    };

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| DdiError::xml(origin, e.into()))?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| DdiError::xml(origin, e))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(OpenElement {
        tag,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(
    stack: &mut [OpenElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
    origin: &str,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => {
            return Err(DdiError::parse(
                origin,
                "document has more than one root element",
            ));
        }
    }
    Ok(())
}

fn resolve_reference(reference: &BytesRef<'_>) -> std::result::Result<String, quick_xml::Error> {
    if let Some(ch) = reference.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = reference.decode()?;
    Ok(match resolve_predefined_entity(&name) {
        Some(value) => value.to_string(),
        None => format!("&{name};"),
    })
}
