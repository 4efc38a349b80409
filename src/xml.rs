//! XML parsing and flattening into [`ResponseMap`].

use crate::error::{QrzXmlError, Result};
use crate::types::{ResponseMap, XmlValue};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

/// Owned XML element tree.
///
/// [`XmlElement::parse_document`] returns an unnamed document node whose
/// only child is the root element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    /// Tag name, including any namespace prefix
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Unescaped text found before the first child element
    pub text: String,
    /// Child elements in document order
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a complete XML document
    pub fn parse_document(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack = vec![XmlElement::default()];
        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    Self::attach(&mut stack, element)?;
                }
                Event::End(_) => {
                    if stack.len() < 2 {
                        return Err(QrzXmlError::malformed("closing tag without opening tag"));
                    }
                    if let Some(element) = stack.pop() {
                        Self::attach(&mut stack, element)?;
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some(current) = stack.last_mut() {
                        current.push_text(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if stack.len() > 1 {
            let unclosed = stack.last().map(|e| e.name.clone()).unwrap_or_default();
            return Err(QrzXmlError::malformed(format!(
                "unexpected end of document inside <{}>",
                unclosed
            )));
        }
        let document = stack.pop().unwrap_or_default();
        if document.children.is_empty() {
            return Err(QrzXmlError::malformed("document has no root element"));
        }
        Ok(document)
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(quick_xml::Error::InvalidAttr)?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }

        Ok(Self {
            name,
            attributes,
            ..Self::default()
        })
    }

    fn attach(stack: &mut [XmlElement], element: XmlElement) -> Result<()> {
        match stack.last_mut() {
            Some(parent) => {
                parent.children.push(element);
                Ok(())
            }
            None => Err(QrzXmlError::malformed("element outside of document")),
        }
    }

    /// Only text ahead of the first child counts as content
    fn push_text(&mut self, text: &str) {
        if self.children.is_empty() {
            self.text.push_str(text);
        } else if !text.trim().is_empty() {
            warn!(element = %self.name, "Ignoring text after child element");
        }
    }

    /// Whether the element carries text worth keeping
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Flatten the children of `element` into a [`ResponseMap`].
///
/// A child with text ahead of its first child element becomes a leaf, any
/// other child becomes the flattening of its own children. Text trailing a
/// child element is dropped with a warning. Attributes land beside the child as
/// `child.attribute`. Repeated sibling names keep only the last occurrence;
/// each overwrite is logged.
pub fn flatten(element: &XmlElement) -> ResponseMap {
    let mut map = ResponseMap::new();
    for child in &element.children {
        for (attribute, value) in &child.attributes {
            insert_once(
                &mut map,
                format!("{}.{}", child.name, attribute),
                XmlValue::Text(value.clone()),
            );
        }

        let value = if child.has_text() {
            XmlValue::Text(child.text.trim().to_string())
        } else {
            XmlValue::Map(flatten(child))
        };
        insert_once(&mut map, child.name.clone(), value);
    }
    map
}

fn insert_once(map: &mut ResponseMap, key: String, value: XmlValue) {
    if map.insert(key.clone(), value).is_some() {
        warn!(key = %key, "Repeated XML key, earlier value overwritten");
    }
}

/// Parse and flatten an XML response body in one step
pub fn parse_response(xml: &str) -> Result<ResponseMap> {
    let document = XmlElement::parse_document(xml)?;
    Ok(flatten(&document))
}
