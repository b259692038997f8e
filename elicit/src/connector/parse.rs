//! Response body parsing by content type.

use quick_xml::errors::IllFormedError;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use serde_json::map::Entry;
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Key prefix for XML attributes.
pub const XML_ATTRIBUTE_PREFIX: &str = "@";

/// Key holding the text of an XML element that also has attributes.
pub const XML_TEXT_KEY: &str = "#text";

/// Parses a response body according to its `Content-Type`.
///
/// - an empty body is `null`
/// - `*urlencoded*` bodies become a flat object of strings
/// - `*json*` bodies must be valid JSON
/// - `*xml*` bodies must be well-formed XML and become the root element's
///   value (see [`parse_xml`])
/// - anything else is tried as JSON and falls back to the raw text
///
/// ## Errors
///
/// Fails only when the content type declares JSON or XML and the body does
/// not match it.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Result<Value, ParseError> {
    let text = String::from_utf8_lossy(body);
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }

    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();

    if content_type.contains("urlencoded") {
        return Ok(parse_urlencoded(body));
    }
    if content_type.contains("json") {
        return Ok(serde_json::from_str(&text)?);
    }
    if content_type.contains("xml") {
        return Ok(parse_xml(&text)?);
    }

    // Some providers send JSON with a non-standard content type.
    Ok(serde_json::from_str(&text).unwrap_or_else(|_| Value::String(text.into_owned())))
}

/// Converts an XML document into the value of its root element.
///
/// Elements holding only text become strings and empty elements become
/// `""`. Other elements become objects keyed by child name, where repeated
/// children collect into an array. Attributes are stored under
/// [`XML_ATTRIBUTE_PREFIX`] keys and the text of an element with attributes
/// or children under [`XML_TEXT_KEY`].
///
/// ## Errors
///
/// Fails on malformed markup, mismatched or missing end tags and invalid
/// attributes.
pub fn parse_xml(text: &str) -> Result<Value, quick_xml::Error> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(XmlElement::open(&start)?),
            Event::Empty(start) => {
                let element = XmlElement::open(&start)?;
                close_element(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(&mut stack, &mut root, element);
                }
            }
            Event::Text(content) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&content.decode()?);
                }
            }
            Event::CData(content) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&content.decode()?);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(element) = stack.last_mut() {
                    push_reference(&mut element.text, &reference)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = stack.pop() {
        return Err(IllFormedError::MissingEndTag(unclosed.name).into());
    }

    Ok(root.unwrap_or(Value::Null))
}

struct XmlElement {
    name: String,
    fields: Map<String, Value>,
    text: String,
}

impl XmlElement {
    fn open(start: &BytesStart<'_>) -> Result<Self, quick_xml::Error> {
        let mut fields = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref());
            let value = attribute.unescape_value()?;
            fields.insert(
                format!("{XML_ATTRIBUTE_PREFIX}{key}"),
                Value::String(value.into_owned()),
            );
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            fields,
            text: String::new(),
        })
    }

    fn into_entry(self) -> (String, Value) {
        let Self {
            name,
            mut fields,
            text,
        } = self;
        let text = text.trim();

        if fields.is_empty() {
            return (name, Value::String(text.to_string()));
        }
        if !text.is_empty() {
            fields.insert(XML_TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        (name, Value::Object(fields))
    }
}

/// Attaches a finished element to its parent, or makes it the root.
fn close_element(stack: &mut [XmlElement], root: &mut Option<Value>, element: XmlElement) {
    let (name, value) = element.into_entry();

    let Some(parent) = stack.last_mut() else {
        root.get_or_insert(value);
        return;
    };

    match parent.fields.entry(name) {
        Entry::Vacant(slot) => {
            slot.insert(value);
        }
        Entry::Occupied(mut slot) => match slot.get_mut() {
            Value::Array(items) => items.push(value),
            existing => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
        },
    }
}

/// Appends a character or predefined entity reference; unknown entities
/// are kept verbatim.
fn push_reference(text: &mut String, reference: &BytesRef<'_>) -> Result<(), quick_xml::Error> {
    if let Some(ch) = reference.resolve_char_ref()? {
        text.push(ch);
        return Ok(());
    }

    let name = reference.decode()?;
    match resolve_predefined_entity(&name) {
        Some(resolved) => text.push_str(resolved),
        None => {
            text.push('&');
            text.push_str(&name);
            text.push(';');
        }
    }
    Ok(())
}

fn parse_urlencoded(body: &[u8]) -> Value {
    let map: Map<String, Value> = url::form_urlencoded::parse(body)
        .into_owned()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    Value::Object(map)
}
