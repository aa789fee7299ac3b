//! Event source: drives quick-xml and pushes [`EventHandler`] events.

use crate::event::{EventHandler, RawAttribute};
use crate::scope::{XML_PREFIX, XMLNS_PREFIX};
use crate::{Element, Error, ParseOptions, Result, TreeBuilder};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parse XML from a string.
///
/// # Example
///
/// ```rust
/// use scoped_xml::parse_str;
///
/// let root = parse_str(r#"<r:root xmlns:r="urn:r"><r:child/></r:root>"#).unwrap();
/// assert_eq!(root.name().namespace(), Some("urn:r"));
/// assert_eq!(root.child_elems().count(), 1);
/// ```
///
/// # Errors
///
/// Returns an error if the XML is malformed or a prefix is unbound.
pub fn parse_str(content: &str) -> Result<Element> {
    parse_str_with_options(content, ParseOptions::default())
}

pub fn parse_str_with_options(content: &str, options: ParseOptions) -> Result<Element> {
    parse_reader(content.as_bytes(), options)
}

/// Parse XML from any buffered reader.
pub fn parse_reader<R: BufRead>(input: R, options: ParseOptions) -> Result<Element> {
    let mut builder = TreeBuilder::with_options(options);
    read_events(input, &mut builder)?;
    builder.finish()
}

/// Parse an XML file.
pub fn parse_file(path: impl AsRef<Path>, options: ParseOptions) -> Result<Element> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Parsing XML file");
    let file = File::open(path)?;
    parse_reader(BufReader::new(file), options)
}

/// Read XML from `input` and push its events into `handler`.
///
/// Namespace declaration attributes are reported as prefix mappings before
/// the start tag that carries them, and ended after its end tag; they also
/// stay in the start tag's attribute list. Text and attribute values are
/// unescaped. XML declarations, processing instructions and DOCTYPE
/// declarations are skipped.
///
/// # Errors
///
/// Stops at the first syntax error, I/O error or handler error.
pub fn read_events<R, H>(input: R, handler: &mut H) -> Result<()>
where
    R: BufRead,
    H: EventHandler + ?Sized,
{
    let mut reader = Reader::from_reader(input);
    reader.config_mut().trim_text_start = false;
    reader.config_mut().trim_text_end = false;

    let mut buf = Vec::new();
    // Prefixes declared by each open element.
    let mut declared: Vec<Vec<String>> = Vec::new();
    let mut elements = 0usize;

    handler.start_document()?;

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|err| syntax_error(err, reader.error_position()))?;

        match event {
            Event::Start(e) => {
                elements += 1;
                start_element(&e, handler, &mut declared)?;
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                end_element(&name, handler, &mut declared)?;
            }
            Event::Empty(e) => {
                elements += 1;
                start_element(&e, handler, &mut declared)?;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                end_element(&name, handler, &mut declared)?;
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|err| Error::XmlSyntax {
                    message: format!("Invalid text content: {}", err),
                    position: Some(reader.buffer_position()),
                })?;
                handler.characters(&text)?;
            }
            Event::CData(e) => {
                handler.start_cdata()?;
                handler.characters(&String::from_utf8_lossy(e.as_ref()))?;
                handler.end_cdata()?;
            }
            Event::Comment(e) => {
                handler.comment(&String::from_utf8_lossy(&e))?;
            }
            Event::Decl(_) => tracing::trace!("Skipping XML declaration"),
            Event::PI(_) => tracing::trace!("Skipping processing instruction"),
            Event::DocType(_) => tracing::trace!("Skipping DOCTYPE declaration"),
            Event::Eof => break,
        }
        buf.clear();
    }

    handler.end_document()?;
    tracing::debug!(elements, bytes = reader.buffer_position(), "Read XML events");
    Ok(())
}

fn start_element<H: EventHandler + ?Sized>(
    e: &BytesStart<'_>,
    handler: &mut H,
    declared: &mut Vec<Vec<String>>,
) -> Result<()> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    let mut prefixes = Vec::new();

    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|err| Error::XmlSyntax {
                message: format!("Invalid value of attribute '{}': {}", key, err),
                position: None,
            })?
            .into_owned();

        if let Some(prefix) = declared_prefix(&key).filter(|prefix| *prefix != XML_PREFIX) {
            handler.start_prefix_mapping(prefix, &value)?;
            prefixes.push(prefix.to_string());
        }
        attributes.push(RawAttribute::new(key, value));
    }

    handler.start_element(&name, &attributes)?;
    declared.push(prefixes);
    Ok(())
}

fn end_element<H: EventHandler + ?Sized>(
    name: &str,
    handler: &mut H,
    declared: &mut Vec<Vec<String>>,
) -> Result<()> {
    handler.end_element(name)?;
    for prefix in declared.pop().unwrap_or_default() {
        handler.end_prefix_mapping(&prefix)?;
    }
    Ok(())
}

/// The prefix declared by an `xmlns` or `xmlns:p` attribute name.
fn declared_prefix(key: &str) -> Option<&str> {
    if key == XMLNS_PREFIX {
        return Some("");
    }
    key.strip_prefix("xmlns:")
}

fn syntax_error(err: quick_xml::Error, position: u64) -> Error {
    match err {
        quick_xml::Error::Io(_) => Error::from(err),
        other => Error::XmlSyntax {
            message: other.to_string(),
            position: Some(position),
        },
    }
}
