//! Push-based XML events.
//!
//! Parsing and printing share one event vocabulary. An event source (the
//! quick-xml driven [`crate::reader`], or the tree [`crate::printer`]) pushes
//! events into an [`EventHandler`]; handlers either build a tree
//! ([`crate::TreeBuilder`]), render text ([`crate::XmlWriter`]) or record the
//! events ([`EventRecorder`]).
//!
//! ## Event order
//!
//! ```text
//! start_document
//!   start_prefix_mapping*      declarations of the next element
//!   start_element
//!     characters | start_cdata characters* end_cdata | comment | (nested element)
//!   end_element
//!   end_prefix_mapping*        same prefixes as the matching start_prefix_mapping
//! end_document
//! ```
//!
//! Element and attribute names are syntactic (`prefix:local`). Start tags may
//! still carry their `xmlns` pseudo-attributes; consumers that track scopes
//! rely on the prefix-mapping events instead.

use crate::Result;

/// An attribute as it appears on a start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAttribute {
    /// Syntactic name, e.g. `xml:lang` or `xmlns:p`.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

impl RawAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Is this an `xmlns` or `xmlns:*` pseudo-attribute?
    pub fn is_namespace_declaration(&self) -> bool {
        self.name == "xmlns" || self.name.starts_with("xmlns:")
    }
}

/// Receiver of push-based XML events.
///
/// Every method may fail; an error aborts the event source.
pub trait EventHandler {
    fn start_document(&mut self) -> Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> Result<()>;

    /// A prefix binding that takes effect at the next start tag.
    ///
    /// An empty `namespace` undeclares the prefix.
    fn start_prefix_mapping(&mut self, prefix: &str, namespace: &str) -> Result<()>;

    fn end_prefix_mapping(&mut self, _prefix: &str) -> Result<()> {
        Ok(())
    }

    fn start_element(&mut self, name: &str, attributes: &[RawAttribute]) -> Result<()>;

    fn end_element(&mut self, name: &str) -> Result<()>;

    fn characters(&mut self, text: &str) -> Result<()>;

    fn start_cdata(&mut self) -> Result<()>;

    fn end_cdata(&mut self) -> Result<()>;

    fn comment(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }
}

/// An owned XML event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlEvent {
    StartDocument,
    EndDocument,
    StartPrefixMapping { prefix: String, namespace: String },
    EndPrefixMapping { prefix: String },
    StartElement { name: String, attributes: Vec<RawAttribute> },
    EndElement { name: String },
    Characters(String),
    StartCData,
    EndCData,
    Comment(String),
}

impl XmlEvent {
    /// Push this event into a handler.
    pub fn dispatch<H: EventHandler + ?Sized>(&self, handler: &mut H) -> Result<()> {
        match self {
            XmlEvent::StartDocument => handler.start_document(),
            XmlEvent::EndDocument => handler.end_document(),
            XmlEvent::StartPrefixMapping { prefix, namespace } => {
                handler.start_prefix_mapping(prefix, namespace)
            }
            XmlEvent::EndPrefixMapping { prefix } => handler.end_prefix_mapping(prefix),
            XmlEvent::StartElement { name, attributes } => handler.start_element(name, attributes),
            XmlEvent::EndElement { name } => handler.end_element(name),
            XmlEvent::Characters(text) => handler.characters(text),
            XmlEvent::StartCData => handler.start_cdata(),
            XmlEvent::EndCData => handler.end_cdata(),
            XmlEvent::Comment(text) => handler.comment(text),
        }
    }
}

/// Push a sequence of events into a handler, stopping at the first error.
pub fn replay<'a, H, I>(events: I, handler: &mut H) -> Result<()>
where
    H: EventHandler + ?Sized,
    I: IntoIterator<Item = &'a XmlEvent>,
{
    for event in events {
        event.dispatch(handler)?;
    }
    Ok(())
}

/// Handler that records every event it receives.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Vec<XmlEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[XmlEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<XmlEvent> {
        self.events
    }
}

impl EventHandler for EventRecorder {
    fn start_document(&mut self) -> Result<()> {
        self.events.push(XmlEvent::StartDocument);
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.events.push(XmlEvent::EndDocument);
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        self.events.push(XmlEvent::StartPrefixMapping {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
        });
        Ok(())
    }

    fn end_prefix_mapping(&mut self, prefix: &str) -> Result<()> {
        self.events.push(XmlEvent::EndPrefixMapping {
            prefix: prefix.to_string(),
        });
        Ok(())
    }

    fn start_element(&mut self, name: &str, attributes: &[RawAttribute]) -> Result<()> {
        self.events.push(XmlEvent::StartElement {
            name: name.to_string(),
            attributes: attributes.to_vec(),
        });
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        self.events.push(XmlEvent::EndElement {
            name: name.to_string(),
        });
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.events.push(XmlEvent::Characters(text.to_string()));
        Ok(())
    }

    fn start_cdata(&mut self) -> Result<()> {
        self.events.push(XmlEvent::StartCData);
        Ok(())
    }

    fn end_cdata(&mut self) -> Result<()> {
        self.events.push(XmlEvent::EndCData);
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.events.push(XmlEvent::Comment(text.to_string()));
        Ok(())
    }
}
