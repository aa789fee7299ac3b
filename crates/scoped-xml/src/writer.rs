//! Event sink: renders events as XML text through quick-xml's writer.

use crate::event::{EventHandler, RawAttribute};
use crate::printer::print_events;
use crate::scope::{DEFAULT_PREFIX, XMLNS_PREFIX};
use crate::{Element, Error, PrintOptions, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// An [`EventHandler`] that writes XML text.
///
/// Prefix mappings received before a start tag become its `xmlns`
/// attributes; `xmlns` pseudo-attributes present on the start tag itself are
/// ignored in favour of the mappings. Elements without content are written
/// as empty tags.
pub struct XmlWriter<W: Write> {
    writer: Writer<W>,
    options: PrintOptions,

    /// Mappings for the next start tag.
    pending: Vec<(String, String)>,

    /// Start tag not yet written, so it can still become an empty tag.
    open_start: Option<BytesStart<'static>>,

    /// Content of the CDATA section being received.
    cdata: Option<String>,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_options(inner, PrintOptions::default())
    }

    pub fn with_options(inner: W, options: PrintOptions) -> Self {
        let writer = match options.indent {
            Some(indent) => Writer::new_with_indent(inner, b' ', indent),
            None => Writer::new(inner),
        };
        Self {
            writer,
            options,
            pending: Vec::new(),
            open_start: None,
            cdata: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event)?;
        Ok(())
    }

    fn flush_start(&mut self) -> Result<()> {
        if let Some(start) = self.open_start.take() {
            self.write(Event::Start(start))?;
        }
        Ok(())
    }

    fn write_cdata(&mut self, content: &str) -> Result<()> {
        // "]]>" cannot appear inside a section; split between "]]" and ">".
        let mut rest = content;
        while let Some(pos) = rest.find("]]>") {
            self.write(Event::CData(BytesCData::new(&rest[..pos + 2])))?;
            rest = &rest[pos + 2..];
        }
        self.write(Event::CData(BytesCData::new(rest)))
    }
}

impl<W: Write> EventHandler for XmlWriter<W> {
    fn start_document(&mut self) -> Result<()> {
        if self.options.xml_declaration {
            self.write(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        }
        Ok(())
    }

    fn end_document(&mut self) -> Result<()> {
        self.flush_start()?;
        self.writer.get_mut().flush()?;
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        if namespace.is_empty()
            && prefix != DEFAULT_PREFIX
            && !self.options.allow_prefix_undeclarations
        {
            return Err(Error::PrefixUndeclaration {
                prefix: prefix.to_string(),
            });
        }
        self.pending.push((prefix.to_string(), namespace.to_string()));
        Ok(())
    }

    fn start_element(&mut self, name: &str, attributes: &[RawAttribute]) -> Result<()> {
        self.flush_start()?;

        let mut start = BytesStart::new(name.to_string());
        for (prefix, namespace) in self.pending.drain(..) {
            let key = if prefix.is_empty() {
                XMLNS_PREFIX.to_string()
            } else {
                format!("{}:{}", XMLNS_PREFIX, prefix)
            };
            start.push_attribute((key.as_str(), namespace.as_str()));
        }
        for attribute in attributes
            .iter()
            .filter(|attribute| !attribute.is_namespace_declaration())
        {
            start.push_attribute((attribute.name.as_str(), attribute.value.as_str()));
        }

        self.open_start = Some(start);
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        match self.open_start.take() {
            Some(start) => self.write(Event::Empty(start)),
            None => self.write(Event::End(BytesEnd::new(name))),
        }
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        if let Some(cdata) = self.cdata.as_mut() {
            cdata.push_str(text);
            return Ok(());
        }
        if text.is_empty() {
            return Ok(());
        }
        self.flush_start()?;
        self.write(Event::Text(BytesText::new(text)))
    }

    fn start_cdata(&mut self) -> Result<()> {
        self.flush_start()?;
        self.cdata = Some(String::new());
        Ok(())
    }

    fn end_cdata(&mut self) -> Result<()> {
        let content = self.cdata.take().ok_or_else(|| Error::InvalidStructure {
            message: "end of CDATA section without start".to_string(),
        })?;
        self.write_cdata(&content)
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        if text.contains("--") || text.ends_with('-') {
            return Err(Error::UnprintableComment {
                content: text.to_string(),
            });
        }
        self.flush_start()?;
        self.write(Event::Comment(BytesText::from_escaped(text)))
    }
}

/// Serialize an element tree as a compact XML string.
///
/// # Example
///
/// ```rust
/// use scoped_xml::{ElementBuilder, to_string};
///
/// let root = ElementBuilder::new("root")
///     .namespace("", "urn:d")
///     .element(ElementBuilder::new("child").text("a < b"))
///     .build()
///     .unwrap();
/// assert_eq!(
///     to_string(&root).unwrap(),
///     r#"<root xmlns="urn:d"><child>a &lt; b</child></root>"#
/// );
/// ```
pub fn to_string(root: &Element) -> Result<String> {
    to_string_with_options(root, &PrintOptions::default())
}

pub fn to_string_with_options(root: &Element, options: &PrintOptions) -> Result<String> {
    let mut buffer = Vec::new();
    write_to(root, &mut buffer, options)?;
    String::from_utf8(buffer)
        .map_err(|err| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

/// Serialize an element tree into `out`.
pub fn write_to<W: Write>(root: &Element, out: W, options: &PrintOptions) -> Result<()> {
    let mut writer = XmlWriter::with_options(out, options.clone());
    print_events(root, &mut writer)
}

/// Serialize an element tree into a file, replacing its contents.
pub fn write_file(root: &Element, path: impl AsRef<Path>, options: &PrintOptions) -> Result<()> {
    let path = path.as_ref();
    tracing::debug!(path = %path.display(), "Writing XML file");
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    write_to(root, &mut out, options)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementBuilder, Node, QName, Scope, parse_str, unchecked};

    fn compact(root: &Element) -> String {
        to_string(root).unwrap()
    }

    #[test]
    fn test_empty_and_nested_elements() {
        let root = ElementBuilder::new("root")
            .element(ElementBuilder::new("a"))
            .element(ElementBuilder::new("b").text("t"))
            .build()
            .unwrap();
        insta::assert_snapshot!(compact(&root), @"<root><a/><b>t</b></root>");

        let indented = to_string_with_options(&root, &PrintOptions::indented(2)).unwrap();
        insta::assert_snapshot!(indented, @r"
        <root>
          <a/>
          <b>t</b>
        </root>
        ");
    }

    #[test]
    fn test_namespace_declarations() {
        let root = parse_str(
            r#"<r:root xmlns:r="urn:r" xmlns="urn:d"><item r:id="1"/><r:item xmlns="">x</r:item></r:root>"#,
        )
        .unwrap();
        insta::assert_snapshot!(
            compact(&root),
            @r#"<r:root xmlns="urn:d" xmlns:r="urn:r"><item r:id="1"/><r:item xmlns="">x</r:item></r:root>"#
        );
    }

    #[test]
    fn test_cdata_split_and_comments() {
        let root = ElementBuilder::new("r")
            .cdata("a]]>b")
            .comment(" note ")
            .build()
            .unwrap();
        insta::assert_snapshot!(
            compact(&root),
            @"<r><![CDATA[a]]]]><![CDATA[>b]]><!-- note --></r>"
        );
    }

    #[test]
    fn test_xml_declaration() {
        let root = ElementBuilder::new("r").build().unwrap();
        let options = PrintOptions {
            xml_declaration: true,
            ..PrintOptions::default()
        };
        let xml = to_string_with_options(&root, &options).unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.ends_with("<r/>"));
    }

    #[test]
    fn test_prefix_undeclaration_policy() {
        // An unchecked scope replacement drops the parent's binding of "p".
        let child = Element::empty(QName::unqualified("child").unwrap(), Scope::empty()).unwrap();
        let root = ElementBuilder::new("p:root")
            .namespace("p", "urn:p")
            .build()
            .unwrap();
        let root = unchecked::with_children(root, vec![Node::Element(child)]);

        let err = to_string(&root).unwrap_err();
        assert!(matches!(err, Error::PrefixUndeclaration { prefix } if prefix == "p"));

        let options = PrintOptions {
            allow_prefix_undeclarations: true,
            ..PrintOptions::default()
        };
        insta::assert_snapshot!(
            to_string_with_options(&root, &options).unwrap(),
            @r#"<p:root xmlns:p="urn:p"><child xmlns:p=""/></p:root>"#
        );

        let repaired = root.transform_child_elems(Ok).unwrap();
        assert!(to_string(&repaired).is_ok());
    }

    #[test]
    fn test_reader_events_write_through() {
        let xml = r#"<a xmlns="urn:a"><b xmlns:x="urn:x" x:k="v"/></a>"#;
        let mut writer = XmlWriter::new(Vec::new());
        crate::reader::read_events(xml.as_bytes(), &mut writer).unwrap();
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, xml);
    }

    #[test]
    fn test_empty_cdata_survives_reparse() {
        let root = ElementBuilder::new("r")
            .cdata("")
            .element(ElementBuilder::new("a").cdata(""))
            .build()
            .unwrap();
        let xml = compact(&root);
        insta::assert_snapshot!(xml, @"<r><![CDATA[]]><a><![CDATA[]]></a></r>");
        assert_eq!(parse_str(&xml).unwrap(), root);
    }

    #[test]
    fn test_unprintable_comments_rejected() {
        for content in ["a--b", "trailing-", "-"] {
            let root = ElementBuilder::new("r").comment(content).build().unwrap();
            let err = to_string(&root).unwrap_err();
            assert!(matches!(err, Error::UnprintableComment { .. }));
            assert_eq!(err.kind(), crate::ErrorKind::Output);
        }
        let root = ElementBuilder::new("r").comment("-a-b").build().unwrap();
        assert_eq!(compact(&root), "<r><!---a-b--></r>");
    }
}
