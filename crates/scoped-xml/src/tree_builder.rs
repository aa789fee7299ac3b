//! Streaming tree construction from push-based events.

use crate::event::{EventHandler, RawAttribute};
use crate::node::Text;
use crate::{Declarations, Element, Error, Node, ParseOptions, QName, Result, Scope};
use indexmap::IndexMap;

/// Builds an [`Element`] tree from [`EventHandler`] events.
///
/// Elements under construction live on an explicit stack of records; a record
/// never points at its parent. `end_element` freezes the top record into an
/// immutable [`Element`] and appends it to the record below, or keeps it as
/// the root.
///
/// # Example
///
/// ```rust
/// use scoped_xml::{EventHandler, TreeBuilder};
///
/// let mut builder = TreeBuilder::new();
/// builder.start_document().unwrap();
/// builder.start_prefix_mapping("", "urn:example").unwrap();
/// builder.start_element("root", &[]).unwrap();
/// builder.characters("hello").unwrap();
/// builder.end_element("root").unwrap();
/// builder.end_document().unwrap();
///
/// let root = builder.finish().unwrap();
/// assert_eq!(root.name().namespace(), Some("urn:example"));
/// assert_eq!(root.text(), "hello");
/// ```
#[derive(Debug, Default)]
pub struct TreeBuilder {
    options: ParseOptions,

    /// Stack of elements being built.
    stack: Vec<BuildNode>,

    /// Declarations collected since the last element boundary.
    pending: Declarations,

    root: Option<Element>,

    in_cdata: bool,

    /// Whether the last text child of the top record may still grow.
    text_run_open: bool,

    ended: bool,
}

/// An element being constructed during parsing.
#[derive(Debug)]
struct BuildNode {
    /// Syntactic name, checked against the end tag.
    raw_name: String,
    name: QName,
    attributes: IndexMap<QName, String>,
    scope: Scope,
    children: Vec<Node>,
}

impl BuildNode {
    fn into_element(self) -> Element {
        Element::from_resolved_parts(self.name, self.attributes, self.scope, self.children)
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::with_options(ParseOptions::default())
    }

    pub fn with_options(options: ParseOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Return the completed root element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnexpectedEof`] if `end_document` was never received.
    pub fn finish(self) -> Result<Element> {
        if !self.ended {
            return Err(Error::UnexpectedEof {
                expected: "end of document".to_string(),
            });
        }
        let root = self.root.ok_or(Error::EmptyDocument)?;
        if self.options.strip_ignorable_whitespace {
            Ok(root.without_inter_element_whitespace())
        } else {
            Ok(root)
        }
    }

    fn parent_scope(&self) -> Scope {
        self.stack
            .last()
            .map(|node| node.scope.clone())
            .unwrap_or_default()
    }

    fn push_text(&mut self, content: &str) -> Result<()> {
        let cdata = self.in_cdata;
        let run_open = self.text_run_open;
        let Some(node) = self.stack.last_mut() else {
            if content.trim().is_empty() {
                return Ok(());
            }
            return Err(Error::InvalidStructure {
                message: format!("text outside the root element: {:?}", content.trim()),
            });
        };

        match node.children.last_mut() {
            Some(Node::Text(text)) if run_open && text.is_cdata() == cdata => {
                text.push_str(content);
            }
            _ => {
                let text = if cdata {
                    Text::cdata(content)
                } else {
                    Text::new(content)
                };
                node.children.push(Node::Text(text));
            }
        }
        self.text_run_open = true;
        Ok(())
    }

    fn ensure_open(&self, event: &str) -> Result<()> {
        if self.ended {
            return Err(Error::InvalidStructure {
                message: format!("{} after end of document", event),
            });
        }
        Ok(())
    }
}

impl EventHandler for TreeBuilder {
    fn end_document(&mut self) -> Result<()> {
        self.ensure_open("end of document")?;
        if let Some(node) = self.stack.last() {
            return Err(Error::UnexpectedEof {
                expected: format!("closing tag </{}>", node.raw_name),
            });
        }
        if self.root.is_none() {
            return Err(Error::EmptyDocument);
        }
        self.ended = true;
        tracing::debug!(root = %self.root.as_ref().map(|r| r.name().to_string()).unwrap_or_default(), "Tree built");
        Ok(())
    }

    fn start_prefix_mapping(&mut self, prefix: &str, namespace: &str) -> Result<()> {
        self.ensure_open("prefix mapping")?;
        self.pending.insert(prefix, namespace)
    }

    fn start_element(&mut self, name: &str, attributes: &[RawAttribute]) -> Result<()> {
        self.ensure_open("start tag")?;
        if self.stack.is_empty() && self.root.is_some() {
            return Err(Error::MultipleRoots {
                name: name.to_string(),
            });
        }

        let declarations = std::mem::take(&mut self.pending);
        let scope = self.parent_scope().resolve_declarations(&declarations);
        let qname = scope.resolve_qname(name)?;

        let attribute_scope = scope.without_default_namespace();
        let mut resolved = IndexMap::with_capacity(attributes.len());
        for attribute in attributes
            .iter()
            .filter(|attribute| !attribute.is_namespace_declaration())
        {
            let attr_name = attribute_scope.resolve_attribute_qname(&attribute.name)?;
            if resolved.contains_key(&attr_name) {
                return Err(Error::DuplicateAttribute {
                    name: attr_name.expanded_name(),
                });
            }
            resolved.insert(attr_name, attribute.value.clone());
        }

        self.stack.push(BuildNode {
            raw_name: name.to_string(),
            name: qname,
            attributes: resolved,
            scope,
            children: Vec::new(),
        });
        self.text_run_open = false;
        Ok(())
    }

    fn end_element(&mut self, name: &str) -> Result<()> {
        let node = self.stack.pop().ok_or_else(|| Error::InvalidStructure {
            message: format!("Unexpected closing tag </{}>", name),
        })?;

        if node.raw_name != name {
            return Err(Error::MismatchedEndTag {
                expected: node.raw_name,
                found: name.to_string(),
            });
        }

        let element = node.into_element();
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None => self.root = Some(element),
        }
        self.text_run_open = false;
        Ok(())
    }

    fn characters(&mut self, text: &str) -> Result<()> {
        self.ensure_open("character data")?;
        if text.is_empty() {
            return Ok(());
        }
        self.push_text(text)
    }

    fn start_cdata(&mut self) -> Result<()> {
        self.ensure_open("CDATA section")?;
        if self.in_cdata {
            return Err(Error::InvalidStructure {
                message: "nested CDATA section".to_string(),
            });
        }
        self.in_cdata = true;
        self.text_run_open = false;
        Ok(())
    }

    fn end_cdata(&mut self) -> Result<()> {
        if !self.in_cdata {
            return Err(Error::InvalidStructure {
                message: "end of CDATA section without start".to_string(),
            });
        }
        self.in_cdata = false;
        // An empty section still yields a CDATA node.
        if !self.text_run_open {
            if let Some(node) = self.stack.last_mut() {
                node.children.push(Node::cdata(""));
            }
        }
        self.text_run_open = false;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.ensure_open("comment")?;
        if !self.options.keep_comments {
            return Ok(());
        }
        if let Some(node) = self.stack.last_mut() {
            node.children.push(Node::comment(text));
            self.text_run_open = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(feed: impl FnOnce(&mut TreeBuilder) -> Result<()>) -> Result<Element> {
        let mut builder = TreeBuilder::new();
        builder.start_document()?;
        feed(&mut builder)?;
        builder.end_document()?;
        builder.finish()
    }

    #[test]
    fn test_scope_inherited_from_parent() {
        let root = build(|b| {
            b.start_prefix_mapping("", "urn:d")?;
            b.start_prefix_mapping("a", "urn:a")?;
            b.start_element("root", &[])?;
            b.start_element("a:child", &[RawAttribute::new("a:id", "1")])?;
            b.end_element("a:child")?;
            b.start_prefix_mapping("", "")?;
            b.start_element("plain", &[])?;
            b.end_element("plain")?;
            b.end_element("root")
        })
        .unwrap();

        let children: Vec<_> = root.child_elems().collect();
        assert_eq!(children[0].name().namespace(), Some("urn:a"));
        assert_eq!(children[0].scope(), root.scope());
        assert_eq!(children[0].attribute_local("id"), None);
        assert_eq!(children[1].name().namespace(), None);
        assert_eq!(children[1].scope().default_namespace(), None);
        assert_eq!(children[1].scope().namespace_for("a"), Some("urn:a"));
    }

    #[test]
    fn test_last_declaration_wins() {
        let root = build(|b| {
            b.start_prefix_mapping("p", "urn:first")?;
            b.start_prefix_mapping("p", "urn:second")?;
            b.start_element("p:root", &[])?;
            b.end_element("p:root")
        })
        .unwrap();
        assert_eq!(root.name().namespace(), Some("urn:second"));
    }

    #[test]
    fn test_namespace_attributes_discarded() {
        let attrs = [
            RawAttribute::new("xmlns", "urn:d"),
            RawAttribute::new("xmlns:x", "urn:x"),
            RawAttribute::new("id", "7"),
        ];
        let root = build(|b| {
            b.start_prefix_mapping("", "urn:d")?;
            b.start_prefix_mapping("x", "urn:x")?;
            b.start_element("root", &attrs)?;
            b.end_element("root")
        })
        .unwrap();
        assert_eq!(root.attributes().count(), 1);
        let (name, value) = root.attributes().next().unwrap();
        assert_eq!(name.namespace(), None);
        assert_eq!(value, "7");
    }

    #[test]
    fn test_unbound_prefix_fails() {
        let err = build(|b| b.start_element("p:root", &[])).unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix { prefix } if prefix == "p"));
    }

    #[test]
    fn test_cdata_runs_not_merged() {
        let root = build(|b| {
            b.start_element("root", &[])?;
            b.characters("a")?;
            b.characters("b")?;
            b.start_cdata()?;
            b.characters("c")?;
            b.end_cdata()?;
            b.characters("d")?;
            b.start_cdata()?;
            b.characters("e")?;
            b.end_cdata()?;
            b.start_cdata()?;
            b.characters("f")?;
            b.end_cdata()?;
            b.end_element("root")
        })
        .unwrap();

        let texts: Vec<_> = root
            .children()
            .iter()
            .filter_map(Node::as_text)
            .map(|t| (t.content(), t.is_cdata()))
            .collect();
        assert_eq!(
            texts,
            vec![
                ("ab", false),
                ("c", true),
                ("d", false),
                ("e", true),
                ("f", true)
            ]
        );
    }

    #[test]
    fn test_terminal_states() {
        let mut builder = TreeBuilder::new();
        builder.start_document().unwrap();
        assert!(matches!(builder.end_document(), Err(Error::EmptyDocument)));

        let mut builder = TreeBuilder::new();
        builder.start_element("root", &[]).unwrap();
        assert!(matches!(
            builder.end_document(),
            Err(Error::UnexpectedEof { .. })
        ));

        let mut builder = TreeBuilder::new();
        builder.start_element("root", &[]).unwrap();
        builder.end_element("root").unwrap();
        assert!(matches!(builder.finish(), Err(Error::UnexpectedEof { .. })));
    }

    #[test]
    fn test_structural_errors() {
        let err = build(|b| {
            b.start_element("root", &[])?;
            b.end_element("other")
        })
        .unwrap_err();
        assert!(matches!(err, Error::MismatchedEndTag { .. }));

        let err = build(|b| {
            b.start_element("a", &[])?;
            b.end_element("a")?;
            b.start_element("b", &[])
        })
        .unwrap_err();
        assert!(matches!(err, Error::MultipleRoots { name } if name == "b"));

        let err = build(|b| b.characters("stray")).unwrap_err();
        assert!(matches!(err, Error::InvalidStructure { .. }));
    }

    #[test]
    fn test_comments_follow_options() {
        let feed = |b: &mut TreeBuilder| -> Result<()> {
            b.start_document()?;
            b.comment("outside")?;
            b.start_element("root", &[])?;
            b.comment("inside")?;
            b.end_element("root")?;
            b.end_document()
        };

        let mut keep = TreeBuilder::new();
        feed(&mut keep).unwrap();
        let root = keep.finish().unwrap();
        assert_eq!(root.comment_children().len(), 1);

        let mut skip = TreeBuilder::with_options(ParseOptions {
            keep_comments: false,
            ..ParseOptions::default()
        });
        feed(&mut skip).unwrap();
        assert!(skip.finish().unwrap().children().is_empty());
    }
}
