//! Building element trees from syntactic names.
//!
//! [`ElementBuilder`] mirrors how the tree would be written as XML: names
//! are `prefix:local` strings and namespaces are declared on the element that
//! introduces them. Nested builders inherit the scope of their parent, default
//! namespace included. Nothing is resolved until [`ElementBuilder::build`],
//! which reports the first problem found.
//!
//! ```rust
//! use scoped_xml::ElementBuilder;
//!
//! let report = ElementBuilder::new("report")
//!     .namespace("", "urn:report")
//!     .namespace("x", "urn:extra")
//!     .attribute("version", "1")
//!     .element(
//!         ElementBuilder::new("finding")
//!             .attribute("x:severity", "high")
//!             .text("unused variable"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let finding = report.child_elems().next().unwrap();
//! assert_eq!(finding.name().namespace(), Some("urn:report"));
//! assert_eq!(finding.text(), "unused variable");
//! ```

use crate::node::Text;
use crate::{Declarations, Element, Error, Node, Result, Scope};
use indexmap::IndexMap;

/// Deferred description of an element and its content.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    name: String,
    declarations: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    content: Vec<Content>,
}

#[derive(Debug, Clone)]
enum Content {
    Node(Node),
    Builder(ElementBuilder),
}

impl ElementBuilder {
    /// Start an element with a syntactic name such as `item` or `p:item`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declarations: Vec::new(),
            attributes: Vec::new(),
            content: Vec::new(),
        }
    }

    /// Declare a prefix on this element. `""` is the default namespace; an
    /// empty `namespace` undeclares the prefix.
    pub fn namespace(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.declarations.push((prefix.into(), namespace.into()));
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(self, content: impl Into<String>) -> Self {
        self.child(Text::new(content))
    }

    pub fn cdata(self, content: impl Into<String>) -> Self {
        self.child(Text::cdata(content))
    }

    pub fn comment(self, content: impl Into<String>) -> Self {
        self.child(Node::comment(content))
    }

    /// Append an already built node.
    ///
    /// Elements keep their own scope; the non-default bindings in effect here
    /// are added to them as by [`Element::plus_child`].
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.content.push(Content::Node(node.into()));
        self
    }

    /// Append a nested builder, resolved in this element's scope.
    pub fn element(mut self, builder: ElementBuilder) -> Self {
        self.content.push(Content::Builder(builder));
        self
    }

    /// Resolve everything against the empty scope.
    pub fn build(self) -> Result<Element> {
        self.build_in(&Scope::empty())
    }

    /// Resolve everything against `parent_scope`.
    ///
    /// # Errors
    ///
    /// Fails on the first malformed name, unbound prefix, invalid
    /// declaration or duplicate attribute.
    pub fn build_in(self, parent_scope: &Scope) -> Result<Element> {
        let declarations = Declarations::from_pairs(self.declarations)?;
        let scope = parent_scope.resolve_declarations(&declarations);
        let name = scope.resolve_qname(&self.name)?;

        let mut attributes = IndexMap::with_capacity(self.attributes.len());
        for (raw_name, value) in self.attributes {
            let attr_name = scope.resolve_attribute_qname(&raw_name)?;
            if attributes.contains_key(&attr_name) {
                return Err(Error::DuplicateAttribute {
                    name: attr_name.expanded_name(),
                });
            }
            attributes.insert(attr_name, value);
        }

        let mut children = Vec::with_capacity(self.content.len());
        for content in self.content {
            children.push(match content {
                Content::Node(Node::Element(elem)) => {
                    Node::Element(elem.not_undeclaring_prefixes(&scope))
                }
                Content::Node(node) => node,
                Content::Builder(builder) => Node::Element(builder.build_in(&scope)?),
            });
        }

        Ok(Element::from_resolved_parts(name, attributes, scope, children))
    }
}
