//! Immutable, namespace-scoped XML trees.
//!
//! This crate provides an XML element tree in which every element carries its
//! complete namespace [`Scope`]: the prefix bindings in effect at that
//! element. Elements are immutable values that are namespace-consistent by
//! construction. Trees are built from push-based parse events, updated through
//! a functional API, and printed back as events with the minimal set of
//! namespace declarations.
//!
//! # Overview
//!
//! The main types are:
//! - [`Scope`] and [`Declarations`]: prefix bindings, and the difference between two scopes
//! - [`QName`]: a qualified name, compared by namespace and local name
//! - [`Element`], [`Node`], [`Text`], [`Comment`]: the node model and its queries
//! - [`ElementBuilder`]: tree construction from syntactic names
//! - [`EventHandler`]: the event vocabulary shared by [`TreeBuilder`] (parsing)
//!   and [`XmlWriter`] (printing)
//!
//! Updates come in two tiers. Inherent methods on [`Element`] (see
//! [`update`]) keep every namespace invariant, including that no printed
//! element has to undeclare a non-default prefix. The free functions in
//! [`unchecked`] only check the element being rebuilt.
//!
//! # Example
//!
//! ```rust
//! use scoped_xml::{parse_str, to_string};
//!
//! let root = parse_str(r#"<report xmlns="urn:report" xmlns:x="urn:x">
//!   <finding x:rule="unused">a</finding>
//!   <finding x:rule="shadowed">b</finding>
//! </report>"#).unwrap();
//!
//! let findings = root.child_elems_named(Some("urn:report"), "finding");
//! assert_eq!(findings.len(), 2);
//!
//! let root = root
//!     .without_inter_element_whitespace()
//!     .plus_attribute("x:checked", "yes")
//!     .unwrap();
//! assert_eq!(
//!     to_string(&root).unwrap(),
//!     r#"<report xmlns="urn:report" xmlns:x="urn:x" x:checked="yes"><finding x:rule="unused">a</finding><finding x:rule="shadowed">b</finding></report>"#
//! );
//! ```
//!
//! # Events
//!
//! [`read_events`] drives quick-xml over any [`std::io::BufRead`] and pushes
//! events into a handler; [`print_events`] does the same for a tree. Any
//! source can be connected to any sink:
//!
//! ```rust
//! use scoped_xml::{read_events, XmlWriter};
//!
//! let mut writer = XmlWriter::new(Vec::new());
//! read_events(r#"<a><b/></a>"#.as_bytes(), &mut writer).unwrap();
//! assert_eq!(writer.into_inner(), b"<a><b/></a>");
//! ```

pub mod builder;
pub mod error;
pub mod event;
pub mod node;
pub mod options;
pub mod printer;
pub mod qname;
pub mod reader;
pub mod scope;
pub mod tree_builder;
pub mod unchecked;
pub mod update;
pub mod writer;

// Re-export main types
pub use builder::ElementBuilder;
pub use error::{Error, ErrorKind, Result};
pub use event::{EventHandler, EventRecorder, RawAttribute, XmlEvent};
pub use node::{Comment, Element, Node, Text};
pub use options::{ParseOptions, PrintOptions};
pub use printer::{print_element_events, print_events};
pub use qname::QName;
pub use reader::{parse_file, parse_reader, parse_str, parse_str_with_options, read_events};
pub use scope::{Declarations, Scope, XML_NAMESPACE, XMLNS_NAMESPACE};
pub use tree_builder::TreeBuilder;
pub use update::combine_fragments;
pub use writer::{XmlWriter, to_string, to_string_with_options, write_file, write_to};
