//! Parse and print configuration.
//!
//! Both option structs deserialize from kebab-case keys with every field
//! optional, so they can be embedded in a host application's configuration:
//!
//! ```rust
//! use scoped_xml::PrintOptions;
//!
//! let options: PrintOptions = serde_json::from_str(r#"{"indent": 4}"#).unwrap();
//! assert_eq!(options.indent, Some(4));
//! assert!(!options.xml_declaration);
//! ```

use serde::{Deserialize, Serialize};

/// Options for building trees from events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ParseOptions {
    /// Keep comments inside the root element as [`crate::Node::Comment`] nodes.
    pub keep_comments: bool,

    /// Remove whitespace-only text between element children.
    ///
    /// See [`crate::Element::without_inter_element_whitespace`].
    pub strip_ignorable_whitespace: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            keep_comments: true,
            strip_ignorable_whitespace: false,
        }
    }
}

/// Options for rendering events as XML text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PrintOptions {
    /// Indent nested start tags by this many spaces. `None` writes no extra whitespace.
    pub indent: Option<usize>,

    /// Write an `<?xml version="1.0" encoding="UTF-8"?>` declaration.
    pub xml_declaration: bool,

    /// Write `xmlns:p=""` for undeclared non-default prefixes (XML 1.1
    /// namespaces). When `false` such an undeclaration is an error.
    pub allow_prefix_undeclarations: bool,
}

impl PrintOptions {
    /// Options for indented output.
    pub fn indented(indent: usize) -> Self {
        Self {
            indent: Some(indent),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_from_json() {
        let options: ParseOptions =
            serde_json::from_str(r#"{"strip-ignorable-whitespace": true}"#).unwrap();
        assert!(options.keep_comments);
        assert!(options.strip_ignorable_whitespace);
    }

    #[test]
    fn test_print_options_defaults() {
        let options: PrintOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PrintOptions::default());
        assert_eq!(PrintOptions::indented(2).indent, Some(2));
    }
}
