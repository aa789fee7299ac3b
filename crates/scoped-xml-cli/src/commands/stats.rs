//! Stats command implementation

use anyhow::{Context, Result};
use scoped_xml::{Element, Node, ParseOptions, parse_file};
use std::collections::BTreeSet;
use std::path::Path;

pub fn execute(input: &Path) -> Result<()> {
    let root = parse_file(input, ParseOptions::default())
        .with_context(|| format!("Failed to parse {}", input.display()))?;
    let stats = DocumentStats::collect(&root);

    println!("{}", input.display());
    println!("  elements:   {}", stats.elements);
    println!("  attributes: {}", stats.attributes);
    println!("  text nodes: {}", stats.text_nodes);
    println!("  comments:   {}", stats.comments);
    println!("  max depth:  {}", stats.max_depth);
    println!("  namespaces:");
    for namespace in &stats.namespaces {
        println!("    {}", namespace);
    }
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub elements: usize,
    pub attributes: usize,
    pub text_nodes: usize,
    pub comments: usize,
    pub max_depth: usize,
    /// Namespaces of element and attribute names.
    pub namespaces: BTreeSet<String>,
}

impl DocumentStats {
    pub fn collect(root: &Element) -> Self {
        let mut stats = Self::default();
        let mut stack = vec![(root, 1usize)];
        while let Some((elem, depth)) = stack.pop() {
            stats.elements += 1;
            stats.max_depth = stats.max_depth.max(depth);
            stats.namespaces.extend(elem.name().namespace().map(str::to_string));
            for (name, _) in elem.attributes() {
                stats.attributes += 1;
                stats.namespaces.extend(name.namespace().map(str::to_string));
            }
            for child in elem.children() {
                match child {
                    Node::Element(child) => stack.push((child, depth + 1)),
                    Node::Text(_) => stats.text_nodes += 1,
                    Node::Comment(_) => stats.comments += 1,
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scoped_xml::parse_str;

    #[test]
    fn test_collect() {
        let root = parse_str(
            r#"<r xmlns="urn:r" xmlns:x="urn:x"><a x:k="1">t<!-- c --><b/></a><c/></r>"#,
        )
        .unwrap();
        let stats = DocumentStats::collect(&root);
        assert_eq!(
            stats,
            DocumentStats {
                elements: 4,
                attributes: 1,
                text_nodes: 1,
                comments: 1,
                max_depth: 3,
                namespaces: ["urn:r", "urn:x"].into_iter().map(String::from).collect(),
            }
        );
    }
}
