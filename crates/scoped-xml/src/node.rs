//! The immutable node model.
//!
//! An [`Element`] owns its name, attributes, [`Scope`] and children. Every
//! element is namespace-consistent by construction: its name resolves to its
//! own namespace in its own scope, and every attribute name resolves the same
//! way against the scope without its default namespace. Elements are never
//! mutated in place; the update API in [`crate::update`] and
//! [`crate::unchecked`] returns new values.

use crate::scope::is_namespace_declaration_name;
use crate::{Error, QName, Result, Scope};
use indexmap::IndexMap;

/// A node in an element tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Text),
    Comment(Comment),
}

impl Node {
    /// A plain text node.
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text(Text::new(content))
    }

    /// A CDATA text node.
    pub fn cdata(content: impl Into<String>) -> Self {
        Node::Text(Text::cdata(content))
    }

    pub fn comment(content: impl Into<String>) -> Self {
        Node::Comment(Comment::new(content))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn into_element(self) -> Option<Element> {
        match self {
            Node::Element(elem) => Some(elem),
            _ => None,
        }
    }

    /// Is this a text node containing only whitespace?
    pub fn is_whitespace_text(&self) -> bool {
        matches!(self, Node::Text(text) if text.is_whitespace())
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Node::Element(elem)
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

impl From<Comment> for Node {
    fn from(comment: Comment) -> Self {
        Node::Comment(comment)
    }
}

/// Character data, optionally marked as a CDATA section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text {
    content: String,
    cdata: bool,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            cdata: false,
        }
    }

    pub fn cdata(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            cdata: true,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_cdata(&self) -> bool {
        self.cdata
    }

    pub fn is_whitespace(&self) -> bool {
        self.content.chars().all(char::is_whitespace)
    }

    pub(crate) fn push_str(&mut self, content: &str) {
        self.content.push_str(content);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Comment {
    content: String,
}

impl Comment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// An element node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) name: QName,
    pub(crate) attributes: IndexMap<QName, String>,
    pub(crate) scope: Scope,
    pub(crate) children: Vec<Node>,
}

impl Element {
    /// Create an element, checking its name and attribute names against `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundPrefix`] or [`Error::InconsistentName`] if a
    /// name does not resolve to its own namespace, and
    /// [`Error::DuplicateAttribute`] if two attributes share an expanded name.
    pub fn new<I>(name: QName, attributes: I, scope: Scope, children: Vec<Node>) -> Result<Self>
    where
        I: IntoIterator<Item = (QName, String)>,
    {
        check_element_name(&name, &scope)?;
        let attributes = collect_attributes(attributes, &scope)?;
        Ok(Self {
            name,
            attributes,
            scope,
            children,
        })
    }

    /// Create an element without attributes and children.
    pub fn empty(name: QName, scope: Scope) -> Result<Self> {
        Self::new(name, [], scope, Vec::new())
    }

    /// Assemble an element whose names were already resolved against `scope`.
    pub(crate) fn from_resolved_parts(
        name: QName,
        attributes: IndexMap<QName, String>,
        scope: Scope,
        children: Vec<Node>,
    ) -> Self {
        Self {
            name,
            attributes,
            scope,
            children,
        }
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn local_name(&self) -> &str {
        self.name.local_name()
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&QName, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name, value.as_str()))
    }

    pub fn attribute(&self, name: &QName) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Value of the no-namespace attribute with this local name.
    pub fn attribute_local(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.matches(None, local_name))
            .map(|(_, value)| value.as_str())
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn into_children(mut self) -> Vec<Node> {
        std::mem::take(&mut self.children)
    }

    // Child axis

    pub fn child_elems(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn filter_child_elems(&self, mut pred: impl FnMut(&Element) -> bool) -> Vec<&Element> {
        self.child_elems().filter(|elem| pred(*elem)).collect()
    }

    pub fn find_child_elem(&self, mut pred: impl FnMut(&Element) -> bool) -> Option<&Element> {
        self.child_elems().find(|elem| pred(*elem))
    }

    /// Child elements with the given expanded name.
    pub fn child_elems_named(&self, namespace: Option<&str>, local_name: &str) -> Vec<&Element> {
        self.filter_child_elems(|elem| elem.name.matches(namespace, local_name))
    }

    pub fn comment_children(&self) -> Vec<&Comment> {
        self.children.iter().filter_map(Node::as_comment).collect()
    }

    // Descendant(-or-self) axes, depth-first pre-order

    /// This element and all its descendant elements, in document order.
    pub fn find_all_elems_or_self(&self) -> Vec<&Element> {
        self.filter_elems_or_self(|_| true)
    }

    /// All descendant elements, in document order.
    pub fn find_all_elems(&self) -> Vec<&Element> {
        self.filter_elems(|_| true)
    }

    pub fn filter_elems_or_self(&self, pred: impl FnMut(&Element) -> bool) -> Vec<&Element> {
        collect_pre_order(vec![self], pred, false)
    }

    pub fn filter_elems(&self, pred: impl FnMut(&Element) -> bool) -> Vec<&Element> {
        collect_pre_order(self.child_elems().rev().collect(), pred, false)
    }

    pub fn find_elem_or_self(&self, pred: impl FnMut(&Element) -> bool) -> Option<&Element> {
        find_pre_order(vec![self], pred)
    }

    pub fn find_elem(&self, pred: impl FnMut(&Element) -> bool) -> Option<&Element> {
        find_pre_order(self.child_elems().rev().collect(), pred)
    }

    /// Outermost matches among this element and its descendants.
    ///
    /// Once an element matches, nothing below it is visited.
    pub fn find_topmost_elems_or_self(&self, pred: impl FnMut(&Element) -> bool) -> Vec<&Element> {
        collect_pre_order(vec![self], pred, true)
    }

    /// Outermost matches among the descendants of this element.
    pub fn find_topmost_elems(&self, pred: impl FnMut(&Element) -> bool) -> Vec<&Element> {
        collect_pre_order(self.child_elems().rev().collect(), pred, true)
    }

    // Text

    /// Concatenated content of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(Node::as_text)
            .map(Text::content)
            .collect()
    }

    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// Direct text with whitespace runs collapsed to single spaces.
    pub fn normalized_text(&self) -> String {
        self.text().split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Every text node below this element, in document order.
    pub fn descendant_text_nodes(&self) -> Vec<&Text> {
        let mut result = Vec::new();
        let mut stack: Vec<&Node> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            match node {
                Node::Text(text) => result.push(text),
                Node::Element(elem) => stack.extend(elem.children.iter().rev()),
                Node::Comment(_) => {}
            }
        }
        result
    }
}

impl Drop for Element {
    // Unlinks descendants onto a heap stack so dropping a deep tree does not
    // recurse once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(node) = pending.pop() {
            if let Node::Element(mut elem) = node {
                pending.append(&mut elem.children);
            }
        }
    }
}

/// Pre-order walk; `stack` holds the starting elements in reverse order.
fn collect_pre_order<'a>(
    mut stack: Vec<&'a Element>,
    mut pred: impl FnMut(&Element) -> bool,
    topmost: bool,
) -> Vec<&'a Element> {
    let mut result = Vec::new();
    while let Some(elem) = stack.pop() {
        let matched = pred(elem);
        if matched {
            result.push(elem);
        }
        if !(matched && topmost) {
            stack.extend(elem.child_elems().rev());
        }
    }
    result
}

fn find_pre_order<'a>(
    mut stack: Vec<&'a Element>,
    mut pred: impl FnMut(&Element) -> bool,
) -> Option<&'a Element> {
    while let Some(elem) = stack.pop() {
        if pred(elem) {
            return Some(elem);
        }
        stack.extend(elem.child_elems().rev());
    }
    None
}

/// Check that an element name resolves to its own namespace in `scope`.
pub(crate) fn check_element_name(name: &QName, scope: &Scope) -> Result<()> {
    let resolved = scope.resolve_prefix(name.prefix())?;
    check_resolution(name, resolved)
}

/// Check an attribute name against `scope` without its default namespace.
pub(crate) fn check_attribute_name(name: &QName, scope: &Scope) -> Result<()> {
    if is_namespace_declaration_name(name.prefix(), name.local_name()) {
        return Err(Error::MalformedName {
            name: name.syntactic_name(),
        });
    }
    let resolved = if name.prefix().is_empty() {
        None
    } else {
        scope.resolve_prefix(name.prefix())?
    };
    check_resolution(name, resolved)
}

fn check_resolution(name: &QName, resolved: Option<&str>) -> Result<()> {
    if resolved == name.namespace() {
        Ok(())
    } else {
        Err(Error::InconsistentName {
            name: name.syntactic_name(),
            declared: name.namespace().map(str::to_string),
            resolved: resolved.map(str::to_string),
        })
    }
}

pub(crate) fn collect_attributes<I>(attributes: I, scope: &Scope) -> Result<IndexMap<QName, String>>
where
    I: IntoIterator<Item = (QName, String)>,
{
    let mut map = IndexMap::new();
    for (name, value) in attributes {
        check_attribute_name(&name, scope)?;
        if map.contains_key(&name) {
            return Err(Error::DuplicateAttribute {
                name: name.expanded_name(),
            });
        }
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qn(local: &str) -> QName {
        QName::unqualified(local).unwrap()
    }

    fn elem(local: &str, children: Vec<Node>) -> Element {
        Element::new(qn(local), [], Scope::empty(), children).unwrap()
    }

    fn sample() -> Element {
        elem(
            "root",
            vec![
                elem("child", vec![Node::text("child 1")]).into(),
                elem("child", vec![Node::text("child 2")]).into(),
                elem(
                    "child",
                    vec![elem("grandchild", vec![Node::text("grandchild")]).into()],
                )
                .into(),
                elem("child", vec![Node::cdata("child 4")]).into(),
            ],
        )
    }

    #[test]
    fn test_element_name_must_resolve() {
        let scope = Scope::from_pairs([("r", "urn:r")]).unwrap();
        let good = QName::namespaced("r", "urn:r", "root").unwrap();
        assert!(Element::empty(good, scope.clone()).is_ok());

        let wrong_ns = QName::namespaced("r", "urn:other", "root").unwrap();
        assert!(matches!(
            Element::empty(wrong_ns, scope.clone()),
            Err(Error::InconsistentName { .. })
        ));

        let unbound = QName::namespaced("q", "urn:q", "root").unwrap();
        assert!(matches!(
            Element::empty(unbound, scope),
            Err(Error::UnboundPrefix { .. })
        ));
    }

    #[test]
    fn test_unprefixed_element_takes_default_namespace() {
        let scope = Scope::with_default_namespace("urn:d").unwrap();
        assert!(Element::empty(qn("root"), scope.clone()).is_err());
        let named = QName::namespaced("", "urn:d", "root").unwrap();
        assert!(Element::empty(named, scope).is_ok());
    }

    #[test]
    fn test_attributes_ignore_default_namespace() {
        let scope = Scope::from_pairs([("", "urn:d"), ("a", "urn:a")]).unwrap();
        let name = QName::namespaced("", "urn:d", "root").unwrap();

        let plain = (qn("id"), "1".to_string());
        let prefixed = (QName::namespaced("a", "urn:a", "id").unwrap(), "2".to_string());
        let elem = Element::new(name.clone(), [plain, prefixed], scope.clone(), vec![]).unwrap();
        assert_eq!(elem.attribute_local("id"), Some("1"));
        assert_eq!(
            elem.attribute(&QName::namespaced("x", "urn:a", "id").unwrap()),
            Some("2")
        );

        let defaulted = (QName::namespaced("", "urn:d", "id").unwrap(), "3".to_string());
        assert!(Element::new(name, [defaulted], scope, vec![]).is_err());
    }

    #[test]
    fn test_duplicate_attributes_rejected() {
        let scope = Scope::from_pairs([("a", "urn:a"), ("b", "urn:a")]).unwrap();
        let first = (QName::namespaced("a", "urn:a", "id").unwrap(), "1".to_string());
        let second = (QName::namespaced("b", "urn:a", "id").unwrap(), "2".to_string());
        let result = Element::new(qn("root"), [first, second], scope, vec![]);
        assert!(matches!(result, Err(Error::DuplicateAttribute { .. })));
    }

    #[test]
    fn test_descendant_axes() {
        let root = sample();
        assert_eq!(root.find_all_elems_or_self().len(), 6);
        assert_eq!(root.find_all_elems().len(), 5);

        let names: Vec<_> = root
            .find_all_elems_or_self()
            .iter()
            .map(|e| e.local_name())
            .collect();
        assert_eq!(
            names,
            vec!["root", "child", "child", "child", "grandchild", "child"]
        );

        let found = root.find_elem(|e| e.local_name() == "grandchild").unwrap();
        assert_eq!(found.text(), "grandchild");
        assert!(root.find_elem(|e| e.local_name() == "root").is_none());
        assert!(root.find_elem_or_self(|e| e.local_name() == "root").is_some());
    }

    #[test]
    fn test_topmost_stops_at_matches() {
        let root = sample();
        let topmost = root.find_topmost_elems(|_| true);
        assert_eq!(topmost.len(), 4);
        assert!(topmost.iter().all(|e| e.local_name() == "child"));

        let all = root.filter_elems(|_| true);
        assert_eq!(all.len(), 5);

        let self_match = root.find_topmost_elems_or_self(|_| true);
        assert_eq!(self_match.len(), 1);
    }

    #[test]
    fn test_text_queries() {
        let root = sample();
        let texts: Vec<_> = root
            .descendant_text_nodes()
            .into_iter()
            .map(Text::content)
            .collect();
        assert_eq!(texts, vec!["child 1", "child 2", "grandchild", "child 4"]);

        let spaced = elem("p", vec![Node::text("  a \n"), Node::cdata("b  c ")]);
        assert_eq!(spaced.text(), "  a \nb  c ");
        assert_eq!(spaced.trimmed_text(), "a \nb  c");
        assert_eq!(spaced.normalized_text(), "a b c");
    }

    #[test]
    fn test_child_axis() {
        let root = sample();
        assert_eq!(root.child_elems().count(), 4);
        assert_eq!(root.child_elems_named(None, "child").len(), 4);
        let third = root
            .find_child_elem(|e| e.child_elems().next().is_some())
            .unwrap();
        assert_eq!(third.child_elems().count(), 1);
    }

    #[test]
    fn test_xmlns_attribute_names_rejected() {
        let scope = Scope::from_pairs([("a", "urn:a")]).unwrap();
        let plain = (qn("xmlns"), "urn:x".to_string());
        assert!(matches!(
            Element::new(qn("r"), [plain], scope.clone(), vec![]),
            Err(Error::MalformedName { .. })
        ));

        let prefixed = (
            QName::namespaced("xmlns", "http://www.w3.org/2000/xmlns/", "a").unwrap(),
            "urn:a".to_string(),
        );
        assert!(matches!(
            Element::new(qn("r"), [prefixed], scope, vec![]),
            Err(Error::MalformedName { .. })
        ));
    }

    #[test]
    fn test_deep_tree_drops_without_recursion() {
        let mut root = elem("leaf", vec![]);
        for _ in 0..100_000 {
            root = elem("level", vec![root.into()]);
        }
        assert_eq!(root.find_all_elems().len(), 100_000);
        drop(root);
    }
}
