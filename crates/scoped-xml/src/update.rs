//! Safe functional updates.
//!
//! Every method here consumes an [`Element`] and returns a new one that keeps
//! the namespace invariants of the node model. In addition, results never
//! need a non-default prefix undeclaration when printed: whenever elements
//! are placed under a parent, the parent's non-default bindings are pushed
//! down into them. Default namespaces are never pushed down, since that would
//! change the meaning of unprefixed names.
//!
//! Bottom-up transforms are built from their [`crate::unchecked`]
//! counterparts followed by one propagation pass over the result.

use crate::unchecked::{self, rebuild_iterative, rebuild_recursive};
use crate::{Element, Error, Node, QName, Result, Scope};
use std::convert::Infallible;

impl Element {
    /// Append a child, propagating this element's non-default bindings into it.
    pub fn plus_child(mut self, child: impl Into<Node>) -> Element {
        let child = adopt(&self.scope, child.into());
        self.children.push(child);
        self
    }

    pub fn plus_children<I>(mut self, children: I) -> Element
    where
        I: IntoIterator,
        I::Item: Into<Node>,
    {
        let scope = &self.scope;
        let adopted: Vec<_> = children
            .into_iter()
            .map(|child| adopt(scope, child.into()))
            .collect();
        self.children.extend(adopted);
        self
    }

    /// Set an attribute given its syntactic name, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Fails if the name is malformed or uses an unbound prefix.
    pub fn plus_attribute(mut self, name: &str, value: impl Into<String>) -> Result<Element> {
        let name = self.scope.resolve_attribute_qname(name)?;
        self.attributes.insert(name, value.into());
        Ok(self)
    }

    /// Remove an attribute by expanded name.
    pub fn minus_attribute(mut self, name: &QName) -> Element {
        self.attributes.shift_remove(name);
        self
    }

    /// Push the non-default bindings of `parent_scope` down through this tree.
    ///
    /// Each element ends up with `parent.without_default_namespace()` merged
    /// under its own bindings, so no existing binding changes and no
    /// non-default prefix is undeclared between parent and child.
    pub fn not_undeclaring_prefixes(self, parent_scope: &Scope) -> Element {
        let Ok(elem) = rebuild_iterative(self, parent_scope, inherit_bindings, keep);
        elem
    }

    /// Add non-default bindings to this element and all its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DefaultNamespaceExtension`] if `extra` binds the
    /// default namespace, and [`Error::ConflictingBinding`] if it rebinds a
    /// prefix this element already binds to another namespace.
    pub fn with_extended_scope(self, extra: &Scope) -> Result<Element> {
        if let Some(namespace) = extra.default_namespace() {
            return Err(Error::DefaultNamespaceExtension {
                namespace: namespace.to_string(),
            });
        }
        for (prefix, namespace) in extra.iter() {
            match self.scope.namespace_for(prefix) {
                Some(existing) if existing != namespace => {
                    return Err(Error::ConflictingBinding {
                        prefix: prefix.to_string(),
                        existing: existing.to_string(),
                        requested: namespace.to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(self.not_undeclaring_prefixes(extra))
    }

    /// Drop whitespace-only text children from elements that have element
    /// children and no other text. CDATA sections are kept.
    ///
    /// Mixed content is left untouched. Applying this twice gives the same
    /// result as applying it once.
    pub fn without_inter_element_whitespace(self) -> Element {
        let Ok(elem) = rebuild_iterative(self, &Scope::empty(), strip_whitespace, keep);
        elem
    }

    /// Replace each child element by `f(child)`.
    pub fn transform_child_elems<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Element>,
    {
        let elem = unchecked::transform_child_elems(self, f)?;
        Ok(propagate_recursive(elem))
    }

    /// Replace each child element by the nodes `f(child)` returns.
    pub fn transform_child_elems_to_node_seq<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Vec<Node>>,
    {
        let elem = unchecked::transform_child_elems_to_node_seq(self, f)?;
        Ok(propagate_recursive(elem))
    }

    /// Apply `f` bottom-up to this element and every descendant element.
    pub fn transform_descendant_elems_or_self<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Element>,
    {
        let elem = unchecked::transform_descendant_elems_or_self(self, f)?;
        Ok(propagate_recursive(elem))
    }

    /// Apply `f` bottom-up to every descendant element.
    pub fn transform_descendant_elems<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Element>,
    {
        let elem = unchecked::transform_descendant_elems(self, f)?;
        Ok(propagate_recursive(elem))
    }

    /// Replace this element and every descendant element, bottom-up, by the
    /// nodes `f` returns.
    pub fn transform_descendant_elems_or_self_to_node_seq<F>(self, f: F) -> Result<Vec<Node>>
    where
        F: FnMut(Element) -> Result<Vec<Node>>,
    {
        let nodes = unchecked::transform_descendant_elems_or_self_to_node_seq(self, f)?;
        Ok(nodes.into_iter().map(|node| map_element(node, propagate_recursive)).collect())
    }

    pub fn transform_descendant_elems_to_node_seq<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Vec<Node>>,
    {
        let elem = unchecked::transform_descendant_elems_to_node_seq(self, f)?;
        Ok(propagate_recursive(elem))
    }

    pub fn transform_descendant_elems_or_self_iterative<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Element>,
    {
        let elem = unchecked::transform_descendant_elems_or_self_iterative(self, f)?;
        Ok(propagate_iterative(elem))
    }

    pub fn transform_descendant_elems_iterative<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Element>,
    {
        let elem = unchecked::transform_descendant_elems_iterative(self, f)?;
        Ok(propagate_iterative(elem))
    }

    pub fn transform_descendant_elems_or_self_to_node_seq_iterative<F>(
        self,
        f: F,
    ) -> Result<Vec<Node>>
    where
        F: FnMut(Element) -> Result<Vec<Node>>,
    {
        let nodes = unchecked::transform_descendant_elems_or_self_to_node_seq_iterative(self, f)?;
        Ok(nodes.into_iter().map(|node| map_element(node, propagate_iterative)).collect())
    }

    pub fn transform_descendant_elems_to_node_seq_iterative<F>(self, f: F) -> Result<Element>
    where
        F: FnMut(Element) -> Result<Vec<Node>>,
    {
        let elem = unchecked::transform_descendant_elems_to_node_seq_iterative(self, f)?;
        Ok(propagate_iterative(elem))
    }
}

/// Append `fragments` to `container`, in order, through [`Element::plus_child`].
pub fn combine_fragments<I>(container: Element, fragments: I) -> Element
where
    I: IntoIterator<Item = Element>,
{
    let mut count = 0usize;
    let combined = fragments.into_iter().fold(container, |acc, fragment| {
        count += 1;
        acc.plus_child(fragment)
    });
    tracing::debug!(fragments = count, root = %combined.name(), "Combined fragments");
    combined
}

fn adopt(parent_scope: &Scope, node: Node) -> Node {
    map_element(node, |elem| elem.not_undeclaring_prefixes(parent_scope))
}

fn map_element(node: Node, f: impl FnOnce(Element) -> Element) -> Node {
    match node {
        Node::Element(elem) => Node::Element(f(elem)),
        other => other,
    }
}

fn inherit_bindings(parent_scope: &Scope, mut elem: Element) -> std::result::Result<Element, Infallible> {
    let inherited = parent_scope.without_default_namespace();
    if !inherited.is_sub_scope_of(&elem.scope) {
        elem.scope = inherited.resolve(&elem.scope);
    }
    Ok(elem)
}

fn strip_whitespace(
    _parent_scope: &Scope,
    mut elem: Element,
) -> std::result::Result<Element, Infallible> {
    let has_elements = elem.children.iter().any(|n| matches!(n, Node::Element(_)));
    let only_whitespace = elem
        .children
        .iter()
        .filter_map(Node::as_text)
        .all(|text| text.is_whitespace());
    if has_elements && only_whitespace {
        elem.children
            .retain(|n| !matches!(n, Node::Text(text) if !text.is_cdata()));
    }
    Ok(elem)
}

fn keep(elem: Element) -> std::result::Result<Vec<Node>, Infallible> {
    Ok(vec![Node::Element(elem)])
}

/// Internal propagation: the root keeps its own scope.
fn propagate_recursive(elem: Element) -> Element {
    let scope = elem.scope.clone();
    let Ok(elem) = rebuild_recursive(elem, &scope, &mut inherit_bindings, &mut keep);
    elem
}

fn propagate_iterative(elem: Element) -> Element {
    let scope = elem.scope.clone();
    elem.not_undeclaring_prefixes(&scope)
}
