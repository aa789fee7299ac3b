//! Unchecked functional updates.
//!
//! These functions rebuild one element at a time. Each rebuilt element is
//! still checked against its own scope, but nothing keeps it consistent with
//! its descendants: giving an element a new default namespace does not
//! requalify the names below it, and removing a binding can leave
//! descendants that undeclare a prefix when printed.
//!
//! The safe equivalents are inherent methods on [`Element`], see
//! [`crate::update`].
//!
//! Bottom-up transforms exist in two forms. The plain form recurses once per
//! tree level; the `_iterative` form keeps an explicit stack of frames and
//! handles arbitrarily deep trees.

use crate::node::{check_element_name, collect_attributes};
use crate::{Element, Node, QName, Result, Scope};

/// Replace the element name.
///
/// # Errors
///
/// Fails if `name` does not resolve to its own namespace in the element's scope.
pub fn with_name(elem: Element, name: QName) -> Result<Element> {
    check_element_name(&name, &elem.scope)?;
    let mut elem = elem;
    elem.name = name;
    Ok(elem)
}

/// Replace all attributes.
pub fn with_attributes<I>(elem: Element, attributes: I) -> Result<Element>
where
    I: IntoIterator<Item = (QName, String)>,
{
    let attributes = collect_attributes(attributes, &elem.scope)?;
    let mut elem = elem;
    elem.attributes = attributes;
    Ok(elem)
}

/// Replace the scope. The element's own names must still resolve; its
/// descendants are left as they are.
pub fn with_scope(mut elem: Element, scope: Scope) -> Result<Element> {
    check_element_name(&elem.name, &scope)?;
    let attributes = std::mem::take(&mut elem.attributes);
    elem.attributes = collect_attributes(attributes, &scope)?;
    elem.scope = scope;
    Ok(elem)
}

pub fn with_children(mut elem: Element, children: Vec<Node>) -> Element {
    elem.children = children;
    elem
}

/// Replace each child element by `f(child)`.
pub fn transform_child_elems<F>(elem: Element, mut f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Element>,
{
    transform_child_elems_to_node_seq(elem, |child| Ok(vec![Node::Element(f(child)?)]))
}

/// Replace each child element by the nodes `f(child)` returns.
pub fn transform_child_elems_to_node_seq<F>(mut elem: Element, mut f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Vec<Node>>,
{
    let children = std::mem::take(&mut elem.children);
    let mut result = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::Element(child) => result.extend(f(child)?),
            other => result.push(other),
        }
    }
    elem.children = result;
    Ok(elem)
}

/// Apply `f` to every element, this one included, children before parents.
pub fn transform_descendant_elems_or_self<F>(elem: Element, mut f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Element>,
{
    let elem = transform_descendant_elems(elem, &mut f)?;
    f(elem)
}

/// Apply `f` to every descendant element, children before parents.
pub fn transform_descendant_elems<F>(elem: Element, mut f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Element>,
{
    rebuild_recursive(
        elem,
        &Scope::empty(),
        &mut keep_open,
        &mut |e: Element| -> Result<Vec<Node>> { Ok(vec![Node::Element(f(e)?)]) },
    )
}

/// Replace every element, this one included, by the nodes `f` returns,
/// children before parents.
pub fn transform_descendant_elems_or_self_to_node_seq<F>(elem: Element, mut f: F) -> Result<Vec<Node>>
where
    F: FnMut(Element) -> Result<Vec<Node>>,
{
    let elem = transform_descendant_elems_to_node_seq(elem, &mut f)?;
    f(elem)
}

/// Replace every descendant element by the nodes `f` returns, children
/// before parents.
pub fn transform_descendant_elems_to_node_seq<F>(elem: Element, mut f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Vec<Node>>,
{
    rebuild_recursive(elem, &Scope::empty(), &mut keep_open, &mut f)
}

/// Explicit-stack form of [`transform_descendant_elems_or_self`].
pub fn transform_descendant_elems_or_self_iterative<F>(elem: Element, mut f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Element>,
{
    let elem = transform_descendant_elems_iterative(elem, &mut f)?;
    f(elem)
}

/// Explicit-stack form of [`transform_descendant_elems`].
pub fn transform_descendant_elems_iterative<F>(elem: Element, mut f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Element>,
{
    rebuild_iterative(elem, &Scope::empty(), keep_open, |e: Element| -> Result<Vec<Node>> {
        Ok(vec![Node::Element(f(e)?)])
    })
}

/// Explicit-stack form of [`transform_descendant_elems_or_self_to_node_seq`].
pub fn transform_descendant_elems_or_self_to_node_seq_iterative<F>(
    elem: Element,
    mut f: F,
) -> Result<Vec<Node>>
where
    F: FnMut(Element) -> Result<Vec<Node>>,
{
    let elem = transform_descendant_elems_to_node_seq_iterative(elem, &mut f)?;
    f(elem)
}

/// Explicit-stack form of [`transform_descendant_elems_to_node_seq`].
pub fn transform_descendant_elems_to_node_seq_iterative<F>(elem: Element, f: F) -> Result<Element>
where
    F: FnMut(Element) -> Result<Vec<Node>>,
{
    rebuild_iterative(elem, &Scope::empty(), keep_open, f)
}

fn keep_open(_parent_scope: &Scope, elem: Element) -> Result<Element> {
    Ok(elem)
}

/// Rebuild a tree with two hooks.
///
/// `open` runs top-down on every element, the root included, before its
/// children are visited; it receives the scope of the already opened parent
/// (`parent_scope` for the root). `close` runs bottom-up on every element
/// below the root once its children are rebuilt, and returns the nodes that
/// replace it. The root is returned with rebuilt children but not closed.
pub(crate) fn rebuild_recursive<O, C, E>(
    elem: Element,
    parent_scope: &Scope,
    open: &mut O,
    close: &mut C,
) -> std::result::Result<Element, E>
where
    O: FnMut(&Scope, Element) -> std::result::Result<Element, E>,
    C: FnMut(Element) -> std::result::Result<Vec<Node>, E>,
{
    let mut elem = open(parent_scope, elem)?;
    let children = std::mem::take(&mut elem.children);
    let mut rebuilt = Vec::with_capacity(children.len());
    for child in children {
        match child {
            Node::Element(child) => {
                let child = rebuild_recursive(child, &elem.scope, open, close)?;
                rebuilt.extend(close(child)?);
            }
            other => rebuilt.push(other),
        }
    }
    elem.children = rebuilt;
    Ok(elem)
}

/// An element whose children are being rebuilt.
struct Frame {
    /// The opened element, children taken out.
    elem: Element,
    pending: std::vec::IntoIter<Node>,
    done: Vec<Node>,
}

impl Frame {
    fn new(mut elem: Element) -> Self {
        let children = std::mem::take(&mut elem.children);
        Self {
            done: Vec::with_capacity(children.len()),
            pending: children.into_iter(),
            elem,
        }
    }

    fn into_element(self) -> Element {
        let mut elem = self.elem;
        elem.children = self.done;
        elem
    }
}

/// Explicit-stack form of [`rebuild_recursive`], same hook order.
pub(crate) fn rebuild_iterative<O, C, E>(
    root: Element,
    parent_scope: &Scope,
    mut open: O,
    mut close: C,
) -> std::result::Result<Element, E>
where
    O: FnMut(&Scope, Element) -> std::result::Result<Element, E>,
    C: FnMut(Element) -> std::result::Result<Vec<Node>, E>,
{
    let mut stack: Vec<Frame> = Vec::new();
    let mut current = Frame::new(open(parent_scope, root)?);

    loop {
        match current.pending.next() {
            Some(Node::Element(child)) => {
                let child = open(&current.elem.scope, child)?;
                stack.push(std::mem::replace(&mut current, Frame::new(child)));
            }
            Some(other) => current.done.push(other),
            None => {
                let elem = current.into_element();
                match stack.pop() {
                    Some(parent) => {
                        current = parent;
                        current.done.extend(close(elem)?);
                    }
                    None => return Ok(elem),
                }
            }
        }
    }
}
