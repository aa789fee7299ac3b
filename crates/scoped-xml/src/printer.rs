//! Streaming printer: turns an element tree back into events.

use crate::event::{EventHandler, RawAttribute};
use crate::{Element, Node, Result, Scope};

/// Push the events of a whole document rooted at `root` into `handler`.
///
/// Each element is preceded by one prefix mapping per entry of
/// `parent_scope.relativize(element_scope)`, in prefix order, and followed by
/// the matching end mappings. The root is relativized against the empty
/// scope, so it declares everything it binds.
pub fn print_events<H: EventHandler + ?Sized>(root: &Element, handler: &mut H) -> Result<()> {
    handler.start_document()?;
    let elements = print_element(root, &Scope::empty(), handler)?;
    handler.end_document()?;
    tracing::debug!(root = %root.name(), elements, "Printed element tree");
    Ok(())
}

/// Push the events of `elem` as if it appeared under an element with
/// `parent_scope`. No document events are sent.
pub fn print_element_events<H: EventHandler + ?Sized>(
    elem: &Element,
    parent_scope: &Scope,
    handler: &mut H,
) -> Result<()> {
    print_element(elem, parent_scope, handler).map(|_| ())
}

/// Returns the number of elements printed.
fn print_element<H: EventHandler + ?Sized>(
    elem: &Element,
    parent_scope: &Scope,
    handler: &mut H,
) -> Result<usize> {
    let declarations = parent_scope.relativize(elem.scope());
    for (prefix, namespace) in declarations.iter() {
        handler.start_prefix_mapping(prefix, namespace)?;
    }

    let name = elem.name().syntactic_name();
    let attributes: Vec<RawAttribute> = elem
        .attributes()
        .map(|(attr_name, value)| RawAttribute::new(attr_name.syntactic_name(), value))
        .collect();
    handler.start_element(&name, &attributes)?;

    let mut elements = 1;
    for child in elem.children() {
        match child {
            Node::Element(child) => elements += print_element(child, elem.scope(), handler)?,
            Node::Text(text) if text.is_cdata() => {
                handler.start_cdata()?;
                handler.characters(text.content())?;
                handler.end_cdata()?;
            }
            Node::Text(text) => handler.characters(text.content())?,
            Node::Comment(comment) => handler.comment(comment.content())?,
        }
    }

    handler.end_element(&name)?;
    for (prefix, _) in declarations.iter() {
        handler.end_prefix_mapping(prefix)?;
    }
    Ok(elements)
}
