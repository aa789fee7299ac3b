//! Namespace scopes and declarations.
//!
//! A [`Scope`] is the set of prefix bindings in effect at one element. A
//! [`Declarations`] value is the difference between two scopes: what has to
//! be (re)declared, or undeclared, to get from a parent's scope to a child's.
//!
//! Both are plain immutable values. The parser derives each element's scope by
//! applying the declarations found on its start tag to the parent scope; the
//! printer goes the other way and relativizes each element's scope against its
//! parent's to find the minimal set of `xmlns` attributes to write.

use crate::qname::{is_ncname, split_syntactic_name};
use crate::{Error, QName, Result};
use std::collections::BTreeMap;

/// Namespace bound to the reserved `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Namespace of `xmlns` pseudo-attributes.
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// The reserved `xml` prefix. Implicitly bound, never stored in a [`Scope`].
pub const XML_PREFIX: &str = "xml";

/// The reserved `xmlns` prefix. Never bound.
pub const XMLNS_PREFIX: &str = "xmlns";

/// The prefix of the default namespace.
pub const DEFAULT_PREFIX: &str = "";

/// Immutable mapping from prefix to namespace URI.
///
/// Invariants: no prefix maps to an empty namespace, and the reserved `xml`
/// and `xmlns` prefixes are never stored. Iteration is in prefix order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    bindings: BTreeMap<String, String>,
}

impl Scope {
    /// The empty scope.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a scope from `(prefix, namespace)` pairs.
    ///
    /// An explicit binding of `xml` to [`XML_NAMESPACE`] is accepted and
    /// dropped. Later pairs overwrite earlier ones for the same prefix.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] for an empty namespace, a binding of
    /// `xmlns`, or a binding of `xml` to any other namespace.
    pub fn from_pairs<I, P, N>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<String>,
        N: Into<String>,
    {
        let mut bindings = BTreeMap::new();
        for (prefix, namespace) in pairs {
            let (prefix, namespace) = (prefix.into(), namespace.into());
            if namespace.is_empty() {
                return Err(Error::InvalidScope {
                    message: format!("prefix '{}' bound to the empty namespace", prefix),
                });
            }
            if check_reserved(&prefix, &namespace)? {
                bindings.insert(prefix, namespace);
            }
        }
        Ok(Self { bindings })
    }

    /// Scope binding only the default namespace.
    pub fn with_default_namespace(namespace: impl Into<String>) -> Result<Self> {
        Self::from_pairs([(DEFAULT_PREFIX, namespace.into())])
    }

    pub fn default_namespace(&self) -> Option<&str> {
        self.bindings.get(DEFAULT_PREFIX).map(String::as_str)
    }

    /// Look up a prefix without failing; `xml` resolves implicitly.
    pub fn namespace_for(&self, prefix: &str) -> Option<&str> {
        if prefix == XML_PREFIX {
            return Some(XML_NAMESPACE);
        }
        self.bindings.get(prefix).map(String::as_str)
    }

    /// Resolve a prefix.
    ///
    /// The default prefix resolves to `None` when no default namespace is
    /// bound. Any other prefix must be bound (or be `xml`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnboundPrefix`] for an unbound non-default prefix.
    pub fn resolve_prefix(&self, prefix: &str) -> Result<Option<&str>> {
        if prefix == DEFAULT_PREFIX {
            return Ok(self.default_namespace());
        }
        match self.namespace_for(prefix) {
            Some(namespace) => Ok(Some(namespace)),
            None => Err(Error::UnboundPrefix {
                prefix: prefix.to_string(),
            }),
        }
    }

    /// Resolve a syntactic element name (`prefix:local` or `local`).
    pub fn resolve_qname(&self, syntactic: &str) -> Result<QName> {
        let (prefix, local) = split_syntactic_name(syntactic)?;
        let namespace = self.resolve_prefix(prefix)?.map(str::to_string);
        QName::new(prefix, namespace, local)
    }

    /// Resolve a syntactic attribute name. Unprefixed attributes never take
    /// the default namespace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedName`] for `xmlns` and `xmlns:*`, which are
    /// namespace declarations and not attributes.
    pub fn resolve_attribute_qname(&self, syntactic: &str) -> Result<QName> {
        let (prefix, local) = split_syntactic_name(syntactic)?;
        if is_namespace_declaration_name(prefix, local) {
            return Err(Error::MalformedName {
                name: syntactic.to_string(),
            });
        }
        if prefix == DEFAULT_PREFIX {
            return QName::unqualified(local);
        }
        let namespace = self.resolve_prefix(prefix)?.map(str::to_string);
        QName::new(prefix, namespace, local)
    }

    /// Merge two scopes; `other` wins for prefixes bound in both.
    pub fn resolve(&self, other: &Scope) -> Scope {
        let mut bindings = self.bindings.clone();
        bindings.extend(
            other
                .bindings
                .iter()
                .map(|(prefix, namespace)| (prefix.clone(), namespace.clone())),
        );
        Scope { bindings }
    }

    /// Apply declarations to this scope; empty namespaces undeclare their prefix.
    pub fn resolve_declarations(&self, declarations: &Declarations) -> Scope {
        let mut bindings = self.bindings.clone();
        for (prefix, namespace) in declarations.iter() {
            if namespace.is_empty() {
                bindings.remove(prefix);
            } else {
                bindings.insert(prefix.to_string(), namespace.to_string());
            }
        }
        Scope { bindings }
    }

    /// The declarations needed to go from this scope to `target`.
    ///
    /// Contains every binding of `target` that is absent or different here,
    /// and an undeclaration (`""`) for every prefix bound here but not in
    /// `target`. Relativizing a scope to itself yields no declarations.
    pub fn relativize(&self, target: &Scope) -> Declarations {
        let mut entries = BTreeMap::new();
        for (prefix, namespace) in &target.bindings {
            if self.bindings.get(prefix) != Some(namespace) {
                entries.insert(prefix.clone(), namespace.clone());
            }
        }
        for prefix in self.bindings.keys() {
            if !target.bindings.contains_key(prefix) {
                entries.insert(prefix.clone(), String::new());
            }
        }
        Declarations { entries }
    }

    /// This scope minus its default namespace; attribute names resolve against it.
    pub fn without_default_namespace(&self) -> Scope {
        let mut bindings = self.bindings.clone();
        bindings.remove(DEFAULT_PREFIX);
        Scope { bindings }
    }

    /// Is every binding of this scope also present, identically, in `other`?
    pub fn is_sub_scope_of(&self, other: &Scope) -> bool {
        self.bindings
            .iter()
            .all(|(prefix, namespace)| other.bindings.get(prefix) == Some(namespace))
    }

    /// Prefixes bound to `namespace`, in prefix order.
    pub fn prefixes_for<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.bindings
            .iter()
            .filter(move |(_, ns)| ns.as_str() == namespace)
            .map(|(prefix, _)| prefix.as_str())
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.bindings.contains_key(prefix)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Iterate over `(prefix, namespace)` pairs in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }
}

/// Prefix declarations and undeclarations.
///
/// A namespace of `""` undeclares the prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Declarations {
    entries: BTreeMap<String, String>,
}

impl Declarations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create declarations from `(prefix, namespace)` pairs; later pairs win.
    pub fn from_pairs<I, P, N>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<String>,
        N: Into<String>,
    {
        let mut declarations = Self::new();
        for (prefix, namespace) in pairs {
            declarations.insert(prefix, namespace)?;
        }
        Ok(declarations)
    }

    /// Record a declaration, replacing any earlier one for the same prefix.
    ///
    /// Declaring `xml` to [`XML_NAMESPACE`] is accepted and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidScope`] for `xmlns`, or for `xml` bound to
    /// anything but [`XML_NAMESPACE`].
    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Result<()> {
        let (prefix, namespace) = (prefix.into(), namespace.into());
        if check_reserved(&prefix, &namespace)? {
            self.entries.insert(prefix, namespace);
        }
        Ok(())
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    /// Iterate over `(prefix, namespace)` entries in prefix order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    /// The new or changed bindings, as a scope.
    pub fn declared(&self) -> Scope {
        Scope {
            bindings: self
                .entries
                .iter()
                .filter(|(_, namespace)| !namespace.is_empty())
                .map(|(prefix, namespace)| (prefix.clone(), namespace.clone()))
                .collect(),
        }
    }

    /// The undeclared prefixes, in prefix order.
    pub fn undeclared(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, namespace)| namespace.is_empty())
            .map(|(prefix, _)| prefix.as_str())
    }

    /// These declarations without any undeclaration.
    pub fn without_undeclarations(&self) -> Declarations {
        Declarations {
            entries: self.declared().bindings,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Validate reserved prefixes. Returns whether the binding should be stored.
/// Is `prefix:local` the name of an `xmlns` pseudo-attribute?
pub(crate) fn is_namespace_declaration_name(prefix: &str, local_name: &str) -> bool {
    prefix == XMLNS_PREFIX || (prefix == DEFAULT_PREFIX && local_name == XMLNS_PREFIX)
}

fn check_reserved(prefix: &str, namespace: &str) -> Result<bool> {
    match prefix {
        XML_PREFIX if namespace == XML_NAMESPACE => Ok(false),
        XML_PREFIX => Err(Error::InvalidScope {
            message: format!("prefix 'xml' cannot be bound to '{}'", namespace),
        }),
        XMLNS_PREFIX => Err(Error::InvalidScope {
            message: "prefix 'xmlns' cannot be declared".to_string(),
        }),
        _ if prefix != DEFAULT_PREFIX && !is_ncname(prefix) => Err(Error::InvalidScope {
            message: format!("'{}' is not a valid prefix", prefix),
        }),
        _ if namespace == XML_NAMESPACE || namespace == XMLNS_NAMESPACE => {
            Err(Error::InvalidScope {
                message: format!("namespace '{}' is reserved", namespace),
            })
        }
        _ => Ok(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, &str)]) -> Scope {
        Scope::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_resolve_default_prefix_is_optional() {
        assert_eq!(Scope::empty().resolve_prefix("").unwrap(), None);
        let s = scope(&[("", "urn:default")]);
        assert_eq!(s.resolve_prefix("").unwrap(), Some("urn:default"));
    }

    #[test]
    fn test_resolve_unbound_prefix_fails() {
        let err = Scope::empty().resolve_prefix("p").unwrap_err();
        assert!(matches!(err, Error::UnboundPrefix { prefix } if prefix == "p"));
    }

    #[test]
    fn test_xml_prefix_is_implicit() {
        let s = Scope::empty();
        assert_eq!(s.resolve_prefix("xml").unwrap(), Some(XML_NAMESPACE));
        assert!(!s.contains_prefix("xml"));

        let explicit = scope(&[("xml", XML_NAMESPACE), ("a", "urn:a")]);
        assert_eq!(explicit.len(), 1);
        assert!(Scope::from_pairs([("xml", "urn:other")]).is_err());
        assert!(Scope::from_pairs([("xmlns", "urn:other")]).is_err());
        assert!(Scope::from_pairs([("a", "")]).is_err());
    }

    #[test]
    fn test_resolve_merges_with_precedence() {
        let parent = scope(&[("", "urn:d"), ("a", "urn:a")]);
        let child = scope(&[("a", "urn:a2"), ("b", "urn:b")]);
        let merged = parent.resolve(&child);
        assert_eq!(merged, scope(&[("", "urn:d"), ("a", "urn:a2"), ("b", "urn:b")]));
    }

    #[test]
    fn test_relativize_to_empty_undeclares() {
        let decls = scope(&[("a", "urn:x")]).relativize(&Scope::empty());
        assert_eq!(decls, Declarations::from_pairs([("a", "")]).unwrap());
        assert_eq!(decls.undeclared().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_relativize_is_minimal() {
        let parent = scope(&[("", "urn:d"), ("a", "urn:a"), ("b", "urn:b")]);
        let child = scope(&[("a", "urn:a"), ("b", "urn:b2"), ("c", "urn:c")]);

        assert!(parent.relativize(&parent).is_empty());

        let decls = parent.relativize(&child);
        assert_eq!(
            decls.iter().collect::<Vec<_>>(),
            vec![("", ""), ("b", "urn:b2"), ("c", "urn:c")]
        );
        assert_eq!(parent.resolve_declarations(&decls), child);
    }

    #[test]
    fn test_without_default_namespace() {
        let s = scope(&[("", "urn:d"), ("a", "urn:a")]);
        assert_eq!(s.without_default_namespace(), scope(&[("a", "urn:a")]));
        assert!(s.without_default_namespace().is_sub_scope_of(&s));
        assert!(!s.is_sub_scope_of(&s.without_default_namespace()));
    }

    #[test]
    fn test_resolve_names() {
        let s = scope(&[("", "urn:d"), ("a", "urn:a")]);

        let elem = s.resolve_qname("item").unwrap();
        assert_eq!(elem.namespace(), Some("urn:d"));

        let attr = s.resolve_attribute_qname("item").unwrap();
        assert_eq!(attr.namespace(), None);

        let prefixed = s.resolve_attribute_qname("a:item").unwrap();
        assert_eq!(prefixed.namespace(), Some("urn:a"));
        assert_eq!(prefixed.prefix(), "a");

        assert!(s.resolve_qname("zz:item").is_err());
    }

    #[test]
    fn test_declarations_last_one_wins() {
        let mut decls = Declarations::new();
        decls.insert("a", "urn:1").unwrap();
        decls.insert("a", "urn:2").unwrap();
        decls.insert("b", "").unwrap();
        assert_eq!(decls.get("a"), Some("urn:2"));
        assert_eq!(decls.declared(), scope(&[("a", "urn:2")]));
        assert_eq!(decls.without_undeclarations().len(), 1);
    }

    #[test]
    fn test_prefixes_for_namespace() {
        let s = scope(&[("a", "urn:x"), ("b", "urn:y"), ("c", "urn:x")]);
        assert_eq!(s.prefixes_for("urn:x").collect::<Vec<_>>(), vec!["a", "c"]);
    }

    #[test]
    fn test_prefixes_must_be_ncnames() {
        for prefix in ["a b", "p:q", "1p", "a<b"] {
            assert!(matches!(
                Scope::from_pairs([(prefix, "urn:x")]),
                Err(Error::InvalidScope { .. })
            ));
            assert!(Declarations::new().insert(prefix, "urn:x").is_err());
        }
        assert!(Scope::from_pairs([("", "urn:x"), ("p-1", "urn:y")]).is_ok());
    }

    #[test]
    fn test_xmlns_is_not_an_attribute_name() {
        let s = scope(&[("a", "urn:a")]);
        for name in ["xmlns", "xmlns:a"] {
            assert!(matches!(
                s.resolve_attribute_qname(name),
                Err(Error::MalformedName { .. })
            ));
        }
        assert!(s.resolve_attribute_qname("a:xmlns").is_ok());
    }
}
