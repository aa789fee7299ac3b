//! Qualified names.
//!
//! A [`QName`] pairs an optional namespace URI and a local name with the
//! syntactic prefix that was used to write it. The prefix only matters when
//! the name is serialized again: two names are equal when their namespace
//! and local name are equal, whatever prefixes they carry.

use crate::{Error, Result};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A namespace-qualified name.
#[derive(Debug, Clone)]
pub struct QName {
    namespace: Option<String>,
    local_name: String,
    prefix: String,
}

impl QName {
    /// Create a qualified name.
    ///
    /// `prefix` is `""` for an unprefixed name. An unprefixed name may still
    /// carry a namespace (the default namespace of its scope); a prefixed name
    /// must carry one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedName`] if the local name or prefix is not a
    /// valid non-colonized name, if the namespace is empty, or if a prefix is
    /// given without a namespace.
    pub fn new(
        prefix: impl Into<String>,
        namespace: Option<String>,
        local_name: impl Into<String>,
    ) -> Result<Self> {
        let prefix = prefix.into();
        let local_name = local_name.into();
        let well_formed = is_ncname(&local_name)
            && (prefix.is_empty() || is_ncname(&prefix))
            && namespace.as_deref().is_none_or(|ns| !ns.is_empty())
            && (prefix.is_empty() || namespace.is_some());
        if !well_formed {
            return Err(Error::MalformedName {
                name: syntactic(&prefix, &local_name),
            });
        }
        Ok(Self {
            namespace,
            local_name,
            prefix,
        })
    }

    /// Create a name without namespace and without prefix.
    pub fn unqualified(local_name: impl Into<String>) -> Result<Self> {
        Self::new("", None, local_name)
    }

    /// Create a namespaced name written with the given prefix (`""` for the default namespace).
    pub fn namespaced(
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        local_name: impl Into<String>,
    ) -> Result<Self> {
        Self::new(prefix, Some(namespace.into()), local_name)
    }

    /// The namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The syntactic prefix, `""` when unprefixed.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The name as written in markup: `prefix:local` or `local`.
    pub fn syntactic_name(&self) -> String {
        syntactic(&self.prefix, &self.local_name)
    }

    /// The name in Clark notation: `{namespace}local` or `local`.
    pub fn expanded_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Same expanded name, different prefix.
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Result<Self> {
        Self::new(prefix, self.namespace.clone(), self.local_name.clone())
    }

    /// Does this name have the given namespace and local name?
    pub fn matches(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.local_name == local_name
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.namespace, &self.local_name).cmp(&(&other.namespace, &other.local_name))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{}:{}", self.prefix, self.local_name)
        }
    }
}

/// Split a syntactic name into `(prefix, local_name)`.
///
/// The prefix is `""` for unprefixed names.
///
/// # Errors
///
/// Returns [`Error::MalformedName`] if either part is not a valid
/// non-colonized name.
pub fn split_syntactic_name(name: &str) -> Result<(&str, &str)> {
    let malformed = || Error::MalformedName {
        name: name.to_string(),
    };
    let (prefix, local) = match name.split_once(':') {
        Some((prefix, local)) if is_ncname(prefix) => (prefix, local),
        Some(_) => return Err(malformed()),
        None => ("", name),
    };
    if is_ncname(local) {
        Ok((prefix, local))
    } else {
        Err(malformed())
    }
}

/// Is this a non-colonized name (no colon, no whitespace or markup characters)?
pub(crate) fn is_ncname(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if first.is_ascii_digit() || first == '-' || first == '.' {
        return false;
    }
    s.chars()
        .all(|c| !c.is_whitespace() && !matches!(c, ':' | '<' | '>' | '&' | '"' | '\'' | '=' | '/'))
}

fn syntactic(prefix: &str, local_name: &str) -> String {
    if prefix.is_empty() {
        local_name.to_string()
    } else {
        format!("{}:{}", prefix, local_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_prefix() {
        let a = QName::namespaced("a", "urn:x", "item").unwrap();
        let b = QName::namespaced("b", "urn:x", "item").unwrap();
        let c = QName::namespaced("", "urn:x", "item").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_ne!(a, QName::unqualified("item").unwrap());
    }

    #[test]
    fn test_syntactic_and_expanded_names() {
        let name = QName::namespaced("rep", "urn:report", "finding").unwrap();
        assert_eq!(name.syntactic_name(), "rep:finding");
        assert_eq!(name.to_string(), "rep:finding");
        assert_eq!(name.expanded_name(), "{urn:report}finding");

        let plain = QName::unqualified("finding").unwrap();
        assert_eq!(plain.syntactic_name(), "finding");
        assert_eq!(plain.expanded_name(), "finding");
    }

    #[test]
    fn test_rejects_malformed_names() {
        assert!(QName::unqualified("").is_err());
        assert!(QName::unqualified("a:b").is_err());
        assert!(QName::unqualified("has space").is_err());
        assert!(QName::new("p", None, "x").is_err());
        assert!(QName::new("", Some(String::new()), "x").is_err());
    }

    #[test]
    fn test_split_syntactic_name() {
        assert_eq!(split_syntactic_name("a:b").unwrap(), ("a", "b"));
        assert_eq!(split_syntactic_name("b").unwrap(), ("", "b"));
        assert!(split_syntactic_name(":b").is_err());
        assert!(split_syntactic_name("a:").is_err());
        assert!(split_syntactic_name("a:b:c").is_err());
    }
}
