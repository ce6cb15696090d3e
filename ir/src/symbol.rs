use std::fmt;
use std::sync::Arc;

/// A namespaced operator name such as `nn::linear` or `prim::constant`.
///
/// Cheap to clone; equality and hashing are by content, so symbols built
/// from equal strings compare equal regardless of provenance.
#[derive(Debug, Clone)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(qualified: impl AsRef<str>) -> Self {
        Self(Arc::from(qualified.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part before `::`, empty when the name is unqualified.
    pub fn namespace(&self) -> &str {
        self.0.split_once("::").map_or("", |(ns, _)| ns)
    }

    /// The part after `::`, or the whole name when unqualified.
    pub fn name(&self) -> &str {
        self.0.split_once("::").map_or(&self.0, |(_, name)| name)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
