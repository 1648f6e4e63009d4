//! Project scope identifiers.

use std::fmt;

/// Opaque identifier of the workspace or project within which at most one
/// backend session may run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectScope(String);

impl ProjectScope {
    /// Wraps a host-supplied identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProjectScope {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl From<&str> for ProjectScope {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProjectScope {
    fn from(id: String) -> Self {
        Self(id)
    }
}
