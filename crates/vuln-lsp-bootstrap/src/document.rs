//! Read-only view of an editor buffer supplied by the host.

use std::path::{Path, PathBuf};

/// Reference to an open document, owned by the host editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentReference {
    path: PathBuf,
    language_id: Option<String>,
}

impl DocumentReference {
    /// Builds a reference from the document's path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            language_id: None,
        }
    }

    /// Attaches the language identifier reported by the editor.
    #[must_use]
    pub fn with_language_id(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = Some(language_id.into());
        self
    }

    /// Path of the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// Language identifier, when the editor supplied one.
    #[must_use]
    pub fn language_id(&self) -> Option<&str> {
        self.language_id.as_deref()
    }

    /// Extension of the final path component.
    ///
    /// Returns `None` when the path has no extension or it is not valid UTF-8.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|extension| extension.to_str())
    }
}
