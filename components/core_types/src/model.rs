//! User code and external package descriptors.

use serde::{Deserialize, Serialize};

/// Base URL used to derive a library's module URL when none is configured.
pub const CDN_BASE_URL: &str = "https://esm.sh";

/// A named unit of user source code.
///
/// A clone is taken when a run starts, so later edits never reach an
/// in-flight run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Stable identifier
    pub id: String,
    /// Display name, usually a file name
    pub filename: String,
    /// Module source text
    pub content: String,
}

impl Implementation {
    /// Create an implementation from its parts
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Implementation {
            id: id.into(),
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// An external package permitted in import statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    /// The bare module specifier, e.g. `lodash`
    pub name: String,
    /// Explicit module URL, overriding the CDN default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Library {
    /// A library resolved through the default CDN
    pub fn new(name: impl Into<String>) -> Self {
        Library {
            name: name.into(),
            url: None,
        }
    }

    /// A library pinned to an explicit URL
    pub fn with_url(name: impl Into<String>, url: impl Into<String>) -> Self {
        Library {
            name: name.into(),
            url: Some(url.into()),
        }
    }

    /// The URL an import of this library is rewritten to
    pub fn resolved_url(&self) -> String {
        match &self.url {
            Some(url) => url.clone(),
            None => format!("{}/{}", CDN_BASE_URL, self.name),
        }
    }

    /// Resolve `name` or `name/subpath` against this library.
    ///
    /// Returns `None` when the specifier does not belong to this library.
    pub fn resolve_specifier(&self, specifier: &str) -> Option<String> {
        if specifier == self.name {
            return Some(self.resolved_url());
        }
        let subpath = specifier.strip_prefix(self.name.as_str())?.strip_prefix('/')?;
        Some(format!("{}/{}", self.resolved_url().trim_end_matches('/'), subpath))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_default_url() {
        assert_eq!(Library::new("date-fns").resolved_url(), "https://esm.sh/date-fns");
    }

    #[test]
    fn test_library_explicit_url_wins() {
        let lib = Library::with_url("lodash", "https://cdn.example.com/lodash.js");
        assert_eq!(lib.resolved_url(), "https://cdn.example.com/lodash.js");
    }

    #[test]
    fn test_library_subpath_resolution() {
        let lib = Library::new("lodash");
        assert_eq!(
            lib.resolve_specifier("lodash/fp").as_deref(),
            Some("https://esm.sh/lodash/fp")
        );
        assert_eq!(lib.resolve_specifier("lodash-es"), None);
        assert_eq!(lib.resolve_specifier("react"), None);
    }

    #[test]
    fn test_library_url_omitted_from_json_when_absent() {
        let json = serde_json::to_string(&Library::new("react")).unwrap();
        assert_eq!(json, r#"{"name":"react"}"#);
    }
}
