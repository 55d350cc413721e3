//! Pluggable retrieval of remote context documents.
//!
//! Context references (`"@context": "http://example.com/context"`) are fetched
//! through a [`DocumentLoader`] supplied in the options. The core never opens
//! network connections itself.

use std::collections::HashMap;

use crate::error::LoadError;

/// A fetched document: raw bytes plus the content type reported by the source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteDocument {
    pub url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl RemoteDocument {
    pub fn new(url: impl Into<String>, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// True when the content type is one of the JSON media types.
    pub fn is_json(&self) -> bool {
        let media = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        media == "application/json" || media == "application/ld+json" || media.ends_with("+json")
    }
}

/// Blocking fetch capability for remote contexts.
pub trait DocumentLoader: Send + Sync {
    /// Human-readable name for this loader (e.g., `"StaticLoader"`).
    fn name(&self) -> &str;

    /// Retrieve the document at `url`.
    fn load(&self, url: &str) -> Result<RemoteDocument, LoadError>;
}

/// Refuses every request. The default when no loader is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoLoader;

impl DocumentLoader for NoLoader {
    fn name(&self) -> &str {
        "NoLoader"
    }

    fn load(&self, url: &str) -> Result<RemoteDocument, LoadError> {
        Err(LoadError::NotConfigured(url.to_string()))
    }
}

/// Serves documents registered up front, keyed by URL.
#[derive(Clone, Debug, Default)]
pub struct StaticLoader {
    documents: HashMap<String, RemoteDocument>,
}

impl StaticLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a JSON-LD document for `url`.
    pub fn with_document(mut self, url: &str, body: impl Into<Vec<u8>>) -> Self {
        self.insert(RemoteDocument::new(url, "application/ld+json", body));
        self
    }

    pub fn insert(&mut self, document: RemoteDocument) {
        self.documents.insert(document.url.clone(), document);
    }
}

impl DocumentLoader for StaticLoader {
    fn name(&self) -> &str {
        "StaticLoader"
    }

    fn load(&self, url: &str) -> Result<RemoteDocument, LoadError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_loader_refuses() {
        let err = NoLoader.load("http://example.com/context").unwrap_err();
        assert!(matches!(err, LoadError::NotConfigured(_)));
    }

    #[test]
    fn static_loader_serves_registered_documents() {
        let loader = StaticLoader::new().with_document("http://example.com/context", "{}");
        let doc = loader.load("http://example.com/context").unwrap();
        assert_eq!(doc.body, b"{}");
        assert!(doc.is_json());
        assert!(matches!(
            loader.load("http://example.com/other"),
            Err(LoadError::NotFound(_))
        ));
    }

    #[test]
    fn content_type_parameters_are_ignored() {
        let doc = RemoteDocument::new("u", "application/json; charset=utf-8", "{}");
        assert!(doc.is_json());
        let doc = RemoteDocument::new("u", "text/html", "<html>");
        assert!(!doc.is_json());
    }
}
