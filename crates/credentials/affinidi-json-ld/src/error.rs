use std::fmt;

/// Errors that can occur during JSON-LD processing.
///
/// Every failure aborts the top-level call that raised it; there is no partial
/// result for expansion or compaction.
#[derive(Debug, thiserror::Error)]
pub enum JsonLdError {
    /// A context could not be fetched, was malformed, or its fetched document
    /// had no `@context` key.
    #[error("Context parse error: {0}")]
    ContextParseError(String),

    /// Validate mode found a key that does not resolve to an IRI or keyword.
    #[error("Invalid property: {0}")]
    InvalidPropertyError(String),

    /// Validate mode found a malformed value object.
    #[error("Invalid value: {0}")]
    InvalidValueError(String),

    /// A list directly or indirectly contains another list.
    #[error("List of lists: {0}")]
    ListOfLists(String),

    #[error("Processing error: {0}")]
    ProcessingError(String),
}

/// Result type alias for JSON-LD operations.
pub type Result<T> = std::result::Result<T, JsonLdError>;

impl JsonLdError {
    pub fn context(msg: impl fmt::Display) -> Self {
        Self::ContextParseError(msg.to_string())
    }

    pub fn invalid_property(msg: impl fmt::Display) -> Self {
        Self::InvalidPropertyError(msg.to_string())
    }

    pub fn invalid_value(msg: impl fmt::Display) -> Self {
        Self::InvalidValueError(msg.to_string())
    }

    pub fn list_of_lists(msg: impl fmt::Display) -> Self {
        Self::ListOfLists(msg.to_string())
    }

    pub fn processing(msg: impl fmt::Display) -> Self {
        Self::ProcessingError(msg.to_string())
    }
}

/// Errors raised by a [`DocumentLoader`](crate::loader::DocumentLoader).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no loader configured for {0}")]
    NotConfigured(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("failed to retrieve {url}: {reason}")]
    Retrieval { url: String, reason: String },
}

impl From<LoadError> for JsonLdError {
    fn from(err: LoadError) -> Self {
        Self::context(format!("Failed to parse remote context: {err}"))
    }
}
