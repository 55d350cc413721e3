//! Processing options threaded through every JSON-LD call.
//!
//! Call the [JsonLdOptionsBuilder] to create a new set of options.
//!
//! Example: strict processing against a base IRI:
//! ```rust
//! use affinidi_json_ld::options::JsonLdOptionsBuilder;
//! let options = JsonLdOptionsBuilder::default()
//!     .with_base("http://example.org/")
//!     .with_validate(true)
//!     .build();
//! assert!(options.validate());
//! ```

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::loader::{DocumentLoader, NoLoader};

/// Append-only breadcrumb log supplied by the caller.
///
/// Implementations must never panic; a sink that cannot record a message
/// drops it.
pub trait DiagnosticSink: Send + Sync {
    fn record(&self, message: &str);
}

impl DiagnosticSink for Mutex<Vec<String>> {
    fn record(&self, message: &str) {
        if let Ok(mut log) = self.lock() {
            log.push(message.to_string());
        }
    }
}

/// Options for [`expand`](crate::expand), [`compact`](crate::compact) and
/// [`to_rdf`](crate::to_rdf).
///
/// Use the [JsonLdOptionsBuilder] to create a new set of options.
#[derive(Clone)]
pub struct JsonLdOptions {
    pub(crate) base: Option<String>,
    pub(crate) validate: bool,
    pub(crate) canonicalize: bool,
    pub(crate) trace: Option<Arc<dyn DiagnosticSink>>,
    pub(crate) loader: Arc<dyn DocumentLoader>,
}

impl Default for JsonLdOptions {
    fn default() -> Self {
        JsonLdOptionsBuilder::default().build()
    }
}

impl fmt::Debug for JsonLdOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLdOptions")
            .field("base", &self.base)
            .field("validate", &self.validate)
            .field("canonicalize", &self.canonicalize)
            .field("trace", &self.trace.is_some())
            .field("loader", &self.loader.name())
            .finish()
    }
}

impl JsonLdOptions {
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn validate(&self) -> bool {
        self.validate
    }

    pub fn canonicalize(&self) -> bool {
        self.canonicalize
    }

    pub fn loader(&self) -> &dyn DocumentLoader {
        self.loader.as_ref()
    }

    /// Emit a debug breadcrumb to `tracing` and to the caller's sink.
    pub(crate) fn debug(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::debug!("{message}");
        if let Some(trace) = &self.trace {
            trace.record(message);
        }
    }

    /// Emit a warning breadcrumb to `tracing` and to the caller's sink.
    pub(crate) fn warn(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::warn!("{message}");
        if let Some(trace) = &self.trace {
            trace.record(message);
        }
    }
}

/// Builder for [JsonLdOptions].
///
/// - base: base IRI for resolving relative `@id` values (default: none).
/// - validate: raise on unmapped keys and malformed values instead of dropping them (default: false).
/// - canonicalize: deliver RDF triples in a stable sorted order (default: false).
/// - trace: diagnostic sink receiving processing breadcrumbs (default: none).
/// - loader: fetch capability for remote contexts (default: [NoLoader]).
pub struct JsonLdOptionsBuilder {
    base: Option<String>,
    validate: bool,
    canonicalize: bool,
    trace: Option<Arc<dyn DiagnosticSink>>,
    loader: Arc<dyn DocumentLoader>,
}

impl Default for JsonLdOptionsBuilder {
    fn default() -> Self {
        Self {
            base: None,
            validate: false,
            canonicalize: false,
            trace: None,
            loader: Arc::new(NoLoader),
        }
    }
}

impl JsonLdOptionsBuilder {
    /// Set the base IRI used to resolve relative IRIs.
    /// Example: `http://example.org/`
    pub fn with_base(mut self, base: &str) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Enable strict mode.
    /// Default: false
    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Request stable triple ordering from RDF conversion.
    /// Default: false
    pub fn with_canonicalize(mut self, canonicalize: bool) -> Self {
        self.canonicalize = canonicalize;
        self
    }

    /// Attach a diagnostic sink.
    pub fn with_trace(mut self, trace: Arc<dyn DiagnosticSink>) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Set the loader used for remote context references.
    pub fn with_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.loader = loader;
        self
    }

    /// Build the [JsonLdOptions].
    pub fn build(self) -> JsonLdOptions {
        JsonLdOptions {
            base: self.base,
            validate: self.validate,
            canonicalize: self.canonicalize,
            trace: self.trace,
            loader: self.loader,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient() {
        let options = JsonLdOptions::default();
        assert!(!options.validate());
        assert!(!options.canonicalize());
        assert!(options.base().is_none());
        assert_eq!(options.loader().name(), "NoLoader");
    }

    #[test]
    fn trace_sink_records_breadcrumbs() {
        let sink = Arc::new(Mutex::new(Vec::new()));
        let options = JsonLdOptionsBuilder::default()
            .with_trace(sink.clone())
            .build();

        options.debug("first");
        options.warn("second");

        assert_eq!(*sink.lock().unwrap(), vec!["first", "second"]);
    }
}
