//! JSON-LD processing: expansion, compaction and conversion to RDF.
//!
//! ```
//! use affinidi_json_ld::{JsonLdOptions, expand};
//! use serde_json::json;
//!
//! let doc = json!({
//!     "@context": {"name": "http://xmlns.com/foaf/0.1/name"},
//!     "name": "Manu Sporny"
//! });
//! let expanded = expand(&doc, None, &JsonLdOptions::default()).unwrap();
//! assert_eq!(
//!     expanded,
//!     json!([{"http://xmlns.com/foaf/0.1/name": [{"@value": "Manu Sporny"}]}])
//! );
//! ```

pub mod compact;
pub mod context;
pub mod error;
pub mod expand;
pub mod loader;
pub mod model;
pub mod native;
pub mod options;
pub mod shape;
pub mod to_rdf;

pub use compact::compact;
pub use context::{Container, Coercion, Context, ContextSource, Language, TermDefinition, TermTarget};
pub use error::{JsonLdError, LoadError, Result};
pub use expand::expand;
pub use loader::{DocumentLoader, NoLoader, RemoteDocument, StaticLoader};
pub use model::{BlankNode, Graph, Literal, NamedNode, Object, Subject, Triple, TripleSink, rdf, xsd};
pub use native::Native;
pub use options::{DiagnosticSink, JsonLdOptions, JsonLdOptionsBuilder};
pub use shape::{LiteralShape, Shape};
pub use to_rdf::{BlankNodeIssuer, to_rdf, to_rdf_graph};

/// JSON-LD keywords.
pub mod keywords {
    pub const BASE: &str = "@base";
    pub const CONTAINER: &str = "@container";
    pub const CONTEXT: &str = "@context";
    pub const GRAPH: &str = "@graph";
    pub const ID: &str = "@id";
    pub const LANGUAGE: &str = "@language";
    pub const LIST: &str = "@list";
    pub const SET: &str = "@set";
    pub const TYPE: &str = "@type";
    pub const VALUE: &str = "@value";
    pub const VOCAB: &str = "@vocab";
}
