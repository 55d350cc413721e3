use std::fmt;

use serde::{Deserialize, Serialize};

/// An IRI-identified RDF node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NamedNode {
    pub iri: String,
}

impl NamedNode {
    pub fn new(iri: impl Into<String>) -> Self {
        Self { iri: iri.into() }
    }
}

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

/// A blank (anonymous) RDF node. The `id` field stores the label without the `_:` prefix.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlankNode {
    pub id: String,
}

impl BlankNode {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_:{}", self.id)
    }
}

/// An RDF literal: lexical form plus either a datatype, a language tag, or neither
/// (a plain literal).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal {
    pub value: String,
    pub datatype: Option<NamedNode>,
    pub language: Option<String>,
}

impl Literal {
    /// Create a plain literal.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Create a typed literal.
    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Self {
            value: value.into(),
            datatype: Some(datatype),
            language: None,
        }
    }

    /// Create a language-tagged literal.
    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", escape_literal(&self.value))?;
        if let Some(ref lang) = self.language {
            write!(f, "@{lang}")
        } else if let Some(ref datatype) = self.datatype {
            write!(f, "^^{datatype}")
        } else {
            Ok(())
        }
    }
}

/// Escape a lexical form for N-Triples output.
///
/// Escapes: `\t`, `\n`, `\r`, `\"`, `\\` and other control characters as `\uXXXX`.
fn escape_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c if c < '\u{0020}' => {
                let cp = c as u32;
                out.push_str(&format!("\\u{cp:04X}"));
            }
            c => out.push(c),
        }
    }
    out
}

/// The subject of an RDF triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Subject {
    Named(NamedNode),
    Blank(BlankNode),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => n.fmt(f),
            Self::Blank(b) => b.fmt(f),
        }
    }
}

impl From<NamedNode> for Subject {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for Subject {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

/// The object of an RDF triple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Object {
    Named(NamedNode),
    Blank(BlankNode),
    Literal(Literal),
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(n) => n.fmt(f),
            Self::Blank(b) => b.fmt(f),
            Self::Literal(l) => l.fmt(f),
        }
    }
}

impl From<NamedNode> for Object {
    fn from(n: NamedNode) -> Self {
        Self::Named(n)
    }
}

impl From<BlankNode> for Object {
    fn from(b: BlankNode) -> Self {
        Self::Blank(b)
    }
}

impl From<Literal> for Object {
    fn from(l: Literal) -> Self {
        Self::Literal(l)
    }
}

impl From<Subject> for Object {
    fn from(s: Subject) -> Self {
        match s {
            Subject::Named(n) => Self::Named(n),
            Subject::Blank(b) => Self::Blank(b),
        }
    }
}

/// An RDF triple (subject, predicate, object).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Object,
}

impl Triple {
    pub fn new(subject: impl Into<Subject>, predicate: NamedNode, object: impl Into<Object>) -> Self {
        Self {
            subject: subject.into(),
            predicate,
            object: object.into(),
        }
    }
}

/// N-Triples line form, without the trailing newline.
impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}

/// Receiver of the triples produced by one RDF conversion pass.
pub trait TripleSink {
    fn emit(&mut self, triple: Triple);
}

impl<F: FnMut(Triple)> TripleSink for F {
    fn emit(&mut self, triple: Triple) {
        self(triple)
    }
}

/// A collection of RDF triples in emission order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub triples: Vec<Triple>,
}

impl Graph {
    pub fn new() -> Self {
        Self {
            triples: Vec::new(),
        }
    }

    pub fn add(&mut self, triple: Triple) {
        self.triples.push(triple);
    }

    pub fn triples(&self) -> &[Triple] {
        &self.triples
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// Render the graph as N-Triples, one line per triple.
    pub fn to_ntriples(&self) -> String {
        let mut out = String::new();
        for t in &self.triples {
            out.push_str(&t.to_string());
            out.push('\n');
        }
        out
    }
}

impl TripleSink for Graph {
    fn emit(&mut self, triple: Triple) {
        self.add(triple);
    }
}

/// XSD namespace constants.
pub mod xsd {
    pub const NS: &str = "http://www.w3.org/2001/XMLSchema#";
    pub const STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
    pub const BOOLEAN: &str = "http://www.w3.org/2001/XMLSchema#boolean";
    pub const INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    pub const DECIMAL: &str = "http://www.w3.org/2001/XMLSchema#decimal";
    pub const DOUBLE: &str = "http://www.w3.org/2001/XMLSchema#double";
    pub const DATE_TIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
    pub const DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
    pub const TIME: &str = "http://www.w3.org/2001/XMLSchema#time";
}

/// RDF namespace constants.
pub mod rdf {
    pub const TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
    pub const FIRST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#first";
    pub const REST: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#rest";
    pub const NIL: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#nil";
}
