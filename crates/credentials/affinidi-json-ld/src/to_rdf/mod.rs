//! Conversion of JSON-LD documents into RDF triples.

mod issuer;

pub use issuer::BlankNodeIssuer;

use serde_json::{Map, Value};

use crate::context::{is_absolute_iri, is_blank_node, is_keyword};
use crate::error::{JsonLdError, Result};
use crate::expand::expand;
use crate::keywords::{GRAPH, ID, TYPE};
use crate::model::{BlankNode, Graph, Literal, NamedNode, Object, Subject, Triple, TripleSink, rdf};
use crate::native::Native;
use crate::options::JsonLdOptions;
use crate::shape::{LiteralShape, Shape};

/// Expand `document` and deliver its triples to `sink`.
///
/// Triples stream in document order unless the options request
/// canonicalization, in which case the pass is buffered and sorted by
/// N-Triples form first. Blank node labels are `b0`, `b1`, ... and restart on
/// every call. Triples already delivered when a later value fails to convert
/// stay with the sink.
pub fn to_rdf(
    document: &Value,
    context: Option<&Value>,
    options: &JsonLdOptions,
    sink: &mut dyn TripleSink,
) -> Result<()> {
    let expanded = expand(document, context, options)?;
    let nodes = expanded
        .as_array()
        .ok_or_else(|| JsonLdError::processing("expanded document must be an array"))?;

    let buffered = {
        let output = if options.canonicalize() {
            Output::Buffered(Vec::new())
        } else {
            Output::Streaming(&mut *sink)
        };
        let mut converter = Converter::new(options, output);
        for node in nodes {
            converter.node(as_node(node)?)?;
        }
        options.debug(format!("to_rdf: {} triples", converter.emitted));
        match converter.output {
            Output::Buffered(triples) => Some(triples),
            Output::Streaming(_) => None,
        }
    };

    if let Some(mut triples) = buffered {
        triples.sort_by_cached_key(Triple::to_string);
        for triple in triples {
            sink.emit(triple);
        }
    }
    Ok(())
}

/// Like [`to_rdf`], collecting the triples into a [`Graph`].
pub fn to_rdf_graph(document: &Value, context: Option<&Value>, options: &JsonLdOptions) -> Result<Graph> {
    let mut graph = Graph::new();
    to_rdf(document, context, options, &mut graph)?;
    Ok(graph)
}

enum Output<'s> {
    Streaming(&'s mut dyn TripleSink),
    Buffered(Vec<Triple>),
}

struct Converter<'o, 's> {
    options: &'o JsonLdOptions,
    issuer: BlankNodeIssuer,
    output: Output<'s>,
    emitted: usize,
}

impl<'o, 's> Converter<'o, 's> {
    fn new(options: &'o JsonLdOptions, output: Output<'s>) -> Self {
        Self {
            options,
            issuer: BlankNodeIssuer::default(),
            output,
            emitted: 0,
        }
    }

    fn emit(&mut self, subject: Subject, predicate: &str, object: Object) {
        let triple = Triple::new(subject, NamedNode::new(predicate), object);
        self.emitted += 1;
        match &mut self.output {
            Output::Streaming(sink) => sink.emit(triple),
            Output::Buffered(triples) => triples.push(triple),
        }
    }

    /// Emit the triples of a node object and return its subject.
    fn node(&mut self, node: &Map<String, Value>) -> Result<Subject> {
        let subject = match node.get(ID) {
            Some(Value::String(id)) => self.resource(id),
            Some(other) => {
                return Err(JsonLdError::processing(format!("@id must be a string: {other}")));
            }
            None => Subject::Blank(BlankNode::new(self.issuer.fresh())),
        };

        if let Some(types) = node.get(TYPE) {
            for t in as_values(types) {
                let t = t
                    .as_str()
                    .ok_or_else(|| JsonLdError::processing(format!("@type must be a string: {t}")))?;
                let object = self.resource(t).into();
                self.emit(subject.clone(), rdf::TYPE, object);
            }
        }

        for (key, values) in node {
            if key == GRAPH {
                for member in as_values(values) {
                    self.node(as_node(member)?)?;
                }
                continue;
            }
            if is_keyword(key) {
                continue;
            }
            if is_blank_node(key) || !is_absolute_iri(key) {
                self.options.warn(format!("to_rdf: skipping predicate {key}, not an IRI"));
                continue;
            }
            for value in as_values(values) {
                let object = self.object(value)?;
                self.emit(subject.clone(), key, object);
            }
        }
        Ok(subject)
    }

    fn resource(&mut self, id: &str) -> Subject {
        match id.strip_prefix("_:") {
            Some(label) => Subject::Blank(BlankNode::new(self.issuer.issue(label))),
            None => {
                if !is_absolute_iri(id) {
                    self.options.warn(format!("to_rdf: relative IRI {id} left unresolved"));
                }
                Subject::Named(NamedNode::new(id))
            }
        }
    }

    fn object(&mut self, value: &Value) -> Result<Object> {
        match Shape::classify(value)? {
            Shape::NodeRef(id) => Ok(self.resource(id).into()),
            Shape::Node(map) => Ok(self.node(map)?.into()),
            Shape::Literal(literal) => Ok(Object::Literal(to_literal(literal))),
            Shape::List(items) => self.list(items),
            Shape::Graph { .. } => Ok(self.node(as_node(value)?)?.into()),
        }
    }

    /// Chain list members through fresh blank nodes, terminated by `rdf:nil`.
    fn list(&mut self, items: &[Value]) -> Result<Object> {
        let chain: Vec<BlankNode> = items
            .iter()
            .map(|_| BlankNode::new(self.issuer.fresh()))
            .collect();

        for (index, item) in items.iter().enumerate() {
            if Shape::classify(item)?.is_list() {
                return Err(JsonLdError::list_of_lists(format!(
                    "list member is a list: {item}"
                )));
            }
            let first = self.object(item)?;
            self.emit(chain[index].clone().into(), rdf::FIRST, first);
            let rest = match chain.get(index + 1) {
                Some(next) => next.clone().into(),
                None => NamedNode::new(rdf::NIL).into(),
            };
            self.emit(chain[index].clone().into(), rdf::REST, rest);
        }

        Ok(match chain.into_iter().next() {
            Some(head) => head.into(),
            None => NamedNode::new(rdf::NIL).into(),
        })
    }
}

fn to_literal(literal: LiteralShape<'_>) -> Literal {
    match literal.value {
        Value::String(text) => match (literal.datatype, literal.language) {
            (Some(datatype), _) => Literal::typed(text.as_str(), NamedNode::new(datatype)),
            (None, Some(language)) => Literal::lang(text.as_str(), language),
            (None, None) => Literal::new(text.as_str()),
        },
        other => match (Native::from_json(other), literal.datatype) {
            (Some(native), Some(datatype)) => Literal::typed(native.lexical_form(), NamedNode::new(datatype)),
            (Some(native), None) => native.to_literal(),
            (None, _) => Literal::new(other.to_string()),
        },
    }
}

fn as_node(value: &Value) -> Result<&Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| JsonLdError::processing(format!("expected a node object, found {value}")))
}

fn as_values(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        single => std::slice::from_ref(single),
    }
}
