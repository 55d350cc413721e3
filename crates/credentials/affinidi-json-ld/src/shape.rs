//! Classification of expanded JSON-LD values.
//!
//! Expanded trees are plain `serde_json` values. Each value is classified once
//! into a [`Shape`] and the compaction and RDF engines match on that, rather
//! than probing keys at every use site.

use serde_json::{Map, Value};

use crate::error::{JsonLdError, Result};
use crate::keywords::{GRAPH, ID, LANGUAGE, LIST, TYPE, VALUE};

/// The recognized shapes of an expanded value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape<'a> {
    /// `{"@id": iri}` with nothing else: an IRI or blank node reference.
    NodeRef(&'a str),
    /// A node object with types, properties or an embedded graph.
    Node(&'a Map<String, Value>),
    /// `{"@value": v}` with optional `@type` or `@language`.
    Literal(LiteralShape<'a>),
    /// `{"@list": [...]}`.
    List(&'a [Value]),
    /// `{"@graph": [...]}`, optionally named by `@id`.
    Graph {
        id: Option<&'a str>,
        nodes: &'a [Value],
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiteralShape<'a> {
    pub value: &'a Value,
    pub datatype: Option<&'a str>,
    pub language: Option<&'a str>,
}

impl LiteralShape<'_> {
    /// A string with neither datatype nor language.
    pub fn is_plain_string(&self) -> bool {
        self.value.is_string() && self.datatype.is_none()
    }
}

impl<'a> Shape<'a> {
    /// Classify an expanded value. Anything that is not an object in one of the
    /// recognized shapes is a processing error.
    pub fn classify(value: &'a Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            JsonLdError::processing(format!("expected an expanded object, found {value}"))
        })?;

        if let Some(v) = map.get(VALUE) {
            if !(v.is_string() || v.is_number() || v.is_boolean()) {
                return Err(JsonLdError::processing(format!("@value must be a scalar: {v}")));
            }
            let datatype = optional_str(map, TYPE)?;
            let language = optional_str(map, LANGUAGE)?;
            if datatype.is_some() && language.is_some() {
                return Err(JsonLdError::processing(
                    "value object cannot carry both @type and @language",
                ));
            }
            if let Some(extra) = map.keys().find(|k| !matches!(k.as_str(), VALUE | TYPE | LANGUAGE)) {
                return Err(JsonLdError::processing(format!(
                    "unexpected key {extra} in value object"
                )));
            }
            return Ok(Self::Literal(LiteralShape {
                value: v,
                datatype,
                language,
            }));
        }

        if let Some(list) = map.get(LIST) {
            if map.len() != 1 {
                return Err(JsonLdError::processing("list object must only contain @list"));
            }
            let items = list
                .as_array()
                .ok_or_else(|| JsonLdError::processing("@list must be an array"))?;
            return Ok(Self::List(items));
        }

        let id = optional_str(map, ID)?;

        if let Some(graph) = map.get(GRAPH)
            && map.keys().all(|k| k == GRAPH || k == ID)
        {
            let nodes = graph
                .as_array()
                .ok_or_else(|| JsonLdError::processing("@graph must be an array"))?;
            return Ok(Self::Graph { id, nodes });
        }

        match id {
            Some(id) if map.len() == 1 => Ok(Self::NodeRef(id)),
            _ => Ok(Self::Node(map)),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }
}

fn optional_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(JsonLdError::processing(format!(
            "{key} must be a string, found {other}"
        ))),
    }
}
