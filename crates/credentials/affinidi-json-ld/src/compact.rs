//! JSON-LD compaction: expanded node objects rewritten against a target
//! context, with terms, prefixes and coercions chosen per value.

use std::borrow::Cow;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::context::{Container, Context, IriMode, TermDefinition, is_keyword};
use crate::error::{JsonLdError, Result};
use crate::expand::expand;
use crate::keywords::{CONTEXT, GRAPH, ID, LANGUAGE, TYPE, VALUE};
use crate::options::JsonLdOptions;
use crate::shape::Shape;

/// Compact `document` against `context`.
///
/// The document is expanded first, so it may be in any JSON-LD form. The
/// output carries the serialized context under `@context` unless that
/// context is empty. A single node is returned inline; several nodes are
/// wrapped in `@graph`.
pub fn compact(document: &Value, context: &Value, options: &JsonLdOptions) -> Result<Value> {
    let expanded = expand(document, None, options)?;
    let target = Context::parse(context, options)?;
    let compacted = Compactor::new(&target, options).compact_document(&expanded)?;
    options.debug("compact: done");
    Ok(compacted)
}

/// Values gathered under one output key.
struct Bucket<'c> {
    def: Option<&'c TermDefinition>,
    values: Vec<Value>,
    languages: IndexMap<String, Vec<Value>>,
}

impl<'c> Bucket<'c> {
    fn new(def: Option<&'c TermDefinition>) -> Self {
        Self {
            def,
            values: Vec::new(),
            languages: IndexMap::new(),
        }
    }

    fn render(self) -> Value {
        match self.def.and_then(|d| d.container) {
            Some(Container::Language) => Value::Object(
                self.languages
                    .into_iter()
                    .map(|(language, texts)| (language, collapse(texts)))
                    .collect(),
            ),
            Some(Container::List) => self
                .values
                .into_iter()
                .next()
                .unwrap_or_else(|| Value::Array(Vec::new())),
            Some(Container::Set) => Value::Array(self.values),
            None => collapse(self.values),
        }
    }
}

/// A single value stands alone; anything else stays an array.
fn collapse(mut values: Vec<Value>) -> Value {
    if values.len() == 1 {
        values.remove(0)
    } else {
        Value::Array(values)
    }
}

pub(crate) struct Compactor<'c> {
    ctx: &'c Context,
    options: &'c JsonLdOptions,
}

impl<'c> Compactor<'c> {
    pub(crate) fn new(ctx: &'c Context, options: &'c JsonLdOptions) -> Self {
        Self { ctx, options }
    }

    pub(crate) fn compact_document(&self, expanded: &Value) -> Result<Value> {
        let nodes: Vec<&Map<String, Value>> = match expanded {
            Value::Array(items) => items.iter().map(as_node).collect::<Result<_>>()?,
            single => vec![as_node(single)?],
        };
        let nodes = merge_same_subject(nodes);

        let mut compacted = Vec::with_capacity(nodes.len());
        for node in &nodes {
            compacted.push(self.compact_node(node)?);
        }

        let mut out = Map::new();
        if !self.ctx.is_empty() || references_remote(self.ctx.provided_context()) {
            out.insert(CONTEXT.to_string(), self.ctx.context_value());
        }
        if compacted.len() == 1 {
            out.extend(compacted.remove(0));
        } else {
            out.insert(
                self.ctx.keyword_alias(GRAPH).to_string(),
                Value::Array(compacted.into_iter().map(Value::Object).collect()),
            );
        }
        Ok(Value::Object(out))
    }

    fn compact_node(&self, node: &Map<String, Value>) -> Result<Map<String, Value>> {
        let mut out = Map::new();
        let mut properties: IndexMap<&str, Vec<&Value>> = IndexMap::new();

        for (key, value) in node {
            match key.as_str() {
                ID => {
                    let id = value
                        .as_str()
                        .ok_or_else(|| JsonLdError::processing(format!("@id must be a string: {value}")))?;
                    out.insert(
                        self.ctx.keyword_alias(ID).to_string(),
                        Value::String(self.ctx.compact_iri_with(id, true, IriMode::REFERENCE)),
                    );
                }
                TYPE => {
                    let types = as_values(value)
                        .iter()
                        .map(|t| {
                            t.as_str()
                                .map(|t| Value::String(self.ctx.compact_iri_with(t, true, IriMode::TYPE)))
                                .ok_or_else(|| JsonLdError::processing(format!("@type must be a string: {t}")))
                        })
                        .collect::<Result<Vec<_>>>()?;
                    out.insert(self.ctx.keyword_alias(TYPE).to_string(), collapse(types));
                }
                GRAPH => {
                    let mut graph = Vec::new();
                    for member in as_values(value) {
                        graph.push(Value::Object(self.compact_node(as_node(member)?)?));
                    }
                    out.insert(self.ctx.keyword_alias(GRAPH).to_string(), Value::Array(graph));
                }
                keyword if is_keyword(keyword) => {
                    self.options.debug(format!("compact: ignoring {keyword} on node object"));
                }
                iri => {
                    properties.insert(iri, as_values(value).iter().collect());
                }
            }
        }

        let mut buckets: IndexMap<String, Bucket<'c>> = IndexMap::new();
        self.apply_generators(&mut properties, &mut buckets)?;

        for (iri, values) in properties {
            if values.is_empty() {
                let (key, def) = match self.ctx.select_term(iri, None, &|_| false) {
                    Some((term, def)) => (term.to_string(), Some(def)),
                    None => (self.fallback_key(iri), None),
                };
                buckets.entry(key).or_insert_with(|| Bucket::new(def));
                continue;
            }

            for value in values {
                let shape = Shape::classify(value)?;
                let selected = self.ctx.select_term(iri, Some(&shape), &|term| {
                    buckets.get(term).is_some_and(|b| !b.values.is_empty())
                });
                let (key, def) = match selected {
                    Some((term, def)) => (term.to_string(), Some(def)),
                    None => (self.fallback_key(iri), None),
                };
                self.push(&mut buckets, key, def, value)?;
            }
        }

        for (key, bucket) in buckets {
            out.insert(key, bucket.render());
        }
        Ok(out)
    }

    /// Render values shared by every predicate of a property generator under the
    /// generator's term, consuming one occurrence from each predicate.
    fn apply_generators(
        &self,
        properties: &mut IndexMap<&str, Vec<&Value>>,
        buckets: &mut IndexMap<String, Bucket<'c>>,
    ) -> Result<()> {
        for (term, def, iris) in self.ctx.generators() {
            let present = iris
                .iter()
                .all(|iri| properties.get(iri.as_str()).is_some_and(|v| !v.is_empty()));
            if !present {
                continue;
            }

            let candidates: Vec<&Value> = properties
                .get(iris[0].as_str())
                .cloned()
                .unwrap_or_default();
            let mut shared = Vec::new();
            for candidate in candidates {
                let everywhere = iris.iter().all(|iri| {
                    properties
                        .get(iri.as_str())
                        .is_some_and(|values| values.contains(&candidate))
                });
                if !everywhere {
                    continue;
                }
                for iri in iris {
                    if let Some(values) = properties.get_mut(iri.as_str())
                        && let Some(pos) = values.iter().position(|v| *v == candidate)
                    {
                        values.remove(pos);
                    }
                }
                shared.push(candidate);
            }

            if shared.is_empty() {
                continue;
            }
            self.options.debug(format!(
                "compact: property generator {term} takes {} values",
                shared.len()
            ));
            properties.retain(|iri, values| !values.is_empty() || !iris.iter().any(|g| g == iri));
            for value in shared {
                self.push(buckets, term.to_string(), Some(def), value)?;
            }
        }
        Ok(())
    }

    fn push(
        &self,
        buckets: &mut IndexMap<String, Bucket<'c>>,
        key: String,
        def: Option<&'c TermDefinition>,
        value: &Value,
    ) -> Result<()> {
        let compacted = match def.and_then(|d| d.container) {
            Some(Container::Language) => None,
            _ => Some(self.compact_value(def, value)?),
        };
        let bucket = buckets.entry(key).or_insert_with(|| Bucket::new(def));
        match compacted {
            Some(compacted) => bucket.values.push(compacted),
            None => {
                let language = value
                    .get(LANGUAGE)
                    .and_then(Value::as_str)
                    .ok_or_else(|| JsonLdError::processing(format!("language map value without language: {value}")))?;
                let text = value.get(VALUE).cloned().unwrap_or(Value::Null);
                bucket.languages.entry(language.to_string()).or_default().push(text);
            }
        }
        Ok(())
    }

    fn compact_value(&self, def: Option<&TermDefinition>, value: &Value) -> Result<Value> {
        self.ctx
            .compact_value_in(def, value, &mut |node: &Map<String, Value>| {
                self.compact_node(node).map(Value::Object)
            })
    }

    /// Key for a predicate no term can represent: a prefix or vocabulary form,
    /// or the IRI itself when that form would collide with a term.
    fn fallback_key(&self, iri: &str) -> String {
        let compacted = self.ctx.compact_iri_with(iri, false, IriMode::KEY);
        if self.ctx.term(&compacted).is_some() {
            return iri.to_string();
        }
        compacted
    }
}

/// Whether the target context names a remote document, which is always echoed.
fn references_remote(provided: Option<&Value>) -> bool {
    match provided {
        Some(Value::String(_)) => true,
        Some(Value::Array(members)) => members.iter().any(Value::is_string),
        _ => false,
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

/// Top-level nodes that all describe the same subject are folded into one.
fn merge_same_subject(nodes: Vec<&Map<String, Value>>) -> Vec<Cow<'_, Map<String, Value>>> {
    let shared_id = nodes.first().and_then(|n| n.get(ID));
    let same = nodes.len() > 1 && shared_id.is_some() && nodes.iter().all(|n| n.get(ID) == shared_id);
    if !same {
        return nodes.into_iter().map(Cow::Borrowed).collect();
    }

    let mut merged = Map::new();
    for node in nodes {
        for (key, value) in node {
            if key == ID {
                merged.insert(key.clone(), value.clone());
                continue;
            }
            let entry = merged
                .entry(key.clone())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(existing) = entry {
                for item in as_values(value) {
                    if key != TYPE || !existing.contains(item) {
                        existing.push(item.clone());
                    }
                }
            }
        }
    }
    vec![Cow::Owned(merged)]
}
