use std::collections::HashSet;

use serde_json::{Map, Value};

use super::iri::{IriMode, is_absolute_iri};
use super::{Coercion, Context, Language, TermDefinition, TermTarget};
use crate::keywords::{BASE, CONTAINER, CONTEXT, ID, LANGUAGE, TYPE, VOCAB};

/// A serialized term: its output key, definition and the prefix terms it uses.
struct Entry {
    key: String,
    value: Value,
    deps: Vec<String>,
}

impl Context {
    /// Serialize as `{"@context": ...}`.
    ///
    /// A context that was parsed and never modified echoes its source.
    /// Otherwise the minimal equivalent context is generated, with every prefix
    /// placed before the terms that use it.
    pub fn serialize(&self) -> Value {
        let mut out = Map::new();
        out.insert(CONTEXT.to_string(), self.context_value());
        Value::Object(out)
    }

    /// The value placed under `@context` by [`serialize`](Self::serialize).
    pub fn context_value(&self) -> Value {
        if !self.modified
            && let Some(provided) = &self.provided
        {
            return provided.clone();
        }

        let mut out = Map::new();
        if let Some(language) = &self.language {
            out.insert(LANGUAGE.to_string(), Value::String(language.clone()));
        }
        if let Some(vocab) = &self.vocab {
            out.insert(VOCAB.to_string(), Value::String(vocab.clone()));
        }
        if self.explicit_base {
            out.insert(
                BASE.to_string(),
                self.base.clone().map_or(Value::Null, Value::String),
            );
        }

        let entries: Vec<(&str, Entry)> = self
            .terms
            .iter()
            .map(|(term, def)| (term.as_str(), self.serialize_term(term, def)))
            .collect();

        let mut placed = HashSet::new();
        for index in 0..entries.len() {
            place(index, &entries, &mut placed, &mut out);
        }
        Value::Object(out)
    }

    fn serialize_term(&self, term: &str, def: &TermDefinition) -> Entry {
        let mut deps = Vec::new();

        // Definitions keyed by an absolute IRI are re-keyed through a prefix.
        let key = if is_absolute_iri(term) && !self.is_prefixed(term) {
            self.compact_with_prefix(term, None, &mut deps)
        } else {
            if let Some((prefix, _)) = term.split_once(':')
                && self.prefix_iri(prefix).is_some()
            {
                deps.push(prefix.to_string());
            }
            term.to_string()
        };

        // The key alone expands to the target; no `@id` needed.
        let implied = def.iri().is_some_and(|iri| {
            key.contains(':') && self.expand_iri_with(&key, IriMode::KEY) == iri
        });

        let id = match &def.target {
            TermTarget::Iri(_) if implied => None,
            TermTarget::Iri(iri) => Some(Value::String(self.compact_with_prefix(iri, Some(term), &mut deps))),
            TermTarget::Generator(iris) => Some(Value::Array(
                iris.iter()
                    .map(|iri| Value::String(self.compact_with_prefix(iri, Some(term), &mut deps)))
                    .collect(),
            )),
        };

        let value = match id {
            Some(id) if def.is_simple() => id,
            id => {
                let mut obj = Map::new();
                if let Some(id) = id {
                    obj.insert(ID.to_string(), id);
                }
                match &def.coercion {
                    Some(Coercion::Id) => {
                        obj.insert(TYPE.to_string(), Value::String(ID.to_string()));
                    }
                    Some(Coercion::Datatype(dt)) => {
                        obj.insert(TYPE.to_string(), Value::String(self.compact_with_prefix(dt, None, &mut deps)));
                    }
                    None => {}
                }
                if let Some(container) = def.container {
                    obj.insert(CONTAINER.to_string(), Value::String(container.as_keyword().to_string()));
                }
                match &def.language {
                    Language::Inherit => {}
                    Language::Null => {
                        obj.insert(LANGUAGE.to_string(), Value::Null);
                    }
                    Language::Tag(tag) => {
                        obj.insert(LANGUAGE.to_string(), Value::String(tag.clone()));
                    }
                }
                Value::Object(obj)
            }
        };

        deps.retain(|dep| dep != term);
        Entry { key, value, deps }
    }

    /// True when `value` is already in `prefix:suffix` form for a known prefix.
    fn is_prefixed(&self, value: &str) -> bool {
        value
            .split_once(':')
            .is_some_and(|(prefix, suffix)| !suffix.starts_with("//") && self.prefix_iri(prefix).is_some())
    }

    fn compact_with_prefix(&self, iri: &str, exclude: Option<&str>, deps: &mut Vec<String>) -> String {
        match self.prefixed_forms(iri, exclude).into_iter().next() {
            Some(form) => {
                if let Some((prefix, _)) = form.split_once(':') {
                    deps.push(prefix.to_string());
                }
                form
            }
            None => iri.to_string(),
        }
    }
}

/// Emit an entry after the entries for the prefixes it depends on.
fn place(index: usize, entries: &[(&str, Entry)], placed: &mut HashSet<usize>, out: &mut Map<String, Value>) {
    if !placed.insert(index) {
        return;
    }
    let (_, entry) = &entries[index];
    for dep in &entry.deps {
        if let Some(dep_index) = entries.iter().position(|(term, _)| term == dep) {
            place(dep_index, entries, placed, out);
        }
    }
    out.insert(entry.key.clone(), entry.value.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::xsd;
    use crate::options::JsonLdOptions;
    use serde_json::json;

    const FOAF: &str = "http://xmlns.com/foaf/0.1/";

    fn empty() -> Context {
        Context::new(&JsonLdOptions::default())
    }

    fn keys(value: &Value) -> Vec<String> {
        value[CONTEXT].as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn echoes_provided_context() {
        let source = json!({"foo": "http://example.com/"});
        let ctx = Context::parse(&source, &JsonLdOptions::default()).unwrap();
        assert_eq!(ctx.serialize(), json!({"@context": source}));
    }

    #[test]
    fn serializes_language_and_mappings() {
        let mut ctx = empty();
        ctx.set_language(Some("en"));
        ctx.mapping("foo", "bar");
        assert_eq!(ctx.serialize(), json!({"@context": {"@language": "en", "foo": "bar"}}));
    }

    #[test]
    fn serializes_coercions() {
        let mut ctx = empty();
        ctx.mapping("xsd", xsd::NS);
        ctx.mapping("homepage", &format!("{FOAF}homepage"));
        ctx.coerce(&format!("{FOAF}homepage"), Coercion::Id);
        ctx.mapping("created", "http://purl.org/dc/terms/created");
        ctx.coerce("http://purl.org/dc/terms/created", Coercion::Datatype(xsd::DATE.into()));

        assert_eq!(
            ctx.serialize(),
            json!({"@context": {
                "xsd": xsd::NS,
                "homepage": {"@id": format!("{FOAF}homepage"), "@type": "@id"},
                "created": {"@id": "http://purl.org/dc/terms/created", "@type": "xsd:date"}
            }})
        );
    }

    #[test]
    fn serializes_lists_through_prefixes() {
        let mut ctx = empty();
        ctx.mapping("knows", &format!("{FOAF}knows"));
        ctx.list(&format!("{FOAF}knows"), true);
        ctx.mapping("foaf", FOAF);
        ctx.list(&format!("{FOAF}member"), true);

        let serialized = ctx.serialize();
        assert_eq!(
            serialized,
            json!({"@context": {
                "foaf": FOAF,
                "knows": {"@id": "foaf:knows", "@container": "@list"},
                "foaf:member": {"@container": "@list"}
            }})
        );
        assert_eq!(keys(&serialized), vec!["foaf", "knows", "foaf:member"]);
    }

    #[test]
    fn prefixes_precede_dependents() {
        let mut ctx = empty();
        ctx.mapping("name", &format!("{FOAF}name"));
        ctx.mapping("foaf", FOAF);
        let serialized = ctx.serialize();
        assert_eq!(keys(&serialized), vec!["foaf", "name"]);
        assert_eq!(serialized[CONTEXT]["name"], json!("foaf:name"));
    }

    #[test]
    fn serializes_term_language_and_generators() {
        let ctx = Context::parse(
            &json!({
                "ex": "http://example.com/",
                "plain": {"@id": "ex:plain", "@language": null},
                "gen": {"@id": ["ex:a", "ex:b"], "@container": "@set"}
            }),
            &JsonLdOptions::default(),
        )
        .unwrap();
        let mut modified = ctx.clone();
        modified.set_language(None);
        assert_eq!(
            modified.serialize(),
            json!({"@context": {
                "ex": "http://example.com/",
                "plain": {"@id": "ex:plain", "@language": null},
                "gen": {"@id": ["ex:a", "ex:b"], "@container": "@set"}
            }})
        );
    }

    #[test]
    fn empty_context_serializes_empty() {
        assert_eq!(empty().context_value(), json!({}));
        assert!(empty().is_empty());
    }
}
