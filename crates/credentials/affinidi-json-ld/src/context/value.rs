use serde_json::{Map, Value};

use super::iri::IriMode;
use super::{Coercion, Container, Context, TermDefinition};
use crate::error::{JsonLdError, Result};
use crate::keywords::{ID, LANGUAGE, LIST, TYPE, VALUE};
use crate::native::Native;
use crate::shape::{LiteralShape, Shape};

impl Context {
    /// Expand a scalar value of the predicate `predicate` into its expanded
    /// form. `null` expands to nothing.
    pub fn expand_value(&self, predicate: &str, value: &Value) -> Result<Option<Value>> {
        self.expand_scalar(self.definition_for_iri(predicate), value)
    }

    /// Expand a native date, time or dateTime, or a number or boolean.
    pub fn expand_native(&self, predicate: &str, native: &Native) -> Value {
        let datatype = match self.definition_for_iri(predicate).and_then(|d| d.coercion.as_ref()) {
            Some(Coercion::Datatype(dt)) => dt.as_str(),
            _ => native.datatype(),
        };
        let mut out = Map::new();
        match native.to_json() {
            Some(json) if datatype == native.datatype() => {
                out.insert(VALUE.into(), json);
            }
            _ => {
                out.insert(VALUE.into(), Value::String(native.lexical_form()));
                out.insert(TYPE.into(), Value::String(datatype.to_string()));
            }
        }
        Value::Object(out)
    }

    pub(crate) fn expand_scalar(&self, def: Option<&TermDefinition>, value: &Value) -> Result<Option<Value>> {
        let coercion = def.and_then(|d| d.coercion.as_ref());
        let mut out = Map::new();
        match value {
            Value::Null => return Ok(None),
            Value::String(s) => match coercion {
                Some(Coercion::Id) => {
                    out.insert(ID.into(), Value::String(self.expand_iri_with(s, IriMode::REFERENCE)));
                }
                Some(Coercion::Datatype(dt)) => {
                    out.insert(VALUE.into(), value.clone());
                    out.insert(TYPE.into(), Value::String(dt.clone()));
                }
                None => {
                    out.insert(VALUE.into(), value.clone());
                    let language = match def {
                        Some(def) => def.effective_language(self.language()),
                        None => self.language(),
                    };
                    if let Some(language) = language {
                        out.insert(LANGUAGE.into(), Value::String(language.to_string()));
                    }
                }
            },
            Value::Bool(_) | Value::Number(_) => {
                out.insert(VALUE.into(), value.clone());
                if let Some(Coercion::Datatype(dt)) = coercion {
                    out.insert(TYPE.into(), Value::String(dt.clone()));
                }
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(JsonLdError::processing(format!(
                    "expected a scalar value, found {value}"
                )));
            }
        }
        Ok(Some(Value::Object(out)))
    }

    /// Compact an expanded value of the predicate `predicate`: the bare value
    /// when the predicate's coercion, language and list container make that
    /// unambiguous, an aliased object form otherwise.
    pub fn compact_value(&self, predicate: &str, value: &Value) -> Result<Value> {
        self.compact_value_in(self.definition_for_iri(predicate), value, &mut |node: &Map<String, Value>| {
            Err(JsonLdError::processing(format!(
                "expected a value object, found node {}",
                Value::Object(node.clone())
            )))
        })
    }

    /// Compact a value under `def`. Node objects, including nodes inside lists,
    /// are handed to `nodes`.
    pub(crate) fn compact_value_in(
        &self,
        def: Option<&TermDefinition>,
        value: &Value,
        nodes: &mut dyn FnMut(&Map<String, Value>) -> Result<Value>,
    ) -> Result<Value> {
        let coercion = def.and_then(|d| d.coercion.as_ref());
        match Shape::classify(value)? {
            Shape::NodeRef(id) => {
                let compacted = self.compact_iri_with(id, true, IriMode::REFERENCE);
                if coercion == Some(&Coercion::Id) {
                    Ok(Value::String(compacted))
                } else {
                    Ok(self.aliased([(ID, Value::String(compacted))]))
                }
            }
            Shape::Literal(literal) => Ok(self.compact_literal(def, literal)),
            Shape::List(items) => {
                let mut compacted = Vec::with_capacity(items.len());
                for item in items {
                    if Shape::classify(item)?.is_list() {
                        return Err(JsonLdError::list_of_lists(format!(
                            "list item is itself a list: {item}"
                        )));
                    }
                    compacted.push(self.compact_value_in(def, item, nodes)?);
                }
                if def.and_then(|d| d.container) == Some(Container::List) {
                    Ok(Value::Array(compacted))
                } else {
                    Ok(self.aliased([(LIST, Value::Array(compacted))]))
                }
            }
            Shape::Node(map) => nodes(map),
            Shape::Graph { .. } => value
                .as_object()
                .map_or_else(|| Err(JsonLdError::processing("graph must be an object")), |map| nodes(map)),
        }
    }

    fn compact_literal(&self, def: Option<&TermDefinition>, literal: LiteralShape<'_>) -> Value {
        let coercion = def.and_then(|d| d.coercion.as_ref());
        let language = match def {
            Some(def) => def.effective_language(self.language()),
            None => self.language(),
        };
        let LiteralShape {
            value,
            datatype,
            language: tag,
        } = literal;

        if let Some(dt) = datatype {
            if matches!(coercion, Some(Coercion::Datatype(c)) if c == dt) {
                return value.clone();
            }
            if coercion.is_none() {
                if let Some(native) = value.as_str().and_then(|lexical| Native::from_lexical(lexical, dt)) {
                    return native;
                }
                if Native::from_json(value).is_some_and(|n| n.datatype() == dt) {
                    return value.clone();
                }
            }
            let compacted_type = self.compact_iri_with(dt, true, IriMode::TYPE);
            return self.aliased([(VALUE, value.clone()), (TYPE, Value::String(compacted_type))]);
        }

        if let Some(tag) = tag {
            if coercion.is_none() && language == Some(tag) && value.is_string() {
                return value.clone();
            }
            return self.aliased([(VALUE, value.clone()), (LANGUAGE, Value::String(tag.to_string()))]);
        }

        let bare = coercion.is_none() && (!value.is_string() || language.is_none());
        if bare {
            value.clone()
        } else {
            self.aliased([(VALUE, value.clone())])
        }
    }

    /// Build an object whose keyword keys are replaced by their aliases.
    pub(crate) fn aliased<const N: usize>(&self, entries: [(&str, Value); N]) -> Value {
        let map: Map<String, Value> = entries
            .into_iter()
            .map(|(keyword, value)| (self.keyword_alias(keyword).to_string(), value))
            .collect();
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::xsd;
    use crate::options::JsonLdOptions;
    use chrono::NaiveDate;
    use serde_json::json;

    const FOAF: &str = "http://xmlns.com/foaf/0.1/";

    fn subject() -> Context {
        Context::parse(
            &json!({
                "dc": "http://purl.org/dc/terms/",
                "ex": "http://example.org/",
                "foaf": FOAF,
                "xsd": xsd::NS,
                "foaf:age": {"@type": "xsd:integer"},
                "foaf:knows": {"@type": "@id"},
                "dc:created": {"@type": "xsd:date"},
                "ex:double": {"@type": "xsd:double"},
                "ex:boolean": {"@type": "xsd:boolean"}
            }),
            &JsonLdOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn expands_scalars_by_coercion() {
        let ctx = subject();
        let cases = [
            ("absolute IRI", "http://xmlns.com/foaf/0.1/knows", json!("http://example.com/"), json!({"@id": "http://example.com/"})),
            ("term", "http://xmlns.com/foaf/0.1/knows", json!("ex"), json!({"@id": "http://example.org/"})),
            ("prefix:suffix", "http://xmlns.com/foaf/0.1/knows", json!("ex:suffix"), json!({"@id": "http://example.org/suffix"})),
            ("no IRI", "http://example.com/foo", json!("http://example.com/"), json!({"@value": "http://example.com/"})),
            ("integer", "http://xmlns.com/foaf/0.1/age", json!("54"), json!({"@value": "54", "@type": xsd::INTEGER})),
            ("date", "http://purl.org/dc/terms/created", json!("2011-12-27Z"), json!({"@value": "2011-12-27Z", "@type": xsd::DATE})),
            ("native boolean", "foo", json!(true), json!({"@value": true})),
            ("native integer", "foo", json!(1), json!({"@value": 1})),
            ("native double", "foo", json!(1.1), json!({"@value": 1.1})),
        ];
        for (title, predicate, input, expected) in cases {
            assert_eq!(ctx.expand_value(predicate, &input).unwrap(), Some(expected), "{title}");
        }
    }

    #[test]
    fn null_expands_to_nothing() {
        assert_eq!(subject().expand_value("foo", &Value::Null).unwrap(), None);
    }

    #[test]
    fn expands_with_language() {
        let mut ctx = subject();
        ctx.set_language(Some("en"));
        assert_eq!(
            ctx.expand_value("foo", &json!("foo")).unwrap(),
            Some(json!({"@value": "foo", "@language": "en"}))
        );
        assert_eq!(
            ctx.expand_value("http://xmlns.com/foaf/0.1/age", &json!("54")).unwrap(),
            Some(json!({"@value": "54", "@type": xsd::INTEGER}))
        );
    }

    #[test]
    fn expands_native_dates() {
        let ctx = subject();
        let date = NaiveDate::from_ymd_opt(2011, 12, 27).unwrap();
        assert_eq!(
            ctx.expand_native("http://purl.org/dc/terms/created", &Native::from(date)),
            json!({"@value": "2011-12-27", "@type": xsd::DATE})
        );
        assert_eq!(
            ctx.expand_native("foo", &Native::from(5_i64)),
            json!({"@value": 5})
        );
    }

    #[test]
    fn rejects_non_scalars() {
        let ctx = subject();
        assert!(ctx.expand_value("foo", &json!([1])).is_err());
        assert!(ctx.expand_value("foo", &json!({"a": 1})).is_err());
    }

    #[test]
    fn compacts_values_by_coercion() {
        let ctx = subject();
        let cases = [
            ("absolute IRI", "http://xmlns.com/foaf/0.1/knows", json!({"@id": "http://example.com/"}), json!("http://example.com/")),
            ("prefix:suffix", "http://xmlns.com/foaf/0.1/knows", json!({"@id": "http://example.org/suffix"}), json!("ex:suffix")),
            ("integer", "http://xmlns.com/foaf/0.1/age", json!({"@value": "54", "@type": xsd::INTEGER}), json!("54")),
            ("date", "http://purl.org/dc/terms/created", json!({"@value": "2011-12-27Z", "@type": xsd::DATE}), json!("2011-12-27Z")),
            ("no IRI", "http://example.com/foo", json!({"@value": "http://example.com/"}), json!("http://example.com/")),
            ("uncoerced reference", "http://example.com/foo", json!({"@id": "http://example.org/a"}), json!({"@id": "ex:a"})),
            ("canonical integer", "http://example.com/foo", json!({"@value": "54", "@type": xsd::INTEGER}), json!(54)),
            ("native boolean", "http://example.com/foo", json!({"@value": true}), json!(true)),
            ("mismatched datatype", "http://xmlns.com/foaf/0.1/age", json!({"@value": "x", "@type": xsd::STRING}), json!({"@value": "x", "@type": "xsd:string"})),
        ];
        for (title, predicate, input, expected) in cases {
            assert_eq!(ctx.compact_value(predicate, &input).unwrap(), expected, "{title}");
        }
    }

    #[test]
    fn compacts_language_values() {
        let mut ctx = subject();
        ctx.set_language(Some("en"));
        assert_eq!(
            ctx.compact_value("foo", &json!({"@value": "foo", "@language": "en"})).unwrap(),
            json!("foo")
        );
        assert_eq!(
            ctx.compact_value("foo", &json!({"@value": "foo", "@language": "de"})).unwrap(),
            json!({"@value": "foo", "@language": "de"})
        );
        assert_eq!(
            ctx.compact_value("foo", &json!({"@value": "foo"})).unwrap(),
            json!({"@value": "foo"})
        );
    }

    #[test]
    fn compacts_with_keyword_aliases() {
        let ctx = Context::parse(
            &json!({"id": "@id", "value": "@value", "type": "@type", "list": "@list"}),
            &JsonLdOptions::default(),
        )
        .unwrap();
        assert_eq!(
            ctx.compact_value("p", &json!({"@id": "http://example.com/"})).unwrap(),
            json!({"id": "http://example.com/"})
        );
        assert_eq!(
            ctx.compact_value("p", &json!({"@value": "x", "@type": "http://example.com/t"})).unwrap(),
            json!({"value": "x", "type": "http://example.com/t"})
        );
        assert_eq!(
            ctx.compact_value("p", &json!({"@list": [{"@value": "a"}]})).unwrap(),
            json!({"list": ["a"]})
        );
    }

    #[test]
    fn compact_value_rejects_nested_lists_and_non_objects() {
        let ctx = subject();
        let err = ctx
            .compact_value("p", &json!({"@list": [{"@list": []}]}))
            .unwrap_err();
        assert!(matches!(err, JsonLdError::ListOfLists(_)));
        assert!(ctx.compact_value("p", &json!(["a"])).is_err());
        assert!(ctx.compact_value("p", &json!("a")).is_err());
    }
}
