//! JSON-LD expansion: every key becomes an absolute IRI or keyword and every
//! value an explicit node, value, or list object.

use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::context::{
    Container, Context, IriMode, TermDefinition, TermTarget, is_absolute_iri, is_blank_node, is_keyword,
};
use crate::error::{JsonLdError, Result};
use crate::keywords::{CONTEXT, GRAPH, ID, LANGUAGE, LIST, SET, TYPE, VALUE};
use crate::options::JsonLdOptions;

/// Expand a JSON-LD document into an array of node objects.
///
/// `context`, when given, is applied before any `@context` embedded in the
/// document. Free-floating values and nodes carrying nothing but `@id` are
/// dropped from the top level.
pub fn expand(document: &Value, context: Option<&Value>, options: &JsonLdOptions) -> Result<Value> {
    let mut active = Context::new(options);
    if let Some(context) = context {
        active = active.merge(context, options)?;
    }
    let nodes = Expander::new(options).expand_top_level(document, &active)?;
    options.debug(format!("expand: {} top-level nodes", nodes.len()));
    Ok(Value::Array(nodes))
}

pub(crate) struct Expander<'o> {
    options: &'o JsonLdOptions,
}

impl<'o> Expander<'o> {
    pub(crate) fn new(options: &'o JsonLdOptions) -> Self {
        Self { options }
    }

    pub(crate) fn expand_top_level(&self, document: &Value, ctx: &Context) -> Result<Vec<Value>> {
        let mut nodes = Vec::new();
        for item in self.expand_item(document, ctx, None)? {
            self.push_top_level(item, &mut nodes);
        }
        Ok(nodes)
    }

    fn push_top_level(&self, item: Value, nodes: &mut Vec<Value>) {
        let Value::Object(map) = item else {
            return;
        };
        if map.contains_key(VALUE) || map.contains_key(LIST) {
            self.options.debug("expand: dropping free-floating value at top level");
            return;
        }
        if map.len() == 1 && map.contains_key(ID) {
            self.options.debug("expand: dropping top-level node with only @id");
            return;
        }
        if map.len() == 1
            && let Some(Value::Array(graph)) = map.get(GRAPH)
        {
            for node in graph {
                self.push_top_level(node.clone(), nodes);
            }
            return;
        }
        nodes.push(Value::Object(map));
    }

    /// Expand any JSON value appearing as a property value or document root.
    /// Arrays flatten; `null` expands to nothing.
    fn expand_item(&self, item: &Value, ctx: &Context, def: Option<&TermDefinition>) -> Result<Vec<Value>> {
        match item {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => {
                let mut out = Vec::new();
                for item in items {
                    out.extend(self.expand_item(item, ctx, def)?);
                }
                Ok(out)
            }
            Value::Object(map) => self.expand_object(map, ctx, def),
            scalar => Ok(ctx.expand_scalar(def, scalar)?.into_iter().collect()),
        }
    }

    /// Expand an object into zero or more values. Set objects contribute their
    /// members; everything else at most one object.
    fn expand_object(
        &self,
        map: &Map<String, Value>,
        parent: &Context,
        def: Option<&TermDefinition>,
    ) -> Result<Vec<Value>> {
        let ctx: Cow<'_, Context> = match map.get(CONTEXT) {
            Some(local) => Cow::Owned(parent.merge(local, self.options)?),
            None => Cow::Borrowed(parent),
        };
        let ctx = ctx.as_ref();

        let keys: Vec<(&str, String, &Value)> = map
            .iter()
            .filter(|(key, _)| key.as_str() != CONTEXT)
            .map(|(key, value)| (key.as_str(), self.expand_key(key, ctx), value))
            .collect();

        if keys.iter().any(|(_, expanded, _)| expanded == VALUE) {
            return Ok(self.expand_value_object(&keys, ctx)?.into_iter().collect());
        }
        if let Some((_, _, items)) = keys.iter().find(|(_, expanded, _)| expanded == LIST) {
            self.check_only(&keys, LIST)?;
            let items = self.expand_list_items(items, ctx, def)?;
            return Ok(vec![list_object(items)]);
        }
        if let Some((_, _, items)) = keys.iter().find(|(_, expanded, _)| expanded == SET) {
            self.check_only(&keys, SET)?;
            return self.expand_item(items, ctx, def);
        }

        let node = self.expand_node(&keys, ctx)?;
        if node.is_empty() {
            self.options.debug("expand: dropping empty node object");
            return Ok(Vec::new());
        }
        Ok(vec![Value::Object(node)])
    }

    fn expand_key(&self, key: &str, ctx: &Context) -> String {
        if is_keyword(key) {
            return key.to_string();
        }
        ctx.expand_iri_with(key, IriMode::KEY)
    }

    /// In validate mode, `keyword` must be the only key of its object.
    fn check_only(&self, keys: &[(&str, String, &Value)], keyword: &str) -> Result<()> {
        if let Some((key, _, _)) = keys.iter().find(|(_, expanded, _)| expanded != keyword) {
            if self.options.validate() {
                return Err(JsonLdError::invalid_value(format!(
                    "{keyword} object cannot contain {key}"
                )));
            }
            self.options.warn(format!("expand: dropping {key} beside {keyword}"));
        }
        Ok(())
    }

    fn expand_value_object(&self, keys: &[(&str, String, &Value)], ctx: &Context) -> Result<Option<Value>> {
        let mut value = None;
        let mut datatype = None;
        let mut language = None;

        for (key, expanded, v) in keys {
            match expanded.as_str() {
                VALUE => value = Some(*v),
                TYPE => match v {
                    Value::String(t) => datatype = Some(ctx.expand_iri_with(t, IriMode::KEY)),
                    other => self.invalid(format!("@type of a value object must be a string: {other}"))?,
                },
                LANGUAGE => match v {
                    Value::String(tag) => language = Some(tag.clone()),
                    Value::Null => {}
                    other => self.invalid(format!("@language must be a string: {other}"))?,
                },
                _ => self.invalid(format!("unexpected key {key} in value object"))?,
            }
        }

        let value = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(v) if !v.is_array() && !v.is_object() => v.clone(),
            Some(other) => {
                self.invalid(format!("@value must be a scalar: {other}"))?;
                return Ok(None);
            }
        };

        if datatype.is_some() && language.is_some() {
            self.invalid("value object cannot carry both @type and @language")?;
            language = None;
        }

        let mut out = Map::new();
        out.insert(VALUE.into(), value);
        if let Some(datatype) = datatype {
            out.insert(TYPE.into(), Value::String(datatype));
        }
        if let Some(language) = language {
            out.insert(LANGUAGE.into(), Value::String(language));
        }
        Ok(Some(Value::Object(out)))
    }

    /// Report a malformed value: an error in validate mode, a warning otherwise.
    fn invalid(&self, message: impl AsRef<str>) -> Result<()> {
        if self.options.validate() {
            return Err(JsonLdError::invalid_value(message.as_ref()));
        }
        self.options.warn(format!("expand: {}", message.as_ref()));
        Ok(())
    }

    fn expand_node(&self, keys: &[(&str, String, &Value)], ctx: &Context) -> Result<Map<String, Value>> {
        let mut node = Map::new();

        for (key, expanded, value) in keys {
            match expanded.as_str() {
                ID => match value {
                    Value::String(id) => {
                        node.insert(ID.into(), Value::String(ctx.expand_iri_with(id, IriMode::REFERENCE)));
                    }
                    other => self.invalid(format!("@id must be a string: {other}"))?,
                },
                TYPE => {
                    let types = self.expand_types(value, ctx)?;
                    if !types.is_empty() {
                        node.insert(TYPE.into(), Value::Array(types));
                    }
                }
                GRAPH => {
                    let mut graph = Vec::new();
                    for item in self.expand_item(value, ctx, None)? {
                        self.push_top_level(item, &mut graph);
                    }
                    node.insert(GRAPH.into(), Value::Array(graph));
                }
                keyword if is_keyword(keyword) => {
                    if self.options.validate() {
                        return Err(JsonLdError::invalid_property(format!(
                            "unsupported keyword {keyword}"
                        )));
                    }
                    self.options.warn(format!("expand: dropping unsupported keyword {keyword}"));
                }
                _ => self.expand_property(&mut node, key, expanded, value, ctx)?,
            }
        }
        Ok(node)
    }

    fn expand_types(&self, value: &Value, ctx: &Context) -> Result<Vec<Value>> {
        let mut types = Vec::new();
        let values = match value {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        for t in values {
            match t {
                Value::String(t) => types.push(Value::String(ctx.expand_iri_with(t, IriMode::TYPE))),
                other => self.invalid(format!("@type entries must be strings: {other}"))?,
            }
        }
        Ok(types)
    }

    fn expand_property(
        &self,
        node: &mut Map<String, Value>,
        key: &str,
        expanded: &str,
        value: &Value,
        ctx: &Context,
    ) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        let def = ctx.term(key).or_else(|| ctx.definition_for_iri(expanded));

        let predicates: Vec<&str> = match def.map(|d| &d.target) {
            Some(TermTarget::Generator(iris)) => iris.iter().map(String::as_str).collect(),
            _ => {
                if !is_absolute_iri(expanded) && !is_blank_node(expanded) {
                    if self.options.validate() {
                        return Err(JsonLdError::invalid_property(format!(
                            "{key} does not expand to an absolute IRI"
                        )));
                    }
                    self.options.debug(format!("expand: dropping unmapped property {key}"));
                    return Ok(());
                }
                vec![expanded]
            }
        };

        let values = self.expand_property_value(value, ctx, def)?;
        for predicate in predicates {
            let entry = node
                .entry(predicate.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(existing) = entry {
                existing.extend(values.iter().cloned());
            }
        }
        Ok(())
    }

    fn expand_property_value(
        &self,
        value: &Value,
        ctx: &Context,
        def: Option<&TermDefinition>,
    ) -> Result<Vec<Value>> {
        match def.and_then(|d| d.container) {
            Some(Container::Language) if is_language_map(value) => expand_language_map(value),
            Some(Container::List) => {
                let items = match value {
                    Value::Object(map) => {
                        let expanded = self.expand_object(map, ctx, def)?;
                        if let [single] = expanded.as_slice()
                            && single.get(LIST).is_some()
                        {
                            return Ok(expanded);
                        }
                        reject_nested_lists(&expanded, value)?;
                        expanded
                    }
                    _ => self.expand_list_items(value, ctx, def)?,
                };
                Ok(vec![list_object(items)])
            }
            _ => self.expand_item(value, ctx, def),
        }
    }

    /// Expand the members of a list. Nested lists are rejected.
    fn expand_list_items(&self, value: &Value, ctx: &Context, def: Option<&TermDefinition>) -> Result<Vec<Value>> {
        let members = match value {
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        let mut items = Vec::new();
        for member in members {
            if member.is_array() {
                return Err(JsonLdError::list_of_lists(format!(
                    "list member is an array: {member}"
                )));
            }
            let expanded = self.expand_item(member, ctx, def)?;
            reject_nested_lists(&expanded, member)?;
            items.extend(expanded);
        }
        Ok(items)
    }
}

fn reject_nested_lists(items: &[Value], member: &Value) -> Result<()> {
    if items.iter().any(|item| item.get(LIST).is_some()) {
        return Err(JsonLdError::list_of_lists(format!(
            "list member is a list: {member}"
        )));
    }
    Ok(())
}

fn list_object(items: Vec<Value>) -> Value {
    let mut out = Map::new();
    out.insert(LIST.into(), Value::Array(items));
    Value::Object(out)
}

fn is_language_map(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.keys().all(|key| !is_keyword(key)))
}

fn expand_language_map(value: &Value) -> Result<Vec<Value>> {
    let mut out = Vec::new();
    let Some(map) = value.as_object() else {
        return Ok(out);
    };
    for (language, members) in map {
        let members = match members {
            Value::Null => continue,
            Value::Array(items) => items.as_slice(),
            single => std::slice::from_ref(single),
        };
        for member in members {
            let Value::String(text) = member else {
                return Err(JsonLdError::processing(format!(
                    "language map value for {language} must be a string: {member}"
                )));
            };
            let mut literal = Map::new();
            literal.insert(VALUE.into(), Value::String(text.clone()));
            literal.insert(LANGUAGE.into(), Value::String(language.clone()));
            out.push(Value::Object(literal));
        }
    }
    Ok(out)
}
