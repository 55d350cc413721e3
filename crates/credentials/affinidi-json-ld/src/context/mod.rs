//! The active context: term definitions plus default language, vocabulary and
//! base IRI, built from inline, remote or existing context sources.

mod iri;
mod select;
mod serialize;
mod value;

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{JsonLdError, Result};
use crate::keywords::{BASE, CONTAINER, CONTEXT, ID, LANGUAGE, TYPE, VOCAB};
use crate::options::JsonLdOptions;

pub(crate) use iri::IriMode;
pub use iri::{is_absolute_iri, is_blank_node, is_keyword};

/// What a term maps to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermTarget {
    /// A single IRI, or a keyword when the term is a keyword alias.
    Iri(String),
    /// A property generator: several predicate IRIs under one key.
    Generator(Vec<String>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Container {
    List,
    Set,
    Language,
}

impl Container {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::List => "@list",
            Self::Set => "@set",
            Self::Language => "@language",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Coercion {
    /// Bare strings are IRI references.
    Id,
    /// Bare values are literals of this datatype IRI.
    Datatype(String),
}

/// Language override carried by a term definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Language {
    /// Use the context's default language.
    #[default]
    Inherit,
    /// Explicit `"@language": null`: strings carry no language.
    Null,
    Tag(String),
}

/// A single term definition within a context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TermDefinition {
    pub target: TermTarget,
    pub container: Option<Container>,
    pub coercion: Option<Coercion>,
    pub language: Language,
}

impl TermDefinition {
    pub fn new(iri: impl Into<String>) -> Self {
        Self {
            target: TermTarget::Iri(iri.into()),
            container: None,
            coercion: None,
            language: Language::Inherit,
        }
    }

    /// The single target IRI, `None` for property generators.
    pub fn iri(&self) -> Option<&str> {
        match &self.target {
            TermTarget::Iri(iri) => Some(iri),
            TermTarget::Generator(_) => None,
        }
    }

    pub fn is_generator(&self) -> bool {
        matches!(self.target, TermTarget::Generator(_))
    }

    pub fn is_keyword_alias(&self) -> bool {
        self.iri().is_some_and(is_keyword)
    }

    /// True when the definition carries nothing beyond its target.
    pub fn is_simple(&self) -> bool {
        self.container.is_none()
            && self.coercion.is_none()
            && self.language == Language::Inherit
            && !self.is_generator()
    }

    /// The language strings take under this definition, given the default.
    pub fn effective_language<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        match &self.language {
            Language::Inherit => default,
            Language::Null => None,
            Language::Tag(tag) => Some(tag),
        }
    }
}

/// A context source accepted by [`Context::parse_source`].
#[derive(Clone, Copy, Debug)]
pub enum ContextSource<'a> {
    /// Inline object, array, `null`, or a reference string.
    Value(&'a Value),
    /// A remote context URL.
    Reference(&'a str),
    /// An already processed context, duplicated.
    Existing(&'a Context),
}

/// A processed JSON-LD context.
#[derive(Clone, Debug, Default)]
pub struct Context {
    terms: IndexMap<String, TermDefinition>,
    language: Option<String>,
    vocab: Option<String>,
    base: Option<String>,
    explicit_base: bool,
    options_base: Option<String>,
    provided: Option<Value>,
    modified: bool,
}

/// Raw target of a term before chain resolution.
#[derive(Clone, Debug)]
enum RawTarget {
    Single(String),
    Many(Vec<String>),
}

#[derive(Clone, Debug)]
struct RawDefinition {
    target: RawTarget,
    coercion: Option<String>,
    container: Option<Container>,
    language: Language,
}

impl Context {
    /// An empty context using the options' base IRI.
    pub fn new(options: &JsonLdOptions) -> Self {
        Self {
            base: options.base().map(str::to_string),
            options_base: options.base().map(str::to_string),
            ..Self::default()
        }
    }

    /// Parse a context value into a new context.
    ///
    /// A document of the form `{"@context": ...}` is unwrapped first.
    pub fn parse(source: &Value, options: &JsonLdOptions) -> Result<Self> {
        Self::parse_source(ContextSource::Value(source), options)
    }

    pub fn parse_source(source: ContextSource<'_>, options: &JsonLdOptions) -> Result<Self> {
        match source {
            ContextSource::Existing(existing) => {
                options.debug("parse: duplicating existing context");
                Ok(existing.clone())
            }
            ContextSource::Reference(url) => {
                Self::parse_source(ContextSource::Value(&Value::String(url.to_string())), options)
            }
            ContextSource::Value(value) => {
                let value = unwrap_document(value);
                let mut ctx = Self::new(options);
                ctx.apply(value, options, &mut Vec::new())?;
                ctx.provided = Some(value.clone());
                ctx.modified = false;
                Ok(ctx)
            }
        }
    }

    /// Layer a local context onto a copy of this one.
    ///
    /// Like [`parse`](Self::parse), a `{"@context": ...}` wrapper is unwrapped.
    pub fn merge(&self, local: &Value, options: &JsonLdOptions) -> Result<Self> {
        let mut ctx = self.clone();
        ctx.apply(unwrap_document(local), options, &mut Vec::new())?;
        Ok(ctx)
    }

    fn apply(&mut self, value: &Value, options: &JsonLdOptions, remotes: &mut Vec<String>) -> Result<()> {
        match value {
            Value::Null => {
                options.debug("context: null resets the active context");
                self.terms.clear();
                self.language = None;
                self.vocab = None;
                self.base = self.options_base.clone();
                self.explicit_base = false;
            }
            Value::Array(members) => {
                for member in members {
                    self.apply(member, options, remotes)?;
                }
            }
            Value::String(url) => self.apply_remote(url, options, remotes)?,
            Value::Object(obj) => self.apply_object(obj, options)?,
            other => {
                return Err(JsonLdError::context(format!(
                    "invalid @context value: {other}"
                )));
            }
        }
        Ok(())
    }

    fn apply_remote(&mut self, reference: &str, options: &JsonLdOptions, remotes: &mut Vec<String>) -> Result<()> {
        let url = match &self.base {
            Some(base) if !is_absolute_iri(reference) => iri::resolve_relative(base, reference),
            _ => reference.to_string(),
        };
        if remotes.contains(&url) {
            return Err(JsonLdError::context(format!(
                "recursive context inclusion: {url}"
            )));
        }
        options.debug(format!("context: loading remote context {url} via {}", options.loader().name()));

        let document = options.loader().load(&url)?;
        if !document.is_json() {
            options.warn(format!(
                "context: {url} served as {}, parsing as JSON anyway",
                document.content_type
            ));
        }
        let parsed: Value = serde_json::from_slice(&document.body).map_err(|e| {
            JsonLdError::context(format!("Failed to parse remote context at {url}: {e}"))
        })?;
        let inner = parsed.get(CONTEXT).ok_or_else(|| {
            JsonLdError::context(format!("remote document missing @context key: {url}"))
        })?;

        remotes.push(url);
        let result = self.apply(inner, options, remotes);
        remotes.pop();
        result
    }

    fn apply_object(&mut self, obj: &Map<String, Value>, options: &JsonLdOptions) -> Result<()> {
        if let Some(lang) = obj.get(LANGUAGE) {
            self.language = match lang {
                Value::String(tag) => Some(tag.clone()),
                Value::Null => None,
                other => {
                    return Err(JsonLdError::context(format!("invalid @language: {other}")));
                }
            };
        }

        if let Some(vocab) = obj.get(VOCAB) {
            self.vocab = match vocab {
                Value::String(v) => Some(v.clone()),
                Value::Null => None,
                other => return Err(JsonLdError::context(format!("invalid @vocab: {other}"))),
            };
        }

        if let Some(base) = obj.get(BASE) {
            match base {
                Value::String(b) => {
                    let resolved = match &self.base {
                        Some(current) if !is_absolute_iri(b) => iri::resolve_relative(current, b),
                        _ => b.clone(),
                    };
                    self.base = Some(resolved);
                    self.explicit_base = true;
                }
                Value::Null => {
                    self.base = None;
                    self.explicit_base = true;
                }
                other => return Err(JsonLdError::context(format!("invalid @base: {other}"))),
            }
        }

        let mut raw: IndexMap<&str, Option<RawDefinition>> = IndexMap::new();
        for (key, value) in obj {
            if key.starts_with('@') {
                if !matches!(key.as_str(), "@language" | "@vocab" | "@base") {
                    options.warn(format!("context: ignoring unknown keyword {key}"));
                }
                continue;
            }
            raw.insert(key.as_str(), parse_raw_definition(key, value)?);
        }

        let targets = self.resolve_targets(&raw)?;

        for (term, definition) in &raw {
            let Some(definition) = definition else {
                options.debug(format!("context: term '{term}' explicitly unmapped"));
                self.terms.shift_remove(*term);
                continue;
            };
            let target = targets
                .get(*term)
                .cloned()
                .ok_or_else(|| JsonLdError::processing(format!("unresolved term '{term}'")))?;

            let coercion = match definition.coercion.as_deref() {
                None => None,
                Some("@id") => Some(Coercion::Id),
                Some(datatype) => {
                    let resolved = self.resolve_value(term, datatype, &raw, &targets).unwrap_or_else(|| datatype.to_string());
                    if !is_absolute_iri(&resolved) || is_blank_node(&resolved) {
                        return Err(JsonLdError::processing(format!(
                            "invalid coercion target '{datatype}' for term '{term}'"
                        )));
                    }
                    Some(Coercion::Datatype(resolved))
                }
            };

            if let TermTarget::Generator(iris) = &target {
                validate_generator(term, iris, definition.container)?;
            }

            options.debug(format!("context: define '{term}' -> {target:?}"));
            self.terms.insert(
                term.to_string(),
                TermDefinition {
                    target,
                    container: definition.container,
                    coercion,
                    language: definition.language.clone(),
                },
            );
        }
        Ok(())
    }

    /// Resolve every local term target to an IRI by iterating to a fixed point.
    /// A round without progress means the remaining terms form a cycle.
    fn resolve_targets(
        &self,
        raw: &IndexMap<&str, Option<RawDefinition>>,
    ) -> Result<HashMap<String, TermTarget>> {
        let mut resolved: HashMap<String, TermTarget> = HashMap::new();
        let mut pending: Vec<&str> = raw
            .iter()
            .filter(|(_, def)| def.is_some())
            .map(|(term, _)| *term)
            .collect();

        while !pending.is_empty() {
            let before = pending.len();
            pending.retain(|term| {
                let Some(Some(definition)) = raw.get(term) else {
                    return false;
                };
                let target = match &definition.target {
                    RawTarget::Single(value) => self
                        .resolve_value(term, value, raw, &resolved)
                        .map(TermTarget::Iri),
                    RawTarget::Many(values) => values
                        .iter()
                        .map(|value| self.resolve_value(term, value, raw, &resolved))
                        .collect::<Option<Vec<_>>>()
                        .map(TermTarget::Generator),
                };
                match target {
                    Some(target) => {
                        resolved.insert(term.to_string(), target);
                        false
                    }
                    None => true,
                }
            });
            if pending.len() == before {
                return Err(JsonLdError::processing(format!(
                    "cyclic term definitions: {}",
                    pending.join(", ")
                )));
            }
        }
        Ok(resolved)
    }

    /// Resolve one raw IRI-ish value in the scope of a context object being
    /// processed. Terms of that object take priority over the active context.
    /// Returns `None` while a local dependency is still unresolved.
    fn resolve_value(
        &self,
        term: &str,
        value: &str,
        raw: &IndexMap<&str, Option<RawDefinition>>,
        resolved: &HashMap<String, TermTarget>,
    ) -> Option<String> {
        if is_keyword(value) || is_blank_node(value) {
            return Some(value.to_string());
        }

        let local = |name: &str| -> Option<Option<String>> {
            if name == term || !matches!(raw.get(name), Some(Some(_))) {
                return None;
            }
            Some(match resolved.get(name) {
                Some(TermTarget::Iri(iri)) => Some(iri.clone()),
                Some(TermTarget::Generator(_)) => Some(name.to_string()),
                None => None,
            })
        };

        if let Some((prefix, suffix)) = value.split_once(':')
            && !suffix.starts_with("//")
        {
            if let Some(local) = local(prefix) {
                return local.map(|iri| format!("{iri}{suffix}"));
            }
            if let Some(iri) = self.prefix_iri(prefix) {
                return Some(format!("{iri}{suffix}"));
            }
            return Some(value.to_string());
        }

        if let Some(local) = local(value) {
            return local;
        }
        if let Some(iri) = self.terms.get(value).and_then(TermDefinition::iri) {
            return Some(iri.to_string());
        }
        if let Some(vocab) = &self.vocab
            && !is_absolute_iri(value)
        {
            return Some(format!("{vocab}{value}"));
        }
        Some(value.to_string())
    }

    /// Register `term` as mapping to `iri`, keeping any existing coercion,
    /// container and language.
    pub fn mapping(&mut self, term: &str, iri: &str) {
        match self.terms.get_mut(term) {
            Some(def) => def.target = TermTarget::Iri(iri.to_string()),
            None => {
                self.terms.insert(term.to_string(), TermDefinition::new(iri));
            }
        }
        self.modified = true;
    }

    /// Coerce values of the predicate `iri`.
    pub fn coerce(&mut self, iri: &str, coercion: Coercion) {
        self.definitions_for_predicate_mut(iri)
            .into_iter()
            .for_each(|def| def.coercion = Some(coercion.clone()));
        self.modified = true;
    }

    /// Set or clear the list container flag for the predicate `iri`.
    pub fn list(&mut self, iri: &str, is_list: bool) {
        for def in self.definitions_for_predicate_mut(iri) {
            if is_list {
                def.container = Some(Container::List);
            } else if def.container == Some(Container::List) {
                def.container = None;
            }
        }
        self.modified = true;
    }

    pub fn set_language(&mut self, language: Option<&str>) {
        self.language = language.map(str::to_string);
        self.modified = true;
    }

    /// Definitions targeting `iri`; one keyed by the IRI itself is created when
    /// no term maps to it yet.
    fn definitions_for_predicate_mut(&mut self, iri: &str) -> Vec<&mut TermDefinition> {
        if !self.terms.values().any(|def| def.iri() == Some(iri)) {
            self.terms.insert(iri.to_string(), TermDefinition::new(iri));
        }
        self.terms
            .values_mut()
            .filter(|def| def.iri() == Some(iri))
            .collect()
    }

    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermDefinition)> {
        self.terms.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The term → target IRI table, generators and keyword aliases included.
    pub fn mappings(&self) -> IndexMap<String, Value> {
        self.terms
            .iter()
            .map(|(term, def)| {
                let target = match &def.target {
                    TermTarget::Iri(iri) => Value::String(iri.clone()),
                    TermTarget::Generator(iris) => {
                        Value::Array(iris.iter().cloned().map(Value::String).collect())
                    }
                };
                (term.clone(), target)
            })
            .collect()
    }

    /// The definition that governs values of the predicate `iri`: a term keyed
    /// by the IRI itself, else the first term targeting it.
    pub fn definition_for_iri(&self, iri: &str) -> Option<&TermDefinition> {
        self.terms
            .get(iri)
            .filter(|def| def.iri() == Some(iri))
            .or_else(|| self.terms.values().find(|def| def.iri() == Some(iri)))
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// The context value this context was parsed from, if any.
    pub fn provided_context(&self) -> Option<&Value> {
        self.provided.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.language.is_none() && self.vocab.is_none() && !self.explicit_base
    }

    /// The shortest term aliasing `keyword`, or the keyword itself.
    pub fn keyword_alias<'a>(&'a self, keyword: &'a str) -> &'a str {
        self.terms
            .iter()
            .filter(|(_, def)| def.iri() == Some(keyword))
            .map(|(term, _)| term.as_str())
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .unwrap_or(keyword)
    }

    /// IRI of a term usable as a prefix.
    fn prefix_iri(&self, prefix: &str) -> Option<&str> {
        self.terms
            .get(prefix)
            .and_then(TermDefinition::iri)
            .filter(|iri| !is_keyword(iri))
    }

    /// Property generator terms, ordered by preference.
    pub(crate) fn generators(&self) -> Vec<(&str, &TermDefinition, &[String])> {
        let mut generators: Vec<_> = self
            .terms
            .iter()
            .filter_map(|(term, def)| match &def.target {
                TermTarget::Generator(iris) => Some((term.as_str(), def, iris.as_slice())),
                TermTarget::Iri(_) => None,
            })
            .collect();
        generators.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)));
        generators
    }
}

fn unwrap_document(value: &Value) -> &Value {
    match value {
        Value::Object(obj) if obj.len() == 1 => obj.get(CONTEXT).unwrap_or(value),
        _ => value,
    }
}

fn parse_raw_definition(term: &str, value: &Value) -> Result<Option<RawDefinition>> {
    match value {
        Value::Null => Ok(None),
        Value::String(iri) => Ok(Some(RawDefinition {
            target: RawTarget::Single(iri.clone()),
            coercion: None,
            container: None,
            language: Language::Inherit,
        })),
        Value::Object(obj) => {
            let target = match obj.get(ID) {
                None | Some(Value::Null) => RawTarget::Single(term.to_string()),
                Some(Value::String(iri)) => RawTarget::Single(iri.clone()),
                Some(Value::Array(iris)) => RawTarget::Many(
                    iris.iter()
                        .map(|iri| {
                            iri.as_str().map(str::to_string).ok_or_else(|| {
                                JsonLdError::context(format!(
                                    "property generator '{term}' has a non-string IRI: {iri}"
                                ))
                            })
                        })
                        .collect::<Result<_>>()?,
                ),
                Some(other) => {
                    return Err(JsonLdError::context(format!(
                        "invalid @id for term '{term}': {other}"
                    )));
                }
            };

            let coercion = match obj.get(TYPE) {
                None | Some(Value::Null) => None,
                Some(Value::String(t)) => Some(t.clone()),
                Some(other) => {
                    return Err(JsonLdError::context(format!(
                        "invalid @type for term '{term}': {other}"
                    )));
                }
            };

            let mut container = match obj.get(CONTAINER) {
                None | Some(Value::Null) => None,
                Some(Value::String(c)) => Some(match c.as_str() {
                    "@list" => Container::List,
                    "@set" => Container::Set,
                    "@language" => Container::Language,
                    other => {
                        return Err(JsonLdError::processing(format!(
                            "invalid @container '{other}' for term '{term}'"
                        )));
                    }
                }),
                Some(other) => {
                    return Err(JsonLdError::processing(format!(
                        "invalid @container for term '{term}': {other}"
                    )));
                }
            };
            // Older documents flag list containers with `"@list": true`.
            if let Some(Value::Bool(true)) = obj.get("@list") {
                container = Some(Container::List);
            }

            let language = match obj.get(LANGUAGE) {
                None => Language::Inherit,
                Some(Value::Null) => Language::Null,
                Some(Value::String(tag)) => Language::Tag(tag.clone()),
                Some(other) => {
                    return Err(JsonLdError::context(format!(
                        "invalid @language for term '{term}': {other}"
                    )));
                }
            };

            Ok(Some(RawDefinition {
                target,
                coercion,
                container,
                language,
            }))
        }
        other => Err(JsonLdError::context(format!(
            "invalid term definition for '{term}': {other}"
        ))),
    }
}

fn validate_generator(term: &str, iris: &[String], container: Option<Container>) -> Result<()> {
    if iris.is_empty() {
        return Err(JsonLdError::processing(format!(
            "property generator '{term}' lists no IRIs"
        )));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = iris.iter().find(|iri| !seen.insert(iri.as_str())) {
        return Err(JsonLdError::processing(format!(
            "conflicting property generator '{term}': {dup} listed twice"
        )));
    }
    if let Some(iri) = iris.iter().find(|iri| is_keyword(iri)) {
        return Err(JsonLdError::processing(format!(
            "conflicting property generator '{term}': keyword {iri} cannot be generated"
        )));
    }
    if container == Some(Container::List) {
        return Err(JsonLdError::processing(format!(
            "conflicting property generator '{term}': lists cannot be shared between predicates"
        )));
    }
    Ok(())
}
