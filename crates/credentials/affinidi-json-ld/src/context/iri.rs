use url::Url;

use super::{Context, TermDefinition};

/// Flags controlling how a token is expanded to an IRI.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct IriMode {
    /// Resolve relative references against the base IRI.
    pub relative: bool,
    /// Append plain terms to `@vocab`.
    pub vocab: bool,
}

impl IriMode {
    /// Property keys and datatypes: vocabulary-relative, never base-relative.
    pub const KEY: Self = Self {
        relative: false,
        vocab: true,
    };
    /// `@id` values and `@id`-coerced strings.
    pub const REFERENCE: Self = Self {
        relative: true,
        vocab: false,
    };
    /// `@type` values on node objects.
    pub const TYPE: Self = Self {
        relative: true,
        vocab: true,
    };
}

pub fn is_keyword(value: &str) -> bool {
    value.starts_with('@')
}

pub fn is_blank_node(value: &str) -> bool {
    value.starts_with("_:")
}

/// Syntactic check for `scheme:rest`, where the scheme is a letter followed by
/// letters, digits, `+`, `-` or `.`.
pub fn is_absolute_iri(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Join `value` onto `base`, returning `value` unchanged when either does not parse.
pub(crate) fn resolve_relative(base: &str, value: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(value))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| value.to_string())
}

impl Context {
    /// Expand a term, compact IRI or relative IRI to an absolute IRI.
    ///
    /// Keywords and blank node identifiers pass through; unmapped tokens come
    /// back unchanged unless a base IRI resolves them.
    pub fn expand_iri(&self, value: &str) -> String {
        self.expand_iri_with(value, IriMode::REFERENCE)
    }

    pub(crate) fn expand_iri_with(&self, value: &str, mode: IriMode) -> String {
        if is_keyword(value) || is_blank_node(value) {
            return value.to_string();
        }

        if let Some((prefix, suffix)) = value.split_once(':')
            && !suffix.starts_with("//")
            && let Some(iri) = self.prefix_iri(prefix)
        {
            return format!("{iri}{suffix}");
        }

        if is_absolute_iri(value) {
            return value.to_string();
        }

        if let Some(iri) = self.terms.get(value).and_then(TermDefinition::iri) {
            return iri.to_string();
        }

        if mode.vocab
            && let Some(vocab) = &self.vocab
        {
            return format!("{vocab}{value}");
        }

        if mode.relative
            && let Some(base) = &self.base
        {
            return resolve_relative(base, value);
        }

        value.to_string()
    }

    /// Compact an absolute IRI to the shortest term, `prefix:suffix` or
    /// vocabulary-relative form available; the IRI itself otherwise.
    pub fn compact_iri(&self, iri: &str) -> String {
        self.compact_iri_with(iri, true, IriMode::TYPE)
    }

    /// Like [`compact_iri`](Self::compact_iri); `use_terms` toggles exact term
    /// matches, used when a property's values rule out every candidate term.
    pub(crate) fn compact_iri_with(&self, iri: &str, use_terms: bool, mode: IriMode) -> String {
        if is_keyword(iri) || is_blank_node(iri) {
            return iri.to_string();
        }

        if use_terms
            && let Some(term) = self.exact_term(iri)
        {
            return term.to_string();
        }

        let mut best: Option<String> = self.prefixed_forms(iri, None).into_iter().next();

        if mode.vocab
            && let Some(vocab) = &self.vocab
            && let Some(suffix) = iri.strip_prefix(vocab.as_str())
            && !suffix.is_empty()
            && !suffix.contains(':')
            && !self.terms.contains_key(suffix)
            && best.as_ref().is_none_or(|b| suffix.len() < b.len())
        {
            best = Some(suffix.to_string());
        }

        best.unwrap_or_else(|| iri.to_string())
    }

    /// The shortest, then lexicographically least, term mapping exactly to `iri`.
    fn exact_term(&self, iri: &str) -> Option<&str> {
        self.terms
            .iter()
            .filter(|(_, def)| def.iri() == Some(iri))
            .map(|(term, _)| term.as_str())
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
    }

    /// Every `prefix:suffix` rendering of `iri` that expands back to it, best
    /// first. `exclude` names a term that may not act as its own prefix.
    pub(crate) fn prefixed_forms(&self, iri: &str, exclude: Option<&str>) -> Vec<String> {
        let mut forms: Vec<String> = self
            .terms
            .iter()
            .filter(|(term, _)| !term.contains(':') && Some(term.as_str()) != exclude)
            .filter_map(|(term, def)| {
                let prefix = def.iri()?;
                if prefix.is_empty() || is_keyword(prefix) {
                    return None;
                }
                let suffix = iri.strip_prefix(prefix)?;
                if suffix.is_empty() || suffix.starts_with("//") {
                    return None;
                }
                let candidate = format!("{term}:{suffix}");
                // A term spelled like the candidate would shadow the prefix form.
                if self.terms.get(&candidate).is_some_and(|d| d.iri() != Some(iri)) {
                    return None;
                }
                Some(candidate)
            })
            .collect();
        forms.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));
        forms
    }
}
