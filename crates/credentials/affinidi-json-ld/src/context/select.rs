//! Choosing the term under which a compacted value is rendered.
//!
//! Every term mapping to the predicate is a candidate. Candidates whose
//! container cannot hold the value are discarded; the rest are ranked by how
//! well their coercion and language describe the value, then by preferring
//! uncoerced terms, shorter terms and finally lexicographic order.

use super::{Coercion, Container, Context, TermDefinition};
use crate::shape::Shape;

/// Rank of a candidate term; lower is better.
type Rank<'a> = (u8, u8, u8, usize, &'a str);

impl Context {
    /// Select the term for one value of `iri`. `value` is `None` when the
    /// property has no values at all. `taken` reports list-container terms that
    /// already hold a list on the current node.
    pub(crate) fn select_term(
        &self,
        iri: &str,
        value: Option<&Shape<'_>>,
        taken: &dyn Fn(&str) -> bool,
    ) -> Option<(&str, &TermDefinition)> {
        let default_language = self.language();
        self.terms
            .iter()
            .filter(|(_, def)| def.iri() == Some(iri))
            .filter_map(|(term, def)| {
                let rank = match value {
                    Some(shape) => {
                        if def.container == Some(Container::List) && taken(term) {
                            return None;
                        }
                        rank_value(term, def, shape, default_language)?
                    }
                    None => rank_empty(term, def)?,
                };
                Some((rank, term.as_str(), def))
            })
            .min_by(|a, b| a.0.cmp(&b.0))
            .map(|(_, term, def)| (term, def))
    }
}

fn rank_empty<'a>(term: &'a str, def: &TermDefinition) -> Option<Rank<'a>> {
    let container = match def.container {
        Some(Container::Set) => 0,
        None => 1,
        Some(Container::List | Container::Language) => return None,
    };
    Some((container, 0, u8::from(def.coercion.is_some()), term.len(), term))
}

fn rank_value<'a>(
    term: &'a str,
    def: &TermDefinition,
    shape: &Shape<'_>,
    default_language: Option<&str>,
) -> Option<Rank<'a>> {
    let container_exact = match (def.container, shape) {
        (Some(Container::List), Shape::List(_)) => true,
        (Some(Container::List), _) => return None,
        (Some(Container::Language), Shape::Literal(lit)) if lit.is_plain_string() && lit.language.is_some() => true,
        (Some(Container::Language), _) => return None,
        (_, Shape::List(_)) => false,
        _ => true,
    };

    // Coercion and language are judged on list members, not the list itself.
    let members: Vec<Shape<'_>> = match shape {
        Shape::List(values) => values.iter().filter_map(|v| Shape::classify(v).ok()).collect(),
        _ => Vec::new(),
    };
    let items: Vec<&Shape<'_>> = match shape {
        Shape::List(_) => members.iter().collect(),
        other => vec![other],
    };

    let coercion_rank = match &def.coercion {
        Some(coercion) if container_exact && items.iter().all(|item| coercion_matches(coercion, item)) => 0,
        None if container_exact => 1,
        _ => 2,
    };

    let language_rank = if def.container == Some(Container::Language) {
        0
    } else {
        let language = def.effective_language(default_language);
        let mismatch = items.iter().any(|item| match item {
            Shape::Literal(lit) if lit.is_plain_string() => lit.language != language,
            _ => false,
        });
        u8::from(mismatch)
    };

    Some((
        coercion_rank,
        language_rank,
        u8::from(def.coercion.is_some()),
        term.len(),
        term,
    ))
}

fn coercion_matches(coercion: &Coercion, item: &Shape<'_>) -> bool {
    match (coercion, item) {
        (Coercion::Id, Shape::NodeRef(_)) => true,
        (Coercion::Datatype(dt), Shape::Literal(lit)) => lit.datatype == Some(dt.as_str()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::JsonLdOptions;
    use serde_json::{Value, json};

    fn select<'a>(ctx: &'a Context, iri: &str, value: &Value) -> Option<&'a str> {
        let shape = Shape::classify(value).unwrap();
        ctx.select_term(iri, Some(&shape), &|_| false).map(|(t, _)| t)
    }

    #[test]
    fn prefers_matching_coercion() {
        let ctx = Context::parse(
            &json!({
                "ref": {"@id": "http://example.com/p", "@type": "@id"},
                "plain": "http://example.com/p"
            }),
            &JsonLdOptions::default(),
        )
        .unwrap();
        assert_eq!(select(&ctx, "http://example.com/p", &json!({"@id": "http://example.com/a"})), Some("ref"));
        assert_eq!(select(&ctx, "http://example.com/p", &json!({"@value": "a"})), Some("plain"));
    }

    #[test]
    fn prefers_matching_language() {
        let ctx = Context::parse(
            &json!({
                "@language": "de",
                "term5": {"@id": "http://example.com/p", "@language": null},
                "term": "http://example.com/p"
            }),
            &JsonLdOptions::default(),
        )
        .unwrap();
        assert_eq!(select(&ctx, "http://example.com/p", &json!({"@value": "x"})), Some("term5"));
        assert_eq!(
            select(&ctx, "http://example.com/p", &json!({"@value": "x", "@language": "de"})),
            Some("term")
        );
    }

    #[test]
    fn list_container_needs_a_free_list_slot() {
        let ctx = Context::parse(
            &json!({"l": {"@id": "http://example.com/p", "@container": "@list"}}),
            &JsonLdOptions::default(),
        )
        .unwrap();
        let list = json!({"@list": []});
        let shape = Shape::classify(&list).unwrap();
        assert_eq!(
            ctx.select_term("http://example.com/p", Some(&shape), &|_| false).map(|(t, _)| t),
            Some("l")
        );
        assert!(ctx.select_term("http://example.com/p", Some(&shape), &|t| t == "l").is_none());
        assert_eq!(select(&ctx, "http://example.com/p", &json!({"@value": "a"})), None);
    }

    #[test]
    fn empty_values_prefer_set_containers() {
        let ctx = Context::parse(
            &json!({
                "a": "http://example.com/p",
                "set": {"@id": "http://example.com/p", "@container": "@set"}
            }),
            &JsonLdOptions::default(),
        )
        .unwrap();
        assert_eq!(ctx.select_term("http://example.com/p", None, &|_| false).map(|(t, _)| t), Some("set"));
    }

    #[test]
    fn ties_break_on_length_then_order() {
        let ctx = Context::parse(
            &json!({"bb": "http://example.com/p", "ab": "http://example.com/p", "abc": "http://example.com/p"}),
            &JsonLdOptions::default(),
        )
        .unwrap();
        assert_eq!(select(&ctx, "http://example.com/p", &json!({"@value": 1})), Some("ab"));
    }
}
