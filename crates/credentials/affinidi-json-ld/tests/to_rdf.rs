use affinidi_json_ld::{
    BlankNode, JsonLdError, JsonLdOptions, JsonLdOptionsBuilder, Literal, NamedNode, Object, Subject,
    Triple, rdf, to_rdf, to_rdf_graph, xsd,
};
use serde_json::{Value, json};
use tracing_subscriber::filter;

fn ntriples(document: Value) -> Vec<String> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter::EnvFilter::from_default_env())
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let options = JsonLdOptionsBuilder::default().with_validate(true).build();
    to_rdf_graph(&document, None, &options)
        .unwrap()
        .triples()
        .iter()
        .map(Triple::to_string)
        .collect()
}

#[test]
fn plain_literal() {
    assert_eq!(
        ntriples(json!({
            "@id": "http://greggkellogg.net/foaf#me",
            "http://xmlns.com/foaf/0.1/name": "Gregg Kellogg"
        })),
        vec![r#"<http://greggkellogg.net/foaf#me> <http://xmlns.com/foaf/0.1/name> "Gregg Kellogg" ."#]
    );
}

#[test]
fn native_values_are_lexicalized() {
    let triples = ntriples(json!({
        "@id": "http://example.com/s",
        "http://example.com/double": 5.3,
        "http://example.com/integer": 12,
        "http://example.com/boolean": true
    }));
    assert_eq!(
        triples,
        vec![
            format!(r#"<http://example.com/s> <http://example.com/double> "5.3"^^<{}> ."#, xsd::DOUBLE),
            format!(r#"<http://example.com/s> <http://example.com/integer> "12"^^<{}> ."#, xsd::INTEGER),
            format!(r#"<http://example.com/s> <http://example.com/boolean> "true"^^<{}> ."#, xsd::BOOLEAN),
        ]
    );
}

#[test]
fn coerced_and_language_tagged_literals() {
    let triples = ntriples(json!({
        "@context": {
            "xsd": "http://www.w3.org/2001/XMLSchema#",
            "created": {"@id": "http://purl.org/dc/terms/created", "@type": "xsd:date"},
            "name": {"@id": "http://xmlns.com/foaf/0.1/name", "@language": "en"},
            "age": {"@id": "http://xmlns.com/foaf/0.1/age", "@type": "xsd:decimal"}
        },
        "@id": "http://example.com/s",
        "created": "2012-01-04",
        "name": "Gregg",
        "age": 42
    }));
    assert_eq!(
        triples,
        vec![
            format!(r#"<http://example.com/s> <http://purl.org/dc/terms/created> "2012-01-04"^^<{}> ."#, xsd::DATE),
            r#"<http://example.com/s> <http://xmlns.com/foaf/0.1/name> "Gregg"@en ."#.to_string(),
            format!(r#"<http://example.com/s> <http://xmlns.com/foaf/0.1/age> "42"^^<{}> ."#, xsd::DECIMAL),
        ]
    );
}

#[test]
fn types_and_references() {
    let triples = ntriples(json!({
        "@context": {
            "foaf": "http://xmlns.com/foaf/0.1/",
            "knows": {"@id": "foaf:knows", "@type": "@id"}
        },
        "@id": "http://greggkellogg.net/foaf#me",
        "@type": "foaf:Person",
        "knows": "http://manu.sporny.org/#me"
    }));
    assert_eq!(
        triples,
        vec![
            format!("<http://greggkellogg.net/foaf#me> <{}> <http://xmlns.com/foaf/0.1/Person> .", rdf::TYPE),
            "<http://greggkellogg.net/foaf#me> <http://xmlns.com/foaf/0.1/knows> <http://manu.sporny.org/#me> ."
                .to_string(),
        ]
    );
}

#[test]
fn lists_become_chains() {
    let graph = to_rdf_graph(
        &json!({
            "@id": "http://example.com/s",
            "http://xmlns.com/foaf/0.1/knows": {"@list": ["Manu Sporny", "Dave Longley"]}
        }),
        None,
        &JsonLdOptions::default(),
    )
    .unwrap();

    let b0 = BlankNode::new("b0");
    let b1 = BlankNode::new("b1");
    assert_eq!(
        graph.triples(),
        &[
            Triple::new(b0.clone(), NamedNode::new(rdf::FIRST), Literal::new("Manu Sporny")),
            Triple::new(b0.clone(), NamedNode::new(rdf::REST), b1.clone()),
            Triple::new(b1.clone(), NamedNode::new(rdf::FIRST), Literal::new("Dave Longley")),
            Triple::new(b1, NamedNode::new(rdf::REST), NamedNode::new(rdf::NIL)),
            Triple::new(
                NamedNode::new("http://example.com/s"),
                NamedNode::new("http://xmlns.com/foaf/0.1/knows"),
                b0,
            ),
        ]
    );
}

#[test]
fn empty_list_is_nil() {
    let graph = to_rdf_graph(
        &json!({"@id": "http://example.com/s", "http://example.com/list": {"@list": []}}),
        None,
        &JsonLdOptions::default(),
    )
    .unwrap();
    assert_eq!(graph.len(), 1);
    assert_eq!(graph.triples()[0].object, Object::Named(NamedNode::new(rdf::NIL)));
    assert!(matches!(graph.triples()[0].subject, Subject::Named(_)));
}

#[test]
fn nested_nodes_get_blank_subjects() {
    let graph = to_rdf_graph(
        &json!({
            "@id": "http://example.com/s",
            "http://xmlns.com/foaf/0.1/knows": {"http://xmlns.com/foaf/0.1/name": "Manu"}
        }),
        None,
        &JsonLdOptions::default(),
    )
    .unwrap();
    assert_eq!(
        graph.to_ntriples(),
        "_:b0 <http://xmlns.com/foaf/0.1/name> \"Manu\" .\n\
         <http://example.com/s> <http://xmlns.com/foaf/0.1/knows> _:b0 .\n"
    );
}

#[test]
fn document_blank_labels_are_relabelled_consistently() {
    let graph = to_rdf_graph(
        &json!([
            {"@id": "_:x", "http://example.com/p": {"@id": "_:y"}},
            {"@id": "_:y", "http://example.com/p": {"@id": "_:x"}}
        ]),
        None,
        &JsonLdOptions::default(),
    )
    .unwrap();
    let subjects: Vec<&Subject> = graph.triples().iter().map(|t| &t.subject).collect();
    assert_eq!(
        subjects,
        vec![
            &Subject::Blank(BlankNode::new("b0")),
            &Subject::Blank(BlankNode::new("b1"))
        ]
    );
    assert_eq!(graph.triples()[1].object, Object::Blank(BlankNode::new("b0")));
}

#[test]
fn relative_ids_resolve_against_base() {
    let options = JsonLdOptionsBuilder::default()
        .with_base("http://example.org/")
        .build();
    let graph = to_rdf_graph(
        &json!([
            {"@id": "", "http://example.com/p": "empty"},
            {"@id": "a/b", "http://example.com/p": "path"},
            {"@id": "#a", "http://example.com/p": "fragment"}
        ]),
        None,
        &options,
    )
    .unwrap();
    let subjects: Vec<String> = graph.triples().iter().map(|t| t.subject.to_string()).collect();
    assert_eq!(
        subjects,
        vec!["<http://example.org/>", "<http://example.org/a/b>", "<http://example.org/#a>"]
    );
}

#[test]
fn list_of_lists_is_rejected() {
    let err = to_rdf_graph(
        &json!({
            "@context": {"foo": {"@id": "http://example.com/foo", "@container": "@list"}},
            "foo": [{"@list": ["baz"]}]
        }),
        None,
        &JsonLdOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, JsonLdError::ListOfLists(_)));
}

#[test]
fn streaming_into_a_closure() {
    let mut objects = Vec::new();
    let mut sink = |triple: Triple| objects.push(triple.object);
    to_rdf(
        &json!({"@id": "http://example.com/s", "http://example.com/p": ["a", "b"]}),
        None,
        &JsonLdOptions::default(),
        &mut sink,
    )
    .unwrap();
    assert_eq!(
        objects,
        vec![Object::Literal(Literal::new("a")), Object::Literal(Literal::new("b"))]
    );
}

#[test]
fn null_list_value_asserts_nothing() {
    let triples = ntriples(json!({
        "@context": {"l": {"@id": "http://example.com/l", "@container": "@list"}},
        "@id": "http://example.com/s",
        "l": null,
        "http://example.com/p": "x"
    }));
    assert_eq!(triples, vec![r#"<http://example.com/s> <http://example.com/p> "x" ."#]);
}
