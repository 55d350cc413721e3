use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;

use affinidi_json_ld::{JsonLdOptions, JsonLdOptionsBuilder, compact, expand, to_rdf_graph};

fn person_context() -> serde_json::Value {
    json!({
        "xsd": "http://www.w3.org/2001/XMLSchema#",
        "foaf": "http://xmlns.com/foaf/0.1/",
        "name": "foaf:name",
        "homepage": {"@id": "foaf:homepage", "@type": "@id"},
        "knows": {"@id": "foaf:knows", "@type": "@id"},
        "friends": {"@id": "foaf:member", "@container": "@list"},
        "birthday": {"@id": "foaf:birthday", "@type": "xsd:date"},
        "label": {"@id": "http://www.w3.org/2000/01/rdf-schema#label", "@container": "@language"}
    })
}

fn person() -> serde_json::Value {
    json!({
        "@context": person_context(),
        "@id": "http://greggkellogg.net/foaf#me",
        "@type": "foaf:Person",
        "name": "Gregg Kellogg",
        "homepage": "http://greggkellogg.net/",
        "birthday": "1957-02-27",
        "knows": [
            "http://manu.sporny.org/#me",
            "http://www.markus-lanthaler.com/#me",
            "http://digitalbazaar.com/dave#me"
        ],
        "friends": ["Manu Sporny", "Markus Lanthaler", "Dave Longley"],
        "label": {"en": "Gregg", "de": "Gregg"}
    })
}

fn bench_expand(c: &mut Criterion) {
    let doc = person();
    let options = JsonLdOptions::default();
    c.bench_function("expand_person", |b| {
        b.iter(|| expand(&doc, None, &options).unwrap())
    });
}

fn bench_compact(c: &mut Criterion) {
    let options = JsonLdOptions::default();
    let expanded = expand(&person(), None, &options).unwrap();
    let context = person_context();
    c.bench_function("compact_person", |b| {
        b.iter(|| compact(&expanded, &context, &options).unwrap())
    });
}

fn bench_to_rdf(c: &mut Criterion) {
    let doc = person();
    let options = JsonLdOptions::default();
    c.bench_function("to_rdf_person", |b| {
        b.iter(|| to_rdf_graph(&doc, None, &options).unwrap())
    });
}

fn bench_to_rdf_canonical(c: &mut Criterion) {
    let doc = person();
    let options = JsonLdOptionsBuilder::default().with_canonicalize(true).build();
    c.bench_function("to_rdf_person_canonical", |b| {
        b.iter(|| to_rdf_graph(&doc, None, &options).unwrap())
    });
}

criterion_group!(
    benches,
    bench_expand,
    bench_compact,
    bench_to_rdf,
    bench_to_rdf_canonical,
);
criterion_main!(benches);
