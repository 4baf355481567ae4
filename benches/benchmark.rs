use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use deskquery::{ParserFlags, Query, QueryParser, SparqlFlags, StaticOntology};

const QUERIES: [(&str, &str); 4] = [
    ("words", "Hello World"),
    ("sizes", "size < 2KB size greater than 2KB"),
    ("dates", "mails received last week before June 5, 2013"),
    ("subquery", "related to mails title Title, size > 2K"),
];

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut parser = QueryParser::new();
    for (name, text) in QUERIES {
        c.bench_function(&format!("parse {}", name), |b| {
            b.iter(|| parser.parse(black_box(text), ParserFlags::empty(), None))
        });
    }
    c.bench_function("parse with completion", |b| {
        b.iter(|| parser.parse(black_box("mails sent by"), ParserFlags::empty(), Some(13)))
    });

    let ontology = StaticOntology::desktop();
    let queries: Vec<Query> = QUERIES.iter().map(|(_, text)| parser.parse(text, ParserFlags::empty(), None)).collect();
    c.bench_function("compile", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(query.to_sparql_query(SparqlFlags::empty(), &ontology));
            }
        })
    });
    c.bench_function("serialize and read back", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(Query::from_string(&query.to_string()));
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
