#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use deskquery::{QueryParser, Result, Row, StatementStore, Term, TermBody};

/// Wednesday, June 5th 2013, 10:20:30.
pub fn reference_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2013, 6, 5)
        .and_then(|d| d.and_hms_opt(10, 20, 30))
        .expect("valid reference time")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A store knowing two tags and two contacts.
pub struct CannedStore;

impl StatementStore for CannedStore {
    fn execute_query(&self, query: &str) -> Result<Vec<Row>> {
        let row = |pairs: &[(&str, &str)]| -> Row {
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
        };
        if query.contains("?tag") {
            Ok(vec![
                row(&[("tag", "urn:tag:work"), ("label", "work")]),
                row(&[("tag", "urn:tag:akademy"), ("label", "akademy")]),
            ])
        } else if query.contains("?fullname") {
            Ok(vec![
                row(&[
                    ("c", "urn:contact:alice"),
                    ("fullname", "Alice"),
                    ("email", "alice@example.org"),
                ]),
                row(&[("c", "urn:contact:bob"), ("fullname", "Bob")]),
            ])
        } else {
            Ok(Vec::new())
        }
    }

    fn boolean_query(&self, _query: &str) -> Result<bool> {
        Ok(true)
    }
}

pub fn setup() -> QueryParser {
    init_tracing();
    let mut parser = QueryParser::new().with_store(Box::new(CannedStore));
    parser.set_reference_time(reference_time());
    parser
}

pub fn as_and(term: &Term) -> &[Term] {
    match term.body() {
        TermBody::And(terms) => terms,
        other => panic!("expected an and term, got {:?}", other),
    }
}

pub fn as_or(term: &Term) -> &[Term] {
    match term.body() {
        TermBody::Or(terms) => terms,
        other => panic!("expected an or term, got {:?}", other),
    }
}
