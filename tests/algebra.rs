mod common;

use deskquery::term::{comparator_to_string, string_to_comparator};
use deskquery::vocabulary::{nie, nmo};
use deskquery::{
    AggregateFunction, Comparator, Comparison, FileMode, Folder, Query, QueryFlags, RequestProperty, SortOrder,
    Term,
};

fn samples() -> Vec<Term> {
    let a = Term::literal("a");
    let b = Term::resource_type(nmo::MESSAGE);
    let c = Term::compare(Some(nie::CONTENT_SIZE), Term::literal(10), Comparator::Greater);
    vec![
        Term::and(vec![Term::and(vec![a.clone(), b.clone()]), c.clone()]),
        Term::or(vec![a.clone(), Term::or(vec![b.clone(), a.clone()]), Term::invalid()]),
        Term::negation(Term::negation(Term::and(vec![c.clone()]))),
        Term::optional(Term::optional(b.clone())),
        Term::compare(Some(nie::RELATED_TO), Term::and(vec![Term::and(vec![a.clone(), b.clone()])]), Comparator::Equal),
        Term::and(vec![Term::invalid(), Term::invalid()]),
    ]
}

#[test]
fn optimize_is_idempotent() {
    for term in samples() {
        let once = term.optimize();
        assert_eq!(once.optimize(), once, "{:?}", term);
    }
}

#[test]
fn nested_groups_flatten() {
    let (a, b, c) = (Term::literal("a"), Term::literal("b"), Term::literal("c"));
    assert_eq!(
        Term::and(vec![Term::and(vec![a.clone(), b.clone()]), c.clone()]).optimize(),
        Term::and(vec![a.clone(), b.clone(), c.clone()]).optimize()
    );
    assert_eq!(
        Term::or(vec![a.clone(), a.clone(), Term::invalid()]).optimize(),
        a.clone()
    );
    assert!(!Term::and(vec![Term::invalid()]).optimize().is_valid());
}

#[test]
fn double_negation_cancels() {
    for term in samples() {
        assert_eq!(Term::negation(Term::negation(term.clone())).optimize(), term.optimize());
    }
}

#[test]
fn group_equality_depends_on_order() {
    let (a, b) = (Term::literal("a"), Term::literal("b"));
    assert_ne!(Term::and(vec![a.clone(), b.clone()]), Term::and(vec![b, a]));
}

#[test]
fn operators_flatten_and_absorb_invalid() {
    let (a, b, c) = (Term::literal("a"), Term::literal("b"), Term::literal("c"));
    assert_eq!(a.clone() & b.clone() & c.clone(), Term::and(vec![a.clone(), b.clone(), c.clone()]));
    assert_eq!(a.clone() | Term::invalid(), a.clone());
    assert_eq!((!!a.clone()).optimize(), a);
    assert!(!(!Term::invalid()).is_valid());
}

#[test]
fn comparator_symbols_round_trip() {
    for comparator in Comparator::ALL {
        assert_eq!(string_to_comparator(comparator_to_string(comparator)), comparator);
    }
    assert_eq!(string_to_comparator("~"), Comparator::Contains);
}

fn rich_query() -> Query {
    let term = Term::and(vec![
        Term::literal("nepomuk"),
        Term::negation(Term::resource_type(nmo::MESSAGE)),
        Term::comparison(
            Comparison::new(Some(nmo::SENT_DATE), Term::invalid(), Comparator::Equal)
                .with_variable_name("sent")
                .with_aggregate(AggregateFunction::Max)
                .with_sort(1, SortOrder::Descending),
        ),
        Term::optional(Term::compare(Some(nie::TITLE), Term::literal("a < b & c"), Comparator::Regexp)),
    ]);
    let mut query = Query::file_query(term, FileMode::Files);
    query.set_limit(20);
    query.set_offset(5);
    query.set_flags(QueryFlags::WITH_FULL_TEXT_EXCERPT);
    query.set_full_text_scoring_enabled(true);
    query.add_request_property(RequestProperty::new(nie::URL, false));
    query.add_include_folder(Folder::new("file:///home/user/docs", true));
    query.add_exclude_folder("file:///home/user/docs/old");
    query
}

#[test]
fn serialized_queries_read_back() {
    common::init_tracing();
    let query = rich_query();
    let text = query.to_string();
    let read = Query::from_string(&text);
    assert_eq!(read, query);
    assert_eq!(read.to_string(), text);
}

#[test]
fn serialized_terms_read_back() {
    for term in samples() {
        let text = term.to_string();
        assert_eq!(Term::from_string(&text).to_string(), text);
    }
}

#[test]
fn unreadable_documents_are_invalid() {
    assert!(!Query::from_string("<query><and>").is_valid());
    assert!(!Query::from_string("not xml at all").is_valid());
    assert!(!Term::from_string("").is_valid());
}
