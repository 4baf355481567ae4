mod common;

use chrono::NaiveDate;
use common::setup;
use deskquery::fusion::interval;
use deskquery::term::Span;
use deskquery::vocabulary::{nie, nmo};
use deskquery::{Moment, ParserFlags, Period, Query, Term};

fn parse(text: &str) -> Query {
    setup().parse(text, ParserFlags::empty(), None)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn modified_on(date: NaiveDate) -> Term {
    interval(Some(nie::LAST_MODIFIED), Moment::on_day(date), Span::default())
}

#[test]
fn relative_days() {
    assert_eq!(parse("yesterday").term(), &modified_on(day(2013, 6, 4)));
    assert_eq!(parse("today").term(), &modified_on(day(2013, 6, 5)));
    assert_eq!(parse("tomorrow").term(), &modified_on(day(2013, 6, 6)));
}

#[test]
fn date_property_follows_the_resource_type() {
    let expected = Term::and(vec![
        Term::resource_type(nmo::MESSAGE),
        interval(Some(nmo::RECEIVED_DATE), Moment::on_day(day(2013, 6, 4)), Span::default()),
    ]);
    assert_eq!(parse("mails yesterday").term().optimize(), expected.optimize());
}

#[test]
fn numeric_dates() {
    assert_eq!(parse("2013-06-05").term(), &modified_on(day(2013, 6, 5)));
}

#[test]
fn named_dates_with_a_property() {
    assert_eq!(parse("modified June 5, 2013").term(), &modified_on(day(2013, 6, 5)));
}

#[test]
fn interval_bounds_carry_the_granularity() {
    let query = parse("yesterday");
    let bounds = common::as_and(query.term());
    let first = bounds[0].as_comparison().and_then(|c| c.sub_term.as_literal()).and_then(|v| v.as_moment());
    assert_eq!(first.map(|m| m.granularity), Some(Period::Day));
    assert_eq!(first.map(|m| m.instant.date()), Some(day(2013, 6, 4)));
}

#[test]
fn spans_cover_the_date_words() {
    let query = parse("mails from last week");
    assert!(query.is_valid());
    let query = parse("yesterday");
    assert_eq!((query.term().position(), query.term().length()), (0, 9));
}
