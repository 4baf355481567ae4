//! The rewriting passes of the natural language parser.
//!
//! Every pass implements [`Pass`](crate::matcher::Pass) and is driven by the
//! parser through one or more patterns. Passes look at the captured terms,
//! decline (empty result) anything they do not understand, and otherwise
//! produce the typed terms that later passes build upon.

mod comparators;
mod dateperiods;
mod datevalues;
mod decimals;
mod filenames;
mod filesize;
mod numbers;
mod periodnames;
mod properties;
mod subqueries;
mod typehints;
mod units;

pub use comparators::Comparators;
pub use dateperiods::{DatePeriods, PeriodValue};
pub use datevalues::DateValues;
pub use decimals::DecimalValues;
pub use filenames::FileNames;
pub use filesize::FileSize;
pub use numbers::Numbers;
pub use periodnames::PeriodNames;
pub use properties::{LookupCaches, Properties, ValueDomain};
pub use subqueries::Subqueries;
pub use typehints::TypeHints;
pub use units::SplitUnits;

use crate::term::{Comparator, Term};
use crate::vocabulary::{DATE_SCHEME, Uri};

pub(crate) fn integer_value(term: &Term) -> Option<i64> {
    term.as_literal().and_then(|value| value.as_integer())
}

/// `date://<period>/value` or `date://<period>/offset` compared for equality.
pub(crate) fn date_field(period: &str, offset: bool, value: i64) -> Term {
    let kind = if offset { "offset" } else { "value" };
    Term::compare(
        Some(Uri::new(format!("{}://{}/{}", DATE_SCHEME, period, kind))),
        Term::literal(value),
        Comparator::Equal,
    )
}

/// The value of a `date://<period>/...` comparison, if `term` is one.
pub(crate) fn date_field_value(term: &Term, period: &str) -> Option<i64> {
    let comparison = term.as_comparison()?;
    let property = comparison.property.as_ref()?;
    if property.scheme() == Some(DATE_SCHEME) && property.host() == Some(period) {
        integer_value(&comparison.sub_term)
    } else {
        None
    }
}
