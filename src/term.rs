//! The query term algebra.
//!
//! A [`Term`] is an immutable value: a [`TermBody`] (the closed set of term
//! kinds) plus the [`Span`] of user input it was parsed from. Spans are
//! bookkeeping for highlighting and completion and never take part in
//! equality or hashing.
//!
//! Terms compose with `&` (and), `|` (or) and `!` (negation). The operators
//! flatten nested terms of the same kind and treat invalid terms as
//! identities, so `Term::invalid() & t == t`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops;
use std::str::FromStr;

use crate::datatype::LiteralValue;
use crate::vocabulary::Uri;

// ------------- Span -------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }
    pub fn end(&self) -> usize {
        self.start + self.length
    }
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
    /// Smallest span covering both, empty spans are ignored.
    pub fn union(self, other: Span) -> Span {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let start = self.start.min(other.start);
        Span::new(start, self.end().max(other.end()) - start)
    }
}

// ------------- Comparator -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    #[default]
    Contains,
    Regexp,
    Equal,
    Greater,
    Smaller,
    GreaterOrEqual,
    SmallerOrEqual,
}

impl Comparator {
    pub const ALL: [Comparator; 7] = [
        Comparator::Contains,
        Comparator::Regexp,
        Comparator::Equal,
        Comparator::Greater,
        Comparator::Smaller,
        Comparator::GreaterOrEqual,
        Comparator::SmallerOrEqual,
    ];
}

pub fn comparator_to_string(comparator: Comparator) -> &'static str {
    match comparator {
        Comparator::Contains => ":",
        Comparator::Regexp => "regex",
        Comparator::Equal => "=",
        Comparator::Greater => ">",
        Comparator::Smaller => "<",
        Comparator::GreaterOrEqual => ">=",
        Comparator::SmallerOrEqual => "<=",
    }
}

/// Unknown symbols fall back to [`Comparator::Contains`].
pub fn string_to_comparator(symbol: &str) -> Comparator {
    match symbol.trim() {
        "=" => Comparator::Equal,
        "regex" => Comparator::Regexp,
        ">" => Comparator::Greater,
        "<" => Comparator::Smaller,
        ">=" => Comparator::GreaterOrEqual,
        "<=" => Comparator::SmallerOrEqual,
        _ => Comparator::Contains,
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", comparator_to_string(*self))
    }
}

// ------------- Aggregates & Sorting -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AggregateFunction {
    #[default]
    NoAggregate,
    Count,
    DistinctCount,
    Max,
    Min,
    Sum,
    DistinctSum,
    Average,
    DistinctAverage,
}

impl AggregateFunction {
    pub fn name(self) -> Option<&'static str> {
        match self {
            AggregateFunction::NoAggregate => None,
            AggregateFunction::Count => Some("count"),
            AggregateFunction::DistinctCount => Some("distinctcount"),
            AggregateFunction::Max => Some("max"),
            AggregateFunction::Min => Some("min"),
            AggregateFunction::Sum => Some("sum"),
            AggregateFunction::DistinctSum => Some("distinctsum"),
            AggregateFunction::Average => Some("avg"),
            AggregateFunction::DistinctAverage => Some("distinctavg"),
        }
    }
}

impl FromStr for AggregateFunction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let aggregate = match s.to_lowercase().as_str() {
            "" | "none" => AggregateFunction::NoAggregate,
            "count" => AggregateFunction::Count,
            "distinctcount" => AggregateFunction::DistinctCount,
            "max" => AggregateFunction::Max,
            "min" => AggregateFunction::Min,
            "sum" => AggregateFunction::Sum,
            "distinctsum" => AggregateFunction::DistinctSum,
            "avg" => AggregateFunction::Average,
            "distinctavg" => AggregateFunction::DistinctAverage,
            other => return Err(format!("unknown aggregate function '{}'", other)),
        };
        Ok(aggregate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn name(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
    /// Anything but `desc` reads as ascending.
    pub fn from_name(name: &str) -> SortOrder {
        if name.eq_ignore_ascii_case("desc") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }
}

// ------------- Comparison -------------
/// A property constraint: `property comparator sub_term`, optionally binding
/// the property value to a named (and possibly aggregated or sorted) variable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Comparison {
    pub property: Option<Uri>,
    pub sub_term: Term,
    pub comparator: Comparator,
    pub inverted: bool,
    pub variable_name: Option<String>,
    pub aggregate: AggregateFunction,
    pub sort_weight: i32,
    pub sort_order: SortOrder,
}

impl Comparison {
    pub fn new(property: Option<Uri>, sub_term: Term, comparator: Comparator) -> Self {
        Self {
            property,
            sub_term,
            comparator,
            ..Default::default()
        }
    }
    pub fn with_variable_name(mut self, name: impl Into<String>) -> Self {
        self.variable_name = Some(name.into());
        self
    }
    pub fn with_aggregate(mut self, aggregate: AggregateFunction) -> Self {
        self.aggregate = aggregate;
        self
    }
    pub fn with_sort(mut self, weight: i32, order: SortOrder) -> Self {
        self.sort_weight = weight;
        self.sort_order = order;
        self
    }
    pub fn inverted(mut self, inverted: bool) -> Self {
        self.inverted = inverted;
        self
    }
}

// ------------- Term -------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Invalid,
    Literal,
    Resource,
    ResourceType,
    Comparison,
    Negation,
    Optional,
    And,
    Or,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum TermBody {
    #[default]
    Invalid,
    Literal(LiteralValue),
    Resource(Uri),
    /// The first type is the primary one, the rest were merged in.
    ResourceType(Vec<Uri>),
    Comparison(Box<Comparison>),
    Negation(Box<Term>),
    Optional(Box<Term>),
    And(Vec<Term>),
    Or(Vec<Term>),
}

#[derive(Debug, Clone, Default)]
pub struct Term {
    body: TermBody,
    span: Span,
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.body == other.body
    }
}
impl Eq for Term {}

impl Hash for Term {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.body.hash(state);
    }
}

impl From<TermBody> for Term {
    fn from(body: TermBody) -> Self {
        Term {
            body,
            span: Span::default(),
        }
    }
}

impl Term {
    pub fn invalid() -> Term {
        Term::default()
    }
    pub fn literal(value: impl Into<LiteralValue>) -> Term {
        TermBody::Literal(value.into()).into()
    }
    pub fn resource(uri: Uri) -> Term {
        TermBody::Resource(uri).into()
    }
    pub fn resource_type(uri: Uri) -> Term {
        TermBody::ResourceType(vec![uri]).into()
    }
    /// A type restriction accepting any of `types`, invalid if there are none.
    pub fn resource_types(types: Vec<Uri>) -> Term {
        if types.is_empty() {
            Term::invalid()
        } else {
            TermBody::ResourceType(types).into()
        }
    }
    pub fn comparison(comparison: Comparison) -> Term {
        TermBody::Comparison(Box::new(comparison)).into()
    }
    pub fn compare(property: Option<Uri>, sub_term: Term, comparator: Comparator) -> Term {
        Term::comparison(Comparison::new(property, sub_term, comparator))
    }
    pub fn negation(term: Term) -> Term {
        TermBody::Negation(Box::new(term)).into()
    }
    /// Negation that keeps invalid terms invalid.
    pub fn negate(term: Term) -> Term {
        if term.is_valid() {
            let span = term.span;
            Term::negation(term).with_span(span)
        } else {
            Term::invalid()
        }
    }
    pub fn optional(term: Term) -> Term {
        TermBody::Optional(Box::new(term)).into()
    }
    pub fn and(terms: Vec<Term>) -> Term {
        TermBody::And(terms).into()
    }
    pub fn or(terms: Vec<Term>) -> Term {
        TermBody::Or(terms).into()
    }

    pub fn kind(&self) -> TermKind {
        match &self.body {
            TermBody::Invalid => TermKind::Invalid,
            TermBody::Literal(_) => TermKind::Literal,
            TermBody::Resource(_) => TermKind::Resource,
            TermBody::ResourceType(_) => TermKind::ResourceType,
            TermBody::Comparison(_) => TermKind::Comparison,
            TermBody::Negation(_) => TermKind::Negation,
            TermBody::Optional(_) => TermKind::Optional,
            TermBody::And(_) => TermKind::And,
            TermBody::Or(_) => TermKind::Or,
        }
    }
    pub fn body(&self) -> &TermBody {
        &self.body
    }
    pub fn into_body(self) -> TermBody {
        self.body
    }
    pub fn is_valid(&self) -> bool {
        !matches!(self.body, TermBody::Invalid)
    }

    pub fn as_literal(&self) -> Option<&LiteralValue> {
        match &self.body {
            TermBody::Literal(value) => Some(value),
            _ => None,
        }
    }
    /// The text of a string literal.
    pub fn literal_str(&self) -> Option<&str> {
        self.as_literal().and_then(LiteralValue::as_str)
    }
    pub fn as_resource(&self) -> Option<&Uri> {
        match &self.body {
            TermBody::Resource(uri) => Some(uri),
            _ => None,
        }
    }
    pub fn as_resource_types(&self) -> Option<&[Uri]> {
        match &self.body {
            TermBody::ResourceType(types) => Some(types),
            _ => None,
        }
    }
    pub fn as_comparison(&self) -> Option<&Comparison> {
        match &self.body {
            TermBody::Comparison(comparison) => Some(comparison),
            _ => None,
        }
    }
    /// The single child of a negation, an optional or a comparison.
    pub fn sub_term(&self) -> Option<&Term> {
        match &self.body {
            TermBody::Negation(t) | TermBody::Optional(t) => Some(t),
            TermBody::Comparison(c) => Some(&c.sub_term),
            _ => None,
        }
    }
    /// The children of an and or an or, empty for every other kind.
    pub fn sub_terms(&self) -> &[Term] {
        match &self.body {
            TermBody::And(terms) | TermBody::Or(terms) => terms,
            _ => &[],
        }
    }

    // ------------- Position -------------
    pub fn span(&self) -> Span {
        self.span
    }
    pub fn position(&self) -> usize {
        self.span.start
    }
    pub fn length(&self) -> usize {
        self.span.length
    }
    pub fn set_position(&mut self, start: usize, length: usize) {
        self.span = Span::new(start, length);
    }
    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }
    pub fn with_span(mut self, span: Span) -> Term {
        self.span = span;
        self
    }

    // ------------- Optimization -------------
    /// Normalizes the tree: flattens nested and/or terms of the same kind,
    /// drops invalid children and duplicates, collapses single-child
    /// groups, removes double negations and nested optionals.
    pub fn optimize(&self) -> Term {
        let span = self.span;
        match &self.body {
            TermBody::And(terms) => optimize_group(terms, true, span),
            TermBody::Or(terms) => optimize_group(terms, false, span),
            TermBody::Negation(inner) => {
                let inner = inner.optimize();
                match inner.body {
                    TermBody::Invalid => Term::invalid(),
                    TermBody::Negation(twice) => *twice,
                    _ => Term::negation(inner).with_span(span),
                }
            }
            TermBody::Optional(inner) => {
                let inner = inner.optimize();
                match inner.body {
                    TermBody::Invalid => Term::invalid(),
                    TermBody::Optional(_) => inner,
                    _ => Term::optional(inner).with_span(span),
                }
            }
            TermBody::Comparison(comparison) => {
                let mut comparison = comparison.as_ref().clone();
                comparison.sub_term = comparison.sub_term.optimize();
                Term::comparison(comparison).with_span(span)
            }
            _ => self.clone(),
        }
    }
}

fn optimize_group(terms: &[Term], and: bool, span: Span) -> Term {
    let mut flat: Vec<Term> = Vec::with_capacity(terms.len());
    for term in terms {
        let term = term.optimize();
        match term.body {
            TermBody::Invalid => (),
            TermBody::And(inner) if and => flat.extend(inner),
            TermBody::Or(inner) if !and => flat.extend(inner),
            body => flat.push(Term { body, span: term.span }),
        }
    }
    let mut unique: Vec<Term> = Vec::with_capacity(flat.len());
    for term in flat {
        if !unique.contains(&term) {
            unique.push(term);
        }
    }
    match unique.len() {
        0 => Term::invalid(),
        1 => unique.pop().unwrap_or_default(),
        _ if and => Term::and(unique).with_span(span),
        _ => Term::or(unique).with_span(span),
    }
}

// ------------- Operators -------------
fn combine(lhs: Term, rhs: Term, and: bool) -> Term {
    if !lhs.is_valid() {
        return rhs;
    }
    if !rhs.is_valid() {
        return lhs;
    }
    let span = lhs.span.union(rhs.span);
    let mut terms = Vec::new();
    for side in [lhs, rhs] {
        match side.body {
            TermBody::And(inner) if and => terms.extend(inner),
            TermBody::Or(inner) if !and => terms.extend(inner),
            body => terms.push(Term { body, span: side.span }),
        }
    }
    if and {
        Term::and(terms).with_span(span)
    } else {
        Term::or(terms).with_span(span)
    }
}

impl ops::BitAnd for Term {
    type Output = Term;
    fn bitand(self, rhs: Term) -> Term {
        combine(self, rhs, true)
    }
}

impl ops::BitOr for Term {
    type Output = Term;
    fn bitor(self, rhs: Term) -> Term {
        combine(self, rhs, false)
    }
}

impl ops::Not for Term {
    type Output = Term;
    fn not(self) -> Term {
        Term::negate(self)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::serializer::serialize_term(self))
    }
}

impl Term {
    /// Reads a term from its serialized form, invalid when unreadable.
    pub fn from_string(text: &str) -> Term {
        crate::serializer::parse_term(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Term {
        Term::literal(s)
    }

    #[test]
    fn operators_flatten_and_absorb_invalid() {
        let t = word("a") & word("b") & word("c");
        assert_eq!(t.kind(), TermKind::And);
        assert_eq!(t.sub_terms().len(), 3);
        assert_eq!(Term::invalid() & word("a"), word("a"));
        assert_eq!(word("a") | Term::invalid(), word("a"));
        assert!(!(!Term::invalid()).is_valid());
        // an or inside an and stays a group of its own
        let mixed = (word("a") | word("b")) & word("c");
        assert_eq!(mixed.sub_terms().len(), 2);
        assert_eq!(mixed.sub_terms()[0].kind(), TermKind::Or);
    }

    #[test]
    fn spans_do_not_affect_equality() {
        let a = word("x").with_span(Span::new(0, 1));
        let b = word("x").with_span(Span::new(5, 1));
        assert_eq!(a, b);
        assert_eq!(Span::new(0, 3).union(Span::new(5, 2)), Span::new(0, 7));
        assert_eq!(Span::default().union(Span::new(5, 2)), Span::new(5, 2));
    }

    #[test]
    fn optimize_collapses_groups() {
        let t = Term::and(vec![Term::invalid(), word("a"), Term::and(vec![word("a")])]);
        assert_eq!(t.optimize(), word("a"));
        assert!(!Term::or(vec![Term::invalid()]).optimize().is_valid());
        let nested = Term::optional(Term::optional(word("a")));
        assert_eq!(nested.optimize(), Term::optional(word("a")));
    }

    #[test]
    fn comparator_symbols() {
        for c in Comparator::ALL {
            assert_eq!(string_to_comparator(comparator_to_string(c)), c);
        }
        assert_eq!(string_to_comparator("~"), Comparator::Contains);
    }

    #[test]
    fn aggregate_names() {
        assert_eq!("avg".parse::<AggregateFunction>(), Ok(AggregateFunction::Average));
        assert_eq!(AggregateFunction::DistinctSum.name(), Some("distinctsum"));
        assert!("median".parse::<AggregateFunction>().is_err());
    }
}
