//! Lowers a [`Query`] into a SPARQL query string.
//!
//! The root term is matched against the result variable `?r`. Every other
//! value gets a fresh `?vN` variable, except that comparisons on the same
//! single-valued property within one group share their variable, so that
//! `size > 1 and size < 5` produces a single triple with two filters.
//! Named variables are shared for any property.
//! Failure to express a term yields an empty string.

use std::collections::HashMap;
use std::hash::BuildHasherDefault;

// used for the per-group property to variable maps and the ontology tables
use seahash::SeaHasher;
use tracing::debug;

use crate::datatype::{escape_n3, escape_regex};
use crate::ontology::Ontology;
use crate::query::{FileMode, Query, SparqlFlags, request_property_name};
use crate::term::{
    AggregateFunction, Comparator, Comparison, SortOrder, Term, TermBody, TermKind, comparator_to_string,
};
use crate::vocabulary::{Uri, nao, nfo, nie, rdf, xsd};

pub type UriHasher = BuildHasherDefault<SeaHasher>;
type Scope = HashMap<Uri, String, UriHasher>;

const RESULT: &str = "?r";
const SCORE: &str = "?fullTextScore";
const EXCERPT: &str = "?fullTextExcerpt";
// bif:contains needs this many characters before a wildcard
const MIN_WILDCARD_PREFIX: usize = 4;

pub fn compile(query: &Query, flags: SparqlFlags, ontology: &dyn Ontology) -> String {
    let flags = flags | SparqlFlags::from(query.flags());
    let counting = flags.intersects(SparqlFlags::CREATE_ASK_QUERY | SparqlFlags::CREATE_COUNT_QUERY);

    let mut term = query.term().clone();
    if query.is_file_query() {
        let files = Term::resource_type(nfo::FILE_DATA_OBJECT);
        let folders = Term::resource_type(nfo::FOLDER);
        let mode = match query.file_mode() {
            FileMode::Files => files & Term::negation(folders),
            FileMode::Folders => folders,
            FileMode::Both => files,
        };
        term = Term::and(vec![term, mode, folder_filter(query)]);
    }
    for (i, request) in query.request_properties().iter().enumerate() {
        let fetch = Term::comparison(
            Comparison::new(Some(request.property.clone()), Term::invalid(), Comparator::Equal)
                .with_variable_name(request_property_name(i)),
        );
        if !request.optional {
            term = term & fetch;
        } else if !counting {
            term = term & Term::optional(fetch);
        }
    }

    let term = anchor_negations(&refine(&term.optimize(), ontology));
    if !term.is_valid() {
        debug!("nothing to compile");
        return String::new();
    }

    let mut builder = Builder::new(flags, ontology, query.full_text_scoring_enabled() && !counting);
    let Some(pattern) = builder.lower(&term, RESULT) else {
        debug!(term = %term, "term cannot be expressed as a graph pattern");
        return String::new();
    };
    if pattern.trim().is_empty() {
        return String::new();
    }

    let restriction = if query.is_file_query() || flags.contains(SparqlFlags::NO_RESULT_RESTRICTIONS) {
        String::new()
    } else {
        let class = builder.unique_var();
        format!(
            "FILTER EXISTS {{ {} a {} . {} {} \"true\"^^{} . }} . ",
            RESULT,
            class,
            class,
            nao::USER_VISIBLE.to_n3(),
            xsd::BOOLEAN.to_n3()
        )
    };
    let base = format!("where {{ {}{} }}", pattern, restriction);

    let mut select = builder.custom_variables.clone();
    if builder.scoring && !builder.full_text.is_empty() {
        let scores: Vec<&str> = builder.full_text.iter().map(|f| f.score.as_str()).collect();
        select.push(format!("({}) as {}", scores.join("+"), SCORE));
        builder.order.push((SCORE.to_string(), 0, query.full_text_scoring_sort_order()));
    }

    let sparql = if flags.contains(SparqlFlags::CREATE_COUNT_QUERY) {
        if select.is_empty() {
            format!("select count(distinct {}) as ?cnt {}", RESULT, base)
        } else {
            format!(
                "select count(*) as ?cnt where {{ {{ select distinct {} {} {} }} }}",
                RESULT,
                select.join(" "),
                base
            )
        }
    } else if flags.contains(SparqlFlags::CREATE_ASK_QUERY) {
        format!("ask {}", base)
    } else {
        if flags.contains(SparqlFlags::WITH_FULL_TEXT_EXCERPT) {
            if let Some(excerpt) = builder.excerpt_expression() {
                select.push(excerpt);
            }
        }
        let mut sparql = format!("select distinct {} {} {}{}", RESULT, select.join(" "), base, builder.order_clause());
        if query.offset() > 0 {
            sparql.push_str(&format!(" OFFSET {}", query.offset()));
        }
        if query.limit() > 0 {
            sparql.push_str(&format!(" LIMIT {}", query.limit()));
        }
        sparql
    };
    let sparql = collapse_whitespace(&sparql);
    debug!(sparql = %sparql, "compiled query");
    sparql
}

// ------------- Preparation -------------
fn folder_filter(query: &Query) -> Term {
    let url = |url: &str| {
        let url = escape_regex(url);
        if url.ends_with('/') { url } else { format!("{}/", url) }
    };
    let mut filter = Term::invalid();
    if !query.include_folders().is_empty() {
        let include: Vec<String> = query
            .include_folders()
            .iter()
            .map(|folder| {
                if folder.recursive {
                    format!("(^{})", url(&folder.url))
                } else {
                    format!("(^{}[^/]*$)", url(&folder.url))
                }
            })
            .collect();
        filter = filter & Term::compare(Some(nie::URL), Term::literal(include.join("|")), Comparator::Regexp);
    }
    if !query.exclude_folders().is_empty() {
        let exclude: Vec<String> = query.exclude_folders().iter().map(|u| url(u)).collect();
        filter = filter
            & Term::negation(Term::compare(
                Some(nie::URL),
                Term::literal(format!("^({})", exclude.join("|"))),
                Comparator::Regexp,
            ));
    }
    filter
}

/// Merges the type terms of an or-group into one multi-type term (dropping
/// types already covered by a merged supertype) and moves comparisons with
/// a variable name to the front of and-groups.
fn refine(term: &Term, ontology: &dyn Ontology) -> Term {
    match term.body() {
        TermBody::Or(terms) => {
            let mut types: Vec<Uri> = Vec::new();
            let mut others = Vec::new();
            for t in terms {
                match t.as_resource_types() {
                    Some(uris) => types.extend(uris.iter().cloned()),
                    None => others.push(refine(t, ontology)),
                }
            }
            let merged: Vec<Uri> = types
                .iter()
                .filter(|t| !types.iter().any(|other| other != *t && ontology.is_subclass_of(t, other)))
                .cloned()
                .fold(Vec::new(), |mut merged, t| {
                    if !merged.contains(&t) {
                        merged.push(t);
                    }
                    merged
                });
            if !merged.is_empty() {
                others.push(Term::resource_types(merged));
            }
            match others.len() {
                0 => Term::invalid(),
                1 => others.pop().unwrap_or_default(),
                _ => Term::or(others),
            }
        }
        TermBody::And(terms) => {
            let (mut named, rest): (Vec<&Term>, Vec<&Term>) = terms
                .iter()
                .partition(|t| t.as_comparison().is_some_and(|c| c.variable_name.is_some()));
            named.extend(rest);
            Term::and(named.into_iter().map(|t| refine(t, ontology)).collect())
        }
        TermBody::Negation(inner) => Term::negation(refine(inner, ontology)),
        TermBody::Optional(inner) => Term::optional(refine(inner, ontology)),
        TermBody::Comparison(c) => {
            let mut c = c.as_ref().clone();
            c.sub_term = refine(&c.sub_term, ontology);
            Term::comparison(c)
        }
        _ => term.clone(),
    }
}

/// A negation only filters what the rest of its group matched. Groups with
/// nothing but negations get a type pattern to filter.
fn anchor_negations(term: &Term) -> Term {
    let anchor = || Term::compare(Some(rdf::TYPE), Term::invalid(), Comparator::Equal);
    match term.body() {
        TermBody::And(terms) => {
            let negated = terms.iter().any(|t| t.kind() == TermKind::Negation);
            let anchored = terms.iter().any(|t| {
                matches!(
                    t.kind(),
                    TermKind::Comparison | TermKind::ResourceType | TermKind::Literal
                )
            });
            let mut terms: Vec<Term> = terms
                .iter()
                .map(|t| match t.kind() {
                    TermKind::Negation => t.clone(),
                    _ => anchor_negations(t),
                })
                .collect();
            if negated && !anchored {
                terms.push(anchor());
            }
            Term::and(terms)
        }
        TermBody::Or(terms) => Term::or(terms.iter().map(anchor_negations).collect()),
        TermBody::Negation(_) => Term::and(vec![term.clone(), anchor()]),
        TermBody::Optional(inner) => Term::optional(anchor_negations(inner)),
        TermBody::Comparison(c) => {
            let mut c = c.as_ref().clone();
            c.sub_term = anchor_negations(&c.sub_term);
            Term::comparison(c)
        }
        _ => term.clone(),
    }
}

// ------------- Lowering -------------
struct FullText {
    variable: String,
    text: String,
    score: String,
}

struct Builder<'a> {
    flags: SparqlFlags,
    ontology: &'a dyn Ontology,
    scoring: bool,
    next_var: usize,
    scopes: Vec<Scope>,
    custom_variables: Vec<String>,
    order: Vec<(String, i32, SortOrder)>,
    full_text: Vec<FullText>,
}

impl<'a> Builder<'a> {
    fn new(flags: SparqlFlags, ontology: &'a dyn Ontology, scoring: bool) -> Self {
        Self {
            flags,
            ontology,
            scoring,
            next_var: 0,
            scopes: vec![Scope::default()],
            custom_variables: Vec::new(),
            order: Vec::new(),
            full_text: Vec::new(),
        }
    }

    fn unique_var(&mut self) -> String {
        self.next_var += 1;
        format!("?v{}", self.next_var)
    }

    /// The variable bound to `property` in the current group, and whether
    /// this is its first use. Named variables are always reused. Otherwise
    /// only single-valued properties share a variable, as two values of a
    /// multi-valued property need not be the same resource.
    fn property_var(&mut self, property: &Uri) -> (String, bool) {
        if let Some(var) = self.scopes.last().and_then(|scope| scope.get(property)) {
            return (var.clone(), false);
        }
        let var = self.unique_var();
        if self.ontology.is_single_valued(property) {
            self.register_var(property, &var);
        }
        (var, true)
    }

    fn register_var(&mut self, property: &Uri, var: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(property.clone(), var.to_string());
        }
    }

    fn add_custom_variable(&mut self, var: String) {
        if !self.custom_variables.contains(&var) {
            self.custom_variables.push(var);
        }
    }

    /// Lowers `term` inside a group of its own.
    fn lower_group(&mut self, term: &Term, resource: &str) -> Option<String> {
        self.scopes.push(Scope::default());
        let pattern = self.lower(term, resource);
        self.scopes.pop();
        pattern
    }

    fn lower(&mut self, term: &Term, resource: &str) -> Option<String> {
        match term.body() {
            TermBody::Invalid => None,
            TermBody::Literal(value) => {
                let property = self.unique_var();
                let object = self.unique_var();
                let contains = self.contains_pattern(&object, &value.to_string(), true);
                Some(format!("{} {} {} . {}", resource, property, object, contains))
            }
            TermBody::Resource(uri) => Some(format!("FILTER({}={}) . ", resource, uri.to_n3())),
            TermBody::ResourceType(types) => match types.as_slice() {
                [] => None,
                [single] => Some(format!("{} a {} . ", resource, single.to_n3())),
                several => {
                    let var = self.unique_var();
                    let list: Vec<String> = several.iter().map(Uri::to_n3).collect();
                    Some(format!("{} a {} . FILTER({} in ({})) . ", resource, var, var, list.join(", ")))
                }
            },
            TermBody::And(terms) => {
                let mut pattern = String::new();
                for t in terms {
                    pattern.push_str(&self.lower(t, resource)?);
                }
                Some(pattern)
            }
            TermBody::Or(terms) => {
                let branches = terms
                    .iter()
                    .map(|t| self.lower_group(t, resource).map(|p| format!("{{ {} }}", p)))
                    .collect::<Option<Vec<_>>>()?;
                Some(format!("{} . ", branches.join(" UNION ")))
            }
            TermBody::Negation(inner) => {
                let inner = self.lower_group(inner, resource)?;
                Some(format!("FILTER NOT EXISTS {{ {} }} . ", inner))
            }
            TermBody::Optional(inner) => {
                let inner = self.lower_group(inner, resource)?;
                Some(format!("OPTIONAL {{ {} }} . ", inner))
            }
            TermBody::Comparison(comparison) => self.lower_comparison(comparison, resource),
        }
    }

    fn property_n3(&mut self, property: Option<&Uri>) -> String {
        match property {
            Some(p) => p.to_n3(),
            None => self.unique_var(),
        }
    }

    /// The variable holding the compared value. Named variables are
    /// selected, aggregated if requested, and registered for the property so
    /// that later comparisons reuse them. Sorted values become order keys.
    fn main_variable(&mut self, c: &Comparison) -> (String, bool) {
        let (var, first_use, sort_var) = match &c.variable_name {
            Some(name) => {
                let named = format!("?{}", name);
                if let Some(property) = &c.property {
                    self.register_var(property, &named);
                }
                if c.aggregate == AggregateFunction::NoAggregate {
                    self.add_custom_variable(named.clone());
                    (named.clone(), true, named)
                } else {
                    let var = self.unique_var();
                    self.add_custom_variable(format!("{} as {}", aggregate_expression(c.aggregate, &var), named));
                    (var, true, named)
                }
            }
            None => {
                let (var, first_use) = match &c.property {
                    Some(property) if !c.inverted => self.property_var(property),
                    _ => (self.unique_var(), true),
                };
                let sort_var = aggregate_expression(c.aggregate, &var);
                (var, first_use, sort_var)
            }
        };
        if c.sort_weight != 0 {
            if c.aggregate == AggregateFunction::NoAggregate {
                self.add_custom_variable(sort_var.clone());
            }
            self.order.push((sort_var, c.sort_weight, c.sort_order));
        }
        (var, first_use)
    }

    fn lower_comparison(&mut self, c: &Comparison, resource: &str) -> Option<String> {
        let property = c.property.as_ref();

        // existence of any value
        if !c.sub_term.is_valid() {
            let predicate = self.property_n3(property);
            let (var, first_use) = self.main_variable(c);
            return Some(if c.inverted {
                format!("{} {} {} . ", var, predicate, resource)
            } else if first_use {
                format!("{} {} {} . ", resource, predicate, var)
            } else {
                String::new()
            });
        }

        let literal_range = match property {
            Some(p) => self.ontology.property_literal_range_type(p).is_some(),
            None => c.sub_term.as_literal().is_some(),
        };
        if literal_range || c.comparator == Comparator::Regexp {
            let Some(value) = c.sub_term.as_literal() else {
                debug!(sub_term = %c.sub_term, "literal property compared to a non-literal term");
                return None;
            };
            let predicate = self.property_n3(property);
            if c.comparator == Comparator::Equal && c.variable_name.is_none() && c.sort_weight == 0 {
                return Some(format!("{} {} {} . ", resource, predicate, value.to_n3()));
            }
            let (var, first_use) = self.main_variable(c);
            let filter = match c.comparator {
                Comparator::Contains => self.contains_pattern(&var, &value.to_string(), true),
                Comparator::Regexp => regex_filter(&var, &value.to_string()),
                Comparator::Equal => format!("FILTER({}={}) . ", var, value.to_n3()),
                other => format!("FILTER({}{}{}) . ", var, comparator_to_string(other), value.to_n3()),
            };
            return Some(if first_use {
                format!("{} {} {} . {}", resource, predicate, var, filter)
            } else {
                filter
            });
        }

        // resource range
        let predicate = self.property_n3(property);
        let inverse = property
            .filter(|_| self.flags.contains(SparqlFlags::HANDLE_INVERSE_PROPERTIES))
            .and_then(|p| self.ontology.inverse_property(p));
        let literal = c.sub_term.as_literal();
        let core = |value: &str| {
            let (subject, object) = if c.inverted && literal.is_none() {
                (value, resource)
            } else {
                (resource, value)
            };
            match &inverse {
                Some(inverse) => format!(
                    "{{ {} {} {} . }} UNION {{ {} {} {} . }} . ",
                    subject,
                    predicate,
                    object,
                    object,
                    inverse.to_n3(),
                    subject
                ),
                None => format!("{} {} {} . ", subject, predicate, object),
            }
        };

        if let Some(value) = literal {
            let (var, first_use) = self.main_variable(c);
            let label = self.unique_var();
            let head = if first_use { core(&var) } else { String::new() };
            return match c.comparator {
                Comparator::Equal => Some(format!("{}{} {} {} . ", head, var, label, value.to_n3())),
                Comparator::Contains => {
                    let text = self.unique_var();
                    let contains = self.contains_pattern(&text, &value.to_string(), false);
                    Some(format!("{}{} {} {} . {}", head, var, label, text, contains))
                }
                _ => {
                    debug!(comparator = %c.comparator, "comparator cannot match a resource");
                    None
                }
            };
        }
        if let Some(uri) = c.sub_term.as_resource() {
            return Some(core(&uri.to_n3()));
        }

        let (var, first_use) = self.main_variable(c);
        let head = if first_use { core(&var) } else { String::new() };
        let nested = self.lower_group(&c.sub_term, &var)?;
        Some(format!("{}{}", head, nested))
    }

    /// Full-text match of `var` against `text`. Wildcards too close to the
    /// start of a word are matched with a regular expression instead.
    fn contains_pattern(&mut self, var: &str, text: &str, score: bool) -> String {
        let text = text.trim();
        if let Some(wildcard) = text.find(['*', '?']) {
            if text[..wildcard].chars().count() < MIN_WILDCARD_PREFIX {
                let pattern: String = text
                    .chars()
                    .map(|c| match c {
                        '*' => ".*".to_string(),
                        '?' => ".".to_string(),
                        c => escape_regex(&c.to_string()),
                    })
                    .collect();
                return regex_filter(var, &pattern);
            }
        }
        let expression = format!("'{}'", text.replace('\'', "\\'"));
        if score && self.scoring {
            let score_var = self.unique_var();
            self.full_text.push(FullText {
                variable: var.to_string(),
                text: text.to_string(),
                score: score_var.clone(),
            });
            format!("{} bif:contains \"{}\" OPTION (score {}) . ", var, escape_n3(&expression), score_var)
        } else {
            if score {
                self.full_text.push(FullText {
                    variable: var.to_string(),
                    text: text.to_string(),
                    score: String::new(),
                });
            }
            format!("{} bif:contains \"{}\" . ", var, escape_n3(&expression))
        }
    }

    fn excerpt_expression(&self) -> Option<String> {
        let first = self.full_text.first()?;
        let words: Vec<String> = self
            .full_text
            .iter()
            .flat_map(|f| f.text.split_whitespace())
            .map(|w| format!("'{}'", w.trim_end_matches('*').replace('\'', "")))
            .collect();
        Some(format!(
            "bif:search_excerpt(bif:vector({}), {}) as {}",
            words.join(", "),
            first.variable,
            EXCERPT
        ))
    }

    /// Heavier weights sort first.
    fn order_clause(&self) -> String {
        if self.order.is_empty() {
            return String::new();
        }
        let mut keys: Vec<&(String, i32, SortOrder)> = self.order.iter().collect();
        keys.sort_by(|a, b| b.1.cmp(&a.1));
        let keys: Vec<String> = keys
            .into_iter()
            .map(|(var, _, order)| match order {
                SortOrder::Ascending => format!("ASC({})", var),
                SortOrder::Descending => format!("DESC({})", var),
            })
            .collect();
        format!(" ORDER BY {}", keys.join(" "))
    }
}

/// Squeezes runs of whitespace between template fragments into one space.
/// Quoted literals are copied untouched.
fn collapse_whitespace(sparql: &str) -> String {
    let mut out = String::with_capacity(sparql.len());
    let mut quoted = false;
    let mut escaped = false;
    let mut pending = false;
    for c in sparql.chars() {
        if quoted {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                quoted = false;
            }
            continue;
        }
        if c.is_whitespace() {
            pending = !out.is_empty();
            continue;
        }
        if pending {
            out.push(' ');
            pending = false;
        }
        quoted = c == '"';
        out.push(c);
    }
    out
}

fn regex_filter(var: &str, pattern: &str) -> String {
    format!("FILTER(REGEX(STR({}), \"{}\", \"i\")) . ", var, escape_n3(pattern))
}

fn aggregate_expression(aggregate: AggregateFunction, var: &str) -> String {
    match aggregate {
        AggregateFunction::NoAggregate => var.to_string(),
        AggregateFunction::Count => format!("count({})", var),
        AggregateFunction::DistinctCount => format!("count(distinct {})", var),
        AggregateFunction::Max => format!("max({})", var),
        AggregateFunction::Min => format!("min({})", var),
        AggregateFunction::Sum => format!("sum({})", var),
        AggregateFunction::DistinctSum => format!("sum(distinct {})", var),
        AggregateFunction::Average => format!("avg({})", var),
        AggregateFunction::DistinctAverage => format!("avg(distinct {})", var),
    }
}
