//! Term fusion: the flat list left over by the passes becomes one term tree.
//!
//! Terms are joined with an implicit AND. The `or`, `and` and `not` keywords
//! (and `+`, `!`, `-`) change how the *next* term is joined, parentheses
//! open a nested level. While walking the list every term is also tuned
//! against the resource type mentioned last: `property://<name>/`
//! placeholders get their real property, bare numbers and dates turn into
//! ranges over the default size and date properties.
//!
//! The resource type context is local to one level. A nested level, and a
//! subquery fused by the subquery pass, starts from the general defaults
//! again.

use crate::datatype::{LiteralValue, Moment};
use crate::parser::ParserFlags;
use crate::settings::ParserSettings;
use crate::term::{Comparator, Span, Term, TermBody};
use crate::vocabulary::{Uri, nao, ncal, nco, nfo, nie, nmm, nmo, pseudo_property_name, rdfs};

// ------------- Resource type context -------------
/// Selects the real properties behind `property://author/`, `size`, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResourceContext {
    #[default]
    General,
    Files,
    Audio,
    Message,
    Contact,
    Event,
}

impl ResourceContext {
    pub fn for_type(uri: &Uri) -> ResourceContext {
        if *uri == nfo::FILE_DATA_OBJECT
            || *uri == nfo::IMAGE
            || *uri == nfo::VIDEO
            || *uri == nfo::DOCUMENT
            || *uri == nfo::FOLDER
        {
            ResourceContext::Files
        } else if *uri == nfo::AUDIO {
            ResourceContext::Audio
        } else if *uri == nmo::MESSAGE || *uri == nmo::EMAIL {
            ResourceContext::Message
        } else if *uri == nco::CONTACT {
            ResourceContext::Contact
        } else if *uri == ncal::EVENT {
            ResourceContext::Event
        } else {
            ResourceContext::General
        }
    }

    fn specific(self, name: &str) -> Option<Uri> {
        use ResourceContext::*;
        let uri = match (self, name) {
            (Audio, "author") => nmm::PERFORMER,
            (Files | Audio, "size") => nfo::FILE_SIZE,
            (Files | Audio, "name") => nfo::FILE_NAME,
            (Files | Audio, "created") => nfo::FILE_CREATED,
            (Files | Audio, "modified") => nfo::FILE_LAST_MODIFIED,
            (Message, "title") => nmo::MESSAGE_SUBJECT,
            (Message, "created" | "modified") => nmo::RECEIVED_DATE,
            (Contact, "title" | "name") => nco::FULLNAME,
            (Event, "name") => ncal::SUMMARY,
            (Event, "title") => ncal::DESCRIPTION,
            _ => return None,
        };
        Some(uri)
    }

    /// The real property behind a pseudo-property name, falling back to the
    /// general information element properties.
    pub fn resolve(self, name: &str) -> Option<Uri> {
        self.specific(name).or_else(|| {
            let uri = match name {
                "author" => nfo::FILE_OWNER,
                "title" => nie::TITLE,
                "size" => nie::CONTENT_SIZE,
                "name" => rdfs::LABEL,
                "created" => nie::CREATED,
                "modified" => nie::LAST_MODIFIED,
                "description" => nao::DESCRIPTION,
                _ => return None,
            };
            Some(uri)
        })
    }

    pub fn date_property(self) -> Option<Uri> {
        self.resolve("modified")
    }

    pub fn size_property(self) -> Option<Uri> {
        self.resolve("size")
    }
}

// ------------- Intervals -------------
/// `property >= start` and `property <= end` for the moment's interval.
pub fn interval(property: Option<Uri>, moment: Moment, span: Span) -> Term {
    let (start, end) = moment.interval();
    let bound = |instant, comparator| {
        let value = Term::literal(Moment::new(instant, moment.granularity)).with_span(span);
        Term::compare(property.clone(), value, comparator).with_span(span)
    };
    Term::and(vec![
        bound(start, Comparator::GreaterOrEqual),
        bound(end, Comparator::SmallerOrEqual),
    ])
    .with_span(span)
}

fn range(property: Option<Uri>, min: LiteralValue, max: LiteralValue, span: Span) -> Term {
    Term::and(vec![
        Term::compare(property.clone(), Term::literal(min).with_span(span), Comparator::GreaterOrEqual)
            .with_span(span),
        Term::compare(property, Term::literal(max).with_span(span), Comparator::SmallerOrEqual).with_span(span),
    ])
    .with_span(span)
}

// ------------- Fuser -------------
pub struct Fuser<'a> {
    settings: &'a ParserSettings,
    flags: ParserFlags,
}

enum Keyword {
    Or,
    And,
    Not,
    Open,
    Close,
}

impl<'a> Fuser<'a> {
    pub fn new(settings: &'a ParserSettings, flags: ParserFlags) -> Self {
        Self { settings, flags }
    }

    fn keyword(&self, text: &str) -> Option<Keyword> {
        let word = text.to_lowercase();
        let keyword = if word == self.settings.or_keyword {
            Keyword::Or
        } else if word == self.settings.and_keyword || word == "+" {
            Keyword::And
        } else if word == self.settings.not_keyword || word == "!" || word == "-" {
            Keyword::Not
        } else if word == "(" {
            Keyword::Open
        } else if word == ")" {
            Keyword::Close
        } else {
            return None;
        };
        Some(keyword)
    }

    /// Fuses `terms` from `start` up to the end or to the `)` closing this
    /// level. Returns the fused term and the index where fusion stopped.
    pub fn fuse(&self, terms: &[Term], start: usize) -> (Term, usize) {
        let mut context = ResourceContext::default();
        let mut fused = Term::invalid();
        let mut build_and = true;
        let mut negation: Option<Span> = None;
        let mut index = start;

        while index < terms.len() {
            let current = &terms[index];
            let term = match current.literal_str() {
                Some(text) => match self.keyword(text) {
                    Some(Keyword::Or) => {
                        build_and = false;
                        index += 1;
                        continue;
                    }
                    Some(Keyword::And) => {
                        build_and = true;
                        index += 1;
                        continue;
                    }
                    Some(Keyword::Not) => {
                        negation = Some(negation.unwrap_or_default().union(current.span()));
                        index += 1;
                        continue;
                    }
                    Some(Keyword::Open) => {
                        let (nested, end) = self.fuse(terms, index + 1);
                        index = end;
                        nested
                    }
                    Some(Keyword::Close) => return (fused, index),
                    None if self.is_stop_word(text) => {
                        index += 1;
                        continue;
                    }
                    None => self.tune(current.clone(), &mut context),
                },
                None => self.tune(current.clone(), &mut context),
            };

            let term = match negation.take() {
                Some(operator) => {
                    let span = term.span().union(operator);
                    Term::negate(term).with_span(span)
                }
                None => term,
            };
            fused = merge(fused, term, build_and);
            build_and = true;
            index += 1;
        }
        (fused, index)
    }

    fn is_stop_word(&self, text: &str) -> bool {
        self.settings.words_separated_by_spaces && text.chars().count() <= self.settings.stop_word_length
    }

    /// Adapts a single term to the current resource type context.
    pub fn tune(&self, term: Term, context: &mut ResourceContext) -> Term {
        let span = term.span();
        match term.body() {
            TermBody::ResourceType(types) => {
                if let Some(primary) = types.first() {
                    *context = ResourceContext::for_type(primary);
                }
                term
            }
            TermBody::Literal(LiteralValue::Integer(value)) => self.integer_window(*value, context.size_property(), span),
            TermBody::Literal(LiteralValue::Double(value)) => {
                let window = self.settings.numeric_window;
                range(
                    context.size_property(),
                    LiteralValue::Double(value * (1.0 - window)),
                    LiteralValue::Double(value * (1.0 + window)),
                    span,
                )
            }
            TermBody::Literal(LiteralValue::DateTime(moment)) => interval(context.date_property(), *moment, span),
            TermBody::Literal(LiteralValue::String(text)) if self.globs(text) => {
                Term::literal(format!("{}*", text)).with_span(span)
            }
            TermBody::Comparison(comparison) => {
                let mut comparison = comparison.as_ref().clone();
                if let Some(name) = comparison.property.as_ref().and_then(pseudo_property_name) {
                    comparison.property = context.resolve(name);
                }
                let moment = comparison.sub_term.as_literal().and_then(LiteralValue::as_moment);
                match moment {
                    Some(moment) if comparison.comparator == Comparator::Equal => {
                        interval(comparison.property, moment, span)
                    }
                    _ => Term::comparison(comparison).with_span(span),
                }
            }
            _ => term,
        }
    }

    fn globs(&self, text: &str) -> bool {
        self.flags.contains(ParserFlags::QUERY_TERM_GLOBBING)
            && text.chars().count() >= 4
            && !text.ends_with('*')
            && !text.chars().any(char::is_whitespace)
    }

    // [v - window, v + window] rounded inwards
    fn integer_window(&self, value: i64, property: Option<Uri>, span: Span) -> Term {
        let percent = (self.settings.numeric_window * 100.0).round().clamp(0.0, 100.0) as i128;
        let value = value as i128;
        let lower = -((-(value * (100 - percent))).div_euclid(100));
        let upper = (value * (100 + percent)).div_euclid(100);
        let clamp = |v: i128| v.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        range(
            property,
            LiteralValue::Integer(clamp(lower)),
            LiteralValue::Integer(clamp(upper)),
            span,
        )
    }
}

/// Adds `term` to `fused`, appending to `fused` when it already is a group
/// of the requested kind.
fn merge(fused: Term, term: Term, and: bool) -> Term {
    if !term.is_valid() {
        return fused;
    }
    if !fused.is_valid() {
        return term;
    }
    let fused_span = fused.span();
    let span = fused_span.union(term.span());
    let merged = match fused.into_body() {
        TermBody::And(mut terms) if and => {
            terms.push(term);
            Term::and(terms)
        }
        TermBody::Or(mut terms) if !and => {
            terms.push(term);
            Term::or(terms)
        }
        body => {
            let left = Term::from(body).with_span(fused_span);
            if and {
                Term::and(vec![left, term])
            } else {
                Term::or(vec![left, term])
            }
        }
    };
    merged.with_span(span)
}
