//! The natural language query parser.
//!
//! Parsing splits the text into literal terms, runs the rewriting passes over
//! them in a fixed order (numbers and units first, then types, dates,
//! comparators, properties and subqueries), folds date fields into date-time
//! values and finally fuses what is left into a single term.
//!
//! ```
//! use deskquery::{QueryParser, Term};
//!
//! let query = QueryParser::parse_query("Hello World");
//! assert_eq!(query.term(), &Term::and(vec![Term::literal("Hello"), Term::literal("World")]));
//! ```

use bitflags::bitflags;
use chrono::{Local, NaiveDateTime};
use tracing::{debug, trace, warn};

use crate::completion::{CompletionProposal, ProposalType};
use crate::datatype::Period;
use crate::datefold::fold_dates;
use crate::fusion::Fuser;
use crate::matcher::{Pass, PatternMatcher};
use crate::ontology::StatementStore;
use crate::passes::{
    Comparators, DatePeriods, DateValues, DecimalValues, FileNames, FileSize, LookupCaches, Numbers, PeriodNames,
    PeriodValue, Properties, SplitUnits, Subqueries, TypeHints, ValueDomain,
};
use crate::query::Query;
use crate::settings::ParserSettings;
use crate::term::{Comparator, Span, Term};
use crate::vocabulary::{Uri, nao, nie, nmo, pseudo_property};

bitflags! {
    #[derive(Default)]
    pub struct ParserFlags: u32 {
        /// Plain words of four or more characters also match as prefixes.
        const QUERY_TERM_GLOBBING = 0x1;
        /// Words like `*.mp3` or `notes.txt` are matched against file names.
        const DETECT_FILENAME_PATTERN = 0x2;
    }
}

// ------------- Pass driver -------------
struct PassRunner {
    terms: Vec<Term>,
    cursor: Option<usize>,
    proposals: Vec<CompletionProposal>,
}

impl PassRunner {
    fn run(&mut self, pass: &dyn Pass, rules: &str) {
        self.run_described(pass, rules, ProposalType::NoType, None);
    }

    /// Applies `pass` once per `;`-separated rule, in order. Described
    /// passes propose completions for rules the input stops in the middle of.
    fn run_described(&mut self, pass: &dyn Pass, rules: &str, proposal_type: ProposalType, description: Option<&str>) {
        for rule in rules.split(';') {
            let parts: Vec<&str> = rule.split_whitespace().collect();
            if parts.is_empty() {
                continue;
            }
            let matcher = match PatternMatcher::new(&mut self.terms, &parts) {
                Ok(matcher) => matcher,
                Err(e) => {
                    warn!(rule, error = %e, "skipping pattern rule");
                    continue;
                }
            };
            let mut matcher = match (self.cursor, description) {
                (Some(cursor), Some(description)) => matcher.with_completion(cursor, proposal_type, description),
                _ => matcher,
            };
            matcher.run_pass(pass);
            for proposal in matcher.into_proposals() {
                if !self.proposals.contains(&proposal) {
                    self.proposals.push(proposal);
                }
            }
        }
    }
}

// ------------- QueryParser -------------
pub struct QueryParser {
    settings: ParserSettings,
    store: Option<Box<dyn StatementStore>>,
    caches: LookupCaches,
    reference_time: Option<NaiveDateTime>,
    proposals: Vec<CompletionProposal>,
}

impl Default for QueryParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryParser {
    pub fn new() -> Self {
        Self::with_settings(ParserSettings::default())
    }

    pub fn with_settings(settings: ParserSettings) -> Self {
        Self {
            settings,
            store: None,
            caches: LookupCaches::default(),
            reference_time: None,
            proposals: Vec::new(),
        }
    }

    /// The store tags, contacts and e-mail addresses are looked up in.
    pub fn with_store(mut self, store: Box<dyn StatementStore>) -> Self {
        self.store = Some(store);
        self.caches = LookupCaches::default();
        self
    }

    /// Relative dates ("yesterday", "last week") are resolved against this
    /// instant instead of the local time.
    pub fn set_reference_time(&mut self, now: NaiveDateTime) {
        self.reference_time = Some(now);
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    /// Parses with default flags and a fresh parser.
    pub fn parse_query(query: &str) -> Query {
        QueryParser::new().parse(query, ParserFlags::empty(), None)
    }

    /// Parses `query`. With a `cursor` position, completion proposals for
    /// the text around it are collected as well.
    pub fn parse(&mut self, query: &str, flags: ParserFlags, cursor: Option<usize>) -> Query {
        self.proposals.clear();
        let terms = self.tokenize(query);
        trace!(query, tokens = terms.len(), "tokenized query");
        if terms.is_empty() {
            return Query::default();
        }

        let now = self.reference_time.unwrap_or_else(|| Local::now().naive_local());
        let mut runner = PassRunner {
            terms,
            cursor,
            proposals: Vec::new(),
        };
        self.run_passes(&mut runner, flags, now);

        let (term, _) = Fuser::new(&self.settings, flags).fuse(&runner.terms, 0);
        self.proposals = runner.proposals;
        debug!(query, term = %term, "parsed query");
        Query::new(term)
    }

    pub fn completion_proposals(&self) -> &[CompletionProposal] {
        &self.proposals
    }

    pub fn all_tags(&self) -> Vec<String> {
        labels(self.caches.tags(self.store.as_deref()))
    }

    pub fn all_contacts(&self) -> Vec<String> {
        labels(self.caches.contacts(self.store.as_deref()))
    }

    pub fn all_email_addresses(&self) -> Vec<String> {
        labels(self.caches.email_addresses(self.store.as_deref()))
    }

    // ------------- Tokenizer -------------
    /// Splits the text at whitespace and around separator characters. Text
    /// between double quotes stays one term whose span covers the quotes.
    fn tokenize(&self, query: &str) -> Vec<Term> {
        let mut terms = Vec::new();
        let mut word = String::new();
        let mut start = 0;
        let mut quote_start: Option<usize> = None;

        for (i, c) in query.chars().enumerate() {
            if c == '"' {
                match quote_start.take() {
                    Some(open) => push_word(&mut terms, &mut word, Span::new(open, i + 1 - open)),
                    None => {
                        push_word(&mut terms, &mut word, Span::new(start, i - start));
                        quote_start = Some(i);
                    }
                }
                start = i + 1;
            } else if quote_start.is_some() {
                word.push(c);
            } else if c.is_whitespace() {
                push_word(&mut terms, &mut word, Span::new(start, i - start));
                start = i + 1;
            } else if self.settings.is_separator(c) || !self.settings.words_separated_by_spaces {
                push_word(&mut terms, &mut word, Span::new(start, i - start));
                terms.push(Term::literal(c.to_string()).with_span(Span::new(i, 1)));
                start = i + 1;
            } else {
                word.push(c);
            }
        }
        let end = query.chars().count();
        match quote_start {
            Some(open) => push_word(&mut terms, &mut word, Span::new(open, end - open)),
            None => push_word(&mut terms, &mut word, Span::new(start, end - start)),
        }
        terms
    }

    // ------------- Passes -------------
    fn run_passes(&self, runner: &mut PassRunner, flags: ParserFlags, now: NaiveDateTime) {
        let settings = &self.settings;

        // literal values
        runner.run(&SplitUnits, "%1");
        runner.run(&Numbers { settings }, "%1");
        runner.run(&DecimalValues, r"%1 \. %2");
        runner.run(&FileSize, "%1 %2");
        runner.run(&TypeHints, "%1");
        if flags.contains(ParserFlags::DETECT_FILENAME_PATTERN) {
            runner.run(&FileNames, "%1");
        }

        // date periods
        runner.run(&PeriodNames { settings }, "%1");
        let periods = |period: Option<Period>, kind: PeriodValue, value: i64| DatePeriods {
            settings,
            period,
            kind,
            value,
        };
        runner.run(&periods(None, PeriodValue::Offset, 0), "in %2 %1");
        runner.run(&periods(None, PeriodValue::InvertedOffset, 0), "%2 %1 ago");
        let date = ProposalType::DateTime;
        runner.run_described(&periods(Some(Period::Day), PeriodValue::Offset, 1), "tomorrow", date, Some("Tomorrow"));
        runner.run_described(&periods(Some(Period::Day), PeriodValue::Offset, -1), "yesterday", date, Some("Yesterday"));
        runner.run_described(&periods(Some(Period::Day), PeriodValue::Offset, 0), "today", date, Some("Today"));
        runner.run_described(
            &periods(None, PeriodValue::Value, 1),
            "first %1",
            ProposalType::NoType,
            Some("First week, month, day, ..."),
        );
        runner.run_described(
            &periods(None, PeriodValue::Value, -1),
            "last %1 of",
            ProposalType::NoType,
            Some("Last week, month, day, ..."),
        );
        runner.run(&periods(None, PeriodValue::Value, 0), "%2 %1");
        runner.run_described(
            &periods(None, PeriodValue::Offset, 1),
            "next %1",
            ProposalType::NoType,
            Some("Next week, month, day, ..."),
        );
        runner.run_described(
            &periods(None, PeriodValue::Offset, -1),
            "last %1",
            ProposalType::NoType,
            Some("Previous week, month, day, ..."),
        );

        // date values
        let named = DateValues {
            pm: false,
            numeric_months: false,
        };
        runner.run_described(
            &DateValues {
                pm: true,
                numeric_months: false,
            },
            "at %5 : %6 pm;at %5 h pm;at %5 pm;%5 : %6 pm;%5 h pm;%5 pm",
            ProposalType::NoType,
            Some("A time after midday"),
        );
        runner.run_described(
            &named,
            "at %5 : %6 am;at %5 h am;at %5 am;at %5;%5 : %6 am;%5 : %6 : %7;%5 : %6;%5 h am;%5 h;%5 am",
            ProposalType::NoType,
            Some("A time"),
        );
        runner.run(
            &named,
            "%3 of %2 %1;%3 st|nd|rd|th %2 %1;%3 st|nd|rd|th of %2 %1;\
             %3 of %2;%3 st|nd|rd|th %2;%3 st|nd|rd|th of %2;%2 %3 st|nd|rd|th;%2 %3;%2 %1",
        );
        runner.run(
            &DateValues {
                pm: false,
                numeric_months: true,
            },
            "%1 - %2 - %3;%1 - %2;%3 / %2 / %1;%3 / %2",
        );
        runner.run(&named, "in %2 %1;in %1;, %1");

        runner.terms = fold_dates(std::mem::take(&mut runner.terms), now, settings);

        // comparators
        let comparators = |comparator| Comparators { settings, comparator };
        let no_type = ProposalType::NoType;
        runner.run_described(
            &comparators(Comparator::Contains),
            "contains|containing %1",
            no_type,
            Some("Containing"),
        );
        runner.run_described(
            &comparators(Comparator::GreaterOrEqual),
            "at least %1;> = %1",
            no_type,
            Some("At least"),
        );
        runner.run_described(
            &comparators(Comparator::Greater),
            "greater|bigger|more than %1;> %1",
            no_type,
            Some("Greater than"),
        );
        runner.run_described(&comparators(Comparator::Greater), "after|since %1", date, Some("After"));
        runner.run_described(
            &comparators(Comparator::SmallerOrEqual),
            "at most %1;< = %1",
            no_type,
            Some("At most"),
        );
        runner.run_described(
            &comparators(Comparator::Smaller),
            "smaller|less|lesser than %1;< %1",
            no_type,
            Some("Smaller than"),
        );
        runner.run_described(&comparators(Comparator::Smaller), "before|until %1", date, Some("Before"));
        runner.run_described(
            &comparators(Comparator::Equal),
            "equal|equals|= %1;equal to %1",
            no_type,
            Some("Equal to"),
        );

        // properties
        let store = self.store.as_deref();
        let caches = &self.caches;
        let property = |property: Uri, domain: ValueDomain| Properties {
            property,
            domain,
            caches,
            store,
        };
        for (uri, domain, rules, proposal_type, description) in [
            (
                nao::NUMERIC_RATING,
                ValueDomain::Integer,
                "rated as %1;rated %1;score is %1;score|scored %1;having %1 stars|star",
                no_type,
                "Rating (0 to 10)",
            ),
            (
                nao::DESCRIPTION,
                ValueDomain::String,
                "described as %1;description|comment is %1;described|description|comment %1",
                no_type,
                "Comment or description",
            ),
            (
                nmo::MESSAGE_FROM,
                ValueDomain::EmailAddress,
                "sent by %1;from %1;sender is %1;sender %1",
                ProposalType::Email,
                "Sender of an e-mail",
            ),
            (pseudo_property("title"), ValueDomain::String, "title %1;titled %1", no_type, "Title"),
            (
                nmo::MESSAGE_RECIPIENT,
                ValueDomain::EmailAddress,
                "sent to %1;to %1;recipient is %1;recipient %1",
                ProposalType::Email,
                "Recipient of an e-mail",
            ),
            (
                nmo::SENT_DATE,
                ValueDomain::DateTime,
                "sent at|on %1;sent %1",
                date,
                "Date of sending",
            ),
            (
                nmo::RECEIVED_DATE,
                ValueDomain::DateTime,
                "received at|on %1;received %1;reception is %1",
                date,
                "Date of reception",
            ),
            (
                pseudo_property("author"),
                ValueDomain::Contact,
                "written|created|composed by %1;author is %1;by %1",
                ProposalType::Contact,
                "Author",
            ),
            (
                pseudo_property("size"),
                ValueDomain::IntegerOrDouble,
                "size is %1;size %1;being %1 large;%1 large",
                no_type,
                "Size",
            ),
            (
                pseudo_property("name"),
                ValueDomain::String,
                "name is %1;name %1;named %1",
                no_type,
                "Name",
            ),
            (
                pseudo_property("created"),
                ValueDomain::DateTime,
                "created|dated at|on|in|of %1;created|dated %1;creation date|time|datetime is %1",
                date,
                "Date of creation",
            ),
            (
                pseudo_property("modified"),
                ValueDomain::DateTime,
                "modified|edited at|on %1;modified|edited %1;modification|edition date|time|datetime is %1",
                date,
                "Date of last modification",
            ),
            (
                nao::HAS_TAG,
                ValueDomain::Tag,
                "tagged as %1;has tag %1;tag is %1;# %1",
                ProposalType::Tag,
                "Tag name",
            ),
        ] {
            runner.run_described(&property(uri, domain), rules, proposal_type, Some(description));
        }

        // subqueries
        let fuser = Fuser::new(settings, flags);
        runner.run_described(
            &Subqueries {
                property: nie::RELATED_TO,
                fuser: &fuser,
            },
            "related to ... ,;related to ...",
            no_type,
            Some("Match items related to others"),
        );
    }
}

fn push_word(terms: &mut Vec<Term>, word: &mut String, span: Span) {
    if !word.is_empty() {
        terms.push(Term::literal(std::mem::take(word)).with_span(span));
    }
}

fn labels(entries: &[(String, Uri)]) -> Vec<String> {
    entries.iter().map(|(label, _)| label.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(query: &str) -> Vec<(String, usize, usize)> {
        QueryParser::new()
            .tokenize(query)
            .into_iter()
            .map(|t| (t.literal_str().unwrap_or_default().to_string(), t.position(), t.length()))
            .collect()
    }

    #[test]
    fn separators_are_tokens_of_their_own() {
        assert_eq!(
            tokens("-KWrite size<2"),
            vec![
                ("-".to_string(), 0, 1),
                ("KWrite".to_string(), 1, 6),
                ("size".to_string(), 8, 4),
                ("<".to_string(), 12, 1),
                ("2".to_string(), 13, 1),
            ]
        );
    }

    #[test]
    fn quotes_group_words() {
        assert_eq!(
            tokens("say \"Hello World\" now"),
            vec![
                ("say".to_string(), 0, 3),
                ("Hello World".to_string(), 4, 13),
                ("now".to_string(), 18, 3),
            ]
        );
        // an unterminated quote runs to the end
        assert_eq!(tokens("\"a (b"), vec![("a (b".to_string(), 0, 5)]);
    }

    #[test]
    fn spans_count_characters() {
        assert_eq!(tokens("été x"), vec![("été".to_string(), 0, 3), ("x".to_string(), 4, 1)]);
    }
}
