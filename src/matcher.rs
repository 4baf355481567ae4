//! Pattern matching over a term sequence.
//!
//! A pattern is a list of parts: `%N` captures the term at that place into
//! slot N (1-based), `...` takes every term up to the first one matching the
//! next part (or up to the end when it is the last part), and anything else
//! is a case-insensitive regular expression a literal term has to match
//! entirely.
//!
//! [`PatternMatcher::run_pass`] hands every match to a [`Pass`] and splices
//! its replacement into the sequence, then scans again from the start so that
//! later matches see the rewritten terms.

use regex::Regex;
use tracing::{debug, warn};

use crate::completion::{CompletionProposal, ProposalType};
use crate::error::{QueryError, Result};
use crate::term::{Span, Term};

/// A rewrite step. An empty result declines the match.
pub trait Pass {
    /// `captures` holds the capture slots in order, followed by the terms
    /// consumed by a `...` wildcard.
    fn run(&self, captures: &[Term]) -> Vec<Term>;
}

// upper bound for rewrites within a single pass application
const MAX_REWRITES: usize = 4096;

#[derive(Debug)]
enum PatternPart {
    Capture(usize),
    Wildcard,
    Keyword(Regex),
}

impl PatternPart {
    fn parse(part: &str) -> Result<PatternPart> {
        if part == "..." {
            return Ok(PatternPart::Wildcard);
        }
        if let Some(slot) = part.strip_prefix('%').and_then(|n| n.parse::<usize>().ok()) {
            if slot > 0 {
                return Ok(PatternPart::Capture(slot));
            }
        }
        Ok(PatternPart::Keyword(Regex::new(&format!("(?i)^(?:{})$", part))?))
    }

    fn matches(&self, term: &Term) -> bool {
        match self {
            PatternPart::Capture(_) | PatternPart::Wildcard => true,
            PatternPart::Keyword(regex) => term
                .as_literal()
                .map(|value| regex.is_match(&value.to_string()))
                .unwrap_or(false),
        }
    }
}

enum Outcome {
    Matched { captures: Vec<Term>, length: usize, span: Span },
    /// The input ended inside the pattern after `parts` parts matched.
    Partial { parts: usize, span: Span },
    Failed,
}

struct Completion {
    cursor: usize,
    proposal_type: ProposalType,
    description: String,
}

pub struct PatternMatcher<'a> {
    terms: &'a mut Vec<Term>,
    source: Vec<String>,
    pattern: Vec<PatternPart>,
    capture_count: usize,
    completion: Option<Completion>,
    proposals: Vec<CompletionProposal>,
}

impl<'a> PatternMatcher<'a> {
    pub fn new(terms: &'a mut Vec<Term>, pattern: &[&str]) -> Result<Self> {
        if pattern.is_empty() {
            return Err(QueryError::Pattern("empty pattern".into()));
        }
        let parts = pattern
            .iter()
            .map(|p| PatternPart::parse(p))
            .collect::<Result<Vec<_>>>()?;
        let capture_count = parts
            .iter()
            .filter_map(|p| match p {
                PatternPart::Capture(slot) => Some(*slot),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        Ok(Self {
            terms,
            source: pattern.iter().map(|p| p.to_string()).collect(),
            pattern: parts,
            capture_count,
            completion: None,
            proposals: Vec::new(),
        })
    }

    /// Collect proposals for partial matches around `cursor`.
    pub fn with_completion(mut self, cursor: usize, proposal_type: ProposalType, description: &str) -> Self {
        self.completion = Some(Completion {
            cursor,
            proposal_type,
            description: description.to_string(),
        });
        self
    }

    pub fn capture_count(&self) -> usize {
        self.capture_count
    }

    pub fn into_proposals(self) -> Vec<CompletionProposal> {
        self.proposals
    }

    /// Applies `pass` to every match, returns the number of rewrites.
    pub fn run_pass(&mut self, pass: &dyn Pass) -> usize {
        let mut rewrites = 0;
        let mut index = 0;
        while index < self.terms.len() {
            match self.match_at(index) {
                Outcome::Matched { captures, length, span } => {
                    let mut replacement = pass.run(&captures);
                    if replacement.is_empty() {
                        index += 1;
                        continue;
                    }
                    if replacement.len() == 1 {
                        replacement[0].set_span(span);
                    }
                    debug!(
                        pattern = %self.source.join(" "),
                        start = span.start,
                        length = span.length,
                        replaced = length,
                        produced = replacement.len(),
                        "rewrote terms"
                    );
                    self.terms.splice(index..index + length, replacement);
                    rewrites += 1;
                    if rewrites >= MAX_REWRITES {
                        warn!(pattern = %self.source.join(" "), "rewrite limit reached");
                        break;
                    }
                    index = 0;
                }
                Outcome::Partial { parts, span } => {
                    self.propose(parts, span);
                    index += 1;
                }
                Outcome::Failed => index += 1,
            }
        }
        rewrites
    }

    fn match_at(&self, start: usize) -> Outcome {
        let mut captures = vec![Term::invalid(); self.capture_count];
        let mut wildcard = Vec::new();
        let mut pattern_index = 0;
        let mut term_index = start;
        let mut keyword_matched = false;

        while pattern_index < self.pattern.len() && term_index < self.terms.len() {
            let term = &self.terms[term_index];
            let part = &self.pattern[pattern_index];
            match part {
                PatternPart::Capture(slot) => {
                    captures[slot - 1] = term.clone();
                    pattern_index += 1;
                    term_index += 1;
                }
                PatternPart::Keyword(_) => {
                    if !part.matches(term) {
                        return Outcome::Failed;
                    }
                    keyword_matched = true;
                    pattern_index += 1;
                    term_index += 1;
                }
                PatternPart::Wildcard => match self.pattern.get(pattern_index + 1) {
                    Some(next) if next.matches(term) => pattern_index += 1,
                    _ => {
                        wildcard.push(term.clone());
                        term_index += 1;
                    }
                },
            }
        }

        let span = self.terms[start..term_index]
            .iter()
            .fold(Span::default(), |acc, t| acc.union(t.span()));
        let trailing_wildcard = pattern_index + 1 == self.pattern.len()
            && matches!(self.pattern[pattern_index], PatternPart::Wildcard)
            && !wildcard.is_empty();
        if pattern_index == self.pattern.len() || trailing_wildcard {
            captures.extend(wildcard);
            Outcome::Matched {
                captures,
                length: term_index - start,
                span,
            }
        } else if keyword_matched {
            Outcome::Partial {
                parts: pattern_index,
                span,
            }
        } else {
            Outcome::Failed
        }
    }

    fn propose(&mut self, parts: usize, span: Span) {
        let Some(completion) = &self.completion else {
            return;
        };
        if completion.cursor < span.start || completion.cursor > span.end() + 1 {
            return;
        }
        let proposal = CompletionProposal::new(
            self.source.clone(),
            parts.saturating_sub(1),
            span.start,
            span.length,
            completion.proposal_type,
            completion.description.clone(),
        );
        if !self.proposals.contains(&proposal) {
            self.proposals.push(proposal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Join;
    impl Pass for Join {
        fn run(&self, captures: &[Term]) -> Vec<Term> {
            let words: Vec<String> = captures
                .iter()
                .filter_map(|t| t.literal_str().map(str::to_string))
                .collect();
            vec![Term::literal(words.join("+"))]
        }
    }

    struct Decline;
    impl Pass for Decline {
        fn run(&self, _: &[Term]) -> Vec<Term> {
            Vec::new()
        }
    }

    fn words(text: &str) -> Vec<Term> {
        let mut position = 0;
        text.split(' ')
            .map(|w| {
                let term = Term::literal(w).with_span(Span::new(position, w.len()));
                position += w.len() + 1;
                term
            })
            .collect()
    }

    #[test]
    fn captures_and_spans() {
        let mut terms = words("mail from Alice today");
        let mut matcher = PatternMatcher::new(&mut terms, &["from", "%1"]).unwrap();
        assert_eq!(matcher.capture_count(), 1);
        assert_eq!(matcher.run_pass(&Join), 1);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[1], Term::literal("Alice"));
        assert_eq!(terms[1].span(), Span::new(5, 10));
    }

    #[test]
    fn keywords_ignore_case_and_match_entirely() {
        let mut terms = words("FROM fromage");
        let mut matcher = PatternMatcher::new(&mut terms, &["from|to", "%1"]).unwrap();
        matcher.run_pass(&Join);
        assert_eq!(terms, vec![Term::literal("fromage")]);
    }

    #[test]
    fn wildcard_stops_at_next_part() {
        let mut terms = words("related to a b , c");
        let mut matcher = PatternMatcher::new(&mut terms, &["related", "to", "...", ","]).unwrap();
        matcher.run_pass(&Join);
        assert_eq!(terms, vec![Term::literal("a+b"), Term::literal("c")]);
    }

    #[test]
    fn trailing_wildcard_takes_the_rest() {
        let mut terms = words("x related to a b");
        let mut matcher = PatternMatcher::new(&mut terms, &["related", "to", "..."]).unwrap();
        matcher.run_pass(&Join);
        assert_eq!(terms, vec![Term::literal("x"), Term::literal("a+b")]);
    }

    #[test]
    fn declined_matches_leave_terms_alone() {
        let mut terms = words("from a from b");
        let mut matcher = PatternMatcher::new(&mut terms, &["from", "%1"]).unwrap();
        assert_eq!(matcher.run_pass(&Decline), 0);
        assert_eq!(terms.len(), 4);
    }

    #[test]
    fn partial_match_proposes_completion() {
        let mut terms = words("mails sent");
        let matcher = PatternMatcher::new(&mut terms, &["sent", "by", "%1"]).unwrap();
        let mut matcher = matcher.with_completion(10, ProposalType::Contact, "Sender");
        matcher.run_pass(&Join);
        let proposals = matcher.into_proposals();
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].last_matched_part(), 0);
        assert_eq!(proposals[0].remaining(), &["by".to_string(), "%1".to_string()]);
        assert_eq!(proposals[0].proposal_type(), ProposalType::Contact);
    }

    #[test]
    fn bad_regex_is_an_error() {
        let mut terms = Vec::new();
        assert!(PatternMatcher::new(&mut terms, &["("]).is_err());
        assert!(PatternMatcher::new(&mut terms, &[]).is_err());
    }
}
