use lazy_static::lazy_static;
use regex::Regex;

use crate::matcher::Pass;
use crate::term::{Span, Term};

lazy_static! {
    static ref NUMBER_UNIT: Regex = Regex::new(r"^(\d+)(?:\.(\d+))?([A-Za-z]*)$").unwrap();
}

/// Splits glued tokens such as `2KB`, `2.5` or `1.5KB` into their parts so
/// the number passes can see them.
pub struct SplitUnits;

impl Pass for SplitUnits {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let Some(term) = captures.first() else {
            return Vec::new();
        };
        let Some(text) = term.literal_str() else {
            return Vec::new();
        };
        let Some(parts) = NUMBER_UNIT.captures(text) else {
            return Vec::new();
        };
        let decimals = parts.get(2).map(|m| m.as_str());
        let unit = &parts[3];
        if decimals.is_none() && unit.is_empty() {
            return Vec::new();
        }

        // matched texts are ASCII, byte lengths are character lengths
        let mut position = term.position();
        let mut piece = |text: &str| {
            let piece = Term::literal(text).with_span(Span::new(position, text.len()));
            position += text.len();
            piece
        };
        let mut terms = vec![piece(&parts[1])];
        if let Some(decimals) = decimals {
            terms.push(piece("."));
            terms.push(piece(decimals));
        }
        if !unit.is_empty() {
            terms.push(piece(unit));
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_is_split_from_number() {
        let terms = SplitUnits.run(&[Term::literal("2KiB").with_span(Span::new(7, 4))]);
        assert_eq!(terms, vec![Term::literal("2"), Term::literal("KiB")]);
        assert_eq!(terms[1].span(), Span::new(8, 3));
    }

    #[test]
    fn decimal_keeps_its_point() {
        let terms = SplitUnits.run(&[Term::literal("2.05")]);
        assert_eq!(terms.len(), 3);
        assert_eq!(terms[2].span(), Span::new(2, 2));
        assert!(SplitUnits.run(&[Term::literal("report")]).is_empty());
        assert!(SplitUnits.run(&[Term::literal(12)]).is_empty());
        assert!(SplitUnits.run(&[Term::literal("12")]).is_empty());
    }

    #[test]
    fn decimal_with_unit() {
        let terms = SplitUnits.run(&[Term::literal("1.5KB").with_span(Span::new(7, 5))]);
        assert_eq!(
            terms,
            vec![Term::literal("1"), Term::literal("."), Term::literal("5"), Term::literal("KB")]
        );
        assert_eq!(terms[3].span(), Span::new(10, 2));
    }
}
