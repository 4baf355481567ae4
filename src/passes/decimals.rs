use crate::matcher::Pass;
use crate::passes::integer_value;
use crate::term::Term;

// an f64 keeps about fifteen significant digits
const MAX_DECIMALS: usize = 12;

/// `%1 . %2` over two integers: the integer and the decimal part of a number.
pub struct DecimalValues;

impl Pass for DecimalValues {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let (Some(integer), Some(decimals)) = (
            captures.first().and_then(integer_value),
            captures.get(1).and_then(integer_value),
        ) else {
            return Vec::new();
        };
        // the token length keeps leading zeros, "2.05" has two decimals
        let digits = match captures[1].length() {
            0 => decimals.to_string().len(),
            length => length,
        };
        if digits > MAX_DECIMALS {
            return Vec::new();
        }
        let value = integer as f64 + decimals as f64 / 10f64.powi(digits as i32);
        vec![Term::literal(value)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Span;

    #[test]
    fn leading_zeros_count() {
        let result = DecimalValues.run(&[Term::literal(2), Term::literal(625).with_span(Span::new(2, 4))]);
        assert_eq!(result, vec![Term::literal(2.0625)]);
        assert_eq!(DecimalValues.run(&[Term::literal(1), Term::literal(5)]), vec![Term::literal(1.5)]);
    }

    #[test]
    fn declines_non_integers_and_long_fractions() {
        assert!(DecimalValues.run(&[Term::literal("a"), Term::literal(5)]).is_empty());
        let long = Term::literal(1).with_span(Span::new(2, 13));
        assert!(DecimalValues.run(&[Term::literal(1), long]).is_empty());
    }
}
