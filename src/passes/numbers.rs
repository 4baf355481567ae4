use crate::matcher::Pass;
use crate::settings::ParserSettings;
use crate::term::Term;

/// Digit strings and spelled numbers become integer literals.
pub struct Numbers<'a> {
    pub settings: &'a ParserSettings,
}

impl Pass for Numbers<'_> {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let Some(text) = captures.first().and_then(Term::literal_str) else {
            return Vec::new();
        };
        let value = if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            text.parse::<i64>().ok()
        } else {
            self.settings.number_from_word(text)
        };
        match value {
            Some(value) => vec![Term::literal(value)],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_and_words() {
        let settings = ParserSettings::default();
        let pass = Numbers { settings: &settings };
        assert_eq!(pass.run(&[Term::literal("2013")]), vec![Term::literal(2013)]);
        assert_eq!(pass.run(&[Term::literal("Three")]), vec![Term::literal(3)]);
        assert_eq!(pass.run(&[Term::literal("fourth")]), vec![Term::literal(4)]);
        assert!(pass.run(&[Term::literal("12a")]).is_empty());
        assert!(pass.run(&[Term::literal("99999999999999999999")]).is_empty());
    }
}
