use crate::matcher::Pass;
use crate::settings::ParserSettings;
use crate::term::{Comparator, Term};

/// Comparator keywords ("greater than", "before", "<") bind the value after
/// them into a comparison whose property the property passes fill in later.
pub struct Comparators<'a> {
    pub settings: &'a ParserSettings,
    pub comparator: Comparator,
}

impl Pass for Comparators<'_> {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let Some(value) = captures.first().filter(|t| t.as_literal().is_some()) else {
            return Vec::new();
        };
        if let Some(text) = value.literal_str() {
            let separator = !text.is_empty() && text.chars().all(|c| self.settings.is_separator(c));
            if separator || self.settings.is_operator(text) {
                return Vec::new();
            }
        }
        vec![Term::compare(None, value.clone(), self.comparator)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binds_literals_only() {
        let settings = ParserSettings::default();
        let pass = Comparators {
            settings: &settings,
            comparator: Comparator::Greater,
        };
        assert_eq!(
            pass.run(&[Term::literal(2048)]),
            vec![Term::compare(None, Term::literal(2048), Comparator::Greater)]
        );
        assert!(pass.run(&[Term::literal("=")]).is_empty());
        assert!(pass.run(&[Term::literal("or")]).is_empty());
        assert!(pass.run(&[Term::resource_type(crate::vocabulary::nmo::MESSAGE)]).is_empty());
    }
}
