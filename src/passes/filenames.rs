use crate::datatype::escape_regex;
use crate::matcher::Pass;
use crate::term::{Comparator, Term};
use crate::vocabulary::nfo;

/// Words that look like file names (`report.odt`, `*.png`) are matched
/// against the file name property, globs as anchored regular expressions.
pub struct FileNames;

impl Pass for FileNames {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let Some(term) = captures.first() else {
            return Vec::new();
        };
        let Some(value) = term.literal_str() else {
            return Vec::new();
        };
        if !value.contains('.') {
            return Vec::new();
        }
        let comparison = if value.contains('*') || value.contains('?') {
            let pattern = escape_regex(value).replace(r"\*", ".*").replace(r"\?", ".");
            Term::compare(
                Some(nfo::FILE_NAME),
                Term::literal(format!("^{}$", pattern)).with_span(term.span()),
                Comparator::Regexp,
            )
        } else {
            Term::compare(Some(nfo::FILE_NAME), term.clone(), Comparator::Contains)
        };
        vec![comparison.with_span(term.span())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn globs_become_anchored_patterns() {
        let result = FileNames.run(&[Term::literal("*.tar.?z")]);
        let comparison = result[0].as_comparison().unwrap();
        assert_eq!(comparison.comparator, Comparator::Regexp);
        assert_eq!(comparison.sub_term, Term::literal(r"^.*\.tar\..z$"));
    }

    #[test]
    fn glob_punctuation_stays_unescaped() {
        let result = FileNames.run(&[Term::literal("a&b#~*.txt")]);
        let comparison = result[0].as_comparison().unwrap();
        assert_eq!(comparison.sub_term, Term::literal(r"^a&b#~.*\.txt$"));
    }

    #[test]
    fn plain_names_are_contained() {
        let result = FileNames.run(&[Term::literal("notes.txt")]);
        assert_eq!(
            result,
            vec![Term::compare(Some(nfo::FILE_NAME), Term::literal("notes.txt"), Comparator::Contains)]
        );
        assert!(FileNames.run(&[Term::literal("notes")]).is_empty());
    }
}
