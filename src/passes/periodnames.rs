use crate::matcher::Pass;
use crate::passes::date_field;
use crate::settings::ParserSettings;
use crate::term::Term;

/// Month and weekday names become absolute calendar fields.
pub struct PeriodNames<'a> {
    pub settings: &'a ParserSettings,
}

impl Pass for PeriodNames<'_> {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let Some(word) = captures.first().and_then(Term::literal_str) else {
            return Vec::new();
        };
        if let Some(month) = self.settings.month_from_name(word) {
            vec![date_field("month", false, month)]
        } else if let Some(weekday) = self.settings.weekday_from_name(word) {
            vec![date_field("dayofweek", false, weekday)]
        } else {
            Vec::new()
        }
    }
}
