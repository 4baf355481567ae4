use crate::datatype::Period;
use crate::matcher::Pass;
use crate::passes::{date_field, integer_value};
use crate::settings::ParserSettings;
use crate::term::Term;

/// How the number attached to a period is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodValue {
    /// "third week", "first day"
    Value,
    /// "in 2 days", "next month"
    Offset,
    /// "3 days ago"
    InvertedOffset,
}

/// Relative and ordinal periods: `%1` is a period word ("week", "days") and
/// `%2`, when the pattern has it, an integer. Patterns without `%2` use the
/// fixed `value`, patterns without `%1` the fixed `period`.
pub struct DatePeriods<'a> {
    pub settings: &'a ParserSettings,
    pub period: Option<Period>,
    pub kind: PeriodValue,
    pub value: i64,
}

impl Pass for DatePeriods<'_> {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let period = match self.period {
            Some(period) => Some(period),
            None => captures
                .first()
                .and_then(Term::literal_str)
                .and_then(|word| self.settings.period_from_name(word)),
        };
        let Some(period) = period else {
            return Vec::new();
        };
        let value = match captures.get(1) {
            Some(term) => match integer_value(term) {
                Some(value) => value,
                None => return Vec::new(),
            },
            None => self.value,
        };
        let field = match self.kind {
            PeriodValue::Value => date_field(period.name(), false, value),
            PeriodValue::Offset => date_field(period.name(), true, value),
            PeriodValue::InvertedOffset => date_field(period.name(), true, -value),
        };
        vec![field]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pass(settings: &ParserSettings, period: Option<Period>, kind: PeriodValue, value: i64) -> DatePeriods<'_> {
        DatePeriods {
            settings,
            period,
            kind,
            value,
        }
    }

    #[test]
    fn ago_inverts_the_offset() {
        let settings = ParserSettings::default();
        let ago = pass(&settings, None, PeriodValue::InvertedOffset, 0);
        assert_eq!(
            ago.run(&[Term::literal("days"), Term::literal(3)]),
            vec![date_field("day", true, -3)]
        );
        assert!(ago.run(&[Term::literal("days"), Term::literal("few")]).is_empty());
        assert!(ago.run(&[Term::literal("apples"), Term::literal(3)]).is_empty());
    }

    #[test]
    fn fixed_periods_and_values() {
        let settings = ParserSettings::default();
        let tomorrow = pass(&settings, Some(Period::Day), PeriodValue::Offset, 1);
        assert_eq!(tomorrow.run(&[]), vec![date_field("day", true, 1)]);
        let last_of = pass(&settings, None, PeriodValue::Value, -1);
        assert_eq!(last_of.run(&[Term::literal("week")]), vec![date_field("week", false, -1)]);
    }
}
