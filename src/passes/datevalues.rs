use crate::datatype::Period;
use crate::matcher::Pass;
use crate::passes::{date_field, date_field_value, integer_value};
use crate::term::Term;

/// Absolute date and time values. The capture slots are fixed:
/// `%1` year, `%2` month, `%3` day, `%4` day of week, `%5` hour,
/// `%6` minute and `%7` second.
pub struct DateValues {
    /// Hours are afternoon hours.
    pub pm: bool,
    /// `%2` may be a plain number instead of a month name.
    pub numeric_months: bool,
}

impl DateValues {
    fn field(&self, period: Period, term: &Term) -> Option<Term> {
        let in_range = |min: i64, max: i64| integer_value(term).filter(|v| (min..=max).contains(v));
        let value = match period {
            Period::Year => in_range(1000, 9999)?,
            Period::Month if self.numeric_months => in_range(1, 12)?,
            Period::Month => date_field_value(term, "month").filter(|v| (1..=12).contains(v))?,
            Period::Week => return None,
            Period::DayOfWeek => date_field_value(term, "dayofweek")?,
            Period::Day => in_range(1, 31)?,
            Period::Hour if self.pm => match in_range(0, 12)? {
                12 => 12,
                hour => hour + 12,
            },
            Period::Hour => in_range(0, 23)?,
            Period::Minute | Period::Second => in_range(0, 59)?,
        };
        Some(date_field(period.name(), false, value).with_span(term.span()))
    }
}

const SLOT_PERIODS: [Period; 7] = [
    Period::Year,
    Period::Month,
    Period::Day,
    Period::DayOfWeek,
    Period::Hour,
    Period::Minute,
    Period::Second,
];

impl Pass for DateValues {
    fn run(&self, captures: &[Term]) -> Vec<Term> {
        let mut fields = Vec::new();
        for (slot, term) in captures.iter().take(SLOT_PERIODS.len()).enumerate() {
            if !term.is_valid() {
                continue;
            }
            match self.field(SLOT_PERIODS[slot], term) {
                Some(field) => fields.push(field),
                None => return Vec::new(),
            }
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named() -> DateValues {
        DateValues {
            pm: false,
            numeric_months: false,
        }
    }

    #[test]
    fn month_name_and_day() {
        let captures = [Term::invalid(), date_field("month", false, 6), Term::literal(5)];
        assert_eq!(
            named().run(&captures),
            vec![date_field("month", false, 6), date_field("day", false, 5)]
        );
        let too_late = [Term::invalid(), date_field("month", false, 6), Term::literal(32)];
        assert!(named().run(&too_late).is_empty());
    }

    #[test]
    fn years_have_four_digits() {
        assert_eq!(named().run(&[Term::literal(2013)]), vec![date_field("year", false, 2013)]);
        assert!(named().run(&[Term::literal(13)]).is_empty());
    }

    #[test]
    fn numeric_months_need_the_flag() {
        let captures = [Term::literal(2013), Term::literal(6), Term::literal(5)];
        assert!(named().run(&captures).is_empty());
        let numeric = DateValues {
            pm: false,
            numeric_months: true,
        };
        assert_eq!(numeric.run(&captures).len(), 3);
    }

    #[test]
    fn afternoon_hours() {
        let pm = DateValues {
            pm: true,
            numeric_months: false,
        };
        let hour = |h: i64| {
            let mut captures = vec![Term::invalid(); 4];
            captures.push(Term::literal(h));
            captures
        };
        assert_eq!(pm.run(&hour(3)), vec![date_field("hour", false, 15)]);
        assert_eq!(pm.run(&hour(12)), vec![date_field("hour", false, 12)]);
        assert!(pm.run(&hour(15)).is_empty());
    }
}
