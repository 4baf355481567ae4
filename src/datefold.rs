//! Folding of partial calendar fields into date-time literals.
//!
//! The date passes leave comparisons against `date://<period>/<value|offset>`
//! in the term list, one per field the user mentioned ("June" is an absolute
//! month, "3 days ago" a relative day). Consecutive fields are collected into
//! a [`DateTimeSpec`] and replaced by a single [`Moment`] literal whose
//! granularity is the finest field that was given.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use tracing::debug;

use crate::datatype::{LiteralValue, Moment, Period};
use crate::settings::ParserSettings;
use crate::term::{Span, Term};
use crate::vocabulary::DATE_SCHEME;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldFlag {
    #[default]
    Unset,
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Field {
    pub value: i64,
    pub flag: FieldFlag,
}

/// One slot per [`Period`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeSpec {
    fields: [Field; 8],
}

impl DateTimeSpec {
    pub fn set(&mut self, period: Period, flag: FieldFlag, value: i64) {
        self.fields[period.index()] = Field { value, flag };
    }
    pub fn field(&self, period: Period) -> Field {
        self.fields[period.index()]
    }
    fn is_set(&self, period: Period) -> bool {
        self.field(period).flag != FieldFlag::Unset
    }
    fn is_absolute(&self, period: Period) -> bool {
        self.field(period).flag == FieldFlag::Absolute
    }
    fn is_empty(&self) -> bool {
        !Period::ALL.iter().any(|p| self.is_set(*p))
    }

    // Unset fields take the current value when they lie within the precision
    // the user gave, the null value otherwise. Relative fields start from the
    // current value and are applied as deltas later on.
    fn value(&self, period: Period, in_defined_period: bool, now: i64, null: i64) -> i64 {
        let field = self.field(period);
        match field.flag {
            FieldFlag::Unset if in_defined_period => now,
            FieldFlag::Unset => null,
            FieldFlag::Absolute => field.value,
            FieldFlag::Relative => now,
        }
    }

    /// Builds the moment described by the fields, relative to `now`.
    pub fn build(&self, now: NaiveDateTime) -> Moment {
        let last_date = [Period::Day, Period::DayOfWeek, Period::Week, Period::Month, Period::Year]
            .into_iter()
            .find(|p| self.is_set(*p))
            .unwrap_or(Period::Day);
        let last_time = [Period::Second, Period::Minute, Period::Hour]
            .into_iter()
            .find(|p| self.is_set(*p));
        let in_date = |p: Period| p <= last_date;
        let in_time = |p: Period| last_time.is_some_and(|lt| p <= lt);
        let today = now.date();

        let year = self.value(Period::Year, in_date(Period::Year), today.year() as i64, 1);
        let mut date = if self.is_set(Period::Month) {
            let month = self.value(Period::Month, in_date(Period::Month), today.month() as i64, 1);
            let day = self.value(Period::Day, in_date(Period::Day), today.day() as i64, 1);
            ymd_clamped(year, month, day).unwrap_or(today)
        } else {
            let ordinal = self.value(Period::Day, in_date(Period::Day), today.ordinal() as i64, 1);
            yo_clamped(year, ordinal).unwrap_or(today)
        };

        if self.is_set(Period::Week) || self.is_set(Period::DayOfWeek) {
            let (iso_year, week) = if self.is_absolute(Period::Week) {
                let week = self.field(Period::Week).value;
                let monday = if self.is_set(Period::Month) {
                    week_of_month(date, week)
                } else {
                    week_of_year(year, week)
                };
                let iso = monday.unwrap_or(date).iso_week();
                (iso.year(), iso.week())
            } else if self.is_absolute(Period::Year) {
                (clamp_year(year), today.iso_week().week())
            } else {
                let iso = today.iso_week();
                (iso.year(), iso.week())
            };
            let current = today.weekday().number_from_monday() as i64;
            let mut weekday = self.value(Period::DayOfWeek, in_date(Period::DayOfWeek), current, 1);
            if weekday < 0 {
                weekday += 8;
            }
            date = iso_date(iso_year, week, weekday).unwrap_or(date);
        }

        // relative fields
        for period in [Period::Year, Period::Month, Period::Week, Period::DayOfWeek, Period::Day] {
            let field = self.field(period);
            if field.flag != FieldFlag::Relative {
                continue;
            }
            date = match period {
                Period::Year => add_months(date, field.value.saturating_mul(12)),
                Period::Month => add_months(date, field.value),
                Period::Week => shift_days(date, field.value.saturating_mul(7)),
                _ => shift_days(date, field.value),
            };
        }

        let hour = self.value(Period::Hour, in_time(Period::Hour), now.hour() as i64, 0);
        let minute = self.value(Period::Minute, in_time(Period::Minute), now.minute() as i64, 0);
        let second = self.value(Period::Second, in_time(Period::Second), now.second() as i64, 0);
        let time = NaiveTime::from_hms_opt(
            hour.clamp(0, 23) as u32,
            minute.clamp(0, 59) as u32,
            second.clamp(0, 59) as u32,
        )
        .unwrap_or(NaiveTime::MIN);
        let mut instant = date.and_time(time);
        let mut delta = 0;
        for (period, seconds) in [(Period::Hour, 3600), (Period::Minute, 60), (Period::Second, 1)] {
            let field = self.field(period);
            if field.flag == FieldFlag::Relative {
                delta += field.value.saturating_mul(seconds);
            }
        }
        instant = Duration::try_seconds(delta)
            .and_then(|d| instant.checked_add_signed(d))
            .unwrap_or(instant);

        let granularity = last_time.map_or(last_date, |lt| lt.max(last_date));
        Moment::new(instant, granularity)
    }
}

fn clamp_year(year: i64) -> i32 {
    year.clamp(1, 9999) as i32
}

fn days_in_month(year: i32, month: u32) -> i64 {
    let first = NaiveDate::from_ymd_opt(year, month, 1);
    let next = first.and_then(|d| d.checked_add_months(Months::new(1)));
    match (first, next) {
        (Some(first), Some(next)) => (next - first).num_days(),
        _ => 31,
    }
}

// Negative days and months count from the end, -1 being the last.
fn ymd_clamped(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let year = clamp_year(year);
    let month = if month < 0 { 13 + month } else { month }.clamp(1, 12) as u32;
    let last = days_in_month(year, month);
    let day = if day < 0 { last + 1 + day } else { day }.clamp(1, last) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn yo_clamped(year: i64, ordinal: i64) -> Option<NaiveDate> {
    let year = clamp_year(year);
    let days = NaiveDate::from_ymd_opt(year, 12, 31)?.ordinal() as i64;
    let ordinal = if ordinal < 0 { days + 1 + ordinal } else { ordinal };
    NaiveDate::from_yo_opt(year, ordinal.clamp(1, days) as u32)
}

fn weeks_in_year(year: i32) -> i64 {
    // December 28th always lies in the last ISO week
    NaiveDate::from_ymd_opt(year, 12, 28)
        .map(|d| d.iso_week().week() as i64)
        .unwrap_or(52)
}

fn week_of_year(year: i64, week: i64) -> Option<NaiveDate> {
    let year = clamp_year(year);
    let weeks = weeks_in_year(year);
    let week = if week < 0 { weeks + 1 + week } else { week }.clamp(1, weeks);
    NaiveDate::from_isoywd_opt(year, week as u32, Weekday::Mon)
}

// Monday of the n-th week of the month `date` lies in, counting from the
// week of the first day. Negative weeks count back from the week of the
// last day.
fn week_of_month(date: NaiveDate, week: i64) -> Option<NaiveDate> {
    let monday_of = |d: NaiveDate| shift_days(d, -(d.weekday().num_days_from_monday() as i64));
    if week < 0 {
        let last = ymd_clamped(date.year() as i64, date.month() as i64, -1)?;
        Some(shift_days(monday_of(last), week.saturating_add(1).saturating_mul(7)))
    } else {
        let first = date.with_day(1)?;
        Some(shift_days(monday_of(first), (week.max(1) - 1).saturating_mul(7)))
    }
}

fn iso_date(year: i32, week: u32, weekday: i64) -> Option<NaiveDate> {
    let week = (week as i64).clamp(1, weeks_in_year(year)) as u32;
    let weekday = match weekday.clamp(1, 7) {
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        6 => Weekday::Sat,
        _ => Weekday::Sun,
    };
    NaiveDate::from_isoywd_opt(year, week, weekday)
}

fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|d| date.checked_add_signed(d))
        .unwrap_or(date)
}

fn add_months(date: NaiveDate, months: i64) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months.min(u32::MAX as i64) as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs().min(u32::MAX as u64) as u32))
    };
    shifted.unwrap_or(date)
}

/// The period and field of a `date://` comparison term.
fn date_field(term: &Term) -> Option<(Period, FieldFlag, i64)> {
    let comparison = term.as_comparison()?;
    let property = comparison.property.as_ref()?;
    if property.scheme() != Some(DATE_SCHEME) {
        return None;
    }
    let period = Period::from_name(property.host()?)?;
    let value = comparison.sub_term.as_literal()?.as_integer()?;
    let flag = if property.path() == "/offset" {
        FieldFlag::Relative
    } else {
        FieldFlag::Absolute
    };
    Some((period, flag, value))
}

// Filler words between two date fields ("third week of june") do not end a date.
fn is_filler(term: &Term, settings: &ParserSettings) -> bool {
    match term.literal_str() {
        Some(text) => {
            let length = text.chars().count();
            let separator = text.chars().all(|c| settings.is_separator(c));
            !settings.is_operator(text) && (length == 2 || (length == 1 && !separator))
        }
        None => false,
    }
}

/// Replaces every run of date field comparisons by one date-time literal.
pub fn fold_dates(terms: Vec<Term>, now: NaiveDateTime, settings: &ParserSettings) -> Vec<Term> {
    let mut folded = Vec::with_capacity(terms.len());
    let mut spec = DateTimeSpec::default();
    let mut span = Span::default();
    let mut pending_filler = Vec::new();

    let flush = |spec: &mut DateTimeSpec, span: &mut Span, folded: &mut Vec<Term>| {
        let moment = spec.build(now);
        debug!(instant = %moment, granularity = %moment.granularity, "folded date");
        folded.push(Term::literal(LiteralValue::DateTime(moment)).with_span(*span));
        *spec = DateTimeSpec::default();
        *span = Span::default();
    };

    for term in terms {
        if let Some((period, flag, value)) = date_field(&term) {
            spec.set(period, flag, value);
            span = span.union(term.span());
            pending_filler.clear();
            continue;
        }
        if !spec.is_empty() {
            if is_filler(&term, settings) {
                pending_filler.push(term);
                continue;
            }
            flush(&mut spec, &mut span, &mut folded);
        }
        // filler that did not lead to another date field stays
        folded.append(&mut pending_filler);
        folded.push(term);
    }
    if !spec.is_empty() {
        flush(&mut spec, &mut span, &mut folded);
    }
    folded.append(&mut pending_filler);
    folded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> NaiveDateTime {
        // a Wednesday
        NaiveDate::from_ymd_opt(2013, 6, 5).unwrap().and_hms_opt(10, 20, 30).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn absolute_date() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::Year, FieldFlag::Absolute, 2012);
        spec.set(Period::Month, FieldFlag::Absolute, 2);
        spec.set(Period::Day, FieldFlag::Absolute, 30);
        let moment = spec.build(now());
        assert_eq!(moment.instant, day(2012, 2, 29).and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(moment.granularity, Period::Day);
    }

    #[test]
    fn month_alone_is_first_of_month_this_year() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::Month, FieldFlag::Absolute, 1);
        let moment = spec.build(now());
        assert_eq!(moment.instant.date(), day(2013, 1, 1));
        assert_eq!(moment.granularity, Period::Month);
    }

    #[test]
    fn relative_days_and_months() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::Day, FieldFlag::Relative, -3);
        assert_eq!(spec.build(now()).instant.date(), day(2013, 6, 2));

        let mut spec = DateTimeSpec::default();
        spec.set(Period::Month, FieldFlag::Relative, -1);
        let moment = spec.build(now());
        assert_eq!(moment.instant.date(), day(2013, 5, 1));
        assert_eq!(moment.granularity, Period::Month);
    }

    #[test]
    fn next_week_starts_on_monday() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::Week, FieldFlag::Relative, 1);
        let moment = spec.build(now());
        assert_eq!(moment.instant.date(), day(2013, 6, 10));
        assert_eq!(moment.granularity, Period::Week);
    }

    #[test]
    fn weekday_in_current_week() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::DayOfWeek, FieldFlag::Absolute, 5);
        let moment = spec.build(now());
        assert_eq!(moment.instant.date(), day(2013, 6, 7));
        assert_eq!(moment.granularity, Period::DayOfWeek);
    }

    #[test]
    fn week_of_month_and_last_day() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::Week, FieldFlag::Absolute, 3);
        spec.set(Period::Month, FieldFlag::Absolute, 6);
        assert_eq!(spec.build(now()).instant.date(), day(2013, 6, 10));

        let mut spec = DateTimeSpec::default();
        spec.set(Period::Day, FieldFlag::Absolute, -1);
        spec.set(Period::Month, FieldFlag::Absolute, 2);
        assert_eq!(spec.build(now()).instant.date(), day(2013, 2, 28));
    }

    #[test]
    fn day_without_month_counts_from_new_year() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::Day, FieldFlag::Absolute, 5);
        let moment = spec.build(now());
        assert_eq!(moment.instant.date(), day(2013, 1, 5));
        assert_eq!(moment.granularity, Period::Day);

        let mut spec = DateTimeSpec::default();
        spec.set(Period::Day, FieldFlag::Absolute, -1);
        assert_eq!(spec.build(now()).instant.date(), day(2013, 12, 31));
    }

    #[test]
    fn time_of_day_today() {
        let mut spec = DateTimeSpec::default();
        spec.set(Period::Hour, FieldFlag::Absolute, 17);
        let moment = spec.build(now());
        assert_eq!(moment.instant, day(2013, 6, 5).and_hms_opt(17, 0, 0).unwrap());
        assert_eq!(moment.granularity, Period::Hour);

        let mut spec = DateTimeSpec::default();
        spec.set(Period::Hour, FieldFlag::Relative, -2);
        let moment = spec.build(now());
        assert_eq!(moment.instant, day(2013, 6, 5).and_hms_opt(8, 0, 0).unwrap());
    }

    #[test]
    fn fold_keeps_other_terms_in_place() {
        let field = |period: &str, value: i64| {
            Term::compare(
                Some(crate::vocabulary::Uri::new(format!("date://{}/value", period))),
                Term::literal(value),
                crate::term::Comparator::Equal,
            )
        };
        let terms = vec![
            Term::literal("before"),
            field("month", 6),
            Term::literal("of"),
            field("year", 2013),
            Term::literal("report"),
        ];
        let folded = fold_dates(terms, now(), &ParserSettings::default());
        assert_eq!(folded.len(), 3);
        assert_eq!(folded[0], Term::literal("before"));
        let moment = folded[1].as_literal().and_then(LiteralValue::as_moment).unwrap();
        assert_eq!(moment.instant.date(), day(2013, 6, 1));
        assert_eq!(folded[2], Term::literal("report"));
    }
}
