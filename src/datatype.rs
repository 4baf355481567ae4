// used for timestamps and calendar arithmetic
use chrono::{Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};

// used for the period <-> date:// host name mapping
use bimap::BiMap;
use lazy_static::lazy_static;

// used to print out readable forms of a literal
use std::fmt;
// used to indicate that literals need to be hashable
use std::hash::{Hash, Hasher};

use crate::vocabulary::{xsd, Uri};

// ------------- Period -------------
/// Calendar periods, ordered from the coarsest to the finest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Period {
    Year,
    Month,
    Week,
    DayOfWeek,
    Day,
    Hour,
    Minute,
    Second,
}

lazy_static! {
    static ref PERIOD_NAMES: BiMap<Period, &'static str> = {
        let mut names = BiMap::new();
        names.insert(Period::Year, "year");
        names.insert(Period::Month, "month");
        names.insert(Period::Week, "week");
        names.insert(Period::DayOfWeek, "dayofweek");
        names.insert(Period::Day, "day");
        names.insert(Period::Hour, "hour");
        names.insert(Period::Minute, "minute");
        names.insert(Period::Second, "second");
        names
    };
}

impl Period {
    pub const ALL: [Period; 8] = [
        Period::Year,
        Period::Month,
        Period::Week,
        Period::DayOfWeek,
        Period::Day,
        Period::Hour,
        Period::Minute,
        Period::Second,
    ];
    pub fn index(self) -> usize {
        self as usize
    }
    /// The host name used in `date://` identifiers.
    pub fn name(self) -> &'static str {
        PERIOD_NAMES.get_by_left(&self).copied().unwrap_or("day")
    }
    pub fn from_name(name: &str) -> Option<Period> {
        PERIOD_NAMES.get_by_right(name).copied()
    }
    /// Advances `from` by one unit of this period, or leaves it alone at
    /// the end of the representable range.
    pub fn advance(self, from: NaiveDateTime) -> NaiveDateTime {
        let advanced = match self {
            Period::Year => from.checked_add_months(Months::new(12)),
            Period::Month => from.checked_add_months(Months::new(1)),
            Period::Week => from.checked_add_signed(Duration::days(7)),
            Period::DayOfWeek | Period::Day => from.checked_add_signed(Duration::days(1)),
            Period::Hour => from.checked_add_signed(Duration::hours(1)),
            Period::Minute => from.checked_add_signed(Duration::minutes(1)),
            Period::Second => from.checked_add_signed(Duration::seconds(1)),
        };
        advanced.unwrap_or(from)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ------------- Moment -------------
/// A point in time together with how precisely it was specified.
/// "June 5, 2013" is a moment with day granularity, so equality against it
/// means "some time during that day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Moment {
    pub instant: NaiveDateTime,
    pub granularity: Period,
}

impl Moment {
    pub fn new(instant: NaiveDateTime, granularity: Period) -> Self {
        Self { instant, granularity }
    }
    pub fn exact(instant: NaiveDateTime) -> Self {
        Self::new(instant, Period::Second)
    }
    pub fn on_day(date: NaiveDate) -> Self {
        Self::new(date.and_time(NaiveTime::MIN), Period::Day)
    }
    /// The half-open interval `[instant, instant + one granularity unit)`.
    pub fn interval(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.instant, self.granularity.advance(self.instant))
    }
}

impl fmt::Display for Moment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instant.format(DATE_TIME_FORMAT))
    }
}

pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn parse_date_time(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

// ------------- LiteralType -------------
/// Scalar kinds a property can have as its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralType {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
}

impl LiteralType {
    pub fn data_type(self) -> Uri {
        match self {
            LiteralType::String => xsd::STRING,
            LiteralType::Integer => xsd::LONG,
            LiteralType::Double => xsd::DOUBLE,
            LiteralType::Boolean => xsd::BOOLEAN,
            LiteralType::DateTime => xsd::DATE_TIME,
        }
    }
    pub fn from_data_type(uri: &Uri) -> Option<LiteralType> {
        let t = if *uri == xsd::STRING {
            LiteralType::String
        } else if *uri == xsd::LONG || *uri == xsd::INT || *uri == xsd::INTEGER {
            LiteralType::Integer
        } else if *uri == xsd::DOUBLE || *uri == xsd::FLOAT || *uri == xsd::DECIMAL {
            LiteralType::Double
        } else if *uri == xsd::BOOLEAN {
            LiteralType::Boolean
        } else if *uri == xsd::DATE_TIME {
            LiteralType::DateTime
        } else {
            return None;
        };
        Some(t)
    }
}

// ------------- LiteralValue -------------
#[derive(Debug, Clone)]
pub enum LiteralValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(Moment),
}

impl LiteralValue {
    pub fn literal_type(&self) -> LiteralType {
        match self {
            LiteralValue::String(_) => LiteralType::String,
            LiteralValue::Integer(_) => LiteralType::Integer,
            LiteralValue::Double(_) => LiteralType::Double,
            LiteralValue::Boolean(_) => LiteralType::Boolean,
            LiteralValue::DateTime(_) => LiteralType::DateTime,
        }
    }
    pub fn data_type(&self) -> Uri {
        self.literal_type().data_type()
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LiteralValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_moment(&self) -> Option<Moment> {
        match self {
            LiteralValue::DateTime(m) => Some(*m),
            _ => None,
        }
    }
    pub fn is_string(&self) -> bool {
        matches!(self, LiteralValue::String(_))
    }
    pub fn is_numeric(&self) -> bool {
        matches!(self, LiteralValue::Integer(_) | LiteralValue::Double(_))
    }
    /// Reads a literal from its lexical form and an xsd datatype. Unknown
    /// datatypes fall back to a plain string.
    pub fn from_lexical(text: &str, data_type: Option<&Uri>) -> Option<LiteralValue> {
        let literal_type = data_type
            .and_then(LiteralType::from_data_type)
            .unwrap_or(LiteralType::String);
        let value = match literal_type {
            LiteralType::String => LiteralValue::String(text.to_string()),
            LiteralType::Integer => LiteralValue::Integer(text.trim().parse().ok()?),
            LiteralType::Double => LiteralValue::Double(text.trim().parse().ok()?),
            LiteralType::Boolean => match text.trim() {
                "true" | "1" => LiteralValue::Boolean(true),
                "false" | "0" => LiteralValue::Boolean(false),
                _ => return None,
            },
            LiteralType::DateTime => LiteralValue::DateTime(Moment::exact(parse_date_time(text)?)),
        };
        Some(value)
    }
    /// The literal in N3 notation, typed unless it is a plain string.
    pub fn to_n3(&self) -> String {
        match self {
            LiteralValue::String(s) => format!("\"{}\"", escape_n3(s)),
            other => format!("\"{}\"^^{}", other, other.data_type().to_n3()),
        }
    }
}

pub(crate) fn escape_n3(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escapes the metacharacters of XPath regular expressions, the dialect of
/// the SPARQL `REGEX` function. Other characters must stay unescaped there.
pub(crate) fn escape_regex(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '|' | '.' | '?' | '*' | '+' | '(' | ')' | '{' | '}' | '[' | ']' | '^' | '$') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// doubles are compared by their bit patterns so that literals stay usable as keys
impl PartialEq for LiteralValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LiteralValue::String(a), LiteralValue::String(b)) => a == b,
            (LiteralValue::Integer(a), LiteralValue::Integer(b)) => a == b,
            (LiteralValue::Double(a), LiteralValue::Double(b)) => a.to_bits() == b.to_bits(),
            (LiteralValue::Boolean(a), LiteralValue::Boolean(b)) => a == b,
            (LiteralValue::DateTime(a), LiteralValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}
impl Eq for LiteralValue {}

impl Hash for LiteralValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            LiteralValue::String(s) => s.hash(state),
            LiteralValue::Integer(i) => i.hash(state),
            LiteralValue::Double(d) => d.to_bits().hash(state),
            LiteralValue::Boolean(b) => b.hash(state),
            LiteralValue::DateTime(m) => m.hash(state),
        }
    }
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::String(s) => write!(f, "{}", s),
            LiteralValue::Integer(i) => write!(f, "{}", i),
            LiteralValue::Double(d) => write!(f, "{}", d),
            LiteralValue::Boolean(b) => write!(f, "{}", b),
            LiteralValue::DateTime(m) => write!(f, "{}", m),
        }
    }
}

impl From<&str> for LiteralValue {
    fn from(s: &str) -> Self {
        LiteralValue::String(s.to_string())
    }
}
impl From<String> for LiteralValue {
    fn from(s: String) -> Self {
        LiteralValue::String(s)
    }
}
impl From<i64> for LiteralValue {
    fn from(i: i64) -> Self {
        LiteralValue::Integer(i)
    }
}
impl From<i32> for LiteralValue {
    fn from(i: i32) -> Self {
        LiteralValue::Integer(i as i64)
    }
}
impl From<f64> for LiteralValue {
    fn from(d: f64) -> Self {
        LiteralValue::Double(d)
    }
}
impl From<bool> for LiteralValue {
    fn from(b: bool) -> Self {
        LiteralValue::Boolean(b)
    }
}
impl From<Moment> for LiteralValue {
    fn from(m: Moment) -> Self {
        LiteralValue::DateTime(m)
    }
}
