//! Locale settings of the natural language parser.
//!
//! Defaults are English. A settings file (any format the `config` crate
//! understands) may override single keys, and environment variables prefixed
//! with `DESKQUERY_` override the file, e.g. `DESKQUERY_OR_KEYWORD=oder`.

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::datatype::Period;
use crate::error::Result;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ParserSettings {
    /// Characters that always form a token of their own.
    pub separators: String,
    pub and_keyword: String,
    pub or_keyword: String,
    pub not_keyword: String,
    /// Locales writing words without spaces keep short literals.
    pub words_separated_by_spaces: bool,
    /// Plain words this short or shorter are dropped as stop words.
    pub stop_word_length: usize,
    /// Twelve entries, `|`-separated spellings per month.
    pub month_names: Vec<String>,
    /// Seven entries starting on Monday.
    pub weekday_names: Vec<String>,
    /// Eight entries in calendar period order, year to second.
    pub period_names: Vec<String>,
    /// Spelled numbers, the value being the position in the list.
    pub number_words: Vec<String>,
    /// Ordinal words, the value being the position in the list plus one.
    pub ordinal_words: Vec<String>,
    /// Relative width of the window put around bare numbers.
    pub numeric_window: f64,
}

impl Default for ParserSettings {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            separators: ",;:!?()[]{}<>=#+-".to_string(),
            and_keyword: "and".to_string(),
            or_keyword: "or".to_string(),
            not_keyword: "not".to_string(),
            words_separated_by_spaces: true,
            stop_word_length: 2,
            month_names: strings(&[
                "january|jan",
                "february|feb",
                "march|mar",
                "april|apr",
                "may",
                "june|jun",
                "july|jul",
                "august|aug",
                "september|sep|sept",
                "october|oct",
                "november|nov",
                "december|dec",
            ]),
            weekday_names: strings(&[
                "monday|mon",
                "tuesday|tue",
                "wednesday|wed",
                "thursday|thu",
                "friday|fri",
                "saturday|sat",
                "sunday|sun",
            ]),
            period_names: strings(&[
                "year|years",
                "month|months",
                "week|weeks",
                "",
                "day|days",
                "hour|hours",
                "minute|minutes|min|mins",
                "second|seconds|sec|secs",
            ]),
            number_words: strings(&[
                "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
                "twelve",
            ]),
            // "second" is left out, it names a period as well
            ordinal_words: strings(&[
                "", "", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth", "eleventh",
                "twelfth",
            ]),
            numeric_window: 0.2,
        }
    }
}

impl ParserSettings {
    /// Reads settings from `path`, then from `DESKQUERY_*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("DESKQUERY"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Reads settings from an inline JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::from_str(json, FileFormat::Json))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn is_separator(&self, c: char) -> bool {
        self.separators.contains(c)
    }

    pub(crate) fn month_from_name(&self, name: &str) -> Option<i64> {
        position_in(&self.month_names, name).map(|i| i as i64 + 1)
    }

    pub(crate) fn weekday_from_name(&self, name: &str) -> Option<i64> {
        position_in(&self.weekday_names, name).map(|i| i as i64 + 1)
    }

    pub(crate) fn period_from_name(&self, name: &str) -> Option<Period> {
        position_in(&self.period_names, name).and_then(|i| Period::ALL.get(i).copied())
    }

    pub(crate) fn is_operator(&self, word: &str) -> bool {
        let word = word.to_lowercase();
        word == self.and_keyword || word == self.or_keyword || word == self.not_keyword
    }

    pub(crate) fn number_from_word(&self, word: &str) -> Option<i64> {
        position_in(&self.number_words, word)
            .map(|i| i as i64)
            .or_else(|| position_in(&self.ordinal_words, word).map(|i| i as i64 + 1))
    }
}

fn position_in(entries: &[String], word: &str) -> Option<usize> {
    let word = word.to_lowercase();
    if word.is_empty() {
        return None;
    }
    entries
        .iter()
        .position(|entry| entry.split('|').any(|spelling| spelling == word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_defaults() {
        let settings = ParserSettings::default();
        assert_eq!(settings.month_from_name("June"), Some(6));
        assert_eq!(settings.month_from_name("sept"), Some(9));
        assert_eq!(settings.weekday_from_name("sunday"), Some(7));
        assert_eq!(settings.number_from_word("twelve"), Some(12));
        assert_eq!(settings.number_from_word("third"), Some(3));
        assert_eq!(settings.number_from_word("second"), None);
        assert_eq!(settings.period_from_name("Weeks"), Some(Period::Week));
        assert_eq!(settings.period_from_name("mins"), Some(Period::Minute));
        assert!(settings.is_operator("OR"));
        assert!(settings.is_separator('#'));
        assert!(!settings.is_separator('.'));
    }

    #[test]
    fn json_overrides_single_keys() {
        let settings = ParserSettings::from_json(r#"{ "or_keyword": "oder", "stop_word_length": 1 }"#)
            .expect("settings ok");
        assert_eq!(settings.or_keyword, "oder");
        assert_eq!(settings.stop_word_length, 1);
        assert_eq!(settings.and_keyword, "and");
        assert_eq!(settings.month_names.len(), 12);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = ParserSettings::load("no/such/deskquery-settings").expect("settings ok");
        assert_eq!(settings.or_keyword, ParserSettings::default().or_keyword);
    }
}
