use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        line: Option<usize>,
        col: Option<usize>,
    },

    #[error("Pattern error: {0}")]
    Pattern(String),
}

pub type Result<T> = std::result::Result<T, QueryError>;

impl QueryError {
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
            line: None,
            col: None,
        }
    }
}

impl From<config::ConfigError> for QueryError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<regex::Error> for QueryError {
    fn from(e: regex::Error) -> Self {
        Self::Pattern(e.to_string())
    }
}

impl From<pest::error::Error<crate::serializer::Rule>> for QueryError {
    fn from(e: pest::error::Error<crate::serializer::Rule>) -> Self {
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((l, c)) => (l, c),
            pest::error::LineColLocation::Span((l, c), _) => (l, c),
        };
        Self::Serialization {
            message: e.variant.message().to_string(),
            line: Some(line),
            col: Some(col),
        }
    }
}
