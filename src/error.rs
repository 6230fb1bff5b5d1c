use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid date: {message}")]
    Date { message: String },

    #[error("PubMed request failed: {message}")]
    Network { message: String },

    #[error("Could not write {path}: {message}")]
    Write { path: String, message: String },
}

impl LookupError {
    pub fn config(message: impl Into<String>) -> Self {
        LookupError::Config { message: message.into() }
    }

    pub fn date(message: impl Into<String>) -> Self {
        LookupError::Date { message: message.into() }
    }

    pub fn network(message: impl Into<String>) -> Self {
        LookupError::Network { message: message.into() }
    }

    pub fn write(path: impl Into<String>, message: impl Into<String>) -> Self {
        LookupError::Write { path: path.into(), message: message.into() }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        LookupError::network(format!("transport error: {}", err))
    }
}

impl From<quick_xml::de::DeError> for LookupError {
    fn from(err: quick_xml::de::DeError) -> Self {
        LookupError::network(format!("malformed XML response: {}", err))
    }
}

/// Non-fatal conditions collected during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupWarning {
    EmptyResult { journal: String },
}

impl std::fmt::Display for LookupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupWarning::EmptyResult { journal } => {
                write!(f, "no papers matched the query for journal \"{}\"", journal)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, LookupError>;
