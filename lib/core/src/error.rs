use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Empty sample from source: {0}")]
    EmptySample(String),

    #[error("Schema mapping failed for {source_key}: {reason}")]
    MappingFailure { source_key: String, reason: String },

    #[error("Predicate translation failed for {source_key}: {reason}")]
    TranslationFailure { source_key: String, reason: String },

    #[error("Publish failed: {0}")]
    PublishFailure(String),

    #[error("Connector error ({source_key}): {message}")]
    Connector { source_key: String, message: String },

    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    #[error("Source not found: {0}")]
    SourceNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    pub fn connector(source_key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Connector {
            source_key: source_key.into(),
            message: message.into(),
        }
    }

    pub fn translation(source_key: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::TranslationFailure {
            source_key: source_key.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
