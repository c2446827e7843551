use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("No bill date could be located in {0} document text")]
    MissingDate(&'static str),

    #[error("Document could not be decoded: {0}")]
    Decode(String),

    #[error("Matched text is not a parseable number: {0:?}")]
    MalformedNumeric(String),

    #[error("Unknown bill source type: {0:?}")]
    UnknownSourceType(String),

    #[error("Invalid field pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[cfg(feature = "remote")]
    #[error("Production API request failed: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
