use thiserror::Error;

/// Errors raised while extracting a transaction from an alert email
///
/// Most of them never reach the caller of [`crate::Engine::parse_message`]:
/// an error inside a single template attempt only means "this template did not match".
#[derive(Debug, Error)]
pub enum ExtractError {
    // wrappers

    /// wraps regex::Error (bad pattern in a template definition)
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    /// wraps base64::DecodeError
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
    /// wraps csv::Error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// wraps serde_json::Error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// wraps std::io::Error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // logical errors

    /// captured amount is not a finite number
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// captured date text matches none of the known formats
    #[error("invalid date: {0}")]
    InvalidDate(String),
    /// table cells of an iterate-mode template could not be paired
    #[error("malformed table: {0}")]
    MalformedTable(String),
    /// a catalog row carries a pattern that does not compile
    #[error("template '{template}': {source}")]
    TemplatePattern {
        template: String,
        source: regex::Error,
    },
    /// two templates in one catalog share a name
    #[error("duplicate template name: {0}")]
    DuplicateTemplate(String),
    /// mandatory field absent when building the transaction
    #[error("missing field: {0}")]
    MissingField(&'static str),
}
