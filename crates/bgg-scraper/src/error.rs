use thiserror::Error;

/// An expected structural element is missing or unparsable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("No element matches {0}")]
    Missing(String),
    #[error("Couldn't parse {what} from {text:?}")]
    Unparsable { what: &'static str, text: String },
    #[error("Couldn't parse XML document: {0}")]
    Document(String),
    #[error("Invalid XPath {xpath}: {reason}")]
    XPath { xpath: String, reason: String },
    #[error("Found {identities} entry anchors but {ranks} rank cells")]
    LengthMismatch { identities: usize, ranks: usize },
}

/// A field invariant is violated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be a positive integer, got {value}")]
    NotPositive { field: &'static str, value: i64 },
    #[error("{field} must be a non-negative number, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("year_published cannot be later than {current}, got {value}")]
    FutureYear { value: i64, current: i64 },
    #[error("max_players ({max}) must be greater than or equal to min_players ({min})")]
    PlayerRange { min: i64, max: i64 },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotPositive { field, .. }
            | Self::Negative { field, .. }
            | Self::Empty { field } => *field,
            Self::FutureYear { .. } => "year_published",
            Self::PlayerRange { .. } => "max_players",
        }
    }
}

/// Why a page or document produced no record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
