//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for biastrader.
#[derive(Debug, thiserror::Error)]
pub enum BiastraderError {
    #[error("price series is empty")]
    EmptySeries,

    #[error("malformed row at line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("insufficient window: have {points} points, need {minimum}")]
    InsufficientWindow { points: usize, minimum: usize },

    #[error("date {date} not found in series")]
    DateNotFound { date: NaiveDate },

    #[error("day index {index} out of range for series of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no trading days between {start} and {end}")]
    EmptyRange { start: NaiveDate, end: NaiveDate },

    #[error("data source unavailable: {reason}")]
    DataSourceUnavailable { reason: String },

    #[error("unexpected response schema: {reason}")]
    UnexpectedSchema { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&BiastraderError> for std::process::ExitCode {
    fn from(err: &BiastraderError) -> Self {
        let code: u8 = match err {
            BiastraderError::Io(_) => 1,
            BiastraderError::ConfigParse { .. }
            | BiastraderError::ConfigMissing { .. }
            | BiastraderError::ConfigInvalid { .. } => 2,
            BiastraderError::DataSourceUnavailable { .. }
            | BiastraderError::UnexpectedSchema { .. } => 3,
            BiastraderError::EmptySeries | BiastraderError::MalformedRow { .. } => 4,
            BiastraderError::InsufficientWindow { .. }
            | BiastraderError::DateNotFound { .. }
            | BiastraderError::IndexOutOfRange { .. }
            | BiastraderError::EmptyRange { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
