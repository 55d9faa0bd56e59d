use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalcError {
    /// The request itself is unusable, e.g. no expressions at all.
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Can't recognize expression shortcut {shortcut}")]
    UnrecognizedExpression { shortcut: String },

    /// Anything raised by the data store, passed through untouched.
    #[error(transparent)]
    DataStore(#[from] duckdb::Error),

    #[error("Fetched row has {found} columns, column plan needs {expected}")]
    MalformedRow { expected: usize, found: usize },

    #[error("Backfill failed: {message}")]
    Backfill { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Database connection lock is poisoned")]
    ConnectionPoisoned,
}

impl CalcError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_message_names_shortcut() {
        let err = CalcError::UnrecognizedExpression {
            shortcut: "totally_unknown_xyz".into(),
        };
        assert!(err.to_string().contains("totally_unknown_xyz"));
    }

    #[test]
    fn test_invalid_request_message() {
        let err = CalcError::invalid_request("provide at least one expression to calculate");
        assert_eq!(
            err.to_string(),
            "Invalid request: provide at least one expression to calculate"
        );
    }
}
