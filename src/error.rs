//! Error types for keytempo

use thiserror::Error;

/// Result type alias using keytempo's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong outside the typing engine itself.
/// The engine is infallible; errors come from the collaborators around it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server responded with {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Text provider returned an empty text")]
    EmptyText,

    #[error("Embedded word list {0} is missing")]
    MissingWordList(String),

    #[error("No statistics recorded for user {0}")]
    NoStatistics(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Result log error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Short, user-facing message for toast notifications.
    pub fn short_message(&self) -> String {
        match self {
            Error::Network(_) => "server unreachable".to_string(),
            Error::Http { status, .. } => format!("server error ({status})"),
            Error::EmptyText => "empty text".to_string(),
            Error::MissingWordList(_) => "no word list for this language".to_string(),
            Error::NoStatistics(_) => "no statistics yet".to_string(),
            Error::Io(_) | Error::Csv(_) => "local storage error".to_string(),
            Error::Serialization(_) => "malformed response".to_string(),
            Error::Config(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_display_includes_status_and_body() {
        let err = Error::Http {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Server responded with 500: boom");
        assert_eq!(err.short_message(), "server error (500)");
    }

    #[test]
    fn missing_word_list_names_the_file() {
        let err = Error::MissingWordList("de.txt".to_string());
        assert_eq!(err.to_string(), "Embedded word list de.txt is missing");
        assert_eq!(err.short_message(), "no word list for this language");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.short_message(), "local storage error");
    }
}
