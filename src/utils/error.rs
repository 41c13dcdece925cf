use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Connection error: {message}")]
    ConnectionError { message: String },

    #[error("Query execution error: {message}")]
    QueryExecutionError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Connection,
    Query,
    System,
}

impl ReportError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::QueryExecutionError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. } => ErrorCategory::Configuration,
            Self::ConnectionError { .. } => ErrorCategory::Connection,
            Self::QueryExecutionError { .. } | Self::SerializationError(_) => ErrorCategory::Query,
            // transport failures surface while talking to the warehouse
            Self::HttpError(_) => ErrorCategory::Connection,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    /// One line suitable for the console, without the variant prefix noise.
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ConfigurationError { message } => format!("Invalid configuration: {}", message),
            Self::ConnectionError { message } => format!("Could not connect to BigQuery: {}", message),
            Self::QueryExecutionError { message } => format!("Query failed: {}", message),
            Self::HttpError(e) => format!("Network error while talking to BigQuery: {}", e),
            Self::IoError(e) => format!("I/O error: {}", e),
            Self::SerializationError(e) => format!("Unexpected response format: {}", e),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Configuration => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
