//! Error types for the trapwatch console

use std::{error::Error as StdError, fmt};

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the operator console
#[derive(Debug)]
pub enum Error {
    /// Required local input was missing or malformed; never reaches the network
    Validation {
        /// Field that failed validation
        field: String,
        /// Validation error message
        message: String,
    },

    /// The control API answered with a non-2xx status
    Api {
        /// HTTP status code
        status: u16,
        /// Raw response body text
        body: String,
    },

    /// Transport-level failure before any HTTP status was produced
    Network {
        /// Error message
        message: String,
    },

    /// Response body could not be decoded
    Serialization(serde_json::Error),

    /// Console configuration error
    Configuration {
        /// Error message
        message: String,
    },

    /// One or more required parallel reads failed during a refresh
    PartialData {
        /// Names of the required sources that failed
        sources: Vec<String>,
        /// Detail of the first failure
        detail: String,
    },
}

impl Error {
    /// Create a new validation error
    #[must_use]
    pub fn validation<F: Into<String>, S: Into<String>>(field: F, message: S) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new API error from a status code and response body
    #[must_use]
    pub fn api<S: Into<String>>(status: u16, body: S) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a new network error
    #[must_use]
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    #[must_use]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a new partial-data error
    #[must_use]
    pub fn partial_data<S: Into<String>>(sources: Vec<String>, detail: S) -> Self {
        Self::PartialData {
            sources,
            detail: detail.into(),
        }
    }

    /// Whether this error came from a local validation check
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation { field, message } => {
                write!(f, "Validation error: {field} - {message}")
            }
            Self::Api { status, body } => write!(f, "API error {status}: {body}"),
            Self::Network { message } => write!(f, "Network error: {message}"),
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
            Self::Configuration { message } => write!(f, "Configuration error: {message}"),
            Self::PartialData { sources, detail } => {
                write!(
                    f,
                    "Refresh failed for required sources [{}]: {detail}",
                    sources.join(", ")
                )
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
#[allow(clippy::uninlined_format_args)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as StdError;

    #[test]
    fn test_validation_error() {
        let error = Error::validation("ip", "Field is required");
        assert_eq!(
            format!("{}", error),
            "Validation error: ip - Field is required"
        );
        assert!(error.is_validation());
    }

    #[test]
    fn test_api_error_contains_status_and_body() {
        let error = Error::api(403, "Unauthorized: Invalid or missing API key");
        let display = format!("{}", error);
        assert!(display.contains("403"));
        assert!(display.contains("Unauthorized: Invalid or missing API key"));
        assert!(!error.is_validation());
    }

    #[test]
    fn test_network_error() {
        let error = Error::network("connection refused");
        assert_eq!(format!("{}", error), "Network error: connection refused");
    }

    #[test]
    fn test_configuration_error() {
        let error = Error::configuration("endpoint must not be empty");
        assert_eq!(
            format!("{}", error),
            "Configuration error: endpoint must not be empty"
        );
    }

    #[test]
    fn test_partial_data_error_names_sources() {
        let error = Error::partial_data(
            vec!["analytics".to_string(), "bans".to_string()],
            "API error 500: boom",
        );
        let display = format!("{}", error);
        assert!(display.contains("analytics"));
        assert!(display.contains("bans"));
        assert!(display.contains("boom"));
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid").unwrap_err();
        let error = Error::from(json_error);

        match error {
            Error::Serialization(_) => {}
            _ => panic!("Expected Serialization error variant"),
        }

        assert!(format!("{}", error).contains("Serialization error"));
    }

    #[test]
    fn test_error_source() {
        let json_error = serde_json::from_str::<i32>("notanumber").unwrap_err();
        let error = Error::from(json_error);
        assert!(error.source().is_some());

        let error = Error::network("timed out");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_error_debug_formatting() {
        let error = Error::api(500, "internal");
        let debug_str = format!("{:?}", error);
        assert!(debug_str.contains("Api"));
        assert!(debug_str.contains("500"));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<u32> {
            Ok(42)
        }

        fn returns_error() -> Result<u32> {
            Err(Error::network("down"))
        }

        assert!(returns_result().is_ok());
        assert!(returns_error().is_err());
    }
}
