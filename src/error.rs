//! Error types for covid-cases
//!
//! This module provides the error taxonomy for the whole fetch/decode/report pipeline:
//! - Fetch-stage errors (timeout, rate limit, generic remote failure)
//! - Decode-stage errors (base64, persistence, CSV structure, field conversion)
//! - Query-stage errors (unknown country)
//! - Machine-readable error codes and process exit status mapping

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for covid-cases operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for covid-cases
///
/// Every fetch- and decode-stage variant is fatal for a run: the three datasets are
/// treated as one unit, so a single failure invalidates the whole invocation.
/// [`Error::CountryNotFound`] is the only condition a caller may recover from.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "remote.timeout")
        key: Option<String>,
    },

    /// The remote host did not answer within the fetch timeout
    #[error("timed out fetching {dataset} after {}s", timeout.as_secs())]
    RemoteTimeout {
        /// Dataset file name that was being fetched
        dataset: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// The remote host refused the request because the rate limit was hit
    #[error("hit rate limit fetching {dataset}{}", reset_hint(reset_at))]
    RateLimited {
        /// Dataset file name that was being fetched
        dataset: String,
        /// When the quota resets, if the host reported it
        reset_at: Option<DateTime<Utc>>,
    },

    /// Any other failure reported by the remote transport
    #[error("cannot get {dataset}: {reason}")]
    Remote {
        /// Dataset file name that was being fetched
        dataset: String,
        /// HTTP status, if a response was received
        status: Option<u16>,
        /// What went wrong
        reason: String,
    },

    /// The transport-level encoding (base64) could not be decoded
    #[error("cannot decode {dataset}: {reason}")]
    Decode {
        /// Dataset file name
        dataset: String,
        /// What went wrong
        reason: String,
    },

    /// Writing the raw payload to disk failed
    #[error("cannot persist {}: {source}", path.display())]
    Persistence {
        /// Destination file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The payload is not a well-formed delimited table
    #[error("cannot read csv data for {dataset}: {reason}")]
    Parse {
        /// Dataset file name
        dataset: String,
        /// What went wrong
        reason: String,
    },

    /// A numeric cell could not be converted
    #[error("cannot convert number in {dataset} at row {row}, column {column}: {value:?} ({reason})")]
    FieldParse {
        /// Dataset file name
        dataset: String,
        /// 1-based data row (the header is row 0)
        row: usize,
        /// 0-based column index
        column: usize,
        /// The raw cell content
        value: String,
        /// Parser message
        reason: String,
    },

    /// The requested country does not appear in a dataset
    #[error("Country {0} is not in the list")]
    CountryNotFound(String),

    /// A pipeline task panicked or was cancelled
    #[error("pipeline task failed: {0}")]
    TaskFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error outside a dataset fetch (e.g. building the HTTP client)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn reset_hint(reset_at: &Option<DateTime<Utc>>) -> String {
    match reset_at {
        Some(at) => format!(" (resets at {})", at.format("%Y-%m-%d %H:%M:%S UTC")),
        None => String::new(),
    }
}

impl Error {
    /// Shorthand for a [`Error::Config`] bound to a key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Whether this error must terminate the run
    ///
    /// Only [`Error::CountryNotFound`] is recoverable at the query boundary.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::CountryNotFound(_))
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::RemoteTimeout { .. } => "remote_timeout",
            Error::RateLimited { .. } => "rate_limited",
            Error::Remote { .. } => "remote_error",
            Error::Decode { .. } => "decode_error",
            Error::Persistence { .. } => "persistence_error",
            Error::Parse { .. } => "parse_error",
            Error::FieldParse { .. } => "field_parse_error",
            Error::CountryNotFound(_) => "country_not_found",
            Error::TaskFailed(_) => "task_failed",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
        }
    }

    /// Process exit status for this error (never zero)
    pub fn exit_code(&self) -> u8 {
        match self {
            // 1 - unknown country and generic failures
            Error::CountryNotFound(_) | Error::TaskFailed(_) | Error::Io(_) => 1,

            // 2 - bad invocation or configuration
            Error::Config { .. } => 2,

            // 3 - remote side
            Error::RemoteTimeout { .. }
            | Error::RateLimited { .. }
            | Error::Remote { .. }
            | Error::Network(_) => 3,

            // 4 - payload could not be turned into a dataset
            Error::Decode { .. }
            | Error::Parse { .. }
            | Error::FieldParse { .. }
            | Error::Serialization(_) => 4,

            // 5 - local disk
            Error::Persistence { .. } => 5,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Returns (Error, expected_exit_code, expected_error_code) for every variant
    /// that can be built without a live transport.
    fn all_error_variants() -> Vec<(Error, u8, &'static str)> {
        vec![
            (Error::config("remote.timeout", "must be > 0"), 2, "config_error"),
            (
                Error::RemoteTimeout {
                    dataset: "dead.csv".into(),
                    timeout: Duration::from_secs(10),
                },
                3,
                "remote_timeout",
            ),
            (
                Error::RateLimited {
                    dataset: "dead.csv".into(),
                    reset_at: None,
                },
                3,
                "rate_limited",
            ),
            (
                Error::Remote {
                    dataset: "dead.csv".into(),
                    status: Some(500),
                    reason: "server error".into(),
                },
                3,
                "remote_error",
            ),
            (
                Error::Decode {
                    dataset: "dead.csv".into(),
                    reason: "invalid byte".into(),
                },
                4,
                "decode_error",
            ),
            (
                Error::Persistence {
                    path: PathBuf::from("/tmp/x.csv"),
                    source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
                },
                5,
                "persistence_error",
            ),
            (
                Error::Parse {
                    dataset: "dead.csv".into(),
                    reason: "unequal lengths".into(),
                },
                4,
                "parse_error",
            ),
            (
                Error::FieldParse {
                    dataset: "dead.csv".into(),
                    row: 3,
                    column: 7,
                    value: "x".into(),
                    reason: "invalid digit".into(),
                },
                4,
                "field_parse_error",
            ),
            (Error::CountryNotFound("Atlantis".into()), 1, "country_not_found"),
            (Error::TaskFailed("panicked".into()), 1, "task_failed"),
            (
                Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone")),
                1,
                "io_error",
            ),
        ]
    }

    #[test]
    fn every_variant_maps_to_expected_codes() {
        for (error, exit, code) in all_error_variants() {
            assert_eq!(error.exit_code(), exit, "exit code for {error:?}");
            assert_eq!(error.error_code(), code, "error code for {error:?}");
            assert_ne!(error.exit_code(), 0, "{error:?} must not exit with success");
        }
    }

    #[test]
    fn only_country_not_found_is_recoverable() {
        for (error, _, _) in all_error_variants() {
            let expected = !matches!(error, Error::CountryNotFound(_));
            assert_eq!(error.is_fatal(), expected, "fatality of {error:?}");
        }
    }

    #[test]
    fn rate_limit_message_includes_reset_time_when_known() {
        let reset_at = Utc.with_ymd_and_hms(2020, 4, 1, 12, 30, 0).unwrap();
        let err = Error::RateLimited {
            dataset: "confirmed.csv".into(),
            reset_at: Some(reset_at),
        };
        assert_eq!(
            err.to_string(),
            "hit rate limit fetching confirmed.csv (resets at 2020-04-01 12:30:00 UTC)"
        );

        let err = Error::RateLimited {
            dataset: "confirmed.csv".into(),
            reset_at: None,
        };
        assert_eq!(err.to_string(), "hit rate limit fetching confirmed.csv");
    }

    #[test]
    fn field_parse_message_points_at_the_cell() {
        let err = Error::FieldParse {
            dataset: "deaths.csv".into(),
            row: 2,
            column: 5,
            value: "1O".into(),
            reason: "invalid digit found in string".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 2"), "{msg}");
        assert!(msg.contains("column 5"), "{msg}");
        assert!(msg.contains("\"1O\""), "{msg}");
    }
}
