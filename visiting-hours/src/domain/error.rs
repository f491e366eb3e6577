//! Configuration error types.
//!
//! These errors are raised while building the schedule index. A
//! `VisitingHours` is never constructed from a configuration that produced
//! one of them.

use super::{InvalidDate, TimeError};

/// Errors raised while validating and indexing a schedule configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An override entry has no `date`
    #[error("special hours entry {position} is missing its date")]
    MissingDate { position: usize },

    /// An override `date` is not a valid "DD/MM" day
    #[error("invalid special date {value:?}: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: InvalidDate,
    },

    /// An opening or closing time is not a valid "HH:MM" time
    #[error("invalid opening time {value:?}: {source}")]
    InvalidTime {
        value: String,
        #[source]
        source: TimeError,
    },

    /// A weekly schedule key is not a weekday name
    #[error("unknown weekday {0:?}")]
    UnknownWeekday(String),

    /// The default time zone is not a known IANA zone
    #[error("unknown time zone {0:?}")]
    UnknownZone(String),

    /// The configuration document could not be decoded
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}
