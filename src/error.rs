//! The library error surface: one `thiserror` enum covering the domain's
//! failure kinds, plus a crate-wide `Result` alias.

use chrono::NaiveDate;
use thiserror::Error;

/// Crate-wide result type used across the library surface.
pub type Result<T> = std::result::Result<T, Error>;

/// The domain error kinds used throughout `periodiq`.
#[derive(Debug, Error)]
pub enum Error {
    /// A remote or stored payload did not match the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Fetching data from the Hevy API failed at the protocol level.
    #[error("remote fetch failed: {0}")]
    RemoteFetch(String),

    /// A new or edited plan overlaps an existing plan's date range.
    #[error("plan overlaps '{name}' ({start}..={end})")]
    PlanOverlap {
        name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// No data was available to satisfy the request.
    #[error("no data")]
    NoData,

    /// A plan failed name/date validation.
    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    /// An error originating from the SQLite storage layer.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// An error originating from the HTTP client.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
