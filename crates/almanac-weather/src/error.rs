//! Error types for the archive client, the averager and the record store.

use almanac_core::{
    AppError, DatabaseError, NetworkError, ReqwestErrorExt, RusqliteErrorExt,
    WeatherError as AppWeatherError,
};
use chrono::NaiveDate;
use thiserror::Error;

/// Daily arrays in an archive response did not line up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("daily arrays differ in length: time={time}, max={max}, min={min}")]
pub struct MisalignedSeries {
    pub time: usize,
    pub max: usize,
    pub min: usize,
}

/// Failure talking to the historical weather archive.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(reqwest::Error),

    #[error("Archive returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse archive response: {0}")]
    Parse(String),

    #[error("Malformed archive response: {0}")]
    Misaligned(#[from] MisalignedSeries),

    #[error("Start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e)
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Parse(e.to_string())
    }
}

/// Historical averaging found nothing to average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AverageError {
    #[error("No samples match {month:02}-{day:02}")]
    NoMatch { month: u32, day: u32 },
}

/// Record store failure. A cache miss is not an error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store task failed: {0}")]
    Task(String),
}

/// Failures while wiring up a coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("Record store unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Archive client unavailable: {0}")]
    Transport(#[from] TransportError),
}

impl From<TransportError> for AppError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => AppError::Network(NetworkError::Timeout),
            TransportError::Request(e) => AppError::Network(e.into_network_error()),
            TransportError::Status { status, body } => {
                AppError::Network(NetworkError::ServerError {
                    status,
                    message: body,
                })
            }
            TransportError::Parse(msg) => AppError::Network(NetworkError::InvalidResponse(msg)),
            TransportError::Misaligned(m) => {
                AppError::Network(NetworkError::InvalidResponse(m.to_string()))
            }
            e @ TransportError::InvalidRange { .. } => {
                AppError::Weather(AppWeatherError::NoApiData(e.to_string()))
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Sqlite(e) => AppError::Database(e.into_database_error()),
            StoreError::Task(msg) => AppError::Database(DatabaseError::QueryFailed(msg)),
        }
    }
}

impl From<CoordinatorError> for AppError {
    fn from(e: CoordinatorError) -> Self {
        match e {
            CoordinatorError::Store(e) => e.into(),
            CoordinatorError::Transport(e) => e.into(),
        }
    }
}
