use axum::http::StatusCode;
use std::error::Error;
use std::fmt;

/// Failures raised by the tracking core.
///
/// Storage failures are logged where they happen and never reach a client;
/// the in-memory state stays authoritative.
#[derive(Debug)]
pub enum TrackerError {
    InvalidGoal(String),
    InvalidAmount(String),
    InvalidWindow(usize),
    DuplicateId(String),
    StorageRead(String),
    StorageWrite(String),
    SensorUnavailable,
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGoal(message) => write!(f, "invalid goal: {message}"),
            Self::InvalidAmount(message) => write!(f, "invalid amount: {message}"),
            Self::InvalidWindow(days) => write!(f, "invalid window: {days} days"),
            Self::DuplicateId(id) => write!(f, "entry id {id} is already in the log"),
            Self::StorageRead(message) => write!(f, "storage read failed: {message}"),
            Self::StorageWrite(message) => write!(f, "storage write failed: {message}"),
            Self::SensorUnavailable => write!(f, "pedometer unavailable"),
        }
    }
}

impl Error for TrackerError {}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        Self::StorageRead(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<TrackerError> for AppError {
    fn from(err: TrackerError) -> Self {
        let status = match err {
            TrackerError::InvalidGoal(_)
            | TrackerError::InvalidAmount(_)
            | TrackerError::InvalidWindow(_) => StatusCode::BAD_REQUEST,
            TrackerError::SensorUnavailable | TrackerError::DuplicateId(_) => StatusCode::CONFLICT,
            TrackerError::StorageRead(_) | TrackerError::StorageWrite(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
