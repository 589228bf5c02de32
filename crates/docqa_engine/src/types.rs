use std::fmt;

use serde::Deserialize;

pub type RequestId = u64;

/// Success body of `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadReceipt {
    pub filename: String,
    pub message: String,
}

/// A page reference as sent by the backend: usually a number, sometimes a label.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PageValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageValue::Integer(n) => write!(f, "{n}"),
            PageValue::Float(n) => write!(f, "{n}"),
            PageValue::Text(text) => f.write_str(text),
        }
    }
}

/// Success body of `POST /query`. Missing or null lists are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub answer: String,
    pub sources: Vec<String>,
    pub pages: Vec<PageValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    UploadCompleted {
        request_id: RequestId,
        result: Result<UploadReceipt, ApiError>,
    },
    QueryCompleted {
        request_id: RequestId,
        result: Result<Answer, ApiError>,
    },
    /// `Ok` carries the backend's confirmation message.
    DocumentRemoved {
        request_id: RequestId,
        result: Result<String, ApiError>,
    },
    HealthChecked {
        result: Result<String, ApiError>,
    },
}

/// Failure of a backend exchange. `message` is the human-readable detail shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: FailureKind,
    pub message: String,
}

impl ApiError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "request cancelled")
    }

    /// The text rendered after the failure marker.
    pub fn detail(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidOrigin,
    HttpStatus(u16),
    Timeout,
    Network,
    MalformedResponse,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidOrigin => write!(f, "invalid origin"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}
