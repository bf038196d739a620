//! Request, response, and error types shared by every backend
//! implementation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::VisitKey;

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Classified cause of a failed persistence call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Network,
    NotFound,
    Server,
    Parse,
    Timeout,
    Aborted,
    Unknown,
}

impl TransportKind {
    /// Classify an HTTP status code. Status 0 is the no-connection signal.
    pub fn from_status(status: u16) -> Self {
        match status {
            0 => Self::Network,
            404 => Self::NotFound,
            408 => Self::Timeout,
            500..=599 => Self::Server,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::NotFound => "not found",
            Self::Server => "server",
            Self::Parse => "parse",
            Self::Timeout => "timeout",
            Self::Aborted => "aborted",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A failed persistence call, classified and carrying whatever opaque
/// payload the backend returned.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    pub kind: TransportKind,
    /// HTTP status, when the failure came with one.
    pub status: Option<u16>,
    pub message: String,
    /// Opaque error body from the backend, if any.
    pub payload: Option<serde_json::Value>,
}

impl TransportError {
    pub fn new(kind: TransportKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            payload: None,
        }
    }

    /// Build an error classified from an HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: TransportKind::from_status(status),
            status: Some(status),
            message: message.into(),
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

// ---------------------------------------------------------------------------
// Requests and responses
// ---------------------------------------------------------------------------

/// Everything the backend returns when a visit is opened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedVisit {
    /// Persisted plan rows in wire form; empty when nothing is persisted.
    #[serde(default)]
    pub plan_wire: String,
    /// Persisted detail rows in wire form.
    #[serde(default)]
    pub detail_wire: String,
    /// Filenames of attachments already persisted for the visit.
    #[serde(default)]
    pub attachment_names: Vec<String>,
}

/// A plan-batch save: the accepted rows in wire form plus the staged
/// attachment batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavePlanRequest {
    pub key: VisitKey,
    pub plan_wire: String,
    pub attachment_names: Vec<String>,
}

/// A detail-batch save: the popup's accepted plan rows and detail rows,
/// both in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDetailRequest {
    pub key: VisitKey,
    pub plan_wire: String,
    pub detail_wire: String,
}
