//! Error types for the portfolio API client.
//!
//! # Design
//! Every failure the client can produce is a variant of `ApiError`, and its
//! `Display` text is the message a page shows in its notification. The first
//! three variants are the normalized network outcomes; the rest are raised on
//! the client side before anything is sent.

use thiserror::Error;

use crate::session::SessionError;

/// Fallback message for transport failures that carry no text of their own.
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Result of every `ApiClient` operation.
pub type ApiResult<T> = Result<T, ApiError>;

/// Coarse classification of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NetworkFailure,
    HttpStatusFailure,
    DecodeFailure,
    InvalidRequest,
    Session,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, refused
    /// connection, aborted read).
    #[error("{message}")]
    Network { message: String },

    /// The server answered with a non-2xx status. `message` is the server's
    /// `detail` field when it sent one.
    #[error("{message}")]
    HttpStatus { status: u16, message: String },

    /// A success body was not the JSON shape the operation expects.
    #[error("{message}")]
    Decode { message: String },

    /// The payload was rejected before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::NetworkFailure,
            ApiError::HttpStatus { .. } => ErrorKind::HttpStatusFailure,
            ApiError::Decode { .. } => ErrorKind::DecodeFailure,
            ApiError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            ApiError::Session(_) => ErrorKind::Session,
        }
    }

    /// HTTP status for `HttpStatus` failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// A stale or missing token surfaces as a 401 from the backend.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn decode(err: impl std::fmt::Display) -> Self {
        ApiError::Decode {
            message: err.to_string(),
        }
    }
}
