//! Error types for the Rollbar API client.
//!
//! # Design
//! Construction and argument problems surface before any request is issued
//! (`Configuration`, `Argument`). Everything that can go wrong on the wire is
//! folded into the remaining three variants by the transport adapter, so a
//! caller only ever inspects one `Result` per call. Only `Api` carries detail
//! supplied by the remote service.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RollbarError>;

/// Errors returned by the request builder, the transport adapter and
/// `RollbarClient` endpoint methods.
#[derive(Debug, Error)]
pub enum RollbarError {
    /// Required construction input is missing: access tokens, or the
    /// scheme/host needed to compose a URI.
    #[error("{0}")]
    Configuration(String),

    /// A caller-supplied argument has the wrong shape.
    #[error("{0}")]
    Argument(String),

    /// The request never produced an HTTP response.
    #[error("{0}")]
    Transport(TransportErrorKind),

    /// The response body was neither structured nor valid JSON.
    #[error("Invalid JSON response from server.")]
    Decoding(#[source] Option<serde_json::Error>),

    /// The service answered with a non-success status code.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl RollbarError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        RollbarError::Configuration(message.into())
    }

    pub(crate) fn argument(message: impl Into<String>) -> Self {
        RollbarError::Argument(message.into())
    }

    /// The remote error, if this is one.
    pub fn as_api_error(&self) -> Option<&ApiError> {
        match self {
            RollbarError::Api(err) => Some(err),
            _ => None,
        }
    }
}

/// Classification of transport-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportErrorKind::Timeout => write!(f, "Request timed out."),
            TransportErrorKind::Other => write!(f, "Request error."),
        }
    }
}

/// An error reported by the Rollbar API itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub status_code: u16,
    pub status_message: String,
}

impl ApiError {
    pub const NAME: &'static str = "RollbarAPIError";

    pub fn new(message: impl Into<String>, status_code: u16, status_message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            status_message: status_message.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        Self::NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_messages_are_fixed() {
        let timeout = RollbarError::Transport(TransportErrorKind::Timeout);
        let other = RollbarError::Transport(TransportErrorKind::Other);
        assert_eq!(timeout.to_string(), "Request timed out.");
        assert_eq!(other.to_string(), "Request error.");
    }

    #[test]
    fn decoding_message_is_fixed() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        assert_eq!(
            RollbarError::Decoding(Some(source)).to_string(),
            "Invalid JSON response from server."
        );
        assert_eq!(RollbarError::Decoding(None).to_string(), "Invalid JSON response from server.");
    }

    #[test]
    fn api_error_displays_server_message() {
        let err: RollbarError = ApiError::new("not found", 404, "Not Found").into();
        assert_eq!(err.to_string(), "not found");
        let api = err.as_api_error().unwrap();
        assert_eq!(api.name(), "RollbarAPIError");
        assert_eq!(api.status_code, 404);
        assert_eq!(api.status_message, "Not Found");
    }

    #[test]
    fn only_api_errors_expose_remote_detail() {
        assert!(RollbarError::argument("bad").as_api_error().is_none());
        assert!(RollbarError::configuration("missing").as_api_error().is_none());
    }
}
