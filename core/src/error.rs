//! Error types for the change event client.
//!
//! # Design
//! A non-2xx response whose body still decodes as a `ChangeEventResponse`
//! gets its own `Rejected` variant, so callers can read PagerDuty's `errors`
//! list. Every other non-2xx response lands in `Http` with the raw status
//! and body.

use thiserror::Error;

use crate::types::ChangeEventResponse;

/// Errors returned by `ChangeEventClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client was configured with an empty events API endpoint.
    #[error("v2 events API endpoint must be set on the client")]
    MissingEndpoint,

    /// The change event could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The response body could not be deserialized into a `ChangeEventResponse`.
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// PagerDuty answered with a non-2xx status and a structured body.
    #[error("change event rejected with HTTP {status}: {}", .response.message)]
    Rejected {
        status: u16,
        response: ChangeEventResponse,
    },

    /// The server returned a non-2xx status with an unrecognized body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The transport failed before any response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ApiError {
    /// HTTP status carried by the error, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Rejected { status, .. } | ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised by a [`Transport`](crate::transport::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or no response arrived.
    #[error("request failed: {0}")]
    Request(String),

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_pagerduty_message() {
        let err = ApiError::Rejected {
            status: 400,
            response: ChangeEventResponse {
                status: "invalid event".to_string(),
                message: "Event object is invalid".to_string(),
                errors: vec!["'routing_key' is invalid".to_string()],
            },
        };
        assert_eq!(
            err.to_string(),
            "change event rejected with HTTP 400: Event object is invalid"
        );
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn transport_error_is_transparent() {
        let err = ApiError::from(TransportError::Request("connection refused".to_string()));
        assert_eq!(err.to_string(), "request failed: connection refused");
        assert_eq!(err.status(), None);
    }
}
