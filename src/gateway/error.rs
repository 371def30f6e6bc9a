//! Gateway error taxonomy (spec.md §7). These are classifications, not a
//! grab-bag of transport-specific types — the controller only ever branches
//! on these variants when deciding how to log/backoff.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GatewayError {
    #[error("unreachable: {0}")]
    Unreachable(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("{endpoint} returned {status}: {body}")]
    Protocol {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode response from {endpoint}: {reason}")]
    Decode { endpoint: String, reason: String },

    #[error("{0}")]
    InvalidArgument(String),

    #[error("response body exceeded the {0} byte cap")]
    BodyTooLarge(usize),
}

impl GatewayError {
    /// Classifies a [`reqwest::Error`] into the taxonomy above.
    pub fn from_reqwest(endpoint: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            GatewayError::Timeout(format!("{endpoint}: {err}"))
        } else if err.is_connect() {
            GatewayError::Unreachable(format!("{endpoint}: {err}"))
        } else if let Some(source) = err.source() {
            let text = source.to_string();
            if text.contains("certificate") || text.contains("TLS") || text.contains("tls") {
                GatewayError::Tls(format!("{endpoint}: {err}"))
            } else {
                GatewayError::Unreachable(format!("{endpoint}: {err}"))
            }
        } else {
            GatewayError::Unreachable(format!("{endpoint}: {err}"))
        }
    }

    pub fn from_status(endpoint: &str, status: u16, body_snippet: &str) -> Self {
        if status == 401 || status == 403 {
            GatewayError::Auth(format!("{endpoint} returned {status}"))
        } else {
            GatewayError::Protocol {
                endpoint: endpoint.to_string(),
                status,
                body: body_snippet.to_string(),
            }
        }
    }
}

// `std::error::Error::source` access above needs the trait in scope.
use std::error::Error as _;
