//! VSTS error types
//!
//! Everything the reconciliation core can fail with, plus the decoder that
//! turns a non-2xx response body into an [`ApiError`].

use reqwest::header::HeaderMap;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// A decoded non-2xx response from the VSTS API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    /// Relative path that produced the response
    pub endpoint: String,
    pub message: String,
    pub error_type: Option<String>,
    /// Headers of the failed response (activity id, rate limit hints)
    pub headers: HeaderMap,
}

/// Wire shape of a VSTS error body
#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
    #[serde(rename = "type", default)]
    error_type: Option<String>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl ApiError {
    /// Decode an error body, falling back to the raw text when it is not
    /// the `{"error": {"message": ...}}` shape
    pub fn decode(status: u16, endpoint: &str, body: &str) -> Self {
        let (message, error_type) = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => (parsed.error.message, parsed.error_type),
            Err(_) => (body.to_string(), None),
        };

        Self {
            status,
            endpoint: endpoint.to_string(),
            message,
            error_type,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "API Error: {} {} {}", self.status, self.endpoint, self.message)
    }
}

impl std::error::Error for ApiError {}

#[derive(Error, Debug)]
pub enum Error {
    /// No response was obtained (connection, TLS, body read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("{kind} {name} not found{}", parent_suffix(.parent))]
    NotFound {
        kind: &'static str,
        name: String,
        parent: Option<String>,
    },

    #[error("cannot change {field} of {kind}: there is no VSTS API endpoint for it, make this change via the web interface")]
    UnsupportedChange { kind: &'static str, field: String },

    #[error("{kind} {name} was created but could not be read back after {waited_secs}s")]
    SettleTimeout {
        kind: &'static str,
        name: String,
        waited_secs: u64,
    },

    #[error("failed to decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot {operation} {kind} while {state}")]
    InvalidState {
        kind: &'static str,
        operation: &'static str,
        state: String,
    },

    #[error("invalid {kind}: {reason}")]
    InvalidSpec { kind: &'static str, reason: String },

    /// A success body that decoded but carried no id
    #[error("{endpoint} returned a {kind} without an id")]
    MissingId { kind: &'static str, endpoint: String },

    #[error("invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

fn parent_suffix(parent: &Option<String>) -> String {
    match parent {
        Some(parent) => format!(" in project {}", parent),
        None => String::new(),
    }
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::NotFound { .. } => true,
            Error::Api(api) => api.is_not_found(),
            _ => false,
        }
    }

    /// Status code of the response behind this error, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api(api) => Some(api.status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
