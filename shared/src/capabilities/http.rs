//! HTTP boundary.
//!
//! Requests go out through `crux_http`; responses come back into the core as
//! an [`HttpResult`], which is plain data so completion events stay
//! `Clone + PartialEq` and can be constructed directly in tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ACCEPT_JSON: &str = "application/json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum HttpError {
    #[error("network error: {0}")]
    Network(String),

    #[error("http status {code}")]
    Status { code: u16 },

    #[error("response had no body")]
    EmptyBody,
}

impl HttpError {
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Status { code } if (400..500).contains(code))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Status { code } if *code >= 500)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOutput {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpOutput {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body of a 2xx response; any other status becomes an error.
    pub fn into_success_body(self) -> Result<Vec<u8>, HttpError> {
        if !self.is_success() {
            return Err(HttpError::Status { code: self.status });
        }
        if self.body.is_empty() {
            return Err(HttpError::EmptyBody);
        }
        Ok(self.body)
    }
}

pub type HttpResult = Result<HttpOutput, HttpError>;

/// Converts what the shell handed back to `crux_http` into core data.
pub fn from_crux(result: crux_http::Result<crux_http::Response<Vec<u8>>>) -> HttpResult {
    match result {
        Ok(mut response) => {
            let status: u16 = response.status().into();
            let body = response.take_body().unwrap_or_default();
            Ok(HttpOutput::new(status, body))
        }
        Err(e) => Err(HttpError::Network(e.to_string())),
    }
}

pub fn into_success_body(result: HttpResult) -> Result<Vec<u8>, HttpError> {
    result.and_then(HttpOutput::into_success_body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_body_passes_through() {
        let body = into_success_body(Ok(HttpOutput::ok(b"[]".to_vec()))).unwrap();
        assert_eq!(body, b"[]");
    }

    #[test]
    fn non_2xx_becomes_status_error() {
        let err = into_success_body(Ok(HttpOutput::new(503, b"down".to_vec()))).unwrap_err();
        assert_eq!(err, HttpError::Status { code: 503 });
        assert!(err.is_server_error());
        assert!(!err.is_client_error());
    }

    #[test]
    fn empty_success_body_is_an_error() {
        let err = into_success_body(Ok(HttpOutput::new(204, Vec::new()))).unwrap_err();
        assert_eq!(err, HttpError::EmptyBody);
    }

    #[test]
    fn network_error_is_kept() {
        let err = into_success_body(Err(HttpError::Network("reset".into()))).unwrap_err();
        assert_eq!(err.to_string(), "network error: reset");
    }
}
