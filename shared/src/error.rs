use thiserror::Error;

use crate::capabilities::HttpError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid api base url '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("page size {0} is out of range [1, {max}]", max = crate::MAX_PAGE_SIZE)]
    PageSizeOutOfRange(u32),

    #[error("config is not valid json: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot build endpoint url for '{path}': {reason}")]
    Endpoint { path: String, reason: String },

    #[error("transport error: {0}")]
    Http(#[from] HttpError),

    #[error("malformed {resource} payload: {reason}")]
    MalformedPayload {
        resource: &'static str,
        reason: String,
    },
}

impl CatalogError {
    pub fn malformed(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            resource,
            reason: reason.into(),
        }
    }
}

pub type CatalogResult<T> = Result<T, CatalogError>;
