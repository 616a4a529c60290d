use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CatalogError, CatalogResult, ConfigError};
use crate::query::QueryParams;
use crate::{DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Shell-provided settings for the catalog screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogConfig {
    /// Root of the REST API, e.g. `https://api.example.com/api/v1/`.
    pub api_base_url: String,
    /// Services per page, sent as `size`.
    pub page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.base_url()?;
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::PageSizeOutOfRange(self.page_size));
        }
        Ok(())
    }

    /// Base URL with a trailing slash so relative joins append.
    fn base_url(&self) -> Result<Url, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.api_base_url.clone(),
            reason,
        };

        let mut raw = self.api_base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        let url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed".to_string()));
        }
        Ok(url)
    }

    /// Absolute request URL for `path` relative to the API root.
    pub fn endpoint(&self, path: &str, query: Option<&QueryParams>) -> CatalogResult<String> {
        let base = self.base_url()?;
        let mut url = base
            .join(path.trim_start_matches('/'))
            .map_err(|e| CatalogError::Endpoint {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            url.set_query(Some(&query.encode()));
        }
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base: &str) -> CatalogConfig {
        CatalogConfig {
            api_base_url: base.to_string(),
            ..CatalogConfig::default()
        }
    }

    #[test]
    fn default_is_valid() {
        assert!(CatalogConfig::default().validate().is_ok());
        assert_eq!(CatalogConfig::default().page_size, 6);
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let cfg = config("https://api.example.com/api/v1");
        assert_eq!(
            cfg.endpoint("/category/view", None).unwrap(),
            "https://api.example.com/api/v1/category/view"
        );
    }

    #[test]
    fn endpoint_carries_query() {
        let cfg = config("https://api.example.com/");
        let query: QueryParams = [("page", "1"), ("size", "6")].into_iter().collect();
        assert_eq!(
            cfg.endpoint("service/view", Some(&query)).unwrap(),
            "https://api.example.com/service/view?page=1&size=6"
        );
    }

    #[test]
    fn rejects_bad_base_urls() {
        assert!(config("not a url").validate().is_err());
        assert!(config("ftp://files.example.com").validate().is_err());
        assert!(config("https://api.example.com/?x=1").validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_page_size() {
        let cfg = CatalogConfig {
            page_size: 0,
            ..CatalogConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::PageSizeOutOfRange(0)));
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let cfg = CatalogConfig::from_json(r#"{"page_size": 12}"#).unwrap();
        assert_eq!(cfg.page_size, 12);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            CatalogConfig::from_json(r#"{"pageSize": 12}"#),
            Err(ConfigError::Parse(_))
        ));
    }
}
