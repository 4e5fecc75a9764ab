//! Endpoint addressing for the food API. Requests themselves go through
//! `crux_http`; this module only decides where they go and tags them.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const MAX_URL_LENGTH: usize = 2048;
pub const DEFAULT_BASE_URL: &str = "http://localhost:3333/";
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Outcome of a `crux_http` call whose body was decoded as `T`.
pub type HttpResult<T> = crux_http::Result<crux_http::Response<T>>;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum UrlError {
    #[error("invalid URL '{url}': {reason}")]
    Invalid { url: String, reason: String },
}

/// Fresh correlation id for the `X-Request-Id` header.
#[must_use]
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Absolute http(s) URL. Credentials embedded in the URL are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatedUrl {
    url: String,
    scheme: String,
    host: String,
}

impl ValidatedUrl {
    pub fn new(url: impl Into<String>) -> Result<Self, UrlError> {
        let url = url.into();
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(UrlError::Invalid {
                url: String::new(),
                reason: "URL cannot be empty".to_string(),
            });
        }

        if trimmed.len() > MAX_URL_LENGTH {
            return Err(UrlError::Invalid {
                url: Self::truncate_url(trimmed),
                reason: format!("URL exceeds maximum length of {MAX_URL_LENGTH} bytes"),
            });
        }

        let parsed = Url::parse(trimmed).map_err(|e| UrlError::Invalid {
            url: Self::truncate_url(trimmed),
            reason: e.to_string(),
        })?;

        Self::from_parsed(&parsed)
    }

    fn from_parsed(parsed: &Url) -> Result<Self, UrlError> {
        let scheme = parsed.scheme().to_lowercase();
        if scheme != "http" && scheme != "https" {
            return Err(UrlError::Invalid {
                url: Self::truncate_url(parsed.as_str()),
                reason: format!("invalid scheme '{scheme}', only 'http' and 'https' are allowed"),
            });
        }

        let Some(host) = parsed.host_str() else {
            return Err(UrlError::Invalid {
                url: Self::truncate_url(parsed.as_str()),
                reason: "URL must have a host".to_string(),
            });
        };

        if !parsed.username().is_empty() || parsed.password().is_some() {
            return Err(UrlError::Invalid {
                url: Self::truncate_url(parsed.as_str()),
                reason: "credentials in URL are not allowed".to_string(),
            });
        }

        Ok(Self {
            url: parsed.to_string(),
            scheme,
            host: host.to_lowercase(),
        })
    }

    /// Resolves an endpoint path such as `foods/42` against this URL, which
    /// is treated as a directory whether or not it ends in `/`.
    pub fn join(&self, path: &str) -> Result<Self, UrlError> {
        let mut base = self.url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }

        let joined = Url::parse(&base)
            .and_then(|b| b.join(path.trim_start_matches('/')))
            .map_err(|e| UrlError::Invalid {
                url: Self::truncate_url(path),
                reason: e.to_string(),
            })?;

        Self::from_parsed(&joined)
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Path component, for matching requests in logs and tests.
    pub fn path(&self) -> &str {
        let after_scheme = self
            .url
            .find("://")
            .map_or(self.url.as_str(), |i| &self.url[i + 3..]);
        let path = after_scheme
            .find('/')
            .map_or("/", |i| &after_scheme[i..]);
        path.split(['?', '#']).next().unwrap_or(path)
    }

    fn truncate_url(url: &str) -> String {
        if url.len() <= 100 {
            url.to_string()
        } else {
            let cut = (0..=100).rev().find(|i| url.is_char_boundary(*i)).unwrap_or(0);
            format!("{}...", &url[..cut])
        }
    }
}

/// The local development API.
impl Default for ValidatedUrl {
    fn default() -> Self {
        Self {
            url: DEFAULT_BASE_URL.to_string(),
            scheme: "http".to_string(),
            host: "localhost".to_string(),
        }
    }
}

impl std::fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}
