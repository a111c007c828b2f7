//! Runtime settings sourced from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `STAC_API_URL` | `https://earth-search.aws.element84.com/v1` |
//! | `DEFAULT_COLLECTIONS` | `sentinel-2-l2a` |
//! | `CORS_ORIGINS` | the local Vite dev server origins |
//! | `TILER_URL` | `http://127.0.0.1:8081` |
//! | `PUBLIC_BASE_URL` | unset |
//! | `HTTP_TIMEOUT_SECS` | `30` |

use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_STAC_API_URL: &str = "https://earth-search.aws.element84.com/v1";
pub const DEFAULT_COLLECTIONS: &str = "sentinel-2-l2a";
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:5174,http://127.0.0.1:5173";
pub const DEFAULT_TILER_URL: &str = "http://127.0.0.1:8081";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Settings shared by the STAC client, the tiler client and the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Root URL of the STAC API (no trailing slash).
    pub stac_api_url: String,
    /// Comma-separated collection ids searched by default.
    pub default_collections: String,
    /// Comma-separated list of browser origins allowed by CORS.
    pub cors_origins: String,
    /// Root URL of the upstream tiler (no trailing slash).
    pub tiler_url: String,
    /// Public URL of this service, used to rewrite tiler URLs in JSON responses.
    pub public_base_url: Option<String>,
    /// Timeout applied to every upstream HTTP call.
    pub http_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stac_api_url: DEFAULT_STAC_API_URL.to_string(),
            default_collections: DEFAULT_COLLECTIONS.to_string(),
            cors_origins: DEFAULT_CORS_ORIGINS.to_string(),
            tiler_url: DEFAULT_TILER_URL.to_string(),
            public_base_url: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let http_timeout = match value("HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| Error::Config {
                    key: "HTTP_TIMEOUT_SECS",
                    message: format!("'{}' is not a whole number of seconds", raw),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.http_timeout,
        };

        Ok(Self {
            stac_api_url: value("STAC_API_URL")
                .map(|v| trim_base(&v))
                .unwrap_or(defaults.stac_api_url),
            default_collections: value("DEFAULT_COLLECTIONS")
                .unwrap_or(defaults.default_collections),
            cors_origins: value("CORS_ORIGINS").unwrap_or(defaults.cors_origins),
            tiler_url: value("TILER_URL")
                .map(|v| trim_base(&v))
                .unwrap_or(defaults.tiler_url),
            public_base_url: value("PUBLIC_BASE_URL").map(|v| trim_base(&v)),
            http_timeout,
        })
    }

    /// Collection ids to search, blanks dropped.
    pub fn collections(&self) -> Vec<String> {
        split_list(&self.default_collections)
    }

    /// CORS origins, blanks dropped.
    pub fn cors_origin_list(&self) -> Vec<String> {
        split_list(&self.cors_origins)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
