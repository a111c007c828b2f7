use thiserror::Error;

/// Convenient result alias for the Satellite Data Explorer library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// A bbox query value could not be parsed as a number.
    #[error("bbox value '{value}' is not a number")]
    InvalidBboxValue { value: String },

    /// The bbox did not contain exactly four values.
    #[error("bbox must have 4 numeric values (minx,miny,maxx,maxy)")]
    InvalidBbox,

    /// Raised when the search start date falls after the end date.
    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: String, end: String },

    /// Raised when mosaic zoom levels are out of range or inconsistent.
    #[error("invalid zoom configuration: {message}")]
    InvalidZoom { message: String },

    /// Raised when a mosaic is requested without any source URLs.
    #[error("urls cannot be empty")]
    EmptyUrls,

    /// Raised when a footprint would cover more quadkeys than a mosaic may hold.
    #[error("mosaic would cover {count} quadkeys at zoom {zoom}, limit is {limit}")]
    MosaicTooLarge { count: usize, zoom: u8, limit: usize },

    /// Raised when a mosaic id is not present in the store.
    #[error("mosaic not found")]
    MosaicNotFound { id: String },

    /// Raised when an upstream service answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamStatus {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Raised when an upstream service answered with an unexpected document.
    #[error("unexpected {service} response: {message}")]
    UpstreamPayload {
        service: &'static str,
        message: String,
    },

    /// Raised when configuration values are malformed.
    #[error("invalid configuration for {key}: {message}")]
    Config { key: &'static str, message: String },

    /// Raised when a spawned upstream lookup panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),

    /// Wrapper for HTTP client errors.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// An upstream answered 2xx with a body that is not valid JSON.
    #[error("invalid JSON from upstream: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error originated from a timed-out upstream call.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Http(e) if e.is_timeout())
    }

    /// Whether the error was caused by a remote service rather than by the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::UpstreamStatus { .. }
                | Error::UpstreamPayload { .. }
                | Error::Json(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_messages_match_api_contract() {
        let err = Error::InvalidBboxValue {
            value: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "bbox value 'abc' is not a number");
        assert_eq!(
            Error::InvalidBbox.to_string(),
            "bbox must have 4 numeric values (minx,miny,maxx,maxy)"
        );
    }

    #[test]
    fn upstream_classification() {
        let err = Error::UpstreamStatus {
            service: "stac",
            status: 503,
            body: "down".to_string(),
        };
        assert!(err.is_upstream());
        assert!(!err.is_timeout());
        assert!(!Error::EmptyUrls.is_upstream());
        assert_eq!(
            Error::MosaicNotFound { id: "x".into() }.to_string(),
            "mosaic not found"
        );
    }

    #[test]
    fn malformed_upstream_json_is_upstream() {
        let err: Error = serde_json::from_str::<serde_json::Value>("<html>")
            .unwrap_err()
            .into();
        assert!(err.is_upstream());
        assert!(err.to_string().starts_with("invalid JSON from upstream"));
    }
}
