//! Request types and validation for HTTP endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use satexplorer_lib::mosaic::{DEFAULT_MAXZOOM, DEFAULT_MINZOOM, DEFAULT_QUADKEY_ZOOM};
use satexplorer_lib::search::{DEFAULT_CLOUD_MAX, DEFAULT_LIMIT, MAX_CLOUD_MAX, MAX_LIMIT};
use satexplorer_lib::{parse_bbox, MosaicOptions, SearchParams};

use crate::{from_lib_error, ProblemDetails};

/// Validation trait for request types.
///
/// Implementations should validate all fields and return a `ProblemDetails`
/// error for invalid input.
pub trait Validate {
    /// Validate the request. The `request_id` populates the problem `instance`.
    ///
    /// Returns a boxed `ProblemDetails` to avoid large `Result::Err` variants.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

/// Raw `GET /search` query string.
///
/// Kept as strings so each parameter can be reported with its own message;
/// `bbox` may repeat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub bbox: Vec<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub cloud_max: Option<String>,
    pub limit: Option<String>,
}

impl SearchQuery {
    /// Collect the recognised parameters from decoded query pairs.
    ///
    /// Unknown keys are ignored. For the single-valued keys the last
    /// occurrence wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut query = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "bbox" => query.bbox.push(value),
                "start" => query.start = Some(value),
                "end" => query.end = Some(value),
                "cloud_max" => query.cloud_max = Some(value),
                "limit" => query.limit = Some(value),
                _ => {}
            }
        }
        query
    }

    /// Turn the raw query into validated search parameters.
    pub fn to_params(&self, request_id: &str) -> Result<SearchParams, Box<ProblemDetails>> {
        let bbox = parse_bbox(self.bbox.as_slice())
            .map_err(|e| Box::new(from_lib_error(&e, request_id)))?;
        let start = required_date("start", self.start.as_deref(), request_id)?;
        let end = required_date("end", self.end.as_deref(), request_id)?;

        let cloud_max = match self.cloud_max.as_deref() {
            None => DEFAULT_CLOUD_MAX,
            Some(raw) => raw
                .trim()
                .parse::<u8>()
                .ok()
                .filter(|v| *v <= MAX_CLOUD_MAX)
                .ok_or_else(|| {
                    Box::new(ProblemDetails::bad_request(
                        format!(
                            "The 'cloud_max' parameter must be an integer between 0 and {}",
                            MAX_CLOUD_MAX
                        ),
                        request_id,
                    ))
                })?,
        };

        let limit = match self.limit.as_deref() {
            None => DEFAULT_LIMIT,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|v| (1..=MAX_LIMIT).contains(v))
                .ok_or_else(|| {
                    Box::new(ProblemDetails::bad_request(
                        format!(
                            "The 'limit' parameter must be an integer between 1 and {}",
                            MAX_LIMIT
                        ),
                        request_id,
                    ))
                })?,
        };

        SearchParams::new(bbox, start, end, cloud_max, limit)
            .map_err(|e| Box::new(from_lib_error(&e, request_id)))
    }
}

impl Validate for SearchQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        self.to_params(request_id).map(|_| ())
    }
}

fn required_date(
    name: &str,
    raw: Option<&str>,
    request_id: &str,
) -> Result<NaiveDate, Box<ProblemDetails>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        Box::new(ProblemDetails::bad_request(
            format!("The '{}' parameter is required (YYYY-MM-DD)", name),
            request_id,
        ))
    })?;
    raw.parse::<NaiveDate>().map_err(|_| {
        Box::new(ProblemDetails::bad_request(
            format!("The '{}' parameter must be a date (YYYY-MM-DD), got '{}'", name, raw),
            request_id,
        ))
    })
}

/// `POST /mosaics` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosaicCreateRequest {
    /// COG URLs, highest precedence first.
    pub urls: Vec<String>,

    #[serde(default = "default_minzoom")]
    pub minzoom: u8,

    #[serde(default = "default_maxzoom")]
    pub maxzoom: u8,

    #[serde(default = "default_quadkey_zoom")]
    pub quadkey_zoom: u8,
}

fn default_minzoom() -> u8 {
    DEFAULT_MINZOOM
}

fn default_maxzoom() -> u8 {
    DEFAULT_MAXZOOM
}

fn default_quadkey_zoom() -> u8 {
    DEFAULT_QUADKEY_ZOOM
}

impl MosaicCreateRequest {
    pub fn options(&self) -> MosaicOptions {
        MosaicOptions {
            minzoom: self.minzoom,
            maxzoom: self.maxzoom,
            quadkey_zoom: self.quadkey_zoom,
        }
    }
}

impl Validate for MosaicCreateRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.urls.is_empty() {
            return Err(Box::new(ProblemDetails::bad_request(
                "urls cannot be empty",
                request_id,
            )));
        }

        if self.urls.iter().any(|u| u.trim().is_empty()) {
            return Err(Box::new(ProblemDetails::bad_request(
                "urls cannot contain blank entries",
                request_id,
            )));
        }

        self.options()
            .validate()
            .map_err(|e| Box::new(from_lib_error(&e, request_id)))
    }
}
