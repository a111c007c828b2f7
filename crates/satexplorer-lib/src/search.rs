//! Search parameters: bounding box parsing and date-range handling.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_CLOUD_MAX: u8 = 20;
pub const MAX_CLOUD_MAX: u8 = 100;
pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 100;

/// Geographic bounding box `[minx, miny, maxx, maxy]` in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn to_array(self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(self, other: BBox) -> BBox {
        BBox {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Midpoint `(lon, lat)` of the box.
    pub fn center(self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        b.to_array()
    }
}

/// Parse every raw `bbox` query value into a single box.
///
/// Accepts `bbox=a,b,c,d` as well as four repeated `bbox` parameters (or any
/// mix of the two). Spaces are ignored and empty comma-separated parts are
/// skipped; exactly four numbers must remain.
pub fn parse_bbox<S: AsRef<str>>(raw: &[S]) -> Result<BBox> {
    let mut values = Vec::with_capacity(4);
    for token in raw {
        let compact = token.as_ref().replace(' ', "");
        for part in compact.split(',').filter(|p| !p.is_empty()) {
            let value = part.parse::<f64>().map_err(|_| Error::InvalidBboxValue {
                value: part.to_string(),
            })?;
            values.push(value);
        }
    }

    match values.as_slice() {
        [min_x, min_y, max_x, max_y] => Ok(BBox::new(*min_x, *min_y, *max_x, *max_y)),
        _ => Err(Error::InvalidBbox),
    }
}

/// Validated catalog search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub bbox: BBox,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Maximum `eo:cloud_cover` percentage, inclusive.
    pub cloud_max: u8,
    /// Maximum number of records returned.
    pub limit: usize,
}

impl SearchParams {
    pub fn new(
        bbox: BBox,
        start: NaiveDate,
        end: NaiveDate,
        cloud_max: u8,
        limit: usize,
    ) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidDateRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self {
            bbox,
            start,
            end,
            cloud_max: cloud_max.min(MAX_CLOUD_MAX),
            limit: limit.clamp(1, MAX_LIMIT),
        })
    }

    /// STAC `datetime` interval, e.g. `2025-01-01/2025-02-28`.
    pub fn datetime_range(&self) -> String {
        format!(
            "{}/{}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn parses_single_comma_separated_value() {
        let bbox = parse_bbox(&["-123.1,37.3,-121.7,38.2"]).unwrap();
        assert_eq!(bbox.to_array(), [-123.1, 37.3, -121.7, 38.2]);
    }

    #[test]
    fn parses_repeated_values_with_spaces() {
        let bbox = parse_bbox(&["-123.1", " 37.3", "-121.7 ", "38.2"]).unwrap();
        assert_eq!(bbox.to_array(), [-123.1, 37.3, -121.7, 38.2]);
    }

    #[test]
    fn mixed_styles_and_empty_parts() {
        let bbox = parse_bbox(&["1,,2", "3,", "4"]).unwrap();
        assert_eq!(bbox.to_array(), [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn rejects_non_numeric_part() {
        let err = parse_bbox(&["1,2,x,4"]).unwrap_err();
        assert_eq!(err.to_string(), "bbox value 'x' is not a number");
    }

    #[test]
    fn rejects_wrong_count() {
        assert!(matches!(parse_bbox(&["1,2,3"]), Err(Error::InvalidBbox)));
        assert!(matches!(parse_bbox(&["1,2,3,4,5"]), Err(Error::InvalidBbox)));
        let empty: [&str; 0] = [];
        assert!(matches!(parse_bbox(&empty), Err(Error::InvalidBbox)));
    }

    #[test]
    fn datetime_range_is_iso_interval() {
        let params = SearchParams::new(
            BBox::new(0.0, 0.0, 1.0, 1.0),
            date("2025-01-01"),
            date("2025-02-28"),
            20,
            50,
        )
        .unwrap();
        assert_eq!(params.datetime_range(), "2025-01-01/2025-02-28");
    }

    #[test]
    fn start_after_end_is_rejected() {
        let err = SearchParams::new(
            BBox::new(0.0, 0.0, 1.0, 1.0),
            date("2025-03-01"),
            date("2025-02-28"),
            20,
            50,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidDateRange { .. }));
    }

    #[test]
    fn bbox_union_and_center() {
        let a = BBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BBox::new(-1.0, 0.5, 0.5, 3.0);
        let u = a.union(b);
        assert_eq!(u.to_array(), [-1.0, 0.0, 1.0, 3.0]);
        assert_eq!(u.center(), (0.0, 1.5));
    }

    #[test]
    fn bbox_serializes_as_array() {
        let json = serde_json::to_string(&BBox::new(1.0, 2.0, 3.0, 4.0)).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");
    }
}
