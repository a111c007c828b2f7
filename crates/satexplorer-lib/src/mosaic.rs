//! MosaicJSON documents built from COG footprints.
//!
//! A mosaic maps every Web Mercator quadkey at `quadkey_zoom` to the list of
//! COG URLs whose footprint intersects that tile. Footprints themselves come
//! from the tiler (see [`crate::tiler`]); nothing here reads raster data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::mercator::{self, Tile, MAX_ZOOM};
use crate::search::BBox;

/// MosaicJSON specification version produced by this crate.
pub const MOSAICJSON_VERSION: &str = "0.0.3";

/// Upper bound on distinct quadkeys a single mosaic may index.
pub const MAX_QUADKEYS: usize = 250_000;

pub const DEFAULT_MINZOOM: u8 = 6;
pub const DEFAULT_MAXZOOM: u8 = 14;
pub const DEFAULT_QUADKEY_ZOOM: u8 = 12;

/// Zoom configuration for a new mosaic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MosaicOptions {
    pub minzoom: u8,
    pub maxzoom: u8,
    pub quadkey_zoom: u8,
}

impl Default for MosaicOptions {
    fn default() -> Self {
        Self {
            minzoom: DEFAULT_MINZOOM,
            maxzoom: DEFAULT_MAXZOOM,
            quadkey_zoom: DEFAULT_QUADKEY_ZOOM,
        }
    }
}

impl MosaicOptions {
    /// Require `minzoom <= quadkey_zoom <= maxzoom <= MAX_ZOOM`.
    pub fn validate(&self) -> Result<()> {
        if self.maxzoom > MAX_ZOOM {
            return Err(Error::InvalidZoom {
                message: format!("maxzoom {} exceeds {}", self.maxzoom, MAX_ZOOM),
            });
        }
        if self.minzoom > self.maxzoom {
            return Err(Error::InvalidZoom {
                message: format!(
                    "minzoom {} is greater than maxzoom {}",
                    self.minzoom, self.maxzoom
                ),
            });
        }
        if self.quadkey_zoom < self.minzoom || self.quadkey_zoom > self.maxzoom {
            return Err(Error::InvalidZoom {
                message: format!(
                    "quadkey_zoom {} must lie between minzoom {} and maxzoom {}",
                    self.quadkey_zoom, self.minzoom, self.maxzoom
                ),
            });
        }
        Ok(())
    }
}

/// Geographic footprint of one COG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub url: String,
    pub bounds: BBox,
}

/// A MosaicJSON 0.0.3 document.
///
/// Optional metadata fields are always serialized (as `null` when unset)
/// so tilers that validate the full schema accept the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosaicJson {
    pub mosaicjson: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub version: String,
    pub attribution: Option<String>,
    pub minzoom: u8,
    pub maxzoom: u8,
    pub quadkey_zoom: u8,
    pub bounds: BBox,
    pub center: (f64, f64, u8),
    pub tiles: BTreeMap<String, Vec<String>>,
    pub tilematrixset: Option<Value>,
    pub asset_type: Option<String>,
    pub asset_prefix: Option<String>,
    pub data_type: Option<String>,
    pub colormap: Option<Value>,
    pub layers: Option<Value>,
}

impl MosaicJson {
    /// Build a mosaic indexing `footprints` at `options.quadkey_zoom`.
    ///
    /// URLs are appended to each quadkey in footprint order, so the first
    /// footprint listed takes precedence when a tiler picks assets.
    pub fn from_footprints(footprints: &[Footprint], options: MosaicOptions) -> Result<Self> {
        options.validate()?;
        let first = footprints.first().ok_or(Error::EmptyUrls)?;

        let zoom = options.quadkey_zoom;
        let mut bounds = first.bounds;
        let mut tiles: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for footprint in footprints {
            let count = mercator::covering_count(footprint.bounds, zoom) as usize;
            if count > MAX_QUADKEYS {
                return Err(Error::MosaicTooLarge {
                    count,
                    zoom,
                    limit: MAX_QUADKEYS,
                });
            }

            bounds = bounds.union(footprint.bounds);
            for tile in mercator::tiles_covering(footprint.bounds, zoom) {
                let urls = tiles.entry(tile.quadkey()).or_default();
                if !urls.contains(&footprint.url) {
                    urls.push(footprint.url.clone());
                }
            }

            if tiles.len() > MAX_QUADKEYS {
                return Err(Error::MosaicTooLarge {
                    count: tiles.len(),
                    zoom,
                    limit: MAX_QUADKEYS,
                });
            }
        }

        let (lon, lat) = bounds.center();
        debug!(
            footprints = footprints.len(),
            quadkeys = tiles.len(),
            quadkey_zoom = zoom,
            "built mosaic"
        );

        Ok(Self {
            mosaicjson: MOSAICJSON_VERSION.to_string(),
            name: None,
            description: None,
            version: "1.0.0".to_string(),
            attribution: None,
            minzoom: options.minzoom,
            maxzoom: options.maxzoom,
            quadkey_zoom: zoom,
            bounds,
            center: (lon, lat, options.minzoom),
            tiles,
            tilematrixset: None,
            asset_type: None,
            asset_prefix: None,
            data_type: None,
            colormap: None,
            layers: None,
        })
    }

    /// Number of quadkeys indexed.
    pub fn quadkey_count(&self) -> usize {
        self.tiles.len()
    }

    /// COG URLs that may contribute to tile `x/y/z`, in precedence order.
    pub fn assets_for_tile(&self, x: u32, y: u32, z: u8) -> Vec<String> {
        let tile = Tile::new(x, y, z);
        let mut assets: Vec<String> = Vec::new();
        let mut extend = |urls: &Vec<String>| {
            for url in urls {
                if !assets.contains(url) {
                    assets.push(url.clone());
                }
            }
        };

        if z >= self.quadkey_zoom {
            if let Some(urls) = self.tiles.get(&tile.parent_at(self.quadkey_zoom).quadkey()) {
                extend(urls);
            }
        } else {
            // Every indexed quadkey below this tile shares its quadkey as a prefix.
            let prefix = tile.quadkey();
            for (_, urls) in self
                .tiles
                .range(prefix.clone()..)
                .take_while(|(key, _)| key.starts_with(&prefix))
            {
                extend(urls);
            }
        }
        assets
    }
}
