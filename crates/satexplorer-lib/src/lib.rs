//! Satellite Data Explorer library entry points.
//!
//! This crate holds everything the HTTP service delegates to: search
//! parameter parsing, the STAC item-search client, MosaicJSON assembly over
//! Web Mercator quadkeys, the in-memory mosaic store, and the client used to
//! reach the upstream tiler. Higher-level consumers should only depend on the
//! items exported here instead of reimplementing behavior.

#![deny(warnings)]

pub mod error;
pub mod mercator;
pub mod mosaic;
pub mod search;
pub mod settings;
pub mod stac;
pub mod store;
pub mod tiler;

pub use error::{Error, Result};
pub use mercator::{quadkey_to_tile, tile_for, tiles_covering, Tile};
pub use mosaic::{Footprint, MosaicJson, MosaicOptions};
pub use search::{parse_bbox, BBox, SearchParams};
pub use settings::Settings;
pub use stac::{SearchRecord, StacClient};
pub use store::MosaicStore;
pub use tiler::{ProxyRequest, ProxyResponse, TilerClient};
