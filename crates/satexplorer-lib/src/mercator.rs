//! Web Mercator tile math and quadkeys.
//!
//! Tile indices follow the XYZ / slippy-map convention (row 0 at the north
//! edge). Covering a bounding box matches the behavior of the `mercantile`
//! family of tools so MosaicJSON documents built here index the same tiles
//! a tiler expects.

use std::f64::consts::PI;
use std::fmt;

use crate::search::BBox;

/// Web Mercator latitude limit used when clamping boxes.
pub const MAX_LAT: f64 = 85.051129;

/// Highest zoom a quadkey is built for.
pub const MAX_ZOOM: u8 = 24;

const LL_EPSILON: f64 = 1e-11;
const EPSILON: f64 = 1e-14;

/// A Web Mercator tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

impl Tile {
    pub fn new(x: u32, y: u32, z: u8) -> Self {
        Self { x, y, z }
    }

    /// Base-4 quadkey for this tile (empty at zoom 0).
    pub fn quadkey(&self) -> String {
        (1..=self.z)
            .rev()
            .map(|level| {
                let mask = 1u32 << (level - 1);
                let mut digit = b'0';
                if self.x & mask != 0 {
                    digit += 1;
                }
                if self.y & mask != 0 {
                    digit += 2;
                }
                digit as char
            })
            .collect()
    }

    /// Ancestor of this tile at `zoom` (itself when `zoom >= self.z`).
    pub fn parent_at(&self, zoom: u8) -> Tile {
        if zoom >= self.z {
            return *self;
        }
        let shift = self.z - zoom;
        Tile::new(self.x >> shift, self.y >> shift, zoom)
    }

    /// Descendants of this tile at `zoom`, row-major. Empty when `zoom <= self.z`.
    pub fn children_at(&self, zoom: u8) -> Vec<Tile> {
        if zoom <= self.z {
            return Vec::new();
        }
        let shift = zoom - self.z;
        let span = 1u32 << shift;
        let (x0, y0) = (self.x << shift, self.y << shift);
        (y0..y0 + span)
            .flat_map(|y| (x0..x0 + span).map(move |x| Tile::new(x, y, zoom)))
            .collect()
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Decode a quadkey back into its tile. Returns `None` for digits outside `0..=3`.
pub fn quadkey_to_tile(quadkey: &str) -> Option<Tile> {
    if quadkey.len() > MAX_ZOOM as usize {
        return None;
    }
    let z = quadkey.len() as u8;
    let (mut x, mut y) = (0u32, 0u32);
    for (i, c) in quadkey.chars().enumerate() {
        let mask = 1u32 << (z as usize - i - 1);
        match c {
            '0' => {}
            '1' => x |= mask,
            '2' => y |= mask,
            '3' => {
                x |= mask;
                y |= mask;
            }
            _ => return None,
        }
    }
    Some(Tile::new(x, y, z))
}

/// Tile containing the point `(lon, lat)` at zoom `z`.
pub fn tile_for(lon: f64, lat: f64, z: u8) -> Tile {
    let x = lon / 360.0 + 0.5;
    let sin_lat = lat.to_radians().sin();
    let y = 0.5 - 0.25 * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / PI;

    let n = 1u64 << z;
    let index = |v: f64| -> u32 {
        if v <= 0.0 {
            0
        } else if v >= 1.0 {
            (n - 1) as u32
        } else {
            ((v + EPSILON) * n as f64).floor() as u32
        }
    };
    Tile::new(index(x), index(y), z)
}

/// Inclusive tile index ranges covering a box, one per side of the antimeridian.
fn covering_ranges(bounds: BBox, z: u8) -> Vec<(Tile, Tile)> {
    let boxes = if bounds.min_x > bounds.max_x {
        vec![
            BBox::new(-180.0, bounds.min_y, bounds.max_x, bounds.max_y),
            BBox::new(bounds.min_x, bounds.min_y, 180.0, bounds.max_y),
        ]
    } else {
        vec![bounds]
    };

    boxes
        .into_iter()
        .map(|b| {
            let w = b.min_x.max(-180.0);
            let s = b.min_y.max(-MAX_LAT);
            let e = b.max_x.min(180.0);
            let n = b.max_y.min(MAX_LAT);
            let upper_left = tile_for(w, n, z);
            let lower_right = tile_for(e - LL_EPSILON, s + LL_EPSILON, z);
            (upper_left, lower_right)
        })
        .collect()
}

/// Number of tiles [`tiles_covering`] would return, without allocating them.
pub fn covering_count(bounds: BBox, z: u8) -> u64 {
    covering_ranges(bounds, z)
        .into_iter()
        .map(|(ul, lr)| {
            let cols = (lr.x as i64 - ul.x as i64 + 1).max(0) as u64;
            let rows = (lr.y as i64 - ul.y as i64 + 1).max(0) as u64;
            cols * rows
        })
        .sum()
}

/// All tiles at zoom `z` intersecting `bounds`, column-major like `mercantile.tiles`.
pub fn tiles_covering(bounds: BBox, z: u8) -> Vec<Tile> {
    let mut tiles = Vec::new();
    for (ul, lr) in covering_ranges(bounds, z) {
        for x in ul.x..=lr.x {
            for y in ul.y..=lr.y {
                tiles.push(Tile::new(x, y, z));
            }
        }
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadkey_round_trip_known_values() {
        assert_eq!(Tile::new(3, 5, 3).quadkey(), "213");
        assert_eq!(quadkey_to_tile("213"), Some(Tile::new(3, 5, 3)));
        assert_eq!(Tile::new(0, 0, 0).quadkey(), "");
        assert_eq!(quadkey_to_tile("4"), None);
    }

    #[test]
    fn tile_for_known_points() {
        // Null island sits at the top-left of the south-east quadrant.
        assert_eq!(tile_for(0.0, 0.0, 1), Tile::new(1, 1, 1));
        assert_eq!(tile_for(-180.0, MAX_LAT, 3), Tile::new(0, 0, 3));
        assert_eq!(tile_for(180.0, -MAX_LAT, 3), Tile::new(7, 7, 3));
        // San Francisco at zoom 10.
        assert_eq!(tile_for(-122.4194, 37.7749, 10), Tile::new(163, 395, 10));
    }

    #[test]
    fn covering_whole_world() {
        let world = BBox::new(-180.0, -90.0, 180.0, 90.0);
        assert_eq!(covering_count(world, 2), 16);
        assert_eq!(tiles_covering(world, 2).len(), 16);
    }

    #[test]
    fn covering_edge_aligned_box_does_not_spill() {
        // Exactly the north-west quadrant at zoom 1.
        let bbox = BBox::new(-180.0, 0.0, 0.0, MAX_LAT);
        assert_eq!(tiles_covering(bbox, 1), vec![Tile::new(0, 0, 1)]);
    }

    #[test]
    fn covering_antimeridian_box_splits() {
        let bbox = BBox::new(170.0, -10.0, -170.0, 10.0);
        let tiles = tiles_covering(bbox, 2);
        assert!(tiles.iter().any(|t| t.x == 0));
        assert!(tiles.iter().any(|t| t.x == 3));
        assert!(!tiles.iter().any(|t| t.x == 1 || t.x == 2));
        assert_eq!(tiles.len() as u64, covering_count(bbox, 2));
    }

    #[test]
    fn parent_and_children() {
        let tile = Tile::new(163, 395, 10);
        let parent = tile.parent_at(8);
        assert_eq!(parent, Tile::new(40, 98, 8));
        let children = parent.children_at(10);
        assert_eq!(children.len(), 16);
        assert!(children.contains(&tile));
        assert!(tile.children_at(9).is_empty());
        assert_eq!(tile.parent_at(12), tile);
    }
}
