use serde::{Deserialize, Serialize};

use crate::cloud::PointSet;
use crate::coords::local_pixel;
use crate::types::{AttributeMap, TileMode, TileRect};

/// One point in a vector tile, positioned in tile-local pixels (origin top-left)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorFeature {
    pub id: String,
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub value: AttributeMap,
}

/// Point list served to the client for sparse tiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorTile {
    #[serde(alias = "features")]
    pub spaces: Vec<VectorFeature>,
}

impl VectorTile {
    /// Project `points` into the pixel frame of `rect`, keeping input order
    pub fn build(points: &PointSet<'_>, rect: &TileRect, tile_size: u32) -> Self {
        let spaces = points
            .iter_normalized()
            .map(|(point, (nx, ny))| {
                let (x, y) = local_pixel(rect, nx, ny, tile_size);
                VectorFeature {
                    id: point.id.clone(),
                    x,
                    y,
                    value: point.attributes.clone(),
                }
            })
            .collect();
        Self { spaces }
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    pub fn len(&self) -> usize {
        self.spaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spaces.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.spaces.iter().map(|f| f.id.as_str())
    }
}

/// Encoded PNG for a dense tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterTile {
    pub size: u32,
    pub png: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tile {
    Vector(VectorTile),
    Raster(RasterTile),
}

impl Tile {
    pub fn mode(&self) -> TileMode {
        match self {
            Tile::Vector(_) => TileMode::Vector,
            Tile::Raster(_) => TileMode::Raster,
        }
    }

    /// Serialized bytes as written to disk
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        match self {
            Tile::Vector(v) => v.to_json(),
            Tile::Raster(r) => Ok(r.png.clone()),
        }
    }
}
