use serde::{Deserialize, Serialize};

use crate::coords::DatasetExtent;
use crate::params::TilingParams;
use crate::types::{TileAddress, TileMode, ZoomLevel};

pub const MANIFEST_FILE: &str = "manifest.json";

/// One materialized tile as recorded in the manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub zoom: ZoomLevel,
    pub x: u32,
    pub y: u32,
    pub kind: TileMode,
    pub points: usize,
    /// Overview raster of a deferred tile; its points are owned by deeper tiles
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preview: bool,
}

impl ManifestEntry {
    pub fn address(&self) -> TileAddress {
        TileAddress::new(self.zoom, self.x, self.y)
    }
}

/// Summary of a tiling run written next to the tiles.
///
/// Carries the extent and tile size the tiles were produced with so a query
/// layer can map raw coordinates consistently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileManifest {
    pub version: String,
    pub generated_at: String,
    pub extent: DatasetExtent,
    pub params: TilingParams,
    pub point_count: usize,
    pub tiles: Vec<ManifestEntry>,
}

impl TileManifest {
    pub fn new(extent: DatasetExtent, params: TilingParams, point_count: usize) -> Self {
        Self {
            version: crate::VERSION.to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            extent,
            params,
            point_count,
            tiles: Vec::new(),
        }
    }

    pub fn record(&mut self, address: TileAddress, kind: TileMode, points: usize, preview: bool) {
        self.tiles.push(ManifestEntry {
            zoom: address.zoom,
            x: address.tile_x,
            y: address.tile_y,
            kind,
            points,
            preview,
        });
    }

    /// Sort entries by address for stable output
    pub fn sort(&mut self) {
        self.tiles.sort_by_key(|e| e.address());
    }

    pub fn find(&self, address: &TileAddress) -> Option<&ManifestEntry> {
        self.tiles.iter().find(|e| e.address() == *address)
    }

    /// Points owned by non-preview tiles; equals `point_count` for a complete run
    pub fn assigned_points(&self) -> usize {
        self.tiles.iter().filter(|e| !e.preview).map(|e| e.points).sum()
    }

    pub fn count_kind(&self, kind: TileMode) -> usize {
        self.tiles
            .iter()
            .filter(|e| !e.preview && e.kind == kind)
            .count()
    }

    pub fn zooms(&self) -> Vec<ZoomLevel> {
        let mut zooms: Vec<_> = self.tiles.iter().map(|e| e.zoom).collect();
        zooms.sort_unstable();
        zooms.dedup();
        zooms
    }
}
