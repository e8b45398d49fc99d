//! Quadtree zoom planning
//!
//! Zoom `z` splits the normalized unit square into a `2^z x 2^z` grid. Cell
//! `(i, j)` counts columns left to right and rows bottom to top; it is
//! addressed as tile `(i, 2^z - 1 - j)` so that tile rows run top-down like
//! the map client expects.

use crate::types::{TileAddress, TileIndex, TileRect, ZoomLevel, MAX_SUPPORTED_ZOOM};

/// Breakpoints `k / 2^z` for `k = 0..=2^z`
pub fn zoom_splitter(zoom: ZoomLevel) -> Vec<f64> {
    let n = TileAddress::tiles_per_axis(zoom);
    (0..=n).map(|k| k as f64 / n as f64).collect()
}

/// Plan the tile grid for one zoom level; zooms beyond the supported maximum are clamped
pub fn plan(zoom: ZoomLevel) -> ZoomGrid {
    ZoomGrid::new(zoom.min(MAX_SUPPORTED_ZOOM))
}

/// Grid of tile rectangles for one zoom level
#[derive(Debug, Clone)]
pub struct ZoomGrid {
    zoom: ZoomLevel,
    edges: Vec<f64>,
}

impl ZoomGrid {
    fn new(zoom: ZoomLevel) -> Self {
        Self {
            zoom,
            edges: zoom_splitter(zoom),
        }
    }

    pub fn zoom(&self) -> ZoomLevel {
        self.zoom
    }

    pub fn tiles_per_axis(&self) -> TileIndex {
        (self.edges.len() - 1) as TileIndex
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Rectangle of cell `(i, j)`
    pub fn rect(&self, i: TileIndex, j: TileIndex) -> TileRect {
        let (i, j) = (i as usize, j as usize);
        TileRect::new(self.edges[i], self.edges[i + 1], self.edges[j], self.edges[j + 1])
    }

    pub fn address(&self, i: TileIndex, j: TileIndex) -> TileAddress {
        TileAddress::new(self.zoom, i, self.tiles_per_axis() - 1 - j)
    }

    /// Cell containing a normalized position.
    ///
    /// Agrees with [`TileRect::contains`]: the cell is `floor(v * n)`, with
    /// the closing edge at 1.0 folded into the last cell.
    pub fn cell_of(&self, nx: f64, ny: f64) -> (TileIndex, TileIndex) {
        (self.segment(nx), self.segment(ny))
    }

    fn segment(&self, v: f64) -> TileIndex {
        let n = self.tiles_per_axis();
        let k = (v * n as f64).floor();
        if k <= 0.0 {
            0
        } else if k >= (n - 1) as f64 {
            n - 1
        } else {
            k as TileIndex
        }
    }

    /// All rectangles, indexed `[i][j]`
    pub fn rects(&self) -> Vec<Vec<TileRect>> {
        let n = self.tiles_per_axis();
        (0..n)
            .map(|i| (0..n).map(|j| self.rect(i, j)).collect())
            .collect()
    }

    /// Every cell in column-major order, `i` outer and `j` inner
    pub fn iter(&self) -> impl Iterator<Item = (TileAddress, TileRect)> + '_ {
        let n = self.tiles_per_axis();
        (0..n).flat_map(move |i| (0..n).map(move |j| (self.address(i, j), self.rect(i, j))))
    }
}
