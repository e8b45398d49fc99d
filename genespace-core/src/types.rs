use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type ZoomLevel = u8;
pub type TileIndex = u32;

/// Attribute bag carried through untouched from the source dataset
pub type AttributeMap = BTreeMap<String, serde_json::Value>;

/// Deepest zoom the planner produces a grid for (65536 x 65536 tiles)
pub const MAX_SUPPORTED_ZOOM: ZoomLevel = 16;

/// One embedded gene/word vector reduced to raw x,y coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub id: String,
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub attributes: AttributeMap,
}

impl Point {
    pub fn new<S: Into<String>>(id: S, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            attributes: AttributeMap::new(),
        }
    }

    pub fn with_attribute<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<serde_json::Value>,
    {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }

    /// Attribute rendered as text; strings are returned without JSON quoting
    pub fn attribute_text(&self, key: &str) -> Option<String> {
        self.attributes.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// One cell of the quadtree at a given zoom. Rows are numbered top-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileAddress {
    pub zoom: ZoomLevel,
    pub tile_x: TileIndex,
    pub tile_y: TileIndex,
}

impl TileAddress {
    pub fn new(zoom: ZoomLevel, tile_x: TileIndex, tile_y: TileIndex) -> Self {
        Self { zoom, tile_x, tile_y }
    }

    pub fn tiles_per_axis(zoom: ZoomLevel) -> TileIndex {
        1 << zoom.min(MAX_SUPPORTED_ZOOM)
    }

    pub fn is_valid(&self) -> bool {
        let n = Self::tiles_per_axis(self.zoom);
        self.zoom <= MAX_SUPPORTED_ZOOM && self.tile_x < n && self.tile_y < n
    }

    /// Planner cell `(i, j)`, with `j` counted from the bottom of the unit square.
    /// `None` for addresses outside the grid of their zoom.
    pub fn grid_cell(&self) -> Option<(TileIndex, TileIndex)> {
        if !self.is_valid() {
            return None;
        }
        let n = Self::tiles_per_axis(self.zoom);
        let j = (n - 1).checked_sub(self.tile_y)?;
        Some((self.tile_x, j))
    }

    /// Normalized-space rectangle covered by this tile, if the address is on the grid
    pub fn rect(&self) -> Option<TileRect> {
        let n = Self::tiles_per_axis(self.zoom) as f64;
        let (i, j) = self.grid_cell()?;
        Some(TileRect::new(
            i as f64 / n,
            (i + 1) as f64 / n,
            j as f64 / n,
            (j + 1) as f64 / n,
        ))
    }

    pub fn parent(&self) -> Option<TileAddress> {
        if self.zoom == 0 {
            None
        } else {
            Some(TileAddress::new(self.zoom - 1, self.tile_x / 2, self.tile_y / 2))
        }
    }

    pub fn children(&self) -> [TileAddress; 4] {
        let zoom = self.zoom + 1;
        let x = self.tile_x * 2;
        let y = self.tile_y * 2;
        [
            TileAddress::new(zoom, x, y),
            TileAddress::new(zoom, x + 1, y),
            TileAddress::new(zoom, x, y + 1),
            TileAddress::new(zoom, x + 1, y + 1),
        ]
    }

    /// Addresses of the (up to eight) tiles sharing an edge or corner with this one
    pub fn neighbors(&self) -> Vec<TileAddress> {
        let n = Self::tiles_per_axis(self.zoom) as i64;
        let mut out = Vec::with_capacity(8);
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let x = self.tile_x as i64 + dx;
                let y = self.tile_y as i64 + dy;
                if (0..n).contains(&x) && (0..n).contains(&y) {
                    out.push(TileAddress::new(self.zoom, x as TileIndex, y as TileIndex));
                }
            }
        }
        out
    }
}

impl fmt::Display for TileAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}_{}", self.zoom, self.tile_x, self.tile_y)
    }
}

/// Normalized-space rectangle `[x_min, x_max) x [y_min, y_max)`.
///
/// Edges lying on 1.0 are closed so that the rectangles of one zoom level
/// partition the closed unit square.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileRect {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl TileRect {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    pub fn unit() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn contains(&self, nx: f64, ny: f64) -> bool {
        within(nx, self.x_min, self.x_max) && within(ny, self.y_min, self.y_max)
    }

    /// Position of a normalized x inside this rectangle, 0 at the left edge
    pub fn local_x(&self, nx: f64) -> f64 {
        (nx - self.x_min) / self.width()
    }

    /// Position of a normalized y inside this rectangle, 0 at the bottom edge
    pub fn local_y(&self, ny: f64) -> f64 {
        (ny - self.y_min) / self.height()
    }
}

fn within(v: f64, lo: f64, hi: f64) -> bool {
    if hi >= 1.0 {
        v >= lo && v <= hi
    } else {
        v >= lo && v < hi
    }
}

/// Materialized representation of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileMode {
    Vector,
    Raster,
}

impl TileMode {
    pub fn extension(&self) -> &'static str {
        match self {
            TileMode::Vector => "json",
            TileMode::Raster => "png",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "json" => Some(TileMode::Vector),
            "png" => Some(TileMode::Raster),
            _ => None,
        }
    }
}

impl fmt::Display for TileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileMode::Vector => write!(f, "vector"),
            TileMode::Raster => write!(f, "raster"),
        }
    }
}
