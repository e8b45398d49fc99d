//! Mapping between raw dataset coordinates, the normalized unit square and tile pixels

use serde::{Deserialize, Serialize};

use crate::types::{Point, TileRect};

/// Normalized position assigned to every value on an axis with zero span
pub const DEGENERATE_AXIS_POSITION: f64 = 0.5;

/// Min-max normalize `value` into `[0, 1]` relative to `[min, max]`
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span == 0.0 {
        return DEGENERATE_AXIS_POSITION;
    }
    (value - min) / span
}

/// Inverse of [`normalize`]
pub fn denormalize(value: f64, min: f64, max: f64) -> f64 {
    value * (max - min) + min
}

/// Round a unit-interval position to a pixel offset in a tile of `tile_size` pixels
pub fn to_pixel(value: f64, tile_size: u32) -> i64 {
    (value * tile_size as f64 + 0.5).floor() as i64
}

/// Pixel position of a normalized point inside `rect`, origin at the tile's top-left.
///
/// Points outside `rect` yield offsets outside `0..=tile_size`.
pub fn local_pixel(rect: &TileRect, nx: f64, ny: f64, tile_size: u32) -> (i64, i64) {
    let px = to_pixel(rect.local_x(nx), tile_size);
    let py = tile_size as i64 - to_pixel(rect.local_y(ny), tile_size);
    (px, py)
}

/// Raw bounds of a dataset, fixed at load time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetExtent {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl DatasetExtent {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self { x_min, x_max, y_min, y_max }
    }

    /// Bounding box of the given points, `None` when there are none
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extent = Self::new(first.x, first.x, first.y, first.y);
        for p in iter {
            extent.x_min = extent.x_min.min(p.x);
            extent.x_max = extent.x_max.max(p.x);
            extent.y_min = extent.y_min.min(p.y);
            extent.y_max = extent.y_max.max(p.y);
        }
        Some(extent)
    }

    pub fn normalize_x(&self, x: f64) -> f64 {
        normalize(x, self.x_min, self.x_max)
    }

    pub fn normalize_y(&self, y: f64) -> f64 {
        normalize(y, self.y_min, self.y_max)
    }

    pub fn denormalize_x(&self, nx: f64) -> f64 {
        denormalize(nx, self.x_min, self.x_max)
    }

    pub fn denormalize_y(&self, ny: f64) -> f64 {
        denormalize(ny, self.y_min, self.y_max)
    }

    pub fn normalize_point(&self, point: &Point) -> (f64, f64) {
        (self.normalize_x(point.x), self.normalize_y(point.y))
    }

    /// Raw-space rectangle covered by a normalized rectangle
    pub fn denormalize_rect(&self, rect: &TileRect) -> TileRect {
        TileRect::new(
            self.denormalize_x(rect.x_min),
            self.denormalize_x(rect.x_max),
            self.denormalize_y(rect.y_min),
            self.denormalize_y(rect.y_max),
        )
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn is_degenerate(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }
}
