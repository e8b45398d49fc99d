//! Query-side helpers: global map coordinates and initial view suggestions
//!
//! The map client lays the whole dataset out in a square of `tile_size`
//! units: `lng` grows to the right from 0, `lat` grows upward to 0 from
//! `-tile_size`.

use serde::{Deserialize, Serialize};

use crate::cloud::PointSet;
use crate::coords::DatasetExtent;
use crate::types::{AttributeMap, ZoomLevel};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

pub fn to_latlng(extent: &DatasetExtent, x: f64, y: f64, tile_size: u32) -> LatLng {
    let ts = tile_size as f64;
    LatLng {
        lat: -(1.0 - extent.normalize_y(y)) * ts,
        lng: extent.normalize_x(x) * ts,
    }
}

/// Zoom at which a span of `gap` normalized-to-map units fills about one tile
pub fn suggested_zoom_for_gap(gap: f64, tile_size: u32, max_zoom: ZoomLevel) -> ZoomLevel {
    let gap = gap.abs();
    if gap == 0.0 || !gap.is_finite() {
        return max_zoom;
    }
    let zoom = ((tile_size as f64).log2() - gap.log2()).floor();
    if zoom <= 0.0 {
        0
    } else if zoom >= max_zoom as f64 {
        max_zoom
    } else {
        zoom as ZoomLevel
    }
}

/// Center and zoom that frame a subset of points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewSummary {
    pub center: LatLng,
    pub zoom: ZoomLevel,
}

/// Frame `points` for the client. `None` for an empty selection.
pub fn suggest_view(points: &PointSet<'_>, tile_size: u32, max_zoom: ZoomLevel) -> Option<ViewSummary> {
    let bounds = points.bounds()?;
    let extent = points.cloud().extent();

    let low = to_latlng(extent, bounds.x_min, bounds.y_min, tile_size);
    let high = to_latlng(extent, bounds.x_max, bounds.y_max, tile_size);
    let center = LatLng {
        lat: (low.lat + high.lat) / 2.0,
        lng: (low.lng + high.lng) / 2.0,
    };

    let gap = (high.lng - low.lng).abs().max((high.lat - low.lat).abs());
    Some(ViewSummary {
        center,
        zoom: suggested_zoom_for_gap(gap, tile_size, max_zoom),
    })
}

/// One point in global map coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceFeature {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub value: AttributeMap,
}

/// Payload returned for a filtered selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpacesResponse {
    pub spaces: Vec<SpaceFeature>,
    pub latlng: Option<LatLng>,
    pub zoom: ZoomLevel,
}

pub fn spaces_response(points: &PointSet<'_>, tile_size: u32, max_zoom: ZoomLevel) -> SpacesResponse {
    let extent = points.cloud().extent();
    let spaces = points
        .iter()
        .map(|p| {
            let pos = to_latlng(extent, p.x, p.y, tile_size);
            SpaceFeature {
                id: p.id.clone(),
                x: pos.lng,
                y: pos.lat,
                value: p.attributes.clone(),
            }
        })
        .collect();

    let view = suggest_view(points, tile_size, max_zoom);
    SpacesResponse {
        spaces,
        latlng: view.map(|v| v.center),
        zoom: view.map_or(max_zoom, |v| v.zoom),
    }
}
