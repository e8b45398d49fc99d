//! GeneSpace Core Library
//!
//! Point model, coordinate normalization, quadtree zoom planning, tile
//! assignment and tile storage for gene-space explorer maps.

pub mod assign;
pub mod cloud;
pub mod coords;
pub mod error;
pub mod io;
pub mod manifest;
pub mod params;
pub mod planner;
pub mod store;
pub mod tiles;
pub mod types;
pub mod view;

// Re-export commonly used types and functions
pub use assign::{assign, AssignOutcome, AssignPolicy, Threshold, TileAssignment, ZoomPass, ZoomWalker};
pub use cloud::{PointCloud, PointSet};
pub use coords::{denormalize, local_pixel, normalize, to_pixel, DatasetExtent};
pub use error::{GeneSpaceError, GeneSpaceResult};
pub use io::load_points;
pub use manifest::{ManifestEntry, TileManifest};
pub use params::TilingParams;
pub use planner::{plan, zoom_splitter, ZoomGrid};
pub use store::{lookup, FsTileStore, InMemoryTileStore, StoreError, StoreResult, TileLookup, TileStore};
pub use tiles::{RasterTile, Tile, VectorFeature, VectorTile};
pub use types::{AttributeMap, Point, TileAddress, TileMode, TileRect, ZoomLevel};
pub use view::{spaces_response, suggest_view, to_latlng, LatLng, SpaceFeature, SpacesResponse, ViewSummary};

/// Version information for the GeneSpace core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
