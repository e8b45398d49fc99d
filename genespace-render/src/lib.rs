/*!
# GeneSpace Tile Rendering

Materializes assigned tiles and drives a full tiling run.

Sparse tiles become vector documents listing their points in tile pixels;
dense tiles become PNG rasters of translucent dots. The [`TilingPipeline`]
walks the zoom levels in order and renders the tiles of each level in
parallel, writing them to a [`genespace_core::TileStore`].
*/

pub mod error;
pub mod materialize;
pub mod pipeline;
pub mod raster;
pub mod style;

pub use error::{RenderError, RenderResult};
pub use materialize::Materializer;
pub use pipeline::{PipelineOptions, TileFailure, TileRecord, TilingPipeline, TilingReport, ZoomStats};
pub use raster::{HaloIndex, RasterRenderer};
pub use style::{ColorPolicy, RasterStyle, ResolvedStyle};
