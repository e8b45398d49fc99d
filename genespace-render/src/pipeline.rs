//! Batch tiling pipeline
//!
//! Zoom levels run in order because each pass consumes the previous pass's
//! leftover points. Within one zoom every tile is independent and is
//! materialized and written on the rayon pool.

use rayon::prelude::*;
use serde::Serialize;

use genespace_core::{
    PointCloud, TileAddress, TileAssignment, TileManifest, TileMode, TileStore, TilingParams,
    ZoomLevel, ZoomPass, ZoomWalker,
};

use crate::error::{RenderError, RenderResult};
use crate::materialize::Materializer;
use crate::raster::HaloIndex;
use crate::style::RasterStyle;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Also render deferred tiles as overview rasters at their zoom
    pub preview_deferred: bool,
}

/// Per-zoom counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoomStats {
    pub zoom: ZoomLevel,
    pub vector_tiles: usize,
    pub raster_tiles: usize,
    pub preview_tiles: usize,
    pub assigned_points: usize,
    pub deferred_points: usize,
    pub failed_tiles: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileRecord {
    pub address: TileAddress,
    pub mode: TileMode,
    pub points: usize,
    pub preview: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TileFailure {
    pub address: TileAddress,
    pub mode: TileMode,
    pub message: String,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct TilingReport {
    pub points: usize,
    pub zooms: Vec<ZoomStats>,
    /// Successfully written tiles, sorted by address
    pub tiles: Vec<TileRecord>,
    pub failures: Vec<TileFailure>,
}

impl TilingReport {
    pub fn count_mode(&self, mode: TileMode) -> usize {
        self.tiles
            .iter()
            .filter(|t| !t.preview && t.mode == mode)
            .count()
    }

    /// Points held by written, non-preview tiles
    pub fn assigned_points(&self) -> usize {
        self.tiles.iter().filter(|t| !t.preview).map(|t| t.points).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct TilingPipeline<'s> {
    params: TilingParams,
    materializer: Materializer,
    halo: bool,
    options: PipelineOptions,
    store: &'s dyn TileStore,
}

impl<'s> TilingPipeline<'s> {
    pub fn new(
        params: TilingParams,
        style: &RasterStyle,
        options: PipelineOptions,
        store: &'s dyn TileStore,
    ) -> RenderResult<Self> {
        params.validate()?;
        let materializer = Materializer::new(params.tile_size, style)?;
        Ok(Self {
            params,
            materializer,
            halo: style.halo,
            options,
            store,
        })
    }

    pub fn params(&self) -> &TilingParams {
        &self.params
    }

    /// Tile `cloud` into the store, replacing the output of any previous run.
    ///
    /// Per-tile failures are logged and collected in the report; the run
    /// itself only fails on configuration, store-reset, manifest or
    /// unassigned-point errors.
    pub fn run(&self, cloud: &PointCloud) -> RenderResult<TilingReport> {
        let extent = cloud.extent();
        log::info!(
            "Tiling {} points, extent x [{}, {}] y [{}, {}], zooms {}..={}, threshold {}",
            cloud.len(),
            extent.x_min,
            extent.x_max,
            extent.y_min,
            extent.y_max,
            self.params.min_zoom,
            self.params.max_zoom,
            self.params.threshold
        );

        self.store.reset()?;
        let mut manifest = TileManifest::new(*extent, self.params, cloud.len());
        let mut report = TilingReport {
            points: cloud.len(),
            ..Default::default()
        };

        let mut walker = ZoomWalker::new(cloud, self.params)?;
        for pass in walker.by_ref() {
            let stats = self.run_pass(&pass, &mut report, &mut manifest);
            log::info!(
                "Zoom {}: {} vector, {} raster, {} preview tiles; {} points deferred{}",
                stats.zoom,
                stats.vector_tiles,
                stats.raster_tiles,
                stats.preview_tiles,
                stats.deferred_points,
                if stats.failed_tiles > 0 {
                    format!("; {} tiles failed", stats.failed_tiles)
                } else {
                    String::new()
                }
            );
            report.zooms.push(stats);
        }
        walker.finish()?;

        manifest.sort();
        self.store.put_manifest(&manifest)?;

        report.tiles.sort_by_key(|t| t.address);
        report.failures.sort_by_key(|f| f.address);
        log::info!(
            "Tiling complete: {} tiles written, {} failed",
            report.tiles.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn run_pass(
        &self,
        pass: &ZoomPass<'_>,
        report: &mut TilingReport,
        manifest: &mut TileManifest,
    ) -> ZoomStats {
        let previews: &[TileAssignment<'_>] = if self.options.preview_deferred {
            &pass.deferred
        } else {
            &[]
        };
        let jobs: Vec<(&TileAssignment<'_>, bool)> = pass
            .assignments
            .iter()
            .map(|a| (a, false))
            .chain(previews.iter().map(|a| (a, true)))
            .collect();

        let halo = if self.halo {
            HaloIndex::new(jobs.iter().map(|(a, _)| *a))
        } else {
            HaloIndex::empty()
        };
        let radius = self.materializer.raster().style().radius_for(pass.zoom);

        let results: Vec<(TileRecord, RenderResult<()>)> = jobs
            .par_iter()
            .map(|&(tile, preview)| {
                let record = TileRecord {
                    address: tile.address,
                    mode: tile.mode,
                    points: tile.len(),
                    preview,
                };
                (record, self.write_tile(tile, &halo, radius))
            })
            .collect();

        let mut stats = ZoomStats {
            zoom: pass.zoom,
            deferred_points: pass.remaining,
            ..Default::default()
        };
        for (record, result) in results {
            match result {
                Ok(()) => {
                    match (record.preview, record.mode) {
                        (true, _) => stats.preview_tiles += 1,
                        (false, TileMode::Vector) => stats.vector_tiles += 1,
                        (false, TileMode::Raster) => stats.raster_tiles += 1,
                    }
                    if !record.preview {
                        stats.assigned_points += record.points;
                    }
                    manifest.record(record.address, record.mode, record.points, record.preview);
                    report.tiles.push(record);
                }
                Err(e) => {
                    log::warn!("Failed to materialize {} tile {}: {}", record.mode, record.address, e);
                    stats.failed_tiles += 1;
                    report.failures.push(TileFailure {
                        address: record.address,
                        mode: record.mode,
                        message: e.to_string(),
                    });
                }
            }
        }
        stats
    }

    fn write_tile(&self, tile: &TileAssignment<'_>, halo: &HaloIndex<'_, '_>, radius: u32) -> Result<(), RenderError> {
        let neighbours = match tile.mode {
            TileMode::Raster => halo.gather(&tile.address, radius, self.materializer.tile_size()),
            TileMode::Vector => Vec::new(),
        };
        let materialized = self.materializer.materialize(
            &tile.address,
            &tile.rect,
            tile.mode,
            &tile.points,
            &neighbours,
        )?;
        self.store.put(&tile.address, &materialized)?;
        log::trace!("Wrote {} tile {} ({} points)", tile.mode, tile.address, tile.len());
        Ok(())
    }
}
