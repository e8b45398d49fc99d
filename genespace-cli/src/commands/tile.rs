//! Tile command implementation - build the vector/raster tile pyramid for a dataset

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use genespace_core::{load_points, FsTileStore, TileMode, ZoomLevel};
use genespace_render::{PipelineOptions, TilingPipeline, TilingReport};

use crate::config::Config;
use crate::error::CliError;

/// Command-line values that take precedence over the configuration file
#[derive(Debug, Clone, Default)]
pub struct TileOverrides {
    pub out: Option<PathBuf>,
    pub min_zoom: Option<ZoomLevel>,
    pub max_zoom: Option<ZoomLevel>,
    pub threshold: Option<i64>,
    pub tile_size: Option<u32>,
    pub preview_deferred: bool,
}

impl TileOverrides {
    pub fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(out) = &self.out {
            config.output.dir = out.clone();
        }
        if let Some(min_zoom) = self.min_zoom {
            config.tiling.min_zoom = min_zoom;
        }
        if let Some(max_zoom) = self.max_zoom {
            config.tiling.max_zoom = max_zoom;
        }
        if let Some(threshold) = self.threshold {
            config.tiling.threshold = threshold;
        }
        if let Some(tile_size) = self.tile_size {
            config.tiling.tile_size = tile_size;
        }
        config.output.preview_deferred |= self.preview_deferred;
        config
    }
}

pub fn execute(
    config: &Config,
    data: PathBuf,
    overrides: TileOverrides,
    report_path: Option<PathBuf>,
) -> Result<()> {
    let config = overrides.apply(config);
    config.validate()?;

    if !data.exists() {
        return Err(CliError::file_not_found(data).into());
    }

    log::info!("Loading points from: {}", data.display());
    let cloud = load_points(&data).map_err(CliError::from)?;
    log::info!("Loaded {} points", cloud.len());

    let store = FsTileStore::create(&config.output.dir)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to open tile directory: {}", config.output.dir.display()))?;

    let options = PipelineOptions {
        preview_deferred: config.output.preview_deferred,
    };
    let pipeline = TilingPipeline::new(config.tiling, &config.raster, options, &store).map_err(CliError::from)?;
    let report = pipeline.run(&cloud).map_err(CliError::from)?;

    println!("{}", summarize(&report, store.root()));

    if let Some(path) = report_path {
        write_report(&report, &path)?;
        log::info!("Run report written to: {}", path.display());
    }

    if !report.is_complete() {
        return Err(CliError::tiling(format!(
            "{} of {} tiles could not be written",
            report.failures.len(),
            report.failures.len() + report.tiles.len()
        ))
        .into());
    }

    Ok(())
}

/// Human-readable run summary, one line per zoom
pub fn summarize(report: &TilingReport, root: &Path) -> String {
    let mut lines = vec![format!(
        "Tiled {} points into {} ({} vector, {} raster tiles)",
        report.points,
        root.display(),
        report.count_mode(TileMode::Vector),
        report.count_mode(TileMode::Raster)
    )];
    for zoom in &report.zooms {
        let mut line = format!(
            "  zoom {:>2}: {:>5} vector {:>5} raster {:>8} points assigned {:>8} deferred",
            zoom.zoom, zoom.vector_tiles, zoom.raster_tiles, zoom.assigned_points, zoom.deferred_points
        );
        if zoom.preview_tiles > 0 {
            line.push_str(&format!(", {} previews", zoom.preview_tiles));
        }
        if zoom.failed_tiles > 0 {
            line.push_str(&format!(", {} FAILED", zoom.failed_tiles));
        }
        lines.push(line);
    }
    for failure in &report.failures {
        lines.push(format!("  failed {} tile {}: {}", failure.mode, failure.address, failure.message));
    }
    lines.join("\n")
}

fn write_report(report: &TilingReport, path: &Path) -> Result<()> {
    let json = serde_json::to_vec_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json)
        .map_err(CliError::from)
        .with_context(|| format!("Failed to write run report: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use genespace_core::{TileAddress, TileStore};
    use tempfile::TempDir;

    fn write_dataset(dir: &Path) -> PathBuf {
        let path = dir.join("genes.csv");
        let mut rows = String::from("id,x,y,hypothetical\n");
        rows.push_str("A,0,0,NO\nB,1,1,NO\n");
        for (i, x) in [0.10, 0.11, 0.12, 0.13, 0.14].iter().enumerate() {
            rows.push_str(&format!("c{},{},0.1,YES\n", i, x));
        }
        std::fs::write(&path, rows).unwrap();
        path
    }

    fn overrides(out: &Path) -> TileOverrides {
        TileOverrides {
            out: Some(out.to_path_buf()),
            max_zoom: Some(1),
            threshold: Some(4),
            tile_size: Some(256),
            ..Default::default()
        }
    }

    #[test]
    fn test_overrides_take_precedence() {
        let config = Config::default();
        let applied = TileOverrides {
            threshold: Some(-1),
            preview_deferred: true,
            ..Default::default()
        }
        .apply(&config);
        assert_eq!(applied.tiling.threshold, -1);
        assert_eq!(applied.tiling.max_zoom, config.tiling.max_zoom);
        assert!(applied.output.preview_deferred);
    }

    #[test]
    fn test_tile_writes_pyramid_and_report() {
        let dir = TempDir::new().unwrap();
        let data = write_dataset(dir.path());
        let out = dir.path().join("tiles");
        let report_path = dir.path().join("report.json");

        execute(&Config::default(), data, overrides(&out), Some(report_path.clone())).unwrap();

        let store = FsTileStore::new(&out);
        assert_eq!(store.exists(&TileAddress::new(1, 0, 1)).unwrap(), Some(TileMode::Raster));
        assert_eq!(store.exists(&TileAddress::new(1, 1, 0)).unwrap(), Some(TileMode::Vector));
        assert_eq!(store.manifest().unwrap().unwrap().point_count, 7);

        let report: serde_json::Value = serde_json::from_slice(&std::fs::read(report_path).unwrap()).unwrap();
        assert_eq!(report["points"], 7);
    }

    #[test]
    fn test_missing_dataset_is_reported() {
        let dir = TempDir::new().unwrap();
        let err = execute(
            &Config::default(),
            dir.path().join("absent.json"),
            overrides(&dir.path().join("tiles")),
            None,
        )
        .unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::FileNotFound { .. })));
    }

    #[test]
    fn test_invalid_zoom_range_fails_before_writing() {
        let dir = TempDir::new().unwrap();
        let data = write_dataset(dir.path());
        let out = dir.path().join("tiles");
        let bad = TileOverrides {
            min_zoom: Some(3),
            ..overrides(&out)
        };

        let err = execute(&Config::default(), data, bad, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Config { .. })));
        assert!(!out.exists());
    }
}
