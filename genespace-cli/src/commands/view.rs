//! View command implementation - select points and frame them for the map client

use anyhow::{Context, Result};
use std::path::PathBuf;

use genespace_core::{
    load_points, spaces_response, FsTileStore, Point, PointCloud, PointSet, SpacesResponse, TileStore,
};

use crate::config::Config;
use crate::error::CliError;

/// `key=value` attribute match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub key: String,
    pub value: String,
}

impl AttributeFilter {
    pub fn parse(expr: &str) -> Result<Self> {
        let (key, value) = expr
            .split_once('=')
            .ok_or_else(|| CliError::validation(format!("expected key=value, got '{}'", expr)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(CliError::validation(format!("empty attribute name in '{}'", expr)).into());
        }
        Ok(Self {
            key: key.to_string(),
            value: value.trim().to_string(),
        })
    }

    pub fn matches(&self, point: &Point) -> bool {
        match self.key.as_str() {
            "id" => point.id == self.value,
            key => point.attribute_text(key).as_deref() == Some(self.value.as_str()),
        }
    }
}

/// Points matching every filter and, when ids are given, one of the ids
pub fn select<'a>(cloud: &'a PointCloud, filters: &[AttributeFilter], ids: &[String]) -> PointSet<'a> {
    cloud.filter(|p| {
        filters.iter().all(|f| f.matches(p)) && (ids.is_empty() || ids.iter().any(|id| *id == p.id))
    })
}

pub fn execute(
    config: &Config,
    tiles: PathBuf,
    data: PathBuf,
    filters: Vec<String>,
    ids: Vec<String>,
) -> Result<()> {
    let filters = filters
        .iter()
        .map(|f| AttributeFilter::parse(f))
        .collect::<Result<Vec<_>>>()?;

    if !data.exists() {
        return Err(CliError::file_not_found(data).into());
    }
    let cloud = load_points(&data).map_err(CliError::from)?;

    let response = respond(config, &FsTileStore::new(tiles), &cloud, &filters, &ids)?;
    let json = serde_json::to_string_pretty(&response).context("Failed to format view response")?;
    println!("{}", json);
    Ok(())
}

/// Build the `spaces` payload using the tile size and zoom range of the tiled run
pub fn respond(
    config: &Config,
    store: &dyn TileStore,
    cloud: &PointCloud,
    filters: &[AttributeFilter],
    ids: &[String],
) -> Result<SpacesResponse> {
    let params = match store.manifest().map_err(CliError::from)? {
        Some(manifest) => {
            if manifest.extent != *cloud.extent() || manifest.point_count != cloud.len() {
                log::warn!(
                    "Dataset does not match the tiled run ({} points tiled, {} loaded); positions may not line up",
                    manifest.point_count,
                    cloud.len()
                );
            }
            manifest.params
        }
        None => {
            log::warn!("No manifest in tile directory, using configured tiling parameters");
            config.tiling
        }
    };

    let selection = select(cloud, filters, ids);
    log::info!("Selected {} of {} points", selection.len(), cloud.len());
    Ok(spaces_response(&selection, params.tile_size, params.max_zoom))
}
