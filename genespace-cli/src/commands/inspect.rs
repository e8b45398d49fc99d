//! Inspect command implementation - report what was materialized at one tile address

use anyhow::{Context, Result};
use std::path::PathBuf;

use genespace_core::{lookup, FsTileStore, TileAddress, TileLookup, TileStore, ZoomLevel};

use crate::error::CliError;

pub fn execute(tiles: PathBuf, zoom: ZoomLevel, x: u32, y: u32) -> Result<()> {
    if !tiles.is_dir() {
        return Err(CliError::file_not_found(tiles).into());
    }

    let address = TileAddress::new(zoom, x, y);
    if !address.is_valid() {
        let n = TileAddress::tiles_per_axis(zoom);
        return Err(CliError::validation(format!(
            "tile {} is outside the {}x{} grid of zoom {}",
            address, n, n, zoom
        ))
        .into());
    }

    let store = FsTileStore::new(tiles);
    println!("{}", describe(&store, &address)?);
    Ok(())
}

/// Text report for one address: its kind and, for vector tiles, the document itself
pub fn describe(store: &dyn TileStore, address: &TileAddress) -> Result<String> {
    let manifest = store.manifest().map_err(CliError::from)?;
    let entry = manifest.as_ref().and_then(|m| m.find(address));

    let text = match lookup(store, address).map_err(CliError::from)? {
        TileLookup::Missing => format!("{}: no tile", address),
        TileLookup::Raster => {
            let mut text = format!("{}: raster tile", address);
            if let Some(entry) = entry {
                text.push_str(&format!(" with {} points", entry.points));
                if entry.preview {
                    text.push_str(" (preview of deferred points)");
                }
            }
            text
        }
        TileLookup::Vector(tile) => {
            let json = serde_json::to_string_pretty(&tile).context("Failed to format vector tile")?;
            format!("{}: vector tile with {} points\n{}", address, tile.len(), json)
        }
    };
    Ok(text)
}
