//! Tile storage
//!
//! Tiles live at `{root}/{zoom}/{x}_{y}.json` (vector) or `.png` (raster),
//! with a `manifest.json` alongside. Writes go through a temporary file in the
//! destination directory followed by a rename, so a reader sees a tile as
//! either absent or complete.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::manifest::{TileManifest, MANIFEST_FILE};
use crate::tiles::{RasterTile, Tile, VectorTile};
use crate::types::{TileAddress, TileMode, ZoomLevel};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tile {0} not found")]
    NotFound(TileAddress),

    #[error("Tile {0} is not a vector tile")]
    NotVector(TileAddress),

    #[error("Invalid tile path: {0}")]
    InvalidPath(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Destination for materialized tiles.
///
/// Implementations must be safe to call from several worker threads at once.
pub trait TileStore: Send + Sync {
    fn exists(&self, address: &TileAddress) -> StoreResult<Option<TileMode>>;
    fn put(&self, address: &TileAddress, tile: &Tile) -> StoreResult<()>;
    fn get(&self, address: &TileAddress) -> StoreResult<Option<Tile>>;
    fn list(&self, zoom: Option<ZoomLevel>) -> StoreResult<Vec<(TileAddress, TileMode)>>;
    /// Remove every tile and the manifest from a previous run
    fn reset(&self) -> StoreResult<()>;
    fn put_manifest(&self, manifest: &TileManifest) -> StoreResult<()>;
    fn manifest(&self) -> StoreResult<Option<TileManifest>>;

    fn get_vector(&self, address: &TileAddress) -> StoreResult<VectorTile> {
        match self.get(address)? {
            Some(Tile::Vector(tile)) => Ok(tile),
            Some(Tile::Raster(_)) => Err(StoreError::NotVector(*address)),
            None => Err(StoreError::NotFound(*address)),
        }
    }

    fn get_raster(&self, address: &TileAddress) -> StoreResult<RasterTile> {
        match self.get(address)? {
            Some(Tile::Raster(tile)) => Ok(tile),
            Some(Tile::Vector(_)) => Err(StoreError::InvalidPath(format!(
                "{} is a vector tile",
                address
            ))),
            None => Err(StoreError::NotFound(*address)),
        }
    }
}

/// What a client should do for a requested tile
#[derive(Debug, Clone, PartialEq)]
pub enum TileLookup {
    /// Nothing was materialized at this address
    Missing,
    /// Fetch the PNG
    Raster,
    /// Draw these points
    Vector(VectorTile),
}

pub fn lookup(store: &dyn TileStore, address: &TileAddress) -> StoreResult<TileLookup> {
    match store.exists(address)? {
        None => Ok(TileLookup::Missing),
        Some(TileMode::Raster) => Ok(TileLookup::Raster),
        Some(TileMode::Vector) => Ok(TileLookup::Vector(store.get_vector(address)?)),
    }
}

/// Directory-backed tile store
#[derive(Debug, Clone)]
pub struct FsTileStore {
    root: PathBuf,
}

impl FsTileStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    /// Open a store, creating its root directory if needed
    pub fn create<P: Into<PathBuf>>(root: P) -> StoreResult<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_path(&self, address: &TileAddress, mode: TileMode) -> PathBuf {
        self.root
            .join(address.zoom.to_string())
            .join(format!("{}_{}.{}", address.tile_x, address.tile_y, mode.extension()))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidPath(path.display().to_string()))?;
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn remove_if_exists(path: &Path) -> StoreResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn zoom_dirs(&self) -> StoreResult<Vec<(ZoomLevel, PathBuf)>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(zoom) = entry.file_name().to_str().and_then(|n| n.parse::<ZoomLevel>().ok()) {
                dirs.push((zoom, entry.path()));
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

/// Parse `{x}_{y}.{ext}` back into tile coordinates and mode
fn parse_tile_file(name: &str) -> Option<(u32, u32, TileMode)> {
    let (stem, ext) = name.rsplit_once('.')?;
    let mode = TileMode::from_extension(ext)?;
    let (x, y) = stem.split_once('_')?;
    Some((x.parse().ok()?, y.parse().ok()?, mode))
}

impl TileStore for FsTileStore {
    fn exists(&self, address: &TileAddress) -> StoreResult<Option<TileMode>> {
        for mode in [TileMode::Vector, TileMode::Raster] {
            if self.tile_path(address, mode).is_file() {
                return Ok(Some(mode));
            }
        }
        Ok(None)
    }

    fn put(&self, address: &TileAddress, tile: &Tile) -> StoreResult<()> {
        let mode = tile.mode();
        let bytes = tile.to_bytes()?;
        self.write_atomic(&self.tile_path(address, mode), &bytes)?;

        // An address holds exactly one kind of tile
        let other = match mode {
            TileMode::Vector => TileMode::Raster,
            TileMode::Raster => TileMode::Vector,
        };
        Self::remove_if_exists(&self.tile_path(address, other))
    }

    fn get(&self, address: &TileAddress) -> StoreResult<Option<Tile>> {
        match self.exists(address)? {
            None => Ok(None),
            Some(TileMode::Vector) => {
                let bytes = fs::read(self.tile_path(address, TileMode::Vector))?;
                Ok(Some(Tile::Vector(VectorTile::from_json(&bytes)?)))
            }
            Some(TileMode::Raster) => {
                let png = fs::read(self.tile_path(address, TileMode::Raster))?;
                let size = self
                    .manifest()?
                    .map(|m| m.params.tile_size)
                    .unwrap_or(crate::params::DEFAULT_TILE_SIZE);
                Ok(Some(Tile::Raster(RasterTile { size, png })))
            }
        }
    }

    fn list(&self, zoom: Option<ZoomLevel>) -> StoreResult<Vec<(TileAddress, TileMode)>> {
        let mut tiles = Vec::new();
        for (z, dir) in self.zoom_dirs()? {
            if zoom.map_or(false, |wanted| wanted != z) {
                continue;
            }
            for entry in fs::read_dir(&dir)? {
                let entry = entry?;
                let name = entry.file_name();
                if let Some((x, y, mode)) = name.to_str().and_then(parse_tile_file) {
                    tiles.push((TileAddress::new(z, x, y), mode));
                }
            }
        }
        tiles.sort_by_key(|(addr, _)| *addr);
        Ok(tiles)
    }

    fn reset(&self) -> StoreResult<()> {
        for (zoom, dir) in self.zoom_dirs()? {
            log::debug!("Removing zoom {} tiles at {}", zoom, dir.display());
            fs::remove_dir_all(&dir)?;
        }
        Self::remove_if_exists(&self.manifest_path())
    }

    fn put_manifest(&self, manifest: &TileManifest) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(manifest)?;
        self.write_atomic(&self.manifest_path(), &bytes)
    }

    fn manifest(&self) -> StoreResult<Option<TileManifest>> {
        match fs::read(self.manifest_path()) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Store that keeps tiles in memory, used by tests and dry runs
#[derive(Debug, Default)]
pub struct InMemoryTileStore {
    tiles: RwLock<BTreeMap<TileAddress, Tile>>,
    manifest: RwLock<Option<TileManifest>>,
}

impl InMemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.read().is_empty()
    }
}

impl TileStore for InMemoryTileStore {
    fn exists(&self, address: &TileAddress) -> StoreResult<Option<TileMode>> {
        Ok(self.tiles.read().get(address).map(Tile::mode))
    }

    fn put(&self, address: &TileAddress, tile: &Tile) -> StoreResult<()> {
        self.tiles.write().insert(*address, tile.clone());
        Ok(())
    }

    fn get(&self, address: &TileAddress) -> StoreResult<Option<Tile>> {
        Ok(self.tiles.read().get(address).cloned())
    }

    fn list(&self, zoom: Option<ZoomLevel>) -> StoreResult<Vec<(TileAddress, TileMode)>> {
        Ok(self
            .tiles
            .read()
            .iter()
            .filter(|(addr, _)| zoom.map_or(true, |z| addr.zoom == z))
            .map(|(addr, tile)| (*addr, tile.mode()))
            .collect())
    }

    fn reset(&self) -> StoreResult<()> {
        self.tiles.write().clear();
        *self.manifest.write() = None;
        Ok(())
    }

    fn put_manifest(&self, manifest: &TileManifest) -> StoreResult<()> {
        *self.manifest.write() = Some(manifest.clone());
        Ok(())
    }

    fn manifest(&self) -> StoreResult<Option<TileManifest>> {
        Ok(self.manifest.read().clone())
    }
}
