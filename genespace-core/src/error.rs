//! Error types shared by the tiling engine

use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;
use crate::types::ZoomLevel;

/// Errors raised while loading a dataset or planning a tiling run
#[derive(Debug, Error)]
pub enum GeneSpaceError {
    #[error("Failed to load dataset {}: {message}", path.display())]
    DataLoad { path: PathBuf, message: String },

    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{count} points remain unassigned after max zoom {max_zoom}")]
    UnassignedPoints { count: usize, max_zoom: ZoomLevel },

    #[error("Tile store error: {0}")]
    Store(#[from] StoreError),
}

impl GeneSpaceError {
    pub fn data_load<P: Into<PathBuf>, S: Into<String>>(path: P, message: S) -> Self {
        Self::DataLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration(message.into())
    }

    /// Fatal errors abort a run; everything else is a caller mistake surfaced early
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DataLoad { .. } | Self::UnassignedPoints { .. })
    }
}

pub type GeneSpaceResult<T> = Result<T, GeneSpaceError>;
