use genespace_core::{GeneSpaceError, StoreError, TileAddress};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to encode tile {address}: {message}")]
    Encode { address: TileAddress, message: String },

    #[error("Invalid color '{0}' (expected #rrggbb)")]
    InvalidColor(String),

    #[error("Invalid raster style: {0}")]
    InvalidStyle(String),

    #[error(transparent)]
    Tiling(#[from] GeneSpaceError),

    #[error("Tile store error: {0}")]
    Store(#[from] StoreError),
}

pub type RenderResult<T> = Result<T, RenderError>;
