use serde::{Deserialize, Serialize};

use crate::assign::Threshold;
use crate::error::{GeneSpaceError, GeneSpaceResult};
use crate::types::{ZoomLevel, MAX_SUPPORTED_ZOOM};

pub const DEFAULT_TILE_SIZE: u32 = 1024;
pub const MIN_TILE_SIZE: u32 = 16;
pub const MAX_TILE_SIZE: u32 = 4096;

/// Parameters of one tiling run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TilingParams {
    /// First zoom allowed to claim points
    #[serde(default)]
    pub min_zoom: ZoomLevel,
    /// Zoom at which every remaining point is forced into a tile
    #[serde(default = "default_max_zoom")]
    pub max_zoom: ZoomLevel,
    /// Tiles with fewer points than this are claimed as vector tiles; -1 disables the limit
    #[serde(default = "default_threshold")]
    pub threshold: i64,
    /// Logical tile edge in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
}

impl Default for TilingParams {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: default_max_zoom(),
            threshold: default_threshold(),
            tile_size: default_tile_size(),
        }
    }
}

impl TilingParams {
    pub fn validate(&self) -> GeneSpaceResult<()> {
        if self.max_zoom > MAX_SUPPORTED_ZOOM {
            return Err(GeneSpaceError::configuration(format!(
                "max_zoom {} exceeds the supported maximum of {}",
                self.max_zoom, MAX_SUPPORTED_ZOOM
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(GeneSpaceError::configuration(format!(
                "min_zoom {} is greater than max_zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !(MIN_TILE_SIZE..=MAX_TILE_SIZE).contains(&self.tile_size) {
            return Err(GeneSpaceError::configuration(format!(
                "tile_size {} must be between {} and {}",
                self.tile_size, MIN_TILE_SIZE, MAX_TILE_SIZE
            )));
        }
        self.threshold_limit().map(|_| ())
    }

    pub fn threshold_limit(&self) -> GeneSpaceResult<Threshold> {
        Threshold::from_signed(self.threshold)
    }

    pub fn zoom_levels(&self) -> impl Iterator<Item = ZoomLevel> {
        self.min_zoom..=self.max_zoom
    }
}

fn default_max_zoom() -> ZoomLevel {
    6
}

fn default_threshold() -> i64 {
    2000
}

fn default_tile_size() -> u32 {
    DEFAULT_TILE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let params = TilingParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.tile_size, 1024);
        assert_eq!(params.zoom_levels().count(), 7);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad = [
            TilingParams { min_zoom: 4, max_zoom: 2, ..Default::default() },
            TilingParams { max_zoom: MAX_SUPPORTED_ZOOM + 1, ..Default::default() },
            TilingParams { threshold: 0, ..Default::default() },
            TilingParams { threshold: -5, ..Default::default() },
            TilingParams { tile_size: 8, ..Default::default() },
        ];
        for params in bad {
            assert!(
                matches!(params.validate(), Err(GeneSpaceError::Configuration(_))),
                "{:?} should be rejected",
                params
            );
        }
    }

    #[test]
    fn test_unbounded_threshold() {
        let params = TilingParams { threshold: -1, ..Default::default() };
        assert!(params.validate().is_ok());
        assert_eq!(params.threshold_limit().unwrap(), Threshold::Unbounded);
    }

    #[test]
    fn test_partial_deserialize() {
        let params: TilingParams = serde_json::from_str(r#"{"max_zoom": 3}"#).unwrap();
        assert_eq!(params.max_zoom, 3);
        assert_eq!(params.threshold, 2000);
        assert_eq!(params.min_zoom, 0);
    }
}
