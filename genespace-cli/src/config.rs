//! Configuration handling for the GeneSpace CLI
//!
//! Supports loading configuration from genespace.toml files with CLI argument overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use genespace_core::TilingParams;
use genespace_render::RasterStyle;

use crate::error::{CliError, CliResult};

pub const DEFAULT_CONFIG_FILE: &str = "genespace.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub tiling: TilingParams,
    #[serde(default)]
    pub raster: RasterStyle,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Worker threads for tile rendering; 0 lets rayon decide
    #[serde(default)]
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Tile directory
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Also write overview rasters for tiles deferred to deeper zooms
    #[serde(default)]
    pub preview_deferred: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from("tiles") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            preview_deferred: false,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                log::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(path)?
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::info!("Loading configuration from: {}", DEFAULT_CONFIG_FILE);
                    Self::load_from_file(&default_path)?
                } else {
                    log::debug!("Using default configuration");
                    Self::default()
                }
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .map_err(CliError::from)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write configuration file: {}", path.display()))?;

        Ok(())
    }

    pub fn to_toml(&self) -> CliResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Generate example configuration file content
    pub fn example_toml() -> CliResult<String> {
        Self::default().to_toml()
    }

    /// Reject settings the tiling engine would refuse, before touching any files
    pub fn validate(&self) -> CliResult<()> {
        self.tiling.validate()?;
        self.raster.validate()?;
        if self.output.dir.as_os_str().is_empty() {
            return Err(CliError::config("output.dir must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genespace_render::ColorPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.threads, 0);
        assert_eq!(config.tiling.max_zoom, 6);
        assert_eq!(config.tiling.threshold, 2000);
        assert_eq!(config.tiling.tile_size, 1024);
        assert_eq!(config.output.dir, PathBuf::from("tiles"));
        assert!(!config.output.preview_deferred);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.tiling.threshold = -1;
        config.raster.color_policy = ColorPolicy::Attribute;
        config.raster.border_color = Some("#000000".into());
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded_config = Config::load_from_file(temp_file.path())?;

        assert_eq!(config.tiling, loaded_config.tiling);
        assert_eq!(config.raster, loaded_config.raster);
        assert_eq!(config.output.dir, loaded_config.output.dir);

        Ok(())
    }

    #[test]
    fn test_disabled_background_survives_roundtrip() -> Result<()> {
        let mut config = Config::default();
        config.raster.background_attribute = String::new();
        let temp_file = NamedTempFile::new()?;

        config.save_to_file(temp_file.path())?;
        let loaded_config = Config::load_from_file(temp_file.path())?;
        assert_eq!(loaded_config.raster.background_attribute, "");

        assert_eq!(Config::default().raster.background_attribute, "hypothetical");
        Ok(())
    }

    #[test]
    fn test_partial_file_keeps_defaults() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "[tiling]\nmax_zoom = 9\n\n[raster]\nhalo = false")?;

        let config = Config::load(Some(temp_file.path()))?;
        assert_eq!(config.tiling.max_zoom, 9);
        assert_eq!(config.tiling.threshold, 2000);
        assert!(!config.raster.halo);
        assert_eq!(config.raster.max_radius, RasterStyle::default().max_radius);
        Ok(())
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() -> Result<()> {
        let mut temp_file = NamedTempFile::new()?;
        writeln!(temp_file, "[tiling\nmax_zoom = ")?;

        let err = Config::load_from_file(temp_file.path()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CliError>(), Some(CliError::Config { .. })));
        Ok(())
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = Config::default();
        config.tiling.max_zoom = 17;
        assert!(matches!(config.validate(), Err(CliError::Config { .. })));

        let mut config = Config::default();
        config.raster.palette = vec!["not-a-color".into()];
        assert!(matches!(config.validate(), Err(CliError::Config { .. })));
    }

    #[test]
    fn test_example_toml_generation() {
        let example = Config::example_toml().unwrap();
        assert!(example.contains("[general]"));
        assert!(example.contains("[tiling]"));
        assert!(example.contains("[raster]"));
        assert!(example.contains("[output]"));
    }
}
