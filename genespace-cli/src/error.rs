//! Error handling for the GeneSpace CLI

use std::path::PathBuf;
use thiserror::Error;

use genespace_core::{GeneSpaceError, StoreError};
use genespace_render::RenderError;

/// Main error type for GeneSpace CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Input/Output error: {message}")]
    Io { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to load dataset {path}: {message}")]
    DataLoad { path: String, message: String },

    #[error("Tiling error: {message}")]
    Tiling { message: String },

    #[error("Tile store error: {message}")]
    Store { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl CliError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io { message: message.into() }
    }

    pub fn file_not_found(path: PathBuf) -> Self {
        Self::FileNotFound { path }
    }

    pub fn data_load<S: Into<String>>(path: S, message: S) -> Self {
        Self::DataLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn tiling<S: Into<String>>(message: S) -> Self {
        Self::Tiling { message: message.into() }
    }

    pub fn store<S: Into<String>>(message: S) -> Self {
        Self::Store { message: message.into() }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::io(err.to_string())
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for CliError {
    fn from(err: toml::ser::Error) -> Self {
        Self::config(format!("TOML serialization error: {}", err))
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        Self::store(err.to_string())
    }
}

impl From<GeneSpaceError> for CliError {
    fn from(err: GeneSpaceError) -> Self {
        match err {
            GeneSpaceError::DataLoad { path, message } => Self::data_load(path.display().to_string(), message),
            GeneSpaceError::Configuration(message) => Self::Config { message },
            GeneSpaceError::Store(err) => err.into(),
            other => Self::tiling(other.to_string()),
        }
    }
}

impl From<RenderError> for CliError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Tiling(err) => err.into(),
            RenderError::Store(err) => err.into(),
            RenderError::InvalidColor(_) | RenderError::InvalidStyle(_) => Self::config(err.to_string()),
            other => Self::tiling(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Provide helpful error messages and suggestions
pub fn format_error_with_suggestions(error: &CliError) -> String {
    let mut message = error.to_string();

    match error {
        CliError::FileNotFound { path } => {
            message.push_str(&format!(
                "\n\nSuggestions:\n\
                 • Check that the path is correct: {}\n\
                 • Ensure you have read permissions for it",
                path.display()
            ));
        }

        CliError::DataLoad { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Datasets must be .json, .csv or .tsv files\n\
                 • CSV/TSV files need a header row with x and y columns\n\
                 • Point ids must be unique and coordinates finite",
            );
        }

        CliError::Config { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check your genespace.toml configuration file\n\
                 • Use 'genespace config --example' to generate a sample configuration\n\
                 • max_zoom may not exceed 16 and threshold must be positive or -1",
            );
        }

        CliError::Tiling { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Raise --max-zoom so dense regions can be split further\n\
                 • Lower --threshold to rasterize dense tiles earlier\n\
                 • Run with -v to see which tiles were deferred or failed",
            );
        }

        CliError::Store { .. } => {
            message.push_str(
                "\n\nSuggestions:\n\
                 • Check that the tile directory exists and is writable\n\
                 • Re-run 'genespace tile' to regenerate missing tiles",
            );
        }

        _ => {}
    }

    message
}

/// Print error with helpful suggestions and exit
pub fn print_error_and_exit(error: &CliError) -> ! {
    eprintln!("Error: {}", format_error_with_suggestions(error));
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use genespace_core::TileAddress;

    #[test]
    fn test_error_creation() {
        let err = CliError::config("test message");
        assert!(matches!(err, CliError::Config { .. }));
        assert_eq!(err.to_string(), "Configuration error: test message");
    }

    #[test]
    fn test_error_suggestions() {
        let err = CliError::file_not_found(PathBuf::from("genes.json"));
        let formatted = format_error_with_suggestions(&err);
        assert!(formatted.contains("Suggestions:"));
        assert!(formatted.contains("Check that the path is correct"));

        let plain = format_error_with_suggestions(&CliError::validation("bad"));
        assert!(!plain.contains("Suggestions:"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(matches!(cli_err, CliError::Io { .. }));
    }

    #[test]
    fn test_engine_error_mapping() {
        let err: CliError = GeneSpaceError::configuration("min_zoom above max_zoom").into();
        assert!(matches!(err, CliError::Config { .. }));

        let err: CliError = GeneSpaceError::UnassignedPoints { count: 3, max_zoom: 2 }.into();
        assert!(matches!(err, CliError::Tiling { .. }));

        let err: CliError = RenderError::Store(StoreError::NotFound(TileAddress::new(1, 0, 0))).into();
        assert!(matches!(err, CliError::Store { .. }));
        assert!(err.to_string().contains("1/0_0"));

        let err: CliError = RenderError::InvalidColor("nope".into()).into();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
