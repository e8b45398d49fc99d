//! Dataset loaders
//!
//! Points are read from JSON (`.json`) or delimited text (`.csv`, `.tsv`)
//! and validated into a [`PointCloud`].

pub mod csv;
pub mod json;

pub use self::csv::{CsvError, CsvPointParser};
pub use self::json::{JsonError, JsonPointParser};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::cloud::PointCloud;
use crate::error::{GeneSpaceError, GeneSpaceResult};
use crate::types::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointFormat {
    Json,
    Csv,
    Tsv,
}

impl PointFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(PointFormat::Json),
            "csv" => Some(PointFormat::Csv),
            "tsv" | "tab" => Some(PointFormat::Tsv),
            _ => None,
        }
    }
}

/// Read raw points from a file, choosing the parser by extension
pub fn read_points<P: AsRef<Path>>(path: P) -> GeneSpaceResult<Vec<Point>> {
    let path = path.as_ref();
    let format = PointFormat::from_path(path).ok_or_else(|| {
        GeneSpaceError::data_load(path, "unsupported file extension (expected .json, .csv or .tsv)")
    })?;

    let file = File::open(path).map_err(|e| GeneSpaceError::data_load(path, e.to_string()))?;
    let reader = BufReader::new(file);

    let points = match format {
        PointFormat::Json => JsonPointParser::parse(reader).map_err(|e| e.to_string()),
        PointFormat::Csv => CsvPointParser::new(b',').parse(reader).map_err(|e| e.to_string()),
        PointFormat::Tsv => CsvPointParser::new(b'\t').parse(reader).map_err(|e| e.to_string()),
    }
    .map_err(|message| GeneSpaceError::data_load(path, message))?;

    log::debug!("Read {} points from {}", points.len(), path.display());
    Ok(points)
}

/// Load and validate a dataset
pub fn load_points<P: AsRef<Path>>(path: P) -> GeneSpaceResult<PointCloud> {
    let path = path.as_ref();
    let points = read_points(path)?;
    PointCloud::new(points).map_err(|e| match e {
        GeneSpaceError::InvalidDataset(message) => GeneSpaceError::data_load(path, message),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(PointFormat::from_path("a/b.JSON"), Some(PointFormat::Json));
        assert_eq!(PointFormat::from_path("points.tsv"), Some(PointFormat::Tsv));
        assert_eq!(PointFormat::from_path("points.csv"), Some(PointFormat::Csv));
        assert_eq!(PointFormat::from_path("points.parquet"), None);
        assert_eq!(PointFormat::from_path("points"), None);
    }

    #[test]
    fn test_load_csv_file() {
        let file = write_temp(".csv", "id,x,y,label\nBRCA1,0.5,1.5,repair\nTP53,2.0,-1.0,\n");
        let cloud = load_points(file.path()).unwrap();
        assert_eq!(cloud.len(), 2);
        assert_eq!(cloud.extent().x_max, 2.0);
    }

    #[test]
    fn test_load_errors_name_the_file() {
        let file = write_temp(".json", r#"[{"id": "a", "x": 1, "y": 1}, {"id": "a", "x": 2, "y": 2}]"#);
        let err = load_points(file.path()).unwrap_err();
        assert!(matches!(err, GeneSpaceError::DataLoad { .. }));
        assert!(err.to_string().contains("duplicate"));

        let err = load_points("/definitely/not/here.csv").unwrap_err();
        assert!(err.is_fatal());

        let file = write_temp(".csv", "id,x,y\nfar-left,-1e308,0\nfar-right,1e308,1\n");
        let err = load_points(file.path()).unwrap_err();
        assert!(matches!(err, GeneSpaceError::DataLoad { .. }));
        assert!(err.to_string().contains("too wide"));

        let file = write_temp(".xlsx", "");
        assert!(load_points(file.path()).unwrap_err().to_string().contains("unsupported"));
    }
}
