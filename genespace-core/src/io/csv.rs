//! Delimited-text point loader
//!
//! The header must name `x` and `y` columns. An `id` column is optional;
//! without it the row number is used. Every other non-empty cell becomes a
//! string attribute.

use std::io::Read;

use csv::ReaderBuilder;
use serde_json::Value;
use thiserror::Error;

use crate::types::{AttributeMap, Point};

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Row {row}: invalid {column} value '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },
}

pub struct CsvPointParser {
    delimiter: u8,
}

impl CsvPointParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn parse<R: Read>(&self, reader: R) -> Result<Vec<Point>, CsvError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let x_col = column("x").ok_or(CsvError::MissingColumn("x"))?;
        let y_col = column("y").ok_or(CsvError::MissingColumn("y"))?;
        let id_col = column("id");

        let mut points = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let number = |col: usize, name: &'static str| -> Result<f64, CsvError> {
                let raw = record.get(col).unwrap_or("");
                raw.parse::<f64>().map_err(|_| CsvError::InvalidNumber {
                    row: row + 1,
                    column: name,
                    value: raw.to_string(),
                })
            };
            let x = number(x_col, "x")?;
            let y = number(y_col, "y")?;

            let id = id_col
                .and_then(|c| record.get(c))
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| row.to_string());

            let mut attributes = AttributeMap::new();
            for (col, (name, value)) in headers.iter().zip(record.iter()).enumerate() {
                if col == x_col || col == y_col || Some(col) == id_col || value.is_empty() {
                    continue;
                }
                attributes.insert(name.to_string(), Value::String(value.to_string()));
            }

            points.push(Point { id, x, y, attributes });
        }

        Ok(points)
    }
}
