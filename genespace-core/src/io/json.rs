//! JSON point loader
//!
//! Accepts either a top-level array of records or an object with a `points`
//! array. Each record needs numeric `x` and `y`; `id` may be a string or a
//! number and defaults to the record index. Attributes come from an explicit
//! `attributes` object plus any other keys on the record.

use std::io::Read;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::types::{AttributeMap, Point};

#[derive(Debug, Error)]
pub enum JsonError {
    #[error("Malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Record {index}: {message}")]
    InvalidRecord { index: usize, message: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    List(Vec<RawPoint>),
    Wrapped { points: Vec<RawPoint> },
}

#[derive(Deserialize)]
struct RawPoint {
    #[serde(default)]
    id: Option<Value>,
    x: f64,
    y: f64,
    #[serde(default)]
    attributes: Option<AttributeMap>,
    #[serde(flatten)]
    extra: AttributeMap,
}

pub struct JsonPointParser;

impl JsonPointParser {
    pub fn parse<R: Read>(reader: R) -> Result<Vec<Point>, JsonError> {
        let document: Document = serde_json::from_reader(reader)?;
        let records = match document {
            Document::List(records) => records,
            Document::Wrapped { points } => points,
        };
        records
            .into_iter()
            .enumerate()
            .map(|(index, raw)| Self::convert(index, raw))
            .collect()
    }

    pub fn parse_str(input: &str) -> Result<Vec<Point>, JsonError> {
        Self::parse(input.as_bytes())
    }

    fn convert(index: usize, raw: RawPoint) -> Result<Point, JsonError> {
        let id = match raw.id {
            None | Some(Value::Null) => index.to_string(),
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(JsonError::InvalidRecord {
                    index,
                    message: format!("id must be a string or number, got {}", other),
                })
            }
        };

        let mut attributes = raw.extra;
        if let Some(explicit) = raw.attributes {
            attributes.extend(explicit);
        }

        Ok(Point {
            id,
            x: raw.x,
            y: raw.y,
            attributes,
        })
    }
}
