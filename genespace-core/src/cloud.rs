//! Loaded datasets and borrowed subsets of them

use std::collections::HashSet;
use std::fmt;

use crate::coords::DatasetExtent;
use crate::error::{GeneSpaceError, GeneSpaceResult};
use crate::types::Point;

/// A validated dataset together with its extent and normalized coordinates.
///
/// The extent is computed once here and never recomputed for subsets, so every
/// zoom level normalizes against the same bounds.
#[derive(Debug, Clone)]
pub struct PointCloud {
    points: Vec<Point>,
    extent: DatasetExtent,
    normalized: Vec<(f64, f64)>,
}

impl PointCloud {
    /// Validate `points` and precompute normalized coordinates.
    ///
    /// Rejects empty input, non-finite coordinates, duplicate ids and extents
    /// whose span overflows `f64`.
    pub fn new(points: Vec<Point>) -> GeneSpaceResult<Self> {
        validate(&points)?;

        let extent = DatasetExtent::from_points(&points)
            .ok_or_else(|| GeneSpaceError::InvalidDataset("dataset contains no points".into()))?;
        if !extent.width().is_finite() || !extent.height().is_finite() {
            return Err(GeneSpaceError::InvalidDataset(format!(
                "extent x [{}, {}] y [{}, {}] is too wide to normalize",
                extent.x_min, extent.x_max, extent.y_min, extent.y_max
            )));
        }
        let normalized = points.iter().map(|p| extent.normalize_point(p)).collect();

        Ok(Self {
            points,
            extent,
            normalized,
        })
    }

    pub fn extent(&self) -> &DatasetExtent {
        &self.extent
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    pub fn normalized(&self, index: usize) -> (f64, f64) {
        self.normalized[index]
    }

    pub fn all(&self) -> PointSet<'_> {
        PointSet::from_indices(self, (0..self.points.len()).collect())
    }

    pub fn filter<F>(&self, mut predicate: F) -> PointSet<'_>
    where
        F: FnMut(&Point) -> bool,
    {
        let indices = self
            .points
            .iter()
            .enumerate()
            .filter(|(_, p)| predicate(p))
            .map(|(i, _)| i)
            .collect();
        PointSet::from_indices(self, indices)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }
}

fn validate(points: &[Point]) -> GeneSpaceResult<()> {
    let mut seen = HashSet::with_capacity(points.len());
    for (index, p) in points.iter().enumerate() {
        if !p.x.is_finite() || !p.y.is_finite() {
            return Err(GeneSpaceError::InvalidDataset(format!(
                "point '{}' (record {}) has non-finite coordinates ({}, {})",
                p.id, index, p.x, p.y
            )));
        }
        if !seen.insert(p.id.as_str()) {
            return Err(GeneSpaceError::InvalidDataset(format!(
                "duplicate point id '{}' at record {}",
                p.id, index
            )));
        }
    }
    Ok(())
}

/// Subset of a [`PointCloud`] addressed by record index, in input order
#[derive(Clone)]
pub struct PointSet<'a> {
    cloud: &'a PointCloud,
    indices: Vec<usize>,
}

impl<'a> PointSet<'a> {
    pub fn from_indices(cloud: &'a PointCloud, indices: Vec<usize>) -> Self {
        debug_assert!(indices.iter().all(|&i| i < cloud.len()));
        Self { cloud, indices }
    }

    pub fn empty(cloud: &'a PointCloud) -> Self {
        Self::from_indices(cloud, Vec::new())
    }

    pub fn cloud(&self) -> &'a PointCloud {
        self.cloud
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Point> + '_ {
        let cloud = self.cloud;
        self.indices.iter().map(move |&i| cloud.point(i))
    }

    /// Points paired with their normalized coordinates
    pub fn iter_normalized(&self) -> impl Iterator<Item = (&'a Point, (f64, f64))> + '_ {
        let cloud = self.cloud;
        self.indices
            .iter()
            .map(move |&i| (cloud.point(i), cloud.normalized(i)))
    }

    pub fn ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.iter().map(|p| p.id.as_str())
    }

    /// Raw bounding box of this subset
    pub fn bounds(&self) -> Option<DatasetExtent> {
        DatasetExtent::from_points(self.iter())
    }
}

impl fmt::Debug for PointSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointSet")
            .field("len", &self.indices.len())
            .finish()
    }
}
