//! Tile assignment
//!
//! Each zoom pass buckets the still-unassigned points into the planned grid.
//! A bucket is claimed when its count is admitted by the pass threshold,
//! otherwise its points are deferred to the next zoom. The last pass is forced:
//! it claims every bucket and picks vector or raster by density.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cloud::{PointCloud, PointSet};
use crate::error::{GeneSpaceError, GeneSpaceResult};
use crate::params::TilingParams;
use crate::planner::{plan, ZoomGrid};
use crate::types::{TileAddress, TileIndex, TileMode, TileRect, ZoomLevel};

/// Upper bound (exclusive) on the number of points a tile may claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Threshold {
    Below(usize),
    Unbounded,
}

impl Threshold {
    pub fn new(limit: usize) -> GeneSpaceResult<Self> {
        if limit < 1 {
            return Err(GeneSpaceError::configuration("threshold must be at least 1"));
        }
        Ok(Threshold::Below(limit))
    }

    /// `-1` means no limit; any other value below 1 is rejected
    pub fn from_signed(value: i64) -> GeneSpaceResult<Self> {
        match value {
            -1 => Ok(Threshold::Unbounded),
            v if v >= 1 => Self::new(v as usize),
            v => Err(GeneSpaceError::configuration(format!(
                "threshold must be -1 or at least 1, got {}",
                v
            ))),
        }
    }

    pub fn admits(&self, count: usize) -> bool {
        match self {
            Threshold::Below(limit) => count < *limit,
            Threshold::Unbounded => true,
        }
    }

    fn as_limit(&self) -> usize {
        match self {
            Threshold::Below(limit) => *limit,
            Threshold::Unbounded => usize::MAX,
        }
    }
}

/// How one zoom pass decides which buckets to claim and in which mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignPolicy {
    /// Buckets admitted by this threshold are claimed
    pub claim: Threshold,
    /// Claimed buckets below this count become vector tiles, the rest raster
    pub vector_limit: usize,
}

impl AssignPolicy {
    /// Claim sparse tiles as vector and defer the rest
    pub fn deferring(threshold: Threshold) -> Self {
        Self {
            claim: threshold,
            vector_limit: threshold.as_limit(),
        }
    }

    /// Claim every non-empty tile, rasterizing the dense ones
    pub fn forced(threshold: Threshold) -> Self {
        Self {
            claim: Threshold::Unbounded,
            vector_limit: threshold.as_limit(),
        }
    }

    pub fn mode_for(&self, count: usize) -> TileMode {
        if count < self.vector_limit {
            TileMode::Vector
        } else {
            TileMode::Raster
        }
    }
}

/// A non-empty tile and the points it holds
#[derive(Debug, Clone)]
pub struct TileAssignment<'a> {
    pub address: TileAddress,
    pub rect: TileRect,
    pub mode: TileMode,
    pub points: PointSet<'a>,
}

impl TileAssignment<'_> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Result of assigning one working set at one zoom
#[derive(Debug)]
pub struct AssignOutcome<'a> {
    pub zoom: ZoomLevel,
    /// Claimed tiles, ordered by grid cell
    pub assignments: Vec<TileAssignment<'a>>,
    /// Buckets too dense to claim; their points make up `leftover`
    pub deferred: Vec<TileAssignment<'a>>,
    /// Points passed on to the next zoom, in input order
    pub leftover: PointSet<'a>,
}

/// Bucket `points` into `grid` and split the buckets into claimed and deferred.
///
/// Every input point lands in exactly one bucket, so each point ends up in
/// exactly one of `assignments` or `leftover`.
pub fn assign<'a>(points: &PointSet<'a>, grid: &ZoomGrid, policy: AssignPolicy) -> AssignOutcome<'a> {
    let cloud = points.cloud();
    let mut buckets: BTreeMap<(TileIndex, TileIndex), Vec<usize>> = BTreeMap::new();
    for &index in points.indices() {
        let (nx, ny) = cloud.normalized(index);
        buckets.entry(grid.cell_of(nx, ny)).or_default().push(index);
    }

    let mut assignments = Vec::new();
    let mut deferred = Vec::new();
    let mut leftover = Vec::new();

    for ((i, j), members) in buckets {
        let count = members.len();
        let address = grid.address(i, j);
        if policy.claim.admits(count) {
            assignments.push(TileAssignment {
                address,
                rect: grid.rect(i, j),
                mode: policy.mode_for(count),
                points: PointSet::from_indices(cloud, members),
            });
        } else {
            log::debug!("Deferring tile {} with {} points", address, count);
            leftover.extend_from_slice(&members);
            deferred.push(TileAssignment {
                address,
                rect: grid.rect(i, j),
                mode: TileMode::Raster,
                points: PointSet::from_indices(cloud, members),
            });
        }
    }

    leftover.sort_unstable();

    AssignOutcome {
        zoom: grid.zoom(),
        assignments,
        deferred,
        leftover: PointSet::from_indices(cloud, leftover),
    }
}

/// One zoom level of a tiling run
#[derive(Debug)]
pub struct ZoomPass<'a> {
    pub zoom: ZoomLevel,
    /// True for the max-zoom pass, where nothing is deferred
    pub forced: bool,
    pub assignments: Vec<TileAssignment<'a>>,
    pub deferred: Vec<TileAssignment<'a>>,
    /// Points still unassigned after this pass
    pub remaining: usize,
}

impl ZoomPass<'_> {
    pub fn assigned_points(&self) -> usize {
        self.assignments.iter().map(|a| a.len()).sum()
    }

    pub fn count_mode(&self, mode: TileMode) -> usize {
        self.assignments.iter().filter(|a| a.mode == mode).count()
    }
}

/// Walks the zoom levels of a run from `min_zoom` to `max_zoom`, threading
/// the unassigned points from one pass into the next.
///
/// Zooms below `min_zoom` never claim points and are not visited. The walk
/// ends early once every point has been claimed.
pub struct ZoomWalker<'a> {
    params: TilingParams,
    threshold: Threshold,
    next_zoom: Option<ZoomLevel>,
    working: PointSet<'a>,
}

impl<'a> ZoomWalker<'a> {
    pub fn new(cloud: &'a PointCloud, params: TilingParams) -> GeneSpaceResult<Self> {
        params.validate()?;
        let threshold = params.threshold_limit()?;
        Ok(Self {
            params,
            threshold,
            next_zoom: Some(params.min_zoom),
            working: cloud.all(),
        })
    }

    /// Points not yet claimed by any tile
    pub fn remaining(&self) -> usize {
        self.working.len()
    }

    /// Ensure the walk claimed every point
    pub fn finish(self) -> GeneSpaceResult<()> {
        if self.working.is_empty() {
            Ok(())
        } else {
            Err(GeneSpaceError::UnassignedPoints {
                count: self.working.len(),
                max_zoom: self.params.max_zoom,
            })
        }
    }
}

impl<'a> Iterator for ZoomWalker<'a> {
    type Item = ZoomPass<'a>;

    fn next(&mut self) -> Option<ZoomPass<'a>> {
        let zoom = self.next_zoom?;
        if self.working.is_empty() {
            self.next_zoom = None;
            return None;
        }

        let forced = zoom >= self.params.max_zoom;
        self.next_zoom = if forced { None } else { Some(zoom + 1) };

        let policy = if forced {
            AssignPolicy::forced(self.threshold)
        } else {
            AssignPolicy::deferring(self.threshold)
        };
        let outcome = assign(&self.working, &plan(zoom), policy);
        self.working = outcome.leftover;

        Some(ZoomPass {
            zoom,
            forced,
            assignments: outcome.assignments,
            deferred: outcome.deferred,
            remaining: self.working.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn cloud(coords: &[(f64, f64)]) -> PointCloud {
        let points = coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Point::new(format!("p{}", i), x, y))
            .collect();
        PointCloud::new(points).unwrap()
    }

    #[test]
    fn test_threshold_parsing() {
        assert_eq!(Threshold::from_signed(-1).unwrap(), Threshold::Unbounded);
        assert_eq!(Threshold::from_signed(5).unwrap(), Threshold::Below(5));
        assert!(Threshold::from_signed(0).is_err());
        assert!(Threshold::from_signed(-2).is_err());
        assert!(Threshold::Below(3).admits(2));
        assert!(!Threshold::Below(3).admits(3));
    }

    #[test]
    fn test_sparse_dataset_fits_one_tile() {
        let cloud = cloud(&[(0.0, 0.0), (1.0, 1.0), (0.5, 0.5)]);
        let params = TilingParams { max_zoom: 2, threshold: 10, ..Default::default() };
        let mut walker = ZoomWalker::new(&cloud, params).unwrap();

        let pass = walker.next().unwrap();
        assert_eq!(pass.zoom, 0);
        assert_eq!(pass.assignments.len(), 1);
        assert_eq!(pass.assignments[0].address, TileAddress::new(0, 0, 0));
        assert_eq!(pass.assignments[0].mode, TileMode::Vector);
        assert_eq!(pass.assignments[0].len(), 3);

        assert!(walker.next().is_none());
        assert!(walker.finish().is_ok());
    }

    #[test]
    fn test_dense_quadrant_descends() {
        let mut coords = vec![(0.0, 0.0), (1.0, 1.0)];
        coords.extend((0..5).map(|k| (0.1 + k as f64 * 0.01, 0.1)));
        let cloud = cloud(&coords);
        let params = TilingParams { max_zoom: 1, threshold: 4, ..Default::default() };
        let passes: Vec<_> = ZoomWalker::new(&cloud, params).unwrap().collect();

        assert_eq!(passes.len(), 2);
        assert!(passes[0].assignments.is_empty());
        assert_eq!(passes[0].deferred.len(), 1);
        assert_eq!(passes[0].remaining, 7);

        let last = &passes[1];
        assert!(last.forced);
        let summary: Vec<_> = last
            .assignments
            .iter()
            .map(|a| (a.address, a.mode, a.len()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (TileAddress::new(1, 0, 1), TileMode::Raster, 6),
                (TileAddress::new(1, 1, 0), TileMode::Vector, 1),
            ]
        );
    }

    #[test]
    fn test_point_order_preserved_within_tile() {
        let cloud = cloud(&[(0.9, 0.9), (0.1, 0.1), (0.8, 0.7), (0.0, 0.0), (1.0, 1.0)]);
        let outcome = assign(&cloud.all(), &plan(1), AssignPolicy::forced(Threshold::Below(100)));
        let upper_right = outcome
            .assignments
            .iter()
            .find(|a| a.address == TileAddress::new(1, 1, 0))
            .unwrap();
        assert_eq!(upper_right.points.ids().collect::<Vec<_>>(), vec!["p0", "p2", "p4"]);
        assert!(outcome.leftover.is_empty());
    }

    #[test]
    fn test_unbounded_threshold_claims_everything_at_min_zoom() {
        let cloud = cloud(&[(0.0, 0.0), (0.2, 0.3), (1.0, 1.0)]);
        let params = TilingParams { min_zoom: 1, max_zoom: 4, threshold: -1, ..Default::default() };
        let passes: Vec<_> = ZoomWalker::new(&cloud, params).unwrap().collect();
        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].zoom, 1);
        assert_eq!(passes[0].assigned_points(), 3);
        assert_eq!(passes[0].count_mode(TileMode::Vector), 2);
    }

    #[test]
    fn test_abandoned_walk_reports_unassigned() {
        let cloud = cloud(&[(0.0, 0.0), (0.01, 0.0), (0.02, 0.0), (1.0, 1.0)]);
        let params = TilingParams { max_zoom: 3, threshold: 2, ..Default::default() };
        let mut walker = ZoomWalker::new(&cloud, params).unwrap();
        walker.next();
        assert!(walker.remaining() > 0);
        assert!(matches!(
            walker.finish(),
            Err(GeneSpaceError::UnassignedPoints { max_zoom: 3, .. })
        ));
    }
}
