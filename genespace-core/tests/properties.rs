use genespace_core::{
    normalize, denormalize, plan, Point, PointCloud, TileMode, TilingParams, ZoomWalker,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn cloud_from(coords: &[(f64, f64)]) -> PointCloud {
    let points = coords
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| Point::new(format!("g{}", i), x, y))
        .collect();
    PointCloud::new(points).expect("valid cloud")
}

proptest! {
    #[test]
    fn every_position_has_exactly_one_tile(
        zoom in 0u8..7,
        nx in prop_oneof![0.0f64..=1.0, Just(0.0), Just(0.5), Just(1.0), Just(0.25), Just(0.75)],
        ny in prop_oneof![0.0f64..=1.0, Just(0.0), Just(0.5), Just(1.0), Just(0.125)],
    ) {
        let grid = plan(zoom);
        let containing = grid.iter().filter(|(_, rect)| rect.contains(nx, ny)).count();
        prop_assert_eq!(containing, 1);

        let (i, j) = grid.cell_of(nx, ny);
        prop_assert!(grid.rect(i, j).contains(nx, ny));
    }

    #[test]
    fn normalize_roundtrips(v in -1e6f64..1e6, min in -1e6f64..0.0, span in 1e-3f64..1e6) {
        let max = min + span;
        let back = denormalize(normalize(v, min, max), min, max);
        prop_assert!((back - v).abs() <= 1e-6 * (1.0 + v.abs().max(max.abs())));
    }

    #[test]
    fn walk_assigns_every_point_once(
        coords in prop::collection::vec((-50.0f64..50.0, -50.0f64..50.0), 1..300),
        threshold in 1i64..40,
        max_zoom in 0u8..6,
    ) {
        let cloud = cloud_from(&coords);
        let params = TilingParams { min_zoom: 0, max_zoom, threshold, tile_size: 256 };
        let mut walker = ZoomWalker::new(&cloud, params).unwrap();

        let mut seen = HashSet::new();
        let mut total = 0;
        let mut addresses = HashSet::new();
        for pass in walker.by_ref() {
            for tile in &pass.assignments {
                prop_assert!(!tile.is_empty());
                prop_assert!(addresses.insert(tile.address));
                if !pass.forced {
                    prop_assert!((tile.len() as i64) < threshold);
                }
                prop_assert_eq!(tile.mode == TileMode::Vector, (tile.len() as i64) < threshold);
                for &index in tile.points.indices() {
                    let (nx, ny) = cloud.normalized(index);
                    prop_assert!(tile.rect.contains(nx, ny));
                    prop_assert!(seen.insert(index));
                }
                total += tile.len();
            }
        }
        prop_assert!(walker.finish().is_ok());
        prop_assert_eq!(total, cloud.len());
    }
}

#[test]
fn min_zoom_skips_coarse_levels() {
    let cloud = cloud_from(&[(0.0, 0.0), (1.0, 1.0)]);
    let params = TilingParams { min_zoom: 3, max_zoom: 5, threshold: 100, tile_size: 256 };
    let passes: Vec<_> = ZoomWalker::new(&cloud, params).unwrap().collect();
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].zoom, 3);
    assert!(passes[0].assignments.iter().all(|a| a.address.zoom == 3));
}

#[test]
fn identical_points_are_forced_at_max_zoom() {
    let coords = vec![(2.0, 2.0); 50];
    let cloud = cloud_from(&coords);
    let params = TilingParams { min_zoom: 0, max_zoom: 4, threshold: 10, tile_size: 256 };
    let passes: Vec<_> = ZoomWalker::new(&cloud, params).unwrap().collect();

    assert_eq!(passes.len(), 5);
    let last = passes.last().unwrap();
    assert!(last.forced);
    assert_eq!(last.assignments.len(), 1);
    assert_eq!(last.assignments[0].mode, TileMode::Raster);
    assert_eq!(last.assignments[0].len(), 50);
}
