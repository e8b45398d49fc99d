use genespace_core::{InMemoryTileStore, Point, PointCloud, TileAddress, TileStore, TilingParams};
use genespace_render::{PipelineOptions, RasterRenderer, RasterStyle, TilingPipeline};

fn demo_cloud_dense() -> PointCloud {
    // Small dense spiral to exercise overlapping translucent dots
    let points = (0..1000)
        .map(|i| {
            let t = i as f64 * 0.05;
            Point::new(format!("g{}", i), t.cos() * t, t.sin() * t)
                .with_attribute("hypothetical", if i % 3 == 0 { "YES" } else { "NO" })
        })
        .collect();
    PointCloud::new(points).unwrap()
}

fn histogram(png_bytes: &[u8]) -> [u32; 256] {
    let img = image::load_from_memory(png_bytes).unwrap().to_rgba8();
    let mut hist = [0u32; 256];
    for p in img.pixels() {
        hist[p[3] as usize] += 1;
    }
    hist
}

#[test]
fn raster_bytes_are_stable() {
    let cloud = demo_cloud_dense();
    let renderer = RasterRenderer::new(&RasterStyle::default(), 512).unwrap();
    let address = TileAddress::new(0, 0, 0);
    let rect = address.rect().unwrap();

    let first = renderer.render(&address, &rect, &cloud.all(), &[]).unwrap();
    let second = renderer.render(&address, &rect, &cloud.all(), &[]).unwrap();
    assert_eq!(first.png, second.png);

    let hist = histogram(&first.png);
    assert!(hist[0] > 0, "background should stay transparent");
    assert!(hist[1..].iter().sum::<u32>() > 0, "dots should be drawn");
    assert_eq!(hist, histogram(&second.png), "Alpha histogram differs between identical renders");
}

fn seam_cloud() -> PointCloud {
    PointCloud::new(vec![
        Point::new("origin", 0.0, 0.0),
        Point::new("near-seam", 0.499, 0.25),
        Point::new("right", 0.6, 0.25),
        Point::new("corner", 1.0, 0.0),
        Point::new("top", 1.0, 1.0),
    ])
    .unwrap()
}

fn right_tile_pixel(halo: bool) -> [u8; 4] {
    let cloud = seam_cloud();
    let store = InMemoryTileStore::new();
    let params = TilingParams { min_zoom: 0, max_zoom: 1, threshold: 2, tile_size: 256 };
    let style = RasterStyle { halo, ..Default::default() };
    TilingPipeline::new(params, &style, PipelineOptions::default(), &store)
        .unwrap()
        .run(&cloud)
        .unwrap();

    let tile = store.get_raster(&TileAddress::new(1, 1, 1)).unwrap();
    let img = image::load_from_memory(&tile.png).unwrap().to_rgba8();
    img.get_pixel(0, 128).0
}

#[test]
fn dots_crossing_a_seam_render_on_both_sides() {
    assert!(right_tile_pixel(true)[3] > 0);
    assert_eq!(right_tile_pixel(false)[3], 0);
}
