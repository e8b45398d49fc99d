use genespace_core::{PointSet, Tile, TileAddress, TileMode, TileRect, VectorTile};

use crate::error::RenderResult;
use crate::raster::RasterRenderer;
use crate::style::RasterStyle;

/// Turns an assigned tile into its stored form. The mode is decided by the
/// assigner; this only dispatches on it.
pub struct Materializer {
    tile_size: u32,
    raster: RasterRenderer,
}

impl Materializer {
    pub fn new(tile_size: u32, style: &RasterStyle) -> RenderResult<Self> {
        Ok(Self {
            tile_size,
            raster: RasterRenderer::new(style, tile_size)?,
        })
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn raster(&self) -> &RasterRenderer {
        &self.raster
    }

    pub fn vector(&self, points: &PointSet<'_>, rect: &TileRect) -> VectorTile {
        VectorTile::build(points, rect, self.tile_size)
    }

    pub fn materialize(
        &self,
        address: &TileAddress,
        rect: &TileRect,
        mode: TileMode,
        points: &PointSet<'_>,
        halo: &[usize],
    ) -> RenderResult<Tile> {
        match mode {
            TileMode::Vector => Ok(Tile::Vector(self.vector(points, rect))),
            TileMode::Raster => Ok(Tile::Raster(self.raster.render(address, rect, points, halo)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genespace_core::{Point, PointCloud};

    #[test]
    fn test_dispatch_follows_mode() {
        let cloud = PointCloud::new(vec![Point::new("a", 0.0, 0.0), Point::new("b", 2.0, 2.0)]).unwrap();
        let m = Materializer::new(128, &RasterStyle::default()).unwrap();
        let addr = TileAddress::new(0, 0, 0);
        let rect = TileRect::unit();

        let vector = m.materialize(&addr, &rect, TileMode::Vector, &cloud.all(), &[]).unwrap();
        assert!(matches!(&vector, Tile::Vector(v) if v.len() == 2));

        let raster = m.materialize(&addr, &rect, TileMode::Raster, &cloud.all(), &[]).unwrap();
        assert!(matches!(&raster, Tile::Raster(r) if r.size == 128));
    }
}
