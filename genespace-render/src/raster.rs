//! CPU raster tiles
//!
//! Dots are blended source-over onto a transparent RGBA buffer and the
//! result is encoded as PNG. Points of neighbouring raster tiles that reach
//! across the shared edge are drawn too, so dots are not clipped at seams.

use std::collections::HashMap;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, Rgba, RgbaImage};

use genespace_core::{
    local_pixel, PointCloud, PointSet, RasterTile, TileAddress, TileAssignment, TileMode, TileRect,
};

use crate::error::{RenderError, RenderResult};
use crate::style::{RasterStyle, ResolvedStyle, Rgb};

pub struct RasterRenderer {
    style: ResolvedStyle,
    tile_size: u32,
}

impl RasterRenderer {
    pub fn new(style: &RasterStyle, tile_size: u32) -> RenderResult<Self> {
        Ok(Self {
            style: style.resolve()?,
            tile_size,
        })
    }

    pub fn style(&self) -> &ResolvedStyle {
        &self.style
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Draw `points` (and `halo`, indices into the same cloud) into a fresh buffer
    pub fn draw(&self, zoom: u8, rect: &TileRect, points: &PointSet<'_>, halo: &[usize]) -> RgbaImage {
        let cloud = points.cloud();
        let mut img = RgbaImage::new(self.tile_size, self.tile_size);
        let radius = self.style.radius_for(zoom) as i64;

        for index in self.draw_order(cloud, points.indices(), halo) {
            let point = cloud.point(index);
            let (nx, ny) = cloud.normalized(index);
            let (cx, cy) = local_pixel(rect, nx, ny, self.tile_size);

            let fill = self.style.fill_for(point);
            let border = self.style.border_for(fill);
            draw_disc(&mut img, cx, cy, radius, fill, border, self.style.fill_opacity());
        }
        img
    }

    pub fn render(
        &self,
        address: &TileAddress,
        rect: &TileRect,
        points: &PointSet<'_>,
        halo: &[usize],
    ) -> RenderResult<RasterTile> {
        let img = self.draw(address.zoom, rect, points, halo);
        let png = encode_png(address, &img)?;
        Ok(RasterTile {
            size: self.tile_size,
            png,
        })
    }

    // Background points first, then input order. Neighbouring tiles use the
    // same ordering so overlapping dots stack identically on both sides.
    fn draw_order(&self, cloud: &PointCloud, own: &[usize], halo: &[usize]) -> Vec<usize> {
        let mut order: Vec<usize> = own.iter().chain(halo).copied().collect();
        order.sort_by_key(|&i| (!self.style.is_background(cloud.point(i)), i));
        order.dedup();
        order
    }
}

fn draw_disc(
    img: &mut RgbaImage,
    cx: i64,
    cy: i64,
    radius: i64,
    fill: Rgb,
    border: Option<Rgb>,
    opacity: u8,
) {
    let (w, h) = (img.width() as i64, img.height() as i64);
    if cx + radius < 0 || cy + radius < 0 || cx - radius >= w || cy - radius >= h {
        return;
    }

    let outer = radius * radius;
    let inner = (radius - 1) * (radius - 1);
    for py in (cy - radius).max(0)..=(cy + radius).min(h - 1) {
        for px in (cx - radius).max(0)..=(cx + radius).min(w - 1) {
            let (dx, dy) = (px - cx, py - cy);
            let d2 = dx * dx + dy * dy;
            if d2 > outer {
                continue;
            }
            let src = match border {
                Some([r, g, b]) if d2 > inner => Rgba([r, g, b, 255]),
                _ => Rgba([fill[0], fill[1], fill[2], opacity]),
            };
            blend_over(img.get_pixel_mut(px as u32, py as u32), src);
        }
    }
}

/// Source-over compositing with straight (non-premultiplied) alpha
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let v = (src[c] as f32 * sa + dst[c] as f32 * da * (1.0 - sa)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}

pub fn encode_png(address: &TileAddress, img: &RgbaImage) -> RenderResult<Vec<u8>> {
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), img.width(), img.height(), ColorType::Rgba8)
        .map_err(|e| RenderError::Encode {
            address: *address,
            message: e.to_string(),
        })?;
    Ok(buf)
}

/// Raster-mode tiles of one zoom pass, for gathering edge-overlapping dots
pub struct HaloIndex<'t, 'a> {
    tiles: HashMap<TileAddress, &'t PointSet<'a>>,
}

impl<'t, 'a> HaloIndex<'t, 'a> {
    pub fn new<I>(tiles: I) -> Self
    where
        I: IntoIterator<Item = &'t TileAssignment<'a>>,
    {
        let tiles = tiles
            .into_iter()
            .filter(|t| t.mode == TileMode::Raster)
            .map(|t| (t.address, &t.points))
            .collect();
        Self { tiles }
    }

    pub fn empty() -> Self {
        Self {
            tiles: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Points of neighbouring raster tiles whose dots reach into `address`
    pub fn gather(&self, address: &TileAddress, radius: u32, tile_size: u32) -> Vec<usize> {
        let Some(rect) = address.rect() else {
            return Vec::new();
        };
        let reach = radius as i64;
        let (lo, hi) = (-reach, tile_size as i64 + reach);

        let mut out = Vec::new();
        for neighbor in address.neighbors() {
            let Some(points) = self.tiles.get(&neighbor) else {
                continue;
            };
            for &index in points.indices() {
                let (nx, ny) = points.cloud().normalized(index);
                let (px, py) = local_pixel(&rect, nx, ny, tile_size);
                if (lo..=hi).contains(&px) && (lo..=hi).contains(&py) {
                    out.push(index);
                }
            }
        }
        out
    }
}
