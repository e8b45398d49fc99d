//! Raster styling: dot radius, coloring policy and draw order

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

use genespace_core::{Point, ZoomLevel};

use crate::error::{RenderError, RenderResult};

pub type Rgb = [u8; 3];

/// How each dot is colored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorPolicy {
    /// Pick from the palette by a stable hash of the point's coordinates
    Palette,
    /// Use a `#rrggbb` attribute, falling back to the palette
    Attribute,
}

/// Raster tile appearance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterStyle {
    #[serde(default = "default_radius_base")]
    pub radius_base: u32,
    #[serde(default = "default_radius_per_zoom")]
    pub radius_per_zoom: u32,
    #[serde(default = "default_max_radius")]
    pub max_radius: u32,
    #[serde(default = "default_fill_opacity")]
    pub fill_opacity: u8,
    /// Draw an opaque one pixel ring around each dot
    #[serde(default = "default_true")]
    pub border: bool,
    /// Ring color; defaults to the dot's own color
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default = "default_color_policy")]
    pub color_policy: ColorPolicy,
    #[serde(default = "default_color_attribute")]
    pub color_attribute: String,
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
    /// Points whose attribute matches one of `background_values` are drawn first; an empty name disables
    #[serde(default = "default_background_attribute")]
    pub background_attribute: String,
    #[serde(default = "default_background_values")]
    pub background_values: Vec<String>,
    /// Draw dots from neighbouring raster tiles that overlap this tile's edge
    #[serde(default = "default_true")]
    pub halo: bool,
}

impl Default for RasterStyle {
    fn default() -> Self {
        Self {
            radius_base: default_radius_base(),
            radius_per_zoom: default_radius_per_zoom(),
            max_radius: default_max_radius(),
            fill_opacity: default_fill_opacity(),
            border: true,
            border_color: None,
            color_policy: default_color_policy(),
            color_attribute: default_color_attribute(),
            palette: default_palette(),
            background_attribute: default_background_attribute(),
            background_values: default_background_values(),
            halo: true,
        }
    }
}

impl RasterStyle {
    pub fn validate(&self) -> RenderResult<()> {
        self.resolve().map(|_| ())
    }

    /// Parse colors once so rendering never fails on style input
    pub fn resolve(&self) -> RenderResult<ResolvedStyle> {
        if self.radius_base == 0 {
            return Err(RenderError::InvalidStyle("radius_base must be at least 1".into()));
        }
        if self.max_radius < self.radius_base {
            return Err(RenderError::InvalidStyle(format!(
                "max_radius {} is smaller than radius_base {}",
                self.max_radius, self.radius_base
            )));
        }
        if self.palette.is_empty() {
            return Err(RenderError::InvalidStyle("palette must not be empty".into()));
        }

        let palette = self
            .palette
            .iter()
            .map(|hex| parse_hex_rgb(hex).ok_or_else(|| RenderError::InvalidColor(hex.clone())))
            .collect::<RenderResult<Vec<_>>>()?;
        let border_color = self
            .border_color
            .as_deref()
            .map(|hex| parse_hex_rgb(hex).ok_or_else(|| RenderError::InvalidColor(hex.to_string())))
            .transpose()?;

        Ok(ResolvedStyle {
            style: self.clone(),
            palette,
            border_color,
        })
    }
}

/// A validated [`RasterStyle`] with parsed colors
#[derive(Debug, Clone)]
pub struct ResolvedStyle {
    style: RasterStyle,
    palette: Vec<Rgb>,
    border_color: Option<Rgb>,
}

impl ResolvedStyle {
    pub fn style(&self) -> &RasterStyle {
        &self.style
    }

    /// Dot radius in pixels, growing with zoom up to the cap
    pub fn radius_for(&self, zoom: ZoomLevel) -> u32 {
        let grown = self
            .style
            .radius_base
            .saturating_add(self.style.radius_per_zoom.saturating_mul(zoom as u32));
        grown.min(self.style.max_radius)
    }

    pub fn fill_for(&self, point: &Point) -> Rgb {
        if self.style.color_policy == ColorPolicy::Attribute {
            if let Some(rgb) = point
                .attribute_text(&self.style.color_attribute)
                .and_then(|s| parse_hex_rgb(&s))
            {
                return rgb;
            }
        }
        self.palette[palette_index(point.x, point.y, self.palette.len())]
    }

    pub fn border_for(&self, fill: Rgb) -> Option<Rgb> {
        if !self.style.border {
            return None;
        }
        Some(self.border_color.unwrap_or(fill))
    }

    pub fn fill_opacity(&self) -> u8 {
        self.style.fill_opacity
    }

    pub fn is_background(&self, point: &Point) -> bool {
        let attr = self.style.background_attribute.as_str();
        if attr.is_empty() {
            return false;
        }
        point
            .attribute_text(attr)
            .map_or(false, |v| self.style.background_values.iter().any(|b| *b == v))
    }
}

/// Stable palette slot for a point, independent of process and platform
pub fn palette_index(x: f64, y: f64, len: usize) -> usize {
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&x.to_bits().to_le_bytes());
    bytes[8..].copy_from_slice(&y.to_bits().to_le_bytes());
    (xxh64(&bytes, 0) % len as u64) as usize
}

// Parse a hex color like "#RRGGBB"
pub fn parse_hex_rgb(s: &str) -> Option<Rgb> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

fn default_radius_base() -> u32 {
    1
}

fn default_radius_per_zoom() -> u32 {
    1
}

fn default_max_radius() -> u32 {
    8
}

fn default_fill_opacity() -> u8 {
    204
}

fn default_true() -> bool {
    true
}

fn default_color_policy() -> ColorPolicy {
    ColorPolicy::Palette
}

fn default_color_attribute() -> String {
    "color".to_string()
}

fn default_palette() -> Vec<String> {
    ["#b24c63", "#5438dc", "#357ded", "#56eef4", "#32e875"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_background_attribute() -> String {
    "hypothetical".to_string()
}

fn default_background_values() -> Vec<String> {
    vec!["YES".to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex_rgb("#b24c63"), Some([178, 76, 99]));
        assert_eq!(parse_hex_rgb("32E875"), Some([50, 232, 117]));
        assert_eq!(parse_hex_rgb("#fff"), None);
        assert_eq!(parse_hex_rgb("#gg0000"), None);
    }

    #[test]
    fn test_radius_growth() {
        let style = RasterStyle::default().resolve().unwrap();
        assert_eq!(style.radius_for(0), 1);
        assert_eq!(style.radius_for(3), 4);
        assert_eq!(style.radius_for(12), 8);
    }

    #[test]
    fn test_palette_is_stable() {
        let a = palette_index(0.25, -3.5, 5);
        assert_eq!(a, palette_index(0.25, -3.5, 5));
        assert!(a < 5);
        // Different coordinates spread over the palette
        let distinct: std::collections::HashSet<_> =
            (0..100).map(|i| palette_index(i as f64, 1.0, 5)).collect();
        assert!(distinct.len() > 1);
    }

    #[test]
    fn test_attribute_color_falls_back() {
        let style = RasterStyle {
            color_policy: ColorPolicy::Attribute,
            ..Default::default()
        }
        .resolve()
        .unwrap();
        let red = Point::new("a", 1.0, 2.0).with_attribute("color", "#ff0000");
        assert_eq!(style.fill_for(&red), [255, 0, 0]);

        let plain = Point::new("b", 1.0, 2.0).with_attribute("color", "crimson");
        let fallback = style.fill_for(&plain);
        assert!(style.style().palette.iter().any(|hex| parse_hex_rgb(hex) == Some(fallback)));
    }

    #[test]
    fn test_background_detection() {
        let style = RasterStyle::default().resolve().unwrap();
        let hypo = Point::new("a", 0.0, 0.0).with_attribute("hypothetical", "YES");
        let known = Point::new("b", 0.0, 0.0).with_attribute("hypothetical", "NO");
        assert!(style.is_background(&hypo));
        assert!(!style.is_background(&known));
        assert!(!style.is_background(&Point::new("c", 0.0, 0.0)));

        let disabled = RasterStyle { background_attribute: String::new(), ..Default::default() }
            .resolve()
            .unwrap();
        assert!(!disabled.is_background(&hypo));
    }

    #[test]
    fn test_validation() {
        let bad_color = RasterStyle {
            palette: vec!["#123456".into(), "blue".into()],
            ..Default::default()
        };
        assert!(matches!(bad_color.validate(), Err(RenderError::InvalidColor(c)) if c == "blue"));

        let bad_radius = RasterStyle { radius_base: 0, ..Default::default() };
        assert!(matches!(bad_radius.validate(), Err(RenderError::InvalidStyle(_))));

        let bad_border = RasterStyle { border_color: Some("#12".into()), ..Default::default() };
        assert!(bad_border.validate().is_err());

        assert!(RasterStyle::default().validate().is_ok());
    }
}
