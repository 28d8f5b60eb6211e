//! Sparkline rasterization: a history series becomes a small RGBA image,
//! PNG-encoded and returned as a data URI for inline embedding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStyle {
    #[default]
    None,
    Solid,
    Gradient,
}

/// Per-key visual configuration, loaded once and shared by every render of
/// that key. `min_value`/`max_value` left unset mean auto-scale from the
/// current series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparklineStyle {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
    #[serde(default = "default_line_color")]
    pub line_color: String,
    #[serde(default)]
    pub fill_style: FillStyle,
    #[serde(default = "default_fill_color")]
    pub fill_color: String,
}

// Upper bound on either configured dimension; anything larger is a config
// mistake, not a legitimate sparkline.
const MAX_DIMENSION: u32 = 4096;

fn default_width() -> u32 {
    50
}
fn default_height() -> u32 {
    30
}
fn default_max_length() -> usize {
    crate::history::DEFAULT_CAPACITY
}
fn default_line_color() -> String {
    "#ffffff".to_string()
}
fn default_fill_color() -> String {
    "#4090c0".to_string()
}

impl Default for SparklineStyle {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            max_length: default_max_length(),
            min_value: None,
            max_value: None,
            line_color: default_line_color(),
            fill_style: FillStyle::None,
            fill_color: default_fill_color(),
        }
    }
}

/// Transparent RGBA canvas, row-major, 4 bytes per pixel.
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Raster {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ]
    }

    fn put(&mut self, x: u32, y: u32, rgb: [u8; 3], alpha: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        self.rgba[i] = rgb[0];
        self.rgba[i + 1] = rgb[1];
        self.rgba[i + 2] = rgb[2];
        self.rgba[i + 3] = alpha;
    }
}

fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

// Vertical scale: configured bounds win, otherwise the series extremes.
// Fewer than two points fall back to [0, 1]; a degenerate range (constant
// series) is padded to [v - 1, v + 1] so the flat line draws at mid-height.
fn vertical_range(series: &[f64], style: &SparklineStyle) -> (f64, f64) {
    let (auto_lo, auto_hi) = if series.len() < 2 {
        (0.0, 1.0)
    } else {
        let lo = series.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    };
    let lo = style.min_value.unwrap_or(auto_lo);
    let hi = style.max_value.unwrap_or(auto_hi);
    if hi - lo <= f64::EPSILON {
        (lo - 1.0, lo + 1.0)
    } else {
        (lo, hi)
    }
}

/// Draw the series onto a transparent canvas of the configured dimensions,
/// clamped to [1, 4096] per axis. An empty series yields a blank image
/// rather than failing.
pub fn rasterize(series: &[f64], style: &SparklineStyle) -> Raster {
    if style.width > MAX_DIMENSION || style.height > MAX_DIMENSION {
        warn!(
            "sparkline dimensions {}x{} exceed {MAX_DIMENSION}, clamping",
            style.width, style.height
        );
    }
    let w = style.width.clamp(1, MAX_DIMENSION);
    let h = style.height.clamp(1, MAX_DIMENSION);
    let mut raster = Raster::new(w, h);
    if series.is_empty() {
        return raster;
    }

    let line_rgb = parse_hex_color(&style.line_color).unwrap_or_else(|| {
        warn!("bad line_color {:?}, using white", style.line_color);
        [255, 255, 255]
    });
    let fill_rgb = parse_hex_color(&style.fill_color).unwrap_or_else(|| {
        warn!("bad fill_color {:?}, using line color", style.fill_color);
        line_rgb
    });

    let (lo, hi) = vertical_range(series, style);
    let n = series.len();
    // y per sample, mapped so a higher value sits higher on the image
    let ys: Vec<f64> = series
        .iter()
        .map(|&v| {
            let ratio = ((v - lo) / (hi - lo)).clamp(0.0, 1.0);
            (h - 1) as f64 * (1.0 - ratio)
        })
        .collect();

    // Interpolate the polyline to one y per pixel column
    let col_y: Vec<f64> = (0..w)
        .map(|x| {
            if n == 1 || w == 1 {
                return ys[0];
            }
            let pos = x as f64 * (n - 1) as f64 / (w - 1) as f64;
            let i0 = pos.floor() as usize;
            let i1 = (i0 + 1).min(n - 1);
            let frac = pos - i0 as f64;
            ys[i0] + (ys[i1] - ys[i0]) * frac
        })
        .collect();

    // Fill below the line first so the stroke paints over it
    if style.fill_style != FillStyle::None {
        for x in 0..w {
            let top = col_y[x as usize].round() as u32;
            for y in top..h {
                let alpha = match style.fill_style {
                    FillStyle::Solid => 255,
                    FillStyle::Gradient => {
                        // opaque at the line, transparent at the baseline
                        let span = (h - 1).saturating_sub(top);
                        if span == 0 {
                            0
                        } else {
                            (255.0 * (h - 1 - y) as f64 / span as f64).round() as u8
                        }
                    }
                    FillStyle::None => unreachable!(),
                };
                raster.put(x, y, fill_rgb, alpha);
            }
        }
    }

    // Stroke: connect adjacent columns with vertical spans for a solid polyline
    for x in 0..w {
        let y0 = col_y[x as usize].round() as u32;
        let y1 = if (x as usize) + 1 < col_y.len() {
            col_y[x as usize + 1].round() as u32
        } else {
            y0
        };
        let (a, b) = if y0 <= y1 { (y0, y1) } else { (y1, y0) };
        for y in a..=b {
            raster.put(x, y.min(h - 1), line_rgb, 255);
        }
    }

    raster
}

pub fn encode_png(raster: &Raster) -> Result<Vec<u8>, png::EncodingError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, raster.width, raster.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raster.rgba)?;
    }
    Ok(out)
}

/// Rasterize, PNG-encode and wrap as `data:image/png;base64,…`.
pub fn render_data_uri(
    series: &[f64],
    style: &SparklineStyle,
) -> Result<String, png::EncodingError> {
    let raster = rasterize(series, style);
    let bytes = encode_png(&raster)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
}
