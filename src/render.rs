use std::path::Path;

use anyhow::{Context, Result};
use image::{Rgba, RgbaImage};
use ndarray::Array3;

use crate::color;
use crate::data::model::{Affine, RsaMap};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const SILHOUETTE: Rgba<u8> = Rgba([215, 215, 215, 255]);
const PANEL_GAP: u32 = 8;
const COLORBAR_WIDTH: u32 = 14;

/// Glass-brain rendering parameters.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Absolute values below this are not drawn.
    pub threshold: f64,
    /// Pixels per voxel along the finest voxel axis.
    pub scale: u32,
    /// Colour range `[-vmax, vmax]`; `None` uses the map's largest |value|.
    pub vmax: Option<f64>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            scale: 4,
            vmax: None,
        }
    }
}

/// One of the three orthogonal projections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Sagittal,
    Coronal,
    Axial,
}

impl View {
    pub const ALL: [View; 3] = [View::Sagittal, View::Coronal, View::Axial];

    /// `(depth, horizontal, vertical)` voxel axes.
    fn axes(self) -> (usize, usize, usize) {
        match self {
            View::Sagittal => (0, 1, 2),
            View::Coronal => (1, 0, 2),
            View::Axial => (2, 0, 1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            View::Sagittal => "sagittal",
            View::Coronal => "coronal",
            View::Axial => "axial",
        }
    }
}

/// Maximum-|value| projection, one cell per voxel, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub width: usize,
    pub height: usize,
    /// Strongest supra-threshold value along each ray.
    pub values: Vec<Option<f64>>,
    /// Whether the ray crosses the ROI.
    pub inside: Vec<bool>,
}

impl Projection {
    pub fn value(&self, col: usize, row: usize) -> Option<f64> {
        self.values[row * self.width + col]
    }

    pub fn covers_roi(&self, col: usize, row: usize) -> bool {
        self.inside[row * self.width + col]
    }
}

/// Voxel axes whose index runs against the world axis (negative diagonal).
pub fn axis_flips(affine: &Affine) -> [bool; 3] {
    [affine[0][0] < 0.0, affine[1][1] < 0.0, affine[2][2] < 0.0]
}

/// Project `values` along the view's depth axis.
///
/// Exact zeros (outside the ROI, or degenerate) and non-finite values are never
/// drawn. The image is oriented so world-positive runs right and up.
pub fn project(
    values: &Array3<f64>,
    mask: &Array3<bool>,
    view: View,
    flips: [bool; 3],
    threshold: f64,
) -> Projection {
    let (nx, ny, nz) = values.dim();
    let shape = [nx, ny, nz];
    let (d, h, v) = view.axes();
    let (nd, nh, nv) = (shape[d], shape[h], shape[v]);

    let mut out = Projection {
        width: nh,
        height: nv,
        values: vec![None; nh * nv],
        inside: vec![false; nh * nv],
    };

    for ih in 0..nh {
        for iv in 0..nv {
            let mut best: Option<f64> = None;
            let mut inside = false;
            let mut idx = [0usize; 3];
            idx[h] = ih;
            idx[v] = iv;
            for id in 0..nd {
                idx[d] = id;
                inside |= mask[idx];
                let val = values[idx];
                if !val.is_finite() || val == 0.0 || val.abs() < threshold {
                    continue;
                }
                if best.map_or(true, |b| val.abs() > b.abs()) {
                    best = Some(val);
                }
            }
            let col = if flips[h] { nh - 1 - ih } else { ih };
            let row = if flips[v] { iv } else { nv - 1 - iv };
            out.values[row * nh + col] = best;
            out.inside[row * nh + col] = inside;
        }
    }
    out
}

/// Pixel size of one voxel along the horizontal and vertical image axes.
fn pixel_size(view: View, voxel_sizes: [f64; 3], scale: u32) -> (u32, u32) {
    let finest = voxel_sizes.iter().copied().fold(f64::INFINITY, f64::min);
    let px = |axis: usize| ((scale as f64 * voxel_sizes[axis] / finest).round() as u32).max(1);
    let (_, h, v) = view.axes();
    (px(h), px(v))
}

/// Rasterize one projection.
pub fn projection_image(proj: &Projection, pixel: (u32, u32), vmax: f64) -> RgbaImage {
    let (pw, ph) = pixel;
    let mut img = RgbaImage::from_pixel(proj.width as u32 * pw, proj.height as u32 * ph, BACKGROUND);
    for row in 0..proj.height {
        for col in 0..proj.width {
            let color = match proj.value(col, row) {
                Some(v) => {
                    let [r, g, b] = color::color_for(v, vmax);
                    Rgba([r, g, b, 255])
                }
                None if proj.covers_roi(col, row) => SILHOUETTE,
                None => continue,
            };
            for dy in 0..ph {
                for dx in 0..pw {
                    img.put_pixel(col as u32 * pw + dx, row as u32 * ph + dy, color);
                }
            }
        }
    }
    img
}

/// Effective colour range for a map.
pub fn color_range(map: &RsaMap, opts: &RenderOptions) -> f64 {
    opts.vmax.unwrap_or_else(|| map.max_abs())
}

/// The three projections of a map, rasterized.
pub fn render_views(map: &RsaMap, mask: &Array3<bool>, opts: &RenderOptions) -> [RgbaImage; 3] {
    let flips = axis_flips(&map.affine);
    let sizes = map.voxel_sizes();
    let vmax = color_range(map, opts);
    View::ALL.map(|view| {
        let proj = project(&map.values, mask, view, flips, opts.threshold);
        projection_image(&proj, pixel_size(view, sizes, opts.scale), vmax)
    })
}

/// Vertical colour bar from `-vmax` (bottom) to `+vmax` (top).
pub fn colorbar(height: u32) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(COLORBAR_WIDTH, height, BACKGROUND);
    for y in 0..height {
        let t = if height > 1 {
            1.0 - 2.0 * y as f64 / (height - 1) as f64
        } else {
            1.0
        };
        let [r, g, b] = color::cold_hot(t);
        for x in 2..COLORBAR_WIDTH - 2 {
            img.put_pixel(x, y, Rgba([r, g, b, 255]));
        }
    }
    img
}

/// Glass-brain style overview: sagittal, coronal and axial projections side
/// by side, followed by a colour bar.
pub fn glass_brain(map: &RsaMap, mask: &Array3<bool>, opts: &RenderOptions) -> RgbaImage {
    let views = render_views(map, mask, opts);
    let height = views.iter().map(|v| v.height()).max().unwrap_or(1).max(1);
    let width = views.iter().map(|v| v.width() + PANEL_GAP).sum::<u32>() + COLORBAR_WIDTH;

    let mut canvas = RgbaImage::from_pixel(width, height, BACKGROUND);
    let mut x = 0;
    for view in &views {
        let y = (height - view.height()) / 2;
        image::imageops::overlay(&mut canvas, view, x as i64, y as i64);
        x += view.width() + PANEL_GAP;
    }
    image::imageops::overlay(&mut canvas, &colorbar(height), x as i64, 0);
    canvas
}

/// Write an image as PNG.
pub fn save_png(path: &Path, img: &RgbaImage) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing PNG {}", path.display()))?;
    log::info!("Saved glass-brain rendering to {}", path.display());
    Ok(())
}
