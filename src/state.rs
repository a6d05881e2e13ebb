use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use image::RgbaImage;
use ndarray::Array3;

use crate::analysis::SearchlightResult;
use crate::data::writer;
use crate::render::{self, RenderOptions};

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// Everything the viewer shows, independent of rendering.
pub struct ViewerState {
    pub result: SearchlightResult,

    /// ROI on the map grid.
    pub mask: Array3<bool>,

    /// Scans per condition, before exclusion.
    pub condition_counts: BTreeMap<String, usize>,

    /// Conditions left out of the model.
    pub excluded: Vec<String>,

    pub render: RenderOptions,

    /// Projections for the current threshold (sagittal, coronal, axial).
    pub views: [RgbaImage; 3],

    /// Set when `views` must be re-uploaded as textures.
    pub dirty: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl ViewerState {
    pub fn new(
        result: SearchlightResult,
        mask: Array3<bool>,
        condition_counts: BTreeMap<String, usize>,
        excluded: Vec<String>,
        render: RenderOptions,
    ) -> Self {
        let views = render::render_views(&result.map, &mask, &render);
        Self {
            result,
            mask,
            condition_counts,
            excluded,
            render,
            views,
            dirty: true,
            status_message: None,
        }
    }

    /// Change the display threshold and re-render the projections.
    pub fn set_threshold(&mut self, threshold: f64) {
        self.render.threshold = threshold.max(0.0);
        self.views = render::render_views(&self.result.map, &self.mask, &self.render);
        self.dirty = true;
    }

    /// Finite non-zero values inside the ROI, for the histogram.
    pub fn roi_values(&self) -> Vec<f64> {
        self.result
            .map
            .values
            .iter()
            .zip(self.mask.iter())
            .filter(|(v, inside)| **inside && v.is_finite() && **v != 0.0)
            .map(|(v, _)| *v)
            .collect()
    }

    /// Number of ROI voxels above the current threshold.
    pub fn supra_threshold(&self) -> usize {
        self.roi_values()
            .into_iter()
            .filter(|v| v.abs() >= self.render.threshold)
            .count()
    }

    pub fn save_map(&mut self, path: &Path) {
        let outcome = writer::save_map(path, &self.result.map);
        self.report(outcome, path);
    }

    pub fn save_png(&mut self, path: &Path) {
        let img = render::glass_brain(&self.result.map, &self.mask, &self.render);
        let outcome = render::save_png(path, &img);
        self.report(outcome, path);
    }

    fn report(&mut self, outcome: Result<()>, path: &Path) {
        self.status_message = match outcome {
            Ok(()) => Some(format!("Saved {}", path.display())),
            Err(e) => {
                log::error!("Save failed: {e:#}");
                Some(format!("Error: {e:#}"))
            }
        };
    }
}

/// Equal-width histogram of `values` over `[min, max]`: `(bin centre, count)`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<(f64, usize)> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let width = if max > min { (max - min) / bins as f64 } else { 1.0 };

    let mut counts = vec![0usize; bins];
    for &v in values {
        let bin = (((v - min) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, c)| (min + (i as f64 + 0.5) * width, c))
        .collect()
}
