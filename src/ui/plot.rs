use eframe::egui::{self, Color32, Ui};
use egui_plot::{Bar, BarChart, Plot};

use crate::color;
use crate::render::View;
use crate::state::{histogram, ViewerState};

const HISTOGRAM_BINS: usize = 40;

// ---------------------------------------------------------------------------
// Projections (central panel, top)
// ---------------------------------------------------------------------------

/// Show the three glass-brain projections side by side.
pub fn projections(ui: &mut Ui, textures: &[egui::TextureHandle]) {
    ui.horizontal(|ui: &mut Ui| {
        for (view, tex) in View::ALL.iter().zip(textures) {
            ui.vertical(|ui: &mut Ui| {
                ui.label(view.label());
                ui.image((tex.id(), tex.size_vec2()));
            });
        }
    });
}

// ---------------------------------------------------------------------------
// Value histogram (central panel, bottom)
// ---------------------------------------------------------------------------

/// Histogram of the non-zero ROI values.
pub fn value_histogram(ui: &mut Ui, state: &ViewerState) {
    let values = state.roi_values();
    if values.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No computed voxels to show");
        });
        return;
    }

    let bins = histogram(&values, HISTOGRAM_BINS);
    let width = if bins.len() > 1 {
        bins[1].0 - bins[0].0
    } else {
        1.0
    };
    let vmax = state.result.map.max_abs();
    let threshold = state.render.threshold;

    let bars: Vec<Bar> = bins
        .iter()
        .map(|&(centre, count)| {
            let fill = if centre.abs() >= threshold {
                let [r, g, b] = color::color_for(centre, vmax);
                Color32::from_rgb(r, g, b)
            } else {
                Color32::LIGHT_GRAY
            };
            Bar::new(centre, count as f64).width(width).fill(fill)
        })
        .collect();

    Plot::new("value_histogram")
        .x_axis_label("Spearman r")
        .y_axis_label("Voxels")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name("ROI values"));
        });
}
