use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::condition_palette;
use crate::state::ViewerState;

// ---------------------------------------------------------------------------
// Left side panel – run summary and display controls
// ---------------------------------------------------------------------------

/// Render the left summary panel.
pub fn side_panel(ui: &mut Ui, state: &mut ViewerState) {
    ui.heading("Searchlight");
    ui.separator();

    let [nx, ny, nz] = state.result.map.shape();
    let stats = &state.result.stats;
    egui::Grid::new("summary_grid")
        .num_columns(2)
        .striped(true)
        .show(ui, |ui: &mut Ui| {
            ui.label("Grid");
            ui.label(format!("{nx} × {ny} × {nz}"));
            ui.end_row();

            ui.label("ROI voxels");
            ui.label(stats.roi_voxels.to_string());
            ui.end_row();

            ui.label("Sphere size");
            ui.label(stats.sphere_size.to_string());
            ui.end_row();

            ui.label("Computed");
            ui.label(stats.computed.to_string());
            ui.end_row();

            ui.label("Degenerate");
            ui.label(stats.degenerate.to_string());
            ui.end_row();

            ui.label("Range");
            ui.label(match (stats.min, stats.max) {
                (Some(lo), Some(hi)) => format!("{lo:.3} … {hi:.3}"),
                _ => "–".to_string(),
            });
            ui.end_row();

            ui.label("Mean");
            ui.label(stats.mean.map_or_else(|| "–".to_string(), |m| format!("{m:.3}")));
            ui.end_row();

            ui.label("Scans in model");
            ui.label(state.result.selection.len().to_string());
            ui.end_row();

            ui.label("RDM entries");
            ui.label(state.result.model.n_entries().to_string());
            ui.end_row();
        });

    ui.separator();

    // ---- Threshold ----
    ui.strong("Display threshold");
    let vmax = state.result.map.max_abs().max(f64::EPSILON);
    let mut threshold = state.render.threshold;
    if ui
        .add(egui::Slider::new(&mut threshold, 0.0..=vmax).text("|r|"))
        .changed()
    {
        state.set_threshold(threshold);
    }
    ui.label(format!("{} voxels shown", state.supra_threshold()));

    ui.separator();

    // ---- Per-condition scan counts ----
    ui.strong("Conditions");
    let palette = condition_palette(state.condition_counts.len());
    TableBuilder::new(ui)
        .max_scroll_height(240.0)
        .striped(true)
        .column(Column::auto().at_least(120.0))
        .column(Column::auto())
        .column(Column::remainder())
        .header(18.0, |mut header| {
            header.col(|ui| {
                ui.strong("Condition");
            });
            header.col(|ui| {
                ui.strong("Scans");
            });
            header.col(|ui| {
                ui.strong("Used");
            });
        })
        .body(|mut body| {
            for (i, (condition, count)) in state.condition_counts.iter().enumerate() {
                let [r, g, b] = palette[i];
                let excluded = state.excluded.contains(condition);
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(condition).color(Color32::from_rgb(r, g, b)));
                    });
                    row.col(|ui| {
                        ui.label(count.to_string());
                    });
                    row.col(|ui| {
                        ui.label(if excluded { "no" } else { "yes" });
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut ViewerState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Save map…").clicked() {
                save_map_dialog(state);
                ui.close_menu();
            }
            if ui.button("Save PNG…").clicked() {
                save_png_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        let stats = &state.result.stats;
        ui.label(format!(
            "{} of {} ROI voxels computed",
            stats.computed, stats.roi_voxels
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") {
                Color32::RED
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn save_map_dialog(state: &mut ViewerState) {
    let file = rfd::FileDialog::new()
        .set_title("Save RSA map")
        .add_filter("NIfTI", &["nii", "gz"])
        .set_file_name("rsa_map.nii.gz")
        .save_file();

    if let Some(path) = file {
        state.save_map(&path);
    }
}

pub fn save_png_dialog(state: &mut ViewerState) {
    let file = rfd::FileDialog::new()
        .set_title("Save glass-brain rendering")
        .add_filter("PNG", &["png"])
        .set_file_name("rsa_glass_brain.png")
        .save_file();

    if let Some(path) = file {
        state.save_png(&path);
    }
}
