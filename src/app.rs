use eframe::egui;
use image::RgbaImage;

use crate::state::ViewerState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RsaViewerApp {
    pub state: ViewerState,
    textures: Vec<egui::TextureHandle>,
}

impl RsaViewerApp {
    pub fn new(state: ViewerState) -> Self {
        Self {
            state,
            textures: Vec::new(),
        }
    }

    /// Upload the current projections when they changed.
    fn sync_textures(&mut self, ctx: &egui::Context) {
        if !self.state.dirty && !self.textures.is_empty() {
            return;
        }
        self.textures = self
            .state
            .views
            .iter()
            .enumerate()
            .map(|(i, img)| {
                ctx.load_texture(format!("view_{i}"), to_color_image(img), egui::TextureOptions::NEAREST)
            })
            .collect();
        self.state.dirty = false;
    }
}

fn to_color_image(img: &RgbaImage) -> egui::ColorImage {
    let size = [img.width() as usize, img.height() as usize];
    egui::ColorImage::from_rgba_unmultiplied(size, img.as_raw())
}

impl eframe::App for RsaViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: summary + threshold ----
        egui::SidePanel::left("summary_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        self.sync_textures(ctx);

        // ---- Central panel: projections + histogram ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::projections(ui, &self.textures);
            ui.separator();
            plot::value_histogram(ui, &self.state);
        });
    }
}
