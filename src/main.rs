mod analysis;
mod app;
mod cli;
mod color;
mod config;
mod data;
mod error;
mod render;
mod state;
mod ui;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use eframe::egui;

use app::RsaViewerApp;
use cli::Args;
use config::Config;
use render::RenderOptions;
use state::ViewerState;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    if let Some(n) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("configuring worker threads")?;
    }

    let dataset = data::loader::load_dataset(&config.input)?;
    let result = analysis::run(&dataset, &config.analysis)?;

    data::writer::save_map(&config.output.map, &result.map)?;

    let render = RenderOptions {
        threshold: config.output.threshold,
        scale: config.output.scale,
        vmax: None,
    };
    let img = render::glass_brain(&result.map, dataset.mask(), &render);
    render::save_png(&config.output.png, &img)?;

    if args.view {
        let state = ViewerState::new(
            result,
            dataset.mask().clone(),
            dataset.labels().condition_counts(),
            config.analysis.exclude.clone(),
            render,
        );
        drop(dataset);
        open_viewer(state)?;
    }
    Ok(())
}

fn open_viewer(state: ViewerState) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "RSA Searchlight – Map Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(RsaViewerApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))
}
