/// Analysis layer: from a loaded dataset to the RSA map.
///
/// ```text
///   Dataset ──▶ chunks::partition ──▶ preprocess (per chunk, per voxel)
///                                            │
///                                            ▼
///                                   chunks::reassemble
///                                            │
///   LabelTable ──▶ filter::select_scans ──┬──▶ ScanSelection::select_volume
///                                         │            │
///                                         ▼            ▼
///                               rdm::ModelRdm ──▶ searchlight::sweep ──▶ RsaMap
/// ```

pub mod chunks;
pub mod preprocess;
pub mod rdm;
pub mod searchlight;

use crate::config::AnalysisConfig;
use crate::data::filter::{self, ScanSelection};
use crate::data::model::{Dataset, LabelTable, RsaMap};
use crate::error::RsaError;

use ndarray::Array4;
use rdm::ModelRdm;
use searchlight::{SearchlightParams, SweepStats};

/// Everything produced by one analysis run.
#[derive(Debug, Clone)]
pub struct SearchlightResult {
    pub map: RsaMap,
    pub stats: SweepStats,
    pub selection: ScanSelection,
    pub model: ModelRdm,
}

/// Detrend and z-score every voxel within each run, keeping the scan order.
///
/// One chunk is copied out, standardized and written back at a time, so the
/// peak is the input volume, the output volume and a single run.
pub fn standardize_runs(
    bold: &Array4<f64>,
    labels: &LabelTable,
    expected_chunks: Option<usize>,
) -> Result<Array4<f64>, RsaError> {
    let runs = chunks::partition(bold, labels, expected_chunks)?;
    let n_runs = runs.len();
    let out = chunks::reassemble(runs.map(preprocess::preprocess_chunk), bold.dim())?;
    log::info!("Detrended and z-scored {n_runs} chunks");
    Ok(out)
}

/// Run the full pipeline on a dataset.
pub fn run(dataset: &Dataset, cfg: &AnalysisConfig) -> Result<SearchlightResult, RsaError> {
    let bold = standardize_runs(dataset.bold(), dataset.labels(), cfg.expected_chunks)?;

    let selection = filter::select_scans(dataset.labels(), &cfg.exclude)?;
    let model = ModelRdm::from_conditions(&selection.conditions, cfg.rdm_vector)?;
    let samples = selection.select_volume(&bold);
    drop(bold);

    let params = SearchlightParams {
        radius: cfg.radius,
        mask_neighbors: cfg.mask_neighbors,
    };
    let (values, stats) = searchlight::sweep(&samples, dataset.mask(), &model, &params)?;

    log::info!(
        "Searchlight done: {} computed, {} degenerate, range {:?}..{:?}",
        stats.computed,
        stats.degenerate,
        stats.min,
        stats.max
    );

    Ok(SearchlightResult {
        map: RsaMap {
            values,
            affine: *dataset.affine(),
        },
        stats,
        selection,
        model,
    })
}
