use std::collections::BTreeSet;

use ndarray::{Array4, Axis};

use super::model::LabelTable;
use crate::error::RsaError;

// ---------------------------------------------------------------------------
// Scan selection: which scans take part in the RSA
// ---------------------------------------------------------------------------

/// Scans kept after dropping excluded conditions.
///
/// `indices` are positions on the full scan axis, in increasing order, and
/// `conditions[k]` is the label of scan `indices[k]`. Both the model RDM and the
/// searchlight samples are built from this one selection, so they stay aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanSelection {
    pub indices: Vec<usize>,
    pub conditions: Vec<String>,
}

impl ScanSelection {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Restrict a `(x, y, z, scan)` volume to the selected scans, in selection order.
    pub fn select_volume(&self, volume: &Array4<f64>) -> Array4<f64> {
        volume.select(Axis(3), &self.indices)
    }
}

/// Keep every scan whose condition is not in `exclude`.
///
/// Excluded names that never occur in the table are logged as warnings.
pub fn select_scans(labels: &LabelTable, exclude: &[String]) -> Result<ScanSelection, RsaError> {
    let excluded: BTreeSet<&str> = exclude.iter().map(String::as_str).collect();

    for name in &excluded {
        if !labels.conditions.contains(*name) {
            log::warn!("Excluded condition '{name}' does not occur in the label table");
        }
    }

    let (indices, conditions): (Vec<usize>, Vec<String>) = labels
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !excluded.contains(row.condition.as_str()))
        .map(|(i, row)| (i, row.condition.clone()))
        .unzip();
    let selection = ScanSelection {
        indices,
        conditions,
    };

    if selection.is_empty() {
        return Err(RsaError::EmptySelection {
            excluded: exclude.to_vec(),
        });
    }

    log::info!(
        "Selected {} of {} scans after excluding {:?}",
        selection.len(),
        labels.len(),
        exclude
    );
    Ok(selection)
}
