use std::cmp::Ordering;
use std::collections::BTreeSet;

use ndarray::{Array2, Array4, ArrayView2, Axis};

use crate::config::RdmVector;
use crate::error::RsaError;

// ---------------------------------------------------------------------------
// Model RDM
// ---------------------------------------------------------------------------

/// Binary condition model: 0 for scans of the same condition, 1 otherwise.
#[derive(Debug, Clone)]
pub struct ModelRdm {
    matrix: Array2<f64>,
    ranks: Vec<f64>,
    mode: RdmVector,
}

impl ModelRdm {
    /// Build the model over scans labelled `conditions`, in that order.
    ///
    /// Fewer than two distinct conditions give a constant model, which no
    /// statistic can be correlated with.
    pub fn from_conditions(conditions: &[String], mode: RdmVector) -> Result<Self, RsaError> {
        let distinct: BTreeSet<&String> = conditions.iter().collect();
        if distinct.len() < 2 {
            return Err(RsaError::DegenerateModel {
                found: distinct.into_iter().cloned().collect(),
            });
        }

        let n = conditions.len();
        let matrix = Array2::from_shape_fn((n, n), |(i, j)| {
            if conditions[i] == conditions[j] { 0.0 } else { 1.0 }
        });
        let ranks = average_ranks(&flatten(&matrix, mode));

        log::info!(
            "Model RDM over {n} scans and {} conditions ({} entries correlated)",
            distinct.len(),
            ranks.len()
        );
        Ok(ModelRdm {
            matrix,
            ranks,
            mode,
        })
    }

    #[cfg(test)]
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Average ranks of the flattened model, computed once for the whole sweep.
    pub fn ranks(&self) -> &[f64] {
        &self.ranks
    }

    /// Number of RDM entries each searchlight is correlated over.
    pub fn n_entries(&self) -> usize {
        self.ranks.len()
    }

    pub fn mode(&self) -> RdmVector {
        self.mode
    }

    pub fn n_scans(&self) -> usize {
        self.matrix.nrows()
    }
}

/// Fail unless the model and the searchlight samples index the same scans.
pub fn check_alignment(model: &ModelRdm, samples: &Array4<f64>) -> Result<(), RsaError> {
    let n_samples = samples.len_of(Axis(3));
    if model.n_scans() != n_samples {
        return Err(RsaError::Misaligned {
            model: model.n_scans(),
            samples: n_samples,
        });
    }
    Ok(())
}

/// Row-major entries of a square matrix, whole or strictly upper triangle.
pub fn flatten(matrix: &Array2<f64>, mode: RdmVector) -> Vec<f64> {
    match mode {
        RdmVector::Full => matrix.iter().copied().collect(),
        RdmVector::UpperTriangle => {
            let n = matrix.nrows();
            let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
            for i in 0..n {
                for j in (i + 1)..n {
                    out.push(matrix[[i, j]]);
                }
            }
            out
        }
    }
}

// ---------------------------------------------------------------------------
// Empirical RDM
// ---------------------------------------------------------------------------

/// Pairwise correlation distance `1 - pearson(row_i, row_j)` between the rows
/// of `samples` (one row per scan, one column per voxel).
///
/// Returns `None` when a row has no variance, since its correlation with any
/// other row is undefined.
pub fn correlation_distance_matrix(samples: ArrayView2<'_, f64>) -> Option<Array2<f64>> {
    let (n, features) = samples.dim();
    if features < 2 {
        return None;
    }

    let mut centered = samples.to_owned();
    for mut row in centered.rows_mut() {
        let scale = row.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let mean = row.sum() / features as f64;
        row.mapv_inplace(|v| v - mean);
        let norm = row.dot(&row).sqrt();
        if !norm.is_finite() || norm <= 1e-12 * scale.max(1.0) {
            return None;
        }
        row.mapv_inplace(|v| v / norm);
    }

    let gram = centered.dot(&centered.t());
    let mut dist = Array2::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let d = 1.0 - gram[[i, j]];
            dist[[i, j]] = d;
            dist[[j, i]] = d;
        }
    }
    Some(dist)
}

// ---------------------------------------------------------------------------
// Rank correlation
// ---------------------------------------------------------------------------

/// 1-based ranks; tied values share the average of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i + 1;
        while j < order.len() && values[order[j]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j - 1) as f64 / 2.0 + 1.0;
        for &k in &order[i..j] {
            ranks[k] = rank;
        }
        i = j;
    }
    ranks
}

/// Pearson correlation; `None` for mismatched lengths, fewer than two points
/// or a constant input.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len();
    if n != y.len() || n < 2 {
        return None;
    }
    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (a, b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx <= 0.0 || syy <= 0.0 {
        return None;
    }
    let r = sxy / (sxx.sqrt() * syy.sqrt());
    r.is_finite().then(|| r.clamp(-1.0, 1.0))
}

/// Spearman rank correlation with average ranks for ties.
#[cfg(test)]
pub fn spearman(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }
    pearson(&average_ranks(x), &average_ranks(y))
}

/// Spearman correlation of `x` against data whose ranks are already known.
pub fn spearman_with_ranks(x: &[f64], y_ranks: &[f64]) -> Option<f64> {
    if x.len() != y_ranks.len() {
        return None;
    }
    pearson(&average_ranks(x), y_ranks)
}
