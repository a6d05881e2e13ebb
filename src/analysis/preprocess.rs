use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{ArrayView1, ArrayViewMut1, Axis, Zip};

use super::chunks::Chunk;

/// A standard deviation within this many ULPs of the raw magnitude is rounding
/// residue, not signal.
const ZERO_STD_ULPS: f64 = 1024.0;

/// Remove the least-squares line over scan index `0..n`.
///
/// A series of one point is its own fit and becomes 0.
pub fn detrend(mut series: ArrayViewMut1<'_, f64>) {
    let n = series.len();
    if n == 0 {
        return;
    }
    let nf = n as f64;
    let t_mean = (nf - 1.0) / 2.0;
    let y_mean = series.sum() / nf;

    let mut s_ty = 0.0;
    let mut s_tt = 0.0;
    for (t, &y) in series.iter().enumerate() {
        let dt = t as f64 - t_mean;
        s_ty += dt * (y - y_mean);
        s_tt += dt * dt;
    }
    let slope = if s_tt > 0.0 { s_ty / s_tt } else { 0.0 };

    for (t, y) in series.iter_mut().enumerate() {
        *y -= y_mean + slope * (t as f64 - t_mean);
    }
}

/// Subtract the mean and divide by the population standard deviation.
///
/// `scale` is the magnitude of the series before any earlier step (such as
/// [`detrend`]) cancelled most of it. A standard deviation that is zero up to
/// rounding at that magnitude leaves the series untouched and returns `false`.
pub fn zscore(mut series: ArrayViewMut1<'_, f64>, scale: f64) -> bool {
    let n = series.len();
    if n == 0 {
        return false;
    }
    let nf = n as f64;
    let mean = series.sum() / nf;
    let var = series.iter().map(|&y| (y - mean) * (y - mean)).sum::<f64>() / nf;
    let std = var.sqrt();

    let floor = ZERO_STD_ULPS * f64::EPSILON * scale.abs().max(max_abs(series.view()));
    if !std.is_finite() || std <= floor {
        return false;
    }
    series.mapv_inplace(|y| (y - mean) / std);
    true
}

fn max_abs(series: ArrayView1<'_, f64>) -> f64 {
    series.iter().fold(0.0_f64, |acc, y| acc.max(y.abs()))
}

/// Detrend then z-score one voxel's time series. Returns `false` for a
/// zero-variance series, which stays detrended but unscaled.
pub fn standardize(mut series: ArrayViewMut1<'_, f64>) -> bool {
    let raw_scale = max_abs(series.view());
    detrend(series.view_mut());
    zscore(series, raw_scale)
}

/// Standardize every voxel of a chunk independently, in place.
pub fn preprocess_chunk(mut chunk: Chunk) -> Chunk {
    let constant = AtomicUsize::new(0);

    Zip::from(chunk.data.lanes_mut(Axis(3))).par_for_each(|series| {
        if !standardize(series) {
            constant.fetch_add(1, Ordering::Relaxed);
        }
    });

    let constant = constant.into_inner();
    if constant > 0 && !chunk.is_empty() {
        log::debug!(
            "Chunk {} ({} scans): {constant} zero-variance voxel series left unscaled",
            chunk.id,
            chunk.len()
        );
    }
    chunk
}
