use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{Array2, Array3, Array4, s};
use rayon::prelude::*;

use super::rdm::{self, ModelRdm};
use crate::data::model::spatial_shape;
use crate::error::RsaError;

/// Map value for ROI voxels whose neighbourhood gives no defined correlation.
pub const DEGENERATE_SENTINEL: f64 = 0.0;

/// Searchlight geometry.
#[derive(Debug, Clone, Copy)]
pub struct SearchlightParams {
    /// Euclidean radius in voxels; neighbours at distance `<= radius` are used.
    pub radius: f64,
    /// Only gather neighbours that are inside the ROI themselves.
    pub mask_neighbors: bool,
}

/// Summary of one sweep.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepStats {
    pub roi_voxels: usize,
    pub computed: usize,
    pub degenerate: usize,
    /// Voxels in a full (unclipped) sphere.
    pub sphere_size: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

/// Integer offsets within Euclidean distance `radius` of the origin, origin first.
pub fn sphere_offsets(radius: f64) -> Vec<[isize; 3]> {
    let reach = radius.max(0.0).floor() as isize;
    let limit = radius * radius + 1e-9;
    let mut offsets = vec![[0, 0, 0]];
    for dx in -reach..=reach {
        for dy in -reach..=reach {
            for dz in -reach..=reach {
                if (dx, dy, dz) == (0, 0, 0) {
                    continue;
                }
                if ((dx * dx + dy * dy + dz * dz) as f64) <= limit {
                    offsets.push([dx, dy, dz]);
                }
            }
        }
    }
    offsets
}

/// In-bounds grid coordinates of the sphere centred on `center`.
pub fn neighborhood(
    center: [usize; 3],
    shape: [usize; 3],
    offsets: &[[isize; 3]],
    mask: Option<&Array3<bool>>,
) -> Vec<[usize; 3]> {
    offsets
        .iter()
        .filter_map(|off| {
            let mut coord = [0usize; 3];
            for axis in 0..3 {
                let c = center[axis] as isize + off[axis];
                if c < 0 || c as usize >= shape[axis] {
                    return None;
                }
                coord[axis] = c as usize;
            }
            Some(coord)
        })
        .filter(|c| mask.map_or(true, |m| m[*c]))
        .collect()
}

/// Spearman correlation between the empirical RDM of `coords` and the model.
///
/// `samples` holds the retained scans only, in model order. Returns `None` for
/// a neighbourhood of fewer than two voxels, a scan pattern without variance or
/// a constant empirical RDM.
pub fn searchlight_value(
    samples: &Array4<f64>,
    coords: &[[usize; 3]],
    model: &ModelRdm,
) -> Option<f64> {
    if coords.len() < 2 {
        return None;
    }
    let n_scans = samples.dim().3;
    let mut patterns = Array2::<f64>::zeros((n_scans, coords.len()));
    for (j, &[x, y, z]) in coords.iter().enumerate() {
        patterns
            .column_mut(j)
            .assign(&samples.slice(s![x, y, z, ..]));
    }

    let empirical = rdm::correlation_distance_matrix(patterns.view())?;
    let vector = rdm::flatten(&empirical, model.mode());
    rdm::spearman_with_ranks(&vector, model.ranks())
}

/// Run the searchlight over every ROI voxel.
///
/// Voxels outside the mask stay exactly 0; degenerate ROI voxels get
/// [`DEGENERATE_SENTINEL`]. Centres are processed in parallel and written
/// into the map by a single writer.
pub fn sweep(
    samples: &Array4<f64>,
    mask: &Array3<bool>,
    model: &ModelRdm,
    params: &SearchlightParams,
) -> Result<(Array3<f64>, SweepStats), RsaError> {
    let shape = spatial_shape(samples);
    let (mx, my, mz) = mask.dim();
    if [mx, my, mz] != shape {
        return Err(RsaError::ShapeMismatch {
            what: "mask",
            expected: shape,
            found: [mx, my, mz],
        });
    }
    rdm::check_alignment(model, samples)?;

    let offsets = sphere_offsets(params.radius);
    let centers: Vec<[usize; 3]> = mask
        .indexed_iter()
        .filter(|(_, inside)| **inside)
        .map(|((x, y, z), _)| [x, y, z])
        .collect();
    log::info!(
        "Searchlight over {} ROI voxels, radius {} ({} voxels per sphere)",
        centers.len(),
        params.radius,
        offsets.len()
    );

    let neighbor_mask = params.mask_neighbors.then_some(mask);
    let done = AtomicUsize::new(0);
    let step = (centers.len() / 10).max(1);

    let results: Vec<([usize; 3], Option<f64>)> = centers
        .par_iter()
        .map(|&center| {
            let coords = neighborhood(center, shape, &offsets, neighbor_mask);
            let value = searchlight_value(samples, &coords, model);
            log::trace!("Voxel {center:?}: {} neighbours -> {value:?}", coords.len());

            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            if finished % step == 0 {
                log::info!("Searchlight {finished}/{} voxels", centers.len());
            }
            (center, value)
        })
        .collect();

    let mut map = Array3::zeros((shape[0], shape[1], shape[2]));
    let mut stats = SweepStats {
        roi_voxels: centers.len(),
        sphere_size: offsets.len(),
        ..SweepStats::default()
    };
    let mut sum = 0.0;
    for (center, value) in results {
        match value {
            Some(v) => {
                map[center] = v;
                stats.computed += 1;
                sum += v;
                stats.min = Some(stats.min.map_or(v, |m: f64| m.min(v)));
                stats.max = Some(stats.max.map_or(v, |m: f64| m.max(v)));
            }
            None => {
                map[center] = DEGENERATE_SENTINEL;
                stats.degenerate += 1;
            }
        }
    }
    if stats.computed > 0 {
        stats.mean = Some(sum / stats.computed as f64);
    }
    if stats.degenerate > 0 {
        log::warn!(
            "{} of {} ROI voxels had a degenerate neighbourhood and were set to {DEGENERATE_SENTINEL}",
            stats.degenerate,
            stats.roi_voxels
        );
    }
    Ok((map, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RdmVector;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    /// Deterministic noise in [-0.5, 0.5).
    fn noise(seed: usize) -> f64 {
        let mut x = (seed as u64).wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        x ^= x >> 33;
        x = x.wrapping_mul(0xff51afd7ed558ccd);
        x ^= x >> 33;
        (x >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }

    /// Scans of condition A carry one spatial pattern, B its negation.
    fn planted(shape: (usize, usize, usize), conditions: &[String]) -> Array4<f64> {
        let nt = conditions.len();
        Array4::from_shape_fn((shape.0, shape.1, shape.2, nt), |(x, y, z, t)| {
            let pattern = ((x * 7 + y * 3 + z * 5) % 11) as f64 - 5.0;
            let sign = if conditions[t] == "A" { 1.0 } else { -1.0 };
            let idx = ((x * 31 + y) * 31 + z) * 131 + t;
            sign * pattern + 0.2 * noise(idx)
        })
    }

    fn params(radius: f64) -> SearchlightParams {
        SearchlightParams {
            radius,
            mask_neighbors: false,
        }
    }

    #[test]
    fn sphere_sizes() {
        assert_eq!(sphere_offsets(0.0), vec![[0, 0, 0]]);
        assert_eq!(sphere_offsets(1.0).len(), 7);
        assert_eq!(sphere_offsets(1.5).len(), 19);
        assert_eq!(sphere_offsets(2.0).len(), 33);
    }

    #[test]
    fn neighborhood_is_clipped_at_the_border() {
        let offsets = sphere_offsets(1.0);
        let corner = neighborhood([0, 0, 0], [3, 3, 3], &offsets, None);
        assert_eq!(corner.len(), 4);
        let inner = neighborhood([1, 1, 1], [3, 3, 3], &offsets, None);
        assert_eq!(inner.len(), 7);
        assert_eq!(inner[0], [1, 1, 1]);
    }

    #[test]
    fn neighborhood_can_be_restricted_to_roi() {
        let mut mask = Array3::from_elem((3, 3, 3), false);
        mask[[1, 1, 1]] = true;
        mask[[1, 1, 2]] = true;
        let coords = neighborhood([1, 1, 1], [3, 3, 3], &sphere_offsets(1.0), Some(&mask));
        assert_eq!(coords, vec![[1, 1, 1], [1, 1, 2]]);
    }

    #[test]
    fn planted_condition_effect_is_recovered() {
        let conditions = names(&["A", "B", "A", "B", "A", "B", "B", "A"]);
        let samples = planted((4, 4, 3), &conditions);
        let mask = Array3::from_elem((4, 4, 3), true);
        let model = ModelRdm::from_conditions(&conditions, RdmVector::Full).unwrap();

        let (map, stats) = sweep(&samples, &mask, &model, &params(1.0)).unwrap();
        assert_eq!(map.dim(), (4, 4, 3));
        assert_eq!(stats.roi_voxels, 48);
        assert_eq!(stats.computed, 48);
        assert_eq!(stats.degenerate, 0);
        for &v in map.iter() {
            assert!(v > 0.5, "expected a strong positive correlation, got {v}");
        }
    }

    #[test]
    fn voxels_outside_mask_stay_zero() {
        let conditions = names(&["A", "B", "A", "B"]);
        let samples = planted((3, 3, 3), &conditions);
        let mut mask = Array3::from_elem((3, 3, 3), false);
        mask[[1, 1, 1]] = true;
        let model = ModelRdm::from_conditions(&conditions, RdmVector::UpperTriangle).unwrap();

        let (map, stats) = sweep(&samples, &mask, &model, &params(1.0)).unwrap();
        assert_eq!(stats.roi_voxels, 1);
        for ((x, y, z), &v) in map.indexed_iter() {
            if [x, y, z] != [1, 1, 1] {
                assert_eq!(v, 0.0);
            }
        }
        assert!(map[[1, 1, 1]] > 0.5);
    }

    #[test]
    fn all_zero_mask_gives_all_zero_map() {
        let conditions = names(&["A", "B", "A", "B"]);
        let samples = planted((3, 2, 2), &conditions);
        let mask = Array3::from_elem((3, 2, 2), false);
        let model = ModelRdm::from_conditions(&conditions, RdmVector::Full).unwrap();

        let (map, stats) = sweep(&samples, &mask, &model, &params(2.0)).unwrap();
        assert_eq!(map.dim(), (3, 2, 2));
        assert!(map.iter().all(|&v| v == 0.0));
        assert_eq!(stats.computed, 0);
        assert_eq!(stats.mean, None);
    }

    #[test]
    fn radius_zero_is_degenerate_not_a_crash() {
        let conditions = names(&["A", "B", "A", "B"]);
        let samples = planted((2, 2, 2), &conditions);
        let mask = Array3::from_elem((2, 2, 2), true);
        let model = ModelRdm::from_conditions(&conditions, RdmVector::Full).unwrap();

        let (map, stats) = sweep(&samples, &mask, &model, &params(0.0)).unwrap();
        assert_eq!(stats.sphere_size, 1);
        assert_eq!(stats.degenerate, 8);
        assert!(map.iter().all(|&v| v == DEGENERATE_SENTINEL));
    }

    #[test]
    fn constant_patterns_are_degenerate() {
        let conditions = names(&["A", "A", "B", "B"]);
        let samples = Array4::zeros((2, 2, 2, 4));
        let mask = Array3::from_elem((2, 2, 2), true);
        let model = ModelRdm::from_conditions(&conditions, RdmVector::Full).unwrap();

        let (map, stats) = sweep(&samples, &mask, &model, &params(2.0)).unwrap();
        assert_eq!(stats.degenerate, 8);
        assert!(map.iter().all(|v| v.is_finite() && *v == 0.0));
    }

    #[test]
    fn shape_and_alignment_are_checked_before_the_sweep() {
        let conditions = names(&["A", "B", "A"]);
        let model = ModelRdm::from_conditions(&conditions, RdmVector::Full).unwrap();

        let samples = Array4::zeros((2, 2, 2, 3));
        let mask = Array3::from_elem((2, 2, 3), true);
        let err = sweep(&samples, &mask, &model, &params(1.0)).unwrap_err();
        assert!(matches!(err, RsaError::ShapeMismatch { .. }));

        let samples = Array4::zeros((2, 2, 2, 4));
        let mask = Array3::from_elem((2, 2, 2), true);
        let err = sweep(&samples, &mask, &model, &params(1.0)).unwrap_err();
        assert_eq!(err, RsaError::Misaligned { model: 3, samples: 4 });
    }
}
