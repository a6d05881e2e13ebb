use std::collections::{BTreeMap, BTreeSet};

use ndarray::{Array3, Array4};

use crate::error::RsaError;

/// Voxel index → world (mm) transform, row-major 4×4.
pub type Affine = [[f64; 4]; 4];

/// Identity affine, used when a header carries no usable transform.
pub const IDENTITY_AFFINE: Affine = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Length of each voxel axis in world units (column norms of the affine).
pub fn voxel_sizes(affine: &Affine) -> [f64; 3] {
    let mut sizes = [1.0; 3];
    for (axis, size) in sizes.iter_mut().enumerate() {
        let norm = (0..3)
            .map(|row| affine[row][axis].powi(2))
            .sum::<f64>()
            .sqrt();
        if norm.is_finite() && norm > 0.0 {
            *size = norm;
        }
    }
    sizes
}

/// Spatial part `(x, y, z)` of a 4-D volume's shape.
pub fn spatial_shape(volume: &Array4<f64>) -> [usize; 3] {
    let (nx, ny, nz, _) = volume.dim();
    [nx, ny, nz]
}

// ---------------------------------------------------------------------------
// ScanLabel / LabelTable – one row per scan
// ---------------------------------------------------------------------------

/// Condition and run of a single scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanLabel {
    pub condition: String,
    pub chunk: i64,
}

/// The per-scan label table, in scan order.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    pub rows: Vec<ScanLabel>,
    /// Sorted distinct condition names.
    pub conditions: BTreeSet<String>,
    /// Sorted distinct chunk identifiers.
    pub chunks: BTreeSet<i64>,
}

impl LabelTable {
    pub fn from_rows(rows: Vec<ScanLabel>) -> Self {
        let conditions = rows.iter().map(|r| r.condition.clone()).collect();
        let chunks = rows.iter().map(|r| r.chunk).collect();
        LabelTable {
            rows,
            conditions,
            chunks,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of scans per condition.
    pub fn condition_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in &self.rows {
            *counts.entry(row.condition.clone()).or_insert(0) += 1;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Dataset – everything the analysis reads
// ---------------------------------------------------------------------------

/// BOLD series, ROI mask and labels with their shapes checked against each other.
#[derive(Debug, Clone)]
pub struct Dataset {
    bold: Array4<f64>,
    mask: Array3<bool>,
    affine: Affine,
    labels: LabelTable,
}

impl Dataset {
    /// Assemble a dataset, rejecting spatial or scan-count mismatches up front.
    pub fn new(
        bold: Array4<f64>,
        mask: Array3<bool>,
        affine: Affine,
        labels: LabelTable,
    ) -> Result<Self, RsaError> {
        let expected = spatial_shape(&bold);
        let (mx, my, mz) = mask.dim();
        let found = [mx, my, mz];
        if found != expected {
            return Err(RsaError::ShapeMismatch {
                what: "mask",
                expected,
                found,
            });
        }
        let scans = bold.dim().3;
        if scans != labels.len() {
            return Err(RsaError::ScanCountMismatch {
                scans,
                rows: labels.len(),
            });
        }
        Ok(Dataset {
            bold,
            mask,
            affine,
            labels,
        })
    }

    pub fn bold(&self) -> &Array4<f64> {
        &self.bold
    }

    pub fn mask(&self) -> &Array3<bool> {
        &self.mask
    }

    pub fn affine(&self) -> &Affine {
        &self.affine
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn shape(&self) -> [usize; 3] {
        spatial_shape(&self.bold)
    }

    pub fn n_scans(&self) -> usize {
        self.bold.dim().3
    }

    pub fn roi_voxels(&self) -> usize {
        self.mask.iter().filter(|&&m| m).count()
    }
}

// ---------------------------------------------------------------------------
// RsaMap – the analysis output
// ---------------------------------------------------------------------------

/// Per-voxel RSA statistic on the BOLD grid, with the BOLD affine.
#[derive(Debug, Clone)]
pub struct RsaMap {
    pub values: Array3<f64>,
    pub affine: Affine,
}

impl RsaMap {
    pub fn shape(&self) -> [usize; 3] {
        let (nx, ny, nz) = self.values.dim();
        [nx, ny, nz]
    }

    pub fn voxel_sizes(&self) -> [f64; 3] {
        voxel_sizes(&self.affine)
    }

    /// Largest absolute value in the map (0 for an empty map).
    pub fn max_abs(&self) -> f64 {
        self.values
            .iter()
            .filter(|v| v.is_finite())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}
