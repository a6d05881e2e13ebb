use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::RsaError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Read a JSON config file; missing sections and fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RsaError> {
        let radius = self.analysis.radius;
        if !radius.is_finite() || radius < 0.0 {
            return Err(RsaError::InvalidConfig(format!(
                "searchlight radius must be a finite non-negative number, got {radius}"
            )));
        }
        if self.analysis.expected_chunks == Some(0) {
            return Err(RsaError::InvalidConfig(
                "expected_chunks must be at least 1".to_string(),
            ));
        }
        let threshold = self.output.threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(RsaError::InvalidConfig(format!(
                "render threshold must be a finite non-negative number, got {threshold}"
            )));
        }
        if self.output.scale == 0 {
            return Err(RsaError::InvalidConfig(
                "render scale must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    #[serde(default = "InputConfig::default_bold")]
    pub bold: PathBuf,
    #[serde(default = "InputConfig::default_mask")]
    pub mask: PathBuf,
    #[serde(default = "InputConfig::default_labels")]
    pub labels: PathBuf,
    #[serde(default = "InputConfig::default_label_column")]
    pub label_column: String,
    #[serde(default = "InputConfig::default_chunk_column")]
    pub chunk_column: String,
}

impl InputConfig {
    fn default_bold() -> PathBuf {
        PathBuf::from("bold.nii.gz")
    }
    fn default_mask() -> PathBuf {
        PathBuf::from("mask.nii.gz")
    }
    fn default_labels() -> PathBuf {
        PathBuf::from("labels.txt")
    }
    fn default_label_column() -> String {
        "labels".to_string()
    }
    fn default_chunk_column() -> String {
        "chunks".to_string()
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bold: Self::default_bold(),
            mask: Self::default_mask(),
            labels: Self::default_labels(),
            label_column: Self::default_label_column(),
            chunk_column: Self::default_chunk_column(),
        }
    }
}

/// Which entries of a square RDM are correlated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RdmVector {
    /// The whole matrix, flattened row-major (diagonal included).
    #[default]
    Full,
    /// Strictly above the diagonal, row-major.
    UpperTriangle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Searchlight radius in voxels.
    #[serde(default = "AnalysisConfig::default_radius")]
    pub radius: f64,
    /// Conditions dropped before the model RDM is built.
    #[serde(default = "AnalysisConfig::default_exclude")]
    pub exclude: Vec<String>,
    /// Runs are numbered `0..expected_chunks`; `null` uses the ids present.
    #[serde(default = "AnalysisConfig::default_expected_chunks")]
    pub expected_chunks: Option<usize>,
    #[serde(default)]
    pub rdm_vector: RdmVector,
    /// Only gather neighbours that are themselves inside the ROI.
    #[serde(default)]
    pub mask_neighbors: bool,
}

impl AnalysisConfig {
    fn default_radius() -> f64 {
        2.0
    }
    fn default_exclude() -> Vec<String> {
        vec!["rest".to_string(), "scrambledpix".to_string()]
    }
    fn default_expected_chunks() -> Option<usize> {
        Some(12)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            radius: Self::default_radius(),
            exclude: Self::default_exclude(),
            expected_chunks: Self::default_expected_chunks(),
            rdm_vector: RdmVector::default(),
            mask_neighbors: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_map")]
    pub map: PathBuf,
    #[serde(default = "OutputConfig::default_png")]
    pub png: PathBuf,
    /// Absolute values below this are not drawn.
    #[serde(default)]
    pub threshold: f64,
    /// Screen pixels per millimetre of the smallest voxel edge.
    #[serde(default = "OutputConfig::default_scale")]
    pub scale: u32,
}

impl OutputConfig {
    fn default_map() -> PathBuf {
        PathBuf::from("rsa_map.nii.gz")
    }
    fn default_png() -> PathBuf {
        PathBuf::from("rsa_glass_brain.png")
    }
    fn default_scale() -> u32 {
        4
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            map: Self::default_map(),
            png: Self::default_png(),
            threshold: 0.0,
            scale: Self::default_scale(),
        }
    }
}
