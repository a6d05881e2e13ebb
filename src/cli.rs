use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::config::Config;

#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about = "Searchlight RSA over a 4-D BOLD volume")]
pub struct Args {
    /// Path to a JSON config; flags below override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// 4-D BOLD NIfTI
    #[arg(long)]
    pub bold: Option<PathBuf>,

    /// ROI mask NIfTI on the BOLD grid
    #[arg(long)]
    pub mask: Option<PathBuf>,

    /// Per-scan label table (txt, tsv, csv, json or parquet)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Searchlight radius in voxels [default: 2]
    #[arg(long)]
    pub radius: Option<f64>,

    /// Condition to drop; repeat for several [default: rest, scrambledpix]
    #[arg(long, value_name = "COND")]
    pub exclude: Vec<String>,

    /// Number of runs, ids 0..N, or `auto` for the ids in the label table [default: 12]
    #[arg(long, value_name = "N|auto")]
    pub chunks: Option<ChunkCount>,

    /// Output NIfTI map [default: rsa_map.nii.gz]
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Output glass-brain PNG [default: rsa_glass_brain.png]
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Hide |value| below this in renderings
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Worker threads (defaults to one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Open the interactive viewer after the run
    #[arg(long, default_value_t = false)]
    pub view: bool,
}

/// Value of `--chunks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkCount {
    /// Use the distinct ids found in the label table.
    Auto,
    Runs(usize),
}

impl FromStr for ChunkCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ChunkCount::Auto);
        }
        s.parse::<usize>()
            .map(ChunkCount::Runs)
            .map_err(|_| format!("expected a run count or `auto`, got '{s}'"))
    }
}

impl Args {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(p) = &self.bold {
            config.input.bold = p.clone();
        }
        if let Some(p) = &self.mask {
            config.input.mask = p.clone();
        }
        if let Some(p) = &self.labels {
            config.input.labels = p.clone();
        }
        if let Some(r) = self.radius {
            config.analysis.radius = r;
        }
        if !self.exclude.is_empty() {
            config.analysis.exclude = self.exclude.clone();
        }
        if let Some(count) = self.chunks {
            config.analysis.expected_chunks = match count {
                ChunkCount::Auto => None,
                ChunkCount::Runs(n) => Some(n),
            };
        }
        if let Some(p) = &self.output {
            config.output.map = p.clone();
        }
        if let Some(p) = &self.png {
            config.output.png = p.clone();
        }
        if let Some(t) = self.threshold {
            config.output.threshold = t;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_keep_config() {
        let args = Args::try_parse_from(["rsa-searchlight"]).unwrap();
        let mut cfg = Config::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.analysis.radius, 2.0);
        assert_eq!(cfg.analysis.exclude, vec!["rest", "scrambledpix"]);
        assert_eq!(cfg.analysis.expected_chunks, Some(12));
        assert!(!args.view);
    }

    #[test]
    fn flags_override_config() {
        let args = Args::try_parse_from([
            "rsa-searchlight",
            "--bold",
            "b.nii",
            "--radius",
            "3",
            "--exclude",
            "rest",
            "--exclude",
            "face",
            "--chunks",
            "6",
            "--threshold",
            "0.2",
            "--view",
        ])
        .unwrap();
        let mut cfg = Config::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.input.bold, PathBuf::from("b.nii"));
        assert_eq!(cfg.input.mask, PathBuf::from("mask.nii.gz"));
        assert_eq!(cfg.analysis.radius, 3.0);
        assert_eq!(cfg.analysis.exclude, vec!["rest", "face"]);
        assert_eq!(cfg.analysis.expected_chunks, Some(6));
        assert_eq!(cfg.output.threshold, 0.2);
        assert!(args.view);
    }

    #[test]
    fn chunks_auto_uses_observed_ids() {
        let args = Args::try_parse_from(["rsa-searchlight", "--chunks", "auto"]).unwrap();
        assert_eq!(args.chunks, Some(ChunkCount::Auto));
        let mut cfg = Config::default();
        args.apply(&mut cfg);
        assert_eq!(cfg.analysis.expected_chunks, None);

        assert!(Args::try_parse_from(["rsa-searchlight", "--chunks", "twelve"]).is_err());
    }
}
