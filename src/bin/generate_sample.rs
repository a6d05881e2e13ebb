use std::fs;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ndarray::{Array3, Array4};
use nifti::writer::WriterOptions;
use nifti::NiftiHeader;

/// Write a small synthetic BOLD dataset with a planted condition effect.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Output directory for bold.nii.gz, mask.nii.gz and labels.txt
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Number of runs
    #[arg(long, default_value_t = 12)]
    chunks: usize,

    /// PRNG seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const SHAPE: (usize, usize, usize) = (20, 24, 14);
const VOXEL_MM: [f64; 3] = [3.5, 3.75, 3.75];
const BLOCK: [&str; 10] = [
    "rest", "face", "house", "rest", "scrambledpix", "house", "face", "rest", "face", "house",
];
const EFFECT_CENTER: [f64; 3] = [10.0, 14.0, 7.0];
const EFFECT_RADIUS: f64 = 3.0;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

/// Ellipsoid filling most of the grid.
fn brain_mask() -> Array3<bool> {
    let (nx, ny, nz) = SHAPE;
    let half = [nx as f64 / 2.0, ny as f64 / 2.0, nz as f64 / 2.0];
    Array3::from_shape_fn(SHAPE, |(x, y, z)| {
        let p = [x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5];
        (0..3)
            .map(|i| ((p[i] - half[i]) / (half[i] - 1.0)).powi(2))
            .sum::<f64>()
            <= 1.0
    })
}

fn affine_header() -> NiftiHeader {
    let (nx, _, _) = SHAPE;
    let mut header = NiftiHeader::default();
    header.pixdim = [
        1.0,
        VOXEL_MM[0] as f32,
        VOXEL_MM[1] as f32,
        VOXEL_MM[2] as f32,
        2.5,
        1.0,
        1.0,
        1.0,
    ];
    header.sform_code = 1;
    header.qform_code = 0;
    // Radiological x axis, origin near the grid centre.
    header.srow_x = [-VOXEL_MM[0] as f32, 0.0, 0.0, (VOXEL_MM[0] * nx as f64 / 2.0) as f32];
    header.srow_y = [0.0, VOXEL_MM[1] as f32, 0.0, -45.0];
    header.srow_z = [0.0, 0.0, VOXEL_MM[2] as f32, -25.0];
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    header
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(args.seed);

    let labels: Vec<(&str, usize)> = (0..args.chunks)
        .flat_map(|run| BLOCK.iter().map(move |&c| (c, run)))
        .collect();
    let n_scans = labels.len();

    let (nx, ny, nz) = SHAPE;
    // Fixed spatial pattern that separates faces from houses.
    let pattern = Array3::from_shape_fn(SHAPE, |_| rng.gauss(0.0, 1.0));
    let baseline = Array3::from_shape_fn(SHAPE, |_| 100.0 + rng.gauss(0.0, 10.0));

    let mut bold = Array4::<f32>::zeros((nx, ny, nz, n_scans));
    for x in 0..nx {
        for y in 0..ny {
            for z in 0..nz {
                let inside = distance([x as f64, y as f64, z as f64], EFFECT_CENTER) <= EFFECT_RADIUS;
                let p = pattern[[x, y, z]];
                for (t, &(condition, run)) in labels.iter().enumerate() {
                    let within_run = (t % BLOCK.len()) as f64;
                    let drift = 0.3 * within_run + 2.0 * run as f64;
                    let signal = match (inside, condition) {
                        (true, "face") => 1.5 * p,
                        (true, "house") => -1.5 * p,
                        _ => 0.0,
                    };
                    let v = baseline[[x, y, z]] + drift + signal + rng.gauss(0.0, 0.5);
                    bold[[x, y, z, t]] = v as f32;
                }
            }
        }
    }

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;
    let header = affine_header();

    let bold_path = args.out_dir.join("bold.nii.gz");
    WriterOptions::new(&bold_path)
        .reference_header(&header)
        .write_nifti(&bold)
        .with_context(|| format!("writing {}", bold_path.display()))?;

    let mask = brain_mask().mapv(|m| if m { 1u8 } else { 0 });
    let mask_path = args.out_dir.join("mask.nii.gz");
    WriterOptions::new(&mask_path)
        .reference_header(&header)
        .write_nifti(&mask)
        .with_context(|| format!("writing {}", mask_path.display()))?;

    let labels_path = args.out_dir.join("labels.txt");
    let file = fs::File::create(&labels_path)
        .with_context(|| format!("creating {}", labels_path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "labels chunks")?;
    for (condition, run) in &labels {
        writeln!(out, "{condition} {run}")?;
    }
    out.flush()?;

    println!(
        "Wrote {nx}x{ny}x{nz} grid, {n_scans} scans in {} runs, {} mask voxels to {}",
        args.chunks,
        mask.iter().filter(|&&m| m == 1).count(),
        args.out_dir.display()
    );
    Ok(())
}
