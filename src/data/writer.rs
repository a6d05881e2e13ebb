use std::path::Path;

use anyhow::{Context, Result};
use nifti::NiftiHeader;
use nifti::writer::WriterOptions;

use super::model::RsaMap;

/// Save the map as NIfTI-1 float32. A path ending in `.gz` is gzip compressed.
///
/// The BOLD affine goes into the sform (`sform_code = 1`, scanner space) so
/// the map overlays the anatomy it was computed on.
pub fn save_map(path: &Path, map: &RsaMap) -> Result<()> {
    let header = map_header(map);
    let data = map.values.mapv(|v| v as f32);
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(&data)
        .with_context(|| format!("writing NIfTI map {}", path.display()))?;
    log::info!("Saved RSA map to {}", path.display());
    Ok(())
}

fn map_header(map: &RsaMap) -> NiftiHeader {
    let [sx, sy, sz] = map.voxel_sizes();
    let a = &map.affine;
    let to_row = |r: usize| [a[r][0] as f32, a[r][1] as f32, a[r][2] as f32, a[r][3] as f32];

    let mut header = NiftiHeader::default();
    header.pixdim = [1.0, sx as f32, sy as f32, sz as f32, 1.0, 1.0, 1.0, 1.0];
    header.sform_code = 1;
    header.qform_code = 0;
    header.srow_x = to_row(0);
    header.srow_y = to_row(1);
    header.srow_z = to_row(2);
    header.scl_slope = 1.0;
    header.scl_inter = 0.0;
    header
}
