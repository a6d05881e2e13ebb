use ndarray::{Array4, Axis};

use crate::data::model::LabelTable;
use crate::error::RsaError;

/// The scans of one experimental run, in acquisition order.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: i64,
    /// Positions of this run's scans on the full scan axis.
    pub scans: Vec<usize>,
    /// `(x, y, z, scan)` data restricted to `scans`.
    pub data: Array4<f64>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.scans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.is_empty()
    }
}

/// Runs of a volume, extracted one at a time.
///
/// Label checks happen in [`partition`]; each chunk's data is copied out of
/// the volume only when the iterator reaches it.
pub struct Partition<'a> {
    bold: &'a Array4<f64>,
    groups: std::vec::IntoIter<(i64, Vec<usize>)>,
}

impl Iterator for Partition<'_> {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        let (id, scans) = self.groups.next()?;
        let (nx, ny, nz, _) = self.bold.dim();
        let data = if scans.is_empty() {
            log::warn!("Chunk {id} has no scans");
            Array4::zeros((nx, ny, nz, 0))
        } else {
            self.bold.select(Axis(3), &scans)
        };
        Some(Chunk { id, scans, data })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.groups.size_hint()
    }
}

impl ExactSizeIterator for Partition<'_> {}

/// Split the scan axis of `bold` into runs.
///
/// With `expected = Some(n)` the runs are `0..n` and every label must fall in
/// that range; with `None` the distinct ids present in `labels` are used.
/// A run without scans yields an empty chunk.
pub fn partition<'a>(
    bold: &'a Array4<f64>,
    labels: &LabelTable,
    expected: Option<usize>,
) -> Result<Partition<'a>, RsaError> {
    let nt = bold.dim().3;
    if nt != labels.len() {
        return Err(RsaError::ScanCountMismatch {
            scans: nt,
            rows: labels.len(),
        });
    }

    let ids: Vec<i64> = match expected {
        Some(n) => {
            let out_of_range = labels
                .rows
                .iter()
                .enumerate()
                .find(|(_, row)| row.chunk < 0 || row.chunk as usize >= n);
            if let Some((scan, row)) = out_of_range {
                return Err(RsaError::ChunkOutOfRange {
                    scan,
                    chunk: row.chunk,
                    expected: n,
                });
            }
            (0..n as i64).collect()
        }
        None => labels.chunks.iter().copied().collect(),
    };

    let groups: Vec<(i64, Vec<usize>)> = ids
        .into_iter()
        .map(|id| {
            let scans = labels
                .rows
                .iter()
                .enumerate()
                .filter(|(_, row)| row.chunk == id)
                .map(|(i, _)| i)
                .collect();
            (id, scans)
        })
        .collect();

    log::info!(
        "Partitioned {nt} scans into {} chunks ({:?} scans each)",
        groups.len(),
        groups.iter().map(|(_, s)| s.len()).collect::<Vec<_>>()
    );
    Ok(Partition {
        bold,
        groups: groups.into_iter(),
    })
}

/// Put chunk data back at the chunks' scan positions.
///
/// Chunks are consumed one by one, so a lazy source keeps only one chunk
/// alive next to the output. Every scan in `0..dim.3` must be covered by
/// exactly one chunk.
pub fn reassemble<I>(chunks: I, dim: (usize, usize, usize, usize)) -> Result<Array4<f64>, RsaError>
where
    I: IntoIterator<Item = Chunk>,
{
    let mut out = Array4::zeros(dim);
    let mut covered = vec![false; dim.3];

    for chunk in chunks {
        for (k, &scan) in chunk.scans.iter().enumerate() {
            if scan >= dim.3 || covered[scan] {
                return Err(RsaError::UncoveredScan { scan });
            }
            covered[scan] = true;
            out.index_axis_mut(Axis(3), scan)
                .assign(&chunk.data.index_axis(Axis(3), k));
        }
    }

    if let Some(scan) = covered.iter().position(|c| !c) {
        return Err(RsaError::UncoveredScan { scan });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ScanLabel;

    fn labels(chunks: &[i64]) -> LabelTable {
        LabelTable::from_rows(
            chunks
                .iter()
                .map(|&chunk| ScanLabel {
                    condition: "face".to_string(),
                    chunk,
                })
                .collect(),
        )
    }

    fn bold(nt: usize) -> Array4<f64> {
        Array4::from_shape_fn((2, 1, 1, nt), |(x, _, _, t)| (x * 100 + t) as f64)
    }

    #[test]
    fn scans_are_grouped_in_acquisition_order() {
        let chunks: Vec<Chunk> = partition(&bold(5), &labels(&[1, 0, 1, 0, 1]), Some(2))
            .unwrap()
            .collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].id, 0);
        assert_eq!(chunks[0].scans, vec![1, 3]);
        assert_eq!(chunks[1].scans, vec![0, 2, 4]);
        assert_eq!(chunks[1].data[[1, 0, 0, 2]], 104.0);
    }

    #[test]
    fn missing_run_gives_empty_chunk() {
        let chunks: Vec<Chunk> = partition(&bold(3), &labels(&[0, 0, 2]), Some(3))
            .unwrap()
            .collect();
        assert!(chunks[1].is_empty());
        assert_eq!(chunks[1].data.dim(), (2, 1, 1, 0));
    }

    #[test]
    fn distinct_ids_used_without_expected_count() {
        let chunks: Vec<Chunk> = partition(&bold(3), &labels(&[7, 3, 7]), None)
            .unwrap()
            .collect();
        let ids: Vec<i64> = chunks.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![3, 7]);
    }

    #[test]
    fn out_of_range_chunk_is_rejected() {
        let err = partition(&bold(3), &labels(&[0, 1, 12]), Some(12))
            .err()
            .unwrap();
        assert_eq!(
            err,
            RsaError::ChunkOutOfRange {
                scan: 2,
                chunk: 12,
                expected: 12
            }
        );
    }

    #[test]
    fn reassemble_restores_scan_order() {
        let volume = bold(5);
        let chunks = partition(&volume, &labels(&[1, 0, 1, 0, 1]), Some(2)).unwrap();
        assert_eq!(chunks.len(), 2);
        let back = reassemble(chunks, volume.dim()).unwrap();
        assert_eq!(back, volume);
    }

    #[test]
    fn reassemble_detects_gaps() {
        let volume = bold(3);
        let mut chunks: Vec<Chunk> = partition(&volume, &labels(&[0, 0, 1]), Some(2))
            .unwrap()
            .collect();
        chunks.pop();
        let err = reassemble(chunks, volume.dim()).unwrap_err();
        assert_eq!(err, RsaError::UncoveredScan { scan: 2 });
    }
}
