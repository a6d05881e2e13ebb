use thiserror::Error;

/// Precondition failures detected by the analysis pipeline.
///
/// I/O and parse problems are reported through `anyhow` with file context;
/// these variants name which structural precondition of the data failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RsaError {
    #[error("{what}: expected spatial shape {expected:?}, found {found:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: [usize; 3],
        found: [usize; 3],
    },

    #[error("BOLD volume has {scans} scans but the label table has {rows} rows")]
    ScanCountMismatch { scans: usize, rows: usize },

    #[error("scan {scan} belongs to chunk {chunk}, outside the expected range 0..{expected}")]
    ChunkOutOfRange {
        scan: usize,
        chunk: i64,
        expected: usize,
    },

    #[error("scan {scan} is not covered by exactly one chunk")]
    UncoveredScan { scan: usize },

    #[error("no scans left after excluding conditions {excluded:?}")]
    EmptySelection { excluded: Vec<String> },

    #[error("model RDM needs at least two distinct conditions, found {found:?}")]
    DegenerateModel { found: Vec<String> },

    #[error("model RDM indexes {model} scans but searchlight samples cover {samples}")]
    Misaligned { model: usize, samples: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
