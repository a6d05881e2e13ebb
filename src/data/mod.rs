/// Data layer: dataset types, loading, scan selection and map output.
///
/// Architecture:
/// ```text
///  bold.nii.gz   mask.nii.gz   labels.txt / .csv / .json / .parquet
///        │             │              │
///        ▼             ▼              ▼
///   ┌──────────────────────────────────────┐
///   │  loader   parse files → Dataset      │
///   └──────────────────────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset │  Array4 bold, Array3 mask, affine, LabelTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  drop excluded conditions → ScanSelection
///   └──────────┘
///        ⋮  (analysis)
///        ▼
///   ┌──────────┐
///   │  writer  │  RsaMap → .nii / .nii.gz
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod writer;
