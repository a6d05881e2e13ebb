use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float64Type, Int32Type, Int64Type};
use ndarray::{Array3, Array4, ArrayD, Axis, Ix3, Ix4};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Affine, Dataset, LabelTable, ScanLabel};
use crate::config::InputConfig;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Names of the label-table columns holding the condition and the run id.
#[derive(Debug, Clone)]
pub struct LabelColumns {
    pub condition: String,
    pub chunk: String,
}

impl Default for LabelColumns {
    fn default() -> Self {
        Self {
            condition: "labels".to_string(),
            chunk: "chunks".to_string(),
        }
    }
}

/// Load BOLD series, mask and labels and check them against each other.
pub fn load_dataset(input: &InputConfig) -> Result<Dataset> {
    let (bold, affine) = load_volume(&input.bold)?;
    log::info!(
        "Loaded BOLD {} with shape {:?}",
        input.bold.display(),
        bold.dim()
    );

    let mask = load_mask(&input.mask)?;
    log::info!("Loaded mask {} with shape {:?}", input.mask.display(), mask.dim());

    let columns = LabelColumns {
        condition: input.label_column.clone(),
        chunk: input.chunk_column.clone(),
    };
    let labels = load_labels(&input.labels, &columns)?;
    log::info!(
        "Loaded {} labels: conditions {:?}, {} chunks",
        labels.len(),
        labels.conditions,
        labels.chunks.len()
    );

    let dataset = Dataset::new(bold, mask, affine, labels)?;
    log::info!(
        "Dataset: grid {:?}, {} scans, {} ROI voxels",
        dataset.shape(),
        dataset.n_scans(),
        dataset.roi_voxels()
    );
    Ok(dataset)
}

/// Load a 4-D BOLD series (a 3-D file counts as one scan) and its affine.
pub fn load_volume(path: &Path) -> Result<(Array4<f64>, Affine)> {
    let (header, data) = read_nifti(path)?;
    let affine = header_affine(&header);

    let volume = match data.ndim() {
        3 => data
            .into_dimensionality::<Ix3>()
            .context("reshaping 3-D volume")?
            .insert_axis(Axis(3)),
        4 => data
            .into_dimensionality::<Ix4>()
            .context("reshaping 4-D volume")?,
        n => bail!(
            "{}: expected a 3-D or 4-D volume, got {n}-D",
            path.display()
        ),
    };

    // Standard layout keeps every voxel's time series contiguous.
    Ok((volume.as_standard_layout().into_owned(), affine))
}

/// Load a binary ROI mask. Non-zero finite values are inside the ROI.
pub fn load_mask(path: &Path) -> Result<Array3<bool>> {
    let (_, data) = read_nifti(path)?;
    let shape = data.shape().to_vec();

    let values = match shape.as_slice() {
        [_, _, _] => data.into_dimensionality::<Ix3>().context("reshaping mask")?,
        [_, _, _, 1] => data
            .into_dimensionality::<Ix4>()
            .context("reshaping mask")?
            .index_axis_move(Axis(3), 0),
        other => bail!(
            "{}: expected a 3-D mask, got shape {other:?}",
            path.display()
        ),
    };

    Ok(values.mapv(|v| v.is_finite() && v != 0.0))
}

/// Load the per-scan label table.  Dispatch by extension.
///
/// Supported formats:
/// * `.txt`     – single-space separated with a header row
/// * `.tsv`     – tab separated with a header row
/// * `.csv`     – comma separated with a header row
/// * `.json`    – `[{ "labels": "face", "chunks": 0 }, ...]`
/// * `.parquet` – string condition column and integer chunk column
pub fn load_labels(path: &Path, columns: &LabelColumns) -> Result<LabelTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "txt" => load_delimited(path, b' ', columns),
        "tsv" => load_delimited(path, b'\t', columns),
        "csv" => load_delimited(path, b',', columns),
        "json" => load_json(path, columns),
        "parquet" | "pq" => load_parquet(path, columns),
        other => bail!("Unsupported label file extension: .{other}"),
    }
    .with_context(|| format!("loading labels from {}", path.display()))?;

    let table = LabelTable::from_rows(rows);
    if table.is_empty() {
        bail!("{}: label table has no rows", path.display());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// NIfTI helpers
// ---------------------------------------------------------------------------

fn read_nifti(path: &Path) -> Result<(NiftiHeader, ArrayD<f64>)> {
    let obj = ReaderOptions::new()
        .read_file(path)
        .with_context(|| format!("reading NIfTI file {}", path.display()))?;
    let header = obj.header().clone();
    let data = obj
        .into_volume()
        .into_ndarray::<f64>()
        .with_context(|| format!("decoding voxel data of {}", path.display()))?;
    Ok((header, data))
}

/// Voxel → world transform: sform when set, then qform, then a `pixdim` diagonal.
pub fn header_affine(header: &NiftiHeader) -> Affine {
    if header.sform_code > 0 {
        let rows = [header.srow_x, header.srow_y, header.srow_z];
        let mut affine = crate::data::model::IDENTITY_AFFINE;
        for (dst, src) in affine.iter_mut().zip(rows.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d = *s as f64;
            }
        }
        return affine;
    }

    let (dx, dy, dz) = (
        header.pixdim[1] as f64,
        header.pixdim[2] as f64,
        header.pixdim[3] as f64,
    );
    let sizes = [
        if dx > 0.0 { dx } else { 1.0 },
        if dy > 0.0 { dy } else { 1.0 },
        if dz > 0.0 { dz } else { 1.0 },
    ];

    if header.qform_code > 0 {
        let (b, c, d) = (
            header.quatern_b as f64,
            header.quatern_c as f64,
            header.quatern_d as f64,
        );
        let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        let r = [
            [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
            [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
            [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - c * c - b * b],
        ];
        let scale = [sizes[0], sizes[1], sizes[2] * qfac];
        let offset = [
            header.quatern_x as f64,
            header.quatern_y as f64,
            header.quatern_z as f64,
        ];
        let mut affine = crate::data::model::IDENTITY_AFFINE;
        for row in 0..3 {
            for col in 0..3 {
                affine[row][col] = r[row][col] * scale[col];
            }
            affine[row][3] = offset[row];
        }
        return affine;
    }

    let mut affine = crate::data::model::IDENTITY_AFFINE;
    for axis in 0..3 {
        affine[axis][axis] = sizes[axis];
    }
    affine
}

// ---------------------------------------------------------------------------
// Delimited text loader
// ---------------------------------------------------------------------------

/// Header row with column names, one row per scan:
///
/// ```text
/// labels chunks
/// rest 0
/// face 0
/// ```
fn load_delimited(path: &Path, delimiter: u8, columns: &LabelColumns) -> Result<Vec<ScanLabel>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening label table")?;

    let headers: Vec<String> = reader
        .headers()
        .context("reading label table header")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let cond_idx = column_index(&headers, &columns.condition)?;
    let chunk_idx = column_index(&headers, &columns.chunk)?;

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("label row {row_no}"))?;

        let condition = record
            .get(cond_idx)
            .with_context(|| format!("Row {row_no}: missing '{}'", columns.condition))?
            .to_string();
        let chunk_cell = record
            .get(chunk_idx)
            .with_context(|| format!("Row {row_no}: missing '{}'", columns.chunk))?;
        let chunk = parse_chunk(chunk_cell)
            .with_context(|| format!("Row {row_no}: '{chunk_cell}' is not an integer chunk id"))?;

        rows.push(ScanLabel { condition, chunk });
    }
    Ok(rows)
}

fn column_index(headers: &[String], name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("label table missing '{name}' column (found {headers:?})"))
}

/// Integer chunk id; integral floats such as `3.0` are accepted.
fn parse_chunk(s: &str) -> Option<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let f = s.parse::<f64>().ok()?;
    float_to_chunk(f)
}

fn float_to_chunk(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0).then_some(f as i64)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path, columns: &LabelColumns) -> Result<Vec<ScanLabel>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| -> Result<ScanLabel> {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;

            let condition = match obj.get(&columns.condition) {
                Some(JsonValue::String(s)) => s.clone(),
                Some(JsonValue::Number(n)) => n.to_string(),
                _ => bail!("Row {i}: missing or invalid '{}'", columns.condition),
            };

            let chunk = obj
                .get(&columns.chunk)
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().and_then(float_to_chunk)))
                .with_context(|| format!("Row {i}: missing or invalid '{}'", columns.chunk))?;

            Ok(ScanLabel { condition, chunk })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path, columns: &LabelColumns) -> Result<Vec<ScanLabel>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let cond_idx = schema
            .index_of(&columns.condition)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{}' column", columns.condition))?;
        let chunk_idx = schema
            .index_of(&columns.chunk)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{}' column", columns.chunk))?;

        let cond_col = batch.column(cond_idx);
        let chunk_col = batch.column(chunk_idx);

        for row in 0..batch.num_rows() {
            let condition = extract_string(cond_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", columns.condition))?;
            let chunk = extract_chunk(chunk_col, row)
                .with_context(|| format!("Row {row}: failed to read '{}'", columns.chunk))?;
            rows.push(ScanLabel { condition, chunk });
        }
    }

    Ok(rows)
}

fn extract_string(col: &ArrayRef, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null condition");
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected a string column, got {other:?}"),
    }
}

fn extract_chunk(col: &ArrayRef, row: usize) -> Result<i64> {
    if col.is_null(row) {
        bail!("null chunk id");
    }
    match col.data_type() {
        DataType::Int32 => Ok(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => Ok(col.as_primitive::<Int64Type>().value(row)),
        DataType::Float64 => {
            let v = col.as_primitive::<Float64Type>().value(row);
            float_to_chunk(v).with_context(|| format!("{v} is not an integer chunk id"))
        }
        other => bail!("Expected an integer column, got {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use nifti::writer::WriterOptions;
    use parquet::arrow::ArrowWriter;

    use super::*;
    use crate::error::RsaError;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn nifti_path(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        dir.path().join(name)
    }

    fn labels_txt(dir: &tempfile::TempDir, n: usize) -> std::path::PathBuf {
        let mut contents = String::from("labels chunks\n");
        for i in 0..n {
            contents.push_str(&format!("{} {}\n", if i % 2 == 0 { "face" } else { "house" }, i / 2));
        }
        write_file(dir, "labels.txt", &contents)
    }

    #[test]
    fn loads_space_separated_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "labels.txt",
            "labels chunks\nrest 0\nface 0\nhouse 1\nscrambledpix 1\n",
        );
        let table = load_labels(&path, &LabelColumns::default()).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.rows[1].condition, "face");
        assert_eq!(table.rows[2].chunk, 1);
        assert_eq!(table.chunks.len(), 2);
    }

    #[test]
    fn loads_csv_with_custom_columns_and_float_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "labels.csv", "run,category\n0.0,cat\n2,shoe\n");
        let columns = LabelColumns {
            condition: "category".to_string(),
            chunk: "run".to_string(),
        };
        let table = load_labels(&path, &columns).unwrap();
        assert_eq!(
            table.rows,
            vec![
                ScanLabel { condition: "cat".to_string(), chunk: 0 },
                ScanLabel { condition: "shoe".to_string(), chunk: 2 },
            ]
        );
    }

    #[test]
    fn loads_json_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "labels.json",
            r#"[{"labels": "face", "chunks": 0}, {"labels": "bottle", "chunks": 1}]"#,
        );
        let table = load_labels(&path, &LabelColumns::default()).unwrap();
        assert_eq!(table.rows[1].condition, "bottle");
        assert_eq!(table.rows[1].chunk, 1);
    }

    #[test]
    fn loads_parquet_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("labels", DataType::Utf8, false),
            Field::new("chunks", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["face", "chair", "face"])),
                Arc::new(Int64Array::from(vec![0, 0, 1])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_labels(&path, &LabelColumns::default()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[1].condition, "chair");
        assert_eq!(table.rows[2].chunk, 1);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "labels.txt", "labels run\nface 0\n");
        let err = load_labels(&path, &LabelColumns::default()).unwrap_err();
        assert!(format!("{err:#}").contains("missing 'chunks' column"));
    }

    #[test]
    fn non_integer_chunk_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "labels.txt", "labels chunks\nface 0.5\n");
        let err = load_labels(&path, &LabelColumns::default()).unwrap_err();
        assert!(format!("{err:#}").contains("not an integer chunk id"));
    }

    #[test]
    fn unsupported_extension_and_missing_file_fail() {
        let err = load_labels(Path::new("labels.xlsx"), &LabelColumns::default()).unwrap_err();
        assert!(err.to_string().contains("Unsupported label file extension"));

        let err = load_volume(Path::new("/nonexistent/bold.nii.gz")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/bold.nii.gz"));
    }

    #[test]
    fn affine_falls_back_to_pixdim() {
        let mut header = NiftiHeader::default();
        header.sform_code = 0;
        header.qform_code = 0;
        header.pixdim = [1.0, 3.5, 3.75, 3.75, 2.5, 0.0, 0.0, 0.0];
        let affine = header_affine(&header);
        assert_eq!(affine[0][0], 3.5);
        assert_eq!(affine[1][1], 3.75);
        assert_eq!(affine[2][2], 3.75);
        assert_eq!(affine[3][3], 1.0);
    }

    #[test]
    fn affine_prefers_sform() {
        let mut header = NiftiHeader::default();
        header.sform_code = 1;
        header.srow_x = [-3.5, 0.0, 0.0, 70.0];
        header.srow_y = [0.0, 3.75, 0.0, -100.0];
        header.srow_z = [0.0, 0.0, 3.75, -50.0];
        let affine = header_affine(&header);
        assert_eq!(affine[0], [-3.5, 0.0, 0.0, 70.0]);
        assert_eq!(affine[2][3], -50.0);
    }

    #[test]
    fn affine_from_qform_applies_qfac() {
        let mut header = NiftiHeader::default();
        header.sform_code = 0;
        header.qform_code = 1;
        header.quatern_b = 0.0;
        header.quatern_c = 0.0;
        header.quatern_d = 0.0;
        header.quatern_x = 10.0;
        header.quatern_y = -20.0;
        header.quatern_z = 30.0;
        header.pixdim = [-1.0, 2.0, 3.0, 4.0, 2.5, 0.0, 0.0, 0.0];
        let affine = header_affine(&header);
        assert_eq!(affine[0], [2.0, 0.0, 0.0, 10.0]);
        assert_eq!(affine[1], [0.0, 3.0, 0.0, -20.0]);
        assert_eq!(affine[2], [0.0, 0.0, -4.0, 30.0]);
        assert_eq!(affine[3], [0.0, 0.0, 0.0, 1.0]);

        header.pixdim[0] = 1.0;
        assert_eq!(header_affine(&header)[2][2], 4.0);
    }

    #[test]
    fn affine_from_rotated_qform() {
        // 90 degrees about z: b = c = 0, d = sin(45°), a = cos(45°).
        let mut header = NiftiHeader::default();
        header.sform_code = 0;
        header.qform_code = 1;
        header.quatern_d = std::f32::consts::FRAC_1_SQRT_2;
        header.pixdim = [1.0, 2.0, 3.0, 4.0, 0.0, 0.0, 0.0, 0.0];
        let affine = header_affine(&header);
        approx::assert_abs_diff_eq!(affine[0][0], 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(affine[0][1], -3.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(affine[1][0], 2.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(affine[1][1], 0.0, epsilon = 1e-6);
        approx::assert_abs_diff_eq!(affine[2][2], 4.0, epsilon = 1e-6);
    }

    #[test]
    fn four_d_mask_with_single_volume_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let values: Vec<u8> = (0..18).map(|i| (i % 3) as u8).collect();
        let data = ndarray::Array4::from_shape_vec((3, 3, 2, 1), values).unwrap();
        let path = nifti_path(&dir, "mask.nii");
        WriterOptions::new(&path).write_nifti(&data).unwrap();

        let mask = load_mask(&path).unwrap();
        assert_eq!(mask.dim(), (3, 3, 2));
        // Values 1 and 2 both count as inside.
        assert_eq!(mask.iter().filter(|&&m| m).count(), 12);
        assert!(!mask[[0, 0, 0]]);
        assert!(mask[[0, 0, 1]]);
        assert!(mask[[0, 1, 0]]);
    }

    #[test]
    fn mask_with_several_volumes_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = ndarray::Array4::<u8>::ones((2, 2, 2, 3));
        let path = nifti_path(&dir, "mask.nii");
        WriterOptions::new(&path).write_nifti(&data).unwrap();
        let err = load_mask(&path).unwrap_err();
        assert!(format!("{err:#}").contains("expected a 3-D mask"));
    }

    #[test]
    fn dataset_loads_from_matching_files() {
        let dir = tempfile::tempdir().unwrap();
        let bold = ndarray::Array4::<f32>::from_shape_fn((3, 3, 2, 4), |(x, y, z, t)| {
            (x + 2 * y + 3 * z + t) as f32
        });
        let mask = ndarray::Array3::<u8>::from_shape_fn((3, 3, 2), |(x, _, _)| (x > 0) as u8);
        let input = InputConfig {
            bold: nifti_path(&dir, "bold.nii.gz"),
            mask: nifti_path(&dir, "mask.nii.gz"),
            labels: labels_txt(&dir, 4),
            ..InputConfig::default()
        };
        WriterOptions::new(&input.bold).write_nifti(&bold).unwrap();
        WriterOptions::new(&input.mask).write_nifti(&mask).unwrap();

        let dataset = load_dataset(&input).unwrap();
        assert_eq!(dataset.shape(), [3, 3, 2]);
        assert_eq!(dataset.n_scans(), 4);
        assert_eq!(dataset.roi_voxels(), 12);
        assert_eq!(dataset.bold()[[1, 2, 1, 3]], 1.0 + 4.0 + 3.0 + 3.0);
    }

    #[test]
    fn dataset_rejects_mask_on_another_grid() {
        let dir = tempfile::tempdir().unwrap();
        let bold = ndarray::Array4::<f32>::zeros((3, 3, 2, 4));
        let mask = ndarray::Array3::<u8>::ones((3, 3, 3));
        let input = InputConfig {
            bold: nifti_path(&dir, "bold.nii"),
            mask: nifti_path(&dir, "mask.nii"),
            labels: labels_txt(&dir, 4),
            ..InputConfig::default()
        };
        WriterOptions::new(&input.bold).write_nifti(&bold).unwrap();
        WriterOptions::new(&input.mask).write_nifti(&mask).unwrap();

        let err = load_dataset(&input).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RsaError>(),
            Some(&RsaError::ShapeMismatch {
                what: "mask",
                expected: [3, 3, 2],
                found: [3, 3, 3],
            })
        );
    }

    #[test]
    fn dataset_rejects_label_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let bold = ndarray::Array4::<f32>::zeros((3, 3, 2, 4));
        let mask = ndarray::Array3::<u8>::ones((3, 3, 2));
        let input = InputConfig {
            bold: nifti_path(&dir, "bold.nii"),
            mask: nifti_path(&dir, "mask.nii"),
            labels: labels_txt(&dir, 3),
            ..InputConfig::default()
        };
        WriterOptions::new(&input.bold).write_nifti(&bold).unwrap();
        WriterOptions::new(&input.mask).write_nifti(&mask).unwrap();

        let err = load_dataset(&input).unwrap_err();
        assert_eq!(
            err.downcast_ref::<RsaError>(),
            Some(&RsaError::ScanCountMismatch { scans: 4, rows: 3 })
        );
    }
}
