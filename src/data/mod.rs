//! Score table loading.
//!
//! The input is a comma-delimited file whose first column labels each row and
//! whose remaining columns hold scores, normally ratios in [0,1]. Loading
//! appends one `Average` row holding the column means.

use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::logging::{log, obj, ts_now, v_num, v_str, Domain, Level};

pub const AVERAGE_LABEL: &str = "Average";

/// Cell texts read as an empty score rather than a parse failure.
const MISSING_MARKERS: [&str; 5] = ["NA", "N/A", "NaN", "nan", "null"];

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub label: String,
    pub values: Vec<Option<f64>>,
}

impl Row {
    pub fn new(label: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            label: label.into(),
            values,
        }
    }
}

/// A label column followed by score columns.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    label_header: String,
    columns: Vec<String>,
    rows: Vec<Row>,
    averaged: bool,
}

impl Table {
    pub fn new(label_header: impl Into<String>, columns: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        if columns.is_empty() {
            bail!("table needs at least one score column");
        }
        for row in &rows {
            if row.values.len() != columns.len() {
                bail!(
                    "row {:?} has {} values, expected {}",
                    row.label,
                    row.values.len(),
                    columns.len()
                );
            }
        }
        Ok(Self {
            label_header: label_header.into(),
            columns,
            rows,
            averaged: false,
        })
    }

    pub fn label_header(&self) -> &str {
        &self.label_header
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Rows read from the input, without the summary row.
    pub fn data_rows(&self) -> &[Row] {
        if self.averaged {
            &self.rows[..self.rows.len() - 1]
        } else {
            &self.rows
        }
    }

    pub fn average_row(&self) -> Option<&Row> {
        if self.averaged {
            self.rows.last()
        } else {
            None
        }
    }

    /// Appends the `Average` row. Calling it on a table that already has one
    /// leaves the table untouched.
    pub fn with_average(mut self) -> Self {
        if self.averaged {
            return self;
        }
        let means = (0..self.columns.len())
            .map(|col| column_mean(&self.rows, col))
            .collect();
        self.rows.push(Row::new(AVERAGE_LABEL, means));
        self.averaged = true;
        self
    }

    /// Swaps orientation: score column headers become row labels and row
    /// labels become column headers. The new label column is named
    /// `label_header`.
    pub fn transposed(&self, label_header: &str) -> Table {
        let columns = self.rows.iter().map(|r| r.label.clone()).collect();
        let rows = self
            .columns
            .iter()
            .enumerate()
            .map(|(col, name)| Row::new(name.clone(), self.rows.iter().map(|r| r.values[col]).collect()))
            .collect();
        Table {
            label_header: label_header.to_string(),
            columns,
            rows,
            averaged: false,
        }
    }

    /// Finite scores outside [0,1] as `(row label, column, value)`.
    pub fn out_of_range(&self) -> Vec<(String, String, f64)> {
        let mut out = Vec::new();
        for row in self.data_rows() {
            for (name, value) in self.columns.iter().zip(&row.values) {
                if let Some(v) = value {
                    if v.is_finite() && !(0.0..=1.0).contains(v) {
                        out.push((row.label.clone(), name.clone(), *v));
                    }
                }
            }
        }
        out
    }

    pub fn missing_cells(&self) -> usize {
        self.data_rows()
            .iter()
            .map(|r| r.values.iter().filter(|v| v.is_none()).count())
            .sum()
    }
}

fn column_mean(rows: &[Row], col: usize) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in rows.iter().filter_map(|r| r.values[col]) {
        if v.is_nan() {
            continue;
        }
        sum += v;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn parse_score(raw: &str) -> Result<Option<f64>> {
    if raw.is_empty() || MISSING_MARKERS.contains(&raw) {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| anyhow!("non-numeric value {:?}", raw))
}

/// Parses CSV text into a table without the summary row.
pub fn parse_table<R: Read>(reader: R) -> Result<Table> {
    let mut csv = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

    let headers = csv.headers().context("failed to read header row")?.clone();
    if headers.len() < 2 {
        bail!(
            "expected a label column and at least one score column, got {} column(s)",
            headers.len()
        );
    }
    let mut seen = HashSet::new();
    for name in headers.iter() {
        if name.is_empty() {
            bail!("header row contains an empty column name");
        }
        if !seen.insert(name) {
            bail!("duplicate column name {:?}", name);
        }
    }
    let label_header = headers[0].to_string();
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut rows = Vec::new();
    for result in csv.records() {
        let record = result.context("malformed record")?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let label = record.get(0).unwrap_or_default().to_string();
        let values = record
            .iter()
            .skip(1)
            .zip(&columns)
            .map(|(raw, column)| {
                parse_score(raw).with_context(|| format!("line {}, column {:?}", line, column))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(Row::new(label, values));
    }
    if rows.is_empty() {
        bail!("no data rows");
    }

    Table::new(label_header, columns, rows)
}

/// Loads the score file and appends the `Average` row.
pub fn load_table(path: &Path) -> Result<Table> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let table = parse_table(file)
        .with_context(|| format!("failed to parse {}", path.display()))?
        .with_average();

    for (row, column, value) in table.out_of_range() {
        log(
            Level::Warn,
            Domain::Data,
            "score_out_of_range",
            obj(&[
                ("row", v_str(&row)),
                ("column", v_str(&column)),
                ("value", v_num(value)),
            ]),
        );
    }
    log(
        Level::Info,
        Domain::Data,
        "table_loaded",
        obj(&[
            ("path", v_str(&path.display().to_string())),
            ("rows", json!(table.data_rows().len())),
            ("columns", json!(table.columns().len())),
            ("missing_cells", json!(table.missing_cells())),
        ]),
    );
    Ok(table)
}

// =============================================================================
// Manifest
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub path: String,
    pub hash_sha256: String,
    pub row_count: usize,
    pub column_count: usize,
    pub label_column: String,
    pub columns: Vec<String>,
    pub missing_cells: usize,
    pub out_of_range: usize,
    pub warnings: Vec<String>,
    pub generated_at: String,
}

impl DatasetManifest {
    pub fn build(path: &Path, table: &Table) -> Result<Self> {
        let out_of_range = table.out_of_range();
        let warnings = out_of_range
            .iter()
            .map(|(row, column, value)| format!("out_of_range: {} / {} = {}", row, column, value))
            .collect();
        Ok(Self {
            path: path.display().to_string(),
            hash_sha256: file_sha256(path)?,
            row_count: table.data_rows().len(),
            column_count: table.columns().len(),
            label_column: table.label_header().to_string(),
            columns: table.columns().to_vec(),
            missing_cells: table.missing_cells(),
            out_of_range: out_of_range.len(),
            warnings,
            generated_at: ts_now(),
        })
    }
}

pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

pub fn default_manifest_path(dataset_path: &Path) -> PathBuf {
    let mut p = dataset_path.to_path_buf();
    let fname = dataset_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("data.csv");
    p.set_file_name(format!("{}.manifest.json", fname));
    p
}
