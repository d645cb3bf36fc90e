use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::pipeline::GroupingMode;

/// Rows are lettered `A` to `Z`.
pub const MAX_ROWS: usize = 26;

/// Errors raised while loading a plate map.
#[derive(Debug, thiserror::Error)]
pub enum PlateMapError {
    /// I/O error reading the plate map
    #[error("Failed to read plate map: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing error
    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    /// The file does not carry a `.csv` extension
    #[error("Plate map {0} is not a .csv file")]
    NotCsv(PathBuf),

    /// More rows than the plate has letters for
    #[error("Plate map has {0} rows, at most {MAX_ROWS} can be addressed")]
    TooManyRows(usize),

    /// Grouping by label was requested without a plate map
    #[error("{0:?} MALDI output requires a plate map")]
    Missing(GroupingMode),
}

/// Whether a plate-map cell names a sample. Blank cells read as `nan`.
pub fn is_sample_label(label: &str) -> bool {
    !label.is_empty() && !label.eq_ignore_ascii_case("nan")
}

/// Spot name of a plate-map cell: row letter followed by the 1-based column.
pub fn spot_name(row: usize, column: usize) -> String {
    // row < MAX_ROWS
    let letter = char::from(b'A' + row as u8);
    format!("{letter}{}", column + 1)
}

/// Sample labels of a MALDI target plate, keyed by spot name.
///
/// The CSV has neither a header row nor a row index: cell `(r, c)` labels
/// spot `chr('A' + r)` followed by `c + 1`, so the top-left cell is `A1`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlateMap {
    labels: BTreeMap<String, String>,
}

impl PlateMap {
    /// Load a plate map from a `.csv` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, PlateMapError> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Err(PlateMapError::NotCsv(path.to_path_buf()));
        }
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a plate map from a reader.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, PlateMapError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut labels = BTreeMap::new();
        for (row, record) in csv_reader.records().enumerate() {
            let record = record?;
            if row >= MAX_ROWS {
                return Err(PlateMapError::TooManyRows(row + 1));
            }
            for (column, value) in record.iter().enumerate() {
                labels.insert(spot_name(row, column), value.trim().to_string());
            }
        }
        Ok(Self { labels })
    }

    /// Label of a spot. Blank and `nan` cells are returned as written.
    pub fn label(&self, spot: &str) -> Option<&str> {
        self.labels.get(spot).map(String::as_str)
    }

    /// Spots per sample label, sorted by label. Blank and `nan` cells are left out.
    pub fn samples(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut samples: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (spot, label) in &self.labels {
            if is_sample_label(label) {
                samples.entry(label.as_str()).or_default().push(spot.as_str());
            }
        }
        samples
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the plate map has no cells.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
