//! Sensor CSV reader with schema and type validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{FEATURE_COLUMNS, LABEL_COLUMN, SensorDataset, SensorRecord};

/// Reads relay sensor data from a CSV file.
///
/// Expected CSV format:
/// - Header row required, naming every column in [`FEATURE_COLUMNS`] plus
///   [`LABEL_COLUMN`]; column order is free and extra columns are ignored
/// - One row per observation
///
/// Cells are trimmed before parsing.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | A required header name is absent |
/// | [`IoError::InvalidValue`] | Sensor cell is NaN, Inf, or unparseable |
/// | [`IoError::EmptyLabel`] | Relay status cell is blank |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct SensorReader {
    path: PathBuf,
}

/// Positions of the required columns within a header row.
#[derive(Debug)]
struct ColumnMap {
    features: [usize; 5],
    label: usize,
}

impl SensorReader {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file, returning a [`SensorDataset`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<SensorDataset, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // Short rows are reported per cell rather than as a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?;
        let columns = self.resolve_columns(header)?;
        debug!(?columns, n_header_cols = header.len(), "resolved CSV header");

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| self.csv_error(e))?;
            records.push(self.parse_row(&row, row_index, &columns)?);
        }

        if records.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_rows = records.len(), "sensor dataset loaded");
        Ok(SensorDataset::new(records))
    }

    fn resolve_columns(&self, header: &csv::StringRecord) -> Result<ColumnMap, IoError> {
        let find = |column: &'static str| {
            header
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column,
                })
        };
        let mut features = [0usize; 5];
        for (slot, column) in features.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = find(column)?;
        }
        Ok(ColumnMap {
            features,
            label: find(LABEL_COLUMN)?,
        })
    }

    fn parse_row(
        &self,
        row: &csv::StringRecord,
        row_index: usize,
        columns: &ColumnMap,
    ) -> Result<SensorRecord, IoError> {
        let mut values = [0.0f64; 5];
        for ((value, &idx), column) in values.iter_mut().zip(&columns.features).zip(FEATURE_COLUMNS)
        {
            let raw = row.get(idx).unwrap_or("").trim();
            *value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| IoError::InvalidValue {
                    path: self.path.clone(),
                    row_index,
                    column,
                    raw: raw.to_string(),
                })?;
        }

        let relay_status = row.get(columns.label).unwrap_or("").trim();
        if relay_status.is_empty() {
            return Err(IoError::EmptyLabel {
                path: self.path.clone(),
                row_index,
            });
        }

        let [temperature_c, flow_rate_lmin, accel_x, accel_y, accel_z] = values;
        Ok(SensorRecord {
            temperature_c,
            flow_rate_lmin,
            accel_x,
            accel_y,
            accel_z,
            relay_status: relay_status.to_string(),
        })
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
