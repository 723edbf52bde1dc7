//! CSV observation reader with full input validation.

use std::path::{Path, PathBuf};

use cartsplit_eval::Observation;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ObservationSet;

/// Cell values treated as missing when `skip_missing` is enabled.
const MISSING_MARKERS: [&str; 2] = ["", "NA"];

/// Reads (predictor, response) observations from two columns of a CSV file.
///
/// Expected CSV format:
/// - Header row required; columns are selected by header name
/// - Any number of other columns, which are ignored
/// - All rows must have the same number of columns as the header
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | Predictor or response column not in header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Selected cell is NaN, Inf, unparseable, or missing (unless skipped) |
/// | [`IoError::EmptyDataset`] | No usable data rows |
pub struct ObservationReader {
    path: PathBuf,
    predictor: String,
    response: String,
    skip_missing: bool,
}

impl ObservationReader {
    /// Create a new reader selecting the named predictor and response columns.
    pub fn new(path: &Path, predictor: &str, response: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            predictor: predictor.to_string(),
            response: response.to_string(),
            skip_missing: false,
        }
    }

    /// Drop rows whose selected cells are empty or `NA` instead of failing.
    #[must_use]
    pub fn with_skip_missing(mut self, skip_missing: bool) -> Self {
        self.skip_missing = skip_missing;
        self
    }

    /// Read and validate the CSV file, returning an [`ObservationSet`].
    #[instrument(skip(self), fields(path = %self.path.display(), predictor = %self.predictor, response = %self.response))]
    pub fn read(&self) -> Result<ObservationSet, IoError> {
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| self.csv_error(e))?.clone();
        let expected_cols = header.len();
        let predictor_col = self.column_index(&header, &self.predictor)?;
        let response_col = self.column_index(&header, &self.response)?;
        debug!(expected_cols, predictor_col, response_col, "read CSV header");

        let mut observations = Vec::new();
        let mut n_skipped = 0usize;

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| self.csv_error(e))?;

            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let raw_predictor = record.get(predictor_col).unwrap_or("").trim();
            let raw_response = record.get(response_col).unwrap_or("").trim();

            if self.skip_missing
                && (MISSING_MARKERS.contains(&raw_predictor) || MISSING_MARKERS.contains(&raw_response))
            {
                n_skipped += 1;
                continue;
            }

            let predictor = self.parse_cell(raw_predictor, row_index, &self.predictor)?;
            let response = self.parse_cell(raw_response, row_index, &self.response)?;
            observations.push(Observation::new(predictor, response));
        }

        if observations.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_observations = observations.len(),
            n_skipped,
            "observations loaded"
        );

        Ok(ObservationSet::new(
            self.predictor.clone(),
            self.response.clone(),
            observations,
            n_skipped,
        ))
    }

    fn column_index(&self, header: &csv::StringRecord, column: &str) -> Result<usize, IoError> {
        header
            .iter()
            .position(|name| name.trim() == column)
            .ok_or_else(|| IoError::MissingColumn {
                path: self.path.clone(),
                column: column.to_string(),
                available: header.iter().map(|name| name.trim().to_string()).collect(),
            })
    }

    fn parse_cell(&self, raw: &str, row_index: usize, column: &str) -> Result<f64, IoError> {
        let non_finite = || IoError::NonFiniteValue {
            path: self.path.clone(),
            row_index,
            column: column.to_string(),
            raw: raw.to_string(),
        };
        let value: f64 = raw.parse().map_err(|_| non_finite())?;
        if !value.is_finite() {
            return Err(non_finite());
        }
        Ok(value)
    }

    fn csv_error(&self, e: csv::Error) -> IoError {
        IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        }
    }
}
