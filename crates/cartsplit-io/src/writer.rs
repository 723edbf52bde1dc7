//! JSON and CSV writers for split search results.

use std::fs;
use std::path::{Path, PathBuf};

use cartsplit_eval::{
    CandidateScore, SignificanceTest, SplitCriterion, SplitOutcome, SplitScan, TestMethod,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{ExperimentName, ObservationSet};

/// Writes split search results to an output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_split.json` and
/// `{experiment}_curve.csv`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Write the best split and every candidate score to
    /// `{experiment}_split.json`.
    ///
    /// `test` is recorded only for the significance criterion; pass `None`
    /// when scoring with a caller-supplied test.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Serialize`] | The artifact cannot be encoded as JSON |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all)]
    pub fn write_scan<T>(
        &self,
        data: &ObservationSet,
        scan: &SplitScan<'_, T>,
        outcome: &SplitOutcome,
        test: Option<TestMethod>,
    ) -> Result<PathBuf, IoError>
    where
        T: SignificanceTest + ?Sized,
    {
        let path = self
            .output_dir
            .join(format!("{}_split.json", self.experiment.as_str()));

        let artifact = SplitArtifact {
            experiment: self.experiment.as_str(),
            predictor: data.predictor_name(),
            response: data.response_name(),
            criterion: scan.criterion(),
            test: test.filter(|_| scan.criterion() == SplitCriterion::SignificanceTest),
            min_group_size: scan.min_group_size(),
            n_observations: scan.n_observations(),
            n_skipped: data.n_skipped(),
            best: outcome,
            candidates: scan.candidates().collect(),
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "split result written");
        Ok(path)
    }

    /// Write one CSV row per candidate to `{experiment}_curve.csv`.
    ///
    /// Columns: `threshold,score,left_mean,right_mean,n_left,n_right`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteCsv`] if the file cannot be created or written.
    #[instrument(skip_all)]
    pub fn write_curve<T>(&self, scan: &SplitScan<'_, T>) -> Result<PathBuf, IoError>
    where
        T: SignificanceTest + ?Sized,
    {
        let path = self
            .output_dir
            .join(format!("{}_curve.csv", self.experiment.as_str()));
        let csv_error = |e: csv::Error| IoError::WriteCsv {
            path: path.clone(),
            source: e,
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(csv_error)?;
        for candidate in scan.candidates() {
            wtr.serialize(candidate).map_err(csv_error)?;
        }
        wtr.flush().map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), n_candidates = scan.n_candidates(), "score curve written");
        Ok(path)
    }
}

// ---------------------------------------------------------------------------
// Serialization artifacts (private)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct SplitArtifact<'a> {
    experiment: &'a str,
    predictor: &'a str,
    response: &'a str,
    criterion: SplitCriterion,
    #[serde(skip_serializing_if = "Option::is_none")]
    test: Option<TestMethod>,
    min_group_size: usize,
    n_observations: usize,
    n_skipped: usize,
    best: &'a SplitOutcome,
    candidates: Vec<CandidateScore>,
}
