//! JSON result writer for holdout evaluation outputs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Precision, recall, F1 and support, in that order.
pub type MetricTuple = (f64, f64, f64, usize);

/// Everything recorded about one holdout evaluation.
///
/// Takes primitives so the writer has no dependency on `relaysense-rf`.
/// `class_names`, `class_metrics` and `confusion_matrix` are parallel and
/// indexed by class code; the three feature slices are parallel and
/// listed most important first.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationRecord<'a> {
    pub accuracy: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub seed: u64,
    pub n_trees: usize,
    pub class_names: &'a [String],
    pub class_metrics: &'a [MetricTuple],
    pub macro_avg: MetricTuple,
    pub weighted_avg: MetricTuple,
    pub confusion_matrix: &'a [Vec<usize>],
    pub feature_names: &'a [String],
    pub feature_importances: &'a [f64],
    pub feature_ranks: &'a [usize],
}

impl EvaluationRecord<'_> {
    fn check_consistent(&self) -> Result<(), IoError> {
        let n_classes = self.class_names.len();
        let reason = if self.class_metrics.len() != n_classes {
            format!(
                "{} class names but {} metric rows",
                n_classes,
                self.class_metrics.len()
            )
        } else if self.confusion_matrix.len() != n_classes
            || self.confusion_matrix.iter().any(|row| row.len() != n_classes)
        {
            format!("confusion matrix is not {n_classes}x{n_classes}")
        } else if self.feature_importances.len() != self.feature_names.len()
            || self.feature_ranks.len() != self.feature_names.len()
        {
            format!(
                "{} feature names, {} importances, {} ranks",
                self.feature_names.len(),
                self.feature_importances.len(),
                self.feature_ranks.len()
            )
        } else {
            return Ok(());
        };
        Err(IoError::InconsistentEvaluation { reason })
    }
}

/// Writes evaluation results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_evaluate.json`.
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

    /// Path of the evaluation artifact, whether or not it exists yet.
    #[must_use]
    pub fn evaluation_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_evaluate.json", self.experiment.as_str()))
    }

    /// Write an evaluation to `{experiment}_evaluate.json` and return its path.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::InconsistentEvaluation`] | parallel slices disagree in length |
    /// | [`IoError::Serialize`] | JSON encoding fails |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all, fields(experiment = %self.experiment))]
    pub fn write_evaluation(&self, record: &EvaluationRecord<'_>) -> Result<PathBuf, IoError> {
        record.check_consistent()?;
        let path = self.evaluation_path();

        let classes: Vec<ClassEntry<'_>> = record
            .class_names
            .iter()
            .zip(record.class_metrics)
            .enumerate()
            .map(|(code, (name, &metrics))| ClassEntry::new(code, name, metrics))
            .collect();

        let features: Vec<FeatureEntry<'_>> = record
            .feature_names
            .iter()
            .zip(record.feature_importances)
            .zip(record.feature_ranks)
            .map(|((name, &importance), &rank)| FeatureEntry {
                name,
                importance,
                rank,
            })
            .collect();

        let artifact = EvaluateArtifact {
            experiment: self.experiment.as_str(),
            accuracy: record.accuracy,
            n_train: record.n_train,
            n_test: record.n_test,
            seed: record.seed,
            n_trees: record.n_trees,
            class_names: record.class_names,
            class_metrics: classes,
            macro_avg: AverageEntry::from(record.macro_avg),
            weighted_avg: AverageEntry::from(record.weighted_avg),
            confusion_matrix: record.confusion_matrix,
            feature_importances: features,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        fs::write(&path, &json).map_err(|e| IoError::WriteFile {
            path: path.clone(),
            source: e,
        })?;

        info!(path = %path.display(), "evaluation result written");
        Ok(path)
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct EvaluateArtifact<'a> {
    experiment: &'a str,
    accuracy: f64,
    n_train: usize,
    n_test: usize,
    seed: u64,
    n_trees: usize,
    class_names: &'a [String],
    class_metrics: Vec<ClassEntry<'a>>,
    macro_avg: AverageEntry,
    weighted_avg: AverageEntry,
    confusion_matrix: &'a [Vec<usize>],
    feature_importances: Vec<FeatureEntry<'a>>,
}

#[derive(Serialize)]
struct ClassEntry<'a> {
    class: usize,
    name: &'a str,
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

impl<'a> ClassEntry<'a> {
    fn new(class: usize, name: &'a str, (precision, recall, f1, support): MetricTuple) -> Self {
        Self {
            class,
            name,
            precision,
            recall,
            f1,
            support,
        }
    }
}

#[derive(Serialize)]
struct AverageEntry {
    precision: f64,
    recall: f64,
    f1: f64,
    support: usize,
}

impl From<MetricTuple> for AverageEntry {
    fn from((precision, recall, f1, support): MetricTuple) -> Self {
        Self {
            precision,
            recall,
            f1,
            support,
        }
    }
}

#[derive(Serialize)]
struct FeatureEntry<'a> {
    name: &'a str,
    importance: f64,
    rank: usize,
}
