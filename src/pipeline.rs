//! Load, encode, split, fit and score: the relay classification pipeline.
//!
//! Each stage consumes the previous stage's output by value or reference
//! and returns a typed result, so `run` reads top to bottom.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use relaysense_io::{
    EvaluationRecord, LabelEncoder, MetricTuple, ResultWriter, SensorDataset, SensorReader,
};
use relaysense_rf::{
    AverageMetrics, ClassificationReport, HoldoutSplit, RandomForestConfig, RandomForestResult,
    RankedFeature, SplitCriterion, TrainTestSplit,
};

/// Inputs that fully determine one run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data: PathBuf,
    pub test_size: f64,
    pub n_trees: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub criterion: SplitCriterion,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data: PathBuf::from("synthetic_sensor_data.csv"),
            test_size: 0.2,
            n_trees: 100,
            seed: 42,
            max_depth: None,
            criterion: SplitCriterion::Gini,
        }
    }
}

/// Feature matrix plus integer labels, with the encoder that produced them.
#[derive(Debug)]
pub struct EncodedDataset {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<usize>,
    pub feature_names: Vec<String>,
    pub encoder: LabelEncoder,
}

/// Held-out scores of a fitted forest.
#[derive(Debug)]
pub struct Evaluation {
    pub report: ClassificationReport,
    pub importances: Vec<RankedFeature>,
    pub n_train: usize,
    pub n_test: usize,
    pub n_trees: usize,
    pub seed: u64,
}

impl Evaluation {
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.report.accuracy()
    }

    /// Write `{experiment}_evaluate.json` through `writer`.
    pub fn write_artifact(&self, writer: &ResultWriter) -> Result<PathBuf> {
        let class_names: Vec<String> = self.report.rows().iter().map(|r| r.name.clone()).collect();
        let class_metrics: Vec<MetricTuple> = self
            .report
            .rows()
            .iter()
            .map(|r| (r.precision, r.recall, r.f1, r.support))
            .collect();
        let feature_names: Vec<String> = self.importances.iter().map(|f| f.name.clone()).collect();
        let feature_importances: Vec<f64> = self.importances.iter().map(|f| f.importance).collect();
        let feature_ranks: Vec<usize> = self.importances.iter().map(|f| f.rank).collect();

        let record = EvaluationRecord {
            accuracy: self.accuracy(),
            n_train: self.n_train,
            n_test: self.n_test,
            seed: self.seed,
            n_trees: self.n_trees,
            class_names: &class_names,
            class_metrics: &class_metrics,
            macro_avg: metric_tuple(self.report.macro_avg()),
            weighted_avg: metric_tuple(self.report.weighted_avg()),
            confusion_matrix: self.report.confusion().as_rows(),
            feature_names: &feature_names,
            feature_importances: &feature_importances,
            feature_ranks: &feature_ranks,
        };
        writer
            .write_evaluation(&record)
            .context("failed to write evaluation artifact")
    }
}

fn metric_tuple(avg: AverageMetrics) -> MetricTuple {
    (avg.precision, avg.recall, avg.f1, avg.support)
}

/// Read and validate the sensor CSV.
pub fn load(path: &Path) -> Result<SensorDataset> {
    SensorReader::new(path)
        .read()
        .with_context(|| format!("failed to read sensor CSV {}", path.display()))
}

/// Encode relay status over the full dataset, before any split.
pub fn encode(dataset: &SensorDataset) -> Result<EncodedDataset> {
    let (encoder, labels) =
        LabelEncoder::fit_transform(&dataset.labels()).context("failed to encode relay status")?;
    info!(classes = ?encoder.classes(), "labels encoded");
    Ok(EncodedDataset {
        features: dataset.features(),
        labels,
        feature_names: dataset.feature_names(),
        encoder,
    })
}

/// Seeded, non-stratified train/test split.
pub fn split(encoded: &EncodedDataset, test_size: f64, seed: u64) -> Result<HoldoutSplit> {
    TrainTestSplit::new(test_size)
        .context("invalid test size")?
        .with_seed(seed)
        .split(&encoded.features, &encoded.labels)
        .context("failed to split dataset")
}

/// Fit the forest on the train partition.
///
/// `n_classes` comes from the label encoder, so a class that only
/// appears in the test rows still has a slot in every tree.
pub fn train(
    holdout: &HoldoutSplit,
    feature_names: &[String],
    n_classes: usize,
    config: &PipelineConfig,
) -> Result<RandomForestResult> {
    RandomForestConfig::new(config.n_trees)
        .context("invalid forest configuration")?
        .with_seed(config.seed)
        .with_max_depth(config.max_depth)
        .with_criterion(config.criterion)
        .with_n_classes(Some(n_classes))
        .fit(&holdout.train_features, &holdout.train_labels, feature_names)
        .context("random forest training failed")
}

/// Predict `test_features` and score them against `test_labels`.
pub fn score(
    result: &RandomForestResult,
    test_features: &[Vec<f64>],
    test_labels: &[usize],
    class_names: &[String],
) -> Result<ClassificationReport> {
    let predicted = result
        .forest()
        .predict_batch(test_features)
        .context("prediction failed")?;
    ClassificationReport::from_predictions(test_labels, &predicted, class_names)
        .context("failed to build classification report")
}

/// Run every stage once.
#[instrument(skip_all, fields(data = %config.data.display(), seed = config.seed))]
pub fn run(config: &PipelineConfig) -> Result<Evaluation> {
    let dataset = load(&config.data)?;
    let encoded = encode(&dataset)?;
    let holdout = split(&encoded, config.test_size, config.seed)?;
    info!(n_train = holdout.n_train(), n_test = holdout.n_test(), "dataset split");

    let result = train(
        &holdout,
        &encoded.feature_names,
        encoded.encoder.n_classes(),
        config,
    )?;
    let report = score(
        &result,
        &holdout.test_features,
        &holdout.test_labels,
        encoded.encoder.classes(),
    )?;
    info!(accuracy = report.accuracy(), "holdout evaluation complete");
    debug!("confusion matrix\n{}", report.confusion());

    Ok(Evaluation {
        report,
        importances: result.importances().to_vec(),
        n_train: holdout.n_train(),
        n_test: holdout.n_test(),
        n_trees: config.n_trees,
        seed: config.seed,
    })
}

/// The text printed to stdout: accuracy line, blank line, then the report.
#[must_use]
pub fn render(evaluation: &Evaluation) -> String {
    format!(
        "Accuracy: {:?}\n\nClassification Report:\n{}\n",
        evaluation.accuracy(),
        evaluation.report
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::fs;

    use relaysense_io::{ExperimentName, IoError};
    use tempfile::TempDir;

    use super::*;

    const HEADER: &str = "Temperature_C,FlowRate_Lmin,Accel_X,Accel_Y,Accel_Z,Relay_Status\n";

    /// Ten rows, five per class; every feature separates OFF (about 1-5)
    /// from ON (about 100-105).
    fn separable_csv() -> String {
        let mut csv = HEADER.to_string();
        for i in 0..5 {
            let off = 1.0 + i as f64;
            let on = 100.0 + i as f64;
            csv.push_str(&format!("{off},{off},{off},{off},{off},OFF\n"));
            csv.push_str(&format!("{on},{on},{on},{on},{on},ON\n"));
        }
        csv
    }

    fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config_for(path: PathBuf) -> PipelineConfig {
        PipelineConfig {
            data: path,
            ..PipelineConfig::default()
        }
    }

    fn io_error(err: &anyhow::Error) -> Option<&IoError> {
        err.chain().find_map(|e| e.downcast_ref::<IoError>())
    }

    #[test]
    fn separable_data_scores_perfectly() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let evaluation = run(&config_for(path)).unwrap();

        assert_eq!(evaluation.accuracy(), 1.0);
        assert_eq!((evaluation.n_train, evaluation.n_test), (8, 2));

        let rows = evaluation.report.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows.iter().map(|r| r.support).sum::<usize>(), 2);
        for row in rows.iter().filter(|r| r.support > 0) {
            assert_eq!((row.precision, row.recall, row.f1), (1.0, 1.0, 1.0), "{}", row.name);
        }

        let text = evaluation.report.to_string();
        assert!(text.contains("    accuracy                           1.00         2"));
    }

    #[test]
    fn rendered_output_leads_with_accuracy() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let evaluation = run(&config_for(path)).unwrap();

        let out = render(&evaluation);
        assert!(out.starts_with(concat!(
            "Accuracy: 1.0\n",
            "\n",
            "Classification Report:\n",
            "              precision    recall  f1-score   support\n",
        )));
        assert!(out.ends_with("weighted avg       1.00      1.00      1.00         2\n\n"));
        assert!(out.contains(&evaluation.report.to_string()));
    }

    #[test]
    fn confusion_matrix_counts_every_test_row() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let evaluation = run(&config_for(path)).unwrap();

        let confusion = evaluation.report.confusion();
        assert_eq!(confusion.total(), evaluation.n_test);
        let text = confusion.to_string();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().next().unwrap().contains("pred_  1"));
        assert!(text.lines().nth(2).unwrap().starts_with("true_  1"));
    }

    #[test]
    fn class_missing_from_train_keeps_encoder_class_count() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let encoded = encode(&load(&path).unwrap()).unwrap();

        // Train only on OFF rows; hold out one ON row.
        let off: Vec<usize> = (0..10).step_by(2).collect();
        let holdout = HoldoutSplit {
            train_features: off.iter().map(|&i| encoded.features[i].clone()).collect(),
            train_labels: off.iter().map(|&i| encoded.labels[i]).collect(),
            train_indices: off,
            test_indices: vec![1],
            test_features: vec![encoded.features[1].clone()],
            test_labels: vec![encoded.labels[1]],
        };
        let config = PipelineConfig {
            n_trees: 5,
            ..PipelineConfig::default()
        };
        let result = train(&holdout, &encoded.feature_names, 2, &config).unwrap();
        assert_eq!(result.forest().n_classes(), 2);

        let proba = result.forest().predict_proba(&holdout.test_features[0]).unwrap();
        assert_eq!(proba.as_slice().len(), 2);
    }

    #[test]
    fn both_classes_in_test_score_perfectly() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let encoded = encode(&load(&path).unwrap()).unwrap();

        // Rows 0 and 1 are the first OFF and ON rows; train on the rest.
        let holdout = HoldoutSplit {
            train_indices: (2..10).collect(),
            test_indices: vec![0, 1],
            train_features: encoded.features[2..].to_vec(),
            train_labels: encoded.labels[2..].to_vec(),
            test_features: encoded.features[..2].to_vec(),
            test_labels: encoded.labels[..2].to_vec(),
        };
        let result = train(
            &holdout,
            &encoded.feature_names,
            encoded.encoder.n_classes(),
            &PipelineConfig::default(),
        )
        .unwrap();
        let report = score(
            &result,
            &holdout.test_features,
            &holdout.test_labels,
            encoded.encoder.classes(),
        )
        .unwrap();

        assert_eq!(report.accuracy(), 1.0);
        for row in report.rows() {
            assert_eq!(row.support, 1);
            assert_eq!((row.precision, row.recall, row.f1), (1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn labels_encode_off_zero_on_one() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let encoded = encode(&load(&path).unwrap()).unwrap();
        assert_eq!(encoded.encoder.classes(), ["OFF", "ON"]);
        assert_eq!(&encoded.labels[..4], &[0, 1, 0, 1]);
    }

    #[test]
    fn same_inputs_same_results() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let a = run(&config_for(path.clone())).unwrap();
        let b = run(&config_for(path)).unwrap();
        assert_eq!(a.accuracy(), b.accuracy());
        assert_eq!(a.report.rows(), b.report.rows());
        assert_eq!(a.importances, b.importances);
    }

    #[test]
    fn partitions_cover_every_row_once() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let encoded = encode(&load(&path).unwrap()).unwrap();
        let holdout = split(&encoded, 0.2, 42).unwrap();

        let train: HashSet<usize> = holdout.train_indices.iter().copied().collect();
        let test: HashSet<usize> = holdout.test_indices.iter().copied().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.len() + test.len(), 10);
    }

    #[test]
    fn missing_file_fails() {
        let err = run(&config_for(PathBuf::from("/nonexistent/sensors.csv"))).unwrap_err();
        assert!(matches!(io_error(&err), Some(IoError::FileNotFound { .. })));
    }

    #[test]
    fn missing_column_fails() {
        let dir = TempDir::new().unwrap();
        let csv = separable_csv().replace("Accel_Y", "Accel_W");
        let path = write_csv(&dir, "sensors.csv", &csv);
        let err = run(&config_for(path)).unwrap_err();
        assert!(matches!(
            io_error(&err),
            Some(IoError::MissingColumn { column: "Accel_Y", .. })
        ));
    }

    #[test]
    fn unparseable_value_fails() {
        let dir = TempDir::new().unwrap();
        let csv = separable_csv().replacen("100,100", "100,oops", 1);
        let path = write_csv(&dir, "sensors.csv", &csv);
        let err = run(&config_for(path)).unwrap_err();
        assert!(matches!(io_error(&err), Some(IoError::InvalidValue { .. })));
    }

    #[test]
    fn artifact_matches_report() {
        let dir = TempDir::new().unwrap();
        let path = write_csv(&dir, "sensors.csv", &separable_csv());
        let evaluation = run(&config_for(path)).unwrap();

        let out = dir.path().join("out");
        let writer = ResultWriter::new(&out, ExperimentName::new("relay".into()).unwrap()).unwrap();
        let artifact = evaluation.write_artifact(&writer).unwrap();
        assert_eq!(artifact, out.join("relay_evaluate.json"));

        let content = fs::read_to_string(&artifact).unwrap();
        assert!(content.contains("\"accuracy\": 1.0"));
        assert!(content.contains("\"n_test\": 2"));
        assert!(content.contains("\"Temperature_C\""));
    }
}
