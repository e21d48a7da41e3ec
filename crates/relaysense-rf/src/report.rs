//! Per-class classification report with macro and weighted averages.

use std::fmt;

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;

const HEADERS: [&str; 4] = ["precision", "recall", "f1-score", "support"];
const LONGEST_AGGREGATE: &str = "weighted avg";
const DIGITS: usize = 2;

/// Metrics for one named class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassReportRow {
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Averaged precision/recall/F1 over the class rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Total support across all classes.
    pub support: usize,
}

/// Accuracy and per-class metrics for a set of predictions.
///
/// There is exactly one row per class name, in class-code order, even for
/// classes absent from the evaluated labels. `Display` renders the table
/// with an accuracy row followed by `macro avg` and `weighted avg`.
#[derive(Debug, Clone)]
pub struct ClassificationReport {
    rows: Vec<ClassReportRow>,
    accuracy: f64,
    macro_avg: AverageMetrics,
    weighted_avg: AverageMetrics,
    confusion: ConfusionMatrix,
}

impl ClassificationReport {
    /// Score `predicted` against `true_labels`, naming class `i` by `class_names[i]`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`RfError::ClassNameCountMismatch`] | `class_names` is empty |
    /// | [`RfError::EmptyDataset`] | zero labels |
    /// | [`RfError::LengthMismatch`] | predictions and labels differ in length |
    /// | [`RfError::LabelOutOfRange`] | a code has no class name |
    pub fn from_predictions(
        true_labels: &[usize],
        predicted: &[usize],
        class_names: &[String],
    ) -> Result<Self, RfError> {
        if class_names.is_empty() {
            return Err(RfError::ClassNameCountMismatch {
                expected: 1,
                got: 0,
            });
        }
        let confusion = ConfusionMatrix::from_labels(true_labels, predicted, class_names.len())?;
        Self::from_confusion(confusion, class_names)
    }

    /// Build a report from an existing confusion matrix.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::ClassNameCountMismatch`] if `class_names.len()`
    /// differs from the matrix's class count.
    pub fn from_confusion(
        confusion: ConfusionMatrix,
        class_names: &[String],
    ) -> Result<Self, RfError> {
        if class_names.len() != confusion.n_classes() {
            return Err(RfError::ClassNameCountMismatch {
                expected: confusion.n_classes(),
                got: class_names.len(),
            });
        }
        let rows: Vec<ClassReportRow> = confusion
            .class_metrics()
            .into_iter()
            .zip(class_names)
            .map(|(m, name)| ClassReportRow {
                name: name.clone(),
                precision: m.precision,
                recall: m.recall,
                f1: m.f1,
                support: m.support,
            })
            .collect();

        let total = confusion.total();
        let n_rows = rows.len() as f64;
        let macro_avg = AverageMetrics {
            precision: rows.iter().map(|r| r.precision).sum::<f64>() / n_rows,
            recall: rows.iter().map(|r| r.recall).sum::<f64>() / n_rows,
            f1: rows.iter().map(|r| r.f1).sum::<f64>() / n_rows,
            support: total,
        };
        let weighted = |metric: fn(&ClassReportRow) -> f64| -> f64 {
            if total == 0 {
                return 0.0;
            }
            rows.iter().map(|r| metric(r) * r.support as f64).sum::<f64>() / total as f64
        };
        let weighted_avg = AverageMetrics {
            precision: weighted(|r| r.precision),
            recall: weighted(|r| r.recall),
            f1: weighted(|r| r.f1),
            support: total,
        };

        Ok(Self {
            accuracy: confusion.accuracy(),
            rows,
            macro_avg,
            weighted_avg,
            confusion,
        })
    }

    /// Fraction of correct predictions.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn rows(&self) -> &[ClassReportRow] {
        &self.rows
    }

    #[must_use]
    pub fn macro_avg(&self) -> AverageMetrics {
        self.macro_avg
    }

    #[must_use]
    pub fn weighted_avg(&self) -> AverageMetrics {
        self.weighted_avg
    }

    #[must_use]
    pub fn confusion(&self) -> &ConfusionMatrix {
        &self.confusion
    }

    /// Number of evaluated samples.
    #[must_use]
    pub fn total_support(&self) -> usize {
        self.confusion.total()
    }

    fn name_width(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.name.chars().count())
            .chain([LONGEST_AGGREGATE.len(), DIGITS])
            .max()
            .unwrap_or(LONGEST_AGGREGATE.len())
    }
}

fn write_row(
    f: &mut fmt::Formatter<'_>,
    width: usize,
    heading: &str,
    values: [f64; 3],
    support: usize,
) -> fmt::Result {
    write!(f, "{heading:>width$} ")?;
    for v in values {
        write!(f, " {v:>9.DIGITS$}")?;
    }
    writeln!(f, " {support:>9}")
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.name_width();

        write!(f, "{:>width$} ", "")?;
        for h in HEADERS {
            write!(f, " {h:>9}")?;
        }
        writeln!(f)?;
        writeln!(f)?;

        for row in &self.rows {
            write_row(f, width, &row.name, [row.precision, row.recall, row.f1], row.support)?;
        }
        writeln!(f)?;

        writeln!(
            f,
            "{:>width$}  {:>9} {:>9} {:>9.DIGITS$} {:>9}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total_support()
        )?;
        for (heading, avg) in [("macro avg", self.macro_avg), ("weighted avg", self.weighted_avg)] {
            write_row(f, width, heading, [avg.precision, avg.recall, avg.f1], avg.support)?;
        }
        Ok(())
    }
}
