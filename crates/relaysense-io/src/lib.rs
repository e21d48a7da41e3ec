//! File I/O, validation, and serialization for the relaysense pipeline.

mod domain;
mod error;
mod label;
mod reader;
mod writer;

pub use domain::{ExperimentName, FEATURE_COLUMNS, LABEL_COLUMN, SensorDataset, SensorRecord};
pub use error::IoError;
pub use label::LabelEncoder;
pub use reader::SensorReader;
pub use writer::{EvaluationRecord, MetricTuple, ResultWriter};
