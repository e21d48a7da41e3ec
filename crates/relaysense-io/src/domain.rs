//! Domain types for relaysense-io.

use crate::IoError;

/// Header name of the relay status column.
pub const LABEL_COLUMN: &str = "Relay_Status";

/// Header names of the sensor feature columns, in feature-vector order.
pub const FEATURE_COLUMNS: [&str; 5] = [
    "Temperature_C",
    "FlowRate_Lmin",
    "Accel_X",
    "Accel_Y",
    "Accel_Z",
];

/// One row of the sensor CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    pub temperature_c: f64,
    pub flow_rate_lmin: f64,
    pub accel_x: f64,
    pub accel_y: f64,
    pub accel_z: f64,
    /// Raw relay status, e.g. `"ON"` or `"OFF"`.
    pub relay_status: String,
}

impl SensorRecord {
    /// Feature values in [`FEATURE_COLUMNS`] order.
    #[must_use]
    pub fn features(&self) -> [f64; 5] {
        [
            self.temperature_c,
            self.flow_rate_lmin,
            self.accel_x,
            self.accel_y,
            self.accel_z,
        ]
    }
}

/// Sensor records in file order.
///
/// Produced by [`SensorReader`](crate::SensorReader); never empty.
#[derive(Debug, Clone)]
pub struct SensorDataset {
    records: Vec<SensorRecord>,
}

impl SensorDataset {
    pub(crate) fn new(records: Vec<SensorRecord>) -> Self {
        debug_assert!(!records.is_empty(), "sensor dataset must not be empty");
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    /// Row-major feature matrix.
    #[must_use]
    pub fn features(&self) -> Vec<Vec<f64>> {
        self.records.iter().map(|r| r.features().to_vec()).collect()
    }

    /// Raw relay status of every row.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.relay_status.as_str()).collect()
    }

    /// Owned copies of [`FEATURE_COLUMNS`].
    #[must_use]
    pub fn feature_names(&self) -> Vec<String> {
        FEATURE_COLUMNS.iter().map(|c| (*c).to_string()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(t: f64, status: &str) -> SensorRecord {
        SensorRecord {
            temperature_c: t,
            flow_rate_lmin: 2.0,
            accel_x: 0.1,
            accel_y: -0.2,
            accel_z: 9.8,
            relay_status: status.to_string(),
        }
    }

    #[test]
    fn features_follow_column_order() {
        assert_eq!(record(21.5, "ON").features(), [21.5, 2.0, 0.1, -0.2, 9.8]);
    }

    #[test]
    fn dataset_views() {
        let ds = SensorDataset::new(vec![record(20.0, "OFF"), record(40.0, "ON")]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), ["OFF", "ON"]);
        assert_eq!(ds.features()[1][0], 40.0);
        assert_eq!(ds.feature_names()[4], "Accel_Z");
    }

    #[test]
    fn experiment_name_valid() {
        let name = ExperimentName::new("relay-run_01".to_string()).unwrap();
        assert_eq!(name.as_str(), "relay-run_01");
    }

    #[test]
    fn experiment_name_rejects_empty_and_special_chars() {
        for bad in ["", "relay run", "../relay"] {
            assert!(matches!(
                ExperimentName::new(bad.to_string()),
                Err(IoError::InvalidExperimentName { .. })
            ));
        }
    }
}
