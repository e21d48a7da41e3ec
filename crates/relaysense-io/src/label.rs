//! Categorical label encoding.

use std::collections::BTreeSet;

use tracing::debug;

use crate::IoError;

/// Maps distinct string labels to integer codes `0..k`.
///
/// Codes follow the byte-wise lexicographic order of the distinct labels,
/// so `{"OFF", "ON"}` encodes as `OFF = 0`, `ON = 1` regardless of the
/// order the labels appear in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    /// Learn the class list from every label in `labels`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EmptyLabelSet`] if `labels` is empty.
    pub fn fit<S: AsRef<str>>(labels: &[S]) -> Result<Self, IoError> {
        if labels.is_empty() {
            return Err(IoError::EmptyLabelSet);
        }
        let distinct: BTreeSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        let classes: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        debug!(?classes, "label encoder fitted");
        Ok(Self { classes })
    }

    /// Encode labels with the fitted class list.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownLabel`] for a label not seen by [`LabelEncoder::fit`].
    pub fn transform<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<usize>, IoError> {
        labels.iter().map(|l| self.encode(l.as_ref())).collect()
    }

    /// Fit on `labels` and encode them in one step.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::EmptyLabelSet`] if `labels` is empty.
    pub fn fit_transform<S: AsRef<str>>(labels: &[S]) -> Result<(Self, Vec<usize>), IoError> {
        let encoder = Self::fit(labels)?;
        let codes = encoder.transform(labels)?;
        Ok((encoder, codes))
    }

    /// Code of a single label.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnknownLabel`] if the label was not seen while fitting.
    pub fn encode(&self, label: &str) -> Result<usize, IoError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .map_err(|_| IoError::UnknownLabel {
                label: label.to_string(),
                known: self.classes.clone(),
            })
    }

    /// Class names indexed by code.
    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[must_use]
    pub fn class_name(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_status_encodes_off_before_on() {
        let (encoder, codes) = LabelEncoder::fit_transform(&["ON", "OFF", "ON", "OFF"]).unwrap();
        assert_eq!(encoder.classes(), ["OFF", "ON"]);
        assert_eq!(codes, vec![1, 0, 1, 0]);
        assert_eq!(encoder.class_name(0), Some("OFF"));
        assert_eq!(encoder.class_name(1), Some("ON"));
        assert_eq!(encoder.class_name(2), None);
    }

    #[test]
    fn order_is_bytewise() {
        let encoder = LabelEncoder::fit(&["b", "B", "a"]).unwrap();
        assert_eq!(encoder.classes(), ["B", "a", "b"]);
        assert_eq!(encoder.n_classes(), 3);
    }

    #[test]
    fn encoding_independent_of_appearance_order() {
        let a = LabelEncoder::fit(&["ON", "OFF"]).unwrap();
        let b = LabelEncoder::fit(&["OFF", "ON"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_class_is_allowed() {
        let (encoder, codes) = LabelEncoder::fit_transform(&["ON", "ON"]).unwrap();
        assert_eq!(encoder.n_classes(), 1);
        assert_eq!(codes, vec![0, 0]);
    }

    #[test]
    fn empty_label_set_rejected() {
        let empty: [&str; 0] = [];
        assert!(matches!(LabelEncoder::fit(&empty), Err(IoError::EmptyLabelSet)));
    }

    #[test]
    fn unknown_label_rejected() {
        let encoder = LabelEncoder::fit(&["OFF", "ON"]).unwrap();
        let err = encoder.transform(&["ON", "STANDBY"]).unwrap_err();
        assert!(matches!(err, IoError::UnknownLabel { ref label, .. } if label == "STANDBY"));
    }
}
