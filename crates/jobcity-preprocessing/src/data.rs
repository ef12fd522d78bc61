//! Records and the extraction of model-ready documents/labels from them.

use ahash::HashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result};

/// One raw row: free text plus its categorical label (e.g. a job description
/// and the city it was posted in).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(alias = "description")]
    pub text: String,
    #[serde(alias = "city")]
    pub label: String,
}

impl Record {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Parallel document and class-index vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelData {
    pub documents: Vec<String>,
    pub labels: Vec<usize>,
}

impl ModelData {
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// The fitted label → class index mapping.
///
/// Only the `num_classes` most frequent labels are kept. Class `0` is the most
/// frequent label; ties are broken by label name so the mapping is
/// deterministic. Held-out records must be extracted with the selection fitted
/// on the training records, otherwise class indices would not line up.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSelection {
    classes: Vec<String>,
}

impl ClassSelection {
    pub fn fit(records: &[Record], num_classes: usize) -> Result<Self> {
        if num_classes == 0 {
            return Err(Error::InvalidConfiguration(
                "number of classes must be positive".to_string(),
            ));
        }

        let mut counts: HashMap<&str, usize> = HashMap::default();
        for record in records.iter().filter(|r| is_usable(r)) {
            *counts.entry(record.label.as_str()).or_insert(0) += 1;
        }

        let mut ranked = counts.into_iter().collect::<Vec<_>>();
        ranked.sort_by(|(a_label, a_count), (b_label, b_count)| {
            b_count.cmp(a_count).then_with(|| a_label.cmp(b_label))
        });

        let classes = ranked
            .into_iter()
            .take(num_classes)
            .map(|(label, _)| label.to_string())
            .collect::<Vec<_>>();

        if classes.len() < num_classes {
            warn!(
                requested = num_classes,
                found = classes.len(),
                "Fewer distinct labels than requested classes"
            );
        }
        debug!(?classes, "Class selection fitted");

        Ok(Self { classes })
    }

    /// Keep the records whose label was selected, dropping blank documents.
    pub fn extract(&self, records: &[Record]) -> ModelData {
        let mut data = ModelData::default();
        for record in records.iter().filter(|r| is_usable(r)) {
            if let Some(class) = self.class_of(&record.label) {
                data.documents.push(record.text.clone());
                data.labels.push(class);
            }
        }
        let dropped = records.len() - data.len();
        if dropped > 0 {
            debug!(dropped, kept = data.len(), "Dropped records outside selection");
        }
        data
    }

    #[must_use]
    pub fn class_of(&self, label: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == label)
    }

    #[must_use]
    pub fn label_of(&self, class: usize) -> Option<&str> {
        self.classes.get(class).map(String::as_str)
    }

    #[must_use]
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

fn is_usable(record: &Record) -> bool {
    !record.text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            Record::new("python developer", "seattle"),
            Record::new("rust engineer", "austin"),
            Record::new("data scientist", "seattle"),
            Record::new("nurse", "boston"),
            Record::new("welder", "austin"),
            Record::new("   ", "seattle"),
            Record::new("barista", "seattle"),
        ]
    }

    #[test]
    fn test_selects_most_frequent_labels() {
        let selection = ClassSelection::fit(&records(), 2).unwrap();
        assert_eq!(selection.classes(), &["seattle", "austin"]);
        assert_eq!(selection.class_of("seattle"), Some(0));
        assert_eq!(selection.class_of("boston"), None);
        assert_eq!(selection.label_of(1), Some("austin"));
    }

    #[test]
    fn test_ties_broken_by_name() {
        let records = vec![Record::new("a b", "zurich"), Record::new("c d", "berlin")];
        let selection = ClassSelection::fit(&records, 2).unwrap();
        assert_eq!(selection.classes(), &["berlin", "zurich"]);
    }

    #[test]
    fn test_extract_drops_blank_and_unselected() {
        let selection = ClassSelection::fit(&records(), 2).unwrap();
        let data = selection.extract(&records());
        assert_eq!(data.len(), 5);
        assert_eq!(data.documents.len(), data.labels.len());
        assert!(!data.documents.iter().any(|d| d == "nurse"));
        assert_eq!(data.labels, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn test_zero_classes_rejected() {
        assert!(matches!(
            ClassSelection::fit(&records(), 0),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_fewer_labels_than_requested() {
        let selection = ClassSelection::fit(&records(), 10).unwrap();
        assert_eq!(selection.len(), 3);
    }
}
