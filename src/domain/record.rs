// ============================================================
// Layer 3 — Record Domain Type
// ============================================================
// One labelled example from the review dataset.
//
// Example:
//   text:  "great movie"
//   label: 1
//
// The reader guarantees `text` is never empty, so every
// Record that reaches the cleaner already satisfies that.

use serde::{Deserialize, Serialize};

/// Class identifier attached to each review.
pub type Label = i64;

/// A single labelled text example.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// The review text
    pub text: String,

    /// The class this review belongs to
    pub label: Label,
}

impl Record {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

/// An ordered collection of records.
pub type Dataset = Vec<Record>;

/// Train / test partitions produced by the splitter.
/// The two halves are disjoint and together hold every
/// record of the cleaned dataset exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Dataset,
    pub test:  Dataset,
}

impl Split {
    /// Columns of a partition as borrowed texts and labels,
    /// the shape the vectorizer and classifier consume.
    pub fn columns(records: &[Record]) -> (Vec<&str>, Vec<Label>) {
        records
            .iter()
            .map(|r| (r.text.as_str(), r.label))
            .unzip()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_keep_order() {
        let records = vec![Record::new("a", 1), Record::new("b", 0)];
        let (texts, labels) = Split::columns(&records);
        assert_eq!(texts, vec!["a", "b"]);
        assert_eq!(labels, vec![1, 0]);
    }
}
