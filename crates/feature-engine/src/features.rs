//! Encoded Feature Vectors

use serde::{Deserialize, Serialize};

/// Feature vector for one vehicle, ready for the price model.
///
/// `None` marks a missing value; the model decides how to treat it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedFeatureVector {
    /// VIN of the source record
    pub vin: String,
    /// Values in the fitted column order
    pub values: Vec<Option<f64>>,
}

impl EncodedFeatureVector {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing entries
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }
}

/// Output of a transform: shared column order plus one vector per record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureMatrix {
    /// Column names, identical for every transform of one fitted pipeline
    pub columns: Vec<String>,
    /// Rows in input order
    pub rows: Vec<EncodedFeatureVector>,
}

impl FeatureMatrix {
    /// Index of a named column
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Value at `(row, column)`; `None` if missing or the column is unknown
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.values.get(idx).copied().flatten())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Take the single row of a one-record transform
    pub fn into_single(mut self) -> Option<EncodedFeatureVector> {
        if self.rows.len() == 1 {
            self.rows.pop()
        } else {
            None
        }
    }
}
