//! One-Hot Vocabulary
//!
//! Learns the distinct values of each categorical column during fit and
//! encodes rows against that frozen vocabulary afterwards. Values the
//! vocabulary has never seen encode as an all-zero block.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::derive::EngineeredRecord;
use crate::error::PipelineError;
use crate::schema;

/// A categorical value: decoded numbers (cylinder counts) or text labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Category {
    Number(f64),
    Label(String),
}

impl Category {
    pub fn label(value: impl Into<String>) -> Self {
        Category::Label(value.into())
    }

    /// Numbers sort numerically ahead of labels, labels lexicographically.
    fn sort_order(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Category::Number(a), Category::Number(b)) => a.total_cmp(b),
            (Category::Label(a), Category::Label(b)) => a.cmp(b),
            (Category::Number(_), Category::Label(_)) => Ordering::Less,
            (Category::Label(_), Category::Number(_)) => Ordering::Greater,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{:?}` keeps the trailing `.0`, giving names like `EngineCylinders_6.0`
            Category::Number(n) => write!(f, "{n:?}"),
            Category::Label(s) => write!(f, "{s}"),
        }
    }
}

/// Learned categories of one one-hot column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryColumn {
    /// Source column name
    pub column: String,
    /// Distinct values seen during fit, sorted
    pub categories: Vec<Category>,
}

impl CategoryColumn {
    fn position(&self, value: &Category) -> Option<usize> {
        self.categories.iter().position(|c| c == value)
    }
}

/// Result of encoding one row
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedCategories {
    /// Indicator values for every one-hot column, in vocabulary order
    pub indicators: Vec<f64>,
    /// Present values that were not in the vocabulary
    pub unknown: usize,
}

/// Frozen vocabulary for [`schema::ONE_HOT_COLUMNS`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    columns: Vec<CategoryColumn>,
}

impl Vocabulary {
    /// Collect the distinct non-missing values of each categorical column.
    pub fn learn(rows: &[EngineeredRecord]) -> Self {
        let columns = schema::ONE_HOT_COLUMNS
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let mut categories: Vec<Category> = Vec::new();
                for value in rows.iter().filter_map(|row| row.categorical[idx].as_ref()) {
                    if !categories.contains(value) {
                        categories.push(value.clone());
                    }
                }
                categories.sort_by(|a, b| a.sort_order(b));
                CategoryColumn {
                    column: column.to_string(),
                    categories,
                }
            })
            .collect();

        Self { columns }
    }

    pub fn columns(&self) -> &[CategoryColumn] {
        &self.columns
    }

    /// Output column names, e.g. `Model_X`, `EngineCylinders_6.0`
    pub fn feature_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|col| {
                col.categories
                    .iter()
                    .map(move |cat| schema::one_hot_column(&col.column, &cat.to_string()))
            })
            .collect()
    }

    /// Total indicator width
    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.categories.len()).sum()
    }

    /// Encode one row's categorical values.
    pub fn encode(&self, values: &[Option<Category>; 5]) -> EncodedCategories {
        let mut indicators = vec![0.0; self.width()];
        let mut unknown = 0;
        let mut offset = 0;

        for (col, value) in self.columns.iter().zip(values.iter()) {
            if let Some(value) = value {
                match col.position(value) {
                    Some(pos) => indicators[offset + pos] = 1.0,
                    None => unknown += 1,
                }
            }
            offset += col.categories.len();
        }

        EncodedCategories { indicators, unknown }
    }

    /// Check a deserialized vocabulary covers exactly the one-hot columns.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let names: Vec<&str> = self.columns.iter().map(|c| c.column.as_str()).collect();
        if names != schema::ONE_HOT_COLUMNS {
            return Err(PipelineError::CorruptArtifact(format!(
                "vocabulary columns {:?} do not match {:?}",
                names,
                schema::ONE_HOT_COLUMNS
            )));
        }
        Ok(())
    }
}
