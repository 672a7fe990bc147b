pub mod batcher;
pub mod encoder;
pub mod loader;
pub mod schema;

use serde::{Deserialize, Serialize};

pub use encoder::{EncoderError, LabelEncoder};
pub use loader::DataLoader;
pub use schema::{SchemaError, SymptomQuery, SymptomSchema};

/// Name of the label column in the training and testing tables
pub const LABEL_COLUMN: &str = "prognosis";

/// Header prefix of the index column left behind by spreadsheet exports
pub const UNNAMED_PREFIX: &str = "Unnamed";

/// One labelled example: binary symptom indicators plus the disease name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRecord {
    /// Symptom indicators, aligned with the table schema
    pub features: Vec<f32>,
    /// Disease label
    pub label: String,
}

/// A table of labelled examples sharing one symptom schema
#[derive(Debug, Clone)]
pub struct SymptomTable {
    /// Column order of `features` in every record
    pub schema: SymptomSchema,
    /// Rows
    pub records: Vec<SymptomRecord>,
}

impl SymptomTable {
    /// Create a table from a schema and rows
    pub fn new(schema: SymptomSchema, records: Vec<SymptomRecord>) -> Self {
        Self { schema, records }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Label column, in row order
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.label.as_str()).collect()
    }

    /// Reindex this table onto `target` columns.
    ///
    /// Columns missing here are filled with 0, columns unknown to `target`
    /// are dropped.
    pub fn align_to(&self, target: &SymptomSchema) -> SymptomTable {
        let positions: Vec<Option<usize>> = target
            .names()
            .iter()
            .map(|name| self.schema.index_of(name))
            .collect();

        let records = self
            .records
            .iter()
            .map(|record| SymptomRecord {
                features: positions
                    .iter()
                    .map(|pos| pos.map(|i| record.features[i]).unwrap_or(0.0))
                    .collect(),
                label: record.label.clone(),
            })
            .collect();

        SymptomTable {
            schema: target.clone(),
            records,
        }
    }
}

/// Train and test tables aligned to the train schema
#[derive(Debug, Clone)]
pub struct SplitTables {
    /// Training rows
    pub train: SymptomTable,
    /// Testing rows, also used as the validation set
    pub test: SymptomTable,
}

impl SplitTables {
    /// Symptom schema shared by both tables
    pub fn schema(&self) -> &SymptomSchema {
        &self.train.schema
    }

    /// Total number of rows
    pub fn total_samples(&self) -> usize {
        self.train.len() + self.test.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(features: &[f32], label: &str) -> SymptomRecord {
        SymptomRecord {
            features: features.to_vec(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_align_fills_missing_and_drops_extra() {
        let test_schema = SymptomSchema::new(vec![
            "cough".to_string(),
            "extra".to_string(),
            "itching".to_string(),
        ])
        .unwrap();
        let table = SymptomTable::new(test_schema, vec![record(&[1.0, 1.0, 0.0], "Flu")]);

        let train_schema = SymptomSchema::new(vec![
            "itching".to_string(),
            "fever".to_string(),
            "cough".to_string(),
        ])
        .unwrap();
        let aligned = table.align_to(&train_schema);

        assert_eq!(aligned.schema, train_schema);
        assert_eq!(aligned.records[0].features, vec![0.0, 0.0, 1.0]);
        assert_eq!(aligned.records[0].label, "Flu");
    }
}
