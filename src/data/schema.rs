//! Symptom schema and free-text symptom parsing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Schema construction errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("duplicate symptom column '{0}'")]
    DuplicateName(String),
}

/// Ordered list of symptom names the classifier was trained on.
///
/// Position `i` of every input vector is the indicator for `names()[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SymptomSchema {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl PartialEq for SymptomSchema {
    fn eq(&self, other: &Self) -> bool {
        self.names == other.names
    }
}

impl SymptomSchema {
    /// Build a schema from column names, in order. Names must be unique.
    pub fn new(names: Vec<String>) -> Result<Self, SchemaError> {
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateName(name.clone()));
            }
        }
        Ok(Self { names, positions })
    }

    /// Column names in input-vector order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of symptoms
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Position of a symptom in the input vector
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Split free text into known and unknown symptom tokens
    pub fn parse(&self, raw: &str) -> SymptomQuery {
        let mut query = SymptomQuery::default();
        for token in tokenize(raw) {
            if self.contains(&token) {
                query.valid.push(token);
            } else {
                query.ignored.push(token);
            }
        }
        query
    }

    /// Build the one-hot input vector. Unknown names leave it untouched.
    pub fn encode<S: AsRef<str>>(&self, symptoms: &[S]) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.names.len()];
        for symptom in symptoms {
            if let Some(i) = self.index_of(symptom.as_ref()) {
                vector[i] = 1.0;
            }
        }
        vector
    }
}

impl TryFrom<Vec<String>> for SymptomSchema {
    type Error = SchemaError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<SymptomSchema> for Vec<String> {
    fn from(schema: SymptomSchema) -> Self {
        schema.names
    }
}

/// Tokens extracted from one free-text entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymptomQuery {
    /// Tokens present in the schema
    pub valid: Vec<String>,
    /// Tokens not in the schema
    pub ignored: Vec<String>,
}

impl SymptomQuery {
    /// No tokens at all were supplied
    pub fn is_empty(&self) -> bool {
        self.valid.is_empty() && self.ignored.is_empty()
    }
}

/// Split on commas, trim, and turn inner spaces into underscores.
/// Blank tokens are dropped.
pub fn tokenize(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.replace(' ', "_"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SymptomSchema {
        SymptomSchema::new(
            ["itching", "skin_rash", "joint_pain", "high_fever"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize(" itching ,skin rash,, high fever "),
            vec!["itching", "skin_rash", "high_fever"]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize(" , ,").is_empty());
    }

    #[test]
    fn test_parse_separates_unknown_tokens() {
        let query = schema().parse("itching, zzz_not_a_symptom, joint pain");
        assert_eq!(query.valid, vec!["itching", "joint_pain"]);
        assert_eq!(query.ignored, vec!["zzz_not_a_symptom"]);
    }

    #[test]
    fn test_encode_one_hot() {
        let vector = schema().encode(&["skin_rash", "high_fever"]);
        assert_eq!(vector, vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_tokens_do_not_change_vector() {
        let schema = schema();
        let base = schema.encode(&["itching", "joint_pain"]);
        let noisy = schema.encode(&["itching", "nausea", "joint_pain", "Itching", ""]);
        assert_eq!(base, noisy);
        assert_eq!(schema.encode(&["zzz"]), vec![0.0; 4]);
    }

    #[test]
    fn test_serde_as_plain_list() {
        let schema = schema();
        let json = serde_json::to_string(&schema).unwrap();
        assert_eq!(json, r#"["itching","skin_rash","joint_pain","high_fever"]"#);

        let back: SymptomSchema = serde_json::from_str(&json).unwrap();
        assert_eq!(back, schema);
        assert_eq!(back.index_of("joint_pain"), Some(2));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let names = vec!["a".to_string(), "a.1".to_string(), "a.1".to_string()];
        assert_eq!(
            SymptomSchema::new(names).unwrap_err(),
            SchemaError::DuplicateName("a.1".to_string())
        );

        let result: Result<SymptomSchema, _> = serde_json::from_str(r#"["cough","cough"]"#);
        assert!(result.is_err());
    }
}
