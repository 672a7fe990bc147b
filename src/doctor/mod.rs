//! Disease to specialist suggestions.
//!
//! The heuristic is an ordered list of keyword rules checked against the
//! lowercased disease name. The first rule with a keyword that occurs as a
//! substring wins, so a name that matches several categories resolves to the
//! earliest one in [`SPECIALIST_RULES`].

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Specialist used when no rule matches and no mapping entry exists
pub const DEFAULT_SPECIALIST: &str = "General Physician";

/// A keyword rule: any keyword as a substring selects `specialist`
#[derive(Debug, Clone, Copy)]
pub struct SpecialistRule {
    pub specialist: &'static str,
    pub keywords: &'static [&'static str],
}

/// Rules in priority order
pub const SPECIALIST_RULES: &[SpecialistRule] = &[
    SpecialistRule {
        specialist: "Dermatologist",
        keywords: &["psoriasis", "eczema", "rash", "dermat", "fungal", "skin"],
    },
    SpecialistRule {
        specialist: "Cardiologist",
        keywords: &["heart", "cardio", "hypertension", "chest pain", "heart attack"],
    },
    SpecialistRule {
        specialist: "Endocrinologist",
        keywords: &["diabetes", "insulin", "endocrin"],
    },
    SpecialistRule {
        specialist: "Pulmonologist",
        keywords: &["asthma", "pneumonia", "tuberculosis", "bronch", "copd"],
    },
    SpecialistRule {
        specialist: "Orthopedic",
        keywords: &["arthritis", "joint", "bone", "back pain"],
    },
    SpecialistRule {
        specialist: "Neurologist",
        keywords: &["migraine", "headache", "seizure", "neu"],
    },
    SpecialistRule {
        specialist: "Ophthalmologist",
        keywords: &["eye", "conjunct", "vision"],
    },
    SpecialistRule {
        specialist: "Gynecologist",
        keywords: &["preg", "obstet", "gyn", "uterus"],
    },
    SpecialistRule {
        specialist: "Gastroenterologist",
        keywords: &["stomach", "ulcer", "hepat", "liver", "gastr", "abdomen"],
    },
    SpecialistRule {
        specialist: "Nephrologist",
        keywords: &["urine", "urinary", "kidney"],
    },
];

/// Suggest a specialist for a disease name using [`SPECIALIST_RULES`]
pub fn suggest_specialist(disease: &str) -> &'static str {
    let lowered = disease.to_lowercase();
    SPECIALIST_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
        .map(|rule| rule.specialist)
        .unwrap_or(DEFAULT_SPECIALIST)
}

/// Disease to specialist lookup table
#[derive(Debug, Clone, Default)]
pub struct DoctorMapping {
    /// Insertion order, kept for writing the file back out
    diseases: Vec<String>,
    entries: HashMap<String, String>,
}

impl DoctorMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a mapping from the keyword heuristic
    pub fn generate<S: AsRef<str>>(diseases: &[S]) -> Self {
        let mut mapping = Self::new();
        for disease in diseases {
            let disease = disease.as_ref();
            mapping.insert(disease, suggest_specialist(disease));
        }
        mapping
    }

    /// Add or replace an entry
    pub fn insert(&mut self, disease: &str, specialist: &str) {
        if self
            .entries
            .insert(disease.to_string(), specialist.to_string())
            .is_none()
        {
            self.diseases.push(disease.to_string());
        }
    }

    /// Specialist for a disease, or [`DEFAULT_SPECIALIST`] when absent
    pub fn specialist_for(&self, disease: &str) -> &str {
        self.entries
            .get(disease)
            .map(String::as_str)
            .unwrap_or(DEFAULT_SPECIALIST)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.diseases
            .iter()
            .map(move |d| (d.as_str(), self.entries[d].as_str()))
    }

    /// Read a headerless `disease,specialist` CSV
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open doctor mapping {:?}", path))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        let mut mapping = Self::new();
        for (line, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("Failed to parse mapping line {}", line + 1))?;
            match (record.get(0), record.get(1)) {
                (Some(disease), Some(specialist)) if !disease.trim().is_empty() => {
                    mapping.insert(disease, specialist.trim());
                }
                _ => debug!("Skipping mapping line {}: {:?}", line + 1, record),
            }
        }

        info!("Loaded {} doctor mapping entries from {:?}", mapping.len(), path);
        Ok(mapping)
    }

    /// Write a headerless `disease,specialist` CSV
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(path)
            .with_context(|| format!("Failed to create doctor mapping {:?}", path))?;

        for (disease, specialist) in self.iter() {
            writer.write_record([disease, specialist])?;
        }
        writer.flush()?;

        info!("Saved {} doctor mapping entries to {:?}", self.len(), path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_skin_maps_to_dermatologist() {
        assert_eq!(suggest_specialist("Skin infection"), "Dermatologist");
        assert_eq!(suggest_specialist("Fungal infection"), "Dermatologist");
        assert_eq!(suggest_specialist("Psoriasis"), "Dermatologist");
    }

    #[test]
    fn test_no_match_is_general_physician() {
        assert_eq!(suggest_specialist("Malaria"), DEFAULT_SPECIALIST);
        assert_eq!(suggest_specialist("Common Cold"), DEFAULT_SPECIALIST);
        assert_eq!(suggest_specialist(""), DEFAULT_SPECIALIST);
    }

    #[test]
    fn test_rule_order_wins() {
        // "skin" and "heart": dermatology is checked first
        assert_eq!(suggest_specialist("Skin lesions of heart disease"), "Dermatologist");
        // "pneumonia" also contains "neu"
        assert_eq!(suggest_specialist("Pneumonia"), "Pulmonologist");
        // dataset spelling, no keyword matches
        assert_eq!(suggest_specialist("Osteoarthristis"), DEFAULT_SPECIALIST);
    }

    #[test]
    fn test_known_dataset_diseases() {
        let cases = [
            ("Hypertension ", "Cardiologist"),
            ("Heart attack", "Cardiologist"),
            ("Diabetes ", "Endocrinologist"),
            ("Bronchial Asthma", "Pulmonologist"),
            ("Tuberculosis", "Pulmonologist"),
            ("Arthritis", "Orthopedic"),
            ("Migraine", "Neurologist"),
            ("Hepatitis B", "Gastroenterologist"),
            ("Peptic ulcer diseae", "Gastroenterologist"),
            ("Urinary tract infection", "Nephrologist"),
            ("Dengue", DEFAULT_SPECIALIST),
        ];
        for (disease, expected) in cases {
            assert_eq!(suggest_specialist(disease), expected, "{}", disease);
        }
    }

    #[test]
    fn test_mapping_default_for_missing_entry() {
        let mapping = DoctorMapping::generate(&["Acne", "Malaria"]);
        assert_eq!(mapping.specialist_for("Acne"), DEFAULT_SPECIALIST);
        assert_eq!(mapping.specialist_for("Unknown disease"), DEFAULT_SPECIALIST);
    }

    #[test]
    fn test_save_load_round_trip_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("disease_doctor_mapping.csv");

        let mut mapping = DoctorMapping::generate(&["Fungal infection", "Migraine", "Malaria"]);
        mapping.insert("Malaria", "Infectious Disease Specialist");
        mapping.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Fungal infection,Dermatologist\n"));

        let loaded = DoctorMapping::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.specialist_for("Migraine"), "Neurologist");
        assert_eq!(loaded.specialist_for("Malaria"), "Infectious Disease Specialist");
        assert_eq!(
            loaded.iter().map(|(d, _)| d).collect::<Vec<_>>(),
            vec!["Fungal infection", "Migraine", "Malaria"]
        );
    }
}
