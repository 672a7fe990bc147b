use crate::data::{SplitTables, SymptomRecord, SymptomSchema, SymptomTable, LABEL_COLUMN, UNNAMED_PREFIX};
use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

/// Supported file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Csv,
    Tsv,
    GzippedCsv,
    GzippedTsv,
}

impl FileFormat {
    /// Detect file format from path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let ext = path.extension().and_then(|e| e.to_str());
        let stem = path.file_stem().and_then(|s| s.to_str());

        match (ext, stem) {
            (Some("gz"), Some(stem)) => {
                if stem.ends_with(".csv") {
                    Ok(FileFormat::GzippedCsv)
                } else if stem.ends_with(".tsv") || stem.ends_with(".txt") {
                    Ok(FileFormat::GzippedTsv)
                } else {
                    Err(anyhow!("Cannot determine format of gzipped file {:?}", path))
                }
            }
            (Some("csv"), _) => Ok(FileFormat::Csv),
            (Some("tsv"), _) | (Some("txt"), _) => Ok(FileFormat::Tsv),
            _ => Err(anyhow!("Unsupported file format: {:?}", path)),
        }
    }

    /// Get delimiter character
    pub fn delimiter(&self) -> u8 {
        match self {
            FileFormat::Csv | FileFormat::GzippedCsv => b',',
            FileFormat::Tsv | FileFormat::GzippedTsv => b'\t',
        }
    }

    /// Check if format is gzipped
    pub fn is_gzipped(&self) -> bool {
        matches!(self, FileFormat::GzippedCsv | FileFormat::GzippedTsv)
    }
}

/// Data loader configuration
#[derive(Debug, Clone)]
struct LoaderConfig {
    /// Name of the disease label column
    label_column: String,
    /// Drop columns with an empty or `Unnamed...` header
    drop_unnamed: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            label_column: LABEL_COLUMN.to_string(),
            drop_unnamed: true,
        }
    }
}

/// Loader for symptom/label tables
pub struct DataLoader {
    config: LoaderConfig,
}

impl DataLoader {
    /// Create new data loader with default config
    pub fn new() -> Self {
        Self {
            config: LoaderConfig::default(),
        }
    }

    /// Load the training and testing tables, with the test columns
    /// reindexed onto the training schema.
    pub fn load_split<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        train_path: P,
        test_path: Q,
    ) -> Result<SplitTables> {
        let train = self
            .load(train_path.as_ref())
            .with_context(|| format!("Failed to load training data from {:?}", train_path.as_ref()))?;
        let test = self
            .load(test_path.as_ref())
            .with_context(|| format!("Failed to load testing data from {:?}", test_path.as_ref()))?;

        let missing: Vec<&String> = train
            .schema
            .names()
            .iter()
            .filter(|name| !test.schema.contains(name))
            .collect();
        if !missing.is_empty() {
            warn!("{} training columns absent from test data, filled with 0", missing.len());
            debug!("Absent columns: {:?}", missing);
        }

        let test = test.align_to(&train.schema);
        info!(
            "Train: {} rows, test: {} rows, {} symptoms",
            train.len(),
            test.len(),
            train.schema.len()
        );

        Ok(SplitTables { train, test })
    }

    /// Load one table from file
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<SymptomTable> {
        let path = path.as_ref();
        info!("Loading data from {:?}", path);

        let format = FileFormat::from_path(path)?;
        debug!("Detected file format: {:?}", format);

        let table = if format.is_gzipped() {
            let file = File::open(path).context("Failed to open gzipped file")?;
            self.parse_table(BufReader::new(GzDecoder::new(file)), format)?
        } else {
            let file = File::open(path).context("Failed to open file")?;
            self.parse_table(BufReader::new(file), format)?
        };

        info!("Loaded {} records", table.len());
        Ok(table)
    }

    /// Parse a table from reader
    fn parse_table<R: Read>(&self, reader: R, format: FileFormat) -> Result<SymptomTable> {
        let mut csv_reader = ReaderBuilder::new()
            .delimiter(format.delimiter())
            .has_headers(true)
            .from_reader(reader);

        let headers = dedupe_headers(csv_reader.headers()?.iter());

        let label_idx = headers
            .iter()
            .position(|h| h == &self.config.label_column)
            .with_context(|| format!("Missing label column: {}", self.config.label_column))?;

        // (column index, name) of every feature column kept
        let feature_columns: Vec<(usize, String)> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != label_idx)
            .filter(|(_, h)| !(self.config.drop_unnamed && is_unnamed(h)))
            .map(|(i, h)| (i, h.clone()))
            .collect();

        let dropped = headers.len() - feature_columns.len() - 1;
        if dropped > 0 {
            debug!("Dropped {} unnamed column(s)", dropped);
        }

        let schema = SymptomSchema::new(feature_columns.iter().map(|(_, h)| h.clone()).collect())
            .context("Invalid symptom header")?;
        let mut records = Vec::new();

        for (row, result) in csv_reader.records().enumerate() {
            // header is line 1
            let line = row + 2;
            let record = result.with_context(|| format!("Failed to parse CSV record at line {}", line))?;

            // labels are kept verbatim, trailing spaces included
            let label = record
                .get(label_idx)
                .filter(|l| !l.trim().is_empty())
                .with_context(|| format!("Missing label at line {}", line))?
                .to_string();

            let features = feature_columns
                .iter()
                .map(|(i, name)| parse_indicator(record.get(*i).unwrap_or(""), name, line))
                .collect::<Result<Vec<f32>>>()?;

            records.push(SymptomRecord { features, label });
        }

        Ok(SymptomTable::new(schema, records))
    }
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_unnamed(header: &str) -> bool {
    header.trim().is_empty() || header.starts_with(UNNAMED_PREFIX)
}

fn parse_indicator(raw: &str, column: &str, line: usize) -> Result<f32> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0.0);
    }
    match raw.parse::<f32>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => bail!("Non-numeric value '{}' in column '{}' at line {}", raw, column, line),
    }
}

/// Rename repeated headers `name`, `name.1`, `name.2`, ...
///
/// The suffix skips any name already taken, so the result is always unique.
fn dedupe_headers<'a, I: Iterator<Item = &'a str>>(headers: I) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    headers
        .map(|h| {
            let mut name = h.to_string();
            let mut suffix = 1;
            while used.contains(&name) {
                name = format!("{}.{}", h, suffix);
                suffix += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}
