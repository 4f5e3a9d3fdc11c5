//! Labeled CSV dataset loading
//!
//! Files are decoded as UTF-8 first and re-decoded as Latin-1 when that
//! fails; spam corpora routinely carry non-UTF-8 bytes. An optional
//! augmentation file with the same columns is appended to the base rows.

use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{Config, DataConfig};
use crate::error::{Result, SpamError};

/// One labeled message as read from disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Raw text; `None` when the cell was empty or missing
    pub text: Option<String>,
    pub label: String,
}

/// Ordered collection of labeled messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    documents: Vec<Document>,
}

impl Dataset {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn texts(&self) -> impl Iterator<Item = Option<&str>> {
        self.documents.iter().map(|d| d.text.as_deref())
    }

    pub fn labels(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.label.clone()).collect()
    }

    /// Rows per label, sorted by label
    pub fn class_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for doc in &self.documents {
            *counts.entry(doc.label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Append rows (concatenation, no deduplication)
    pub fn append(&mut self, other: Dataset) {
        self.documents.extend(other.documents);
    }
}

/// Encoding a file was successfully decoded with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Latin1,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

/// Decode bytes as UTF-8, falling back once to Latin-1
pub fn decode(bytes: Vec<u8>) -> (String, TextEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, TextEncoding::Utf8),
        Err(err) => {
            // Latin-1 maps every byte to the code point of the same value
            let text = err.into_bytes().into_iter().map(char::from).collect();
            (text, TextEncoding::Latin1)
        }
    }
}

/// Reads the configured dataset and its optional augmentation set
pub struct DataLoader {
    config: DataConfig,
    augment_path: PathBuf,
}

impl DataLoader {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.data.clone(),
            augment_path: config.augment_data_path(),
        }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Load the base dataset, then append the augmentation set if one is usable
    pub fn load_data(&self) -> Result<Dataset> {
        let mut dataset = self.read_csv(Path::new(&self.config.raw_data_path))?;
        info!(
            "Data loaded successfully from {}: {} rows",
            self.config.raw_data_path,
            dataset.len()
        );

        if self.augment_path.exists() {
            match self.read_csv(&self.augment_path) {
                Ok(extra) => {
                    info!(
                        "Appended {} augmentation rows from {}",
                        extra.len(),
                        self.augment_path.display()
                    );
                    dataset.append(extra);
                }
                Err(e) => {
                    let e = SpamError::Augmentation(e.to_string());
                    warn!(
                        "Skipping augmentation file {}: {}",
                        self.augment_path.display(),
                        e
                    );
                }
            }
        }

        if dataset.is_empty() {
            return Err(SpamError::Data(format!(
                "no labeled rows in {}",
                self.config.raw_data_path
            )));
        }

        Ok(dataset)
    }

    /// Read one CSV file with the configured text and label columns
    pub fn read_csv(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(SpamError::Data(format!("File not found at {}", path.display())));
        }

        let bytes = std::fs::read(path)?;
        let (content, encoding) = decode(bytes);
        if encoding != TextEncoding::Utf8 {
            warn!(
                "UTF-8 decoding failed for {}, read as {}",
                path.display(),
                encoding
            );
        }

        self.parse_csv(&content)
            .map_err(|e| SpamError::Data(format!("{}: {}", path.display(), e)))
    }

    fn parse_csv(&self, content: &str) -> Result<Dataset> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| SpamError::Data(format!("missing column '{}'", name)))
        };
        let text_idx = column(&self.config.text_column)?;
        let label_idx = column(&self.config.label_column)?;

        let mut documents = Vec::new();
        let mut unlabeled = 0usize;
        for record in reader.records() {
            let record = record?;
            let label = record.get(label_idx).map(str::trim).unwrap_or_default();
            if label.is_empty() {
                unlabeled += 1;
                continue;
            }
            let text = record
                .get(text_idx)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            documents.push(Document {
                text,
                label: label.to_string(),
            });
        }

        if unlabeled > 0 {
            warn!("Dropped {} rows without a label", unlabeled);
        }

        Ok(Dataset::new(documents))
    }
}
