//! Tab-separated training and test records.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use csv::ReaderBuilder;
use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierError;

/// One input example: the text to classify and, for training and evaluation
/// data, its ground-truth label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub label: Option<String>,
    pub text: String,
}

impl ClassificationRecord {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            text: text.into(),
        }
    }

    pub fn unlabeled(text: impl Into<String>) -> Self {
        Self {
            label: None,
            text: text.into(),
        }
    }
}

/// Schema-bound loader for `label<TAB>text` files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordLoader {
    /// Skip the first row
    pub has_header: bool,
}

impl RecordLoader {
    pub fn tsv() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Reads every record from `path`.
    ///
    /// # Errors
    /// - `DataSchema` if the file cannot be opened, a row does not have
    ///   exactly two columns, a label is empty, or the file has no records
    pub fn load(&self, path: &Path) -> Result<Vec<ClassificationRecord>, ClassifierError> {
        let file = File::open(path).map_err(|e| {
            error!("Failed to open data file {:?}: {}", path, e);
            ClassifierError::DataSchema(format!("Cannot open data file {}: {}", path.display(), e))
        })?;
        let records = self.read(file, &path.display().to_string())?;
        info!("Loaded {} records from {:?}", records.len(), path);
        Ok(records)
    }

    /// Reads records from any reader; `source` names it in error messages.
    pub fn read<R: Read>(&self, reader: R, source: &str) -> Result<Vec<ClassificationRecord>, ClassifierError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(self.has_header)
            .quoting(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row.map_err(|e| {
                ClassifierError::DataSchema(format!("{}: unreadable row: {}", source, e))
            })?;
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            if row.len() != 2 {
                return Err(ClassifierError::DataSchema(format!(
                    "{} line {}: expected 2 tab-separated columns (label, text), found {}",
                    source,
                    line,
                    row.len()
                )));
            }
            let label = row[0].trim();
            if label.is_empty() {
                return Err(ClassifierError::DataSchema(format!(
                    "{} line {}: label is empty",
                    source, line
                )));
            }
            records.push(ClassificationRecord::new(label, &row[1]));
        }

        if records.is_empty() {
            return Err(ClassifierError::DataSchema(format!("{} contains no records", source)));
        }
        Ok(records)
    }
}
