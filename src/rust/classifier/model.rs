use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::booster::BoostedTreeClassifier;
use super::error::ClassifierError;
use super::featurizer::TextFeaturizer;
use super::labels::LabelVocabulary;
use super::utils::argmax;
use crate::data::ClassificationRecord;

/// Version of the on-disk artifact layout this build reads and writes.
pub const FORMAT_VERSION: u32 = 1;

/// Descriptive fields stored alongside a trained model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub format_version: u32,
    pub crate_version: String,
    pub created_at: DateTime<Utc>,
    pub training_rows: usize,
    pub feature_count: usize,
    pub class_count: usize,
}

impl ModelMetadata {
    pub(crate) fn new(training_rows: usize, feature_count: usize, class_count: usize) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            training_rows,
            feature_count,
            class_count,
        }
    }
}

/// One prediction: the winning class and the full score distribution.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassPrediction {
    /// Index into the model's label vocabulary
    pub class_index: usize,
    /// Original label string for `class_index`
    pub label: String,
    /// Per-class scores in vocabulary order, summing to one
    pub scores: Array1<f32>,
}

impl ClassPrediction {
    /// Score of the predicted class.
    pub fn confidence(&self) -> f32 {
        self.scores[self.class_index]
    }

    /// Class indices of the `k` highest scores, best first.
    pub fn top_k(&self, k: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.scores.len()).collect();
        order.sort_by(|&a, &b| {
            self.scores[b]
                .partial_cmp(&self.scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.cmp(&b))
        });
        order.truncate(k);
        order
    }
}

/// Summary of a loaded model, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    pub class_labels: Vec<String>,
    pub num_classes: usize,
    pub feature_count: usize,
    pub metadata: ModelMetadata,
}

/// A trained language classifier: label vocabulary, fitted featurizer and
/// boosted-tree ensembles.
///
/// # Thread Safety
///
/// All fields are plain owned data, so the model is `Send + Sync` and can be
/// shared behind an `Arc` for repeated predictions.
#[derive(Debug)]
pub struct Model {
    pub(crate) labels: LabelVocabulary,
    pub(crate) featurizer: TextFeaturizer,
    pub(crate) booster: BoostedTreeClassifier,
    pub(crate) metadata: ModelMetadata,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Model>();
    }
};

impl Model {
    pub(crate) fn from_parts(
        labels: LabelVocabulary,
        featurizer: TextFeaturizer,
        booster: BoostedTreeClassifier,
        metadata: ModelMetadata,
    ) -> Self {
        Self {
            labels,
            featurizer,
            booster,
            metadata,
        }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn featurizer(&self) -> &TextFeaturizer {
        &self.featurizer
    }

    /// Returns the label names in class index order.
    ///
    /// # Errors
    /// - `InternalConsistency` if the vocabulary is empty or its size differs
    ///   from the number of trained classes; scores could not be named safely
    pub fn label_names(&self) -> Result<&[String], ClassifierError> {
        if self.labels.is_empty() {
            return Err(ClassifierError::InternalConsistency(
                "Model has no label vocabulary".into(),
            ));
        }
        if self.labels.len() != self.booster.num_classes() {
            return Err(ClassifierError::InternalConsistency(format!(
                "Label vocabulary has {} entries but the classifier scores {} classes",
                self.labels.len(),
                self.booster.num_classes()
            )));
        }
        Ok(self.labels.names())
    }

    /// Returns information about the model's current state
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            class_labels: self.labels.names().to_vec(),
            num_classes: self.labels.len(),
            feature_count: self.featurizer.dimension(),
            metadata: self.metadata.clone(),
        }
    }

    /// Scores texts, returning a `[texts, classes]` matrix aligned with
    /// [`Model::label_names`].
    pub fn score_texts<S: AsRef<str>>(&self, texts: &[S]) -> Result<Array2<f32>, ClassifierError> {
        self.label_names()?;
        let features = self.featurizer.transform_batch(texts)?;
        self.booster.score_batch(features.view())
    }

    /// Classifies a batch of records. The `i`-th prediction belongs to the
    /// `i`-th record; labels on the records are ignored.
    ///
    /// # Errors
    /// - `Validation` if the batch is empty or a record has empty text
    /// - `InternalConsistency` if the label vocabulary cannot be used
    pub fn predict(&self, records: &[ClassificationRecord]) -> Result<Vec<ClassPrediction>, ClassifierError> {
        if records.is_empty() {
            return Err(ClassifierError::Validation("Prediction batch cannot be empty".into()));
        }
        if let Some(pos) = records.iter().position(|r| r.text.is_empty()) {
            return Err(ClassifierError::Validation(format!(
                "Record {} has empty text",
                pos + 1
            )));
        }

        let names = self.label_names()?;
        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let scores = self.score_texts(&texts)?;

        scores
            .outer_iter()
            .map(|row| {
                let class_index = argmax(row).ok_or_else(|| {
                    ClassifierError::InternalConsistency("Classifier produced no scores".into())
                })?;
                Ok(ClassPrediction {
                    class_index,
                    label: names[class_index].clone(),
                    scores: row.to_owned(),
                })
            })
            .collect()
    }

    /// Classifies a single text.
    pub fn predict_text(&self, text: &str) -> Result<ClassPrediction, ClassifierError> {
        let mut predictions = self.predict(&[ClassificationRecord::unlabeled(text)])?;
        predictions
            .pop()
            .ok_or_else(|| ClassifierError::InternalConsistency("Missing prediction".into()))
    }
}
