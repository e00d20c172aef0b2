//! Prediction driver: load (or reuse) a model and print predictions.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use log::{debug, info};

use crate::artifact::{self, ModelStore};
use crate::classifier::{ClassPrediction, ClassifierError, Model};
use crate::config::PredictionView;
use crate::data::ClassificationRecord;

/// Texts longer than this are truncated in the prediction table.
pub const PREVIEW_LIMIT: usize = 80;
/// Characters kept from a truncated text.
pub const PREVIEW_KEEP: usize = 75;

/// Returns `existing` untouched if given, otherwise reads the artifact at
/// `model_path` through `store`.
///
/// # Errors
/// - `ModelLoad` if the artifact is missing, corrupt or of another format version
pub fn load_or_reuse<S: ModelStore + ?Sized>(
    store: &S,
    model_path: &Path,
    existing: Option<Arc<Model>>,
) -> Result<Arc<Model>, ClassifierError> {
    match existing {
        Some(model) => {
            debug!("Reusing the loaded model");
            Ok(model)
        }
        None => {
            info!("Loading model from {:?}", model_path);
            artifact::load(store, model_path).map(Arc::new)
        }
    }
}

/// Shortens long texts for display. Lengths count characters, not bytes.
pub fn preview(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= PREVIEW_LIMIT {
        return Cow::Borrowed(text);
    }
    let mut shown: String = text.chars().take(PREVIEW_KEEP).collect();
    shown.push_str("...");
    Cow::Owned(shown)
}

/// Classifies `records` and writes the prediction table to `out`. The
/// returned predictions line up index-for-index with `records`.
pub fn predict_and_report<W: Write>(
    model: &Model,
    records: &[ClassificationRecord],
    view: PredictionView,
    out: &mut W,
) -> Result<Vec<ClassPrediction>, ClassifierError> {
    let predictions = model.predict(records)?;
    let names = model.label_names()?;

    writeln!(out)?;
    writeln!(out, "Classification Predictions")?;
    writeln!(out, "--------------------------")?;
    for (record, prediction) in records.iter().zip(&predictions) {
        writeln!(
            out,
            "Prediction: {}-{} | Test: '{}'",
            prediction.class_index,
            prediction.label,
            preview(&record.text)
        )?;
        if view == PredictionView::Scores {
            for (i, (name, score)) in names.iter().zip(prediction.scores.iter()).enumerate() {
                writeln!(out, "    {} {}: {:.4}", i, name, score)?;
            }
        }
    }
    writeln!(out)?;
    out.flush()?;
    Ok(predictions)
}
