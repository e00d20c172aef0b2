//! Training driver: train, persist, evaluate.

use std::io::Write;
use std::path::Path;
use std::time::Instant;
use log::{error, info};

use crate::artifact::{self, FsModelStore, ModelStore};
use crate::classifier::{ClassifierError, Model, Pipeline};
use crate::config::AppConfig;
use crate::evaluation::MetricsSummary;

/// Assembles the training pipeline described by `config`.
pub fn pipeline_from_config(config: &AppConfig) -> Result<Pipeline, ClassifierError> {
    Pipeline::builder()
        .with_loader(config.data.clone())
        .with_label_dictionary(config.class_names.clone())
        .with_text_featurizer(config.featurizer.clone())
        .with_trainer(config.trainer.clone())
        .build()
}

/// Trains on `training_file` and writes the artifact to `model_path`,
/// replacing whatever was there.
pub fn train(config: &AppConfig, training_file: &Path, model_path: &Path) -> Result<Model, ClassifierError> {
    train_with_store(&FsModelStore, config, training_file, model_path)
}

pub fn train_with_store<S: ModelStore + ?Sized>(
    store: &S,
    config: &AppConfig,
    training_file: &Path,
    model_path: &Path,
) -> Result<Model, ClassifierError> {
    let pipeline = pipeline_from_config(config)?;

    let start = Instant::now();
    info!("Training on {:?}...", training_file);
    let model = pipeline.train_file(training_file)?;
    info!(
        "Training finished in {:.2?}: {} classes, {} features",
        start.elapsed(),
        model.metadata().class_count,
        model.metadata().feature_count
    );

    artifact::save(store, &model, model_path)?;
    Ok(model)
}

/// Scores every record of `test_file`, writes the metrics block to `out` and
/// returns the summary. The model is only read.
///
/// # Errors
/// - `DataSchema` if the file cannot be loaded or holds a label the model
///   never saw
/// - `Io` if writing to `out` fails
pub fn evaluate<W: Write>(
    model: &Model,
    config: &AppConfig,
    test_file: &Path,
    out: &mut W,
) -> Result<MetricsSummary, ClassifierError> {
    let records = config.data.load(test_file)?;
    let names = model.label_names()?;

    let truth: Vec<usize> = records
        .iter()
        .enumerate()
        .map(|(i, record)| {
            let label = record.label.as_deref().unwrap_or_default();
            names.iter().position(|n| n == label).ok_or_else(|| {
                error!("Test record {} has unknown label {:?}", i + 1, label);
                ClassifierError::DataSchema(format!(
                    "{} record {}: label {:?} is not one of the model's classes {:?}",
                    test_file.display(),
                    i + 1,
                    label,
                    names
                ))
            })
        })
        .collect::<Result<_, _>>()?;

    let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
    let scores = model.score_texts(&texts)?;
    let metrics = MetricsSummary::compute(&truth, scores.view(), names, config.evaluation.top_k)?;

    write!(out, "{}", metrics)?;
    out.flush()?;
    Ok(metrics)
}
