mod common;

use common::{init, quick_config, CountingStore, LANGUAGES, TEST_ROWS, TRAINING_ROWS};
use langdetect::training::{pipeline_from_config, train_with_store};
use langdetect::{
    artifact, evaluate, train, ClassPrediction, ClassificationRecord, ClassifierError, FsModelStore,
};

fn training_records() -> Vec<ClassificationRecord> {
    TRAINING_ROWS
        .iter()
        .map(|(label, text)| ClassificationRecord::new(*label, *text))
        .collect()
}

fn assert_same_predictions(left: &[ClassPrediction], right: &[ClassPrediction]) {
    assert_eq!(left.len(), right.len());
    for (a, b) in left.iter().zip(right) {
        assert_eq!(a.class_index, b.class_index);
        assert_eq!(a.label, b.label);
        for (x, y) in a.scores.iter().zip(b.scores.iter()) {
            assert!((x - y).abs() < 1e-6, "{} vs {}", x, y);
        }
    }
}

#[test]
fn test_train_save_load_predict_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let config = quick_config(dir.path());

    let trained = train(&config, &config.training_path, &config.model_path)?;
    assert!(config.model_path.is_file());

    let loaded = artifact::load(&FsModelStore, &config.model_path)?;
    assert_eq!(loaded.label_names()?, trained.label_names()?);
    assert_eq!(loaded.metadata(), trained.metadata());

    let records = training_records();
    let before = trained.predict(&records)?;
    let after = loaded.predict(&records)?;
    assert_same_predictions(&before, &after);
    Ok(())
}

#[test]
fn test_training_is_deterministic() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let config = quick_config(dir.path());
    let records = training_records();

    let first = pipeline_from_config(&config)?.train_records(&records)?;
    let second = pipeline_from_config(&config)?.train_records(&records)?;
    assert_eq!(first.featurizer().terms(), second.featurizer().terms());
    assert_eq!(first.predict(&records)?, second.predict(&records)?);
    Ok(())
}

#[test]
fn test_vocabulary_travels_with_the_artifact() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let mut config = quick_config(dir.path());
    let mut reversed: Vec<String> = LANGUAGES.iter().rev().map(|s| s.to_string()).collect();
    config.class_names = Some(reversed.clone());

    train(&config, &config.training_path, &config.model_path)?;

    // Changing the configured order afterwards must not affect the stored model
    reversed.sort();
    config.class_names = Some(reversed);
    let loaded = artifact::load(&FsModelStore, &config.model_path)?;
    let expected: Vec<String> = LANGUAGES.iter().rev().map(|s| s.to_string()).collect();
    assert_eq!(loaded.label_names()?, expected.as_slice());

    for prediction in loaded.predict(&training_records())? {
        assert_eq!(prediction.label, expected[prediction.class_index]);
        assert_eq!(prediction.scores.len(), expected.len());
        let total: f32 = prediction.scores.sum();
        assert!((total - 1.0).abs() < 1e-4);
    }
    Ok(())
}

#[test]
fn test_unknown_label_with_fixed_class_names() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let mut config = quick_config(dir.path());
    config.class_names = Some(vec!["English".into(), "German".into()]);

    let result = train(&config, &config.training_path, &config.model_path);
    assert!(matches!(result, Err(ClassifierError::DataSchema(_))));
    assert!(!config.model_path.exists());
}

#[test]
fn test_retraining_overwrites_artifact() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let mut config = quick_config(dir.path());
    let store = CountingStore::default();

    train_with_store(&store, &config, &config.training_path, &config.model_path)?;
    config.trainer.iterations = 3;
    let second = train_with_store(&store, &config, &config.training_path, &config.model_path)?;

    let loaded = artifact::load(&store, &config.model_path)?;
    assert_eq!(loaded.metadata(), second.metadata());
    assert_eq!(store.reads(), 1);
    Ok(())
}

#[test]
fn test_evaluate_reports_every_class() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let config = quick_config(dir.path());
    let model = train(&config, &config.training_path, &config.model_path)?;

    let mut out = Vec::new();
    let metrics = evaluate(&model, &config, &config.test_path, &mut out)?;
    assert_eq!(metrics.per_class_support, vec![1; LANGUAGES.len()]);
    assert_eq!(metrics.confusion_matrix.sum(), TEST_ROWS.len());
    assert!((0.0..=1.0).contains(&metrics.accuracy_micro));
    assert!(metrics.top_k_accuracy >= metrics.accuracy_micro);
    assert!(metrics.log_loss > 0.0);

    let printed = String::from_utf8(out)?;
    for language in LANGUAGES {
        assert!(printed.contains(&format!("({})", language)));
    }
    Ok(())
}
