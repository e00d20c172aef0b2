mod common;

use std::sync::Arc;
use common::{init, quick_config, CountingStore};
use langdetect::interactive::InteractiveSession;
use langdetect::{
    load_or_reuse, predict_and_report, train, ClassificationRecord, ClassifierError, LoopState,
    PredictionView,
};
use tokio_test::assert_ok;

#[test]
fn test_predictions_follow_input_order() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let config = quick_config(dir.path());
    let model = train(&config, &config.training_path, &config.model_path)?;

    let texts = [
        "Bonjour, je m'appelle Dirk.",
        "Hi there, this is Dirk speaking.",
        "Ciao, mi chiamo Dirk.",
        "Hallo, mein Name ist Dirk.",
        "x",
    ];
    let records: Vec<ClassificationRecord> = texts.iter().map(|t| ClassificationRecord::unlabeled(*t)).collect();
    let batch = model.predict(&records)?;
    assert_eq!(batch.len(), texts.len());

    for (text, prediction) in texts.iter().zip(&batch) {
        let single = model.predict_text(text)?;
        assert_eq!(single.class_index, prediction.class_index);
        assert_eq!(single.label, prediction.label);
    }
    Ok(())
}

#[test]
fn test_report_lists_every_prediction() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let config = quick_config(dir.path());
    let model = train(&config, &config.training_path, &config.model_path)?;

    let long_text = "Il fait très beau aujourd'hui ".repeat(4);
    let records = vec![
        ClassificationRecord::unlabeled("Hola, mi nombre es Dirk."),
        ClassificationRecord::unlabeled(long_text.clone()),
    ];

    let mut out = Vec::new();
    let predictions = predict_and_report(&model, &records, PredictionView::Scores, &mut out)?;
    let printed = String::from_utf8(out)?;

    assert!(printed.contains("Classification Predictions"));
    assert_eq!(printed.matches("Prediction: ").count(), 2);
    assert!(printed.contains(&format!(
        "Prediction: {}-{} | Test: 'Hola, mi nombre es Dirk.'",
        predictions[0].class_index, predictions[0].label
    )));
    let shown: String = long_text.chars().take(75).collect();
    assert!(printed.contains(&format!("Test: '{}...'", shown)));
    for (i, name) in model.label_names()?.iter().enumerate() {
        assert_eq!(printed.matches(&format!("    {} {}: ", i, name)).count(), 2);
    }

    let mut compact = Vec::new();
    predict_and_report(&model, &records, PredictionView::Compact, &mut compact)?;
    let compact = String::from_utf8(compact)?;
    assert!(!compact.contains("    0 "));
    Ok(())
}

#[test]
fn test_empty_batch_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let config = quick_config(dir.path());
    let model = train(&config, &config.training_path, &config.model_path)?;
    assert!(matches!(model.predict(&[]), Err(ClassifierError::Validation(_))));
    Ok(())
}

#[test]
fn test_reuse_never_reads_the_artifact() -> Result<(), Box<dyn std::error::Error>> {
    init();
    let dir = tempfile::tempdir()?;
    let config = quick_config(dir.path());
    train(&config, &config.training_path, &config.model_path)?;

    let store = CountingStore::default();
    let model = load_or_reuse(&store, &config.model_path, None)?;
    assert_eq!(store.reads(), 1);

    let again = load_or_reuse(&store, &config.model_path, Some(Arc::clone(&model)))?;
    let third = load_or_reuse(&store, &config.model_path, Some(Arc::clone(&again)))?;
    assert!(Arc::ptr_eq(&model, &third));
    assert_eq!(store.reads(), 1);
    Ok(())
}

#[test]
fn test_missing_artifact_fails_without_predictions() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let store = CountingStore::default();
    let mut out = Vec::new();

    let mut session = InteractiveSession::new(&store, dir.path().join("nope.zip"), PredictionView::Scores);
    let result = session.classify(&[ClassificationRecord::unlabeled("Hello")], &mut out);

    assert!(matches!(result, Err(ClassifierError::ModelLoad(_))));
    assert!(out.is_empty());
    assert_eq!(store.reads(), 1);
}

#[tokio::test]
async fn test_blank_line_ends_the_loop() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let config = quick_config(dir.path());
    let model = Arc::new(assert_ok!(train(&config, &config.training_path, &config.model_path)));

    let store = CountingStore::default();
    let mut session = InteractiveSession::new(&store, &config.model_path, PredictionView::Compact).with_model(model);
    let mut out = Vec::new();
    let count = assert_ok!(session.run("Hello\n\nignored\n".as_bytes(), &mut out).await);

    assert_eq!(count, 1);
    assert_eq!(session.state(), LoopState::Terminated);
    assert_eq!(store.reads(), 0);
    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed.matches("Prediction: ").count(), 1);
    assert!(printed.contains("Test: 'Hello'"));
    assert!(!printed.contains("ignored"));
}

#[tokio::test]
async fn test_loop_loads_the_model_once() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let config = quick_config(dir.path());
    assert_ok!(train(&config, &config.training_path, &config.model_path));

    let store = CountingStore::default();
    let mut session = InteractiveSession::new(&store, &config.model_path, PredictionView::Scores);
    let mut out = Vec::new();
    let count = assert_ok!(
        session
            .run("Bonjour\nHallo\nCiao\nHola\n".as_bytes(), &mut out)
            .await
    );

    assert_eq!(count, 4);
    assert_eq!(store.reads(), 1);
    assert!(session.model().is_some());
}
