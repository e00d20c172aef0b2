//! A language detector built from a gradient-boosted-tree text classifier.
//!
//! Training reads `label<TAB>text` records, fits a bag-of-n-grams featurizer
//! and one boosted-tree ensemble per language, and writes everything (label
//! vocabulary included) to a single zip artifact. Prediction reads the
//! artifact once and classifies any number of texts with it.
//!
//! # Basic Usage
//!
//! ```rust
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use langdetect::{ClassificationRecord, FeaturizerConfig, Pipeline, TrainerConfig};
//!
//! let records = vec![
//!     ClassificationRecord::new("German", "Hallo, mein Name ist Dirk."),
//!     ClassificationRecord::new("German", "Wie geht es dir?"),
//!     ClassificationRecord::new("English", "Hi there, this is Dirk speaking."),
//!     ClassificationRecord::new("English", "How are you?"),
//! ];
//!
//! let model = Pipeline::builder()
//!     .with_text_featurizer(FeaturizerConfig::default())
//!     .with_trainer(TrainerConfig::default())
//!     .build()?
//!     .train_records(&records)?;
//!
//! let prediction = model.predict_text("Wie heißt du?")?;
//! println!("{} ({:.2})", prediction.label, prediction.confidence());
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! [`Model`] is `Send + Sync`; share it with `Arc` to predict from several
//! threads without reloading the artifact.

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod data;
pub mod evaluation;
pub mod interactive;
pub mod prediction;
pub mod training;

pub use artifact::{FsModelStore, ModelStore};
pub use classifier::{
    ClassPrediction, ClassifierError, FeaturizerConfig, LabelVocabulary, Model, ModelInfo,
    ModelMetadata, Pipeline, PipelineBuilder, PipelineStage, TrainerConfig,
};
pub use config::{AppConfig, ConfigError, PathOverrides, PredictionView};
pub use data::{ClassificationRecord, RecordLoader};
pub use evaluation::MetricsSummary;
pub use interactive::{InteractiveSession, LoopState};
pub use prediction::{load_or_reuse, predict_and_report, preview};
pub use training::{evaluate, train};

/// Installs the `env_logger` backend with an `info` default; `RUST_LOG`
/// overrides it. Calling it twice is harmless.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
