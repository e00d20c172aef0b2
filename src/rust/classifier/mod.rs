mod booster;
mod builder;
mod error;
mod featurizer;
mod labels;
mod model;
pub(crate) mod utils;

pub use booster::{BoostedTreeClassifier, TrainerConfig};
pub use builder::{Pipeline, PipelineBuilder, PipelineStage};
pub use error::ClassifierError;
pub use featurizer::{FeaturizerConfig, TextFeaturizer};
pub use labels::LabelVocabulary;
pub use model::{ClassPrediction, Model, ModelInfo, ModelMetadata, FORMAT_VERSION};
