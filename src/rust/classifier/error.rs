use std::io;
use thiserror::Error;

/// Represents the different types of errors that can occur while training or
/// running the language classifier.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Training or test data is missing, malformed, empty, or carries a label
    /// the model does not know
    #[error("Data schema error: {0}")]
    DataSchema(String),
    /// The model artifact is missing, corrupt, or written by an incompatible version
    #[error("Model load error: {0}")]
    ModelLoad(String),
    /// A loaded model disagrees with itself (e.g. no label vocabulary)
    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),
    /// Error occurred while normalizing or splitting text
    #[error("Featurization error: {0}")]
    Featurization(String),
    /// Error occurred during the pipeline build phase
    #[error("Build error: {0}")]
    Build(String),
    /// The trainer could not produce a model from the given data
    #[error("Training error: {0}")]
    Training(String),
    /// Error occurred due to invalid input parameters
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<tokenizers::Error> for ClassifierError {
    fn from(err: tokenizers::Error) -> Self {
        ClassifierError::Featurization(err.to_string())
    }
}
