//! Application configuration.
//!
//! Values come from built-in defaults, optionally replaced by a TOML file and
//! then by command-line flags. A minimal file looks like:
//!
//! ```toml
//! training_path = "data/training.tsv"
//! test_path = "data/test.tsv"
//! model_path = "data/model.zip"
//! class_names = ["German", "English", "French", "Italian", "Romanian", "Spanish"]
//!
//! [featurizer]
//! char_ngrams = 3
//! max_features = 2000
//!
//! [trainer]
//! iterations = 50
//! max_depth = 4
//!
//! [evaluation]
//! top_k = 3
//!
//! [prediction]
//! view = "scores"
//! ```

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classifier::{FeaturizerConfig, LabelVocabulary, TrainerConfig};
use crate::data::RecordLoader;

/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "LANGDETECT_CONFIG";
/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "langdetect.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How predictions are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionView {
    /// Class index, label and text preview only
    Compact,
    /// Compact line followed by every class score
    #[default]
    Scores,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// `k` for top-k accuracy
    pub top_k: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub view: PredictionView,
    /// Sentences classified before the interactive loop starts
    pub sample_texts: Vec<String>,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            view: PredictionView::default(),
            sample_texts: vec![
                "Hi there, this is Dirk speaking.".into(),
                "Hallo, mein Name ist Dirk.".into(),
                "Hola, mi nombre es Dirk.".into(),
                "Ciao, mi chiamo Dirk.".into(),
                "Bună ziua, numele meu este Dirk.".into(),
                "Bonjour, je m'appelle Dirk.".into(),
            ],
        }
    }
}

/// Everything both drivers need, passed in explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub training_path: PathBuf,
    pub test_path: PathBuf,
    pub model_path: PathBuf,
    /// Fixes the class index order at training time. The trained model keeps
    /// its own copy; prediction never reads this field.
    pub class_names: Option<Vec<String>>,
    pub data: RecordLoader,
    pub featurizer: FeaturizerConfig,
    pub trainer: TrainerConfig,
    pub evaluation: EvaluationConfig,
    pub prediction: PredictionConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            training_path: PathBuf::from("data").join("training.tsv"),
            test_path: PathBuf::from("data").join("test.tsv"),
            model_path: PathBuf::from("data").join("model.zip"),
            class_names: None,
            data: RecordLoader::default(),
            featurizer: FeaturizerConfig::default(),
            trainer: TrainerConfig::default(),
            evaluation: EvaluationConfig::default(),
            prediction: PredictionConfig::default(),
        }
    }
}

/// Path overrides taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub training_path: Option<PathBuf>,
    pub test_path: Option<PathBuf>,
    pub model_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Picks the configuration file to use, in order of preference:
    /// 1. `explicit` (from `--config`)
    /// 2. the `LANGDETECT_CONFIG` environment variable
    /// 3. `langdetect.toml` in `cwd`, if it exists
    /// 4. `langdetect/config.toml` under the platform config directory, if it exists
    pub fn resolve_path(
        explicit: Option<&Path>,
        env_value: Option<OsString>,
        cwd: &Path,
        config_dir: Option<PathBuf>,
    ) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Some(value) = env_value.filter(|v| !v.is_empty()) {
            return Some(PathBuf::from(value));
        }
        let local = cwd.join(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }
        config_dir
            .map(|dir| dir.join("langdetect").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Loads the configuration from the first file found by
    /// [`AppConfig::resolve_path`], or returns defaults when there is none.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        match Self::resolve_path(explicit, env::var_os(CONFIG_ENV_VAR), &cwd, dirs::config_dir()) {
            Some(path) => {
                info!("Using configuration from {:?}", path);
                Self::from_file(&path)
            }
            None => {
                info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn with_overrides(mut self, overrides: PathOverrides) -> Self {
        if let Some(path) = overrides.training_path {
            self.training_path = path;
        }
        if let Some(path) = overrides.test_path {
            self.test_path = path;
        }
        if let Some(path) = overrides.model_path {
            self.model_path = path;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, path) in [
            ("training_path", &self.training_path),
            ("test_path", &self.test_path),
            ("model_path", &self.model_path),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(format!("{} cannot be empty", name)));
            }
        }
        if let Some(names) = &self.class_names {
            LabelVocabulary::from_names(names.clone()).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        self.featurizer
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.trainer
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.evaluation.top_k == 0 {
            return Err(ConfigError::Invalid("evaluation.top_k must be at least 1".into()));
        }
        if let Some(i) = self.prediction.sample_texts.iter().position(|t| t.is_empty()) {
            return Err(ConfigError::Invalid(format!("prediction.sample_texts[{}] cannot be empty", i)));
        }
        Ok(())
    }
}
