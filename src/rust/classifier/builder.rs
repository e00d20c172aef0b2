use std::path::Path;
use log::{error, info};

use super::booster::{BoostedTreeClassifier, TrainerConfig};
use super::error::ClassifierError;
use super::featurizer::{FeaturizerConfig, TextFeaturizer};
use super::labels::LabelVocabulary;
use super::model::{Model, ModelMetadata};
use crate::data::{ClassificationRecord, RecordLoader};

/// One step of the training pipeline. A pipeline must contain exactly these
/// stages, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineStage {
    /// Reads `label<TAB>text` records
    Loader(RecordLoader),
    /// Maps label strings to class indices, optionally in a fixed order
    Dictionarizer { class_names: Option<Vec<String>> },
    /// Turns text into feature vectors
    Featurizer(FeaturizerConfig),
    /// Fits the boosted-tree classifier
    Trainer(TrainerConfig),
    /// Maps predicted indices back to the original label strings
    LabelConverter,
}

impl PipelineStage {
    fn name(&self) -> &'static str {
        match self {
            Self::Loader(_) => "loader",
            Self::Dictionarizer { .. } => "dictionarizer",
            Self::Featurizer(_) => "featurizer",
            Self::Trainer(_) => "trainer",
            Self::LabelConverter => "label converter",
        }
    }
}

const STAGE_ORDER: [&str; 5] = ["loader", "dictionarizer", "featurizer", "trainer", "label converter"];

/// A builder for assembling a training [`Pipeline`] with a fluent interface.
///
/// Stages are appended in call order. The convenience methods add the
/// default loader, dictionarizer and label converter around the featurizer
/// and trainer, so the common case reads:
///
/// ```
/// use langdetect::{Pipeline, FeaturizerConfig, TrainerConfig};
///
/// let pipeline = Pipeline::builder()
///     .with_text_featurizer(FeaturizerConfig::default())
///     .with_trainer(TrainerConfig::default())
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    stages: Vec<PipelineStage>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Appends a stage as-is.
    pub fn add(mut self, stage: PipelineStage) -> Self {
        self.stages.push(stage);
        self
    }

    fn has(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name() == name)
    }

    /// Adds the loader stage.
    pub fn with_loader(self, loader: RecordLoader) -> Self {
        self.add(PipelineStage::Loader(loader))
    }

    /// Adds the dictionarizer stage. `class_names` fixes the class order.
    pub fn with_label_dictionary(self, class_names: Option<Vec<String>>) -> Self {
        self.add(PipelineStage::Dictionarizer { class_names })
    }

    /// Adds the featurizer stage, inserting a default loader and
    /// dictionarizer first if they are missing.
    pub fn with_text_featurizer(mut self, config: FeaturizerConfig) -> Self {
        if !self.has("loader") {
            self = self.with_loader(RecordLoader::tsv());
        }
        if !self.has("dictionarizer") {
            self = self.with_label_dictionary(None);
        }
        self.add(PipelineStage::Featurizer(config))
    }

    /// Adds the trainer stage followed by the label converter.
    pub fn with_trainer(self, config: TrainerConfig) -> Self {
        self.add(PipelineStage::Trainer(config))
            .add(PipelineStage::LabelConverter)
    }

    /// Builds and returns the final Pipeline.
    ///
    /// # Errors
    /// - `Build` if the stages are not exactly loader, dictionarizer,
    ///   featurizer, trainer, label converter (in that order)
    /// - `Build` if a stage carries invalid parameters
    pub fn build(self) -> Result<Pipeline, ClassifierError> {
        let names: Vec<&str> = self.stages.iter().map(PipelineStage::name).collect();
        if names != STAGE_ORDER {
            return Err(ClassifierError::Build(format!(
                "Pipeline stages must be {:?}, got {:?}",
                STAGE_ORDER, names
            )));
        }

        let mut loader = None;
        let mut class_names = None;
        let mut featurizer = None;
        let mut trainer = None;
        for stage in self.stages {
            match stage {
                PipelineStage::Loader(l) => loader = Some(l),
                PipelineStage::Dictionarizer { class_names: names } => {
                    if let Some(names) = &names {
                        LabelVocabulary::from_names(names.clone())?;
                    }
                    class_names = names;
                }
                PipelineStage::Featurizer(config) => {
                    config.validate()?;
                    featurizer = Some(config);
                }
                PipelineStage::Trainer(config) => {
                    config.validate()?;
                    trainer = Some(config);
                }
                PipelineStage::LabelConverter => {}
            }
        }

        match (loader, featurizer, trainer) {
            (Some(loader), Some(featurizer), Some(trainer)) => Ok(Pipeline {
                loader,
                class_names,
                featurizer,
                trainer,
            }),
            _ => Err(ClassifierError::Build("Pipeline is missing a stage".into())),
        }
    }
}

/// A validated training pipeline: load → dictionarize → featurize → train →
/// convert labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    loader: RecordLoader,
    class_names: Option<Vec<String>>,
    featurizer: FeaturizerConfig,
    trainer: TrainerConfig,
}

impl Pipeline {
    /// Creates a new PipelineBuilder for fluent construction
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn loader(&self) -> &RecordLoader {
        &self.loader
    }

    /// Loads `path` with the pipeline's loader and trains on every record.
    pub fn train_file(&self, path: &Path) -> Result<Model, ClassifierError> {
        let records = self.loader.load(path)?;
        self.train_records(&records)
    }

    /// Trains on already loaded records. Every record must carry a label.
    pub fn train_records(&self, records: &[ClassificationRecord]) -> Result<Model, ClassifierError> {
        if records.is_empty() {
            return Err(ClassifierError::DataSchema("Training data contains no records".into()));
        }
        let labels: Vec<&str> = records
            .iter()
            .enumerate()
            .map(|(i, r)| {
                r.label.as_deref().ok_or_else(|| {
                    ClassifierError::DataSchema(format!("Training record {} has no label", i + 1))
                })
            })
            .collect::<Result<_, _>>()?;

        let vocabulary = LabelVocabulary::fit(labels.iter().copied(), self.class_names.as_deref())?;
        let targets: Vec<usize> = labels
            .iter()
            .map(|label| vocabulary.encode(label))
            .collect::<Result<_, _>>()?;
        info!("Dictionarized {} labels: {:?}", vocabulary.len(), vocabulary.names());

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let featurizer = TextFeaturizer::fit(&self.featurizer, &texts)?;
        let features = featurizer.transform_batch(&texts)?;

        let booster = BoostedTreeClassifier::fit(&self.trainer, features.view(), &targets, vocabulary.len())
            .map_err(|e| {
                error!("Training failed: {}", e);
                e
            })?;

        let metadata = ModelMetadata::new(records.len(), featurizer.dimension(), vocabulary.len());
        Ok(Model::from_parts(vocabulary, featurizer, booster, metadata))
    }
}
