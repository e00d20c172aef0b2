use std::fmt;
use gbdt::config::Config as GbdtConfig;
use gbdt::decision_tree::{Data, DataVec, ValueType};
use gbdt::gradient_boost::GBDT;
use log::{debug, info};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::normalize_scores;

const POSITIVE: ValueType = 1.0;
const NEGATIVE: ValueType = -1.0;

/// Hyperparameters for the boosted-tree trainer. The defaults use no row or
/// feature subsampling, which keeps training deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Number of boosting rounds per class
    pub iterations: usize,
    /// Maximum depth of each tree
    pub max_depth: u32,
    /// Learning rate applied to each tree's contribution
    pub shrinkage: f64,
    /// Minimum number of samples in a leaf
    pub min_leaf_size: usize,
    /// Fraction of rows sampled per round
    pub data_sample_ratio: f64,
    /// Fraction of features sampled per tree
    pub feature_sample_ratio: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            max_depth: 4,
            shrinkage: 0.2,
            min_leaf_size: 1,
            data_sample_ratio: 1.0,
            feature_sample_ratio: 1.0,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<(), ClassifierError> {
        if self.iterations == 0 {
            return Err(ClassifierError::Build("iterations must be greater than zero".into()));
        }
        if self.max_depth == 0 {
            return Err(ClassifierError::Build("max_depth must be greater than zero".into()));
        }
        if !(self.shrinkage > 0.0 && self.shrinkage <= 1.0) {
            return Err(ClassifierError::Build(format!(
                "shrinkage must be in (0, 1], got {}",
                self.shrinkage
            )));
        }
        for (name, ratio) in [
            ("data_sample_ratio", self.data_sample_ratio),
            ("feature_sample_ratio", self.feature_sample_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(ClassifierError::Build(format!("{} must be in (0, 1], got {}", name, ratio)));
            }
        }
        Ok(())
    }

    fn to_gbdt_config(&self, feature_size: usize) -> GbdtConfig {
        let mut cfg = GbdtConfig::new();
        cfg.set_feature_size(feature_size);
        cfg.set_max_depth(self.max_depth);
        cfg.set_iterations(self.iterations);
        cfg.set_shrinkage(self.shrinkage as ValueType);
        cfg.set_min_leaf_size(self.min_leaf_size);
        cfg.set_data_sample_ratio(self.data_sample_ratio);
        cfg.set_feature_sample_ratio(self.feature_sample_ratio);
        cfg.set_loss("LogLikelyhood");
        cfg.set_debug(false);
        cfg
    }
}

/// Multi-class gradient-boosted trees, trained one-vs-rest.
///
/// Each class owns a binary log-likelihood ensemble. Scoring runs every
/// ensemble over the same feature rows and rescales the per-class outputs into
/// a distribution whose columns follow the class index order used in training.
#[derive(Serialize, Deserialize)]
pub struct BoostedTreeClassifier {
    config: TrainerConfig,
    feature_size: usize,
    ensembles: Vec<GBDT>,
}

impl fmt::Debug for BoostedTreeClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoostedTreeClassifier")
            .field("config", &self.config)
            .field("feature_size", &self.feature_size)
            .field("num_classes", &self.ensembles.len())
            .finish()
    }
}

impl BoostedTreeClassifier {
    /// Trains one ensemble per class.
    ///
    /// # Arguments
    /// * `features` - `[rows, features]` matrix produced by the featurizer
    /// * `targets` - class index of each row
    /// * `num_classes` - size of the label vocabulary
    ///
    /// # Errors
    /// - `Build` if the configuration is invalid
    /// - `Training` if the inputs disagree in length, fewer than two classes
    ///   are requested, or a class has no rows
    pub fn fit(
        config: &TrainerConfig,
        features: ArrayView2<f32>,
        targets: &[usize],
        num_classes: usize,
    ) -> Result<Self, ClassifierError> {
        config.validate()?;

        let (rows, feature_size) = features.dim();
        if rows == 0 {
            return Err(ClassifierError::Training("No training rows".into()));
        }
        if rows != targets.len() {
            return Err(ClassifierError::Training(format!(
                "Feature rows ({}) and targets ({}) differ in length",
                rows,
                targets.len()
            )));
        }
        if num_classes < 2 {
            return Err(ClassifierError::Training(format!(
                "At least two classes are required, found {}",
                num_classes
            )));
        }
        if let Some(&bad) = targets.iter().find(|&&t| t >= num_classes) {
            return Err(ClassifierError::Training(format!(
                "Target index {} is outside the {} known classes",
                bad, num_classes
            )));
        }
        let mut support = vec![0usize; num_classes];
        for &t in targets {
            support[t] += 1;
        }
        if let Some(missing) = support.iter().position(|&count| count == 0) {
            return Err(ClassifierError::Training(format!(
                "Class index {} has no training rows",
                missing
            )));
        }

        let gbdt_config = config.to_gbdt_config(feature_size);
        let mut ensembles = Vec::with_capacity(num_classes);
        for class in 0..num_classes {
            debug!("Training ensemble for class {} ({} positive rows)", class, support[class]);
            let mut data: DataVec = features
                .outer_iter()
                .zip(targets)
                .map(|(row, &target)| {
                    let label = if target == class { POSITIVE } else { NEGATIVE };
                    Data::new_training_data(to_feature_vec(row.iter()), 1.0, label, None)
                })
                .collect();
            let mut ensemble = GBDT::new(&gbdt_config);
            ensemble.fit(&mut data);
            ensembles.push(ensemble);
        }

        info!(
            "Trained {} one-vs-rest ensembles ({} rounds, depth {}) on {} rows x {} features",
            num_classes, config.iterations, config.max_depth, rows, feature_size
        );

        Ok(Self {
            config: config.clone(),
            feature_size,
            ensembles,
        })
    }

    pub fn num_classes(&self) -> usize {
        self.ensembles.len()
    }

    pub fn feature_size(&self) -> usize {
        self.feature_size
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Scores every row, returning a `[rows, classes]` matrix whose rows sum to one.
    pub fn score_batch(&self, features: ArrayView2<f32>) -> Result<Array2<f32>, ClassifierError> {
        let (rows, feature_size) = features.dim();
        if feature_size != self.feature_size {
            return Err(ClassifierError::InternalConsistency(format!(
                "Classifier expects {} features, got {}",
                self.feature_size, feature_size
            )));
        }

        let data: DataVec = features
            .outer_iter()
            .map(|row| Data::new_test_data(to_feature_vec(row.iter()), None))
            .collect();

        let mut raw = Array2::<f32>::zeros((rows, self.num_classes()));
        if rows == 0 {
            return Ok(raw);
        }
        for (class, ensemble) in self.ensembles.iter().enumerate() {
            let predicted = ensemble.predict(&data);
            for (row, value) in predicted.into_iter().enumerate() {
                raw[[row, class]] = value as f32;
            }
        }

        let mut scores = Array2::<f32>::zeros(raw.dim());
        for (mut out, row) in scores.outer_iter_mut().zip(raw.outer_iter()) {
            out.assign(&normalize_scores(row));
        }
        Ok(scores)
    }
}

fn to_feature_vec<'a>(values: impl Iterator<Item = &'a f32>) -> Vec<ValueType> {
    values.map(|&v| v as ValueType).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_config() -> TrainerConfig {
        TrainerConfig {
            iterations: 10,
            max_depth: 2,
            ..TrainerConfig::default()
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(TrainerConfig::default().validate().is_ok());
        let bad = TrainerConfig {
            shrinkage: 0.0,
            ..TrainerConfig::default()
        };
        assert!(matches!(bad.validate(), Err(ClassifierError::Build(_))));
        let bad = TrainerConfig {
            feature_sample_ratio: 1.5,
            ..TrainerConfig::default()
        };
        assert!(matches!(bad.validate(), Err(ClassifierError::Build(_))));
    }

    #[test]
    fn test_fit_requires_every_class() {
        let features = array![[1.0f32, 0.0], [0.0, 1.0]];
        let result = BoostedTreeClassifier::fit(&small_config(), features.view(), &[0, 0], 2);
        assert!(matches!(result, Err(ClassifierError::Training(_))));
    }

    #[test]
    fn test_fit_requires_two_classes() {
        let features = array![[1.0f32, 0.0]];
        let result = BoostedTreeClassifier::fit(&small_config(), features.view(), &[0], 1);
        assert!(matches!(result, Err(ClassifierError::Training(_))));
    }

    #[test]
    fn test_scores_follow_class_order() {
        let features = array![
            [1.0f32, 0.0, 0.0],
            [0.9, 0.1, 0.0],
            [0.0, 1.0, 0.0],
            [0.1, 0.9, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.1, 0.9],
        ];
        let targets = [0, 0, 1, 1, 2, 2];
        let model = BoostedTreeClassifier::fit(&small_config(), features.view(), &targets, 3).unwrap();
        assert_eq!(model.num_classes(), 3);

        let scores = model.score_batch(features.view()).unwrap();
        assert_eq!(scores.dim(), (6, 3));
        for (row, &target) in scores.outer_iter().zip(targets.iter()) {
            assert!((row.sum() - 1.0).abs() < 1e-4);
            let best = crate::classifier::utils::argmax(row).unwrap();
            assert_eq!(best, target);
        }
    }

    #[test]
    fn test_score_batch_checks_width() {
        let features = array![[1.0f32, 0.0], [0.0, 1.0]];
        let model = BoostedTreeClassifier::fit(&small_config(), features.view(), &[0, 1], 2).unwrap();
        let wrong = array![[1.0f32, 0.0, 0.0]];
        assert!(matches!(
            model.score_batch(wrong.view()),
            Err(ClassifierError::InternalConsistency(_))
        ));
    }
}
