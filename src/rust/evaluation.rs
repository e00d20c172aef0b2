//! Quality metrics for a trained model on labeled data.

use std::fmt;
use ndarray::{Array2, ArrayView2};

use crate::classifier::utils::argmax;
use crate::classifier::ClassifierError;

/// Probabilities are clamped to this before taking logarithms.
const MIN_PROBABILITY: f64 = 1e-15;

/// Aggregate metrics of one evaluation run.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    /// Mean per-class recall over classes present in the test data
    pub accuracy_macro: f64,
    /// Fraction of correctly classified examples
    pub accuracy_micro: f64,
    pub top_k: usize,
    /// Fraction of examples whose true class is among the `top_k` best scores
    pub top_k_accuracy: f64,
    pub log_loss: f64,
    /// Relative improvement of `log_loss` over predicting the class priors
    pub log_loss_reduction: f64,
    pub per_class_log_loss: Vec<f64>,
    pub per_class_support: Vec<usize>,
    /// Rows are true classes, columns predicted classes
    pub confusion_matrix: Array2<usize>,
    pub class_names: Vec<String>,
}

impl MetricsSummary {
    /// Computes metrics from true class indices and the `[examples, classes]`
    /// score matrix produced by the model.
    ///
    /// # Errors
    /// - `Validation` if there are no examples or `top_k` is zero
    /// - `InternalConsistency` if shapes disagree or a class index is out of range
    pub fn compute(
        truth: &[usize],
        scores: ArrayView2<f32>,
        class_names: &[String],
        top_k: usize,
    ) -> Result<Self, ClassifierError> {
        let (rows, classes) = scores.dim();
        if truth.is_empty() {
            return Err(ClassifierError::Validation("Cannot evaluate an empty data set".into()));
        }
        if top_k == 0 {
            return Err(ClassifierError::Validation("top_k must be at least 1".into()));
        }
        if rows != truth.len() || classes != class_names.len() {
            return Err(ClassifierError::InternalConsistency(format!(
                "Score matrix is {}x{}, expected {}x{}",
                rows,
                classes,
                truth.len(),
                class_names.len()
            )));
        }
        if let Some(&bad) = truth.iter().find(|&&t| t >= classes) {
            return Err(ClassifierError::InternalConsistency(format!(
                "True class index {} is outside the {} known classes",
                bad, classes
            )));
        }

        let k = top_k.min(classes);
        let mut correct = 0usize;
        let mut in_top_k = 0usize;
        let mut loss_sum = 0.0f64;
        let mut class_loss = vec![0.0f64; classes];
        let mut support = vec![0usize; classes];
        let mut hits = vec![0usize; classes];
        let mut confusion = Array2::<usize>::zeros((classes, classes));

        for (row, &t) in scores.outer_iter().zip(truth) {
            let predicted = argmax(row).unwrap_or(0);
            confusion[[t, predicted]] += 1;
            support[t] += 1;
            if predicted == t {
                correct += 1;
                hits[t] += 1;
            }

            let true_score = row[t];
            let better = row.iter().filter(|&&s| s > true_score).count();
            if better < k {
                in_top_k += 1;
            }

            let loss = -(f64::from(true_score)).max(MIN_PROBABILITY).ln();
            loss_sum += loss;
            class_loss[t] += loss;
        }

        let n = truth.len() as f64;
        let present: Vec<usize> = (0..classes).filter(|&c| support[c] > 0).collect();
        let accuracy_macro = present
            .iter()
            .map(|&c| hits[c] as f64 / support[c] as f64)
            .sum::<f64>()
            / present.len() as f64;

        let per_class_log_loss = class_loss
            .iter()
            .zip(&support)
            .map(|(&loss, &count)| if count > 0 { loss / count as f64 } else { 0.0 })
            .collect();

        let log_loss = loss_sum / n;
        let prior_log_loss: f64 = present
            .iter()
            .map(|&c| {
                let p = support[c] as f64 / n;
                -p * p.ln()
            })
            .sum();
        let log_loss_reduction = if prior_log_loss > 0.0 {
            1.0 - log_loss / prior_log_loss
        } else {
            0.0
        };

        Ok(Self {
            accuracy_macro,
            accuracy_micro: correct as f64 / n,
            top_k: k,
            top_k_accuracy: in_top_k as f64 / n,
            log_loss,
            log_loss_reduction,
            per_class_log_loss,
            per_class_support: support,
            confusion_matrix: confusion,
            class_names: class_names.to_vec(),
        })
    }
}

impl fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PredictionModel quality metrics evaluation")?;
        writeln!(f, "------------------------------------------")?;
        writeln!(f, "    Accuracy Macro: {:.2}%", self.accuracy_macro * 100.0)?;
        writeln!(f, "    Accuracy Micro: {:.2}%", self.accuracy_micro * 100.0)?;
        writeln!(f, "    Top-{} Accuracy: {:.2}%", self.top_k, self.top_k_accuracy * 100.0)?;
        writeln!(f, "           LogLoss: {:.4}", self.log_loss)?;
        writeln!(f, "  LogLossReduction: {:.2}%", self.log_loss_reduction * 100.0)?;
        writeln!(f)?;
        writeln!(f, " PerClassLogLoss:")?;
        for (i, (loss, name)) in self.per_class_log_loss.iter().zip(&self.class_names).enumerate() {
            writeln!(
                f,
                "       Class: {} ({}) - {:.4} (n = {})",
                i, name, loss, self.per_class_support[i]
            )?;
        }
        writeln!(f)?;
        writeln!(f, " Confusion matrix (rows: truth, columns: predicted):")?;
        write!(f, "       ")?;
        for i in 0..self.class_names.len() {
            write!(f, "{:>6}", i)?;
        }
        writeln!(f)?;
        for (i, row) in self.confusion_matrix.outer_iter().enumerate() {
            write!(f, "  {:>4} ", i)?;
            for count in row.iter() {
                write!(f, "{:>6}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
