//! The classifier seam of the pipeline and the bundled implementations.

mod adaboost;
mod naive_bayes;

use std::borrow::Cow;

use sprs::CsMat;

pub use adaboost::AdaBoostStumps;
pub use naive_bayes::MultinomialNb;

use crate::{metrics, ClassifierError};

/// A supervised model over sparse document features and class indices.
pub trait Classifier {
    /// Fit on `x` (one row per document) and `y` (one class index per row).
    fn fit(&mut self, x: &CsMat<f64>, y: &[usize]) -> Result<(), ClassifierError>;

    fn predict(&self, x: &CsMat<f64>) -> Result<Vec<usize>, ClassifierError>;

    /// Mean accuracy of `predict(x)` against `y`.
    fn score(&self, x: &CsMat<f64>, y: &[usize]) -> Result<f64, ClassifierError> {
        let predictions = self.predict(x)?;
        if predictions.len() != y.len() {
            return Err(ClassifierError::DataShape(format!(
                "{} predictions but {} labels",
                predictions.len(),
                y.len()
            )));
        }
        Ok(metrics::accuracy(&predictions, y))
    }

    /// `Some` when the fitted model exposes per-feature importances.
    fn feature_importances(&self) -> Option<&dyn FeatureImportances> {
        None
    }
}

/// One importance score per feature column, in column order.
pub trait FeatureImportances {
    fn feature_importances(&self) -> &[f64];
}

/// Shared fit-time validation.
fn check_fit_input(x: &CsMat<f64>, y: &[usize]) -> Result<(), ClassifierError> {
    if x.rows() == 0 {
        return Err(ClassifierError::DataShape(
            "cannot fit on an empty matrix".to_string(),
        ));
    }
    if x.rows() != y.len() {
        return Err(ClassifierError::DataShape(format!(
            "{} rows but {} labels",
            x.rows(),
            y.len()
        )));
    }
    Ok(())
}

fn check_num_features(x: &CsMat<f64>, num_features: usize) -> Result<(), ClassifierError> {
    if x.cols() == num_features {
        Ok(())
    } else {
        Err(ClassifierError::DataShape(format!(
            "expected {num_features} features, got {}",
            x.cols()
        )))
    }
}

/// Row-major view of `x`.
fn as_csr(x: &CsMat<f64>) -> Cow<'_, CsMat<f64>> {
    if x.is_csr() {
        Cow::Borrowed(x)
    } else {
        Cow::Owned(x.to_csr())
    }
}

/// Index of the largest score; the lowest index wins ties.
fn argmax(scores: &[f64]) -> usize {
    scores
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, best_score), (idx, &score)| {
            if score > best_score {
                (idx, score)
            } else {
                (best, best_score)
            }
        })
        .0
}
