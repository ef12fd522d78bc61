use ndarray::{Array1, Array2};
use sprs::CsMat;
use tracing::debug;

use super::{argmax, as_csr, check_fit_input, check_num_features, Classifier};
use crate::ClassifierError;

/// Multinomial naive Bayes with additive (Laplace/Lidstone) smoothing.
///
/// Works on raw counts as well as TF-IDF weights; feature values are used as
/// fractional counts.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    alpha: f64,
    fitted: Option<NbModel>,
}

#[derive(Debug, Clone)]
struct NbModel {
    /// `ln P(class)`; `-inf` for classes with no training rows.
    class_log_prior: Array1<f64>,
    /// `ln P(feature | class)`, `num_classes × num_features`.
    feature_log_prob: Array2<f64>,
}

impl MultinomialNb {
    pub fn new() -> Self {
        Self {
            alpha: 1.0,
            fitted: None,
        }
    }

    /// Smoothing strength; negative values are clamped to zero.
    #[must_use]
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.max(0.0);
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn num_classes(&self) -> usize {
        self.fitted
            .as_ref()
            .map_or(0, |model| model.class_log_prior.len())
    }
}

impl Default for MultinomialNb {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for MultinomialNb {
    fn fit(&mut self, x: &CsMat<f64>, y: &[usize]) -> Result<(), ClassifierError> {
        check_fit_input(x, y)?;
        self.fitted = None;

        let x = as_csr(x);
        let num_classes = y.iter().max().map_or(0, |&max| max + 1);
        let num_features = x.cols();

        let mut class_counts = Array1::<f64>::zeros(num_classes);
        let mut feature_counts = Array2::<f64>::zeros((num_classes, num_features));
        for (row, &class) in x.outer_iterator().zip(y) {
            class_counts[class] += 1.0;
            for (col, &value) in row.iter() {
                feature_counts[[class, col]] += value;
            }
        }

        let num_rows = y.len() as f64;
        let class_log_prior = class_counts.mapv(|count| (count / num_rows).ln());

        let mut feature_log_prob = feature_counts;
        for mut class_row in feature_log_prob.outer_iter_mut() {
            let denominator = class_row.sum() + self.alpha * num_features as f64;
            class_row.mapv_inplace(|count| ((count + self.alpha) / denominator).ln());
        }

        debug!(num_classes, num_features, alpha = self.alpha, "Fitted MultinomialNb");
        self.fitted = Some(NbModel {
            class_log_prior,
            feature_log_prob,
        });
        Ok(())
    }

    fn predict(&self, x: &CsMat<f64>) -> Result<Vec<usize>, ClassifierError> {
        let model = self.fitted.as_ref().ok_or(ClassifierError::NotFitted)?;
        check_num_features(x, model.feature_log_prob.ncols())?;

        let x = as_csr(x);
        Ok(x.outer_iterator()
            .map(|row| {
                let joint_log_likelihood = model
                    .class_log_prior
                    .iter()
                    .enumerate()
                    .map(|(class, &prior)| {
                        row.iter().fold(prior, |acc, (col, &value)| {
                            acc + value * model.feature_log_prob[[class, col]]
                        })
                    })
                    .collect::<Vec<_>>();
                argmax(&joint_log_likelihood)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Class 0 uses columns 0-1, class 1 uses columns 2-3.
    fn separable() -> (CsMat<f64>, Vec<usize>) {
        let x = CsMat::new(
            (4, 4),
            vec![0, 2, 3, 5, 6],
            vec![0, 1, 0, 2, 3, 3],
            vec![2.0, 1.0, 3.0, 1.0, 2.0, 4.0],
        );
        (x, vec![0, 0, 1, 1])
    }

    #[test]
    fn test_separates_vocabularies() {
        let (x, y) = separable();
        let mut nb = MultinomialNb::new();
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.num_classes(), 2);
        assert_eq!(nb.predict(&x).unwrap(), y);
        assert!((nb.score(&x, &y).unwrap() - 1.0).abs() < f64::EPSILON);

        let unseen = CsMat::new((2, 4), vec![0, 1, 2], vec![1, 2], vec![1.0, 1.0]);
        assert_eq!(nb.predict(&unseen).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_predict_before_fit() {
        let (x, _) = separable();
        assert!(matches!(
            MultinomialNb::new().predict(&x),
            Err(ClassifierError::NotFitted)
        ));
    }

    #[test]
    fn test_feature_count_mismatch() {
        let (x, y) = separable();
        let mut nb = MultinomialNb::new();
        nb.fit(&x, &y).unwrap();
        let narrow: CsMat<f64> = CsMat::zero((1, 3));
        assert!(matches!(nb.predict(&narrow), Err(ClassifierError::DataShape(_))));
    }

    #[test]
    fn test_empty_row_follows_prior() {
        let x = CsMat::new((3, 2), vec![0, 1, 2, 3], vec![0, 0, 1], vec![1.0, 1.0, 1.0]);
        let mut nb = MultinomialNb::new();
        nb.fit(&x, &[1, 1, 0]).unwrap();
        let empty: CsMat<f64> = CsMat::zero((1, 2));
        assert_eq!(nb.predict(&empty).unwrap(), vec![1]);
    }

    #[test]
    fn test_no_feature_importances() {
        assert!(MultinomialNb::new().feature_importances().is_none());
    }
}
