use sprs::CsMat;
use tracing::debug;

use super::{argmax, as_csr, check_fit_input, check_num_features, Classifier, FeatureImportances};
use crate::ClassifierError;

/// A one-feature rule: predict `present` when the term occurs in a document,
/// `absent` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Stump {
    feature: usize,
    present: usize,
    absent: usize,
    weight: f64,
}

/// Multi-class AdaBoost (SAMME) over term-presence decision stumps.
#[derive(Debug, Clone)]
pub struct AdaBoostStumps {
    n_estimators: usize,
    fitted: Option<BoostedModel>,
}

#[derive(Debug, Clone)]
struct BoostedModel {
    num_classes: usize,
    num_features: usize,
    stumps: Vec<Stump>,
    /// Predicted when no stump could be fitted.
    fallback: usize,
    importances: Vec<f64>,
}

impl AdaBoostStumps {
    pub fn new() -> Self {
        Self {
            n_estimators: 50,
            fitted: None,
        }
    }

    #[must_use]
    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators.max(1);
        self
    }

    pub fn n_estimators(&self) -> usize {
        self.n_estimators
    }

    /// Number of stumps actually kept; boosting stops early on a perfect or
    /// useless stump.
    pub fn num_stumps(&self) -> usize {
        self.fitted.as_ref().map_or(0, |model| model.stumps.len())
    }
}

impl Default for AdaBoostStumps {
    fn default() -> Self {
        Self::new()
    }
}

/// Best stump for the current sample weights and its weighted error.
fn best_stump(
    columns: &CsMat<f64>,
    y: &[usize],
    weights: &[f64],
    class_totals: &[f64],
) -> Option<(Stump, f64)> {
    let num_classes = class_totals.len();
    let total: f64 = class_totals.iter().sum();
    let mut best: Option<(Stump, f64)> = None;
    let mut present = vec![0.0; num_classes];

    for (feature, column) in columns.outer_iterator().enumerate() {
        present.iter_mut().for_each(|w| *w = 0.0);
        for (row, &value) in column.iter() {
            if value > 0.0 {
                present[y[row]] += weights[row];
            }
        }
        let absent = class_totals
            .iter()
            .zip(&present)
            .map(|(total, present)| total - present)
            .collect::<Vec<_>>();

        let present_class = argmax(&present);
        let absent_class = argmax(&absent);
        let error = 1.0 - (present[present_class] + absent[absent_class]) / total;

        if best.map_or(true, |(_, best_error)| error < best_error) {
            best = Some((
                Stump {
                    feature,
                    present: present_class,
                    absent: absent_class,
                    weight: 0.0,
                },
                error,
            ));
        }
    }
    best
}

impl Classifier for AdaBoostStumps {
    fn fit(&mut self, x: &CsMat<f64>, y: &[usize]) -> Result<(), ClassifierError> {
        check_fit_input(x, y)?;
        self.fitted = None;

        let columns = x.to_csc();
        let num_rows = y.len();
        let num_features = x.cols();
        let num_classes = y.iter().max().map_or(0, |&max| max + 1);

        let mut weights = vec![1.0 / num_rows as f64; num_rows];
        let mut stumps = Vec::with_capacity(self.n_estimators);
        let mut fallback = 0;

        for round in 0..self.n_estimators {
            let mut class_totals = vec![0.0; num_classes];
            for (&class, &weight) in y.iter().zip(&weights) {
                class_totals[class] += weight;
            }
            if round == 0 {
                fallback = argmax(&class_totals);
            }

            let Some((mut stump, error)) = best_stump(&columns, y, &weights, &class_totals) else {
                break;
            };

            if error <= 0.0 {
                stump.weight = 1.0;
                stumps.push(stump);
                debug!(round, feature = stump.feature, "Perfect stump; stopping early");
                break;
            }
            if error >= 1.0 - 1.0 / num_classes as f64 {
                debug!(round, error, "Stump no better than chance; stopping early");
                break;
            }

            stump.weight = ((1.0 - error) / error).ln() + (num_classes as f64 - 1.0).ln();
            for (row, (&class, weight)) in y.iter().zip(weights.iter_mut()).enumerate() {
                if stump_predicts(&stump, &columns, row) != class {
                    *weight *= stump.weight.exp();
                }
            }
            let weight_sum: f64 = weights.iter().sum();
            weights.iter_mut().for_each(|w| *w /= weight_sum);
            stumps.push(stump);
        }

        let mut importances = vec![0.0; num_features];
        for stump in &stumps {
            importances[stump.feature] += stump.weight;
        }
        let importance_sum: f64 = importances.iter().sum();
        if importance_sum > 0.0 {
            importances.iter_mut().for_each(|w| *w /= importance_sum);
        }

        debug!(
            num_stumps = stumps.len(),
            num_classes, num_features, "Fitted AdaBoostStumps"
        );
        self.fitted = Some(BoostedModel {
            num_classes,
            num_features,
            stumps,
            fallback,
            importances,
        });
        Ok(())
    }

    fn predict(&self, x: &CsMat<f64>) -> Result<Vec<usize>, ClassifierError> {
        let model = self.fitted.as_ref().ok_or(ClassifierError::NotFitted)?;
        check_num_features(x, model.num_features)?;
        if model.stumps.is_empty() {
            return Ok(vec![model.fallback; x.rows()]);
        }

        let x = as_csr(x);
        Ok(x.outer_iterator()
            .map(|row| {
                let mut votes = vec![0.0; model.num_classes];
                for stump in &model.stumps {
                    let present = row.get(stump.feature).is_some_and(|&value| value > 0.0);
                    let class = if present { stump.present } else { stump.absent };
                    votes[class] += stump.weight;
                }
                argmax(&votes)
            })
            .collect())
    }

    fn feature_importances(&self) -> Option<&dyn FeatureImportances> {
        self.fitted.as_ref().map(|_| self as &dyn FeatureImportances)
    }
}

impl FeatureImportances for AdaBoostStumps {
    /// Normalized sum of stump weights per feature; empty before fit.
    fn feature_importances(&self) -> &[f64] {
        self.fitted
            .as_ref()
            .map(|model| model.importances.as_slice())
            .unwrap_or_default()
    }
}

/// The stump's prediction for training row `row`, given column-major `columns`.
fn stump_predicts(stump: &Stump, columns: &CsMat<f64>, row: usize) -> usize {
    let present = columns
        .outer_view(stump.feature)
        .and_then(|column| column.get(row).copied())
        .is_some_and(|value| value > 0.0);
    if present {
        stump.present
    } else {
        stump.absent
    }
}
