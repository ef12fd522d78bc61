//! Accuracy, confusion matrices and the per-class and feature reports built
//! from them.
//!
//! Confusion matrices are indexed `[true class, predicted class]`.

use std::{cmp::Ordering, fmt};

use ndarray::Array2;
use serde::Serialize;
use tracing::warn;

/// Fraction of predictions equal to the truth; `NaN` for empty input.
#[must_use]
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> f64 {
    let correct = y_pred
        .iter()
        .zip(y_true)
        .filter(|(pred, truth)| pred == truth)
        .count();
    correct as f64 / y_true.len() as f64
}

/// `num_classes × num_classes` counts of (truth, prediction) pairs.
#[must_use]
pub fn confusion_matrix(y_true: &[usize], y_pred: &[usize], num_classes: usize) -> Array2<usize> {
    let mut confusion = Array2::zeros((num_classes, num_classes));
    for (&truth, &pred) in y_true.iter().zip(y_pred) {
        if truth < num_classes && pred < num_classes {
            confusion[[truth, pred]] += 1;
        } else {
            warn!(truth, pred, num_classes, "Class index out of range; pair skipped");
        }
    }
    confusion
}

/// Precision, recall and F1 of one class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassScores {
    pub class: usize,
    /// `TP / predicted positives`; `NaN` when the class was never predicted.
    pub precision: f64,
    /// `TP / actual positives`; `NaN` when the class never occurs.
    pub recall: f64,
    pub f1: f64,
    /// Number of records whose true class is `class`.
    pub support: usize,
}

/// Harmonic mean; NaN inputs propagate and `p = r = 0` gives 0.
fn f1_score(precision: f64, recall: f64) -> f64 {
    2.0 / (1.0 / precision + 1.0 / recall)
}

/// Per-class scores from a square confusion matrix.
#[must_use]
pub fn score_report(confusion: &Array2<usize>) -> Vec<ClassScores> {
    let column_totals = confusion.sum_axis(ndarray::Axis(0));
    let row_totals = confusion.sum_axis(ndarray::Axis(1));

    (0..confusion.nrows())
        .map(|class| {
            let true_positives = confusion[[class, class]] as f64;
            let precision = true_positives / column_totals[class] as f64;
            let recall = true_positives / row_totals[class] as f64;
            ClassScores {
                class,
                precision,
                recall,
                f1: f1_score(precision, recall),
                support: row_totals[class],
            }
        })
        .collect()
}

/// Aggregate cross-validation outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValidationReport {
    /// Accuracy of each fold, in fold order.
    pub fold_scores: Vec<f64>,
    /// Sum of the per-fold confusion matrices.
    pub confusion: Array2<usize>,
    /// Label of each class index, when known.
    pub classes: Vec<String>,
}

impl CrossValidationReport {
    #[must_use]
    pub fn mean_accuracy(&self) -> f64 {
        self.fold_scores.iter().sum::<f64>() / self.fold_scores.len() as f64
    }

    #[must_use]
    pub fn class_scores(&self) -> Vec<ClassScores> {
        score_report(&self.confusion)
    }

    /// Total number of held-out records scored.
    #[must_use]
    pub fn num_scored(&self) -> usize {
        self.confusion.sum()
    }

    fn class_name(&self, class: usize) -> String {
        self.classes
            .get(class)
            .cloned()
            .unwrap_or_else(|| class.to_string())
    }
}

impl fmt::Display for CrossValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Mean accuracy over {} folds: {:.4}",
            self.fold_scores.len(),
            self.mean_accuracy()
        )?;
        for (fold, score) in self.fold_scores.iter().enumerate() {
            writeln!(f, "  fold {}: {score:.4}", fold + 1)?;
        }

        let names = (0..self.confusion.nrows())
            .map(|class| self.class_name(class))
            .collect::<Vec<_>>();
        let width = names.iter().map(String::len).max().unwrap_or(0).max(8);

        writeln!(f, "\nConfusion matrix (rows = truth, columns = prediction):")?;
        write!(f, "{:width$}", "")?;
        for name in &names {
            write!(f, " {name:>width$}")?;
        }
        writeln!(f)?;
        for (name, row) in names.iter().zip(self.confusion.rows()) {
            write!(f, "{name:width$}")?;
            for count in row {
                write!(f, " {count:>width$}")?;
            }
            writeln!(f)?;
        }

        writeln!(
            f,
            "\n{:width$} {:>9} {:>9} {:>9} {:>9}",
            "class", "precision", "recall", "f1", "support"
        )?;
        for scores in self.class_scores() {
            writeln!(
                f,
                "{:width$} {:>9.4} {:>9.4} {:>9.4} {:>9}",
                self.class_name(scores.class),
                scores.precision,
                scores.recall,
                scores.f1,
                scores.support
            )?;
        }
        Ok(())
    }
}

/// The least and most important features of a fitted model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureReport {
    /// Ascending by importance.
    pub least: Vec<(String, f64)>,
    /// Descending by importance.
    pub most: Vec<(String, f64)>,
}

impl FeatureReport {
    /// Pair `names` with `importances`, sort ascending by (score, term) and
    /// keep the `n` entries at each end.
    #[must_use]
    pub fn new(names: Vec<String>, importances: &[f64], n: usize) -> Self {
        let mut ranked = names
            .into_iter()
            .zip(importances.iter().copied())
            .collect::<Vec<_>>();
        ranked.sort_by(|(term_a, score_a), (term_b, score_b)| {
            score_a
                .partial_cmp(score_b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| term_a.cmp(term_b))
        });

        let n = n.min(ranked.len());
        let least = ranked[..n].to_vec();
        let most = ranked[ranked.len() - n..].iter().rev().cloned().collect();
        Self { least, most }
    }
}

impl fmt::Display for FeatureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .least
            .iter()
            .chain(&self.most)
            .map(|(term, _)| term.len())
            .max()
            .unwrap_or(0)
            .max(4);
        writeln!(
            f,
            "{:>9}  {:width$}    {:>9}  {:width$}",
            "least", "term", "most", "term"
        )?;
        for ((least_term, least_score), (most_term, most_score)) in
            self.least.iter().zip(&self.most)
        {
            writeln!(
                f,
                "{least_score:>9.4}  {least_term:width$}    {most_score:>9.4}  {most_term:width$}"
            )?;
        }
        Ok(())
    }
}
