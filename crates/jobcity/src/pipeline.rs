use std::borrow::Cow;

use indicatif::{ProgressBar, ProgressStyle};
use jobcity_preprocessing::{ClassSelection, PreprocessorConfig, Record, StopWords, TextPreprocessor};
use ndarray::Array2;
use tracing::{debug, info};

use crate::{
    classifier::Classifier,
    cross_validation::KFold,
    metrics::{self, CrossValidationReport, FeatureReport},
    PipelineError, Result,
};

fn progress_bar_setup(len: usize, message: impl Into<Cow<'static, str>>) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(message);
    pb
}

/// State produced by a successful `fit`.
#[derive(Debug, Clone)]
struct Fitted {
    selection: ClassSelection,
    preprocessor: TextPreprocessor,
}

/// Records in, class predictions and cross-validated scores out.
///
/// Owns the class selection, the text pre-processor and the classifier. Every
/// `fit` replaces all three. Cross-validation keeps one class selection and
/// re-fits the other two on each training fold, so after `cross_validate` the
/// pipeline holds the last fold's model.
#[derive(Debug, Clone)]
pub struct ClassificationPipeline<C> {
    classifier: C,
    config: PreprocessorConfig,
    stop_words: Option<StopWords>,
    random_state: Option<u64>,
    show_progress: bool,
    fitted: Option<Fitted>,
}

impl<C: Classifier> ClassificationPipeline<C> {
    pub fn new(classifier: C, config: PreprocessorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier,
            config,
            stop_words: None,
            random_state: None,
            show_progress: true,
            fitted: None,
        })
    }

    /// Use `stop_words` instead of the English list.
    #[must_use]
    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = Some(stop_words);
        self
    }

    /// Seed the fold shuffle of `cross_validate`.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Draw a progress bar over cross-validation folds (on by default; never
    /// drawn when stderr is not a terminal).
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Labels in class-index order; `None` before fit.
    pub fn classes(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|fitted| fitted.selection.classes())
    }

    pub fn preprocessor(&self) -> Option<&TextPreprocessor> {
        self.fitted.as_ref().map(|fitted| &fitted.preprocessor)
    }

    fn new_preprocessor(&self) -> Result<TextPreprocessor> {
        let preprocessor = TextPreprocessor::new(self.config.clone())?;
        Ok(match &self.stop_words {
            Some(stop_words) => preprocessor.with_stop_words(stop_words.clone()),
            None => preprocessor,
        })
    }

    fn fitted(&self) -> Result<&Fitted> {
        self.fitted.as_ref().ok_or(PipelineError::NotFitted)
    }

    /// Select the classes, fit the pre-processor and train the classifier.
    pub fn fit(&mut self, records: &[Record]) -> Result<()> {
        self.fitted = None;
        let selection = ClassSelection::fit(records, self.config.num_classes)?;
        self.fit_with_selection(records, selection)
    }

    /// Fit the pre-processor and classifier on the records `selection` keeps.
    fn fit_with_selection(&mut self, records: &[Record], selection: ClassSelection) -> Result<()> {
        self.fitted = None;
        let data = selection.extract(records);
        if data.is_empty() {
            return Err(PipelineError::DataShape(
                "no usable records remain after class selection".to_string(),
            ));
        }

        let mut preprocessor = self.new_preprocessor()?;
        let (features, labels) = preprocessor.fit_transform(&data.documents, &data.labels)?;
        self.classifier.fit(&features, &labels)?;

        debug!(
            num_records = data.len(),
            num_features = preprocessor.num_features(),
            classes = ?selection.classes(),
            "Pipeline fitted"
        );
        self.fitted = Some(Fitted {
            selection,
            preprocessor,
        });
        Ok(())
    }

    pub fn predict(&self, text: &str) -> Result<usize> {
        self.predict_batch(&[text])?
            .pop()
            .ok_or_else(|| PipelineError::DataShape("classifier returned no prediction".to_string()))
    }

    /// Class indices, in input order.
    pub fn predict_batch<T: AsRef<str>>(&self, texts: &[T]) -> Result<Vec<usize>> {
        let fitted = self.fitted()?;
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let features = fitted.preprocessor.transform(texts)?;
        Ok(self.classifier.predict(&features)?)
    }

    /// Like `predict_batch`, but returns label names.
    pub fn predict_labels<T: AsRef<str>>(&self, texts: &[T]) -> Result<Vec<String>> {
        let fitted = self.fitted()?;
        self.predict_batch(texts)?
            .into_iter()
            .map(|class| {
                fitted
                    .selection
                    .label_of(class)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        PipelineError::DataShape(format!("predicted class {class} has no label"))
                    })
            })
            .collect()
    }

    /// Shuffled k-fold cross-validation, seeded by `with_random_state` if set.
    pub fn cross_validate(
        &mut self,
        records: &[Record],
        num_folds: usize,
    ) -> Result<CrossValidationReport> {
        let kfold = match self.random_state {
            Some(seed) => KFold::new(num_folds).with_random_state(seed),
            None => KFold::new(num_folds).with_shuffle(true),
        };
        self.cross_validate_with(records, &kfold)
    }

    /// Cross-validate with an explicit splitter.
    ///
    /// The class selection is fitted once on all `records` so every fold
    /// shares one label to class mapping. Each fold then re-fits the
    /// pre-processor and classifier on its training records and scores the
    /// held-out records that selection keeps.
    pub fn cross_validate_with(
        &mut self,
        records: &[Record],
        kfold: &KFold,
    ) -> Result<CrossValidationReport> {
        let num_folds = kfold.n_splits();
        if num_folds < 2 {
            return Err(PipelineError::InvalidConfiguration(format!(
                "cross-validation needs at least 2 folds, got {num_folds}"
            )));
        }
        if num_folds > records.len() {
            return Err(PipelineError::InvalidConfiguration(format!(
                "{num_folds} folds requested for {} records",
                records.len()
            )));
        }

        let selection = ClassSelection::fit(records, self.config.num_classes)?;

        info!(num_folds, num_records = records.len(), "Starting cross-validation");
        let pb = if self.show_progress {
            progress_bar_setup(num_folds, "Cross-validating")
        } else {
            ProgressBar::hidden()
        };
        let (fold_scores, confusion) = match self.score_folds(records, kfold, &selection, &pb) {
            Ok(scored) => {
                pb.finish_with_message("Cross-validation complete");
                scored
            }
            Err(err) => {
                pb.abandon();
                return Err(err);
            }
        };

        let report = CrossValidationReport {
            fold_scores,
            confusion,
            classes: selection.classes().to_vec(),
        };
        info!(mean_accuracy = report.mean_accuracy(), "Cross-validation finished");
        Ok(report)
    }

    fn score_folds(
        &mut self,
        records: &[Record],
        kfold: &KFold,
        selection: &ClassSelection,
        pb: &ProgressBar,
    ) -> Result<(Vec<f64>, Array2<usize>)> {
        let num_classes = self.config.num_classes;
        let mut confusion = Array2::<usize>::zeros((num_classes, num_classes));
        let mut fold_scores = Vec::with_capacity(kfold.n_splits());

        for (fold, (train_idx, test_idx)) in kfold.split(records.len()).into_iter().enumerate() {
            let train = train_idx
                .iter()
                .map(|&idx| records[idx].clone())
                .collect::<Vec<_>>();
            let test = test_idx
                .iter()
                .map(|&idx| records[idx].clone())
                .collect::<Vec<_>>();

            self.fit_with_selection(&train, selection.clone())?;
            let held_out = selection.extract(&test);
            if held_out.is_empty() {
                return Err(PipelineError::DataShape(format!(
                    "fold {} has no held-out records after class selection",
                    fold + 1
                )));
            }

            let features = self.fitted()?.preprocessor.transform(&held_out.documents)?;
            let predictions = self.classifier.predict(&features)?;
            let score = metrics::accuracy(&predictions, &held_out.labels);
            confusion += &metrics::confusion_matrix(&held_out.labels, &predictions, num_classes);

            info!(fold = fold + 1, accuracy = score, held_out = held_out.len(), "Fold scored");
            fold_scores.push(score);
            pb.inc(1);
        }
        Ok((fold_scores, confusion))
    }

    /// The `n` least and `n` most important features of the fitted model.
    pub fn feature_report(&self, n: usize) -> Result<FeatureReport> {
        let fitted = self.fitted()?;
        let importances = self
            .classifier
            .feature_importances()
            .ok_or(PipelineError::UnsupportedModel)?
            .feature_importances();
        let names = fitted.preprocessor.feature_names()?;
        if names.len() != importances.len() {
            return Err(PipelineError::DataShape(format!(
                "{} feature names but {} importances",
                names.len(),
                importances.len()
            )));
        }
        Ok(FeatureReport::new(names, importances, n))
    }
}

#[cfg(test)]
mod tests {
    use sprs::CsMat;

    use super::*;
    use crate::{
        classifier::{AdaBoostStumps, FeatureImportances, MultinomialNb},
        ClassifierError,
    };

    fn records() -> Vec<Record> {
        [
            ("harbor seafood lobster", "boston"),
            ("harbor seafood ferry", "boston"),
            ("seafood harbor chowder", "boston"),
            ("harbor seafood marathon", "boston"),
            ("seafood harbor aquarium", "boston"),
            ("harbor seafood cannoli", "boston"),
            ("mountain skiing altitude", "denver"),
            ("skiing mountain brewery", "denver"),
            ("mountain skiing rockies", "denver"),
            ("skiing mountain hiking", "denver"),
            ("mountain skiing snowboard", "denver"),
            ("skiing mountain trails", "denver"),
        ]
        .into_iter()
        .map(|(text, label)| Record::new(text, label))
        .collect()
    }

    fn nb_pipeline() -> ClassificationPipeline<MultinomialNb> {
        ClassificationPipeline::new(MultinomialNb::new(), PreprocessorConfig::default()).unwrap()
    }

    #[test]
    fn test_fit_and_predict() {
        let mut pipeline = nb_pipeline();
        pipeline.fit(&records()).unwrap();
        assert!(pipeline.is_fitted());
        assert_eq!(pipeline.classes().unwrap(), ["boston", "denver"]);

        assert_eq!(pipeline.predict("fresh seafood by the harbor").unwrap(), 0);
        assert_eq!(
            pipeline
                .predict_batch(&["mountain skiing weekend", "harbor"])
                .unwrap(),
            vec![1, 0]
        );
        assert_eq!(
            pipeline.predict_labels(&["skiing"]).unwrap(),
            vec!["denver".to_string()]
        );
        assert!(pipeline.predict_batch::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_predict_before_fit() {
        let pipeline = nb_pipeline();
        assert!(matches!(
            pipeline.predict("harbor"),
            Err(PipelineError::NotFitted)
        ));
        assert!(matches!(
            pipeline.feature_report(3),
            Err(PipelineError::NotFitted)
        ));
    }

    #[test]
    fn test_cross_validate() {
        let records = records();
        let mut pipeline = nb_pipeline().with_random_state(3);
        let report = pipeline.cross_validate(&records, 3).unwrap();

        assert_eq!(report.fold_scores.len(), 3);
        assert_eq!(report.confusion.dim(), (2, 2));
        assert_eq!(report.num_scored(), records.len());
        assert_eq!(report.classes, vec!["boston", "denver"]);
        assert!((report.mean_accuracy() - 1.0).abs() < 1e-12);

        let scores = report.class_scores();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].support, 6);
        assert!(pipeline.is_fitted());
    }

    #[test]
    fn test_cross_validate_counts_every_selected_record() {
        // Overall "a" (6) leads "b" and "c" (4 each, "b" first by name). The
        // first training fold ranks "b" above "a"; the second has no "b".
        let records = ["charlie cherry"; 4]
            .into_iter()
            .map(|text| Record::new(text, "c"))
            .chain(["alpha apple"; 6].into_iter().map(|text| Record::new(text, "a")))
            .chain(["bravo banana"; 4].into_iter().map(|text| Record::new(text, "b")))
            .collect::<Vec<_>>();

        let mut pipeline = nb_pipeline().with_progress(false);
        let report = pipeline.cross_validate_with(&records, &KFold::new(2)).unwrap();

        assert_eq!(report.classes, vec!["a", "b"]);
        // Fold 1 holds out c×4 and a×3; fold 2 holds out a×3 and b×4 but
        // trains on "a" alone.
        assert_eq!(report.num_scored(), 10);
        assert_eq!(report.confusion, ndarray::array![[6, 0], [4, 0]]);
        assert_eq!(report.fold_scores.len(), 2);
        assert!((report.fold_scores[0] - 1.0).abs() < 1e-12);
        assert!((report.fold_scores[1] - 3.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_validate_is_reproducible() {
        let records = records();
        let first = nb_pipeline()
            .with_random_state(11)
            .cross_validate(&records, 4)
            .unwrap();
        let second = nb_pipeline()
            .with_random_state(11)
            .cross_validate(&records, 4)
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fold_count_validation() {
        let records = records();
        let mut pipeline = nb_pipeline();
        assert!(matches!(
            pipeline.cross_validate(&records, 1),
            Err(PipelineError::InvalidConfiguration(_))
        ));
        assert!(matches!(
            pipeline.cross_validate(&records, 13),
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_empty_held_out_fold() {
        let records = vec![
            Record::new("harbor seafood", "boston"),
            Record::new("mountain skiing", "denver"),
            Record::new("   ", "boston"),
        ];
        let mut pipeline = nb_pipeline();
        let result = pipeline.cross_validate_with(&records, &KFold::new(3));
        assert!(matches!(result, Err(PipelineError::DataShape(_))));
    }

    #[test]
    fn test_feature_report_unsupported() {
        let mut pipeline = nb_pipeline();
        pipeline.fit(&records()).unwrap();
        assert!(matches!(
            pipeline.feature_report(2),
            Err(PipelineError::UnsupportedModel)
        ));
    }

    #[test]
    fn test_feature_report_adaboost() {
        let mut pipeline =
            ClassificationPipeline::new(AdaBoostStumps::new(), PreprocessorConfig::default())
                .unwrap();
        pipeline.fit(&records()).unwrap();
        let report = pipeline.feature_report(2).unwrap();
        assert_eq!(report.most[0], ("harbor".to_string(), 1.0));
        assert_eq!(report.least.len(), 2);
        assert_eq!(report.least[0].1, 0.0);
    }

    struct FixedImportances(Vec<f64>);

    impl Classifier for FixedImportances {
        fn fit(&mut self, _x: &CsMat<f64>, _y: &[usize]) -> std::result::Result<(), ClassifierError> {
            Ok(())
        }

        fn predict(&self, x: &CsMat<f64>) -> std::result::Result<Vec<usize>, ClassifierError> {
            Ok(vec![0; x.rows()])
        }

        fn feature_importances(&self) -> Option<&dyn FeatureImportances> {
            Some(self as &dyn FeatureImportances)
        }
    }

    impl FeatureImportances for FixedImportances {
        fn feature_importances(&self) -> &[f64] {
            &self.0
        }
    }

    #[test]
    fn test_feature_report_ranks_terms() {
        let records = vec![Record::new("aa bb cc", "x"), Record::new("dd ee", "y")];
        let config = PreprocessorConfig::default().with_stop_words(false);
        let mut pipeline =
            ClassificationPipeline::new(FixedImportances(vec![0.1, 0.5, 0.05, 0.3, 0.2]), config)
                .unwrap();
        pipeline.fit(&records).unwrap();

        let report = pipeline.feature_report(1).unwrap();
        assert_eq!(report.least, vec![("cc".to_string(), 0.05)]);
        assert_eq!(report.most, vec![("bb".to_string(), 0.5)]);
    }

    #[test]
    fn test_feature_report_length_mismatch() {
        let records = vec![Record::new("aa bb cc", "x"), Record::new("dd ee", "y")];
        let config = PreprocessorConfig::default().with_stop_words(false);
        let mut pipeline =
            ClassificationPipeline::new(FixedImportances(vec![1.0]), config).unwrap();
        pipeline.fit(&records).unwrap();
        assert!(matches!(
            pipeline.feature_report(1),
            Err(PipelineError::DataShape(_))
        ));
    }

    #[test]
    fn test_invalid_config() {
        let config = PreprocessorConfig::default().with_num_classes(0);
        assert!(matches!(
            ClassificationPipeline::new(MultinomialNb::new(), config),
            Err(PipelineError::InvalidConfiguration(_))
        ));
    }
}
