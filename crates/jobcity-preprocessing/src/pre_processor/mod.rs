mod config;
mod stem;
mod stem_lem;
mod stop_words;
mod vectorizer;

use sprs::CsMat;
use tracing::{debug, info};

pub use config::PreprocessorConfig;
pub use stem::{NounLemmatizer, PorterStemmer, SnowballStemmer, WordNormalizer};
pub use stem_lem::StemLem;
pub use stop_words::StopWords;
pub use vectorizer::{
    CountVectorizer, DocFrequency, TfidfVectorizer, Vectorizer, VectorizerParams, Weighting,
};

use crate::{Error, Result};

/// Where stop words are removed. Exactly one stage removes them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StopWordStage {
    Disabled,
    /// Stemming/lemmatization, checked before and after every pass.
    Normalization,
    /// Tokenizer, before n-grams are formed.
    Vectorizer,
}

/// Documents in, sparse feature matrix out.
///
/// Fitting learns the vocabulary (and IDF weights) from the training
/// documents; `transform` then maps any documents onto that fixed feature
/// space, so held-out rows always have the training column count.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct TextPreprocessor {
    config: PreprocessorConfig,
    stop_words: StopWords,
    vectorizer: Option<Vectorizer>,
}

impl TextPreprocessor {
    /// Validate `config` and build an unfitted pre-processor using the
    /// English stop-word list.
    pub fn new(config: PreprocessorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            stop_words: StopWords::english(),
            vectorizer: None,
        })
    }

    /// Replace the stop-word list. Has no effect once fitted.
    #[must_use]
    pub fn with_stop_words(mut self, stop_words: StopWords) -> Self {
        self.stop_words = stop_words;
        self
    }

    fn stop_word_stage(&self) -> StopWordStage {
        if !self.config.use_stop_words {
            StopWordStage::Disabled
        } else if self.config.stem_lem.is_none() {
            StopWordStage::Vectorizer
        } else {
            StopWordStage::Normalization
        }
    }

    fn normalize<T: AsRef<str>>(&self, documents: &[T]) -> Vec<String> {
        let stop_words =
            (self.stop_word_stage() == StopWordStage::Normalization).then_some(&self.stop_words);
        self.config.stem_lem.apply(documents, stop_words)
    }

    fn vectorizer_stop_words(&self) -> StopWords {
        match self.stop_word_stage() {
            StopWordStage::Vectorizer => self.stop_words.clone(),
            StopWordStage::Disabled | StopWordStage::Normalization => StopWords::empty(),
        }
    }

    fn check_shape<T>(&self, documents: &[T], labels: &[usize]) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::DataShape("no documents to fit on".to_string()));
        }
        if documents.len() != labels.len() {
            return Err(Error::DataShape(format!(
                "{} documents but {} labels",
                documents.len(),
                labels.len()
            )));
        }
        if let Some(&label) = labels.iter().find(|&&label| label >= self.config.num_classes) {
            return Err(Error::DataShape(format!(
                "label {label} is out of range for {} classes",
                self.config.num_classes
            )));
        }
        Ok(())
    }

    /// Learn the vocabulary from `documents`. `labels` are only checked
    /// against the documents and the configured number of classes.
    pub fn fit<T: AsRef<str>>(&mut self, documents: &[T], labels: &[usize]) -> Result<()> {
        self.check_shape(documents, labels)?;
        info!(
            num_docs = documents.len(),
            stem_lem = %self.config.stem_lem,
            weighting = %self.config.weighting,
            "Fitting text pre-processor"
        );

        let normalized = self.normalize(documents);
        let vectorizer = Vectorizer::fit(
            &normalized,
            self.config.weighting,
            self.config.vectorizer_params()?,
            self.vectorizer_stop_words(),
        )?;
        debug!(num_features = vectorizer.num_features(), "Pre-processor fitted");
        self.vectorizer = Some(vectorizer);
        Ok(())
    }

    pub fn transform<T: AsRef<str>>(&self, documents: &[T]) -> Result<CsMat<f64>> {
        let vectorizer = self.vectorizer.as_ref().ok_or(Error::NotFitted)?;
        let normalized = self.normalize(documents);
        Ok(vectorizer.transform(&normalized))
    }

    /// Fit on `documents` and return their feature matrix together with the
    /// labels, row-aligned.
    pub fn fit_transform<T: AsRef<str>>(
        &mut self,
        documents: &[T],
        labels: &[usize],
    ) -> Result<(CsMat<f64>, Vec<usize>)> {
        self.check_shape(documents, labels)?;
        info!(
            num_docs = documents.len(),
            stem_lem = %self.config.stem_lem,
            weighting = %self.config.weighting,
            "Fitting text pre-processor"
        );

        let normalized = self.normalize(documents);
        let (vectorizer, matrix) = Vectorizer::fit_transform(
            &normalized,
            self.config.weighting,
            self.config.vectorizer_params()?,
            self.vectorizer_stop_words(),
        )?;
        debug!(
            num_features = vectorizer.num_features(),
            nnz = matrix.nnz(),
            "Pre-processor fitted"
        );
        self.vectorizer = Some(vectorizer);
        Ok((matrix, labels.to_vec()))
    }

    /// Vocabulary terms in column order.
    pub fn feature_names(&self) -> Result<Vec<String>> {
        self.vectorizer
            .as_ref()
            .map(Vectorizer::feature_names)
            .ok_or(Error::NotFitted)
    }

    /// Zero until fitted.
    pub fn num_features(&self) -> usize {
        self.vectorizer.as_ref().map_or(0, Vectorizer::num_features)
    }

    pub fn is_fitted(&self) -> bool {
        self.vectorizer.is_some()
    }

    pub fn config(&self) -> &PreprocessorConfig {
        &self.config
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    #[cfg(feature = "bincode")]
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    #[cfg(feature = "bincode")]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let (preprocessor, _): (Self, usize) =
            bincode::decode_from_slice(bytes, bincode::config::standard())?;
        Ok(preprocessor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: [&str; 3] = ["new york city jobs", "new york city jobs", "los angeles jobs"];

    fn no_stop_words() -> PreprocessorConfig {
        PreprocessorConfig::default().with_stop_words(false)
    }

    #[test]
    fn test_fit_transform_shape() {
        let mut preprocessor = TextPreprocessor::new(no_stop_words()).unwrap();
        let (matrix, labels) = preprocessor.fit_transform(&DOCS, &[0, 0, 1]).unwrap();

        assert_eq!(matrix.shape(), (3, 6));
        assert_eq!(labels, vec![0, 0, 1]);
        assert_eq!(
            preprocessor.feature_names().unwrap(),
            vec!["angeles", "city", "jobs", "los", "new", "york"]
        );
        let dense = matrix.to_dense();
        assert_eq!(dense.row(0), dense.row(1));
        assert_ne!(dense.row(0), dense.row(2));
    }

    #[test]
    fn test_transform_before_fit() {
        let preprocessor = TextPreprocessor::new(PreprocessorConfig::default()).unwrap();
        assert!(!preprocessor.is_fitted());
        assert_eq!(preprocessor.num_features(), 0);
        assert!(matches!(preprocessor.transform(&DOCS), Err(Error::NotFitted)));
        assert!(matches!(preprocessor.feature_names(), Err(Error::NotFitted)));
    }

    #[test]
    fn test_transform_keeps_training_columns() {
        let mut preprocessor = TextPreprocessor::new(no_stop_words()).unwrap();
        preprocessor.fit(&DOCS, &[0, 0, 1]).unwrap();
        let matrix = preprocessor
            .transform(&["chicago jobs", "", "boston"])
            .unwrap();
        assert_eq!(matrix.shape(), (3, 6));
        assert_eq!(matrix.outer_view(1).unwrap().nnz(), 0);
        assert_eq!(matrix.outer_view(2).unwrap().nnz(), 0);
    }

    #[test]
    fn test_vocabulary_is_deterministic() {
        let config = no_stop_words().with_ngram(2);
        let mut first = TextPreprocessor::new(config.clone()).unwrap();
        let mut second = TextPreprocessor::new(config).unwrap();
        first.fit(&DOCS, &[0, 0, 1]).unwrap();
        second.fit(&DOCS, &[0, 0, 1]).unwrap();
        assert_eq!(first.feature_names().unwrap(), second.feature_names().unwrap());
    }

    #[test]
    fn test_stop_words_never_in_vocabulary() {
        let docs = [
            "the engineers and the analysts",
            "we are hiring engineers for the team",
        ];
        let stop_words = StopWords::from_words(["the", "and", "we", "are", "for"]);
        for stem_lem in [StemLem::None, StemLem::Lemmatize, StemLem::StemSnowball] {
            let config = PreprocessorConfig::default().with_stem_lem(stem_lem);
            let mut preprocessor = TextPreprocessor::new(config)
                .unwrap()
                .with_stop_words(stop_words.clone());
            preprocessor.fit(&docs, &[0, 1]).unwrap();
            let names = preprocessor.feature_names().unwrap();
            assert!(!names.is_empty());
            for term in names {
                assert!(!stop_words.contains(&term), "{term} kept under {stem_lem}");
            }
        }
    }

    #[test]
    fn test_punctuated_stop_words_never_in_vocabulary() {
        let docs = ["The engineers, and the analysts.", "we're hiring (the) team for ops"];
        let stop_words = StopWords::from_words(["the", "and", "we", "are", "for"]);
        for stem_lem in [
            StemLem::None,
            StemLem::Lemmatize,
            StemLem::StemPorter,
            StemLem::StemSnowball,
            StemLem::LemmatizeThenStemPorter,
            StemLem::LemmatizeThenStemSnowball,
        ] {
            let config = PreprocessorConfig::default().with_stem_lem(stem_lem);
            let mut preprocessor = TextPreprocessor::new(config)
                .unwrap()
                .with_stop_words(stop_words.clone());
            preprocessor.fit(&docs, &[0, 1]).unwrap();
            let names = preprocessor.feature_names().unwrap();
            assert!(names.contains(&"team".to_string()), "{names:?} under {stem_lem}");
            for term in names {
                assert!(!stop_words.contains(&term), "{term} kept under {stem_lem}");
            }
        }
    }

    #[test]
    fn test_fit_then_transform_matches_fit_transform() {
        for weighting in [Weighting::Count, Weighting::TfIdf] {
            let config = no_stop_words().with_weighting(weighting);
            let mut fitted = TextPreprocessor::new(config.clone()).unwrap();
            fitted.fit(&DOCS, &[0, 0, 1]).unwrap();
            let mut fit_transformed = TextPreprocessor::new(config).unwrap();
            let (matrix, _) = fit_transformed.fit_transform(&DOCS, &[0, 0, 1]).unwrap();

            assert_eq!(fitted.feature_names().unwrap(), fit_transformed.feature_names().unwrap());
            assert_eq!(fitted.transform(&DOCS).unwrap().to_dense(), matrix.to_dense());
        }
    }

    #[test]
    fn test_stop_word_stage() {
        let stage = |config: PreprocessorConfig| {
            TextPreprocessor::new(config).unwrap().stop_word_stage()
        };
        assert_eq!(stage(no_stop_words()), StopWordStage::Disabled);
        assert_eq!(stage(PreprocessorConfig::default()), StopWordStage::Vectorizer);
        assert_eq!(
            stage(PreprocessorConfig::default().with_stem_lem(StemLem::StemPorter)),
            StopWordStage::Normalization
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = PreprocessorConfig::default().with_ngram(0);
        assert!(matches!(
            TextPreprocessor::new(config),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_shape_errors() {
        let mut preprocessor = TextPreprocessor::new(no_stop_words()).unwrap();
        assert!(matches!(
            preprocessor.fit(&DOCS, &[0, 1]),
            Err(Error::DataShape(_))
        ));
        assert!(matches!(
            preprocessor.fit::<&str>(&[], &[]),
            Err(Error::DataShape(_))
        ));
        assert!(matches!(
            preprocessor.fit(&DOCS, &[0, 0, 2]),
            Err(Error::DataShape(_))
        ));
        assert!(!preprocessor.is_fitted());
    }

    #[test]
    fn test_count_weighting() {
        let config = no_stop_words().with_weighting(Weighting::Count);
        let mut preprocessor = TextPreprocessor::new(config).unwrap();
        let (matrix, _) = preprocessor
            .fit_transform(&["jobs jobs city", "city"], &[0, 1])
            .unwrap();
        assert_eq!(matrix.get(0, 1), Some(&2.0));
        assert_eq!(matrix.get(1, 0), Some(&1.0));
    }

    #[cfg(feature = "bincode")]
    #[test]
    fn test_bytes_round_trip() {
        let mut preprocessor = TextPreprocessor::new(no_stop_words()).unwrap();
        preprocessor.fit(&DOCS, &[0, 0, 1]).unwrap();
        let restored = TextPreprocessor::from_bytes(&preprocessor.to_bytes().unwrap()).unwrap();
        assert_eq!(
            restored.transform(&DOCS).unwrap().to_dense(),
            preprocessor.transform(&DOCS).unwrap().to_dense()
        );
    }
}
