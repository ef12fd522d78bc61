use super::{DocFrequency, StemLem, VectorizerParams, Weighting};
use crate::{Error, Result};

/// Everything that shapes the document → feature transformation.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
#[derive(Clone, Debug, PartialEq)]
pub struct PreprocessorConfig {
    pub stem_lem: StemLem,
    pub min_df: DocFrequency,
    pub max_df: DocFrequency,
    /// Exact n-gram width.
    pub ngram: usize,
    pub use_stop_words: bool,
    pub num_classes: usize,
    pub weighting: Weighting,
    pub sublinear_tf: bool,
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        Self {
            stem_lem: StemLem::None,
            min_df: DocFrequency::Count(1),
            max_df: DocFrequency::Proportion(1.0),
            ngram: 1,
            use_stop_words: true,
            num_classes: 2,
            weighting: Weighting::TfIdf,
            sublinear_tf: false,
        }
    }
}

impl PreprocessorConfig {
    #[must_use]
    pub fn with_stem_lem(mut self, stem_lem: StemLem) -> Self {
        self.stem_lem = stem_lem;
        self
    }

    #[must_use]
    pub fn with_min_df(mut self, min_df: impl Into<DocFrequency>) -> Self {
        self.min_df = min_df.into();
        self
    }

    #[must_use]
    pub fn with_max_df(mut self, max_df: impl Into<DocFrequency>) -> Self {
        self.max_df = max_df.into();
        self
    }

    #[must_use]
    pub fn with_ngram(mut self, ngram: usize) -> Self {
        self.ngram = ngram;
        self
    }

    #[must_use]
    pub fn with_stop_words(mut self, use_stop_words: bool) -> Self {
        self.use_stop_words = use_stop_words;
        self
    }

    #[must_use]
    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    #[must_use]
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    #[must_use]
    pub fn with_sublinear_tf(mut self, sublinear_tf: bool) -> Self {
        self.sublinear_tf = sublinear_tf;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(Error::InvalidConfiguration(
                "number of classes must be positive".to_string(),
            ));
        }
        self.vectorizer_params().map(|_| ())
    }

    pub fn vectorizer_params(&self) -> Result<VectorizerParams> {
        VectorizerParams::new(self.ngram, self.min_df, self.max_df, self.sublinear_tf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(PreprocessorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_configurations() {
        let invalid = [
            PreprocessorConfig::default().with_num_classes(0),
            PreprocessorConfig::default().with_ngram(0),
            PreprocessorConfig::default().with_min_df(4usize).with_max_df(2usize),
            PreprocessorConfig::default().with_max_df(1.5),
        ];
        for config in invalid {
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfiguration(_))),
                "{config:?} should be rejected"
            );
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_config() {
        let config: PreprocessorConfig =
            serde_json::from_str(r#"{"stem_lem": "stem_snowball", "min_df": 2, "max_df": 0.9}"#)
                .unwrap();
        assert_eq!(config.stem_lem, StemLem::StemSnowball);
        assert_eq!(config.min_df, DocFrequency::Count(2));
        assert_eq!(config.max_df, DocFrequency::Proportion(0.9));
        assert_eq!(config.ngram, 1);
    }
}
