mod count_vectorizer;
mod ngrams;
mod params;
mod tfidf_vectorizer;
mod tokenizer;

use std::{fmt, str::FromStr};

use sprs::CsMat;

pub use count_vectorizer::CountVectorizer;
pub use params::{DocFrequency, VectorizerParams};
pub use tfidf_vectorizer::TfidfVectorizer;
pub(crate) use tokenizer::split_words;

use crate::{pre_processor::StopWords, Error, Result};

/// Term weighting applied to the count matrix.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Weighting {
    /// Raw n-gram counts.
    Count,
    /// Smoothed TF-IDF with L2-normalized rows.
    #[default]
    TfIdf,
}

impl FromStr for Weighting {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "count" | "bow" => Ok(Self::Count),
            "tfidf" | "tf-idf" => Ok(Self::TfIdf),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown weighting scheme: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for Weighting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count => write!(f, "count"),
            Self::TfIdf => write!(f, "tfidf"),
        }
    }
}

/// A fitted vectorizer of either weighting scheme.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub enum Vectorizer {
    Count(CountVectorizer),
    TfIdf(TfidfVectorizer),
}

impl Vectorizer {
    pub fn fit<T: AsRef<str>>(
        texts: &[T],
        weighting: Weighting,
        params: VectorizerParams,
        stop_words: StopWords,
    ) -> Result<Self> {
        Ok(match weighting {
            Weighting::Count => Self::Count(CountVectorizer::fit(texts, params, stop_words)?),
            Weighting::TfIdf => Self::TfIdf(TfidfVectorizer::fit(texts, params, stop_words)?),
        })
    }

    pub fn fit_transform<T: AsRef<str>>(
        texts: &[T],
        weighting: Weighting,
        params: VectorizerParams,
        stop_words: StopWords,
    ) -> Result<(Self, CsMat<f64>)> {
        Ok(match weighting {
            Weighting::Count => {
                let (vectorizer, matrix) = CountVectorizer::fit_transform(texts, params, stop_words)?;
                (Self::Count(vectorizer), matrix)
            }
            Weighting::TfIdf => {
                let (vectorizer, matrix) = TfidfVectorizer::fit_transform(texts, params, stop_words)?;
                (Self::TfIdf(vectorizer), matrix)
            }
        })
    }

    pub fn transform<T: AsRef<str>>(&self, texts: &[T]) -> CsMat<f64> {
        match self {
            Self::Count(vectorizer) => vectorizer.transform(texts),
            Self::TfIdf(vectorizer) => vectorizer.transform(texts),
        }
    }

    pub fn num_features(&self) -> usize {
        match self {
            Self::Count(vectorizer) => vectorizer.num_features(),
            Self::TfIdf(vectorizer) => vectorizer.num_features(),
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        match self {
            Self::Count(vectorizer) => vectorizer.feature_names(),
            Self::TfIdf(vectorizer) => vectorizer.feature_names(),
        }
    }
}
