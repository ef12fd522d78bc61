use std::{fmt, str::FromStr};

use crate::{Error, Result};

/// A document-frequency threshold.
///
/// The unit follows the numeric type the caller supplies: an integer is an
/// absolute number of documents, a float is a proportion of the corpus.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DocFrequency {
    Count(usize),
    Proportion(f64),
}

impl DocFrequency {
    /// Resolve against a corpus of `num_docs` documents.
    #[must_use]
    pub fn resolve(self, num_docs: usize) -> f64 {
        match self {
            Self::Count(count) => count as f64,
            Self::Proportion(proportion) => proportion * num_docs as f64,
        }
    }

    fn validate(self, name: &str) -> Result<()> {
        match self {
            Self::Proportion(p) if !(0.0..=1.0).contains(&p) => Err(Error::InvalidConfiguration(
                format!("{name} proportion must be within [0, 1], got {p}"),
            )),
            _ => Ok(()),
        }
    }
}

impl From<usize> for DocFrequency {
    fn from(count: usize) -> Self {
        Self::Count(count)
    }
}

impl From<f64> for DocFrequency {
    fn from(proportion: f64) -> Self {
        Self::Proportion(proportion)
    }
}

impl FromStr for DocFrequency {
    type Err = Error;

    /// `"3"` is a count, `"0.5"` or `"1.0"` a proportion.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(count) = s.parse::<usize>() {
            return Ok(Self::Count(count));
        }
        s.parse::<f64>()
            .map(Self::Proportion)
            .map_err(|_| Error::InvalidConfiguration(format!("invalid document frequency: {s:?}")))
    }
}

impl fmt::Display for DocFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(count) => write!(f, "{count}"),
            Self::Proportion(p) => write!(f, "{p:?}"),
        }
    }
}

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorizerParams {
    /// Exact phrase length; only n-grams of this many tokens are extracted.
    ngram: usize,
    /// Terms present in fewer documents than this are dropped.
    min_df: DocFrequency,
    /// Terms present in more documents than this are dropped.
    max_df: DocFrequency,
    /// Apply sublinear tf scaling: replace term frequency `tf` with `1 + ln(tf)`.
    /// Only affects TF-IDF weighting.
    sublinear_tf: bool,
}

impl VectorizerParams {
    pub fn new(
        ngram: usize,
        min_df: impl Into<DocFrequency>,
        max_df: impl Into<DocFrequency>,
        sublinear_tf: bool,
    ) -> Result<Self> {
        let params = Self {
            ngram,
            min_df: min_df.into(),
            max_df: max_df.into(),
            sublinear_tf,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ngram == 0 {
            return Err(Error::InvalidConfiguration(
                "n-gram width must be positive".to_string(),
            ));
        }
        self.min_df.validate("min_df")?;
        self.max_df.validate("max_df")?;

        let inverted = match (self.min_df, self.max_df) {
            (DocFrequency::Count(min), DocFrequency::Count(max)) => max < min,
            (DocFrequency::Proportion(min), DocFrequency::Proportion(max)) => max < min,
            // Mixed units can only be compared once the corpus size is known.
            _ => false,
        };
        if inverted {
            return Err(Error::InvalidConfiguration(format!(
                "max_df ({}) is below min_df ({})",
                self.max_df, self.min_df
            )));
        }
        Ok(())
    }

    /// Resolve `(min, max)` document counts for a corpus of `num_docs`.
    pub fn df_bounds(&self, num_docs: usize) -> Result<(f64, f64)> {
        let min = self.min_df.resolve(num_docs);
        let max = self.max_df.resolve(num_docs);
        if max < min {
            return Err(Error::InvalidConfiguration(format!(
                "max_df ({}) corresponds to fewer documents than min_df ({}) for {num_docs} documents",
                self.max_df, self.min_df
            )));
        }
        Ok((min, max))
    }

    #[must_use]
    pub fn ngram(&self) -> usize {
        self.ngram
    }

    #[must_use]
    pub fn min_df(&self) -> DocFrequency {
        self.min_df
    }

    #[must_use]
    pub fn max_df(&self) -> DocFrequency {
        self.max_df
    }

    #[must_use]
    pub fn sublinear_tf(&self) -> bool {
        self.sublinear_tf
    }
}

impl Default for VectorizerParams {
    fn default() -> Self {
        Self {
            ngram: 1,
            min_df: DocFrequency::Count(1),
            max_df: DocFrequency::Proportion(1.0),
            sublinear_tf: false,
        }
    }
}
