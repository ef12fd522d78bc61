use std::{fmt, str::FromStr};

use tracing::debug;

use super::{
    stem::{NounLemmatizer, PorterStemmer, SnowballStemmer, WordNormalizer},
    vectorizer::split_words,
    StopWords,
};
use crate::{Error, Result};

/// Stemming/lemmatization applied to each document before vectorization.
///
/// Lemmatization always runs before stemming, and at most one stemmer runs.
#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StemLem {
    #[default]
    None,
    Lemmatize,
    StemPorter,
    StemSnowball,
    LemmatizeThenStemPorter,
    LemmatizeThenStemSnowball,
}

impl StemLem {
    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::None
    }

    #[must_use]
    pub fn lemmatizes(self) -> bool {
        matches!(
            self,
            Self::Lemmatize | Self::LemmatizeThenStemPorter | Self::LemmatizeThenStemSnowball
        )
    }

    fn passes(self) -> Vec<Box<dyn WordNormalizer>> {
        let mut passes: Vec<Box<dyn WordNormalizer>> = Vec::with_capacity(2);
        if self.lemmatizes() {
            passes.push(Box::new(NounLemmatizer));
        }
        match self {
            Self::StemPorter | Self::LemmatizeThenStemPorter => {
                passes.push(Box::new(PorterStemmer));
            }
            Self::StemSnowball | Self::LemmatizeThenStemSnowball => {
                passes.push(Box::new(SnowballStemmer::default()));
            }
            Self::None | Self::Lemmatize => {}
        }
        passes
    }

    /// Run every configured pass over `documents`.
    ///
    /// Each document is split into words exactly as the tokenizer splits it,
    /// and each word goes through every pass in turn. A word is dropped when
    /// it, or any form a pass turns it into, is in `stop_words`, so no stop
    /// word reaches the vectorizer. With `StemLem::None` the documents are
    /// returned unchanged and `stop_words` is ignored: removal is then the
    /// vectorizer's job.
    pub fn apply<T: AsRef<str>>(self, documents: &[T], stop_words: Option<&StopWords>) -> Vec<String> {
        let passes = self.passes();
        if passes.is_empty() {
            return documents
                .iter()
                .map(|doc| doc.as_ref().to_string())
                .collect();
        }

        debug!(num_docs = documents.len(), mode = %self, "Normalizing documents");
        documents
            .iter()
            .map(|doc| normalize_document(doc.as_ref(), &passes, stop_words))
            .collect()
    }
}

/// Split `text` into words, run each through `passes` and drop stop words.
/// Punctuation becomes word boundaries.
fn normalize_document(
    text: &str,
    passes: &[Box<dyn WordNormalizer>],
    stop_words: Option<&StopWords>,
) -> String {
    let is_stop_word = |word: &str| stop_words.is_some_and(|stop_words| stop_words.contains(word));

    split_words(text)
        .into_iter()
        .filter_map(|mut word| {
            if is_stop_word(&word) {
                return None;
            }
            for pass in passes {
                let normalized = pass.normalize(&word).into_owned();
                if is_stop_word(&normalized) {
                    return None;
                }
                word = normalized;
            }
            Some(word)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl FromStr for StemLem {
    type Err = Error;

    /// Parse a list of method names such as `"wordnet"`, `"porter"`,
    /// `"snowball"` or `"wordnet+snowball"`. When both stemmers are named,
    /// snowball wins.
    fn from_str(s: &str) -> Result<Self> {
        let mut lemmatize = false;
        let mut porter = false;
        let mut snowball = false;

        for name in s
            .split(|c: char| c == ',' || c == '+' || c.is_whitespace())
            .filter(|name| !name.is_empty())
        {
            match name.to_ascii_lowercase().as_str() {
                "none" => {}
                "wordnet" | "lemmatize" | "lemma" => lemmatize = true,
                "porter" => porter = true,
                "snowball" => snowball = true,
                other => {
                    return Err(Error::InvalidConfiguration(format!(
                        "unknown stemming/lemmatization method: {other:?}"
                    )))
                }
            }
        }

        Ok(match (lemmatize, snowball, porter) {
            (false, false, false) => Self::None,
            (true, false, false) => Self::Lemmatize,
            (false, true, _) => Self::StemSnowball,
            (false, false, true) => Self::StemPorter,
            (true, true, _) => Self::LemmatizeThenStemSnowball,
            (true, false, true) => Self::LemmatizeThenStemPorter,
        })
    }
}

impl fmt::Display for StemLem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Lemmatize => "wordnet",
            Self::StemPorter => "porter",
            Self::StemSnowball => "snowball",
            Self::LemmatizeThenStemPorter => "wordnet+porter",
            Self::LemmatizeThenStemSnowball => "wordnet+snowball",
        };
        f.write_str(name)
    }
}
