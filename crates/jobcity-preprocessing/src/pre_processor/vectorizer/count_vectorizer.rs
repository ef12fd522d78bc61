use ahash::HashMap;
use sprs::CsMat;
use tracing::debug;

use super::{
    ngrams::{self, NgramKey},
    params::VectorizerParams,
    tokenizer,
};
use crate::{pre_processor::StopWords, Error, Result};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    /// Applied to tokens before n-grams are formed, at fit and transform time.
    stop_words: StopWords,
    /// Vocabulary mapping n-gram to feature index
    vocab: HashMap<NgramKey, usize>,
}

impl CountVectorizer {
    pub fn fit<T: AsRef<str>>(
        texts: &[T],
        params: VectorizerParams,
        stop_words: StopWords,
    ) -> Result<Self> {
        debug!(num_texts = texts.len(), "Fitting CountVectorizer");
        let ngram_maps = Self::ngram_maps(texts, &params, &stop_words);
        Self::fit_from_ngrams(&ngram_maps, params, stop_words)
    }

    fn ngram_maps<T: AsRef<str>>(
        texts: &[T],
        params: &VectorizerParams,
        stop_words: &StopWords,
    ) -> Vec<HashMap<NgramKey, usize>> {
        tokenizer::tokenize(texts, stop_words)
            .iter()
            .map(|tokens| ngrams::count_ngrams(tokens, params.ngram()))
            .collect()
    }

    /// Build the vocabulary from per-document n-gram counts.
    ///
    /// Terms outside the `[min_df, max_df]` document-frequency window are
    /// pruned; surviving terms get column indices in lexicographic order.
    fn fit_from_ngrams(
        ngram_maps: &[HashMap<NgramKey, usize>],
        params: VectorizerParams,
        stop_words: StopWords,
    ) -> Result<Self> {
        let (min_df, max_df) = params.df_bounds(ngram_maps.len())?;
        let vocab_df = ngrams::document_frequencies(ngram_maps);
        let vocab_size = vocab_df.len();

        debug!(min_df, max_df, "Applying document frequency filtering");
        let mut sorted_tokens = vocab_df
            .into_iter()
            .filter(|(_, df)| (min_df..=max_df).contains(&(*df as f64)))
            .map(|(token, _)| token)
            .collect::<Vec<_>>();
        debug!(
            original_size = vocab_size,
            filtered_size = sorted_tokens.len(),
            "Vocabulary filtered by document frequency"
        );

        if sorted_tokens.is_empty() {
            return Err(Error::DataShape(if vocab_size == 0 {
                "empty vocabulary; the documents may only contain stop words".to_string()
            } else {
                "no terms remain after document frequency pruning".to_string()
            }));
        }

        sorted_tokens.sort();
        let vocab = sorted_tokens
            .into_iter()
            .enumerate()
            .map(|(idx, token)| (token, idx))
            .collect::<HashMap<NgramKey, usize>>();

        debug!(vocab_size = vocab.len(), "CountVectorizer fitting complete");

        Ok(Self {
            params,
            stop_words,
            vocab,
        })
    }

    pub fn transform<T: AsRef<str>>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let ngram_maps = Self::ngram_maps(texts, &self.params, &self.stop_words);
        self.transform_from_ngrams(&ngram_maps)
    }

    /// Build the CSR count matrix; n-grams missing from the vocabulary are
    /// ignored.
    fn transform_from_ngrams(&self, ngram_maps: &[HashMap<NgramKey, usize>]) -> CsMat<f64> {
        let mut indptr = Vec::with_capacity(ngram_maps.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();

        indptr.push(0);
        for ngrams in ngram_maps {
            let mut row_entries = ngrams
                .iter()
                .filter_map(|(ngram_key, &count)| {
                    self.vocab
                        .get(ngram_key)
                        .map(|&col_idx| (col_idx, count as f64))
                })
                .collect::<Vec<_>>();

            row_entries.sort_by_key(|(col_idx, _)| *col_idx);

            for (col_idx, count) in row_entries {
                indices.push(col_idx);
                data.push(count);
            }
            indptr.push(indices.len());
        }

        debug!(
            non_zero_entries = data.len(),
            "Text transformation complete"
        );

        CsMat::new(
            (ngram_maps.len(), self.num_features()),
            indptr,
            indices,
            data,
        )
    }

    /// Fit and transform from a single tokenization/n-gram pass.
    pub fn fit_transform<T: AsRef<str>>(
        texts: &[T],
        params: VectorizerParams,
        stop_words: StopWords,
    ) -> Result<(Self, CsMat<f64>)> {
        debug!(
            num_texts = texts.len(),
            "fit_transform: tokenizing and computing n-grams once"
        );
        let ngram_maps = Self::ngram_maps(texts, &params, &stop_words);
        let vectorizer = Self::fit_from_ngrams(&ngram_maps, params, stop_words)?;
        let transformed = vectorizer.transform_from_ngrams(&ngram_maps);
        Ok((vectorizer, transformed))
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        &self.vocab
    }

    /// Vocabulary terms in column order.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = vec![String::new(); self.vocab.len()];
        for (term, &idx) in &self.vocab {
            names[idx].clone_from(term);
        }
        names
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }
}
