use ahash::HashMap;
use sprs::CsMat;
use tracing::debug;

use super::{count_vectorizer::CountVectorizer, params::VectorizerParams};
use crate::{pre_processor::StopWords, Result};

#[cfg_attr(feature = "bincode", derive(bincode::Encode, bincode::Decode))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and IDF weights without weighting the
    /// training matrix.
    pub fn fit<T: AsRef<str>>(
        texts: &[T],
        params: VectorizerParams,
        stop_words: StopWords,
    ) -> Result<Self> {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, counts) = CountVectorizer::fit_transform(texts, params, stop_words)?;
        Ok(Self::from_counts(count_vectorizer, &counts))
    }

    pub fn transform<T: AsRef<str>>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        let mut tf_matrix = self.count_vectorizer.transform(texts);
        self.apply_idf(&mut tf_matrix);
        tf_matrix
    }

    pub fn fit_transform<T: AsRef<str>>(
        texts: &[T],
        params: VectorizerParams,
        stop_words: StopWords,
    ) -> Result<(Self, CsMat<f64>)> {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, mut tf_matrix) =
            CountVectorizer::fit_transform(texts, params, stop_words)?;
        let vectorizer = Self::from_counts(count_vectorizer, &tf_matrix);
        vectorizer.apply_idf(&mut tf_matrix);
        Ok((vectorizer, tf_matrix))
    }

    /// IDF from the training count matrix: `ln((n_docs + 1) / (df + 1)) + 1`.
    fn from_counts(count_vectorizer: CountVectorizer, counts: &CsMat<f64>) -> Self {
        let n_docs = counts.rows() as f64;
        let mut df = vec![0usize; count_vectorizer.num_features()];
        for row_vec in counts.outer_iterator() {
            for (col_idx, _val) in row_vec.iter() {
                df[col_idx] += 1;
            }
        }
        let idf = df
            .iter()
            .map(|&doc_freq| ((n_docs + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0)
            .collect();
        debug!("IDF calculation complete");

        Self {
            count_vectorizer,
            idf,
        }
    }

    /// Weight raw counts in place: optional sublinear tf, idf, then L2 row
    /// normalization.
    fn apply_idf(&self, tf_matrix: &mut CsMat<f64>) {
        let sublinear_tf = self.count_vectorizer.params().sublinear_tf();
        for mut row_vec in tf_matrix.outer_iterator_mut() {
            for (col_idx, val) in row_vec.iter_mut() {
                if sublinear_tf {
                    *val = 1.0 + val.ln();
                }
                *val *= self.idf[col_idx];
            }

            let norm = row_vec.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, val) in row_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }
    }

    pub fn num_features(&self) -> usize {
        self.count_vectorizer.num_features()
    }

    pub fn vocabulary(&self) -> &HashMap<String, usize> {
        self.count_vectorizer.vocabulary()
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.count_vectorizer.feature_names()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: [&str; 3] = ["new york city jobs", "new york city jobs", "los angeles jobs"];

    #[test]
    fn test_rows_are_unit_length() {
        let (_, matrix) =
            TfidfVectorizer::fit_transform(&DOCS, VectorizerParams::default(), StopWords::empty())
                .unwrap();
        for row in matrix.outer_iterator() {
            let norm = row.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_idf_lower_for_common_terms() {
        let vectorizer =
            TfidfVectorizer::fit(&DOCS, VectorizerParams::default(), StopWords::empty()).unwrap();
        let vocab = vectorizer.vocabulary();
        let idf = vectorizer.idf();
        // "jobs" is in every document: ln(4/4) + 1
        assert!((idf[vocab["jobs"]] - 1.0).abs() < 1e-12);
        assert!(idf[vocab["los"]] > idf[vocab["new"]]);
    }

    #[test]
    fn test_transform_matches_fit_transform() {
        let (vectorizer, fitted) =
            TfidfVectorizer::fit_transform(&DOCS, VectorizerParams::default(), StopWords::empty())
                .unwrap();
        let transformed = vectorizer.transform(&DOCS);
        assert_eq!(fitted.to_dense(), transformed.to_dense());
    }

    #[test]
    fn test_fit_learns_same_idf_as_fit_transform() {
        let fitted =
            TfidfVectorizer::fit(&DOCS, VectorizerParams::default(), StopWords::empty()).unwrap();
        let (fit_transformed, matrix) =
            TfidfVectorizer::fit_transform(&DOCS, VectorizerParams::default(), StopWords::empty())
                .unwrap();
        assert_eq!(fitted.idf(), fit_transformed.idf());
        assert_eq!(fitted.transform(&DOCS).to_dense(), matrix.to_dense());
    }

    #[test]
    fn test_sublinear_tf_dampens_repeats() {
        let docs = ["rust rust rust rust go", "go python"];
        let linear = VectorizerParams::new(1, 1usize, 1.0, false).unwrap();
        let sublinear = VectorizerParams::new(1, 1usize, 1.0, true).unwrap();
        let (lin, lin_matrix) =
            TfidfVectorizer::fit_transform(&docs, linear, StopWords::empty()).unwrap();
        let (_, sub_matrix) =
            TfidfVectorizer::fit_transform(&docs, sublinear, StopWords::empty()).unwrap();
        let rust = lin.vocabulary()["rust"];
        let go = lin.vocabulary()["go"];
        let lin_ratio = lin_matrix.get(0, rust).unwrap() / lin_matrix.get(0, go).unwrap();
        let sub_ratio = sub_matrix.get(0, rust).unwrap() / sub_matrix.get(0, go).unwrap();
        assert!(sub_ratio < lin_ratio);
    }
}
