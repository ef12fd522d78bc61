use ahash::HashMap;

/// An n-gram: its tokens joined by a single space.
pub type NgramKey = String;

/// Count every contiguous run of exactly `n` tokens.
pub fn count_ngrams(tokens: &[String], n: usize) -> HashMap<NgramKey, usize> {
    let mut ngram_counter = HashMap::default();
    if n == 0 {
        return ngram_counter;
    }
    for window in tokens.windows(n) {
        *ngram_counter.entry(window.join(" ")).or_insert(0) += 1;
    }
    ngram_counter
}

/// Number of documents each n-gram appears in.
pub fn document_frequencies(ngram_maps: &[HashMap<NgramKey, usize>]) -> HashMap<NgramKey, usize> {
    let mut vocab_df = HashMap::default();
    for ngram_map in ngram_maps {
        for ngram_key in ngram_map.keys() {
            *vocab_df.entry(ngram_key.clone()).or_insert(0) += 1;
        }
    }
    vocab_df
}
