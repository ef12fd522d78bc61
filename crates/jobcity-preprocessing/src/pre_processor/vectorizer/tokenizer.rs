use tracing::debug;

use crate::pre_processor::StopWords;

/// Tokens shorter than this are discarded.
const MIN_TOKEN_CHARS: usize = 2;

/// Lowercase `text` and split it into maximal runs of alphanumeric
/// characters (or `_`).
pub(crate) fn split_words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercase `text` and split it into word tokens.
///
/// A token is a word from [`split_words`] at least two characters long.
/// Tokens found in `stop_words` are dropped before n-grams are formed.
pub fn tokenize_text(text: &str, stop_words: &StopWords) -> Vec<String> {
    split_words(text)
        .into_iter()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|token| !stop_words.contains(token))
        .collect()
}

pub fn tokenize<T: AsRef<str>>(texts: &[T], stop_words: &StopWords) -> Vec<Vec<String>> {
    debug!(
        num_texts = texts.len(),
        num_stop_words = stop_words.len(),
        "Tokenizing texts"
    );
    texts
        .iter()
        .map(|text| tokenize_text(text.as_ref(), stop_words))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercases_and_strips_punctuation() {
        let tokens = tokenize_text("Senior Rust-Engineer, (remote) I/O!", &StopWords::empty());
        assert_eq!(tokens, vec!["senior", "rust", "engineer", "remote"]);
    }

    #[test]
    fn test_drops_stop_words() {
        let stop_words = StopWords::from_words(["the", "of"]);
        let tokens = tokenize_text("The Head of Sales", &stop_words);
        assert_eq!(tokens, vec!["head", "sales"]);
    }

    #[test]
    fn test_split_words_keeps_short_words() {
        assert_eq!(split_words("(The) a-b, C."), vec!["the", "a", "b", "c"]);
    }

    #[test]
    fn test_keeps_digits_and_unicode() {
        let tokens = tokenize_text("café 401k", &StopWords::empty());
        assert_eq!(tokens, vec!["café", "401k"]);
    }
}
