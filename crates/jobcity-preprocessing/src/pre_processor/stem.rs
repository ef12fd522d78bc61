//! Word-level stemmers and the noun lemmatizer.
//!
//! All normalizers lowercase their input. Words that are not plain ASCII are
//! returned lowercased but otherwise untouched by the Porter stemmer.
//!
//! # References
//!
//! Porter, M.F. (1980). "An algorithm for suffix stripping."
//! Program, 14(3), 130-137.

use std::borrow::Cow;

use rust_stemmers::Algorithm;

/// Maps a single whitespace-delimited word to its normalized form.
pub trait WordNormalizer {
    fn normalize<'a>(&self, word: &'a str) -> Cow<'a, str>;
}

/// The original Porter stemming algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl WordNormalizer for PorterStemmer {
    fn normalize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        let lower = word.to_lowercase();
        if lower.len() <= 2 || !lower.bytes().all(|b| b.is_ascii_lowercase()) {
            return Cow::Owned(lower);
        }
        Cow::Owned(Porter::new(lower.into_bytes()).stem())
    }
}

/// Snowball English ("Porter2"), via `rust-stemmers`.
pub struct SnowballStemmer(rust_stemmers::Stemmer);

impl Default for SnowballStemmer {
    fn default() -> Self {
        Self(rust_stemmers::Stemmer::create(Algorithm::English))
    }
}

impl WordNormalizer for SnowballStemmer {
    fn normalize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        Cow::Owned(self.0.stem(&word.to_lowercase()).into_owned())
    }
}

/// Irregular plurals.
const IRREGULAR_NOUNS: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("criteria", "criterion"),
    ("analyses", "analysis"),
    ("bases", "basis"),
    ("diagnoses", "diagnosis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("employees", "employee"),
    ("salespeople", "salesperson"),
];

/// Words ending in `s` that are already base forms.
const INVARIANT_NOUNS: &[&str] = &[
    "news",
    "series",
    "species",
    "physics",
    "mathematics",
    "economics",
    "analytics",
    "logistics",
    "statistics",
    "electronics",
    "sales",
    "operations",
    "always",
    "perhaps",
    "whereas",
    "towards",
    "its",
    "this",
    "thus",
    "has",
    "was",
    "does",
    "yes",
];

/// Rule-based English noun lemmatizer.
///
/// Applies the WordNet noun detachment rules (`-ies → -y`, `-xes → -x`,
/// `-ches → -ch`, `-s → ""`, ...) guarded by an irregular/invariant
/// exception table instead of a dictionary lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct NounLemmatizer;

impl WordNormalizer for NounLemmatizer {
    fn normalize<'a>(&self, word: &'a str) -> Cow<'a, str> {
        let lower = word.to_lowercase();
        Cow::Owned(lemmatize_noun(&lower).unwrap_or(lower))
    }
}

fn lemmatize_noun(word: &str) -> Option<String> {
    if let Some((_, lemma)) = IRREGULAR_NOUNS.iter().find(|(plural, _)| *plural == word) {
        return Some((*lemma).to_string());
    }
    if word.len() <= 3
        || INVARIANT_NOUNS.contains(&word)
        || ["ss", "us", "is"].iter().any(|suffix| word.ends_with(suffix))
    {
        return None;
    }

    if let Some(stem) = word.strip_suffix("ies") {
        return Some(format!("{stem}y"));
    }
    if let Some(stem) = word.strip_suffix("sses") {
        return Some(format!("{stem}ss"));
    }
    for suffix in ["xes", "zes", "ches", "shes"] {
        if word.ends_with(suffix) {
            return Some(word[..word.len() - 2].to_string());
        }
    }
    word.strip_suffix('s').map(str::to_string)
}

/// Working state of the Porter algorithm over an ASCII lowercase buffer.
///
/// `k` is the index of the last character of the current word and `j` the
/// end of the stem found by the last successful `ends` call. Both may go
/// negative for very short remainders, hence `isize`.
struct Porter {
    b: Vec<u8>,
    k: isize,
    j: isize,
}

impl Porter {
    fn new(b: Vec<u8>) -> Self {
        let k = b.len() as isize - 1;
        Self { b, k, j: 0 }
    }

    fn at(&self, i: isize) -> u8 {
        self.b[i as usize]
    }

    fn cons(&self, i: isize) -> bool {
        match self.at(i) {
            b'a' | b'e' | b'i' | b'o' | b'u' => false,
            b'y' => i == 0 || !self.cons(i - 1),
            _ => true,
        }
    }

    /// Number of consonant-vowel sequences in `b[0..=j]`.
    fn m(&self) -> usize {
        let mut n = 0;
        let mut i = 0;
        loop {
            if i > self.j {
                return n;
            }
            if !self.cons(i) {
                break;
            }
            i += 1;
        }
        i += 1;
        loop {
            loop {
                if i > self.j {
                    return n;
                }
                if self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
            n += 1;
            loop {
                if i > self.j {
                    return n;
                }
                if !self.cons(i) {
                    break;
                }
                i += 1;
            }
            i += 1;
        }
    }

    fn vowel_in_stem(&self) -> bool {
        (0..=self.j).any(|i| !self.cons(i))
    }

    fn double_consonant(&self, j: isize) -> bool {
        j >= 1 && self.at(j) == self.at(j - 1) && self.cons(j)
    }

    /// consonant-vowel-consonant ending at `i`, last consonant not w, x or y.
    fn cvc(&self, i: isize) -> bool {
        if i < 2 || !self.cons(i) || self.cons(i - 1) || !self.cons(i - 2) {
            return false;
        }
        !matches!(self.at(i), b'w' | b'x' | b'y')
    }

    fn ends(&mut self, s: &str) -> bool {
        let len = s.len() as isize;
        if len > self.k + 1 {
            return false;
        }
        let start = (self.k + 1 - len) as usize;
        if &self.b[start..=self.k as usize] != s.as_bytes() {
            return false;
        }
        self.j = self.k - len;
        true
    }

    fn set_to(&mut self, s: &str) {
        let start = (self.j + 1) as usize;
        self.b.truncate(start);
        self.b.extend_from_slice(s.as_bytes());
        self.k = self.j + s.len() as isize;
    }

    fn replace(&mut self, s: &str) {
        if self.m() > 0 {
            self.set_to(s);
        }
    }

    fn step1ab(&mut self) {
        if self.at(self.k) == b's' {
            if self.ends("sses") {
                self.k -= 2;
            } else if self.ends("ies") {
                self.set_to("i");
            } else if self.k >= 1 && self.at(self.k - 1) != b's' {
                self.k -= 1;
            }
        }
        if self.ends("eed") {
            if self.m() > 0 {
                self.k -= 1;
            }
        } else if (self.ends("ed") || self.ends("ing")) && self.vowel_in_stem() {
            self.k = self.j;
            if self.ends("at") {
                self.set_to("ate");
            } else if self.ends("bl") {
                self.set_to("ble");
            } else if self.ends("iz") {
                self.set_to("ize");
            } else if self.double_consonant(self.k) {
                self.k -= 1;
                if matches!(self.at(self.k), b'l' | b's' | b'z') {
                    self.k += 1;
                }
            } else if self.m() == 1 && self.cvc(self.k) {
                self.set_to("e");
            }
        }
    }

    fn step1c(&mut self) {
        if self.ends("y") && self.vowel_in_stem() {
            let k = self.k as usize;
            self.b[k] = b'i';
        }
    }

    /// Apply the first matching `(suffix, replacement)` rule, if any.
    fn replace_first(&mut self, rules: &[(&str, &str)]) {
        for (suffix, replacement) in rules {
            if self.ends(suffix) {
                self.replace(replacement);
                return;
            }
        }
    }

    fn step2(&mut self) {
        let rules: &[(&str, &str)] = match self.at(self.k - 1) {
            b'a' => &[("ational", "ate"), ("tional", "tion")],
            b'c' => &[("enci", "ence"), ("anci", "ance")],
            b'e' => &[("izer", "ize")],
            b'l' => &[
                ("bli", "ble"),
                ("alli", "al"),
                ("entli", "ent"),
                ("eli", "e"),
                ("ousli", "ous"),
            ],
            b'o' => &[("ization", "ize"), ("ation", "ate"), ("ator", "ate")],
            b's' => &[
                ("alism", "al"),
                ("iveness", "ive"),
                ("fulness", "ful"),
                ("ousness", "ous"),
            ],
            b't' => &[("aliti", "al"), ("iviti", "ive"), ("biliti", "ble")],
            b'g' => &[("logi", "log")],
            _ => &[],
        };
        self.replace_first(rules);
    }

    fn step3(&mut self) {
        let rules: &[(&str, &str)] = match self.at(self.k) {
            b'e' => &[("icate", "ic"), ("ative", ""), ("alize", "al")],
            b'i' => &[("iciti", "ic")],
            b'l' => &[("ical", "ic"), ("ful", "")],
            b's' => &[("ness", "")],
            _ => &[],
        };
        self.replace_first(rules);
    }

    fn step4(&mut self) {
        let suffixes: &[&str] = match self.at(self.k - 1) {
            b'a' => &["al"],
            b'c' => &["ance", "ence"],
            b'e' => &["er"],
            b'i' => &["ic"],
            b'l' => &["able", "ible"],
            b'n' => &["ant", "ement", "ment", "ent"],
            b'o' => {
                if self.ends("ion") && self.j >= 0 && matches!(self.at(self.j), b's' | b't') {
                    &[]
                } else if self.ends("ou") {
                    &[]
                } else {
                    return;
                }
            }
            b's' => &["ism"],
            b't' => &["ate", "iti"],
            b'u' => &["ous"],
            b'v' => &["ive"],
            b'z' => &["ize"],
            _ => return,
        };
        if !suffixes.is_empty() && !suffixes.iter().any(|suffix| self.ends(suffix)) {
            return;
        }
        if self.m() > 1 {
            self.k = self.j;
        }
    }

    fn step5(&mut self) {
        self.j = self.k;
        if self.at(self.k) == b'e' {
            let a = self.m();
            if a > 1 || (a == 1 && !self.cvc(self.k - 1)) {
                self.k -= 1;
            }
        }
        if self.at(self.k) == b'l' && self.double_consonant(self.k) && self.m() > 1 {
            self.k -= 1;
        }
    }

    fn stem(mut self) -> String {
        if self.k > 1 {
            self.step1ab();
            if self.k > 0 {
                self.step1c();
                self.step2();
                self.step3();
                self.step4();
                self.step5();
            }
        }
        self.b.truncate((self.k + 1) as usize);
        String::from_utf8(self.b).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn porter(word: &str) -> String {
        PorterStemmer.normalize(word).into_owned()
    }

    #[test]
    fn test_porter_plurals() {
        assert_eq!(porter("caresses"), "caress");
        assert_eq!(porter("ponies"), "poni");
        assert_eq!(porter("cats"), "cat");
        assert_eq!(porter("jobs"), "job");
    }

    #[test]
    fn test_porter_ed_ing() {
        assert_eq!(porter("running"), "run");
        assert_eq!(porter("hopping"), "hop");
        assert_eq!(porter("Running"), "run");
    }

    #[test]
    fn test_porter_derivational_suffixes() {
        assert_eq!(porter("relational"), "relat");
        assert_eq!(porter("happy"), "happi");
    }

    #[test]
    fn test_porter_short_and_non_ascii_words() {
        assert_eq!(porter("is"), "is");
        assert_eq!(porter("Café"), "café");
        assert_eq!(porter("c++"), "c++");
    }

    #[test]
    fn test_snowball() {
        let stemmer = SnowballStemmer::default();
        assert_eq!(stemmer.normalize("Running"), "run");
        assert_eq!(stemmer.normalize("jobs"), "job");
    }

    #[test]
    fn test_lemmatizer_regular_plurals() {
        let lemmatizer = NounLemmatizer;
        assert_eq!(lemmatizer.normalize("jobs"), "job");
        assert_eq!(lemmatizer.normalize("Cities"), "city");
        assert_eq!(lemmatizer.normalize("boxes"), "box");
        assert_eq!(lemmatizer.normalize("matches"), "match");
        assert_eq!(lemmatizer.normalize("classes"), "class");
        assert_eq!(lemmatizer.normalize("courses"), "course");
    }

    #[test]
    fn test_lemmatizer_exceptions() {
        let lemmatizer = NounLemmatizer;
        assert_eq!(lemmatizer.normalize("children"), "child");
        assert_eq!(lemmatizer.normalize("news"), "news");
        assert_eq!(lemmatizer.normalize("status"), "status");
        assert_eq!(lemmatizer.normalize("analysis"), "analysis");
        assert_eq!(lemmatizer.normalize("bus"), "bus");
        assert_eq!(lemmatizer.normalize("engineer"), "engineer");
    }
}
