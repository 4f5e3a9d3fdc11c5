//! TF-IDF vectorizer
//!
//! Tokens are runs of two or more word characters. Stop words are removed
//! before n-grams are formed. The vocabulary keeps the `max_features` most
//! frequent terms (ties broken alphabetically) and indexes them
//! alphabetically. Rows are weighted by raw count times smoothed IDF and
//! L2-normalised.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

use super::sparse::SparseVector;
use crate::config::TfidfConfig;
use crate::error::{Result, SpamError};
use crate::text::StopWords;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

/// Vectorizer settings, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerSettings {
    pub max_features: usize,
    pub stop_words: Option<StopWords>,
    pub ngram_range: (usize, usize),
}

impl VectorizerSettings {
    pub fn from_config(config: &TfidfConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            max_features: config.max_features,
            stop_words: config.stop_word_list()?,
            ngram_range: config.ngram_range,
        })
    }
}

impl Default for VectorizerSettings {
    fn default() -> Self {
        Self {
            max_features: 5000,
            stop_words: None,
            ngram_range: (1, 1),
        }
    }
}

/// Fitted term-to-index mapping with per-term IDF weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vocabulary {
    terms: BTreeMap<String, usize>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.terms.get(term).copied()
    }

    pub fn idf(&self, index: usize) -> Option<f64> {
        self.idf.get(index).copied()
    }

    /// Terms in index order
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        // BTreeMap iteration is alphabetical, which is also index order
        self.terms.keys().map(String::as_str)
    }

    /// Number of documents the IDF weights were computed from
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}

/// Term-frequency × inverse-document-frequency feature extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    settings: VectorizerSettings,
    vocabulary: Option<Vocabulary>,
}

impl TfidfVectorizer {
    pub fn new(settings: VectorizerSettings) -> Self {
        Self {
            settings,
            vocabulary: None,
        }
    }

    pub fn settings(&self) -> &VectorizerSettings {
        &self.settings
    }

    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// Fitted vocabulary
    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        self.vocabulary
            .as_ref()
            .ok_or(SpamError::NotFitted("TfidfVectorizer"))
    }

    /// Feature dimension (vocabulary size)
    pub fn dim(&self) -> Result<usize> {
        Ok(self.vocabulary()?.len())
    }

    /// Learn the vocabulary and IDF weights from the training corpus
    pub fn fit<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<&Vocabulary> {
        let n_documents = documents.len();
        let mut term_counts: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let terms = self.analyze(doc.as_ref());
            let mut seen: HashSet<&str> = HashSet::new();
            for term in &terms {
                *term_counts.entry(term.clone()).or_insert(0) += 1;
                if seen.insert(term.as_str()) {
                    *doc_freq.entry(term.clone()).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() {
            return Err(SpamError::Training(
                "empty vocabulary; documents contain only stop words or no tokens".to_string(),
            ));
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let total_terms = ranked.len();
        ranked.truncate(self.settings.max_features);

        let mut retained: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        retained.sort();

        let idf: Vec<f64> = retained
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n_documents as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        let terms: BTreeMap<String, usize> = retained
            .into_iter()
            .enumerate()
            .map(|(index, term)| (term, index))
            .collect();

        debug!(
            "Vocabulary fitted: {} of {} terms kept from {} documents",
            terms.len(),
            total_terms,
            n_documents
        );

        let vocabulary = self.vocabulary.insert(Vocabulary {
            terms,
            idf,
            n_documents,
        });
        Ok(&*vocabulary)
    }

    /// Map documents into TF-IDF space; unseen terms are dropped
    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Result<Vec<SparseVector>> {
        let vocabulary = self.vocabulary()?;
        Ok(documents
            .iter()
            .map(|doc| self.transform_one(vocabulary, doc.as_ref()))
            .collect())
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, documents: &[S]) -> Result<Vec<SparseVector>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    fn transform_one(&self, vocabulary: &Vocabulary, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for term in self.analyze(document) {
            if let Some(index) = vocabulary.index_of(&term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * vocabulary.idf[index]))
            .collect();
        let mut vector = SparseVector::from_pairs(vocabulary.len(), pairs);
        vector.l2_normalize();
        vector
    }

    /// Tokenize, drop stop words and expand to the configured n-gram range
    fn analyze(&self, document: &str) -> Vec<String> {
        let tokens: Vec<&str> = token_pattern()
            .find_iter(document)
            .map(|m| m.as_str())
            .filter(|token| {
                self.settings
                    .stop_words
                    .map_or(true, |stop_words| !stop_words.contains(token))
            })
            .collect();

        let (min_n, max_n) = self.settings.ngram_range;
        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectorizer(max_features: usize, ngram_range: (usize, usize)) -> TfidfVectorizer {
        TfidfVectorizer::new(VectorizerSettings {
            max_features,
            stop_words: None,
            ngram_range,
        })
    }

    #[test]
    fn test_transform_before_fit() {
        let v = vectorizer(10, (1, 1));
        let err = v.transform(&["hello world"]).unwrap_err();
        assert!(matches!(err, SpamError::NotFitted(_)));
    }

    #[test]
    fn test_vocabulary_is_alphabetical() {
        let mut v = vectorizer(10, (1, 1));
        let vocab = v.fit(&["win cash now", "cash prize"]).unwrap();
        assert_eq!(vocab.terms().collect::<Vec<_>>(), vec!["cash", "now", "prize", "win"]);
        assert_eq!(vocab.index_of("cash"), Some(0));
        assert_eq!(vocab.index_of("win"), Some(3));
        assert_eq!(vocab.n_documents(), 2);
    }

    #[test]
    fn test_single_char_tokens_ignored() {
        let mut v = vectorizer(10, (1, 1));
        let vocab = v.fit(&["a b cc 5 55"]).unwrap();
        assert_eq!(vocab.terms().collect::<Vec<_>>(), vec!["55", "cc"]);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let mut v = vectorizer(2, (1, 1));
        let vocab = v
            .fit(&["free free free prize", "free prize call", "call zeta"])
            .unwrap();
        // free=4, prize=2, call=2, zeta=1: the prize/call tie goes to "call"
        assert_eq!(vocab.len(), 2);
        assert_eq!(vocab.terms().collect::<Vec<_>>(), vec!["call", "free"]);
    }

    #[test]
    fn test_smoothed_idf() {
        let mut v = vectorizer(10, (1, 1));
        let vocab = v.fit(&["common rare", "common"]).unwrap();
        let common = vocab.idf(vocab.index_of("common").unwrap()).unwrap();
        let rare = vocab.idf(vocab.index_of("rare").unwrap()).unwrap();
        assert!((common - 1.0).abs() < 1e-12);
        assert!((rare - ((3.0f64 / 2.0).ln() + 1.0)).abs() < 1e-12);
    }

    #[test]
    fn test_rows_are_unit_norm() {
        let mut v = vectorizer(10, (1, 1));
        let rows = v.fit_transform(&["win cash cash now", "hello there"]).unwrap();
        for row in &rows {
            assert_eq!(row.dim(), v.dim().unwrap());
            assert!((row.squared_norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_out_of_vocabulary_is_zero_vector() {
        let mut v = vectorizer(10, (1, 1));
        v.fit(&["win cash now"]).unwrap();
        let rows = v.transform(&["completely unseen words", ""]).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.is_zero() && r.dim() == 3));
    }

    #[test]
    fn test_stop_words_removed_before_ngrams() {
        let mut v = TfidfVectorizer::new(VectorizerSettings {
            max_features: 100,
            stop_words: Some(StopWords::English),
            ngram_range: (1, 2),
        });
        let vocab = v.fit(&["claim the prize"]).unwrap();
        assert_eq!(
            vocab.terms().collect::<Vec<_>>(),
            vec!["claim", "claim prize", "prize"]
        );
    }

    #[test]
    fn test_empty_vocabulary_is_error() {
        let mut v = TfidfVectorizer::new(VectorizerSettings {
            max_features: 10,
            stop_words: Some(StopWords::English),
            ngram_range: (1, 1),
        });
        assert!(matches!(
            v.fit(&["the and of", ""]).unwrap_err(),
            SpamError::Training(_)
        ));
    }

    #[test]
    fn test_deterministic_transform() {
        let docs = ["free entry to win cash", "see you at lunch", "win a free prize now"];
        let mut a = vectorizer(50, (1, 2));
        let mut b = vectorizer(50, (1, 2));
        assert_eq!(a.fit_transform(&docs).unwrap(), b.fit_transform(&docs).unwrap());
    }
}
