//! Feature extraction: sparse vectors and the TF-IDF vectorizer

pub mod sparse;
pub mod tfidf;

pub use sparse::SparseVector;
pub use tfidf::{TfidfVectorizer, VectorizerSettings, Vocabulary};
