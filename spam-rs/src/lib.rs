//! spam-rs: spam/ham text classifier
//!
//! Trains a TF-IDF + linear/probabilistic classifier pipeline from labeled
//! CSV data, persists it as one artifact and serves predictions over HTTP.
//!
//! # Features
//!
//! - Deterministic text normalization with a versioned contract
//! - TF-IDF feature extraction with stop words and n-grams
//! - Naive Bayes, linear SVM or logistic regression, chosen by configuration
//! - Stratified, seeded train/test split and a classification report
//! - `POST /predict` over a model loaded once at startup
//!
//! # Example Configuration
//!
//! ```yaml
//! data:
//!   raw_data_path: data/raw/spam.csv
//!   text_column: v2
//!   label_column: v1
//!   test_size: 0.2
//!   random_state: 42
//! model:
//!   type: naive_bayes
//!   tfidf:
//!     max_features: 5000
//!     stop_words: english
//!     ngram_range: [1, 2]
//! paths:
//!   model_save_path: models/spam_classifier.bin
//! ```

pub mod api;
pub mod classifier;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod pipeline;
pub mod text;
pub mod training;

pub use classifier::{Classifier, Estimator, ModelKind};
pub use config::Config;
pub use error::{Result, SpamError};
pub use pipeline::{Pipeline, Prediction};
pub use text::TextNormalizer;
pub use training::{EvaluationReport, TrainingJob};
