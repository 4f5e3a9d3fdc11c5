//! Configuration for spam-rs
//!
//! Loaded from YAML, TOML or JSON (format inferred from the file extension)
//! with `SPAM_`-prefixed environment overrides, e.g. `SPAM_MODEL__TYPE=svm`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::classifier::ModelKind;
use crate::error::{Result, SpamError};
use crate::text::StopWords;

/// Main configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Dataset location and split parameters
    pub data: DataConfig,
    /// Feature extraction and classifier selection
    pub model: ModelConfig,
    /// Artifact locations
    pub paths: PathsConfig,
    /// Prediction server
    #[serde(default)]
    pub server: ServerConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dataset configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DataConfig {
    /// Path to the labeled CSV file
    pub raw_data_path: String,
    /// Column holding the message text
    pub text_column: String,
    /// Column holding the spam/ham label
    pub label_column: String,
    /// Fraction of rows held out for evaluation
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    /// Seed for the stratified split and seeded solvers
    #[serde(default = "default_random_state")]
    pub random_state: u64,
    /// Extra rows appended to the base dataset (defaults to `<stem>_augmented.<ext>`)
    #[serde(default)]
    pub augment_data_path: Option<String>,
}

/// Model configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Classifier variant, resolved at parse time
    #[serde(rename = "type")]
    pub kind: ModelKind,
    #[serde(default)]
    pub tfidf: TfidfConfig,
    #[serde(default)]
    pub naive_bayes: NaiveBayesParams,
    #[serde(default)]
    pub svm: SvmParams,
    #[serde(default)]
    pub logistic_regression: LogisticRegressionParams,
}

/// TF-IDF vectorizer configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TfidfConfig {
    #[serde(default = "default_max_features")]
    pub max_features: usize,
    /// Named stop-word list; only `english` is built in
    #[serde(default)]
    pub stop_words: Option<String>,
    /// Inclusive (min, max) n-gram lengths
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
}

/// Multinomial Naive Bayes hyperparameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NaiveBayesParams {
    /// Additive (Laplace/Lidstone) smoothing
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

/// Linear SVM hyperparameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SvmParams {
    /// Inverse regularization strength
    #[serde(default = "default_c")]
    pub c: f64,
    /// Fit a Platt sigmoid so `predict_proba` is available
    #[serde(default = "default_true")]
    pub probability: bool,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Stopping tolerance on the projected-gradient gap
    #[serde(default = "default_svm_tol")]
    pub tol: f64,
}

/// Logistic regression hyperparameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct LogisticRegressionParams {
    /// Inverse regularization strength
    #[serde(default = "default_c")]
    pub c: f64,
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// Stopping tolerance on the gradient norm
    #[serde(default = "default_logistic_tol")]
    pub tol: f64,
}

/// Artifact paths
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Where the fitted pipeline is persisted
    pub model_save_path: String,
    /// Optional JSON dump of the vocabulary, for inspection only
    #[serde(default)]
    pub vectorizer_save_path: Option<String>,
}

/// Prediction server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Directory served for any route other than the API
    #[serde(default)]
    pub static_dir: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `pretty`, `compact` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Also append plain-text logs to this file, e.g. `logs/app.log`
    #[serde(default)]
    pub file: Option<String>,
}

fn default_test_size() -> f64 {
    0.2
}

fn default_random_state() -> u64 {
    42
}

fn default_max_features() -> usize {
    5000
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_alpha() -> f64 {
    1.0
}

fn default_c() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn default_max_iter() -> usize {
    1000
}

fn default_svm_tol() -> f64 {
    0.1
}

fn default_logistic_tol() -> f64 {
    1e-6
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for TfidfConfig {
    fn default() -> Self {
        Self {
            max_features: default_max_features(),
            stop_words: None,
            ngram_range: default_ngram_range(),
        }
    }
}

impl Default for NaiveBayesParams {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

impl Default for SvmParams {
    fn default() -> Self {
        Self {
            c: default_c(),
            probability: true,
            max_iter: default_max_iter(),
            tol: default_svm_tol(),
        }
    }
}

impl Default for LogisticRegressionParams {
    fn default() -> Self {
        Self {
            c: default_c(),
            max_iter: default_max_iter(),
            tol: default_logistic_tol(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            static_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load and validate configuration from a file plus `SPAM_*` environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpamError::Config(format!(
                "Config file not found at {}",
                path.display()
            )));
        }

        let config: Config = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix("SPAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse and validate configuration held in memory
    pub fn from_str(content: &str, format: ::config::FileFormat) -> Result<Self> {
        let config: Config = ::config::Config::builder()
            .add_source(::config::File::from_str(content, format))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("data.raw_data_path", &self.data.raw_data_path),
            ("data.text_column", &self.data.text_column),
            ("data.label_column", &self.data.label_column),
            ("paths.model_save_path", &self.paths.model_save_path),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(SpamError::Config(format!("{} must not be empty", key)));
            }
        }

        if !(self.data.test_size > 0.0 && self.data.test_size < 1.0) {
            return Err(SpamError::Config(format!(
                "data.test_size must be in (0, 1), got {}",
                self.data.test_size
            )));
        }

        self.model.validate()
    }

    /// Augmentation file: explicit path, or `<stem>_augmented.<ext>` beside the raw data
    pub fn augment_data_path(&self) -> PathBuf {
        if let Some(ref path) = self.data.augment_data_path {
            return PathBuf::from(path);
        }

        let raw = Path::new(&self.data.raw_data_path);
        let stem = raw
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_name = match raw.extension() {
            Some(ext) => format!("{}_augmented.{}", stem, ext.to_string_lossy()),
            None => format!("{}_augmented", stem),
        };
        raw.with_file_name(file_name)
    }
}

impl ModelConfig {
    /// Check hyperparameters for the selected variant and the vectorizer
    pub fn validate(&self) -> Result<()> {
        self.tfidf.validate()?;

        match self.kind {
            ModelKind::NaiveBayes => {
                if self.naive_bayes.alpha <= 0.0 {
                    return Err(SpamError::Config(
                        "model.naive_bayes.alpha must be positive".to_string(),
                    ));
                }
            }
            ModelKind::Svm => {
                if self.svm.c <= 0.0 || self.svm.tol <= 0.0 || self.svm.max_iter == 0 {
                    return Err(SpamError::Config(
                        "model.svm.c, tol and max_iter must be positive".to_string(),
                    ));
                }
            }
            ModelKind::LogisticRegression => {
                let params = &self.logistic_regression;
                if params.c <= 0.0 || params.tol <= 0.0 || params.max_iter == 0 {
                    return Err(SpamError::Config(
                        "model.logistic_regression.c, tol and max_iter must be positive"
                            .to_string(),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl TfidfConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(SpamError::Config(
                "model.tfidf.max_features must be a positive integer".to_string(),
            ));
        }

        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(SpamError::Config(format!(
                "model.tfidf.ngram_range must satisfy 1 <= min <= max, got ({}, {})",
                min_n, max_n
            )));
        }

        self.stop_word_list().map(|_| ())
    }

    /// Resolve the configured stop-word name
    pub fn stop_word_list(&self) -> Result<Option<StopWords>> {
        match self.stop_words.as_deref() {
            None => Ok(None),
            Some(name) => name.parse().map(Some),
        }
    }
}
