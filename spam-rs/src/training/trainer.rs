//! Pipeline construction, fitting and persistence

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use super::artifact::ModelArtifact;
use crate::classifier::Classifier;
use crate::config::{Config, ModelConfig, PathsConfig};
use crate::error::Result;
use crate::features::{TfidfVectorizer, VectorizerSettings};
use crate::pipeline::Pipeline;

/// Builds, fits and saves pipelines for one model configuration
#[derive(Debug, Clone)]
pub struct Trainer {
    model: ModelConfig,
    paths: PathsConfig,
    random_state: u64,
}

impl Trainer {
    /// Create a trainer; an invalid model section fails here, before any fit work
    pub fn new(config: &Config) -> Result<Self> {
        config.model.validate()?;
        Ok(Self {
            model: config.model.clone(),
            paths: config.paths.clone(),
            random_state: config.data.random_state,
        })
    }

    /// Unfitted pipeline for the configured vectorizer and classifier
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let settings = VectorizerSettings::from_config(&self.model.tfidf)?;
        Ok(Pipeline::new(
            TfidfVectorizer::new(settings),
            Classifier::from_config(&self.model, self.random_state),
        ))
    }

    /// Fit a fresh pipeline on normalized training texts
    pub fn train(&self, x_train: &[String], y_train: &[String]) -> Result<Pipeline> {
        info!(
            "Training {} model on {} documents",
            self.model.kind,
            x_train.len()
        );
        let mut pipeline = self.build_pipeline()?;
        pipeline.fit(x_train, y_train)?;
        Ok(pipeline)
    }

    /// Persist the pipeline as one artifact, plus the optional vocabulary dump
    pub fn save(&self, pipeline: &Pipeline) -> Result<PathBuf> {
        let model_path = PathBuf::from(&self.paths.model_save_path);
        ModelArtifact::new(pipeline.clone())?.save(&model_path)?;

        if let Some(ref vocab_path) = self.paths.vectorizer_save_path {
            write_vocabulary(pipeline, Path::new(vocab_path))?;
        }

        Ok(model_path)
    }
}

/// Human-readable vocabulary dump; serving never reads it back
fn write_vocabulary(pipeline: &Pipeline, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let vocabulary = pipeline.vectorizer().vocabulary()?;
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, vocabulary)?;

    info!(
        "Vocabulary ({} terms) saved to {}",
        vocabulary.len(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpamError;
    use ::config::FileFormat;
    use tempfile::TempDir;

    fn config(dir: &TempDir, model_type: &str, with_vocab: bool) -> Config {
        let mut yaml = format!(
            r#"
data:
  raw_data_path: unused.csv
  text_column: text
  label_column: label
model:
  type: {}
  tfidf:
    max_features: 50
paths:
  model_save_path: {}
"#,
            model_type,
            dir.path().join("out").join("model.bin").display()
        );
        if with_vocab {
            yaml.push_str(&format!(
                "  vectorizer_save_path: {}\n",
                dir.path().join("out").join("vocab.json").display()
            ));
        }
        Config::from_str(&yaml, FileFormat::Yaml).unwrap()
    }

    fn corpus() -> (Vec<String>, Vec<String>) {
        let texts = [
            "free entry win cash now",
            "claim your prize currency_token 500",
            "see you at lunch",
            "meeting moved to friday",
            "call me when you get home",
        ];
        let labels = ["spam", "spam", "ham", "ham", "ham"];
        (
            texts.iter().map(|s| s.to_string()).collect(),
            labels.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_train_uses_configured_kind() {
        let dir = TempDir::new().unwrap();
        let trainer = Trainer::new(&config(&dir, "svm", false)).unwrap();
        let (x, y) = corpus();
        let pipeline = trainer.train(&x, &y).unwrap();
        assert_eq!(pipeline.model_kind().as_str(), "svm");
        assert!(pipeline.vectorizer().vocabulary().unwrap().len() <= 50);
    }

    #[test]
    fn test_save_writes_artifact_and_vocabulary() {
        let dir = TempDir::new().unwrap();
        let trainer = Trainer::new(&config(&dir, "naive_bayes", true)).unwrap();
        let (x, y) = corpus();
        let pipeline = trainer.train(&x, &y).unwrap();

        let path = trainer.save(&pipeline).unwrap();
        assert!(path.exists());

        let vocab: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("out/vocab.json")).unwrap())
                .unwrap();
        assert!(vocab["terms"]["prize"].is_u64());

        let loaded = ModelArtifact::load(&path).unwrap().into_pipeline();
        assert_eq!(loaded.predict(&x).unwrap(), pipeline.predict(&x).unwrap());
    }

    #[test]
    fn test_save_unfitted_rejected() {
        let dir = TempDir::new().unwrap();
        let trainer = Trainer::new(&config(&dir, "naive_bayes", false)).unwrap();
        let pipeline = trainer.build_pipeline().unwrap();
        assert!(matches!(
            trainer.save(&pipeline).unwrap_err(),
            SpamError::NotFitted(_)
        ));
    }
}
