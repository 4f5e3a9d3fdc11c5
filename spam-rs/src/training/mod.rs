//! Offline training job
//!
//! Runs sequentially: load → normalize → split → fit → save → evaluate.
//! Any error aborts the job.

pub mod artifact;
pub mod evaluator;
pub mod trainer;

use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::data::{stratified_split, DataLoader};
use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::text::TextNormalizer;

pub use artifact::{ArtifactHeader, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use evaluator::{AverageMetrics, ClassMetrics, EvaluationReport, Evaluator};
pub use trainer::Trainer;

/// Everything a finished training run produced
#[derive(Debug)]
pub struct TrainingOutcome {
    pub pipeline: Pipeline,
    pub report: EvaluationReport,
    pub model_path: PathBuf,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// End-to-end training run for one configuration
pub struct TrainingJob {
    config: Config,
}

impl TrainingJob {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<TrainingOutcome> {
        // Model selection errors surface before the dataset is opened
        let trainer = Trainer::new(&self.config)?;

        let dataset = DataLoader::new(&self.config).load_data()?;
        info!("Class distribution: {:?}", dataset.class_counts());

        let normalizer = TextNormalizer::new();
        let texts = normalizer.clean_batch(dataset.texts());
        let labels = dataset.labels();

        let split = stratified_split(
            &texts,
            &labels,
            self.config.data.test_size,
            self.config.data.random_state,
        )?;
        info!(
            "Split {} rows into {} train / {} test",
            texts.len(),
            split.train_len(),
            split.test_len()
        );

        let pipeline = trainer.train(&split.x_train, &split.y_train)?;
        let model_path = trainer.save(&pipeline)?;
        let report = Evaluator::evaluate(&pipeline, &split.x_test, &split.y_test)?;

        info!("Training complete, model at {}", model_path.display());
        Ok(TrainingOutcome {
            pipeline,
            report,
            model_path,
            train_indices: split.train_indices,
            test_indices: split.test_indices,
        })
    }
}
