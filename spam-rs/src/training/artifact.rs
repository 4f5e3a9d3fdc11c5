//! Persisted model artifact
//!
//! An artifact is a bincode header followed by the bincode-encoded
//! [`Pipeline`]. The header is decoded and checked first, so a file written
//! by an incompatible build is rejected before the pipeline is touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::classifier::ModelKind;
use crate::error::{Result, SpamError};
use crate::pipeline::Pipeline;
use crate::text::NORMALIZER_VERSION;

/// Layout version of the artifact encoding
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Metadata stored ahead of the pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    /// Normalizer contract the pipeline was trained under
    pub normalizer_version: String,
    pub model_type: ModelKind,
    pub trained_at: DateTime<Utc>,
}

/// A fitted pipeline together with the metadata needed to serve it safely
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub header: ArtifactHeader,
    pub pipeline: Pipeline,
}

impl ModelArtifact {
    /// Wrap a fitted pipeline, stamping the current normalizer version
    pub fn new(pipeline: Pipeline) -> Result<Self> {
        if !pipeline.is_fitted() {
            return Err(SpamError::NotFitted("Pipeline"));
        }

        Ok(Self {
            header: ArtifactHeader {
                format_version: ARTIFACT_FORMAT_VERSION,
                normalizer_version: NORMALIZER_VERSION.to_string(),
                model_type: pipeline.model_kind(),
                trained_at: Utc::now(),
            },
            pipeline,
        })
    }

    /// Write the artifact, replacing any previous file at `path` in one rename
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = temp_sibling(path);
        let written = self
            .write_to(&tmp)
            .and_then(|()| fs::rename(&tmp, path).map_err(SpamError::from));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }

        info!(
            "Model ({}) saved to {}",
            self.header.model_type,
            path.display()
        );
        Ok(())
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &self.header)?;
        bincode::serialize_into(&mut writer, &self.pipeline)?;
        writer.flush()?;
        Ok(())
    }

    /// Read an artifact and verify it matches this build's normalizer
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpamError::Artifact(format!(
                "Model file not found at {}",
                path.display()
            )));
        }

        let mut reader = BufReader::new(File::open(path)?);
        let header: ArtifactHeader = bincode::deserialize_from(&mut reader)?;

        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(SpamError::Artifact(format!(
                "unsupported artifact format {} (expected {})",
                header.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }
        if header.normalizer_version != NORMALIZER_VERSION {
            return Err(SpamError::Artifact(format!(
                "model was trained with normalizer v{}, this build uses v{}; retrain the model",
                header.normalizer_version, NORMALIZER_VERSION
            )));
        }

        let pipeline: Pipeline = bincode::deserialize_from(&mut reader)?;
        if !pipeline.is_fitted() {
            return Err(SpamError::Artifact(format!(
                "{} holds an unfitted pipeline",
                path.display()
            )));
        }

        info!(
            "Model ({}) loaded from {}, trained at {}",
            header.model_type,
            path.display(),
            header.trained_at
        );
        Ok(Self { header, pipeline })
    }

    pub fn into_pipeline(self) -> Pipeline {
        self.pipeline
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
