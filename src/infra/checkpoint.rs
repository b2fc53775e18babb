// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves model weights using Burn's CompactRecorder.
//
// What gets saved for a run with save path `./image_classification`:
//   1. ./image_classification.mpk.gz - every model parameter
//   2. ./image_classification.json   - the TrainConfig of the run
//   3. ./metrics.csv                  - appended to by MetricsLogger
//
// Both checkpoint files are overwritten on every save; there is exactly one
// checkpoint per save path, written once training finishes.
//
// Burn's CompactRecorder:
//   - Serialises model parameters to MessagePack format
//   - Stores floats at half precision and compresses with gzip
//   - Type-safe: loading fails if architecture doesn't match

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::AlexNet;

/// Owns the path stem every checkpoint file is derived from.
pub struct CheckpointManager {
    stem: PathBuf,
}

impl CheckpointManager {
    pub fn new(stem: impl Into<PathBuf>) -> Self {
        Self { stem: stem.into() }
    }

    /// Where the recorder writes the weights (it appends `.mpk.gz`).
    pub fn model_path(&self) -> PathBuf {
        self.stem.with_extension("mpk.gz")
    }

    pub fn config_path(&self) -> PathBuf {
        self.stem.with_extension("json")
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.stem.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create '{}'", parent.display())),
            _ => Ok(()),
        }
    }

    /// Save every parameter of `model`, replacing any previous checkpoint.
    pub fn save_model<B: Backend>(&self, model: &AlexNet<B>) -> Result<()> {
        self.ensure_parent()?;

        // The recorder adds its own extension to the stem
        CompactRecorder::new()
            .record(model.clone().into_record(), self.stem.clone())
            .with_context(|| {
                format!("Failed to save checkpoint to '{}'", self.model_path().display())
            })?;

        tracing::info!("Saved model parameters to '{}'", self.model_path().display());
        Ok(())
    }

    /// Save the run configuration next to the weights.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.ensure_parent()?;
        let path = self.config_path();
        let json = serde_json::to_string_pretty(cfg)?;

        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    /// The per-group metrics CSV sits in the same folder as the weights.
    pub fn metrics_path(&self) -> PathBuf {
        self.stem.with_file_name("metrics.csv")
    }
}
