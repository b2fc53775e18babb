// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates one training run in order:
//
//   Step 0: Reject unsupported runs     (Layer 3 - domain)
//   Step 1: Locate / download CIFAR-10  (Layer 4 - data)
//   Step 2: Preprocess into blobs       (Layer 4 - data)
//   Step 3: Load + resize validation    (Layer 4 - data)
//   Step 4: Save config                 (Layer 6 - infra)
//   Step 5: Build the Burn session      (Layer 5 - ml)
//   Step 6: Run the training driver     (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use anyhow::{ensure, Context, Result};
use burn::{optim::AdamConfig, prelude::*};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::data::{
    cifar10::{self, CIFAR10_FOLDER, TRAINING_BATCHES},
    preprocessor::{preprocess_and_save_data, validation_blob_path},
    resize::{convert_to_imagenet_size, IMAGENET_SIDE},
    supplier::Cifar10Batches,
};
use crate::domain::{
    images::LabeledImages,
    run_mode::{DatasetKind, GpuMode},
};
use crate::infra::{blob_store::load_blob, checkpoint::CheckpointManager, metrics::MetricsLogger};
use crate::ml::{
    model::{AlexNet, AlexNetConfig},
    session::BurnSession,
    trainer::{run_training, DriverConfig, TrainingReport},
};

#[cfg(not(feature = "wgpu"))]
type TrainBackend = burn::backend::Autodiff<burn::backend::NdArray>;
#[cfg(feature = "wgpu")]
type TrainBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

/// `--dataset-path` value meaning "download into the default folder".
pub const DOWNLOAD_DATASET: &str = "none";

// ─── Training Configuration ──────────────────────────────────────────────────
// Every value the run depends on. Saved as JSON next to the weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub dataset:         DatasetKind,
    pub dataset_path:    String,
    pub gpu_mode:        GpuMode,
    pub learning_rate:   f64,
    pub epochs:          usize,
    pub batch_size:      usize,
    pub batch_groups:    usize,
    pub validation_size: usize,
    pub preprocess_dir:  String,
    pub save_model_path: String,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset:         DatasetKind::Cifar10,
            dataset_path:    DOWNLOAD_DATASET.to_string(),
            gpu_mode:        GpuMode::Single,
            learning_rate:   5e-5,
            epochs:          20,
            batch_size:      64,
            batch_groups:    TRAINING_BATCHES,
            validation_size: 1000,
            preprocess_dir:  ".".to_string(),
            save_model_path: "./image_classification".to_string(),
        }
    }
}

/// How a run ended without an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Trained(TrainingReport),
    /// Nothing was trained; the reason has already been logged.
    Skipped(String),
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<RunOutcome> {
        let cfg = &self.config;

        // ── Step 0: Unsupported runs end quietly ──────────────────────────────
        if let Some(reason) = skip_reason(cfg) {
            tracing::warn!("{reason}; nothing to do");
            return Ok(RunOutcome::Skipped(reason));
        }
        ensure!(cfg.batch_size > 0, "batch size must be at least 1");
        ensure!(cfg.validation_size > 0, "validation size must be at least 1");
        ensure!(
            cfg.batch_groups <= TRAINING_BATCHES,
            "CIFAR-10 has {} training batches, {} batch groups requested",
            TRAINING_BATCHES,
            cfg.batch_groups
        );
        let num_classes = cfg
            .dataset
            .num_classes()
            .with_context(|| format!("No class count for dataset '{}'", cfg.dataset))?;

        // ── Step 1: Dataset folder ────────────────────────────────────────────
        let dataset_dir = dataset_dir(cfg)?;

        // ── Step 2: Preprocess once, reuse on later runs ──────────────────────
        let preprocess_dir = Path::new(&cfg.preprocess_dir);
        preprocess_and_save_data(&dataset_dir, preprocess_dir)?;

        // ── Step 3: Validation subset at network input size ───────────────────
        // Resized once here; training mini-batches are resized as drawn.
        let mut validation: LabeledImages = load_blob(&validation_blob_path(preprocess_dir))?;
        validation.truncate(cfg.validation_size);
        let validation = convert_to_imagenet_size(&validation, IMAGENET_SIDE)?;
        tracing::info!("Validating on {} images", validation.len());

        let data = Cifar10Batches::new(preprocess_dir, cfg.batch_size, IMAGENET_SIDE, validation);

        // ── Step 4: Save config next to the checkpoint ────────────────────────
        let ckpt = CheckpointManager::new(&cfg.save_model_path);
        ckpt.save_config(cfg)?;
        let metrics = MetricsLogger::new(ckpt.metrics_path())?;

        // ── Step 5: Session (model + Adam) for the whole run ──────────────────
        let device: <TrainBackend as Backend>::Device = Default::default();
        tracing::info!("Using device: {:?}", device);

        let model = AlexNetConfig::new(num_classes)
            .with_image_side(IMAGENET_SIDE)
            .init::<TrainBackend>(&device)?;
        let optim = AdamConfig::new()
            .with_epsilon(1e-8)
            .init::<TrainBackend, AlexNet<TrainBackend>>();
        let mut session = BurnSession::new(
            model,
            optim,
            cfg.learning_rate,
            IMAGENET_SIDE,
            num_classes,
            device,
        );

        // ── Step 6: Run the driver ────────────────────────────────────────────
        let driver = DriverConfig {
            epochs:          cfg.epochs,
            batch_groups:    cfg.batch_groups,
            save_model_path: PathBuf::from(&cfg.save_model_path),
        };
        let report = run_training(&driver, &mut session, &data, Some(&metrics))?;

        Ok(RunOutcome::Trained(report))
    }
}

fn skip_reason(cfg: &TrainConfig) -> Option<String> {
    if !cfg.dataset.is_trainable() {
        Some(format!("Dataset '{}' is not supported", cfg.dataset))
    } else if !cfg.gpu_mode.is_supported() {
        Some(format!("GPU mode '{}' is not supported", cfg.gpu_mode))
    } else {
        None
    }
}

/// Where the CIFAR-10 batch files live, downloading them if asked to.
fn dataset_dir(cfg: &TrainConfig) -> Result<PathBuf> {
    if cfg.dataset_path == DOWNLOAD_DATASET {
        let folder = PathBuf::from(CIFAR10_FOLDER);
        cifar10::download(&folder)?;
        Ok(folder)
    } else {
        let folder = PathBuf::from(&cfg.dataset_path);
        ensure!(folder.is_dir(), "Dataset folder '{}' does not exist", folder.display());
        Ok(folder)
    }
}
