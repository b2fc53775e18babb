// ============================================================
// Layer 1 — CLI Arguments
// ============================================================
// Every flag the training binary accepts. The first six mirror
// the classic AlexNet training script; the rest expose values
// that would otherwise be hard-coded.
//
// Dataset and GPU mode accept any string. Unsupported values
// are not a parse error: the run is skipped and exits with 0.

use clap::Args;

use crate::application::train_use_case::TrainConfig;
use crate::domain::run_mode::{DatasetKind, GpuMode};

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Dataset to train on: cifar10 or imagenet (only cifar10 is trainable)
    #[arg(long, default_value = "cifar10")]
    pub dataset: DatasetKind,

    /// Folder holding the extracted CIFAR-10 binary batches,
    /// or `none` to download them into ./cifar-10-batches-bin
    #[arg(long, default_value = "none")]
    pub dataset_path: String,

    /// Device placement; only `single` is supported
    #[arg(long, default_value = "single")]
    pub gpu_mode: GpuMode,

    /// Adam step size
    #[arg(long, default_value_t = 0.00005)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 20)]
    pub epochs: usize,

    /// Images per mini-batch, for training and validation alike
    #[arg(long, default_value_t = 64)]
    pub batch_size: usize,

    /// CIFAR-10 training batch files visited per epoch (1-5)
    #[arg(long, default_value_t = 5)]
    pub batch_groups: usize,

    /// Validation images kept after preprocessing
    #[arg(long, default_value_t = 1000)]
    pub validation_size: usize,

    /// Where the preprocessed dataset files are written and read
    #[arg(long, default_value = ".")]
    pub preprocess_dir: String,

    /// Checkpoint path stem; `.mpk.gz` and `.json` are appended
    #[arg(long, default_value = "./image_classification")]
    pub save_model_path: String,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            dataset:         a.dataset,
            dataset_path:    a.dataset_path,
            gpu_mode:        a.gpu_mode,
            learning_rate:   a.learning_rate,
            epochs:          a.epochs,
            batch_size:      a.batch_size,
            batch_groups:    a.batch_groups,
            validation_size: a.validation_size,
            preprocess_dir:  a.preprocess_dir,
            save_model_path: a.save_model_path,
        }
    }
}
