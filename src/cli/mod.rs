// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands a TrainConfig to
// Layer 2. There is a single action, training, so the flags sit
// directly on the binary instead of under a subcommand.
//
// Reference: Rust Book §12 (CLI programs)

pub mod args;

use anyhow::Result;
use clap::Parser;

use crate::application::train_use_case::{RunOutcome, TrainUseCase};
use args::TrainArgs;

#[derive(Parser, Debug)]
#[command(
    name = "alexnet-cifar10",
    version,
    about = "Train an AlexNet-style network on CIFAR-10."
)]
pub struct Cli {
    #[command(flatten)]
    pub train: TrainArgs,
}

impl Cli {
    pub fn run(self) -> Result<RunOutcome> {
        tracing::info!(
            "dataset={} gpu_mode={} epochs={} batch_size={}",
            self.train.dataset,
            self.train.gpu_mode,
            self.train.epochs,
            self.train.batch_size
        );

        let outcome = TrainUseCase::new(self.train.into()).execute()?;
        if let RunOutcome::Trained(report) = &outcome {
            println!(
                "Model saved to '{}' after {} steps",
                report.checkpoint.display(),
                report.total_steps()
            );
            if let Some(accuracy) = report.final_accuracy() {
                tracing::info!("Final validation accuracy: {:.6}", accuracy);
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::TrainConfig;
    use crate::domain::run_mode::{DatasetKind, GpuMode};

    fn parse(argv: &[&str]) -> TrainConfig {
        let mut full = vec!["alexnet-cifar10"];
        full.extend_from_slice(argv);
        Cli::try_parse_from(full).unwrap().train.into()
    }

    #[test]
    fn test_defaults() {
        let cfg = parse(&[]);
        assert_eq!(cfg.dataset, DatasetKind::Cifar10);
        assert_eq!(cfg.dataset_path, "none");
        assert_eq!(cfg.gpu_mode, GpuMode::Single);
        assert_eq!(cfg.epochs, 20);
        assert_eq!(cfg.batch_size, 64);
        assert_eq!(cfg.batch_groups, 5);
        assert_eq!(cfg.validation_size, 1000);
        assert_eq!(cfg.save_model_path, "./image_classification");
        assert!((cfg.learning_rate - 5e-5).abs() < 1e-12);
    }

    #[test]
    fn test_flags_override_defaults() {
        let cfg = parse(&[
            "--dataset-path", "/data/cifar",
            "--learning-rate", "0.001",
            "--epochs", "3",
            "--batch-size", "16",
            "--save-model-path", "runs/a",
        ]);
        assert_eq!(cfg.dataset_path, "/data/cifar");
        assert_eq!((cfg.epochs, cfg.batch_size), (3, 16));
        assert_eq!(cfg.save_model_path, "runs/a");
        assert!((cfg.learning_rate - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_values_parse_and_skip() {
        let cli = Cli::try_parse_from(["alexnet-cifar10", "--dataset", "imagenet"]).unwrap();
        assert!(matches!(cli.run().unwrap(), RunOutcome::Skipped(_)));

        let cli = Cli::try_parse_from(["alexnet-cifar10", "--gpu-mode", "multi"]).unwrap();
        assert!(matches!(cli.run().unwrap(), RunOutcome::Skipped(_)));
    }

    #[test]
    fn test_non_numeric_epochs_rejected() {
        assert!(Cli::try_parse_from(["alexnet-cifar10", "--epochs", "many"]).is_err());
    }
}
