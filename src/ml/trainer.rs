// ============================================================
// Layer 5 — Training Driver
// ============================================================
// Epochs → batch groups → mini-batches, strictly in order:
//
//   for epoch in 1..=epochs
//     for group in 1..=batch_groups
//       one optimizer step per training mini-batch of the group
//       mean loss over the group's steps
//       mean accuracy over every validation mini-batch
//   save the final parameters
//
// The driver knows nothing about Burn. It only talks to the
// TrainingSession and BatchSupplier traits, so the loop can be
// tested with plain mocks.

use anyhow::{ensure, Context, Result};
use std::path::PathBuf;

use crate::domain::traits::{BatchSupplier, TrainingSession};
use crate::infra::metrics::{GroupMetrics, MetricsLogger};

/// Everything the loop itself needs to know.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub epochs:          usize,
    pub batch_groups:    usize,
    pub save_model_path: PathBuf,
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub groups:     Vec<GroupMetrics>,
    pub checkpoint: PathBuf,
}

impl TrainingReport {
    /// Optimizer steps taken over the whole run.
    pub fn total_steps(&self) -> usize {
        self.groups.iter().map(|g| g.steps).sum()
    }

    pub fn final_accuracy(&self) -> Option<f64> {
        self.groups.last().map(|g| g.validation_accuracy)
    }
}

pub fn run_training<S, D>(
    cfg:     &DriverConfig,
    session: &mut S,
    data:    &D,
    metrics: Option<&MetricsLogger>,
) -> Result<TrainingReport>
where
    S: TrainingSession,
    D: BatchSupplier,
{
    tracing::info!(
        "Training for {} epoch(s) × {} batch group(s)",
        cfg.epochs,
        cfg.batch_groups
    );
    let mut groups = Vec::with_capacity(cfg.epochs * cfg.batch_groups);

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        for group in 1..=cfg.batch_groups {
            let (steps, mean_loss) = train_group(session, data, group)
                .with_context(|| format!("Epoch {epoch}, batch group {group}"))?;
            let (validation_batches, validation_accuracy) = validate(session, data)
                .with_context(|| format!("Validation after epoch {epoch}, batch group {group}"))?;

            println!(
                "Epoch {:>2}, CIFAR-10 Batch {}: Loss Average {:.6}  Validation Accuracy {:.6}",
                epoch, group, mean_loss, validation_accuracy,
            );

            let row = GroupMetrics {
                epoch,
                batch_group: group,
                steps,
                mean_loss,
                validation_batches,
                validation_accuracy,
            };
            if let Some(logger) = metrics {
                logger.log(&row)?;
            }
            groups.push(row);
        }
        tracing::debug!("Epoch {} finished", epoch);
    }

    // ── Final checkpoint ──────────────────────────────────────────────────────
    // Written even when no step ran, so the file always exists after a run.
    session.save_parameters(&cfg.save_model_path)?;
    tracing::info!("Training complete");

    Ok(TrainingReport { groups, checkpoint: cfg.save_model_path.clone() })
}

/// One optimizer step per mini-batch; returns (steps, mean loss).
fn train_group<S, D>(session: &mut S, data: &D, group: usize) -> Result<(usize, f64)>
where
    S: TrainingSession,
    D: BatchSupplier,
{
    let mut total_loss = 0.0f64;
    let mut steps      = 0usize;

    for batch in data.training_batches(group)? {
        total_loss += session.optimize(&batch?)?;
        steps      += 1;
    }

    ensure!(steps > 0, "batch group {group} yielded no mini-batches");
    Ok((steps, total_loss / steps as f64))
}

/// Mean of per-mini-batch accuracy over the validation supplier;
/// returns (mini-batches evaluated, mean accuracy).
fn validate<S, D>(session: &mut S, data: &D) -> Result<(usize, f64)>
where
    S: TrainingSession,
    D: BatchSupplier,
{
    let mut total   = 0.0f64;
    let mut batches = 0usize;

    for batch in data.validation_batches()? {
        total   += session.accuracy(&batch?)?;
        batches += 1;
    }

    ensure!(batches > 0, "the validation set yielded no mini-batches");
    Ok((batches, total / batches as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::images::{ImageShape, LabeledImages, MiniBatch};
    use crate::domain::traits::Batches;
    use anyhow::bail;
    use std::{cell::RefCell, path::Path};

    // A 1×1×1 "image" whose single pixel doubles as an id.
    fn tagged(id: f32) -> MiniBatch {
        LabeledImages::new(ImageShape::new(1, 1, 1), 1, vec![id], vec![1.0]).unwrap()
    }

    fn id_of(batch: &MiniBatch) -> f32 {
        batch.features()[0]
    }

    /// Loss of a step is the batch id; accuracy is the batch id too.
    #[derive(Default)]
    struct RecordingSession {
        steps:   Vec<f32>,
        evals:   usize,
        saves:   RefCell<Vec<PathBuf>>,
        fail_on: Option<f32>,
    }

    impl TrainingSession for RecordingSession {
        fn optimize(&mut self, batch: &MiniBatch) -> Result<f64> {
            let id = id_of(batch);
            if self.fail_on == Some(id) {
                bail!("step {id} failed");
            }
            self.steps.push(id);
            Ok(id as f64)
        }

        fn accuracy(&mut self, batch: &MiniBatch) -> Result<f64> {
            self.evals += 1;
            Ok(id_of(batch) as f64)
        }

        fn save_parameters(&self, path: &Path) -> Result<()> {
            self.saves.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    struct FixedBatches {
        groups:     Vec<Vec<f32>>,
        validation: Vec<f32>,
    }

    impl BatchSupplier for FixedBatches {
        fn training_batches(&self, group: usize) -> Result<Batches<'_>> {
            let ids = self.groups.get(group - 1).cloned().unwrap_or_default();
            Ok(Box::new(ids.into_iter().map(|id| Ok(tagged(id)))))
        }

        fn validation_batches(&self) -> Result<Batches<'_>> {
            Ok(Box::new(self.validation.clone().into_iter().map(|id| Ok(tagged(id)))))
        }
    }

    fn config(epochs: usize, batch_groups: usize) -> DriverConfig {
        DriverConfig { epochs, batch_groups, save_model_path: PathBuf::from("out/model") }
    }

    fn supplier() -> FixedBatches {
        FixedBatches {
            groups:     vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]],
            validation: vec![0.2, 0.4, 0.9],
        }
    }

    #[test]
    fn test_one_step_per_mini_batch_in_supplier_order() {
        let mut session = RecordingSession::default();
        let report = run_training(&config(2, 2), &mut session, &supplier(), None).unwrap();

        assert_eq!(session.steps, vec![1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(report.total_steps(), 10);
        assert_eq!(report.groups.len(), 4);
    }

    #[test]
    fn test_mean_loss_and_validation_accuracy_per_group() {
        let mut session = RecordingSession::default();
        let report = run_training(&config(1, 2), &mut session, &supplier(), None).unwrap();

        let first = &report.groups[0];
        assert_eq!((first.epoch, first.batch_group, first.steps), (1, 1, 3));
        assert!((first.mean_loss - 2.0).abs() < 1e-9);

        let second = &report.groups[1];
        assert!((second.mean_loss - 4.5).abs() < 1e-6);

        // (0.2 + 0.4 + 0.9) / 3, divided by the batches actually seen
        for row in &report.groups {
            assert_eq!(row.validation_batches, 3);
            assert!((row.validation_accuracy - 0.5).abs() < 1e-6);
        }
        assert_eq!(session.evals, 6);
    }

    #[test]
    fn test_parameters_saved_once_at_the_end() {
        let mut session = RecordingSession::default();
        let report = run_training(&config(3, 2), &mut session, &supplier(), None).unwrap();

        assert_eq!(*session.saves.borrow(), vec![PathBuf::from("out/model")]);
        assert_eq!(report.checkpoint, PathBuf::from("out/model"));
    }

    #[test]
    fn test_zero_epochs_saves_initial_parameters() {
        let mut session = RecordingSession::default();
        let report = run_training(&config(0, 5), &mut session, &supplier(), None).unwrap();

        assert!(session.steps.is_empty());
        assert_eq!(session.evals, 0);
        assert_eq!(session.saves.borrow().len(), 1);
        assert!(report.groups.is_empty());
        assert_eq!(report.final_accuracy(), None);
    }

    #[test]
    fn test_empty_batch_group_is_an_error() {
        let mut session = RecordingSession::default();
        let data = FixedBatches { groups: vec![vec![1.0], vec![]], validation: vec![0.5] };

        let err = run_training(&config(1, 2), &mut session, &data, None).unwrap_err();
        assert!(format!("{err:#}").contains("no mini-batches"));
        assert!(session.saves.borrow().is_empty());
    }

    #[test]
    fn test_empty_validation_set_is_an_error() {
        let mut session = RecordingSession::default();
        let data = FixedBatches { groups: vec![vec![1.0]], validation: vec![] };

        let err = run_training(&config(1, 1), &mut session, &data, None).unwrap_err();
        assert!(format!("{err:#}").contains("validation set yielded no mini-batches"));
    }

    #[test]
    fn test_failed_step_aborts_the_run() {
        let mut session = RecordingSession { fail_on: Some(2.0), ..Default::default() };

        let err = run_training(&config(2, 2), &mut session, &supplier(), None).unwrap_err();
        assert!(format!("{err:#}").contains("step 2 failed"));
        assert_eq!(session.steps, vec![1.0]);
        assert!(session.saves.borrow().is_empty());
    }

    #[test]
    fn test_rows_are_appended_to_metrics_csv() {
        let dir     = tempfile::tempdir().unwrap();
        let logger  = MetricsLogger::new(dir.path().join("metrics.csv")).unwrap();
        let mut session = RecordingSession::default();

        run_training(&config(1, 2), &mut session, &supplier(), Some(&logger)).unwrap();

        let text = std::fs::read_to_string(logger.csv_path()).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert_eq!(text.lines().nth(1), Some("1,1,3,2.000000,3,0.500000"));
    }
}
