// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per batch group so learning curves can be
// plotted after a run.
//
// Columns:
//   epoch              - 1-based epoch number
//   batch_group        - 1-based CIFAR-10 batch file number
//   steps              - optimizer steps run in the group
//   mean_loss          - mean per-step loss over the group
//   validation_batches - validation mini-batches evaluated
//   validation_accuracy - mean per-mini-batch validation accuracy
//
// Example:
//   epoch,batch_group,steps,mean_loss,validation_batches,validation_accuracy
//   1,1,141,2.297163,16,0.118750
//
// The file is appended to across runs; the header is written only
// when the file is created.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

const HEADER: &str = "epoch,batch_group,steps,mean_loss,validation_batches,validation_accuracy";

/// What the driver reports after each batch group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub epoch:               usize,
    pub batch_group:         usize,
    pub steps:               usize,
    pub mean_loss:           f64,
    pub validation_batches:  usize,
    pub validation_accuracy: f64,
}

/// Appends `GroupMetrics` rows to a CSV file.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Open (or create) the CSV at `csv_path`.
    pub fn new(csv_path: impl Into<PathBuf>) -> Result<Self> {
        let csv_path = csv_path.into();

        if let Some(parent) = csv_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &GroupMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{},{},{:.6},{},{:.6}",
            m.epoch,
            m.batch_group,
            m.steps,
            m.mean_loss,
            m.validation_batches,
            m.validation_accuracy,
        )?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(epoch: usize) -> GroupMetrics {
        GroupMetrics {
            epoch,
            batch_group:         2,
            steps:               10,
            mean_loss:           1.5,
            validation_batches:  4,
            validation_accuracy: 0.25,
        }
    }

    #[test]
    fn test_header_written_once_rows_appended() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");

        MetricsLogger::new(&path).unwrap().log(&row(1)).unwrap();
        // Re-opening must not repeat the header
        MetricsLogger::new(&path).unwrap().log(&row(2)).unwrap();

        let text  = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![HEADER, "1,2,10,1.500000,4,0.250000", "2,2,10,1.500000,4,0.250000"]);
    }
}
