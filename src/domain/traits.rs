// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The training driver only ever talks to these two traits:
//
//   TrainingSession - owns the model parameters and the optimizer
//                     for the lifetime of one run
//   BatchSupplier   - yields training mini-batches per batch group
//                     and the fixed validation mini-batches
//
// Implementations:
//   - BurnSession (ml::session)   → Burn model + Adam
//   - Cifar10Batches (data::supplier) → preprocessed blob files
//   - mocks in ml::trainer tests  → record calls, return fixed values

use std::path::Path;

use anyhow::Result;

use crate::domain::images::MiniBatch;

/// Lazy, ordered sequence of mini-batches. Loading or resizing may fail
/// part way through, so every item is a `Result`.
pub type Batches<'a> = Box<dyn Iterator<Item = Result<MiniBatch>> + 'a>;

// ─── TrainingSession ──────────────────────────────────────────────────────────
/// The execution context a run trains inside. Parameters are initialised
/// when the session is created and released when it is dropped.
pub trait TrainingSession {
    /// Run one optimizer step on `batch` and return that step's loss.
    fn optimize(&mut self, batch: &MiniBatch) -> Result<f64>;

    /// Fraction of `batch` classified correctly by the current parameters.
    fn accuracy(&mut self, batch: &MiniBatch) -> Result<f64>;

    /// Persist every current parameter value to `path`, overwriting it.
    fn save_parameters(&self, path: &Path) -> Result<()>;
}

// ─── BatchSupplier ────────────────────────────────────────────────────────────
/// Source of training and validation data for the driver.
pub trait BatchSupplier {
    /// Mini-batches for batch group `group` (1-based). Restartable: calling
    /// it again for the same group yields the same sequence.
    fn training_batches(&self, group: usize) -> Result<Batches<'_>>;

    /// The fixed validation mini-batches.
    fn validation_batches(&self) -> Result<Batches<'_>>;
}
