// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Persistence that several layers share:
//
//   checkpoint.rs - model weights through Burn's CompactRecorder,
//                   plus the run's TrainConfig as JSON
//
//   blob_store.rs - bincode files for the preprocessed dataset
//                   splits, written once and reloaded by every
//                   later run
//
//   metrics.rs    - one CSV row per batch group (loss, accuracy)
//                   for plotting learning curves
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving
pub mod checkpoint;

/// Bincode persistence for preprocessed data
pub mod blob_store;

/// Training metrics CSV logger
pub mod metrics;
