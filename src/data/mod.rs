// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the CIFAR-10 archive to device tensors.
//
// The pipeline flows in this order:
//
//   cifar-10-binary.tar.gz
//       │
//       ▼
//   cifar10           → download, unpack, parse binary records
//       │
//       ▼
//   preprocessor      → normalise, HWC, one-hot, hold out
//       │               validation, persist blobs
//       ▼
//   supplier          → lazy ordered mini-batches per batch group
//       │
//       ▼
//   resize            → 32×32 → 224×224 network input
//       │
//       ▼
//   dataset + batcher → per-image items stacked into [N, C, H, W]
//                       image and [N, K] target tensors
//
// Only `dataset` and `batcher` touch Burn; everything above them
// works on plain `LabeledImages` and is tested without a backend.

/// CIFAR-10 download and binary batch parsing
pub mod cifar10;

/// Normalisation, one-hot encoding and persisted splits
pub mod preprocessor;

/// Burn Dataset view of labelled images
pub mod dataset;

/// Ordered mini-batch sequences and the driver's BatchSupplier
pub mod supplier;

/// Bilinear resize to the network input size
pub mod resize;

/// Mini-batch → tensor conversion
pub mod batcher;
