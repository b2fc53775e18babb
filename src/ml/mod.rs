// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every Burn-specific piece of the network and its training
// lives here (the tensor batcher in data/ is the exception).
//
//   model.rs   - AlexNet: five conv layers, two hidden dense
//                layers with dropout, a linear classifier
//   lrn.rs     - local response normalisation across channels
//   session.rs - BurnSession: model + Adam on an autodiff
//                backend, implementing TrainingSession
//   trainer.rs - the backend-agnostic training driver
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Krizhevsky et al. (2012) ImageNet Classification
//            with Deep Convolutional Neural Networks

/// AlexNet architecture, loss and accuracy
pub mod model;

/// Local response normalisation module
pub mod lrn;

/// Burn-backed TrainingSession
pub mod session;

/// Epoch / batch-group / mini-batch loop
pub mod trainer;
