// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Coordinates the other layers for a training run.
//
// Rules for this layer:
//   - No tensor code here (Layer 5)
//   - No file formats here (Layers 4 and 6)
//   - Only workflow coordination

// The training workflow
pub mod train_use_case;
