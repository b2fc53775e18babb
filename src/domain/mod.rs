// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits describing what the trainer works
// with: labelled image sets, mini-batches, the run mode chosen
// on the command line, and the two seams the training driver is
// written against (a session that owns the parameters and a
// supplier that yields mini-batches).
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or network calls
//   - Only plain Rust structs, enums, and traits
//
// Keeping Burn out of this layer is what lets the training
// driver be tested with hand-written mock sessions.

// Labelled image sets and mini-batches
pub mod images;

// Dataset and device-mode selection
pub mod run_mode;

// Core abstractions (traits) that other layers implement
pub mod traits;
