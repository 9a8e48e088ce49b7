// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits that define the core concepts
// of the pipeline: labelled records, runs, registered models,
// and the abstractions over the dataset source and tracker.
//
// Rules for this layer:
//   - NO file I/O or network calls
//   - NO ML-specific code
//   - Only plain Rust structs, enums, and traits

// A labelled review and the collections built from it
pub mod record;

// Open / sealed runs and registered model versions
pub mod run;

// Core abstractions (traits) that other layers implement
pub mod traits;
