// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal: a tracked training run that ends with either a
// registered model or a "not good enough" verdict.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct HTTP or tracking-store access (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Dependencies come in as trait objects (DatasetSource,
// ExperimentTracker), so tests can swap in local fakes.

// The training workflow
pub mod train_use_case;

// The post-training quality gate
pub mod registrar;
