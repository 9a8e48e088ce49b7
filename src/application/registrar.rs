// ============================================================
// Layer 2 — Model Registrar (quality gate)
// ============================================================
// Publishes a finished run's model only if it is good enough:
//
//   macro F1 on the test set  ≥ 0.7  → register as "MultinomialNB",
//                                      registry assigns next version
//   macro F1 on the test set  < 0.7  → skip, emit a message
//
// The threshold and the model name are fixed business rules, not
// configuration.

use anyhow::Result;

use crate::domain::run::{ModelVersion, RunRecord};
use crate::domain::traits::ExperimentTracker;

pub const QUALITY_THRESHOLD: f64 = 0.7;
pub const MODEL_NAME: &str       = "MultinomialNB";

/// What happened at the gate.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    Registered(ModelVersion),
    Skipped { f1_macro: f64 },
}

pub fn passes_quality_gate(f1_macro: f64) -> bool {
    f1_macro >= QUALITY_THRESHOLD
}

pub struct ModelRegistrar<'a> {
    tracker: &'a dyn ExperimentTracker,
}

impl<'a> ModelRegistrar<'a> {
    pub fn new(tracker: &'a dyn ExperimentTracker) -> Self {
        Self { tracker }
    }

    pub fn register_if_qualified(&self, run: &RunRecord, f1_macro: f64) -> Result<Registration> {
        if !passes_quality_gate(f1_macro) {
            tracing::warn!(
                "Model registration failed, f1 score too low (< {}): {:.4}",
                QUALITY_THRESHOLD,
                f1_macro,
            );
            return Ok(Registration::Skipped { f1_macro });
        }

        let version = self.tracker.register_model(run, MODEL_NAME)?;
        Ok(Registration::Registered(version))
    }
}
