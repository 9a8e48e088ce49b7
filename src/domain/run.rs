// ============================================================
// Layer 3 — Run and Model Version Domain Types
// ============================================================
// A training run moves through two states:
//
//   RunContext  — open: parameters, metrics and artifacts can be
//                 attached to it through an ExperimentTracker
//   RunRecord   — sealed: produced by ExperimentTracker::end_run,
//                 which consumes the RunContext so nothing can be
//                 logged against a finished run
//
// A ModelVersion is what the registry hands back after a
// sealed run's artifact has been published.

use serde::{Deserialize, Serialize};

/// Artifact directory the fitted model is logged under.
pub const MODEL_ARTIFACT_DIR: &str = "model";

/// An open run. Passed explicitly to every logging call.
/// Not `Clone`: `end_run` takes it by value.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_id:        String,
    pub experiment_id: String,
    /// Root of this run's artifact area as the backend names it
    pub artifact_uri:  String,
    /// Milliseconds since the Unix epoch
    pub start_time:    i64,
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Running,
    Finished,
}

/// A sealed run. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id:        String,
    pub experiment_id: String,
    pub artifact_uri:  String,
    pub start_time:    i64,
    pub end_time:      i64,
    pub status:        RunStatus,
}

impl RunRecord {
    pub fn seal(run: RunContext, end_time: i64) -> Self {
        Self {
            run_id:        run.run_id,
            experiment_id: run.experiment_id,
            artifact_uri:  run.artifact_uri,
            start_time:    run.start_time,
            end_time,
            status:        RunStatus::Finished,
        }
    }

    /// URI of the model artifact logged in this run,
    /// e.g. `runs:/3f2a.../model`
    pub fn model_uri(&self) -> String {
        format!("runs:/{}/{}", self.run_id, MODEL_ARTIFACT_DIR)
    }
}

/// A published model in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelVersion {
    pub name:    String,
    pub version: u32,
    pub source:  String,
    pub run_id:  String,
}
