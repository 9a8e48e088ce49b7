// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The two seams where the pipeline touches the outside world:
//
//   DatasetSource      — where the raw dataset file comes from
//                        (HTTP download in production, an in-memory
//                        string in tests)
//   ExperimentTracker  — where parameters, metrics, artifacts and
//                        registered models go (local directory
//                        store or an MLflow tracking server)
//
// The application layer only ever sees these traits, so a run
// can be driven end to end without a network connection.

use std::path::Path;

use anyhow::Result;

use crate::domain::run::{ModelVersion, RunContext, RunRecord};

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Anything that can materialise the raw dataset file on disk.
///
/// Implementations:
///   - HttpFetcher → downloads from a fixed URL
pub trait DatasetSource {
    /// Write the dataset to `dest`, replacing whatever is there.
    fn fetch(&self, dest: &Path) -> Result<()>;
}

// ─── ExperimentTracker ────────────────────────────────────────────────────────
/// Records runs, their parameters/metrics/artifacts, and the
/// models registered from them.
///
/// There is no ambient "active run": every call names the run
/// it applies to through an explicit RunContext.
pub trait ExperimentTracker {
    /// Create a new run under the named experiment,
    /// creating the experiment if it does not exist yet.
    fn start_run(&self, experiment: &str) -> Result<RunContext>;

    /// Attach a key/value parameter to an open run.
    fn log_param(&self, run: &RunContext, key: &str, value: &str) -> Result<()>;

    /// Attach a scalar metric to an open run.
    fn log_metric(&self, run: &RunContext, key: &str, value: f64) -> Result<()>;

    /// Store `bytes` under `artifact_path` (e.g. "model/model.json")
    /// within the run's artifact area.
    fn log_artifact(&self, run: &RunContext, artifact_path: &str, bytes: &[u8]) -> Result<()>;

    /// Seal the run. Consumes the context so it cannot be logged to again.
    fn end_run(&self, run: RunContext) -> Result<RunRecord>;

    /// Publish the run's model artifact under `name`.
    /// The registry assigns the next version number.
    fn register_model(&self, run: &RunRecord, name: &str) -> Result<ModelVersion>;
}
