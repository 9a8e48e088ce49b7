// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concrete implementations of the ExperimentTracker trait:
//
//   local_store.rs — directory-backed runs, params, metrics,
//                    artifacts and a versioned model registry
//
//   mlflow.rs      — REST client for an MLflow tracking server
//
// `open_tracker` picks one from the tracking URI so the rest of
// the program only deals with `dyn ExperimentTracker`.

/// Filesystem tracking store
pub mod local_store;

/// MLflow REST tracking client
pub mod mlflow;

use anyhow::Result;

use crate::domain::traits::ExperimentTracker;

/// `http://` / `https://` → MLflow server, anything else → local path.
pub fn open_tracker(tracking_uri: &str) -> Result<Box<dyn ExperimentTracker>> {
    if tracking_uri.starts_with("http://") || tracking_uri.starts_with("https://") {
        tracing::info!("Tracking runs on MLflow server {}", tracking_uri);
        return Ok(Box::new(mlflow::MlflowClient::new(tracking_uri)));
    }

    let path = tracking_uri.strip_prefix("file://").unwrap_or(tracking_uri);
    tracing::info!("Tracking runs in local store '{}'", path);
    Ok(Box::new(local_store::LocalTrackingStore::new(path)?))
}
