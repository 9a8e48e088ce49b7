// ============================================================
// Layer 6 — Local Tracking Store
// ============================================================
// An ExperimentTracker backed by a plain directory tree, used
// when the tracking URI is a filesystem path (the default is
// `mlruns`).
//
// Layout:
//   <root>/
//     <experiment>/
//       <run_id>/
//         meta.json          ← RunContext while open, RunRecord once sealed
//         params.json        ← { key: value }
//         metrics.csv        ← key,value,timestamp (append-only history)
//         artifacts/
//           model/model.json
//     models/
//       <name>/
//         <version>/
//           version.json     ← ModelVersion
//           model.json       ← copy of the run's model artifact
//
// Versions are numbered 1, 2, 3, … per model name: the next
// version is one more than the highest version directory present.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::Write,
    path::{Component, Path, PathBuf},
};

use crate::domain::run::{ModelVersion, RunContext, RunRecord, RunStatus, MODEL_ARTIFACT_DIR};
use crate::domain::traits::ExperimentTracker;

const MODELS_DIR: &str = "models";

/// The part of `meta.json` that says whether a run is still open.
#[derive(Deserialize)]
struct RunState {
    status: RunStatus,
}

pub struct LocalTrackingStore {
    root: PathBuf,
}

impl LocalTrackingStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .with_context(|| format!("Cannot create tracking root '{}'", root.display()))?;
        Ok(Self { root })
    }

    fn run_dir(&self, experiment_id: &str, run_id: &str) -> PathBuf {
        self.root.join(experiment_id).join(run_id)
    }

    fn artifacts_dir(&self, experiment_id: &str, run_id: &str) -> PathBuf {
        self.run_dir(experiment_id, run_id).join("artifacts")
    }

    fn model_dir(&self, name: &str) -> PathBuf {
        self.root.join(MODELS_DIR).join(name)
    }

    fn version_numbers(&self, name: &str) -> Result<Vec<u32>> {
        let dir = self.model_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut numbers = Vec::new();
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("Cannot read registry '{}'", dir.display()))?
        {
            let entry = entry?;
            if let Some(n) = entry.file_name().to_str().and_then(|s| s.parse::<u32>().ok()) {
                numbers.push(n);
            }
        }
        numbers.sort_unstable();
        Ok(numbers)
    }

    /// Directory of `run`, provided it exists and has not been sealed.
    fn ensure_open(&self, run: &RunContext) -> Result<PathBuf> {
        let dir  = self.run_dir(&run.experiment_id, &run.run_id);
        let meta = dir.join("meta.json");
        if !meta.exists() {
            bail!("Run '{}' does not exist in '{}'", run.run_id, self.root.display());
        }

        let json = fs::read_to_string(&meta)
            .with_context(|| format!("Cannot read '{}'", meta.display()))?;
        let state: RunState = serde_json::from_str(&json)
            .with_context(|| format!("Corrupt run metadata in '{}'", meta.display()))?;
        if state.status == RunStatus::Finished {
            bail!("Run '{}' is finished, nothing more can be logged to it", run.run_id);
        }
        Ok(dir)
    }
}

// Read-back of what a run recorded, used to check the store's contents.
#[cfg(test)]
impl LocalTrackingStore {
    /// Parameters logged to a run so far.
    pub fn params(&self, experiment_id: &str, run_id: &str) -> Result<BTreeMap<String, String>> {
        read_json_or_default(&self.run_dir(experiment_id, run_id).join("params.json"))
    }

    /// Latest value of every metric logged to a run.
    pub fn metrics(&self, experiment_id: &str, run_id: &str) -> Result<BTreeMap<String, f64>> {
        let path = self.run_dir(experiment_id, run_id).join("metrics.csv");
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let csv = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;

        let mut latest = BTreeMap::new();
        for (idx, line) in csv.lines().enumerate().skip(1) {
            let mut cols = line.split(',');
            let (Some(key), Some(value)) = (cols.next(), cols.next()) else {
                bail!("Malformed metrics row {} in '{}'", idx + 1, path.display());
            };
            let value: f64 = value
                .parse()
                .with_context(|| format!("Bad metric value on row {}", idx + 1))?;
            latest.insert(key.to_string(), value);
        }
        Ok(latest)
    }

    /// Bytes of an artifact previously logged to a run.
    pub fn artifact(&self, experiment_id: &str, run_id: &str, artifact_path: &str) -> Result<Vec<u8>> {
        let path = self.artifacts_dir(experiment_id, run_id).join(relative(artifact_path)?);
        fs::read(&path).with_context(|| format!("Cannot read artifact '{}'", path.display()))
    }

    /// Every registered version of `name`, oldest first.
    pub fn model_versions(&self, name: &str) -> Result<Vec<ModelVersion>> {
        let mut versions = Vec::new();
        for number in self.version_numbers(name)? {
            let path = self.model_dir(name).join(number.to_string()).join("version.json");
            let json = fs::read_to_string(&path)
                .with_context(|| format!("Cannot read '{}'", path.display()))?;
            versions.push(serde_json::from_str(&json)?);
        }
        Ok(versions)
    }
}

impl ExperimentTracker for LocalTrackingStore {
    fn start_run(&self, experiment: &str) -> Result<RunContext> {
        let experiment_id = sanitize(experiment)?;
        let run_id        = uuid::Uuid::new_v4().simple().to_string();
        let artifacts     = self.artifacts_dir(&experiment_id, &run_id);

        fs::create_dir_all(&artifacts)
            .with_context(|| format!("Cannot create run directory '{}'", artifacts.display()))?;

        let run = RunContext {
            run_id,
            experiment_id,
            artifact_uri: artifacts.display().to_string(),
            start_time:   chrono::Utc::now().timestamp_millis(),
        };

        let mut meta = serde_json::to_value(&run)?;
        meta["status"] = serde_json::to_value(RunStatus::Running)?;
        write_json(&self.run_dir(&run.experiment_id, &run.run_id).join("meta.json"), &meta)?;

        tracing::debug!("Started local run {} in '{}'", run.run_id, self.root.display());
        Ok(run)
    }

    fn log_param(&self, run: &RunContext, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.ensure_open(run)?.join("params.json");

        let mut params: BTreeMap<String, String> = read_json_or_default(&path)?;
        if let Some(existing) = params.get(key) {
            if existing != value {
                bail!("Parameter '{key}' already logged as '{existing}', cannot change to '{value}'");
            }
            return Ok(());
        }
        params.insert(key.to_string(), value.to_string());
        write_json(&path, &params)
    }

    fn log_metric(&self, run: &RunContext, key: &str, value: f64) -> Result<()> {
        validate_key(key)?;
        let path = self.ensure_open(run)?.join("metrics.csv");

        if !path.exists() {
            let mut f = fs::File::create(&path)?;
            writeln!(f, "key,value,timestamp")?;
        }

        let mut f = OpenOptions::new()
            .append(true)
            .open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;
        writeln!(f, "{},{},{}", key, value, chrono::Utc::now().timestamp_millis())?;

        tracing::debug!("Logged metric {}={:.6}", key, value);
        Ok(())
    }

    fn log_artifact(&self, run: &RunContext, artifact_path: &str, bytes: &[u8]) -> Result<()> {
        self.ensure_open(run)?;
        let path = self
            .artifacts_dir(&run.experiment_id, &run.run_id)
            .join(relative(artifact_path)?);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)
            .with_context(|| format!("Cannot write artifact '{}'", path.display()))?;

        tracing::debug!("Logged artifact '{}' ({} bytes)", artifact_path, bytes.len());
        Ok(())
    }

    fn end_run(&self, run: RunContext) -> Result<RunRecord> {
        let dir    = self.ensure_open(&run)?;
        let record = RunRecord::seal(run, chrono::Utc::now().timestamp_millis());
        write_json(&dir.join("meta.json"), &record)?;
        Ok(record)
    }

    fn register_model(&self, run: &RunRecord, name: &str) -> Result<ModelVersion> {
        let name    = sanitize(name)?;
        let source  = self.artifacts_dir(&run.experiment_id, &run.run_id).join(MODEL_ARTIFACT_DIR);
        if !source.is_dir() {
            bail!("Run '{}' has no '{}' artifact to register", run.run_id, MODEL_ARTIFACT_DIR);
        }

        let next    = self.version_numbers(&name)?.last().copied().unwrap_or(0) + 1;
        let dest    = self.model_dir(&name).join(next.to_string());
        fs::create_dir_all(&dest)
            .with_context(|| format!("Cannot create '{}'", dest.display()))?;

        // The registry keeps its own copy of the model files
        for entry in fs::read_dir(&source)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::copy(entry.path(), dest.join(entry.file_name()))?;
            }
        }

        let version = ModelVersion {
            name,
            version: next,
            source:  run.model_uri(),
            run_id:  run.run_id.clone(),
        };
        write_json(&dest.join("version.json"), &version)?;

        tracing::info!("Registered {} version {}", version.name, version.version);
        Ok(version)
    }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("Cannot write '{}'", path.display()))
}

fn read_json_or_default<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    if !path.exists() {
        return Ok(T::default());
    }
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Corrupt JSON in '{}'", path.display()))
}

/// Experiment and model names become directory names.
fn sanitize(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || trimmed == MODELS_DIR {
        bail!("'{name}' cannot be used as a name in the tracking store");
    }
    Ok(trimmed
        .chars()
        .map(|c| if c.is_alphanumeric() || "-_. ".contains(c) { c } else { '_' })
        .collect())
}

/// Keys are stored unescaped in CSV/JSON, so keep them simple.
fn validate_key(key: &str) -> Result<()> {
    let ok = !key.is_empty()
        && key.chars().all(|c| c.is_alphanumeric() || "_-./ ".contains(c));
    if !ok {
        bail!("Invalid parameter/metric key {key:?}");
    }
    Ok(())
}

/// Artifact paths must stay inside the run's artifact directory.
fn relative(artifact_path: &str) -> Result<PathBuf> {
    let path = Path::new(artifact_path);
    let ok   = path.components().all(|c| matches!(c, Component::Normal(_)));
    if !ok || artifact_path.is_empty() {
        bail!("Artifact path {artifact_path:?} must be relative and stay inside the run");
    }
    Ok(path.to_path_buf())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, LocalTrackingStore) {
        let dir   = tempfile::tempdir().unwrap();
        let store = LocalTrackingStore::new(dir.path().join("mlruns")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_params_and_metrics_are_recorded() {
        let (_dir, store) = store();
        let run = store.start_run("Test").unwrap();

        store.log_param(&run, "test_size", "0.1").unwrap();
        store.log_metric(&run, "test_f1_macro", 0.5).unwrap();
        store.log_metric(&run, "test_f1_macro", 0.75).unwrap();

        let params  = store.params(&run.experiment_id, &run.run_id).unwrap();
        let metrics = store.metrics(&run.experiment_id, &run.run_id).unwrap();
        assert_eq!(params["test_size"], "0.1");
        assert_eq!(metrics["test_f1_macro"], 0.75);
    }

    #[test]
    fn test_param_cannot_change() {
        let (_dir, store) = store();
        let run = store.start_run("Test").unwrap();
        store.log_param(&run, "alpha", "1").unwrap();
        store.log_param(&run, "alpha", "1").unwrap();
        assert!(store.log_param(&run, "alpha", "2").is_err());
    }

    #[test]
    fn test_versions_auto_increment() {
        let (_dir, store) = store();

        let mut versions = Vec::new();
        for _ in 0..2 {
            let run = store.start_run("Test").unwrap();
            store.log_artifact(&run, "model/model.json", b"{}").unwrap();
            let record = store.end_run(run).unwrap();
            versions.push(store.register_model(&record, "MultinomialNB").unwrap());
        }

        assert_eq!(versions[0].version, 1);
        assert_eq!(versions[1].version, 2);
        assert_eq!(store.model_versions("MultinomialNB").unwrap().len(), 2);
        assert!(versions[1].source.starts_with("runs:/"));
    }

    #[test]
    fn test_register_without_model_artifact_fails() {
        let (_dir, store) = store();
        let run    = store.start_run("Test").unwrap();
        let record = store.end_run(run).unwrap();
        assert!(store.register_model(&record, "MultinomialNB").is_err());
    }

    #[test]
    fn test_artifact_round_trip_and_escape_rejected() {
        let (_dir, store) = store();
        let run = store.start_run("Test").unwrap();

        store.log_artifact(&run, "model/model.json", b"abc").unwrap();
        assert_eq!(
            store.artifact(&run.experiment_id, &run.run_id, "model/model.json").unwrap(),
            b"abc"
        );
        assert!(store.log_artifact(&run, "../escape.txt", b"x").is_err());
    }

    #[test]
    fn test_sealed_run_rejects_further_logging() {
        let (_dir, store) = store();
        let run = store.start_run("Test").unwrap();
        let stale = RunContext {
            run_id:        run.run_id.clone(),
            experiment_id: run.experiment_id.clone(),
            artifact_uri:  run.artifact_uri.clone(),
            start_time:    run.start_time,
        };
        let record = store.end_run(run).unwrap();

        assert!(store.log_param(&stale, "late", "x").is_err());
        assert!(store.log_metric(&stale, "late", 1.0).is_err());
        assert!(store.log_artifact(&stale, "model/late.json", b"{}").is_err());
        assert!(store.end_run(stale).is_err());

        assert!(store.params(&record.experiment_id, &record.run_id).unwrap().is_empty());
        assert!(store.metrics(&record.experiment_id, &record.run_id).unwrap().is_empty());
    }

    #[test]
    fn test_sealed_run_is_written() {
        let (_dir, store) = store();
        let run    = store.start_run("Test").unwrap();
        let (exp, id) = (run.experiment_id.clone(), run.run_id.clone());
        let record = store.end_run(run).unwrap();

        let meta = fs::read_to_string(store.run_dir(&exp, &id).join("meta.json")).unwrap();
        let back: RunRecord = serde_json::from_str(&meta).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.status, RunStatus::Finished);
    }
}
