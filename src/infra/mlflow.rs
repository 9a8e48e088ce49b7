// ============================================================
// Layer 6 — MLflow Tracking Client
// ============================================================
// An ExperimentTracker that talks to an MLflow tracking server
// over its REST API, used when the tracking URI is http(s)://.
//
// Calls made during one run:
//
//   GET  experiments/get-by-name    ─┐ find or create the experiment
//   POST experiments/create         ─┘
//   POST runs/create                → run_id, artifact_uri
//   POST runs/log-parameter         (once per parameter)
//   POST runs/log-metric            (once per metric)
//   PUT  mlflow-artifacts/artifacts/<artifact root>/<path>
//   POST runs/update                → status FINISHED
//   POST registered-models/create   (already-exists is fine)
//   POST model-versions/create      → server assigns the version
//
// Every call is blocking and a non-2xx answer becomes an error
// carrying the server's error_code and message.
//
// Artifacts go through the server's artifact proxy, so the run's
// artifact_uri must be an `mlflow-artifacts:` URI (the server was
// started with --serve-artifacts). The upload path and the source
// of a registered version are both derived from that URI.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{blocking::Client, Method};
use serde_json::{json, Value};
use std::fmt;

use crate::domain::run::{ModelVersion, RunContext, RunRecord, MODEL_ARTIFACT_DIR};
use crate::domain::traits::ExperimentTracker;

const API_PREFIX: &str       = "api/2.0/mlflow";
const ARTIFACTS_PREFIX: &str = "api/2.0/mlflow-artifacts/artifacts";
const PROXY_SCHEME: &str     = "mlflow-artifacts:";

pub struct MlflowClient {
    base_url: String,
    client:   Client,
}

/// A non-success reply from the server.
#[derive(Debug)]
struct ApiError {
    status:     reqwest::StatusCode,
    error_code: Option<String>,
    message:    String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}", self.status.as_u16())?;
        if let Some(code) = &self.error_code {
            write!(f, " {code}")?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

impl MlflowClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client:   Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    /// Send one API call, returning the decoded body or the server's error.
    fn call(
        &self,
        method: Method,
        path:   &str,
        query:  &[(&str, &str)],
        body:   Option<Value>,
    ) -> Result<std::result::Result<Value, ApiError>> {
        let url     = self.endpoint(path);
        let mut req = self.client.request(method, &url).query(query);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .with_context(|| format!("MLflow request to '{url}' failed"))?;
        let status = response.status();
        let text   = response
            .text()
            .with_context(|| format!("Cannot read MLflow response from '{url}'"))?;

        let value: Value = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "message": text }))
        };

        if status.is_success() {
            return Ok(Ok(value));
        }

        Ok(Err(ApiError {
            status,
            error_code: value["error_code"].as_str().map(str::to_string),
            message:    value["message"].as_str().unwrap_or_default().to_string(),
        }))
    }

    /// POST and treat any error reply as fatal.
    fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.call(Method::POST, path, &[], Some(body))?
            .map_err(|e| anyhow!("MLflow {path} failed: {e}"))
    }

    fn experiment_id(&self, name: &str) -> Result<String> {
        let found = self.call(
            Method::GET,
            "experiments/get-by-name",
            &[("experiment_name", name)],
            None,
        )?;

        match found {
            Ok(body) => string_field(&body["experiment"]["experiment_id"], "experiment_id"),
            Err(e) if e.error_code.as_deref() == Some("RESOURCE_DOES_NOT_EXIST") => {
                tracing::info!("Creating MLflow experiment '{}'", name);
                let body = self.post("experiments/create", json!({ "name": name }))?;
                string_field(&body["experiment_id"], "experiment_id")
            }
            Err(e) => bail!("MLflow experiments/get-by-name failed: {e}"),
        }
    }
}

impl ExperimentTracker for MlflowClient {
    fn start_run(&self, experiment: &str) -> Result<RunContext> {
        let experiment_id = self.experiment_id(experiment)?;
        let start_time    = chrono::Utc::now().timestamp_millis();

        let body = self.post(
            "runs/create",
            json!({
                "experiment_id": experiment_id,
                "start_time":    start_time,
                "tags": [{ "key": "mlflow.source.name", "value": env!("CARGO_PKG_NAME") }],
            }),
        )?;

        let info = &body["run"]["info"];
        Ok(RunContext {
            run_id:        string_field(&info["run_id"], "run_id")?,
            experiment_id,
            artifact_uri:  string_field(&info["artifact_uri"], "artifact_uri")?,
            start_time,
        })
    }

    fn log_param(&self, run: &RunContext, key: &str, value: &str) -> Result<()> {
        self.post(
            "runs/log-parameter",
            json!({ "run_id": run.run_id, "key": key, "value": value }),
        )?;
        Ok(())
    }

    fn log_metric(&self, run: &RunContext, key: &str, value: f64) -> Result<()> {
        self.post(
            "runs/log-metric",
            json!({
                "run_id":    run.run_id,
                "key":       key,
                "value":     value,
                "timestamp": chrono::Utc::now().timestamp_millis(),
                "step":      0,
            }),
        )?;
        Ok(())
    }

    fn log_artifact(&self, run: &RunContext, artifact_path: &str, bytes: &[u8]) -> Result<()> {
        let root = proxied_artifact_root(&run.artifact_uri)?;
        let url  = format!(
            "{}/{}/{}/{}",
            self.base_url,
            ARTIFACTS_PREFIX,
            root,
            artifact_path.trim_start_matches('/')
        );

        self.client
            .put(&url)
            .body(bytes.to_vec())
            .send()
            .with_context(|| format!("Artifact upload to '{url}' failed"))?
            .error_for_status()
            .with_context(|| format!("MLflow rejected artifact '{artifact_path}'"))?;

        tracing::debug!("Uploaded artifact '{}' ({} bytes)", artifact_path, bytes.len());
        Ok(())
    }

    fn end_run(&self, run: RunContext) -> Result<RunRecord> {
        let end_time = chrono::Utc::now().timestamp_millis();
        self.post(
            "runs/update",
            json!({ "run_id": run.run_id, "status": "FINISHED", "end_time": end_time }),
        )?;
        Ok(RunRecord::seal(run, end_time))
    }

    fn register_model(&self, run: &RunRecord, name: &str) -> Result<ModelVersion> {
        match self.call(Method::POST, "registered-models/create", &[], Some(json!({ "name": name })))? {
            Ok(_) => tracing::info!("Created registered model '{}'", name),
            Err(e) if e.error_code.as_deref() == Some("RESOURCE_ALREADY_EXISTS") => {}
            Err(e) => bail!("MLflow registered-models/create failed: {e}"),
        }

        let source = format!("{}/{}", run.artifact_uri, MODEL_ARTIFACT_DIR);
        let body   = self.post(
            "model-versions/create",
            json!({ "name": name, "source": source, "run_id": run.run_id }),
        )?;

        let mv      = &body["model_version"];
        let version = string_field(&mv["version"], "version")?
            .parse::<u32>()
            .context("MLflow returned a non-numeric model version")?;

        Ok(ModelVersion {
            name:    string_field(&mv["name"], "name")?,
            version,
            source:  run.model_uri(),
            run_id:  run.run_id.clone(),
        })
    }
}

/// Path below the artifact proxy route that `artifact_uri` names:
///
///   mlflow-artifacts:/3/abc/artifacts            → 3/abc/artifacts
///   mlflow-artifacts://host:5000/3/abc/artifacts → 3/abc/artifacts
fn proxied_artifact_root(artifact_uri: &str) -> Result<String> {
    let Some(rest) = artifact_uri.strip_prefix(PROXY_SCHEME) else {
        bail!(
            "Cannot upload to artifact location '{artifact_uri}': only \
             {PROXY_SCHEME} URIs are supported (start the server with --serve-artifacts)"
        );
    };

    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => authority_and_path
            .split_once('/')
            .map(|(_, path)| path)
            .unwrap_or_default(),
        None => rest,
    };

    let path = path.trim_matches('/');
    if path.is_empty() {
        bail!("Artifact location '{artifact_uri}' has no path");
    }
    Ok(path.to_string())
}

fn string_field(value: &Value, field: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => bail!("MLflow response is missing '{field}'"),
    }
}
