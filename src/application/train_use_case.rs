// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Fetch the dataset file        (Layer 4 - data)
//   Step 2: Parse it into records         (Layer 4 - data)
//   Step 3: Drop duplicate records        (Layer 4 - data)
//   Step 4: Stratified train/test split   (Layer 4 - data)
//   Step 5: Open a tracking run           (Layer 6 - infra)
//   Step 6: Fit + evaluate the model      (Layer 5 - ml)
//   Step 7: Log params, metrics, model    (Layer 6 - infra)
//   Step 8: Seal the run                  (Layer 6 - infra)
//   Step 9: Register if good enough       (Layer 2 - registrar)
//
// Each step takes the previous step's output; nothing runs in
// parallel and nothing is retried. Any error aborts the run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::registrar::{ModelRegistrar, Registration};
use crate::data::{cleaner::deduplicate, reader::DatasetReader, splitter::stratified_split};
use crate::domain::run::{RunContext, RunRecord, MODEL_ARTIFACT_DIR};
use crate::domain::traits::{DatasetSource, ExperimentTracker};
use crate::ml::evaluation::EvaluationReport;
use crate::ml::pipeline::ModelSettings;
use crate::ml::trainer::{train_and_evaluate, TrainingOutcome};

// ─── Pipeline constants ──────────────────────────────────────────────────────
pub const DATASET_URL: &str =
    "https://drive.google.com/uc?export=download&id=13XlJ4uhxxGprn6mnXwXNvV9PxSNyZCsY";
pub const DATASET_FILE: &str         = "dataset.txt";
pub const TEST_SIZE: f64             = 0.1;
pub const RANDOM_STATE: u64          = 0;
pub const EXPERIMENT_NAME: &str      = "Test";
pub const DEFAULT_TRACKING_URI: &str = "mlruns";

// ─── Pipeline Configuration ──────────────────────────────────────────────────
// Everything a run depends on. Serialisable so it can be dumped
// for debugging; the values are also logged as run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub dataset_url:  String,
    pub workdir:      String,
    pub dataset_file: String,
    pub test_size:    f64,
    pub random_state: u64,
    pub model:        ModelSettings,
    pub experiment:   String,
    pub tracking_uri: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            dataset_url:  DATASET_URL.to_string(),
            workdir:      ".".to_string(),
            dataset_file: DATASET_FILE.to_string(),
            test_size:    TEST_SIZE,
            random_state: RANDOM_STATE,
            model:        ModelSettings::default(),
            experiment:   EXPERIMENT_NAME.to_string(),
            tracking_uri: DEFAULT_TRACKING_URI.to_string(),
        }
    }
}

impl PipelineConfig {
    pub fn dataset_path(&self) -> PathBuf {
        PathBuf::from(&self.workdir).join(&self.dataset_file)
    }
}

/// Summary of one completed run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub run:           RunRecord,
    pub raw_records:   usize,
    pub clean_records: usize,
    pub train_records: usize,
    pub test_records:  usize,
    pub num_features:  usize,
    pub train:         EvaluationReport,
    pub test:          EvaluationReport,
    pub registration:  Registration,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase<'a> {
    config:  PipelineConfig,
    source:  &'a dyn DatasetSource,
    tracker: &'a dyn ExperimentTracker,
}

impl<'a> TrainUseCase<'a> {
    pub fn new(
        config:  PipelineConfig,
        source:  &'a dyn DatasetSource,
        tracker: &'a dyn ExperimentTracker,
    ) -> Self {
        Self { config, source, tracker }
    }

    /// Execute the full training pipeline end to end
    pub fn execute(&self) -> Result<TrainReport> {
        let cfg  = &self.config;
        let path = cfg.dataset_path();

        // ── Step 1: Fetch ─────────────────────────────────────────────────────
        self.source
            .fetch(&path)
            .context("Dataset download failed")?;

        // ── Step 2: Read ──────────────────────────────────────────────────────
        let raw         = DatasetReader::new(&path).read()?;
        let raw_records = raw.len();

        // ── Step 3: Clean ─────────────────────────────────────────────────────
        let clean         = deduplicate(raw);
        let clean_records = clean.len();
        tracing::info!("{} records after removing duplicates", clean_records);

        // ── Step 4: Split ─────────────────────────────────────────────────────
        let split = stratified_split(clean, cfg.test_size, cfg.random_state)
            .context("Train/test split failed")?;
        tracing::info!(
            "Split: {} train, {} test",
            split.train.len(),
            split.test.len()
        );

        // ── Step 5: Open run ──────────────────────────────────────────────────
        let run = self.tracker.start_run(&cfg.experiment)?;
        tracing::info!("Started run {}", run.run_id);
        self.tracker.log_param(&run, "test_size", &cfg.test_size.to_string())?;

        // ── Step 6: Train + evaluate ──────────────────────────────────────────
        let outcome = train_and_evaluate(&cfg.model, &split)?;

        // ── Step 7: Log everything ────────────────────────────────────────────
        self.log_params(&run, &outcome, split.train.len(), split.test.len())?;
        self.log_metrics(&run, &outcome)?;

        let model_json = outcome.model.to_json()?;
        self.tracker.log_artifact(
            &run,
            &format!("{MODEL_ARTIFACT_DIR}/model.json"),
            model_json.as_bytes(),
        )?;

        // ── Step 8: Seal ──────────────────────────────────────────────────────
        let run = self.tracker.end_run(run)?;

        // ── Step 9: Quality gate ──────────────────────────────────────────────
        let registration = ModelRegistrar::new(self.tracker)
            .register_if_qualified(&run, outcome.test_report.f1_macro)?;

        Ok(TrainReport {
            run,
            raw_records,
            clean_records,
            train_records: split.train.len(),
            test_records:  split.test.len(),
            num_features:  outcome.model.num_features(),
            train:         outcome.train_report,
            test:          outcome.test_report,
            registration,
        })
    }

    fn log_params(
        &self,
        run:        &RunContext,
        outcome:    &TrainingOutcome,
        train_size: usize,
        test_size:  usize,
    ) -> Result<()> {
        let model          = &self.config.model;
        let (min_n, max_n) = model.vectorizer.ngram_range;

        let params = [
            ("num_features_basic", outcome.model.num_features().to_string()),
            ("ngram_range",        format!("({min_n}, {max_n})")),
            ("min_df",             model.vectorizer.min_df.to_string()),
            ("max_df",             model.vectorizer.max_df.to_string()),
            ("strip_accents",      "unicode".to_string()),
            ("lowercase",          "true".to_string()),
            ("alpha",              model.alpha.to_string()),
            ("fit_prior",          model.fit_prior.to_string()),
            ("random_state",       self.config.random_state.to_string()),
            ("train_size_records", train_size.to_string()),
            ("test_size_records",  test_size.to_string()),
        ];

        for (key, value) in &params {
            self.tracker.log_param(run, key, value)?;
        }
        Ok(())
    }

    fn log_metrics(&self, run: &RunContext, outcome: &TrainingOutcome) -> Result<()> {
        let test  = &outcome.test_report;
        let train = &outcome.train_report;

        let metrics = [
            ("test_f1_macro",          test.f1_macro),
            ("test_accuracy",          test.accuracy),
            ("test_balanced_accuracy", test.balanced_accuracy),
            ("training_accuracy",      train.accuracy),
            ("training_f1_macro",      train.f1_macro),
        ];

        for (key, value) in metrics {
            self.tracker.log_metric(run, key, value)?;
        }
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registrar::MODEL_NAME;
    use crate::infra::local_store::LocalTrackingStore;
    use crate::ml::pipeline::TextClassifier;
    use std::{fs, path::Path};

    /// Writes a fixed dataset instead of downloading one.
    struct StaticSource(String);

    impl DatasetSource for StaticSource {
        fn fetch(&self, dest: &Path) -> Result<()> {
            fs::write(dest, &self.0)?;
            Ok(())
        }
    }

    fn reviews() -> String {
        let mut s = String::from("positive\n");
        for i in 0..20 {
            s.push_str(&format!("1 great wonderful film {i}\n"));
        }
        // duplicate that the cleaner must drop
        s.push_str("1 great wonderful film 0\n");
        s.push_str("\nnegative\n");
        for i in 0..20 {
            s.push_str(&format!("0 awful boring film {i}\n"));
        }
        s
    }

    fn config(dir: &Path) -> PipelineConfig {
        PipelineConfig {
            workdir:      dir.display().to_string(),
            tracking_uri: dir.join("mlruns").display().to_string(),
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn test_end_to_end_registers_good_model() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = config(dir.path());
        let store   = LocalTrackingStore::new(&cfg.tracking_uri).unwrap();
        let source  = StaticSource(reviews());

        let report = TrainUseCase::new(cfg, &source, &store).execute().unwrap();

        assert_eq!(report.raw_records,   41);
        assert_eq!(report.clean_records, 40);
        assert_eq!(report.test_records,  4);
        assert_eq!(report.train_records, 36);
        assert_eq!(report.test.f1_macro, 1.0);

        match &report.registration {
            Registration::Registered(v) => {
                assert_eq!(v.name, MODEL_NAME);
                assert_eq!(v.version, 1);
            }
            other => panic!("expected registration, got {other:?}"),
        }

        let run     = &report.run;
        let params  = store.params(&run.experiment_id, &run.run_id).unwrap();
        let metrics = store.metrics(&run.experiment_id, &run.run_id).unwrap();
        assert_eq!(params["test_size"], "0.1");
        assert_eq!(params["num_features_basic"], report.num_features.to_string());
        assert_eq!(metrics["test_f1_macro"], 1.0);

        let bytes = store
            .artifact(&run.experiment_id, &run.run_id, "model/model.json")
            .unwrap();
        let model: TextClassifier = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(model.predict(&["great wonderful"]).unwrap(), vec![1]);
    }

    #[test]
    fn test_repeated_runs_are_reproducible_and_versioned() {
        let dir    = tempfile::tempdir().unwrap();
        let cfg    = config(dir.path());
        let store  = LocalTrackingStore::new(&cfg.tracking_uri).unwrap();
        let source = StaticSource(reviews());

        let first  = TrainUseCase::new(cfg.clone(), &source, &store).execute().unwrap();
        let second = TrainUseCase::new(cfg, &source, &store).execute().unwrap();

        assert_ne!(first.run.run_id, second.run.run_id);
        assert_eq!(first.num_features, second.num_features);
        assert_eq!(first.test, second.test);
        assert_eq!(store.model_versions(MODEL_NAME).unwrap().len(), 2);
    }

    #[test]
    fn test_malformed_dataset_aborts_before_tracking() {
        let dir    = tempfile::tempdir().unwrap();
        let cfg    = config(dir.path());
        let store  = LocalTrackingStore::new(&cfg.tracking_uri).unwrap();
        let source = StaticSource("header\n1 fine\nonlyonetoken\n".to_string());

        let err = TrainUseCase::new(cfg.clone(), &source, &store).execute().unwrap_err();
        assert!(format!("{err:#}").contains("line 3"));
        assert!(!Path::new(&cfg.tracking_uri).join(EXPERIMENT_NAME).exists());
    }
}
