// ============================================================
// Layer 1 — CLI Arguments
// ============================================================
// Flags for the single `train` run. The pipeline itself is
// fixed, dataset location included; only where files go and
// where runs are tracked can be changed from the command line
// (or the usual MLflow env vars).
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::Args;

use crate::application::train_use_case::{PipelineConfig, DEFAULT_TRACKING_URI, EXPERIMENT_NAME};

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory the dataset file is downloaded into
    #[arg(long, default_value = ".")]
    pub workdir: String,

    /// Where runs are tracked: an MLflow server URL (http/https)
    /// or a local directory
    #[arg(long, env = "MLFLOW_TRACKING_URI", default_value = DEFAULT_TRACKING_URI)]
    pub tracking_uri: String,

    /// Experiment the run is recorded under
    #[arg(long, env = "MLFLOW_EXPERIMENT_NAME", default_value = EXPERIMENT_NAME)]
    pub experiment: String,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for PipelineConfig {
    fn from(a: TrainArgs) -> Self {
        PipelineConfig {
            workdir:      a.workdir,
            experiment:   a.experiment,
            tracking_uri: a.tracking_uri,
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::train_use_case::DATASET_URL;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: TrainArgs,
    }

    #[test]
    fn test_defaults_match_pipeline_config() {
        let h   = Harness::try_parse_from(["review-nb", "--tracking-uri", "mlruns", "--experiment", "Test"]).unwrap();
        let cfg = PipelineConfig::from(h.args);
        assert_eq!(cfg, PipelineConfig::default());
    }

    #[test]
    fn test_flags_override() {
        let h = Harness::try_parse_from([
            "review-nb",
            "--workdir", "/tmp/data",
            "--tracking-uri", "http://localhost:5000",
            "--experiment", "Reviews",
        ])
        .unwrap();
        let cfg = PipelineConfig::from(h.args);
        assert_eq!(cfg.workdir, "/tmp/data");
        assert_eq!(cfg.tracking_uri, "http://localhost:5000");
        assert_eq!(cfg.experiment, "Reviews");
        assert_eq!(cfg.test_size, 0.1);
        assert_eq!(cfg.dataset_url, DATASET_URL);
    }

    #[test]
    fn test_dataset_location_is_not_a_flag() {
        let parsed = Harness::try_parse_from([
            "review-nb",
            "--dataset-url", "http://elsewhere.example/data.txt",
        ]);
        assert!(parsed.is_err());
    }
}
