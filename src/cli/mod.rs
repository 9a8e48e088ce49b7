// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses the flags with
// `clap`, wires the concrete fetcher and tracker together, runs
// the training use case and prints the outcome.
//
// All business logic is delegated to Layer 2 (application).

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::TrainArgs;

use crate::application::registrar::{Registration, QUALITY_THRESHOLD};
use crate::application::train_use_case::{PipelineConfig, TrainReport, TrainUseCase};
use crate::data::fetcher::HttpFetcher;
use crate::infra::open_tracker;

#[derive(Parser, Debug)]
#[command(
    name = "review-nb",
    version,
    about = "Train a bag-of-words Naive Bayes sentiment model, track the run and register it if it is good enough."
)]
pub struct Cli {
    #[command(flatten)]
    pub args: TrainArgs,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config: PipelineConfig = self.args.into();
        tracing::debug!(?config, "Pipeline config");

        let tracker = open_tracker(&config.tracking_uri)?;
        let fetcher = HttpFetcher::new(&config.dataset_url);

        let report = TrainUseCase::new(config, &fetcher, tracker.as_ref()).execute()?;
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &TrainReport) {
    println!(
        "Records: {} read, {} after deduplication ({} train / {} test)",
        report.raw_records, report.clean_records, report.train_records, report.test_records
    );
    println!("Features: {}", report.num_features);
    println!(
        "Train macro F1: {:.4}  accuracy: {:.4}",
        report.train.f1_macro, report.train.accuracy
    );
    println!(
        "Test macro F1: {:.4}  accuracy: {:.4}  balanced accuracy: {:.4}",
        report.test.f1_macro, report.test.accuracy, report.test.balanced_accuracy
    );
    println!("Logged data and model in run: {}", report.run.run_id);

    match &report.registration {
        Registration::Registered(version) => {
            println!("Name: {}", version.name);
            println!("Version: {}", version.version);
        }
        Registration::Skipped { f1_macro } => {
            println!("Model registration failed, f1 score too low (< {QUALITY_THRESHOLD})");
            tracing::debug!("Rejected model scored {:.4}", f1_macro);
        }
    }
}
