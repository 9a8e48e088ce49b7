// ============================================================
// Layer 5 — Training and Evaluation
// ============================================================
// Fits the text pipeline on the training partition and scores it
// on both partitions:
//
//   train split ──► TextClassifier::fit ──► model
//                                             │
//              train split ──► predict ───────┼──► training report
//              test split  ──► predict ───────┴──► test report
//
// No randomness is involved here: the same split always gives
// the same model and the same scores.

use anyhow::{Context, Result};

use crate::domain::record::Split;
use crate::ml::evaluation::EvaluationReport;
use crate::ml::pipeline::{ModelSettings, TextClassifier};

/// Everything the training step hands to the tracking step.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model:        TextClassifier,
    pub train_report: EvaluationReport,
    pub test_report:  EvaluationReport,
}

pub fn train_and_evaluate(settings: &ModelSettings, split: &Split) -> Result<TrainingOutcome> {
    let (train_texts, train_labels) = Split::columns(&split.train);
    let (test_texts, test_labels)   = Split::columns(&split.test);

    // ── Training ──────────────────────────────────────────────────────────────
    tracing::info!("Model training on {} records", train_texts.len());
    let model = TextClassifier::fit(settings, &train_texts, &train_labels)
        .context("Model training failed")?;
    tracing::info!("Model ready: {} features", model.num_features());

    // ── Evaluation ────────────────────────────────────────────────────────────
    tracing::info!("Model evaluation on {} records", test_texts.len());
    let train_pred   = model.predict(&train_texts)?;
    let train_report = EvaluationReport::compute(&train_labels, &train_pred)?;

    let test_pred    = model.predict(&test_texts)?;
    let test_report  = EvaluationReport::compute(&test_labels, &test_pred)?;

    tracing::info!(
        "test f1_macro={:.4} | accuracy={:.4} | balanced_accuracy={:.4}",
        test_report.f1_macro,
        test_report.accuracy,
        test_report.balanced_accuracy,
    );

    Ok(TrainingOutcome { model, train_report, test_report })
}
