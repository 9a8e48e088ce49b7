// ============================================================
// Layer 5 — Classification Metrics
// ============================================================
// Scores predicted labels against the true ones.
//
//   accuracy          = correct / total
//   macro F1          = mean over classes of 2·tp / (2·tp + fp + fn)
//                       classes = union of true and predicted labels;
//                       a class with no tp, fp or fn scores 0
//   balanced accuracy = mean over true classes of tp / (tp + fn)
//
// Macro F1 treats every class equally regardless of how many
// examples it has, which is why it drives the registration gate.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::record::Label;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy:          f64,
    pub f1_macro:          f64,
    pub balanced_accuracy: f64,
}

impl EvaluationReport {
    pub fn compute(y_true: &[Label], y_pred: &[Label]) -> Result<Self> {
        Ok(Self {
            accuracy:          accuracy(y_true, y_pred)?,
            f1_macro:          f1_macro(y_true, y_pred)?,
            balanced_accuracy: balanced_accuracy(y_true, y_pred)?,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ClassCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

fn check_lengths(y_true: &[Label], y_pred: &[Label]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        bail!("{} true labels but {} predictions", y_true.len(), y_pred.len());
    }
    if y_true.is_empty() {
        bail!("cannot score an empty prediction set");
    }
    Ok(())
}

fn confusion(y_true: &[Label], y_pred: &[Label]) -> BTreeMap<Label, ClassCounts> {
    let mut counts: BTreeMap<Label, ClassCounts> = BTreeMap::new();
    for (&t, &p) in y_true.iter().zip(y_pred) {
        if t == p {
            counts.entry(t).or_default().tp += 1;
        } else {
            counts.entry(t).or_default().fn_ += 1;
            counts.entry(p).or_default().fp += 1;
        }
    }
    counts
}

pub fn accuracy(y_true: &[Label], y_pred: &[Label]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}

pub fn f1_macro(y_true: &[Label], y_pred: &[Label]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let counts = confusion(y_true, y_pred);

    let total: f64 = counts
        .values()
        .map(|c| {
            let denom = 2 * c.tp + c.fp + c.fn_;
            if denom == 0 { 0.0 } else { (2 * c.tp) as f64 / denom as f64 }
        })
        .sum();

    Ok(total / counts.len() as f64)
}

pub fn balanced_accuracy(y_true: &[Label], y_pred: &[Label]) -> Result<f64> {
    check_lengths(y_true, y_pred)?;
    let counts = confusion(y_true, y_pred);

    let recalls: Vec<f64> = counts
        .values()
        .filter(|c| c.tp + c.fn_ > 0)
        .map(|c| c.tp as f64 / (c.tp + c.fn_) as f64)
        .collect();

    Ok(recalls.iter().sum::<f64>() / recalls.len() as f64)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_perfect_predictions() {
        let y = [0, 1, 1, 2];
        let r = EvaluationReport::compute(&y, &y).unwrap();
        assert_eq!(r.accuracy, 1.0);
        assert_eq!(r.f1_macro, 1.0);
        assert_eq!(r.balanced_accuracy, 1.0);
    }

    #[test]
    fn test_macro_f1_unweighted() {
        // class 0: tp=3 fp=1 fn=0 → 6/7
        // class 1: tp=0 fp=0 fn=1 → 0
        let y_true = [0, 0, 0, 1];
        let y_pred = [0, 0, 0, 0];
        assert!(close(f1_macro(&y_true, &y_pred).unwrap(), (6.0 / 7.0) / 2.0));
        assert!(close(accuracy(&y_true, &y_pred).unwrap(), 0.75));
        assert!(close(balanced_accuracy(&y_true, &y_pred).unwrap(), 0.5));
    }

    #[test]
    fn test_predicted_only_class_counts_toward_macro_f1() {
        // class 2 never occurs in y_true but is predicted once
        let y_true = [0, 1];
        let y_pred = [0, 2];
        // class 0: 1.0, class 1: 0.0, class 2: 0.0
        assert!(close(f1_macro(&y_true, &y_pred).unwrap(), 1.0 / 3.0));
        // balanced accuracy only averages true classes 0 and 1
        assert!(close(balanced_accuracy(&y_true, &y_pred).unwrap(), 0.5));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(accuracy(&[0, 1], &[0]).is_err());
        assert!(f1_macro(&[], &[]).is_err());
    }
}
