// ============================================================
// Layer 5 — Multinomial Naive Bayes
// ============================================================
// A probabilistic classifier over count features.
//
// Fitting (per class c, feature j):
//   N_cj  = total count of feature j in documents of class c
//   N_c   = Σ_j N_cj
//   log P(j | c) = ln( (N_cj + α) / (N_c + α · n_features) )
//   log P(c)     = ln( documents in c / all documents )
//
// Prediction:
//   argmax_c  log P(c) + Σ_j x_j · log P(j | c)
//
// α (alpha) is additive smoothing: it gives features never seen
// with a class a small non-zero probability instead of zero.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::record::Label;
use crate::ml::vectorizer::SparseRow;

// Smallest alpha allowed; smaller values are raised to this
const MIN_ALPHA: f64 = 1e-10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    alpha:            f64,
    fit_prior:        bool,
    classes:          Vec<Label>,
    class_log_prior:  Vec<f64>,
    /// [n_classes][n_features]
    feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNb {
    pub fn new(alpha: f64, fit_prior: bool) -> Result<Self> {
        if !(alpha >= 0.0) {
            bail!("alpha must be non-negative, got {alpha}");
        }
        Ok(Self {
            alpha: alpha.max(MIN_ALPHA),
            fit_prior,
            classes:          Vec::new(),
            class_log_prior:  Vec::new(),
            feature_log_prob: Vec::new(),
        })
    }

    pub fn fit(&mut self, rows: &[SparseRow], labels: &[Label], n_features: usize) -> Result<()> {
        if rows.len() != labels.len() {
            bail!("{} feature rows but {} labels", rows.len(), labels.len());
        }
        if rows.is_empty() {
            bail!("cannot fit a classifier on zero samples");
        }

        // ── Accumulate per-class document and feature counts ──────────────────
        let mut per_class: BTreeMap<Label, (usize, Vec<f64>)> = BTreeMap::new();
        for (row, &label) in rows.iter().zip(labels) {
            let (docs, counts) = per_class
                .entry(label)
                .or_insert_with(|| (0, vec![0.0; n_features]));
            *docs += 1;
            for &(idx, count) in row {
                if idx >= n_features {
                    bail!("feature index {idx} out of range for {n_features} features");
                }
                counts[idx] += f64::from(count);
            }
        }

        let n_samples = rows.len() as f64;
        let n_classes = per_class.len() as f64;

        self.classes          = per_class.keys().copied().collect();
        self.class_log_prior  = Vec::with_capacity(per_class.len());
        self.feature_log_prob = Vec::with_capacity(per_class.len());

        for (docs, counts) in per_class.into_values() {
            let prior = if self.fit_prior {
                (docs as f64 / n_samples).ln()
            } else {
                -n_classes.ln()
            };
            self.class_log_prior.push(prior);

            let denom = (counts.iter().sum::<f64>() + self.alpha * n_features as f64).ln();
            self.feature_log_prob
                .push(counts.iter().map(|&c| (c + self.alpha).ln() - denom).collect());
        }

        tracing::debug!(
            "Fitted MultinomialNB: {} classes, {} features",
            self.classes.len(),
            n_features,
        );
        Ok(())
    }

    /// Unnormalised log posterior of every class for one row.
    pub fn joint_log_likelihood(&self, row: &SparseRow) -> Vec<f64> {
        self.class_log_prior
            .iter()
            .zip(&self.feature_log_prob)
            .map(|(prior, flp)| {
                prior
                    + row
                        .iter()
                        .filter_map(|&(idx, count)| flp.get(idx).map(|p| p * f64::from(count)))
                        .sum::<f64>()
            })
            .collect()
    }

    pub fn predict(&self, rows: &[SparseRow]) -> Result<Vec<Label>> {
        if self.classes.is_empty() {
            bail!("classifier is not fitted");
        }
        Ok(rows.iter().map(|row| self.predict_one(row)).collect())
    }

    fn predict_one(&self, row: &SparseRow) -> Label {
        let jll = self.joint_log_likelihood(row);

        // strict > keeps the first (smallest) class on ties
        let mut best = 0;
        for (idx, &score) in jll.iter().enumerate().skip(1) {
            if score > jll[best] {
                best = idx;
            }
        }
        self.classes[best]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learns_separable_features() {
        // feature 0 ↔ class 1, feature 1 ↔ class 0
        let rows: Vec<SparseRow> = vec![
            vec![(0, 3)],
            vec![(0, 2)],
            vec![(1, 4)],
            vec![(1, 1)],
        ];
        let labels = vec![1, 1, 0, 0];

        let mut nb = MultinomialNb::new(1.0, true).unwrap();
        nb.fit(&rows, &labels, 2).unwrap();

        assert_eq!(nb.classes, vec![0, 1]);
        assert_eq!(nb.predict(&[vec![(0, 1)], vec![(1, 1)]]).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_feature_log_prob_with_smoothing() {
        let rows: Vec<SparseRow> = vec![vec![(0, 2)], vec![(1, 1)]];
        let mut nb = MultinomialNb::new(1.0, true).unwrap();
        nb.fit(&rows, &[0, 1], 2).unwrap();

        // class 0: counts [2, 0] → (2+1)/(2+2), (0+1)/(2+2)
        let p: Vec<f64> = nb.feature_log_prob[0].iter().map(|x| x.exp()).collect();
        assert!((p[0] - 0.75).abs() < 1e-12);
        assert!((p[1] - 0.25).abs() < 1e-12);
        assert!((nb.class_log_prior[0].exp() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_row_falls_back_to_prior() {
        let rows: Vec<SparseRow> = vec![vec![(0, 1)], vec![(0, 1)], vec![(1, 1)]];
        let mut nb = MultinomialNb::new(1.0, true).unwrap();
        nb.fit(&rows, &[5, 5, 7], 2).unwrap();
        assert_eq!(nb.predict(&[Vec::new()]).unwrap(), vec![5]);
    }

    #[test]
    fn test_mismatched_lengths() {
        let mut nb = MultinomialNb::new(1.0, true).unwrap();
        assert!(nb.fit(&[vec![(0, 1)]], &[0, 1], 1).is_err());
    }

    #[test]
    fn test_predict_before_fit() {
        let nb = MultinomialNb::new(1.0, true).unwrap();
        assert!(nb.predict(&[Vec::new()]).is_err());
    }

    #[test]
    fn test_negative_alpha_rejected() {
        assert!(MultinomialNb::new(-1.0, true).is_err());
    }
}
