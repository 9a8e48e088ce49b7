// ============================================================
// Layer 5 — Text Classification Pipeline
// ============================================================
// Chains the count vectorizer and the Naive Bayes classifier
// into one fit/predict unit:
//
//   texts ──► CountVectorizer ──► sparse counts ──► MultinomialNb ──► labels
//
// A TextClassifier only exists in fitted form: `fit` builds it
// and nothing mutates it afterwards. It serialises to JSON so it
// can be logged as a run artifact and loaded again later.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::record::Label;
use crate::ml::naive_bayes::MultinomialNb;
use crate::ml::vectorizer::{CountVectorizer, VectorizerConfig};

/// Hyperparameters for both pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub vectorizer: VectorizerConfig,
    pub alpha:      f64,
    pub fit_prior:  bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerConfig::default(),
            alpha:      1.0,
            fit_prior:  true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextClassifier {
    vectorizer: CountVectorizer,
    classifier: MultinomialNb,
}

impl TextClassifier {
    /// Fit the vectorizer on `texts`, then the classifier on the
    /// resulting counts.
    pub fn fit(settings: &ModelSettings, texts: &[&str], labels: &[Label]) -> Result<Self> {
        let mut vectorizer = CountVectorizer::new(settings.vectorizer.clone())?;
        let mut classifier = MultinomialNb::new(settings.alpha, settings.fit_prior)?;

        let rows = vectorizer
            .fit_transform(texts)
            .context("Vectorizer fit failed")?;
        classifier
            .fit(&rows, labels, vectorizer.vocabulary_size())
            .context("Classifier fit failed")?;

        Ok(Self { vectorizer, classifier })
    }

    pub fn predict(&self, texts: &[&str]) -> Result<Vec<Label>> {
        let rows = self.vectorizer.transform(texts)?;
        self.classifier.predict(&rows)
    }

    /// Width of the feature space (size of the learned vocabulary).
    pub fn num_features(&self) -> usize {
        self.vectorizer.vocabulary_size()
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Cannot serialise model")
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::vectorizer::DocFrequency;

    fn settings() -> ModelSettings {
        ModelSettings {
            vectorizer: VectorizerConfig {
                ngram_range: (1, 2),
                min_df:      DocFrequency::Count(1),
                max_df:      DocFrequency::Proportion(1.0),
            },
            ..ModelSettings::default()
        }
    }

    const TEXTS: [&str; 6] = [
        "great film, loved the acting",
        "wonderful and great story",
        "loved every minute",
        "terrible plot and awful acting",
        "boring, awful, a waste",
        "terrible waste of time",
    ];
    const LABELS: [Label; 6] = [1, 1, 1, 0, 0, 0];

    #[test]
    fn test_fit_then_predict() {
        let model = TextClassifier::fit(&settings(), &TEXTS, &LABELS).unwrap();
        let preds = model.predict(&["great acting, loved it", "awful and boring"]).unwrap();
        assert_eq!(preds, vec![1, 0]);
        let fitted = model.predict(&TEXTS).unwrap();
        assert_eq!(crate::ml::evaluation::accuracy(&LABELS, &fitted).unwrap(), 1.0);
    }

    #[test]
    fn test_refit_is_reproducible() {
        let a = TextClassifier::fit(&settings(), &TEXTS, &LABELS).unwrap();
        let b = TextClassifier::fit(&settings(), &TEXTS, &LABELS).unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
    }

    #[test]
    fn test_json_round_trip_predicts_the_same() {
        let model    = TextClassifier::fit(&settings(), &TEXTS, &LABELS).unwrap();
        let restored: TextClassifier = serde_json::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(restored.num_features(), model.num_features());
        assert_eq!(restored.predict(&TEXTS).unwrap(), model.predict(&TEXTS).unwrap());
    }
}
