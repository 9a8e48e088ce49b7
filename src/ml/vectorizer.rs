// ============================================================
// Layer 5 — Count Vectorizer (bag of n-grams)
// ============================================================
// Learns a vocabulary of word n-grams from the training texts and
// turns each text into a sparse vector of n-gram counts.
//
// Example with ngram_range = (1, 2):
//   "great movies great cast"
//     tokens  → great, movie, great, cast
//     1-grams → great, movie, great, cast
//     2-grams → "great movie", "movie great", "great cast"
//
// Vocabulary pruning by document frequency (df = number of
// training documents containing the term):
//   min_df — drop terms that are too rare   (df <  min)
//   max_df — drop terms that are too common (df >  max)
// Each bound is an absolute count or a proportion of the
// training documents.
//
// The surviving terms are sorted lexicographically and numbered
// in that order, so the same training set always yields the same
// feature indices.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use crate::ml::tokenizer::LemmaTokenizer;

/// One document as (feature index, count) pairs, sorted by index.
pub type SparseRow = Vec<(usize, u32)>;

/// A document-frequency bound.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocFrequency {
    /// Number of documents
    Count(usize),
    /// Fraction of documents in [0, 1]
    Proportion(f64),
}

impl DocFrequency {
    /// Bound expressed in documents for a corpus of `n_docs`.
    fn in_documents(self, n_docs: usize) -> f64 {
        match self {
            DocFrequency::Count(n)      => n as f64,
            DocFrequency::Proportion(p) => p * n_docs as f64,
        }
    }

    fn validate(self, name: &str) -> Result<()> {
        if let DocFrequency::Proportion(p) = self {
            if !(0.0..=1.0).contains(&p) {
                bail!("{name} proportion must be in [0, 1], got {p}");
            }
        }
        Ok(())
    }
}

impl fmt::Display for DocFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocFrequency::Count(n)      => write!(f, "{n}"),
            DocFrequency::Proportion(p) => write!(f, "{p}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorizerConfig {
    /// Inclusive (min_n, max_n) word n-gram window
    pub ngram_range: (usize, usize),
    pub min_df:      DocFrequency,
    pub max_df:      DocFrequency,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 2),
            min_df:      DocFrequency::Proportion(0.0005),
            max_df:      DocFrequency::Proportion(0.8),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountVectorizer {
    config:     VectorizerConfig,
    vocabulary: BTreeMap<String, usize>,
    #[serde(skip)]
    tokenizer:  LemmaTokenizer,
}

impl CountVectorizer {
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        let (min_n, max_n) = config.ngram_range;
        if min_n == 0 || min_n > max_n {
            bail!("invalid ngram_range ({min_n}, {max_n})");
        }
        config.min_df.validate("min_df")?;
        config.max_df.validate("max_df")?;

        Ok(Self {
            config,
            vocabulary: BTreeMap::new(),
            tokenizer:  LemmaTokenizer::new(),
        })
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Tokenise `text` and expand it into the configured n-grams.
    pub fn analyze(&self, text: &str) -> Result<Vec<String>> {
        let tokens         = self.tokenizer.tokenize(text)?;
        let (min_n, max_n) = self.config.ngram_range;
        let mut grams      = Vec::new();

        for n in min_n..=max_n.min(tokens.len()) {
            grams.extend(tokens.windows(n).map(|w| w.join(" ")));
        }

        Ok(grams)
    }

    /// Learn the vocabulary from `texts` and return their count vectors.
    pub fn fit_transform(&mut self, texts: &[&str]) -> Result<Vec<SparseRow>> {
        let n_docs = texts.len();
        if n_docs == 0 {
            bail!("cannot fit a vectorizer on zero documents");
        }

        let analyzed = texts
            .iter()
            .map(|t| self.analyze(t))
            .collect::<Result<Vec<_>>>()?;

        // ── Document frequencies ──────────────────────────────────────────────
        let mut df: HashMap<&str, usize> = HashMap::new();
        for grams in &analyzed {
            let unique: HashSet<&str> = grams.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        if df.is_empty() {
            bail!("empty vocabulary; the documents contain no word tokens");
        }

        // ── Prune by document frequency ───────────────────────────────────────
        let min_docs = self.config.min_df.in_documents(n_docs);
        let max_docs = self.config.max_df.in_documents(n_docs);
        if max_docs < min_docs {
            bail!("max_df corresponds to fewer documents than min_df");
        }

        let mut kept: Vec<&str> = df
            .iter()
            .filter(|(_, &count)| count as f64 >= min_docs && count as f64 <= max_docs)
            .map(|(&term, _)| term)
            .collect();

        if kept.is_empty() {
            bail!("after pruning, no terms remain; try a lower min_df or a higher max_df");
        }

        kept.sort_unstable();
        self.vocabulary = kept
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        tracing::debug!(
            "Vocabulary: {} of {} terms kept (df in [{:.2}, {:.2}])",
            self.vocabulary.len(),
            df.len(),
            min_docs,
            max_docs,
        );

        Ok(analyzed.iter().map(|grams| self.count(grams)).collect())
    }

    /// Count vectors for `texts` against the fitted vocabulary.
    /// Terms outside the vocabulary are ignored.
    pub fn transform(&self, texts: &[&str]) -> Result<Vec<SparseRow>> {
        if self.vocabulary.is_empty() {
            bail!("vectorizer is not fitted");
        }
        texts
            .iter()
            .map(|t| -> Result<SparseRow> { Ok(self.count(&self.analyze(t)?)) })
            .collect()
    }

    fn count(&self, grams: &[String]) -> SparseRow {
        let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
        for gram in grams {
            if let Some(&idx) = self.vocabulary.get(gram) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }
        counts.into_iter().collect()
    }
}
