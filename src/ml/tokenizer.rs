// ============================================================
// Layer 5 — Lemma Tokenizer
// ============================================================
// Turns one review into the sequence of base word forms the
// vectorizer counts:
//
//   "The ACTORS were Brilliant!"
//       │  normalise: NFD → strip accents → lowercase
//       ▼
//   "the actors were brilliant!"
//       │  pre-tokenise: \w+ | [^\w\s]+
//       ▼
//   ["the", "actors", "were", "brilliant", "!"]
//       │  keep word tokens only
//       ▼
//   ["the", "actors", "were", "brilliant"]
//       │  lemmatise
//       ▼
//   ["the", "actor", "were", "brilliant"]
//
// Normalisation and pre-tokenisation come from the `tokenizers`
// crate so accent stripping follows full Unicode decomposition.

use anyhow::{anyhow, Result};
use tokenizers::normalizers::{Lowercase, Sequence, StripAccents, NFD};
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::{
    NormalizedString, Normalizer, OffsetReferential, OffsetType, PreTokenizedString,
    PreTokenizer,
};

use crate::ml::lemma::lemmatize;

#[derive(Debug, Clone)]
pub struct LemmaTokenizer {
    normalizer:    Sequence,
    pre_tokenizer: Whitespace,
}

impl LemmaTokenizer {
    pub fn new() -> Self {
        Self {
            normalizer:    Sequence::new(vec![NFD.into(), StripAccents.into(), Lowercase.into()]),
            pre_tokenizer: Whitespace::default(),
        }
    }

    /// Accent-stripped, lower-cased copy of `text`.
    pub fn normalize(&self, text: &str) -> Result<String> {
        let mut normalized = NormalizedString::from(text);
        self.normalizer
            .normalize(&mut normalized)
            .map_err(|e| anyhow!("Normalisation error: {e}"))?;
        Ok(normalized.get().to_string())
    }

    /// Base word forms of `text`, in order, punctuation removed.
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>> {
        let normalized = self.normalize(text)?;

        let mut pretokenized = PreTokenizedString::from(normalized.as_str());
        self.pre_tokenizer
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| anyhow!("Pre-tokenisation error: {e}"))?;

        let tokens = pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Byte)
            .into_iter()
            .map(|(piece, _, _)| piece)
            .filter(|piece| is_word(piece))
            .map(lemmatize)
            .collect();

        Ok(tokens)
    }
}

impl Default for LemmaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_word(piece: &str) -> bool {
    !piece.is_empty() && piece.chars().all(|c| c.is_alphanumeric() || c == '_')
}
