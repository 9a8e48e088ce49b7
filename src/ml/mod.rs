// ============================================================
// Layer 5 — ML Layer
// ============================================================
// Everything that turns text into predictions:
//
//   lemma.rs       — rule-based reduction of words to base forms
//   tokenizer.rs   — normalise, split and lemmatise one text
//   vectorizer.rs  — bag of uni/bi-grams with df pruning
//   naive_bayes.rs — multinomial Naive Bayes over count vectors
//   pipeline.rs    — vectorizer + classifier as one fitted unit
//   evaluation.rs  — accuracy, macro F1, balanced accuracy
//   trainer.rs     — fit on train, score on train and test

pub mod lemma;
pub mod tokenizer;
pub mod vectorizer;
pub mod naive_bayes;
pub mod pipeline;
pub mod evaluation;
pub mod trainer;
