// ============================================================
// Layer 4 — Cleaner
// ============================================================
// Drops exact duplicate (text, label) pairs, keeping the first
// occurrence of each so the dataset order is preserved.
//
// Two records with the same text but different labels are NOT
// duplicates — both are kept.

use std::collections::HashSet;

use crate::domain::record::Dataset;

pub fn deduplicate(records: Dataset) -> Dataset {
    let before   = records.len();
    let mut seen = HashSet::with_capacity(before);

    let cleaned: Dataset = records
        .into_iter()
        .filter(|r| seen.insert((r.text.clone(), r.label)))
        .collect();

    tracing::debug!("Removed {} duplicate records", before - cleaned.len());
    cleaned
}
