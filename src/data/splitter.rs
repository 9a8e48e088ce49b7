// ============================================================
// Layer 4 — Stratified Train/Test Splitter
// ============================================================
// Shuffles records and splits them into two sets:
//   - Training set: used to fit the vectorizer and classifier
//   - Test set:     used to measure performance on unseen data
//
// The split is stratified: every class keeps (within rounding)
// the same share in the test set as in the whole dataset, so a
// rare class cannot vanish from evaluation by bad luck.
//
// How the test set is sized:
//   n_test  = ceil(test_fraction * n)
//   n_train = n - n_test
//
// How n_test is shared between classes:
//   each class c gets floor(n_test * n_c / n) slots, and the
//   leftover slots go to the classes with the largest remainder
//   (ties broken by the smaller label). Integer arithmetic keeps
//   the allocation exact.
//
// Reproducibility: a StdRng seeded from `seed` drives every
// shuffle, so the same records and seed always give the same
// split.

use anyhow::{bail, Result};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::collections::BTreeMap;

use crate::domain::record::{Dataset, Label, Split};

/// Stratified shuffle split of `records` into (train, test).
///
/// # Errors
/// * `test_fraction` not strictly between 0 and 1
/// * empty dataset
/// * any class with fewer than 2 members
/// * fewer test or train slots than there are classes
pub fn stratified_split(records: Dataset, test_fraction: f64, seed: u64) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        bail!("test fraction must be in (0, 1), got {test_fraction}");
    }

    let total = records.len();
    if total == 0 {
        bail!("cannot split an empty dataset");
    }

    // BTreeMap keeps classes in label order, which fixes the
    // order the RNG is consumed in
    let mut by_class: BTreeMap<Label, Dataset> = BTreeMap::new();
    for record in records {
        by_class.entry(record.label).or_default().push(record);
    }

    if let Some((label, members)) = by_class.iter().find(|(_, m)| m.len() < 2) {
        bail!(
            "the least populated class ({label}) has only {} member; \
             every class needs at least 2 to stratify",
            members.len()
        );
    }

    let n_classes = by_class.len();
    let n_test    = (test_fraction * total as f64).ceil() as usize;
    let n_train   = total - n_test;

    if n_test < n_classes {
        bail!("test set of {n_test} records cannot hold all {n_classes} classes");
    }
    if n_train < n_classes {
        bail!("train set of {n_train} records cannot hold all {n_classes} classes");
    }

    let counts: Vec<usize>   = by_class.values().map(Vec::len).collect();
    let test_counts          = allocate(&counts, n_test);
    let mut rng              = StdRng::seed_from_u64(seed);
    let mut train            = Vec::with_capacity(n_train);
    let mut test             = Vec::with_capacity(n_test);

    for (mut members, take) in by_class.into_values().zip(test_counts) {
        members.shuffle(&mut rng);
        // split_off(n) leaves [0..n) in `members` for the test set
        let rest = members.split_off(take);
        test.extend(members);
        train.extend(rest);
    }

    // Interleave classes so neither partition is grouped by label
    train.shuffle(&mut rng);
    test.shuffle(&mut rng);

    tracing::debug!(
        "Stratified split over {} classes: {} train, {} test",
        n_classes,
        train.len(),
        test.len(),
    );

    Ok(Split { train, test })
}

/// Share `draws` slots between classes in proportion to `counts`
/// using largest-remainder rounding.
fn allocate(counts: &[usize], draws: usize) -> Vec<usize> {
    let total: usize = counts.iter().sum();

    let mut alloc: Vec<usize>   = counts.iter().map(|&c| draws * c / total).collect();
    let remainders: Vec<usize>  = counts.iter().map(|&c| draws * c % total).collect();
    let mut left                = draws - alloc.iter().sum::<usize>();

    let mut order: Vec<usize> = (0..counts.len()).collect();
    order.sort_by(|&a, &b| remainders[b].cmp(&remainders[a]).then(a.cmp(&b)));

    for idx in order {
        if left == 0 {
            break;
        }
        if alloc[idx] < counts[idx] {
            alloc[idx] += 1;
            left       -= 1;
        }
    }

    alloc
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Record;

    fn dataset(per_class: &[(Label, usize)]) -> Dataset {
        per_class
            .iter()
            .flat_map(|&(label, n)| {
                (0..n).map(move |i| Record::new(format!("doc {label} {i}"), label))
            })
            .collect()
    }

    fn count(records: &[Record], label: Label) -> usize {
        records.iter().filter(|r| r.label == label).count()
    }

    fn sorted(mut records: Vec<Record>) -> Vec<Record> {
        records.sort_by(|a, b| a.text.cmp(&b.text).then(a.label.cmp(&b.label)));
        records
    }

    #[test]
    fn test_correct_split_sizes() {
        let split = stratified_split(dataset(&[(0, 60), (1, 40)]), 0.1, 0).unwrap();
        assert_eq!(split.test.len(),  10);
        assert_eq!(split.train.len(), 90);
    }

    #[test]
    fn test_class_proportions_preserved() {
        let data  = dataset(&[(0, 70), (1, 20), (2, 13)]);
        let f     = 0.2;
        let split = stratified_split(data, f, 0).unwrap();

        for (label, n) in [(0, 70), (1, 20), (2, 13)] {
            let expected = f * n as f64;
            let got      = count(&split.test, label) as f64;
            assert!(
                (got - expected).abs() <= 1.0,
                "class {label}: got {got}, expected ≈ {expected}"
            );
        }
    }

    #[test]
    fn test_all_items_preserved() {
        let data  = dataset(&[(0, 33), (1, 17)]);
        let split = stratified_split(data.clone(), 0.3, 7).unwrap();

        let mut union = split.train.clone();
        union.extend(split.test.clone());
        assert_eq!(sorted(union), sorted(data));
    }

    #[test]
    fn test_same_seed_same_split() {
        let data = dataset(&[(0, 25), (1, 25)]);
        let a    = stratified_split(data.clone(), 0.2, 42).unwrap();
        let b    = stratified_split(data, 0.2, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_singleton_class_is_rejected() {
        let err = stratified_split(dataset(&[(0, 10), (1, 1)]), 0.2, 0).unwrap_err();
        assert!(err.to_string().contains("least populated class"));
    }

    #[test]
    fn test_test_set_too_small_for_classes() {
        // ceil(0.1 * 6) = 1 test slot for 3 classes
        let err = stratified_split(dataset(&[(0, 2), (1, 2), (2, 2)]), 0.1, 0).unwrap_err();
        assert!(err.to_string().contains("cannot hold"));
    }

    #[test]
    fn test_invalid_fraction() {
        assert!(stratified_split(dataset(&[(0, 5), (1, 5)]), 0.0, 0).is_err());
        assert!(stratified_split(dataset(&[(0, 5), (1, 5)]), 1.0, 0).is_err());
    }

    #[test]
    fn test_empty_dataset() {
        assert!(stratified_split(Vec::new(), 0.2, 0).is_err());
    }

    #[test]
    fn test_allocate_largest_remainder() {
        // 7 draws over 5/3/2: exact shares 3.5, 2.1, 1.4
        assert_eq!(allocate(&[5, 3, 2], 7), vec![4, 2, 1]);
        assert_eq!(allocate(&[5, 5], 3), vec![2, 1]);
    }
}
