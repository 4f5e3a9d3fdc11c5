//! Stratified train/test partitioning

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{Result, SpamError};

/// Disjoint train/test partition of a labeled set
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub x_train: Vec<String>,
    pub x_test: Vec<String>,
    pub y_train: Vec<String>,
    pub y_test: Vec<String>,
    /// Source row of each training example, ascending
    pub train_indices: Vec<usize>,
    /// Source row of each test example, ascending
    pub test_indices: Vec<usize>,
}

impl Split {
    pub fn train_len(&self) -> usize {
        self.train_indices.len()
    }

    pub fn test_len(&self) -> usize {
        self.test_indices.len()
    }
}

/// Split `texts`/`labels` so each label keeps its proportion in both halves.
///
/// The test half holds `ceil(test_size * n)` rows, shared between labels by
/// largest remainder. Every label needs at least two rows so it can appear on
/// both sides. The same `seed` always yields the same partition.
pub fn stratified_split(
    texts: &[String],
    labels: &[String],
    test_size: f64,
    seed: u64,
) -> Result<Split> {
    if texts.len() != labels.len() {
        return Err(SpamError::Data(format!(
            "{} texts but {} labels",
            texts.len(),
            labels.len()
        )));
    }
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(SpamError::Data(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(i);
    }

    if let Some((label, rows)) = by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(SpamError::Data(format!(
            "label '{}' has {} row(s); stratified split needs at least 2 per label",
            label,
            rows.len()
        )));
    }

    let n = labels.len();
    let n_test = (test_size * n as f64).ceil() as usize;
    let n_classes = by_class.len();
    if n_test < n_classes || n - n_test < n_classes {
        return Err(SpamError::Data(format!(
            "test_size {} leaves {} test and {} train rows for {} labels",
            test_size,
            n_test,
            n - n_test,
            n_classes
        )));
    }

    let allocation = allocate(&by_class, n, n_test);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train_indices = Vec::with_capacity(n - n_test);
    let mut test_indices = Vec::with_capacity(n_test);
    for ((label, rows), take) in by_class.iter().zip(&allocation) {
        let mut rows = rows.clone();
        rows.shuffle(&mut rng);
        debug!("Label '{}': {} test / {} train", label, take, rows.len() - take);
        test_indices.extend_from_slice(&rows[..*take]);
        train_indices.extend_from_slice(&rows[*take..]);
    }
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    let pick = |source: &[String], indices: &[usize]| -> Vec<String> {
        indices.iter().map(|&i| source[i].clone()).collect()
    };

    Ok(Split {
        x_train: pick(texts, &train_indices),
        x_test: pick(texts, &test_indices),
        y_train: pick(labels, &train_indices),
        y_test: pick(labels, &test_indices),
        train_indices,
        test_indices,
    })
}

/// Test rows per class: proportional floor, then largest remainder, never the whole class
fn allocate(by_class: &BTreeMap<&str, Vec<usize>>, n: usize, n_test: usize) -> Vec<usize> {
    let exact: Vec<f64> = by_class
        .values()
        .map(|rows| n_test as f64 * rows.len() as f64 / n as f64)
        .collect();
    let caps: Vec<usize> = by_class.values().map(|rows| rows.len() - 1).collect();

    let mut allocation: Vec<usize> = exact
        .iter()
        .zip(&caps)
        .map(|(e, &cap)| (e.floor() as usize).min(cap))
        .collect();

    let mut order: Vec<usize> = (0..exact.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    let mut remaining = n_test.saturating_sub(allocation.iter().sum());
    while remaining > 0 {
        let before = remaining;
        for &c in &order {
            if remaining == 0 {
                break;
            }
            if allocation[c] < caps[c] {
                allocation[c] += 1;
                remaining -= 1;
            }
        }
        if remaining == before {
            break;
        }
    }

    allocation
}
