// Frequency counting and list serialization over attribute vectors.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

fn count<T: Eq + Hash + Clone>(items: &[T]) -> HashMap<T, usize> {
    let mut counts: HashMap<T, usize> = HashMap::new();
    for item in items {
        *counts.entry(item.clone()).or_insert(0) += 1;
    }
    counts
}

/// The most frequent repeated elements, as `(count, element)` pairs.
///
/// Only elements occurring more than once qualify. Distinct counts are
/// ranked highest first; every element whose count reaches the `n`-th
/// ranked count is returned, so ties at the cut-off are all included.
/// Results are sorted by descending count, then descending element.
pub fn most_common<T>(items: &[T], n: usize) -> Vec<(usize, T)>
where
    T: Eq + Hash + Ord + Clone,
{
    if n == 0 {
        return Vec::new();
    }

    let mut repeated: Vec<(usize, T)> = count(items)
        .into_iter()
        .filter(|(_, c)| *c > 1)
        .map(|(item, c)| (c, item))
        .collect();

    let mut ranks: Vec<usize> = repeated.iter().map(|(c, _)| *c).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));
    ranks.dedup();

    let Some(&cutoff) = ranks.get(n.min(ranks.len()).saturating_sub(1)) else {
        return Vec::new();
    };

    repeated.retain(|(c, _)| *c >= cutoff);
    repeated.sort_unstable_by(|a, b| b.cmp(a));
    repeated
}

/// How many times the most frequent element occurs (0 for an empty slice).
pub fn most_occurrences<T: Eq + Hash + Clone>(items: &[T]) -> usize {
    count(items).into_values().max().unwrap_or(0)
}

/// Join the textual form of each element with `;`.
pub fn list_to_scd<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

// ── Tests ─────────────────────────────────────────────────────────────
