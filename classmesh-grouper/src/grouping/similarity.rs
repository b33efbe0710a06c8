//! Set similarity

use std::collections::BTreeSet;

/// Jaccard similarity `|a ∩ b| / |a ∪ b|`
///
/// Returns 0.0 when either side is empty, including when both are.
pub fn jaccard<T: Ord>(a: &BTreeSet<T>, b: &BTreeSet<T>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    intersection as f64 / union as f64
}
