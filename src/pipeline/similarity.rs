//! Entity accuracy against a reference set.

use serde::{Deserialize, Serialize};

use crate::analysis::types::Entities;

/// Match counts over the expected keys that were also extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMatch {
    pub matched: usize,
    pub total: usize,
}

impl EntityMatch {
    /// `matched / total`, or `0.0` when no expected key was extracted.
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64
        }
    }
}

/// Count exact value matches for every expected key present in `extracted`.
///
/// Expected keys missing from `extracted` are ignored, not counted as misses.
pub fn compare_entities(extracted: &Entities, expected: &Entities) -> EntityMatch {
    expected
        .iter()
        .filter_map(|(key, want)| extracted.get(key).map(|got| got == want))
        .fold(EntityMatch::default(), |mut acc, hit| {
            acc.total += 1;
            if hit {
                acc.matched += 1;
            }
            acc
        })
}

pub fn similarity_score(extracted: &Entities, expected: &Entities) -> f64 {
    compare_entities(extracted, expected).score()
}
