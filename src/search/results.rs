use crate::evaluator::CandidateMetrics;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};
use tracing::warn;

/// Append-only mapping from candidate signature to its metrics.
///
/// Keys are kept sorted so every consumer sees the same order regardless of
/// which worker produced an entry first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsCollection {
    entries: BTreeMap<String, CandidateMetrics>,
}

impl ResultsCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record. An existing signature is never overwritten; returns `false` instead.
    pub fn insert(&mut self, signature: String, metrics: CandidateMetrics) -> bool {
        self.try_insert(signature, metrics).is_ok()
    }

    /// Like [`insert`](Self::insert), but hands the rejected signature back.
    pub fn try_insert(&mut self, signature: String, metrics: CandidateMetrics) -> Result<(), String> {
        match self.entries.entry(signature) {
            btree_map::Entry::Occupied(e) => {
                warn!("Duplicate candidate signature '{}' ignored", e.key());
                Err(e.key().clone())
            }
            btree_map::Entry::Vacant(e) => {
                e.insert(metrics);
                Ok(())
            }
        }
    }

    pub fn get(&self, signature: &str) -> Option<&CandidateMetrics> {
        self.entries.get(signature)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CandidateMetrics)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<'a> IntoIterator for &'a ResultsCollection {
    type Item = (&'a String, &'a CandidateMetrics);
    type IntoIter = btree_map::Iter<'a, String, CandidateMetrics>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
