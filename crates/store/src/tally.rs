//! Grouped counting with stable ranking.

use std::collections::HashMap;
use std::hash::Hash;

/// Counts occurrences per key, remembering first-seen order so that ties
/// rank by first appearance.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    index: HashMap<K, usize>,
    counts: Vec<(K, u64)>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            counts: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: K) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: K, n: u64) {
        match self.index.get(&key) {
            Some(&i) => self.counts[i].1 += n,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push((key, n));
            }
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| c).sum()
    }

    /// Highest counts first, ties in first-seen order.
    pub fn ranked(mut self, limit: Option<usize>) -> Vec<(K, u64)> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        if let Some(limit) = limit {
            self.counts.truncate(limit);
        }
        self.counts
    }
}

impl<K: Eq + Hash + Clone + Ord> Tally<K> {
    /// Ordered by key.
    pub fn sorted_by_key(mut self) -> Vec<(K, u64)> {
        self.counts.sort_by(|a, b| a.0.cmp(&b.0));
        self.counts
    }
}
