//! OverrideLedger - per-path record of what was applied during one pass

use super::StoreEffect;
use crate::store::DerivedOverlay;
use crate::types::{BonusCategory, ChangeId, Operator};
use serde::Serialize;
use std::collections::BTreeMap;

/// Stacking bucket within a path. Internal (`~`) targets never share buckets
/// with regular targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StackKey {
    pub category: BonusCategory,
    pub internal: bool,
}

/// One change's contribution to one path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub id: ChangeId,
    pub label: String,
    pub category: BonusCategory,
    pub operator: Operator,
    pub value: f64,
    pub priority: i32,
    pub internal: bool,
    /// Whether this contribution currently counts toward the total
    pub counted: bool,
}

/// Ledger entry for a single attribute path
#[derive(Debug, Clone, Default)]
pub struct PathEntry {
    contributions: Vec<Contribution>,
    /// Counted contribution indices per bucket (at most one for best-of)
    add: BTreeMap<StackKey, Vec<usize>>,
    /// Override currently owning the path's total
    winner: Option<usize>,
}

impl PathEntry {
    /// Contributions in application order
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// Contributions that count toward the total
    pub fn counted(&self) -> impl Iterator<Item = &Contribution> {
        self.contributions.iter().filter(|c| c.counted)
    }

    /// The winning override, if any
    pub fn winning_override(&self) -> Option<&Contribution> {
        self.winner.map(|i| &self.contributions[i])
    }

    /// Path total given the value it had before any change: the winning override,
    /// or `base`, plus every counted add
    pub fn total_over(&self, base: f64) -> f64 {
        let base = self.winner.map_or(base, |w| self.contributions[w].value);
        let adds: f64 = self.add.values().flatten().map(|&i| self.contributions[i].value).sum();
        base + adds
    }

    pub(crate) fn position(&self, id: &ChangeId) -> Option<usize> {
        self.contributions.iter().position(|c| &c.id == id)
    }

    pub(crate) fn winning_set(&self) -> Option<usize> {
        self.winner
    }

    pub(crate) fn record(&mut self, contribution: Contribution) -> usize {
        self.contributions.push(contribution);
        self.contributions.len() - 1
    }

    /// Whether an override of equal or higher priority already owns the path
    pub(crate) fn preempted(&self, priority: i32) -> bool {
        self.winner
            .is_some_and(|w| self.contributions[w].priority >= priority)
    }

    /// (Re-)assert an override: it becomes the only counted contribution
    pub(crate) fn assert_set(&mut self, index: usize) -> StoreEffect {
        for bucket in std::mem::take(&mut self.add).into_values() {
            for i in bucket {
                self.contributions[i].counted = false;
            }
        }
        self.contributions[index].counted = true;
        StoreEffect::Assign(self.contributions[index].value)
    }

    /// Offer an override; it takes the path only with strictly higher priority
    pub(crate) fn offer_set(&mut self, index: usize) -> StoreEffect {
        let priority = self.contributions[index].priority;
        match self.winner {
            Some(w) if self.contributions[w].priority >= priority => StoreEffect::Unchanged,
            previous => {
                if let Some(w) = previous {
                    self.contributions[w].counted = false;
                }
                self.winner = Some(index);
                self.assert_set(index)
            }
        }
    }

    pub(crate) fn stack_add(&mut self, key: StackKey, index: usize) -> StoreEffect {
        self.contributions[index].counted = true;
        self.add.entry(key).or_default().push(index);
        StoreEffect::Delta(self.contributions[index].value)
    }

    pub(crate) fn best_of_add(&mut self, key: StackKey, index: usize) -> StoreEffect {
        let value = self.contributions[index].value;
        let bucket = self.add.entry(key).or_default();
        match bucket.first().copied() {
            None => {
                bucket.push(index);
                self.contributions[index].counted = true;
                StoreEffect::Delta(value)
            }
            Some(previous) => {
                let previous_value = self.contributions[previous].value;
                if value.abs() > previous_value.abs() {
                    bucket[0] = index;
                    self.contributions[previous].counted = false;
                    self.contributions[index].counted = true;
                    StoreEffect::Delta(value - previous_value)
                } else {
                    StoreEffect::Unchanged
                }
            }
        }
    }
}

impl DerivedOverlay for OverrideLedger {
    fn overlay(&self, path: &str, value: f64) -> f64 {
        match self.entries.get(path) {
            Some(entry) => entry.total_over(value),
            None => value,
        }
    }
}

/// All path entries touched during a pass
#[derive(Debug, Clone, Default)]
pub struct OverrideLedger {
    entries: BTreeMap<String, PathEntry>,
}

impl OverrideLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry for `path`, created empty on first use
    pub fn entry(&mut self, path: &str) -> &mut PathEntry {
        self.entries.entry(path.to_string()).or_default()
    }

    pub fn get(&self, path: &str) -> Option<&PathEntry> {
        self.entries.get(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
