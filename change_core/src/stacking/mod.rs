//! Stacking - which same-typed changes count toward a path's total

mod ledger;

pub use ledger::{Contribution, OverrideLedger, PathEntry, StackKey};

use crate::change::Modifier;
use crate::config::RulesetConfig;
use crate::types::{BonusCategory, ChangeId, Operator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stacking behaviour of a bonus category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingClass {
    /// Only the largest contribution counts
    BestOf,
    /// Every contribution counts
    Stacking,
}

/// What the store has to do after a change was applied at a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreEffect {
    /// Add to the current value
    Delta(f64),
    /// Replace the current value
    Assign(f64),
    Unchanged,
}

/// Applies changes to the override ledger according to the ruleset's stacking table
#[derive(Debug, Clone, Copy)]
pub struct StackingResolver<'a> {
    ruleset: &'a RulesetConfig,
}

impl<'a> StackingResolver<'a> {
    pub fn new(ruleset: &'a RulesetConfig) -> Self {
        StackingResolver { ruleset }
    }

    /// Record `change` with its resolved `value` at `path`.
    ///
    /// Changes are expected most-significant first. Re-applying a change already
    /// recorded at the path only re-asserts it if it is the path's winning override.
    pub fn apply(&self, ledger: &mut OverrideLedger, path: &str, change: &Modifier, value: f64) -> StoreEffect {
        let entry = ledger.entry(path);
        let key = StackKey {
            category: change.category(),
            internal: change.is_internal(),
        };

        if let Some(index) = entry.position(change.id()) {
            return match change.operator() {
                Operator::Set if entry.winning_set() == Some(index) => entry.assert_set(index),
                _ => StoreEffect::Unchanged,
            };
        }

        let index = entry.record(Contribution {
            id: change.id().clone(),
            label: change.label(),
            category: change.category(),
            operator: change.operator(),
            value,
            priority: change.priority(),
            internal: key.internal,
            counted: false,
        });

        match change.operator() {
            Operator::Set => entry.offer_set(index),
            Operator::Add => {
                if entry.preempted(change.priority()) {
                    return StoreEffect::Unchanged;
                }
                match self.ruleset.stacking_class(key.category) {
                    StackingClass::Stacking => entry.stack_add(key, index),
                    StackingClass::BestOf => entry.best_of_add(key, index),
                }
            }
        }
    }
}

/// Pure form of the add-stacking rule: the ids that count among `(id, category, value)`
/// contributions to a single path, in input order.
///
/// Stacking categories count everything. Best-of categories count the single largest
/// absolute value, the earliest one winning ties.
pub fn counted_ids(ruleset: &RulesetConfig, contributions: &[(ChangeId, BonusCategory, f64)]) -> Vec<ChangeId> {
    let mut best: BTreeMap<BonusCategory, usize> = BTreeMap::new();
    for (i, (_, category, value)) in contributions.iter().enumerate() {
        if ruleset.stacking_class(*category) == StackingClass::Stacking {
            continue;
        }
        match best.get(category) {
            Some(&j) if value.abs() <= contributions[j].2.abs() => {}
            _ => {
                best.insert(*category, i);
            }
        }
    }
    contributions
        .iter()
        .enumerate()
        .filter(|(i, (_, category, _))| match ruleset.stacking_class(*category) {
            StackingClass::Stacking => true,
            StackingClass::BestOf => best.get(category) == Some(i),
        })
        .map(|(_, (id, _, _))| id.clone())
        .collect()
}
