//! Provenance - which changes contributed to each path, for breakdown display

use crate::stacking::{Contribution, OverrideLedger};
use crate::types::{ChangeId, Operator};
use serde::Serialize;
use std::collections::BTreeMap;

/// One line of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceEntry {
    pub id: ChangeId,
    /// Human-facing source name
    pub name: String,
    /// Human-facing category label
    pub category: String,
    pub operator: Operator,
    pub value: f64,
    /// `false` when stacking or an override excluded this entry from the total
    pub counted: bool,
}

impl SourceEntry {
    fn from_contribution(contribution: &Contribution) -> Self {
        SourceEntry {
            id: contribution.id.clone(),
            name: contribution.label.clone(),
            category: contribution.category.label().to_string(),
            operator: contribution.operator,
            value: contribution.value,
            counted: contribution.counted,
        }
    }
}

/// Breakdown of a single attribute path
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathBreakdown {
    pub positive: Vec<SourceEntry>,
    pub negative: Vec<SourceEntry>,
}

impl PathBreakdown {
    /// Net of counted entries. A counted override contributes its value outright.
    pub fn counted_total(&self) -> f64 {
        self.entries().filter(|e| e.counted).map(|e| e.value).sum()
    }

    /// Positive then negative entries
    pub fn entries(&self) -> impl Iterator<Item = &SourceEntry> {
        self.positive.iter().chain(self.negative.iter())
    }

    /// Entries excluded from the total
    pub fn excluded(&self) -> impl Iterator<Item = &SourceEntry> {
        self.entries().filter(|e| !e.counted)
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_empty() && self.negative.is_empty()
    }
}

/// Breakdowns for every path touched during a pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Provenance {
    paths: BTreeMap<String, PathBreakdown>,
}

impl Provenance {
    /// Build breakdowns from the finished ledger.
    ///
    /// Zero-valued adds are dropped; zero-valued overrides are kept since they pin a total.
    pub fn finalize(ledger: &OverrideLedger) -> Self {
        let mut paths = BTreeMap::new();
        for (path, entry) in ledger.iter() {
            let mut breakdown = PathBreakdown::default();
            for contribution in entry.contributions() {
                let line = SourceEntry::from_contribution(contribution);
                if contribution.value > 0.0 {
                    breakdown.positive.push(line);
                } else if contribution.value < 0.0 {
                    breakdown.negative.push(line);
                } else if contribution.operator == Operator::Set {
                    breakdown.positive.push(line);
                }
            }
            if !breakdown.is_empty() {
                paths.insert(path.to_string(), breakdown);
            }
        }
        Provenance { paths }
    }

    pub fn get(&self, path: &str) -> Option<&PathBreakdown> {
        self.paths.get(path)
    }

    /// Breakdown for `path`, empty when nothing touched it
    pub fn breakdown(&self, path: &str) -> PathBreakdown {
        self.paths.get(path).cloned().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PathBreakdown)> {
        self.paths.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Serialize all breakdowns as pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::change::Modifier;
    use crate::config::default_ruleset;
    use crate::stacking::StackingResolver;
    use crate::types::BonusCategory;

    fn ledger(changes: &[(Modifier, f64)]) -> OverrideLedger {
        let ruleset = default_ruleset();
        let resolver = StackingResolver::new(&ruleset);
        let mut ledger = OverrideLedger::new();
        for (change, value) in changes {
            resolver.apply(&mut ledger, "p", change, *value);
        }
        ledger
    }

    #[test]
    fn test_positive_negative_split() {
        let ledger = ledger(&[
            (Modifier::add("bless", "attack", BonusCategory::Morale, 1.0), 1.0),
            (Modifier::add("shaken", "attack", BonusCategory::Penalty, -2.0), -2.0),
            (Modifier::add("nothing", "attack", BonusCategory::Untyped, 0.0), 0.0),
        ]);
        let provenance = Provenance::finalize(&ledger);
        let breakdown = provenance.get("p").unwrap();
        assert_eq!(breakdown.positive.len(), 1);
        assert_eq!(breakdown.negative.len(), 1);
        assert!((breakdown.counted_total() + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_excluded_entries_marked() {
        let ledger = ledger(&[
            (Modifier::add("ring", "ac", BonusCategory::Enhancement, 2.0), 2.0),
            (Modifier::add("belt", "ac", BonusCategory::Enhancement, 5.0), 5.0),
        ]);
        let breakdown = Provenance::finalize(&ledger).breakdown("p");
        let excluded: Vec<_> = breakdown.excluded().map(|e| e.id.as_str()).collect();
        assert_eq!(excluded, vec!["ring"]);
        assert!((breakdown.counted_total() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_override_kept() {
        let ledger = ledger(&[(Modifier::set("pin", "dex", BonusCategory::Untyped, 0.0), 0.0)]);
        let breakdown = Provenance::finalize(&ledger).breakdown("p");
        assert_eq!(breakdown.positive.len(), 1);
        assert_eq!(breakdown.positive[0].category, "Untyped");
    }

    #[test]
    fn test_untouched_path_is_empty() {
        let provenance = Provenance::finalize(&OverrideLedger::new());
        assert!(provenance.is_empty());
        assert!(provenance.breakdown("attributes.ac.normal.total").is_empty());
    }

    #[test]
    fn test_json_export() {
        let ledger = ledger(&[(Modifier::add("bless", "attack", BonusCategory::Morale, 1.0), 1.0)]);
        let json = Provenance::finalize(&ledger).to_json().unwrap();
        assert!(json.contains("\"bless\""));
        assert!(json.contains("\"counted\": true"));
    }
}
