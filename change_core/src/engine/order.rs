//! Application order of changes within a pass

use crate::change::Modifier;
use crate::config::RulesetConfig;
use std::cmp::Reverse;

/// Indices of `changes` in application order: priority descending, then target
/// precedence, then category precedence. Equal keys keep collection order.
pub fn application_order(changes: &[Modifier], ruleset: &RulesetConfig) -> Vec<usize> {
    let keys: Vec<_> = changes
        .iter()
        .map(|change| {
            (
                Reverse(change.priority()),
                ruleset.target_rank(change.target()),
                ruleset.category_rank(change.category()),
            )
        })
        .collect();
    let mut order: Vec<usize> = (0..changes.len()).collect();
    order.sort_by_key(|&i| (keys[i], i));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_ruleset;
    use crate::types::BonusCategory;

    fn ids(changes: &[Modifier]) -> Vec<&str> {
        application_order(changes, &default_ruleset())
            .into_iter()
            .map(|i| changes[i].id().as_str())
            .collect()
    }

    #[test]
    fn test_priority_first() {
        let changes = vec![
            Modifier::add("low", "str", BonusCategory::Untyped, 1.0),
            Modifier::add("high", "ac", BonusCategory::Untyped, 1.0).with_priority(5),
        ];
        assert_eq!(ids(&changes), vec!["high", "low"]);
    }

    #[test]
    fn test_target_precedence_second() {
        let changes = vec![
            Modifier::add("ac", "ac", BonusCategory::Untyped, 1.0),
            Modifier::add("unknown", "mythic", BonusCategory::Untyped, 1.0),
            Modifier::add("dex", "dex", BonusCategory::Untyped, 1.0),
        ];
        assert_eq!(ids(&changes), vec!["dex", "ac", "unknown"]);
    }

    #[test]
    fn test_category_precedence_third() {
        let changes = vec![
            Modifier::add("pen", "ac", BonusCategory::Penalty, -1.0),
            Modifier::add("enh", "ac", BonusCategory::Enhancement, 1.0),
            Modifier::add("unt", "ac", BonusCategory::Untyped, 1.0),
        ];
        assert_eq!(ids(&changes), vec!["unt", "enh", "pen"]);
    }

    #[test]
    fn test_skill_targets_keep_insertion_order() {
        let changes = vec![
            Modifier::add("ste", "skill.ste", BonusCategory::Competence, 1.0),
            Modifier::add("acr", "skill.acr", BonusCategory::Competence, 1.0),
            Modifier::add("all", "skills", BonusCategory::Competence, 1.0),
        ];
        assert_eq!(ids(&changes), vec!["all", "ste", "acr"]);
    }

    #[test]
    fn test_full_ties_keep_collection_order() {
        let changes = vec![
            Modifier::add("b", "ac", BonusCategory::Dodge, 1.0),
            Modifier::add("a", "ac", BonusCategory::Dodge, 2.0),
        ];
        assert_eq!(ids(&changes), vec!["b", "a"]);
    }
}
