//! Target routing - semantic target keys to concrete attribute paths

use crate::config::{RouteRule, RulesetConfig, SubKeyPattern, TargetRoute};
use crate::store::AttributeLookup;
use crate::types::BonusCategory;
use std::collections::HashMap;

/// Routing table built from a ruleset
#[derive(Debug, Clone, Default)]
pub struct TargetRouter {
    routes: HashMap<String, TargetRoute>,
    patterns: Vec<SubKeyPattern>,
}

impl TargetRouter {
    pub fn new(ruleset: &RulesetConfig) -> Self {
        TargetRouter {
            routes: ruleset
                .targets
                .iter()
                .map(|route| (route.key.clone(), route.clone()))
                .collect(),
            patterns: ruleset.patterns.clone(),
        }
    }

    /// Whether `target` is known to the static table or a sub-key pattern
    pub fn is_known(&self, target: &str) -> bool {
        self.routes.contains_key(target) || self.pattern_for(target).is_some()
    }

    /// Concrete paths `target` reaches for a change of `category` with signed `value`.
    ///
    /// Unknown targets reach nothing. Sub-key and expanded targets only reach paths
    /// present in `store`.
    pub fn route(
        &self,
        target: &str,
        category: BonusCategory,
        value: f64,
        store: &dyn AttributeLookup,
    ) -> Vec<String> {
        let mut paths = Vec::new();

        if let Some(route) = self.routes.get(target) {
            paths.extend(route.paths.iter().cloned());
            let rule = route
                .rules
                .iter()
                .find(|rule| rule.categories.contains(&category))
                .or(route.default.as_ref());
            if let Some(rule) = rule {
                extend_with_rule(&mut paths, rule, value);
            }
            if let Some(expand) = &route.expand {
                for key in store.keys_under(&expand.under) {
                    let path = expand.template.replace("{key}", &key);
                    if store.contains(&path) {
                        paths.push(path);
                    }
                }
            }
        } else if let Some((pattern, key)) = self.pattern_for(target) {
            if let Some(path) = resolve_sub_key(pattern, key, store) {
                paths.push(path);
            }
        }

        dedup_in_order(paths)
    }

    fn pattern_for<'t>(&self, target: &'t str) -> Option<(&SubKeyPattern, &'t str)> {
        self.patterns.iter().find_map(|pattern| {
            target
                .strip_prefix(pattern.prefix.as_str())
                .filter(|key| !key.is_empty())
                .map(|key| (pattern, key))
        })
    }
}

fn extend_with_rule(paths: &mut Vec<String>, rule: &RouteRule, value: f64) {
    paths.extend(rule.paths.iter().cloned());
    if value < 0.0 {
        paths.extend(rule.penalty_paths.iter().cloned());
    }
}

fn resolve_sub_key(pattern: &SubKeyPattern, key: &str, store: &dyn AttributeLookup) -> Option<String> {
    let halves = key.split_once('.');
    pattern.templates.iter().find_map(|template| {
        let path = if template.contains("{parent}") || template.contains("{child}") {
            let (parent, child) = halves?;
            template.replace("{parent}", parent).replace("{child}", child)
        } else {
            template.replace("{key}", key)
        };
        store.contains(&path).then_some(path)
    })
}

fn dedup_in_order(paths: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(paths.len());
    for path in paths {
        if !out.contains(&path) {
            out.push(path);
        }
    }
    out
}
