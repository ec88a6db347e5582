//! Ruleset configuration: stacking table, precedence lists and the routing table

use super::ConfigError;
use crate::stacking::StackingClass;
use crate::types::BonusCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Extra paths reached by a target for some categories
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Categories this rule applies to. Ignored on a target's `default` rule.
    #[serde(default)]
    pub categories: Vec<BonusCategory>,
    /// Paths always reached when the rule matches
    #[serde(default)]
    pub paths: Vec<String>,
    /// Paths reached only when the signed value is negative
    #[serde(default)]
    pub penalty_paths: Vec<String>,
}

/// Fan a target out over every child of a store subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetExpansion {
    /// Subtree to enumerate, e.g. `skills`
    pub under: String,
    /// Path built per child, e.g. `skills.{key}.changeBonus`
    pub template: String,
}

/// Static routing entry for one target key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetRoute {
    pub key: String,
    /// Paths reached regardless of category and sign
    #[serde(default)]
    pub paths: Vec<String>,
    /// Category-specific rules; the first matching one applies
    #[serde(default)]
    pub rules: Vec<RouteRule>,
    /// Rule applied when no category rule matches
    #[serde(default)]
    pub default: Option<RouteRule>,
    #[serde(default)]
    pub expand: Option<TargetExpansion>,
}

/// Sub-key targets such as `skill.acr` or `concentration.primary`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubKeyPattern {
    /// Target prefix including the separator, e.g. `skill.`
    pub prefix: String,
    /// Candidate paths; the first one present in the store wins.
    /// `{key}` is the whole sub-key, `{parent}`/`{child}` its halves around the first dot.
    pub templates: Vec<String>,
}

/// Everything ruleset-specific the resolver needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesetConfig {
    /// Categories whose changes always sum. All others are best-of.
    #[serde(default)]
    pub stacking: Vec<BonusCategory>,
    /// Category precedence, third sort key
    #[serde(default)]
    pub category_order: Vec<BonusCategory>,
    /// Target precedence, second sort key. `prefix.*` entries cover sub-key targets.
    #[serde(default)]
    pub target_order: Vec<String>,
    #[serde(default)]
    pub targets: Vec<TargetRoute>,
    #[serde(default)]
    pub patterns: Vec<SubKeyPattern>,
}

impl RulesetConfig {
    /// Load and validate a ruleset from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ruleset: RulesetConfig = super::load_toml(path)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Parse and validate a ruleset from a TOML string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let ruleset: RulesetConfig = super::parse_toml(content)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut keys = HashSet::new();
        for route in &self.targets {
            if route.key.trim().is_empty() {
                return Err(ConfigError::ValidationError("target with empty key".to_string()));
            }
            if !keys.insert(route.key.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "target '{}' is declared more than once",
                    route.key
                )));
            }
            let reaches_nothing = route.paths.is_empty()
                && route.rules.is_empty()
                && route.default.is_none()
                && route.expand.is_none();
            if reaches_nothing {
                return Err(ConfigError::ValidationError(format!(
                    "target '{}' routes to no paths",
                    route.key
                )));
            }
            if let Some(expand) = &route.expand {
                if !expand.template.contains("{key}") {
                    return Err(ConfigError::ValidationError(format!(
                        "expansion template '{}' of target '{}' lacks {{key}}",
                        expand.template, route.key
                    )));
                }
            }
        }
        for pattern in &self.patterns {
            if pattern.prefix.is_empty() {
                return Err(ConfigError::ValidationError("sub-key pattern with empty prefix".to_string()));
            }
            for template in &pattern.templates {
                if !template.contains("{key}") && !template.contains("{parent}") {
                    return Err(ConfigError::ValidationError(format!(
                        "template '{}' of pattern '{}' lacks {{key}} or {{parent}}",
                        template, pattern.prefix
                    )));
                }
            }
        }
        Ok(())
    }

    /// Stacking class of a category
    pub fn stacking_class(&self, category: BonusCategory) -> StackingClass {
        if self.stacking.contains(&category) {
            StackingClass::Stacking
        } else {
            StackingClass::BestOf
        }
    }

    /// Position of a target in the precedence list. Unlisted targets sort last.
    pub fn target_rank(&self, target: &str) -> usize {
        if let Some(rank) = self.target_order.iter().position(|t| t == target) {
            return rank;
        }
        self.target_order
            .iter()
            .position(|entry| {
                entry
                    .strip_suffix('*')
                    .filter(|prefix| prefix.ends_with('.'))
                    .is_some_and(|prefix| target.len() > prefix.len() && target.starts_with(prefix))
            })
            .unwrap_or(self.target_order.len())
    }

    /// Position of a category in the precedence list. Unlisted categories sort last.
    pub fn category_rank(&self, category: BonusCategory) -> usize {
        self.category_order
            .iter()
            .position(|c| *c == category)
            .unwrap_or(self.category_order.len())
    }
}

/// Get the default ruleset
pub fn default_ruleset() -> RulesetConfig {
    let toml = include_str!("../../config/ruleset.toml");
    RulesetConfig::parse(toml).unwrap_or_else(|err| {
        tracing::error!(error = %err, "embedded ruleset failed to load, stacking everything untyped only");
        RulesetConfig {
            stacking: vec![BonusCategory::Untyped, BonusCategory::UntypedPerm],
            category_order: BonusCategory::all().to_vec(),
            ..RulesetConfig::default()
        }
    })
}
