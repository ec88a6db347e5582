//! Changes - typed, sourced modifiers and the sources that produce them

mod presets;
mod set;

pub use presets::{ChangePresets, StaticChanges};
pub use set::{load_change_set, parse_change_set, ChangeSet};

use crate::store::AttributeLookup;
use crate::types::{BonusCategory, ChangeId, Operator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Change construction error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChangeError {
    #[error("Unknown bonus category: {0}")]
    UnknownCategory(String),
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),
    #[error("Change {0} has an empty target")]
    EmptyTarget(ChangeId),
    #[error("Change with target {0} has an empty id")]
    EmptyId(String),
    #[error("Duplicate change id: {0}")]
    DuplicateId(ChangeId),
}

/// Either a formula to evaluate once per pass, or a precomputed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModifierValue {
    Constant(f64),
    Formula(String),
}

impl From<f64> for ModifierValue {
    fn from(value: f64) -> Self {
        ModifierValue::Constant(value)
    }
}

impl From<&str> for ModifierValue {
    fn from(formula: &str) -> Self {
        ModifierValue::Formula(formula.to_string())
    }
}

impl From<String> for ModifierValue {
    fn from(formula: String) -> Self {
        ModifierValue::Formula(formula)
    }
}

/// Where a change came from. Display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub name: Option<String>,
    /// Originating object (item, buff, feat...) if any
    #[serde(default)]
    pub origin: Option<String>,
}

impl SourceRef {
    pub fn named(name: impl Into<String>) -> Self {
        SourceRef {
            name: Some(name.into()),
            origin: None,
        }
    }

    /// Label for breakdowns, falling back to the change id when unnamed
    pub fn label(&self, fallback: &ChangeId) -> String {
        match (self.name.as_deref(), self.origin.as_deref()) {
            (Some(name), Some(origin)) if !name.trim().is_empty() && !origin.trim().is_empty() => {
                format!("{} ({})", name.trim(), origin.trim())
            }
            (Some(name), _) if !name.trim().is_empty() => name.trim().to_string(),
            (_, Some(origin)) if !origin.trim().is_empty() => origin.trim().to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// A single change: adds to, or overrides, the paths its target routes to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    id: ChangeId,
    target: String,
    category: BonusCategory,
    #[serde(default = "default_operator")]
    operator: Operator,
    value: ModifierValue,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    continuous: bool,
    #[serde(default)]
    source: SourceRef,
}

fn default_operator() -> Operator {
    Operator::Add
}

impl Modifier {
    fn new(
        id: impl Into<ChangeId>,
        target: impl Into<String>,
        category: BonusCategory,
        operator: Operator,
        value: impl Into<ModifierValue>,
    ) -> Self {
        Modifier {
            id: id.into(),
            target: target.into(),
            category,
            operator,
            value: value.into(),
            priority: 0,
            continuous: false,
            source: SourceRef::default(),
        }
    }

    /// Create an additive change
    pub fn add(
        id: impl Into<ChangeId>,
        target: impl Into<String>,
        category: BonusCategory,
        value: impl Into<ModifierValue>,
    ) -> Self {
        Self::new(id, target, category, Operator::Add, value)
    }

    /// Create an overriding change
    pub fn set(
        id: impl Into<ChangeId>,
        target: impl Into<String>,
        category: BonusCategory,
        value: impl Into<ModifierValue>,
    ) -> Self {
        Self::new(id, target, category, Operator::Set, value)
    }

    /// Build a change from loosely-typed host data, rejecting unknown categories
    /// and operators up front
    pub fn parse(
        id: &str,
        target: &str,
        category: &str,
        operator: &str,
        formula: &str,
    ) -> Result<Self, ChangeError> {
        let category: BonusCategory = category.parse()?;
        let operator: Operator = operator.parse()?;
        let value = match formula.trim().parse::<f64>() {
            Ok(constant) => ModifierValue::Constant(constant),
            Err(_) => ModifierValue::Formula(formula.to_string()),
        };
        let change = Self::new(id, target, category, operator, value);
        change.validate()?;
        Ok(change)
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Mark this change to be re-enforced after every other change
    pub fn continuous(mut self) -> Self {
        self.continuous = true;
        self
    }

    pub fn with_source(mut self, source: SourceRef) -> Self {
        self.source = source;
        self
    }

    /// Replace the formula with a precomputed value
    pub fn with_constant(mut self, value: f64) -> Self {
        self.value = ModifierValue::Constant(value);
        self
    }

    pub fn id(&self) -> &ChangeId {
        &self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn category(&self) -> BonusCategory {
        self.category
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &ModifierValue {
        &self.value
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_continuous(&self) -> bool {
        self.continuous
    }

    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Internal/composite targets (`~attackCore`) keep their own stacking buckets
    pub fn is_internal(&self) -> bool {
        self.target.starts_with('~')
    }

    /// Breakdown label for this change
    pub fn label(&self) -> String {
        self.source.label(&self.id)
    }

    /// Check the structural invariants a change must hold before entering a pass
    pub fn validate(&self) -> Result<(), ChangeError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ChangeError::EmptyId(self.target.clone()));
        }
        if self.target.trim().is_empty() {
            return Err(ChangeError::EmptyTarget(self.id.clone()));
        }
        Ok(())
    }
}

/// Anything that produces changes for a pass (items, buffs, conditions, class features)
pub trait ChangeSource: Send + Sync {
    /// Unique identifier for this source
    fn id(&self) -> &str;

    /// Push this source's changes. The store may be read, never written.
    fn collect(&self, store: &dyn AttributeLookup, out: &mut Vec<Modifier>);
}

/// Gather the full change set for a pass from every source, in source order.
///
/// Ids are expected to be unique. A repeated id is kept but warned about, since
/// stacking records one contribution per id and path.
pub fn collect_changes(sources: &[Box<dyn ChangeSource>], store: &dyn AttributeLookup) -> Vec<Modifier> {
    let mut changes = Vec::new();
    let mut seen: HashSet<ChangeId> = HashSet::new();
    for source in sources {
        let before = changes.len();
        source.collect(store, &mut changes);
        for change in &changes[before..] {
            if !seen.insert(change.id().clone()) {
                tracing::warn!(
                    id = %change.id(),
                    source = source.id(),
                    "duplicate change id, later copies are ignored at shared paths"
                );
            }
        }
        tracing::trace!(source = source.id(), count = changes.len() - before, "collected changes");
    }
    changes
}

/// Ids that occur more than once in `changes`, in first-repeat order
pub fn duplicate_ids(changes: &[Modifier]) -> Vec<ChangeId> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for change in changes {
        if !seen.insert(change.id()) && !duplicates.contains(change.id()) {
            duplicates.push(change.id().clone());
        }
    }
    duplicates
}
