//! AttributeSheet - a declared-path attribute registry with derived fields

use super::{AttributeLookup, AttributeStore, DerivedOverlay, NoOverlay};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A derived attribute recomputed on every refresh.
///
/// Outputs are recomputed on refresh, then passed through the refresh overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Derivation {
    /// `floor((score - 10) / 2)`
    AbilityModifier { score: String, output: String },
    /// `min(input, cap)`
    Capped {
        input: String,
        cap: String,
        output: String,
    },
    /// Sum of all inputs
    Sum { inputs: Vec<String>, output: String },
}

impl Derivation {
    fn output(&self) -> &str {
        match self {
            Derivation::AbilityModifier { output, .. }
            | Derivation::Capped { output, .. }
            | Derivation::Sum { output, .. } => output,
        }
    }

    fn compute(&self, values: &BTreeMap<String, f64>) -> Option<f64> {
        match self {
            Derivation::AbilityModifier { score, .. } => {
                let score = values.get(score)?;
                Some(((score - 10.0) / 2.0).floor())
            }
            Derivation::Capped { input, cap, .. } => {
                let input = values.get(input)?;
                match values.get(cap) {
                    Some(cap) => Some(input.min(*cap)),
                    None => Some(*input),
                }
            }
            Derivation::Sum { inputs, .. } => {
                Some(inputs.iter().filter_map(|p| values.get(p)).sum())
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SheetData {
    #[serde(default)]
    values: BTreeMap<String, f64>,
    #[serde(default)]
    derivations: Vec<Derivation>,
}

/// Attribute values for one entity.
///
/// Every declared path also has a baseline value; `reset` restores it before a pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "SheetData", into = "SheetData")]
pub struct AttributeSheet {
    values: BTreeMap<String, f64>,
    baseline: BTreeMap<String, f64>,
    derivations: Vec<Derivation>,
}

impl From<SheetData> for AttributeSheet {
    fn from(data: SheetData) -> Self {
        let mut sheet = AttributeSheet {
            baseline: data.values.clone(),
            values: data.values,
            derivations: Vec::new(),
        };
        for derivation in data.derivations {
            sheet.add_derivation(derivation);
        }
        sheet.refresh(&NoOverlay);
        sheet.baseline = sheet.values.clone();
        sheet
    }
}

impl From<AttributeSheet> for SheetData {
    fn from(sheet: AttributeSheet) -> Self {
        SheetData {
            values: sheet.baseline,
            derivations: sheet.derivations,
        }
    }
}

impl AttributeSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a path with its baseline value
    pub fn declare(&mut self, path: impl Into<String>, value: f64) {
        let path = path.into();
        self.values.insert(path.clone(), value);
        self.baseline.insert(path, value);
    }

    /// Builder form of [`declare`](Self::declare)
    pub fn with(mut self, path: impl Into<String>, value: f64) -> Self {
        self.declare(path, value);
        self
    }

    /// Register a derivation, declaring its output if needed
    pub fn add_derivation(&mut self, derivation: Derivation) {
        let output = derivation.output().to_string();
        if !self.values.contains_key(&output) {
            self.declare(output.clone(), 0.0);
        }
        if let Some(value) = derivation.compute(&self.values) {
            self.values.insert(output.clone(), value);
            self.baseline.insert(output, value);
        }
        self.derivations.push(derivation);
    }

    /// Builder form of [`add_derivation`](Self::add_derivation)
    pub fn with_derivation(mut self, derivation: Derivation) -> Self {
        self.add_derivation(derivation);
        self
    }

    /// Restore every path to its baseline value
    pub fn reset(&mut self) {
        self.values.clone_from(&self.baseline);
    }

    /// Baseline value of a path
    pub fn baseline(&self, path: &str) -> Option<f64> {
        self.baseline.get(path).copied()
    }

    /// All declared paths with their current values
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Paths directly beneath `prefix` (`skills` -> `acr`, `per`, ...)
    pub fn child_keys<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        let mut last: Option<&str> = None;
        self.values.keys().filter_map(move |path| {
            let rest = path.strip_prefix(prefix)?.strip_prefix('.')?;
            let key = rest.split('.').next()?;
            if last == Some(key) {
                return None;
            }
            last = Some(key);
            Some(key)
        })
    }
}

impl AttributeLookup for AttributeSheet {
    fn get(&self, path: &str) -> Option<f64> {
        self.values.get(path).copied()
    }

    fn keys_under(&self, prefix: &str) -> Vec<String> {
        self.child_keys(prefix).map(str::to_string).collect()
    }
}

impl AttributeStore for AttributeSheet {
    fn set(&mut self, path: &str, value: f64) -> bool {
        match self.values.get_mut(path) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    fn refresh(&mut self, overlay: &dyn DerivedOverlay) {
        for derivation in &self.derivations {
            if let Some(value) = derivation.compute(&self.values) {
                let output = derivation.output();
                self.values.insert(output.to_string(), overlay.overlay(output, value));
            }
        }
    }
}
