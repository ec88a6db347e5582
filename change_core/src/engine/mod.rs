//! Resolver - runs a full change resolution pass over an attribute store
//!
//! A pass:
//! 1. Orders changes (priority, target precedence, category precedence)
//! 2. Applies each change in turn: resolve its value once, route it, stack it
//! 3. Re-enforces every other continuous change after each step
//! 4. Refreshes the store's derived attributes through the ledger, so changes
//!    on derived paths survive and feed later formulas and derivations
//! 5. Finalizes provenance

mod order;

pub use order::application_order;

use crate::change::{ChangeSource, Modifier, ModifierValue};
use crate::config::RulesetConfig;
use crate::formula::FormulaEvaluator;
use crate::provenance::Provenance;
use crate::router::TargetRouter;
use crate::stacking::{OverrideLedger, StackingResolver, StoreEffect};
use crate::store::{AttributeLookup, AttributeSheet, AttributeStore};
use crate::types::ChangeId;
use serde::Serialize;

/// A formula that failed to evaluate and counted as 0
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormulaFailure {
    pub id: ChangeId,
    pub source: String,
    pub formula: String,
    pub message: String,
}

/// Outcome of a pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    pub provenance: Provenance,
    pub formula_failures: Vec<FormulaFailure>,
    /// Number of changes that took a turn
    pub applied: usize,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.formula_failures.is_empty()
    }
}

/// Host hooks around a pass
pub trait PassObserver: Send + Sync {
    fn before_pass(&self, _changes: &[Modifier]) {}

    fn after_pass(&self, _report: &ResolutionReport) {}
}

/// Per-pass mutable state
struct Pass {
    values: Vec<Option<f64>>,
    ledger: OverrideLedger,
    failures: Vec<FormulaFailure>,
}

/// Resolution entry point, configured once per ruleset
pub struct Resolver<E: FormulaEvaluator> {
    ruleset: RulesetConfig,
    router: TargetRouter,
    evaluator: E,
    observers: Vec<Box<dyn PassObserver>>,
}

impl<E: FormulaEvaluator> Resolver<E> {
    pub fn new(ruleset: RulesetConfig, evaluator: E) -> Self {
        let router = TargetRouter::new(&ruleset);
        Resolver {
            ruleset,
            router,
            evaluator,
            observers: Vec::new(),
        }
    }

    /// Register a pass observer
    pub fn with_observer(mut self, observer: Box<dyn PassObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn ruleset(&self) -> &RulesetConfig {
        &self.ruleset
    }

    pub fn router(&self) -> &TargetRouter {
        &self.router
    }

    /// Apply `changes` onto `store`, whose current values are the baseline.
    ///
    /// Never fails: bad formulas count as 0 and are listed in the report.
    pub fn resolve<S: AttributeStore>(&self, changes: &[Modifier], store: &mut S) -> ResolutionReport {
        for observer in &self.observers {
            observer.before_pass(changes);
        }

        let order = application_order(changes, &self.ruleset);
        let continuous: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| changes[i].is_continuous())
            .collect();
        tracing::debug!(
            changes = changes.len(),
            continuous = continuous.len(),
            "starting resolution pass"
        );

        let mut pass = Pass {
            values: vec![None; changes.len()],
            ledger: OverrideLedger::new(),
            failures: Vec::new(),
        };

        for &i in &order {
            self.apply_change(changes, i, store, &mut pass);
            for &c in &continuous {
                if c != i {
                    self.apply_change(changes, c, store, &mut pass);
                }
            }
            store.refresh(&pass.ledger);
        }

        let report = ResolutionReport {
            provenance: Provenance::finalize(&pass.ledger),
            formula_failures: pass.failures,
            applied: order.len(),
        };
        tracing::debug!(
            paths = pass.ledger.len(),
            failures = report.formula_failures.len(),
            "resolution pass complete"
        );

        for observer in &self.observers {
            observer.after_pass(&report);
        }
        report
    }

    /// Reset `sheet` to its baseline, collect changes from `sources` and resolve them
    pub fn rebuild(&self, sources: &[Box<dyn ChangeSource>], sheet: &mut AttributeSheet) -> ResolutionReport {
        sheet.reset();
        let changes = crate::change::collect_changes(sources, &*sheet);
        self.resolve(&changes, sheet)
    }

    fn apply_change<S: AttributeStore>(&self, changes: &[Modifier], i: usize, store: &mut S, pass: &mut Pass) {
        let change = &changes[i];
        let value = match pass.values[i] {
            Some(value) => value,
            None => {
                let value = self.resolve_value(change, &*store, &mut pass.failures);
                pass.values[i] = Some(value);
                value
            }
        };

        let paths = self.router.route(change.target(), change.category(), value, &*store);
        if paths.is_empty() {
            tracing::trace!(id = %change.id(), target = change.target(), "target routes to no paths");
            return;
        }

        let stacking = StackingResolver::new(&self.ruleset);
        for path in paths {
            let Some(current) = store.get(&path) else {
                tracing::trace!(id = %change.id(), path = %path, "path not present on entity");
                continue;
            };
            match stacking.apply(&mut pass.ledger, &path, change, value) {
                StoreEffect::Delta(delta) => {
                    store.set(&path, current + delta);
                }
                StoreEffect::Assign(total) => {
                    store.set(&path, total);
                }
                StoreEffect::Unchanged => {}
            }
        }
    }

    fn resolve_value<S: AttributeLookup>(
        &self,
        change: &Modifier,
        store: &S,
        failures: &mut Vec<FormulaFailure>,
    ) -> f64 {
        match change.value() {
            ModifierValue::Constant(value) => *value,
            ModifierValue::Formula(formula) => match self.evaluator.evaluate(formula, store) {
                Ok(value) => value,
                Err(err) => {
                    let source = change.label();
                    tracing::warn!(
                        id = %change.id(),
                        source = %source,
                        formula = %formula,
                        error = %err,
                        "formula failed to evaluate, using 0"
                    );
                    failures.push(FormulaFailure {
                        id: change.id().clone(),
                        source,
                        formula: formula.clone(),
                        message: err.to_string(),
                    });
                    0.0
                }
            },
        }
    }
}
