//! change_core - Modifier stacking and resolution for derived character attributes
//!
//! This library provides:
//! - Modifier ("change"): a typed, sourced contribution to one or more attributes
//! - TargetRouter: semantic targets to concrete attribute paths
//! - StackingResolver: which same-typed contributions count toward a total
//! - Resolver: ordered, refresh-after-each-step resolution with continuous overrides
//! - Provenance: per-path breakdown of counted and excluded contributions

pub mod change;
pub mod config;
pub mod engine;
pub mod formula;
pub mod prelude;
pub mod provenance;
pub mod router;
pub mod stacking;
pub mod store;
pub mod types;

// Re-export core types for convenience
pub use change::{duplicate_ids, ChangeError, ChangePresets, ChangeSet, ChangeSource, Modifier, ModifierValue, SourceRef, StaticChanges};
pub use config::{default_ruleset, ConfigError, RulesetConfig};
pub use engine::{FormulaFailure, PassObserver, ResolutionReport, Resolver};
pub use formula::{ArithmeticEvaluator, FormulaError, FormulaEvaluator};
pub use provenance::{PathBreakdown, Provenance, SourceEntry};
pub use router::TargetRouter;
pub use stacking::{StackingClass, StackingResolver};
pub use store::{AttributeLookup, AttributeSheet, AttributeStore, Derivation, DerivedOverlay, NoOverlay};
pub use types::{BonusCategory, ChangeId, Operator};
