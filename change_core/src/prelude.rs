//! Prelude module for convenient imports
//!
//! ```rust
//! use change_core::prelude::*;
//! ```

// Changes
pub use crate::change::{ChangePresets, ChangeSource, Modifier, SourceRef, StaticChanges};
pub use crate::types::{BonusCategory, ChangeId, Operator};

// Resolution
pub use crate::config::{default_ruleset, RulesetConfig};
pub use crate::engine::{PassObserver, ResolutionReport, Resolver};
pub use crate::formula::{ArithmeticEvaluator, FormulaEvaluator};

// Stores
pub use crate::store::{AttributeLookup, AttributeSheet, AttributeStore, Derivation};

// Breakdowns
pub use crate::provenance::{PathBreakdown, Provenance};
