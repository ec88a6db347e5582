//! Attribute store - the entity data changes are applied onto

mod sheet;

pub use sheet::{AttributeSheet, Derivation};

/// Read access to attribute values by dot-delimited path
pub trait AttributeLookup {
    /// Current value at `path`, `None` if the entity has no such attribute
    fn get(&self, path: &str) -> Option<f64>;

    /// Whether `path` exists on this entity
    fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Immediate child keys of a subtree (`skills` -> `acr`, `per`, ...).
    /// Stores that cannot enumerate return nothing.
    fn keys_under(&self, _prefix: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Mutable attribute store driven by the resolver
pub trait AttributeStore: AttributeLookup {
    /// Write `value` at `path`. Unknown paths are a no-op and return `false`.
    fn set(&mut self, path: &str, value: f64) -> bool;

    /// Recompute derived attributes from current totals.
    ///
    /// Each derived output must be passed through `overlay` before any later
    /// derivation reads it, so changes recorded on derived paths survive the refresh.
    fn refresh(&mut self, overlay: &dyn DerivedOverlay);
}

/// Change contributions layered over freshly derived values
pub trait DerivedOverlay {
    /// Final value of derived `path` given its recomputed `value`
    fn overlay(&self, path: &str, value: f64) -> f64;
}

/// Leaves derived values as computed
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverlay;

impl DerivedOverlay for NoOverlay {
    fn overlay(&self, _path: &str, value: f64) -> f64 {
        value
    }
}
