//! Change set loading

use super::{ChangeError, Modifier};
use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// A host-authored list of changes, e.g. everything granted by one item
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeSet {
    #[serde(default)]
    pub changes: Vec<Modifier>,
}

impl ChangeSet {
    /// Reject empty ids/targets and duplicate ids
    pub fn validate(&self) -> Result<(), ChangeError> {
        let mut seen = HashSet::new();
        for change in &self.changes {
            change.validate()?;
            if !seen.insert(change.id()) {
                return Err(ChangeError::DuplicateId(change.id().clone()));
            }
        }
        Ok(())
    }

    pub fn into_changes(self) -> Vec<Modifier> {
        self.changes
    }
}

/// Load a change set from a TOML file
pub fn load_change_set(path: &Path) -> Result<ChangeSet, ConfigError> {
    let set: ChangeSet = crate::config::load_toml(path)?;
    set.validate()?;
    Ok(set)
}

/// Load a change set from a TOML string
pub fn parse_change_set(content: &str) -> Result<ChangeSet, ConfigError> {
    let set: ChangeSet = crate::config::parse_toml(content)?;
    set.validate()?;
    Ok(set)
}
