//! StaticChanges - fixed change lists from conditions, buffs and items

use super::{ChangeSource, Modifier, SourceRef};
use crate::store::AttributeLookup;
use crate::types::BonusCategory;

/// A named, toggleable bundle of changes
#[derive(Debug, Clone)]
pub struct StaticChanges {
    /// Source identifier
    pub source_id: String,
    /// Display name stamped on changes that carry none
    pub name: String,
    /// Inactive bundles contribute nothing
    pub active: bool,
    changes: Vec<Modifier>,
}

impl StaticChanges {
    /// Create a new, active bundle
    pub fn new(source_id: impl Into<String>, name: impl Into<String>) -> Self {
        StaticChanges {
            source_id: source_id.into(),
            name: name.into(),
            active: true,
            changes: Vec::new(),
        }
    }

    /// Add a change to this bundle
    pub fn with_change(mut self, change: Modifier) -> Self {
        self.changes.push(change);
        self
    }

    pub fn changes(&self) -> &[Modifier] {
        &self.changes
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

impl ChangeSource for StaticChanges {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn collect(&self, _store: &dyn AttributeLookup, out: &mut Vec<Modifier>) {
        if !self.active {
            return;
        }
        for change in &self.changes {
            let mut change = change.clone();
            if change.source().name.is_none() {
                let origin = change.source().origin.clone();
                change = change.with_source(SourceRef {
                    name: Some(self.name.clone()),
                    origin,
                });
            }
            out.push(change);
        }
    }
}

/// Common condition and buff bundles
pub struct ChangePresets;

impl ChangePresets {
    /// Helpless: dexterity pinned to zero, re-enforced after every other change
    pub fn helpless() -> StaticChanges {
        StaticChanges::new("condition_helpless", "Helpless").with_change(
            Modifier::set("helpless.dex", "dex", BonusCategory::Untyped, 0.0)
                .with_priority(1001)
                .continuous(),
        )
    }

    /// Haste: +1 attack, +1 dodge-like AC and reflex
    pub fn haste() -> StaticChanges {
        StaticChanges::new("buff_haste", "Haste")
            .with_change(Modifier::add("haste.attack", "attack", BonusCategory::Untyped, 1.0))
            .with_change(Modifier::add("haste.ac", "ac", BonusCategory::Haste, 1.0))
            .with_change(Modifier::add("haste.ref", "ref", BonusCategory::Haste, 1.0))
    }

    /// Shield of Faith: deflection bonus scaling with caster level, capped at +5
    pub fn shield_of_faith(caster_level: u32) -> StaticChanges {
        let formula = format!("min(5, 2 + floor({} / 6))", caster_level);
        StaticChanges::new("buff_shield_of_faith", "Shield of Faith").with_change(Modifier::add(
            "shield_of_faith.ac",
            "ac",
            BonusCategory::Deflection,
            formula,
        ))
    }

    /// Shaken: -2 to attack, saves and skill checks
    pub fn shaken() -> StaticChanges {
        let mut bundle = StaticChanges::new("condition_shaken", "Shaken");
        for target in ["attack", "allSavingThrows", "skills"] {
            bundle = bundle.with_change(Modifier::add(
                format!("shaken.{}", target),
                target,
                BonusCategory::Penalty,
                -2.0,
            ));
        }
        bundle
    }
}
